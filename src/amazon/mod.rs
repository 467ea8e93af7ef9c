//! Amazon-specific modules for fetching, extraction, and data models.

pub mod client;
pub mod extractor;
pub mod models;
pub mod regions;
pub mod selectors;

pub use client::{AmazonClient, ProductFetcher};
pub use extractor::Extractor;
pub use models::{ExtractedFields, Field, Observation, RawPage, NOT_AVAILABLE};
pub use regions::Region;
