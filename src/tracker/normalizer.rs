//! Turns extracted fields into a stored observation.

use crate::amazon::models::{ExtractedFields, Observation, NOT_AVAILABLE};
use chrono::{DateTime, Utc};

/// Builds the observation for `asin` captured at `captured_at`.
///
/// Present values are trimmed; absent (or blank) values become "N/A". Values
/// stay display strings: no currency or rating parsing happens here.
pub fn normalize(asin: &str, fields: ExtractedFields, captured_at: DateTime<Utc>) -> Observation {
    Observation {
        asin: asin.to_string(),
        title: or_sentinel(fields.title),
        price: or_sentinel(fields.price),
        rating: or_sentinel(fields.rating),
        review_count: or_sentinel(fields.review_count),
        captured_at,
    }
}

fn or_sentinel(value: Option<String>) -> String {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}
