//! Field extraction from Amazon product pages.

use crate::amazon::models::{ExtractedFields, RawPage};
use crate::amazon::selectors::product;
use crate::error::ExtractError;
use scraper::{Html, Selector};
use tracing::trace;

/// Reads the tracked fields out of a product page.
///
/// Extraction is pure: the same markup always yields the same fields. A field
/// that is missing from the page is reported as `None`, never as an error.
#[derive(Debug, Clone, Copy, Default)]
pub struct Extractor;

impl Extractor {
    /// Creates a new extractor.
    pub fn new() -> Self {
        Self
    }

    /// Extracts title, price, rating and review count from a fetched page.
    ///
    /// Fails only when the body holds no markup that a document can be built
    /// from.
    pub fn extract(&self, page: &RawPage) -> Result<ExtractedFields, ExtractError> {
        let document = self.parse_document(&page.body)?;

        let fields = ExtractedFields {
            title: Self::first_text(&document, &product::TITLE),
            price: Self::first_text(&document, &product::PRICE),
            rating: Self::first_text(&document, &product::RATING),
            review_count: Self::first_text(&document, &product::REVIEW_COUNT),
        };

        trace!(
            "Extracted fields (title: {}, price: {}, rating: {}, reviews: {})",
            fields.title.is_some(),
            fields.price.is_some(),
            fields.rating.is_some(),
            fields.review_count.is_some()
        );

        Ok(fields)
    }

    fn parse_document(&self, body: &str) -> Result<Html, ExtractError> {
        let trimmed = body.trim();
        if trimmed.is_empty() {
            return Err(ExtractError::Unparsable("empty body"));
        }

        // html5ever recovers from anything, so plain text would still yield a
        // synthetic <html><body>. Require at least one tag.
        if !trimmed.contains('<') {
            return Err(ExtractError::Unparsable("no markup found"));
        }

        Ok(Html::parse_document(body))
    }

    /// Text of the first element matching `selector`, trimmed; `None` if no
    /// element matches or its text is blank.
    fn first_text(document: &Html, selector: &Selector) -> Option<String> {
        document
            .select(selector)
            .next()
            .map(|e| e.text().collect::<String>().trim().to_string())
            .filter(|text| !text.is_empty())
    }
}
