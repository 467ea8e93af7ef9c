//! Data models for fetched pages, extracted fields, and stored observations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Marker stored in place of a field that could not be extracted.
pub const NOT_AVAILABLE: &str = "N/A";

/// Raw response for one product page fetch. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPage {
    /// HTTP status observed for the response
    pub status: u16,
    /// Decoded response body
    pub body: String,
}

impl RawPage {
    /// Creates a page with a 200 status.
    pub fn ok(body: impl Into<String>) -> Self {
        Self { status: 200, body: body.into() }
    }
}

/// One of the four fields read from a product page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Title,
    Price,
    Rating,
    ReviewCount,
}

impl Field {
    /// Returns all fields in extraction order.
    pub fn all() -> &'static [Field] {
        &[Field::Title, Field::Price, Field::Rating, Field::ReviewCount]
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Field::Title => "title",
            Field::Price => "price",
            Field::Rating => "rating",
            Field::ReviewCount => "review_count",
        };
        write!(f, "{}", name)
    }
}

/// Best-effort fields read from a page. `None` means the field was absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedFields {
    pub title: Option<String>,
    pub price: Option<String>,
    pub rating: Option<String>,
    pub review_count: Option<String>,
}

impl ExtractedFields {
    /// Returns the value extracted for `field`, if any.
    pub fn get(&self, field: Field) -> Option<&str> {
        match field {
            Field::Title => self.title.as_deref(),
            Field::Price => self.price.as_deref(),
            Field::Rating => self.rating.as_deref(),
            Field::ReviewCount => self.review_count.as_deref(),
        }
    }

    /// Returns true if `field` was found on the page.
    pub fn has(&self, field: Field) -> bool {
        self.get(field).is_some()
    }
}

/// An immutable, timestamped snapshot of one product listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    /// Amazon Standard Identification Number
    pub asin: String,
    /// Product title, or "N/A"
    pub title: String,
    /// Displayed price text, or "N/A"
    pub price: String,
    /// Displayed rating text, or "N/A"
    pub rating: String,
    /// Displayed review count text, or "N/A"
    pub review_count: String,
    /// When the page was captured
    pub captured_at: DateTime<Utc>,
}

impl Observation {
    /// Returns the stored value for `field`.
    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::Title => &self.title,
            Field::Price => &self.price,
            Field::Rating => &self.rating,
            Field::ReviewCount => &self.review_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_field_display() {
        assert_eq!(Field::Title.to_string(), "title");
        assert_eq!(Field::ReviewCount.to_string(), "review_count");
    }

    #[test]
    fn test_field_names_match_serde() {
        for field in Field::all() {
            let json = serde_json::to_string(field).unwrap();
            assert_eq!(json, format!("\"{}\"", field));
        }
    }

    #[test]
    fn test_field_serde() {
        let json = serde_json::to_string(&Field::ReviewCount).unwrap();
        assert_eq!(json, "\"review_count\"");

        #[derive(Deserialize)]
        struct Required {
            fields: Vec<Field>,
        }

        let parsed: Required = toml::from_str(r#"fields = ["title", "rating"]"#).unwrap();
        assert_eq!(parsed.fields, vec![Field::Title, Field::Rating]);
    }

    #[test]
    fn test_extracted_fields_get() {
        let fields = ExtractedFields {
            title: Some("Kettle".to_string()),
            price: None,
            rating: Some("4.2 out of 5 stars".to_string()),
            review_count: None,
        };

        assert_eq!(fields.get(Field::Title), Some("Kettle"));
        assert!(fields.has(Field::Rating));
        assert!(!fields.has(Field::Price));
        assert!(!fields.has(Field::ReviewCount));
    }

    #[test]
    fn test_observation_serde() {
        let observation = Observation {
            asin: "B0TEST0001".to_string(),
            title: "Kettle".to_string(),
            price: "₹1,299".to_string(),
            rating: NOT_AVAILABLE.to_string(),
            review_count: "12 ratings".to_string(),
            captured_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        };

        let json = serde_json::to_string(&observation).unwrap();
        assert!(json.contains("\"captured_at\":\"2024-05-01T12:00:00Z\""));
        assert!(json.contains("\"rating\":\"N/A\""));

        let parsed: Observation = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, observation);
        assert_eq!(parsed.get(Field::Price), "₹1,299");
    }
}
