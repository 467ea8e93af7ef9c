//! Which fields must be present for an observation to be recorded.

use crate::amazon::models::{ExtractedFields, Field};
use crate::error::TrackError;

/// Required-field policy applied between extraction and normalization.
///
/// A required field that is absent fails the identifier with
/// [`TrackError::MissingRequiredField`]; other absent fields are stored as
/// "N/A". The default requires the title only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPolicy {
    required: Vec<Field>,
}

impl Default for FieldPolicy {
    fn default() -> Self {
        Self { required: vec![Field::Title] }
    }
}

impl FieldPolicy {
    /// Creates a policy requiring exactly `required`.
    pub fn new(required: impl IntoIterator<Item = Field>) -> Self {
        let mut fields: Vec<Field> = Vec::new();
        for field in required {
            if !fields.contains(&field) {
                fields.push(field);
            }
        }
        Self { required: fields }
    }

    /// A policy that records every page, whatever is missing.
    pub fn tolerant() -> Self {
        Self { required: Vec::new() }
    }

    pub fn required(&self) -> &[Field] {
        &self.required
    }

    /// Fails on the first required field (in declaration order) that is absent.
    pub fn check(&self, fields: &ExtractedFields) -> Result<(), TrackError> {
        match self.required.iter().find(|f| !fields.has(**f)) {
            Some(missing) => Err(TrackError::MissingRequiredField(*missing)),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn title_only() -> ExtractedFields {
        ExtractedFields { title: Some("Title".to_string()), ..Default::default() }
    }

    #[test]
    fn test_default_requires_title() {
        let policy = FieldPolicy::default();
        assert_eq!(policy.required(), &[Field::Title]);
        assert!(policy.check(&title_only()).is_ok());

        let err = policy.check(&ExtractedFields::default()).unwrap_err();
        assert!(matches!(err, TrackError::MissingRequiredField(Field::Title)));
    }

    #[test]
    fn test_tolerant_accepts_empty_fields() {
        assert!(FieldPolicy::tolerant().check(&ExtractedFields::default()).is_ok());
    }

    #[test]
    fn test_reports_first_missing_field() {
        let policy = FieldPolicy::new([Field::Title, Field::Price, Field::Rating]);
        let err = policy.check(&title_only()).unwrap_err();
        assert!(matches!(err, TrackError::MissingRequiredField(Field::Price)));
    }

    #[test]
    fn test_new_removes_duplicates() {
        let policy = FieldPolicy::new([Field::Price, Field::Price, Field::Title]);
        assert_eq!(policy.required(), &[Field::Price, Field::Title]);
    }
}
