//! Error types for the `voxlink-models` crate.
//!
//! Parsing an inbound hub payload and reading its transcript body are the
//! only fallible operations here; both return [`ModelError`].

/// Errors produced when decoding or validating model types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    /// The payload was not valid JSON or did not have the event shape.
    #[error("malformed event: {0}")]
    MalformedEvent(String),

    /// A field required by the event's kind was absent.
    #[error("missing required field: {field}")]
    MissingField {
        /// The name of the missing field.
        field: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_malformed() {
        let err = ModelError::MalformedEvent("expected value at line 1 column 1".into());
        assert_eq!(
            err.to_string(),
            "malformed event: expected value at line 1 column 1"
        );
    }

    #[test]
    fn error_display_missing_field() {
        let err = ModelError::MissingField {
            field: "data".into(),
        };
        assert_eq!(err.to_string(), "missing required field: data");
    }
}
