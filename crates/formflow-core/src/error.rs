//! Core error types for formflow.
//!
//! This module provides the [`FormFlowError`] enum covering the failure
//! modes of the form-processing pipeline, plus the [`FieldError`]
//! descriptor produced by schema validation and folded into per-field
//! error maps.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single field-level validation error descriptor.
///
/// Compiled validators return lists of these; the validation runner folds
/// them into an error map keyed by field name. Callback failures are
/// wrapped in a descriptor under the reserved common-errors key.
///
/// # Examples
///
/// ```
/// use formflow_core::FieldError;
///
/// let err = FieldError::new("email", "email", "The 'email' field must be a valid e-mail address.");
/// assert_eq!(err.field, "email");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// The field this error is attributed to.
    pub field: String,
    /// A short code identifying the failure (e.g. "required", "email").
    pub code: String,
    /// Human-readable message.
    pub message: String,
    /// What the validator expected, when meaningful (e.g. a minimum length).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
    /// The offending value, rendered to text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual: Option<String>,
}

impl FieldError {
    /// Creates a new descriptor with a field, code, and message.
    pub fn new(
        field: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            code: code.into(),
            message: message.into(),
            expected: None,
            actual: None,
        }
    }

    /// Attaches the expected value.
    #[must_use]
    pub fn expected(mut self, expected: impl Into<String>) -> Self {
        self.expected = Some(expected.into());
        self
    }

    /// Attaches the actual value.
    #[must_use]
    pub fn actual(mut self, actual: impl Into<String>) -> Self {
        self.actual = Some(actual.into());
        self
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for FieldError {}

/// The primary error type for the formflow middleware.
///
/// Covers HTTP-level failures (unsupported payloads, oversized uploads),
/// configuration problems, and process-callback failures. Each variant
/// maps to an HTTP status code via [`FormFlowError::status_code`].
#[derive(Error, Debug)]
pub enum FormFlowError {
    /// The request payload was malformed for its declared content type.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// The request's content type has no registered parser.
    #[error("Parser not implemented for content type: {0}")]
    NotImplemented(String),

    /// An uploaded file exceeded the configured in-memory size cap.
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    /// JSON (de)serialization failed.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// A process callback reported a failure.
    #[error("Callback error: {0}")]
    Callback(String),

    /// A write was attempted on an immutable query dictionary.
    #[error("This QueryDict instance is immutable")]
    Immutable,

    /// An I/O error occurred.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl FormFlowError {
    /// Returns the HTTP status code associated with this error.
    ///
    /// - `BadRequest`, `SerializationError` -> 400
    /// - `PayloadTooLarge` -> 413
    /// - `NotImplemented` -> 415
    /// - Everything else -> 500
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::BadRequest(_) | Self::SerializationError(_) => 400,
            Self::PayloadTooLarge(_) => 413,
            Self::NotImplemented(_) => 415,
            Self::ConfigurationError(_)
            | Self::Callback(_)
            | Self::Immutable
            | Self::IoError(_) => 500,
        }
    }
}

impl From<serde_json::Error> for FormFlowError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}

/// A convenience type alias for `Result<T, FormFlowError>`.
pub type FormFlowResult<T> = Result<T, FormFlowError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_error_display() {
        let err = FieldError::new("email", "email", "must be a valid e-mail address");
        assert_eq!(err.to_string(), "email: must be a valid e-mail address");
    }

    #[test]
    fn test_field_error_expected_actual() {
        let err = FieldError::new("age", "number_min", "too small")
            .expected("18")
            .actual("12");
        assert_eq!(err.expected.as_deref(), Some("18"));
        assert_eq!(err.actual.as_deref(), Some("12"));
    }

    #[test]
    fn test_field_error_serializes_without_empty_options() {
        let err = FieldError::new("name", "required", "required");
        let json = serde_json::to_string(&err).unwrap();
        assert!(!json.contains("expected"));
        assert!(!json.contains("actual"));
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(FormFlowError::BadRequest("x".into()).status_code(), 400);
        assert_eq!(
            FormFlowError::SerializationError("x".into()).status_code(),
            400
        );
        assert_eq!(FormFlowError::PayloadTooLarge("x".into()).status_code(), 413);
        assert_eq!(FormFlowError::NotImplemented("x".into()).status_code(), 415);
        assert_eq!(FormFlowError::Callback("x".into()).status_code(), 500);
        assert_eq!(FormFlowError::Immutable.status_code(), 500);
        assert_eq!(
            FormFlowError::ConfigurationError("x".into()).status_code(),
            500
        );
    }

    #[test]
    fn test_not_implemented_display() {
        let err = FormFlowError::NotImplemented("text/plain".into());
        assert_eq!(
            err.to_string(),
            "Parser not implemented for content type: text/plain"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err: FormFlowError = io_err.into();
        assert_eq!(err.status_code(), 500);
        assert!(err.to_string().contains("file missing"));
    }

    #[test]
    fn test_serde_json_error_conversion() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: FormFlowError = parse_err.into();
        assert_eq!(err.status_code(), 400);
    }
}
