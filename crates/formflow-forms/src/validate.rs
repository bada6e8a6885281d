//! Running a compiled validator over extracted submission values.

use std::collections::HashMap;

use formflow_core::error::FieldError;

use crate::definition::{FormErrors, FormStatus, FormValues};
use crate::schema::CompiledValidator;

/// The error bucket for failures not tied to a single field.
///
/// Process callbacks that fail are reported under this key so templates
/// can render form-level errors separately from per-field ones.
pub const COMMON_ERRORS_KEY: &str = "#common";

/// The outcome of validating one submission.
#[derive(Debug, Clone)]
pub struct FormValidation {
    /// The submitted values, unchanged.
    pub values: FormValues,
    /// Validation errors grouped by field name.
    pub errors: FormErrors,
    /// `Success` when every check passed, `Error` otherwise.
    pub status: FormStatus,
}

/// Validates `values` against a compiled validator.
///
/// A definition without a field schema has no validator; its submissions
/// pass through with [`FormStatus::Success`] and no errors. Otherwise
/// every check runs and failures are grouped per field, so a submission
/// with several invalid fields reports all of them at once.
pub fn validate_form(values: FormValues, validator: Option<&CompiledValidator>) -> FormValidation {
    let Some(validator) = validator else {
        return FormValidation {
            values,
            errors: HashMap::new(),
            status: FormStatus::Success,
        };
    };

    match validator.check(&values) {
        Ok(()) => FormValidation {
            values,
            errors: HashMap::new(),
            status: FormStatus::Success,
        },
        Err(failures) => {
            let mut errors: FormErrors = HashMap::new();
            for failure in failures {
                errors
                    .entry(failure.field.clone())
                    .or_insert_with(Vec::new)
                    .push(failure);
            }
            FormValidation {
                values,
                errors,
                status: FormStatus::Error,
            }
        }
    }
}

/// Appends `extra` errors into `errors`, preserving existing entries.
pub(crate) fn merge_errors(errors: &mut FormErrors, extra: FormErrors) {
    for (field, mut failures) in extra {
        errors.entry(field).or_insert_with(Vec::new).append(&mut failures);
    }
}

/// Records a form-level error under [`COMMON_ERRORS_KEY`].
pub(crate) fn push_common_error(errors: &mut FormErrors, code: &str, message: impl Into<String>) {
    errors
        .entry(COMMON_ERRORS_KEY.to_owned())
        .or_insert_with(Vec::new)
        .push(FieldError::new(COMMON_ERRORS_KEY, code, message));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldSchema, FieldSpec, FieldType};
    use serde_json::{json, Value};

    fn compile(schema: FieldSchema) -> CompiledValidator {
        CompiledValidator::compile(&schema, &[]).expect("schema compiles")
    }

    fn values(pairs: &[(&str, Value)]) -> FormValues {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), v.clone()))
            .collect()
    }

    #[test]
    fn no_validator_passes_through() {
        let submitted = values(&[("anything", json!("goes"))]);
        let validation = validate_form(submitted.clone(), None);
        assert_eq!(validation.status, FormStatus::Success);
        assert!(validation.errors.is_empty());
        assert_eq!(validation.values, submitted);
    }

    #[test]
    fn valid_submission_is_success() {
        let validator = compile(
            FieldSchema::new().field("email", FieldSpec::new(FieldType::Email)),
        );
        let validation = validate_form(values(&[("email", json!("a@b.com"))]), Some(&validator));
        assert_eq!(validation.status, FormStatus::Success);
        assert!(validation.errors.is_empty());
    }

    #[test]
    fn failures_group_by_field() {
        let validator = compile(
            FieldSchema::new()
                .field("email", FieldSpec::new(FieldType::Email))
                .field(
                    "age",
                    FieldSpec::new(FieldType::Number {
                        min: Some(18.0),
                        max: None,
                    }),
                ),
        );
        let validation = validate_form(
            values(&[("email", json!("nope")), ("age", json!(12))]),
            Some(&validator),
        );
        assert_eq!(validation.status, FormStatus::Error);
        assert_eq!(validation.errors.len(), 2);
        assert_eq!(validation.errors["email"][0].code, "email");
        assert_eq!(validation.errors["age"][0].code, "numberMin");
    }

    #[test]
    fn values_survive_failed_validation() {
        let validator = compile(
            FieldSchema::new().field("email", FieldSpec::new(FieldType::Email)),
        );
        let submitted = values(&[("email", json!("nope"))]);
        let validation = validate_form(submitted.clone(), Some(&validator));
        assert_eq!(validation.values, submitted);
    }

    #[test]
    fn common_errors_use_the_reserved_bucket() {
        let mut errors = FormErrors::new();
        push_common_error(&mut errors, "callback", "database unavailable");
        assert_eq!(errors[COMMON_ERRORS_KEY].len(), 1);
        assert_eq!(errors[COMMON_ERRORS_KEY][0].field, COMMON_ERRORS_KEY);
    }

    #[test]
    fn merge_appends_without_dropping() {
        let mut errors = FormErrors::new();
        errors.insert(
            "email".into(),
            vec![FieldError::new("email", "email", "invalid address")],
        );
        let mut extra = FormErrors::new();
        extra.insert(
            "email".into(),
            vec![FieldError::new("email", "taken", "address already registered")],
        );
        extra.insert(
            "password".into(),
            vec![FieldError::new("password", "stringMin", "too short")],
        );
        merge_errors(&mut errors, extra);
        assert_eq!(errors["email"].len(), 2);
        assert_eq!(errors["password"].len(), 1);
    }
}
