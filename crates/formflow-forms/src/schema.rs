//! Declarative field schemas and compiled validators.
//!
//! A [`FieldSchema`] describes the fields of a form as data: each field has
//! a [`FieldType`] with type-specific parameters, an optional flag, an
//! optional default, and custom error messages. [`CompiledValidator::compile`]
//! turns a schema (plus any [`ValidatorPlugin`]s) into per-field check
//! functions once at registration time, so every submission runs the same
//! pre-built checks.

use std::collections::HashMap;
use std::sync::Arc;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use formflow_core::{FieldError, FormFlowError, FormFlowResult};

const EMAIL_PATTERN: &str = r"^[a-zA-Z0-9._%+\-]+@[a-zA-Z0-9.\-]+\.[a-zA-Z]{2,}$";
const URL_PATTERN: &str = r"^https?://[^\s/$.?#].[^\s]*$";

/// The type of a form field, with type-specific validation parameters.
///
/// `File` and `Files` mark file-typed fields: their submitted values are
/// upload metadata objects rather than text, and the extractor routes the
/// raw uploads into the files map.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldType {
    /// A text field.
    Text {
        /// Minimum length in characters.
        #[serde(default)]
        min_length: Option<usize>,
        /// Maximum length in characters.
        #[serde(default)]
        max_length: Option<usize>,
    },
    /// An e-mail address field.
    Email,
    /// A URL field.
    Url,
    /// A numeric field. Accepts JSON numbers and numeric strings.
    Number {
        /// Minimum allowed value.
        #[serde(default)]
        min: Option<f64>,
        /// Maximum allowed value.
        #[serde(default)]
        max: Option<f64>,
    },
    /// A boolean field. Accepts JSON booleans and common checkbox values.
    Boolean,
    /// A UUID field.
    Uuid,
    /// A field validated against a regular expression.
    Pattern {
        /// The regex pattern string, compiled at registration time.
        regex: String,
    },
    /// A single file upload.
    File {
        /// Maximum file size in bytes.
        #[serde(default)]
        max_size: Option<usize>,
    },
    /// A multiple file upload.
    Files {
        /// Maximum size in bytes for each file.
        #[serde(default)]
        max_size: Option<usize>,
    },
}

impl FieldType {
    /// Returns `true` for `File` and `Files` fields.
    pub const fn is_file(&self) -> bool {
        matches!(self, Self::File { .. } | Self::Files { .. })
    }

    /// Returns `true` for `Files` fields, which collect every upload
    /// sharing the field name.
    pub const fn accepts_multiple(&self) -> bool {
        matches!(self, Self::Files { .. })
    }
}

/// The full specification of a single field.
///
/// # Examples
///
/// ```
/// use formflow_forms::{FieldSpec, FieldType};
///
/// let spec = FieldSpec::new(FieldType::Email)
///     .optional(true)
///     .message("email", "Please enter a valid address.");
/// assert!(spec.optional);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldSpec {
    /// The field type, controlling validation.
    #[serde(flatten)]
    pub field_type: FieldType,
    /// Whether the field may be missing or empty.
    #[serde(default)]
    pub optional: bool,
    /// Value substituted when a multipart submission omits the field.
    #[serde(default)]
    pub default: Option<Value>,
    /// Custom error messages keyed by error code. Supports `{field}`,
    /// `{expected}`, and `{actual}` placeholders.
    #[serde(default)]
    pub messages: HashMap<String, String>,
}

impl FieldSpec {
    /// Creates a required spec for the given field type.
    pub fn new(field_type: FieldType) -> Self {
        Self {
            field_type,
            optional: false,
            default: None,
            messages: HashMap::new(),
        }
    }

    /// Sets whether the field may be missing.
    #[must_use]
    pub const fn optional(mut self, optional: bool) -> Self {
        self.optional = optional;
        self
    }

    /// Sets the default value.
    #[must_use]
    pub fn default_value(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    /// Sets a custom error message for a given code.
    #[must_use]
    pub fn message(mut self, code: impl Into<String>, msg: impl Into<String>) -> Self {
        self.messages.insert(code.into(), msg.into());
        self
    }

    /// Returns `true` if this field carries file uploads.
    pub const fn is_file(&self) -> bool {
        self.field_type.is_file()
    }

    /// Returns `true` if this field collects multiple uploads.
    pub const fn accepts_multiple(&self) -> bool {
        self.field_type.accepts_multiple()
    }
}

/// An ordered collection of field specs keyed by field name.
///
/// Declaration order is preserved so errors and extracted values follow the
/// order the form was defined in.
///
/// # Examples
///
/// ```
/// use formflow_forms::{FieldSchema, FieldSpec, FieldType};
///
/// let schema = FieldSchema::new()
///     .field("email", FieldSpec::new(FieldType::Email))
///     .field("name", FieldSpec::new(FieldType::Text { min_length: Some(2), max_length: None }));
/// assert_eq!(schema.len(), 2);
/// assert!(schema.get("email").is_some());
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FieldSchema {
    specs: Vec<(String, FieldSpec)>,
}

impl FieldSchema {
    /// Creates an empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a field spec, replacing any existing spec with the same name.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, spec: FieldSpec) -> Self {
        self.insert(name, spec);
        self
    }

    /// Inserts a field spec, replacing any existing spec with the same name.
    pub fn insert(&mut self, name: impl Into<String>, spec: FieldSpec) {
        let name = name.into();
        if let Some(slot) = self.specs.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = spec;
        } else {
            self.specs.push((name, spec));
        }
    }

    /// Returns the spec for the given field name.
    pub fn get(&self, name: &str) -> Option<&FieldSpec> {
        self.specs.iter().find(|(n, _)| n == name).map(|(_, s)| s)
    }

    /// Returns an iterator over `(name, spec)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldSpec)> {
        self.specs.iter().map(|(n, s)| (n.as_str(), s))
    }

    /// Returns the number of fields.
    pub fn len(&self) -> usize {
        self.specs.len()
    }

    /// Returns `true` if the schema has no fields.
    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

/// A compiled check function for a single field.
///
/// Receives the submitted value (`None` when the field is absent) and
/// returns any validation errors.
pub type FieldCheck = Box<dyn Fn(Option<&Value>) -> Vec<FieldError> + Send + Sync>;

/// A plugin that contributes additional per-field checks at compile time.
///
/// Plugins are attached to a form definition and consulted once per field
/// when the definition is registered. Returning `None` leaves the field
/// with only its built-in checks.
pub trait ValidatorPlugin: Send + Sync {
    /// Compiles an extra check for the given field, if this plugin applies.
    fn compile(&self, field: &str, spec: &FieldSpec) -> Option<FieldCheck>;
}

/// Per-field check functions compiled once from a [`FieldSchema`].
///
/// Checks accumulate errors across all fields rather than stopping at the
/// first failure, so a submission reports every problem at once.
pub struct CompiledValidator {
    checks: Vec<(String, Vec<FieldCheck>)>,
}

impl std::fmt::Debug for CompiledValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledValidator")
            .field("fields", &self.checks.iter().map(|(n, _)| n).collect::<Vec<_>>())
            .finish()
    }
}

impl CompiledValidator {
    /// Compiles a schema and its plugins into per-field checks.
    ///
    /// # Errors
    ///
    /// Returns [`FormFlowError::ConfigurationError`] when a `Pattern` field
    /// carries an invalid regex.
    pub fn compile(
        schema: &FieldSchema,
        plugins: &[Arc<dyn ValidatorPlugin>],
    ) -> FormFlowResult<Self> {
        let mut checks = Vec::with_capacity(schema.len());
        for (name, spec) in schema.iter() {
            let mut field_checks = vec![builtin_check(name, spec)?];
            for plugin in plugins {
                if let Some(check) = plugin.compile(name, spec) {
                    field_checks.push(check);
                }
            }
            checks.push((name.to_string(), field_checks));
        }
        Ok(Self { checks })
    }

    /// Runs every compiled check against the submitted values.
    ///
    /// # Errors
    ///
    /// Returns the accumulated [`FieldError`] descriptors when any check
    /// fails.
    pub fn check(&self, values: &serde_json::Map<String, Value>) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();
        for (name, field_checks) in &self.checks {
            let value = values.get(name).filter(|v| !v.is_null());
            for check in field_checks {
                errors.extend(check(value));
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Returns the names of the fields this validator covers.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.checks.iter().map(|(n, _)| n.as_str())
    }
}

fn builtin_check(field: &str, spec: &FieldSpec) -> FormFlowResult<FieldCheck> {
    let pattern = match &spec.field_type {
        FieldType::Pattern { regex } => Some(Regex::new(regex).map_err(|e| {
            FormFlowError::ConfigurationError(format!("invalid pattern for field '{field}': {e}"))
        })?),
        FieldType::Email => Some(Regex::new(EMAIL_PATTERN).expect("valid regex")),
        FieldType::Url => Some(Regex::new(URL_PATTERN).expect("valid regex")),
        _ => None,
    };

    let field = field.to_string();
    let field_type = spec.field_type.clone();
    let optional = spec.optional;
    let messages = spec.messages.clone();

    Ok(Box::new(move |value| {
        let mut errors = Vec::new();
        let report = |errors: &mut Vec<FieldError>,
                      code: &str,
                      default: &str,
                      expected: Option<String>,
                      actual: Option<String>| {
            errors.push(make_error(
                &field, code, default, &messages, expected, actual,
            ));
        };

        let is_empty = match value {
            None => true,
            Some(Value::String(s)) => s.is_empty(),
            Some(_) => false,
        };
        if is_empty {
            if !optional {
                report(
                    &mut errors,
                    "required",
                    "The '{field}' field is required.",
                    None,
                    None,
                );
            }
            return errors;
        }
        let Some(value) = value else {
            return errors;
        };

        match &field_type {
            FieldType::Text {
                min_length,
                max_length,
            } => match value.as_str() {
                None => report(
                    &mut errors,
                    "string",
                    "The '{field}' field must be a string.",
                    None,
                    Some(value.to_string()),
                ),
                Some(s) => {
                    let len = s.chars().count();
                    if let Some(min) = min_length {
                        if len < *min {
                            report(
                                &mut errors,
                                "stringMin",
                                "The '{field}' field length must be greater than or equal to {expected} characters long.",
                                Some(min.to_string()),
                                Some(len.to_string()),
                            );
                        }
                    }
                    if let Some(max) = max_length {
                        if len > *max {
                            report(
                                &mut errors,
                                "stringMax",
                                "The '{field}' field length must be less than or equal to {expected} characters long.",
                                Some(max.to_string()),
                                Some(len.to_string()),
                            );
                        }
                    }
                }
            },

            FieldType::Email => match value.as_str() {
                Some(s) if pattern.as_ref().is_some_and(|re| re.is_match(s)) => {}
                _ => report(
                    &mut errors,
                    "email",
                    "The '{field}' field must be a valid e-mail.",
                    None,
                    Some(value_text(value)),
                ),
            },

            FieldType::Url => match value.as_str() {
                Some(s) if pattern.as_ref().is_some_and(|re| re.is_match(s)) => {}
                _ => report(
                    &mut errors,
                    "url",
                    "The '{field}' field must be a valid URL.",
                    None,
                    Some(value_text(value)),
                ),
            },

            FieldType::Number { min, max } => {
                let parsed = match value {
                    Value::Number(n) => n.as_f64(),
                    Value::String(s) => s.trim().parse::<f64>().ok(),
                    _ => None,
                };
                match parsed {
                    None => report(
                        &mut errors,
                        "number",
                        "The '{field}' field must be a number.",
                        None,
                        Some(value_text(value)),
                    ),
                    Some(n) => {
                        if let Some(min) = min {
                            if n < *min {
                                report(
                                    &mut errors,
                                    "numberMin",
                                    "The '{field}' field must be greater than or equal to {expected}.",
                                    Some(min.to_string()),
                                    Some(n.to_string()),
                                );
                            }
                        }
                        if let Some(max) = max {
                            if n > *max {
                                report(
                                    &mut errors,
                                    "numberMax",
                                    "The '{field}' field must be less than or equal to {expected}.",
                                    Some(max.to_string()),
                                    Some(n.to_string()),
                                );
                            }
                        }
                    }
                }
            }

            FieldType::Boolean => {
                let ok = match value {
                    Value::Bool(_) => true,
                    Value::String(s) => matches!(
                        s.to_lowercase().as_str(),
                        "true" | "false" | "1" | "0" | "on" | "off"
                    ),
                    _ => false,
                };
                if !ok {
                    report(
                        &mut errors,
                        "boolean",
                        "The '{field}' field must be a boolean.",
                        None,
                        Some(value_text(value)),
                    );
                }
            }

            FieldType::Uuid => match value.as_str() {
                Some(s) if uuid::Uuid::parse_str(s).is_ok() => {}
                _ => report(
                    &mut errors,
                    "uuid",
                    "The '{field}' field must be a valid UUID.",
                    None,
                    Some(value_text(value)),
                ),
            },

            FieldType::Pattern { .. } => match value.as_str() {
                Some(s) if pattern.as_ref().is_some_and(|re| re.is_match(s)) => {}
                _ => report(
                    &mut errors,
                    "stringPattern",
                    "The '{field}' field fails to match the required pattern.",
                    None,
                    Some(value_text(value)),
                ),
            },

            FieldType::File { max_size } => {
                check_file_meta(&mut errors, &report, value, *max_size);
            }

            FieldType::Files { max_size } => match value.as_array() {
                None => report(
                    &mut errors,
                    "file",
                    "The '{field}' field must be an uploaded file.",
                    None,
                    None,
                ),
                Some(items) => {
                    for item in items {
                        check_file_meta(&mut errors, &report, item, *max_size);
                    }
                }
            },
        }

        errors
    }))
}

/// Validates a single upload metadata object against the size cap.
fn check_file_meta(
    errors: &mut Vec<FieldError>,
    report: &impl Fn(&mut Vec<FieldError>, &str, &str, Option<String>, Option<String>),
    value: &Value,
    max_size: Option<usize>,
) {
    let Some(size) = value.get("size").and_then(Value::as_u64) else {
        report(
            errors,
            "file",
            "The '{field}' field must be an uploaded file.",
            None,
            None,
        );
        return;
    };
    if let Some(max) = max_size {
        if size > max as u64 {
            report(
                errors,
                "fileMax",
                "The '{field}' file must not exceed {expected} bytes.",
                Some(max.to_string()),
                Some(size.to_string()),
            );
        }
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn make_error(
    field: &str,
    code: &str,
    default: &str,
    messages: &HashMap<String, String>,
    expected: Option<String>,
    actual: Option<String>,
) -> FieldError {
    let template = messages.get(code).map_or(default, String::as_str);
    let message = template
        .replace("{field}", field)
        .replace("{expected}", expected.as_deref().unwrap_or(""))
        .replace("{actual}", actual.as_deref().unwrap_or(""));

    let mut error = FieldError::new(field, code, message);
    if let Some(expected) = expected {
        error = error.expected(expected);
    }
    if let Some(actual) = actual {
        error = error.actual(actual);
    }
    error
}
