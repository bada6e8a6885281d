//! Form definitions and the types flowing through form processing.
//!
//! A [`FormDefinition`] declares everything the middleware needs to handle
//! one form: the route it answers on (`method` + `action`), the declarative
//! field schema, and an optional process callback invoked after validation.
//! Definitions are built with [`FormDefinition::builder`] and registered in
//! a [`FormRegistry`](crate::registry::FormRegistry).

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use http::Method;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use formflow_core::{FieldError, FormFlowResult};
use formflow_http::{FormData, HttpRequest, HttpResponse, UploadedFile};

use crate::schema::{FieldSchema, ValidatorPlugin};

/// Submitted field values keyed by field name.
pub type FormValues = serde_json::Map<String, serde_json::Value>;

/// Validation errors keyed by field name (or the common-errors key).
pub type FormErrors = HashMap<String, Vec<FieldError>>;

/// The uploads for a single file-typed field.
#[derive(Debug, Clone)]
pub enum FileField {
    /// A `File` field: the first uploaded file.
    Single(UploadedFile),
    /// A `Files` field: every uploaded file, in submission order.
    Multiple(Vec<UploadedFile>),
}

impl FileField {
    /// Returns the first file regardless of arity.
    pub fn first(&self) -> Option<&UploadedFile> {
        match self {
            Self::Single(file) => Some(file),
            Self::Multiple(files) => files.first(),
        }
    }

    /// Returns the number of files.
    pub fn len(&self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::Multiple(files) => files.len(),
        }
    }

    /// Returns `true` if a `Multiple` field carries no files.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Uploaded files keyed by field name.
pub type FormFiles = HashMap<String, FileField>;

/// The lifecycle status of a processed form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormStatus {
    /// Created but not yet validated.
    Initialized,
    /// Validation passed.
    Valid,
    /// Validation or the process callback failed.
    Error,
    /// Processing completed.
    Success,
}

/// The encoding a form declares for its submissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Enctype {
    /// `application/x-www-form-urlencoded`.
    UrlEncoded,
    /// `multipart/form-data`.
    Multipart,
    /// `text/plain`.
    TextPlain,
}

impl Enctype {
    /// Returns the MIME type string for this encoding.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::UrlEncoded => "application/x-www-form-urlencoded",
            Self::Multipart => "multipart/form-data",
            Self::TextPlain => "text/plain",
        }
    }
}

/// The validated form state handed to a process callback.
#[derive(Debug, Clone)]
pub struct FormInfo {
    /// The submitted values.
    pub values: FormValues,
    /// Accumulated validation errors.
    pub errors: FormErrors,
    /// The status after validation.
    pub status: FormStatus,
    /// Uploaded files, populated for multipart submissions.
    pub files: FormFiles,
    /// The rebuilt form data, present for multipart submissions.
    pub form_data: Option<FormData>,
    /// Computed as `status != FormStatus::Error`.
    pub has_errors: bool,
}

/// What a process callback asks the middleware to do next.
#[derive(Debug)]
pub enum CallbackOutcome {
    /// Proceed with the validated state unchanged.
    Continue,
    /// Return this response immediately, skipping the rest of the pipeline.
    ///
    /// Redirect responses are rewritten for HTMX clients before being sent.
    ShortCircuit(HttpResponse),
    /// Merge values and append errors into the form state, then proceed.
    Update {
        /// Values merged over the extracted ones, key by key.
        values: Option<FormValues>,
        /// Errors appended per field; any entry forces the status to
        /// [`FormStatus::Error`].
        errors: Option<FormErrors>,
    },
}

/// The boxed future returned by a process callback.
pub type CallbackFuture<'a> =
    Pin<Box<dyn Future<Output = FormFlowResult<CallbackOutcome>> + Send + 'a>>;

/// An async callback invoked with the validated form state and the request.
///
/// Callbacks typically persist the submission, then either redirect
/// ([`CallbackOutcome::ShortCircuit`]) or let rendering continue
/// downstream. A returned `Err` is recorded under the common-errors key and
/// never aborts the request.
pub type ProcessCallback =
    Arc<dyn for<'a> Fn(FormInfo, &'a mut HttpRequest) -> CallbackFuture<'a> + Send + Sync>;

/// A registered form: route, schema, and processing callback.
///
/// # Examples
///
/// ```
/// use formflow_forms::{FieldSchema, FieldSpec, FieldType, FormDefinition};
///
/// let definition = FormDefinition::builder("login")
///     .method(http::Method::POST)
///     .action("/login")
///     .fields(FieldSchema::new().field("email", FieldSpec::new(FieldType::Email)))
///     .build();
///
/// assert_eq!(definition.name, "login");
/// assert_eq!(definition.action, "/login");
/// ```
#[derive(Clone)]
pub struct FormDefinition {
    /// Unique identifier, generated as a UUID v4 when not supplied.
    pub id: String,
    /// The name matched against the submitted `form_id`.
    pub name: String,
    /// The HTTP method this form answers on.
    pub method: Method,
    /// The path this form answers on.
    pub action: String,
    /// The declarative field schema, when the form validates its input.
    pub fields: Option<FieldSchema>,
    /// The callback invoked after validation.
    pub process: Option<ProcessCallback>,
    /// Values used to pre-populate a rendered form.
    pub initial_values: Option<FormValues>,
    /// The declared submission encoding.
    pub enctype: Option<Enctype>,
    /// Plugins contributing extra checks when the validator is compiled.
    pub validator_plugins: Vec<Arc<dyn ValidatorPlugin>>,
    /// Marker recorded at registration for generated one-off forms.
    pub is_random: bool,
}

impl std::fmt::Debug for FormDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormDefinition")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("method", &self.method)
            .field("action", &self.action)
            .field("fields", &self.fields)
            .field("has_process", &self.process.is_some())
            .field("enctype", &self.enctype)
            .field("is_random", &self.is_random)
            .finish_non_exhaustive()
    }
}

impl FormDefinition {
    /// Creates a builder for a form with the given name.
    pub fn builder(name: impl Into<String>) -> FormDefinitionBuilder {
        FormDefinitionBuilder::new(name)
    }
}

/// Builder for [`FormDefinition`].
pub struct FormDefinitionBuilder {
    id: Option<String>,
    name: String,
    method: Method,
    action: String,
    fields: Option<FieldSchema>,
    process: Option<ProcessCallback>,
    initial_values: Option<FormValues>,
    enctype: Option<Enctype>,
    validator_plugins: Vec<Arc<dyn ValidatorPlugin>>,
}

impl FormDefinitionBuilder {
    fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            method: Method::POST,
            action: "/".to_string(),
            fields: None,
            process: None,
            initial_values: None,
            enctype: None,
            validator_plugins: Vec::new(),
        }
    }

    /// Sets an explicit identifier instead of a generated UUID.
    #[must_use]
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Sets the HTTP method. Defaults to `POST`.
    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Sets the action path.
    #[must_use]
    pub fn action(mut self, action: impl Into<String>) -> Self {
        self.action = action.into();
        self
    }

    /// Sets the field schema.
    #[must_use]
    pub fn fields(mut self, fields: FieldSchema) -> Self {
        self.fields = Some(fields);
        self
    }

    /// Sets the process callback.
    #[must_use]
    pub fn process<F>(mut self, callback: F) -> Self
    where
        F: for<'a> Fn(FormInfo, &'a mut HttpRequest) -> CallbackFuture<'a>
            + Send
            + Sync
            + 'static,
    {
        self.process = Some(Arc::new(callback));
        self
    }

    /// Sets the initial values.
    #[must_use]
    pub fn initial_values(mut self, values: FormValues) -> Self {
        self.initial_values = Some(values);
        self
    }

    /// Sets the declared encoding.
    #[must_use]
    pub const fn enctype(mut self, enctype: Enctype) -> Self {
        self.enctype = Some(enctype);
        self
    }

    /// Adds a validator plugin.
    #[must_use]
    pub fn plugin(mut self, plugin: Arc<dyn ValidatorPlugin>) -> Self {
        self.validator_plugins.push(plugin);
        self
    }

    /// Builds the [`FormDefinition`], generating a UUID v4 id if none was set.
    pub fn build(self) -> FormDefinition {
        FormDefinition {
            id: self.id.unwrap_or_else(|| Uuid::new_v4().to_string()),
            name: self.name,
            method: self.method,
            action: self.action,
            fields: self.fields,
            process: self.process,
            initial_values: self.initial_values,
            enctype: self.enctype,
            validator_plugins: self.validator_plugins,
            is_random: false,
        }
    }
}

/// The final form state attached to the request after processing.
///
/// Downstream handlers read it from the request extensions:
///
/// ```
/// use formflow_forms::ProcessedForm;
/// use formflow_http::HttpRequest;
///
/// fn render(request: &HttpRequest) -> String {
///     match request.extensions().get::<ProcessedForm>() {
///         Some(form) if form.is_success => "thanks".to_string(),
///         Some(form) => format!("{} issue(s)", form.errors.len()),
///         None => "no form".to_string(),
///     }
/// }
/// ```
#[derive(Debug, Clone)]
pub struct ProcessedForm {
    /// The definition's identifier.
    pub id: String,
    /// The definition's name.
    pub name: String,
    /// The final values, including any callback updates.
    pub values: FormValues,
    /// The final errors, including any callback failures.
    pub errors: FormErrors,
    /// The final status.
    pub status: FormStatus,
    /// Uploaded files, for multipart submissions.
    pub files: FormFiles,
    /// The rebuilt form data, for multipart submissions.
    pub form_data: Option<FormData>,
    /// Computed as `status != FormStatus::Error`.
    pub has_errors: bool,
    /// Computed as `status == FormStatus::Success`.
    pub is_success: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let definition = FormDefinition::builder("contact").build();
        assert_eq!(definition.name, "contact");
        assert_eq!(definition.method, Method::POST);
        assert_eq!(definition.action, "/");
        assert!(definition.fields.is_none());
        assert!(definition.process.is_none());
        assert!(!definition.is_random);
    }

    #[test]
    fn test_builder_generates_uuid_id() {
        let definition = FormDefinition::builder("contact").build();
        assert!(Uuid::parse_str(&definition.id).is_ok());
    }

    #[test]
    fn test_builder_explicit_id() {
        let definition = FormDefinition::builder("contact").id("contact-1").build();
        assert_eq!(definition.id, "contact-1");
    }

    #[test]
    fn test_builder_full_chain() {
        use crate::schema::{FieldSpec, FieldType};

        let definition = FormDefinition::builder("signup")
            .method(Method::PUT)
            .action("/signup")
            .enctype(Enctype::Multipart)
            .fields(FieldSchema::new().field("email", FieldSpec::new(FieldType::Email)))
            .build();

        assert_eq!(definition.method, Method::PUT);
        assert_eq!(definition.action, "/signup");
        assert_eq!(definition.enctype, Some(Enctype::Multipart));
        assert_eq!(definition.fields.unwrap().len(), 1);
    }

    #[test]
    fn test_enctype_mime_strings() {
        assert_eq!(
            Enctype::UrlEncoded.as_str(),
            "application/x-www-form-urlencoded"
        );
        assert_eq!(Enctype::Multipart.as_str(), "multipart/form-data");
        assert_eq!(Enctype::TextPlain.as_str(), "text/plain");
    }

    #[test]
    fn test_form_status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&FormStatus::Initialized).unwrap(),
            "\"initialized\""
        );
        assert_eq!(
            serde_json::to_string(&FormStatus::Error).unwrap(),
            "\"error\""
        );
    }

    #[test]
    fn test_file_field_first_and_len() {
        let file = UploadedFile {
            name: "a.txt".to_string(),
            content_type: "text/plain".to_string(),
            size: 1,
            content: b"a".to_vec(),
            last_modified: None,
        };

        let single = FileField::Single(file.clone());
        assert_eq!(single.len(), 1);
        assert_eq!(single.first().unwrap().name, "a.txt");

        let multiple = FileField::Multiple(vec![file.clone(), file]);
        assert_eq!(multiple.len(), 2);
        assert!(!multiple.is_empty());

        let empty = FileField::Multiple(Vec::new());
        assert!(empty.is_empty());
        assert!(empty.first().is_none());
    }

    #[test]
    fn test_definition_debug_hides_callback() {
        fn noop(_info: FormInfo, _request: &mut HttpRequest) -> CallbackFuture<'_> {
            Box::pin(async { Ok(CallbackOutcome::Continue) })
        }

        let definition = FormDefinition::builder("contact").process(noop).build();
        let debug = format!("{definition:?}");
        assert!(debug.contains("has_process: true"));
    }
}
