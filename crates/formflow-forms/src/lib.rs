//! # formflow-forms
//!
//! Form definitions, validation, and the form-processing middleware.
//!
//! Applications register named [`FormDefinition`]s (route, field schema,
//! process callback) in a [`FormRegistry`]. The [`FormsMiddleware`]
//! matches incoming requests against the registry, extracts the submitted
//! values, validates them against the definition's compiled schema, runs
//! the process callback, and attaches a [`ProcessedForm`] to the request
//! for the view to read. Redirecting callback responses are rewritten to
//! `HX-Redirect` for HTMX clients.
//!
//! ## Modules
//!
//! - [`schema`] - Field schemas and compiled validators
//! - [`definition`] - Form definitions, callbacks, and processed results
//! - [`registry`] - The shared definition store and validator cache
//! - [`extract`] - Pulling submitted values out of a request
//! - [`validate`] - Running a compiled validator over a submission
//! - [`middleware`] - The middleware trait, pipeline, and [`FormsMiddleware`]

pub mod definition;
pub mod extract;
pub mod middleware;
pub mod registry;
pub mod schema;
pub mod validate;

pub use definition::{
    CallbackFuture, CallbackOutcome, Enctype, FileField, FormDefinition, FormDefinitionBuilder,
    FormErrors, FormFiles, FormInfo, FormStatus, FormValues, ProcessCallback, ProcessedForm,
};
pub use extract::{extract_form_data, ExtractedForm, FORM_ID_KEY};
pub use middleware::{FormsMiddleware, Middleware, MiddlewarePipeline, ViewHandler};
pub use registry::{AddFormOptions, FormRegistry};
pub use schema::{
    CompiledValidator, FieldCheck, FieldSchema, FieldSpec, FieldType, ValidatorPlugin,
};
pub use validate::{validate_form, FormValidation, COMMON_ERRORS_KEY};
