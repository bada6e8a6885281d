//! # formflow
//!
//! Declarative form-processing middleware for Rust HTTP pipelines.
//!
//! This is the meta-crate that re-exports all sub-crates for convenient
//! access. You can depend on `formflow` to get the whole middleware, or
//! depend on individual crates for finer-grained control.
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use formflow::{
//!     AddFormOptions, FieldSchema, FieldSpec, FieldType, FormDefinition,
//!     FormRegistry, FormsMiddleware, MiddlewarePipeline,
//! };
//!
//! let registry = Arc::new(FormRegistry::new());
//! registry.add_form(
//!     "login",
//!     FormDefinition::builder("login")
//!         .action("/login")
//!         .fields(FieldSchema::new().field("email", FieldSpec::new(FieldType::Email)))
//!         .build(),
//!     AddFormOptions::default(),
//! )?;
//!
//! let mut pipeline = MiddlewarePipeline::new();
//! pipeline.add(FormsMiddleware::new(registry));
//! # Ok::<(), formflow::FormFlowError>(())
//! ```

/// Core types: errors, settings, and logging integration.
pub use formflow_core as core;

/// HTTP layer: requests, responses, query parsing, multipart uploads.
pub use formflow_http as http_types;

/// Form definitions, validation, registry, and the middleware itself.
pub use formflow_forms as forms;

// Third-party re-exports so applications can match the middleware's
// versions without declaring them separately.
pub use async_trait;
pub use http;
pub use serde_json;
pub use tracing;

pub use formflow_core::{FieldError, FormFlowError, FormFlowResult, Settings};
pub use formflow_forms::{
    AddFormOptions, CallbackFuture, CallbackOutcome, CompiledValidator, Enctype, FieldSchema,
    FieldSpec, FieldType, FileField, FormDefinition, FormDefinitionBuilder, FormErrors, FormFiles,
    FormInfo, FormRegistry, FormStatus, FormValues, FormsMiddleware, Middleware,
    MiddlewarePipeline, ProcessCallback, ProcessedForm, ValidatorPlugin, ViewHandler,
    COMMON_ERRORS_KEY, FORM_ID_KEY,
};
pub use formflow_http::{
    FormData, FormEntry, HttpRequest, HttpRequestBuilder, HttpResponse, JsonResponse, QueryDict,
    UploadedFile,
};
