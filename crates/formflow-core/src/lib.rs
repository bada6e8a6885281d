//! # formflow-core
//!
//! Core types for the formflow middleware: error types, settings, and
//! logging integration. This crate has no HTTP dependencies and provides
//! the foundation for the other crates.
//!
//! ## Modules
//!
//! - [`error`] - Error types, field-error descriptors, and result aliases
//! - [`settings`] - Middleware settings and configuration loading
//! - [`logging`] - Tracing-based logging integration

pub mod error;
pub mod logging;
pub mod settings;

// Re-export the most commonly used types at the crate root.
pub use error::{FieldError, FormFlowError, FormFlowResult};
pub use settings::Settings;
