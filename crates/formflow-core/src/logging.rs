//! Logging integration for formflow.
//!
//! Provides helpers for configuring [`tracing`]-based logging from
//! [`Settings`](crate::settings::Settings) and for creating per-request spans.

use crate::settings::Settings;

/// Sets up the global tracing subscriber based on the given settings.
///
/// The log level is read from `settings.log_level` (e.g. "debug", "info",
/// "warn", "error"). In debug mode a pretty, human-readable format is used;
/// in production a structured JSON format is used.
///
/// Installing a second subscriber is a no-op, so this is safe to call from
/// tests that share a process.
pub fn setup_logging(settings: &Settings) {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_new(&settings.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    if settings.debug {
        fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(false)
            .with_file(true)
            .with_line_number(true)
            .pretty()
            .try_init()
            .ok();
    } else {
        fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_target(true)
            .json()
            .try_init()
            .ok();
    }
}

/// Creates a tracing span for a form submission.
///
/// Attach this span to the processing pipeline so that all log entries
/// emitted while handling the submission include the form name.
///
/// # Examples
///
/// ```
/// use formflow_core::logging::form_span;
///
/// let span = form_span("login-form");
/// let _guard = span.enter();
/// tracing::info!("processing submission");
/// ```
pub fn form_span(form_name: &str) -> tracing::Span {
    tracing::info_span!("form", name = form_name)
}
