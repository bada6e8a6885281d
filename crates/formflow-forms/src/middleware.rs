//! The form-processing middleware and the pipeline that hosts it.
//!
//! Middleware is processed in order for requests (first added = first to
//! process) and in reverse order for responses (first added = last to
//! process), the onion model. Unlike the response phase, the request phase
//! is fallible: a middleware that cannot process its request fails the
//! whole pipeline invocation.
//!
//! [`FormsMiddleware`] is the centerpiece: it matches requests against the
//! registry, extracts and validates the submission, runs the definition's
//! process callback, and attaches the resulting [`ProcessedForm`] to the
//! request's extensions for the view to read.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use formflow_core::logging::form_span;
use formflow_core::settings::Settings;
use formflow_core::FormFlowResult;
use formflow_http::request::HttpRequest;
use formflow_http::response::HttpResponse;
use http::header::{HeaderName, LOCATION};
use tracing::Instrument;

use crate::definition::{CallbackOutcome, FormDefinition, FormInfo, FormStatus, ProcessedForm};
use crate::extract::{extract_form_data, FORM_ID_KEY};
use crate::registry::FormRegistry;
use crate::validate::{merge_errors, push_common_error, validate_form};

/// The response header that tells an HTMX client to navigate.
const HX_REDIRECT: HeaderName = HeaderName::from_static("hx-redirect");

/// The type for an async view handler function used in the pipeline.
///
/// Handlers borrow the request mutably so they can read what earlier
/// middleware attached to its extensions.
pub type ViewHandler = Box<
    dyn for<'a> Fn(&'a mut HttpRequest) -> Pin<Box<dyn Future<Output = HttpResponse> + Send + 'a>>
        + Send
        + Sync,
>;

/// A middleware component that can process requests and responses.
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use formflow_core::FormFlowResult;
/// use formflow_forms::Middleware;
/// use formflow_http::{HttpRequest, HttpResponse};
///
/// struct LoggingMiddleware;
///
/// #[async_trait]
/// impl Middleware for LoggingMiddleware {
///     async fn process_request(
///         &self,
///         request: &mut HttpRequest,
///     ) -> FormFlowResult<Option<HttpResponse>> {
///         tracing::debug!(path = %request.path(), "request received");
///         Ok(None) // Allow request to continue
///     }
/// }
/// ```
#[async_trait]
pub trait Middleware: Send + Sync {
    /// Process an incoming request before it reaches the view.
    ///
    /// Return `Ok(Some(HttpResponse))` to short-circuit the pipeline and
    /// skip the view. Return `Ok(None)` to allow the request to continue
    /// to the next middleware and eventually the view. An `Err` fails the
    /// pipeline invocation.
    async fn process_request(
        &self,
        request: &mut HttpRequest,
    ) -> FormFlowResult<Option<HttpResponse>>;

    /// Process the response after the view has been called.
    ///
    /// This is called in reverse middleware order (last added = first to
    /// process the response).
    async fn process_response(
        &self,
        request: &HttpRequest,
        response: HttpResponse,
    ) -> HttpResponse {
        let _ = request;
        response
    }
}

/// A pipeline of middleware components that processes requests and responses.
///
/// The pipeline runs middleware in order for requests and in reverse order
/// for responses.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use formflow_forms::{FormRegistry, FormsMiddleware, MiddlewarePipeline};
///
/// let registry = Arc::new(FormRegistry::new());
/// let mut pipeline = MiddlewarePipeline::new();
/// pipeline.add(FormsMiddleware::new(registry));
/// ```
pub struct MiddlewarePipeline {
    middlewares: Vec<Box<dyn Middleware>>,
}

impl Default for MiddlewarePipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl MiddlewarePipeline {
    /// Creates a new empty middleware pipeline.
    pub fn new() -> Self {
        Self {
            middlewares: Vec::new(),
        }
    }

    /// Adds a middleware to the end of the pipeline.
    pub fn add(&mut self, middleware: impl Middleware + 'static) {
        self.middlewares.push(Box::new(middleware));
    }

    /// Returns the number of middleware components in the pipeline.
    pub fn len(&self) -> usize {
        self.middlewares.len()
    }

    /// Returns `true` if the pipeline has no middleware components.
    pub fn is_empty(&self) -> bool {
        self.middlewares.is_empty()
    }

    /// Processes a request through the full middleware pipeline and view handler.
    ///
    /// 1. Calls `process_request` on each middleware in order. If any returns
    ///    `Ok(Some(response))`, short-circuits and runs `process_response` in
    ///    reverse on only the middleware that already ran.
    /// 2. Calls the view handler.
    /// 3. Calls `process_response` on each middleware in reverse order.
    ///
    /// # Errors
    ///
    /// Propagates the first error returned by a `process_request` phase.
    pub async fn process(
        &self,
        request: &mut HttpRequest,
        handler: &ViewHandler,
    ) -> FormFlowResult<HttpResponse> {
        // Phase 1: process_request (forward order)
        for (i, mw) in self.middlewares.iter().enumerate() {
            if let Some(response) = mw.process_request(request).await? {
                // Short-circuit: run process_response on already-processed middleware
                let mut resp = response;
                for j in (0..=i).rev() {
                    resp = self.middlewares[j].process_response(request, resp).await;
                }
                return Ok(resp);
            }
        }

        // Phase 2: call the view handler
        let response = handler(request).await;

        // Phase 3: process_response (reverse order)
        let mut resp = response;
        for mw in self.middlewares.iter().rev() {
            resp = mw.process_response(request, resp).await;
        }

        Ok(resp)
    }
}

impl std::fmt::Debug for MiddlewarePipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MiddlewarePipeline")
            .field("middlewares", &self.middlewares.len())
            .finish()
    }
}

/// The form-processing middleware.
///
/// For each request it asks the registry for a matching [`FormDefinition`].
/// When one matches, the submission is extracted and validated, the
/// definition's process callback runs, and the final [`ProcessedForm`] is
/// attached to the request's typed extensions. Requests that match no
/// definition pass through untouched.
pub struct FormsMiddleware {
    registry: Arc<FormRegistry>,
    settings: Settings,
}

impl FormsMiddleware {
    /// Creates a middleware over `registry` with default settings.
    pub fn new(registry: Arc<FormRegistry>) -> Self {
        Self::with_settings(registry, Settings::default())
    }

    /// Creates a middleware over `registry` with explicit settings.
    pub fn with_settings(registry: Arc<FormRegistry>, settings: Settings) -> Self {
        Self { registry, settings }
    }

    async fn run_form(
        &self,
        definition: FormDefinition,
        request: &mut HttpRequest,
    ) -> FormFlowResult<Option<HttpResponse>> {
        let max_memory = self.settings.file_upload_max_memory_size;
        let Some(extracted) = extract_form_data(request, &definition, max_memory)? else {
            tracing::debug!(form = %definition.name, "no submission for this definition");
            return Ok(None);
        };

        tracing::debug!(
            form = %definition.name,
            fields = extracted.values.len(),
            files = extracted.files.len(),
            "submission extracted"
        );

        let validator = self.registry.validator(&definition.name);
        let validation = validate_form(extracted.values, validator.as_deref());
        let mut values = validation.values;
        let mut errors = validation.errors;
        let mut status = validation.status;

        tracing::debug!(form = %definition.name, status = ?status, "submission validated");

        if let Some(process) = &definition.process {
            let info = FormInfo {
                values: values.clone(),
                errors: errors.clone(),
                status,
                files: extracted.files.clone(),
                form_data: extracted.form_data.clone(),
                has_errors: status != FormStatus::Error,
            };
            match process(info, request).await {
                Ok(CallbackOutcome::Continue) => {}
                Ok(CallbackOutcome::ShortCircuit(response)) => {
                    return Ok(Some(rewrite_for_htmx(response, request)));
                }
                Ok(CallbackOutcome::Update {
                    values: updated,
                    errors: appended,
                }) => {
                    if let Some(updated) = updated {
                        for (key, value) in updated {
                            values.insert(key, value);
                        }
                    }
                    if let Some(appended) = appended {
                        if !appended.is_empty() {
                            status = FormStatus::Error;
                        }
                        merge_errors(&mut errors, appended);
                    }
                }
                Err(e) => {
                    tracing::warn!(form = %definition.name, error = %e, "process callback failed");
                    push_common_error(&mut errors, "callback", e.to_string());
                    status = FormStatus::Error;
                }
            }
        }

        let processed = ProcessedForm {
            id: definition.id.clone(),
            name: definition.name.clone(),
            values,
            errors,
            status,
            files: extracted.files,
            form_data: extracted.form_data,
            has_errors: status != FormStatus::Error,
            is_success: status == FormStatus::Success,
        };
        request.extensions_mut().insert(processed);

        Ok(None)
    }
}

#[async_trait]
impl Middleware for FormsMiddleware {
    async fn process_request(
        &self,
        request: &mut HttpRequest,
    ) -> FormFlowResult<Option<HttpResponse>> {
        let form_id = request.get().get(FORM_ID_KEY).map(str::to_owned);
        let Some(definition) = self.registry.get_request_form_definition(
            request.method(),
            request.path(),
            form_id.as_deref(),
        ) else {
            return Ok(None);
        };

        let span = form_span(&definition.name);
        self.run_form(definition, request).instrument(span).await
    }
}

/// Moves a redirect's `Location` into `HX-Redirect` for HTMX clients.
///
/// HTMX ignores HTTP redirects on AJAX responses, so a redirecting
/// callback response targeted at an HTMX request is rewritten to the
/// header HTMX acts on. Non-redirects and non-HTMX requests pass through
/// unchanged.
fn rewrite_for_htmx(mut response: HttpResponse, request: &HttpRequest) -> HttpResponse {
    if response.is_redirect() && request.is_htmx() {
        if let Some(location) = response.headers_mut().remove(LOCATION) {
            response.headers_mut().insert(HX_REDIRECT, location);
        }
    }
    response
}
