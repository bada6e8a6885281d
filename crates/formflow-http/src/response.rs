//! HTTP response types.
//!
//! This module provides [`HttpResponse`] with constructors for the response
//! patterns the form pipeline produces (text, bytes, JSON, redirects), plus
//! redirect inspection helpers used by the HTMX rewrite step.

use std::pin::Pin;

use axum::response::IntoResponse;
use bytes::Bytes;
use futures_core::Stream;
use http::{HeaderMap, HeaderValue, StatusCode};

use formflow_core::FormFlowError;

/// Status codes treated as redirects by the HTMX rewrite step.
pub const REDIRECT_CODES: [u16; 5] = [301, 302, 303, 307, 308];

/// The body content of an HTTP response.
///
/// Supports plain bytes, text, and streaming bodies.
pub enum ResponseContent {
    /// Raw bytes.
    Bytes(Vec<u8>),
    /// UTF-8 text.
    Text(String),
    /// A streaming body.
    Streaming(Pin<Box<dyn Stream<Item = Result<Bytes, FormFlowError>> + Send>>),
}

impl std::fmt::Debug for ResponseContent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bytes(b) => f.debug_tuple("Bytes").field(&b.len()).finish(),
            Self::Text(t) => f
                .debug_tuple("Text")
                .field(&t.chars().take(100).collect::<String>())
                .finish(),
            Self::Streaming(_) => f.debug_tuple("Streaming").finish(),
        }
    }
}

/// An HTTP response.
///
/// Supports setting status codes, headers, content type, charset, and body
/// content. Convertible to an Axum response via [`IntoResponse`].
///
/// # Examples
///
/// ```
/// use formflow_http::HttpResponse;
///
/// let response = HttpResponse::ok("Hello, World!");
/// assert_eq!(response.status(), http::StatusCode::OK);
///
/// let redirect = HttpResponse::redirect("/thanks");
/// assert!(redirect.is_redirect());
/// assert_eq!(redirect.location(), Some("/thanks"));
/// ```
pub struct HttpResponse {
    status: StatusCode,
    headers: HeaderMap,
    content: ResponseContent,
    charset: String,
    content_type: String,
}

impl std::fmt::Debug for HttpResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpResponse")
            .field("status", &self.status)
            .field("content_type", &self.content_type)
            .field("charset", &self.charset)
            .field("content", &self.content)
            .finish_non_exhaustive()
    }
}

impl HttpResponse {
    /// Creates a new `HttpResponse` with the given status code and text body.
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            content: ResponseContent::Text(body.into()),
            charset: "utf-8".to_string(),
            content_type: "text/html".to_string(),
        }
    }

    /// Creates a new `HttpResponse` with the given status code and byte body.
    pub fn with_bytes(status: StatusCode, body: Vec<u8>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            content: ResponseContent::Bytes(body),
            charset: "utf-8".to_string(),
            content_type: "application/octet-stream".to_string(),
        }
    }

    /// Creates a streaming response.
    pub fn streaming(
        stream: Pin<Box<dyn Stream<Item = Result<Bytes, FormFlowError>> + Send>>,
    ) -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            content: ResponseContent::Streaming(stream),
            charset: "utf-8".to_string(),
            content_type: "application/octet-stream".to_string(),
        }
    }

    /// Creates a 200 OK response with the given body.
    pub fn ok(body: impl Into<String>) -> Self {
        Self::new(StatusCode::OK, body)
    }

    /// Creates a 400 Bad Request response.
    pub fn bad_request(body: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, body)
    }

    /// Creates a 404 Not Found response.
    pub fn not_found(body: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, body)
    }

    /// Creates a 500 Internal Server Error response.
    pub fn server_error(body: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, body)
    }

    /// Creates a 302 Found redirect to the given URL.
    pub fn redirect(url: &str) -> Self {
        Self::redirect_with_status(StatusCode::FOUND, url)
    }

    /// Creates a 301 Moved Permanently redirect to the given URL.
    pub fn permanent_redirect(url: &str) -> Self {
        Self::redirect_with_status(StatusCode::MOVED_PERMANENTLY, url)
    }

    /// Creates a 303 See Other redirect to the given URL.
    pub fn see_other(url: &str) -> Self {
        Self::redirect_with_status(StatusCode::SEE_OTHER, url)
    }

    /// Creates a redirect with the given status code and target URL.
    ///
    /// A URL that is not a valid header value is silently dropped, leaving
    /// a redirect with no `Location` header.
    pub fn redirect_with_status(status: StatusCode, url: &str) -> Self {
        let mut response = Self::new(status, "");
        if let Ok(value) = HeaderValue::from_str(url) {
            response.headers.insert(http::header::LOCATION, value);
        }
        response
    }

    /// Returns `true` if the status code is one of [`REDIRECT_CODES`].
    pub fn is_redirect(&self) -> bool {
        REDIRECT_CODES.contains(&self.status.as_u16())
    }

    /// Returns the `Location` header value, if present.
    pub fn location(&self) -> Option<&str> {
        self.headers
            .get(http::header::LOCATION)
            .and_then(|v| v.to_str().ok())
    }

    /// Returns the status code.
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Sets the status code.
    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    /// Returns a reference to the headers.
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns a mutable reference to the headers.
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Adds a header to the response.
    #[must_use]
    pub fn set_header(mut self, name: http::header::HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Returns the charset.
    pub fn charset(&self) -> &str {
        &self.charset
    }

    /// Sets the charset.
    pub fn set_charset(&mut self, charset: impl Into<String>) {
        self.charset = charset.into();
    }

    /// Returns the content type.
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Sets the content type.
    pub fn set_content_type(&mut self, content_type: impl Into<String>) {
        self.content_type = content_type.into();
    }

    /// Returns the response body as a reference to the content enum.
    pub const fn content(&self) -> &ResponseContent {
        &self.content
    }

    /// Returns the body as bytes, if available (not streaming).
    pub fn content_bytes(&self) -> Option<Vec<u8>> {
        match &self.content {
            ResponseContent::Bytes(b) => Some(b.clone()),
            ResponseContent::Text(t) => Some(t.as_bytes().to_vec()),
            ResponseContent::Streaming(_) => None,
        }
    }

    /// Returns the full content type header value including charset.
    fn full_content_type(&self) -> String {
        if self.content_type.starts_with("text/") || self.content_type.contains("json") {
            format!("{}; charset={}", self.content_type, self.charset)
        } else {
            self.content_type.clone()
        }
    }
}

impl IntoResponse for HttpResponse {
    fn into_response(self) -> axum::response::Response {
        let mut builder = axum::response::Response::builder().status(self.status);

        if let Ok(ct) = HeaderValue::from_str(&self.full_content_type()) {
            builder = builder.header(http::header::CONTENT_TYPE, ct);
        }

        let response = match self.content {
            ResponseContent::Text(text) => builder
                .body(axum::body::Body::from(text))
                .unwrap_or_else(|_| fallback_response()),
            ResponseContent::Bytes(bytes) => builder
                .body(axum::body::Body::from(bytes))
                .unwrap_or_else(|_| fallback_response()),
            ResponseContent::Streaming(stream) => builder
                .body(axum::body::Body::from_stream(stream))
                .unwrap_or_else(|_| fallback_response()),
        };

        let (mut parts, body) = response.into_parts();
        for (key, value) in &self.headers {
            parts.headers.insert(key, value.clone());
        }
        axum::response::Response::from_parts(parts, body)
    }
}

fn fallback_response() -> axum::response::Response {
    axum::response::Response::builder()
        .status(StatusCode::INTERNAL_SERVER_ERROR)
        .body(axum::body::Body::from("Internal Server Error"))
        .expect("fallback response should always be valid")
}

/// A JSON response helper.
///
/// Serializes the given data as JSON and sets the content type to
/// `application/json`.
pub struct JsonResponse;

impl JsonResponse {
    /// Creates a new JSON response from a serializable value.
    ///
    /// Returns an error response if serialization fails.
    pub fn new<T: serde::Serialize>(data: &T) -> HttpResponse {
        Self::with_status(StatusCode::OK, data)
    }

    /// Creates a new JSON response with a custom status code.
    ///
    /// Returns an error response if serialization fails.
    pub fn with_status<T: serde::Serialize>(status: StatusCode, data: &T) -> HttpResponse {
        match serde_json::to_string(data) {
            Ok(json) => {
                let mut response = HttpResponse::new(status, json);
                response.set_content_type("application/json");
                response
            }
            Err(e) => HttpResponse::server_error(format!("JSON serialization error: {e}")),
        }
    }
}
