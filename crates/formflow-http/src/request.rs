//! HTTP request type.
//!
//! [`HttpRequest`] provides access to the request method, path, headers,
//! query parameters, and a one-shot body. Typed request-scoped state (the
//! processed form, rebuilt form data) travels in the request extensions.

use http::{Extensions, HeaderMap, Method};

use crate::formdata::FormData;
use crate::querydict::QueryDict;

/// An HTTP request as seen by the form-processing pipeline.
///
/// The body is one-shot: parsing a submission consumes it via
/// [`take_body`](HttpRequest::take_body), and the extractor attaches a
/// buffered [`FormData`] in its place. Instances are typically created from
/// an incoming Axum request via [`HttpRequest::from_axum`], or with the
/// builder in tests.
///
/// # Examples
///
/// ```
/// use formflow_http::HttpRequest;
///
/// let request = HttpRequest::builder()
///     .method(http::Method::GET)
///     .path("/contact")
///     .query_string("form_id=contact")
///     .build();
///
/// assert_eq!(request.method(), &http::Method::GET);
/// assert_eq!(request.get().get("form_id"), Some("contact"));
/// ```
#[derive(Debug)]
pub struct HttpRequest {
    method: Method,
    path: String,
    query_string: String,
    content_type: Option<String>,
    get: QueryDict,
    headers: HeaderMap,
    body: Option<Vec<u8>>,
    extensions: Extensions,
    form_data: Option<FormData>,
    scheme: String,
}

impl HttpRequest {
    /// Creates a new [`HttpRequestBuilder`] for constructing an `HttpRequest`.
    pub fn builder() -> HttpRequestBuilder {
        HttpRequestBuilder::default()
    }

    /// Creates an `HttpRequest` from an Axum/hyper request and its body bytes.
    pub fn from_axum(parts: http::request::Parts, body: Vec<u8>) -> Self {
        let method = parts.method;
        let uri = parts.uri;
        let headers = parts.headers;

        let path = uri.path().to_string();
        let query_string = uri.query().unwrap_or("").to_string();
        let get = QueryDict::parse(&query_string);

        let content_type = headers
            .get(http::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(String::from);

        let scheme = if headers
            .get("x-forwarded-proto")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v == "https")
        {
            "https".to_string()
        } else {
            "http".to_string()
        };

        Self {
            method,
            path,
            query_string,
            content_type,
            get,
            headers,
            body: Some(body),
            extensions: Extensions::new(),
            form_data: None,
            scheme,
        }
    }

    /// Returns the HTTP method.
    pub const fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the request path (without query string).
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the raw query string (without the leading `?`).
    pub fn query_string(&self) -> &str {
        &self.query_string
    }

    /// Returns the content type of the request body, if set.
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Returns the GET query parameters as a [`QueryDict`].
    pub const fn get(&self) -> &QueryDict {
        &self.get
    }

    /// Returns the request headers.
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the raw body bytes without consuming them, if still present.
    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    /// Takes the request body, leaving `None` in its place.
    ///
    /// Returns `None` if the body was already consumed.
    pub fn take_body(&mut self) -> Option<Vec<u8>> {
        self.body.take()
    }

    /// Returns `true` if the request uses HTTPS.
    pub fn is_secure(&self) -> bool {
        self.scheme == "https"
    }

    /// Returns `true` if the request came from an HTMX client.
    ///
    /// Checks for the `Hx-Request: true` header that HTMX attaches to
    /// every request it issues.
    pub fn is_htmx(&self) -> bool {
        self.headers
            .get("hx-request")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.eq_ignore_ascii_case("true"))
    }

    /// Returns the full path including the query string.
    ///
    /// # Examples
    ///
    /// ```
    /// use formflow_http::HttpRequest;
    ///
    /// let request = HttpRequest::builder()
    ///     .path("/contact")
    ///     .query_string("form_id=contact")
    ///     .build();
    /// assert_eq!(request.get_full_path(), "/contact?form_id=contact");
    /// ```
    pub fn get_full_path(&self) -> String {
        if self.query_string.is_empty() {
            self.path.clone()
        } else {
            format!("{}?{}", self.path, self.query_string)
        }
    }

    /// Returns the URL scheme (`"http"` or `"https"`).
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Returns the typed request extensions.
    ///
    /// Middleware attaches request-scoped state here, such as the processed
    /// form result.
    pub const fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    /// Returns a mutable reference to the typed request extensions.
    pub fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.extensions
    }

    /// Returns the buffered form data, if it has been attached.
    pub const fn form_data(&self) -> Option<&FormData> {
        self.form_data.as_ref()
    }

    /// Attaches buffered form data, replacing the consumed body stream.
    pub fn set_form_data(&mut self, form_data: FormData) {
        self.form_data = Some(form_data);
    }

    /// Takes the buffered form data, leaving `None` in its place.
    pub fn take_form_data(&mut self) -> Option<FormData> {
        self.form_data.take()
    }
}

/// Builder for constructing [`HttpRequest`] instances in tests.
#[derive(Debug)]
pub struct HttpRequestBuilder {
    method: Method,
    path: String,
    query_string: String,
    content_type: Option<String>,
    headers: HeaderMap,
    body: Vec<u8>,
    scheme: String,
}

impl Default for HttpRequestBuilder {
    fn default() -> Self {
        Self {
            method: Method::GET,
            path: "/".to_string(),
            query_string: String::new(),
            content_type: None,
            headers: HeaderMap::new(),
            body: Vec::new(),
            scheme: "http".to_string(),
        }
    }
}

impl HttpRequestBuilder {
    /// Sets the HTTP method.
    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Sets the request path.
    #[must_use]
    pub fn path(mut self, path: &str) -> Self {
        self.path = path.to_string();
        self
    }

    /// Sets the query string (without leading `?`).
    #[must_use]
    pub fn query_string(mut self, qs: &str) -> Self {
        self.query_string = qs.to_string();
        self
    }

    /// Sets the content type.
    #[must_use]
    pub fn content_type(mut self, ct: &str) -> Self {
        self.content_type = Some(ct.to_string());
        self
    }

    /// Adds a header.
    #[must_use]
    pub fn header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            http::header::HeaderName::from_bytes(name.as_bytes()),
            http::header::HeaderValue::from_str(value),
        ) {
            self.headers.insert(name, value);
        }
        self
    }

    /// Sets the request body.
    #[must_use]
    pub fn body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    /// Sets the scheme (http or https).
    #[must_use]
    pub fn scheme(mut self, scheme: &str) -> Self {
        self.scheme = scheme.to_string();
        self
    }

    /// Builds the [`HttpRequest`].
    pub fn build(self) -> HttpRequest {
        let get = QueryDict::parse(&self.query_string);

        HttpRequest {
            method: self.method,
            path: self.path,
            query_string: self.query_string,
            content_type: self.content_type,
            get,
            headers: self.headers,
            body: Some(self.body),
            extensions: Extensions::new(),
            form_data: None,
            scheme: self.scheme,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let req = HttpRequest::builder().build();
        assert_eq!(req.method(), &Method::GET);
        assert_eq!(req.path(), "/");
        assert_eq!(req.query_string(), "");
        assert!(req.content_type().is_none());
        assert_eq!(req.body(), Some(&[][..]));
        assert!(!req.is_secure());
    }

    #[test]
    fn test_builder_method() {
        let req = HttpRequest::builder().method(Method::POST).build();
        assert_eq!(req.method(), &Method::POST);
    }

    #[test]
    fn test_builder_path_and_query() {
        let req = HttpRequest::builder()
            .path("/contact")
            .query_string("form_id=contact&page=2")
            .build();
        assert_eq!(req.path(), "/contact");
        assert_eq!(req.query_string(), "form_id=contact&page=2");
        assert_eq!(req.get().get("form_id"), Some("contact"));
        assert_eq!(req.get().get("page"), Some("2"));
    }

    #[test]
    fn test_get_full_path_no_query() {
        let req = HttpRequest::builder().path("/contact").build();
        assert_eq!(req.get_full_path(), "/contact");
    }

    #[test]
    fn test_get_full_path_with_query() {
        let req = HttpRequest::builder()
            .path("/contact")
            .query_string("page=2")
            .build();
        assert_eq!(req.get_full_path(), "/contact?page=2");
    }

    #[test]
    fn test_take_body_is_one_shot() {
        let mut req = HttpRequest::builder().body(b"name=alice".to_vec()).build();
        assert_eq!(req.body(), Some(&b"name=alice"[..]));

        let body = req.take_body();
        assert_eq!(body.as_deref(), Some(&b"name=alice"[..]));

        assert!(req.body().is_none());
        assert!(req.take_body().is_none());
    }

    #[test]
    fn test_is_htmx_false_by_default() {
        let req = HttpRequest::builder().build();
        assert!(!req.is_htmx());
    }

    #[test]
    fn test_is_htmx_true() {
        let req = HttpRequest::builder().header("hx-request", "true").build();
        assert!(req.is_htmx());
    }

    #[test]
    fn test_is_htmx_other_value() {
        let req = HttpRequest::builder().header("hx-request", "false").build();
        assert!(!req.is_htmx());
    }

    #[test]
    fn test_is_secure() {
        let req = HttpRequest::builder().scheme("https").build();
        assert!(req.is_secure());
    }

    #[test]
    fn test_content_type() {
        let req = HttpRequest::builder()
            .content_type("application/json")
            .build();
        assert_eq!(req.content_type(), Some("application/json"));
    }

    #[test]
    fn test_extensions_roundtrip() {
        #[derive(Debug, Clone, PartialEq)]
        struct Marker(u32);

        let mut req = HttpRequest::builder().build();
        assert!(req.extensions().get::<Marker>().is_none());

        req.extensions_mut().insert(Marker(7));
        assert_eq!(req.extensions().get::<Marker>(), Some(&Marker(7)));
    }

    #[test]
    fn test_form_data_slot() {
        let mut req = HttpRequest::builder().build();
        assert!(req.form_data().is_none());

        let mut fd = FormData::new();
        fd.append_text("name", "alice");
        req.set_form_data(fd);

        assert!(req.form_data().is_some());
        let taken = req.take_form_data().unwrap();
        assert_eq!(taken.len(), 1);
        assert!(req.form_data().is_none());
    }

    #[test]
    fn test_headers() {
        let req = HttpRequest::builder().header("accept", "text/html").build();
        assert_eq!(
            req.headers().get("accept").unwrap().to_str().unwrap(),
            "text/html"
        );
    }

    #[test]
    fn test_from_axum() {
        let request = http::Request::builder()
            .method(Method::GET)
            .uri("http://example.com/contact?form_id=contact")
            .header("host", "example.com")
            .header("hx-request", "true")
            .body(())
            .unwrap();

        let (parts, ()) = request.into_parts();
        let req = HttpRequest::from_axum(parts, Vec::new());

        assert_eq!(req.method(), &Method::GET);
        assert_eq!(req.path(), "/contact");
        assert_eq!(req.query_string(), "form_id=contact");
        assert_eq!(req.get().get("form_id"), Some("contact"));
        assert!(req.is_htmx());
    }

    #[test]
    fn test_from_axum_body_and_content_type() {
        let body = b"name=test&value=123".to_vec();
        let request = http::Request::builder()
            .method(Method::POST)
            .uri("http://example.com/submit")
            .header("content-type", "application/x-www-form-urlencoded")
            .body(())
            .unwrap();

        let (parts, ()) = request.into_parts();
        let mut req = HttpRequest::from_axum(parts, body);

        assert_eq!(
            req.content_type(),
            Some("application/x-www-form-urlencoded")
        );
        assert_eq!(req.take_body().as_deref(), Some(&b"name=test&value=123"[..]));
    }

    #[test]
    fn test_from_axum_forwarded_proto() {
        let request = http::Request::builder()
            .method(Method::GET)
            .uri("http://example.com/")
            .header("x-forwarded-proto", "https")
            .body(())
            .unwrap();

        let (parts, ()) = request.into_parts();
        let req = HttpRequest::from_axum(parts, Vec::new());
        assert!(req.is_secure());
    }
}
