//! # formflow-http
//!
//! HTTP types for the formflow middleware: requests, responses, query
//! string dictionaries, multipart parsing, and the buffered [`FormData`]
//! value that replaces a consumed request body.
//!
//! ## Modules
//!
//! - [`querydict`] - Flat and nested query string parsing
//! - [`formdata`] - Ordered, buffered form data
//! - [`upload`] - Multipart form-data parsing and uploaded files
//! - [`request`] - The [`HttpRequest`] type
//! - [`response`] - The [`HttpResponse`] type

pub mod formdata;
pub mod querydict;
pub mod request;
pub mod response;
pub mod upload;

pub use formdata::{FormData, FormEntry};
pub use querydict::{parse_nested, QueryDict};
pub use request::{HttpRequest, HttpRequestBuilder};
pub use response::{HttpResponse, JsonResponse, ResponseContent, REDIRECT_CODES};
pub use upload::{
    extract_boundary, parse_multipart, MultipartEntry, MultipartForm, UploadedFile,
};
