//! Submission extraction for matched form requests.
//!
//! Once the registry has matched a request to a [`FormDefinition`], the
//! middleware calls [`extract_form_data`] to pull the submitted values out
//! of the request. Four submission styles are supported, selected by the
//! request method and `Content-Type` header:
//!
//! - `GET` requests are read from the query string
//! - `application/x-www-form-urlencoded` bodies
//! - `multipart/form-data` bodies, including file uploads
//! - `application/json` (and `application/javascript`) bodies
//!
//! Multipart submissions additionally rebuild a [`FormData`] view of the
//! consumed body and attach it to the request, so downstream handlers can
//! still inspect the raw parts in submission order.

use formflow_core::{FormFlowError, FormFlowResult};
use formflow_http::formdata::FormData;
use formflow_http::querydict::parse_nested;
use formflow_http::request::HttpRequest;
use formflow_http::upload::{extract_boundary, parse_multipart, MultipartEntry, MultipartForm};
use http::Method;
use serde_json::Value;

use crate::definition::{FileField, FormDefinition, FormFiles, FormValues};
use crate::schema::FieldSpec;

/// The submission key carrying the form identifier.
///
/// Submissions include this key (as a hidden input, query parameter, or
/// JSON property) so the middleware can tell which registered form a
/// request targets when several share a route.
pub const FORM_ID_KEY: &str = "form_id";

/// The values pulled out of a single form submission.
#[derive(Debug, Clone, Default)]
pub struct ExtractedForm {
    /// The form identifier submitted with the request, if any.
    pub form_id: Option<String>,
    /// The submitted field values, keyed by field name.
    pub values: FormValues,
    /// Uploaded files, keyed by field name.
    pub files: FormFiles,
    /// The rebuilt multipart form data, for multipart submissions only.
    pub form_data: Option<FormData>,
}

/// Extracts the submitted values for `definition` from `request`.
///
/// Returns `Ok(None)` when the submission carries a form identifier that
/// names a different form, or when a JSON body is not an object. Body-based
/// extraction consumes the request body.
///
/// # Errors
///
/// - [`FormFlowError::BadRequest`] for a multipart request without a
///   boundary parameter
/// - [`FormFlowError::PayloadTooLarge`] if an uploaded file exceeds
///   `max_memory_size`
/// - [`FormFlowError::SerializationError`] for a malformed JSON body
/// - [`FormFlowError::NotImplemented`] for any other content type
pub fn extract_form_data(
    request: &mut HttpRequest,
    definition: &FormDefinition,
    max_memory_size: usize,
) -> FormFlowResult<Option<ExtractedForm>> {
    let extracted = if request.method() == Method::GET {
        extract_query(request.query_string())
    } else {
        let content_type = request.content_type().unwrap_or("").to_owned();
        if content_type.contains("application/x-www-form-urlencoded") {
            let body = request.take_body().unwrap_or_default();
            extract_query(&String::from_utf8_lossy(&body))
        } else if content_type.contains("multipart/form-data") {
            let Some(boundary) = extract_boundary(&content_type).map(str::to_owned) else {
                return Err(FormFlowError::BadRequest(
                    "multipart request is missing a boundary parameter".into(),
                ));
            };
            let body = request.take_body().unwrap_or_default();
            let form = parse_multipart(&body, &boundary, max_memory_size)?;
            let extracted = extract_multipart(&form, definition);
            if let Some(form_data) = &extracted.form_data {
                request.set_form_data(form_data.clone());
            }
            extracted
        } else if content_type.contains("application/json")
            || content_type.contains("application/javascript")
        {
            let body = request.take_body().unwrap_or_default();
            match extract_json(&body)? {
                Some(extracted) => extracted,
                None => return Ok(None),
            }
        } else {
            return Err(FormFlowError::NotImplemented(content_type));
        }
    };

    if extracted
        .form_id
        .as_deref()
        .is_some_and(|id| id != definition.name)
    {
        tracing::debug!(
            submitted = extracted.form_id.as_deref(),
            form = %definition.name,
            "form identifier does not match, skipping"
        );
        return Ok(None);
    }

    Ok(Some(extracted))
}

/// Parses an urlencoded payload (query string or request body).
fn extract_query(raw: &str) -> ExtractedForm {
    let mut values = parse_nested(raw);
    let form_id = take_form_id(&mut values);
    ExtractedForm {
        form_id,
        values,
        ..ExtractedForm::default()
    }
}

/// Parses a JSON payload. Non-object payloads yield `Ok(None)`.
fn extract_json(body: &[u8]) -> FormFlowResult<Option<ExtractedForm>> {
    let parsed: Value = serde_json::from_slice(body)?;
    let Value::Object(mut values) = parsed else {
        return Ok(None);
    };
    let form_id = take_form_id(&mut values);
    Ok(Some(ExtractedForm {
        form_id,
        values,
        ..ExtractedForm::default()
    }))
}

/// Builds the extracted values for a multipart submission.
///
/// Field values are driven by the definition's schema: file-typed fields
/// collect every same-named part and expose metadata objects as their
/// value, other fields take the first text part or fall back to the
/// spec's default. The original parts are also rebuilt into a
/// [`FormData`] in submission order.
fn extract_multipart(form: &MultipartForm, definition: &FormDefinition) -> ExtractedForm {
    let mut values = FormValues::new();
    let mut files = FormFiles::new();

    if let Some(schema) = &definition.fields {
        for (name, spec) in schema.iter() {
            if spec.is_file() {
                collect_files(form, name, spec, &mut values, &mut files);
            } else {
                let value = form
                    .get_text(name)
                    .map(|v| Value::String(v.to_owned()))
                    .or_else(|| spec.default.clone())
                    .unwrap_or(Value::Null);
                values.insert(name.to_owned(), value);
            }
        }
    } else {
        for (name, value) in form.texts() {
            if name != FORM_ID_KEY && !values.contains_key(name) {
                values.insert(name.to_owned(), Value::String(value.to_owned()));
            }
        }
    }

    let mut form_data = FormData::new();
    for entry in &form.entries {
        match entry {
            MultipartEntry::Text { name, value } => form_data.append_text(name, value),
            MultipartEntry::File { name, file } => form_data.append_file(name, file.clone()),
        }
    }

    ExtractedForm {
        form_id: form.get_text(FORM_ID_KEY).map(str::to_owned),
        values,
        files,
        form_data: Some(form_data),
    }
}

/// Gathers every part named `name` for a file-typed field.
fn collect_files(
    form: &MultipartForm,
    name: &str,
    spec: &FieldSpec,
    values: &mut FormValues,
    files: &mut FormFiles,
) {
    let uploads: Vec<_> = form
        .files()
        .filter(|(n, _)| *n == name)
        .map(|(_, f)| f.clone())
        .collect();

    let metadata: Vec<Value> = uploads
        .iter()
        .enumerate()
        .map(|(idx, file)| file_metadata(idx, file))
        .collect();

    if spec.accepts_multiple() {
        values.insert(name.to_owned(), Value::Array(metadata));
        files.insert(name.to_owned(), FileField::Multiple(uploads));
    } else {
        let value = metadata.into_iter().next().unwrap_or(Value::Null);
        values.insert(name.to_owned(), value);
        if let Some(file) = uploads.into_iter().next() {
            files.insert(name.to_owned(), FileField::Single(file));
        }
    }
}

/// The metadata object exposed as a file field's submitted value.
fn file_metadata(idx: usize, file: &formflow_http::upload::UploadedFile) -> Value {
    let mut meta = serde_json::Map::new();
    meta.insert("idx".into(), Value::from(idx));
    meta.insert("size".into(), Value::from(file.size));
    meta.insert("type".into(), Value::String(file.content_type.clone()));
    meta.insert("name".into(), Value::String(file.name.clone()));
    meta.insert(
        "last_modified".into(),
        file.last_modified.map_or(Value::Null, Value::from),
    );
    Value::Object(meta)
}

/// Pulls the identifier out of the parsed values.
///
/// Empty and null identifiers count as absent. Anything else is rendered
/// to text so a non-string identifier still fails the name comparison
/// instead of slipping through as a match.
fn take_form_id(values: &mut FormValues) -> Option<String> {
    match values.remove(FORM_ID_KEY)? {
        Value::String(id) if id.is_empty() => None,
        Value::String(id) => Some(id),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}
