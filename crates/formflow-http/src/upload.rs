//! Multipart form-data parsing for file uploads.
//!
//! Provides [`parse_multipart`] to extract form fields and uploaded files
//! from `multipart/form-data` request bodies. Parts are returned in
//! submission order, which lets callers rebuild an equivalent
//! [`FormData`](crate::formdata::FormData) after the body stream has been
//! consumed.

use formflow_core::{FormFlowError, FormFlowResult};

/// An uploaded file from a multipart form submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    /// The original filename as provided by the client.
    pub name: String,
    /// The MIME content type of the file.
    pub content_type: String,
    /// The size of the file content in bytes.
    pub size: usize,
    /// The raw file content.
    pub content: Vec<u8>,
    /// Client-supplied modification time in milliseconds since the epoch,
    /// taken from an optional `Last-Modified` part header.
    pub last_modified: Option<i64>,
}

/// One part of a multipart submission, in submission order.
#[derive(Debug, Clone)]
pub enum MultipartEntry {
    /// A regular text field.
    Text {
        /// The field name.
        name: String,
        /// The field value.
        value: String,
    },
    /// A file upload.
    File {
        /// The field name.
        name: String,
        /// The uploaded file.
        file: UploadedFile,
    },
}

/// The result of parsing a multipart form-data body.
///
/// Entries keep their submission order.
#[derive(Debug, Clone, Default)]
pub struct MultipartForm {
    /// The parsed parts, in submission order.
    pub entries: Vec<MultipartEntry>,
}

impl MultipartForm {
    /// Returns an iterator over text fields as `(name, value)` pairs.
    pub fn texts(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().filter_map(|e| match e {
            MultipartEntry::Text { name, value } => Some((name.as_str(), value.as_str())),
            MultipartEntry::File { .. } => None,
        })
    }

    /// Returns an iterator over file fields as `(name, file)` pairs.
    pub fn files(&self) -> impl Iterator<Item = (&str, &UploadedFile)> {
        self.entries.iter().filter_map(|e| match e {
            MultipartEntry::File { name, file } => Some((name.as_str(), file)),
            MultipartEntry::Text { .. } => None,
        })
    }

    /// Returns the first text value for the given field name.
    pub fn get_text(&self, name: &str) -> Option<&str> {
        self.texts().find(|(n, _)| *n == name).map(|(_, v)| v)
    }

    /// Returns the number of parts.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no parts were parsed.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Extracts the boundary string from a `Content-Type: multipart/form-data` header.
///
/// The boundary is specified as `boundary=<value>` in the Content-Type header.
/// Returns `None` if the boundary cannot be found.
pub fn extract_boundary(content_type: &str) -> Option<&str> {
    for part in content_type.split(';') {
        let trimmed = part.trim();
        if let Some(boundary) = trimmed.strip_prefix("boundary=") {
            // Remove quotes if present
            let boundary = boundary.trim_matches('"');
            if boundary.is_empty() {
                return None;
            }
            return Some(boundary);
        }
    }
    None
}

/// Parses a multipart/form-data request body.
///
/// Splits the body by the boundary delimiter, then parses each part's
/// headers (particularly `Content-Disposition`) to determine whether the
/// part is a regular form field or a file upload. Parts are returned in
/// submission order.
///
/// # Arguments
///
/// * `body` - The raw request body bytes
/// * `boundary` - The boundary string from the Content-Type header
/// * `max_memory_size` - The in-memory size cap for a single file
///
/// # Errors
///
/// Returns [`FormFlowError::PayloadTooLarge`] if a file exceeds
/// `max_memory_size`.
pub fn parse_multipart(
    body: &[u8],
    boundary: &str,
    max_memory_size: usize,
) -> FormFlowResult<MultipartForm> {
    let mut entries = Vec::new();

    let delimiter = format!("--{boundary}");
    let end_delimiter = format!("--{boundary}--");

    // Multipart boundaries are ASCII, so a lossy conversion is safe for
    // locating part structure.
    let body_str = String::from_utf8_lossy(body);

    let parts: Vec<&str> = body_str.split(&delimiter).collect();

    for part in parts {
        let part = part.trim_start_matches("\r\n").trim_end_matches("\r\n");

        // Skip empty parts and the ending delimiter
        if part.is_empty() || part == "--" || part.starts_with("--") {
            continue;
        }

        // Split headers from body (separated by double CRLF or double LF)
        let (headers_str, body_content) = if let Some(pos) = part.find("\r\n\r\n") {
            (&part[..pos], &part[pos + 4..])
        } else if let Some(pos) = part.find("\n\n") {
            (&part[..pos], &part[pos + 2..])
        } else {
            continue;
        };

        let mut field_name = None;
        let mut filename = None;
        let mut part_content_type = "text/plain".to_string();
        let mut last_modified = None;

        for header_line in headers_str.lines() {
            let header_line = header_line.trim();
            if header_line.is_empty() {
                continue;
            }

            let header_lower = header_line.to_lowercase();
            if header_lower.starts_with("content-disposition:") {
                let value = &header_line[header_line.find(':').unwrap_or(0) + 1..];
                let value = value.trim();

                if let Some(name) = extract_header_param(value, "name") {
                    field_name = Some(name);
                }

                if let Some(fname) = extract_header_param(value, "filename") {
                    filename = Some(fname);
                }
            } else if header_lower.starts_with("content-type:") {
                let value = &header_line[header_line.find(':').unwrap_or(0) + 1..];
                part_content_type = value.trim().to_string();
            } else if header_lower.starts_with("last-modified:") {
                let value = &header_line[header_line.find(':').unwrap_or(0) + 1..];
                last_modified = value.trim().parse::<i64>().ok();
            }
        }

        let Some(name) = field_name else {
            continue;
        };

        // Remove trailing boundary markers from body content
        let body_content = body_content
            .trim_end_matches("\r\n")
            .trim_end_matches(&end_delimiter)
            .trim_end_matches("\r\n");

        if let Some(fname) = filename {
            if fname.is_empty() && body_content.is_empty() {
                // Empty file field, skip
                continue;
            }

            let content = body_content.as_bytes().to_vec();

            if content.len() > max_memory_size {
                return Err(FormFlowError::PayloadTooLarge(format!(
                    "File '{fname}' exceeds maximum upload size of {max_memory_size} bytes"
                )));
            }

            let file = UploadedFile {
                name: fname,
                content_type: part_content_type,
                size: content.len(),
                content,
                last_modified,
            };

            entries.push(MultipartEntry::File { name, file });
        } else {
            entries.push(MultipartEntry::Text {
                name,
                value: body_content.to_string(),
            });
        }
    }

    Ok(MultipartForm { entries })
}

/// Extracts a parameter value from a header value string.
///
/// For example, from `form-data; name="field1"; filename="file.txt"`,
/// `extract_header_param(value, "name")` returns `Some("field1")`.
fn extract_header_param(header_value: &str, param_name: &str) -> Option<String> {
    let search = format!("{param_name}=\"");
    if let Some(start) = header_value.find(&search) {
        let value_start = start + search.len();
        if let Some(end) = header_value[value_start..].find('"') {
            return Some(header_value[value_start..value_start + end].to_string());
        }
    }

    // Try without quotes
    let search = format!("{param_name}=");
    if let Some(start) = header_value.find(&search) {
        let value_start = start + search.len();
        let rest = &header_value[value_start..];
        let end = rest.find(';').unwrap_or(rest.len());
        let value = rest[..end].trim().trim_matches('"');
        if !value.is_empty() {
            return Some(value.to_string());
        }
    }

    None
}
