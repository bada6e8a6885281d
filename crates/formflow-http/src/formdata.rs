//! Buffered, ordered form data.
//!
//! Once the middleware has consumed a request body to parse a submission,
//! downstream handlers can no longer read the stream. [`FormData`] is the
//! explicit, buffered replacement: an ordered list of text and file entries
//! that is rebuilt from the parsed submission and attached back onto the
//! request.

use crate::upload::{MultipartEntry, MultipartForm, UploadedFile};

/// A single form data entry.
#[derive(Debug, Clone)]
pub enum FormEntry {
    /// A text field value.
    Text(String),
    /// An uploaded file.
    File(UploadedFile),
}

impl FormEntry {
    /// Returns the text value, if this entry is a text field.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(v) => Some(v),
            Self::File(_) => None,
        }
    }

    /// Returns the uploaded file, if this entry is a file field.
    pub const fn as_file(&self) -> Option<&UploadedFile> {
        match self {
            Self::File(f) => Some(f),
            Self::Text(_) => None,
        }
    }
}

/// An ordered collection of form entries keyed by field name.
///
/// Duplicate names are allowed and order is preserved, matching how a
/// browser serializes a form submission.
///
/// # Examples
///
/// ```
/// use formflow_http::{FormData, FormEntry};
///
/// let mut fd = FormData::new();
/// fd.append_text("name", "alice");
/// fd.append_text("tag", "a");
/// fd.append_text("tag", "b");
///
/// assert_eq!(fd.get("name").and_then(FormEntry::as_text), Some("alice"));
/// assert_eq!(fd.get_all("tag").len(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct FormData {
    entries: Vec<(String, FormEntry)>,
}

impl FormData {
    /// Creates an empty `FormData`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a text field.
    pub fn append_text(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries
            .push((name.into(), FormEntry::Text(value.into())));
    }

    /// Appends a file field.
    pub fn append_file(&mut self, name: impl Into<String>, file: UploadedFile) {
        self.entries.push((name.into(), FormEntry::File(file)));
    }

    /// Returns the first entry with the given name.
    pub fn get(&self, name: &str) -> Option<&FormEntry> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, e)| e)
    }

    /// Returns all entries with the given name, in submission order.
    pub fn get_all(&self, name: &str) -> Vec<&FormEntry> {
        self.entries
            .iter()
            .filter(|(n, _)| n == name)
            .map(|(_, e)| e)
            .collect()
    }

    /// Returns an iterator over all `(name, entry)` pairs in order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &FormEntry)> {
        self.entries.iter().map(|(n, e)| (n.as_str(), e))
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<MultipartForm> for FormData {
    fn from(form: MultipartForm) -> Self {
        let entries = form
            .entries
            .into_iter()
            .map(|entry| match entry {
                MultipartEntry::Text { name, value } => (name, FormEntry::Text(value)),
                MultipartEntry::File { name, file } => (name, FormEntry::File(file)),
            })
            .collect();
        Self { entries }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str) -> UploadedFile {
        UploadedFile {
            name: name.to_string(),
            content_type: "text/plain".to_string(),
            size: 4,
            content: b"data".to_vec(),
            last_modified: None,
        }
    }

    #[test]
    fn test_new_is_empty() {
        let fd = FormData::new();
        assert!(fd.is_empty());
        assert_eq!(fd.len(), 0);
    }

    #[test]
    fn test_append_and_get() {
        let mut fd = FormData::new();
        fd.append_text("name", "alice");
        assert_eq!(fd.get("name").and_then(FormEntry::as_text), Some("alice"));
        assert!(fd.get("missing").is_none());
    }

    #[test]
    fn test_get_returns_first() {
        let mut fd = FormData::new();
        fd.append_text("tag", "a");
        fd.append_text("tag", "b");
        assert_eq!(fd.get("tag").and_then(FormEntry::as_text), Some("a"));
    }

    #[test]
    fn test_get_all_preserves_order() {
        let mut fd = FormData::new();
        fd.append_text("tag", "a");
        fd.append_text("other", "x");
        fd.append_text("tag", "b");

        let tags: Vec<&str> = fd
            .get_all("tag")
            .into_iter()
            .filter_map(FormEntry::as_text)
            .collect();
        assert_eq!(tags, vec!["a", "b"]);
    }

    #[test]
    fn test_mixed_text_and_file_entries() {
        let mut fd = FormData::new();
        fd.append_text("title", "doc");
        fd.append_file("attachment", file("a.txt"));

        assert!(fd.get("title").and_then(FormEntry::as_text).is_some());
        let attached = fd.get("attachment").and_then(FormEntry::as_file).unwrap();
        assert_eq!(attached.name, "a.txt");
    }

    #[test]
    fn test_entries_iteration_order() {
        let mut fd = FormData::new();
        fd.append_text("a", "1");
        fd.append_file("b", file("b.bin"));
        fd.append_text("c", "3");

        let names: Vec<&str> = fd.entries().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_from_multipart_form() {
        let form = MultipartForm {
            entries: vec![
                MultipartEntry::Text {
                    name: "title".to_string(),
                    value: "doc".to_string(),
                },
                MultipartEntry::File {
                    name: "file".to_string(),
                    file: file("f.txt"),
                },
            ],
        };

        let fd = FormData::from(form);
        assert_eq!(fd.len(), 2);
        assert_eq!(fd.get("title").and_then(FormEntry::as_text), Some("doc"));
        assert!(fd.get("file").and_then(FormEntry::as_file).is_some());
    }
}
