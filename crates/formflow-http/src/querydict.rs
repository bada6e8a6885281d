//! Query string parsing for HTTP request parameters.
//!
//! [`QueryDict`] is an immutable-by-default, multi-value dictionary for GET
//! and URL-encoded POST parameters. [`parse_nested`] additionally understands
//! bracket syntax (`a[b]=c`, `tags[]=x`) and produces a JSON object tree,
//! which is what the form extractor feeds into validation.

use std::collections::HashMap;

use serde_json::{Map, Value};

use formflow_core::{FormFlowError, FormFlowResult};

/// An immutable-by-default dictionary for query string and form data.
///
/// Keys may carry multiple values; [`get`](QueryDict::get) returns the last
/// one. The [`copy`](QueryDict::copy) method returns a mutable clone.
///
/// # Examples
///
/// ```
/// use formflow_http::QueryDict;
///
/// let qd = QueryDict::parse("color=red&color=blue&size=large");
/// assert_eq!(qd.get("color"), Some("blue"));
/// assert_eq!(qd.get_list("color"), Some(&vec!["red".to_string(), "blue".to_string()]));
///
/// let mut mutable = qd.copy();
/// mutable.set("color", "green").unwrap();
/// assert_eq!(mutable.get("color"), Some("green"));
/// ```
#[derive(Debug, Clone)]
pub struct QueryDict {
    data: HashMap<String, Vec<String>>,
    mutable: bool,
    encoding: String,
}

impl Default for QueryDict {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryDict {
    /// Creates a new, empty, immutable `QueryDict`.
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            mutable: false,
            encoding: "utf-8".to_string(),
        }
    }

    /// Creates a new, empty, mutable `QueryDict`.
    pub fn new_mutable() -> Self {
        Self {
            data: HashMap::new(),
            mutable: true,
            encoding: "utf-8".to_string(),
        }
    }

    /// Parses a URL query string (e.g., `"key1=val1&key2=val2"`) into an
    /// immutable `QueryDict`.
    ///
    /// Handles percent-encoding and supports multiple values per key.
    pub fn parse(query_string: &str) -> Self {
        let mut data: HashMap<String, Vec<String>> = HashMap::new();

        if !query_string.is_empty() {
            for pair in query_string.split('&') {
                if pair.is_empty() {
                    continue;
                }

                let (key, value) = pair
                    .find('=')
                    .map_or((pair, ""), |eq_pos| (&pair[..eq_pos], &pair[eq_pos + 1..]));

                let decoded_key = percent_decode(key);
                let decoded_value = percent_decode(value);
                data.entry(decoded_key).or_default().push(decoded_value);
            }
        }

        Self {
            data,
            mutable: false,
            encoding: "utf-8".to_string(),
        }
    }

    /// Returns the last value for the given key, or `None` if not present.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(|v| v.last()).map(String::as_str)
    }

    /// Returns all values for the given key, or `None` if not present.
    pub fn get_list(&self, key: &str) -> Option<&Vec<String>> {
        self.data.get(key)
    }

    /// Sets a single value for the given key, replacing any existing values.
    ///
    /// # Errors
    ///
    /// Returns [`FormFlowError::Immutable`] if this `QueryDict` is immutable.
    pub fn set(&mut self, key: &str, value: &str) -> FormFlowResult<()> {
        if !self.mutable {
            return Err(FormFlowError::Immutable);
        }
        self.data.insert(key.to_string(), vec![value.to_string()]);
        Ok(())
    }

    /// Appends a value to the list for the given key.
    ///
    /// # Errors
    ///
    /// Returns [`FormFlowError::Immutable`] if this `QueryDict` is immutable.
    pub fn append(&mut self, key: &str, value: &str) -> FormFlowResult<()> {
        if !self.mutable {
            return Err(FormFlowError::Immutable);
        }
        self.data
            .entry(key.to_string())
            .or_default()
            .push(value.to_string());
        Ok(())
    }

    /// Returns a mutable copy of this `QueryDict`.
    #[must_use]
    pub fn copy(&self) -> Self {
        Self {
            data: self.data.clone(),
            mutable: true,
            encoding: self.encoding.clone(),
        }
    }

    /// Encodes this `QueryDict` as a URL query string.
    ///
    /// All keys and values are percent-encoded; pairs are sorted for a
    /// deterministic result.
    pub fn urlencode(&self) -> String {
        let mut parts = Vec::new();

        for (key, values) in &self.data {
            for value in values {
                let encoded_key = percent_encode(key);
                let encoded_value = percent_encode(value);
                parts.push(format!("{encoded_key}={encoded_value}"));
            }
        }

        parts.sort();
        parts.join("&")
    }

    /// Returns `true` if this `QueryDict` is mutable.
    pub const fn is_mutable(&self) -> bool {
        self.mutable
    }

    /// Returns the encoding used for this `QueryDict`.
    pub fn encoding(&self) -> &str {
        &self.encoding
    }

    /// Returns the number of distinct keys.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the `QueryDict` contains no keys.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns `true` if the specified key is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Returns an iterator over the keys.
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.data.keys()
    }
}

/// One segment of a bracketed key path.
enum Segment {
    Key(String),
    Append,
}

/// Parses a URL query string into a JSON object, honoring bracket syntax.
///
/// - `a=1&b=2` produces `{"a": "1", "b": "2"}`
/// - `user[name]=x&user[age]=3` produces `{"user": {"name": "x", "age": "3"}}`
/// - `tags[]=a&tags[]=b` produces `{"tags": ["a", "b"]}`
/// - Repeating a flat key folds its values into an array.
///
/// `[]` is honored only as the last path segment; keys with malformed
/// brackets are kept as flat string keys. All leaf values are strings,
/// matching what URL-encoded submissions can carry.
///
/// # Examples
///
/// ```
/// use formflow_http::parse_nested;
///
/// let parsed = parse_nested("user[name]=alice&tags[]=a&tags[]=b");
/// assert_eq!(parsed["user"]["name"], "alice");
/// assert_eq!(parsed["tags"][1], "b");
/// ```
pub fn parse_nested(query_string: &str) -> Map<String, Value> {
    let mut root = Map::new();

    for pair in query_string.split('&') {
        if pair.is_empty() {
            continue;
        }

        let (key, value) = pair
            .find('=')
            .map_or((pair, ""), |eq_pos| (&pair[..eq_pos], &pair[eq_pos + 1..]));

        let key = percent_decode(key);
        let value = Value::String(percent_decode(value));

        match parse_key_path(&key) {
            Some((base, segments)) => insert_path(&mut root, &base, &segments, value),
            None => insert_leaf(&mut root, &key, value),
        }
    }

    root
}

/// Splits `a[b][]` into `("a", [Key("b"), Append])`.
///
/// Returns `None` for keys without brackets or with malformed bracket
/// syntax, in which case the caller treats the key as flat.
fn parse_key_path(key: &str) -> Option<(String, Vec<Segment>)> {
    let open = key.find('[')?;
    if open == 0 {
        return None;
    }
    let base = key[..open].to_string();
    let mut segments = Vec::new();
    let mut rest = &key[open..];

    while !rest.is_empty() {
        if !rest.starts_with('[') {
            return None;
        }
        let close = rest.find(']')?;
        let inner = &rest[1..close];
        if inner.is_empty() {
            segments.push(Segment::Append);
        } else {
            segments.push(Segment::Key(inner.to_string()));
        }
        rest = &rest[close + 1..];
    }

    // An append segment anywhere but last has no flat-form meaning.
    if segments
        .iter()
        .rev()
        .skip(1)
        .any(|s| matches!(s, Segment::Append))
    {
        return None;
    }

    Some((base, segments))
}

fn insert_path(map: &mut Map<String, Value>, base: &str, segments: &[Segment], value: Value) {
    let Some(first) = segments.first() else {
        insert_leaf(map, base, value);
        return;
    };

    let slot = map.entry(base.to_string()).or_insert_with(|| match first {
        Segment::Append => Value::Array(Vec::new()),
        Segment::Key(_) => Value::Object(Map::new()),
    });
    insert_into(slot, segments, value);
}

fn insert_into(slot: &mut Value, segments: &[Segment], value: Value) {
    match &segments[0] {
        Segment::Append => {
            if let Value::Array(arr) = slot {
                arr.push(value);
            } else {
                *slot = Value::Array(vec![value]);
            }
        }
        Segment::Key(k) => {
            if !slot.is_object() {
                *slot = Value::Object(Map::new());
            }
            if let Value::Object(map) = slot {
                if segments.len() == 1 {
                    insert_leaf(map, k, value);
                } else {
                    let child = map.entry(k.clone()).or_insert_with(|| match segments[1] {
                        Segment::Append => Value::Array(Vec::new()),
                        Segment::Key(_) => Value::Object(Map::new()),
                    });
                    insert_into(child, &segments[1..], value);
                }
            }
        }
    }
}

/// Inserts a scalar, folding repeated keys into an array.
fn insert_leaf(map: &mut Map<String, Value>, key: &str, value: Value) {
    match map.get_mut(key) {
        Some(Value::Array(arr)) => arr.push(value),
        Some(existing) => {
            let prev = existing.take();
            *existing = Value::Array(vec![prev, value]);
        }
        None => {
            map.insert(key.to_string(), value);
        }
    }
}

/// Decodes a percent-encoded string.
fn percent_decode(input: &str) -> String {
    // Replace + with space (form encoding), then decode percent sequences
    let plus_decoded = input.replace('+', " ");
    percent_encoding::percent_decode_str(&plus_decoded)
        .decode_utf8_lossy()
        .into_owned()
}

/// Percent-encodes a string for use in a URL query.
fn percent_encode(input: &str) -> String {
    percent_encoding::utf8_percent_encode(input, percent_encoding::NON_ALPHANUMERIC).to_string()
}
