use indexmap::IndexMap;
use smallvec::SmallVec;

use crate::collection::document_id::DocumentId;
use crate::common::{Value, DOC_ID};
use crate::errors::{EngineError, EngineResult, ErrorKind};
use crate::FIELD_SEPARATOR;
use std::cmp::Ordering;
use std::fmt::{Debug, Display};
use std::hash::{Hash, Hasher};

type FieldVec = SmallVec<[String; 8]>;
type ValueVec = SmallVec<[Value; 4]>;

/// Represents a document: an ordered collection of key-value pairs.
///
/// The key is always a [String] and the value is a [Value]. Field order is
/// the insertion order, and it is preserved through storage and retrieval.
///
/// Documents support nesting. A field of a nested document is addressed by a
/// dotted path (e.g. `"location.address.zip"`). Numeric path segments address
/// array elements, so `"items.0"` is the first element of the `items` array.
///
/// The `_id` field is reserved: it uniquely identifies the document within a
/// collection and is immutable once the document has been inserted. If a
/// document is inserted without an `_id`, the engine generates a
/// [DocumentId] for it.
///
/// # Path resolution and array fan-out
///
/// When a path segment lands on an array of documents, resolution fans out
/// over the elements. With `{"a": [{"b": 1}, {"b": 2}]}` the path `"a.b"`
/// resolves to both `1` and `2`. Missing intermediate fields resolve to
/// nothing rather than an error.
#[derive(Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Document {
    data: IndexMap<String, Value>,
}

impl Document {
    /// Creates a new empty document.
    pub fn new() -> Self {
        Document {
            data: IndexMap::new(),
        }
    }

    /// Checks if the document is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the number of top-level entries in the document.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Associates the specified [Value] with the specified key.
    ///
    /// If the key already exists, its value is replaced. The key may be a
    /// dotted path; missing intermediate documents are created on the way
    /// down, and numeric segments address array elements.
    ///
    /// # Arguments
    ///
    /// * `key` - The key or dotted path. Cannot be empty.
    /// * `value` - Any type convertible into a [Value].
    ///
    /// # Errors
    ///
    /// * `ValidationError` if the key or any path segment is empty
    /// * `TypeMismatch` if the path runs through a scalar, or a non-numeric
    ///   segment is applied to an array
    ///
    /// # Examples
    ///
    /// ```ignore
    /// let mut doc = Document::new();
    /// doc.put("user.name", "Alice")?;
    /// assert_eq!(doc.get("user.name"), Value::from("Alice"));
    /// ```
    pub fn put<T: Into<Value>>(&mut self, key: &str, value: T) -> EngineResult<()> {
        if key.is_empty() {
            log::error!("Document does not support empty key");
            return Err(EngineError::new(
                "Document does not support empty key",
                ErrorKind::ValidationError,
            ));
        }

        let value = value.into();

        if key.contains(FIELD_SEPARATOR) {
            let splits: Vec<&str> = key.split(FIELD_SEPARATOR).collect();
            self.deep_put(&splits, value)
        } else {
            self.data.insert(key.to_string(), value);
            Ok(())
        }
    }

    // Sets a top-level field without id validation or path splitting.
    // Synthetic documents such as aggregation results carry group keys in
    // `_id` that stored documents must not.
    pub(crate) fn set_field(&mut self, key: &str, value: Value) {
        self.data.insert(key.to_string(), value);
    }

    /// Associates the specified [Value] with the literal key, keeping any
    /// `.` as part of the key itself rather than as a path separator.
    ///
    /// Predicate, update, and pipeline documents carry dotted field paths
    /// in their keys; the [`doc!`](crate::doc) macro builds entries through
    /// this method so those paths survive intact. [`put`](Self::put) is the
    /// path-aware counterpart for editing nested data.
    ///
    /// # Errors
    ///
    /// * `ValidationError` if the key is empty
    pub fn insert<T: Into<Value>>(&mut self, key: &str, value: T) -> EngineResult<()> {
        if key.is_empty() {
            log::error!("Document does not support empty key");
            return Err(EngineError::new(
                "Document does not support empty key",
                ErrorKind::ValidationError,
            ));
        }

        self.data.insert(key.to_string(), value.into());
        Ok(())
    }

    /// Returns the [Value] addressed by the given key, or [Value::Null] if
    /// the document contains no mapping for it.
    ///
    /// The key may be a dotted path. When a path segment lands on an array
    /// of documents the per-element values are gathered into an array.
    ///
    /// # Examples
    ///
    /// ```ignore
    /// let doc = doc! { "items": [1, 2, 3] };
    /// assert_eq!(doc.get("items.0"), Value::from(1));
    /// assert_eq!(doc.get("missing"), Value::Null);
    /// ```
    pub fn get(&self, key: &str) -> Value {
        if let Some(value) = self.data.get(key) {
            return value.clone();
        }
        if !key.contains(FIELD_SEPARATOR) {
            return Value::Null;
        }

        let values = self.resolve_values(key);
        match values.len() {
            0 => Value::Null,
            1 => values.into_iter().next().unwrap_or(Value::Null),
            _ => Value::Array(values.into_vec()),
        }
    }

    /// Resolves a dotted path to all candidate values, with array fan-out.
    ///
    /// Missing intermediates resolve to an empty list. Terminal arrays are
    /// returned whole; the caller decides whether to look inside them.
    pub fn resolve_values(&self, key: &str) -> ValueVec {
        let mut out = ValueVec::new();
        if key.is_empty() {
            return out;
        }
        let splits: Vec<&str> = key.split(FIELD_SEPARATOR).collect();
        collect_values(&self.data, &splits, &mut out);
        out
    }

    /// Returns the `_id` value of this document, if present.
    pub fn id(&self) -> Option<&Value> {
        self.data.get(DOC_ID)
    }

    /// Returns the `_id` of this document, generating one if absent.
    ///
    /// This is the only mutating path by which the engine assigns generated
    /// ids during insertion.
    ///
    /// # Errors
    ///
    /// * `InvalidId` if the document already carries an array or nested
    ///   document under `_id`
    pub fn ensure_id(&mut self) -> EngineResult<Value> {
        if let Some(id) = self.data.get(DOC_ID) {
            if !id.is_valid_id() {
                log::error!("Document id must not be an array or a nested document");
                return Err(EngineError::new(
                    "Document id must not be an array or a nested document",
                    ErrorKind::InvalidId,
                ));
            }
            return Ok(id.clone());
        }
        let id = Value::Id(DocumentId::new());
        // keep _id as the first field for readability of stored documents
        self.data.shift_insert(0, DOC_ID.to_string(), id.clone());
        Ok(id)
    }

    /// Checks if this document has an `_id` field.
    pub fn has_id(&self) -> bool {
        self.data.contains_key(DOC_ID)
    }

    /// Removes the key and its value from the document.
    ///
    /// The key may be a dotted path; removing a missing key succeeds without
    /// error. Numeric segments remove array elements.
    pub fn remove(&mut self, key: &str) -> EngineResult<()> {
        if key.is_empty() {
            log::error!("Document does not support empty key");
            return Err(EngineError::new(
                "Document does not support empty key",
                ErrorKind::ValidationError,
            ));
        }

        if key.contains(FIELD_SEPARATOR) {
            let splits: Vec<&str> = key.split(FIELD_SEPARATOR).collect();
            self.deep_remove(&splits)
        } else {
            self.data.shift_remove(key);
            Ok(())
        }
    }

    /// Checks if a top level field or embedded field exists in the document.
    ///
    /// With fan-out, the field exists when at least one array element
    /// carries it.
    pub fn contains_field(&self, field: &str) -> bool {
        if self.data.contains_key(field) {
            return true;
        }
        !self.resolve_values(field).is_empty()
    }

    /// Retrieves all leaf field paths of this document.
    ///
    /// Embedded fields are joined by the field separator. Arrays are treated
    /// as leaves, and the reserved `_id` field is excluded.
    pub fn fields(&self) -> FieldVec {
        let mut fields = FieldVec::new();
        self.collect_fields("", &mut fields);
        fields
    }

    /// Gets an iterator over the key-value pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.data.iter()
    }

    pub(crate) fn to_json_string(&self) -> String {
        if self.data.is_empty() {
            return "{}".to_string();
        }
        let entries: Vec<String> = self
            .data
            .iter()
            .map(|(k, v)| format!("\"{}\": {}", k, v.to_json_string()))
            .collect();
        format!("{{{}}}", entries.join(", "))
    }

    fn collect_fields(&self, prefix: &str, fields: &mut FieldVec) {
        for (key, value) in self.data.iter() {
            if prefix.is_empty() && key == DOC_ID {
                continue;
            }
            let field = if prefix.is_empty() {
                key.clone()
            } else {
                format!("{}{}{}", prefix, FIELD_SEPARATOR, key)
            };
            if let Value::Document(doc) = value {
                doc.collect_fields(&field, fields);
            } else {
                fields.push(field);
            }
        }
    }

    fn deep_put(&mut self, splits: &[&str], value: Value) -> EngineResult<()> {
        let key = splits[0];
        if key.is_empty() {
            log::error!("Document does not support empty key");
            return Err(EngineError::new(
                "Document does not support empty key",
                ErrorKind::ValidationError,
            ));
        }

        if splits.len() == 1 {
            self.data.insert(key.to_string(), value);
            return Ok(());
        }

        let remaining = &splits[1..];
        match self.data.get_mut(key) {
            Some(Value::Document(obj)) => obj.deep_put(remaining, value),
            Some(Value::Array(arr)) => put_in_array(arr, remaining, value),
            Some(_) => {
                log::error!("Cannot set field {} through a scalar value", key);
                Err(EngineError::new(
                    &format!("Cannot set field {} through a scalar value", key),
                    ErrorKind::TypeMismatch,
                ))
            }
            None => {
                let mut nested = Document::new();
                nested.deep_put(remaining, value)?;
                self.data.insert(key.to_string(), Value::Document(nested));
                Ok(())
            }
        }
    }

    fn deep_remove(&mut self, splits: &[&str]) -> EngineResult<()> {
        let key = splits[0];
        if key.is_empty() {
            log::error!("Document does not support empty key");
            return Err(EngineError::new(
                "Document does not support empty key",
                ErrorKind::ValidationError,
            ));
        }

        if splits.len() == 1 {
            self.data.shift_remove(key);
            return Ok(());
        }

        let remaining = &splits[1..];
        match self.data.get_mut(key) {
            Some(Value::Document(obj)) => obj.deep_remove(remaining),
            Some(Value::Array(arr)) => remove_in_array(arr, remaining),
            _ => Ok(()),
        }
    }
}

fn put_in_array(arr: &mut Vec<Value>, splits: &[&str], value: Value) -> EngineResult<()> {
    let index: usize = splits[0].parse().map_err(|_| {
        log::error!("Invalid array index {} in document path", splits[0]);
        EngineError::new(
            &format!("Invalid array index {} in document path", splits[0]),
            ErrorKind::TypeMismatch,
        )
    })?;

    if splits.len() == 1 {
        // pad sparse writes with nulls, as a shell assignment would
        while arr.len() <= index {
            arr.push(Value::Null);
        }
        arr[index] = value;
        return Ok(());
    }

    let remaining = &splits[1..];
    match arr.get_mut(index) {
        Some(Value::Document(obj)) => obj.deep_put(remaining, value),
        Some(Value::Array(inner)) => put_in_array(inner, remaining, value),
        Some(_) | None => {
            let mut nested = Document::new();
            nested.deep_put(remaining, value)?;
            while arr.len() <= index {
                arr.push(Value::Null);
            }
            arr[index] = Value::Document(nested);
            Ok(())
        }
    }
}

fn remove_in_array(arr: &mut Vec<Value>, splits: &[&str]) -> EngineResult<()> {
    let index: usize = match splits[0].parse() {
        Ok(index) => index,
        Err(_) => return Ok(()),
    };
    if index >= arr.len() {
        return Ok(());
    }

    if splits.len() == 1 {
        arr.remove(index);
        return Ok(());
    }

    match &mut arr[index] {
        Value::Document(obj) => obj.deep_remove(&splits[1..]),
        Value::Array(inner) => remove_in_array(inner, &splits[1..]),
        _ => Ok(()),
    }
}

pub(crate) fn collect_values(
    data: &IndexMap<String, Value>,
    splits: &[&str],
    out: &mut SmallVec<[Value; 4]>,
) {
    if splits.is_empty() {
        return;
    }
    if let Some(value) = data.get(splits[0]) {
        collect_from_value(value, &splits[1..], out);
    }
}

fn collect_from_value(value: &Value, splits: &[&str], out: &mut SmallVec<[Value; 4]>) {
    if splits.is_empty() {
        out.push(value.clone());
        return;
    }

    match value {
        Value::Document(doc) => collect_values(&doc.data, splits, out),
        Value::Array(arr) => {
            // numeric segments address a single element
            if let Ok(index) = splits[0].parse::<usize>() {
                if let Some(item) = arr.get(index) {
                    collect_from_value(item, &splits[1..], out);
                }
            }
            // fan out over embedded documents with the same path
            for item in arr {
                if item.is_document() {
                    collect_from_value(item, splits, out);
                }
            }
        }
        _ => {}
    }
}

// Document equality, ordering, and hashing are entry-wise in insertion
// order: {"a": 1, "b": 2} and {"b": 2, "a": 1} are different documents.
impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.data.len() == other.data.len() && self.data.iter().eq(other.data.iter())
    }
}

impl Eq for Document {}

impl PartialOrd for Document {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Document {
    fn cmp(&self, other: &Self) -> Ordering {
        for ((lk, lv), (rk, rv)) in self.data.iter().zip(other.data.iter()) {
            let key_order = lk.cmp(rk);
            if key_order != Ordering::Equal {
                return key_order;
            }
            let value_order = lv.cmp(rv);
            if value_order != Ordering::Equal {
                return value_order;
            }
        }
        self.data.len().cmp(&other.data.len())
    }
}

impl Hash for Document {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.data.len().hash(state);
        for (key, value) in self.data.iter() {
            key.hash(state);
            value.hash(state);
        }
    }
}

impl Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_json_string())
    }
}

impl Display for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_json_string())
    }
}

pub fn normalize(value: &str) -> String {
    value.trim_matches('"').to_string()
}

/// Creates a document with JSON-like syntax.
///
/// # Examples
///
/// ```rust
/// use doclite::doc;
///
/// // Empty document
/// let empty = doc! {};
///
/// // Simple key-value pairs
/// let simple = doc! {
///     "name": "Alice",
///     "age": 30
/// };
///
/// // Nested documents and arrays
/// let complex = doc! {
///     "user": {
///         "name": "Charlie",
///         "tags": ["admin", "user"]
///     },
///     "values": [1, 2, 3]
/// };
/// ```
#[macro_export]
macro_rules! doc {
    // match an empty document (with braces)
    ({}) => {
        $crate::collection::Document::new()
    };

    // match an empty document
    () => {
        $crate::collection::Document::new()
    };

    // match a document with key value pairs (outer braces)
    ({ $($key:tt : $value:tt),* $(,)? }) => {
        $crate::doc!($($key : $value),*)
    };

    // match a document with key value pairs
    ($($key:tt : $value:tt),* $(,)?) => {
        {
            #[allow(unused_imports)]
            use $crate::doc_value;

            let mut doc = $crate::collection::Document::new();
            $(
                doc.insert(&$crate::collection::normalize(stringify!($key)), $crate::doc_value!($value))
                .expect(&format!("Failed to put value {} in document", stringify!($value)));
            )*
            doc
        }
    };
}

/// Helper macro to convert values for the doc! macro.
/// Handles nested documents, arrays, and expressions.
#[macro_export]
macro_rules! doc_value {
    // match a nested document
    ({ $($key:tt : $value:tt),* $(,)? }) => {
        {
            $crate::common::Value::Document($crate::doc!{ $($key : $value),* })
        }
    };

    // match an array of values
    ([ $($value:tt),* $(,)? ]) => {
        $crate::common::Value::Array(vec![$($crate::doc_value!($value)),*])
    };

    // match a null literal
    (null) => {
        $crate::common::Value::Null
    };

    // match an expression (variable, function call, parenthesized arithmetic, literals)
    ($value:expr) => {
        $crate::common::Value::from($value)
    };
}
