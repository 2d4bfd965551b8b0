use crate::collection::document::Document;
use crate::collection::document_id::DocumentId;
use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::fmt::{Debug, Display, Formatter};
use std::hash::{Hash, Hasher};

/// A value stored in a document field.
///
/// `Value` is the tagged union underlying the whole data model. A field can
/// hold a scalar, a timestamp, raw bytes, an array of values, or a nested
/// document. Integers and doubles are tracked as distinct variants but
/// compare by mathematical value.
///
/// # Ordering
///
/// A single total order spans all variants so that any two values can be
/// compared, sorted, and used as index keys:
///
/// `Null < Bool < Id < Number < String < Bytes < Timestamp < Array < Document`
///
/// Within the number bracket, `I64` and `F64` are compared by mathematical
/// value using IEEE-754 semantics; `NaN` sorts greater than every other
/// number. Arrays compare lexicographically element by element, documents
/// compare by their field entries in insertion order.
///
/// # Examples
///
/// ```rust,ignore
/// use doclite::common::Value;
///
/// let a = Value::from(1i64);
/// let b = Value::from(1.0f64);
/// assert_eq!(a, b);
/// assert!(Value::Null < Value::from(false));
/// ```
#[derive(Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Value {
    Null,
    Bool(bool),
    Id(DocumentId),
    I64(i64),
    F64(f64),
    String(String),
    Bytes(Vec<u8>),
    Timestamp(DateTime<Utc>),
    Array(Vec<Value>),
    Document(Document),
}

impl Value {
    /// Returns the rank of this value's kind in the cross-kind total order.
    fn type_rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Id(_) => 2,
            Value::I64(_) | Value::F64(_) => 3,
            Value::String(_) => 4,
            Value::Bytes(_) => 5,
            Value::Timestamp(_) => 6,
            Value::Array(_) => 7,
            Value::Document(_) => 8,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Value::I64(_) | Value::F64(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    pub fn is_document(&self) -> bool {
        matches!(self, Value::Document(_))
    }

    pub fn is_id(&self) -> bool {
        matches!(self, Value::Id(_))
    }

    /// Checks whether this value may serve as a document id.
    ///
    /// Arrays and documents are not permitted as `_id` values; any scalar,
    /// including null, is.
    pub fn is_valid_id(&self) -> bool {
        !matches!(self, Value::Array(_) | Value::Document(_))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::I64(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the numeric value as `f64` for either number variant.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::I64(i) => Some(*i as f64),
            Value::F64(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<&DateTime<Utc>> {
        match self {
            Value::Timestamp(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_id(&self) -> Option<&DocumentId> {
        match self {
            Value::Id(id) => Some(id),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Array(arr) => Some(arr),
            _ => None,
        }
    }

    pub fn as_document(&self) -> Option<&Document> {
        match self {
            Value::Document(doc) => Some(doc),
            _ => None,
        }
    }

    /// Compares two values in the number bracket by mathematical value.
    ///
    /// `NaN` is treated as greater than every other number and equal to
    /// itself, keeping the order total.
    pub(crate) fn num_cmp(a: &Value, b: &Value) -> Ordering {
        match (a, b) {
            (Value::I64(x), Value::I64(y)) => x.cmp(y),
            (Value::F64(x), Value::F64(y)) => cmp_f64(*x, *y),
            (Value::I64(x), Value::F64(y)) => cmp_f64(*x as f64, *y),
            (Value::F64(x), Value::I64(y)) => cmp_f64(*x, *y as f64),
            _ => unreachable!("num_cmp called with non-numeric values"),
        }
    }

    /// Compares two values in the same comparison bracket, returning `None`
    /// across brackets.
    ///
    /// Range operators use this so that, for example, `{"age": {"$gt": 5}}`
    /// never matches a string-valued `age`.
    pub(crate) fn bracket_cmp(&self, other: &Value) -> Option<Ordering> {
        if self.type_rank() != other.type_rank() {
            return None;
        }
        Some(self.cmp(other))
    }

    pub(crate) fn to_json_string(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Id(id) => format!("\"{}\"", id),
            Value::I64(i) => i.to_string(),
            Value::F64(f) => f.to_string(),
            Value::String(s) => format!("\"{}\"", s),
            Value::Bytes(b) => format!("<{} bytes>", b.len()),
            Value::Timestamp(t) => format!("\"{}\"", t.to_rfc3339()),
            Value::Array(arr) => {
                let items: Vec<String> = arr.iter().map(|v| v.to_json_string()).collect();
                format!("[{}]", items.join(", "))
            }
            Value::Document(doc) => doc.to_json_string(),
        }
    }
}

// NaN compares greater than every other double and equal to itself.
fn cmp_f64(x: f64, y: f64) -> Ordering {
    match (x.is_nan(), y.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        let rank = self.type_rank().cmp(&other.type_rank());
        if rank != Ordering::Equal {
            return rank;
        }

        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Id(a), Value::Id(b)) => a.cmp(b),
            (a, b) if a.is_number() && b.is_number() => Value::num_cmp(a, b),
            (Value::String(a), Value::String(b)) => a.cmp(b),
            (Value::Bytes(a), Value::Bytes(b)) => a.cmp(b),
            (Value::Timestamp(a), Value::Timestamp(b)) => a.cmp(b),
            (Value::Array(a), Value::Array(b)) => a.cmp(b),
            (Value::Document(a), Value::Document(b)) => a.cmp(b),
            _ => unreachable!("equal type ranks always match the same variant pair"),
        }
    }
}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_rank().hash(state);
        match self {
            Value::Null => {}
            Value::Bool(b) => b.hash(state),
            Value::Id(id) => id.hash(state),
            // numbers equal by mathematical value must hash alike
            Value::I64(i) => i.hash(state),
            Value::F64(f) => {
                if f.is_nan() {
                    u64::MAX.hash(state);
                } else if f.fract() == 0.0 && *f >= i64::MIN as f64 && *f <= i64::MAX as f64 {
                    (*f as i64).hash(state);
                } else {
                    f.to_bits().hash(state);
                }
            }
            Value::String(s) => s.hash(state),
            Value::Bytes(b) => b.hash(state),
            Value::Timestamp(t) => t.hash(state),
            Value::Array(arr) => arr.hash(state),
            Value::Document(doc) => doc.hash(state),
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_json_string())
    }
}

impl Debug for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_json_string())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::I64(i as i64)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::I64(i)
    }
}

impl From<u32> for Value {
    fn from(i: u32) -> Self {
        Value::I64(i as i64)
    }
}

impl From<f32> for Value {
    fn from(f: f32) -> Self {
        Value::F64(f as f64)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::F64(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(t: DateTime<Utc>) -> Self {
        Value::Timestamp(t)
    }
}

impl From<DocumentId> for Value {
    fn from(id: DocumentId) -> Self {
        Value::Id(id)
    }
}

impl From<Document> for Value {
    fn from(doc: Document) -> Self {
        Value::Document(doc)
    }
}

impl From<Vec<Value>> for Value {
    fn from(arr: Vec<Value>) -> Self {
        Value::Array(arr)
    }
}

impl From<&Value> for Value {
    fn from(v: &Value) -> Self {
        v.clone()
    }
}
