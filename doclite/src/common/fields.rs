use crate::errors::{EngineError, EngineResult, ErrorKind};
use std::fmt::{Debug, Display, Formatter};

/// An ordered list of document field paths.
///
/// `Fields` identifies the key paths of a compound index and preserves their
/// declaration order. The order is significant: an index on `["a", "b"]` can
/// serve queries constraining `a` alone (a prefix), but not queries
/// constraining only `b`.
///
/// # Examples
///
/// ```rust,ignore
/// use doclite::common::Fields;
///
/// let fields = Fields::with_names(vec!["city".into(), "age".into()])?;
/// assert_eq!(fields.encoded_name(), "city_age");
/// ```
#[derive(Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Fields {
    field_names: Vec<String>,
}

impl Fields {
    /// Creates an empty field list.
    pub fn new() -> Self {
        Fields {
            field_names: Vec::new(),
        }
    }

    /// Creates a field list with the given names.
    ///
    /// # Arguments
    ///
    /// * `field_names` - The field paths in declaration order
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` if the list is empty, contains an empty
    /// name, or contains a duplicate name.
    pub fn with_names(field_names: Vec<String>) -> EngineResult<Self> {
        if field_names.is_empty() {
            log::error!("Fields cannot be empty");
            return Err(EngineError::new(
                "Fields cannot be empty",
                ErrorKind::ValidationError,
            ));
        }

        for (pos, name) in field_names.iter().enumerate() {
            if name.is_empty() {
                log::error!("Field name cannot be empty");
                return Err(EngineError::new(
                    "Field name cannot be empty",
                    ErrorKind::ValidationError,
                ));
            }
            if field_names[..pos].contains(name) {
                log::error!("Duplicate field name {} in field list", name);
                return Err(EngineError::new(
                    &format!("Duplicate field name {} in field list", name),
                    ErrorKind::ValidationError,
                ));
            }
        }

        Ok(Fields { field_names })
    }

    /// Adds a field name to the end of the list.
    pub fn add_field(&mut self, field_name: &str) {
        self.field_names.push(field_name.to_string());
    }

    /// Returns the field names in declaration order.
    pub fn field_names(&self) -> &[String] {
        &self.field_names
    }

    /// Returns the first field name, if any.
    pub fn first(&self) -> Option<&String> {
        self.field_names.first()
    }

    pub fn len(&self) -> usize {
        self.field_names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.field_names.is_empty()
    }

    /// Returns the encoded name of this field list, with names joined by `_`.
    ///
    /// The encoded name is used as the default index name.
    pub fn encoded_name(&self) -> String {
        self.field_names.join("_")
    }

    /// Checks whether `other` is a leading prefix of this field list.
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// let compound = Fields::with_names(vec!["a".into(), "b".into()])?;
    /// let single = Fields::with_names(vec!["a".into()])?;
    /// assert!(compound.starts_with(&single));
    /// assert!(!single.starts_with(&compound));
    /// ```
    pub fn starts_with(&self, other: &Fields) -> bool {
        if other.field_names.len() > self.field_names.len() {
            return false;
        }
        self.field_names
            .iter()
            .zip(other.field_names.iter())
            .all(|(a, b)| a == b)
    }
}

impl Display for Fields {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.field_names.join(", "))
    }
}

impl Debug for Fields {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self)
    }
}
