use crate::common::Fields;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Describes the configuration of an index on a collection.
///
/// A descriptor defines which fields are indexed, in which order, and
/// whether the index enforces uniqueness. Descriptors are immutable and
/// cheap to clone.
///
/// Compound indexes list multiple fields; their declaration order is the
/// order of key components in the index and the order prefixes are matched
/// during planning.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct IndexDescriptor {
    inner: Arc<IndexDescriptorInner>,
}

#[derive(Debug, PartialEq, Eq, Hash)]
struct IndexDescriptorInner {
    index_name: String,
    index_fields: Fields,
    unique: bool,
}

impl IndexDescriptor {
    /// Creates a descriptor for the given fields. The index name is derived
    /// from the field names and identifies the index within its collection.
    pub fn new(index_fields: Fields, unique: bool) -> Self {
        let index_name = format!("idx_{}", index_fields.encoded_name());
        IndexDescriptor {
            inner: Arc::new(IndexDescriptorInner {
                index_name,
                index_fields,
                unique,
            }),
        }
    }

    /// The derived name of the index.
    pub fn index_name(&self) -> &str {
        &self.inner.index_name
    }

    /// The indexed fields, in key order.
    pub fn index_fields(&self) -> &Fields {
        &self.inner.index_fields
    }

    /// Whether the index enforces key uniqueness.
    pub fn is_unique(&self) -> bool {
        self.inner.unique
    }

    /// Whether this index spans multiple fields.
    pub fn is_compound(&self) -> bool {
        self.inner.index_fields.len() > 1
    }
}

impl Display for IndexDescriptor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}{} on {}",
            if self.is_unique() { "unique " } else { "" },
            self.index_name(),
            self.index_fields()
        )
    }
}
