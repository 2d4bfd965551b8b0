use crate::collection::Document;
use crate::common::{Fields, Value};
use crate::errors::{EngineError, EngineResult, ErrorKind};
use crate::index::index_map::{IndexKey, IndexMap};
use crate::index::IndexDescriptor;
use itertools::Itertools;
use parking_lot::RwLock;
use smallvec::SmallVec;
use std::collections::HashSet;
use std::ops::Bound;
use std::sync::Arc;

struct IndexEntry {
    descriptor: IndexDescriptor,
    map: Arc<IndexMap>,
}

/// Maintains every index of one collection.
///
/// Indexes are kept in creation order, which is the tie-breaking order the
/// query planner uses when two indexes cover a predicate equally well.
///
/// All mutating calls run under the owning collection's write lock, so a
/// uniqueness check followed by the corresponding insert is atomic with
/// respect to other writers.
pub struct IndexManager {
    collection_name: String,
    entries: RwLock<Vec<IndexEntry>>,
}

impl IndexManager {
    pub fn new(collection_name: &str) -> Self {
        IndexManager {
            collection_name: collection_name.to_string(),
            entries: RwLock::new(Vec::new()),
        }
    }

    /// Creates an index over `fields` and populates it from `existing`
    /// documents.
    ///
    /// # Errors
    ///
    /// Returns `IndexConflict` if an index over the same fields already
    /// exists, and `DuplicateKey` if a unique index cannot be built because
    /// the existing documents repeat a key.
    pub fn create_index(
        &self,
        fields: Fields,
        unique: bool,
        existing: impl Iterator<Item = (Value, Document)>,
    ) -> EngineResult<IndexDescriptor> {
        let descriptor = IndexDescriptor::new(fields, unique);
        {
            let entries = self.entries.read();
            if entries
                .iter()
                .any(|e| e.descriptor.index_fields() == descriptor.index_fields())
            {
                log::error!(
                    "Index on {} already exists in collection {}",
                    descriptor.index_fields(),
                    self.collection_name
                );
                return Err(EngineError::new(
                    &format!("Index on {} already exists", descriptor.index_fields()),
                    ErrorKind::IndexConflict,
                ));
            }
        }

        let map = Arc::new(IndexMap::new());
        for (id, doc) in existing {
            for key in extract_keys(&doc, descriptor.index_fields()) {
                if unique && map.has_conflict(&key, &id) {
                    log::error!(
                        "Cannot build unique index {}: duplicate key for document {}",
                        descriptor.index_name(),
                        id
                    );
                    return Err(EngineError::new(
                        &format!(
                            "Duplicate key in unique index {}",
                            descriptor.index_name()
                        ),
                        ErrorKind::DuplicateKey,
                    ));
                }
                map.add(key, id.clone());
            }
        }

        let mut entries = self.entries.write();
        entries.push(IndexEntry {
            descriptor: descriptor.clone(),
            map,
        });
        log::debug!(
            "Created index {} on collection {}",
            descriptor.index_name(),
            self.collection_name
        );
        Ok(descriptor)
    }

    /// Drops the index over `fields`.
    ///
    /// # Errors
    ///
    /// Returns `IndexNotFound` if no such index exists.
    pub fn drop_index(&self, fields: &Fields) -> EngineResult<()> {
        let mut entries = self.entries.write();
        let position = entries
            .iter()
            .position(|e| e.descriptor.index_fields() == fields);
        match position {
            Some(position) => {
                entries.remove(position);
                Ok(())
            }
            None => {
                log::error!(
                    "No index on {} in collection {}",
                    fields,
                    self.collection_name
                );
                Err(EngineError::new(
                    &format!("No index on {}", fields),
                    ErrorKind::IndexNotFound,
                ))
            }
        }
    }

    /// Drops every index of the collection.
    pub fn drop_all(&self) {
        self.entries.write().clear();
    }

    /// Lists index descriptors in creation order.
    pub fn list_indexes(&self) -> Vec<IndexDescriptor> {
        self.entries
            .read()
            .iter()
            .map(|e| e.descriptor.clone())
            .collect()
    }

    pub fn has_index(&self, fields: &Fields) -> bool {
        self.entries
            .read()
            .iter()
            .any(|e| e.descriptor.index_fields() == fields)
    }

    /// Updates every index for a newly inserted document.
    ///
    /// Uniqueness is validated across all indexes before any of them is
    /// touched, so a `DuplicateKey` failure leaves the indexes unchanged.
    pub fn on_insert(&self, id: &Value, doc: &Document) -> EngineResult<()> {
        let entries = self.entries.read();
        let keyed: Vec<(&IndexEntry, Vec<IndexKey>)> = entries
            .iter()
            .map(|e| (e, extract_keys(doc, e.descriptor.index_fields())))
            .collect();

        for (entry, keys) in &keyed {
            if entry.descriptor.is_unique() {
                for key in keys {
                    if entry.map.has_conflict(key, id) {
                        return Err(self.duplicate_key(&entry.descriptor));
                    }
                }
            }
        }
        for (entry, keys) in keyed {
            for key in keys {
                entry.map.add(key, id.clone());
            }
        }
        Ok(())
    }

    /// Removes a deleted document from every index.
    pub fn on_remove(&self, id: &Value, doc: &Document) {
        let entries = self.entries.read();
        for entry in entries.iter() {
            for key in extract_keys(doc, entry.descriptor.index_fields()) {
                entry.map.remove(&key, id);
            }
        }
    }

    /// Updates every index when a stored document changes.
    ///
    /// Only the symmetric difference of the old and new key sets is
    /// touched: keys present in both versions stay in place.
    pub fn on_replace(&self, id: &Value, old: &Document, new: &Document) -> EngineResult<()> {
        let entries = self.entries.read();
        let mut deltas: Vec<(&IndexEntry, Vec<IndexKey>, Vec<IndexKey>)> = Vec::new();

        for entry in entries.iter() {
            let old_keys: HashSet<IndexKey> =
                extract_keys(old, entry.descriptor.index_fields())
                    .into_iter()
                    .collect();
            let new_keys: HashSet<IndexKey> =
                extract_keys(new, entry.descriptor.index_fields())
                    .into_iter()
                    .collect();

            let added: Vec<IndexKey> = new_keys.difference(&old_keys).cloned().collect();
            let removed: Vec<IndexKey> = old_keys.difference(&new_keys).cloned().collect();

            if entry.descriptor.is_unique() {
                for key in &added {
                    if entry.map.has_conflict(key, id) {
                        return Err(self.duplicate_key(&entry.descriptor));
                    }
                }
            }
            deltas.push((entry, added, removed));
        }

        for (entry, added, removed) in deltas {
            for key in removed {
                entry.map.remove(&key, id);
            }
            for key in added {
                entry.map.add(key, id.clone());
            }
        }
        Ok(())
    }

    /// Scans the named index for document ids matching an equality prefix
    /// and an optional range on the following key component.
    pub fn scan(
        &self,
        index_name: &str,
        prefix: &[Value],
        lower: &Bound<Value>,
        upper: &Bound<Value>,
    ) -> Vec<Value> {
        let entries = self.entries.read();
        match entries
            .iter()
            .find(|e| e.descriptor.index_name() == index_name)
        {
            Some(entry) => entry.map.scan(prefix, lower, upper),
            None => Vec::new(),
        }
    }

    fn duplicate_key(&self, descriptor: &IndexDescriptor) -> EngineError {
        log::error!(
            "Duplicate key in unique index {} of collection {}",
            descriptor.index_name(),
            self.collection_name
        );
        EngineError::new(
            &format!("Duplicate key in unique index {}", descriptor.index_name()),
            ErrorKind::DuplicateKey,
        )
    }
}

/// Extracts the index key tuples a document contributes to an index.
///
/// Each field resolves to its candidate values; array values contribute one
/// key component per element. A missing field or an empty array contributes
/// a single null component, so such documents remain reachable through the
/// index. Multiple multikey fields combine by cartesian product.
pub(crate) fn extract_keys(doc: &Document, fields: &Fields) -> Vec<IndexKey> {
    let per_field: Vec<Vec<Value>> = fields
        .field_names()
        .iter()
        .map(|field| {
            let candidates = doc.resolve_values(field);
            let mut components: Vec<Value> = Vec::new();
            if candidates.is_empty() {
                components.push(Value::Null);
            }
            for candidate in candidates {
                match candidate {
                    Value::Array(elements) if elements.is_empty() => {
                        components.push(Value::Null)
                    }
                    Value::Array(elements) => components.extend(elements),
                    other => components.push(other),
                }
            }
            components.into_iter().unique().collect()
        })
        .collect();

    per_field
        .into_iter()
        .multi_cartesian_product()
        .map(SmallVec::from_vec)
        .unique()
        .collect()
}
