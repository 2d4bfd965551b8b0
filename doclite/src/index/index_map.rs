use crate::common::Value;
use parking_lot::RwLock;
use smallvec::SmallVec;
use std::collections::{BTreeMap, BTreeSet};
use std::ops::Bound;

/// A key tuple extracted from a document. Single-field indexes use a tuple
/// of length one; compound indexes use one component per field.
pub type IndexKey = SmallVec<[Value; 4]>;

/// The ordered key-to-ids structure behind a single index.
///
/// Keys are full tuples; ids are document ids. A non-unique index may hold
/// several ids under one key, and a multikey document contributes several
/// keys pointing at the same id. Lookups scan a contiguous key range, so an
/// equality prefix plus an optional range constraint on the next component
/// resolves to one ordered walk of the tree.
pub struct IndexMap {
    data: RwLock<BTreeMap<IndexKey, BTreeSet<Value>>>,
}

impl IndexMap {
    pub fn new() -> Self {
        IndexMap {
            data: RwLock::new(BTreeMap::new()),
        }
    }

    /// Records `id` under `key`.
    pub fn add(&self, key: IndexKey, id: Value) {
        let mut data = self.data.write();
        data.entry(key).or_default().insert(id);
    }

    /// Removes `id` from under `key`, dropping the key when it holds no
    /// more ids.
    pub fn remove(&self, key: &IndexKey, id: &Value) {
        let mut data = self.data.write();
        if let Some(ids) = data.get_mut(key) {
            ids.remove(id);
            if ids.is_empty() {
                data.remove(key);
            }
        }
    }

    /// Checks whether `key` is already held by a document other than `id`.
    pub fn has_conflict(&self, key: &IndexKey, id: &Value) -> bool {
        let data = self.data.read();
        match data.get(key) {
            Some(ids) => ids.iter().any(|existing| existing != id),
            None => false,
        }
    }

    /// Scans keys that start with `prefix`, optionally constraining the
    /// component right after the prefix to a range.
    ///
    /// Returns the matching document ids in key order, first occurrence
    /// only. Range bounds apply within the bound's comparison bracket, so a
    /// numeric range never admits string components.
    pub fn scan(
        &self,
        prefix: &[Value],
        lower: &Bound<Value>,
        upper: &Bound<Value>,
    ) -> Vec<Value> {
        let data = self.data.read();
        let start: IndexKey = prefix.iter().cloned().collect();
        let mut seen: BTreeSet<Value> = BTreeSet::new();
        let mut out = Vec::new();

        for (key, ids) in data.range((Bound::Included(start), Bound::Unbounded)) {
            if !key.starts_with(prefix) {
                break;
            }
            if !range_unbounded(lower, upper) {
                match key.get(prefix.len()) {
                    Some(component) if within(component, lower, upper) => {}
                    _ => continue,
                }
            }
            for id in ids {
                if seen.insert(id.clone()) {
                    out.push(id.clone());
                }
            }
        }
        out
    }

    /// The number of distinct keys in the index.
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }
}

impl Default for IndexMap {
    fn default() -> Self {
        IndexMap::new()
    }
}

fn range_unbounded(lower: &Bound<Value>, upper: &Bound<Value>) -> bool {
    matches!(lower, Bound::Unbounded) && matches!(upper, Bound::Unbounded)
}

fn within(value: &Value, lower: &Bound<Value>, upper: &Bound<Value>) -> bool {
    let above = match lower {
        Bound::Unbounded => true,
        Bound::Included(b) => value
            .bracket_cmp(b)
            .is_some_and(|o| o != std::cmp::Ordering::Less),
        Bound::Excluded(b) => value
            .bracket_cmp(b)
            .is_some_and(|o| o == std::cmp::Ordering::Greater),
    };
    if !above {
        return false;
    }
    match upper {
        Bound::Unbounded => true,
        Bound::Included(b) => value
            .bracket_cmp(b)
            .is_some_and(|o| o != std::cmp::Ordering::Greater),
        Bound::Excluded(b) => value
            .bracket_cmp(b)
            .is_some_and(|o| o == std::cmp::Ordering::Less),
    }
}
