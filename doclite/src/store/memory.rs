use crate::collection::Document;
use crate::common::Value;
use crate::store::{EntryIterator, StorageMap};
use crossbeam_skiplist::SkipMap;
use std::ops::Bound::Excluded;
use std::sync::Arc;

/// In-memory storage map backed by a concurrent skip list.
///
/// Reads never block: lookups and scans run against the skip list without
/// taking a lock, while writers synchronize at the collection level above
/// this map. Entries are ordered by key, so a full scan yields documents in
/// ascending id order.
///
/// Cloning is cheap and yields a handle to the same map.
#[derive(Clone)]
pub struct MemoryMap {
    name: String,
    data: Arc<SkipMap<Value, Document>>,
}

impl MemoryMap {
    pub fn new(name: &str) -> Self {
        MemoryMap {
            name: name.to_string(),
            data: Arc::new(SkipMap::new()),
        }
    }
}

impl StorageMap for MemoryMap {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn get(&self, key: &Value) -> Option<Document> {
        self.data.get(key).map(|entry| entry.value().clone())
    }

    fn put(&self, key: Value, value: Document) {
        self.data.insert(key, value);
    }

    fn remove(&self, key: &Value) -> Option<Document> {
        self.data.remove(key).map(|entry| entry.value().clone())
    }

    fn contains_key(&self, key: &Value) -> bool {
        self.data.contains_key(key)
    }

    fn size(&self) -> usize {
        self.data.len()
    }

    fn clear(&self) {
        self.data.clear();
    }

    fn entries(&self) -> EntryIterator {
        Box::new(ScanCursor {
            data: Arc::clone(&self.data),
            last_key: None,
        })
    }
}

// A resumable cursor over the skip list. Holding the position as the last
// yielded key instead of a borrowed iterator keeps the cursor independent of
// the map's lifetime and safe against concurrent mutation.
struct ScanCursor {
    data: Arc<SkipMap<Value, Document>>,
    last_key: Option<Value>,
}

impl Iterator for ScanCursor {
    type Item = (Value, Document);

    fn next(&mut self) -> Option<Self::Item> {
        let entry = match &self.last_key {
            None => self.data.front(),
            Some(last) => self.data.lower_bound(Excluded(last)),
        }?;
        let key = entry.key().clone();
        let value = entry.value().clone();
        self.last_key = Some(key.clone());
        Some((key, value))
    }
}
