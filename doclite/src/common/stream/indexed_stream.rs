use crate::collection::Document;
use crate::common::Value;
use crate::errors::EngineResult;
use crate::store::StorageMap;
use std::sync::Arc;

/// A stream that materializes documents from a list of ids produced by an
/// index scan.
///
/// Ids whose document has been removed since the scan are skipped; the
/// residual predicate downstream never sees them.
pub struct IndexedStream {
    ids: std::vec::IntoIter<Value>,
    store: Arc<dyn StorageMap>,
}

impl IndexedStream {
    pub fn new(ids: Vec<Value>, store: Arc<dyn StorageMap>) -> Self {
        IndexedStream {
            ids: ids.into_iter(),
            store,
        }
    }
}

impl Iterator for IndexedStream {
    type Item = EngineResult<Document>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let id = self.ids.next()?;
            if let Some(doc) = self.store.get(&id) {
                return Some(Ok(doc));
            }
        }
    }
}
