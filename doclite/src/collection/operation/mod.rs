//! Internal read and write executors behind the collection facade.

pub(crate) mod read_operations;
pub(crate) mod write_operations;

pub(crate) use read_operations::ReadOperations;
pub(crate) use write_operations::WriteOperations;

use crate::common::LockHandle;
use crate::index::IndexManager;
use crate::query::QueryPlanner;
use crate::store::StorageMap;
use std::sync::Arc;

/// Shared state the read and write executors of a collection operate on.
///
/// Reads never take the lock: the storage map and index maps tolerate
/// concurrent readers. Writes serialize on the collection-level write lock,
/// which is what makes the check-then-apply sequences of unique index
/// maintenance linearizable.
pub(crate) struct OperationContext {
    pub(crate) name: String,
    pub(crate) store: Arc<dyn StorageMap>,
    pub(crate) indexes: Arc<IndexManager>,
    pub(crate) planner: Arc<QueryPlanner>,
    pub(crate) lock: LockHandle,
}

impl OperationContext {
    pub(crate) fn new(
        name: &str,
        store: Arc<dyn StorageMap>,
        indexes: Arc<IndexManager>,
        planner: Arc<QueryPlanner>,
        lock: LockHandle,
    ) -> Self {
        OperationContext {
            name: name.to_string(),
            store,
            indexes,
            planner,
            lock,
        }
    }
}
