use crate::common::Value;
use crate::errors::EngineError;

/// The result of a multi-document insert.
///
/// Multi-document writes are best-effort: a failure on one document does not
/// abort the remaining ones. The result carries the count of successful
/// inserts, the ids assigned to them, and the first error encountered, if
/// any.
#[derive(Debug, Default)]
pub struct InsertManyResult {
    pub(crate) inserted_ids: Vec<Value>,
    pub(crate) first_error: Option<EngineError>,
}

impl InsertManyResult {
    /// The ids of the documents that were inserted, in input order.
    pub fn inserted_ids(&self) -> &[Value] {
        &self.inserted_ids
    }

    /// The number of documents that were inserted.
    pub fn inserted_count(&self) -> usize {
        self.inserted_ids.len()
    }

    /// The first per-document error encountered, if any.
    pub fn first_error(&self) -> Option<&EngineError> {
        self.first_error.as_ref()
    }
}

/// The result of an update or replace operation.
#[derive(Debug, Default)]
pub struct UpdateResult {
    pub(crate) matched_count: usize,
    pub(crate) modified_count: usize,
    pub(crate) upserted_id: Option<Value>,
    pub(crate) first_error: Option<EngineError>,
}

impl UpdateResult {
    /// The number of documents the selector matched.
    pub fn matched_count(&self) -> usize {
        self.matched_count
    }

    /// The number of documents the update actually changed.
    ///
    /// A matched document whose fields already hold the target values counts
    /// as matched but not modified.
    pub fn modified_count(&self) -> usize {
        self.modified_count
    }

    /// The id of the document inserted by an upsert, if one took place.
    pub fn upserted_id(&self) -> Option<&Value> {
        self.upserted_id.as_ref()
    }

    /// The first per-document error encountered, if any.
    pub fn first_error(&self) -> Option<&EngineError> {
        self.first_error.as_ref()
    }
}

/// The result of a delete operation.
#[derive(Debug, Default)]
pub struct DeleteResult {
    pub(crate) deleted_count: usize,
    pub(crate) first_error: Option<EngineError>,
}

impl DeleteResult {
    /// The number of documents that were deleted.
    pub fn deleted_count(&self) -> usize {
        self.deleted_count
    }

    /// The first per-document error encountered, if any.
    pub fn first_error(&self) -> Option<&EngineError> {
        self.first_error.as_ref()
    }
}
