//! Primary document storage.
//!
//! A collection keeps its documents in a [`StorageMap`] keyed by document
//! id. The default backend is [`MemoryMap`], a concurrent skip list that
//! supports lock-free reads and ordered full scans.

pub mod memory;

pub use memory::MemoryMap;

use crate::collection::Document;
use crate::common::Value;

/// An ordered iterator over the entries of a storage map.
pub type EntryIterator = Box<dyn Iterator<Item = (Value, Document)>>;

/// The key-value store behind a collection, keyed by document id.
pub trait StorageMap: Send + Sync {
    /// The name of the backing map, usually the collection name.
    fn name(&self) -> String;

    /// Looks up the document stored under `key`.
    fn get(&self, key: &Value) -> Option<Document>;

    /// Stores `value` under `key`, replacing any previous entry.
    fn put(&self, key: Value, value: Document);

    /// Removes the entry under `key`, returning the stored document.
    fn remove(&self, key: &Value) -> Option<Document>;

    /// Checks whether an entry exists under `key`.
    fn contains_key(&self, key: &Value) -> bool;

    /// The number of stored entries.
    fn size(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Removes all entries.
    fn clear(&self);

    /// Iterates over all entries in key order.
    ///
    /// The iterator is a live cursor over the map: entries inserted or
    /// removed behind the cursor position are not revisited, entries ahead
    /// of it are observed as they stand when the cursor reaches them.
    fn entries(&self) -> EntryIterator;
}
