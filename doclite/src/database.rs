//! The named collection registry.

use crate::collection::Collection;
use crate::common::LockRegistry;
use crate::errors::{EngineError, EngineResult, ErrorKind};
use dashmap::DashMap;
use std::sync::Arc;

/// An in-memory document database: a registry of named [`Collection`]s.
///
/// The database hands out collection handles, creating collections lazily
/// on first access. Handles are cheap to clone and safe to share across
/// threads; `$lookup` stages resolve their foreign collection through the
/// owning database.
///
/// # Examples
///
/// ```rust,ignore
/// use doclite::database::Database;
/// use doclite::doc;
///
/// let db = Database::new();
/// let users = db.collection("users")?;
/// users.insert_one(doc! { "name": "Alice" })?;
/// ```
#[derive(Clone, Default)]
pub struct Database {
    inner: Arc<DatabaseInner>,
}

#[derive(Default)]
pub(crate) struct DatabaseInner {
    collections: DashMap<String, Collection>,
    locks: LockRegistry,
}

impl DatabaseInner {
    pub(crate) fn get_collection(&self, name: &str) -> Option<Collection> {
        self.collections.get(name).map(|entry| entry.clone())
    }
}

impl Database {
    pub fn new() -> Self {
        Database::default()
    }

    /// Returns the collection registered under `name`, creating it if it
    /// does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for an empty name or one containing `$`.
    pub fn collection(&self, name: &str) -> EngineResult<Collection> {
        validate_collection_name(name)?;
        if let Some(collection) = self.inner.get_collection(name) {
            return Ok(collection);
        }

        let entry = self
            .inner
            .collections
            .entry(name.to_string())
            .or_insert_with(|| {
                log::debug!("Creating collection {}", name);
                Collection::new(
                    name,
                    Arc::downgrade(&self.inner),
                    self.inner.locks.get_lock(name),
                )
            });
        Ok(entry.clone())
    }

    /// Checks whether a collection named `name` exists.
    pub fn has_collection(&self, name: &str) -> bool {
        self.inner.collections.contains_key(name)
    }

    /// The names of all collections, in no particular order.
    pub fn list_collection_names(&self) -> Vec<String> {
        self.inner
            .collections
            .iter()
            .map(|entry| entry.key().clone())
            .collect()
    }

    /// Drops the collection named `name`: its documents and indexes are
    /// removed and the name is unregistered.
    ///
    /// Handles still pointing at the dropped collection keep working but
    /// address a collection no longer reachable from the database.
    ///
    /// # Errors
    ///
    /// Returns `CollectionNotFound` if no such collection exists.
    pub fn drop_collection(&self, name: &str) -> EngineResult<()> {
        match self.inner.collections.remove(name) {
            Some((_, collection)) => {
                collection.drop();
                self.inner.locks.remove_lock(name);
                Ok(())
            }
            None => {
                log::error!("No collection named {}", name);
                Err(EngineError::new(
                    &format!("No collection named {}", name),
                    ErrorKind::CollectionNotFound,
                ))
            }
        }
    }
}

fn validate_collection_name(name: &str) -> EngineResult<()> {
    if name.is_empty() || name.contains('$') {
        log::error!("Invalid collection name '{}'", name);
        return Err(EngineError::new(
            &format!("Invalid collection name '{}'", name),
            ErrorKind::ValidationError,
        ));
    }
    Ok(())
}
