use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::collections::HashMap;
use std::sync::Arc;

/// A handle to a read-write lock that can be stored and reused.
pub struct LockHandle {
    lock: Arc<RwLock<()>>,
}

impl LockHandle {
    /// Creates a new lock handle.
    pub fn new() -> Self {
        LockHandle {
            lock: Arc::new(RwLock::new(())),
        }
    }

    /// Acquires a read lock
    pub fn read(&self) -> RwLockReadGuard<'_, ()> {
        self.lock.read()
    }

    /// Acquires a write lock
    pub fn write(&self) -> RwLockWriteGuard<'_, ()> {
        self.lock.write()
    }
}

impl Default for LockHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Registry for managing named read-write locks.
///
/// Each collection acquires its write-path lock from this registry so that a
/// collection name maps to exactly one lock for the lifetime of the registry.
/// Writers on the same collection serialize on it; readers never take it.
///
/// This implementation uses `parking_lot`'s poison-free locks.
///
/// # Examples
///
/// ```
/// use doclite::common::LockRegistry;
/// let lock_registry = LockRegistry::new();
/// let lock = lock_registry.get_lock("users");
/// {
///     let _write_guard = lock.write();
/// } // Write lock is held while _write_guard is in scope
/// ```
#[derive(Clone)]
pub struct LockRegistry {
    locks: Arc<RwLock<HashMap<String, Arc<RwLock<()>>>>>,
}

impl LockRegistry {
    /// Creates a new empty lock registry.
    pub fn new() -> Self {
        LockRegistry {
            locks: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Gets a lock for the given name, creating it if it does not exist.
    ///
    /// Multiple read locks can be held simultaneously for the same resource.
    /// Only one write lock can be held at a time, and no read locks can be
    /// held while a write lock is held.
    ///
    /// # Arguments
    ///
    /// * `name` - The name of the lock
    ///
    /// # Returns
    ///
    /// A lock handle that can be used to acquire read or write locks
    pub fn get_lock(&self, name: &str) -> LockHandle {
        let lock = {
            let mut locks = self.locks.write();
            locks
                .entry(name.to_string())
                .or_insert_with(|| Arc::new(RwLock::new(())))
                .clone()
        };
        LockHandle { lock }
    }

    /// Removes a lock from the registry.
    ///
    /// # Arguments
    ///
    /// * `name` - The name of the lock to remove
    ///
    /// # Returns
    ///
    /// `true` if the lock was removed, `false` if it didn't exist
    pub fn remove_lock(&self, name: &str) -> bool {
        let mut locks = self.locks.write();
        locks.remove(name).is_some()
    }

    /// Returns the number of locks currently registered.
    pub fn lock_count(&self) -> usize {
        let locks = self.locks.read();
        locks.len()
    }
}

impl Default for LockRegistry {
    fn default() -> Self {
        Self::new()
    }
}
