//! Common types, traits, and utilities shared across the engine.

use parking_lot::RwLock;
use std::sync::Arc;

pub mod fields;
pub mod lock;
pub mod sort_order;
pub mod stream;
pub mod value;

pub use fields::Fields;
pub use lock::{LockHandle, LockRegistry};
pub use sort_order::SortOrder;
pub use value::Value;

/// The reserved document id field.
pub const DOC_ID: &str = "_id";

/// A value protected by a reader-writer lock and shared via `Arc`.
pub type Atomic<T> = Arc<RwLock<T>>;

#[inline]
pub fn atomic<T>(t: T) -> Atomic<T> {
    Arc::new(RwLock::new(t))
}

/// Returns the current time as milliseconds since the Unix epoch, or 0 if the
/// system clock is set before the epoch.
pub fn get_current_time_or_zero() -> i64 {
    chrono::Utc::now().timestamp_millis().max(0)
}
