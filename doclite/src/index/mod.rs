//! Secondary indexes.
//!
//! An index maps extracted key tuples to the ids of the documents they came
//! from. Array fields produce one key per element, so a single document may
//! appear under many keys of the same index. Compound indexes concatenate
//! the per-field keys into tuples ordered field by field.

pub mod descriptor;
pub mod index_manager;
pub mod index_map;

pub use descriptor::IndexDescriptor;
pub use index_manager::IndexManager;
pub use index_map::IndexMap;
