//! Document collections and document operations.

pub mod collection;
pub mod document;
pub mod document_id;
pub mod find_options;
pub mod operation;
pub mod snowflake;
pub mod update_options;
pub mod write_result;

pub use collection::Collection;
pub use document::{normalize, Document};
pub use document_id::DocumentId;
pub use find_options::{order_by, FindOptions, Projection};
pub use update_options::{insert_if_absent, UpdateOptions};
pub use write_result::{DeleteResult, InsertManyResult, UpdateResult};
