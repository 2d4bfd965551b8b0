//! # DocLite - Embedded Document Store Engine
//!
//! DocLite is the core evaluation engine of a schema-less document data store.
//! It stores JSON-like documents in named collections and provides rich
//! querying, partial updates, secondary indexes, and aggregation pipelines.
//!
//! ## Key Features
//!
//! - **Schema-less**: Documents in the same collection may have different shapes
//! - **Rich Querying**: MongoDB-style predicate documents with comparison,
//!   membership, array, and logical operators
//! - **Partial Updates**: `$set`, `$inc`, `$unset`, `$push`, and `$pull`
//!   operators with deterministic application order
//! - **Indexing**: Single-field and compound indexes, multikey over arrays,
//!   optional unique constraints
//! - **Query Planning**: Rule-based index selection with residual filtering
//! - **Aggregation**: `$match`, `$project`, `$group`, `$sort`, `$limit`,
//!   `$skip`, and `$lookup` pipeline stages
//! - **Clean API**: PIMPL pattern provides a stable, encapsulated interface
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use doclite::database::Database;
//! use doclite::doc;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::new();
//! let collection = db.collection("users")?;
//!
//! collection.insert_one(doc! { "name": "Alice", "age": 30 })?;
//!
//! let cursor = collection.find(&doc! { "age": { "$gte": 18 } }, Default::default())?;
//! for doc in cursor {
//!     println!("{}", doc?);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Organization
//!
//! - [`collection`] - Document collections and document operations
//! - [`common`] - Common types, traits, and utilities
//! - [`database`] - Named collection registry
//! - [`errors`] - Error types and result definitions
//! - [`index`] - Secondary index support
//! - [`pipeline`] - Aggregation pipeline engine
//! - [`query`] - Query predicates and the query planner
//! - [`store`] - Storage backend abstractions
//! - [`update`] - Update operator parsing and application

use crate::collection::snowflake::SnowflakeIdGenerator;
use std::sync::LazyLock;

pub mod collection;
pub mod common;
pub mod database;
pub mod errors;
pub mod index;
pub mod pipeline;
pub mod query;
pub mod store;
pub mod update;

pub(crate) const FIELD_SEPARATOR: char = '.';

pub(crate) static ID_GENERATOR: LazyLock<SnowflakeIdGenerator> =
    LazyLock::new(SnowflakeIdGenerator::new);
