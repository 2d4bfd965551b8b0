//! Streaming adapters over query results.
//!
//! Read operations compose these adapters into a pipeline ending in a
//! [`DocumentCursor`], the caller-facing handle over a lazily evaluated
//! result set.

pub mod document_cursor;
pub mod filtered_stream;
pub mod indexed_stream;
pub mod projected_stream;
pub mod sorted_stream;

pub use document_cursor::DocumentCursor;
pub use filtered_stream::FilteredStream;
pub use indexed_stream::IndexedStream;
pub use projected_stream::ProjectedStream;
pub use sorted_stream::SortedStream;

use crate::collection::Document;
use crate::errors::EngineResult;

/// A boxed, fallible stream of documents.
pub type DocumentStream = Box<dyn Iterator<Item = EngineResult<Document>>>;
