use crate::collection::Document;
use crate::common::stream::DocumentStream;
use crate::common::{SortOrder, Value};
use crate::errors::{EngineError, EngineResult};
use std::cmp::Ordering;

/// A stream adapter that yields its source in sorted order.
///
/// Sorting materializes the whole source up front. The sort is stable, so
/// documents comparing equal on every key keep their incoming order, and a
/// missing sort field orders as null. Multi-key sorts compare keys in
/// declaration order.
pub struct SortedStream {
    items: std::vec::IntoIter<Document>,
    error: Option<EngineError>,
}

impl SortedStream {
    pub fn new(source: DocumentStream, sort: &[(String, SortOrder)]) -> Self {
        let mut docs: Vec<Document> = Vec::new();
        let mut error = None;

        for item in source {
            match item {
                Ok(doc) => docs.push(doc),
                Err(e) => {
                    error = Some(e);
                    break;
                }
            }
        }

        if error.is_none() {
            docs.sort_by(|a, b| compare_documents(a, b, sort));
        }
        SortedStream {
            items: docs.into_iter(),
            error,
        }
    }
}

fn compare_documents(a: &Document, b: &Document, sort: &[(String, SortOrder)]) -> Ordering {
    for (field, order) in sort {
        let left: Value = a.get(field);
        let right: Value = b.get(field);
        let cmp = match order {
            SortOrder::Ascending => left.cmp(&right),
            SortOrder::Descending => right.cmp(&left),
        };
        if cmp != Ordering::Equal {
            return cmp;
        }
    }
    Ordering::Equal
}

impl Iterator for SortedStream {
    type Item = EngineResult<Document>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(error) = self.error.take() {
            return Some(Err(error));
        }
        self.items.next().map(Ok)
    }
}
