use crate::collection::Document;
use crate::common::stream::DocumentStream;
use crate::errors::EngineResult;
use crate::query::Predicate;

/// A stream adapter that keeps only documents matching a predicate.
///
/// Errors from the source pass through unchanged.
pub struct FilteredStream {
    source: DocumentStream,
    predicate: Predicate,
}

impl FilteredStream {
    pub fn new(source: DocumentStream, predicate: Predicate) -> Self {
        FilteredStream { source, predicate }
    }
}

impl Iterator for FilteredStream {
    type Item = EngineResult<Document>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.source.next()? {
                Ok(doc) => {
                    if self.predicate.matches(&doc) {
                        return Some(Ok(doc));
                    }
                }
                Err(e) => return Some(Err(e)),
            }
        }
    }
}
