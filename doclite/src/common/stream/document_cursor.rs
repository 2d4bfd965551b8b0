use crate::collection::Document;
use crate::common::stream::DocumentStream;
use crate::errors::EngineResult;
use crate::query::QueryPlan;
use std::sync::Arc;

/// A lazily evaluated, replayable view over the documents of a query.
///
/// The cursor pulls from its underlying stream on demand and caches every
/// yielded item, so it can be iterated multiple times after a [`reset`].
/// Documents reflect the collection state at the time each item was pulled,
/// not at cursor creation.
///
/// [`reset`]: DocumentCursor::reset
pub struct DocumentCursor {
    underlying: Option<DocumentStream>,
    cache: Vec<EngineResult<Document>>,
    current_index: usize,
    plan: Option<Arc<QueryPlan>>,
}

impl DocumentCursor {
    pub fn new(stream: DocumentStream) -> Self {
        DocumentCursor {
            underlying: Some(stream),
            cache: Vec::new(),
            current_index: 0,
            plan: None,
        }
    }

    /// Rewinds the cursor to the first item.
    pub fn reset(&mut self) {
        self.current_index = 0;
    }

    /// The total number of items, draining the underlying stream if it has
    /// not been fully consumed yet. The cursor is rewound afterwards.
    pub fn size(&mut self) -> usize {
        if self.underlying.is_some() {
            for _ in self.by_ref() {}
        }
        self.reset();
        self.cache.len()
    }

    /// Rewinds and returns the first item.
    pub fn first(&mut self) -> Option<EngineResult<Document>> {
        self.reset();
        self.next()
    }

    /// The plan the query executor chose for this cursor, when one applies.
    pub fn plan(&self) -> Option<&QueryPlan> {
        self.plan.as_deref()
    }

    pub(crate) fn with_plan(mut self, plan: Arc<QueryPlan>) -> Self {
        self.plan = Some(plan);
        self
    }

    /// Collects all remaining documents, stopping at the first error.
    pub fn collect_documents(&mut self) -> EngineResult<Vec<Document>> {
        let mut out = Vec::new();
        for item in self.by_ref() {
            out.push(item?);
        }
        Ok(out)
    }
}

impl Iterator for DocumentCursor {
    type Item = EngineResult<Document>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current_index < self.cache.len() {
            let item = self.cache[self.current_index].clone();
            self.current_index += 1;
            return Some(item);
        }

        if let Some(ref mut stream) = self.underlying {
            if let Some(item) = stream.next() {
                self.cache.push(item.clone());
                self.current_index += 1;
                return Some(item);
            }
            // exhausted, drop the source
            self.underlying = None;
        }
        None
    }
}
