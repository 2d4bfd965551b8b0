use crate::collection::operation::OperationContext;
use crate::collection::{Document, FindOptions};
use crate::common::stream::{
    DocumentCursor, DocumentStream, FilteredStream, IndexedStream, ProjectedStream, SortedStream,
};
use crate::common::Value;
use crate::errors::EngineResult;
use crate::query::plan::ScanStrategy;
use crate::query::{Predicate, QueryPlan};
use std::sync::Arc;

/// Executes queries against a collection's storage and indexes.
pub(crate) struct ReadOperations<'a> {
    ctx: &'a OperationContext,
}

impl<'a> ReadOperations<'a> {
    pub(crate) fn new(ctx: &'a OperationContext) -> Self {
        ReadOperations { ctx }
    }

    /// Plans and executes a find, returning a cursor over the results.
    pub(crate) fn find(
        &self,
        predicate: &Predicate,
        options: &FindOptions,
    ) -> EngineResult<DocumentCursor> {
        let plan = self.ctx.planner.plan(predicate, &self.ctx.indexes);
        let mut stream = self.filtered_stream(&plan);

        if !options.sort.is_empty() {
            stream = Box::new(SortedStream::new(stream, &options.sort));
        }
        if let Some(skip) = options.skip {
            stream = Box::new(stream.skip(skip));
        }
        if let Some(limit) = options.limit {
            stream = Box::new(stream.take(limit));
        }
        if let Some(projection) = &options.projection {
            stream = Box::new(ProjectedStream::new(stream, projection.clone()));
        }

        Ok(DocumentCursor::new(stream).with_plan(plan))
    }

    /// Counts the documents matching a predicate without building a cursor.
    pub(crate) fn count(&self, predicate: &Predicate) -> EngineResult<usize> {
        let plan = self.ctx.planner.plan(predicate, &self.ctx.indexes);
        let mut count = 0;
        for item in self.filtered_stream(&plan) {
            item?;
            count += 1;
        }
        Ok(count)
    }

    /// Collects the ids and current versions of all matching documents.
    ///
    /// Write operations call this under the collection write lock to pin
    /// the set of documents they act on.
    pub(crate) fn matched_entries(&self, predicate: &Predicate) -> Vec<(Value, Document)> {
        let plan = self.ctx.planner.plan(predicate, &self.ctx.indexes);
        let mut out = Vec::new();
        match &plan.scan {
            ScanStrategy::ById(id) => {
                if let Some(doc) = self.ctx.store.get(id) {
                    if plan.residual().matches(&doc) {
                        out.push((id.clone(), doc));
                    }
                }
            }
            ScanStrategy::Index {
                index_name,
                prefix,
                lower,
                upper,
            } => {
                for id in self.ctx.indexes.scan(index_name, prefix, lower, upper) {
                    if let Some(doc) = self.ctx.store.get(&id) {
                        if plan.residual().matches(&doc) {
                            out.push((id, doc));
                        }
                    }
                }
            }
            ScanStrategy::Full => {
                for (id, doc) in self.ctx.store.entries() {
                    if plan.residual().matches(&doc) {
                        out.push((id, doc));
                    }
                }
            }
        }
        out
    }

    /// A plan-backed stream over the documents matching `predicate`, with
    /// no sort, pagination, or projection applied.
    pub(crate) fn plan_stream(&self, predicate: &Predicate) -> DocumentStream {
        let plan = self.ctx.planner.plan(predicate, &self.ctx.indexes);
        self.filtered_stream(&plan)
    }

    // The narrowed scan with the residual predicate re-applied on top.
    fn filtered_stream(&self, plan: &QueryPlan) -> DocumentStream {
        let base: DocumentStream = match &plan.scan {
            ScanStrategy::ById(id) => match self.ctx.store.get(id) {
                Some(doc) => Box::new(std::iter::once(Ok(doc))),
                None => Box::new(std::iter::empty()),
            },
            ScanStrategy::Index {
                index_name,
                prefix,
                lower,
                upper,
            } => {
                let ids = self.ctx.indexes.scan(index_name, prefix, lower, upper);
                Box::new(IndexedStream::new(ids, Arc::clone(&self.ctx.store)))
            }
            ScanStrategy::Full => Box::new(self.ctx.store.entries().map(|(_, doc)| Ok(doc))),
        };
        Box::new(FilteredStream::new(base, plan.residual().clone()))
    }
}
