use crate::collection::operation::{OperationContext, ReadOperations, WriteOperations};
use crate::collection::{
    DeleteResult, Document, FindOptions, InsertManyResult, UpdateOptions, UpdateResult,
};
use crate::common::stream::{DocumentCursor, DocumentStream};
use crate::common::{Fields, LockHandle, Value};
use crate::database::DatabaseInner;
use crate::errors::{EngineError, EngineResult, ErrorKind};
use crate::index::{IndexDescriptor, IndexManager};
use crate::pipeline::executor::{self, LookupResolver};
use crate::pipeline::PipelineStage;
use crate::query::{Predicate, QueryPlanner};
use crate::store::MemoryMap;
use crate::update::UpdateSpec;
use std::sync::{Arc, Weak};

/// A named collection of documents.
///
/// A collection stores schema-less documents keyed by their `_id`, supports
/// predicate queries with index-backed planning, partial updates, and
/// aggregation. Collections are cheap to clone; clones share the same
/// underlying state.
///
/// Reads are lock-free; writes serialize on a collection-level write lock.
/// A cursor obtained before a write observes documents as they stand when
/// the cursor reaches them.
///
/// # Examples
///
/// ```rust,ignore
/// use doclite::database::Database;
/// use doclite::doc;
///
/// let db = Database::new();
/// let people = db.collection("people")?;
///
/// people.insert_one(doc! { "name": "Alice", "age": 30 })?;
/// let adults = people.count_documents(&doc! { "age": { "$gte": 18 } })?;
/// ```
#[derive(Clone)]
pub struct Collection {
    inner: Arc<CollectionInner>,
}

pub(crate) struct CollectionInner {
    ctx: OperationContext,
    database: Weak<DatabaseInner>,
}

impl Collection {
    pub(crate) fn new(name: &str, database: Weak<DatabaseInner>, lock: LockHandle) -> Self {
        let ctx = OperationContext::new(
            name,
            Arc::new(MemoryMap::new(name)),
            Arc::new(IndexManager::new(name)),
            Arc::new(QueryPlanner::new()),
            lock,
        );
        Collection {
            inner: Arc::new(CollectionInner { ctx, database }),
        }
    }

    /// The name of this collection.
    pub fn name(&self) -> String {
        self.inner.ctx.name.clone()
    }

    /// The number of stored documents.
    pub fn size(&self) -> usize {
        self.inner.ctx.store.size()
    }

    /// Inserts a single document and returns its id.
    ///
    /// A document without an `_id` is assigned a generated one; a document
    /// with an `_id` keeps it.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateKey` if a document with the same id already exists
    /// or a unique index rejects the document.
    pub fn insert_one(&self, doc: Document) -> EngineResult<Value> {
        WriteOperations::new(&self.inner.ctx).insert_one(doc)
    }

    /// Inserts a batch of documents best-effort.
    ///
    /// Documents that fail, for instance against a unique index, are
    /// skipped; the first failure is reported in the returned result while
    /// the remaining documents are still inserted.
    pub fn insert_many(&self, docs: Vec<Document>) -> InsertManyResult {
        WriteOperations::new(&self.inner.ctx).insert_many(docs)
    }

    /// Finds all documents matching a predicate document.
    ///
    /// Sort, skip, limit, and projection are applied in that order via
    /// `options`. The returned cursor is lazy and replayable.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPredicate` if the predicate document is malformed.
    pub fn find(&self, predicate: &Document, options: FindOptions) -> EngineResult<DocumentCursor> {
        let predicate = Predicate::parse(predicate)?;
        ReadOperations::new(&self.inner.ctx).find(&predicate, &options)
    }

    /// Finds the first document matching a predicate document.
    pub fn find_one(&self, predicate: &Document) -> EngineResult<Option<Document>> {
        let mut cursor = self.find(predicate, FindOptions::new().limit(1))?;
        match cursor.next() {
            Some(item) => Ok(Some(item?)),
            None => Ok(None),
        }
    }

    /// Counts the documents matching a predicate document.
    pub fn count_documents(&self, predicate: &Document) -> EngineResult<usize> {
        let predicate = Predicate::parse(predicate)?;
        ReadOperations::new(&self.inner.ctx).count(&predicate)
    }

    /// Applies an update document to the first matching document.
    ///
    /// With upsert enabled and nothing matching, a document synthesized
    /// from the selector's equality constraints and the update is inserted.
    pub fn update_one(
        &self,
        selector: &Document,
        update: &Document,
        options: UpdateOptions,
    ) -> EngineResult<UpdateResult> {
        let selector = Predicate::parse(selector)?;
        let update = UpdateSpec::parse(update)?;
        WriteOperations::new(&self.inner.ctx).update(&selector, &update, options, false)
    }

    /// Applies an update document to every matching document.
    pub fn update_many(
        &self,
        selector: &Document,
        update: &Document,
        options: UpdateOptions,
    ) -> EngineResult<UpdateResult> {
        let selector = Predicate::parse(selector)?;
        let update = UpdateSpec::parse(update)?;
        WriteOperations::new(&self.inner.ctx).update(&selector, &update, options, true)
    }

    /// Replaces the first matching document wholesale.
    ///
    /// The stored `_id` carries over to the replacement. A replacement
    /// carrying a different `_id` fails with `IdentifierMismatch`.
    pub fn replace_one(
        &self,
        selector: &Document,
        replacement: Document,
        options: UpdateOptions,
    ) -> EngineResult<UpdateResult> {
        let selector = Predicate::parse(selector)?;
        WriteOperations::new(&self.inner.ctx).replace_one(&selector, replacement, options)
    }

    /// Deletes the first document matching the selector.
    pub fn delete_one(&self, selector: &Document) -> EngineResult<DeleteResult> {
        let selector = Predicate::parse(selector)?;
        WriteOperations::new(&self.inner.ctx).delete(&selector, false)
    }

    /// Deletes every document matching the selector.
    pub fn delete_many(&self, selector: &Document) -> EngineResult<DeleteResult> {
        let selector = Predicate::parse(selector)?;
        WriteOperations::new(&self.inner.ctx).delete(&selector, true)
    }

    /// Runs an aggregation pipeline over the collection.
    ///
    /// A leading `$match` stage is planned against the collection's indexes
    /// like a find; later stages stream over its output.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPipeline` for malformed stages before any document
    /// is processed, and `CollectionNotFound` when a `$lookup` names an
    /// unknown collection.
    pub fn aggregate(&self, stages: &[Document]) -> EngineResult<DocumentCursor> {
        let mut parsed = Vec::with_capacity(stages.len());
        for stage in stages {
            parsed.push(PipelineStage::parse(stage)?);
        }

        let read = ReadOperations::new(&self.inner.ctx);
        let mut stages = parsed.into_iter().peekable();
        let source: DocumentStream = if matches!(stages.peek(), Some(PipelineStage::Match(_))) {
            match stages.next() {
                Some(PipelineStage::Match(predicate)) => read.plan_stream(&predicate),
                _ => self.full_stream(),
            }
        } else {
            self.full_stream()
        };

        let stream = executor::execute(source, stages.collect(), &*self.inner)?;
        Ok(DocumentCursor::new(stream))
    }

    /// Creates an index over the given fields, populating it from the
    /// documents already stored.
    ///
    /// # Errors
    ///
    /// Returns `IndexConflict` if an index over the same fields exists, and
    /// `DuplicateKey` if a unique index cannot be built over the existing
    /// documents.
    pub fn create_index(&self, fields: Fields, unique: bool) -> EngineResult<IndexDescriptor> {
        let ctx = &self.inner.ctx;
        let _guard = ctx.lock.write();
        let descriptor = ctx.indexes.create_index(fields, unique, ctx.store.entries())?;
        ctx.planner.invalidate();
        Ok(descriptor)
    }

    /// Drops the index over the given fields.
    pub fn drop_index(&self, fields: &Fields) -> EngineResult<()> {
        let ctx = &self.inner.ctx;
        let _guard = ctx.lock.write();
        ctx.indexes.drop_index(fields)?;
        ctx.planner.invalidate();
        Ok(())
    }

    /// Lists the index descriptors of this collection in creation order.
    pub fn list_indexes(&self) -> Vec<IndexDescriptor> {
        self.inner.ctx.indexes.list_indexes()
    }

    /// Checks whether an index over the given fields exists.
    pub fn has_index(&self, fields: &Fields) -> bool {
        self.inner.ctx.indexes.has_index(fields)
    }

    /// Removes all documents and all indexes of this collection.
    ///
    /// The collection itself remains registered with its database and
    /// usable afterwards.
    pub fn drop(&self) {
        WriteOperations::new(&self.inner.ctx).drop_collection();
    }

    fn full_stream(&self) -> DocumentStream {
        Box::new(self.inner.ctx.store.entries().map(|(_, doc)| Ok(doc)))
    }
}

impl LookupResolver for CollectionInner {
    fn collection_documents(&self, name: &str) -> EngineResult<Vec<Document>> {
        let database = match self.database.upgrade() {
            Some(database) => database,
            None => {
                log::error!("$lookup requires the collection's database to be alive");
                return Err(EngineError::new(
                    "$lookup requires the collection's database to be alive",
                    ErrorKind::InvalidOperation,
                ));
            }
        };
        match database.get_collection(name) {
            Some(collection) => Ok(collection
                .inner
                .ctx
                .store
                .entries()
                .map(|(_, doc)| doc)
                .collect()),
            None => {
                log::error!("$lookup references unknown collection {}", name);
                Err(EngineError::new(
                    &format!("$lookup references unknown collection {}", name),
                    ErrorKind::CollectionNotFound,
                ))
            }
        }
    }
}
