use crate::collection::operation::{OperationContext, ReadOperations};
use crate::collection::{DeleteResult, Document, InsertManyResult, UpdateOptions, UpdateResult};
use crate::common::{Value, DOC_ID};
use crate::errors::{EngineError, EngineResult, ErrorKind};
use crate::query::Predicate;
use crate::update::{selector_seed, UpdateSpec};

/// Executes inserts, updates, replaces, and deletes for a collection.
///
/// Every public method takes the collection write lock for its whole
/// duration, so matching, uniqueness checks, index maintenance, and the
/// store mutation of one call are never interleaved with another writer.
pub(crate) struct WriteOperations<'a> {
    ctx: &'a OperationContext,
}

impl<'a> WriteOperations<'a> {
    pub(crate) fn new(ctx: &'a OperationContext) -> Self {
        WriteOperations { ctx }
    }

    pub(crate) fn insert_one(&self, doc: Document) -> EngineResult<Value> {
        let _guard = self.ctx.lock.write();
        self.insert_locked(doc)
    }

    /// Inserts a batch best-effort: a failing document is skipped and the
    /// first failure is reported in the result.
    pub(crate) fn insert_many(&self, docs: Vec<Document>) -> InsertManyResult {
        let _guard = self.ctx.lock.write();
        let mut result = InsertManyResult::default();
        for doc in docs {
            match self.insert_locked(doc) {
                Ok(id) => result.inserted_ids.push(id),
                Err(e) => {
                    if result.first_error.is_none() {
                        result.first_error = Some(e);
                    }
                }
            }
        }
        result
    }

    pub(crate) fn update(
        &self,
        selector: &Predicate,
        update: &UpdateSpec,
        options: UpdateOptions,
        multi: bool,
    ) -> EngineResult<UpdateResult> {
        let _guard = self.ctx.lock.write();
        let mut matched = ReadOperations::new(self.ctx).matched_entries(selector);
        if !multi {
            matched.truncate(1);
        }

        let mut result = UpdateResult::default();
        if matched.is_empty() {
            if options.upsert {
                let mut seed = selector_seed(selector)?;
                update.apply(&mut seed)?;
                let id = self.insert_locked(seed)?;
                result.upserted_id = Some(id);
            }
            return Ok(result);
        }

        for (id, old) in matched {
            result.matched_count += 1;
            let mut new = old.clone();
            match update.apply(&mut new) {
                Ok(false) => {}
                Ok(true) => match self.ctx.indexes.on_replace(&id, &old, &new) {
                    Ok(()) => {
                        self.ctx.store.put(id, new);
                        result.modified_count += 1;
                    }
                    Err(e) => record_first(&mut result.first_error, e),
                },
                Err(e) => record_first(&mut result.first_error, e),
            }
        }
        Ok(result)
    }

    pub(crate) fn replace_one(
        &self,
        selector: &Predicate,
        replacement: Document,
        options: UpdateOptions,
    ) -> EngineResult<UpdateResult> {
        validate_replacement(&replacement)?;

        let _guard = self.ctx.lock.write();
        let mut matched = ReadOperations::new(self.ctx).matched_entries(selector);
        matched.truncate(1);

        let mut result = UpdateResult::default();
        let (id, old) = match matched.pop() {
            Some(entry) => entry,
            None => {
                if options.upsert {
                    let id = self.insert_locked(replacement)?;
                    result.upserted_id = Some(id);
                }
                return Ok(result);
            }
        };

        result.matched_count = 1;
        let mut new = replacement;
        match new.id() {
            Some(replacement_id) if *replacement_id != id => {
                log::error!(
                    "Replacement document carries a different id in collection {}",
                    self.ctx.name
                );
                return Err(EngineError::new(
                    "Replacement document carries a different id",
                    ErrorKind::IdentifierMismatch,
                ));
            }
            Some(_) => {}
            None => new.put(DOC_ID, id.clone())?,
        }

        if new == old {
            return Ok(result);
        }
        self.ctx.indexes.on_replace(&id, &old, &new)?;
        self.ctx.store.put(id, new);
        result.modified_count = 1;
        Ok(result)
    }

    pub(crate) fn delete(&self, selector: &Predicate, multi: bool) -> EngineResult<DeleteResult> {
        let _guard = self.ctx.lock.write();
        let mut matched = ReadOperations::new(self.ctx).matched_entries(selector);
        if !multi {
            matched.truncate(1);
        }

        let mut result = DeleteResult::default();
        for (id, doc) in matched {
            if self.ctx.store.remove(&id).is_some() {
                self.ctx.indexes.on_remove(&id, &doc);
                result.deleted_count += 1;
            }
        }
        Ok(result)
    }

    /// Removes all documents and indexes of the collection.
    pub(crate) fn drop_collection(&self) {
        let _guard = self.ctx.lock.write();
        self.ctx.store.clear();
        self.ctx.indexes.drop_all();
        self.ctx.planner.invalidate();
        log::debug!("Dropped collection {}", self.ctx.name);
    }

    fn insert_locked(&self, mut doc: Document) -> EngineResult<Value> {
        let id = doc.ensure_id()?;
        if self.ctx.store.contains_key(&id) {
            log::error!(
                "Document with id {} already exists in collection {}",
                id,
                self.ctx.name
            );
            return Err(EngineError::new(
                &format!("Document with id {} already exists", id),
                ErrorKind::DuplicateKey,
            ));
        }
        self.ctx.indexes.on_insert(&id, &doc)?;
        self.ctx.store.put(id.clone(), doc);
        Ok(id)
    }
}

fn record_first(slot: &mut Option<EngineError>, error: EngineError) {
    if slot.is_none() {
        *slot = Some(error);
    }
}

// A replacement is a plain document; operator keys indicate the caller
// meant an update instead.
fn validate_replacement(replacement: &Document) -> EngineResult<()> {
    for (key, _) in replacement.iter() {
        if key.starts_with('$') {
            log::error!("Replacement document cannot contain update operators");
            return Err(EngineError::new(
                "Replacement document cannot contain update operators",
                ErrorKind::InvalidUpdate,
            ));
        }
    }
    Ok(())
}
