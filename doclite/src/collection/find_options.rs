use crate::collection::Document;
use crate::common::{SortOrder, Value, DOC_ID};
use crate::errors::{EngineError, EngineResult, ErrorKind};

/// Options applied to a `find` operation: projection, sort, skip, and limit.
///
/// Sort is applied before skip, and skip before limit, regardless of the
/// order in which the options were set.
///
/// # Examples
///
/// ```rust,ignore
/// use doclite::collection::{order_by, FindOptions};
/// use doclite::common::SortOrder;
///
/// let options = order_by("age", SortOrder::Descending).skip(10).limit(5);
/// let cursor = collection.find(&predicate, options)?;
/// ```
#[derive(Clone, Default)]
pub struct FindOptions {
    pub(crate) projection: Option<Projection>,
    pub(crate) sort: Vec<(String, SortOrder)>,
    pub(crate) skip: Option<usize>,
    pub(crate) limit: Option<usize>,
}

impl FindOptions {
    pub fn new() -> Self {
        FindOptions::default()
    }

    /// Sets the projection from a projection document.
    ///
    /// # Errors
    ///
    /// Propagates `ValidationError` for a malformed projection document.
    pub fn with_projection(mut self, projection: &Document) -> EngineResult<Self> {
        self.projection = Some(Projection::parse(projection)?);
        Ok(self)
    }

    /// Adds a sort key. Multiple calls build a multi-key sort; earlier keys
    /// take precedence.
    pub fn sort_by(mut self, field: &str, order: SortOrder) -> Self {
        self.sort.push((field.to_string(), order));
        self
    }

    /// Skips the first `n` documents of the result.
    pub fn skip(mut self, n: usize) -> Self {
        self.skip = Some(n);
        self
    }

    /// Limits the result to at most `n` documents.
    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }
}

/// Creates a `FindOptions` sorted by a single field.
pub fn order_by(field: &str, order: SortOrder) -> FindOptions {
    FindOptions::new().sort_by(field, order)
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum ProjectionMode {
    Include,
    Exclude,
}

/// A parsed projection specification.
///
/// A projection document either includes fields (`{"a": 1}`) or excludes
/// them (`{"a": 0}`); mixing the two is rejected. The `_id` field is
/// special: it defaults to included and may be toggled independently of the
/// mode (`{"a": 1, "_id": 0}`).
#[derive(Clone)]
pub struct Projection {
    mode: ProjectionMode,
    fields: Vec<String>,
    include_id: bool,
}

impl Projection {
    /// Parses a projection document.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if inclusion and exclusion are mixed, a
    /// value is not `0`, `1`, `true`, or `false`, or the document is empty.
    pub fn parse(spec: &Document) -> EngineResult<Projection> {
        let mut mode: Option<ProjectionMode> = None;
        let mut fields = Vec::new();
        let mut include_id = true;

        for (key, value) in spec.iter() {
            let include = match value {
                Value::I64(1) => true,
                Value::I64(0) => false,
                Value::Bool(b) => *b,
                other => {
                    log::error!("Invalid projection value {} for field {}", other, key);
                    return Err(EngineError::new(
                        &format!("Invalid projection value {} for field {}", other, key),
                        ErrorKind::ValidationError,
                    ));
                }
            };

            if key == DOC_ID {
                include_id = include;
                continue;
            }

            let field_mode = if include {
                ProjectionMode::Include
            } else {
                ProjectionMode::Exclude
            };
            match mode {
                None => mode = Some(field_mode),
                Some(m) if m != field_mode => {
                    log::error!("Cannot mix inclusion and exclusion in a projection");
                    return Err(EngineError::new(
                        "Cannot mix inclusion and exclusion in a projection",
                        ErrorKind::ValidationError,
                    ));
                }
                Some(_) => {}
            }
            fields.push(key.clone());
        }

        let mode = match mode {
            Some(mode) => mode,
            // an _id-only projection is an exclusion of nothing
            None if !spec.is_empty() => ProjectionMode::Exclude,
            None => {
                log::error!("Projection document cannot be empty");
                return Err(EngineError::new(
                    "Projection document cannot be empty",
                    ErrorKind::ValidationError,
                ));
            }
        };

        Ok(Projection {
            mode,
            fields,
            include_id,
        })
    }

    /// Applies this projection to a document, returning the projected copy.
    pub fn apply(&self, doc: &Document) -> Document {
        match self.mode {
            ProjectionMode::Include => {
                let mut out = Document::new();
                if self.include_id {
                    if let Some(id) = doc.id() {
                        // projected documents keep their identity by default
                        let _ = out.put(DOC_ID, id.clone());
                    }
                }
                for field in &self.fields {
                    let value = doc.get(field);
                    if !value.is_null() || doc.contains_field(field) {
                        let _ = out.put(field, value);
                    }
                }
                out
            }
            ProjectionMode::Exclude => {
                let mut out = doc.clone();
                for field in &self.fields {
                    let _ = out.remove(field);
                }
                if !self.include_id {
                    let _ = out.remove(DOC_ID);
                }
                out
            }
        }
    }
}
