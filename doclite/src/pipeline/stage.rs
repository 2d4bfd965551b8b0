use crate::collection::Document;
use crate::common::{SortOrder, Value, DOC_ID};
use crate::errors::{EngineError, EngineResult, ErrorKind};
use crate::query::Predicate;

/// A single parsed aggregation stage.
///
/// Each stage document holds exactly one operator key. Parsing validates
/// the whole pipeline before any document flows through it, so a malformed
/// stage fails with `InvalidPipeline` up front.
pub enum PipelineStage {
    Match(Predicate),
    Project(ProjectSpec),
    Group(GroupSpec),
    Sort(Vec<(String, SortOrder)>),
    Limit(usize),
    Skip(usize),
    Lookup(LookupSpec),
}

impl PipelineStage {
    pub fn parse(stage: &Document) -> EngineResult<PipelineStage> {
        if stage.len() != 1 {
            return Err(invalid_pipeline(
                "A pipeline stage must hold exactly one operator",
            ));
        }
        let (name, body) = match stage.iter().next() {
            Some(entry) => entry,
            None => return Err(invalid_pipeline("A pipeline stage cannot be empty")),
        };

        match name.as_str() {
            "$match" => Ok(PipelineStage::Match(Predicate::parse(stage_body(
                name, body,
            )?)?)),
            "$project" => Ok(PipelineStage::Project(ProjectSpec::parse(stage_body(
                name, body,
            )?)?)),
            "$group" => Ok(PipelineStage::Group(GroupSpec::parse(stage_body(
                name, body,
            )?)?)),
            "$sort" => Ok(PipelineStage::Sort(parse_sort(stage_body(name, body)?)?)),
            "$limit" => Ok(PipelineStage::Limit(parse_count(name, body)?)),
            "$skip" => Ok(PipelineStage::Skip(parse_count(name, body)?)),
            "$lookup" => Ok(PipelineStage::Lookup(LookupSpec::parse(stage_body(
                name, body,
            )?)?)),
            other => Err(invalid_pipeline(&format!(
                "Unknown pipeline stage {}",
                other
            ))),
        }
    }
}

/// An expression evaluated against each input document: a literal value or
/// a `"$path"` field reference.
#[derive(Clone, Debug, PartialEq)]
pub enum GroupExpr {
    Literal(Value),
    FieldRef(String),
}

impl GroupExpr {
    fn parse(value: &Value) -> GroupExpr {
        match value {
            Value::String(s) => match s.strip_prefix('$') {
                Some(path) => GroupExpr::FieldRef(path.to_string()),
                None => GroupExpr::Literal(value.clone()),
            },
            other => GroupExpr::Literal(other.clone()),
        }
    }

    pub(crate) fn eval(&self, doc: &Document) -> Value {
        match self {
            GroupExpr::Literal(value) => value.clone(),
            GroupExpr::FieldRef(path) => doc.get(path),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccumulatorOp {
    Sum,
    Avg,
    Min,
    Max,
}

/// One accumulator of a `$group` stage: the operator plus the expression it
/// folds over the group's documents.
#[derive(Clone, Debug)]
pub struct Accumulator {
    pub(crate) op: AccumulatorOp,
    pub(crate) expr: GroupExpr,
}

/// A parsed `$group` stage.
///
/// Output documents carry the group key under `_id` and one field per
/// accumulator, in declaration order. Groups appear in the order their key
/// was first seen in the input.
pub struct GroupSpec {
    pub(crate) key: GroupExpr,
    pub(crate) accumulators: Vec<(String, Accumulator)>,
}

impl GroupSpec {
    fn parse(body: &Document) -> EngineResult<GroupSpec> {
        if !body.contains_field(DOC_ID) {
            return Err(invalid_pipeline("$group requires an _id expression"));
        }

        let mut key = GroupExpr::Literal(Value::Null);
        let mut accumulators = Vec::new();
        for (name, value) in body.iter() {
            if name == DOC_ID {
                key = GroupExpr::parse(value);
                continue;
            }
            let spec = match value {
                Value::Document(spec) if spec.len() == 1 => spec,
                _ => {
                    return Err(invalid_pipeline(&format!(
                        "Accumulator {} must be a single-operator document",
                        name
                    )));
                }
            };
            let (op_name, operand) = match spec.iter().next() {
                Some(entry) => entry,
                None => return Err(invalid_pipeline("Accumulator cannot be empty")),
            };
            let op = match op_name.as_str() {
                "$sum" => AccumulatorOp::Sum,
                "$avg" => AccumulatorOp::Avg,
                "$min" => AccumulatorOp::Min,
                "$max" => AccumulatorOp::Max,
                other => {
                    return Err(invalid_pipeline(&format!(
                        "Unknown accumulator {}",
                        other
                    )));
                }
            };
            accumulators.push((
                name.clone(),
                Accumulator {
                    op,
                    expr: GroupExpr::parse(operand),
                },
            ));
        }
        Ok(GroupSpec { key, accumulators })
    }
}

/// A parsed `$project` stage.
///
/// Inclusion mode picks named fields and may add computed fields from
/// `"$path"` references; exclusion mode drops named fields. The two cannot
/// be mixed, except for turning `_id` off in inclusion mode.
pub enum ProjectSpec {
    Include {
        items: Vec<(String, ProjectItem)>,
        include_id: bool,
    },
    Exclude {
        fields: Vec<String>,
        include_id: bool,
    },
}

pub enum ProjectItem {
    Field,
    Computed(GroupExpr),
}

impl ProjectSpec {
    fn parse(body: &Document) -> EngineResult<ProjectSpec> {
        if body.is_empty() {
            return Err(invalid_pipeline("$project cannot be empty"));
        }

        let mut include_id = true;
        let mut included: Vec<(String, ProjectItem)> = Vec::new();
        let mut excluded: Vec<String> = Vec::new();

        for (name, value) in body.iter() {
            let item = match value {
                Value::I64(1) | Value::Bool(true) => Some(ProjectItem::Field),
                Value::I64(0) | Value::Bool(false) => None,
                Value::String(s) if s.starts_with('$') => {
                    Some(ProjectItem::Computed(GroupExpr::parse(value)))
                }
                other => {
                    return Err(invalid_pipeline(&format!(
                        "Invalid projection value {} for field {}",
                        other, name
                    )));
                }
            };

            if name == DOC_ID {
                include_id = item.is_some();
                continue;
            }
            match item {
                Some(item) => included.push((name.clone(), item)),
                None => excluded.push(name.clone()),
            }
        }

        if !included.is_empty() && !excluded.is_empty() {
            return Err(invalid_pipeline(
                "Cannot mix inclusion and exclusion in $project",
            ));
        }
        if included.is_empty() {
            Ok(ProjectSpec::Exclude {
                fields: excluded,
                include_id,
            })
        } else {
            Ok(ProjectSpec::Include {
                items: included,
                include_id,
            })
        }
    }

    pub(crate) fn apply(&self, doc: &Document) -> Document {
        match self {
            ProjectSpec::Include { items, include_id } => {
                let mut out = Document::new();
                if *include_id {
                    if let Some(id) = doc.id() {
                        out.set_field(DOC_ID, id.clone());
                    }
                }
                for (name, item) in items {
                    match item {
                        ProjectItem::Field => {
                            if doc.contains_field(name) {
                                out.set_field(name, doc.get(name));
                            }
                        }
                        ProjectItem::Computed(expr) => {
                            out.set_field(name, expr.eval(doc));
                        }
                    }
                }
                out
            }
            ProjectSpec::Exclude { fields, include_id } => {
                let mut out = doc.clone();
                for field in fields {
                    let _ = out.remove(field);
                }
                if !include_id {
                    let _ = out.remove(DOC_ID);
                }
                out
            }
        }
    }
}

/// A parsed `$lookup` stage: a left outer equality join against another
/// collection of the same database.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LookupSpec {
    pub(crate) from: String,
    pub(crate) local_field: String,
    pub(crate) foreign_field: String,
    pub(crate) as_field: String,
}

impl LookupSpec {
    fn parse(body: &Document) -> EngineResult<LookupSpec> {
        let spec = LookupSpec {
            from: lookup_field(body, "from")?,
            local_field: lookup_field(body, "localField")?,
            foreign_field: lookup_field(body, "foreignField")?,
            as_field: lookup_field(body, "as")?,
        };
        Ok(spec)
    }
}

fn lookup_field(body: &Document, name: &str) -> EngineResult<String> {
    match body.get(name) {
        Value::String(s) if !s.is_empty() => Ok(s),
        _ => Err(invalid_pipeline(&format!(
            "$lookup requires a non-empty string for {}",
            name
        ))),
    }
}

fn parse_sort(body: &Document) -> EngineResult<Vec<(String, SortOrder)>> {
    if body.is_empty() {
        return Err(invalid_pipeline("$sort cannot be empty"));
    }
    let mut keys = Vec::with_capacity(body.len());
    for (field, value) in body.iter() {
        let order = match value {
            Value::I64(1) => SortOrder::Ascending,
            Value::I64(-1) => SortOrder::Descending,
            _ => {
                return Err(invalid_pipeline(&format!(
                    "$sort direction for {} must be 1 or -1",
                    field
                )));
            }
        };
        keys.push((field.clone(), order));
    }
    Ok(keys)
}

fn parse_count(name: &str, value: &Value) -> EngineResult<usize> {
    match value {
        Value::I64(n) if *n >= 0 => Ok(*n as usize),
        _ => Err(invalid_pipeline(&format!(
            "{} requires a non-negative integer",
            name
        ))),
    }
}

fn stage_body<'a>(name: &str, value: &'a Value) -> EngineResult<&'a Document> {
    match value {
        Value::Document(body) => Ok(body),
        _ => Err(invalid_pipeline(&format!(
            "{} requires a document operand",
            name
        ))),
    }
}

fn invalid_pipeline(message: &str) -> EngineError {
    log::error!("{}", message);
    EngineError::new(message, ErrorKind::InvalidPipeline)
}
