use crate::collection::Document;
use crate::common::stream::{DocumentStream, FilteredStream, SortedStream};
use crate::common::{Value, DOC_ID};
use crate::errors::EngineResult;
use crate::pipeline::stage::{
    Accumulator, AccumulatorOp, GroupSpec, LookupSpec, PipelineStage,
};
use indexmap::IndexMap;
use std::sync::Arc;

/// Resolves the foreign collection of a `$lookup` stage to its documents.
pub(crate) trait LookupResolver {
    fn collection_documents(&self, name: &str) -> EngineResult<Vec<Document>>;
}

/// Chains the parsed stages over a source stream.
///
/// `$match`, `$project`, `$limit`, and `$skip` stay lazy; `$group` and
/// `$sort` materialize their input. `$lookup` fetches the foreign
/// collection once, up front, and joins lazily per document.
pub(crate) fn execute(
    source: DocumentStream,
    stages: Vec<PipelineStage>,
    resolver: &dyn LookupResolver,
) -> EngineResult<DocumentStream> {
    let mut stream = source;
    for stage in stages {
        stream = match stage {
            PipelineStage::Match(predicate) => {
                Box::new(FilteredStream::new(stream, predicate))
            }
            PipelineStage::Project(spec) => {
                let spec = Arc::new(spec);
                Box::new(stream.map(move |item| item.map(|doc| spec.apply(&doc))))
            }
            PipelineStage::Sort(keys) => Box::new(SortedStream::new(stream, &keys)),
            PipelineStage::Limit(n) => Box::new(stream.take(n)),
            PipelineStage::Skip(n) => Box::new(stream.skip(n)),
            PipelineStage::Group(spec) => run_group(stream, &spec)?,
            PipelineStage::Lookup(spec) => {
                let foreign = resolver.collection_documents(&spec.from)?;
                Box::new(stream.map(move |item| {
                    item.and_then(|mut doc| {
                        let joined = join_matches(&doc, &foreign, &spec);
                        doc.put(&spec.as_field, Value::Array(joined))?;
                        Ok(doc)
                    })
                }))
            }
        };
    }
    Ok(stream)
}

fn join_matches(doc: &Document, foreign: &[Document], spec: &LookupSpec) -> Vec<Value> {
    let local = doc.get(&spec.local_field);
    foreign
        .iter()
        .filter(|candidate| lookup_matches(&candidate.get(&spec.foreign_field), &local))
        .map(|candidate| Value::Document(candidate.clone()))
        .collect()
}

// Join equality honors array membership on either side, matching the
// equality semantics of predicates.
fn lookup_matches(foreign_value: &Value, local_value: &Value) -> bool {
    if foreign_value == local_value {
        return true;
    }
    match (foreign_value, local_value) {
        (Value::Array(elements), local) if !local.is_array() => elements.contains(local),
        (foreign, Value::Array(elements)) if !foreign.is_array() => elements.contains(foreign),
        _ => false,
    }
}

fn run_group(stream: DocumentStream, spec: &GroupSpec) -> EngineResult<DocumentStream> {
    // groups keep first-appearance order of their keys
    let mut groups: IndexMap<Value, Vec<AccumulatorState>> = IndexMap::new();

    for item in stream {
        let doc = item?;
        let key = spec.key.eval(&doc);
        let states = groups.entry(key).or_insert_with(|| {
            spec.accumulators
                .iter()
                .map(|(_, acc)| AccumulatorState::new(acc))
                .collect()
        });
        for ((_, acc), state) in spec.accumulators.iter().zip(states.iter_mut()) {
            state.observe(acc.expr.eval(&doc));
        }
    }

    let mut out: Vec<EngineResult<Document>> = Vec::with_capacity(groups.len());
    for (key, states) in groups {
        let mut doc = Document::new();
        doc.set_field(DOC_ID, key);
        for ((name, _), state) in spec.accumulators.iter().zip(states) {
            doc.set_field(name, state.finish());
        }
        out.push(Ok(doc));
    }
    Ok(Box::new(out.into_iter()))
}

enum AccumulatorState {
    Sum(Value),
    Avg { total: f64, count: u64 },
    Min(Option<Value>),
    Max(Option<Value>),
}

impl AccumulatorState {
    fn new(acc: &Accumulator) -> Self {
        match acc.op {
            AccumulatorOp::Sum => AccumulatorState::Sum(Value::I64(0)),
            AccumulatorOp::Avg => AccumulatorState::Avg {
                total: 0.0,
                count: 0,
            },
            AccumulatorOp::Min => AccumulatorState::Min(None),
            AccumulatorOp::Max => AccumulatorState::Max(None),
        }
    }

    // Non-numeric values are ignored by $sum and $avg; null and missing are
    // ignored by $min and $max.
    fn observe(&mut self, value: Value) {
        match self {
            AccumulatorState::Sum(total) => {
                *total = numeric_add(total, &value);
            }
            AccumulatorState::Avg { total, count } => {
                if let Some(n) = value.as_f64() {
                    *total += n;
                    *count += 1;
                }
            }
            AccumulatorState::Min(current) => {
                if !value.is_null() {
                    match current {
                        Some(min) if *min <= value => {}
                        _ => *current = Some(value),
                    }
                }
            }
            AccumulatorState::Max(current) => {
                if !value.is_null() {
                    match current {
                        Some(max) if *max >= value => {}
                        _ => *current = Some(value),
                    }
                }
            }
        }
    }

    fn finish(self) -> Value {
        match self {
            AccumulatorState::Sum(total) => total,
            AccumulatorState::Avg { total, count } => {
                if count == 0 {
                    Value::Null
                } else {
                    Value::F64(total / count as f64)
                }
            }
            AccumulatorState::Min(value) => value.unwrap_or(Value::Null),
            AccumulatorState::Max(value) => value.unwrap_or(Value::Null),
        }
    }
}

// Integer totals stay integers until a double is observed or the total
// overflows.
fn numeric_add(total: &Value, value: &Value) -> Value {
    match (total, value) {
        (Value::I64(a), Value::I64(b)) => match a.checked_add(*b) {
            Some(sum) => Value::I64(sum),
            None => Value::F64(*a as f64 + *b as f64),
        },
        (Value::I64(a), Value::F64(b)) => Value::F64(*a as f64 + b),
        (Value::F64(a), Value::I64(b)) => Value::F64(a + *b as f64),
        (Value::F64(a), Value::F64(b)) => Value::F64(a + b),
        _ => total.clone(),
    }
}
