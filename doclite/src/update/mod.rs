//! Update documents and their application.
//!
//! An update document is parsed once into an [`UpdateSpec`] and then applied
//! to each matched document. Parsing validates every operator and operand,
//! so a malformed update fails with `InvalidUpdate` before any document is
//! touched. Application itself can still fail per document, for example
//! when `$push` targets a non-array field; such failures leave the document
//! unchanged and are reported through the write result.

use crate::collection::Document;
use crate::common::{Value, DOC_ID};
use crate::errors::{EngineError, EngineResult, ErrorKind};
use crate::query::Predicate;

/// Operand of `$push`: a single value or an `$each` batch.
#[derive(Clone, Debug)]
pub enum PushSpec {
    One(Value),
    Each(Vec<Value>),
}

/// Operand of `$pull`: literal equality or an element condition.
#[derive(Clone, Debug)]
pub enum PullSpec {
    Equals(Value),
    Matches(Predicate),
}

/// A parsed update document.
///
/// Operators apply in a fixed order regardless of their order in the update
/// document: `$set`, then `$inc`, `$unset`, `$push`, `$pull`.
#[derive(Clone, Debug, Default)]
pub struct UpdateSpec {
    set: Vec<(String, Value)>,
    inc: Vec<(String, Value)>,
    unset: Vec<String>,
    push: Vec<(String, PushSpec)>,
    pull: Vec<(String, PullSpec)>,
}

impl UpdateSpec {
    /// Parses an update document.
    ///
    /// # Errors
    ///
    /// Returns `InvalidUpdate` for unknown operators, empty operator
    /// documents, non-numeric `$inc` operands, attempts to touch `_id`, or
    /// top-level keys that are not operators.
    pub fn parse(spec: &Document) -> EngineResult<UpdateSpec> {
        if spec.is_empty() {
            return Err(invalid_update("Update document cannot be empty"));
        }

        let mut update = UpdateSpec::default();
        for (key, operand) in spec.iter() {
            let body = operator_body(key, operand)?;
            match key.as_str() {
                "$set" => {
                    for (field, value) in body.iter() {
                        reject_id_path(field)?;
                        update.set.push((field.clone(), value.clone()));
                    }
                }
                "$inc" => {
                    for (field, value) in body.iter() {
                        reject_id_path(field)?;
                        if !value.is_number() {
                            return Err(invalid_update(&format!(
                                "$inc operand for {} must be numeric",
                                field
                            )));
                        }
                        update.inc.push((field.clone(), value.clone()));
                    }
                }
                "$unset" => {
                    for (field, _) in body.iter() {
                        reject_id_path(field)?;
                        update.unset.push(field.clone());
                    }
                }
                "$push" => {
                    for (field, value) in body.iter() {
                        reject_id_path(field)?;
                        update.push.push((field.clone(), parse_push(field, value)?));
                    }
                }
                "$pull" => {
                    for (field, value) in body.iter() {
                        reject_id_path(field)?;
                        update.pull.push((field.clone(), parse_pull(value)?));
                    }
                }
                other => {
                    return Err(invalid_update(&format!(
                        "Unknown update operator {}",
                        other
                    )));
                }
            }
        }
        Ok(update)
    }

    /// Applies this update to `doc` in place.
    ///
    /// Returns `true` if the document changed. A failing operator leaves
    /// the document as the caller passed it only if the caller applies the
    /// update to a scratch copy, which the write path does.
    pub fn apply(&self, doc: &mut Document) -> EngineResult<bool> {
        let mut modified = false;

        for (field, value) in &self.set {
            if !doc.contains_field(field) || doc.get(field) != *value {
                doc.put(field, value.clone())?;
                modified = true;
            }
        }

        for (field, amount) in &self.inc {
            let current = doc.get(field);
            let next = add_numbers(field, &current, amount)?;
            if current != next || !doc.contains_field(field) {
                doc.put(field, next)?;
                modified = true;
            }
        }

        for field in &self.unset {
            if doc.contains_field(field) {
                doc.remove(field)?;
                modified = true;
            }
        }

        for (field, push) in &self.push {
            let values: &[Value] = match push {
                PushSpec::One(value) => std::slice::from_ref(value),
                PushSpec::Each(values) => values,
            };
            if !doc.contains_field(field) {
                doc.put(field, Value::Array(values.to_vec()))?;
                modified = true;
                continue;
            }
            match doc.get(field) {
                Value::Array(mut elements) => {
                    if !values.is_empty() {
                        elements.extend(values.iter().cloned());
                        doc.put(field, Value::Array(elements))?;
                        modified = true;
                    }
                }
                _ => {
                    log::error!("$push target {} is not an array", field);
                    return Err(EngineError::new(
                        &format!("$push target {} is not an array", field),
                        ErrorKind::TypeMismatch,
                    ));
                }
            }
        }

        for (field, pull) in &self.pull {
            if !doc.contains_field(field) {
                continue;
            }
            match doc.get(field) {
                Value::Array(elements) => {
                    let retained: Vec<Value> = elements
                        .iter()
                        .filter(|e| !pull_matches(pull, e))
                        .cloned()
                        .collect();
                    if retained.len() != elements.len() {
                        doc.put(field, Value::Array(retained))?;
                        modified = true;
                    }
                }
                _ => {
                    log::error!("$pull target {} is not an array", field);
                    return Err(EngineError::new(
                        &format!("$pull target {} is not an array", field),
                        ErrorKind::TypeMismatch,
                    ));
                }
            }
        }

        Ok(modified)
    }
}

fn pull_matches(pull: &PullSpec, element: &Value) -> bool {
    match pull {
        PullSpec::Equals(value) => element == value,
        PullSpec::Matches(predicate) => predicate.matches_value(element),
    }
}

fn parse_push(field: &str, operand: &Value) -> EngineResult<PushSpec> {
    if let Value::Document(body) = operand {
        if body.contains_field("$each") {
            if body.len() != 1 {
                return Err(invalid_update(&format!(
                    "$push for {} cannot combine $each with other keys",
                    field
                )));
            }
            return match body.get("$each") {
                Value::Array(values) => Ok(PushSpec::Each(values)),
                _ => Err(invalid_update("$each requires an array operand")),
            };
        }
    }
    Ok(PushSpec::One(operand.clone()))
}

fn parse_pull(operand: &Value) -> EngineResult<PullSpec> {
    match operand {
        Value::Document(body) if !body.is_empty() => {
            Ok(PullSpec::Matches(Predicate::parse_element(body)?))
        }
        other => Ok(PullSpec::Equals(other.clone())),
    }
}

// Integer increments stay integers as long as they fit; an overflowing or
// mixed-type increment widens to a double.
fn add_numbers(field: &str, current: &Value, amount: &Value) -> EngineResult<Value> {
    let current = match current {
        Value::Null => &Value::I64(0),
        other => other,
    };
    match (current, amount) {
        (Value::I64(a), Value::I64(b)) => Ok(match a.checked_add(*b) {
            Some(sum) => Value::I64(sum),
            None => Value::F64(*a as f64 + *b as f64),
        }),
        (a, b) if a.is_number() && b.is_number() => {
            let a = a.as_f64().unwrap_or(0.0);
            let b = b.as_f64().unwrap_or(0.0);
            Ok(Value::F64(a + b))
        }
        _ => {
            log::error!("$inc target {} is not numeric", field);
            Err(EngineError::new(
                &format!("$inc target {} is not numeric", field),
                ErrorKind::TypeMismatch,
            ))
        }
    }
}

fn operator_body<'a>(key: &str, operand: &'a Value) -> EngineResult<&'a Document> {
    match operand {
        Value::Document(body) if !body.is_empty() => Ok(body),
        Value::Document(_) => Err(invalid_update(&format!("{} cannot be empty", key))),
        _ => Err(invalid_update(&format!("{} requires a document operand", key))),
    }
}

fn reject_id_path(field: &str) -> EngineResult<()> {
    if field == DOC_ID || field.starts_with("_id.") {
        return Err(invalid_update("The _id field cannot be updated"));
    }
    Ok(())
}

fn invalid_update(message: &str) -> EngineError {
    log::error!("{}", message);
    EngineError::new(message, ErrorKind::InvalidUpdate)
}

/// Builds the starting document of an upsert from the selector's equality
/// constraints. Range and other constraints contribute nothing.
pub(crate) fn selector_seed(selector: &Predicate) -> EngineResult<Document> {
    let mut seed = Document::new();
    for conjunct in selector.conjuncts() {
        if let Predicate::Eq(path, value) = conjunct {
            if !path.starts_with('$') {
                seed.put(path, value.clone())?;
            }
        }
    }
    Ok(seed)
}
