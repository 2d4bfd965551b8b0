use crate::collection::Document;
use crate::common::Value;
use crate::errors::{EngineError, EngineResult, ErrorKind};
use smallvec::{smallvec, SmallVec};
use std::cmp::Ordering;

type ValueVec = SmallVec<[Value; 4]>;

/// A parsed query predicate.
///
/// Predicates are parsed once from a predicate document and then evaluated
/// any number of times. All validation happens at parse time: an unknown
/// operator or a malformed operand fails with `InvalidPredicate` before any
/// document is examined, and evaluation itself is infallible.
///
/// # Grammar
///
/// A predicate document maps field paths to constraints. A constraint is
/// either a literal value (implicit equality) or an operator document:
///
/// ```text
/// { "age": { "$gte": 18, "$lt": 65 }, "city": "Oslo" }
/// ```
///
/// Multiple fields and multiple operators combine as a conjunction. The
/// logical operators `$and`, `$or`, and `$nor` take arrays of predicate
/// documents; `$not` wraps a field's operator document. The empty document
/// `{}` matches every document.
///
/// # Array semantics
///
/// When a path resolves to an array, equality and ordering constraints match
/// if the whole array or any element satisfies them. `$size` inspects the
/// whole array only, and `$elemMatch` requires a single element to satisfy
/// all of its sub-constraints at once.
#[derive(Clone, Debug, PartialEq)]
pub enum Predicate {
    /// Matches every document.
    All,
    Eq(String, Value),
    Ne(String, Value),
    Gt(String, Value),
    Gte(String, Value),
    Lt(String, Value),
    Lte(String, Value),
    In(String, Vec<Value>),
    Nin(String, Vec<Value>),
    /// `$all`: the field must hold every listed value.
    AllOf(String, Vec<Value>),
    /// `$size`: the field must be an array of exactly this length.
    Size(String, usize),
    /// `$exists`: presence or absence of the field.
    Exists(String, bool),
    /// `$elemMatch`: one array element satisfies the sub-predicate.
    ElemMatch(String, Box<Predicate>),
    Not(Box<Predicate>),
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
    Nor(Vec<Predicate>),
}

/// Evaluation target: a whole document or a single array element.
enum Target<'a> {
    Doc(&'a Document),
    Item(&'a Value),
}

impl Target<'_> {
    fn candidates(&self, path: &str) -> ValueVec {
        match self {
            Target::Doc(doc) => doc.resolve_values(path),
            Target::Item(value) => {
                if path.is_empty() {
                    smallvec![(*value).clone()]
                } else if let Value::Document(doc) = value {
                    doc.resolve_values(path)
                } else {
                    ValueVec::new()
                }
            }
        }
    }
}

impl Predicate {
    /// Parses a predicate document into a `Predicate`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPredicate` for unknown operators, malformed operands,
    /// or logical operators without a non-empty array of sub-documents.
    pub fn parse(spec: &Document) -> EngineResult<Predicate> {
        if spec.is_empty() {
            return Ok(Predicate::All);
        }

        let mut clauses = Vec::new();
        for (key, value) in spec.iter() {
            if let Some(op) = key.strip_prefix('$') {
                clauses.push(Self::parse_logical(op, value)?);
            } else {
                clauses.push(Self::parse_field(key, value)?);
            }
        }

        if clauses.len() == 1 {
            Ok(clauses.into_iter().next().unwrap_or(Predicate::All))
        } else {
            Ok(Predicate::And(clauses))
        }
    }

    fn parse_logical(op: &str, value: &Value) -> EngineResult<Predicate> {
        match op {
            "and" | "or" | "nor" => {
                let array = match value {
                    Value::Array(arr) if !arr.is_empty() => arr,
                    _ => {
                        log::error!("${} requires a non-empty array of predicates", op);
                        return Err(EngineError::new(
                            &format!("${} requires a non-empty array of predicates", op),
                            ErrorKind::InvalidPredicate,
                        ));
                    }
                };
                let mut clauses = Vec::with_capacity(array.len());
                for item in array {
                    match item {
                        Value::Document(doc) => clauses.push(Predicate::parse(doc)?),
                        _ => {
                            log::error!("${} array elements must be predicate documents", op);
                            return Err(EngineError::new(
                                &format!("${} array elements must be predicate documents", op),
                                ErrorKind::InvalidPredicate,
                            ));
                        }
                    }
                }
                Ok(match op {
                    "and" => Predicate::And(clauses),
                    "or" => Predicate::Or(clauses),
                    _ => Predicate::Nor(clauses),
                })
            }
            "not" => {
                log::error!("$not must follow a field path");
                Err(EngineError::new(
                    "$not must follow a field path",
                    ErrorKind::InvalidPredicate,
                ))
            }
            _ => {
                log::error!("Unknown top-level operator ${}", op);
                Err(EngineError::new(
                    &format!("Unknown top-level operator ${}", op),
                    ErrorKind::InvalidPredicate,
                ))
            }
        }
    }

    fn parse_field(field: &str, value: &Value) -> EngineResult<Predicate> {
        if let Value::Document(spec) = value {
            let dollar_keys = spec.iter().filter(|(k, _)| k.starts_with('$')).count();
            if dollar_keys > 0 {
                if dollar_keys != spec.len() {
                    log::error!("Cannot mix operators and literal fields for {}", field);
                    return Err(EngineError::new(
                        &format!("Cannot mix operators and literal fields for {}", field),
                        ErrorKind::InvalidPredicate,
                    ));
                }
                return Self::parse_operator_doc(field, spec);
            }
        }
        // a literal value is an implicit equality constraint
        Ok(Predicate::Eq(field.to_string(), value.clone()))
    }

    fn parse_operator_doc(field: &str, spec: &Document) -> EngineResult<Predicate> {
        let mut clauses = Vec::new();
        for (key, operand) in spec.iter() {
            let op = key.strip_prefix('$').unwrap_or(key);
            let field = field.to_string();
            let clause = match op {
                "eq" => Predicate::Eq(field, operand.clone()),
                "ne" => Predicate::Ne(field, operand.clone()),
                "gt" => Predicate::Gt(field, operand.clone()),
                "gte" => Predicate::Gte(field, operand.clone()),
                "lt" => Predicate::Lt(field, operand.clone()),
                "lte" => Predicate::Lte(field, operand.clone()),
                "in" => Predicate::In(field, Self::operand_array(op, operand)?),
                "nin" => Predicate::Nin(field, Self::operand_array(op, operand)?),
                "all" => Predicate::AllOf(field, Self::operand_array(op, operand)?),
                "size" => match operand {
                    Value::I64(n) if *n >= 0 => Predicate::Size(field, *n as usize),
                    _ => {
                        log::error!("$size requires a non-negative integer");
                        return Err(EngineError::new(
                            "$size requires a non-negative integer",
                            ErrorKind::InvalidPredicate,
                        ));
                    }
                },
                "exists" => match operand {
                    Value::Bool(b) => Predicate::Exists(field, *b),
                    Value::I64(n) => Predicate::Exists(field, *n != 0),
                    _ => {
                        log::error!("$exists requires a boolean");
                        return Err(EngineError::new(
                            "$exists requires a boolean",
                            ErrorKind::InvalidPredicate,
                        ));
                    }
                },
                "elemMatch" => match operand {
                    Value::Document(sub) => {
                        Predicate::ElemMatch(field, Box::new(Self::parse_elem_match(sub)?))
                    }
                    _ => {
                        log::error!("$elemMatch requires a document");
                        return Err(EngineError::new(
                            "$elemMatch requires a document",
                            ErrorKind::InvalidPredicate,
                        ));
                    }
                },
                "not" => match operand {
                    Value::Document(sub) if !sub.is_empty() => {
                        Predicate::Not(Box::new(Self::parse_operator_doc(&field, sub)?))
                    }
                    _ => {
                        log::error!("$not requires an operator document");
                        return Err(EngineError::new(
                            "$not requires an operator document",
                            ErrorKind::InvalidPredicate,
                        ));
                    }
                },
                _ => {
                    log::error!("Unknown operator ${} for field {}", op, field);
                    return Err(EngineError::new(
                        &format!("Unknown operator ${} for field {}", op, field),
                        ErrorKind::InvalidPredicate,
                    ));
                }
            };
            clauses.push(clause);
        }

        if clauses.len() == 1 {
            Ok(clauses.into_iter().next().unwrap_or(Predicate::All))
        } else {
            Ok(Predicate::And(clauses))
        }
    }

    /// Parses a predicate evaluated against individual array elements, as
    /// `$elemMatch` and `$pull` conditions are.
    pub(crate) fn parse_element(spec: &Document) -> EngineResult<Predicate> {
        Self::parse_elem_match(spec)
    }

    // An $elemMatch body is either an operator document applied to the
    // element itself ({"$gt": 5}) or a full predicate over element fields
    // ({"stars": {"$gte": 4}}).
    fn parse_elem_match(spec: &Document) -> EngineResult<Predicate> {
        let all_operators = !spec.is_empty() && spec.iter().all(|(k, _)| k.starts_with('$'));
        if all_operators {
            Self::parse_operator_doc("", spec)
        } else {
            Self::parse(spec)
        }
    }

    /// Evaluates this predicate against a document.
    pub fn matches(&self, doc: &Document) -> bool {
        self.eval(&Target::Doc(doc))
    }

    /// Evaluates this predicate against a single value, as `$elemMatch`
    /// does for each array element.
    pub fn matches_value(&self, value: &Value) -> bool {
        self.eval(&Target::Item(value))
    }

    fn eval(&self, target: &Target) -> bool {
        match self {
            Predicate::All => true,
            Predicate::Eq(path, rhs) => eq_match(&target.candidates(path), rhs),
            Predicate::Ne(path, rhs) => !eq_match(&target.candidates(path), rhs),
            Predicate::Gt(path, rhs) => {
                range_match(&target.candidates(path), rhs, |o| o == Ordering::Greater)
            }
            Predicate::Gte(path, rhs) => {
                range_match(&target.candidates(path), rhs, |o| o != Ordering::Less)
            }
            Predicate::Lt(path, rhs) => {
                range_match(&target.candidates(path), rhs, |o| o == Ordering::Less)
            }
            Predicate::Lte(path, rhs) => {
                range_match(&target.candidates(path), rhs, |o| o != Ordering::Greater)
            }
            Predicate::In(path, values) => {
                let candidates = target.candidates(path);
                values.iter().any(|v| eq_match(&candidates, v))
            }
            Predicate::Nin(path, values) => {
                let candidates = target.candidates(path);
                !values.iter().any(|v| eq_match(&candidates, v))
            }
            Predicate::AllOf(path, values) => {
                let candidates = target.candidates(path);
                !values.is_empty() && values.iter().all(|v| eq_match(&candidates, v))
            }
            Predicate::Size(path, n) => target
                .candidates(path)
                .iter()
                .any(|c| matches!(c, Value::Array(arr) if arr.len() == *n)),
            Predicate::Exists(path, should_exist) => {
                !target.candidates(path).is_empty() == *should_exist
            }
            Predicate::ElemMatch(path, sub) => target.candidates(path).iter().any(|c| {
                matches!(c, Value::Array(arr) if arr.iter().any(|e| sub.matches_value(e)))
            }),
            Predicate::Not(sub) => !sub.eval(target),
            Predicate::And(clauses) => clauses.iter().all(|c| c.eval(target)),
            Predicate::Or(clauses) => clauses.iter().any(|c| c.eval(target)),
            Predicate::Nor(clauses) => !clauses.iter().any(|c| c.eval(target)),
        }
    }

    /// Flattens top-level conjunctions into a list of conjuncts.
    ///
    /// Non-conjunctive predicates yield themselves as a single conjunct.
    pub fn conjuncts(&self) -> Vec<&Predicate> {
        match self {
            Predicate::And(clauses) => clauses.iter().flat_map(|c| c.conjuncts()).collect(),
            other => vec![other],
        }
    }

    /// Checks whether this predicate matches every document.
    pub fn is_all(&self) -> bool {
        matches!(self, Predicate::All)
    }

    fn operand_array(op: &str, operand: &Value) -> EngineResult<Vec<Value>> {
        match operand {
            Value::Array(arr) => Ok(arr.clone()),
            _ => {
                log::error!("${} requires an array operand", op);
                Err(EngineError::new(
                    &format!("${} requires an array operand", op),
                    ErrorKind::InvalidPredicate,
                ))
            }
        }
    }
}

// Equality over resolved candidates: a missing field equals null, a whole
// array equals an array operand, and an array candidate also matches when
// one of its elements equals a scalar operand.
fn eq_match(candidates: &[Value], rhs: &Value) -> bool {
    if candidates.is_empty() {
        return rhs.is_null();
    }
    candidates.iter().any(|c| {
        if c == rhs {
            return true;
        }
        match c {
            Value::Array(arr) if !rhs.is_array() => arr.contains(rhs),
            _ => false,
        }
    })
}

// Ordering constraints only apply within the operand's comparison bracket;
// a numeric bound never matches a string field.
fn range_match(candidates: &[Value], rhs: &Value, accept: impl Fn(Ordering) -> bool) -> bool {
    let check = |v: &Value| v.bracket_cmp(rhs).is_some_and(&accept);
    candidates.iter().any(|c| match c {
        Value::Array(arr) if !rhs.is_array() => arr.iter().any(check),
        other => check(other),
    })
}
