use crate::common::Value;
use crate::query::Predicate;
use std::ops::Bound;

/// How the documents feeding a query are located.
#[derive(Clone, Debug)]
pub enum ScanStrategy {
    /// Direct lookup of a single document by its id.
    ById(Value),
    /// An index scan over an equality prefix, optionally bounded by a range
    /// on the key component after the prefix.
    Index {
        index_name: String,
        prefix: Vec<Value>,
        lower: Bound<Value>,
        upper: Bound<Value>,
    },
    /// A full scan over the collection's storage map.
    Full,
}

/// An executable plan for one query.
///
/// The scan narrows the candidate set; the residual predicate is the full
/// original predicate and is re-applied to every candidate. Re-checking is
/// required for correctness, not just for uncovered conjuncts: a multikey
/// index matches per array element, so an index scan can admit documents
/// the predicate as a whole rejects.
#[derive(Clone, Debug)]
pub struct QueryPlan {
    pub(crate) scan: ScanStrategy,
    pub(crate) residual: Predicate,
}

impl QueryPlan {
    /// The name of the index this plan scans, if any.
    pub fn index_name(&self) -> Option<&str> {
        match &self.scan {
            ScanStrategy::Index { index_name, .. } => Some(index_name),
            _ => None,
        }
    }

    /// Whether the plan resolves a single document by id.
    pub fn is_id_lookup(&self) -> bool {
        matches!(self.scan, ScanStrategy::ById(_))
    }

    /// Whether the plan falls back to a full collection scan.
    pub fn is_collection_scan(&self) -> bool {
        matches!(self.scan, ScanStrategy::Full)
    }

    /// The predicate re-applied to every candidate document.
    pub fn residual(&self) -> &Predicate {
        &self.residual
    }
}
