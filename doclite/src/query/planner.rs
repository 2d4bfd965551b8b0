use crate::common::{Value, DOC_ID};
use crate::index::IndexManager;
use crate::query::plan::{QueryPlan, ScanStrategy};
use crate::query::Predicate;
use dashmap::DashMap;
use std::collections::HashMap;
use std::ops::Bound;
use std::sync::Arc;

/// The rule-based query planner of a collection.
///
/// Planning decomposes the predicate into top-level conjuncts, then picks
/// the index that covers the longest equality prefix of its fields, plus at
/// most one range conjunct on the next field. When two indexes cover a
/// predicate equally well, the one created first wins. Everything the scan
/// cannot express stays in the residual, which re-checks every candidate.
///
/// Plans are cached per predicate shape; the cache is invalidated whenever
/// the collection's indexes change.
pub struct QueryPlanner {
    cache: DashMap<String, Arc<QueryPlan>>,
}

impl QueryPlanner {
    pub fn new() -> Self {
        QueryPlanner {
            cache: DashMap::new(),
        }
    }

    /// Plans the execution of `predicate` against the current indexes.
    pub fn plan(&self, predicate: &Predicate, manager: &IndexManager) -> Arc<QueryPlan> {
        let cache_key = format!("{:?}", predicate);
        if let Some(plan) = self.cache.get(&cache_key) {
            return Arc::clone(&plan);
        }

        let plan = Arc::new(self.build_plan(predicate, manager));
        self.cache.insert(cache_key, Arc::clone(&plan));
        plan
    }

    /// Drops all cached plans. Called when an index is created or dropped.
    pub fn invalidate(&self) {
        self.cache.clear();
    }

    fn build_plan(&self, predicate: &Predicate, manager: &IndexManager) -> QueryPlan {
        let conjuncts = predicate.conjuncts();

        // id equality short-circuits all index selection
        for conjunct in &conjuncts {
            if let Predicate::Eq(path, value) = conjunct {
                if path == DOC_ID && !value.is_array() {
                    return QueryPlan {
                        scan: ScanStrategy::ById(value.clone()),
                        residual: predicate.clone(),
                    };
                }
            }
        }

        let mut eq_by_path: HashMap<&str, &Value> = HashMap::new();
        let mut lower_by_path: HashMap<&str, Bound<Value>> = HashMap::new();
        let mut upper_by_path: HashMap<&str, Bound<Value>> = HashMap::new();

        for conjunct in &conjuncts {
            match conjunct {
                // whole-array equality cannot use a multikey index, which
                // stores elements rather than arrays
                Predicate::Eq(path, value) if !value.is_array() => {
                    eq_by_path.entry(path.as_str()).or_insert(value);
                }
                Predicate::Gt(path, value) if indexable_bound(value) => {
                    lower_by_path
                        .entry(path.as_str())
                        .or_insert_with(|| Bound::Excluded(value.clone()));
                }
                Predicate::Gte(path, value) if indexable_bound(value) => {
                    lower_by_path
                        .entry(path.as_str())
                        .or_insert_with(|| Bound::Included(value.clone()));
                }
                Predicate::Lt(path, value) if indexable_bound(value) => {
                    upper_by_path
                        .entry(path.as_str())
                        .or_insert_with(|| Bound::Excluded(value.clone()));
                }
                Predicate::Lte(path, value) if indexable_bound(value) => {
                    upper_by_path
                        .entry(path.as_str())
                        .or_insert_with(|| Bound::Included(value.clone()));
                }
                _ => {}
            }
        }

        let mut best: Option<(usize, bool, ScanStrategy)> = None;
        for descriptor in manager.list_indexes() {
            let field_names = descriptor.index_fields().field_names();

            let mut prefix: Vec<Value> = Vec::new();
            for name in field_names {
                match eq_by_path.get(name.as_str()) {
                    Some(value) => prefix.push((*value).clone()),
                    None => break,
                }
            }

            let range_field = field_names.get(prefix.len()).and_then(|name| {
                let lower = lower_by_path.get(name.as_str());
                let upper = upper_by_path.get(name.as_str());
                if lower.is_none() && upper.is_none() {
                    None
                } else {
                    Some((
                        lower.cloned().unwrap_or(Bound::Unbounded),
                        upper.cloned().unwrap_or(Bound::Unbounded),
                    ))
                }
            });

            let eq_count = prefix.len();
            let has_range = range_field.is_some();
            if eq_count == 0 && !has_range {
                continue;
            }

            // strict comparison keeps the earliest-created index on ties
            let better = match &best {
                None => true,
                Some((best_eq, best_range, _)) => {
                    (eq_count, has_range) > (*best_eq, *best_range)
                }
            };
            if better {
                let (lower, upper) = range_field.unwrap_or((Bound::Unbounded, Bound::Unbounded));
                best = Some((
                    eq_count,
                    has_range,
                    ScanStrategy::Index {
                        index_name: descriptor.index_name().to_string(),
                        prefix,
                        lower,
                        upper,
                    },
                ));
            }
        }

        let scan = match best {
            Some((_, _, scan)) => scan,
            None => ScanStrategy::Full,
        };
        QueryPlan {
            scan,
            residual: predicate.clone(),
        }
    }
}

impl Default for QueryPlanner {
    fn default() -> Self {
        QueryPlanner::new()
    }
}

fn indexable_bound(value: &Value) -> bool {
    !value.is_array() && !value.is_document() && !value.is_null()
}
