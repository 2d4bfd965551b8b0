//! Query predicates and the rule-based query planner.

pub mod plan;
pub mod planner;
pub mod predicate;

pub use plan::QueryPlan;
pub use planner::QueryPlanner;
pub use predicate::Predicate;
