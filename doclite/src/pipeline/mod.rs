//! Aggregation pipelines.
//!
//! A pipeline is a sequence of stage documents, each transforming the
//! stream produced by the previous one. Stages are parsed and validated up
//! front; execution is lazy where the stage allows it and materializes the
//! stream only for `$group` and `$sort`.

pub(crate) mod executor;
pub mod stage;

pub use stage::{
    Accumulator, AccumulatorOp, GroupExpr, GroupSpec, LookupSpec, PipelineStage, ProjectItem,
    ProjectSpec,
};
