//! Planning module.
//!
//! This module orders a resolved dependency graph into batches for apply
//! or teardown, and turns model diffs into change plans.

mod diff;
mod plan;
mod topo;

pub use diff::{ChangePlan, DiffEngine, DiffResult, DiffType, ResourceDiff};
pub use plan::{Batch, Plan, PlanDirection, PlannedResource};
pub use topo::{build_plan, plan, plan_teardown};
