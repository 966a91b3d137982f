//! Planning and execution.
//!
//! This module compares declarations with recorded state, produces an
//! ordered [`DeploymentPlan`], and applies it one action at a time.

mod diff;
mod executor;
mod plan;
mod refresh;

pub use diff::{DiffEngine, REASON_CHANGED, REASON_DRIFT, resolve_from_state, schema_for};
pub use executor::{ActionResult, ExecutionResult, PlanExecutor};
pub use plan::{ActionType, DeploymentPlan, PlannedAction};
pub use refresh::{RefreshReport, refresh_state};
