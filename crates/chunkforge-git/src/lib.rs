//! Git repository context detection and the Change Planner (C4): computing
//! per-file index/delete actions between two commits, or the full file set
//! for a clean index.

pub mod context;
pub mod error;
pub mod planner;

pub use context::RepositoryContext;
pub use error::GitError;
pub use planner::{plan_full, plan_incremental, pull, ChangeAction, Plan, PlanSummary};
