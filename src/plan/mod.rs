//! 规划层：计划数据模型、Planner、Replanner

pub mod planner;
pub mod replan;
pub mod step;

pub use planner::{gather_snapshot, make_plan, run_plan_phase};
pub use replan::{apply_replan, replan};
pub use step::{format_checklist, parse_steps, Step, StepStatus};
