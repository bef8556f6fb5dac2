use tracing::info;

use crate::error::{AppError, AppResult};
use crate::models::adaptive::{AdaptiveRule, ProgressSnapshot};
use crate::models::constraints::ConstraintSettings;
use crate::models::schedule::{PlanningHorizon, ScheduleReport};
use crate::models::task::SchedulableTask;
use crate::services::{allocator, conflict_detector, preview_assembler, suggestion_generator};

/// Longest horizon a single run will accept, in days.
const MAX_HORIZON_DAYS: u32 = 366;

/// Pipeline facade: constraint validation → allocation → conflict detection
/// → suggestion generation → report assembly. Pure synchronous computation;
/// concurrent compilations need no coordination.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlannerService;

impl PlannerService {
    pub fn new() -> Self {
        Self
    }

    pub fn compile(
        &self,
        tasks: &[SchedulableTask],
        constraints: &ConstraintSettings,
        horizon: PlanningHorizon,
        adaptive_rules: &[AdaptiveRule],
        progress: &ProgressSnapshot,
    ) -> AppResult<ScheduleReport> {
        constraints.validate()?;
        if horizon.days == 0 {
            return Err(AppError::invalid_constraints("规划天数必须大于零"));
        }
        if horizon.days > MAX_HORIZON_DAYS {
            return Err(AppError::invalid_constraints(format!(
                "规划天数 {} 超过上限 {MAX_HORIZON_DAYS}",
                horizon.days
            )));
        }

        let outcome = allocator::allocate(tasks, constraints, horizon)?;
        let conflicts = conflict_detector::detect(&outcome.days, &outcome.unplaced, constraints);
        let suggestions = suggestion_generator::generate(&conflicts, adaptive_rules, progress);
        let report = preview_assembler::assemble(
            tasks.len(),
            outcome.days,
            outcome.unplaced,
            conflicts,
            suggestions,
        )?;

        info!(
            target: "app::planner",
            report_id = %report.id,
            total_tasks = report.total_tasks,
            total_minutes = report.total_minutes,
            conflicts = report.conflicts.len(),
            suggestions = report.suggestions.len(),
            "schedule compilation complete"
        );

        Ok(report)
    }
}
