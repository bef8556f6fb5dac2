use chrono::{Duration, NaiveDate};
use tracing::debug;

use crate::models::conflict::{Conflict, ConflictSeverity, ConflictType};
use crate::models::constraints::ConstraintSettings;
use crate::models::schedule::{weekday_number, DailyBreakdown};
use crate::models::task::{UnplacedReason, UnplacedTask};
use crate::services::schedule_utils::format_time;

/// Inspect an allocation for rule violations. Every rule is evaluated
/// independently; one day may raise several conflicts.
pub fn detect(
    days: &[DailyBreakdown],
    unplaced: &[UnplacedTask],
    constraints: &ConstraintSettings,
) -> Vec<Conflict> {
    let mut conflicts = Vec::new();

    for day in days {
        detect_overlaps(day, &mut conflicts);
        detect_overcount(day, unplaced, constraints, &mut conflicts);
        detect_overrun(day, unplaced, constraints, &mut conflicts);
        detect_weekend_violation(day, constraints, &mut conflicts);
        detect_school_time_violation(day, constraints, &mut conflicts);
    }

    // High severity first, stable within a tier so earlier days stay first.
    conflicts.sort_by(|a, b| b.severity.cmp(&a.severity));

    debug!(
        target: "app::conflicts",
        count = conflicts.len(),
        "conflict detection complete"
    );

    conflicts
}

/// Intersecting placements on one day. A correct allocator never produces
/// this; the check guards externally assembled breakdowns.
fn detect_overlaps(day: &DailyBreakdown, conflicts: &mut Vec<Conflict>) {
    for (index, first) in day.tasks.iter().enumerate() {
        for second in day.tasks.iter().skip(index + 1) {
            if first.overlaps(second) {
                conflicts.push(Conflict {
                    conflict_type: ConflictType::TimeOverlap,
                    severity: ConflictSeverity::High,
                    message: format!(
                        "{} 任务「{}」与「{}」时间重叠",
                        day.date, first.title, second.title
                    ),
                    suggested_fix: Some(format!(
                        "将任务「{}」移至当日空闲时段",
                        second.title
                    )),
                    date: Some(day.date),
                    related_task_id: Some(second.task_id.clone()),
                });
            }
        }
    }
}

/// Placed count plus day-full carryovers exceeding the per-day cap.
fn detect_overcount(
    day: &DailyBreakdown,
    unplaced: &[UnplacedTask],
    constraints: &ConstraintSettings,
    conflicts: &mut Vec<Conflict>,
) {
    let carryover = unplaced
        .iter()
        .filter(|entry| {
            entry.reason == UnplacedReason::DayFull && entry.attributed_date == Some(day.date)
        })
        .count();
    let demanded = day.tasks.len() + carryover;
    if demanded > constraints.max_tasks_per_day {
        let fix = next_allowed_date(day.date, constraints).map(|date| {
            format!("将多出的 {} 个任务移至 {}", demanded - constraints.max_tasks_per_day, date)
        });
        conflicts.push(Conflict {
            conflict_type: ConflictType::TooManyTasks,
            severity: ConflictSeverity::Medium,
            message: format!(
                "{} 需要安排 {} 个任务，超过每日上限 {} 个",
                day.date, demanded, constraints.max_tasks_per_day
            ),
            suggested_fix: fix,
            date: Some(day.date),
            related_task_id: None,
        });
    }
}

/// Placed minutes plus slot/budget carryovers exceeding the daily budget.
/// Escalates to high when the excess passes 50% of the budget.
fn detect_overrun(
    day: &DailyBreakdown,
    unplaced: &[UnplacedTask],
    constraints: &ConstraintSettings,
    conflicts: &mut Vec<Conflict>,
) {
    let carryover_minutes: i64 = unplaced
        .iter()
        .filter(|entry| {
            entry.attributed_date == Some(day.date)
                && matches!(
                    entry.reason,
                    UnplacedReason::DailyBudgetExceeded
                        | UnplacedReason::NoFreeSlot
                        | UnplacedReason::MealWindowBlocked
                )
        })
        .map(|entry| entry.task.estimated_minutes)
        .sum();
    let budget = constraints.daily_budget_minutes();
    let demand = day.total_minutes + carryover_minutes;
    if demand > budget {
        let excess = demand - budget;
        let severity = if excess * 2 > budget {
            ConflictSeverity::High
        } else {
            ConflictSeverity::Medium
        };
        conflicts.push(Conflict {
            conflict_type: ConflictType::InsufficientTime,
            severity,
            message: format!(
                "{} 需要学习 {} 分钟，超出每日预算 {} 分钟",
                day.date, demand, budget
            ),
            suggested_fix: next_allowed_date(day.date, constraints)
                .map(|date| format!("将部分任务移至 {}", date)),
            date: Some(day.date),
            related_task_id: None,
        });
    }
}

/// A placement on a disallowed weekday. Structurally impossible from the
/// allocator; defensive.
fn detect_weekend_violation(
    day: &DailyBreakdown,
    constraints: &ConstraintSettings,
    conflicts: &mut Vec<Conflict>,
) {
    if day.tasks.is_empty() || constraints.allowed_weekdays.contains(&weekday_number(day.date)) {
        return;
    }
    for placed in &day.tasks {
        conflicts.push(Conflict {
            conflict_type: ConflictType::WeekendViolation,
            severity: ConflictSeverity::High,
            message: format!(
                "{} 不在允许的学习日内，但安排了任务「{}」",
                day.date, placed.title
            ),
            suggested_fix: next_allowed_date(day.date, constraints)
                .map(|date| format!("将任务「{}」移至 {}", placed.title, date)),
            date: Some(day.date),
            related_task_id: Some(placed.task_id.clone()),
        });
    }
}

/// A task starting before school lets out on a school day.
fn detect_school_time_violation(
    day: &DailyBreakdown,
    constraints: &ConstraintSettings,
    conflicts: &mut Vec<Conflict>,
) {
    if day.is_weekend {
        return;
    }
    for placed in &day.tasks {
        if placed.start < constraints.school_end_time {
            conflicts.push(Conflict {
                conflict_type: ConflictType::SchoolTimeViolation,
                severity: ConflictSeverity::High,
                message: format!(
                    "任务「{}」在 {} {} 开始，早于放学时间 {}",
                    placed.title,
                    day.date,
                    format_time(placed.start),
                    format_time(constraints.school_end_time)
                ),
                suggested_fix: Some(format!(
                    "将任务「{}」移至 {} 之后的空闲时段",
                    placed.title,
                    format_time(constraints.school_end_time)
                )),
                date: Some(day.date),
                related_task_id: Some(placed.task_id.clone()),
            });
        }
    }
}

/// Next date after `from` whose weekday is allowed, searched within a week.
fn next_allowed_date(from: NaiveDate, constraints: &ConstraintSettings) -> Option<NaiveDate> {
    (1..=7).find_map(|offset| {
        let candidate = from.checked_add_signed(Duration::days(offset))?;
        constraints
            .allowed_weekdays
            .contains(&weekday_number(candidate))
            .then_some(candidate)
    })
}
