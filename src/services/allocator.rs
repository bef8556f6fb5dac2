use std::cmp::Ordering;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::AppResult;
use crate::models::constraints::{ConstraintSettings, TaskDistribution};
use crate::models::schedule::{
    is_weekend, weekday_number, DailyBreakdown, PlacedTask, PlanningHorizon,
};
use crate::models::task::{SchedulableTask, UnplacedReason, UnplacedTask};
use crate::services::schedule_utils::{self, MINUTES_PER_DAY};

/// Tasks shorter than this are stretched to a schedulable minimum.
const MIN_TASK_MINUTES: i64 = 15;

/// Result of one allocation pass: a breakdown for every horizon day (empty
/// for disallowed weekdays) plus the tasks no day could admit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AllocationOutcome {
    pub days: Vec<DailyBreakdown>,
    pub unplaced: Vec<UnplacedTask>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PlaceFailure {
    DayFull,
    BudgetExceeded,
    NoFreeSlot,
    MealBlocked,
}

impl PlaceFailure {
    fn reason(self) -> UnplacedReason {
        match self {
            PlaceFailure::DayFull => UnplacedReason::DayFull,
            PlaceFailure::BudgetExceeded => UnplacedReason::DailyBudgetExceeded,
            PlaceFailure::NoFreeSlot => UnplacedReason::NoFreeSlot,
            PlaceFailure::MealBlocked => UnplacedReason::MealWindowBlocked,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum SlotBias {
    Earliest,
    Latest,
    NearAnchor(i64),
}

struct DaySlate {
    date: NaiveDate,
    eligible: bool,
    has_fixed: bool,
    placed: Vec<PlacedTask>,
    total_minutes: i64,
}

impl DaySlate {
    fn new(date: NaiveDate, eligible: bool) -> Self {
        Self {
            date,
            eligible,
            has_fixed: false,
            placed: Vec::new(),
            total_minutes: 0,
        }
    }

    fn insert_sorted(&mut self, task: PlacedTask) {
        let pos = self
            .placed
            .partition_point(|existing| existing.start <= task.start);
        self.total_minutes += task.duration_minutes;
        self.placed.insert(pos, task);
    }
}

/// Assign every task a start/end time per day, respecting ordering, spacing
/// and capacity rules. Never mutates its inputs; identical inputs always
/// yield identical output.
pub fn allocate(
    tasks: &[SchedulableTask],
    constraints: &ConstraintSettings,
    horizon: PlanningHorizon,
) -> AppResult<AllocationOutcome> {
    constraints.validate()?;

    let window_start = schedule_utils::minutes_from_midnight(constraints.school_end_time);
    let window_end = schedule_utils::minutes_from_midnight(constraints.latest_study_time);
    let budget = constraints.daily_budget_minutes();
    let mut meals: Vec<(i64, i64)> = constraints
        .meal_windows
        .iter()
        .map(|meal| {
            (
                schedule_utils::minutes_from_midnight(meal.start),
                schedule_utils::minutes_from_midnight(meal.end),
            )
        })
        .collect();
    meals.sort_unstable();

    let mut slates: Vec<DaySlate> = horizon
        .dates()
        .map(|date| {
            let eligible = constraints.allowed_weekdays.contains(&weekday_number(date));
            DaySlate::new(date, eligible)
        })
        .collect();

    let mut unplaced = Vec::new();

    // Fixed tasks first: placed verbatim on their own day, bypassing the
    // placement window but never the no-overlap invariant.
    let mut fixed: Vec<&SchedulableTask> = tasks.iter().filter(|t| t.fixed_at.is_some()).collect();
    fixed.sort_by(|a, b| a.fixed_at.cmp(&b.fixed_at).then_with(|| a.id.cmp(&b.id)));
    for task in fixed {
        place_fixed(task, &mut slates, horizon, &mut unplaced)?;
    }

    // Free-floating tasks: priority first, larger first to avoid
    // fragmentation, id as the deterministic tie-break.
    let mut free: Vec<&SchedulableTask> = tasks.iter().filter(|t| t.fixed_at.is_none()).collect();
    free.sort_by(|a, b| {
        b.priority
            .rank()
            .cmp(&a.priority.rank())
            .then_with(|| b.estimated_minutes.cmp(&a.estimated_minutes))
            .then_with(|| a.id.cmp(&b.id))
    });

    let bias = match constraints.task_distribution {
        TaskDistribution::Concentrated => SlotBias::NearAnchor(
            schedule_utils::minutes_from_midnight(constraints.priority_task_time),
        ),
        TaskDistribution::Scattered => SlotBias::Earliest,
        TaskDistribution::Uniform => {
            if constraints.prefer_morning_study {
                SlotBias::Earliest
            } else {
                SlotBias::Latest
            }
        }
    };

    for task in free {
        let duration = task.estimated_minutes.max(MIN_TASK_MINUTES);
        let mut last_failure: Option<(PlaceFailure, NaiveDate)> = None;

        let mut placed = false;
        for slate in slates.iter_mut().filter(|slate| slate.eligible) {
            match try_place(
                slate,
                task,
                duration,
                constraints,
                bias,
                window_start,
                window_end,
                budget,
                &meals,
            ) {
                Ok(()) => {
                    placed = true;
                    break;
                }
                Err(failure) => {
                    debug!(
                        target: "app::allocator",
                        task_id = %task.id,
                        date = %slate.date,
                        failure = ?failure,
                        "placement failed, carrying over"
                    );
                    last_failure = Some((failure, slate.date));
                }
            }
        }

        if !placed {
            let (reason, attributed_date) = match last_failure {
                Some((failure, date)) => (failure.reason(), Some(date)),
                None => (UnplacedReason::OutsideHorizon, None),
            };
            unplaced.push(UnplacedTask {
                task: task.clone(),
                reason,
                attributed_date,
            });
        }
    }

    if constraints.task_distribution == TaskDistribution::Scattered {
        for slate in slates.iter_mut().filter(|slate| slate.eligible) {
            respace_evenly(slate, constraints, window_start, window_end, &meals)?;
        }
    }

    let days: Vec<DailyBreakdown> = slates
        .into_iter()
        .map(|slate| DailyBreakdown {
            date: slate.date,
            total_minutes: slate.total_minutes,
            is_weekend: is_weekend(slate.date),
            tasks: slate.placed,
        })
        .collect();

    info!(
        target: "app::allocator",
        total = tasks.len(),
        placed = tasks.len() - unplaced.len(),
        unplaced = unplaced.len(),
        strategy = constraints.task_distribution.as_str(),
        "allocation pass complete"
    );

    Ok(AllocationOutcome { days, unplaced })
}

fn place_fixed(
    task: &SchedulableTask,
    slates: &mut [DaySlate],
    horizon: PlanningHorizon,
    unplaced: &mut Vec<UnplacedTask>,
) -> AppResult<()> {
    let fixed_at = task.fixed_at.expect("caller filtered on fixed_at");
    let date = fixed_at.date();
    let duration = task.estimated_minutes.max(MIN_TASK_MINUTES);

    if !horizon.contains(date) {
        unplaced.push(UnplacedTask {
            task: task.clone(),
            reason: UnplacedReason::OutsideHorizon,
            attributed_date: None,
        });
        return Ok(());
    }

    let index = (date - horizon.start).num_days() as usize;
    let slate = &mut slates[index];
    if !slate.eligible {
        unplaced.push(UnplacedTask {
            task: task.clone(),
            reason: UnplacedReason::OutsideHorizon,
            attributed_date: Some(date),
        });
        return Ok(());
    }

    let start_minutes = schedule_utils::minutes_from_midnight(fixed_at.time());
    let end_minutes = start_minutes + duration;
    if end_minutes >= MINUTES_PER_DAY {
        unplaced.push(UnplacedTask {
            task: task.clone(),
            reason: UnplacedReason::NoFreeSlot,
            attributed_date: Some(date),
        });
        return Ok(());
    }

    let start = schedule_utils::to_naive_time(start_minutes)?;
    let end = schedule_utils::to_naive_time(end_minutes)?;
    let collides = slate
        .placed
        .iter()
        .any(|existing| schedule_utils::overlaps(start, end, existing.start, existing.end));
    if collides {
        unplaced.push(UnplacedTask {
            task: task.clone(),
            reason: UnplacedReason::NoFreeSlot,
            attributed_date: Some(date),
        });
        return Ok(());
    }

    slate.has_fixed = true;
    slate.insert_sorted(placed_task(task, start, end, duration));
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn try_place(
    slate: &mut DaySlate,
    task: &SchedulableTask,
    duration: i64,
    constraints: &ConstraintSettings,
    bias: SlotBias,
    window_start: i64,
    window_end: i64,
    budget: i64,
    meals: &[(i64, i64)],
) -> Result<(), PlaceFailure> {
    if slate.placed.len() >= constraints.max_tasks_per_day {
        return Err(PlaceFailure::DayFull);
    }
    if slate.total_minutes + duration > budget {
        return Err(PlaceFailure::BudgetExceeded);
    }

    let gaps = free_gaps(
        slate,
        window_start,
        window_end,
        constraints.task_interval_minutes,
    );
    let feasible: Vec<(i64, i64)> = gaps
        .into_iter()
        .filter(|(lo, hi)| hi - lo >= duration)
        .collect();
    if feasible.is_empty() {
        return Err(PlaceFailure::NoFreeSlot);
    }

    let active_meals = if constraints.avoid_meal_windows {
        meals
    } else {
        &[]
    };

    match select_start(&feasible, duration, bias, active_meals) {
        Some(start_minutes) => {
            let start = schedule_utils::to_naive_time(start_minutes)
                .expect("candidate start stays within the day");
            let end = schedule_utils::to_naive_time(start_minutes + duration)
                .expect("candidate end stays within the day");
            slate.insert_sorted(placed_task(task, start, end, duration));
            Ok(())
        }
        None => {
            // A slot exists but every candidate collides with a meal window.
            if select_start(&feasible, duration, bias, &[]).is_some() {
                Err(PlaceFailure::MealBlocked)
            } else {
                Err(PlaceFailure::NoFreeSlot)
            }
        }
    }
}

/// Free intervals within the window, with the task interval already carved
/// out around existing placements. Returned bounds are usable start/end.
fn free_gaps(slate: &DaySlate, window_start: i64, window_end: i64, interval: i64) -> Vec<(i64, i64)> {
    let mut gaps = Vec::new();
    let mut cursor = window_start;
    for placed in &slate.placed {
        let placed_start = schedule_utils::minutes_from_midnight(placed.start);
        let placed_end = schedule_utils::minutes_from_midnight(placed.end);
        let gap_end = (placed_start - interval).min(window_end);
        if gap_end > cursor {
            gaps.push((cursor, gap_end));
        }
        cursor = cursor.max(placed_end + interval);
    }
    if window_end > cursor {
        gaps.push((cursor, window_end));
    }
    gaps
}

fn select_start(
    gaps: &[(i64, i64)],
    duration: i64,
    bias: SlotBias,
    meals: &[(i64, i64)],
) -> Option<i64> {
    match bias {
        SlotBias::Earliest => gaps
            .iter()
            .find_map(|&(lo, hi)| earliest_start(lo, hi, duration, meals)),
        SlotBias::Latest => gaps
            .iter()
            .rev()
            .find_map(|&(lo, hi)| latest_start(lo, hi, duration, meals)),
        SlotBias::NearAnchor(anchor) => gaps
            .iter()
            .filter_map(|&(lo, hi)| anchored_start(lo, hi, duration, anchor, meals))
            .min_by(|a, b| {
                (a - anchor)
                    .abs()
                    .cmp(&(b - anchor).abs())
                    .then_with(|| a.cmp(b))
            }),
    }
}

fn earliest_start(lo: i64, hi: i64, duration: i64, meals: &[(i64, i64)]) -> Option<i64> {
    let mut start = lo;
    for &(meal_lo, meal_hi) in meals {
        if start + duration > hi {
            return None;
        }
        if start < meal_hi && meal_lo < start + duration {
            start = meal_hi;
        }
    }
    (start + duration <= hi).then_some(start)
}

fn latest_start(lo: i64, hi: i64, duration: i64, meals: &[(i64, i64)]) -> Option<i64> {
    let mut start = hi - duration;
    for &(meal_lo, meal_hi) in meals.iter().rev() {
        if start < lo {
            return None;
        }
        if start < meal_hi && meal_lo < start + duration {
            start = meal_lo - duration;
        }
    }
    (start >= lo).then_some(start)
}

/// Candidate closest to the anchor within one gap: try forward from the
/// ideal start and backward from it, keep whichever lands nearer.
fn anchored_start(
    lo: i64,
    hi: i64,
    duration: i64,
    anchor: i64,
    meals: &[(i64, i64)],
) -> Option<i64> {
    let ideal = anchor.clamp(lo, hi - duration);
    let forward = earliest_start(ideal, hi, duration, meals);
    let backward = latest_start(lo, (ideal + duration).min(hi), duration, meals);
    match (forward, backward) {
        (Some(f), Some(b)) => {
            let pick = match (f - anchor).abs().cmp(&(b - anchor).abs()) {
                Ordering::Less => f,
                Ordering::Greater => b,
                Ordering::Equal => f.min(b),
            };
            Some(pick)
        }
        (Some(f), None) => Some(f),
        (None, Some(b)) => Some(b),
        (None, None) => None,
    }
}

/// Scattered strategy: spread a day's placements across the whole window
/// using even spacing, widening the interval as needed. Days carrying fixed
/// placements keep their first-fit layout, as do days where re-spacing would
/// breach the window or a meal window.
fn respace_evenly(
    slate: &mut DaySlate,
    constraints: &ConstraintSettings,
    window_start: i64,
    window_end: i64,
    meals: &[(i64, i64)],
) -> AppResult<()> {
    if slate.has_fixed || slate.placed.len() < 2 {
        return Ok(());
    }

    let count = slate.placed.len() as i64;
    let slot_length = (window_end - window_start) / count;
    let active_meals = if constraints.avoid_meal_windows {
        meals
    } else {
        &[]
    };

    let mut respaced = Vec::with_capacity(slate.placed.len());
    let mut previous_end: Option<i64> = None;
    for (index, placed) in slate.placed.iter().enumerate() {
        let duration = placed.duration_minutes;
        let ideal = window_start + index as i64 * slot_length;
        let lower = match previous_end {
            Some(end) => ideal.max(end + constraints.task_interval_minutes),
            None => ideal,
        };
        let start_minutes = match earliest_start(lower, window_end, duration, active_meals) {
            Some(start) => start,
            None => return Ok(()), // keep the first-fit layout
        };
        previous_end = Some(start_minutes + duration);

        let mut entry = placed.clone();
        entry.start = schedule_utils::to_naive_time(start_minutes)?;
        entry.end = schedule_utils::to_naive_time(start_minutes + duration)?;
        respaced.push(entry);
    }

    slate.placed = respaced;
    Ok(())
}

fn placed_task(task: &SchedulableTask, start: NaiveTime, end: NaiveTime, duration: i64) -> PlacedTask {
    PlacedTask {
        task_id: task.id.clone(),
        title: task.title.clone(),
        category: task.category.clone(),
        priority: task.priority,
        start,
        end,
        duration_minutes: duration,
    }
}
