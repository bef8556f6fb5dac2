use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Candidate task supplied by the task pool. Read-only view; the engine never
/// mutates it, only copies identity fields into placements.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SchedulableTask {
    pub id: String,
    pub title: String,
    /// Free-form category, e.g. a subject name. Doubles as the grouping
    /// affinity shown in the report.
    #[serde(default)]
    pub category: Option<String>,
    pub priority: TaskPriority,
    pub estimated_minutes: i64,
    /// Fixed due date/time. When present the task is placed verbatim at this
    /// instant instead of being allocated a slot.
    #[serde(default)]
    pub fixed_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
    Urgent,
}

impl TaskPriority {
    /// Ordering rank, higher schedules first.
    pub fn rank(&self) -> u8 {
        match self {
            TaskPriority::Urgent => 3,
            TaskPriority::High => 2,
            TaskPriority::Medium => 1,
            TaskPriority::Low => 0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
            TaskPriority::Urgent => "urgent",
        }
    }
}

/// Why the allocator could not place a task anywhere in the horizon.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum UnplacedReason {
    /// Every eligible day already held `maxTasksPerDay` tasks.
    DayFull,
    /// Placing the task would exceed the daily study budget everywhere.
    DailyBudgetExceeded,
    /// No free slot of sufficient length honoring the task interval remained.
    NoFreeSlot,
    /// Meal avoidance is on and every remaining slot intersects a meal window.
    MealWindowBlocked,
    /// The task's fixed time falls outside the horizon or on a disallowed day.
    OutsideHorizon,
}

impl UnplacedReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnplacedReason::DayFull => "day-full",
            UnplacedReason::DailyBudgetExceeded => "daily-budget-exceeded",
            UnplacedReason::NoFreeSlot => "no-free-slot",
            UnplacedReason::MealWindowBlocked => "meal-window-blocked",
            UnplacedReason::OutsideHorizon => "outside-horizon",
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            UnplacedReason::DayFull => "当日任务数量已达上限",
            UnplacedReason::DailyBudgetExceeded => "当日学习时长预算不足",
            UnplacedReason::NoFreeSlot => "没有足够长的空闲时段",
            UnplacedReason::MealWindowBlocked => "剩余时段与用餐时间冲突",
            UnplacedReason::OutsideHorizon => "固定时间不在规划范围内",
        }
    }
}

/// A task the allocator gave up on, with the day the failure is attributed to
/// so the conflict detector can count it against that day's capacity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UnplacedTask {
    pub task: SchedulableTask,
    pub reason: UnplacedReason,
    #[serde(default)]
    pub attributed_date: Option<NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_ranks_order_urgent_first() {
        assert!(TaskPriority::Urgent.rank() > TaskPriority::High.rank());
        assert!(TaskPriority::High.rank() > TaskPriority::Medium.rank());
        assert!(TaskPriority::Medium.rank() > TaskPriority::Low.rank());
    }

    #[test]
    fn unplaced_reason_serializes_kebab_case() {
        let json = serde_json::to_string(&UnplacedReason::MealWindowBlocked).expect("serialize");
        assert_eq!(json, "\"meal-window-blocked\"");
    }
}
