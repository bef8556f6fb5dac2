use chrono::{Datelike, NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::models::task::{TaskPriority, UnplacedTask};
use crate::models::conflict::Conflict;
use crate::models::suggestion::Suggestion;

/// The contiguous range of calendar days one compilation run considers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PlanningHorizon {
    pub start: NaiveDate,
    pub days: u32,
}

impl PlanningHorizon {
    pub fn new(start: NaiveDate, days: u32) -> Self {
        Self { start, days }
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        let start = self.start;
        (0..self.days).filter_map(move |offset| {
            start.checked_add_signed(chrono::Duration::days(i64::from(offset)))
        })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        let offset = (date - self.start).num_days();
        offset >= 0 && (offset as u64) < u64::from(self.days)
    }
}

/// One task pinned to a concrete slot. Immutable once produced.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlacedTask {
    pub task_id: String,
    pub title: String,
    #[serde(default)]
    pub category: Option<String>,
    pub priority: TaskPriority,
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub duration_minutes: i64,
}

impl PlacedTask {
    pub fn overlaps(&self, other: &PlacedTask) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Chronological allocation for a single calendar day. Rebuilt every run,
/// never mutated in place.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DailyBreakdown {
    pub date: NaiveDate,
    pub tasks: Vec<PlacedTask>,
    pub total_minutes: i64,
    pub is_weekend: bool,
}

impl DailyBreakdown {
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            tasks: Vec::new(),
            total_minutes: 0,
            is_weekend: is_weekend(date),
        }
    }
}

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Weekday number in the settings convention: 1=Sunday … 7=Saturday.
pub fn weekday_number(date: NaiveDate) -> u8 {
    date.weekday().number_from_sunday() as u8
}

/// Disposable, read-only output of one compilation run. The caller either
/// commits it (writing placements back onto persisted tasks) or discards it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleReport {
    pub id: String,
    pub generated_at: String,
    pub total_tasks: usize,
    pub total_minutes: i64,
    pub days: Vec<DailyBreakdown>,
    #[serde(default)]
    pub unplaced: Vec<UnplacedTask>,
    #[serde(default)]
    pub conflicts: Vec<Conflict>,
    #[serde(default)]
    pub suggestions: Vec<Suggestion>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
    }

    #[test]
    fn horizon_enumerates_contiguous_dates() {
        let horizon = PlanningHorizon::new(date(2025, 6, 2), 3);
        let dates: Vec<_> = horizon.dates().collect();
        assert_eq!(
            dates,
            vec![date(2025, 6, 2), date(2025, 6, 3), date(2025, 6, 4)]
        );
        assert!(horizon.contains(date(2025, 6, 4)));
        assert!(!horizon.contains(date(2025, 6, 5)));
    }

    #[test]
    fn weekday_numbers_use_sunday_first_convention() {
        // 2025-06-01 is a Sunday, 2025-06-07 a Saturday.
        assert_eq!(weekday_number(date(2025, 6, 1)), 1);
        assert_eq!(weekday_number(date(2025, 6, 2)), 2);
        assert_eq!(weekday_number(date(2025, 6, 7)), 7);
        assert!(is_weekend(date(2025, 6, 1)));
        assert!(!is_weekend(date(2025, 6, 2)));
    }
}
