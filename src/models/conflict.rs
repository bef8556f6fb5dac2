use std::cmp::Ordering;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ConflictType {
    TimeOverlap,
    TooManyTasks,
    InsufficientTime,
    WeekendViolation,
    SchoolTimeViolation,
}

impl ConflictType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConflictType::TimeOverlap => "time-overlap",
            ConflictType::TooManyTasks => "too-many-tasks",
            ConflictType::InsufficientTime => "insufficient-time",
            ConflictType::WeekendViolation => "weekend-violation",
            ConflictType::SchoolTimeViolation => "school-time-violation",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ConflictSeverity {
    Low,
    Medium,
    High,
}

impl ConflictSeverity {
    fn weight(&self) -> u8 {
        match self {
            ConflictSeverity::High => 2,
            ConflictSeverity::Medium => 1,
            ConflictSeverity::Low => 0,
        }
    }
}

impl Ord for ConflictSeverity {
    fn cmp(&self, other: &Self) -> Ordering {
        self.weight().cmp(&other.weight())
    }
}

impl PartialOrd for ConflictSeverity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A rule violation derived from one compilation run. Recomputed every run
/// and never persisted outside the report that produced it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Conflict {
    pub conflict_type: ConflictType,
    pub severity: ConflictSeverity,
    pub message: String,
    #[serde(default)]
    pub suggested_fix: Option<String>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub related_task_id: Option<String>,
}
