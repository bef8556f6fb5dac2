use std::collections::BTreeSet;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::{AppError, AppResult};

/// How free-floating tasks are spread across a day's placement window.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TaskDistribution {
    Uniform,
    Concentrated,
    Scattered,
}

impl TaskDistribution {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskDistribution::Uniform => "uniform",
            TaskDistribution::Concentrated => "concentrated",
            TaskDistribution::Scattered => "scattered",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MealWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl MealWindow {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    pub fn intersects(&self, start: NaiveTime, end: NaiveTime) -> bool {
        start < self.end && self.start < end
    }
}

/// Default meal windows: lunch 12:00–13:00, dinner 18:00–19:00. Callers with
/// other mealtimes override these per student.
pub fn default_meal_windows() -> Vec<MealWindow> {
    vec![
        MealWindow::new(hm(12, 0), hm(13, 0)),
        MealWindow::new(hm(18, 0), hm(19, 0)),
    ]
}

fn hm(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).expect("literal time must be valid")
}

/// A student's availability rules, owned by the student profile and taken as
/// an immutable snapshot for each compilation run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConstraintSettings {
    /// Weekday numbers, 1=Sunday … 7=Saturday.
    pub allowed_weekdays: BTreeSet<u8>,
    pub school_end_time: NaiveTime,
    pub latest_study_time: NaiveTime,
    /// Soft cap on total allocated duration per day, in hours.
    pub daily_study_hours: f64,
    pub task_distribution: TaskDistribution,
    /// Minimum gap between two consecutive placed tasks on the same day.
    pub task_interval_minutes: i64,
    /// Anchor for highest-priority tasks under the concentrated strategy.
    pub priority_task_time: NaiveTime,
    #[serde(default)]
    pub avoid_meal_windows: bool,
    #[serde(default)]
    pub prefer_morning_study: bool,
    pub max_tasks_per_day: usize,
    #[serde(default = "default_meal_windows")]
    pub meal_windows: Vec<MealWindow>,
}

impl Default for ConstraintSettings {
    fn default() -> Self {
        Self {
            allowed_weekdays: (1..=7).collect(),
            school_end_time: hm(18, 0),
            latest_study_time: hm(22, 0),
            daily_study_hours: 3.0,
            task_distribution: TaskDistribution::Uniform,
            task_interval_minutes: 10,
            priority_task_time: hm(19, 0),
            avoid_meal_windows: false,
            prefer_morning_study: false,
            max_tasks_per_day: 6,
            meal_windows: default_meal_windows(),
        }
    }
}

impl ConstraintSettings {
    pub fn validate(&self) -> AppResult<()> {
        if self.allowed_weekdays.is_empty() {
            return Err(AppError::invalid_constraints("可用学习日不能为空"));
        }
        if let Some(day) = self.allowed_weekdays.iter().find(|day| !(1..=7).contains(*day)) {
            return Err(AppError::invalid_constraints_with_details(
                "无效的星期编号",
                json!({ "weekday": day }),
            ));
        }
        if self.school_end_time >= self.latest_study_time {
            return Err(AppError::invalid_constraints_with_details(
                "放学时间必须早于最晚学习时间",
                json!({
                    "schoolEndTime": self.school_end_time.format("%H:%M").to_string(),
                    "latestStudyTime": self.latest_study_time.format("%H:%M").to_string(),
                }),
            ));
        }
        if self.daily_study_hours <= 0.0 {
            return Err(AppError::invalid_constraints("每日学习时长必须为正数"));
        }
        if self.max_tasks_per_day == 0 {
            return Err(AppError::invalid_constraints("每日任务上限必须为正数"));
        }
        if self.task_interval_minutes < 0 {
            return Err(AppError::invalid_constraints("任务间隔不能为负数"));
        }
        Ok(())
    }

    /// Daily study budget in minutes, rounded down.
    pub fn daily_budget_minutes(&self) -> i64 {
        (self.daily_study_hours * 60.0).floor() as i64
    }
}
