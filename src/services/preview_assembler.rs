use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::conflict::Conflict;
use crate::models::schedule::{DailyBreakdown, ScheduleReport};
use crate::models::suggestion::Suggestion;
use crate::models::task::UnplacedTask;

/// Package one run's outputs into the read-only report. Shape mismatches
/// here mean a defective allocator, so they fail the run instead of being
/// surfaced as conflicts.
pub fn assemble(
    input_task_count: usize,
    days: Vec<DailyBreakdown>,
    unplaced: Vec<UnplacedTask>,
    conflicts: Vec<Conflict>,
    suggestions: Vec<Suggestion>,
) -> AppResult<ScheduleReport> {
    let mut placed_count = 0usize;
    let mut total_minutes = 0i64;

    for day in &days {
        let day_minutes: i64 = day.tasks.iter().map(|task| task.duration_minutes).sum();
        if day_minutes != day.total_minutes {
            return Err(AppError::internal(format!(
                "{} 的时长合计不一致: 记录 {} 分钟, 实际 {} 分钟",
                day.date, day.total_minutes, day_minutes
            )));
        }
        for placed in &day.tasks {
            let span = crate::services::schedule_utils::duration_minutes(placed.start, placed.end)?;
            if span != placed.duration_minutes {
                return Err(AppError::internal(format!(
                    "任务「{}」的起止时间与时长不一致",
                    placed.title
                )));
            }
        }
        for pair in day.tasks.windows(2) {
            if pair[0].end > pair[1].start {
                return Err(AppError::internal(format!(
                    "{} 的分配结果存在重叠: 「{}」与「{}」",
                    day.date, pair[0].title, pair[1].title
                )));
            }
        }
        placed_count += day.tasks.len();
        total_minutes += day.total_minutes;
    }

    if placed_count + unplaced.len() != input_task_count {
        return Err(AppError::internal(format!(
            "任务覆盖不完整: 输入 {} 个, 已排 {} 个, 未排 {} 个",
            input_task_count,
            placed_count,
            unplaced.len()
        )));
    }

    debug!(
        target: "app::planner",
        placed = placed_count,
        unplaced = unplaced.len(),
        conflicts = conflicts.len(),
        suggestions = suggestions.len(),
        "report assembled"
    );

    Ok(ScheduleReport {
        id: Uuid::new_v4().to_string(),
        generated_at: Utc::now().to_rfc3339(),
        total_tasks: input_task_count,
        total_minutes,
        days,
        unplaced,
        conflicts,
        suggestions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::schedule::PlacedTask;
    use crate::models::task::TaskPriority;
    use chrono::{NaiveDate, NaiveTime};

    fn t(hour: u32, minute: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, minute, 0).expect("valid time")
    }

    fn placed(id: &str, start: NaiveTime, minutes: i64) -> PlacedTask {
        PlacedTask {
            task_id: id.to_string(),
            title: format!("任务 {id}"),
            category: None,
            priority: TaskPriority::Medium,
            start,
            end: start + chrono::Duration::minutes(minutes),
            duration_minutes: minutes,
        }
    }

    fn day(tasks: Vec<PlacedTask>) -> DailyBreakdown {
        let total = tasks.iter().map(|p| p.duration_minutes).sum();
        DailyBreakdown {
            date: NaiveDate::from_ymd_opt(2025, 6, 2).expect("valid date"),
            total_minutes: total,
            is_weekend: false,
            tasks,
        }
    }

    #[test]
    fn sums_counts_and_durations() {
        let days = vec![day(vec![
            placed("a", t(18, 0), 30),
            placed("b", t(19, 0), 45),
        ])];
        let report =
            assemble(2, days, Vec::new(), Vec::new(), Vec::new()).expect("assemble");
        assert_eq!(report.total_tasks, 2);
        assert_eq!(report.total_minutes, 75);
        assert!(!report.id.is_empty());
    }

    #[test]
    fn broken_coverage_is_fatal() {
        let days = vec![day(vec![placed("a", t(18, 0), 30)])];
        let err = assemble(3, days, Vec::new(), Vec::new(), Vec::new())
            .expect_err("expected invariant failure");
        assert!(matches!(err, AppError::InternalInvariant { .. }));
    }

    #[test]
    fn overlapping_output_is_fatal() {
        let days = vec![day(vec![
            placed("a", t(18, 0), 60),
            placed("b", t(18, 30), 60),
        ])];
        let err = assemble(2, days, Vec::new(), Vec::new(), Vec::new())
            .expect_err("expected invariant failure");
        assert!(matches!(err, AppError::InternalInvariant { .. }));
    }

    #[test]
    fn inconsistent_day_total_is_fatal() {
        let mut broken = day(vec![placed("a", t(18, 0), 30)]);
        broken.total_minutes = 99;
        let err = assemble(1, vec![broken], Vec::new(), Vec::new(), Vec::new())
            .expect_err("expected invariant failure");
        assert!(matches!(err, AppError::InternalInvariant { .. }));
    }
}
