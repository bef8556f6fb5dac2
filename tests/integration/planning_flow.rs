use std::collections::BTreeSet;

use chrono::{NaiveDate, NaiveTime};
use studyplan_engine::{
    AdaptiveRule, ComparisonOp, ConflictSeverity, ConflictType, ConstraintSettings,
    PlannerService, PlanningHorizon, ProgressSnapshot, RuleCondition, SchedulableTask,
    ScheduleReport, SuggestionCategory, TaskPriority, UnplacedReason,
};

fn t(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).expect("valid time")
}

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

// 2025-06-02 is a Monday.
fn monday() -> NaiveDate {
    date(2025, 6, 2)
}

fn school_week_settings() -> ConstraintSettings {
    ConstraintSettings {
        allowed_weekdays: [2, 3, 4, 5, 6].into_iter().collect(),
        school_end_time: t(18, 0),
        latest_study_time: t(22, 0),
        daily_study_hours: 4.0,
        task_interval_minutes: 10,
        max_tasks_per_day: 6,
        ..Default::default()
    }
}

fn task(id: &str, minutes: i64) -> SchedulableTask {
    SchedulableTask {
        id: id.to_string(),
        title: format!("任务 {id}"),
        category: Some("语文".to_string()),
        priority: TaskPriority::Medium,
        estimated_minutes: minutes,
        fixed_at: None,
    }
}

fn assert_engine_invariants(report: &ScheduleReport, constraints: &ConstraintSettings) {
    for day in &report.days {
        // No-overlap invariant.
        for pair in day.tasks.windows(2) {
            assert!(
                pair[0].end <= pair[1].start,
                "{}: {} overlaps {}",
                day.date,
                pair[0].task_id,
                pair[1].task_id
            );
        }
        // Weekday conformance.
        if !day.tasks.is_empty() {
            let weekday = chrono::Datelike::weekday(&day.date).number_from_sunday() as u8;
            assert!(constraints.allowed_weekdays.contains(&weekday));
        }
        // Capacity conformance, unless flagged.
        if day.tasks.len() > constraints.max_tasks_per_day {
            assert!(report.conflicts.iter().any(|c| {
                c.conflict_type == ConflictType::TooManyTasks && c.date == Some(day.date)
            }));
        }
    }
}

#[test]
fn scenario_a_three_tasks_place_cleanly_on_a_monday() {
    let tasks = vec![task("a", 30), task("b", 30), task("c", 30)];
    let constraints = school_week_settings();
    let report = PlannerService::new()
        .compile(
            &tasks,
            &constraints,
            PlanningHorizon::new(monday(), 1),
            &[],
            &ProgressSnapshot::default(),
        )
        .expect("compile");

    assert_eq!(report.total_tasks, 3);
    assert_eq!(report.total_minutes, 90);
    assert_eq!(report.days.len(), 1);
    assert_eq!(report.days[0].tasks.len(), 3);
    assert!(report.unplaced.is_empty());
    assert!(report.conflicts.is_empty());
    assert_engine_invariants(&report, &constraints);
}

#[test]
fn scenario_b_overflow_surfaces_a_too_many_tasks_conflict() {
    let tasks: Vec<_> = (0..8).map(|i| task(&format!("t{i}"), 30)).collect();
    let constraints = school_week_settings();
    let report = PlannerService::new()
        .compile(
            &tasks,
            &constraints,
            PlanningHorizon::new(monday(), 1),
            &[],
            &ProgressSnapshot::default(),
        )
        .expect("compile");

    assert_eq!(report.days[0].tasks.len(), 6);
    assert_eq!(report.unplaced.len(), 2);
    assert!(report
        .unplaced
        .iter()
        .all(|entry| entry.reason == UnplacedReason::DayFull));

    let overcount: Vec<_> = report
        .conflicts
        .iter()
        .filter(|c| c.conflict_type == ConflictType::TooManyTasks)
        .collect();
    assert_eq!(overcount.len(), 1);
    assert_eq!(overcount[0].severity, ConflictSeverity::Medium);
    assert_engine_invariants(&report, &constraints);
}

#[test]
fn scenario_b_longer_horizon_spills_to_the_next_day_instead() {
    let tasks: Vec<_> = (0..8).map(|i| task(&format!("t{i}"), 30)).collect();
    let report = PlannerService::new()
        .compile(
            &tasks,
            &school_week_settings(),
            PlanningHorizon::new(monday(), 2),
            &[],
            &ProgressSnapshot::default(),
        )
        .expect("compile");

    assert!(report.unplaced.is_empty());
    assert_eq!(report.days[0].tasks.len(), 6);
    assert_eq!(report.days[1].tasks.len(), 2);
    assert!(report.conflicts.is_empty());
}

#[test]
fn scenario_c_fixed_early_task_raises_violation_and_suggestion() {
    let fixed = SchedulableTask {
        fixed_at: Some(monday().and_hms_opt(17, 0, 0).expect("datetime")),
        ..task("mock-exam", 45)
    };
    let report = PlannerService::new()
        .compile(
            &[fixed],
            &school_week_settings(),
            PlanningHorizon::new(monday(), 1),
            &[],
            &ProgressSnapshot::default(),
        )
        .expect("compile");

    assert_eq!(report.days[0].tasks.len(), 1);
    assert_eq!(report.days[0].tasks[0].start, t(17, 0));

    let violation = report
        .conflicts
        .iter()
        .find(|c| c.conflict_type == ConflictType::SchoolTimeViolation)
        .expect("school-time violation");
    assert_eq!(violation.severity, ConflictSeverity::High);
    assert_eq!(violation.related_task_id.as_deref(), Some("mock-exam"));

    assert!(report
        .suggestions
        .iter()
        .any(|s| s.category == SuggestionCategory::TimeManagement));
}

#[test]
fn scenario_d_empty_weekdays_fail_fast() {
    let constraints = ConstraintSettings {
        allowed_weekdays: BTreeSet::new(),
        ..school_week_settings()
    };
    let err = PlannerService::new()
        .compile(
            &[task("a", 30)],
            &constraints,
            PlanningHorizon::new(monday(), 1),
            &[],
            &ProgressSnapshot::default(),
        )
        .expect_err("expected constraint failure");
    assert!(err.is_invalid_constraints());
}

#[test]
fn repeated_compilation_is_deterministic() {
    let tasks: Vec<_> = (0..12)
        .map(|i| {
            let mut entry = task(&format!("t{i}"), 25 + (i % 4) * 20);
            entry.priority = match i % 3 {
                0 => TaskPriority::Urgent,
                1 => TaskPriority::Medium,
                _ => TaskPriority::Low,
            };
            entry
        })
        .collect();
    let constraints = school_week_settings();
    let horizon = PlanningHorizon::new(monday(), 7);
    let planner = PlannerService::new();
    let progress = ProgressSnapshot::default();

    let first = planner
        .compile(&tasks, &constraints, horizon, &[], &progress)
        .expect("first compile");
    let second = planner
        .compile(&tasks, &constraints, horizon, &[], &progress)
        .expect("second compile");

    // Report identity differs per run; the allocation itself must not.
    assert_eq!(first.days, second.days);
    assert_eq!(first.unplaced, second.unplaced);
    assert_eq!(first.conflicts, second.conflicts);
    assert_eq!(first.suggestions, second.suggestions);
}

#[test]
fn every_task_lands_in_exactly_one_bucket() {
    let tasks: Vec<_> = (0..20).map(|i| task(&format!("t{i}"), 40)).collect();
    let constraints = school_week_settings();
    let report = PlannerService::new()
        .compile(
            &tasks,
            &constraints,
            PlanningHorizon::new(monday(), 3),
            &[],
            &ProgressSnapshot::default(),
        )
        .expect("compile");

    let mut seen: BTreeSet<String> = BTreeSet::new();
    for day in &report.days {
        for placed in &day.tasks {
            assert!(seen.insert(placed.task_id.clone()), "duplicate placement");
        }
    }
    for entry in &report.unplaced {
        assert!(seen.insert(entry.task.id.clone()), "task in both buckets");
    }
    assert_eq!(seen.len(), tasks.len());
    assert_engine_invariants(&report, &constraints);
}

#[test]
fn adaptive_rules_feed_report_suggestions() {
    let rules = vec![AdaptiveRule {
        id: "completion-low".to_string(),
        condition: RuleCondition {
            metric: "completionRate".to_string(),
            op: ComparisonOp::LessThan,
            threshold: 0.7,
        },
        action: "建议更换学习方法，使用错题本复盘".to_string(),
        parameters: None,
        priority: 5,
    }];
    let progress = ProgressSnapshot::default().with_metric("completionRate", 0.55);
    let report = PlannerService::new()
        .compile(
            &[task("a", 30)],
            &school_week_settings(),
            PlanningHorizon::new(monday(), 1),
            &rules,
            &progress,
        )
        .expect("compile");

    assert!(report
        .suggestions
        .iter()
        .any(|s| s.category == SuggestionCategory::StudyMethod));
}

#[test]
fn report_round_trips_through_json() {
    let report = PlannerService::new()
        .compile(
            &[task("a", 30), task("b", 45)],
            &school_week_settings(),
            PlanningHorizon::new(monday(), 2),
            &[],
            &ProgressSnapshot::default(),
        )
        .expect("compile");

    let json = serde_json::to_string(&report).expect("serialize report");
    let back: ScheduleReport = serde_json::from_str(&json).expect("deserialize report");
    assert_eq!(back, report);
}
