use std::collections::{BTreeMap, HashSet};

use tracing::debug;

use crate::models::adaptive::{AdaptiveRule, ProgressSnapshot};
use crate::models::conflict::{Conflict, ConflictSeverity, ConflictType};
use crate::models::suggestion::{Suggestion, SuggestionCategory};

/// How many distinct days a medium-severity conflict type must recur on
/// before it is worth a suggestion.
const RECURRENCE_THRESHOLD: usize = 3;

/// Map conflicts and adaptive rules into remediation suggestions,
/// deduplicated by (category, message).
pub fn generate(
    conflicts: &[Conflict],
    rules: &[AdaptiveRule],
    progress: &ProgressSnapshot,
) -> Vec<Suggestion> {
    let mut suggestions = Vec::new();

    // Every high conflict earns exactly one time-management suggestion.
    for conflict in conflicts
        .iter()
        .filter(|c| c.severity == ConflictSeverity::High)
    {
        suggestions.push(Suggestion {
            category: SuggestionCategory::TimeManagement,
            message: format!("检测到高优先级冲突：{}", conflict.message),
            action: conflict
                .suggested_fix
                .clone()
                .or_else(|| Some("重新生成排程预览并调整当日任务".to_string())),
        });
    }

    // Medium conflicts only matter when the same type recurs across days;
    // one-off imbalance is noise.
    let mut recurrence: BTreeMap<&'static str, HashSet<chrono::NaiveDate>> = BTreeMap::new();
    for conflict in conflicts
        .iter()
        .filter(|c| c.severity == ConflictSeverity::Medium)
    {
        if let Some(date) = conflict.date {
            recurrence
                .entry(conflict.conflict_type.as_str())
                .or_default()
                .insert(date);
        }
    }
    for (type_name, dates) in recurrence {
        if dates.len() >= RECURRENCE_THRESHOLD {
            suggestions.push(Suggestion {
                category: SuggestionCategory::TimeManagement,
                message: recurring_message(type_name, dates.len()),
                action: None,
            });
        }
    }

    // Rule-driven suggestions, highest priority first.
    let mut ordered: Vec<&AdaptiveRule> = rules.iter().collect();
    ordered.sort_by(|a, b| b.priority.cmp(&a.priority).then_with(|| a.id.cmp(&b.id)));
    for rule in ordered {
        let Some(value) = progress.metric(&rule.condition.metric) else {
            debug!(
                target: "app::suggestions",
                rule_id = %rule.id,
                metric = %rule.condition.metric,
                "metric missing from snapshot, rule skipped"
            );
            continue;
        };
        if rule.condition.op.evaluate(value, rule.condition.threshold) {
            suggestions.push(Suggestion {
                category: infer_category(&rule.action),
                message: rule.action.clone(),
                action: None,
            });
        }
    }

    dedupe(suggestions)
}

fn recurring_message(type_name: &str, day_count: usize) -> String {
    match type_name {
        "too-many-tasks" => format!(
            "连续 {day_count} 天任务数量超过上限，建议降低每日任务数或延长规划周期"
        ),
        "insufficient-time" => format!(
            "连续 {day_count} 天学习时长超出预算，建议压缩任务时长或增加每日学习时间"
        ),
        other => format!("冲突「{other}」在 {day_count} 天内反复出现，建议调整排程设置"),
    }
}

/// Keyword heuristic over the rule's action text. The exact mapping is an
/// implementation choice, not a contract.
fn infer_category(action: &str) -> SuggestionCategory {
    let lowered = action.to_lowercase();
    let matches = |keywords: &[&str]| keywords.iter().any(|k| lowered.contains(k));

    if matches(&["方法", "method"]) {
        SuggestionCategory::StudyMethod
    } else if matches(&["时间", "排程", "time", "schedule"]) {
        SuggestionCategory::TimeManagement
    } else if matches(&["难度", "difficult"]) {
        SuggestionCategory::DifficultyAdjustment
    } else if matches(&["资源", "资料", "resource"]) {
        SuggestionCategory::ResourceRecommendation
    } else if matches(&["练习", "刷题", "practice"]) {
        SuggestionCategory::PracticeStrategy
    } else {
        SuggestionCategory::Motivation
    }
}

fn dedupe(suggestions: Vec<Suggestion>) -> Vec<Suggestion> {
    let mut seen: HashSet<(SuggestionCategory, String)> = HashSet::new();
    suggestions
        .into_iter()
        .filter(|suggestion| seen.insert((suggestion.category, suggestion.message.clone())))
        .collect()
}
