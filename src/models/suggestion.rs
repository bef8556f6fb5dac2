use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum SuggestionCategory {
    StudyMethod,
    TimeManagement,
    DifficultyAdjustment,
    ResourceRecommendation,
    PracticeStrategy,
    Motivation,
}

impl SuggestionCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            SuggestionCategory::StudyMethod => "study-method",
            SuggestionCategory::TimeManagement => "time-management",
            SuggestionCategory::DifficultyAdjustment => "difficulty-adjustment",
            SuggestionCategory::ResourceRecommendation => "resource-recommendation",
            SuggestionCategory::PracticeStrategy => "practice-strategy",
            SuggestionCategory::Motivation => "motivation",
        }
    }
}

/// Human-readable remediation advice, tied to one compilation run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    pub category: SuggestionCategory,
    pub message: String,
    #[serde(default)]
    pub action: Option<String>,
}
