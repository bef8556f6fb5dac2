pub mod error;
pub mod models;
pub mod services;
pub mod utils;

pub use error::{AppError, AppResult};
pub use models::adaptive::{AdaptiveRule, ComparisonOp, ProgressSnapshot, RuleCondition};
pub use models::conflict::{Conflict, ConflictSeverity, ConflictType};
pub use models::constraints::{ConstraintSettings, MealWindow, TaskDistribution};
pub use models::schedule::{DailyBreakdown, PlacedTask, PlanningHorizon, ScheduleReport};
pub use models::suggestion::{Suggestion, SuggestionCategory};
pub use models::task::{SchedulableTask, TaskPriority, UnplacedReason, UnplacedTask};
pub use services::planner_service::PlannerService;
