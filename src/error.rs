use serde_json::Value as JsonValue;
use thiserror::Error;
use tracing::{error, warn};

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("约束校验失败: {message}")]
    InvalidConstraints {
        message: String,
        details: Option<JsonValue>,
    },

    #[error("内部不变量被破坏: {message}")]
    InternalInvariant { message: String },

    #[error("序列化错误: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl AppError {
    pub fn invalid_constraints(message: impl Into<String>) -> Self {
        let message = message.into();
        warn!(target: "app::validation", %message, "constraint validation failed");
        AppError::InvalidConstraints {
            message,
            details: None,
        }
    }

    pub fn invalid_constraints_with_details(message: impl Into<String>, details: JsonValue) -> Self {
        let message = message.into();
        warn!(target: "app::validation", %message, details = %details, "constraint validation failed");
        AppError::InvalidConstraints {
            message,
            details: Some(details),
        }
    }

    /// Allocator or assembler produced output that violates its own contract.
    /// Always a defect, never a legitimate scheduling conflict.
    pub fn internal(message: impl Into<String>) -> Self {
        let message = message.into();
        error!(target: "app::invariant", %message, "internal invariant violated");
        AppError::InternalInvariant { message }
    }

    pub fn other(message: impl Into<String>) -> Self {
        let message = message.into();
        error!(target: "app::other", %message, "other error");
        AppError::Other(message)
    }

    pub fn is_invalid_constraints(&self) -> bool {
        matches!(self, AppError::InvalidConstraints { .. })
    }

    pub fn details(&self) -> Option<&JsonValue> {
        match self {
            AppError::InvalidConstraints { details, .. } => details.as_ref(),
            _ => None,
        }
    }
}
