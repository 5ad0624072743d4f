use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{ControlId, ControlKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    NotFound,
    UnsupportedAttribute,
    MalformedMessage,
    Validation,
    Internal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Protocol-time failures. All of them are recoverable at the protocol boundary.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum UpdateError {
    #[error("control {0} not found")]
    NotFound(ControlId),
    #[error("attribute `{attribute}` is not supported by {kind} control {target_id}")]
    UnsupportedAttribute {
        target_id: ControlId,
        kind: ControlKind,
        attribute: String,
    },
    #[error("malformed update: {0}")]
    MalformedMessage(String),
}

impl UpdateError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::NotFound(_) => ErrorCode::NotFound,
            Self::UnsupportedAttribute { .. } => ErrorCode::UnsupportedAttribute,
            Self::MalformedMessage(_) => ErrorCode::MalformedMessage,
        }
    }
}

impl From<UpdateError> for ApiError {
    fn from(value: UpdateError) -> Self {
        Self {
            code: value.code(),
            message: value.to_string(),
        }
    }
}

/// Construction-time failures. Distinct from [`UpdateError`]: these abort the build step.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BuildError {
    #[error("parent container {0} does not exist")]
    ParentMissing(ControlId),
    #[error("control {id} is a {kind}, not a container")]
    NotAContainer { id: ControlId, kind: ControlKind },
    #[error("invalid options for `{label}`: {reason}")]
    InvalidOptions { label: String, reason: String },
}

impl From<BuildError> for ApiError {
    fn from(value: BuildError) -> Self {
        Self::new(ErrorCode::Validation, value.to_string())
    }
}
