use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::invoke::ModelId;

/// Failure category surfaced to callers alongside the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    MissingField,
    InvalidValue,
    RelationalValidation,
    RangeValidation,
    ModelNotFound,
    ModelLoad,
    Prediction,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::MissingField => "MissingFieldError",
            ErrorKind::InvalidValue => "InvalidValueError",
            ErrorKind::RelationalValidation => "RelationalValidationError",
            ErrorKind::RangeValidation => "RangeValidationError",
            ErrorKind::ModelNotFound => "ModelNotFoundError",
            ErrorKind::ModelLoad => "ModelLoadError",
            ErrorKind::Prediction => "PredictionError",
        }
    }

    pub fn is_validation(self) -> bool {
        matches!(
            self,
            ErrorKind::MissingField
                | ErrorKind::InvalidValue
                | ErrorKind::RelationalValidation
                | ErrorKind::RangeValidation
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum ForecastError {
    #[error("missing value for {field}")]
    MissingField { field: String },

    #[error("invalid value for {field}: {value:?} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("{made} made ({made_value}) cannot exceed {attempted} attempted ({attempted_value})")]
    RelationalValidation {
        made: &'static str,
        attempted: &'static str,
        made_value: f64,
        attempted_value: f64,
    },

    #[error("{field} must be between {min} and {max}, got {value}")]
    RangeValidation {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("model not found: {id} ({location})")]
    ModelNotFound { id: ModelId, location: String },

    #[error("failed to load model {id}: {message}")]
    ModelLoad { id: ModelId, message: String },

    #[error("prediction failed for {id}: {message}")]
    Prediction { id: ModelId, message: String },
}

impl ForecastError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ForecastError::MissingField { .. } => ErrorKind::MissingField,
            ForecastError::InvalidValue { .. } => ErrorKind::InvalidValue,
            ForecastError::RelationalValidation { .. } => ErrorKind::RelationalValidation,
            ForecastError::RangeValidation { .. } => ErrorKind::RangeValidation,
            ForecastError::ModelNotFound { .. } => ErrorKind::ModelNotFound,
            ForecastError::ModelLoad { .. } => ErrorKind::ModelLoad,
            ForecastError::Prediction { .. } => ErrorKind::Prediction,
        }
    }

    /// Input field the error refers to, for validation failures.
    pub fn field(&self) -> Option<&str> {
        match self {
            ForecastError::MissingField { field } | ForecastError::InvalidValue { field, .. } => {
                Some(field)
            }
            ForecastError::RelationalValidation { made, .. } => Some(made),
            ForecastError::RangeValidation { field, .. } => Some(field),
            _ => None,
        }
    }

    pub fn model_id(&self) -> Option<ModelId> {
        match self {
            ForecastError::ModelNotFound { id, .. }
            | ForecastError::ModelLoad { id, .. }
            | ForecastError::Prediction { id, .. } => Some(*id),
            _ => None,
        }
    }

    pub(crate) fn prediction(id: ModelId, message: impl Into<String>) -> Self {
        ForecastError::Prediction {
            id,
            message: message.into(),
        }
    }

    pub(crate) fn load(id: ModelId, message: impl Into<String>) -> Self {
        ForecastError::ModelLoad {
            id,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ForecastError>;
