use serde::{Deserialize, Serialize};

use crate::validation::ValidationErrors;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
}

/// `{status, message, data}` wrapper shared by every response body.
#[derive(Debug, Clone, Serialize)]
pub struct Envelope<T> {
    pub status: Status,
    pub message: String,
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<ValidationErrors>,
}

impl<T> Envelope<T> {
    pub fn success(message: impl Into<String>, data: T) -> Self {
        Self {
            status: Status::Success,
            message: message.into(),
            data: Some(data),
            errors: None,
        }
    }
}

impl Envelope<()> {
    /// Success without a payload; `data` serializes as `null`.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            status: Status::Success,
            message: message.into(),
            data: None,
            errors: None,
        }
    }

    pub fn error(message: impl Into<String>, errors: Option<ValidationErrors>) -> Self {
        Self {
            status: Status::Error,
            message: message.into(),
            data: None,
            errors,
        }
    }
}
