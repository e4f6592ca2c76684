use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::Message;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Body of a generation call: the new prompt plus the thread so far.
#[derive(Debug, Clone, Serialize)]
pub struct GenerateRequest {
    pub prompt: String,
    pub max_tokens: u32,
    pub history: Vec<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenerateResponse {
    #[serde(default)]
    pub response: Option<String>,
}
