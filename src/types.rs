use std::error::Error;
pub use std::result::Result as stdResult;

use serde::Serialize;
use utoipa::ToSchema;

pub type Result<T> = stdResult<T, Box<dyn Error + Send + Sync>>;

/// Static greeting returned by the informational routes.
#[derive(Debug, Serialize, ToSchema)]
pub struct Message {
    pub message: String,
}

impl Message {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

/// Best-effort answer for a free-text query.
#[derive(Debug, PartialEq, Serialize, ToSchema)]
pub struct AnswerResult {
    /// Answer text. Never empty, a fallback message is used when nothing matched.
    pub answer: String,
    /// Where the answer came from, if the upstream service said so.
    pub source_url: Option<String>,
}
