//! Analysis responses and the structured feedback extracted from them.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::llm_client::strip_json_fences;

/// Response of an `AnalysisService::feedback` call.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AnalysisResponse {
    pub message: AnalysisMessage,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AnalysisMessage {
    pub content: MessageContent,
}

/// Message content is either a plain string or a list of text blocks.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Blocks(Vec<TextBlock>),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TextBlock {
    pub text: String,
}

impl AnalysisResponse {
    #[cfg(test)]
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            message: AnalysisMessage {
                content: MessageContent::Text(text.into()),
            },
        }
    }

    pub fn from_blocks<I, S>(blocks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            message: AnalysisMessage {
                content: MessageContent::Blocks(
                    blocks
                        .into_iter()
                        .map(|text| TextBlock { text: text.into() })
                        .collect(),
                ),
            },
        }
    }

    /// The textual payload: the string itself, or the first block's text.
    pub fn text(&self) -> Option<&str> {
        match &self.message.content {
            MessageContent::Text(text) => Some(text),
            MessageContent::Blocks(blocks) => blocks.first().map(|b| b.text.as_str()),
        }
    }
}

#[derive(Debug, Error)]
pub enum FeedbackError {
    #[error("analysis response carried no text")]
    Empty,

    #[error("feedback is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("feedback must be a JSON object")]
    NotAnObject,
}

/// Parses the textual payload of an analysis response into structured feedback.
///
/// Must be an object: a bare `""` would be indistinguishable from the
/// pending sentinel once stored.
pub fn parse_feedback(text: &str) -> Result<Value, FeedbackError> {
    let body = strip_json_fences(text);
    if body.is_empty() {
        return Err(FeedbackError::Empty);
    }
    let value: Value = serde_json::from_str(body)?;
    if !value.is_object() {
        return Err(FeedbackError::NotAnObject);
    }
    Ok(value)
}

/// Extracts and parses the feedback carried by `response`.
pub fn extract_feedback(response: &AnalysisResponse) -> Result<Value, FeedbackError> {
    let text = response.text().ok_or(FeedbackError::Empty)?;
    parse_feedback(text)
}
