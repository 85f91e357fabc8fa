//! AI feedback for a stored résumé.

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use tracing::{info, warn};

use crate::analysis::feedback::AnalysisResponse;
use crate::analysis::prompts::FEEDBACK_SYSTEM;
use crate::llm_client::prompts::JSON_ONLY_SYSTEM;
use crate::llm_client::{LlmClient, LlmResponse};
use crate::storage::FileStore;

/// Submits a stored file and free-text instructions for feedback.
/// `Ok(None)` means the service answered with nothing usable.
#[async_trait]
pub trait AnalysisService: Send + Sync {
    async fn feedback(&self, path: &str, instructions: &str) -> Result<Option<AnalysisResponse>>;
}

/// Analysis backed by Claude. The stored PDF is read back, reduced to text
/// and sent with the instructions in a single prompt.
pub struct ClaudeAnalysisService {
    llm: LlmClient,
    files: Arc<dyn FileStore>,
}

impl ClaudeAnalysisService {
    pub fn new(llm: LlmClient, files: Arc<dyn FileStore>) -> Self {
        Self { llm, files }
    }
}

pub fn build_feedback_prompt(instructions: &str, resume_text: &str) -> String {
    format!("{instructions}\n\n<resume>\n{}\n</resume>", resume_text.trim())
}

/// Wraps the text blocks of a model reply. A reply with no text blocks is
/// no response at all.
fn analysis_response(response: &LlmResponse) -> Option<AnalysisResponse> {
    let blocks: Vec<&str> = response.text_blocks().collect();
    if blocks.is_empty() {
        return None;
    }
    Some(AnalysisResponse::from_blocks(blocks))
}

/// PDF text extraction is CPU-bound; keep it off the async workers.
async fn extract_resume_text(bytes: bytes::Bytes) -> Result<String> {
    tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
        .await
        .context("PDF text extraction task panicked")?
        .map_err(|e| anyhow!("PDF text extraction failed: {e}"))
}

#[async_trait]
impl AnalysisService for ClaudeAnalysisService {
    async fn feedback(&self, path: &str, instructions: &str) -> Result<Option<AnalysisResponse>> {
        let Some(blob) = self.files.read(path).await? else {
            warn!("Cannot analyze {path}: file not found");
            return Ok(None);
        };

        let resume_text = extract_resume_text(blob.bytes).await?;
        if resume_text.trim().is_empty() {
            warn!("No text extracted from {path}; sending instructions only");
        }

        let prompt = build_feedback_prompt(instructions, &resume_text);
        let system = format!("{FEEDBACK_SYSTEM} {JSON_ONLY_SYSTEM}");
        let response = self
            .llm
            .call(&prompt, &system)
            .await
            .map_err(|e| anyhow!("Feedback LLM call failed: {e}"))?;

        let Some(analysis) = analysis_response(&response) else {
            warn!("Feedback for {path} came back without text");
            return Ok(None);
        };

        info!(
            "Feedback received for {path}: {} tokens out",
            response.usage.output_tokens
        );
        Ok(Some(analysis))
    }
}
