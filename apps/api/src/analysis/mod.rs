// Résumé analysis: upload pipeline, feedback parsing, listing and handlers.
// All LLM calls go through llm_client via service::ClaudeAnalysisService.

pub mod feedback;
pub mod handlers;
pub mod listing;
pub mod pipeline;
pub mod prompts;
pub mod raster;
pub mod service;
pub mod status;

#[cfg(test)]
pub mod testing;
