use std::sync::Arc;

use crate::analysis::pipeline::UploadPipeline;
use crate::storage::{FileStore, RecordStore};

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub files: Arc<dyn FileStore>,
    pub records: Arc<dyn RecordStore>,
    /// Built from the same stores as above plus the rasterizer and analysis service.
    pub pipeline: Arc<UploadPipeline>,
}
