//! Upload pipeline. Stores a résumé, rasterizes it, persists its record and
//! merges AI feedback back into that record.
//!
//! Flow: upload resume → rasterize first page → upload image →
//!       persist pending record → analyze → persist final record.
//!
//! Every stage reports a status before it runs. The first failing stage halts
//! the run; nothing is retried or rolled back.

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::analysis::feedback::{extract_feedback, AnalysisResponse};
use crate::analysis::prompts::prepare_instructions;
use crate::analysis::raster::Rasterizer;
use crate::analysis::service::AnalysisService;
use crate::analysis::status::StatusSink;
use crate::models::resume::{FeedbackState, ResumeRecord};
use crate::storage::{FileStore, FileUpload, RecordStore};

/// Status reported once the final record is stored.
pub const COMPLETE_STATUS: &str = "Analysis complete, redirecting...";

// ────────────────────────────────────────────────────────────────────────────
// Data models
// ────────────────────────────────────────────────────────────────────────────

/// One résumé submission: the PDF plus the job it is scored against.
#[derive(Debug, Clone)]
pub struct ResumeSubmission {
    pub company_name: String,
    pub job_title: String,
    pub job_description: String,
    pub file: FileUpload,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    UploadResume,
    Rasterize,
    UploadImage,
    PersistPending,
    Analyze,
    Finalize,
}

impl Stage {
    /// Progress text shown before the stage runs.
    pub fn status(self) -> Option<&'static str> {
        match self {
            Stage::UploadResume => Some("Uploading the file..."),
            Stage::Rasterize => Some("Converting to image..."),
            Stage::UploadImage => Some("Uploading the image..."),
            Stage::PersistPending => Some("Preparing data..."),
            Stage::Analyze => Some("Analyzing..."),
            Stage::Finalize => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PipelineError {
    #[error("Failed to upload file")]
    Upload,

    #[error("Failed to convert PDF to image")]
    Conversion,

    #[error("Failed to upload image")]
    ImageUpload,

    #[error("Failed to save resume data")]
    Persist,

    #[error("Failed to analyze resume")]
    Analysis,

    #[error("Failed to parse feedback")]
    InvalidFeedback,
}

impl PipelineError {
    /// Terminal status reported when a run halts with this error.
    pub fn status(&self) -> String {
        format!("Error: {self}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineOutcome {
    Completed {
        id: Uuid,
        redirect: String,
    },
    Failed {
        error: PipelineError,
        /// Set when the halt happened after the pending record was stored.
        record_id: Option<Uuid>,
    },
}

impl PipelineOutcome {
    pub fn terminal_status(&self) -> String {
        match self {
            PipelineOutcome::Completed { .. } => COMPLETE_STATUS.to_string(),
            PipelineOutcome::Failed { error, .. } => error.status(),
        }
    }
}

/// What a run has accomplished so far. Each variant determines the next stage.
enum Progress {
    Received(ResumeSubmission),
    ResumeUploaded {
        submission: ResumeSubmission,
        resume_path: String,
    },
    Rasterized {
        submission: ResumeSubmission,
        resume_path: String,
        image: FileUpload,
    },
    ImageUploaded {
        submission: ResumeSubmission,
        resume_path: String,
        image_path: String,
    },
    Pending(ResumeRecord),
    Analyzed {
        record: ResumeRecord,
        response: AnalysisResponse,
    },
}

impl Progress {
    fn stage(&self) -> Stage {
        match self {
            Progress::Received(_) => Stage::UploadResume,
            Progress::ResumeUploaded { .. } => Stage::Rasterize,
            Progress::Rasterized { .. } => Stage::UploadImage,
            Progress::ImageUploaded { .. } => Stage::PersistPending,
            Progress::Pending(_) => Stage::Analyze,
            Progress::Analyzed { .. } => Stage::Finalize,
        }
    }

    fn record_id(&self) -> Option<Uuid> {
        match self {
            Progress::Pending(record) | Progress::Analyzed { record, .. } => Some(record.id),
            _ => None,
        }
    }
}

enum StageOutcome {
    Continue(Progress),
    Complete(ResumeRecord),
    Halt(PipelineError),
}

// ────────────────────────────────────────────────────────────────────────────
// Pipeline
// ────────────────────────────────────────────────────────────────────────────

pub struct UploadPipeline {
    files: Arc<dyn FileStore>,
    records: Arc<dyn RecordStore>,
    rasterizer: Arc<dyn Rasterizer>,
    analysis: Arc<dyn AnalysisService>,
}

impl UploadPipeline {
    pub fn new(
        files: Arc<dyn FileStore>,
        records: Arc<dyn RecordStore>,
        rasterizer: Arc<dyn Rasterizer>,
        analysis: Arc<dyn AnalysisService>,
    ) -> Self {
        Self {
            files,
            records,
            rasterizer,
            analysis,
        }
    }

    /// Runs one submission to completion or to its first failure.
    pub async fn run(&self, submission: ResumeSubmission, sink: &dyn StatusSink) -> PipelineOutcome {
        let mut progress = Progress::Received(submission);
        loop {
            let stage = progress.stage();
            let record_id = progress.record_id();
            if let Some(status) = stage.status() {
                info!("{status}");
                sink.report(status);
            }

            progress = match self.run_stage(progress).await {
                StageOutcome::Continue(next) => next,
                StageOutcome::Complete(record) => {
                    info!(
                        "Resume {} analyzed (overall score {:?}) and stored under {}",
                        record.id,
                        record.overall_score(),
                        record.key()
                    );
                    sink.report(COMPLETE_STATUS);
                    return PipelineOutcome::Completed {
                        id: record.id,
                        redirect: format!("/resume/{}", record.id),
                    };
                }
                StageOutcome::Halt(error) => {
                    let status = error.status();
                    warn!("Pipeline halted at {stage:?}: {status}");
                    sink.report(&status);
                    return PipelineOutcome::Failed { error, record_id };
                }
            };
        }
    }

    async fn run_stage(&self, progress: Progress) -> StageOutcome {
        match progress {
            Progress::Received(submission) => self.upload_resume(submission).await,
            Progress::ResumeUploaded {
                submission,
                resume_path,
            } => self.rasterize(submission, resume_path).await,
            Progress::Rasterized {
                submission,
                resume_path,
                image,
            } => self.upload_image(submission, resume_path, image).await,
            Progress::ImageUploaded {
                submission,
                resume_path,
                image_path,
            } => self.persist_pending(submission, resume_path, image_path).await,
            Progress::Pending(record) => self.analyze(record).await,
            Progress::Analyzed { record, response } => self.finalize(record, response).await,
        }
    }

    async fn upload_resume(&self, submission: ResumeSubmission) -> StageOutcome {
        match self.files.upload(&submission.file).await {
            Ok(stored) if !stored.path.is_empty() => StageOutcome::Continue(Progress::ResumeUploaded {
                submission,
                resume_path: stored.path,
            }),
            Ok(_) => {
                warn!("Resume upload returned an empty path");
                StageOutcome::Halt(PipelineError::Upload)
            }
            Err(e) => {
                warn!("Resume upload failed: {e:#}");
                StageOutcome::Halt(PipelineError::Upload)
            }
        }
    }

    /// Converts the submitted bytes, not the uploaded copy.
    async fn rasterize(&self, submission: ResumeSubmission, resume_path: String) -> StageOutcome {
        match self.rasterizer.rasterize(&submission.file).await {
            Ok(Some(image)) => StageOutcome::Continue(Progress::Rasterized {
                submission,
                resume_path,
                image,
            }),
            Ok(None) => {
                warn!("Rasterizer produced no image for {}", submission.file.name);
                StageOutcome::Halt(PipelineError::Conversion)
            }
            Err(e) => {
                warn!("Rasterization failed: {e:#}");
                StageOutcome::Halt(PipelineError::Conversion)
            }
        }
    }

    async fn upload_image(
        &self,
        submission: ResumeSubmission,
        resume_path: String,
        image: FileUpload,
    ) -> StageOutcome {
        match self.files.upload(&image).await {
            Ok(stored) if !stored.path.is_empty() => StageOutcome::Continue(Progress::ImageUploaded {
                submission,
                resume_path,
                image_path: stored.path,
            }),
            Ok(_) => {
                warn!("Image upload returned an empty path");
                StageOutcome::Halt(PipelineError::ImageUpload)
            }
            Err(e) => {
                warn!("Image upload failed: {e:#}");
                StageOutcome::Halt(PipelineError::ImageUpload)
            }
        }
    }

    async fn persist_pending(
        &self,
        submission: ResumeSubmission,
        resume_path: String,
        image_path: String,
    ) -> StageOutcome {
        let record = ResumeRecord {
            id: Uuid::new_v4(),
            resume_path,
            image_path,
            company_name: submission.company_name,
            job_title: submission.job_title,
            job_description: submission.job_description,
            feedback: FeedbackState::Pending,
        };

        match self.store(&record).await {
            Ok(()) => StageOutcome::Continue(Progress::Pending(record)),
            Err(e) => {
                warn!("Failed to store pending record {}: {e:#}", record.key());
                StageOutcome::Halt(PipelineError::Persist)
            }
        }
    }

    async fn analyze(&self, record: ResumeRecord) -> StageOutcome {
        let instructions = prepare_instructions(&record.job_title, &record.job_description);
        match self.analysis.feedback(&record.resume_path, &instructions).await {
            Ok(Some(response)) => StageOutcome::Continue(Progress::Analyzed { record, response }),
            Ok(None) => {
                warn!("Analysis returned nothing for {}", record.key());
                StageOutcome::Halt(PipelineError::Analysis)
            }
            Err(e) => {
                warn!("Analysis failed for {}: {e:#}", record.key());
                StageOutcome::Halt(PipelineError::Analysis)
            }
        }
    }

    async fn finalize(&self, mut record: ResumeRecord, response: AnalysisResponse) -> StageOutcome {
        let feedback = match extract_feedback(&response) {
            Ok(feedback) => feedback,
            Err(e) => {
                warn!("Unusable feedback for {}: {e}", record.key());
                return StageOutcome::Halt(PipelineError::InvalidFeedback);
            }
        };
        record.feedback = FeedbackState::Ready(feedback);

        match self.store(&record).await {
            Ok(()) => StageOutcome::Complete(record),
            Err(e) => {
                warn!("Failed to store final record {}: {e:#}", record.key());
                StageOutcome::Halt(PipelineError::Persist)
            }
        }
    }

    async fn store(&self, record: &ResumeRecord) -> anyhow::Result<()> {
        let value = serde_json::to_string(record)?;
        self.records.set(&record.key(), &value).await
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
