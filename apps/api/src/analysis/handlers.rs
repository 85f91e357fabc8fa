//! Axum route handlers for résumé submission and retrieval.

use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::analysis::listing::{get_resume, list_resumes, ResumeListing};
use crate::analysis::pipeline::{PipelineOutcome, ResumeSubmission};
use crate::analysis::status::StatusLog;
use crate::errors::AppError;
use crate::models::resume::ResumeRecord;
use crate::state::AppState;
use crate::storage::FileUpload;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct SubmissionResponse {
    pub id: Option<Uuid>,
    /// Terminal status: the completion message or an `Error: ...` line.
    pub status: String,
    pub statuses: Vec<String>,
    pub redirect: Option<String>,
}

/// Multipart field names, matching the upload form.
const FIELD_COMPANY: &str = "company-name";
const FIELD_JOB_TITLE: &str = "job-title";
const FIELD_JOB_DESCRIPTION: &str = "job-description";
const FIELD_RESUME: &str = "resume";

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/resumes
///
/// Runs the upload pipeline for one multipart submission. A pipeline halt is
/// reported in the body with 502; only malformed requests are errors.
pub async fn handle_submit_resume(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<SubmissionResponse>), AppError> {
    let submission = read_submission(multipart).await?;

    let log = StatusLog::new();
    let outcome = state.pipeline.run(submission, &log).await;

    let (status_code, id, redirect) = match &outcome {
        PipelineOutcome::Completed { id, redirect } => {
            (StatusCode::CREATED, Some(*id), Some(redirect.clone()))
        }
        PipelineOutcome::Failed { record_id, .. } => (StatusCode::BAD_GATEWAY, *record_id, None),
    };

    Ok((
        status_code,
        Json(SubmissionResponse {
            id,
            status: outcome.terminal_status(),
            statuses: log.entries(),
            redirect,
        }),
    ))
}

/// GET /api/v1/resumes
pub async fn handle_list_resumes(
    State(state): State<AppState>,
) -> Result<Json<ResumeListing>, AppError> {
    let listing = list_resumes(state.records.as_ref()).await?;
    Ok(Json(listing))
}

/// GET /api/v1/resumes/:id
pub async fn handle_get_resume(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ResumeRecord>, AppError> {
    let record = get_resume(state.records.as_ref(), id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Resume {id} not found")))?;
    Ok(Json(record))
}

/// GET /api/v1/files/*path
///
/// Streams a stored blob back, e.g. the rasterized résumé preview.
pub async fn handle_get_file(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> Result<Response, AppError> {
    let blob = state
        .files
        .read(&path)
        .await
        .map_err(|e| AppError::Storage(format!("{e:#}")))?
        .ok_or_else(|| AppError::NotFound(format!("File {path} not found")))?;

    let content_type = blob
        .content_type
        .unwrap_or_else(|| content_type_for(&path).to_string());
    Ok(([(header::CONTENT_TYPE, content_type)], blob.bytes).into_response())
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

async fn read_submission(mut multipart: Multipart) -> Result<ResumeSubmission, AppError> {
    let mut company_name = String::new();
    let mut job_title = String::new();
    let mut job_description = String::new();
    let mut file: Option<FileUpload> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            FIELD_RESUME => {
                let file_name = field.file_name().unwrap_or("resume.pdf").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Failed to read resume: {e}")))?;
                file = Some(FileUpload {
                    name: file_name,
                    content_type,
                    bytes,
                });
            }
            FIELD_COMPANY | FIELD_JOB_TITLE | FIELD_JOB_DESCRIPTION => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Failed to read {name}: {e}")))?;
                match name.as_str() {
                    FIELD_COMPANY => company_name = text,
                    FIELD_JOB_TITLE => job_title = text,
                    _ => job_description = text,
                }
            }
            _ => {}
        }
    }

    let mut file = file.ok_or_else(|| AppError::Validation("resume file is required".to_string()))?;
    validate_pdf(&file)?;
    file.content_type = "application/pdf".to_string();

    Ok(ResumeSubmission {
        company_name,
        job_title,
        job_description,
        file,
    })
}

fn validate_pdf(file: &FileUpload) -> Result<(), AppError> {
    if file.bytes.is_empty() {
        return Err(AppError::Validation("resume file is empty".to_string()));
    }
    let declared_pdf = file.content_type.eq_ignore_ascii_case("application/pdf")
        || file.name.to_ascii_lowercase().ends_with(".pdf");
    if !declared_pdf {
        return Err(AppError::Validation("resume must be a PDF".to_string()));
    }
    Ok(())
}

fn content_type_for(path: &str) -> &'static str {
    let lower = path.to_ascii_lowercase();
    if lower.ends_with(".png") {
        "image/png"
    } else if lower.ends_with(".pdf") {
        "application/pdf"
    } else {
        "application/octet-stream"
    }
}
