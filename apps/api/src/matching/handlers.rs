//! Axum route handlers for the Matching API.

use axum::{
    extract::{Multipart, State},
    Json,
};
use bytes::Bytes;
use serde::Serialize;
use tracing::{debug, info};

use crate::errors::AppError;
use crate::extraction::{extract_text, DocumentFormat};
use crate::matching::evaluator::EvaluationResult;
use crate::matching::ranker::rank_all;
use crate::state::AppState;

const RESUMES_FIELD: &str = "resumes";
const JOB_DESCRIPTION_FIELD: &str = "job_description";

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

struct UploadedFile {
    filename: String,
    content: Bytes,
}

#[derive(Debug, Serialize)]
pub struct ParsedUpload {
    pub filename: String,
    pub format: DocumentFormat,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub provider: &'static str,
    pub deployment: String,
    pub llm_enabled: bool,
    pub job_description: ParsedUpload,
    pub resumes: Vec<ParsedUpload>,
    /// Ranked by fit score, highest first.
    pub results: Vec<EvaluationResult>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/analyze
///
/// Multipart upload of one or more `resumes` files and one `job_description` file
/// (.pdf, .docx or .txt). Every resume is scored against the job description and,
/// when an LLM is configured, assessed by it. Returns the ranked batch.
pub async fn handle_analyze(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<AnalyzeResponse>, AppError> {
    let mut resume_files = Vec::new();
    let mut jd_file: Option<UploadedFile> = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        let filename = field.file_name().unwrap_or_default().to_string();
        let content = field.bytes().await?;

        // browsers send an empty part for an untouched file input
        if filename.is_empty() && content.is_empty() {
            continue;
        }

        let upload = UploadedFile { filename, content };
        match name.as_str() {
            RESUMES_FIELD => resume_files.push(upload),
            JOB_DESCRIPTION_FIELD if jd_file.is_some() => {
                return Err(AppError::Validation(
                    "Upload exactly one job description.".to_string(),
                ));
            }
            JOB_DESCRIPTION_FIELD => jd_file = Some(upload),
            other => debug!("Ignoring unexpected multipart field '{other}'"),
        }
    }

    let jd_file = match jd_file {
        Some(jd) if !resume_files.is_empty() => jd,
        _ => {
            return Err(AppError::Validation(
                "Please upload at least one CV and a job description.".to_string(),
            ))
        }
    };

    let (jd_format, jd_text) = extract_off_thread(&jd_file.filename, jd_file.content).await?;
    info!("Job description parsed as {jd_format}");

    let mut resumes = Vec::with_capacity(resume_files.len());
    let mut cv_texts = Vec::with_capacity(resume_files.len());
    for file in resume_files {
        let (format, text) = extract_off_thread(&file.filename, file.content).await?;
        info!("Resume '{}' parsed as {format}", file.filename);
        resumes.push(ParsedUpload {
            filename: file.filename,
            format,
        });
        cv_texts.push(text);
    }

    let llm_enabled = state.evaluator.llm_enabled();
    if !llm_enabled {
        info!("LLM not configured; returning keyword analysis only");
    }

    let results = rank_all(&state.evaluator, &cv_texts, &jd_text).await;

    Ok(Json(AnalyzeResponse {
        provider: state.config.provider().as_str(),
        deployment: state.config.deployment_label().to_string(),
        llm_enabled,
        job_description: ParsedUpload {
            filename: jd_file.filename,
            format: jd_format,
        },
        resumes,
        results,
    }))
}

/// Runs `extract_text` on the blocking pool; PDF and DOCX parsing is CPU-bound.
async fn extract_off_thread(
    filename: &str,
    content: Bytes,
) -> Result<(DocumentFormat, String), AppError> {
    let name = filename.to_string();
    let extracted = tokio::task::spawn_blocking(move || extract_text(&name, &content))
        .await
        .map_err(|e| {
            AppError::Internal(anyhow::anyhow!("spawn_blocking failed in extraction: {e}"))
        })??;
    Ok(extracted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::ExtractionError;

    #[tokio::test]
    async fn test_extract_off_thread_returns_text() {
        let (format, text) = extract_off_thread("jd.txt", Bytes::from_static(b"Python SQL"))
            .await
            .unwrap();
        assert_eq!(format, DocumentFormat::Txt);
        assert_eq!(text, "Python SQL");
    }

    #[tokio::test]
    async fn test_extract_off_thread_propagates_extraction_error() {
        let err = extract_off_thread("cv.rtf", Bytes::from_static(b"Python"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::Extraction(ExtractionError::UnsupportedFormat { .. })
        ));
    }
}
