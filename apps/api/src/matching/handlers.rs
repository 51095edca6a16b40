//! Axum route handlers for the batch matching API.

use axum::{
    extract::{Multipart, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::artifacts;
use crate::errors::AppError;
use crate::matching::orchestrator::{
    match_batch, submit_batch, BatchStats, MatchFailure, MatchStats, ProcessedItem, RankedEntry,
    UploadItem,
};
use crate::pipeline::retry;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct SubmitBatchResponse {
    pub success: bool,
    pub message: String,
    pub run_id: String,
    pub processed: Vec<ProcessedItem>,
    pub parsed_filenames: Vec<String>,
    pub stats: BatchStats,
}

#[derive(Debug, Deserialize)]
pub struct MatchBatchRequest {
    pub filenames: Vec<String>,
    pub job_description: String,
    pub run_id: String,
}

#[derive(Debug, Serialize)]
pub struct MatchBatchResponse {
    pub success: bool,
    pub message: String,
    pub run_id: String,
    pub results: Vec<RankedEntry>,
    pub errors: Vec<MatchFailure>,
    pub stats: MatchStats,
}

#[derive(Debug, Serialize)]
pub struct ScoreOneResponse {
    pub filename: String,
    pub candidate_name: String,
    pub match_score: f64,
    pub explanation: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/resumes/batch
///
/// Multipart upload: repeated `resumes` file fields plus a `job_description`
/// text field. Runs the parse stage over all uploads inside a fresh batch
/// run and returns per-item outcomes plus the stems that parsed.
pub async fn handle_submit_batch(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<SubmitBatchResponse>, AppError> {
    let mut items: Vec<UploadItem> = Vec::new();
    let mut job_description = String::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("invalid multipart payload: {e}")))?
    {
        // Copy the field name out before `bytes()`/`text()` consume the field.
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "resumes" => {
                let filename = field
                    .file_name()
                    .map(str::to_string)
                    .ok_or_else(|| {
                        AppError::Validation("resume field is missing a filename".to_string())
                    })?;
                if !artifacts::is_safe_component(&filename) {
                    return Err(AppError::Validation(format!(
                        "unsafe resume filename: {filename}"
                    )));
                }
                let bytes = field.bytes().await.map_err(|e| {
                    AppError::Validation(format!("failed to read upload {filename}: {e}"))
                })?;
                items.push(UploadItem { filename, bytes });
            }
            "job_description" => {
                job_description = field.text().await.map_err(|e| {
                    AppError::Validation(format!("failed to read job description: {e}"))
                })?;
            }
            _ => {}
        }
    }

    if items.is_empty() || job_description.trim().is_empty() {
        return Err(AppError::Validation(
            "Resumes and job description are required".to_string(),
        ));
    }

    info!("Received batch of {} resumes", items.len());

    let outcome = submit_batch(state.parser.as_ref(), &state.artifacts, &state.retry, items).await?;

    Ok(Json(SubmitBatchResponse {
        success: true,
        message: format!(
            "Successfully processed {} out of {} resumes",
            outcome.stats.successful, outcome.stats.total
        ),
        run_id: outcome.run_id,
        processed: outcome.items,
        parsed_filenames: outcome.parsed_filenames,
        stats: outcome.stats,
    }))
}

/// POST /api/v1/match/batch
///
/// Scores previously parsed artifacts against a job description and returns
/// candidates ranked by score, descending, with failures listed separately.
pub async fn handle_match_batch(
    State(state): State<AppState>,
    Json(request): Json<MatchBatchRequest>,
) -> Result<Json<MatchBatchResponse>, AppError> {
    if request.filenames.is_empty() || request.job_description.trim().is_empty() {
        return Err(AppError::Validation(
            "Resume filenames and job description are required".to_string(),
        ));
    }
    if !artifacts::is_safe_component(&request.run_id) {
        return Err(AppError::Validation(format!(
            "invalid run id: {}",
            request.run_id
        )));
    }
    if let Some(bad) = request
        .filenames
        .iter()
        .find(|f| !artifacts::is_safe_component(f))
    {
        return Err(AppError::Validation(format!("unsafe filename: {bad}")));
    }

    let outcome = match_batch(
        state.scorer.as_ref(),
        &state.artifacts,
        &state.retry,
        request.filenames,
        &request.job_description,
        &request.run_id,
    )
    .await?;

    Ok(Json(MatchBatchResponse {
        success: true,
        message: format!(
            "Successfully matched {} out of {} resumes",
            outcome.stats.successful, outcome.stats.total
        ),
        run_id: outcome.run_id,
        results: outcome.results,
        errors: outcome.errors,
        stats: outcome.stats,
    }))
}

/// POST /api/v1/resumes
///
/// Single-shot convenience: upload one résumé plus a job description, get
/// its score immediately. No batch namespace is created — the upload lives
/// in a scratch directory for the duration of the call.
pub async fn handle_score_one(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ScoreOneResponse>, AppError> {
    let mut upload: Option<UploadItem> = None;
    let mut job_description = String::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("invalid multipart payload: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "resume" => {
                let filename = field
                    .file_name()
                    .map(str::to_string)
                    .ok_or_else(|| {
                        AppError::Validation("resume field is missing a filename".to_string())
                    })?;
                if !artifacts::is_safe_component(&filename) {
                    return Err(AppError::Validation(format!(
                        "unsafe resume filename: {filename}"
                    )));
                }
                let bytes = field.bytes().await.map_err(|e| {
                    AppError::Validation(format!("failed to read upload {filename}: {e}"))
                })?;
                upload = Some(UploadItem { filename, bytes });
            }
            "job_description" => {
                job_description = field.text().await.map_err(|e| {
                    AppError::Validation(format!("failed to read job description: {e}"))
                })?;
            }
            _ => {}
        }
    }

    let Some(upload) = upload else {
        return Err(AppError::Validation(
            "Resume and job description are required".to_string(),
        ));
    };
    if job_description.trim().is_empty() {
        return Err(AppError::Validation(
            "Resume and job description are required".to_string(),
        ));
    }

    let scratch = tempfile::tempdir()
        .map_err(|e| AppError::Internal(anyhow::anyhow!("failed to create scratch dir: {e}")))?;
    let path = scratch.path().join(&upload.filename);
    tokio::fs::write(&path, &upload.bytes)
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("failed to store upload: {e}")))?;

    let parsed = retry::invoke(&state.retry, || state.parser.parse(&path))
        .await
        .map_err(|e| AppError::Llm(e.to_string()))?;

    let result = retry::invoke(&state.retry, || {
        state.scorer.score(&parsed, &job_description)
    })
    .await
    .map_err(|e| AppError::Llm(e.to_string()))?;

    let candidate_name = parsed
        .display_name()
        .unwrap_or(artifacts::parsed_stem(&upload.filename))
        .to_string();

    Ok(Json(ScoreOneResponse {
        filename: upload.filename,
        candidate_name,
        match_score: result.score,
        explanation: result.explanation,
    }))
}
