//! Orchestration facade — composes the parse stage and the score stage over
//! a shared batch-run namespace and assembles the ranked response.
//!
//! Both operations are idempotent with respect to caller retry only in the
//! sense that re-invoking them creates a *new* batch run (no dedup); callers
//! retrying blindly will duplicate artifacts.

use bytes::Bytes;
use serde::Serialize;
use tracing::info;

use crate::artifacts::{self, ArtifactStore};
use crate::errors::AppError;
use crate::models::resume::ParsedResume;
use crate::pipeline::backoff::RetryPolicy;
use crate::pipeline::planner::BatchPlan;
use crate::pipeline::runner::{run_stage, Stage};
use crate::pipeline::{StageError, StageItem};
use crate::providers::{MatchScorer, ResumeParser};

use async_trait::async_trait;

// ────────────────────────────────────────────────────────────────────────────
// Work items
// ────────────────────────────────────────────────────────────────────────────

/// One uploaded résumé queued for the parse stage.
#[derive(Debug, Clone)]
pub struct UploadItem {
    pub filename: String,
    pub bytes: Bytes,
}

impl StageItem for UploadItem {
    fn filename(&self) -> &str {
        &self.filename
    }
}

/// One parsed-filename stem queued for the score stage.
#[derive(Debug, Clone)]
pub struct MatchItem {
    pub filename: String,
}

impl StageItem for MatchItem {
    fn filename(&self) -> &str {
        &self.filename
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Outcome types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct BatchStats {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub chunks: usize,
}

#[derive(Debug, Serialize)]
pub struct MatchStats {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
}

/// Per-item outcome of the parse stage, in submission order.
#[derive(Debug, Serialize)]
pub struct ProcessedItem {
    pub filename: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parsed_filename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug)]
pub struct SubmitOutcome {
    pub run_id: String,
    pub items: Vec<ProcessedItem>,
    pub parsed_filenames: Vec<String>,
    pub stats: BatchStats,
}

/// One ranked candidate. Constructed fresh per run, reordered but never
/// mutated afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct RankedEntry {
    pub filename: String,
    pub candidate_name: String,
    pub match_score: f64,
    pub explanation: String,
    pub run_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchFailure {
    pub filename: String,
    pub error: String,
    pub run_id: String,
}

#[derive(Debug)]
pub struct MatchOutcome {
    pub run_id: String,
    pub results: Vec<RankedEntry>,
    pub errors: Vec<MatchFailure>,
    pub stats: MatchStats,
}

// ────────────────────────────────────────────────────────────────────────────
// Stages
// ────────────────────────────────────────────────────────────────────────────

/// Parse stage: persist the upload, parse it, persist the parsed artifact.
struct ParseStage<'a> {
    parser: &'a dyn ResumeParser,
    artifacts: &'a ArtifactStore,
    run_id: &'a str,
}

#[async_trait]
impl<'a> Stage for ParseStage<'a> {
    type Item = UploadItem;
    type Output = String;

    fn name(&self) -> &'static str {
        "parse"
    }

    async fn process(&self, item: &UploadItem) -> Result<String, StageError> {
        let uploaded = self
            .artifacts
            .write_upload(self.run_id, &item.filename, &item.bytes)
            .await?;

        let parsed = self.parser.parse(&uploaded).await?;

        let stem = artifacts::parsed_stem(&item.filename);
        self.artifacts
            .write_parsed(self.run_id, stem, &parsed)
            .await?;

        Ok(stem.to_string())
    }
}

/// Scored candidate before ranking.
#[derive(Debug, Clone)]
pub struct ScoredCandidate {
    pub candidate_name: String,
    pub score: f64,
    pub explanation: String,
}

/// Score stage: resolve the parsed artifact (fail fast when absent), score
/// it against the job description, label with the extracted name.
struct ScoreStage<'a> {
    scorer: &'a dyn MatchScorer,
    artifacts: &'a ArtifactStore,
    run_id: &'a str,
    job_description: &'a str,
}

#[async_trait]
impl<'a> Stage for ScoreStage<'a> {
    type Item = MatchItem;
    type Output = ScoredCandidate;

    fn name(&self) -> &'static str {
        "score"
    }

    async fn process(&self, item: &MatchItem) -> Result<ScoredCandidate, StageError> {
        let path = self.artifacts.parsed_path(self.run_id, &item.filename);
        let parsed: ParsedResume = self.artifacts.read_json(&path).await?;

        let result = self.scorer.score(&parsed, self.job_description).await?;

        let candidate_name = parsed
            .display_name()
            .unwrap_or(&item.filename)
            .to_string();

        Ok(ScoredCandidate {
            candidate_name,
            score: result.score,
            explanation: result.explanation,
        })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Facade operations
// ────────────────────────────────────────────────────────────────────────────

/// Runs the parse stage over a batch of uploads inside a fresh run
/// namespace.
///
/// Per-item failures are aggregated, never thrown; the call itself fails
/// only when every single item failed to parse.
pub async fn submit_batch(
    parser: &dyn ResumeParser,
    artifacts: &ArtifactStore,
    policy: &RetryPolicy,
    items: Vec<UploadItem>,
) -> Result<SubmitOutcome, AppError> {
    let total = items.len();
    let plan = BatchPlan::for_total(total);
    info!("Using chunk size {} for {} resumes", plan.chunk_size, total);

    let run_id = artifacts.new_run_id();
    artifacts
        .create_run_dirs(&run_id)
        .await
        .map_err(anyhow::Error::new)?;
    info!("Created batch run {run_id}");

    let stage = ParseStage {
        parser,
        artifacts,
        run_id: &run_id,
    };
    let report = run_stage(&stage, &items, &plan, policy).await;

    if report.is_total_failure() {
        return Err(AppError::AllFailed(
            "All resumes failed to process".to_string(),
        ));
    }

    let parsed_filenames: Vec<String> = report
        .successes()
        .map(|(_, stem)| stem.clone())
        .collect();

    let items = report
        .outcomes
        .iter()
        .map(|o| match &o.result {
            Ok(stem) => ProcessedItem {
                filename: o.filename.clone(),
                success: true,
                parsed_filename: Some(stem.clone()),
                error: None,
            },
            Err(reason) => ProcessedItem {
                filename: o.filename.clone(),
                success: false,
                parsed_filename: None,
                error: Some(reason.clone()),
            },
        })
        .collect();

    let stats = BatchStats {
        total,
        successful: report.successful(),
        failed: report.failed(),
        chunks: plan.chunk_count(total),
    };
    info!(
        "Batch parse complete for {run_id}: {}/{} succeeded",
        stats.successful, stats.total
    );

    Ok(SubmitOutcome {
        run_id,
        items,
        parsed_filenames,
        stats,
    })
}

/// Runs the score stage over previously parsed artifacts and returns the
/// candidates ranked by score, descending.
///
/// The sort is stable, so equal scores keep submission order. The call
/// fails only when every single item failed to score.
pub async fn match_batch(
    scorer: &dyn MatchScorer,
    artifacts: &ArtifactStore,
    policy: &RetryPolicy,
    filenames: Vec<String>,
    job_description: &str,
    run_id: &str,
) -> Result<MatchOutcome, AppError> {
    let total = filenames.len();
    let plan = BatchPlan::for_total(total);
    info!(
        "Starting batch matching for {total} resumes in run {run_id} (chunk size {})",
        plan.chunk_size
    );

    let items: Vec<MatchItem> = filenames
        .into_iter()
        .map(|filename| MatchItem { filename })
        .collect();

    let stage = ScoreStage {
        scorer,
        artifacts,
        run_id,
        job_description,
    };
    let report = run_stage(&stage, &items, &plan, policy).await;

    if report.is_total_failure() {
        return Err(AppError::AllFailed(
            "All resumes failed to match".to_string(),
        ));
    }

    let mut results: Vec<RankedEntry> = report
        .successes()
        .map(|(filename, scored)| RankedEntry {
            filename: filename.to_string(),
            candidate_name: scored.candidate_name.clone(),
            match_score: scored.score,
            explanation: scored.explanation.clone(),
            run_id: run_id.to_string(),
        })
        .collect();
    results.sort_by(|a, b| b.match_score.total_cmp(&a.match_score));

    let errors = report
        .failures()
        .map(|(filename, reason)| MatchFailure {
            filename: filename.to_string(),
            error: reason.to_string(),
            run_id: run_id.to_string(),
        })
        .collect();

    let stats = MatchStats {
        total,
        successful: report.successful(),
        failed: report.failed(),
    };
    info!(
        "Batch matching complete for {run_id}: {}/{} succeeded",
        stats.successful, stats.total
    );

    Ok(MatchOutcome {
        run_id: run_id.to_string(),
        results,
        errors,
        stats,
    })
}
