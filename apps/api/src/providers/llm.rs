//! Default parse/score collaborators backed by the LLM client.

use std::path::Path;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::llm_client::{LlmClient, LlmError};
use crate::models::resume::ParsedResume;
use crate::pipeline::StageError;
use crate::providers::prompts::{
    MATCH_SCORE_PROMPT_TEMPLATE, MATCH_SCORE_SYSTEM, RESUME_PARSE_PROMPT_TEMPLATE,
    RESUME_PARSE_SYSTEM,
};
use crate::providers::{MatchResult, MatchScorer, ResumeParser};

fn stage_error(err: LlmError) -> StageError {
    match err {
        LlmError::Parse(e) => StageError::Malformed(format!("unparsable LLM output: {e}")),
        LlmError::EmptyContent => StageError::Malformed(err.to_string()),
        other => StageError::Provider(other.to_string()),
    }
}

/// Extracts PDF text, then asks the LLM to structure it.
pub struct LlmResumeParser {
    llm: LlmClient,
}

impl LlmResumeParser {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl ResumeParser for LlmResumeParser {
    async fn parse(&self, file: &Path) -> Result<ParsedResume, StageError> {
        let text = extract_pdf_text(file).await?;
        debug!("Extracted {} chars from {}", text.len(), file.display());

        let prompt = RESUME_PARSE_PROMPT_TEMPLATE.replace("{resume_text}", &text);
        let parsed = self
            .llm
            .call_json::<ParsedResume>(&prompt, RESUME_PARSE_SYSTEM)
            .await
            .map_err(stage_error)?;

        info!(
            "Parsed resume {} (name: {})",
            file.display(),
            parsed.display_name().unwrap_or("unknown")
        );
        Ok(parsed)
    }
}

/// Pulls all text out of a PDF on a blocking thread — the extraction is
/// CPU-bound and must not stall the runtime.
async fn extract_pdf_text(file: &Path) -> Result<String, StageError> {
    let path = file.to_path_buf();
    let text = tokio::task::spawn_blocking(move || pdf_extract::extract_text(&path))
        .await
        .map_err(|e| StageError::Provider(format!("extraction task failed: {e}")))?
        .map_err(|e| StageError::Provider(format!("failed to extract text from PDF: {e}")))?;

    if text.trim().is_empty() {
        return Err(StageError::Malformed(format!(
            "no text extracted from {}",
            file.display()
        )));
    }
    Ok(text)
}

/// Scores a parsed résumé against a job description via the LLM.
pub struct LlmMatchScorer {
    llm: LlmClient,
}

impl LlmMatchScorer {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl MatchScorer for LlmMatchScorer {
    async fn score(
        &self,
        resume: &ParsedResume,
        job_description: &str,
    ) -> Result<MatchResult, StageError> {
        let resume_json = serde_json::to_string_pretty(resume)
            .map_err(|e| StageError::Malformed(format!("unserializable resume: {e}")))?;

        let prompt = MATCH_SCORE_PROMPT_TEMPLATE
            .replace("{resume_json}", &resume_json)
            .replace("{job_description}", job_description);

        let result = self
            .llm
            .call_json::<MatchResult>(&prompt, MATCH_SCORE_SYSTEM)
            .await
            .map_err(stage_error)?;

        if !(0.0..=100.0).contains(&result.score) {
            return Err(StageError::Malformed(format!(
                "match_score {} outside 0-100",
                result.score
            )));
        }
        Ok(result)
    }
}
