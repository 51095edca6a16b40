//! External collaborator seams: résumé parsing and match scoring.
//!
//! The pipeline treats both as opaque asynchronous calls that may fail with
//! a string reason — it never assumes in-process execution. The default
//! implementations live in `llm.rs`; tests substitute their own.

pub mod llm;
pub mod prompts;

use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::models::resume::ParsedResume;
use crate::pipeline::StageError;

/// Score and explanation for one (résumé, job description) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchResult {
    /// 0–100, higher is a better fit.
    #[serde(rename = "match_score")]
    pub score: f64,
    pub explanation: String,
}

/// Turns a stored résumé file into a structured record.
#[async_trait]
pub trait ResumeParser: Send + Sync {
    async fn parse(&self, file: &Path) -> Result<ParsedResume, StageError>;
}

/// Scores a parsed résumé against a job description.
#[async_trait]
pub trait MatchScorer: Send + Sync {
    async fn score(
        &self,
        resume: &ParsedResume,
        job_description: &str,
    ) -> Result<MatchResult, StageError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_result_wire_name_is_match_score() {
        let result: MatchResult =
            serde_json::from_str(r#"{"match_score": 87.5, "explanation": "strong overlap"}"#)
                .unwrap();
        assert_eq!(result.score, 87.5);

        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("\"match_score\":87.5"));
    }
}
