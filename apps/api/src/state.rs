use std::sync::Arc;

use crate::artifacts::ArtifactStore;
use crate::pipeline::backoff::RetryPolicy;
use crate::providers::{MatchScorer, ResumeParser};

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Pluggable parse collaborator. Default: LlmResumeParser.
    pub parser: Arc<dyn ResumeParser>,
    /// Pluggable score collaborator. Default: LlmMatchScorer.
    pub scorer: Arc<dyn MatchScorer>,
    pub artifacts: ArtifactStore,
    pub retry: RetryPolicy,
}
