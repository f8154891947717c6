use crate::config::Config;
use crate::matching::evaluator::CandidateEvaluator;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Keyword-only when `config.api_ready()` is false.
    pub evaluator: CandidateEvaluator,
}
