//! Candidate evaluation: keyword fit plus an LLM-written assessment for one resume.

use serde::Serialize;
use tracing::warn;

use crate::llm_client::CompletionClient;
use crate::matching::keywords::{fit_score, missing_keywords};
use crate::matching::prompts::{build_analysis_prompt, ANALYSIS_SYSTEM};

const MALFORMED_RESPONSE_TEXT: &str = "Error: Unexpected response from LLM.";

/// Outcome of asking the LLM to assess a resume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum Analysis {
    Success(String),
    ProviderFailure(String),
    /// The provider answered, but without a first choice carrying message content.
    MalformedResponse,
}

impl Analysis {
    /// Display text: the assessment itself, or an `Error: ...` line.
    pub fn text(&self) -> String {
        match self {
            Analysis::Success(text) => text.clone(),
            Analysis::ProviderFailure(reason) => format!("Error: {reason}"),
            Analysis::MalformedResponse => MALFORMED_RESPONSE_TEXT.to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Analysis::Success(_))
    }
}

/// Evaluation of a single resume against the job description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EvaluationResult {
    /// 1-based position of the resume in the submitted batch.
    pub index: usize,
    pub missing_keywords: Vec<String>,
    pub fit_score: u8,
    /// `None` in keyword-only mode.
    pub analysis: Option<Analysis>,
    pub analysis_text: Option<String>,
}

impl EvaluationResult {
    fn new(
        index: usize,
        missing_keywords: Vec<String>,
        fit_score: u8,
        analysis: Option<Analysis>,
    ) -> Self {
        let analysis_text = analysis.as_ref().map(Analysis::text);
        Self {
            index,
            missing_keywords,
            fit_score,
            analysis,
            analysis_text,
        }
    }
}

/// Scores resumes and, when a completion client is configured, asks it for a critique.
#[derive(Clone)]
pub struct CandidateEvaluator {
    completion: Option<CompletionClient>,
}

impl CandidateEvaluator {
    pub fn new(completion: Option<CompletionClient>) -> Self {
        Self { completion }
    }

    /// Evaluator that never calls an LLM.
    pub fn keyword_only() -> Self {
        Self { completion: None }
    }

    pub fn llm_enabled(&self) -> bool {
        self.completion.is_some()
    }

    /// Evaluates one resume. LLM failures end up in `analysis`, never as an error.
    pub async fn evaluate(
        &self,
        index: usize,
        cv_text: &str,
        jd_text: &str,
    ) -> EvaluationResult {
        let missing = missing_keywords(cv_text, jd_text);
        let score = fit_score(cv_text, jd_text);

        let analysis = match &self.completion {
            Some(client) => Some(analyze(client, cv_text, jd_text).await),
            None => None,
        };

        EvaluationResult::new(index, missing, score, analysis)
    }
}

async fn analyze(client: &CompletionClient, cv_text: &str, jd_text: &str) -> Analysis {
    let prompt = build_analysis_prompt(cv_text, jd_text);

    match client.complete(ANALYSIS_SYSTEM, &prompt).await {
        Ok(completion) => match completion.text() {
            Some(text) => Analysis::Success(text.to_string()),
            None => {
                warn!("LLM response had no message content");
                Analysis::MalformedResponse
            }
        },
        Err(e) => Analysis::ProviderFailure(e.to_string()),
    }
}
