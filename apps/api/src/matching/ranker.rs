//! Batch ranking: evaluates every resume against one job description and orders
//! the results by fit score.

use tracing::info;

use crate::matching::evaluator::{CandidateEvaluator, EvaluationResult};

/// Evaluates resumes one after another (1-based indices, input order) and sorts
/// the results by fit score, highest first. Equal scores keep their input order.
///
/// Always returns exactly one result per resume.
pub async fn rank_all(
    evaluator: &CandidateEvaluator,
    cv_texts: &[String],
    jd_text: &str,
) -> Vec<EvaluationResult> {
    let mut results = Vec::with_capacity(cv_texts.len());

    for (idx, cv_text) in cv_texts.iter().enumerate() {
        results.push(evaluator.evaluate(idx + 1, cv_text, jd_text).await);
    }

    // sort_by is stable
    results.sort_by(|a, b| b.fit_score.cmp(&a.fit_score));

    let analysed = results
        .iter()
        .filter(|r| r.analysis.as_ref().is_some_and(|a| a.is_success()))
        .count();
    info!(
        "Ranked {} resumes (top score {}, {} LLM analyses succeeded)",
        results.len(),
        results.first().map(|r| r.fit_score).unwrap_or(0),
        analysed
    );

    results
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::llm_client::testing::ScriptedProvider;
    use crate::llm_client::{ChatCompletion, CompletionClient, ProviderError};
    use crate::matching::evaluator::Analysis;

    const JD: &str = "rust tokio axum serde";

    fn texts(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_sorted_by_score_descending() {
        let cvs = texts(&["rust", "rust tokio axum serde", "rust tokio"]);

        let ranked = rank_all(&CandidateEvaluator::keyword_only(), &cvs, JD).await;

        let order: Vec<(usize, u8)> = ranked.iter().map(|r| (r.index, r.fit_score)).collect();
        assert_eq!(order, vec![(2, 100), (3, 50), (1, 25)]);
    }

    #[tokio::test]
    async fn test_ties_keep_input_order() {
        let cvs = texts(&["tokio", "rust serde", "axum", "serde rust"]);

        let ranked = rank_all(&CandidateEvaluator::keyword_only(), &cvs, JD).await;

        let indices: Vec<usize> = ranked.iter().map(|r| r.index).collect();
        assert_eq!(indices, vec![2, 4, 1, 3]);
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let ranked = rank_all(&CandidateEvaluator::keyword_only(), &[], JD).await;
        assert!(ranked.is_empty());
    }

    #[tokio::test]
    async fn test_one_failure_does_not_block_others() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Ok(ChatCompletion::from_text("first")),
            Err(ProviderError::Api {
                status: 500,
                message: "upstream down".to_string(),
            }),
            Ok(ChatCompletion::from_text("third")),
        ]));
        let evaluator = CandidateEvaluator::new(Some(CompletionClient::new(
            provider.clone(),
            "gpt-test",
        )));
        let cvs = texts(&["rust", "rust tokio axum", "rust tokio"]);

        let ranked = rank_all(&evaluator, &cvs, JD).await;

        assert_eq!(ranked.len(), 3);
        assert_eq!(provider.call_count(), 3);
        assert_eq!(ranked[0].index, 2);
        assert!(matches!(
            ranked[0].analysis,
            Some(Analysis::ProviderFailure(_))
        ));
        assert_eq!(ranked[1].analysis_text.as_deref(), Some("third"));
        assert_eq!(ranked[2].analysis_text.as_deref(), Some("first"));
    }

    #[tokio::test]
    async fn test_empty_jd_keeps_input_order() {
        let cvs = texts(&["a", "b", "c"]);

        let ranked = rank_all(&CandidateEvaluator::keyword_only(), &cvs, "").await;

        assert!(ranked.iter().all(|r| r.fit_score == 0));
        assert!(ranked.iter().all(|r| r.missing_keywords.is_empty()));
        let indices: Vec<usize> = ranked.iter().map(|r| r.index).collect();
        assert_eq!(indices, vec![1, 2, 3]);
    }
}
