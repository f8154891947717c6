//! Keyword overlap scoring: measures how much of a job description's vocabulary
//! a resume covers.
//!
//! Pure-Rust, deterministic, no LLM call. Both texts are lowercased and split into
//! maximal runs of word characters; the resulting term sets are compared.

use std::collections::BTreeSet;
use std::sync::OnceLock;

use regex::Regex;

/// Distinct lowercase word tokens of a document. Ordered so that derived
/// keyword lists come out alphabetically without a separate sort.
pub type TermSet = BTreeSet<String>;

static WORD: OnceLock<Regex> = OnceLock::new();

fn word() -> &'static Regex {
    WORD.get_or_init(|| Regex::new(r"\b\w+\b").expect("word pattern is valid"))
}

/// Lowercases `text` and collects every distinct word token.
pub fn tokenize(text: &str) -> TermSet {
    let lowered = text.to_lowercase();
    word()
        .find_iter(&lowered)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Job description terms that never appear in the resume, alphabetically.
pub fn missing_keywords(cv_text: &str, jd_text: &str) -> Vec<String> {
    let cv_terms = tokenize(cv_text);
    tokenize(jd_text)
        .into_iter()
        .filter(|term| !cv_terms.contains(term))
        .collect()
}

/// Percentage (0 – 100, truncated) of job description terms present in the resume.
///
/// An empty job description scores 0.
pub fn fit_score(cv_text: &str, jd_text: &str) -> u8 {
    let jd_terms = tokenize(jd_text);
    if jd_terms.is_empty() {
        return 0;
    }

    let cv_terms = tokenize(cv_text);
    let matched = jd_terms.intersection(&cv_terms).count();

    // matched <= jd_terms.len(), so the quotient never exceeds 100
    (matched * 100 / jd_terms.len()) as u8
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
