// Prompt constants for resume analysis.

/// System prompt for the per-candidate assessment.
pub const ANALYSIS_SYSTEM: &str = "You are an expert HR AI. Analyze resumes objectively.";

/// Analysis prompt template. Replace `{cv_text}` and `{jd_text}` before sending.
pub const ANALYSIS_PROMPT_TEMPLATE: &str = "Resume:
{cv_text}

Job Description:
{jd_text}

Provide a summary of fit, strengths, weaknesses, and suggestions for improvement.";

/// Fills the analysis template with both documents.
pub fn build_analysis_prompt(cv_text: &str, jd_text: &str) -> String {
    // jd first so a resume that happens to contain "{jd_text}" is not expanded
    ANALYSIS_PROMPT_TEMPLATE
        .replacen("{jd_text}", jd_text, 1)
        .replacen("{cv_text}", cv_text, 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_embeds_both_documents_in_order() {
        let prompt = build_analysis_prompt("CV BODY", "JD BODY");
        let cv_at = prompt.find("CV BODY").unwrap();
        let jd_at = prompt.find("JD BODY").unwrap();
        assert!(prompt.starts_with("Resume:\nCV BODY"));
        assert!(cv_at < jd_at);
        assert!(prompt.ends_with("suggestions for improvement."));
    }

    #[test]
    fn test_placeholders_in_documents_are_left_alone() {
        let prompt = build_analysis_prompt("literal {jd_text} in resume", "JD");
        assert!(prompt.contains("literal {jd_text} in resume"));
    }
}
