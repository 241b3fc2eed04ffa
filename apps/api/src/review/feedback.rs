//! The feedback data contract: the JSON object produced by the model,
//! persisted as jsonb, and rendered by the dashboard and rating pages.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured critique of one CV.
///
/// Only `overall_score` and `summary` are required of the model; every other
/// field defaults to empty when omitted, and the UI tolerates that.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CvFeedback {
    pub overall_score: i64,
    pub summary: String,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub areas_for_improvement: Vec<String>,
    #[serde(default)]
    pub specific_suggestions: Vec<Suggestion>,
    #[serde(default)]
    pub formatting_feedback: String,
    #[serde(default)]
    pub keyword_analysis: KeywordAnalysis,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub section: String,
    pub suggestion: String,
    pub impact: Impact,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Impact {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeywordAnalysis {
    #[serde(default)]
    pub missing_keywords: Vec<String>,
    #[serde(default)]
    pub suggested_additions: Vec<String>,
}

#[derive(Debug, Error)]
pub enum FeedbackError {
    #[error("no JSON object found in model response")]
    NoJsonObject,

    #[error("model response is not valid feedback JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("feedback failed validation: {0}")]
    Invalid(String),
}

impl CvFeedback {
    /// Minimal post-parse validation: a usable score and a non-empty summary.
    /// Everything else is passed through to the UI as-is.
    pub fn validate(&self) -> Result<(), FeedbackError> {
        if !(1..=10).contains(&self.overall_score) {
            return Err(FeedbackError::Invalid(format!(
                "overall_score {} is outside 1-10",
                self.overall_score
            )));
        }
        if self.summary.trim().is_empty() {
            return Err(FeedbackError::Invalid("summary is empty".to_string()));
        }
        Ok(())
    }
}

/// Parses the model's raw text response into validated feedback.
///
/// Models do not reliably return bare JSON, so parsing is a three-stage
/// fallback chain:
///   1. direct parse of the trimmed response,
///   2. parse after stripping markdown code fences,
///   3. parse of the first top-level `{...}` block.
pub fn parse_feedback(raw: &str) -> Result<CvFeedback, FeedbackError> {
    let trimmed = raw.trim();

    let feedback = match serde_json::from_str::<CvFeedback>(trimmed) {
        Ok(f) => f,
        Err(_) => {
            let stripped = strip_code_fences(trimmed);
            match serde_json::from_str::<CvFeedback>(stripped) {
                Ok(f) => f,
                Err(_) => {
                    let block =
                        extract_json_object(stripped).ok_or(FeedbackError::NoJsonObject)?;
                    serde_json::from_str::<CvFeedback>(block)?
                }
            }
        }
    };

    feedback.validate()?;
    Ok(feedback)
}

/// Strips ```json ... ``` or ``` ... ``` code fences from model output.
fn strip_code_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}

/// Returns the outermost `{...}` span, greedy from the first `{` to the last
/// `}`, or `None` when the text holds no such span.
fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end > start {
        Some(&text[start..=end])
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"{"overall_score": 7, "summary": "Solid CV overall."}"#;

    fn full_feedback_json() -> String {
        r#"{
            "overall_score": 8,
            "summary": "Strong profile with quantified impact.",
            "strengths": ["Clear metrics", "Good progression"],
            "areas_for_improvement": ["Summary too long", "No keywords section"],
            "specific_suggestions": [
                {"section": "Experience", "suggestion": "Lead with outcomes", "impact": "high"},
                {"section": "Skills", "suggestion": "Group by category", "impact": "low"}
            ],
            "formatting_feedback": "Two-column layout hurts ATS parsing.",
            "keyword_analysis": {
                "missing_keywords": ["Kubernetes", "CI/CD"],
                "suggested_additions": ["Add cloud platforms"]
            }
        }"#
        .to_string()
    }

    #[test]
    fn test_stage1_direct_parse() {
        let feedback = parse_feedback(MINIMAL).unwrap();
        assert_eq!(feedback.overall_score, 7);
        assert_eq!(feedback.summary, "Solid CV overall.");
    }

    #[test]
    fn test_stage2_fenced_with_json_tag() {
        let raw = format!("```json\n{MINIMAL}\n```");
        assert_eq!(parse_feedback(&raw).unwrap().overall_score, 7);
    }

    #[test]
    fn test_stage2_fenced_without_tag() {
        let raw = format!("```\n{MINIMAL}\n```");
        assert_eq!(parse_feedback(&raw).unwrap().overall_score, 7);
    }

    #[test]
    fn test_stage3_prose_wrapped_object() {
        let raw = format!("Here is your feedback:\n{MINIMAL}\nGood luck!");
        assert_eq!(parse_feedback(&raw).unwrap().overall_score, 7);
    }

    #[test]
    fn test_stage3_fenced_and_prose_wrapped() {
        let raw = format!("```json\nSure! {MINIMAL}\n```");
        assert_eq!(parse_feedback(&raw).unwrap().overall_score, 7);
    }

    #[test]
    fn test_no_json_at_all_fails() {
        let err = parse_feedback("I cannot review this document.").unwrap_err();
        assert!(matches!(err, FeedbackError::NoJsonObject));
    }

    #[test]
    fn test_malformed_object_fails_after_all_stages() {
        let err = parse_feedback("{\"overall_score\": 7, ").unwrap_err();
        assert!(matches!(err, FeedbackError::NoJsonObject | FeedbackError::Parse(_)));
    }

    #[test]
    fn test_score_zero_rejected() {
        let raw = r#"{"overall_score": 0, "summary": "x"}"#;
        assert!(matches!(
            parse_feedback(raw).unwrap_err(),
            FeedbackError::Invalid(_)
        ));
    }

    #[test]
    fn test_score_eleven_rejected() {
        let raw = r#"{"overall_score": 11, "summary": "x"}"#;
        assert!(matches!(
            parse_feedback(raw).unwrap_err(),
            FeedbackError::Invalid(_)
        ));
    }

    #[test]
    fn test_blank_summary_rejected() {
        let raw = r#"{"overall_score": 5, "summary": "   "}"#;
        assert!(matches!(
            parse_feedback(raw).unwrap_err(),
            FeedbackError::Invalid(_)
        ));
    }

    #[test]
    fn test_boundary_scores_accepted() {
        for score in [1, 10] {
            let raw = format!(r#"{{"overall_score": {score}, "summary": "ok"}}"#);
            assert_eq!(parse_feedback(&raw).unwrap().overall_score, score);
        }
    }

    #[test]
    fn test_missing_arrays_default_to_empty() {
        let feedback = parse_feedback(MINIMAL).unwrap();
        assert!(feedback.strengths.is_empty());
        assert!(feedback.areas_for_improvement.is_empty());
        assert!(feedback.specific_suggestions.is_empty());
        assert!(feedback.formatting_feedback.is_empty());
        assert!(feedback.keyword_analysis.missing_keywords.is_empty());
    }

    #[test]
    fn test_full_object_parses() {
        let feedback = parse_feedback(&full_feedback_json()).unwrap();
        assert_eq!(feedback.strengths.len(), 2);
        assert_eq!(feedback.specific_suggestions[0].impact, Impact::High);
        assert_eq!(feedback.specific_suggestions[1].impact, Impact::Low);
        assert_eq!(feedback.keyword_analysis.missing_keywords[0], "Kubernetes");
    }

    #[test]
    fn test_unknown_impact_level_is_a_parse_error() {
        let raw = r#"{
            "overall_score": 5, "summary": "ok",
            "specific_suggestions": [{"section": "s", "suggestion": "s", "impact": "critical"}]
        }"#;
        assert!(parse_feedback(raw).is_err());
    }

    #[test]
    fn test_round_trip_is_lossless_and_ordered() {
        let original = parse_feedback(&full_feedback_json()).unwrap();
        // jsonb storage round-trip: struct -> Value -> struct
        let value = serde_json::to_value(&original).unwrap();
        let reread: CvFeedback = serde_json::from_value(value).unwrap();
        assert_eq!(reread, original);
        assert_eq!(reread.strengths, original.strengths);
        assert_eq!(
            reread.keyword_analysis.suggested_additions,
            original.keyword_analysis.suggested_additions
        );
    }

    #[test]
    fn test_strip_code_fences_no_fences() {
        assert_eq!(strip_code_fences("{\"a\": 1}"), "{\"a\": 1}");
    }

    #[test]
    fn test_extract_json_object_greedy_span() {
        assert_eq!(
            extract_json_object("noise {\"a\": {\"b\": 1}} tail"),
            Some("{\"a\": {\"b\": 1}}")
        );
        assert_eq!(extract_json_object("no braces here"), None);
        assert_eq!(extract_json_object("} reversed {"), None);
    }
}
