//! crates/diagnostic_core/src/prompt.rs
//!
//! Prompt construction for both model-backed paths. Defined once here so
//! the real adapter and the tests agree on exactly what the model sees.

use crate::domain::{AnswerSet, Report};
use crate::ports::{PortError, PortResult};

/// System instruction for the analysis call. Mandates the strict JSON
/// response shape that `schema::parse_report_payload` validates.
pub const ANALYSIS_SYSTEM_PROMPT: &str = r#"You are a business analyst AI. Evaluate the company's answers and return:
- Key strengths
- Key weaknesses
- Three actionable recommendations
- One-sentence summary
- Overall readiness score (0-100)

Return ONLY valid JSON in this exact format, with no markdown code blocks:
{
  "score": number,
  "summary": string,
  "strengths": string[],
  "weaknesses": string[],
  "recommendations": string[],
  "categoryScores": {
    "Operational Efficiency": number,
    "Digital Maturity": number,
    "Innovation Capability": number,
    "Financial Health": number,
    "Risk Management": number
  }
}
"#;

/// Serializes the answer set into the user-facing prompt fragment.
///
/// The answer set is a `BTreeMap`, so the same answers always produce the
/// same text; tests and the mock path rely on that reproducibility.
/// Missing question ids are simply absent, never an error.
pub fn render_answer_prompt(answers: &AnswerSet) -> PortResult<String> {
    let serialized = serde_json::to_string_pretty(answers)
        .map_err(|e| PortError::Validation(format!("answers are not serializable: {}", e)))?;
    Ok(format!(
        "Here are the company's answers to the diagnostic test:\n{}",
        serialized
    ))
}

/// System instruction for the advisory chat, grounding every turn in the
/// company's latest stored report.
pub fn advisor_system_prompt(report: &Report) -> String {
    let context = format!(
        "Company Analysis Context:\n\
         Score: {}/100\n\
         Summary: {}\n\
         Key Weaknesses: {}\n\
         Recommendations: {}",
        report.score,
        report.summary,
        report.weaknesses.join(", "),
        report.recommendations.join(", "),
    );
    format!(
        "You are an expert AI Business Advisor. You help companies understand their diagnostic results.\n\
         Use the following context about the company to answer their questions:\n\
         {}\n\n\
         Be professional, encouraging, and specific. If asked about something not in the report, \
         use general business knowledge but mention the report didn't cover it specifically.",
        context
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::AnswerValue;

    #[test]
    fn answer_prompt_is_reproducible() {
        let mut answers = AnswerSet::new();
        answers.insert("risk_compliance".to_string(), AnswerValue::Choice("Annually".into()));
        answers.insert("efficiency_process".to_string(), AnswerValue::Rating(7));

        let a = render_answer_prompt(&answers).unwrap();
        let b = render_answer_prompt(&answers).unwrap();
        assert_eq!(a, b);
        assert!(a.contains("efficiency_process"));
        assert!(a.contains("Annually"));
    }

    #[test]
    fn empty_answer_set_still_renders() {
        let prompt = render_answer_prompt(&AnswerSet::new()).unwrap();
        assert!(prompt.contains("diagnostic test"));
    }
}
