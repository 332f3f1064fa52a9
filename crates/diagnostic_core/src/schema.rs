//! crates/diagnostic_core/src/schema.rs
//!
//! The single validation boundary between raw model output and domain
//! reports. Every model response crosses this function or never becomes
//! a report; field presence is never trusted implicitly.

use serde::Deserialize;
use std::collections::BTreeMap;

use crate::domain::REPORT_CATEGORIES;
use crate::ports::{PortError, PortResult};

/// The wire contract the model is instructed to return.
#[derive(Debug, Clone, Deserialize)]
pub struct ReportPayload {
    pub score: i64,
    pub summary: String,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub recommendations: Vec<String>,
    #[serde(rename = "categoryScores")]
    pub category_scores: BTreeMap<String, i64>,
}

/// Parses raw model text as the fixed report schema.
///
/// Rejects non-JSON bodies, missing keys (serde), out-of-range scores,
/// and any absent or out-of-range fixed category. The caller must not
/// persist anything when this fails.
pub fn parse_report_payload(raw: &str) -> PortResult<ReportPayload> {
    let payload: ReportPayload = serde_json::from_str(raw)
        .map_err(|e| PortError::MalformedResponse(format!("invalid report JSON: {}", e)))?;

    if !(0..=100).contains(&payload.score) {
        return Err(PortError::MalformedResponse(format!(
            "score {} is outside [0,100]",
            payload.score
        )));
    }
    for category in REPORT_CATEGORIES {
        match payload.category_scores.get(category) {
            None => {
                return Err(PortError::MalformedResponse(format!(
                    "missing category score '{}'",
                    category
                )))
            }
            Some(value) if !(0..=100).contains(value) => {
                return Err(PortError::MalformedResponse(format!(
                    "category score {} for '{}' is outside [0,100]",
                    value, category
                )))
            }
            Some(_) => {}
        }
    }
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_json() -> String {
        r#"{
            "score": 72,
            "summary": "Solid fundamentals with digital gaps.",
            "strengths": ["Clear processes"],
            "weaknesses": ["Siloed tools"],
            "recommendations": ["Unify the data platform."],
            "categoryScores": {
                "Operational Efficiency": 80,
                "Digital Maturity": 55,
                "Innovation Capability": 48,
                "Financial Health": 85,
                "Risk Management": 66
            }
        }"#
        .to_string()
    }

    #[test]
    fn accepts_well_formed_payload() {
        let payload = parse_report_payload(&valid_json()).unwrap();
        assert_eq!(payload.score, 72);
        assert_eq!(payload.category_scores.len(), 5);
    }

    #[test]
    fn rejects_non_json() {
        let err = parse_report_payload("I'm sorry, I can't do that.").unwrap_err();
        assert!(matches!(err, PortError::MalformedResponse(_)));
    }

    #[test]
    fn rejects_missing_score() {
        let json = valid_json().replace(r#""score": 72,"#, "");
        assert!(matches!(
            parse_report_payload(&json),
            Err(PortError::MalformedResponse(_))
        ));
    }

    #[test]
    fn rejects_out_of_range_score() {
        let json = valid_json().replace(r#""score": 72"#, r#""score": 140"#);
        assert!(matches!(
            parse_report_payload(&json),
            Err(PortError::MalformedResponse(_))
        ));
    }

    #[test]
    fn rejects_missing_fixed_category() {
        let json = valid_json().replace(r#""Risk Management": 66"#, r#""Something Else": 66"#);
        assert!(matches!(
            parse_report_payload(&json),
            Err(PortError::MalformedResponse(_))
        ));
    }

    #[test]
    fn rejects_out_of_range_category() {
        let json = valid_json().replace(r#""Digital Maturity": 55"#, r#""Digital Maturity": -3"#);
        assert!(matches!(
            parse_report_payload(&json),
            Err(PortError::MalformedResponse(_))
        ));
    }
}
