//! crates/diagnostic_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or HTTP framework.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::ports::{PortError, PortResult};

/// The five fixed category keys every report must score.
pub const REPORT_CATEGORIES: [&str; 5] = [
    "Operational Efficiency",
    "Digital Maturity",
    "Innovation Capability",
    "Financial Health",
    "Risk Management",
];

/// A registered company. Owns zero or more reports; billing lives elsewhere.
#[derive(Debug, Clone)]
pub struct Company {
    pub id: Uuid,
    pub name: String,
    pub country: String,
    pub created_at: DateTime<Utc>,
}

/// One answer to a questionnaire item: a 1-10 rating or a selected option.
///
/// Untagged so an answer set deserializes straight from the client's
/// `{"question_id": 7, "other_id": "Monthly"}` shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Rating(i64),
    Choice(String),
}

/// The company's responses keyed by question id. A `BTreeMap` keeps
/// serialization order stable, which the prompt builder relies on.
pub type AnswerSet = BTreeMap<String, AnswerValue>;

/// The immutable, persisted result of one diagnostic analysis.
///
/// There is no update path: a new analysis always produces a new report.
/// `created_at` plus the insert-sequence `seq` define a total per-company
/// ordering even when two reports land on the same timestamp.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub id: Uuid,
    pub company_id: Uuid,
    pub score: i32,
    pub summary: String,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub recommendations: Vec<String>,
    pub category_scores: BTreeMap<String, i32>,
    /// Opaque copy of the answer set this report was generated from.
    pub raw_answers: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub seq: i64,
}

/// A report as produced by the generator, before the store assigns
/// `id`, `created_at` and `seq`.
#[derive(Debug, Clone)]
pub struct ReportDraft {
    pub company_id: Uuid,
    pub score: i32,
    pub summary: String,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub recommendations: Vec<String>,
    pub category_scores: BTreeMap<String, i32>,
    pub raw_answers: serde_json::Value,
    /// The raw model output the draft was parsed from, kept for audit.
    pub ai_response: serde_json::Value,
}

impl ReportDraft {
    /// Shape check applied before any insert. Rejects rather than coerces:
    /// an out-of-range score means the draft never reaches storage.
    pub fn validate(&self) -> PortResult<()> {
        if !(0..=100).contains(&self.score) {
            return Err(PortError::Validation(format!(
                "score {} is outside [0,100]",
                self.score
            )));
        }
        for (category, value) in &self.category_scores {
            if !(0..=100).contains(value) {
                return Err(PortError::Validation(format!(
                    "category score {} for '{}' is outside [0,100]",
                    value, category
                )));
            }
        }
        Ok(())
    }
}

/// Who authored a chat turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// One turn of an advisory conversation. The caller supplies the full
/// history on every call; this core keeps no conversation state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}
