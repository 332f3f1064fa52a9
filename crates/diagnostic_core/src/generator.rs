//! crates/diagnostic_core/src/generator.rs
//!
//! Orchestrates one diagnostic analysis: answers in, a stored immutable
//! report out. The text-generation provider and the report store are
//! injected, so the pipeline runs identically against the real model,
//! the mock, or test fakes.

use std::sync::Arc;
use uuid::Uuid;

use crate::domain::{AnswerSet, Report, ReportDraft};
use crate::ports::{PortError, PortResult, ReportStore, TextGenerationProvider};
use crate::{prompt, schema};

pub struct ReportGenerator {
    provider: Arc<dyn TextGenerationProvider>,
    store: Arc<dyn ReportStore>,
}

impl ReportGenerator {
    pub fn new(provider: Arc<dyn TextGenerationProvider>, store: Arc<dyn ReportStore>) -> Self {
        Self { provider, store }
    }

    /// Runs the full pipeline: render prompt, call the provider, validate
    /// the response against the report schema, persist.
    ///
    /// Exactly one provider call and at most one insert happen per
    /// invocation; on any failure nothing is persisted. The report is
    /// durably stored before it is returned.
    pub async fn generate(&self, company_id: Uuid, answers: &AnswerSet) -> PortResult<Report> {
        let answers_prompt = prompt::render_answer_prompt(answers)?;
        let raw = self.provider.generate_report(&answers_prompt).await?;
        let payload = schema::parse_report_payload(&raw)?;

        let ai_response = serde_json::from_str(&raw)
            .map_err(|e| PortError::MalformedResponse(format!("invalid report JSON: {}", e)))?;
        let raw_answers = serde_json::to_value(answers)
            .map_err(|e| PortError::Validation(format!("answers are not serializable: {}", e)))?;

        let draft = ReportDraft {
            company_id,
            score: payload.score as i32,
            summary: payload.summary,
            strengths: payload.strengths,
            weaknesses: payload.weaknesses,
            recommendations: payload.recommendations,
            category_scores: payload
                .category_scores
                .into_iter()
                .map(|(k, v)| (k, v as i32))
                .collect(),
            raw_answers,
            ai_response,
        };
        draft.validate()?;

        self.store.insert(draft).await
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    //! In-memory fakes shared by the generator and advisor tests. They
    //! mirror the real adapter's ordering contract: ascending
    //! `(created_at, seq)`, latest = greatest.

    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use std::sync::Mutex;
    use uuid::Uuid;

    use crate::domain::{ChatMessage, Report, ReportDraft};
    use crate::ports::{PortResult, ReportStore, TextGenerationProvider};

    /// Provider fake that replays a scripted response and counts calls.
    pub struct ScriptedProvider {
        pub report_response: PortResult<String>,
        pub chat_response: PortResult<String>,
        pub calls: Mutex<usize>,
    }

    impl ScriptedProvider {
        pub fn reporting(response: PortResult<String>) -> Self {
            Self {
                report_response: response,
                chat_response: Ok(String::new()),
                calls: Mutex::new(0),
            }
        }

        pub fn chatting(response: PortResult<String>) -> Self {
            Self {
                report_response: Ok(String::new()),
                chat_response: response,
                calls: Mutex::new(0),
            }
        }

        pub fn call_count(&self) -> usize {
            *self.calls.lock().unwrap()
        }

        fn clone_result(result: &PortResult<String>) -> PortResult<String> {
            match result {
                Ok(s) => Ok(s.clone()),
                Err(e) => Err(crate::ports::PortError::ExternalService(e.to_string())),
            }
        }
    }

    #[async_trait]
    impl TextGenerationProvider for ScriptedProvider {
        async fn generate_report(&self, _answers_prompt: &str) -> PortResult<String> {
            *self.calls.lock().unwrap() += 1;
            Self::clone_result(&self.report_response)
        }

        async fn generate_chat_reply(
            &self,
            _report: &Report,
            _conversation: &[ChatMessage],
        ) -> PortResult<String> {
            *self.calls.lock().unwrap() += 1;
            Self::clone_result(&self.chat_response)
        }
    }

    /// Append-only in-memory store with the adapter's ordering semantics.
    #[derive(Default)]
    pub struct InMemoryStore {
        pub reports: Mutex<Vec<Report>>,
    }

    impl InMemoryStore {
        pub fn count(&self) -> usize {
            self.reports.lock().unwrap().len()
        }

        /// Seeds a report with an explicit timestamp, for ordering tests.
        pub fn seed(&self, company_id: Uuid, score: i32, created_at: DateTime<Utc>) -> Report {
            let mut reports = self.reports.lock().unwrap();
            let report = Report {
                id: Uuid::new_v4(),
                company_id,
                score,
                summary: format!("seeded report scoring {}", score),
                strengths: vec![],
                weaknesses: vec![],
                recommendations: vec![],
                category_scores: Default::default(),
                raw_answers: serde_json::json!({}),
                created_at,
                seq: reports.len() as i64 + 1,
            };
            reports.push(report.clone());
            report
        }
    }

    #[async_trait]
    impl ReportStore for InMemoryStore {
        async fn insert(&self, draft: ReportDraft) -> PortResult<Report> {
            draft.validate()?;
            let mut reports = self.reports.lock().unwrap();
            let report = Report {
                id: Uuid::new_v4(),
                company_id: draft.company_id,
                score: draft.score,
                summary: draft.summary,
                strengths: draft.strengths,
                weaknesses: draft.weaknesses,
                recommendations: draft.recommendations,
                category_scores: draft.category_scores,
                raw_answers: draft.raw_answers,
                created_at: Utc::now(),
                seq: reports.len() as i64 + 1,
            };
            reports.push(report.clone());
            Ok(report)
        }

        async fn latest(&self, company_id: Uuid) -> PortResult<Option<Report>> {
            let reports = self.reports.lock().unwrap();
            Ok(reports
                .iter()
                .filter(|r| r.company_id == company_id)
                .max_by_key(|r| (r.created_at, r.seq))
                .cloned())
        }

        async fn history(&self, company_id: Uuid) -> PortResult<Vec<Report>> {
            let reports = self.reports.lock().unwrap();
            let mut history: Vec<Report> = reports
                .iter()
                .filter(|r| r.company_id == company_id)
                .cloned()
                .collect();
            history.sort_by_key(|r| (r.created_at, r.seq));
            Ok(history)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::{InMemoryStore, ScriptedProvider};
    use super::*;
    use crate::domain::{AnswerValue, REPORT_CATEGORIES};
    use crate::ports::ReportStore;
    use chrono::{TimeZone, Utc};
    use std::sync::Arc;

    fn answers() -> AnswerSet {
        let mut set = AnswerSet::new();
        set.insert("efficiency_process".to_string(), AnswerValue::Rating(6));
        set.insert(
            "digital_tools".to_string(),
            AnswerValue::Choice("Siloed".into()),
        );
        set
    }

    fn model_json(score: i64) -> String {
        serde_json::json!({
            "score": score,
            "summary": "Steady but under-digitized.",
            "strengths": ["Clear operational processes"],
            "weaknesses": ["Siloed digital tools"],
            "recommendations": ["Implement a unified data platform."],
            "categoryScores": {
                "Operational Efficiency": 78,
                "Digital Maturity": 52,
                "Innovation Capability": 44,
                "Financial Health": 88,
                "Risk Management": 61
            }
        })
        .to_string()
    }

    #[tokio::test]
    async fn generate_persists_and_returns_the_report() {
        let store = Arc::new(InMemoryStore::default());
        let provider = Arc::new(ScriptedProvider::reporting(Ok(model_json(72))));
        let generator = ReportGenerator::new(provider.clone(), store.clone());
        let company_id = Uuid::new_v4();

        let report = generator.generate(company_id, &answers()).await.unwrap();

        assert_eq!(report.score, 72);
        assert_eq!(report.company_id, company_id);
        assert_eq!(store.count(), 1);
        assert_eq!(provider.call_count(), 1);
        for category in REPORT_CATEGORIES {
            let value = report.category_scores[category];
            assert!((0..=100).contains(&value));
        }
        // audit trail rides along
        assert_eq!(report.raw_answers["efficiency_process"], 6);
    }

    #[tokio::test]
    async fn malformed_model_output_persists_nothing() {
        let store = Arc::new(InMemoryStore::default());
        let provider = Arc::new(ScriptedProvider::reporting(Ok(
            "the model rambled instead of emitting JSON".to_string(),
        )));
        let generator = ReportGenerator::new(provider, store.clone());

        let before = store.count();
        let err = generator
            .generate(Uuid::new_v4(), &answers())
            .await
            .unwrap_err();

        assert!(matches!(err, PortError::MalformedResponse(_)));
        assert_eq!(store.count(), before);
    }

    #[tokio::test]
    async fn missing_score_key_is_rejected_without_insert() {
        let store = Arc::new(InMemoryStore::default());
        let json = model_json(72).replace(r#""score":72,"#, "");
        let provider = Arc::new(ScriptedProvider::reporting(Ok(json)));
        let generator = ReportGenerator::new(provider, store.clone());

        let err = generator
            .generate(Uuid::new_v4(), &answers())
            .await
            .unwrap_err();

        assert!(matches!(err, PortError::MalformedResponse(_)));
        assert_eq!(store.count(), 0);
    }

    #[tokio::test]
    async fn provider_failure_propagates_without_insert() {
        let store = Arc::new(InMemoryStore::default());
        let provider = Arc::new(ScriptedProvider::reporting(Err(
            PortError::ExternalService("connection reset".to_string()),
        )));
        let generator = ReportGenerator::new(provider, store.clone());

        let err = generator
            .generate(Uuid::new_v4(), &answers())
            .await
            .unwrap_err();

        assert!(matches!(err, PortError::ExternalService(_)));
        assert_eq!(store.count(), 0);
    }

    #[tokio::test]
    async fn latest_and_history_follow_timestamp_order() {
        let store = InMemoryStore::default();
        let company_id = Uuid::new_v4();
        let t1 = Utc.with_ymd_and_hms(2026, 1, 1, 9, 0, 0).unwrap();
        let t2 = Utc.with_ymd_and_hms(2026, 2, 1, 9, 0, 0).unwrap();
        let t3 = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
        store.seed(company_id, 60, t2);
        store.seed(company_id, 75, t3);
        store.seed(company_id, 50, t1);

        let latest = store.latest(company_id).await.unwrap().unwrap();
        assert_eq!(latest.created_at, t3);

        let history = store.history(company_id).await.unwrap();
        let stamps: Vec<_> = history.iter().map(|r| r.created_at).collect();
        assert_eq!(stamps, vec![t1, t2, t3]);
    }

    #[tokio::test]
    async fn equal_timestamps_break_ties_by_sequence() {
        let store = InMemoryStore::default();
        let company_id = Uuid::new_v4();
        let t = Utc.with_ymd_and_hms(2026, 4, 1, 12, 0, 0).unwrap();
        store.seed(company_id, 55, t);
        let second = store.seed(company_id, 65, t);

        let latest = store.latest(company_id).await.unwrap().unwrap();
        assert_eq!(latest.id, second.id);
    }
}
