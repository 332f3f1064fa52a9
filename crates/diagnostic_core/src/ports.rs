//! crates/diagnostic_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or LLM APIs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{ChatMessage, Company, Report, ReportDraft};

//=========================================================================================
// Port Error and Result Types
//=========================================================================================

/// The error taxonomy shared by all port operations.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    /// The model/network call failed or timed out. Never retried here;
    /// the caller decides whether to surface or degrade.
    #[error("External service error: {0}")]
    ExternalService(String),
    /// The model answered, but with content that fails JSON/schema validation.
    /// Treated like `ExternalService` for user visibility, kept distinct
    /// for diagnostics.
    #[error("Malformed model response: {0}")]
    MalformedResponse(String),
    /// Caller-supplied data failed shape checks at insert time.
    #[error("Validation error: {0}")]
    Validation(String),
    /// The storage collaborator failed. Nothing may be reported as saved.
    #[error("Persistence error: {0}")]
    Persistence(String),
    /// A defined empty state (unknown company, unknown report id).
    #[error("Not found: {0}")]
    NotFound(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// Text-generation capability behind both the report pipeline and the
/// advisory chat. Exactly two implementations exist: the real model
/// client and a deterministic-shape mock, selected once at startup by
/// whether an API credential is configured.
#[async_trait]
pub trait TextGenerationProvider: Send + Sync {
    /// Produces raw text expected to parse as the fixed report JSON schema.
    /// The caller owns parsing and validation; implementations never
    /// construct domain reports themselves.
    async fn generate_report(&self, answers_prompt: &str) -> PortResult<String>;

    /// Produces a free-text advisory reply grounded in the company's
    /// latest report plus the running conversation.
    async fn generate_chat_reply(
        &self,
        report: &Report,
        conversation: &[ChatMessage],
    ) -> PortResult<String>;
}

/// Append-only storage for generated reports, keyed by company and
/// ordered by creation time (with a sequence tie-break so "latest" is
/// always well-defined).
#[async_trait]
pub trait ReportStore: Send + Sync {
    /// Assigns id and created_at, persists, and returns the stored form.
    /// Must reject invalid score/category shapes with `Validation`.
    async fn insert(&self, draft: ReportDraft) -> PortResult<Report>;

    /// The report with the greatest `(created_at, seq)` for the company,
    /// or `None` if the company has never run a diagnostic.
    async fn latest(&self, company_id: Uuid) -> PortResult<Option<Report>>;

    /// All of the company's reports, ascending by `(created_at, seq)`.
    async fn history(&self, company_id: Uuid) -> PortResult<Vec<Report>>;
}

/// One row of the cross-company admin view.
#[derive(Debug, Clone)]
pub struct CompanyOverview {
    pub company_id: Uuid,
    pub name: String,
    pub country: String,
    pub report_count: i64,
    pub latest_score: Option<i32>,
    pub last_report_at: Option<DateTime<Utc>>,
}

/// Company registry operations. Split from `ReportStore` because the
/// report pipeline never needs them.
#[async_trait]
pub trait CompanyDirectory: Send + Sync {
    async fn create_company(&self, name: &str, country: &str) -> PortResult<Company>;

    async fn get_company(&self, company_id: Uuid) -> PortResult<Company>;

    /// Aggregated per-company row across all companies, for the admin view.
    async fn admin_overview(&self) -> PortResult<Vec<CompanyOverview>>;
}
