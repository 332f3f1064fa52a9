//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `ReportStore` and `CompanyDirectory` ports from the `core` crate. It
//! handles all interactions with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diagnostic_core::domain::{Company, Report, ReportDraft};
use diagnostic_core::ports::{
    CompanyDirectory, CompanyOverview, PortError, PortResult, ReportStore,
};
use sqlx::{FromRow, PgPool};
use std::collections::BTreeMap;
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the report store and company directory ports.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct CompanyRecord {
    id: Uuid,
    name: String,
    country: String,
    created_at: DateTime<Utc>,
}

impl CompanyRecord {
    fn to_domain(self) -> Company {
        Company {
            id: self.id,
            name: self.name,
            country: self.country,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct ReportRecord {
    id: Uuid,
    seq: i64,
    company_id: Uuid,
    score: i32,
    summary: String,
    strengths: serde_json::Value,
    weaknesses: serde_json::Value,
    recommendations: serde_json::Value,
    category_scores: serde_json::Value,
    raw_answers: serde_json::Value,
    created_at: DateTime<Utc>,
}

impl ReportRecord {
    fn to_domain(self) -> PortResult<Report> {
        let strengths: Vec<String> = decode_column(self.strengths, "strengths")?;
        let weaknesses: Vec<String> = decode_column(self.weaknesses, "weaknesses")?;
        let recommendations: Vec<String> = decode_column(self.recommendations, "recommendations")?;
        let category_scores: BTreeMap<String, i32> =
            decode_column(self.category_scores, "category_scores")?;
        Ok(Report {
            id: self.id,
            company_id: self.company_id,
            score: self.score,
            summary: self.summary,
            strengths,
            weaknesses,
            recommendations,
            category_scores,
            raw_answers: self.raw_answers,
            created_at: self.created_at,
            seq: self.seq,
        })
    }
}

fn decode_column<T: serde::de::DeserializeOwned>(
    value: serde_json::Value,
    column: &str,
) -> PortResult<T> {
    serde_json::from_value(value)
        .map_err(|e| PortError::Persistence(format!("corrupt {} column: {}", column, e)))
}

#[derive(FromRow)]
struct OverviewRecord {
    id: Uuid,
    name: String,
    country: String,
    report_count: i64,
    latest_score: Option<i32>,
    last_report_at: Option<DateTime<Utc>>,
}

impl OverviewRecord {
    fn to_domain(self) -> CompanyOverview {
        CompanyOverview {
            company_id: self.id,
            name: self.name,
            country: self.country,
            report_count: self.report_count,
            latest_score: self.latest_score,
            last_report_at: self.last_report_at,
        }
    }
}

const REPORT_COLUMNS: &str = "id, seq, company_id, score, summary, strengths, weaknesses, \
     recommendations, category_scores, raw_answers, created_at";

//=========================================================================================
// `ReportStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl ReportStore for DbAdapter {
    async fn insert(&self, draft: ReportDraft) -> PortResult<Report> {
        // Reject bad shapes before anything touches the database.
        draft.validate()?;

        let strengths = serde_json::to_value(&draft.strengths)
            .map_err(|e| PortError::Validation(e.to_string()))?;
        let weaknesses = serde_json::to_value(&draft.weaknesses)
            .map_err(|e| PortError::Validation(e.to_string()))?;
        let recommendations = serde_json::to_value(&draft.recommendations)
            .map_err(|e| PortError::Validation(e.to_string()))?;
        let category_scores = serde_json::to_value(&draft.category_scores)
            .map_err(|e| PortError::Validation(e.to_string()))?;

        let sql = format!(
            "INSERT INTO diagnostic_reports \
             (id, company_id, score, summary, strengths, weaknesses, recommendations, \
              category_scores, raw_answers, ai_response) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             RETURNING {}",
            REPORT_COLUMNS
        );
        let record = sqlx::query_as::<_, ReportRecord>(&sql)
            .bind(Uuid::new_v4())
            .bind(draft.company_id)
            .bind(draft.score)
            .bind(&draft.summary)
            .bind(strengths)
            .bind(weaknesses)
            .bind(recommendations)
            .bind(category_scores)
            .bind(&draft.raw_answers)
            .bind(&draft.ai_response)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| PortError::Persistence(e.to_string()))?;

        record.to_domain()
    }

    async fn latest(&self, company_id: Uuid) -> PortResult<Option<Report>> {
        let sql = format!(
            "SELECT {} FROM diagnostic_reports WHERE company_id = $1 \
             ORDER BY created_at DESC, seq DESC LIMIT 1",
            REPORT_COLUMNS
        );
        let record = sqlx::query_as::<_, ReportRecord>(&sql)
            .bind(company_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| PortError::Persistence(e.to_string()))?;

        record.map(ReportRecord::to_domain).transpose()
    }

    async fn history(&self, company_id: Uuid) -> PortResult<Vec<Report>> {
        let sql = format!(
            "SELECT {} FROM diagnostic_reports WHERE company_id = $1 \
             ORDER BY created_at ASC, seq ASC",
            REPORT_COLUMNS
        );
        let records = sqlx::query_as::<_, ReportRecord>(&sql)
            .bind(company_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| PortError::Persistence(e.to_string()))?;

        records.into_iter().map(ReportRecord::to_domain).collect()
    }
}

//=========================================================================================
// `CompanyDirectory` Trait Implementation
//=========================================================================================

#[async_trait]
impl CompanyDirectory for DbAdapter {
    async fn create_company(&self, name: &str, country: &str) -> PortResult<Company> {
        let record = sqlx::query_as::<_, CompanyRecord>(
            "INSERT INTO companies (id, name, country) VALUES ($1, $2, $3) \
             RETURNING id, name, country, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(country)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| PortError::Persistence(e.to_string()))?;

        Ok(record.to_domain())
    }

    async fn get_company(&self, company_id: Uuid) -> PortResult<Company> {
        let record = sqlx::query_as::<_, CompanyRecord>(
            "SELECT id, name, country, created_at FROM companies WHERE id = $1",
        )
        .bind(company_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => {
                PortError::NotFound(format!("Company {} not found", company_id))
            }
            _ => PortError::Persistence(e.to_string()),
        })?;

        Ok(record.to_domain())
    }

    async fn admin_overview(&self) -> PortResult<Vec<CompanyOverview>> {
        let records = sqlx::query_as::<_, OverviewRecord>(
            "SELECT c.id, c.name, c.country, \
                    COUNT(r.id) AS report_count, \
                    (SELECT r2.score FROM diagnostic_reports r2 \
                     WHERE r2.company_id = c.id \
                     ORDER BY r2.created_at DESC, r2.seq DESC LIMIT 1) AS latest_score, \
                    MAX(r.created_at) AS last_report_at \
             FROM companies c \
             LEFT JOIN diagnostic_reports r ON r.company_id = c.id \
             GROUP BY c.id, c.name, c.country \
             ORDER BY c.name ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PortError::Persistence(e.to_string()))?;

        Ok(records.into_iter().map(OverviewRecord::to_domain).collect())
    }
}
