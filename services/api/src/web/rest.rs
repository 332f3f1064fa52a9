//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.

use crate::web::state::AppState;
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json},
};
use chrono::{DateTime, Utc};
use diagnostic_core::aggregate::{self, TrendDirection};
use diagnostic_core::domain::{AnswerSet, ChatMessage, ChatRole, Company, Report};
use diagnostic_core::ports::PortError;
use diagnostic_core::questionnaire;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        create_company_handler,
        get_company_handler,
        questionnaire_handler,
        analyze_handler,
        list_reports_handler,
        get_report_handler,
        export_report_handler,
        dashboard_handler,
        chat_handler,
        admin_overview_handler,
    ),
    components(
        schemas(
            CreateCompanyRequest,
            CompanyResponse,
            QuestionResponse,
            AnalyzeRequest,
            AnalyzeResponse,
            ReportResponse,
            ReportExportResponse,
            DashboardResponse,
            TrendPointResponse,
            RadarEntryResponse,
            RiskEntryResponse,
            ChatRequest,
            ChatMessagePayload,
            OverviewRow,
        )
    ),
    tags(
        (name = "Business Diagnostic API", description = "API endpoints for company diagnostics, dashboards, and the AI advisor.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct CreateCompanyRequest {
    pub name: String,
    pub country: String,
}

#[derive(Serialize, ToSchema)]
pub struct CompanyResponse {
    pub id: Uuid,
    pub name: String,
    pub country: String,
    pub created_at: DateTime<Utc>,
}

impl From<Company> for CompanyResponse {
    fn from(company: Company) -> Self {
        Self {
            id: company.id,
            name: company.name,
            country: company.country,
            created_at: company.created_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct QuestionResponse {
    pub id: String,
    pub category: String,
    pub prompt: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
}

#[derive(Deserialize, ToSchema)]
pub struct AnalyzeRequest {
    /// Mapping from question id to a 1-10 rating or a selected option.
    #[schema(value_type = Object)]
    pub answers: AnswerSet,
}

#[derive(Serialize, ToSchema)]
pub struct AnalyzeResponse {
    pub success: bool,
    pub report_id: Uuid,
}

#[derive(Serialize, ToSchema)]
pub struct ReportResponse {
    pub id: Uuid,
    pub company_id: Uuid,
    pub score: i32,
    pub summary: String,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub recommendations: Vec<String>,
    #[schema(value_type = Object)]
    pub category_scores: std::collections::BTreeMap<String, i32>,
    pub created_at: DateTime<Utc>,
}

impl From<Report> for ReportResponse {
    fn from(report: Report) -> Self {
        Self {
            id: report.id,
            company_id: report.company_id,
            score: report.score,
            summary: report.summary,
            strengths: report.strengths,
            weaknesses: report.weaknesses,
            recommendations: report.recommendations,
            category_scores: report.category_scores,
            created_at: report.created_at,
        }
    }
}

/// The field set the client-side PDF renderer needs, nothing more.
#[derive(Serialize, ToSchema)]
pub struct ReportExportResponse {
    pub score: i32,
    pub summary: String,
    pub recommendations: Vec<String>,
    pub weaknesses: Vec<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, ToSchema)]
pub struct TrendPointResponse {
    pub date: DateTime<Utc>,
    pub score: i32,
}

#[derive(Serialize, ToSchema)]
pub struct RadarEntryResponse {
    pub subject: String,
    pub value: i32,
    pub full_mark: i32,
}

#[derive(Serialize, ToSchema)]
pub struct RiskEntryResponse {
    pub name: String,
    pub value: i32,
}

#[derive(Serialize, ToSchema)]
pub struct DashboardResponse {
    pub trend: Vec<TrendPointResponse>,
    pub radar: Vec<RadarEntryResponse>,
    pub delta: i32,
    pub direction: String,
    pub risk: Vec<RiskEntryResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest: Option<ReportResponse>,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct ChatMessagePayload {
    pub role: String,
    pub content: String,
}

#[derive(Deserialize, ToSchema)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessagePayload>,
}

#[derive(Serialize, ToSchema)]
pub struct OverviewRow {
    pub company_id: Uuid,
    pub name: String,
    pub country: String,
    pub report_count: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_score: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_report_at: Option<DateTime<Utc>>,
}

//=========================================================================================
// Shared Helpers
//=========================================================================================

type HandlerError = (StatusCode, String);

/// Extracts the owning company from the `x-company-id` header. Company
/// scoping replaces hosted-provider sessions, which stay out of scope.
fn company_id_from_headers(headers: &HeaderMap) -> Result<Uuid, HandlerError> {
    let raw = headers
        .get("x-company-id")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            (
                StatusCode::BAD_REQUEST,
                "x-company-id header is required".to_string(),
            )
        })?;
    Uuid::parse_str(raw).map_err(|_| {
        (
            StatusCode::BAD_REQUEST,
            "Invalid x-company-id format".to_string(),
        )
    })
}

fn map_port_error(context: &str, e: PortError) -> HandlerError {
    error!("{}: {:?}", context, e);
    match e {
        PortError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
        PortError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
        PortError::ExternalService(_) | PortError::MalformedResponse(_) => (
            StatusCode::BAD_GATEWAY,
            "Analysis failed; please try again".to_string(),
        ),
        PortError::Persistence(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to {}", context),
        ),
    }
}

fn parse_chat_messages(payload: Vec<ChatMessagePayload>) -> Result<Vec<ChatMessage>, HandlerError> {
    payload
        .into_iter()
        .map(|m| {
            let role = match m.role.as_str() {
                "user" => ChatRole::User,
                "assistant" => ChatRole::Assistant,
                "system" => ChatRole::System,
                other => {
                    return Err((
                        StatusCode::BAD_REQUEST,
                        format!("Unknown chat role '{}'", other),
                    ))
                }
            };
            Ok(ChatMessage {
                role,
                content: m.content,
            })
        })
        .collect()
}

fn dashboard_response(view: aggregate::DashboardView) -> DashboardResponse {
    let direction = match view.direction {
        TrendDirection::Up => "up",
        TrendDirection::Down => "down",
        TrendDirection::Neutral => "neutral",
    };
    DashboardResponse {
        trend: view
            .trend
            .into_iter()
            .map(|p| TrendPointResponse {
                date: p.date,
                score: p.score,
            })
            .collect(),
        radar: view
            .radar
            .into_iter()
            .map(|r| RadarEntryResponse {
                subject: r.subject,
                value: r.value,
                full_mark: r.full_mark,
            })
            .collect(),
        delta: view.delta,
        direction: direction.to_string(),
        risk: view
            .risk
            .into_iter()
            .map(|r| RiskEntryResponse {
                name: r.name.to_string(),
                value: r.value,
            })
            .collect(),
        latest: view.latest.map(ReportResponse::from),
    }
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Register a company. Companies are the join key for reports; billing
/// and user accounts live with external providers.
#[utoipa::path(
    post,
    path = "/companies",
    request_body = CreateCompanyRequest,
    responses(
        (status = 201, description = "Company created", body = CompanyResponse),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn create_company_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateCompanyRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let company = state
        .directory
        .create_company(&req.name, &req.country)
        .await
        .map_err(|e| map_port_error("create company", e))?;
    Ok((StatusCode::CREATED, Json(CompanyResponse::from(company))))
}

/// Fetch one company.
#[utoipa::path(
    get,
    path = "/companies/{id}",
    responses(
        (status = 200, description = "The company", body = CompanyResponse),
        (status = 404, description = "Company not found")
    ),
    params(("id" = Uuid, Path, description = "Company id"))
)]
pub async fn get_company_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HandlerError> {
    let company = state
        .directory
        .get_company(id)
        .await
        .map_err(|e| map_port_error("fetch company", e))?;
    Ok(Json(CompanyResponse::from(company)))
}

/// The fixed diagnostic question list, for rendering the form.
#[utoipa::path(
    get,
    path = "/questionnaire",
    responses(
        (status = 200, description = "The fixed question list", body = [QuestionResponse])
    )
)]
pub async fn questionnaire_handler() -> Json<Vec<QuestionResponse>> {
    let questions = questionnaire::questions()
        .into_iter()
        .map(|q| {
            let (kind, options) = match q.kind {
                questionnaire::QuestionKind::Range => ("range".to_string(), None),
                questionnaire::QuestionKind::Select { options } => (
                    "select".to_string(),
                    Some(options.into_iter().map(str::to_string).collect()),
                ),
            };
            QuestionResponse {
                id: q.id.to_string(),
                category: q.category.to_string(),
                prompt: q.prompt.to_string(),
                kind,
                options,
            }
        })
        .collect();
    Json(questions)
}

/// Run one diagnostic analysis for the company and persist the report.
///
/// Re-submitting simply creates another report; submissions are not
/// deduplicated.
#[utoipa::path(
    post,
    path = "/analyze",
    request_body = AnalyzeRequest,
    responses(
        (status = 201, description = "Report generated and stored", body = AnalyzeResponse),
        (status = 400, description = "Bad request (e.g., missing header)"),
        (status = 502, description = "Model call failed or returned unusable output"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("x-company-id" = Uuid, Header, description = "The owning company's id.")
    )
)]
pub async fn analyze_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<AnalyzeRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let company_id = company_id_from_headers(&headers)?;
    // Ownership check doubles as a 404 for unknown companies.
    state
        .directory
        .get_company(company_id)
        .await
        .map_err(|e| map_port_error("fetch company", e))?;

    let report = state
        .generator
        .generate(company_id, &req.answers)
        .await
        .map_err(|e| map_port_error("generate report", e))?;

    Ok((
        StatusCode::CREATED,
        Json(AnalyzeResponse {
            success: true,
            report_id: report.id,
        }),
    ))
}

/// The company's full report history, oldest first.
#[utoipa::path(
    get,
    path = "/reports",
    responses(
        (status = 200, description = "Ascending report history", body = [ReportResponse]),
        (status = 400, description = "Missing or invalid x-company-id header")
    ),
    params(
        ("x-company-id" = Uuid, Header, description = "The owning company's id.")
    )
)]
pub async fn list_reports_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, HandlerError> {
    let company_id = company_id_from_headers(&headers)?;
    let history = state
        .store
        .history(company_id)
        .await
        .map_err(|e| map_port_error("list reports", e))?;
    let reports: Vec<ReportResponse> = history.into_iter().map(ReportResponse::from).collect();
    Ok(Json(reports))
}

async fn owned_report(
    state: &AppState,
    headers: &HeaderMap,
    report_id: Uuid,
) -> Result<Report, HandlerError> {
    let company_id = company_id_from_headers(headers)?;
    let history = state
        .store
        .history(company_id)
        .await
        .map_err(|e| map_port_error("fetch report", e))?;
    history
        .into_iter()
        .find(|r| r.id == report_id)
        .ok_or_else(|| (StatusCode::NOT_FOUND, "Report not found".to_string()))
}

/// One report, scoped to the requesting company.
#[utoipa::path(
    get,
    path = "/reports/{id}",
    responses(
        (status = 200, description = "The report", body = ReportResponse),
        (status = 404, description = "Report not found for this company")
    ),
    params(
        ("id" = Uuid, Path, description = "Report id"),
        ("x-company-id" = Uuid, Header, description = "The owning company's id.")
    )
)]
pub async fn get_report_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HandlerError> {
    let report = owned_report(&state, &headers, id).await?;
    Ok(Json(ReportResponse::from(report)))
}

/// The PDF-export field set for one report.
#[utoipa::path(
    get,
    path = "/reports/{id}/export",
    responses(
        (status = 200, description = "Fields for the downloadable report", body = ReportExportResponse),
        (status = 404, description = "Report not found for this company")
    ),
    params(
        ("id" = Uuid, Path, description = "Report id"),
        ("x-company-id" = Uuid, Header, description = "The owning company's id.")
    )
)]
pub async fn export_report_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HandlerError> {
    let report = owned_report(&state, &headers, id).await?;
    Ok(Json(ReportExportResponse {
        score: report.score,
        summary: report.summary,
        recommendations: report.recommendations,
        weaknesses: report.weaknesses,
        created_at: report.created_at,
    }))
}

/// Chart-ready derivations from the company's report history. An empty
/// history returns the defined empty forms, never an error.
#[utoipa::path(
    get,
    path = "/dashboard",
    responses(
        (status = 200, description = "Dashboard view", body = DashboardResponse),
        (status = 400, description = "Missing or invalid x-company-id header")
    ),
    params(
        ("x-company-id" = Uuid, Header, description = "The owning company's id.")
    )
)]
pub async fn dashboard_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, HandlerError> {
    let company_id = company_id_from_headers(&headers)?;
    let history = state
        .store
        .history(company_id)
        .await
        .map_err(|e| map_port_error("build dashboard", e))?;
    Ok(Json(dashboard_response(aggregate::aggregate(&history))))
}

/// One advisory chat turn, grounded in the company's latest report.
#[utoipa::path(
    post,
    path = "/chat",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "The assistant's reply", body = ChatMessagePayload),
        (status = 400, description = "Bad request")
    ),
    params(
        ("x-company-id" = Uuid, Header, description = "The owning company's id.")
    )
)]
pub async fn chat_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<ChatRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let company_id = company_id_from_headers(&headers)?;
    let conversation = parse_chat_messages(req.messages)?;
    let reply = state
        .advisor
        .respond(company_id, &conversation)
        .await
        .map_err(|e| map_port_error("answer chat", e))?;
    Ok(Json(ChatMessagePayload {
        role: "assistant".to_string(),
        content: reply.content,
    }))
}

/// Aggregated per-company rows across all companies, for the admin view.
#[utoipa::path(
    get,
    path = "/admin/overview",
    responses(
        (status = 200, description = "Per-company aggregates", body = [OverviewRow])
    )
)]
pub async fn admin_overview_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, HandlerError> {
    let rows = state
        .directory
        .admin_overview()
        .await
        .map_err(|e| map_port_error("build admin overview", e))?;
    let rows: Vec<OverviewRow> = rows
        .into_iter()
        .map(|r| OverviewRow {
            company_id: r.company_id,
            name: r.name,
            country: r.country,
            report_count: r.report_count,
            latest_score: r.latest_score,
            last_report_at: r.last_report_at,
        })
        .collect();
    Ok(Json(rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn company_header_is_required_and_validated() {
        let headers = HeaderMap::new();
        assert!(company_id_from_headers(&headers).is_err());

        let mut headers = HeaderMap::new();
        headers.insert("x-company-id", "not-a-uuid".parse().unwrap());
        assert!(company_id_from_headers(&headers).is_err());

        let id = Uuid::new_v4();
        let mut headers = HeaderMap::new();
        headers.insert("x-company-id", id.to_string().parse().unwrap());
        assert_eq!(company_id_from_headers(&headers).unwrap(), id);
    }

    #[test]
    fn chat_roles_parse_and_unknown_roles_fail() {
        let parsed = parse_chat_messages(vec![
            ChatMessagePayload {
                role: "user".to_string(),
                content: "hi".to_string(),
            },
            ChatMessagePayload {
                role: "assistant".to_string(),
                content: "hello".to_string(),
            },
        ])
        .unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].role, ChatRole::User);

        assert!(parse_chat_messages(vec![ChatMessagePayload {
            role: "moderator".to_string(),
            content: "x".to_string(),
        }])
        .is_err());
    }

    #[test]
    fn questionnaire_endpoint_exposes_all_questions() {
        let Json(questions) = futures_executor(questionnaire_handler());
        assert_eq!(questions.len(), 10);
        assert!(questions.iter().any(|q| q.kind == "range"));
        assert!(questions
            .iter()
            .filter(|q| q.kind == "select")
            .all(|q| q.options.as_ref().is_some_and(|o| !o.is_empty())));
    }

    // Tiny helper: the handler is async only to satisfy axum's signature.
    fn futures_executor<F: std::future::Future>(fut: F) -> F::Output {
        tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap()
            .block_on(fut)
    }
}
