//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{analysis_llm::OpenAiTextAdapter, db::DbAdapter, mock_llm::MockTextAdapter},
    config::Config,
    error::ApiError,
    web::{
        admin_overview_handler, analyze_handler, chat_handler, create_company_handler,
        dashboard_handler, export_report_handler, get_company_handler, get_report_handler,
        list_reports_handler, questionnaire_handler, rest::ApiDoc, state::AppState,
    },
};
use async_openai::{config::OpenAIConfig, Client};
use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    routing::{get, post},
    Router,
};
use diagnostic_core::{
    advisor::AdvisoryChat, generator::ReportGenerator, ports::TextGenerationProvider,
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect to Database & Run Migrations ---
    info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;
    let db_adapter = Arc::new(DbAdapter::new(db_pool.clone()));
    info!("Running database migrations...");
    db_adapter.run_migrations().await?;
    info!("Database migrations complete.");

    // --- 3. Select the Text-Generation Provider (once, at startup) ---
    let provider: Arc<dyn TextGenerationProvider> = if let Some(key) = &config.deepseek_api_key {
        info!("DeepSeek credential configured; routing model calls to DeepSeek.");
        let openai_config = OpenAIConfig::new()
            .with_api_key(key)
            .with_api_base("https://api.deepseek.com");
        Arc::new(OpenAiTextAdapter::new(
            Client::with_config(openai_config),
            "deepseek-chat".to_string(),
            "deepseek-chat".to_string(),
        ))
    } else if let Some(key) = &config.openai_api_key {
        info!("OpenAI credential configured; using models {} / {}.",
            config.analysis_model, config.chat_model);
        let openai_config = OpenAIConfig::new().with_api_key(key);
        Arc::new(OpenAiTextAdapter::new(
            Client::with_config(openai_config),
            config.analysis_model.clone(),
            config.chat_model.clone(),
        ))
    } else {
        warn!("No model credential configured; falling back to the mock provider.");
        Arc::new(MockTextAdapter::new())
    };

    // --- 4. Build the Core Services & Shared AppState ---
    let generator = Arc::new(ReportGenerator::new(provider.clone(), db_adapter.clone()));
    let advisor = Arc::new(AdvisoryChat::new(provider, db_adapter.clone()));
    let app_state = Arc::new(AppState {
        store: db_adapter.clone(),
        directory: db_adapter,
        generator,
        advisor,
        config: config.clone(),
    });

    let cors = CorsLayer::new()
        .allow_origin("http://localhost:3000".parse::<HeaderValue>().expect("static origin"))
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);

    // --- 5. Create the Web Router ---
    let api_router = Router::new()
        .route("/companies", post(create_company_handler))
        .route("/companies/{id}", get(get_company_handler))
        .route("/questionnaire", get(questionnaire_handler))
        .route("/analyze", post(analyze_handler))
        .route("/reports", get(list_reports_handler))
        .route("/reports/{id}", get(get_report_handler))
        .route("/reports/{id}/export", get(export_report_handler))
        .route("/dashboard", get(dashboard_handler))
        .route("/chat", post(chat_handler))
        .route("/admin/overview", get(admin_overview_handler))
        .layer(DefaultBodyLimit::max(1024 * 1024))
        // Bounds every request, including the outbound model call; a
        // timed-out analysis persists nothing.
        .layer(TimeoutLayer::new(config.request_timeout))
        .layer(cors)
        .with_state(app_state);

    // Merge the API router with the Swagger UI router for a complete application.
    let app = Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 6. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
