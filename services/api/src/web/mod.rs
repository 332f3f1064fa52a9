pub mod rest;
pub mod state;

// Re-export the handlers to make them easily accessible to the binary
// that builds the web server router.
pub use rest::{
    admin_overview_handler, analyze_handler, chat_handler, create_company_handler,
    dashboard_handler, export_report_handler, get_company_handler, get_report_handler,
    list_reports_handler, questionnaire_handler,
};
