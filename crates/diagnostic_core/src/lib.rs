pub mod advisor;
pub mod aggregate;
pub mod domain;
pub mod generator;
pub mod ports;
pub mod prompt;
pub mod questionnaire;
pub mod schema;

pub use advisor::AdvisoryChat;
pub use aggregate::{aggregate, DashboardView};
pub use domain::{
    AnswerSet, AnswerValue, ChatMessage, ChatRole, Company, Report, ReportDraft,
    REPORT_CATEGORIES,
};
pub use generator::ReportGenerator;
pub use ports::{
    CompanyDirectory, CompanyOverview, PortError, PortResult, ReportStore, TextGenerationProvider,
};
