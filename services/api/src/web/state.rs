//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use diagnostic_core::advisor::AdvisoryChat;
use diagnostic_core::generator::ReportGenerator;
use diagnostic_core::ports::{CompanyDirectory, ReportStore};
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all
/// handlers. The provider strategy (real model vs. mock) is baked into the
/// generator and advisor here; no handler ever checks for credentials.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ReportStore>,
    pub directory: Arc<dyn CompanyDirectory>,
    pub generator: Arc<ReportGenerator>,
    pub advisor: Arc<AdvisoryChat>,
    pub config: Arc<Config>,
}
