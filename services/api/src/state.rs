//! Application state shared across handlers

use common::{gate::AuthGate, session::SessionConfig};

use crate::lifecycle::ReportEngine;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub engine: ReportEngine,
    pub gate: AuthGate,
    pub session_config: SessionConfig,
}
