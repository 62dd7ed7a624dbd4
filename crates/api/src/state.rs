use std::sync::Arc;

use capmatch_config::Settings;
use capmatch_services::event::SessionEventProcessor;

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub processor: Arc<SessionEventProcessor>,
}
