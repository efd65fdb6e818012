use std::{fmt, sync::Arc};

use reelgap_config::Config;
use reelgap_core::AvailabilityService;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<AvailabilityService>,
    pub config: Arc<Config>,
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState").finish_non_exhaustive()
    }
}

impl AppState {
    pub fn new(service: AvailabilityService, config: Config) -> Self {
        Self {
            service: Arc::new(service),
            config: Arc::new(config),
        }
    }

    pub fn service(&self) -> &AvailabilityService {
        &self.service
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}
