pub mod config;
pub mod detector;
pub mod error;
pub mod logging;
pub mod providers;
pub mod pubsub;
pub mod report;
pub mod server;
pub mod snapshot;

use std::sync::Arc;

use crate::config::Config;
use crate::detector::Detector;
use crate::providers::{GcpProviders, Providers};
use crate::report::{LogReporter, Reporter};

pub use crate::error::{Error, Result};

// ========================================
// APP (wiring)
// ========================================

/// Everything a process needs to serve invocations.
/// Cheap to clone (all fields are Arcs).
#[derive(Clone)]
pub struct App {
    pub config: Arc<Config>,
    pub detector: Arc<Detector>,
}

impl App {
    /// Production wiring: Google Cloud providers and log reporting.
    pub fn new(config: Config) -> Self {
        let providers = Arc::new(GcpProviders::new(config.providers.clone()));
        Self::with_collaborators(config, providers, Arc::new(LogReporter))
    }

    pub fn with_collaborators(
        config: Config,
        providers: Arc<dyn Providers>,
        reporter: Arc<dyn Reporter>,
    ) -> Self {
        let detector = Detector::new(
            config.detector.clone(),
            config.retry.clone(),
            providers,
            reporter,
        );
        Self {
            config: Arc::new(config),
            detector: Arc::new(detector),
        }
    }

    pub async fn serve(&self) -> Result<()> {
        server::serve(&self.config.server, self.detector.clone()).await
    }
}
