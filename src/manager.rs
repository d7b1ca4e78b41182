use reqwest::blocking::Client;
use crate::active::{ActiveVersionDetector, GoEnvDetector, StartupFileDetector};
use crate::config::{Config, DetectorKind};
use crate::error::{GoenvError, Result};

/// Entry point of the version lifecycle engine.
///
/// Operations are spread over the modules that own them: [`crate::catalog`],
/// [`crate::installer`], [`crate::versions`] and [`crate::shell`].
pub struct Goenv {
    config: Config,
    detector: Box<dyn ActiveVersionDetector>,
}

impl Goenv {
    /// Creates an engine using the detection strategy selected in `config`.
    pub fn new(config: Config) -> Self {
        let detector: Box<dyn ActiveVersionDetector> = match config.detector {
            DetectorKind::GoEnv => Box::new(GoEnvDetector::default()),
            DetectorKind::StartupFile => Box::new(StartupFileDetector::from_config(&config)),
        };
        Self { config, detector }
    }

    pub fn with_detector(config: Config, detector: Box<dyn ActiveVersionDetector>) -> Self {
        Self { config, detector }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub(crate) fn detector(&self) -> &dyn ActiveVersionDetector {
        self.detector.as_ref()
    }

    pub(crate) fn http_client(&self) -> Result<Client> {
        Client::builder()
            .user_agent(concat!("goenv/", env!("CARGO_PKG_VERSION")))
            .timeout(self.config.http_timeout)
            .build()
            .map_err(|e| GoenvError::Config(format!("Could not build HTTP client: {e}")))
    }
}
