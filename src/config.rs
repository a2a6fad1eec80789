// src/config.rs
// =============================================================================
// The crawl configuration: an immutable snapshot built once at startup.
//
// The only value that changes while the crawl runs is the depth budget, and
// that change never touches this struct: it travels to the crawler as a
// message (see crawl::DepthControl).
// =============================================================================

use std::time::Duration;

use url::Url;

use crate::cli::Cli;
use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub start_url: String,
    pub max_depth: u32,
    pub max_results: usize,
    pub max_errors: usize,
    pub timeout: Duration,
    /// Depth added per extend-depth event
    pub extend_by: u32,
    pub max_runtime: Option<Duration>,
    /// None means one task per link with no cap
    pub max_in_flight: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            start_url: "https://telegram.org".to_string(),
            max_depth: 3,
            max_results: 10,
            max_errors: 5,
            timeout: Duration::from_secs(10),
            extend_by: 2,
            max_runtime: None,
            max_in_flight: None,
        }
    }
}

impl Config {
    // Checks everything that would make the crawl meaningless or unable to start.
    // max_depth = 0 is allowed: it is simply a crawl that visits nothing.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = Url::parse(&self.start_url).map_err(|e| ConfigError::InvalidStartUrl {
            url: self.start_url.clone(),
            reason: e.to_string(),
        })?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::UnsupportedScheme(self.start_url.clone()));
        }

        if self.max_results == 0 {
            return Err(ConfigError::Zero { field: "max_results" });
        }
        if self.max_errors == 0 {
            return Err(ConfigError::Zero { field: "max_errors" });
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::Zero { field: "timeout" });
        }
        if self.extend_by == 0 {
            return Err(ConfigError::Zero { field: "extend_by" });
        }
        if self.max_in_flight == Some(0) {
            return Err(ConfigError::Zero { field: "max_in_flight" });
        }
        if self.max_runtime.is_some_and(|d| d.is_zero()) {
            return Err(ConfigError::Zero { field: "max_runtime" });
        }
        Ok(())
    }
}

impl TryFrom<Cli> for Config {
    type Error = ConfigError;

    fn try_from(cli: Cli) -> Result<Self, Self::Error> {
        let config = Config {
            start_url: cli.start_url,
            max_depth: cli.max_depth,
            max_results: cli.max_results,
            max_errors: cli.max_errors,
            timeout: Duration::from_secs(cli.timeout),
            extend_by: cli.extend_by,
            max_runtime: cli.max_runtime.map(Duration::from_secs),
            max_in_flight: cli.max_in_flight,
        };
        config.validate()?;
        Ok(config)
    }
}
