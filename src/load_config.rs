/// `load_config` module: loads the optional YAML tuning file passed with `--config`.
///
/// The file never carries secrets; the token comes from `--private_token` or
/// `GITLAB_PRIVATE_TOKEN`. Every key is optional:
///
/// ```yaml
/// base_url: https://gitlab.example.com/api/v4
/// concurrency:
///   traversal: 8
///   discovery: 8
///   processing: 4
/// retry:
///   attempts: 3
///   delay_ms: 1000
/// timeout_secs: 30
/// ```
///
/// # Errors
/// All errors use `anyhow::Error` and are surfaced at the CLI boundary.
use anyhow::Result;
use diff_scraper_core::config::Concurrency;
use diff_scraper_core::transport::{RetryPolicy, TransportConfig};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::{error, info};

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    pub base_url: Option<String>,
    #[serde(default)]
    pub concurrency: Concurrency,
    #[serde(default)]
    pub retry: RetrySection,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetrySection {
    pub attempts: u32,
    pub delay_ms: u64,
}

impl Default for RetrySection {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            attempts: policy.attempts,
            delay_ms: policy.delay.as_millis() as u64,
        }
    }
}

impl Settings {
    pub fn transport_config(&self, base_url: String, private_token: String) -> TransportConfig {
        let mut config = TransportConfig::new(base_url, private_token);
        config.retry = RetryPolicy {
            attempts: self.retry.attempts.max(1),
            delay: Duration::from_millis(self.retry.delay_ms),
        };
        if let Some(secs) = self.timeout_secs {
            config.timeout = Duration::from_secs(secs);
        }
        config
    }
}

/// Reads and parses the YAML tuning file at `path`.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Settings> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => {
            info!(config_path = ?path_ref, "Config file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    // An empty file means "all defaults".
    if config_content.trim().is_empty() {
        return Ok(Settings::default());
    }

    match serde_yaml::from_str(&config_content) {
        Ok(settings) => {
            info!(config_path = ?path_ref, ?settings, "Parsed config YAML successfully");
            Ok(settings)
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            Err(anyhow::anyhow!("Failed to parse config YAML: {e}"))
        }
    }
}
