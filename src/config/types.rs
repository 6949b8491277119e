//! Probe configuration structs and defaults.

use std::time::Duration;

use serde::Deserialize;

use crate::system::executor::{ConnectionParams, Credential, DEFAULT_AGENT};
use crate::system::retry::{RetryPolicy, DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_DELAY};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    pub bmc: BmcSettings,
    pub retry: RetrySettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BmcSettings {
    pub host: String,
    pub username: String,
    pub password: Credential,
    pub ipmitool_path: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub delay_secs: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub log_level: String,
}

impl Default for BmcSettings {
    fn default() -> Self {
        Self {
            host: String::new(),
            username: "admin".to_string(),
            password: Credential::default(),
            ipmitool_path: DEFAULT_AGENT.to_string(),
        }
    }
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delay_secs: DEFAULT_RETRY_DELAY.as_secs_f64(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

impl BmcSettings {
    pub fn connection_params(&self) -> ConnectionParams {
        ConnectionParams::new(&self.host, &self.username, self.password.clone())
    }
}

impl RetrySettings {
    /// Negative or non-finite delays fall back to zero.
    pub fn policy(&self) -> RetryPolicy {
        let delay = Duration::try_from_secs_f64(self.delay_secs).unwrap_or(Duration::ZERO);
        RetryPolicy::new(self.max_attempts, delay)
    }
}
