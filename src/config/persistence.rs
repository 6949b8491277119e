//! Config file loading, environment overrides and validation.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use tracing::{debug, info};

use crate::config::types::ProbeConfig;
use crate::system::executor::Credential;

pub const CONFIG_FILE_NAME: &str = "bmc-probe.json";

pub const ENV_HOST: &str = "PANKHA_IPMI_HOST";
pub const ENV_USER: &str = "PANKHA_IPMI_USER";
pub const ENV_PASS: &str = "PANKHA_IPMI_PASS";
pub const ENV_IPMITOOL: &str = "PANKHA_IPMITOOL";

/// Default config location: next to the executable.
pub fn default_config_path() -> Result<PathBuf> {
    let exe_dir = std::env::current_exe()?
        .parent()
        .ok_or_else(|| anyhow!("Cannot determine executable directory"))?
        .to_path_buf();
    Ok(exe_dir.join(CONFIG_FILE_NAME))
}

/// Parse a config file. Missing sections and fields take their defaults.
pub fn read_config_file(path: &Path) -> Result<ProbeConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config: {:?}", path))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse config JSON: {:?}", path))
}

/// Load config from `path` (or the default location), then apply environment
/// overrides. An explicitly given path must exist.
pub async fn load_config(path: Option<&str>) -> Result<ProbeConfig> {
    let mut config = match path {
        Some(p) => {
            let config_path = PathBuf::from(p);
            let config = read_config_file(&config_path)?;
            info!("Loaded configuration from: {:?}", config_path);
            config
        }
        None => {
            let config_path = default_config_path()?;
            if tokio::fs::try_exists(&config_path).await.unwrap_or(false) {
                let config = read_config_file(&config_path)?;
                info!("Loaded configuration from: {:?}", config_path);
                config
            } else {
                debug!("No config file at {:?}, using defaults", config_path);
                ProbeConfig::default()
            }
        }
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    Ok(config)
}

/// Environment values win over the file. `lookup` is injectable for tests.
pub fn apply_env_overrides(config: &mut ProbeConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(host) = lookup(ENV_HOST) {
        config.bmc.host = host;
    }
    if let Some(user) = lookup(ENV_USER) {
        config.bmc.username = user;
    }
    if let Some(pass) = lookup(ENV_PASS) {
        config.bmc.password = Credential::new(pass);
    }
    if let Some(tool) = lookup(ENV_IPMITOOL) {
        config.bmc.ipmitool_path = tool;
    }
}

pub fn validate(config: &ProbeConfig) -> Result<()> {
    if config.bmc.host.trim().is_empty() {
        return Err(anyhow!(
            "BMC host is not configured. Set bmc.host in {}, {} or pass --host.",
            CONFIG_FILE_NAME,
            ENV_HOST
        ));
    }
    if config.bmc.username.trim().is_empty() {
        return Err(anyhow!("BMC username is empty"));
    }
    if config.retry.max_attempts == 0 {
        return Err(anyhow!("retry.max_attempts must be at least 1"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::time::Duration;

    use super::*;

    #[test]
    fn partial_file_fills_defaults() {
        let config: ProbeConfig = serde_json::from_str(
            r#"{"bmc": {"host": "10.1.1.5", "password": "calvin"}, "retry": {"delay_secs": 0.5}}"#,
        )
        .unwrap();

        assert_eq!(config.bmc.host, "10.1.1.5");
        assert_eq!(config.bmc.username, "admin");
        assert_eq!(config.bmc.password.expose(), "calvin");
        assert_eq!(config.bmc.ipmitool_path, "ipmitool");
        assert_eq!(config.retry.policy().max_attempts(), 3);
        assert_eq!(config.retry.policy().delay(), Duration::from_millis(500));
        assert_eq!(config.logging.log_level, "info");
        assert!(!format!("{:?}", config).contains("calvin"));
    }

    #[test]
    fn env_overrides_file_values() {
        let mut config: ProbeConfig =
            serde_json::from_str(r#"{"bmc": {"host": "10.1.1.5", "username": "root"}}"#).unwrap();
        let env: HashMap<&str, &str> = [(ENV_HOST, "192.168.0.20"), (ENV_PASS, "hunter2")].into_iter().collect();

        apply_env_overrides(&mut config, |k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.bmc.host, "192.168.0.20");
        assert_eq!(config.bmc.username, "root");
        assert_eq!(config.bmc.password.expose(), "hunter2");
    }

    #[test]
    fn missing_host_fails_validation() {
        let config = ProbeConfig::default();
        assert!(validate(&config).is_err());

        let mut config = ProbeConfig::default();
        config.bmc.host = "bmc.lab".to_string();
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn negative_delay_falls_back_to_zero() {
        let mut config = ProbeConfig::default();
        config.retry.delay_secs = -3.0;
        assert_eq!(config.retry.policy().delay(), Duration::ZERO);
    }

    #[test]
    fn reads_file_from_disk() {
        let path = std::env::temp_dir().join(format!("bmc-probe-test-{}.json", std::process::id()));
        std::fs::write(&path, r#"{"bmc": {"host": "bmc01"}, "logging": {"log_level": "debug"}}"#).unwrap();
        let config = read_config_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.bmc.host, "bmc01");
        assert_eq!(config.logging.log_level, "debug");
    }
}
