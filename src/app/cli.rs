//! Command-line argument definitions (clap).

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "pankha-bmc-probe")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Query BMC telemetry and control fans over IPMI-over-LAN via ipmitool", long_about = None)]
pub struct Args {
    /// Config file (default: bmc-probe.json next to the executable)
    #[arg(short = 'c', long, global = true, help_heading = "Connection")]
    pub config: Option<String>,

    /// BMC host or IP (overrides config and PANKHA_IPMI_HOST)
    #[arg(short = 'H', long, global = true, help_heading = "Connection")]
    pub host: Option<String>,

    /// BMC username (overrides config and PANKHA_IPMI_USER)
    #[arg(short = 'U', long, global = true, help_heading = "Connection")]
    pub user: Option<String>,

    /// BMC password (prefer PANKHA_IPMI_PASS; command lines are visible to other users)
    #[arg(short = 'P', long, global = true, help_heading = "Connection")]
    pub password: Option<String>,

    /// Attempts per command before giving up
    #[arg(long, global = true, help_heading = "Retry")]
    pub retries: Option<u32>,

    /// Seconds to wait between attempts
    #[arg(long = "retry-delay", global = true, help_heading = "Retry")]
    pub retry_delay: Option<f64>,

    /// Set log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(long = "log-level", global = true, help_heading = "Output")]
    pub log_level: Option<String>,

    /// Print results as JSON
    #[arg(long, global = true, help_heading = "Output")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Fan sensor readings
    Fans,
    /// Temperature sensor readings
    Temps,
    /// Instantaneous power draw (DCMI)
    Power,
    /// Best-effort CPU / memory / disk inventory from FRU data
    Inventory,
    /// Chassis status fields and health verdict
    Chassis,
    /// Run every query once
    Summary,
    /// Set fan speed percentage (0-100), or "auto" for BMC control
    SetFan {
        /// 0-100, "auto" or -1
        #[arg(allow_hyphen_values = true)]
        speed: String,

        /// Log the raw command instead of sending it
        #[arg(long = "dry-run")]
        dry_run: bool,
    },
}

/// "auto" (any case) maps to the automatic-mode sentinel; other values must be integers.
pub fn parse_fan_speed(value: &str) -> Result<i32, String> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("auto") {
        return Ok(crate::hardware::fan_control::AUTOMATIC_SENTINEL);
    }
    value
        .parse::<i32>()
        .map_err(|_| format!("Invalid fan speed '{}': expected 0-100 or 'auto'", value))
}
