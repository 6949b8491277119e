//! pankha-bmc-probe entry point: config resolution, logging, CLI dispatch.

use std::sync::Arc;

use anyhow::{anyhow, Result};
use clap::Parser;
use serde::Serialize;
use tracing::debug;

use pankha_bmc_probe::app::cli::{parse_fan_speed, Args, Command};
use pankha_bmc_probe::app::logging::{init_tracing, normalize_level};
use pankha_bmc_probe::config::persistence::{load_config, validate};
use pankha_bmc_probe::config::types::ProbeConfig;
use pankha_bmc_probe::hardware::types::{ChassisReport, HardwareInventory, SensorReadings, ServerSummary};
use pankha_bmc_probe::hardware::{IpmiServerClient, ServerTelemetry};
use pankha_bmc_probe::system::executor::{CommandExecutor, Credential, IpmitoolRunner};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = load_config(args.config.as_deref()).await?;
    apply_cli_overrides(&mut config, &args);

    // Priority: 1. --log-level flag, 2. LOG_LEVEL env, 3. config file, 4. default (info)
    let requested = args
        .log_level
        .clone()
        .or_else(|| std::env::var("LOG_LEVEL").ok())
        .unwrap_or_else(|| config.logging.log_level.clone());
    let level = normalize_level(&requested)
        .ok_or_else(|| anyhow!("Invalid log level '{}'. Use TRACE, DEBUG, INFO, WARN or ERROR", requested))?;
    init_tracing(level);

    validate(&config)?;

    let runner = Arc::new(IpmitoolRunner::new(config.bmc.ipmitool_path.clone()));
    let executor = CommandExecutor::new(config.bmc.connection_params(), runner, config.retry.policy());
    debug!(
        "Probing {} as {} ({} attempts, {:?} between attempts)",
        config.bmc.host,
        config.bmc.username,
        executor.policy().max_attempts(),
        executor.policy().delay()
    );

    let dry_run = matches!(args.command, Command::SetFan { dry_run: true, .. });
    let client: Arc<dyn ServerTelemetry> = Arc::new(IpmiServerClient::new(executor).with_dry_run(dry_run));

    let ok = match &args.command {
        Command::Fans => emit(client.get_fan_speed().await, args.json, render_readings),
        Command::Temps => emit(client.get_temperatures().await, args.json, render_readings),
        Command::Power => emit(client.get_power_usage().await, args.json, |w| format!("Power usage: {} Watts", w)),
        Command::Inventory => emit(client.get_hardware_info().await, args.json, render_inventory),
        Command::Chassis => emit(client.get_chassis_status().await, args.json, render_chassis),
        Command::Summary => emit(Some(client.summary().await), args.json, render_summary),
        Command::SetFan { speed, .. } => {
            let speed = parse_fan_speed(speed).map_err(|e| anyhow!(e))?;
            client.set_fan_speed(speed).await
        }
    };

    if !ok {
        std::process::exit(1);
    }
    Ok(())
}

fn apply_cli_overrides(config: &mut ProbeConfig, args: &Args) {
    if let Some(host) = &args.host {
        config.bmc.host = host.clone();
    }
    if let Some(user) = &args.user {
        config.bmc.username = user.clone();
    }
    if let Some(pass) = &args.password {
        config.bmc.password = Credential::new(pass.clone());
    }
    if let Some(retries) = args.retries {
        config.retry.max_attempts = retries;
    }
    if let Some(delay) = args.retry_delay {
        config.retry.delay_secs = delay;
    }
}

/// Print `value` as JSON or text. Returns false when there was nothing to print.
fn emit<T: Serialize>(value: Option<T>, json: bool, render: impl Fn(&T) -> String) -> bool {
    let Some(value) = value else {
        return false;
    };

    if json {
        match serde_json::to_string_pretty(&value) {
            Ok(s) => println!("{}", s),
            Err(e) => {
                eprintln!("Failed to serialize result: {}", e);
                return false;
            }
        }
    } else {
        println!("{}", render(&value));
    }
    true
}

fn render_readings(readings: &SensorReadings) -> String {
    if readings.is_empty() {
        return "(no matching sensors)".to_string();
    }
    readings
        .iter()
        .map(|(name, value)| format!("{}: {}", name, value))
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_inventory(inv: &HardwareInventory) -> String {
    format!("CPU: {}\nMemory: {}\nDisk: {}", inv.cpu, inv.memory, inv.disk)
}

fn render_chassis(report: &ChassisReport) -> String {
    format!("{}\n\n{}", render_readings(&report.status), report.verdict)
}

fn render_summary(summary: &ServerSummary) -> String {
    let missing = || "(unavailable)".to_string();
    let sections = [
        format!("Host: {} ({})", summary.host, summary.collected_at.to_rfc3339()),
        format!("== Fans\n{}", summary.fans.as_ref().map_or_else(missing, render_readings)),
        format!("== Temperatures\n{}", summary.temperatures.as_ref().map_or_else(missing, render_readings)),
        format!(
            "== Power\n{}",
            summary.power_watts.map_or_else(missing, |w| format!("{} Watts", w))
        ),
        format!("== Inventory\n{}", summary.inventory.as_ref().map_or_else(missing, render_inventory)),
        format!("== Chassis\n{}", summary.chassis.as_ref().map_or_else(missing, render_chassis)),
    ];
    sections.join("\n\n")
}
