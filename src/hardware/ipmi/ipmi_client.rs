//! IPMI server client — implements ServerTelemetry on top of the ipmitool executor.
//! Each query issues one command (with retries) and hands the raw text to a parser.

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use crate::hardware::fan_control::{self, FanSpeedRequest};
use crate::hardware::health;
use crate::hardware::types::{
    ChassisReport, HardwareInventory, SensorCategory, SensorReadings, ServerSummary,
};
use crate::hardware::ServerTelemetry;
use crate::system::executor::CommandExecutor;
use crate::system::parser;

pub const SENSOR_LIST: &str = "sensor list";
pub const POWER_READING: &str = "dcmi power reading";
pub const FRU_PRINT: &str = "fru print";
pub const CHASSIS_STATUS: &str = "chassis status";

pub struct IpmiServerClient {
    executor: CommandExecutor,
    dry_run: bool,
}

impl IpmiServerClient {
    pub fn new(executor: CommandExecutor) -> Self {
        Self { executor, dry_run: false }
    }

    /// Log control commands instead of sending them. Queries still run.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn host(&self) -> &str {
        self.executor.host()
    }

    /// Run a query; empty output counts as a failed retrieval.
    async fn query(&self, command: &str, what: &str) -> Option<String> {
        match self.executor.execute(command).await {
            Some(output) if !output.is_empty() => Some(output),
            _ => {
                warn!("Failed to retrieve {}.", what);
                None
            }
        }
    }

    fn sensor_readings(raw: &str, category: SensorCategory) -> SensorReadings {
        let readings = parser::parse_sensor_readings(raw, category);
        debug!("Parsed {} {} readings from sensor list", readings.len(), category.label());
        readings
    }
}

#[async_trait]
impl ServerTelemetry for IpmiServerClient {
    async fn get_fan_speed(&self) -> Option<SensorReadings> {
        let category = SensorCategory::Fan;
        let raw = self.query(SENSOR_LIST, category.label()).await?;
        Some(Self::sensor_readings(&raw, category))
    }

    async fn get_temperatures(&self) -> Option<SensorReadings> {
        let category = SensorCategory::Temperature;
        let raw = self.query(SENSOR_LIST, category.label()).await?;
        Some(Self::sensor_readings(&raw, category))
    }

    async fn get_power_usage(&self) -> Option<u32> {
        let raw = self.query(POWER_READING, "power usage").await?;
        let watts = parser::parse_power_reading(&raw);
        if watts.is_none() {
            warn!("No instantaneous power reading found in DCMI output.");
        }
        watts
    }

    async fn get_hardware_info(&self) -> Option<HardwareInventory> {
        let raw = self.query(FRU_PRINT, "hardware info").await?;
        Some(parser::parse_inventory(&raw))
    }

    async fn get_chassis_status(&self) -> Option<ChassisReport> {
        let raw = self.query(CHASSIS_STATUS, "chassis status").await?;
        let status = parser::parse_chassis_status(&raw);
        let verdict = health::evaluate(&status);
        Some(ChassisReport { status, verdict })
    }

    async fn set_fan_speed(&self, speed: i32) -> bool {
        let request = match FanSpeedRequest::try_from(speed) {
            Ok(r) => r,
            Err(e) => {
                error!("Error: {}", e);
                return false;
            }
        };

        let command = fan_control::encode(request);
        info!("Setting fan speed on {}: {:?} -> ipmitool {}", self.host(), request, command);

        if self.dry_run {
            info!("[DRY RUN] Would execute: ipmitool {}", command);
            return true;
        }

        // Raw commands often print nothing; only absence means failure.
        match self.executor.execute(&command).await {
            Some(_) => {
                info!("The fan speed has been successfully set.");
                true
            }
            None => {
                error!("Fan speed setting failed.");
                false
            }
        }
    }

    async fn summary(&self) -> ServerSummary {
        // One sensor list feeds both fan and temperature readings.
        let sensors = self.query(SENSOR_LIST, "sensor list").await;
        let fans = sensors.as_deref().map(|raw| Self::sensor_readings(raw, SensorCategory::Fan));
        let temperatures = sensors
            .as_deref()
            .map(|raw| Self::sensor_readings(raw, SensorCategory::Temperature));

        ServerSummary {
            host: self.host().to_string(),
            collected_at: chrono::Utc::now(),
            fans,
            temperatures,
            power_watts: self.get_power_usage().await,
            inventory: self.get_hardware_info().await,
            chassis: self.get_chassis_status().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::hardware::types::{ChassisFault, HealthVerdict};
    use crate::system::executor::testing::{params, ScriptedRunner};
    use crate::system::retry::RetryPolicy;

    fn client(runner: Arc<ScriptedRunner>) -> IpmiServerClient {
        IpmiServerClient::new(CommandExecutor::new(
            params(),
            runner,
            RetryPolicy::new(3, Duration::ZERO),
        ))
    }

    fn last_tokens(runner: &ScriptedRunner) -> Vec<String> {
        let calls = runner.calls.lock().unwrap();
        calls.last().map(|args| args[8..].to_vec()).unwrap_or_default()
    }

    #[tokio::test]
    async fn fan_speed_from_sensor_list() {
        let runner = Arc::new(ScriptedRunner::new().succeed(
            "FAN1 | 1800.000 | RPM | ok\nCPU Temp | 40.000 | degrees C | ok\nFAN2 | 1750.000 | RPM | ok\n",
        ));
        let fans = client(runner.clone()).get_fan_speed().await.unwrap();

        assert_eq!(fans.get("FAN1"), Some("1800.000"));
        assert_eq!(fans.get("FAN2"), Some("1750.000"));
        assert_eq!(fans.len(), 2);
        assert_eq!(last_tokens(&runner), vec!["sensor", "list"]);
    }

    #[tokio::test]
    async fn temperatures_absent_when_query_fails() {
        let runner = Arc::new(
            ScriptedRunner::new()
                .fail(1, "Unable to establish session")
                .fail(1, "Unable to establish session")
                .fail(1, "Unable to establish session"),
        );
        assert!(client(runner.clone()).get_temperatures().await.is_none());
        assert_eq!(runner.call_count(), 3);
    }

    #[tokio::test]
    async fn empty_output_counts_as_failed_retrieval() {
        let runner = Arc::new(ScriptedRunner::new().succeed("   \n"));
        assert!(client(runner).get_hardware_info().await.is_none());
    }

    #[tokio::test]
    async fn power_usage_parses_watts() {
        let runner = Arc::new(ScriptedRunner::new().succeed("Instantaneous power : 150 Watts"));
        assert_eq!(client(runner.clone()).get_power_usage().await, Some(150));
        assert_eq!(last_tokens(&runner), vec!["dcmi", "power", "reading"]);
    }

    #[tokio::test]
    async fn power_usage_absent_on_pattern_miss() {
        let runner = Arc::new(ScriptedRunner::new().succeed("DCMI request failed because: Invalid command"));
        assert_eq!(client(runner).get_power_usage().await, None);
    }

    #[tokio::test]
    async fn chassis_status_with_verdict() {
        let raw = "\
System Power         : on
Power Overload       : false
Power Interlock      : inactive
Main Power Fault     : false
Power Control Fault  : false
Power Restore Policy : always-off
Last Power Event     :
Chassis Intrusion    : inactive
Front-Panel Lockout  : inactive
Drive Fault          : true
Cooling/Fan Fault    : false";
        let runner = Arc::new(ScriptedRunner::new().succeed(raw));
        let report = client(runner).get_chassis_status().await.unwrap();

        assert_eq!(report.status.get("Last Power Event"), Some(""));
        assert_eq!(report.status.len(), 11);
        assert_eq!(report.verdict, HealthVerdict::Faults(vec![ChassisFault::DriveFault]));
    }

    #[tokio::test]
    async fn set_fan_speed_manual() {
        let runner = Arc::new(ScriptedRunner::new().succeed(""));
        assert!(client(runner.clone()).set_fan_speed(50).await);
        assert_eq!(last_tokens(&runner), vec!["raw", "0x30", "0x30", "0x02", "0xff", "0x80"]);
    }

    #[tokio::test]
    async fn set_fan_speed_automatic() {
        let runner = Arc::new(ScriptedRunner::new().succeed(""));
        assert!(client(runner.clone()).set_fan_speed(-1).await);
        assert_eq!(last_tokens(&runner), vec!["raw", "0x30", "0x30", "0x01", "0x00"]);
    }

    #[tokio::test]
    async fn invalid_fan_speed_never_reaches_agent() {
        let runner = Arc::new(ScriptedRunner::new().succeed(""));
        let c = client(runner.clone());
        assert!(!c.set_fan_speed(101).await);
        assert!(!c.set_fan_speed(-2).await);
        assert_eq!(runner.call_count(), 0);
    }

    #[tokio::test]
    async fn set_fan_speed_fails_when_agent_fails() {
        let runner = Arc::new(ScriptedRunner::new().missing_binary().missing_binary().missing_binary());
        assert!(!client(runner.clone()).set_fan_speed(30).await);
        assert_eq!(runner.call_count(), 3);
    }

    #[tokio::test]
    async fn dry_run_skips_agent() {
        let runner = Arc::new(ScriptedRunner::new());
        let c = client(runner.clone()).with_dry_run(true);
        assert!(c.set_fan_speed(75).await);
        assert_eq!(runner.call_count(), 0);
    }

    #[tokio::test]
    async fn summary_reuses_single_sensor_list() {
        let runner = Arc::new(
            ScriptedRunner::new()
                .succeed("FAN1 | 1800 | RPM\nInlet Temp | 22 | degrees C")
                .succeed("Instantaneous power : 210 Watts")
                .fail(1, "FRU not present")
                .fail(1, "FRU not present")
                .fail(1, "FRU not present")
                .succeed("System Power : off"),
        );
        let summary = client(runner.clone()).summary().await;

        assert_eq!(summary.host, "10.0.0.42");
        assert_eq!(summary.fans.unwrap().get("FAN1"), Some("1800"));
        assert_eq!(summary.temperatures.unwrap().get("Inlet Temp"), Some("22"));
        assert_eq!(summary.power_watts, Some(210));
        assert!(summary.inventory.is_none());
        let chassis = summary.chassis.unwrap();
        assert_eq!(chassis.verdict.faults().first(), Some(&ChassisFault::NotPoweredOn));
        assert_eq!(runner.call_count(), 6);
    }
}
