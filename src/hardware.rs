//! ServerTelemetry trait definition and IPMI implementation.

use async_trait::async_trait;

pub mod fan_control;
pub mod health;
pub mod ipmi;
pub mod types;

pub use ipmi::ipmi_client::IpmiServerClient;

use types::{ChassisReport, HardwareInventory, SensorReadings, ServerSummary};

/// Queries against one BMC. `None`/`false` are expected outcomes of a flaky
/// management link, not programming errors.
#[async_trait]
pub trait ServerTelemetry: Send + Sync {
    /// Fan sensor name -> reading
    async fn get_fan_speed(&self) -> Option<SensorReadings>;

    /// Temperature sensor name -> reading
    async fn get_temperatures(&self) -> Option<SensorReadings>;

    /// Instantaneous power draw in watts
    async fn get_power_usage(&self) -> Option<u32>;

    /// Best-effort FRU inventory
    async fn get_hardware_info(&self) -> Option<HardwareInventory>;

    /// Chassis status fields plus health verdict
    async fn get_chassis_status(&self) -> Option<ChassisReport>;

    /// Set fan speed (0-100%), or -1 for BMC automatic control
    async fn set_fan_speed(&self, speed: i32) -> bool;

    /// Run every query once and collect the results
    async fn summary(&self) -> ServerSummary;
}
