//! Pankha BMC probe: IPMI-over-LAN telemetry, chassis health and fan control
//! through an external `ipmitool` agent.

pub mod app;
pub mod config;
pub mod hardware;
pub mod system;

pub use hardware::{IpmiServerClient, ServerTelemetry};
pub use system::executor::{CommandExecutor, ConnectionParams, Credential};
pub use system::retry::RetryPolicy;
