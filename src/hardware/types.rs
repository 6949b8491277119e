//! Hardware data types: sensor readings, inventory, chassis status and health verdict.

use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};

pub const UNKNOWN: &str = "Unknown";

/// Which `sensor list` records a reading mapping collects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorCategory {
    Fan,
    Temperature,
}

impl SensorCategory {
    /// Case-sensitive substrings a sensor name must contain.
    pub fn match_tokens(&self) -> &'static [&'static str] {
        match self {
            SensorCategory::Fan => &["Fan", "FAN"],
            SensorCategory::Temperature => &["Temp", "TEMP"],
        }
    }

    pub fn matches(&self, name: &str) -> bool {
        self.match_tokens().iter().any(|token| name.contains(token))
    }

    pub fn label(&self) -> &'static str {
        match self {
            SensorCategory::Fan => "fan speed",
            SensorCategory::Temperature => "temperatures",
        }
    }
}

/// Insertion-ordered name -> text map. Re-inserting a name replaces its value
/// in place.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct TextMap(Map<String, Value>);

impl TextMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), Value::String(value.into()));
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(Value::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str().unwrap_or_default()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for TextMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = TextMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

/// Sensor name (as reported) -> reading text.
pub type SensorReadings = TextMap;

/// `chassis status` field -> value, e.g. "System Power" -> "on".
pub type ChassisStatus = TextMap;

/// Best-effort inventory scraped from `fru print`. Not authoritative: many
/// vendors only expose drives through OEM extensions, so `disk` is usually
/// "Unknown".
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HardwareInventory {
    #[serde(rename = "CPU")]
    pub cpu: String,
    #[serde(rename = "Memory")]
    pub memory: String,
    #[serde(rename = "Disk")]
    pub disk: String,
}

impl Default for HardwareInventory {
    fn default() -> Self {
        Self {
            cpu: UNKNOWN.to_string(),
            memory: UNKNOWN.to_string(),
            disk: UNKNOWN.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChassisFault {
    NotPoweredOn,
    PowerOverload,
    MainPowerFault,
    PowerControlFault,
    DriveFault,
    CoolingFault,
}

impl ChassisFault {
    pub fn description(&self) -> &'static str {
        match self {
            ChassisFault::NotPoweredOn => "The system is not powered on",
            ChassisFault::PowerOverload => "Power supply overload",
            ChassisFault::MainPowerFault => "Main power fault",
            ChassisFault::PowerControlFault => "Power control fault",
            ChassisFault::DriveFault => "Drive fault",
            ChassisFault::CoolingFault => "Cooling fault",
        }
    }
}

impl fmt::Display for ChassisFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

pub const NORMAL_VERDICT: &str = "The server is running normally";

/// Either normal, or at least one fault in rule order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "faults", rename_all = "snake_case")]
pub enum HealthVerdict {
    Normal,
    Faults(Vec<ChassisFault>),
}

impl HealthVerdict {
    pub fn from_faults(faults: Vec<ChassisFault>) -> Self {
        if faults.is_empty() {
            HealthVerdict::Normal
        } else {
            HealthVerdict::Faults(faults)
        }
    }

    pub fn is_normal(&self) -> bool {
        matches!(self, HealthVerdict::Normal)
    }

    pub fn faults(&self) -> &[ChassisFault] {
        match self {
            HealthVerdict::Normal => &[],
            HealthVerdict::Faults(faults) => faults,
        }
    }
}

impl fmt::Display for HealthVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HealthVerdict::Normal => f.write_str(NORMAL_VERDICT),
            HealthVerdict::Faults(faults) => {
                let lines: Vec<&str> = faults.iter().map(ChassisFault::description).collect();
                f.write_str(&lines.join("\n"))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChassisReport {
    pub status: ChassisStatus,
    pub verdict: HealthVerdict,
}

/// Everything a single probe run collected. Each part is independently optional.
#[derive(Debug, Clone, Serialize)]
pub struct ServerSummary {
    pub host: String,
    pub collected_at: chrono::DateTime<chrono::Utc>,
    pub fans: Option<SensorReadings>,
    pub temperatures: Option<SensorReadings>,
    pub power_watts: Option<u32>,
    pub inventory: Option<HardwareInventory>,
    pub chassis: Option<ChassisReport>,
}
