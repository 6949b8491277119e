//! ipmitool text output parsers.
//! Record tokenizers return tagged results so malformed lines are an explicit
//! `Skipped` path rather than a silent fallthrough.

use std::sync::OnceLock;

use regex::Regex;

use crate::hardware::types::{ChassisStatus, HardwareInventory, SensorCategory, SensorReadings, UNKNOWN};

/// One `sensor list` line: "FAN1 | 1800.000 | RPM | ok | ..."
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SensorRecord<'a> {
    Reading { name: &'a str, value: &'a str },
    Skipped,
}

/// One `chassis status` line: "System Power : on"
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusLine<'a> {
    Field { key: &'a str, value: &'a str },
    Skipped,
}

/// Fields past the second are ignored; fewer than two fields is `Skipped`.
pub fn parse_sensor_record(line: &str) -> SensorRecord<'_> {
    let mut fields = line.split('|');
    match (fields.next(), fields.next()) {
        (Some(name), Some(value)) => SensorRecord::Reading {
            name: name.trim(),
            value: value.trim(),
        },
        _ => SensorRecord::Skipped,
    }
}

/// Splits on the first colon only, so values may contain colons.
pub fn parse_status_line(line: &str) -> StatusLine<'_> {
    match line.split_once(':') {
        Some((key, value)) => StatusLine::Field {
            key: key.trim(),
            value: value.trim(),
        },
        None => StatusLine::Skipped,
    }
}

/// Collect readings whose sensor name matches `category`, in output order.
pub fn parse_sensor_readings(raw: &str, category: SensorCategory) -> SensorReadings {
    let mut readings = SensorReadings::new();
    for line in raw.lines() {
        if let SensorRecord::Reading { name, value } = parse_sensor_record(line) {
            if category.matches(name) {
                readings.insert(name, value);
            }
        }
    }
    readings
}

pub fn parse_chassis_status(raw: &str) -> ChassisStatus {
    let mut status = ChassisStatus::new();
    for line in raw.lines() {
        if let StatusLine::Field { key, value } = parse_status_line(line) {
            status.insert(key, value);
        }
    }
    status
}

fn power_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"Instantaneous power\s*:\s*(\d+)\s*Watts").expect("valid power regex"))
}

/// Instantaneous power in watts from `dcmi power reading`. First match wins.
pub fn parse_power_reading(raw: &str) -> Option<u32> {
    power_pattern()
        .captures(raw)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

fn inventory_patterns() -> &'static [Regex; 3] {
    static RE: OnceLock<[Regex; 3]> = OnceLock::new();
    RE.get_or_init(|| {
        [
            Regex::new(r"Processor\s*:\s*(.*)").expect("valid processor regex"),
            Regex::new(r"Total Memory\s*:\s*(.*)").expect("valid memory regex"),
            // Generic FRU field; most vendors need an OEM query for drives.
            Regex::new(r"Drive\s*:\s*(.*)").expect("valid drive regex"),
        ]
    })
}

fn capture_field(re: &Regex, raw: &str) -> String {
    re.captures(raw)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_else(|| UNKNOWN.to_string())
}

/// Scrape CPU, memory and disk from `fru print`. Each field is independent.
pub fn parse_inventory(raw: &str) -> HardwareInventory {
    let [cpu, memory, disk] = inventory_patterns();
    HardwareInventory {
        cpu: capture_field(cpu, raw),
        memory: capture_field(memory, raw),
        disk: capture_field(disk, raw),
    }
}
