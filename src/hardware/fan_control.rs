//! Fan speed control encoding.
//! Translates a UI percentage (0-100) or the automatic-mode sentinel (-1) into
//! the vendor raw command sent through ipmitool.

use thiserror::Error;

/// Hand fan control back to the BMC.
pub const AUTOMATIC_MODE_COMMAND: &str = "raw 0x30 0x30 0x01 0x00";

/// Manual duty cycle for all fans; `{{SPEED_HEX}}` is the scaled byte.
pub const MANUAL_SPEED_TEMPLATE: &str = "raw 0x30 0x30 0x02 0xff {{SPEED_HEX}}";

pub const AUTOMATIC_SENTINEL: i32 = -1;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FanControlError {
    #[error("The speed value must be between 0-100, or set to automatic mode using -1 (got {0})")]
    OutOfRange(i32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FanSpeedRequest {
    Automatic,
    Manual(u8),
}

impl TryFrom<i32> for FanSpeedRequest {
    type Error = FanControlError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            AUTOMATIC_SENTINEL => Ok(FanSpeedRequest::Automatic),
            0..=100 => Ok(FanSpeedRequest::Manual(value as u8)),
            _ => Err(FanControlError::OutOfRange(value)),
        }
    }
}

/// 0-100% -> 0x00-0xff, rounded half away from zero: 50% -> 127.5 -> 0x80.
pub fn scale_to_byte(percent: u8) -> u8 {
    let percent = u32::from(percent.min(100));
    ((percent * 255 + 50) / 100) as u8
}

/// Substitute {{SPEED_HEX}} in a raw command template.
pub fn interpolate_command(template: &str, speed_hex: &str) -> String {
    template.replace("{{SPEED_HEX}}", speed_hex)
}

/// Full ipmitool command text (without connection prefix) for `request`.
pub fn encode(request: FanSpeedRequest) -> String {
    match request {
        FanSpeedRequest::Automatic => AUTOMATIC_MODE_COMMAND.to_string(),
        FanSpeedRequest::Manual(percent) => {
            let speed_hex = format!("0x{:02x}", scale_to_byte(percent));
            interpolate_command(MANUAL_SPEED_TEMPLATE, &speed_hex)
        }
    }
}
