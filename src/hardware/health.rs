//! Chassis health evaluation.
//! A fixed rule table over `chassis status` fields; a missing field reads as
//! "Unknown" and therefore never matches its healthy value.

use super::types::{ChassisFault, ChassisStatus, HealthVerdict, UNKNOWN};

struct Rule {
    field: &'static str,
    healthy: &'static str,
    fault: ChassisFault,
}

const RULES: [Rule; 6] = [
    Rule { field: "System Power", healthy: "on", fault: ChassisFault::NotPoweredOn },
    Rule { field: "Power Overload", healthy: "false", fault: ChassisFault::PowerOverload },
    Rule { field: "Main Power Fault", healthy: "false", fault: ChassisFault::MainPowerFault },
    Rule { field: "Power Control Fault", healthy: "false", fault: ChassisFault::PowerControlFault },
    Rule { field: "Drive Fault", healthy: "false", fault: ChassisFault::DriveFault },
    Rule { field: "Cooling/Fan Fault", healthy: "false", fault: ChassisFault::CoolingFault },
];

/// Apply every rule in table order. Pure: same status, same verdict.
pub fn evaluate(status: &ChassisStatus) -> HealthVerdict {
    let faults = RULES
        .iter()
        .filter(|rule| status.get(rule.field).unwrap_or(UNKNOWN) != rule.healthy)
        .map(|rule| rule.fault)
        .collect();

    HealthVerdict::from_faults(faults)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::types::{TextMap, NORMAL_VERDICT};

    fn healthy() -> ChassisStatus {
        [
            ("System Power", "on"),
            ("Power Overload", "false"),
            ("Main Power Fault", "false"),
            ("Power Control Fault", "false"),
            ("Drive Fault", "false"),
            ("Cooling/Fan Fault", "false"),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn all_healthy_fields_is_normal() {
        let verdict = evaluate(&healthy());
        assert!(verdict.is_normal());
        assert_eq!(verdict.to_string(), NORMAL_VERDICT);
    }

    #[test]
    fn power_off_and_drive_fault_listed_in_rule_order() {
        let status: TextMap = [("System Power", "off"), ("Drive Fault", "true")].into_iter().collect();
        let verdict = evaluate(&status);

        // The remaining fields are absent, default to "Unknown" and fault as well.
        assert_eq!(
            verdict.faults(),
            &[
                ChassisFault::NotPoweredOn,
                ChassisFault::PowerOverload,
                ChassisFault::MainPowerFault,
                ChassisFault::PowerControlFault,
                ChassisFault::DriveFault,
                ChassisFault::CoolingFault,
            ]
        );
        let text = verdict.to_string();
        let power = text.find("The system is not powered on").unwrap();
        let drive = text.find("Drive fault").unwrap();
        assert!(power < drive);
    }

    #[test]
    fn single_fault_only_reports_that_fault() {
        let mut status = healthy();
        status.insert("Cooling/Fan Fault", "true");
        assert_eq!(evaluate(&status).to_string(), "Cooling fault");
    }

    #[test]
    fn missing_system_power_is_reported_as_not_powered_on() {
        // Absent field and "off" are deliberately indistinguishable.
        let mut status = TextMap::new();
        for (k, v) in healthy().iter().filter(|(k, _)| *k != "System Power") {
            status.insert(k, v);
        }
        assert_eq!(evaluate(&status).faults(), &[ChassisFault::NotPoweredOn]);
    }

    #[test]
    fn values_compare_exactly() {
        let mut status = healthy();
        status.insert("System Power", "On");
        assert_eq!(evaluate(&status).faults(), &[ChassisFault::NotPoweredOn]);
    }

    #[test]
    fn evaluation_is_deterministic() {
        let status: TextMap = [("System Power", "off")].into_iter().collect();
        assert_eq!(evaluate(&status), evaluate(&status));
    }
}
