use crate::thermal::round_to;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CalibrationStatus {
    Ok,
    Warning,
    Error,
}

impl CalibrationStatus {
    pub fn from_difference(difference: f64) -> Self {
        if difference < 2.0 {
            CalibrationStatus::Ok
        } else if difference < 5.0 {
            CalibrationStatus::Warning
        } else {
            CalibrationStatus::Error
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            CalibrationStatus::Ok => "Sensor calibrated correctly",
            CalibrationStatus::Warning => "Review sensor calibration",
            CalibrationStatus::Error => "Sensor requires attention - significant deviation",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorValidation {
    pub measured_temperature: f64,
    pub api_temperature: f64,
    pub difference: f64,
    pub status: CalibrationStatus,
    pub message: String,
}

impl SensorValidation {
    pub fn compare(measured_temperature: f64, api_temperature: f64) -> Self {
        let difference = (api_temperature - measured_temperature).abs();
        let status = CalibrationStatus::from_difference(difference);
        Self {
            measured_temperature,
            api_temperature,
            difference: round_to(difference, 2),
            status,
            message: status.message().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_boundaries() {
        assert_eq!(CalibrationStatus::from_difference(1.99), CalibrationStatus::Ok);
        assert_eq!(CalibrationStatus::from_difference(2.0), CalibrationStatus::Warning);
        assert_eq!(CalibrationStatus::from_difference(4.99), CalibrationStatus::Warning);
        assert_eq!(CalibrationStatus::from_difference(5.0), CalibrationStatus::Error);
    }

    #[test]
    fn compare_rounds_difference() {
        let validation = SensorValidation::compare(18.0, 21.456);
        assert_eq!(validation.difference, 3.46);
        assert_eq!(validation.status, CalibrationStatus::Warning);
        assert_eq!(validation.message, "Review sensor calibration");
    }

    #[test]
    fn status_serializes_uppercase() {
        let json = serde_json::to_string(&CalibrationStatus::Ok).unwrap();
        assert_eq!(json, "\"OK\"");
    }
}
