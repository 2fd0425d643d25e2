use crate::geo::{Bounds, Coordinate, CoordinateError};
use crate::threshold::{AlertSource, BandError, TemperatureBand, ThresholdAlert, evaluate_reading};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    pub address: String,
    pub region: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorStatus {
    Active,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sensor {
    pub id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub status: SensorStatus,
    #[serde(default)]
    pub temperature: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FarmValidationError {
    #[error("farm id is empty")]
    EmptyId,
    #[error("farm '{0}' has an empty name")]
    EmptyName(String),
    #[error("farm '{farm_id}' location: {source}")]
    Location {
        farm_id: String,
        source: CoordinateError,
    },
    #[error("farm '{0}' has inverted bounds")]
    InvertedBounds(String),
    #[error("farm '{farm_id}' thresholds: {source}")]
    Thresholds { farm_id: String, source: BandError },
    #[error("farm '{farm_id}' has duplicate sensor id '{sensor_id}'")]
    DuplicateSensor { farm_id: String, sensor_id: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Farm {
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub location: Location,
    pub area_hectares: f64,
    pub bounds: Bounds,
    #[serde(default)]
    pub sensors: Vec<Sensor>,
    #[serde(default)]
    pub crops: Vec<String>,
    pub owner: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thresholds: Option<TemperatureBand>,
}

impl Farm {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate {
            latitude: self.location.latitude,
            longitude: self.location.longitude,
        }
    }

    pub fn temperature_band(&self) -> TemperatureBand {
        self.band_or(TemperatureBand::default())
    }

    /// The farm's own band, else `fallback`.
    pub fn band_or(&self, fallback: TemperatureBand) -> TemperatureBand {
        self.thresholds.unwrap_or(fallback)
    }

    pub fn sensor_alerts(&self) -> Vec<ThresholdAlert> {
        self.sensor_alerts_within(&self.temperature_band())
    }

    pub fn sensor_alerts_within(&self, band: &TemperatureBand) -> Vec<ThresholdAlert> {
        self.sensors
            .iter()
            .filter_map(|sensor| {
                let temperature = sensor.temperature?;
                evaluate_reading(
                    band,
                    AlertSource::Sensor {
                        sensor_id: sensor.id.clone(),
                    },
                    temperature,
                )
            })
            .collect()
    }

    pub fn validate(&self) -> Result<(), FarmValidationError> {
        if self.id.trim().is_empty() {
            return Err(FarmValidationError::EmptyId);
        }
        if self.name.trim().is_empty() {
            return Err(FarmValidationError::EmptyName(self.id.clone()));
        }
        self.coordinate()
            .validate()
            .map_err(|source| FarmValidationError::Location {
                farm_id: self.id.clone(),
                source,
            })?;
        if !self.bounds.is_valid() {
            return Err(FarmValidationError::InvertedBounds(self.id.clone()));
        }
        if let Some(band) = self.thresholds {
            TemperatureBand::new(band.min, band.max).map_err(|source| {
                FarmValidationError::Thresholds {
                    farm_id: self.id.clone(),
                    source,
                }
            })?;
        }
        let mut seen = HashSet::new();
        for sensor in &self.sensors {
            if !seen.insert(sensor.id.as_str()) {
                return Err(FarmValidationError::DuplicateSensor {
                    farm_id: self.id.clone(),
                    sensor_id: sensor.id.clone(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::threshold::BandStatus;
    use serde_json::json;

    fn sample_farm_json() -> serde_json::Value {
        json!({
            "id": "finca-rio-negro",
            "name": "Finca Río Negro",
            "location": {
                "latitude": -39.164,
                "longitude": -67.035,
                "address": "Ruta 22 km 1180",
                "region": "Río Negro"
            },
            "area_hectares": 32.5,
            "bounds": {"north": -39.163552, "south": -39.169029, "west": -67.038406, "east": -67.028948},
            "sensors": [
                {"id": "S_001", "latitude": -39.1636, "longitude": -67.0384, "status": "active", "temperature": 14.2},
                {"id": "S_002", "latitude": -39.1644, "longitude": -67.0374, "status": "warning", "temperature": 1.1},
                {"id": "S_003", "latitude": -39.1652, "longitude": -67.0364, "status": "error"}
            ],
            "crops": ["manzana", "pera"],
            "owner": "Cooperativa Alto Valle",
            "created_at": "2025-01-15T10:00:00Z"
        })
    }

    #[test]
    fn farm_deserializes_without_thresholds() {
        let farm: Farm = serde_json::from_value(sample_farm_json()).unwrap();
        assert_eq!(farm.sensors.len(), 3);
        assert_eq!(farm.sensors[2].temperature, None);
        assert_eq!(farm.thresholds, None);
        assert_eq!(farm.temperature_band(), TemperatureBand::default());
        let back = serde_json::to_value(&farm).unwrap();
        assert!(back.get("thresholds").is_none());
    }

    #[test]
    fn sensor_alerts_flag_cold_sensor() {
        let farm: Farm = serde_json::from_value(sample_farm_json()).unwrap();
        let alerts = farm.sensor_alerts();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].status, BandStatus::Below);
        assert_eq!(
            alerts[0].source,
            AlertSource::Sensor {
                sensor_id: "S_002".to_string()
            }
        );
    }

    #[test]
    fn custom_thresholds_are_used() {
        let mut farm: Farm = serde_json::from_value(sample_farm_json()).unwrap();
        farm.thresholds = Some(TemperatureBand::new(15.0, 30.0).unwrap());
        assert_eq!(farm.sensor_alerts().len(), 2);
    }

    #[test]
    fn validate_rejects_duplicate_sensors() {
        let mut farm: Farm = serde_json::from_value(sample_farm_json()).unwrap();
        assert!(farm.validate().is_ok());
        farm.sensors[1].id = "S_001".to_string();
        let err = farm.validate().unwrap_err();
        assert_eq!(
            err,
            FarmValidationError::DuplicateSensor {
                farm_id: "finca-rio-negro".to_string(),
                sensor_id: "S_001".to_string(),
            }
        );
        assert_eq!(
            err.to_string(),
            "farm 'finca-rio-negro' has duplicate sensor id 'S_001'"
        );
    }

    #[test]
    fn validate_rejects_bad_location() {
        let mut farm: Farm = serde_json::from_value(sample_farm_json()).unwrap();
        farm.location.latitude = -120.0;
        assert!(matches!(
            farm.validate(),
            Err(FarmValidationError::Location {
                source: CoordinateError::Latitude(_),
                ..
            })
        ));
        farm.location.latitude = -39.0;
        farm.id = " ".to_string();
        assert_eq!(farm.validate().unwrap_err(), FarmValidationError::EmptyId);
    }

    #[test]
    fn validate_rejects_inverted_thresholds() {
        let mut farm: Farm = serde_json::from_value(sample_farm_json()).unwrap();
        farm.thresholds = Some(TemperatureBand { min: 30.0, max: 10.0 });
        assert_eq!(
            farm.validate().unwrap_err().to_string(),
            "farm 'finca-rio-negro' thresholds: invalid temperature band: min 30 > max 10"
        );
    }

    #[test]
    fn missing_id_deserializes_empty() {
        let mut value = sample_farm_json();
        value.as_object_mut().unwrap().remove("id");
        let farm: Farm = serde_json::from_value(value).unwrap();
        assert_eq!(farm.id, "");
        assert_eq!(farm.validate().unwrap_err(), FarmValidationError::EmptyId);
    }
}
