use isoterma_core::geo::{Coordinate, CoordinateError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

pub const MAX_FORECAST_DAYS: u8 = 7;
pub const DEFAULT_FORECAST_DAYS: u8 = 3;

pub type Coordinates = Coordinate;

pub fn coordinates(latitude: f64, longitude: f64) -> Result<Coordinates, CoordinateError> {
    Coordinate::new(latitude, longitude)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("forecast_days must be between 1 and {max}, got {0}", max = MAX_FORECAST_DAYS)]
pub struct ForecastDaysError(pub i64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ForecastDays(u8);

impl ForecastDays {
    pub fn new(days: i64) -> Result<Self, ForecastDaysError> {
        match u8::try_from(days) {
            Ok(days) if (1..=MAX_FORECAST_DAYS).contains(&days) => Ok(Self(days)),
            _ => Err(ForecastDaysError(days)),
        }
    }

    pub fn get(&self) -> u8 {
        self.0
    }
}

impl Default for ForecastDays {
    fn default() -> Self {
        Self(DEFAULT_FORECAST_DAYS)
    }
}

impl fmt::Display for ForecastDays {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Open-Meteo forecast payload. Variables we do not model stay in the flattened maps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResponse {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub elevation: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current: Option<CurrentConditions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hourly: Option<HourlySeries>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily: Option<DailySeries>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub temperature_2m: Option<f64>,
    #[serde(flatten)]
    pub variables: Map<String, Value>,
}

impl CurrentConditions {
    pub fn value(&self, variable: &str) -> Option<f64> {
        match variable {
            "temperature_2m" => self.temperature_2m,
            other => self.variables.get(other).and_then(Value::as_f64),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlySeries {
    #[serde(default)]
    pub time: Vec<String>,
    #[serde(default)]
    pub temperature_2m: Vec<Option<f64>>,
    #[serde(flatten)]
    pub variables: Map<String, Value>,
}

impl HourlySeries {
    pub fn series(&self, variable: &str) -> Option<Vec<Option<f64>>> {
        if variable == "temperature_2m" {
            return Some(self.temperature_2m.clone());
        }
        numeric_series(self.variables.get(variable)?)
    }

    /// Temperature every `step` hours within the first `span` hours.
    pub fn samples(&self, step: usize, span: usize) -> Vec<(String, Option<f64>)> {
        self.time
            .iter()
            .zip(self.temperature_2m.iter())
            .take(span)
            .step_by(step.max(1))
            .map(|(time, temperature)| (time.clone(), *temperature))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySeries {
    #[serde(default)]
    pub time: Vec<String>,
    #[serde(flatten)]
    pub variables: Map<String, Value>,
}

impl DailySeries {
    pub fn value(&self, variable: &str, day: usize) -> Option<&Value> {
        self.variables.get(variable)?.as_array()?.get(day)
    }
}

fn numeric_series(value: &Value) -> Option<Vec<Option<f64>>> {
    Some(value.as_array()?.iter().map(Value::as_f64).collect())
}
