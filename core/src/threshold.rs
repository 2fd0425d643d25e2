use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TemperatureBand {
    pub min: f64,
    pub max: f64,
}

impl Default for TemperatureBand {
    fn default() -> Self {
        // 2 °C is the frost alarm used on the inverted heatmaps
        Self {
            min: 2.0,
            max: 35.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BandStatus {
    Below,
    Within,
    Above,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BandError {
    #[error("temperature band limits must be numbers (min {min}, max {max})")]
    NotANumber { min: f64, max: f64 },
    #[error("invalid temperature band: min {min} > max {max}")]
    Inverted { min: f64, max: f64 },
}

impl TemperatureBand {
    pub fn new(min: f64, max: f64) -> Result<Self, BandError> {
        if min.is_nan() || max.is_nan() {
            return Err(BandError::NotANumber { min, max });
        }
        if min > max {
            return Err(BandError::Inverted { min, max });
        }
        Ok(Self { min, max })
    }

    pub fn evaluate(&self, temperature: f64) -> BandStatus {
        if temperature < self.min {
            BandStatus::Below
        } else if temperature > self.max {
            BandStatus::Above
        } else {
            BandStatus::Within
        }
    }
}

/// Heatmap weight flag: 1 when strictly below the threshold.
pub fn below_threshold(temperature: f64, threshold: f64) -> u8 {
    u8::from(temperature < threshold)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum AlertSource {
    Current { time: Option<String> },
    Forecast { time: String, hour_index: usize },
    Sensor { sensor_id: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdAlert {
    pub source: AlertSource,
    pub temperature: f64,
    pub status: BandStatus,
    pub limit: f64,
    pub message: String,
}

pub fn evaluate_reading(
    band: &TemperatureBand,
    source: AlertSource,
    temperature: f64,
) -> Option<ThresholdAlert> {
    let status = band.evaluate(temperature);
    let (limit, direction) = match status {
        BandStatus::Within => return None,
        BandStatus::Below => (band.min, "below minimum"),
        BandStatus::Above => (band.max, "above maximum"),
    };
    let label = match &source {
        AlertSource::Current { .. } => "current reading".to_string(),
        AlertSource::Forecast { time, .. } => format!("forecast {time}"),
        AlertSource::Sensor { sensor_id } => format!("sensor {sensor_id}"),
    };
    Some(ThresholdAlert {
        message: format!("{label}: {temperature:.1}°C {direction} {limit:.1}°C"),
        source,
        temperature,
        status,
        limit,
    })
}

/// One check per forecast hour; hours without a value are skipped and
/// the longer of `times`/`temperatures` is cut to the shorter.
pub fn evaluate_series(
    band: &TemperatureBand,
    times: &[String],
    temperatures: &[Option<f64>],
) -> Vec<ThresholdAlert> {
    times
        .iter()
        .zip(temperatures)
        .enumerate()
        .filter_map(|(hour_index, (time, temperature))| {
            let temperature = (*temperature)?;
            evaluate_reading(
                band,
                AlertSource::Forecast {
                    time: time.clone(),
                    hour_index,
                },
                temperature,
            )
        })
        .collect()
}
