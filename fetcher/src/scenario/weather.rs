use super::{Context, Scenario, ScenarioError, ScenarioResult};
use crate::logging::Logger;
use anyhow::Context as _;
use chrono::NaiveDateTime;
use isoterma_core::calibration::{CalibrationStatus, SensorValidation};
use isoterma_weather::{Coordinates, ForecastDays, ForecastResponse};

const REPORT_FILE: &str = "respuesta_completa.json";
const SAMPLE_STEP_HOURS: usize = 6;
const SAMPLE_SPAN_HOURS: usize = 24;

const CURRENT_SUMMARY: &[&str] = &[
    "temperature_2m",
    "relative_humidity_2m",
    "apparent_temperature",
    "precipitation",
    "wind_speed_10m",
    "wind_gusts_10m",
];
const HOURLY_SUMMARY: &[&str] = &[
    "soil_temperature_0cm",
    "soil_temperature_6cm",
    "soil_moisture_0_to_1cm",
    "et0_fao_evapotranspiration",
    "vapour_pressure_deficit",
];
const DAILY_SUMMARY: &[&str] = &["temperature_2m_max", "temperature_2m_min", "precipitation_sum"];

/// Open-Meteo local hours ("2025-01-15T10:00") as "15/01 10:00".
pub(crate) fn display_hour(time: &str) -> String {
    NaiveDateTime::parse_from_str(time, "%Y-%m-%dT%H:%M")
        .map(|hour| hour.format("%d/%m %H:%M").to_string())
        .unwrap_or_else(|_| time.to_string())
}

/// Headline values of an agricultural report: current conditions, first forecast hour, first day.
pub(crate) fn summary(response: &ForecastResponse) -> Vec<(&'static str, f64)> {
    let mut values = Vec::new();
    if let Some(current) = &response.current {
        values.extend(
            CURRENT_SUMMARY
                .iter()
                .filter_map(|&name| current.value(name).map(|v| (name, v))),
        );
    }
    if let Some(hourly) = &response.hourly {
        values.extend(HOURLY_SUMMARY.iter().filter_map(|&name| {
            let first = hourly.series(name)?.into_iter().next()??;
            Some((name, first))
        }));
    }
    if let Some(daily) = &response.daily {
        values.extend(
            DAILY_SUMMARY
                .iter()
                .filter_map(|&name| daily.value(name, 0)?.as_f64().map(|v| (name, v))),
        );
    }
    values
}

/// Full agricultural report for one coordinate, saved as JSON.
pub struct WeatherReport {
    pub coordinates: Coordinates,
    pub days: ForecastDays,
}

impl Scenario for WeatherReport {
    fn name(&self) -> &'static str {
        "weather"
    }

    fn dataset_id(&self) -> &'static str {
        "respuesta_completa"
    }

    async fn run(&self, ctx: &Context) -> Result<ScenarioResult, ScenarioError> {
        let response = ctx.weather.agricultural(self.coordinates, self.days).await?;

        let logger = Logger::new()
            .scenario(self.name())
            .coordinate(self.coordinates.latitude, self.coordinates.longitude);
        let values = summary(&response);
        for &(variable, value) in &values {
            logger
                .clone()
                .variable(variable)
                .value(value)
                .info("weather.summary", "Agricultural weather value");
        }

        let path = ctx.output_path(REPORT_FILE);
        let body = serde_json::to_string_pretty(&response)?;
        tokio::fs::write(&path, body)
            .await
            .with_context(|| format!("writing {}", path.display()))?;
        let file = super::log_written(&path);

        let hours = response.hourly.as_ref().map_or(0, |hourly| hourly.time.len());
        Ok(ScenarioResult {
            message: format!(
                "Agricultural report: {} forecast hours over {} days, {} summary values",
                hours,
                self.days,
                values.len()
            ),
            files: vec![file],
            ..Default::default()
        })
    }
}

/// Measured temperature against the API, plus the next 24 h every 6 h.
pub struct Validate {
    pub coordinates: Coordinates,
    pub measured: f64,
    pub sensor_id: Option<String>,
}

impl Validate {
    fn logger(&self) -> Logger {
        let logger = Logger::new()
            .scenario(self.name())
            .coordinate(self.coordinates.latitude, self.coordinates.longitude);
        match &self.sensor_id {
            Some(id) => logger.sensor_id(id.clone()),
            None => logger,
        }
    }

    pub(crate) fn check(&self, response: &ForecastResponse) -> Result<SensorValidation, ScenarioError> {
        let api_temperature = response
            .current
            .as_ref()
            .and_then(|current| current.temperature_2m)
            .ok_or("weather response has no current temperature_2m")?;
        Ok(SensorValidation::compare(self.measured, api_temperature))
    }
}

impl Scenario for Validate {
    fn name(&self) -> &'static str {
        "validate"
    }

    fn dataset_id(&self) -> &'static str {
        "validacion"
    }

    async fn run(&self, ctx: &Context) -> Result<ScenarioResult, ScenarioError> {
        let response = ctx
            .weather
            .forecast(self.coordinates, ForecastDays::default())
            .await?;
        let validation = self.check(&response)?;

        let logger = self.logger();
        match validation.status {
            CalibrationStatus::Ok => logger
                .clone()
                .value(validation.difference)
                .info("validation.ok", &validation.message),
            _ => logger
                .clone()
                .value(validation.difference)
                .warn("validation.deviation", &validation.message),
        }

        if let Some(hourly) = &response.hourly {
            for (time, temperature) in hourly.samples(SAMPLE_STEP_HOURS, SAMPLE_SPAN_HOURS) {
                let sample = logger.clone().time(display_hour(&time));
                match temperature {
                    Some(value) => sample.value(value).info("forecast.sample", "Forecast temperature"),
                    None => sample.warn("forecast.sample", "Forecast hour without temperature"),
                }
            }
        }

        Ok(ScenarioResult {
            message: format!(
                "measured {:.1}°C, api {:.1}°C, difference {:.2}°C: {}",
                validation.measured_temperature,
                validation.api_temperature,
                validation.difference,
                validation.message
            ),
            ..Default::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::tests::offline_context;
    use isoterma_weather::coordinates;
    use serde_json::json;

    fn agricultural_response() -> ForecastResponse {
        serde_json::from_value(json!({
            "latitude": -39.164,
            "longitude": -67.035,
            "timezone": "America/Argentina/Buenos_Aires",
            "elevation": 262.0,
            "current": {
                "time": "2025-01-15T10:00",
                "temperature_2m": 21.4,
                "relative_humidity_2m": 48,
                "wind_speed_10m": 11.2,
                "weather_code": 1
            },
            "hourly": {
                "time": ["2025-01-15T00:00", "2025-01-15T01:00"],
                "temperature_2m": [17.0, 16.4],
                "soil_temperature_0cm": [null, 19.5],
                "vapour_pressure_deficit": [0.82, 0.75]
            },
            "daily": {
                "time": ["2025-01-15"],
                "temperature_2m_max": [31.2],
                "temperature_2m_min": [14.8],
                "sunrise": ["2025-01-15T06:12"]
            }
        }))
        .unwrap()
    }

    #[test]
    fn hours_are_shown_day_first() {
        assert_eq!(display_hour("2025-01-15T10:00"), "15/01 10:00");
        assert_eq!(display_hour("not a time"), "not a time");
    }

    #[test]
    fn summary_skips_missing_values() {
        let values = summary(&agricultural_response());
        assert_eq!(
            values,
            vec![
                ("temperature_2m", 21.4),
                ("relative_humidity_2m", 48.0),
                ("wind_speed_10m", 11.2),
                ("vapour_pressure_deficit", 0.82),
                ("temperature_2m_max", 31.2),
                ("temperature_2m_min", 14.8),
            ]
        );
    }

    #[test]
    fn check_compares_current_temperature() {
        let validate = Validate {
            coordinates: coordinates(-39.164, -67.035).unwrap(),
            measured: 18.0,
            sensor_id: Some("S_001".to_string()),
        };
        let validation = validate.check(&agricultural_response()).unwrap();
        assert_eq!(validation.difference, 3.4);
        assert_eq!(validation.status, CalibrationStatus::Warning);
    }

    #[test]
    fn check_requires_current_block() {
        let mut response = agricultural_response();
        response.current = None;
        let validate = Validate {
            coordinates: coordinates(-39.164, -67.035).unwrap(),
            measured: 18.0,
            sensor_id: None,
        };
        assert!(validate.check(&response).is_err());
    }

    #[tokio::test]
    async fn unreachable_api_fails_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let report = WeatherReport {
            coordinates: coordinates(-39.164, -67.035).unwrap(),
            days: ForecastDays::default(),
        };
        assert!(report.run(&offline_context(dir.path())).await.is_err());
        assert!(!dir.path().join(REPORT_FILE).exists());
    }
}
