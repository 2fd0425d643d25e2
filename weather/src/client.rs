use crate::http::{RetryPolicy, get_json_with_retry};
use crate::models::{Coordinates, ForecastDays, ForecastResponse};
use anyhow::{Context, Result, anyhow};
use isoterma_core::DEFAULT_TIMEZONE;
use isoterma_core::calibration::SensorValidation;
use reqwest::{Client as HTTPClient, Url};
use std::time::Duration;
use tracing::info;

pub const DEFAULT_BASE_URL: &str = "https://api.open-meteo.com/v1/forecast";
pub const CURRENT_TIMEOUT: Duration = Duration::from_secs(10);
pub const FORECAST_TIMEOUT: Duration = Duration::from_secs(15);

pub const CURRENT_VARIABLES: &[&str] = &[
    "temperature_2m",
    "relative_humidity_2m",
    "apparent_temperature",
    "precipitation",
    "rain",
    "cloud_cover",
    "pressure_msl",
    "wind_speed_10m",
    "wind_direction_10m",
    "wind_gusts_10m",
];

pub const HOURLY_VARIABLES: &[&str] = &[
    "temperature_2m",
    "relative_humidity_2m",
    "precipitation_probability",
    "precipitation",
    "wind_speed_10m",
];

pub const AGRICULTURAL_CURRENT: &[&str] = &[
    "temperature_2m",
    "relative_humidity_2m",
    "apparent_temperature",
    "precipitation",
    "rain",
    "snowfall",
    "weather_code",
    "cloud_cover",
    "pressure_msl",
    "surface_pressure",
    "wind_speed_10m",
    "wind_direction_10m",
    "wind_gusts_10m",
];

pub const AGRICULTURAL_HOURLY: &[&str] = &[
    "temperature_2m",
    "relative_humidity_2m",
    "dew_point_2m",
    "apparent_temperature",
    "precipitation_probability",
    "precipitation",
    "rain",
    "snowfall",
    "weather_code",
    "cloud_cover",
    "visibility",
    "evapotranspiration",
    "et0_fao_evapotranspiration",
    "vapour_pressure_deficit",
    "wind_speed_10m",
    "wind_direction_10m",
    "wind_gusts_10m",
    "soil_temperature_0cm",
    "soil_temperature_6cm",
    "soil_temperature_18cm",
    "soil_temperature_54cm",
    "soil_moisture_0_to_1cm",
    "soil_moisture_1_to_3cm",
    "soil_moisture_3_to_9cm",
    "soil_moisture_9_to_27cm",
    "soil_moisture_27_to_81cm",
];

pub const AGRICULTURAL_DAILY: &[&str] = &[
    "temperature_2m_max",
    "temperature_2m_min",
    "apparent_temperature_max",
    "apparent_temperature_min",
    "sunrise",
    "sunset",
    "daylight_duration",
    "sunshine_duration",
    "precipitation_sum",
    "rain_sum",
    "precipitation_hours",
    "precipitation_probability_max",
    "wind_speed_10m_max",
    "wind_gusts_10m_max",
    "wind_direction_10m_dominant",
    "et0_fao_evapotranspiration",
];

#[derive(Debug, Default)]
struct Variables<'a> {
    current: &'a [&'a str],
    hourly: &'a [&'a str],
    daily: &'a [&'a str],
}

#[derive(Debug, Clone)]
pub struct OpenMeteoClient {
    http: HTTPClient,
    base_url: String,
    timezone: String,
    retry: RetryPolicy,
}

impl OpenMeteoClient {
    pub fn new(http: HTTPClient, base_url: impl Into<String>, timezone: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            timezone: timezone.into(),
            retry: RetryPolicy::default(),
        }
    }

    /// Reads `OPEN_METEO_URL` and `ISOTERMA_TIMEZONE`, falling back to the public endpoint.
    pub fn from_env(http: HTTPClient) -> Self {
        let base_url = env_or("OPEN_METEO_URL", DEFAULT_BASE_URL);
        let timezone = env_or("ISOTERMA_TIMEZONE", DEFAULT_TIMEZONE);
        Self::new(http, base_url, timezone)
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn current(&self, coords: Coordinates) -> Result<ForecastResponse> {
        let vars = Variables {
            current: CURRENT_VARIABLES,
            ..Default::default()
        };
        let url = self.url(coords, None, &vars)?;
        let response = get_json_with_retry(&self.http, &url, CURRENT_TIMEOUT, self.retry)
            .await
            .context("fetching current weather")?;
        info!(
            latitude = coords.latitude,
            longitude = coords.longitude,
            "Weather data fetched"
        );
        Ok(response)
    }

    pub async fn forecast(&self, coords: Coordinates, days: ForecastDays) -> Result<ForecastResponse> {
        let vars = Variables {
            current: CURRENT_VARIABLES,
            hourly: HOURLY_VARIABLES,
            ..Default::default()
        };
        self.fetch_forecast(coords, days, &vars).await
    }

    pub async fn agricultural(&self, coords: Coordinates, days: ForecastDays) -> Result<ForecastResponse> {
        let vars = Variables {
            current: AGRICULTURAL_CURRENT,
            hourly: AGRICULTURAL_HOURLY,
            daily: AGRICULTURAL_DAILY,
        };
        self.fetch_forecast(coords, days, &vars).await
    }

    pub async fn validate_sensor(&self, coords: Coordinates, measured_temperature: f64) -> Result<SensorValidation> {
        let response = self.current(coords).await?;
        let api_temperature = response
            .current
            .and_then(|current| current.temperature_2m)
            .ok_or_else(|| anyhow!("weather response has no current temperature_2m"))?;
        Ok(SensorValidation::compare(measured_temperature, api_temperature))
    }

    async fn fetch_forecast(
        &self,
        coords: Coordinates,
        days: ForecastDays,
        vars: &Variables<'_>,
    ) -> Result<ForecastResponse> {
        let url = self.url(coords, Some(days), vars)?;
        let response = get_json_with_retry(&self.http, &url, FORECAST_TIMEOUT, self.retry)
            .await
            .context("fetching forecast")?;
        info!(
            latitude = coords.latitude,
            longitude = coords.longitude,
            forecast_days = days.get(),
            "Forecast data fetched"
        );
        Ok(response)
    }

    fn url(&self, coords: Coordinates, days: Option<ForecastDays>, vars: &Variables<'_>) -> Result<Url> {
        let mut params = vec![
            ("latitude", coords.latitude.to_string()),
            ("longitude", coords.longitude.to_string()),
        ];
        for (key, list) in [
            ("current", vars.current),
            ("hourly", vars.hourly),
            ("daily", vars.daily),
        ] {
            if !list.is_empty() {
                params.push((key, list.join(",")));
            }
        }
        if let Some(days) = days {
            params.push(("forecast_days", days.to_string()));
        }
        params.push(("timezone", self.timezone.clone()));
        Url::parse_with_params(&self.base_url, &params)
            .with_context(|| format!("invalid weather base url {}", self.base_url))
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::tests::{canned_server, test_client};
    use crate::models::{coordinates, tests::forecast_json};
    use isoterma_core::calibration::CalibrationStatus;

    fn client_for(url: &Url) -> OpenMeteoClient {
        OpenMeteoClient::new(test_client(), url.as_str(), DEFAULT_TIMEZONE).with_retry(RetryPolicy {
            attempts: 2,
            backoff: Duration::from_millis(5),
        })
    }

    #[test]
    fn forecast_url_carries_variables() {
        let client = OpenMeteoClient::new(HTTPClient::new(), DEFAULT_BASE_URL, DEFAULT_TIMEZONE);
        let vars = Variables {
            current: CURRENT_VARIABLES,
            hourly: HOURLY_VARIABLES,
            ..Default::default()
        };
        let url = client
            .url(
                coordinates(-39.164, -67.035).unwrap(),
                Some(ForecastDays::new(3).unwrap()),
                &vars,
            )
            .unwrap();
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(pairs.contains(&("latitude".to_string(), "-39.164".to_string())));
        assert!(pairs.contains(&("forecast_days".to_string(), "3".to_string())));
        assert!(pairs.contains(&(
            "hourly".to_string(),
            "temperature_2m,relative_humidity_2m,precipitation_probability,precipitation,wind_speed_10m"
                .to_string()
        )));
        assert!(pairs.contains(&(
            "timezone".to_string(),
            "America/Argentina/Buenos_Aires".to_string()
        )));
        assert!(!pairs.iter().any(|(key, _)| key == "daily"));
    }

    #[test]
    fn agricultural_lists_match_open_meteo_groups() {
        assert_eq!(AGRICULTURAL_CURRENT.len(), 13);
        assert_eq!(AGRICULTURAL_HOURLY.len(), 26);
        assert_eq!(AGRICULTURAL_DAILY.len(), 16);
    }

    #[tokio::test]
    async fn validate_sensor_compares_current_temperature() {
        let (url, _) = canned_server(vec![(200, forecast_json().to_string())]).await;
        let validation = client_for(&url)
            .validate_sensor(coordinates(-39.164, -67.035).unwrap(), 18.0)
            .await
            .unwrap();
        assert_eq!(validation.api_temperature, 1.4);
        assert_eq!(validation.difference, 16.6);
        assert_eq!(validation.status, CalibrationStatus::Error);
    }

    #[tokio::test]
    async fn forecast_decodes_payload() {
        let (url, _) = canned_server(vec![(200, forecast_json().to_string())]).await;
        let response = client_for(&url)
            .forecast(coordinates(-39.164, -67.035).unwrap(), ForecastDays::default())
            .await
            .unwrap();
        assert_eq!(response.elevation, Some(262.0));
        assert_eq!(response.hourly.unwrap().time.len(), 8);
    }
}
