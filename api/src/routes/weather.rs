use crate::error::ApiError;
use crate::logging::Logger;
use crate::state::SharedState;
use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use isoterma_weather::models::DEFAULT_FORECAST_DAYS;
use isoterma_weather::{ForecastDays, coordinates};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

#[derive(Debug, Deserialize)]
pub struct CoordinateQuery {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Deserialize)]
pub struct ForecastQuery {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default = "default_forecast_days")]
    pub forecast_days: i64,
}

pub(crate) fn default_forecast_days() -> i64 {
    i64::from(DEFAULT_FORECAST_DAYS)
}

#[derive(Debug, Deserialize)]
pub struct ValidationRequest {
    pub latitude: f64,
    pub longitude: f64,
    pub measured_temperature: f64,
    #[serde(default)]
    pub sensor_id: Option<String>,
}

#[instrument(skip(state))]
pub async fn current(
    State(state): State<SharedState>,
    query: Result<Query<CoordinateQuery>, QueryRejection>,
) -> Result<Json<Value>, ApiError> {
    let Query(query) = query?;
    let coords = coordinates(query.latitude, query.longitude)?;
    let data = state.weather.current(coords).await.map_err(ApiError::Upstream)?;
    Logger::route("weather.current")
        .coordinate(coords.latitude, coords.longitude)
        .info("weather.current", "Current weather served");
    Ok(Json(json!({"success": true, "data": data})))
}

#[instrument(skip(state))]
pub async fn forecast(
    State(state): State<SharedState>,
    query: Result<Query<ForecastQuery>, QueryRejection>,
) -> Result<Json<Value>, ApiError> {
    let Query(query) = query?;
    let coords = coordinates(query.latitude, query.longitude)?;
    let days = ForecastDays::new(query.forecast_days)?;
    let data = state
        .weather
        .forecast(coords, days)
        .await
        .map_err(ApiError::Upstream)?;
    Logger::route("weather.forecast")
        .coordinate(coords.latitude, coords.longitude)
        .count(data.hourly.as_ref().map_or(0, |hourly| hourly.time.len()))
        .info("weather.forecast", "Forecast served");
    Ok(Json(json!({"success": true, "data": data})))
}

#[instrument(skip(state))]
pub async fn validate(
    State(state): State<SharedState>,
    payload: Result<Json<ValidationRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(request) = payload?;
    let coords = coordinates(request.latitude, request.longitude)?;
    let validation = state
        .weather
        .validate_sensor(coords, request.measured_temperature)
        .await
        .map_err(ApiError::Upstream)?;
    Logger::route("weather.validate")
        .coordinate(coords.latitude, coords.longitude)
        .info("sensor.validated", &validation.message);
    Ok(Json(json!({
        "success": true,
        "sensor_id": request.sensor_id,
        "validation": validation,
    })))
}
