use super::weather::default_forecast_days;
use crate::error::ApiError;
use crate::logging::Logger;
use crate::state::SharedState;
use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use isoterma_core::farm::Farm;
use isoterma_store::{UpsertOutcome, find_farm};
use isoterma_weather::{ForecastDays, forecast_alerts};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

#[derive(Debug, Deserialize)]
pub struct FarmsQuery {
    #[serde(default)]
    pub search: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AlertsQuery {
    #[serde(default = "default_forecast_days")]
    pub forecast_days: i64,
}

#[instrument(skip(state))]
pub async fn list(
    State(state): State<SharedState>,
    query: Result<Query<FarmsQuery>, QueryRejection>,
) -> Result<Json<Value>, ApiError> {
    let Query(query) = query?;
    let logger = Logger::route("farms.list");

    if let Some(search) = query.search.filter(|s| !s.trim().is_empty()) {
        let found = find_farm(&state.store, &search)
            .await
            .map_err(ApiError::Storage)?;
        let Some((farm, kind)) = found else {
            return Err(ApiError::FarmNotFound(search));
        };
        logger
            .farm_id(farm.id.clone())
            .info("farms.search", &format!("Search '{search}' matched"));
        return Ok(Json(json!({"success": true, "farms": [farm], "match": kind})));
    }

    let farms = state.store.list_farms().await.map_err(ApiError::Storage)?;
    logger.count(farms.len()).info("farms.loaded", "Farms listed");
    Ok(Json(json!({"success": true, "farms": farms})))
}

#[instrument(skip(state))]
pub async fn detail(
    State(state): State<SharedState>,
    farm_id: Result<Path<String>, PathRejection>,
) -> Result<Json<Value>, ApiError> {
    let Path(farm_id) = farm_id?;
    let farm = load_farm(&state, &farm_id).await?;
    Ok(Json(json!({"success": true, "farm": farm})))
}

#[instrument(skip(state))]
pub async fn create(
    State(state): State<SharedState>,
    payload: Result<Json<Farm>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let Json(farm) = payload?;
    save(&state, farm).await
}

#[instrument(skip(state))]
pub async fn replace(
    State(state): State<SharedState>,
    farm_id: Result<Path<String>, PathRejection>,
    payload: Result<Json<Farm>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let Path(farm_id) = farm_id?;
    let Json(mut farm) = payload?;
    if farm.id.trim().is_empty() {
        farm.id = farm_id.clone();
    }
    if farm.id != farm_id {
        return Err(ApiError::Validation(format!(
            "farm id '{}' does not match path '{farm_id}'",
            farm.id
        )));
    }
    save(&state, farm).await
}

#[instrument(skip(state))]
pub async fn delete(
    State(state): State<SharedState>,
    farm_id: Result<Path<String>, PathRejection>,
) -> Result<Json<Value>, ApiError> {
    let Path(farm_id) = farm_id?;
    let removed = state
        .store
        .delete_farm(&farm_id)
        .await
        .map_err(ApiError::Storage)?;
    if !removed {
        return Err(ApiError::FarmNotFound(farm_id));
    }
    Logger::route("farms.delete")
        .farm_id(farm_id.clone())
        .info("farm.deleted", "Farm deleted");
    Ok(Json(json!({"success": true, "deleted": farm_id})))
}

/// Current and hourly forecast checks at the farm location, plus stored sensor readings.
#[instrument(skip(state))]
pub async fn alerts(
    State(state): State<SharedState>,
    farm_id: Result<Path<String>, PathRejection>,
    query: Result<Query<AlertsQuery>, QueryRejection>,
) -> Result<Json<Value>, ApiError> {
    let Path(farm_id) = farm_id?;
    let Query(query) = query?;
    let days = ForecastDays::new(query.forecast_days)?;
    let farm = load_farm(&state, &farm_id).await?;

    let band = farm.band_or(state.band);
    let coords = farm.coordinate();
    let forecast = state
        .weather
        .forecast(coords, days)
        .await
        .map_err(ApiError::Upstream)?;
    let report = forecast_alerts(&band, &forecast);
    let sensor_alerts = farm.sensor_alerts_within(&band);

    let logger = Logger::route("farms.alerts")
        .farm_id(farm.id.clone())
        .coordinate(coords.latitude, coords.longitude)
        .count(report.hourly.len() + sensor_alerts.len());
    if report.has_alerts() || !sensor_alerts.is_empty() {
        logger.warn("alerts.raised", "Temperature outside the farm band");
    } else {
        logger.info("alerts.clear", "No temperature alerts");
    }

    Ok(Json(json!({
        "success": true,
        "farm_id": farm.id,
        "report": report,
        "sensor_alerts": sensor_alerts,
    })))
}

async fn load_farm(state: &SharedState, farm_id: &str) -> Result<Farm, ApiError> {
    state
        .store
        .get_farm(farm_id)
        .await
        .map_err(ApiError::Storage)?
        .ok_or_else(|| ApiError::FarmNotFound(farm_id.to_string()))
}

async fn save(state: &SharedState, farm: Farm) -> Result<(StatusCode, Json<Value>), ApiError> {
    farm.validate()?;
    let (outcome, farm) = state
        .store
        .upsert_farm(farm)
        .await
        .map_err(ApiError::Storage)?;
    let status = match outcome {
        UpsertOutcome::Created => StatusCode::CREATED,
        UpsertOutcome::Replaced => StatusCode::OK,
    };
    Logger::route("farms.save")
        .farm_id(farm.id.clone())
        .status(status.as_u16())
        .info("farm.saved", &format!("Farm {outcome:?}"));
    Ok((status, Json(json!({"success": true, "farm": farm}))))
}
