use crate::logging::Logger;
use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use isoterma_core::farm::FarmValidationError;
use isoterma_core::geo::CoordinateError;
use isoterma_weather::ForecastDaysError;
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Coordinate(#[from] CoordinateError),
    #[error(transparent)]
    ForecastDays(#[from] ForecastDaysError),
    #[error(transparent)]
    InvalidFarm(#[from] FarmValidationError),
    #[error("Farm not found: {0}")]
    FarmNotFound(String),
    #[error("weather service unavailable: {0:#}")]
    Upstream(anyhow::Error),
    #[error("farm storage failed: {0:#}")]
    Storage(anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_)
            | ApiError::Coordinate(_)
            | ApiError::ForecastDays(_)
            | ApiError::InvalidFarm(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::FarmNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let logger = Logger::new().status(status.as_u16());
        if status.is_server_error() {
            logger.error("request.failed", &self, "Request failed");
        } else {
            logger.warn("request.rejected", &self.to_string());
        }
        let body = Json(json!({
            "success": false,
            "detail": self.to_string(),
        }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn statuses_follow_error_kind() {
        assert_eq!(
            ApiError::Validation("bad".into()).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ApiError::FarmNotFound("x".into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::Upstream(anyhow!("timeout")).status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ApiError::Storage(anyhow!("disk")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn upstream_detail_keeps_context_chain() {
        let err = ApiError::Upstream(anyhow!("status 503").context("giving up after 3 attempts"));
        assert_eq!(
            err.to_string(),
            "weather service unavailable: giving up after 3 attempts: status 503"
        );
    }

    #[test]
    fn domain_errors_are_unprocessable() {
        let err: ApiError = isoterma_weather::coordinates(95.0, 0.0).unwrap_err().into();
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.to_string(), "latitude 95 is outside [-90, 90]");

        let err: ApiError = isoterma_weather::ForecastDays::new(9).unwrap_err().into();
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let err: ApiError = FarmValidationError::EmptyId.into();
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.to_string(), "farm id is empty");
    }
}
