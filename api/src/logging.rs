use tracing::{error, info, warn};

pub(crate) const TARGET: &str = "isoterma_api";

#[derive(Clone, Default)]
pub(crate) struct Logger {
    route: Option<&'static str>,
    farm_id: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    status: Option<u16>,
    count: Option<usize>,
}

impl Logger {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn route(route: &'static str) -> Self {
        Self {
            route: Some(route),
            ..Self::default()
        }
    }

    pub(crate) fn farm_id(mut self, farm_id: impl Into<String>) -> Self {
        self.farm_id = Some(farm_id.into());
        self
    }

    pub(crate) fn coordinate(mut self, latitude: f64, longitude: f64) -> Self {
        self.latitude = Some(latitude);
        self.longitude = Some(longitude);
        self
    }

    pub(crate) fn status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub(crate) fn count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }

    pub(crate) fn info(&self, event: &'static str, message: &str) {
        info!(
            target: TARGET,
            event,
            route = self.route,
            farm_id = self.farm_id.as_deref(),
            latitude = self.latitude,
            longitude = self.longitude,
            status = self.status,
            count = self.count,
            "{}",
            message
        );
    }

    pub(crate) fn warn(&self, event: &'static str, message: &str) {
        warn!(
            target: TARGET,
            event,
            route = self.route,
            farm_id = self.farm_id.as_deref(),
            latitude = self.latitude,
            longitude = self.longitude,
            status = self.status,
            "{}",
            message
        );
    }

    pub(crate) fn error<E: std::fmt::Debug>(&self, event: &'static str, err: &E, message: &str) {
        error!(
            target: TARGET,
            event,
            route = self.route,
            farm_id = self.farm_id.as_deref(),
            status = self.status,
            error = ?err,
            "{}",
            message
        );
    }
}
