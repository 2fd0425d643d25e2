use tracing::{error, info, warn};

pub(crate) const TARGET: &str = "isoterma_fetcher";

#[derive(Clone, Default)]
pub(crate) struct Logger {
    scenario: Option<&'static str>,
    sensor_id: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    variable: Option<&'static str>,
    time: Option<String>,
    value: Option<f64>,
    file: Option<String>,
}

impl Logger {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn scenario(mut self, scenario: &'static str) -> Self {
        self.scenario = Some(scenario);
        self
    }

    pub(crate) fn sensor_id(mut self, sensor_id: impl Into<String>) -> Self {
        self.sensor_id = Some(sensor_id.into());
        self
    }

    pub(crate) fn coordinate(mut self, latitude: f64, longitude: f64) -> Self {
        self.latitude = Some(latitude);
        self.longitude = Some(longitude);
        self
    }

    pub(crate) fn variable(mut self, variable: &'static str) -> Self {
        self.variable = Some(variable);
        self
    }

    pub(crate) fn time(mut self, time: impl Into<String>) -> Self {
        self.time = Some(time.into());
        self
    }

    pub(crate) fn value(mut self, value: f64) -> Self {
        self.value = Some(value);
        self
    }

    pub(crate) fn file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    pub(crate) fn info(&self, event: &'static str, message: &str) {
        info!(
            target: TARGET,
            event,
            scenario = self.scenario,
            sensor_id = self.sensor_id.as_deref(),
            latitude = self.latitude,
            longitude = self.longitude,
            variable = self.variable,
            time = self.time.as_deref(),
            value = self.value,
            file = self.file.as_deref(),
            "{}",
            message
        );
    }

    pub(crate) fn warn(&self, event: &'static str, message: &str) {
        warn!(
            target: TARGET,
            event,
            scenario = self.scenario,
            sensor_id = self.sensor_id.as_deref(),
            latitude = self.latitude,
            longitude = self.longitude,
            variable = self.variable,
            time = self.time.as_deref(),
            value = self.value,
            "{}",
            message
        );
    }

    pub(crate) fn error<E: std::fmt::Debug>(&self, event: &'static str, err: &E, message: &str) {
        error!(
            target: TARGET,
            event,
            scenario = self.scenario,
            sensor_id = self.sensor_id.as_deref(),
            file = self.file.as_deref(),
            error = ?err,
            "{}",
            message
        );
    }
}
