use crate::models::ForecastResponse;
use isoterma_core::threshold::{
    AlertSource, BandStatus, TemperatureBand, ThresholdAlert, evaluate_reading, evaluate_series,
};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertReport {
    pub band: TemperatureBand,
    pub current: Option<ThresholdAlert>,
    pub hourly: Vec<ThresholdAlert>,
    pub hours_checked: usize,
    pub hours_below: usize,
    pub hours_above: usize,
}

impl AlertReport {
    pub fn has_alerts(&self) -> bool {
        self.current.is_some() || !self.hourly.is_empty()
    }
}

/// Checks the current reading and every forecast hour against `band`.
pub fn forecast_alerts(band: &TemperatureBand, response: &ForecastResponse) -> AlertReport {
    let current = response.current.as_ref().and_then(|current| {
        let temperature = current.temperature_2m?;
        evaluate_reading(
            band,
            AlertSource::Current {
                time: current.time.clone(),
            },
            temperature,
        )
    });

    let (hourly, hours_checked) = match &response.hourly {
        Some(series) => {
            let checked = series
                .time
                .iter()
                .zip(&series.temperature_2m)
                .filter(|(_, temperature)| temperature.is_some())
                .count();
            (
                evaluate_series(band, &series.time, &series.temperature_2m),
                checked,
            )
        }
        None => (Vec::new(), 0),
    };

    let count = |status: BandStatus| hourly.iter().filter(|alert| alert.status == status).count();
    AlertReport {
        band: *band,
        hours_below: count(BandStatus::Below),
        hours_above: count(BandStatus::Above),
        current,
        hourly,
        hours_checked,
    }
}
