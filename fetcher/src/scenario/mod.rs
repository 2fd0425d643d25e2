use crate::elevation::{Elevation, ElevationReading, lookup_all};
use crate::logging;
use crate::output::kepler::{KeplerConfig, render_html};
use crate::output::{Table, csv, xlsx};
use isoterma_core::geo::{Bounds, Coordinate};
use isoterma_weather::OpenMeteoClient;
use anyhow::Context as _;
use serde::Serialize;
use std::error::Error as StdError;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub mod convert;
pub mod heatmap;
pub mod multilevel;
pub mod plot;
pub mod random;
pub mod weather;

pub type ScenarioError = Box<dyn StdError + Send + Sync>;

/// Finca Río Negro survey rectangle.
pub const FINCA_RIO_NEGRO: Bounds = Bounds {
    north: -39.163552,
    south: -39.169029,
    west: -67.038406,
    east: -67.028948,
};
pub const FINCA_LAT_STEP: f64 = 0.0008;
pub const FINCA_LON_STEP: f64 = 0.0010;

pub trait Scenario {
    fn name(&self) -> &'static str;
    fn dataset_id(&self) -> &'static str;
    async fn run(&self, ctx: &Context) -> Result<ScenarioResult, ScenarioError>;
}

#[derive(Debug, Default, Serialize)]
pub struct ScenarioResult {
    pub message: String,
    pub sensors_generated: usize,
    pub elevation_fallbacks: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub below_threshold: Option<usize>,
    pub files: Vec<String>,
}

pub struct Context {
    pub elevation: Elevation,
    pub weather: OpenMeteoClient,
    pub output_dir: PathBuf,
    pub seed: Option<u64>,
    pub pause: Duration,
    pub concurrency: usize,
    pub mapbox_token: String,
}

impl Context {
    pub fn seed_or(&self, default: u64) -> u64 {
        self.seed.unwrap_or(default)
    }

    pub fn output_path(&self, file_name: &str) -> PathBuf {
        self.output_dir.join(file_name)
    }

    pub async fn elevations(&self, coordinates: &[Coordinate]) -> Vec<ElevationReading> {
        lookup_all(&self.elevation, coordinates, self.concurrency, self.pause).await
    }

    pub async fn write_csv(&self, file_name: &str, table: &Table) -> Result<String, ScenarioError> {
        let path = self.output_path(file_name);
        csv::write_table(&path, table).await?;
        Ok(log_written(&path))
    }

    pub async fn write_xlsx(&self, file_name: &str, table: &Table) -> Result<String, ScenarioError> {
        let path = self.output_path(file_name);
        xlsx::write_table(&path, table).await?;
        Ok(log_written(&path))
    }

    pub async fn write_map(
        &self,
        file_name: &str,
        title: &str,
        data_id: &str,
        table: &Table,
        config: &KeplerConfig,
    ) -> Result<String, ScenarioError> {
        let path = self.output_path(file_name);
        let html = render_html(title, data_id, table, config, &self.mapbox_token)?;
        tokio::fs::write(&path, html)
            .await
            .with_context(|| format!("writing {}", path.display()))?;
        Ok(log_written(&path))
    }
}

fn log_written(path: &Path) -> String {
    let file = path.display().to_string();
    logging::Logger::new()
        .file(file.clone())
        .info("output.written", "Output file written");
    file
}

pub fn fallback_count(readings: &[ElevationReading]) -> usize {
    readings.iter().filter(|reading| reading.fallback).count()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::elevation::FixedElevation;
    use isoterma_weather::RetryPolicy;
    use reqwest::Client as HTTPClient;

    pub(crate) fn offline_context(dir: &Path) -> Context {
        Context {
            elevation: Elevation::Fixed(FixedElevation(262.0)),
            weather: OpenMeteoClient::new(HTTPClient::new(), "http://127.0.0.1:9/v1/forecast", "UTC")
                .with_retry(RetryPolicy {
                    attempts: 1,
                    backoff: Duration::ZERO,
                }),
            output_dir: dir.to_path_buf(),
            seed: None,
            pause: Duration::ZERO,
            concurrency: 1,
            mapbox_token: String::new(),
        }
    }

    #[test]
    fn result_omits_missing_threshold_count() {
        let result = ScenarioResult {
            message: "ok".to_string(),
            sensors_generated: 3,
            ..Default::default()
        };
        let value = serde_json::to_value(&result).unwrap();
        assert!(value.get("below_threshold").is_none());
        assert_eq!(value["sensors_generated"], 3);
    }

    #[test]
    fn fallbacks_are_counted() {
        let readings = [
            ElevationReading { meters: 280.0, fallback: true },
            ElevationReading { meters: 262.0, fallback: false },
        ];
        assert_eq!(fallback_count(&readings), 1);
    }
}
