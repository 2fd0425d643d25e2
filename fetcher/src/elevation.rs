use crate::logging;
use anyhow::{Result, anyhow};
use futures::StreamExt;
use isoterma_core::FALLBACK_ELEVATION_M;
use isoterma_core::geo::Coordinate;
use reqwest::Client as HTTPClient;
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_ELEVATION_URL: &str = "https://api.open-elevation.com/api/v1/lookup";
const ELEVATION_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElevationReading {
    pub meters: f64,
    pub fallback: bool,
}

pub trait ElevationSource {
    async fn elevation(&self, coordinate: Coordinate) -> ElevationReading;
}

#[derive(Deserialize)]
struct LookupResponse {
    results: Vec<LookupResult>,
}

#[derive(Deserialize)]
struct LookupResult {
    elevation: f64,
}

pub struct OpenElevation {
    http: HTTPClient,
    base_url: String,
}

impl OpenElevation {
    pub fn new(http: HTTPClient, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    async fn fetch(&self, coordinate: Coordinate) -> Result<f64> {
        let url = format!(
            "{}?locations={},{}",
            self.base_url, coordinate.latitude, coordinate.longitude
        );
        let response = self.http.get(&url).timeout(ELEVATION_TIMEOUT).send().await?;
        response.error_for_status_ref()?;
        let body: LookupResponse = response.json().await?;
        body.results
            .first()
            .map(|result| result.elevation)
            .ok_or_else(|| anyhow!("elevation lookup returned no results"))
    }
}

impl ElevationSource for OpenElevation {
    async fn elevation(&self, coordinate: Coordinate) -> ElevationReading {
        match self.fetch(coordinate).await {
            Ok(meters) => ElevationReading {
                meters,
                fallback: false,
            },
            Err(err) => {
                logging::Logger::new()
                    .coordinate(coordinate.latitude, coordinate.longitude)
                    .value(FALLBACK_ELEVATION_M)
                    .warn("elevation.fallback", &format!("Elevation lookup failed: {err}"));
                ElevationReading {
                    meters: FALLBACK_ELEVATION_M,
                    fallback: true,
                }
            }
        }
    }
}

pub struct FixedElevation(pub f64);

impl ElevationSource for FixedElevation {
    async fn elevation(&self, _coordinate: Coordinate) -> ElevationReading {
        ElevationReading {
            meters: self.0,
            fallback: false,
        }
    }
}

/// Picked once from the command line.
pub enum Elevation {
    Online(OpenElevation),
    Fixed(FixedElevation),
}

impl ElevationSource for Elevation {
    async fn elevation(&self, coordinate: Coordinate) -> ElevationReading {
        match self {
            Elevation::Online(source) => source.elevation(coordinate).await,
            Elevation::Fixed(source) => source.elevation(coordinate).await,
        }
    }
}

/// One lookup per coordinate, at most `concurrency` in flight, each followed by `pause`.
/// Results keep the input order.
pub async fn lookup_all<S: ElevationSource>(
    source: &S,
    coordinates: &[Coordinate],
    concurrency: usize,
    pause: Duration,
) -> Vec<ElevationReading> {
    let total = coordinates.len();
    futures::stream::iter(coordinates.iter().copied().enumerate())
        .map(|(i, coordinate)| async move {
            let reading = source.elevation(coordinate).await;
            logging::Logger::new()
                .coordinate(coordinate.latitude, coordinate.longitude)
                .value(reading.meters)
                .info(
                    "elevation.lookup",
                    &format!("Sensor {}/{} -> altitude {}m", i + 1, total, reading.meters),
                );
            if !pause.is_zero() {
                tokio::time::sleep(pause).await;
            }
            reading
        })
        .buffered(concurrency.max(1))
        .collect()
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Slower for northern points so completion order differs from input order.
    struct LatitudeEcho;

    impl ElevationSource for LatitudeEcho {
        async fn elevation(&self, coordinate: Coordinate) -> ElevationReading {
            let delay = (coordinate.latitude.abs() * 2.0) as u64;
            tokio::time::sleep(Duration::from_millis(delay)).await;
            ElevationReading {
                meters: coordinate.latitude,
                fallback: false,
            }
        }
    }

    fn coordinates() -> Vec<Coordinate> {
        [5.0, 1.0, 4.0, 2.0, 3.0]
            .into_iter()
            .map(|lat| Coordinate {
                latitude: lat,
                longitude: 0.0,
            })
            .collect()
    }

    #[tokio::test]
    async fn buffered_lookups_keep_input_order() {
        let readings = lookup_all(&LatitudeEcho, &coordinates(), 4, Duration::ZERO).await;
        let meters: Vec<f64> = readings.iter().map(|r| r.meters).collect();
        assert_eq!(meters, vec![5.0, 1.0, 4.0, 2.0, 3.0]);
    }

    #[tokio::test]
    async fn fixed_elevation_is_never_a_fallback() {
        let readings = lookup_all(&FixedElevation(262.0), &coordinates(), 1, Duration::ZERO).await;
        assert_eq!(readings.len(), 5);
        assert!(readings.iter().all(|r| r.meters == 262.0 && !r.fallback));
    }

    #[tokio::test]
    async fn unreachable_service_falls_back() {
        let http = HTTPClient::builder().no_proxy().build().unwrap();
        let source = Elevation::Online(OpenElevation::new(http, "http://127.0.0.1:9/api/v1/lookup"));
        let reading = source
            .elevation(Coordinate {
                latitude: -39.164,
                longitude: -67.035,
            })
            .await;
        assert_eq!(
            reading,
            ElevationReading {
                meters: FALLBACK_ELEVATION_M,
                fallback: true
            }
        );
    }
}
