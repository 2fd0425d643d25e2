pub mod alerts;
pub mod client;
pub mod http;
pub mod models;

pub use alerts::{AlertReport, forecast_alerts};
pub use client::OpenMeteoClient;
pub use http::{RetryPolicy, get_json_with_retry};
pub use models::{Coordinates, ForecastDays, ForecastDaysError, ForecastResponse, coordinates};
