use crate::config::ApiConfig;
use isoterma_core::threshold::TemperatureBand;
use isoterma_store::FarmStore;
use isoterma_weather::OpenMeteoClient;
use std::sync::Arc;

pub struct AppState {
    pub store: FarmStore,
    pub weather: OpenMeteoClient,
    pub band: TemperatureBand,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(config: &ApiConfig, weather: OpenMeteoClient) -> SharedState {
        Arc::new(Self {
            store: FarmStore::new(config.farms_file.clone()),
            weather,
            band: config.band,
        })
    }
}
