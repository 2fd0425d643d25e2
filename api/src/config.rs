use anyhow::{Context, Result, anyhow};
use isoterma_core::threshold::TemperatureBand;
use isoterma_store::DEFAULT_FARMS_FILE;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::OnceLock;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";

#[derive(Debug, Clone, PartialEq)]
pub struct ApiConfig {
    pub bind_addr: SocketAddr,
    pub farms_file: PathBuf,
    /// Used for farms without their own `thresholds`.
    pub band: TemperatureBand,
}

impl ApiConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let value = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let bind_addr = value("ISOTERMA_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_addr
            .parse()
            .with_context(|| format!("invalid ISOTERMA_BIND_ADDR '{bind_addr}'"))?;

        let farms_file = value("ISOTERMA_FARMS_FILE")
            .unwrap_or_else(|| DEFAULT_FARMS_FILE.to_string())
            .into();

        let temperature = |key: &str, fallback: f64| -> Result<f64> {
            match value(key) {
                Some(raw) => raw
                    .parse()
                    .with_context(|| format!("invalid {key} '{raw}'")),
                None => Ok(fallback),
            }
        };
        let default = TemperatureBand::default();
        let band = TemperatureBand::new(
            temperature("ISOTERMA_TEMP_MIN", default.min)?,
            temperature("ISOTERMA_TEMP_MAX", default.max)?,
        )
        .context("invalid ISOTERMA_TEMP_MIN/ISOTERMA_TEMP_MAX")?;

        Ok(Self {
            bind_addr,
            farms_file,
            band,
        })
    }
}

/// Environment read once per process.
pub fn config() -> Result<&'static ApiConfig> {
    static CONFIG: OnceLock<Result<ApiConfig, String>> = OnceLock::new();
    match CONFIG.get_or_init(|| ApiConfig::from_env().map_err(|e| format!("{e:#}"))) {
        Ok(config) => Ok(config),
        Err(err) => Err(anyhow!(err.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = ApiConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:8000".parse::<SocketAddr>().unwrap());
        assert_eq!(config.farms_file, PathBuf::from("data/fincas.json"));
        assert_eq!(config.band, TemperatureBand::default());
    }

    #[test]
    fn blank_values_fall_back() {
        let config = ApiConfig::from_lookup(lookup(&[("ISOTERMA_FARMS_FILE", "  ")])).unwrap();
        assert_eq!(config.farms_file, PathBuf::from("data/fincas.json"));
    }

    #[test]
    fn band_comes_from_env() {
        let config = ApiConfig::from_lookup(lookup(&[
            ("ISOTERMA_TEMP_MIN", "0"),
            ("ISOTERMA_TEMP_MAX", " 30.5 "),
            ("ISOTERMA_BIND_ADDR", "127.0.0.1:9000"),
        ]))
        .unwrap();
        assert_eq!(config.band, TemperatureBand { min: 0.0, max: 30.5 });
        assert_eq!(config.bind_addr.port(), 9000);
    }

    #[test]
    fn inverted_band_is_rejected() {
        let err = ApiConfig::from_lookup(lookup(&[
            ("ISOTERMA_TEMP_MIN", "10"),
            ("ISOTERMA_TEMP_MAX", "5"),
        ]))
        .unwrap_err();
        assert!(!err.to_string().is_empty());
    }

    #[test]
    fn bad_number_names_the_variable() {
        let err = ApiConfig::from_lookup(lookup(&[("ISOTERMA_TEMP_MAX", "hot")])).unwrap_err();
        assert!(err.to_string().contains("ISOTERMA_TEMP_MAX"));
    }
}
