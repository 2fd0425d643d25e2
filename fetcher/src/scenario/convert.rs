use super::{Context, Scenario, ScenarioError, ScenarioResult};
use crate::output::csv::read_table;
use crate::output::geojson::feature_collection;
use crate::output::Table;
use crate::output::kepler::{ColorRange, GLOBAL_WARMING_PALETTE, KeplerConfig, Layer, centered_state};
use anyhow::{Context as _, Result};
use std::path::{Path, PathBuf};

const GEOJSON_FILE: &str = "datos.geojson";
pub const DEFAULT_COLOR_FIELD: &str = "temperature";

/// Dark point map colored by `color_field`, centered on the data.
pub fn point_map(data_id: &str, table: &Table, color_field: &str) -> Result<KeplerConfig> {
    table.require_column("latitude")?;
    table.require_column("longitude")?;
    table.require_column(color_field)?;
    let layer = Layer::point(
        data_id,
        "puntos",
        "Puntos",
        color_field,
        ColorRange::new(Some("Global Warming"), GLOBAL_WARMING_PALETTE),
    )
    .radius(15.0);
    Ok(KeplerConfig::new(centered_state(table, 10.0, 0.0), "dark", vec![layer]))
}

fn file_stem(input: &Path) -> String {
    input
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "datos".to_string())
}

/// CSV with latitude/longitude columns to a GeoJSON FeatureCollection.
pub struct GeoJson {
    pub input: PathBuf,
}

impl Scenario for GeoJson {
    fn name(&self) -> &'static str {
        "geojson"
    }

    fn dataset_id(&self) -> &'static str {
        "temperatura"
    }

    async fn run(&self, ctx: &Context) -> Result<ScenarioResult, ScenarioError> {
        let table = read_table(&self.input)?;
        let collection = feature_collection(&table)?;
        let path = ctx.output_path(GEOJSON_FILE);
        let body = serde_json::to_string_pretty(&collection)?;
        tokio::fs::write(&path, body)
            .await
            .with_context(|| format!("writing {}", path.display()))?;
        let file = super::log_written(&path);

        Ok(ScenarioResult {
            message: format!("Converted {} rows to GeoJSON", table.len()),
            sensors_generated: table.len(),
            files: vec![file],
            ..Default::default()
        })
    }
}

/// Kepler point map from any CSV.
pub struct Render {
    pub input: PathBuf,
    pub color_field: String,
}

impl Scenario for Render {
    fn name(&self) -> &'static str {
        "render"
    }

    fn dataset_id(&self) -> &'static str {
        "temperatura"
    }

    async fn run(&self, ctx: &Context) -> Result<ScenarioResult, ScenarioError> {
        let table = read_table(&self.input)?;
        if table.is_empty() {
            return Err(format!("{} has no rows", self.input.display()).into());
        }
        let config = point_map(self.dataset_id(), &table, &self.color_field)?;
        let stem = file_stem(&self.input);
        let file = ctx.write_map(
            &format!("{stem}_mapa.html"),
            &stem,
            self.dataset_id(),
            &table,
            &config,
        )
        .await?;

        Ok(ScenarioResult {
            message: format!("Rendered {} points colored by {}", table.len(), self.color_field),
            sensors_generated: table.len(),
            files: vec![file],
            ..Default::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::csv::write_table;
    use crate::scenario::random::Random;
    use crate::scenario::tests::offline_context;
    use serde_json::Value;

    async fn sample_csv(dir: &Path) -> PathBuf {
        let path = dir.join("datos.csv");
        let table = Random {
            count: 4,
            ..Default::default()
        }
        .table(42)
        .unwrap();
        write_table(&path, &table).await.unwrap();
        path
    }

    #[tokio::test]
    async fn geojson_has_one_feature_per_row() {
        let dir = tempfile::tempdir().unwrap();
        let input = sample_csv(dir.path()).await;
        let result = GeoJson { input }
            .run(&offline_context(dir.path()))
            .await
            .unwrap();
        assert_eq!(result.sensors_generated, 4);

        let body = std::fs::read_to_string(dir.path().join(GEOJSON_FILE)).unwrap();
        let value: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(value["type"], "FeatureCollection");
        assert_eq!(value["features"].as_array().unwrap().len(), 4);
        let longitude = value["features"][0]["geometry"]["coordinates"][0].as_f64().unwrap();
        assert!(longitude < 0.0);
        assert!(value["features"][0]["properties"].get("temperature").is_some());
    }

    #[tokio::test]
    async fn render_names_map_after_input() {
        let dir = tempfile::tempdir().unwrap();
        let input = sample_csv(dir.path()).await;
        let render = Render {
            input,
            color_field: DEFAULT_COLOR_FIELD.to_string(),
        };
        render.run(&offline_context(dir.path())).await.unwrap();
        let html = std::fs::read_to_string(dir.path().join("datos_mapa.html")).unwrap();
        assert!(html.contains("Global Warming"));
        assert!(html.contains("\"dark\""));
    }

    #[tokio::test]
    async fn render_rejects_unknown_color_field() {
        let dir = tempfile::tempdir().unwrap();
        let input = sample_csv(dir.path()).await;
        let render = Render {
            input,
            color_field: "humidity".to_string(),
        };
        let err = render.run(&offline_context(dir.path())).await.unwrap_err();
        assert!(err.to_string().contains("column 'humidity' not found"));
    }
}
