use super::{
    Context, FINCA_LAT_STEP, FINCA_LON_STEP, FINCA_RIO_NEGRO, Scenario, ScenarioError,
    ScenarioResult, fallback_count,
};
use crate::output::kepler::{
    COLD_TO_HOT_PALETTE, ColorRange, HOT_TO_COLD_PALETTE, KeplerConfig, Layer, centered_state,
};
use crate::output::{Cell, Table};
use clap::ValueEnum;
use isoterma_core::geo::Coordinate;
use isoterma_core::grid::GridSpec;
use isoterma_core::thermal::{GaussianSampler, HeightLevel, ThermalProfile};
use isoterma_core::threshold::{TemperatureBand, below_threshold};

const DEFAULT_SEED: u64 = 2024;
pub const DEFAULT_THRESHOLD: f64 = 12.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum HeatmapStyle {
    /// Warm spots over terrain relief, cold-to-hot colors.
    Relief,
    /// Layers weighted by the below-threshold flag.
    Threshold,
    /// Wider temperature range with a reversed palette.
    Inverted,
}

impl HeatmapStyle {
    fn slug(&self) -> &'static str {
        match self {
            HeatmapStyle::Relief => "relief",
            HeatmapStyle::Threshold => "threshold",
            HeatmapStyle::Inverted => "inverted",
        }
    }

    fn profile(&self) -> ThermalProfile {
        match self {
            HeatmapStyle::Inverted => ThermalProfile::wide_range(),
            HeatmapStyle::Relief | HeatmapStyle::Threshold => ThermalProfile::relief(),
        }
    }
}

pub struct Heatmap {
    pub style: HeatmapStyle,
    pub threshold: f64,
}

impl Heatmap {
    fn csv_file(&self) -> String {
        format!("heatmap_{}.csv", self.style.slug())
    }

    fn map_file(&self) -> String {
        format!("heatmap_{}.html", self.style.slug())
    }

    fn columns(&self) -> Vec<String> {
        let mut columns = vec![
            "latitude".to_string(),
            "longitude".to_string(),
            "altitude_terrain".to_string(),
        ];
        columns.extend(HeightLevel::ALL.iter().map(HeightLevel::column));
        if self.style == HeatmapStyle::Threshold {
            columns.extend(HeightLevel::ALL.iter().map(|l| format!("threshold_{}", l.suffix())));
        }
        columns.push("sensor_id".to_string());
        columns
    }

    fn layer(&self, level: HeightLevel) -> Layer {
        let (id, label, weight, palette) = match self.style {
            HeatmapStyle::Relief => (
                format!("heatmap_{}", level.suffix()),
                format!("Heatmap {} altura", level.suffix()),
                level.column(),
                COLD_TO_HOT_PALETTE,
            ),
            HeatmapStyle::Threshold => (
                format!("heatmap_threshold_{}", level.suffix()),
                format!("Threshold {:.1}°C - {} altura", self.threshold, level.suffix()),
                format!("threshold_{}", level.suffix()),
                HOT_TO_COLD_PALETTE,
            ),
            HeatmapStyle::Inverted => (
                format!("heatmap_invertido_{}", level.suffix()),
                format!("Heatmap Invertido {} altura", level.suffix()),
                level.column(),
                HOT_TO_COLD_PALETTE,
            ),
        };
        Layer::heatmap(self.dataset_id(), &id, &label, &weight, ColorRange::new(None, palette))
            .visible(level == HeightLevel::OneMeter)
    }

    /// Sensors under the threshold at 1 m; the inverted style counts frost (< 2 °C).
    fn cold_limit(&self) -> f64 {
        match self.style {
            HeatmapStyle::Inverted => TemperatureBand::default().min,
            HeatmapStyle::Relief | HeatmapStyle::Threshold => self.threshold,
        }
    }
}

impl Scenario for Heatmap {
    fn name(&self) -> &'static str {
        "heatmap"
    }

    fn dataset_id(&self) -> &'static str {
        match self.style {
            HeatmapStyle::Relief => "heatmap_3d",
            HeatmapStyle::Threshold => "heatmap_threshold",
            HeatmapStyle::Inverted => "heatmap_invertido",
        }
    }

    async fn run(&self, ctx: &Context) -> Result<ScenarioResult, ScenarioError> {
        let grid = GridSpec::new(FINCA_RIO_NEGRO, FINCA_LAT_STEP, FINCA_LON_STEP)?;
        let points: Vec<_> = grid.points().collect();
        let coordinates: Vec<Coordinate> = points.iter().map(|p| p.coordinate).collect();
        let elevations = ctx.elevations(&coordinates).await;

        let profile = self.style.profile();
        let mut sampler = GaussianSampler::with_seed(ctx.seed_or(DEFAULT_SEED));
        let mut table = Table {
            columns: self.columns(),
            rows: Vec::with_capacity(points.len()),
        };
        let cold_limit = self.cold_limit();
        let mut below = 0;
        for (point, elevation) in points.iter().zip(&elevations) {
            let readings = profile.readings_at(&point.coordinate, &mut sampler);
            below += usize::from(below_threshold(readings.temp_1m, cold_limit));

            let mut row: Vec<Cell> = vec![
                point.coordinate.latitude.into(),
                point.coordinate.longitude.into(),
                elevation.meters.into(),
            ];
            row.extend(HeightLevel::ALL.iter().map(|&l| Cell::from(readings.get(l))));
            if self.style == HeatmapStyle::Threshold {
                row.extend(
                    HeightLevel::ALL
                        .iter()
                        .map(|&l| Cell::from(below_threshold(readings.get(l), self.threshold))),
                );
            }
            row.push(point.sensor_id().into());
            table.push(row)?;
        }

        let layers = HeightLevel::ALL.iter().map(|&l| self.layer(l)).collect();
        let config = KeplerConfig::new(centered_state(&table, 15.0, 45.0), "satellite", layers);

        let title = format!("Heatmap 3D - {}", self.style.slug());
        let files = vec![
            ctx.write_map(&self.map_file(), &title, self.dataset_id(), &table, &config).await?,
            ctx.write_csv(&self.csv_file(), &table).await?,
        ];

        Ok(ScenarioResult {
            message: format!(
                "{} of {} sensors below {:.1}°C at 1m",
                below,
                table.len(),
                cold_limit
            ),
            sensors_generated: table.len(),
            elevation_fallbacks: fallback_count(&elevations),
            below_threshold: Some(below),
            files,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::csv::read_table;
    use crate::scenario::tests::offline_context;

    fn heatmap(style: HeatmapStyle) -> Heatmap {
        Heatmap {
            style,
            threshold: DEFAULT_THRESHOLD,
        }
    }

    #[test]
    fn threshold_style_adds_flag_columns() {
        assert_eq!(heatmap(HeatmapStyle::Relief).columns().len(), 8);
        let columns = heatmap(HeatmapStyle::Threshold).columns();
        assert_eq!(columns.len(), 12);
        assert_eq!(columns[7], "threshold_1m");
    }

    #[test]
    fn only_first_layer_is_visible() {
        let map = heatmap(HeatmapStyle::Threshold);
        let first = serde_json::to_value(map.layer(HeightLevel::OneMeter)).unwrap();
        let last = serde_json::to_value(map.layer(HeightLevel::TenMeters)).unwrap();
        assert_eq!(first["config"]["isVisible"], true);
        assert_eq!(last["config"]["isVisible"], false);
        assert_eq!(first["visualChannels"]["weightField"]["name"], "threshold_1m");
        assert_eq!(first["config"]["label"], "Threshold 12.0°C - 1m altura");
        assert_eq!(first["config"]["visConfig"]["colorRange"]["colors"][0], "#FF0000");
    }

    #[tokio::test]
    async fn threshold_flags_match_temperatures() {
        let dir = tempfile::tempdir().unwrap();
        let map = heatmap(HeatmapStyle::Threshold);
        let result = map.run(&offline_context(dir.path())).await.unwrap();
        let table = read_table(&dir.path().join(map.csv_file())).unwrap();
        assert_eq!(table.len(), 70);

        let temp = table.column_index("temp_1m").unwrap();
        let flag = table.column_index("threshold_1m").unwrap();
        let mut below = 0;
        for row in &table.rows {
            let t = row[temp].as_f64().unwrap();
            let expected = if t < DEFAULT_THRESHOLD { 1 } else { 0 };
            assert_eq!(row[flag], Cell::Integer(expected));
            below += expected as usize;
        }
        assert_eq!(result.below_threshold, Some(below));
    }

    #[tokio::test]
    async fn inverted_readings_are_clamped() {
        let dir = tempfile::tempdir().unwrap();
        let map = heatmap(HeatmapStyle::Inverted);
        map.run(&offline_context(dir.path())).await.unwrap();
        let table = read_table(&dir.path().join(map.csv_file())).unwrap();
        for level in HeightLevel::ALL {
            let index = table.column_index(&level.column()).unwrap();
            assert!(table.numeric(index).all(|t| (2.0..=20.0).contains(&t)));
        }
    }
}
