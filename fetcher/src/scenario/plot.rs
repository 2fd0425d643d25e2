use super::{Context, Scenario, ScenarioError, ScenarioResult};
use crate::output::kepler::{ColorRange, DIVERGING_PALETTE, KeplerConfig, Layer, centered_state};
use crate::output::{Cell, Table};
use isoterma_core::geo::Coordinate;
use isoterma_core::grid::{PlacementKind, PlotLayout};
use isoterma_core::thermal::{GaussianSampler, round_to};

pub struct Plot;

const DEFAULT_SEED: u64 = 143;
const CSV_FILE: &str = "chacra_143_final.csv";
const MAP_FILE: &str = "chacra_143_final.html";
const MEAN_TEMPERATURE: f64 = 16.0;
const TEMPERATURE_SD: f64 = 2.5;

/// Chacra 143, clockwise from the north-west corner.
pub fn chacra_143() -> PlotLayout {
    let corner = |label: &str, latitude: f64, longitude: f64| {
        (label.to_string(), Coordinate { latitude, longitude })
    };
    PlotLayout {
        corners: vec![
            corner("NW", -39.031090, -67.641083),
            corner("NE", -39.031584, -67.636841),
            corner("SE", -39.035826, -67.637782),
            corner("SW", -39.035328, -67.641930),
        ],
        lat_step: 0.0009,
        lon_step: 0.0012,
    }
}

impl Scenario for Plot {
    fn name(&self) -> &'static str {
        "plot"
    }

    fn dataset_id(&self) -> &'static str {
        "chacra143"
    }

    async fn run(&self, ctx: &Context) -> Result<ScenarioResult, ScenarioError> {
        let sensors = chacra_143().place()?;
        let mut sampler = GaussianSampler::with_seed(ctx.seed_or(DEFAULT_SEED));

        let mut table = Table::new(&["latitude", "longitude", "temperature", "sensor_id", "tipo"]);
        for sensor in &sensors {
            let temperature = round_to(sampler.normal(MEAN_TEMPERATURE, TEMPERATURE_SD), 1);
            let kind = match sensor.kind {
                PlacementKind::Corner => "esquina",
                PlacementKind::Interior => "interno",
            };
            table.push(vec![
                sensor.coordinate.latitude.into(),
                sensor.coordinate.longitude.into(),
                temperature.into(),
                sensor.sensor_id.clone().into(),
                Cell::Text(kind.to_string()),
            ])?;
        }

        let corners = sensors
            .iter()
            .filter(|s| s.kind == PlacementKind::Corner)
            .count();
        let layer = Layer::point(
            self.dataset_id(),
            "chacra143_temperature",
            "Temperatura",
            "temperature",
            ColorRange::new(None, DIVERGING_PALETTE),
        )
        .radius(10.0);
        let config = KeplerConfig::new(centered_state(&table, 16.0, 0.0), "satellite", vec![layer]);

        let files = vec![
            ctx.write_map(MAP_FILE, "Chacra 143", self.dataset_id(), &table, &config).await?,
            ctx.write_csv(CSV_FILE, &table).await?,
        ];

        Ok(ScenarioResult {
            message: format!(
                "Placed {} sensors ({} corners, {} interior)",
                table.len(),
                corners,
                table.len() - corners
            ),
            sensors_generated: table.len(),
            elevation_fallbacks: 0,
            below_threshold: None,
            files,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::csv::read_table;
    use crate::scenario::tests::offline_context;

    #[test]
    fn interior_sensors_lie_inside_the_plot() {
        let layout = chacra_143();
        let polygon = layout.polygon();
        let sensors = layout.place().unwrap();
        assert!(sensors.len() > 4);
        assert!(
            sensors
                .iter()
                .filter(|s| s.kind == PlacementKind::Interior)
                .all(|s| polygon.contains(&s.coordinate))
        );
    }

    #[tokio::test]
    async fn corners_come_first_in_csv() {
        let dir = tempfile::tempdir().unwrap();
        let result = Plot.run(&offline_context(dir.path())).await.unwrap();
        let table = read_table(&dir.path().join(CSV_FILE)).unwrap();
        assert_eq!(table.len(), result.sensors_generated);
        assert_eq!(table.rows[0][3], Cell::Text("C_NW".into()));
        assert_eq!(table.rows[3][4], Cell::Text("esquina".into()));
        assert_eq!(table.rows[4][4], Cell::Text("interno".into()));
        assert_eq!(table.rows[4][3], Cell::Text("S_001".into()));
    }
}
