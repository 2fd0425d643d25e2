use super::{
    Context, FINCA_LAT_STEP, FINCA_LON_STEP, FINCA_RIO_NEGRO, Scenario, ScenarioError,
    ScenarioResult, fallback_count,
};
use crate::output::kepler::{
    ColorRange, DIVERGING_PALETTE, KeplerConfig, Layer, TEMPERATURE_PALETTE, centered_state,
};
use crate::output::{Cell, Table};
use isoterma_core::geo::Coordinate;
use isoterma_core::grid::GridSpec;
use isoterma_core::thermal::{GaussianSampler, HeightLevel, multilevel_readings};

pub struct Multilevel;

const DEFAULT_SEED: u64 = 2024;
const CSV_FILE: &str = "finca_altitude_datos.csv";
const MAP_FILE: &str = "finca_altitude_mapa.html";

pub(crate) fn columns() -> Vec<String> {
    let mut columns = vec![
        "latitude".to_string(),
        "longitude".to_string(),
        "altitude_terrain".to_string(),
    ];
    columns.extend(HeightLevel::ALL.iter().map(|l| format!("altitude_{}", l.suffix())));
    columns.push("elevation_terrain".to_string());
    columns.extend(HeightLevel::ALL.iter().map(|l| format!("elevation_{}", l.suffix())));
    columns.push("sensor_id".to_string());
    columns.extend(HeightLevel::ALL.iter().map(HeightLevel::column));
    columns.push("temp_promedio".to_string());
    columns
}

impl Scenario for Multilevel {
    fn name(&self) -> &'static str {
        "multilevel"
    }

    fn dataset_id(&self) -> &'static str {
        "sensores_multinivel"
    }

    async fn run(&self, ctx: &Context) -> Result<ScenarioResult, ScenarioError> {
        let grid = GridSpec::new(FINCA_RIO_NEGRO, FINCA_LAT_STEP, FINCA_LON_STEP)?;
        let points: Vec<_> = grid.points().collect();
        let coordinates: Vec<Coordinate> = points.iter().map(|p| p.coordinate).collect();
        let elevations = ctx.elevations(&coordinates).await;

        let mut sampler = GaussianSampler::with_seed(ctx.seed_or(DEFAULT_SEED));
        let mut table = Table {
            columns: columns(),
            rows: Vec::with_capacity(points.len()),
        };
        for (point, elevation) in points.iter().zip(&elevations) {
            let readings = multilevel_readings(&mut sampler);
            let terrain = elevation.meters;
            let mut row: Vec<Cell> = vec![
                point.coordinate.latitude.into(),
                point.coordinate.longitude.into(),
                terrain.into(),
            ];
            row.extend(HeightLevel::ALL.iter().map(|l| Cell::from(terrain + f64::from(l.meters()))));
            row.push(Cell::Integer(0));
            row.extend(HeightLevel::ALL.iter().map(|l| Cell::Integer(i64::from(l.meters()))));
            row.push(point.sensor_id().into());
            row.extend(HeightLevel::ALL.iter().map(|&l| Cell::from(readings.get(l))));
            row.push(readings.average().into());
            table.push(row)?;
        }

        let mut layers: Vec<Layer> = HeightLevel::ALL
            .iter()
            .map(|level| {
                let column = level.column();
                let layer = Layer::point(
                    self.dataset_id(),
                    &column,
                    &format!("Temperatura {}", level.suffix()),
                    &column,
                    ColorRange::new(Some("Temperatura"), TEMPERATURE_PALETTE),
                );
                let height = format!("elevation_{}", level.suffix());
                match level {
                    HeightLevel::OneMeter => layer.extruded(&height, 1.0),
                    _ => layer.height_field(&height).visible(false),
                }
            })
            .collect();
        layers.push(
            Layer::point(
                self.dataset_id(),
                "altitud",
                "Altitud Terreno",
                "altitude_terrain",
                ColorRange::new(Some("Elevación"), DIVERGING_PALETTE),
            )
            .visible(false),
        );
        let config = KeplerConfig::new(centered_state(&table, 15.0, 50.0), "satellite", layers);

        let files = vec![
            ctx.write_map(
                MAP_FILE,
                "Finca Río Negro - sensores multinivel",
                self.dataset_id(),
                &table,
                &config,
            )
            .await?,
            ctx.write_csv(CSV_FILE, &table).await?,
        ];

        Ok(ScenarioResult {
            message: format!(
                "Generated {} multilevel sensors on a {}x{} grid",
                table.len(),
                grid.dimensions().0,
                grid.dimensions().1
            ),
            sensors_generated: table.len(),
            elevation_fallbacks: fallback_count(&elevations),
            below_threshold: None,
            files,
        })
    }
}
