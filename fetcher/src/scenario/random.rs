use super::convert::point_map;
use super::{Context, Scenario, ScenarioError, ScenarioResult};
use crate::output::Table;
use isoterma_core::geo::Bounds;
use isoterma_core::thermal::{GaussianSampler, round_to};

const DEFAULT_SEED: u64 = 42;
pub const DEFAULT_COUNT: usize = 50;
const CSV_FILE: &str = "datos.csv";
const XLSX_FILE: &str = "datos.xlsx";
const MAP_FILE: &str = "mapa_madrid.html";
const TEMPERATURE_RANGE: (f64, f64) = (15.0, 35.0);

pub const MADRID: Bounds = Bounds {
    north: 40.50,
    south: 40.35,
    west: -3.80,
    east: -3.60,
};

/// Uniform points with a uniform temperature inside `bounds`.
pub struct Random {
    pub count: usize,
    pub bounds: Bounds,
    pub render: bool,
    pub xlsx: bool,
}

impl Default for Random {
    fn default() -> Self {
        Self {
            count: DEFAULT_COUNT,
            bounds: MADRID,
            render: false,
            xlsx: false,
        }
    }
}

impl Random {
    pub(crate) fn table(&self, seed: u64) -> Result<Table, ScenarioError> {
        let mut sampler = GaussianSampler::with_seed(seed);
        let mut table = Table::new(&["latitude", "longitude", "temperature"]);
        for _ in 0..self.count {
            let latitude = sampler.uniform(self.bounds.south, self.bounds.north);
            let longitude = sampler.uniform(self.bounds.west, self.bounds.east);
            let temperature = sampler.uniform(TEMPERATURE_RANGE.0, TEMPERATURE_RANGE.1);
            table.push(vec![
                round_to(latitude, 6).into(),
                round_to(longitude, 6).into(),
                round_to(temperature, 2).into(),
            ])?;
        }
        Ok(table)
    }
}

impl Scenario for Random {
    fn name(&self) -> &'static str {
        "random"
    }

    fn dataset_id(&self) -> &'static str {
        "temperatura"
    }

    async fn run(&self, ctx: &Context) -> Result<ScenarioResult, ScenarioError> {
        if !self.bounds.is_valid() {
            return Err("bounding box is inverted".into());
        }
        let table = self.table(ctx.seed_or(DEFAULT_SEED))?;

        let mut files = vec![ctx.write_csv(CSV_FILE, &table).await?];
        if self.xlsx {
            files.push(ctx.write_xlsx(XLSX_FILE, &table).await?);
        }
        if self.render {
            let config = point_map(self.dataset_id(), &table, "temperature")?;
            files.push(ctx.write_map(MAP_FILE, "Temperatura", self.dataset_id(), &table, &config).await?);
        }

        let (low, high) = table.range("temperature").unwrap_or_default();
        Ok(ScenarioResult {
            message: format!(
                "Generated {} random points, temperature {:.1}..{:.1}°C",
                table.len(),
                low,
                high
            ),
            sensors_generated: table.len(),
            files,
            ..Default::default()
        })
    }
}
