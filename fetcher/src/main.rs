use clap::{Parser, Subcommand};
use elevation::{DEFAULT_ELEVATION_URL, Elevation, FixedElevation, OpenElevation};
use isoterma_core::FALLBACK_ELEVATION_M;
use isoterma_core::geo::Bounds;
use isoterma_weather::client::FORECAST_TIMEOUT;
use isoterma_weather::{ForecastDays, OpenMeteoClient, coordinates};
use reqwest::Client as HTTPClient;
use scenario::convert::{DEFAULT_COLOR_FIELD, GeoJson, Render};
use scenario::heatmap::{DEFAULT_THRESHOLD, Heatmap, HeatmapStyle};
use scenario::multilevel::Multilevel;
use scenario::plot::Plot;
use scenario::random::{DEFAULT_COUNT, MADRID, Random};
use scenario::weather::{Validate, WeatherReport};
use scenario::{Context, Scenario, ScenarioError, ScenarioResult};
use std::path::PathBuf;
use std::time::Duration;
use tracing::instrument;
use tracing_subscriber::EnvFilter;

mod elevation;
mod logging;
mod output;
mod scenario;

#[derive(Parser)]
#[command(
    name = "isoterma-fetcher",
    about = "Generate farm sensor datasets and Kepler.gl maps",
    version
)]
struct Cli {
    /// Directory for CSV, GeoJSON, JSON and HTML outputs
    #[arg(long, global = true, default_value = ".")]
    output_dir: PathBuf,

    /// Override the scenario's default RNG seed
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Use the fallback elevation and skip every HTTP call
    #[arg(long, global = true)]
    offline: bool,

    /// Sleep after each elevation request
    #[arg(long, global = true, default_value_t = 100)]
    pause_ms: u64,

    /// Elevation requests in flight
    #[arg(long, global = true, default_value_t = 1)]
    concurrency: usize,

    #[arg(long, global = true, env = "MAPBOX_TOKEN", default_value = "", hide_env_values = true)]
    mapbox_token: String,

    #[arg(long, global = true, env = "OPEN_ELEVATION_URL", default_value = DEFAULT_ELEVATION_URL)]
    elevation_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Grid over Finca Río Negro with readings at 1, 2, 5 and 10 m
    Multilevel,
    /// Corner and interior sensors inside Chacra 143
    Plot,
    /// 3D heatmaps over Finca Río Negro terrain
    Heatmap {
        #[arg(long, value_enum, default_value_t = HeatmapStyle::Relief)]
        style: HeatmapStyle,
        #[arg(long, default_value_t = DEFAULT_THRESHOLD)]
        threshold: f64,
    },
    /// Uniform random points, Madrid by default
    Random {
        #[arg(long, default_value_t = DEFAULT_COUNT)]
        count: usize,
        #[arg(long, default_value_t = MADRID.north, allow_hyphen_values = true)]
        north: f64,
        #[arg(long, default_value_t = MADRID.south, allow_hyphen_values = true)]
        south: f64,
        #[arg(long, default_value_t = MADRID.west, allow_hyphen_values = true)]
        west: f64,
        #[arg(long, default_value_t = MADRID.east, allow_hyphen_values = true)]
        east: f64,
        /// Also write a point map of the generated data
        #[arg(long)]
        render: bool,
        /// Also write the points to datos.xlsx
        #[arg(long)]
        xlsx: bool,
    },
    /// Convert a CSV with latitude/longitude columns to GeoJSON
    Geojson {
        #[arg(long, default_value = "datos.csv")]
        input: PathBuf,
    },
    /// Kepler.gl point map from any CSV
    Render {
        #[arg(long, default_value = "datos.csv")]
        input: PathBuf,
        #[arg(long, default_value = DEFAULT_COLOR_FIELD)]
        color_field: String,
    },
    /// Agricultural weather report for one coordinate
    Weather {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
        #[arg(long, default_value_t = 3)]
        days: i64,
    },
    /// Compare a measured temperature with the current API value
    Validate {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
        #[arg(long, allow_hyphen_values = true)]
        measured: f64,
        #[arg(long)]
        sensor_id: Option<String>,
    },
}

fn context(cli: &Cli) -> Result<Context, ScenarioError> {
    let http_client = HTTPClient::builder().timeout(FORECAST_TIMEOUT).build()?;
    let elevation = if cli.offline {
        Elevation::Fixed(FixedElevation(FALLBACK_ELEVATION_M))
    } else {
        Elevation::Online(OpenElevation::new(http_client.clone(), cli.elevation_url.clone()))
    };
    std::fs::create_dir_all(&cli.output_dir)?;
    Ok(Context {
        elevation,
        weather: OpenMeteoClient::from_env(http_client),
        output_dir: cli.output_dir.clone(),
        seed: cli.seed,
        pause: if cli.offline {
            Duration::ZERO
        } else {
            Duration::from_millis(cli.pause_ms)
        },
        concurrency: cli.concurrency.max(1),
        mapbox_token: cli.mapbox_token.clone(),
    })
}

#[instrument(skip_all, fields(scenario = scenario.name()))]
async fn execute<S: Scenario>(scenario: &S, ctx: &Context) -> Result<ScenarioResult, ScenarioError> {
    let logger = logging::Logger::new().scenario(scenario.name());
    logger.info(
        "scenario.started",
        &format!("Running {} into dataset {}", scenario.name(), scenario.dataset_id()),
    );
    let result = scenario.run(ctx).await?;
    logger.info("scenario.finished", &serde_json::to_string(&result)?);
    Ok(result)
}

fn require_online(offline: bool, name: &str) -> Result<(), ScenarioError> {
    if offline {
        return Err(format!("{name} needs network access; drop --offline").into());
    }
    Ok(())
}

async fn run(cli: Cli) -> Result<ScenarioResult, ScenarioError> {
    let ctx = context(&cli)?;
    let offline = cli.offline;
    match cli.command {
        Command::Multilevel => execute(&Multilevel, &ctx).await,
        Command::Plot => execute(&Plot, &ctx).await,
        Command::Heatmap { style, threshold } => execute(&Heatmap { style, threshold }, &ctx).await,
        Command::Random {
            count,
            north,
            south,
            west,
            east,
            render,
            xlsx,
        } => {
            let bounds = Bounds {
                north,
                south,
                west,
                east,
            };
            execute(
                &Random {
                    count,
                    bounds,
                    render,
                    xlsx,
                },
                &ctx,
            )
            .await
        }
        Command::Geojson { input } => execute(&GeoJson { input }, &ctx).await,
        Command::Render { input, color_field } => {
            execute(&Render { input, color_field }, &ctx).await
        }
        Command::Weather { lat, lon, days } => {
            require_online(offline, "weather")?;
            let scenario = WeatherReport {
                coordinates: coordinates(lat, lon)?,
                days: ForecastDays::new(days)?,
            };
            execute(&scenario, &ctx).await
        }
        Command::Validate {
            lat,
            lon,
            measured,
            sensor_id,
        } => {
            require_online(offline, "validate")?;
            let scenario = Validate {
                coordinates: coordinates(lat, lon)?,
                measured,
                sensor_id,
            };
            execute(&scenario, &ctx).await
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), ScenarioError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .with_current_span(false)
        .with_span_list(false)
        .with_target(false)
        .without_time()
        .init();

    match run(Cli::parse()).await {
        Ok(result) => {
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }
        Err(err) => {
            logging::Logger::new().error("scenario.failed", &err, "Scenario failed");
            Err(err)
        }
    }
}
