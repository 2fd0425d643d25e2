pub mod calibration;
pub mod farm;
pub mod geo;
pub mod grid;
pub mod thermal;
pub mod threshold;

/// Terrain altitude used when the elevation service cannot answer.
pub const FALLBACK_ELEVATION_M: f64 = 280.0;
pub const DEFAULT_TIMEZONE: &str = "America/Argentina/Buenos_Aires";
/// Metres per degree of latitude, also used for longitude before the cosine correction.
pub const METERS_PER_DEGREE: f64 = 111_000.0;
