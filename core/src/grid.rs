use crate::geo::{Bounds, Coordinate, Polygon};
use serde::{Deserialize, Serialize};

/// Corners closer than this (in degrees, on both axes) to a lattice point replace it.
const CORNER_TOLERANCE: f64 = 0.0001;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GridError {
    #[error("grid steps must be positive (lat_step={lat_step}, lon_step={lon_step})")]
    InvalidStep { lat_step: f64, lon_step: f64 },
    #[error("grid bounds are inverted")]
    InvertedBounds,
    #[error("grid of {lat_step} x {lon_step} degree steps has too many points")]
    TooManyPoints { lat_step: f64, lon_step: f64 },
}

pub fn sensor_id(index: usize) -> String {
    format!("S_{index:03}")
}

/// Rows and columns of a lattice walking `bounds` with the given steps.
fn lattice(bounds: &Bounds, lat_step: f64, lon_step: f64) -> Result<(usize, usize), GridError> {
    if lat_step.is_nan() || lon_step.is_nan() || lat_step <= 0.0 || lon_step <= 0.0 {
        return Err(GridError::InvalidStep { lat_step, lon_step });
    }
    if !bounds.is_valid() {
        return Err(GridError::InvertedBounds);
    }
    let too_many = || GridError::TooManyPoints { lat_step, lon_step };
    let count = |span: f64, step: f64| {
        ((span / step).floor() as usize)
            .checked_add(1)
            .ok_or_else(too_many)
    };
    let rows = count(bounds.north - bounds.south, lat_step)?;
    let cols = count(bounds.east - bounds.west, lon_step)?;
    rows.checked_mul(cols).ok_or_else(too_many)?;
    Ok((rows, cols))
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridSpec {
    pub bounds: Bounds,
    pub lat_step: f64,
    pub lon_step: f64,
    rows: usize,
    cols: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridPoint {
    pub index: usize,
    pub row: usize,
    pub col: usize,
    pub coordinate: Coordinate,
}

impl GridPoint {
    pub fn sensor_id(&self) -> String {
        sensor_id(self.index)
    }
}

impl GridSpec {
    pub fn new(bounds: Bounds, lat_step: f64, lon_step: f64) -> Result<Self, GridError> {
        let (rows, cols) = lattice(&bounds, lat_step, lon_step)?;
        Ok(Self {
            bounds,
            lat_step,
            lon_step,
            rows,
            cols,
        })
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn len(&self) -> usize {
        self.rows * self.cols
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// North to south, west to east.
    pub fn points(&self) -> impl Iterator<Item = GridPoint> + '_ {
        let (rows, cols) = self.dimensions();
        (0..rows).flat_map(move |row| {
            (0..cols).map(move |col| GridPoint {
                index: row * cols + col + 1,
                row,
                col,
                coordinate: Coordinate {
                    latitude: self.bounds.north - row as f64 * self.lat_step,
                    longitude: self.bounds.west + col as f64 * self.lon_step,
                },
            })
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlacementKind {
    Corner,
    Interior,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlacedSensor {
    pub sensor_id: String,
    pub coordinate: Coordinate,
    pub kind: PlacementKind,
}

#[derive(Debug, Clone)]
pub struct PlotLayout {
    pub corners: Vec<(String, Coordinate)>,
    pub lat_step: f64,
    pub lon_step: f64,
}

impl PlotLayout {
    pub fn polygon(&self) -> Polygon {
        Polygon::new(self.corners.iter().map(|(_, c)| *c).collect())
    }

    fn is_corner(&self, coordinate: &Coordinate) -> bool {
        self.corners.iter().any(|(_, corner)| {
            (coordinate.latitude - corner.latitude).abs() < CORNER_TOLERANCE
                && (coordinate.longitude - corner.longitude).abs() < CORNER_TOLERANCE
        })
    }

    /// Corner sensors first, then interior lattice points south to north.
    pub fn place(&self) -> Result<Vec<PlacedSensor>, GridError> {
        let mut sensors: Vec<PlacedSensor> = self
            .corners
            .iter()
            .map(|(label, coordinate)| PlacedSensor {
                sensor_id: format!("C_{label}"),
                coordinate: *coordinate,
                kind: PlacementKind::Corner,
            })
            .collect();

        let polygon = self.polygon();
        let Some(bounds) = polygon.bounds() else {
            return Ok(sensors);
        };
        let (rows, cols) = lattice(&bounds, self.lat_step, self.lon_step)?;
        let mut interior = 0usize;
        for row in 0..rows {
            for col in 0..cols {
                let coordinate = Coordinate {
                    latitude: bounds.south + row as f64 * self.lat_step,
                    longitude: bounds.west + col as f64 * self.lon_step,
                };
                if self.is_corner(&coordinate) || !polygon.contains(&coordinate) {
                    continue;
                }
                interior += 1;
                sensors.push(PlacedSensor {
                    sensor_id: sensor_id(interior),
                    coordinate,
                    kind: PlacementKind::Interior,
                });
            }
        }
        Ok(sensors)
    }
}
