use crate::METERS_PER_DEGREE;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CoordinateError {
    #[error("latitude {0} is outside [-90, 90]")]
    Latitude(f64),
    #[error("longitude {0} is outside [-180, 180]")]
    Longitude(f64),
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, CoordinateError> {
        let coordinate = Self {
            latitude,
            longitude,
        };
        coordinate.validate()?;
        Ok(coordinate)
    }

    pub fn validate(&self) -> Result<(), CoordinateError> {
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(CoordinateError::Latitude(self.latitude));
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(CoordinateError::Longitude(self.longitude));
        }
        Ok(())
    }

    /// Planar distance in degrees, good enough at plot scale.
    pub fn degree_distance(&self, other: &Coordinate) -> f64 {
        let dlat = self.latitude - other.latitude;
        let dlon = self.longitude - other.longitude;
        (dlat * dlat + dlon * dlon).sqrt()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub north: f64,
    pub south: f64,
    pub west: f64,
    pub east: f64,
}

impl Bounds {
    pub fn is_valid(&self) -> bool {
        self.north >= self.south && self.east >= self.west
    }

    pub fn contains(&self, coordinate: &Coordinate) -> bool {
        (self.south..=self.north).contains(&coordinate.latitude)
            && (self.west..=self.east).contains(&coordinate.longitude)
    }

    pub fn center(&self) -> Coordinate {
        Coordinate {
            latitude: (self.north + self.south) / 2.0,
            longitude: (self.east + self.west) / 2.0,
        }
    }

    pub fn from_coordinates<'a>(coordinates: impl IntoIterator<Item = &'a Coordinate>) -> Option<Self> {
        let mut iter = coordinates.into_iter();
        let first = iter.next()?;
        let start = Bounds {
            north: first.latitude,
            south: first.latitude,
            west: first.longitude,
            east: first.longitude,
        };
        Some(iter.fold(start, |acc, c| Bounds {
            north: acc.north.max(c.latitude),
            south: acc.south.min(c.latitude),
            west: acc.west.min(c.longitude),
            east: acc.east.max(c.longitude),
        }))
    }

    pub fn height_m(&self) -> f64 {
        (self.north - self.south).abs() * METERS_PER_DEGREE
    }

    pub fn width_m(&self) -> f64 {
        let latitude = self.center().latitude.to_radians();
        (self.east - self.west).abs() * METERS_PER_DEGREE * latitude.cos()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    pub vertices: Vec<Coordinate>,
}

impl Polygon {
    pub fn new(vertices: Vec<Coordinate>) -> Self {
        Self { vertices }
    }

    pub fn bounds(&self) -> Option<Bounds> {
        Bounds::from_coordinates(&self.vertices)
    }

    /// Even-odd ray casting with x = longitude, y = latitude.
    pub fn contains(&self, point: &Coordinate) -> bool {
        let n = self.vertices.len();
        if n < 3 {
            return false;
        }

        let (x, y) = (point.longitude, point.latitude);
        let mut inside = false;
        let mut p1 = self.vertices[0];
        for i in 1..=n {
            let p2 = self.vertices[i % n];
            let (p1x, p1y) = (p1.longitude, p1.latitude);
            let (p2x, p2y) = (p2.longitude, p2.latitude);

            if y > p1y.min(p2y) && y <= p1y.max(p2y) && x <= p1x.max(p2x) {
                let crosses = if p1x == p2x {
                    true
                } else if p1y != p2y {
                    let x_intersection = (y - p1y) * (p2x - p1x) / (p2y - p1y) + p1x;
                    x <= x_intersection
                } else {
                    false
                };
                if crosses {
                    inside = !inside;
                }
            }
            p1 = p2;
        }
        inside
    }
}
