use crate::geo::Coordinate;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, StandardNormal};
use serde::{Deserialize, Serialize};

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Seeded RNG; the same seed always yields the same dataset.
pub struct GaussianSampler {
    rng: StdRng,
}

impl GaussianSampler {
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn normal(&mut self, mean: f64, std_dev: f64) -> f64 {
        let deviate: f64 = StandardNormal.sample(&mut self.rng);
        mean + std_dev * deviate
    }

    /// Value in `[low, high)`; a collapsed range returns `low`.
    pub fn uniform(&mut self, low: f64, high: f64) -> f64 {
        low + (high - low) * self.rng.random::<f64>()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HeightLevel {
    OneMeter,
    TwoMeters,
    FiveMeters,
    TenMeters,
}

impl HeightLevel {
    pub const ALL: [HeightLevel; 4] = [
        HeightLevel::OneMeter,
        HeightLevel::TwoMeters,
        HeightLevel::FiveMeters,
        HeightLevel::TenMeters,
    ];

    pub fn meters(&self) -> u32 {
        match self {
            HeightLevel::OneMeter => 1,
            HeightLevel::TwoMeters => 2,
            HeightLevel::FiveMeters => 5,
            HeightLevel::TenMeters => 10,
        }
    }

    pub fn suffix(&self) -> &'static str {
        match self {
            HeightLevel::OneMeter => "1m",
            HeightLevel::TwoMeters => "2m",
            HeightLevel::FiveMeters => "5m",
            HeightLevel::TenMeters => "10m",
        }
    }

    pub fn column(&self) -> String {
        format!("temp_{}", self.suffix())
    }

    /// Mean offset from the base temperature; air cools with height.
    fn offset(&self) -> f64 {
        match self {
            HeightLevel::OneMeter => 0.0,
            HeightLevel::TwoMeters => -0.5,
            HeightLevel::FiveMeters => -1.0,
            HeightLevel::TenMeters => -1.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LevelReadings {
    pub temp_1m: f64,
    pub temp_2m: f64,
    pub temp_5m: f64,
    pub temp_10m: f64,
}

impl LevelReadings {
    pub fn get(&self, level: HeightLevel) -> f64 {
        match level {
            HeightLevel::OneMeter => self.temp_1m,
            HeightLevel::TwoMeters => self.temp_2m,
            HeightLevel::FiveMeters => self.temp_5m,
            HeightLevel::TenMeters => self.temp_10m,
        }
    }

    fn set(&mut self, level: HeightLevel, value: f64) {
        match level {
            HeightLevel::OneMeter => self.temp_1m = value,
            HeightLevel::TwoMeters => self.temp_2m = value,
            HeightLevel::FiveMeters => self.temp_5m = value,
            HeightLevel::TenMeters => self.temp_10m = value,
        }
    }

    pub fn average(&self) -> f64 {
        round_to(
            (self.temp_1m + self.temp_2m + self.temp_5m + self.temp_10m) / 4.0,
            1,
        )
    }
}

const LEVEL_NOISE_SD: f64 = 0.5;

/// One shared base draw per point, then a noisy offset per height.
pub fn multilevel_readings(sampler: &mut GaussianSampler) -> LevelReadings {
    let base = sampler.normal(15.0, 3.0);
    let mut readings = LevelReadings {
        temp_1m: 0.0,
        temp_2m: 0.0,
        temp_5m: 0.0,
        temp_10m: 0.0,
    };
    for level in HeightLevel::ALL {
        let value = base + sampler.normal(level.offset(), LEVEL_NOISE_SD);
        readings.set(level, round_to(value, 1));
    }
    readings
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThermalCenter {
    pub coordinate: Coordinate,
    pub temperature: f64,
}

impl ThermalCenter {
    pub const fn new(latitude: f64, longitude: f64, temperature: f64) -> Self {
        Self {
            coordinate: Coordinate {
                latitude,
                longitude,
            },
            temperature,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThermalField {
    pub base: f64,
    pub centers: Vec<ThermalCenter>,
    pub decay: f64,
    pub noise_sd: f64,
    pub clamp: Option<(f64, f64)>,
}

impl ThermalField {
    /// Noise-free field value.
    pub fn expected_at(&self, coordinate: &Coordinate) -> f64 {
        self.centers.iter().fold(self.base, |acc, center| {
            let influence = (-coordinate.degree_distance(&center.coordinate) * self.decay).exp();
            acc + (center.temperature - self.base) * influence
        })
    }

    pub fn temperature_at(&self, coordinate: &Coordinate, sampler: &mut GaussianSampler) -> f64 {
        let value = self.expected_at(coordinate) + sampler.normal(0.0, self.noise_sd);
        let value = round_to(value, 1);
        match self.clamp {
            Some((min, max)) => value.clamp(min, max),
            None => value,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ThermalProfile {
    pub one_meter: ThermalField,
    pub two_meters: ThermalField,
    pub five_meters: ThermalField,
    pub ten_meters: ThermalField,
}

impl ThermalProfile {
    pub fn field(&self, level: HeightLevel) -> &ThermalField {
        match level {
            HeightLevel::OneMeter => &self.one_meter,
            HeightLevel::TwoMeters => &self.two_meters,
            HeightLevel::FiveMeters => &self.five_meters,
            HeightLevel::TenMeters => &self.ten_meters,
        }
    }

    pub fn readings_at(&self, coordinate: &Coordinate, sampler: &mut GaussianSampler) -> LevelReadings {
        let mut readings = LevelReadings {
            temp_1m: 0.0,
            temp_2m: 0.0,
            temp_5m: 0.0,
            temp_10m: 0.0,
        };
        for level in HeightLevel::ALL {
            readings.set(level, self.field(level).temperature_at(coordinate, sampler));
        }
        readings
    }

    /// Two warm spots per level over Finca Río Negro.
    pub fn relief() -> Self {
        let field = |base: f64, centers: [ThermalCenter; 2]| ThermalField {
            base,
            centers: centers.to_vec(),
            decay: 800.0,
            noise_sd: 0.8,
            clamp: None,
        };
        Self {
            one_meter: field(
                12.0,
                [
                    ThermalCenter::new(-39.164, -67.035, 18.0),
                    ThermalCenter::new(-39.167, -67.031, 16.0),
                ],
            ),
            two_meters: field(
                11.5,
                [
                    ThermalCenter::new(-39.165, -67.036, 17.0),
                    ThermalCenter::new(-39.168, -67.032, 15.0),
                ],
            ),
            five_meters: field(
                11.0,
                [
                    ThermalCenter::new(-39.166, -67.034, 16.0),
                    ThermalCenter::new(-39.164, -67.030, 14.0),
                ],
            ),
            ten_meters: field(
                10.5,
                [
                    ThermalCenter::new(-39.167, -67.035, 15.0),
                    ThermalCenter::new(-39.165, -67.031, 13.0),
                ],
            ),
        }
    }

    /// One warm and one cold spot per level, clamped to 2..20 °C.
    pub fn wide_range() -> Self {
        let field = |base: f64, centers: [ThermalCenter; 2]| ThermalField {
            base,
            centers: centers.to_vec(),
            decay: 600.0,
            noise_sd: 2.0,
            clamp: Some((2.0, 20.0)),
        };
        Self {
            one_meter: field(
                12.0,
                [
                    ThermalCenter::new(-39.164, -67.035, 18.0),
                    ThermalCenter::new(-39.167, -67.031, 8.0),
                ],
            ),
            two_meters: field(
                11.0,
                [
                    ThermalCenter::new(-39.165, -67.036, 16.0),
                    ThermalCenter::new(-39.168, -67.032, 6.0),
                ],
            ),
            five_meters: field(
                10.0,
                [
                    ThermalCenter::new(-39.166, -67.034, 14.0),
                    ThermalCenter::new(-39.164, -67.030, 4.0),
                ],
            ),
            ten_meters: field(
                9.0,
                [
                    ThermalCenter::new(-39.167, -67.035, 12.0),
                    ThermalCenter::new(-39.165, -67.031, 2.0),
                ],
            ),
        }
    }
}
