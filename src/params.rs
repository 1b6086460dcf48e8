// src/params.rs
//
// Datasheet values for the permanent-magnet material and the derived SI
// working constants.
//
// Datasheets quote ranges (min–max) in mixed units; we take the midpoint of
// every range and convert kA/m -> A/m and kJ/m³ -> J/m³. Hcj is only
// specified as a floor, so it is carried as a single value.

use serde::Serialize;
use std::f64::consts::PI;

/// Vacuum permeability (H/m).
pub const MU0: f64 = 4.0 * PI * 1e-7;

/// 1 T = 10^4 G.
pub const TESLA_TO_GAUSS: f64 = 1.0e4;

/// Closed interval quoted on a datasheet.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DatasheetRange {
    pub min: f64,
    pub max: f64,
}

impl DatasheetRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    #[inline]
    pub fn midpoint(&self) -> f64 {
        0.5 * (self.min + self.max)
    }
}

/// Magnet grade as printed on the supplier's datasheet (datasheet units).
#[derive(Debug, Clone, Serialize)]
pub struct MaterialGrade {
    pub grade: &'static str,
    /// Chemical formula, printed in the report header.
    pub composition: &'static str,
    /// Remanence Br (T).
    pub br: DatasheetRange,
    /// Normal coercivity Hcb (kA/m).
    pub hcb: DatasheetRange,
    /// Intrinsic coercivity Hcj lower bound (kA/m).
    pub hcj_min: f64,
    /// Maximum energy product (BH)max (kJ/m³).
    pub bh_max: DatasheetRange,
    /// Maximum working temperature (°C).
    pub max_working_temp_c: f64,
}

impl MaterialGrade {
    /// YXG-32 Sm₂Co₁₇ (Sm2(CoFeCuZr)17).
    pub fn yxg32() -> Self {
        Self {
            grade: "YXG-32",
            composition: "Sm₂Co₁₇",
            br: DatasheetRange::new(1.10, 1.13),
            hcb: DatasheetRange::new(812.0, 860.0),
            hcj_min: 1433.0,
            bh_max: DatasheetRange::new(230.0, 255.0),
            max_working_temp_c: 350.0,
        }
    }

    /// Midpoint-averaged working constants in SI units.
    pub fn derive(&self) -> Material {
        Material {
            grade: self.grade,
            composition: self.composition,
            br: self.br.midpoint(),
            hcb: self.hcb.midpoint() * 1e3,
            hcj: self.hcj_min * 1e3,
            bh_max: self.bh_max.midpoint() * 1e3,
        }
    }
}

/// Working material constants (SI).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Material {
    pub grade: &'static str,
    pub composition: &'static str,
    pub br: f64,     // T
    pub hcb: f64,    // A/m
    pub hcj: f64,    // A/m (floor)
    pub bh_max: f64, // J/m^3
}

impl Material {
    /// M = Br / mu0 (A/m).
    #[inline]
    pub fn magnetization(&self) -> f64 {
        self.br / MU0
    }

    /// The polarization J used to drive the field model equals Br.
    #[inline]
    pub fn polarization(&self) -> f64 {
        self.br
    }
}
