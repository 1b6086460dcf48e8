// src/magnet.rs
//
// Uniformly magnetised cylinder, axis along z, centred at the origin.
//
// Units: geometry in mm, polarization J and returned B in tesla.
//
// Field model (equivalent surface current, Derby & Olbert, Am. J. Phys. 78
// (2010)): with positions normalised by the radius R,
//
//   z± = z ± h,  ρ± = 1 ± ρ,  γ = ρ- / ρ+
//   k± = sqrt((z±² + ρ-²) / (z±² + ρ+²)),  s± = sqrt(z±² + ρ+²)
//
//   B_ρ = J/π      [ cel(k+, 1, 1, -1)/s+  - cel(k-, 1, 1, -1)/s- ]
//   B_z = J/(π ρ+) [ z+ cel(k+, γ², 1, γ)/s+ - z- cel(k-, γ², 1, γ)/s- ]
//
// where h = H/(2R). This is B (not μ0·H), so inside the magnet the
// polarization is already included. The expression diverges on the two edge
// rings (ρ = 1, |z| = h); there the field is defined as zero.

use rayon::prelude::*;
use serde::Serialize;
use std::f64::consts::PI;

use crate::elliptic::cel;
use crate::error::{MagnetSimError, Result};

/// Relative distance (in units of R) below which a point counts as on the edge.
const EDGE_EPS: f64 = 1e-10;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CylinderMagnet {
    /// Diameter D (mm).
    pub diameter: f64,
    /// Height H (mm).
    pub height: f64,
    /// Polarization magnitude along +z (T).
    pub polarization: f64,
}

impl CylinderMagnet {
    pub fn new(diameter: f64, height: f64, polarization: f64) -> Result<Self> {
        if !(diameter.is_finite() && diameter > 0.0) {
            return Err(MagnetSimError::InvalidGeometry(format!(
                "diameter must be finite and > 0 (got {diameter})"
            )));
        }
        if !(height.is_finite() && height > 0.0) {
            return Err(MagnetSimError::InvalidGeometry(format!(
                "height must be finite and > 0 (got {height})"
            )));
        }
        if !polarization.is_finite() {
            return Err(MagnetSimError::InvalidGeometry(format!(
                "polarization must be finite (got {polarization})"
            )));
        }
        Ok(Self {
            diameter,
            height,
            polarization,
        })
    }

    #[inline]
    pub fn radius(&self) -> f64 {
        0.5 * self.diameter
    }

    #[inline]
    pub fn half_height(&self) -> f64 {
        0.5 * self.height
    }

    /// π (D/2)² H in mm³.
    pub fn volume(&self) -> f64 {
        PI * self.radius() * self.radius() * self.height
    }

    /// Strict interior test (surface points are outside).
    pub fn contains(&self, p: [f64; 3]) -> bool {
        let r = (p[0] * p[0] + p[1] * p[1]).sqrt();
        r < self.radius() && p[2].abs() < self.half_height()
    }

    /// B field (T) at a single point (mm).
    pub fn b_field(&self, p: [f64; 3]) -> [f64; 3] {
        let r0 = self.radius();
        let x = p[0] / r0;
        let y = p[1] / r0;
        let z = p[2] / r0;
        let h = self.half_height() / r0;
        let rho = (x * x + y * y).sqrt();

        if (rho - 1.0).abs() < EDGE_EPS && (z.abs() - h).abs() < EDGE_EPS {
            return [0.0, 0.0, 0.0];
        }

        let (b_rho, b_z) = axial_cylinder_unit_field(h, rho, z);
        let j = self.polarization;

        if rho > 0.0 {
            let c = x / rho;
            let s = y / rho;
            [j * b_rho * c, j * b_rho * s, j * b_z]
        } else {
            [0.0, 0.0, j * b_z]
        }
    }

    /// Batched evaluation; output order matches `points`.
    pub fn b_field_many(&self, points: &[[f64; 3]]) -> Vec<[f64; 3]> {
        points.par_iter().map(|&p| self.b_field(p)).collect()
    }

    /// Batched evaluation that checks the caller's expected sample count.
    pub fn b_field_checked(&self, points: &[[f64; 3]], expected: usize) -> Result<Vec<[f64; 3]>> {
        if points.len() != expected {
            return Err(MagnetSimError::ShapeMismatch {
                expected,
                got: points.len(),
            });
        }
        Ok(self.b_field_many(points))
    }

    /// On-axis B_z (T) from the elementary solenoid expression; used for
    /// reporting and as a cross-check of the general formula.
    pub fn axial_bz(&self, z: f64) -> f64 {
        let r = self.radius();
        let h = self.half_height();
        let zp = z + h;
        let zm = z - h;
        0.5 * self.polarization * (zp / (zp * zp + r * r).sqrt() - zm / (zm * zm + r * r).sqrt())
    }
}

/// (B_ρ, B_z) for unit polarization and unit radius; `h` is the half height.
fn axial_cylinder_unit_field(h: f64, rho: f64, z: f64) -> (f64, f64) {
    let zph = z + h;
    let zmh = z - h;
    let dpr = 1.0 + rho;
    let dmr = 1.0 - rho;

    let sq0 = (zmh * zmh + dpr * dpr).sqrt();
    let sq1 = (zph * zph + dpr * dpr).sqrt();
    let k0 = ((zmh * zmh + dmr * dmr) / (zmh * zmh + dpr * dpr)).sqrt();
    let k1 = ((zph * zph + dmr * dmr) / (zph * zph + dpr * dpr)).sqrt();
    let gamma = dmr / dpr;
    let g2 = gamma * gamma;

    let b_rho = (cel(k1, 1.0, 1.0, -1.0) / sq1 - cel(k0, 1.0, 1.0, -1.0) / sq0) / PI;
    let b_z = (zph * cel(k1, g2, 1.0, gamma) / sq1 - zmh * cel(k0, g2, 1.0, gamma) / sq0)
        / (dpr * PI);

    (b_rho, b_z)
}
