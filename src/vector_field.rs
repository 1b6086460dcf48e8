// src/vector_field.rs
//
// Sampled B fields: a grid plus one [Bx, By, Bz] (T) per grid point, in the
// grid's point order. Computed once, read-only afterwards.

use crate::error::Result;
use crate::grid::{ImageGrid, PlaneGrid};
use crate::magnet::CylinderMagnet;
use crate::params::TESLA_TO_GAUSS;
use crate::vec3::norm;

#[inline]
fn lerp2(a: [f64; 2], b: [f64; 2], t: f64) -> [f64; 2] {
    [a[0] * (1.0 - t) + b[0] * t, a[1] * (1.0 - t) + b[1] * t]
}

#[inline]
fn lerp3(a: [f64; 3], b: [f64; 3], t: f64) -> [f64; 3] {
    [
        a[0] * (1.0 - t) + b[0] * t,
        a[1] * (1.0 - t) + b[1] * t,
        a[2] * (1.0 - t) + b[2] * t,
    ]
}

/// Locate `x` in a sorted node array: (lower index, fractional offset).
/// Returns None outside [first, last].
fn locate(nodes: &[f64], x: f64) -> Option<(usize, f64)> {
    let n = nodes.len();
    if n < 2 || !x.is_finite() || x < nodes[0] || x > nodes[n - 1] {
        return None;
    }
    // Uniform lattices: direct index, then clamp.
    let step = (nodes[n - 1] - nodes[0]) / (n - 1) as f64;
    let i = (((x - nodes[0]) / step).floor() as usize).min(n - 2);
    let t = ((x - nodes[i]) / (nodes[i + 1] - nodes[i])).clamp(0.0, 1.0);
    Some((i, t))
}

/// B sampled on a plane.
pub struct PlaneField {
    pub grid: PlaneGrid,
    pub data: Vec<[f64; 3]>,
}

impl PlaneField {
    pub fn compute(grid: PlaneGrid, magnet: &CylinderMagnet) -> Result<Self> {
        let data = magnet.b_field_checked(&grid.points(), grid.n_points())?;
        Ok(Self { grid, data })
    }

    #[inline]
    pub fn at(&self, i: usize, k: usize) -> [f64; 3] {
        self.data[self.grid.idx(i, k)]
    }

    /// In-plane components at node (i, k).
    #[inline]
    pub fn in_plane(&self, i: usize, k: usize) -> [f64; 2] {
        self.grid.plane.in_plane(self.at(i, k))
    }

    /// |B| in gauss, grid order.
    pub fn magnitude_gauss(&self) -> Vec<f64> {
        self.data.iter().map(|&b| norm(b) * TESLA_TO_GAUSS).collect()
    }

    /// Bilinear sample of the in-plane field at (u, v); None outside.
    pub fn sample_in_plane(&self, u: f64, v: f64) -> Option<[f64; 2]> {
        let (i, tu) = locate(&self.grid.u, u)?;
        let (k, tv) = locate(&self.grid.v, v)?;
        let b0 = lerp2(self.in_plane(i, k), self.in_plane(i + 1, k), tu);
        let b1 = lerp2(self.in_plane(i, k + 1), self.in_plane(i + 1, k + 1), tu);
        Some(lerp2(b0, b1, tv))
    }
}

/// B sampled on a 3D image grid.
pub struct VolumeField {
    pub grid: ImageGrid,
    pub data: Vec<[f64; 3]>,
}

impl VolumeField {
    pub fn compute(grid: ImageGrid, magnet: &CylinderMagnet) -> Result<Self> {
        let data = magnet.b_field_checked(&grid.points(), grid.n_points())?;
        Ok(Self { grid, data })
    }

    /// Trilinear sample at p (mm); None outside the grid bounds.
    pub fn sample(&self, p: [f64; 3]) -> Option<[f64; 3]> {
        let g = &self.grid;
        let mut base = [0usize; 3];
        let mut t = [0.0; 3];
        for a in 0..3 {
            if g.dims[a] < 2 {
                return None;
            }
            let f = (p[a] - g.origin[a]) / g.spacing[a];
            let max = (g.dims[a] - 1) as f64;
            if !f.is_finite() || f < 0.0 || f > max {
                return None;
            }
            let i = (f.floor() as usize).min(g.dims[a] - 2);
            base[a] = i;
            t[a] = f - i as f64;
        }

        let v = |di: usize, dj: usize, dk: usize| {
            self.data[g.idx(base[0] + di, base[1] + dj, base[2] + dk)]
        };

        let c00 = lerp3(v(0, 0, 0), v(1, 0, 0), t[0]);
        let c10 = lerp3(v(0, 1, 0), v(1, 1, 0), t[0]);
        let c01 = lerp3(v(0, 0, 1), v(1, 0, 1), t[0]);
        let c11 = lerp3(v(0, 1, 1), v(1, 1, 1), t[0]);
        let c0 = lerp3(c00, c10, t[1]);
        let c1 = lerp3(c01, c11, t[1]);
        Some(lerp3(c0, c1, t[2]))
    }

    /// (min, max) of |B| in tesla over all samples.
    pub fn magnitude_range(&self) -> (f64, f64) {
        magnitude_range(&self.data)
    }
}

/// (min, max) of |v| over finite entries; (0, 0) if there are none.
pub fn magnitude_range(data: &[[f64; 3]]) -> (f64, f64) {
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for &b in data {
        let m = norm(b);
        if m.is_finite() {
            lo = lo.min(m);
            hi = hi.max(m);
        }
    }
    if lo.is_finite() {
        (lo, hi)
    } else {
        (0.0, 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Plane;

    fn magnet() -> CylinderMagnet {
        CylinderMagnet::new(30.0, 35.0, 1.115).unwrap()
    }

    #[test]
    fn plane_field_has_one_sample_per_point() {
        let grid = PlaneGrid::square(Plane::Xz { y: 0.0 }, -60.0, 60.0, 41);
        let f = PlaneField::compute(grid, &magnet()).unwrap();
        assert_eq!(f.data.len(), 41 * 41);
        assert_eq!(f.magnitude_gauss().len(), 41 * 41);
    }

    #[test]
    fn bilinear_sample_hits_nodes_exactly() {
        let grid = PlaneGrid::square(Plane::Xz { y: 0.0 }, -60.0, 60.0, 13);
        let f = PlaneField::compute(grid, &magnet()).unwrap();
        let (u, v) = (f.grid.u[4], f.grid.v[9]);
        let s = f.sample_in_plane(u, v).unwrap();
        let n = f.in_plane(4, 9);
        assert!((s[0] - n[0]).abs() < 1e-12 && (s[1] - n[1]).abs() < 1e-12);
        assert!(f.sample_in_plane(61.0, 0.0).is_none());
    }

    #[test]
    fn trilinear_is_exact_for_linear_data() {
        let grid = ImageGrid::cube(5, 1.0, 0.0);
        let data = grid
            .points()
            .iter()
            .map(|p| [p[0] + 2.0 * p[1], -p[2], 3.0])
            .collect();
        let f = VolumeField { grid, data };
        let s = f.sample([1.25, 2.5, 3.75]).unwrap();
        assert!((s[0] - 6.25).abs() < 1e-12);
        assert!((s[1] + 3.75).abs() < 1e-12);
        assert!((s[2] - 3.0).abs() < 1e-12);
        assert!(f.sample([4.0, 4.0, 4.0]).is_some());
        assert!(f.sample([-0.1, 0.0, 0.0]).is_none());
    }
}
