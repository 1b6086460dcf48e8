// src/grid.rs
//
// Sample lattices. All coordinates in millimetres.
//
// - `PlaneGrid`: a 2D lattice embedded in 3D (x–z plane at fixed y, or x–y
//   plane at fixed z). Point order: second in-plane axis outer, first inner,
//   i.e. idx = k * nu + i.
// - `ImageGrid`: a regular 3D lattice defined by dimensions, spacing and
//   origin (VTK image-data convention), x fastest, then y, then z.

use serde::Serialize;

/// `n` evenly spaced samples over [start, stop], both endpoints included.
pub fn linspace(start: f64, stop: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (n - 1) as f64;
            (0..n)
                .map(|i| {
                    if i == n - 1 {
                        stop
                    } else {
                        start + step * i as f64
                    }
                })
                .collect()
        }
    }
}

/// Orientation of a sampling plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum Plane {
    /// x–z plane at the given y; in-plane axes (u, v) = (x, z).
    Xz { y: f64 },
    /// x–y plane at the given z; in-plane axes (u, v) = (x, y).
    Xy { z: f64 },
}

impl Plane {
    /// Embed in-plane coordinates (u, v) into 3D.
    #[inline]
    pub fn embed(&self, u: f64, v: f64) -> [f64; 3] {
        match *self {
            Plane::Xz { y } => [u, y, v],
            Plane::Xy { z } => [u, v, z],
        }
    }

    /// Project a 3D vector onto the in-plane axes.
    #[inline]
    pub fn in_plane(&self, b: [f64; 3]) -> [f64; 2] {
        match self {
            Plane::Xz { .. } => [b[0], b[2]],
            Plane::Xy { .. } => [b[0], b[1]],
        }
    }

    pub fn axis_labels(&self) -> (&'static str, &'static str) {
        match self {
            Plane::Xz { .. } => ("x [mm]", "z [mm]"),
            Plane::Xy { .. } => ("x [mm]", "y [mm]"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlaneGrid {
    pub plane: Plane,
    pub u: Vec<f64>,
    pub v: Vec<f64>,
}

impl PlaneGrid {
    pub fn new(plane: Plane, u: Vec<f64>, v: Vec<f64>) -> Self {
        Self { plane, u, v }
    }

    /// Square lattice of n×n samples over [lo, hi]² (both axes share `ts`).
    pub fn square(plane: Plane, lo: f64, hi: f64, n: usize) -> Self {
        let ts = linspace(lo, hi, n);
        Self::new(plane, ts.clone(), ts)
    }

    #[inline]
    pub fn nu(&self) -> usize {
        self.u.len()
    }

    #[inline]
    pub fn nv(&self) -> usize {
        self.v.len()
    }

    pub fn n_points(&self) -> usize {
        self.nu() * self.nv()
    }

    #[inline]
    pub fn idx(&self, i: usize, k: usize) -> usize {
        debug_assert!(i < self.nu() && k < self.nv());
        k * self.nu() + i
    }

    #[inline]
    pub fn point(&self, i: usize, k: usize) -> [f64; 3] {
        self.plane.embed(self.u[i], self.v[k])
    }

    pub fn points(&self) -> Vec<[f64; 3]> {
        let mut out = Vec::with_capacity(self.n_points());
        for k in 0..self.nv() {
            for i in 0..self.nu() {
                out.push(self.point(i, k));
            }
        }
        out
    }

    /// (u_min, u_max, v_min, v_max); zeros for an empty grid.
    pub fn extent(&self) -> (f64, f64, f64, f64) {
        let first = |a: &[f64]| a.first().copied().unwrap_or(0.0);
        let last = |a: &[f64]| a.last().copied().unwrap_or(0.0);
        (first(&self.u), last(&self.u), first(&self.v), last(&self.v))
    }
}

/// Regular 3D lattice: point (i,j,k) = origin + (i,j,k) ⊙ spacing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ImageGrid {
    pub dims: [usize; 3],
    pub spacing: [f64; 3],
    pub origin: [f64; 3],
}

impl ImageGrid {
    pub fn new(dims: [usize; 3], spacing: [f64; 3], origin: [f64; 3]) -> Self {
        Self {
            dims,
            spacing,
            origin,
        }
    }

    /// Cubic lattice with `n` nodes per axis and uniform spacing.
    pub fn cube(n: usize, spacing: f64, origin: f64) -> Self {
        Self::new([n; 3], [spacing; 3], [origin; 3])
    }

    pub fn n_points(&self) -> usize {
        self.dims[0] * self.dims[1] * self.dims[2]
    }

    #[inline]
    pub fn idx(&self, i: usize, j: usize, k: usize) -> usize {
        debug_assert!(i < self.dims[0] && j < self.dims[1] && k < self.dims[2]);
        (k * self.dims[1] + j) * self.dims[0] + i
    }

    #[inline]
    pub fn point(&self, i: usize, j: usize, k: usize) -> [f64; 3] {
        [
            self.origin[0] + i as f64 * self.spacing[0],
            self.origin[1] + j as f64 * self.spacing[1],
            self.origin[2] + k as f64 * self.spacing[2],
        ]
    }

    pub fn points(&self) -> Vec<[f64; 3]> {
        let mut out = Vec::with_capacity(self.n_points());
        for k in 0..self.dims[2] {
            for j in 0..self.dims[1] {
                for i in 0..self.dims[0] {
                    out.push(self.point(i, j, k));
                }
            }
        }
        out
    }

    /// ([xmin, ymin, zmin], [xmax, ymax, zmax]).
    pub fn bounds(&self) -> ([f64; 3], [f64; 3]) {
        let mut hi = [0.0; 3];
        for a in 0..3 {
            hi[a] = self.origin[a] + self.dims[a].saturating_sub(1) as f64 * self.spacing[a];
        }
        (self.origin, hi)
    }

    /// Inclusive bounds test.
    pub fn contains(&self, p: [f64; 3]) -> bool {
        let (lo, hi) = self.bounds();
        (0..3).all(|a| p[a] >= lo[a] && p[a] <= hi[a])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linspace_includes_endpoints() {
        let ts = linspace(-60.0, 60.0, 300);
        assert_eq!(ts.len(), 300);
        assert_eq!(ts[0], -60.0);
        assert_eq!(ts[299], 60.0);
        let step = 120.0 / 299.0;
        assert!((ts[1] - ts[0] - step).abs() < 1e-12);
    }

    #[test]
    fn linspace_degenerate_counts() {
        assert!(linspace(0.0, 1.0, 0).is_empty());
        assert_eq!(linspace(3.0, 7.0, 1), vec![3.0]);
        assert_eq!(linspace(3.0, 7.0, 2), vec![3.0, 7.0]);
    }

    #[test]
    fn plane_grid_order_is_v_outer() {
        let g = PlaneGrid::square(Plane::Xz { y: 0.0 }, -1.0, 1.0, 3);
        let pts = g.points();
        assert_eq!(pts.len(), 9);
        assert_eq!(pts[0], [-1.0, 0.0, -1.0]);
        assert_eq!(pts[1], [0.0, 0.0, -1.0]);
        assert_eq!(pts[3], [-1.0, 0.0, 0.0]);
        assert_eq!(g.idx(2, 1), 5);
        assert_eq!(pts[g.idx(2, 1)], g.point(2, 1));
    }

    #[test]
    fn xy_plane_embeds_height() {
        let g = PlaneGrid::square(Plane::Xy { z: 22.5 }, 0.0, 1.0, 2);
        assert!(g.points().iter().all(|p| p[2] == 22.5));
    }

    #[test]
    fn image_grid_indexing_is_consistent() {
        let g = ImageGrid::new([4, 3, 2], [1.0, 1.0, 1.0], [0.0, 0.0, 0.0]);
        assert_eq!(g.idx(0, 0, 0), 0);
        assert_eq!(g.idx(1, 0, 0), 1);
        assert_eq!(g.idx(0, 1, 0), 4);
        assert_eq!(g.idx(0, 0, 1), 12);
        assert_eq!(g.idx(3, 2, 1), 23);
        assert_eq!(g.n_points(), 24);
        let pts = g.points();
        assert_eq!(pts[g.idx(3, 2, 1)], [3.0, 2.0, 1.0]);
    }

    #[test]
    fn image_grid_spans_declared_box() {
        let g = ImageGrid::cube(51, 2.0, -50.0);
        assert_eq!(g.n_points(), 51 * 51 * 51);
        let (lo, hi) = g.bounds();
        assert_eq!(lo, [-50.0; 3]);
        assert_eq!(hi, [50.0; 3]);
        assert!(g.contains([50.0, -50.0, 0.0]));
        assert!(!g.contains([50.1, 0.0, 0.0]));
    }
}
