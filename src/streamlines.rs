// src/streamlines.rs
//
// Field-line tracing.
//
// 2D (`streamplot`): density-controlled streamlines on a plane, in the usual
// streamplot manner. The domain is covered by a coarse occupancy mask of
// round(30·density)² cells; seeds are the mask cell centres visited from the
// boundary inwards; every trajectory is integrated forwards and backwards
// along the normalised in-plane field and claims the mask cells it crosses.
// A trajectory stops when it leaves the domain, runs into a cell already
// claimed (by any trajectory, itself included), hits a null of the field, or
// exceeds the maximum length. Short trajectories are dropped and their cells
// released.
//
// 3D (`trace_from_seeds`): classic stream tracer on a sampled volume field
// with trilinear interpolation, fixed arc-length RK4 steps, a maximum
// propagation length per direction, forward/backward/both.

use serde::Serialize;

use crate::magnet::CylinderMagnet;
use crate::vec3::{add, norm, scale};
use crate::vector_field::{PlaneField, VolumeField};

/// Fields weaker than this (T) are treated as a null.
const FIELD_NULL: f64 = 1e-12;

/// Upper bound on the occupancy mask side (density 10).
const MAX_MASK_CELLS: usize = 300;

// ---------------------------------------------------------------------------
// 2D streamplot
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize)]
pub struct StreamplotOptions {
    /// 1.0 -> 30×30 occupancy cells.
    pub density: f64,
    /// Maximum trajectory length as a multiple of the domain width.
    pub max_length: f64,
    /// Minimum trajectory length as a multiple of the domain width.
    pub min_length: f64,
    /// Integration step as a fraction of one mask cell.
    pub step_fraction: f64,
}

impl Default for StreamplotOptions {
    fn default() -> Self {
        Self {
            density: 1.0,
            max_length: 4.0,
            min_length: 0.1,
            step_fraction: 0.2,
        }
    }
}

/// One 2D streamline in plane coordinates (u, v), ordered along +B.
#[derive(Debug, Clone)]
pub struct StreamLine2D {
    pub points: Vec<[f64; 2]>,
}

impl StreamLine2D {
    pub fn length(&self) -> f64 {
        self.points
            .windows(2)
            .map(|w| ((w[1][0] - w[0][0]).powi(2) + (w[1][1] - w[0][1]).powi(2)).sqrt())
            .sum()
    }
}

struct Mask {
    n: usize,
    occupied: Vec<bool>,
    u0: f64,
    v0: f64,
    du: f64,
    dv: f64,
}

impl Mask {
    fn cell(&self, u: f64, v: f64) -> (usize, usize) {
        let i = (((u - self.u0) / self.du).floor().max(0.0) as usize).min(self.n - 1);
        let k = (((v - self.v0) / self.dv).floor().max(0.0) as usize).min(self.n - 1);
        (i, k)
    }

    #[inline]
    fn idx(&self, c: (usize, usize)) -> usize {
        c.1 * self.n + c.0
    }

    fn centre(&self, c: (usize, usize)) -> [f64; 2] {
        [
            self.u0 + (c.0 as f64 + 0.5) * self.du,
            self.v0 + (c.1 as f64 + 0.5) * self.dv,
        ]
    }

    /// Cells ordered by ring distance from the boundary, then row-major.
    fn seed_order(&self) -> Vec<(usize, usize)> {
        let n = self.n;
        let mut cells: Vec<(usize, usize)> = (0..n)
            .flat_map(|k| (0..n).map(move |i| (i, k)))
            .collect();
        cells.sort_by_key(|&(i, k)| {
            let ring = i.min(k).min(n - 1 - i).min(n - 1 - k);
            (ring, k, i)
        });
        cells
    }
}

/// Unit in-plane direction at (u, v), scaled by `sign`.
fn direction_2d(field: &PlaneField, p: [f64; 2], sign: f64) -> Option<[f64; 2]> {
    let b = field.sample_in_plane(p[0], p[1])?;
    let m = (b[0] * b[0] + b[1] * b[1]).sqrt();
    if !(m > FIELD_NULL) {
        return None;
    }
    Some([sign * b[0] / m, sign * b[1] / m])
}

fn rk4_step_2d(field: &PlaneField, p: [f64; 2], h: f64, sign: f64) -> Option<[f64; 2]> {
    let at = |q: [f64; 2], k: [f64; 2], s: f64| [q[0] + s * k[0], q[1] + s * k[1]];
    let k1 = direction_2d(field, p, sign)?;
    let k2 = direction_2d(field, at(p, k1, 0.5 * h), sign)?;
    let k3 = direction_2d(field, at(p, k2, 0.5 * h), sign)?;
    let k4 = direction_2d(field, at(p, k3, h), sign)?;
    Some([
        p[0] + h / 6.0 * (k1[0] + 2.0 * k2[0] + 2.0 * k3[0] + k4[0]),
        p[1] + h / 6.0 * (k1[1] + 2.0 * k2[1] + 2.0 * k3[1] + k4[1]),
    ])
}

/// Integrate one direction from `start`, claiming mask cells in `claimed`.
fn integrate_half(
    field: &PlaneField,
    mask: &mut Mask,
    start: [f64; 2],
    sign: f64,
    h: f64,
    max_len: f64,
    claimed: &mut Vec<usize>,
) -> Vec<[f64; 2]> {
    let mut pts = Vec::new();
    let mut p = start;
    let mut cell = mask.cell(p[0], p[1]);
    let mut len = 0.0;

    while len < max_len {
        let Some(q) = rk4_step_2d(field, p, h, sign) else {
            break;
        };
        if field.sample_in_plane(q[0], q[1]).is_none() {
            break;
        }
        let next = mask.cell(q[0], q[1]);
        if next != cell {
            let id = mask.idx(next);
            if mask.occupied[id] {
                break;
            }
            mask.occupied[id] = true;
            claimed.push(id);
            cell = next;
        }
        len += h;
        pts.push(q);
        p = q;
    }
    pts
}

/// Occupancy mask side for a density: round(30·density), clamped to
/// [1, MAX_MASK_CELLS]. Non-finite densities fall back to 1.
fn mask_cells(density: f64) -> usize {
    let d = if density.is_finite() { density } else { 1.0 };
    (30.0 * d).round().clamp(1.0, MAX_MASK_CELLS as f64) as usize
}

/// Density-controlled streamlines over the whole plane.
pub fn streamplot(field: &PlaneField, opts: &StreamplotOptions) -> Vec<StreamLine2D> {
    let (u0, u1, v0, v1) = field.grid.extent();
    let width = (u1 - u0).max(v1 - v0);
    if !(width > 0.0) {
        return Vec::new();
    }

    let n = mask_cells(opts.density);
    let mut mask = Mask {
        n,
        occupied: vec![false; n * n],
        u0,
        v0,
        du: (u1 - u0) / n as f64,
        dv: (v1 - v0) / n as f64,
    };

    let h = opts.step_fraction * mask.du.min(mask.dv);
    let max_len = opts.max_length * width;
    let min_len = opts.min_length * width;

    let mut lines = Vec::new();
    for seed_cell in mask.seed_order() {
        let seed_id = mask.idx(seed_cell);
        if mask.occupied[seed_id] {
            continue;
        }
        mask.occupied[seed_id] = true;
        let mut claimed = vec![seed_id];
        let start = mask.centre(seed_cell);

        let backward = integrate_half(field, &mut mask, start, -1.0, h, max_len, &mut claimed);
        let forward = integrate_half(field, &mut mask, start, 1.0, h, max_len, &mut claimed);

        let mut points: Vec<[f64; 2]> = backward.into_iter().rev().collect();
        points.push(start);
        points.extend(forward);

        let line = StreamLine2D { points };
        if line.points.len() >= 2 && line.length() >= min_len {
            lines.push(line);
        } else {
            for id in claimed {
                mask.occupied[id] = false;
            }
        }
    }
    lines
}

// ---------------------------------------------------------------------------
// 3D stream tracer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum IntegrationDirection {
    Forward,
    Backward,
    Both,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct TracerOptions {
    /// Arc length per RK4 step (mm).
    pub max_step_length: f64,
    /// Maximum arc length per direction (mm).
    pub max_length: f64,
    pub direction: IntegrationDirection,
}

impl Default for TracerOptions {
    fn default() -> Self {
        Self {
            max_step_length: 1.0,
            max_length: 200.0,
            direction: IntegrationDirection::Both,
        }
    }
}

/// A traced field line; `magnitude[i]` is |B| (T) at `points[i]`.
#[derive(Debug, Clone)]
pub struct StreamLine3D {
    pub points: Vec<[f64; 3]>,
    pub magnitude: Vec<f64>,
}

fn direction_3d(field: &VolumeField, p: [f64; 3], sign: f64) -> Option<[f64; 3]> {
    let b = field.sample(p)?;
    let m = norm(b);
    if !(m > FIELD_NULL) {
        return None;
    }
    Some(scale(b, sign / m))
}

fn rk4_step_3d(field: &VolumeField, p: [f64; 3], h: f64, sign: f64) -> Option<[f64; 3]> {
    let k1 = direction_3d(field, p, sign)?;
    let k2 = direction_3d(field, add(p, scale(k1, 0.5 * h)), sign)?;
    let k3 = direction_3d(field, add(p, scale(k2, 0.5 * h)), sign)?;
    let k4 = direction_3d(field, add(p, scale(k3, h)), sign)?;
    let sum = add(add(k1, scale(k2, 2.0)), add(scale(k3, 2.0), k4));
    Some(add(p, scale(sum, h / 6.0)))
}

fn trace_half(field: &VolumeField, seed: [f64; 3], sign: f64, opts: &TracerOptions) -> Vec<[f64; 3]> {
    let h = opts.max_step_length;
    let n_steps = if h > 0.0 {
        (opts.max_length / h).ceil() as usize
    } else {
        0
    };
    let mut pts = Vec::with_capacity(n_steps);
    let mut p = seed;
    for _ in 0..n_steps {
        match rk4_step_3d(field, p, h, sign) {
            Some(q) if field.grid.contains(q) => {
                pts.push(q);
                p = q;
            }
            _ => break,
        }
    }
    pts
}

/// Trace one line per seed. Seeds outside the grid yield no line.
pub fn trace_from_seeds(
    field: &VolumeField,
    seeds: &[[f64; 3]],
    opts: &TracerOptions,
) -> Vec<StreamLine3D> {
    let mut lines = Vec::with_capacity(seeds.len());
    for &seed in seeds {
        let Some(b_seed) = field.sample(seed) else {
            continue;
        };

        let backward = match opts.direction {
            IntegrationDirection::Backward | IntegrationDirection::Both => {
                trace_half(field, seed, -1.0, opts)
            }
            IntegrationDirection::Forward => Vec::new(),
        };
        let forward = match opts.direction {
            IntegrationDirection::Forward | IntegrationDirection::Both => {
                trace_half(field, seed, 1.0, opts)
            }
            IntegrationDirection::Backward => Vec::new(),
        };

        let mut points: Vec<[f64; 3]> = backward.into_iter().rev().collect();
        points.push(seed);
        points.extend(forward);
        if points.len() < 2 {
            continue;
        }

        let magnitude = points
            .iter()
            .map(|&p| field.sample(p).map(norm).unwrap_or_else(|| norm(b_seed)))
            .collect();
        lines.push(StreamLine3D { points, magnitude });
    }
    lines
}

/// Seed points just outside both pole faces: rings of radius `radii`, each
/// with `n_angles` points (angle 2π excluded), at z = ±(H/2 + offset).
pub fn pole_seeds(
    magnet: &CylinderMagnet,
    radii: &[f64],
    n_angles: usize,
    offset: f64,
) -> Vec<[f64; 3]> {
    let z_top = magnet.half_height() + offset;
    let mut seeds = Vec::with_capacity(radii.len() * n_angles * 2);
    for &r in radii {
        for a in 0..n_angles {
            let theta = 2.0 * std::f64::consts::PI * a as f64 / n_angles as f64;
            let (x, y) = (r * theta.cos(), r * theta.sin());
            seeds.push([x, y, z_top]);
            seeds.push([x, y, -z_top]);
        }
    }
    seeds
}
