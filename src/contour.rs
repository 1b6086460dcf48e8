// src/contour.rs
//
// Iso-lines of a scalar field on a rectilinear (u, v) lattice by marching
// squares. Values are in grid order (idx = k * nu + i). Saddle cells are
// disambiguated with the cell-centre average.

use crate::vector_field::PlaneField;

pub type Segment = ([f64; 2], [f64; 2]);

/// All segments for one iso-level.
#[derive(Debug, Clone)]
pub struct ContourLine {
    pub level: f64,
    pub segments: Vec<Segment>,
}

impl ContourLine {
    /// Where to put the level label: midpoint of the right-most segment.
    pub fn label_anchor(&self) -> Option<[f64; 2]> {
        self.segments
            .iter()
            .map(|(a, b)| [0.5 * (a[0] + b[0]), 0.5 * (a[1] + b[1])])
            .max_by(|p, q| p[0].total_cmp(&q[0]))
    }
}

#[inline]
fn crossing(p0: [f64; 2], f0: f64, p1: [f64; 2], f1: f64, level: f64) -> [f64; 2] {
    let den = f1 - f0;
    let t = if den.abs() < f64::MIN_POSITIVE {
        0.5
    } else {
        ((level - f0) / den).clamp(0.0, 1.0)
    };
    [p0[0] + t * (p1[0] - p0[0]), p0[1] + t * (p1[1] - p0[1])]
}

/// Marching squares for a single level.
pub fn marching_squares(u: &[f64], v: &[f64], values: &[f64], level: f64) -> Vec<Segment> {
    let nu = u.len();
    let nv = v.len();
    let mut segs = Vec::new();
    if nu < 2 || nv < 2 || values.len() != nu * nv {
        return segs;
    }

    for k in 0..nv - 1 {
        for i in 0..nu - 1 {
            // Corners counter-clockwise from lower-left.
            let p = [[u[i], v[k]], [u[i + 1], v[k]], [u[i + 1], v[k + 1]], [u[i], v[k + 1]]];
            let f = [
                values[k * nu + i],
                values[k * nu + i + 1],
                values[(k + 1) * nu + i + 1],
                values[(k + 1) * nu + i],
            ];
            if f.iter().any(|x| !x.is_finite()) {
                continue;
            }

            let mut case = 0u8;
            for (bit, &fv) in f.iter().enumerate() {
                if fv > level {
                    case |= 1 << bit;
                }
            }
            if case == 0 || case == 15 {
                continue;
            }

            // Edge e joins corner e and corner (e+1)%4.
            let edge = |e: usize| crossing(p[e], f[e], p[(e + 1) % 4], f[(e + 1) % 4], level);
            let centre_above = 0.25 * (f[0] + f[1] + f[2] + f[3]) > level;

            let pairs: &[(usize, usize)] = match case {
                1 | 14 => &[(3, 0)],
                2 | 13 => &[(0, 1)],
                3 | 12 => &[(3, 1)],
                4 | 11 => &[(1, 2)],
                6 | 9 => &[(0, 2)],
                7 | 8 => &[(2, 3)],
                5 => {
                    if centre_above {
                        &[(0, 1), (2, 3)]
                    } else {
                        &[(3, 0), (1, 2)]
                    }
                }
                10 => {
                    if centre_above {
                        &[(3, 0), (1, 2)]
                    } else {
                        &[(0, 1), (2, 3)]
                    }
                }
                _ => &[],
            };
            for &(a, b) in pairs {
                segs.push((edge(a), edge(b)));
            }
        }
    }
    segs
}

/// Iso-|B| lines (levels in gauss) over a plane field.
pub fn field_contours(field: &PlaneField, levels_gauss: &[f64]) -> Vec<ContourLine> {
    let mag = field.magnitude_gauss();
    levels_gauss
        .iter()
        .map(|&level| ContourLine {
            level,
            segments: marching_squares(&field.grid.u, &field.grid.v, &mag, level),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::linspace;

    #[test]
    fn circle_contour_lies_on_radius() {
        let ts = linspace(-2.0, 2.0, 81);
        let n = ts.len();
        let mut vals = vec![0.0; n * n];
        for k in 0..n {
            for i in 0..n {
                vals[k * n + i] = (ts[i] * ts[i] + ts[k] * ts[k]).sqrt();
            }
        }
        let segs = marching_squares(&ts, &ts, &vals, 1.0);
        assert!(segs.len() > 40);
        for (a, b) in &segs {
            for p in [a, b] {
                let r = (p[0] * p[0] + p[1] * p[1]).sqrt();
                assert!((r - 1.0).abs() < 5e-3, "r = {r}");
            }
        }
    }

    #[test]
    fn flat_field_has_no_contours() {
        let ts = linspace(0.0, 1.0, 5);
        let vals = vec![3.0; 25];
        assert!(marching_squares(&ts, &ts, &vals, 1.0).is_empty());
    }

    #[test]
    fn mismatched_values_yield_nothing() {
        let ts = linspace(0.0, 1.0, 5);
        assert!(marching_squares(&ts, &ts, &[0.0; 3], 1.0).is_empty());
    }

    #[test]
    fn label_anchor_is_rightmost() {
        let line = ContourLine {
            level: 500.0,
            segments: vec![([0.0, 0.0], [1.0, 0.0]), ([4.0, 1.0], [6.0, 1.0])],
        };
        assert_eq!(line.label_anchor(), Some([5.0, 1.0]));
    }
}
