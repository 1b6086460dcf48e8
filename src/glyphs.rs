// src/glyphs.rs
//
// Vector glyphs: 3D arrows scaled by |B| for volume views, and normalised
// in-plane direction arrows (quiver) for slice views.

use serde::Serialize;

use crate::magnet::CylinderMagnet;
use crate::vec3::{add, any_perpendicular, norm, scale, sub};
use crate::vector_field::PlaneField;

#[derive(Debug, Clone, Copy, Serialize)]
pub struct ArrowStyle {
    /// Arrow length per tesla (mm/T).
    pub factor: f64,
    /// Head length as a fraction of the arrow length.
    pub tip_length: f64,
    /// Head half-width as a fraction of the arrow length.
    pub tip_radius: f64,
}

impl Default for ArrowStyle {
    fn default() -> Self {
        Self {
            factor: 50.0,
            tip_length: 0.3,
            tip_radius: 0.15,
        }
    }
}

/// One arrow: shaft base -> tip, plus two head barbs ending at `barbs`.
#[derive(Debug, Clone, Copy)]
pub struct ArrowGlyph {
    pub base: [f64; 3],
    pub tip: [f64; 3],
    pub barbs: [[f64; 3]; 2],
    /// |B| (T) at `base`.
    pub magnitude: f64,
}

impl ArrowGlyph {
    pub fn new(base: [f64; 3], b: [f64; 3], style: &ArrowStyle) -> Self {
        let magnitude = norm(b);
        let len = magnitude * style.factor;
        let dir = if magnitude > 0.0 {
            scale(b, 1.0 / magnitude)
        } else {
            [0.0, 0.0, 1.0]
        };
        let tip = add(base, scale(dir, len));
        let neck = sub(tip, scale(dir, style.tip_length * len));
        let side = scale(any_perpendicular(dir), style.tip_radius * len);
        Self {
            base,
            tip,
            barbs: [add(neck, side), sub(neck, side)],
            magnitude,
        }
    }

    pub fn length(&self) -> f64 {
        norm(sub(self.tip, self.base))
    }
}

/// Arrows at every grid point outside the magnet.
pub fn arrow_glyphs(
    points: &[[f64; 3]],
    magnet: &CylinderMagnet,
    style: &ArrowStyle,
) -> Vec<ArrowGlyph> {
    let outside: Vec<[f64; 3]> = points
        .iter()
        .copied()
        .filter(|&p| !magnet.contains(p))
        .collect();
    let b = magnet.b_field_many(&outside);
    outside
        .iter()
        .zip(b)
        .map(|(&p, b)| ArrowGlyph::new(p, b, style))
        .collect()
}

/// Unit in-plane direction at a plane node, with |B| (T) for colouring.
#[derive(Debug, Clone, Copy)]
pub struct Quiver {
    pub at: [f64; 2],
    pub dir: [f64; 2],
    pub magnitude: f64,
}

/// Every `stride`-th node in both directions; nodes with a vanishing in-plane
/// component are skipped.
pub fn quiver_2d(field: &PlaneField, stride: usize) -> Vec<Quiver> {
    let stride = stride.max(1);
    let mut out = Vec::new();
    for k in (0..field.grid.nv()).step_by(stride) {
        for i in (0..field.grid.nu()).step_by(stride) {
            let b2 = field.in_plane(i, k);
            let m2 = (b2[0] * b2[0] + b2[1] * b2[1]).sqrt();
            if !(m2 > 0.0) {
                continue;
            }
            out.push(Quiver {
                at: [field.grid.u[i], field.grid.v[k]],
                dir: [b2[0] / m2, b2[1] / m2],
                magnitude: norm(field.at(i, k)),
            });
        }
    }
    out
}
