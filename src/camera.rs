// src/camera.rs
//
// Viewpoint for 3D renders. A camera is either placed explicitly (position +
// focal point) or given as elevation/azimuth angles in degrees, and projects
// orthographically onto a screen plane whose vertical is physical +z. The
// same basis provides the depth used for painter's ordering, so occlusion
// and projection always agree.

use serde::Serialize;

use crate::vec3::{any_perpendicular, cross, dot, norm, normalize, sub};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Camera {
    /// Elevation above the x–y plane (degrees).
    pub elev_deg: f64,
    /// Azimuth from +x towards +y (degrees).
    pub azim_deg: f64,
    /// Zoom passed to the projection.
    pub scale: f64,
}

impl Camera {
    pub fn elev_azim(elev_deg: f64, azim_deg: f64) -> Self {
        Self {
            elev_deg,
            azim_deg,
            scale: 1.0,
        }
    }

    pub fn look_at(position: [f64; 3], focal_point: [f64; 3]) -> Self {
        let d = sub(position, focal_point);
        let horiz = (d[0] * d[0] + d[1] * d[1]).sqrt();
        Self::elev_azim(d[2].atan2(horiz).to_degrees(), d[1].atan2(d[0]).to_degrees())
    }

    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    /// Same elevation, azimuth advanced by `deg`.
    pub fn orbit(&self, deg: f64) -> Self {
        Self {
            azim_deg: self.azim_deg + deg,
            ..*self
        }
    }

    /// Unit vector from the focal point towards the eye.
    pub fn view_dir(&self) -> [f64; 3] {
        let el = self.elev_deg.to_radians();
        let az = self.azim_deg.to_radians();
        normalize([el.cos() * az.cos(), el.cos() * az.sin(), el.sin()])
    }

    /// Distance of `p` towards the eye; larger is nearer.
    #[inline]
    pub fn depth(&self, p: [f64; 3]) -> f64 {
        dot(p, self.view_dir())
    }

    /// Screen basis (right, up) for this view.
    pub fn screen_basis(&self) -> ([f64; 3], [f64; 3]) {
        let d = self.view_dir();
        let r = cross([0.0, 0.0, 1.0], d);
        // Looking straight down (or up) the z axis.
        let right = if norm(r) < 1e-12 {
            any_perpendicular(d)
        } else {
            normalize(r)
        };
        let up = cross(d, right);
        (right, up)
    }

    /// Orthographic screen coordinates of `p` (same units as p), scaled.
    pub fn project(&self, p: [f64; 3]) -> (f64, f64) {
        let (right, up) = self.screen_basis();
        (self.scale * dot(p, right), self.scale * dot(p, up))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn look_at_recovers_angles() {
        let c = Camera::look_at([120.0, 120.0, 80.0], [0.0, 0.0, 0.0]);
        assert!((c.azim_deg - 45.0).abs() < 1e-12);
        let expected = (80.0f64).atan2((2.0f64 * 120.0 * 120.0).sqrt()).to_degrees();
        assert!((c.elev_deg - expected).abs() < 1e-12);
        let d = c.view_dir();
        let n = (120.0f64 * 120.0 * 2.0 + 80.0 * 80.0).sqrt();
        assert!((d[0] - 120.0 / n).abs() < 1e-12);
        assert!((d[2] - 80.0 / n).abs() < 1e-12);
    }

    #[test]
    fn nearer_points_have_larger_depth() {
        let c = Camera::elev_azim(0.0, 45.0);
        assert!(c.depth([10.0, 10.0, 0.0]) > c.depth([-10.0, -10.0, 0.0]));
    }

    #[test]
    fn side_view_projects_z_up() {
        // Looking from +x: +y is to the right, +z is up.
        let c = Camera::elev_azim(0.0, 0.0).with_scale(1.0);
        let (sx, sy) = c.project([0.0, 2.0, 3.0]);
        assert!((sx - 2.0).abs() < 1e-12);
        assert!((sy - 3.0).abs() < 1e-12);
        let (sx, sy) = c.project([5.0, 0.0, 0.0]);
        assert!(sx.abs() < 1e-12 && sy.abs() < 1e-12);
    }

    #[test]
    fn top_view_has_valid_basis() {
        let c = Camera::elev_azim(90.0, 0.0);
        let (r, u) = c.screen_basis();
        assert!((norm(r) - 1.0).abs() < 1e-12);
        assert!((norm(u) - 1.0).abs() < 1e-12);
        assert!(dot(r, u).abs() < 1e-12);
    }

    #[test]
    fn orbit_keeps_elevation() {
        let c = Camera::elev_azim(20.0, 10.0).orbit(90.0);
        assert_eq!(c.elev_deg, 20.0);
        assert_eq!(c.azim_deg, 100.0);
    }
}
