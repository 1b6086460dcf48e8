// src/scene.rs
//
// Scene presets. Every scene runs the same compute-then-render pipeline; the
// presets only differ in sampling resolution, camera framing and which
// layers are drawn.

use serde::Serialize;

use crate::camera::Camera;
use crate::glyphs::ArrowStyle;
use crate::grid::ImageGrid;
use crate::streamlines::{StreamplotOptions, TracerOptions};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SceneKind {
    /// 3D magnet overview + |B| map of the x–z plane.
    XzPlane,
    /// 3D field lines and arrow glyphs around the magnet.
    Volume,
    /// |B| maps with direction arrows on an x–z and an x–y slice.
    Slices,
}

impl SceneKind {
    pub fn from_arg(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "xz" | "2d" | "plane" => Some(Self::XzPlane),
            "volume" | "3d" => Some(Self::Volume),
            "slices" | "slice" => Some(Self::Slices),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::XzPlane => "xz",
            Self::Volume => "volume",
            Self::Slices => "slices",
        }
    }
}

/// Which visual layers are drawn.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct Layers {
    pub magnet_3d: bool,
    pub magnetization_arrow: bool,
    pub heatmap: bool,
    pub streamlines: bool,
    pub contours: bool,
    pub outline: bool,
    pub streamlines_3d: bool,
    pub arrows_3d: bool,
    pub quiver: bool,
}

/// Square in-plane sampling: n×n over [lo, hi]² (mm).
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PlaneSampling {
    pub lo: f64,
    pub hi: f64,
    pub n: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SceneConfig {
    pub kind: SceneKind,
    /// Output file stem.
    pub figure: String,
    /// Image size (px).
    pub size: (u32, u32),
    pub diameter: f64,
    pub height: f64,
    pub plane: PlaneSampling,
    /// Height of the x–y slice above the top face (mm).
    pub slice_xy_offset: f64,
    pub volume: ImageGrid,
    pub arrow_grid: ImageGrid,
    pub streamplot: StreamplotOptions,
    pub tracer: TracerOptions,
    /// Seed ring radii as fractions of the magnet radius.
    pub seed_radius_fractions: Vec<f64>,
    pub seed_angles: usize,
    pub seed_offset: f64,
    /// Iso-|B| levels (G).
    pub contour_levels: Vec<f64>,
    pub arrows: ArrowStyle,
    pub quiver_stride: usize,
    pub camera: Camera,
    pub layers: Layers,
}

impl SceneConfig {
    pub fn for_kind(kind: SceneKind) -> Self {
        match kind {
            SceneKind::XzPlane => Self::xz_plane(),
            SceneKind::Volume => Self::volume(),
            SceneKind::Slices => Self::slices(),
        }
    }

    fn base(kind: SceneKind) -> Self {
        Self {
            kind,
            figure: format!("magnet_{}", kind.as_str()),
            size: (1800, 1000),
            diameter: 30.0,
            height: 35.0,
            plane: PlaneSampling {
                lo: -60.0,
                hi: 60.0,
                n: 300,
            },
            slice_xy_offset: 5.0,
            volume: ImageGrid::cube(51, 2.0, -50.0),
            arrow_grid: ImageGrid::cube(9, 10.0, -40.0),
            streamplot: StreamplotOptions {
                density: 1.5,
                ..Default::default()
            },
            tracer: TracerOptions::default(),
            seed_radius_fractions: vec![3.0 / 15.0, 8.0 / 15.0, 13.0 / 15.0],
            seed_angles: 8,
            seed_offset: 1.0,
            contour_levels: vec![500.0, 1000.0, 2000.0],
            arrows: ArrowStyle::default(),
            quiver_stride: 8,
            camera: Camera::elev_azim(0.0, 45.0),
            layers: Layers::default(),
        }
    }

    /// Magnet overview (side view along the (110) direction) next to the
    /// x–z plane field map with streamlines and iso-|B| contours.
    pub fn xz_plane() -> Self {
        Self {
            layers: Layers {
                magnet_3d: true,
                magnetization_arrow: true,
                heatmap: true,
                streamlines: true,
                contours: true,
                outline: true,
                ..Default::default()
            },
            ..Self::base(SceneKind::XzPlane)
        }
    }

    /// Field lines from both poles and |B|-scaled arrows, seen from
    /// (120, 120, 80) mm.
    pub fn volume() -> Self {
        Self {
            size: (1400, 1000),
            camera: Camera::look_at([120.0, 120.0, 80.0], [0.0, 0.0, 0.0]),
            layers: Layers {
                magnet_3d: true,
                streamlines_3d: true,
                arrows_3d: true,
                ..Default::default()
            },
            ..Self::base(SceneKind::Volume)
        }
    }

    /// Two slices at lower resolution with direction arrows.
    pub fn slices() -> Self {
        Self {
            plane: PlaneSampling {
                lo: -60.0,
                hi: 60.0,
                n: 121,
            },
            layers: Layers {
                heatmap: true,
                outline: true,
                quiver: true,
                ..Default::default()
            },
            ..Self::base(SceneKind::Slices)
        }
    }
}
