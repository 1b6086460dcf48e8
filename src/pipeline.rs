// src/pipeline.rs
//
// One scene end to end: material -> magnet -> grids -> batched field
// evaluation -> layers -> PNG -> console report -> config.json, plus the
// optional OVF dump and orbit animation.

use std::fs::create_dir_all;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::camera::Camera;
use crate::config::{MaterialConfig, RunConfig, RunInfo};
use crate::contour::{ContourLine, field_contours};
use crate::error::Result;
use crate::glyphs::{ArrowGlyph, Quiver, arrow_glyphs, quiver_2d};
use crate::grid::{Plane, PlaneGrid};
use crate::magnet::CylinderMagnet;
use crate::ovf::{OvfMeta, write_ovf2_text};
use crate::params::{Material, MaterialGrade};
use crate::report::{KeyPoint, key_points, write_key_points, write_magnet, write_material};
use crate::scene::{SceneConfig, SceneKind};
use crate::streamlines::{StreamLine2D, StreamLine3D, pole_seeds, streamplot, trace_from_seeds};
use crate::vector_field::{PlaneField, VolumeField};
use crate::visualisation::{
    MagnetPanel, MagnetStyle, PlanePanel, VolumePanel, make_movie_with_ffmpeg,
    save_overview_and_plane, save_planes, save_volume,
};

/// Extras beyond the figure itself.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub binary: String,
    pub run_id: String,
    /// Write the sampled volume field as `field_B.ovf` (volume scene).
    pub write_ovf: bool,
    /// Number of orbit frames (0 = none).
    pub orbit_frames: usize,
    pub fps: u32,
    /// Stitch orbit frames into `orbit.mp4` with ffmpeg.
    pub movie: bool,
}

impl RunOptions {
    pub fn new(binary: &str, run_id: &str) -> Self {
        Self {
            binary: binary.to_string(),
            run_id: run_id.to_string(),
            write_ovf: false,
            orbit_frames: 0,
            fps: 20,
            movie: false,
        }
    }
}

/// What a scene run produced.
#[derive(Debug, Clone)]
pub struct SceneOutput {
    pub figure: PathBuf,
    pub config: PathBuf,
    pub ovf: Option<PathBuf>,
    pub frames: Vec<PathBuf>,
    pub movie: Option<PathBuf>,
    pub key_points: Vec<KeyPoint>,
}

/// Everything needed to draw one planar field map.
struct PlaneLayers {
    field: PlaneField,
    gauss: Vec<f64>,
    streamlines: Vec<StreamLine2D>,
    contours: Vec<ContourLine>,
    quiver: Vec<Quiver>,
}

struct VolumeLayers {
    field: VolumeField,
    streamlines: Vec<StreamLine3D>,
    arrows: Vec<ArrowGlyph>,
}

enum Computed {
    Plane(PlaneLayers),
    Volume(VolumeLayers),
    Slices(Vec<PlaneLayers>),
}

fn compute_plane(scene: &SceneConfig, plane: Plane, magnet: &CylinderMagnet) -> Result<PlaneLayers> {
    let s = scene.plane;
    let grid = PlaneGrid::square(plane, s.lo, s.hi, s.n);
    info!("evaluating B on {} plane points ({:?})", grid.n_points(), plane);
    let field = PlaneField::compute(grid, magnet)?;
    let gauss = field.magnitude_gauss();

    let streamlines = if scene.layers.streamlines {
        let lines = streamplot(&field, &scene.streamplot);
        info!("streamplot: {} lines", lines.len());
        lines
    } else {
        Vec::new()
    };
    let contours = if scene.layers.contours {
        field_contours(&field, &scene.contour_levels)
    } else {
        Vec::new()
    };
    let quiver = if scene.layers.quiver {
        quiver_2d(&field, scene.quiver_stride)
    } else {
        Vec::new()
    };

    Ok(PlaneLayers {
        field,
        gauss,
        streamlines,
        contours,
        quiver,
    })
}

/// Seed ring radii (mm) for this magnet.
fn seed_radii(scene: &SceneConfig, magnet: &CylinderMagnet) -> Vec<f64> {
    scene
        .seed_radius_fractions
        .iter()
        .map(|f| f * magnet.radius())
        .collect()
}

/// Half-width of the overview axes cube: the magnet plus its magnetisation
/// arrow and 1 mm clearance, rounded up to 10 mm.
fn overview_extent(magnet: &CylinderMagnet) -> f64 {
    let arrow_top = magnet.half_height() + 2.0 + 0.25 * magnet.height;
    ((magnet.radius().max(arrow_top) + 1.0) / 10.0).ceil() * 10.0
}

fn compute_volume(scene: &SceneConfig, magnet: &CylinderMagnet) -> Result<VolumeLayers> {
    info!(
        "evaluating B on {}x{}x{} volume grid",
        scene.volume.dims[0], scene.volume.dims[1], scene.volume.dims[2]
    );
    let field = VolumeField::compute(scene.volume, magnet)?;
    let (lo, hi) = field.magnitude_range();
    info!("|B| range on volume grid: {lo:.3e} .. {hi:.3e} T");

    let streamlines = if scene.layers.streamlines_3d {
        let radii = seed_radii(scene, magnet);
        let seeds = pole_seeds(magnet, &radii, scene.seed_angles, scene.seed_offset);
        let lines = trace_from_seeds(&field, &seeds, &scene.tracer);
        info!("traced {} field lines from {} seeds", lines.len(), seeds.len());
        lines
    } else {
        Vec::new()
    };

    let arrows = if scene.layers.arrows_3d {
        let glyphs = arrow_glyphs(&scene.arrow_grid.points(), magnet, &scene.arrows);
        info!("{} arrow glyphs outside the magnet", glyphs.len());
        glyphs
    } else {
        Vec::new()
    };

    Ok(VolumeLayers {
        field,
        streamlines,
        arrows,
    })
}

fn compute(scene: &SceneConfig, magnet: &CylinderMagnet) -> Result<Computed> {
    Ok(match scene.kind {
        SceneKind::XzPlane => Computed::Plane(compute_plane(scene, Plane::Xz { y: 0.0 }, magnet)?),
        SceneKind::Volume => Computed::Volume(compute_volume(scene, magnet)?),
        SceneKind::Slices => {
            let z = magnet.half_height() + scene.slice_xy_offset;
            Computed::Slices(vec![
                compute_plane(scene, Plane::Xz { y: 0.0 }, magnet)?,
                compute_plane(scene, Plane::Xy { z }, magnet)?,
            ])
        }
    })
}

fn plane_title(plane: Plane, mat: &Material) -> String {
    match plane {
        Plane::Xz { y } => format!("B-field (x-z plane, y={y}) | {}: Br={:.2}T", mat.grade, mat.br),
        Plane::Xy { z } => format!("B-field (x-y plane, z={z}) | {}: Br={:.2}T", mat.grade, mat.br),
    }
}

fn plane_panel<'a>(
    scene: &SceneConfig,
    layers: &'a PlaneLayers,
    magnet: &'a CylinderMagnet,
    mat: &Material,
) -> PlanePanel<'a> {
    let s = scene.plane;
    let du = (s.hi - s.lo) / (s.n.max(2) - 1) as f64;
    PlanePanel {
        title: plane_title(layers.field.grid.plane, mat),
        field: &layers.field,
        magnitude_gauss: &layers.gauss,
        streamlines: &layers.streamlines,
        contours: &layers.contours,
        quiver: &layers.quiver,
        quiver_length: 0.8 * scene.quiver_stride.max(1) as f64 * du,
        magnet,
        layers: scene.layers,
    }
}

fn magnet_panel<'a>(
    scene: &SceneConfig,
    magnet: &'a CylinderMagnet,
    mat: &Material,
    camera: Camera,
) -> MagnetPanel<'a> {
    MagnetPanel {
        title: format!(
            "{} Cylinder Magnet (D={}mm, H={}mm, Br={:.2}T)",
            mat.grade, magnet.diameter, magnet.height, mat.br
        ),
        magnet,
        camera,
        extent: overview_extent(magnet),
        style: MagnetStyle::Plain,
        magnetization_arrow: scene.layers.magnetization_arrow,
    }
}

fn volume_panel<'a>(
    scene: &SceneConfig,
    layers: &'a VolumeLayers,
    magnet: &'a CylinderMagnet,
    mat: &Material,
    camera: Camera,
) -> VolumePanel<'a> {
    let (lo, hi) = scene.volume.bounds();
    let extent = lo
        .iter()
        .chain(hi.iter())
        .fold(overview_extent(magnet), |m, v| m.max(v.abs()));
    VolumePanel {
        title: format!("{} cylinder: field lines and B arrows", mat.grade),
        overlay: vec![
            format!("{} Cylinder Magnet", mat.grade),
            format!("D={}mm, H={}mm, Br={:.2}T", magnet.diameter, magnet.height, mat.br),
        ],
        colorbar_title: vec![
            "|B| (T)".to_string(),
            mat.grade.to_string(),
            format!("Br={:.2}T", mat.br),
        ],
        magnet,
        camera,
        extent,
        streamlines: &layers.streamlines,
        arrows: &layers.arrows,
    }
}

/// Draw the scene figure seen from `camera`.
fn render(
    path: &Path,
    scene: &SceneConfig,
    computed: &Computed,
    magnet: &CylinderMagnet,
    mat: &Material,
    camera: Camera,
) -> Result<()> {
    match computed {
        Computed::Plane(layers) => save_overview_and_plane(
            path,
            scene.size,
            &magnet_panel(scene, magnet, mat, camera),
            &plane_panel(scene, layers, magnet, mat),
        ),
        Computed::Volume(layers) => {
            save_volume(path, scene.size, &volume_panel(scene, layers, magnet, mat, camera))
        }
        Computed::Slices(planes) => {
            let panels: Vec<PlanePanel<'_>> = planes
                .iter()
                .map(|p| plane_panel(scene, p, magnet, mat))
                .collect();
            save_planes(path, scene.size, &panels)
        }
    }
}

/// Orbit the camera around z and save one frame per step.
fn render_orbit(
    out_dir: &Path,
    scene: &SceneConfig,
    computed: &Computed,
    magnet: &CylinderMagnet,
    mat: &Material,
    opts: &RunOptions,
) -> Result<(Vec<PathBuf>, Option<PathBuf>)> {
    if opts.orbit_frames == 0 {
        return Ok((Vec::new(), None));
    }
    if let Computed::Slices(_) = computed {
        warn!("orbit animation needs a 3D view; the slices scene has none, skipping");
        return Ok((Vec::new(), None));
    }

    let frames_dir = out_dir.join("frames");
    create_dir_all(&frames_dir)?;

    let step = 360.0 / opts.orbit_frames as f64;
    let mut frames = Vec::with_capacity(opts.orbit_frames);
    for n in 0..opts.orbit_frames {
        let path = frames_dir.join(format!("orbit_{n:04}.png"));
        render(&path, scene, computed, magnet, mat, scene.camera.orbit(step * n as f64))?;
        frames.push(path);
    }
    info!("wrote {} orbit frames to {}", frames.len(), frames_dir.display());

    if !opts.movie {
        return Ok((frames, None));
    }
    let pattern = frames_dir.join("orbit_*.png").to_string_lossy().to_string();
    let movie = out_dir.join("orbit.mp4");
    make_movie_with_ffmpeg(&pattern, &movie, opts.fps)?;
    info!("movie: {}", movie.display());
    Ok((frames, Some(movie)))
}

/// Run one scene and write its outputs under `out_dir`.
pub fn run_scene(scene: &SceneConfig, out_dir: &Path, opts: &RunOptions) -> Result<SceneOutput> {
    create_dir_all(out_dir)?;
    let stdout = io::stdout();

    // (a) material
    let grade = MaterialGrade::yxg32();
    let mat = grade.derive();
    write_material(&mut stdout.lock(), &mat)?;

    // (b) magnet
    let magnet = CylinderMagnet::new(scene.diameter, scene.height, mat.polarization())?;
    write_magnet(&mut stdout.lock(), &magnet)?;

    // (c)+(d) grids and field evaluation
    let computed = compute(scene, &magnet)?;

    // (e) figure
    let figure = out_dir.join(format!("{}.png", scene.figure));
    render(&figure, scene, &computed, &magnet, &mat, scene.camera)?;
    info!("figure: {}", figure.display());

    // (f) on-axis report
    let points = key_points(&magnet);
    {
        let mut lock = stdout.lock();
        write_key_points(&mut lock, &points)?;
        lock.flush()?;
    }

    let ovf = match (&computed, opts.write_ovf) {
        (Computed::Volume(layers), true) => {
            let path = out_dir.join("field_B.ovf");
            let mut meta = OvfMeta::flux_density();
            meta.push_desc_line(format!("{} cylinder D={} mm H={} mm", mat.grade, magnet.diameter, magnet.height));
            meta.push_desc_line(format!("Br = {:.3} T, polarization along +z", mat.br));
            write_ovf2_text(&path, &layers.field, &meta)?;
            info!("field dump: {}", path.display());
            Some(path)
        }
        (_, true) => {
            warn!("ovf output needs a volume grid; scene '{}' has none, skipping", scene.kind.as_str());
            None
        }
        (_, false) => None,
    };

    let (frames, movie) = render_orbit(out_dir, scene, &computed, &magnet, &mat, opts)?;

    let run_config = RunConfig {
        grade: &grade,
        material: MaterialConfig::from(&mat),
        magnet: &magnet,
        scene,
        run: RunInfo::new(&opts.binary, &opts.run_id),
    };
    run_config.write_to_dir(out_dir)?;

    Ok(SceneOutput {
        figure,
        config: out_dir.join("config.json"),
        ovf,
        frames,
        movie,
        key_points: points,
    })
}
