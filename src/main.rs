// src/main.rs
//
// Exploratory driver: runs any scene with `key=value` overrides.
//
// The fixed scenes are dedicated executables under `src/bin/*` and write to
// `out/<scene>/`. Outputs from this driver go to `runs/` (or `out=`).
//
// Examples:
//
//   cargo run --release -- xz
//       -> magnet overview + x–z |B| map with streamlines and contours.
//
//   cargo run --release -- volume dims=41 ovf orbit=72 fps=24 movie
//       -> 3D field lines on a coarser grid, OVF dump of B, and a
//          72-frame orbit animation stitched with ffmpeg.
//
//   cargo run --release -- slices n=201 d=20 h=10
//       -> x–z / x–y slices for a flatter 20 x 10 mm cylinder.
//
// Typical outputs (per run directory):
//   runs/<run_id>/
//     ├── config.json
//     ├── magnet_<scene>.png
//     ├── field_B.ovf           (if `ovf`, volume scene only)
//     ├── frames/orbit_*.png    (if `orbit=N`)
//     └── orbit.mp4             (if `movie`)

use std::env;
use std::fs::create_dir_all;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{SystemTime, UNIX_EPOCH};

use env_logger::Env;
use log::{error, info};

use magnet_sim::grid::ImageGrid;
use magnet_sim::pipeline::{RunOptions, run_scene};
use magnet_sim::scene::{SceneConfig, SceneKind};

/// Larger densities only add mask cells the plane resolution cannot fill.
const MAX_DENSITY: f64 = 10.0;

fn print_usage() {
    eprintln!(
        r#"Usage:
  cargo run -- [xz|volume|slices]
             [n=N] [dims=N] [density=VAL] [d=MM] [h=MM]
             [out=DIR] [run=RUN_ID] [ovf] [orbit=N] [fps=N] [movie]

Notes:
  - n=N sets the in-plane resolution (N x N points over [-60, 60] mm).
  - dims=N sets the volume grid to N^3 points, keeping its extent.
  - density scales the 2D streamline spacing (0 < density <= 10).
  - ovf writes field_B.ovf (volume scene only).
  - orbit=N renders N frames around z; movie stitches them with ffmpeg.
  - Set RUST_LOG=debug for more diagnostics.
"#
    );
}

fn sanitize_run_id(s: &str) -> String {
    s.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

fn default_run_id(kind: SceneKind) -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_else(|_| std::time::Duration::from_secs(0));
    format!("{}{:03}_{}", now.as_secs(), now.subsec_millis(), kind.as_str())
}

fn unique_run_dir(out_root: &str, run_id: &str) -> PathBuf {
    let base = PathBuf::from(out_root);
    let mut dir = base.join(run_id);
    if !dir.exists() {
        return dir;
    }
    for k in 1..1000 {
        let cand = base.join(format!("{}_{}", run_id, k));
        if !cand.exists() {
            dir = cand;
            break;
        }
    }
    dir
}

/// Same extent as `grid`, resampled to n points per axis.
fn resample_cube(grid: &ImageGrid, n: usize) -> ImageGrid {
    let n = n.max(2);
    let (lo, hi) = grid.bounds();
    let spacing = (hi[0] - lo[0]) / (n - 1) as f64;
    ImageGrid::cube(n, spacing, lo[0])
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let argv: Vec<String> = env::args().collect();

    let mut kind = SceneKind::XzPlane;

    // Optional overrides
    let mut n_override: Option<usize> = None;
    let mut dims_override: Option<usize> = None;
    let mut density_override: Option<f64> = None;
    let mut diameter_override: Option<f64> = None;
    let mut height_override: Option<f64> = None;

    // Output controls
    let mut out_root_override: Option<String> = None;
    let mut run_id_override: Option<String> = None;
    let mut write_ovf = false;
    let mut orbit_frames = 0usize;
    let mut fps_override: Option<u32> = None;
    let mut make_movie_flag = false;

    for arg in argv.iter().skip(1) {
        if arg == "-h" || arg == "--help" || arg == "help" {
            print_usage();
            return ExitCode::SUCCESS;
        }

        if let Some(k) = SceneKind::from_arg(arg) {
            kind = k;
            continue;
        }
        if arg == "movie" {
            make_movie_flag = true;
            continue;
        }
        if arg == "ovf" {
            write_ovf = true;
            continue;
        }

        if let Some(v) = arg.strip_prefix("n=") {
            n_override = v.parse::<usize>().ok();
            continue;
        }
        if let Some(v) = arg.strip_prefix("dims=") {
            dims_override = v.parse::<usize>().ok();
            continue;
        }
        if let Some(v) = arg.strip_prefix("density=") {
            match v.parse::<f64>() {
                Ok(d) if d.is_finite() && d > 0.0 && d <= MAX_DENSITY => density_override = Some(d),
                _ => eprintln!("Warning: density must be in (0, {MAX_DENSITY}], ignoring '{v}'"),
            }
            continue;
        }
        if let Some(v) = arg.strip_prefix("d=") {
            diameter_override = v.parse::<f64>().ok();
            continue;
        }
        if let Some(v) = arg.strip_prefix("h=") {
            height_override = v.parse::<f64>().ok();
            continue;
        }
        if let Some(v) = arg.strip_prefix("orbit=") {
            match v.parse::<usize>() {
                Ok(n) => orbit_frames = n,
                Err(_) => eprintln!("Warning: could not parse orbit value '{v}', ignoring"),
            }
            continue;
        }
        if let Some(v) = arg.strip_prefix("fps=") {
            fps_override = v.parse::<u32>().ok();
            continue;
        }

        if let Some(v) = arg.strip_prefix("out=") {
            out_root_override = Some(v.to_string());
            continue;
        }
        if let Some(v) = arg.strip_prefix("run=") {
            run_id_override = Some(v.to_string());
            continue;
        }

        eprintln!("Warning: ignoring unknown argument '{arg}'");
    }

    let mut scene = SceneConfig::for_kind(kind);

    // Apply overrides
    if let Some(n) = n_override {
        scene.plane.n = n.max(2);
    }
    if let Some(n) = dims_override {
        scene.volume = resample_cube(&scene.volume, n);
    }
    if let Some(d) = density_override {
        scene.streamplot.density = d;
    }
    if let Some(d) = diameter_override {
        scene.diameter = d;
    }
    if let Some(h) = height_override {
        scene.height = h;
    }
    if make_movie_flag && orbit_frames == 0 {
        orbit_frames = 72;
    }

    // -------- output directory setup --------
    let out_root = out_root_override.unwrap_or_else(|| "runs".to_string());
    if let Err(e) = create_dir_all(&out_root) {
        error!("cannot create {out_root}: {e}");
        return ExitCode::FAILURE;
    }
    let run_id = sanitize_run_id(&run_id_override.unwrap_or_else(|| default_run_id(kind)));
    let run_dir = unique_run_dir(&out_root, &run_id);

    let mut opts = RunOptions::new("magnet-sim", &run_id);
    opts.write_ovf = write_ovf;
    opts.orbit_frames = orbit_frames;
    opts.movie = make_movie_flag;
    if let Some(fps) = fps_override {
        opts.fps = fps.max(1);
    }

    info!(
        "scene={} run_dir={} plane_n={} volume_dims={:?} density={}",
        kind.as_str(),
        run_dir.display(),
        scene.plane.n,
        scene.volume.dims,
        scene.streamplot.density
    );

    match run_scene(&scene, &run_dir, &opts) {
        Ok(out) => {
            info!("done: {}", out.figure.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
