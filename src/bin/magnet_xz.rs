// src/bin/magnet_xz.rs
//
// Cylinder magnet in the x–z plane
// --------------------------------
// Left: the magnet seen side-on along (1,1,0) with its magnetisation arrow.
// Right: |B| over the y = 0 plane (300 x 300 points, [-60, 60] mm) with
// streamlines, iso-|B| contours at 500 / 1000 / 2000 G and the magnet
// outline.
//
// Outputs:
//   out/magnet_xz/
//     - magnet_xz.png
//     - config.json
//
// Usage:
//   cargo run --release --bin magnet_xz

use env_logger::Env;
use std::path::PathBuf;

use magnet_sim::error::Result;
use magnet_sim::pipeline::{RunOptions, run_scene};
use magnet_sim::scene::SceneConfig;

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let out_dir = PathBuf::from("out").join("magnet_xz");
    let scene = SceneConfig::xz_plane();
    run_scene(&scene, &out_dir, &RunOptions::new("magnet_xz", "magnet_xz"))?;
    Ok(())
}
