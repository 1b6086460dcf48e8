// src/bin/magnet_slices.rs
//
// |B| on two slices: the x–z plane through the axis and the x–y plane 5 mm
// above the north face, each with direction arrows and the magnet outline.
//
// Outputs:
//   out/magnet_slices/
//     - magnet_slices.png
//     - config.json

use env_logger::Env;
use std::path::PathBuf;

use magnet_sim::error::Result;
use magnet_sim::pipeline::{RunOptions, run_scene};
use magnet_sim::scene::SceneConfig;

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let out_dir = PathBuf::from("out").join("magnet_slices");
    run_scene(
        &SceneConfig::slices(),
        &out_dir,
        &RunOptions::new("magnet_slices", "magnet_slices"),
    )?;
    Ok(())
}
