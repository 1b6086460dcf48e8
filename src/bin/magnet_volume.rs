// src/bin/magnet_volume.rs
//
// 3D field lines around the cylinder magnet.
//
// B is sampled on a 51^3 grid (2 mm spacing, origin -50 mm); 48 field lines
// are traced from rings just outside both pole faces and coloured by |B|.
// Arrow glyphs show B on a coarse 9^3 lattice outside the magnet. Camera at
// (120, 120, 80) mm looking at the origin.
//
// Outputs:
//   out/magnet_volume/
//     - magnet_volume.png
//     - config.json
//
// Usage:
//   cargo run --release --bin magnet_volume

use env_logger::Env;
use std::path::PathBuf;

use magnet_sim::error::Result;
use magnet_sim::pipeline::{RunOptions, run_scene};
use magnet_sim::scene::SceneConfig;

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let out_dir = PathBuf::from("out").join("magnet_volume");
    let scene = SceneConfig::volume();
    run_scene(&scene, &out_dir, &RunOptions::new("magnet_volume", "magnet_volume"))?;
    Ok(())
}
