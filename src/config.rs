// src/config.rs
//
// Run provenance written next to the figures as `config.json`.

use serde::Serialize;
use std::fs::File;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::magnet::CylinderMagnet;
use crate::params::{Material, MaterialGrade};
use crate::scene::SceneConfig;

#[derive(Serialize)]
pub struct RunConfig<'a> {
    pub grade: &'a MaterialGrade,
    pub material: MaterialConfig,
    pub magnet: &'a CylinderMagnet,
    pub scene: &'a SceneConfig,
    pub run: RunInfo,
}

/// Derived constants, SI.
#[derive(Serialize)]
pub struct MaterialConfig {
    pub br_t: f64,
    pub hcb_a_per_m: f64,
    pub hcj_a_per_m: f64,
    pub bh_max_j_per_m3: f64,
    pub magnetization_a_per_m: f64,
}

impl From<&Material> for MaterialConfig {
    fn from(m: &Material) -> Self {
        Self {
            br_t: m.br,
            hcb_a_per_m: m.hcb,
            hcj_a_per_m: m.hcj,
            bh_max_j_per_m3: m.bh_max,
            magnetization_a_per_m: m.magnetization(),
        }
    }
}

#[derive(Serialize)]
pub struct RunInfo {
    pub binary: String,
    pub run_id: String,
    pub timestamp_unix_s: Option<u64>,
}

impl RunInfo {
    pub fn new(binary: &str, run_id: &str) -> Self {
        let timestamp_unix_s = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .ok()
            .map(|d| d.as_secs());
        Self {
            binary: binary.to_string(),
            run_id: run_id.to_string(),
            timestamp_unix_s,
        }
    }
}

impl RunConfig<'_> {
    pub fn write_to_dir(&self, out_dir: &Path) -> crate::error::Result<()> {
        let path = out_dir.join("config.json");
        let file = File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }
}
