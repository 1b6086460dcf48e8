// src/ovf.rs
//
// OOMMF OVF 2.0 writer for sampled B fields on an `ImageGrid`.
// Rectangular mesh, node-centred: xbase/ybase/zbase are the grid origin and
// the file's extent is padded by half a step on each side. Text data, x
// fastest, then y, then z (same as `ImageGrid::points`).

use std::fs::{File, create_dir_all};
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::{MagnetSimError, Result};
use crate::vector_field::VolumeField;

#[derive(Clone, Debug, Default)]
pub struct OvfMeta {
    pub title: String,
    pub desc_lines: Vec<String>,
    pub valuelabels: [String; 3],
    pub valueunits: [String; 3],
}

impl OvfMeta {
    pub fn flux_density() -> Self {
        Self {
            title: "B".to_string(),
            desc_lines: vec![],
            valuelabels: ["B_x".into(), "B_y".into(), "B_z".into()],
            valueunits: ["T".into(), "T".into(), "T".into()],
        }
    }

    pub fn push_desc_line<S: Into<String>>(&mut self, s: S) {
        self.desc_lines.push(s.into());
    }
}

fn ensure_parent_dir(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }
    Ok(())
}

pub fn write_ovf2_text(path: &Path, field: &VolumeField, meta: &OvfMeta) -> Result<()> {
    let grid = &field.grid;
    let [nx, ny, nz] = grid.dims;
    if field.data.len() != grid.n_points() {
        return Err(MagnetSimError::ShapeMismatch {
            expected: grid.n_points(),
            got: field.data.len(),
        });
    }

    ensure_parent_dir(path)?;
    let mut w = BufWriter::new(File::create(path)?);

    let [dx, dy, dz] = grid.spacing;
    let (lo, hi) = grid.bounds();

    writeln!(w, "# OOMMF OVF 2.0")?;
    writeln!(w, "# Segment count: 1")?;
    writeln!(w, "# Begin: Segment")?;
    writeln!(w, "# Begin: Header")?;
    writeln!(w, "# Title: {}", meta.title)?;
    writeln!(w, "# meshtype: rectangular")?;
    writeln!(w, "# meshunit: mm")?;

    writeln!(w, "# xmin: {:.16e}", lo[0] - 0.5 * dx)?;
    writeln!(w, "# ymin: {:.16e}", lo[1] - 0.5 * dy)?;
    writeln!(w, "# zmin: {:.16e}", lo[2] - 0.5 * dz)?;
    writeln!(w, "# xmax: {:.16e}", hi[0] + 0.5 * dx)?;
    writeln!(w, "# ymax: {:.16e}", hi[1] + 0.5 * dy)?;
    writeln!(w, "# zmax: {:.16e}", hi[2] + 0.5 * dz)?;

    writeln!(w, "# valuedim: 3")?;
    writeln!(
        w,
        "# valuelabels: {} {} {}",
        meta.valuelabels[0], meta.valuelabels[1], meta.valuelabels[2]
    )?;
    writeln!(
        w,
        "# valueunits: {} {} {}",
        meta.valueunits[0], meta.valueunits[1], meta.valueunits[2]
    )?;

    for d in &meta.desc_lines {
        writeln!(w, "# Desc: {}", d)?;
    }

    writeln!(w, "# xbase: {:.16e}", lo[0])?;
    writeln!(w, "# ybase: {:.16e}", lo[1])?;
    writeln!(w, "# zbase: {:.16e}", lo[2])?;
    writeln!(w, "# xnodes: {}", nx)?;
    writeln!(w, "# ynodes: {}", ny)?;
    writeln!(w, "# znodes: {}", nz)?;
    writeln!(w, "# xstepsize: {:.16e}", dx)?;
    writeln!(w, "# ystepsize: {:.16e}", dy)?;
    writeln!(w, "# zstepsize: {:.16e}", dz)?;

    writeln!(w, "# End: Header")?;
    writeln!(w, "# Begin: Data Text")?;

    for v in &field.data {
        writeln!(w, "{:.10e} {:.10e} {:.10e}", v[0], v[1], v[2])?;
    }

    writeln!(w, "# End: Data Text")?;
    writeln!(w, "# End: Segment")?;
    w.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::ImageGrid;
    use crate::magnet::CylinderMagnet;
    use std::fs;

    #[test]
    fn writes_header_and_one_line_per_node() {
        let m = CylinderMagnet::new(30.0, 35.0, 1.115).unwrap();
        let field = VolumeField::compute(ImageGrid::new([3, 2, 2], [10.0; 3], [-10.0; 3]), &m).unwrap();
        let dir = std::env::temp_dir().join(format!("magnet_sim_ovf_{}", std::process::id()));
        let path = dir.join("field_B.ovf");
        let mut meta = OvfMeta::flux_density();
        meta.push_desc_line("test");
        write_ovf2_text(&path, &field, &meta).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("# OOMMF OVF 2.0\n"));
        assert!(text.contains("# xnodes: 3\n"));
        assert!(text.contains("# meshunit: mm\n"));
        assert!(text.contains("# Desc: test\n"));
        let data_lines = text.lines().filter(|l| !l.starts_with('#')).count();
        assert_eq!(data_lines, 12);
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn rejects_inconsistent_field() {
        let grid = ImageGrid::cube(2, 1.0, 0.0);
        let field = VolumeField {
            grid,
            data: vec![[0.0; 3]; 3],
        };
        let path = std::env::temp_dir().join("magnet_sim_never_written.ovf");
        assert!(matches!(
            write_ovf2_text(&path, &field, &OvfMeta::flux_density()),
            Err(MagnetSimError::ShapeMismatch { expected: 8, got: 3 })
        ));
    }
}
