// src/report.rs
//
// Console report: derived material constants, magnet geometry and on-axis
// field values. The format is fixed so runs can be diffed.

use std::io::{self, Write};

use crate::magnet::CylinderMagnet;
use crate::params::{Material, TESLA_TO_GAUSS};

const RULE: &str = "==================================================";

/// Scientific notation with a signed, at least two-digit exponent
/// (`8.87e+05`), matching C/printf-style `%.Ne`.
pub fn format_sci(value: f64, precision: usize) -> String {
    let s = format!("{value:.precision$e}");
    match s.split_once('e') {
        Some((mantissa, exp)) => {
            let (sign, digits) = match exp.strip_prefix('-') {
                Some(d) => ('-', d),
                None => ('+', exp),
            };
            format!("{mantissa}e{sign}{digits:0>2}")
        }
        // inf / NaN
        None => s,
    }
}

/// Bz on the axis at one of the report heights.
#[derive(Debug, Clone, Copy)]
pub struct KeyPoint {
    pub z: f64,
    pub bz: f64, // T
}

/// Centre, top surface, one and two heights above the centre.
pub fn key_points(magnet: &CylinderMagnet) -> Vec<KeyPoint> {
    let h = magnet.height;
    [0.0, h / 2.0, h, 2.0 * h]
        .iter()
        .map(|&z| KeyPoint {
            z,
            bz: magnet.b_field([0.0, 0.0, z])[2],
        })
        .collect()
}

pub fn write_material<W: Write>(w: &mut W, mat: &Material) -> io::Result<()> {
    writeln!(w, "{RULE}")?;
    writeln!(w, "{} {} Magnet Parameters", mat.grade, mat.composition)?;
    writeln!(w, "{RULE}")?;
    writeln!(w, "Remanence Br = {:.3} T", mat.br)?;
    writeln!(w, "Coercivity Hcb = {:.1} kA/m", mat.hcb / 1e3)?;
    writeln!(w, "Intrinsic Coercivity Hcj ≥ {:.0} kA/m", mat.hcj / 1e3)?;
    writeln!(w, "(BH)max = {:.1} kJ/m³", mat.bh_max / 1e3)?;
    writeln!(w, "Magnetization M = {} A/m", format_sci(mat.magnetization(), 2))?;
    writeln!(w, "{RULE}")?;
    Ok(())
}

pub fn write_magnet<W: Write>(w: &mut W, magnet: &CylinderMagnet) -> io::Result<()> {
    writeln!(w)?;
    writeln!(
        w,
        "Cylinder Magnet: D = {} mm, H = {} mm",
        magnet.diameter, magnet.height
    )?;
    writeln!(w, "Volume = {:.1} mm³", magnet.volume())?;
    Ok(())
}

pub fn write_key_points<W: Write>(w: &mut W, points: &[KeyPoint]) -> io::Result<()> {
    writeln!(w)?;
    writeln!(w, "{RULE}")?;
    writeln!(w, "Magnetic Field at Key Points")?;
    writeln!(w, "{RULE}")?;
    for p in points {
        writeln!(
            w,
            "z = {:5.1} mm: Bz = {:8.2} G ({:.4} T)",
            p.z,
            p.bz * TESLA_TO_GAUSS,
            p.bz
        )?;
    }
    writeln!(w, "{RULE}")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::MaterialGrade;

    #[test]
    fn sci_matches_printf_style() {
        assert_eq!(format_sci(887_289.0, 2), "8.87e+05");
        assert_eq!(format_sci(1.5e-7, 1), "1.5e-07");
        assert_eq!(format_sci(0.0, 2), "0.00e+00");
        assert_eq!(format_sci(-3.2e120, 1), "-3.2e+120");
    }

    #[test]
    fn material_block_is_fixed_format() {
        let mat = MaterialGrade::yxg32().derive();
        let mut buf = Vec::new();
        write_material(&mut buf, &mat).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[1], "YXG-32 Sm₂Co₁₇ Magnet Parameters");
        assert_eq!(lines[3], "Remanence Br = 1.115 T");
        assert_eq!(lines[4], "Coercivity Hcb = 836.0 kA/m");
        assert_eq!(lines[5], "Intrinsic Coercivity Hcj ≥ 1433 kA/m");
        assert_eq!(lines[6], "(BH)max = 242.5 kJ/m³");
        assert_eq!(lines[7], "Magnetization M = 8.87e+05 A/m");
    }

    #[test]
    fn magnet_block_prints_integers_plainly() {
        let m = CylinderMagnet::new(30.0, 35.0, 1.115).unwrap();
        let mut buf = Vec::new();
        write_magnet(&mut buf, &m).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("Cylinder Magnet: D = 30 mm, H = 35 mm"));
        assert!(text.contains("Volume = 24740.0 mm³"));
    }

    #[test]
    fn key_point_lines() {
        let m = CylinderMagnet::new(30.0, 35.0, 1.115).unwrap();
        let pts = key_points(&m);
        assert_eq!(pts.iter().map(|p| p.z).collect::<Vec<_>>(), vec![0.0, 17.5, 35.0, 70.0]);
        let mut buf = Vec::new();
        write_key_points(&mut buf, &pts).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("z =   0.0 mm: Bz =  8465.71 G (0.8466 T)"), "{text}");
        // Field decays monotonically along the axis outside the magnet.
        assert!(pts[1].bz > pts[2].bz && pts[2].bz > pts[3].bz && pts[3].bz > 0.0);
    }
}
