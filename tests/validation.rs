// tests/validation.rs
//
// Integration-style validation tests (physics and arithmetic sanity checks).
// Run with: cargo test
// Or only these tests: cargo test --test validation

use approx::{assert_abs_diff_eq, assert_relative_eq};

use magnet_sim::glyphs::{ArrowStyle, arrow_glyphs};
use magnet_sim::grid::{ImageGrid, Plane, PlaneGrid, linspace};
use magnet_sim::magnet::CylinderMagnet;
use magnet_sim::ovf::{OvfMeta, write_ovf2_text};
use magnet_sim::params::{MU0, MaterialGrade};
use magnet_sim::report::{key_points, write_key_points};
use magnet_sim::pipeline::{RunOptions, run_scene};
use magnet_sim::scene::{SceneConfig, SceneKind};
use magnet_sim::streamlines::{TracerOptions, pole_seeds, streamplot, trace_from_seeds};
use magnet_sim::vector_field::{PlaneField, VolumeField};

fn yxg32_cylinder() -> CylinderMagnet {
    let mat = MaterialGrade::yxg32().derive();
    CylinderMagnet::new(30.0, 35.0, mat.polarization()).unwrap()
}

#[test]
fn datasheet_midpoints_and_magnetization() {
    let mat = MaterialGrade::yxg32().derive();
    assert_abs_diff_eq!(mat.br, 1.115, epsilon = 1e-9);
    assert_eq!(mat.hcb, 836_000.0);
    assert_eq!(mat.bh_max, 242_500.0);
    assert_eq!(mat.hcj, 1_433_000.0);
    assert_relative_eq!(mat.magnetization(), 1.115 / MU0, max_relative = 1e-12);
    assert_relative_eq!(mat.magnetization(), 8.8729e5, max_relative = 1e-4);
}

#[test]
fn cylinder_volume_is_pi_r2_h() {
    let m = yxg32_cylinder();
    assert_relative_eq!(m.volume(), std::f64::consts::PI * 15.0 * 15.0 * 35.0, max_relative = 1e-12);
}

#[test]
fn grids_have_requested_counts_and_inclusive_endpoints() {
    let u = linspace(-60.0, 60.0, 300);
    assert_eq!(u.len(), 300);
    assert_eq!(u[0], -60.0);
    assert_eq!(u[299], 60.0);

    let plane = PlaneGrid::square(Plane::Xz { y: 0.0 }, -60.0, 60.0, 300);
    assert_eq!(plane.n_points(), 90_000);
    assert_eq!(plane.points().len(), 90_000);

    let vol = ImageGrid::cube(51, 2.0, -50.0);
    assert_eq!(vol.n_points(), 132_651);
    let (lo, hi) = vol.bounds();
    assert_eq!(lo, [-50.0; 3]);
    assert_eq!(hi, [50.0; 3]);

    let arrows = ImageGrid::cube(9, 10.0, -40.0);
    assert_eq!(arrows.points().len(), 729);
}

#[test]
fn on_axis_field_matches_solenoid_formula() {
    let m = yxg32_cylinder();
    for z in [-70.0, -17.5, -3.0, 0.0, 8.0, 17.5, 17.6, 35.0, 70.0] {
        let b = m.b_field([0.0, 0.0, z]);
        assert_abs_diff_eq!(b[0], 0.0, epsilon = 1e-14);
        assert_abs_diff_eq!(b[1], 0.0, epsilon = 1e-14);
        assert_relative_eq!(b[2], m.axial_bz(z), max_relative = 1e-8);
    }
}

#[test]
fn far_field_approaches_dipole() {
    // m = J V / mu0; on axis B = 2 (mu0/4pi) m / r^3 = J V / (2 pi r^3),
    // on the equator B_z = -J V / (4 pi r^3). Units cancel in mm.
    let m = yxg32_cylinder();
    let jv = m.polarization * m.volume();
    let r = 600.0;
    let pi = std::f64::consts::PI;

    let axial = m.b_field([0.0, 0.0, r]);
    assert_relative_eq!(axial[2], jv / (2.0 * pi * r.powi(3)), max_relative = 5e-3);

    let equatorial = m.b_field([r, 0.0, 0.0]);
    assert_relative_eq!(equatorial[2], -jv / (4.0 * pi * r.powi(3)), max_relative = 5e-3);
    assert_abs_diff_eq!(equatorial[0], 0.0, epsilon = 1e-3 * equatorial[2].abs());
}

#[test]
fn normal_component_is_continuous_through_pole_face() {
    let m = yxg32_cylinder();
    let h = m.half_height();
    for x in [0.0, 5.0, 10.0] {
        let below = m.b_field([x, 0.0, h - 1e-6]);
        let above = m.b_field([x, 0.0, h + 1e-6]);
        assert_abs_diff_eq!(below[2], above[2], epsilon = 1e-4);
    }
}

#[test]
fn batched_evaluation_equals_pointwise() {
    let m = yxg32_cylinder();
    let grid = ImageGrid::cube(7, 9.0, -27.0);
    let pts = grid.points();
    let batch = m.b_field_many(&pts);
    assert_eq!(batch.len(), pts.len());
    for (p, b) in pts.iter().zip(&batch) {
        assert_eq!(*b, m.b_field(*p));
    }
    assert!(m.b_field_checked(&pts, pts.len() + 1).is_err());
}

#[test]
fn key_point_report_values() {
    let m = yxg32_cylinder();
    let pts = key_points(&m);
    let z: Vec<f64> = pts.iter().map(|p| p.z).collect();
    assert_eq!(z, vec![0.0, 17.5, 35.0, 70.0]);
    // Field decreases monotonically along the axis away from the centre.
    assert!(pts.windows(2).all(|w| w[0].bz > w[1].bz));

    let mut buf = Vec::new();
    write_key_points(&mut buf, &pts).unwrap();
    let text = String::from_utf8(buf).unwrap();
    assert!(text.contains("z =   0.0 mm: Bz =  8465.71 G (0.8466 T)"));
    assert!(text.contains("Magnetic Field at Key Points"));
}

#[test]
fn streamplot_lines_stay_inside_the_plane() {
    let m = yxg32_cylinder();
    let field = PlaneField::compute(PlaneGrid::square(Plane::Xz { y: 0.0 }, -60.0, 60.0, 61), &m).unwrap();
    let lines = streamplot(&field, &SceneConfig::xz_plane().streamplot);
    assert!(!lines.is_empty());
    for line in &lines {
        assert!(line.points.len() >= 2);
        for p in &line.points {
            assert!(p[0] >= -60.0 - 1e-9 && p[0] <= 60.0 + 1e-9);
            assert!(p[1] >= -60.0 - 1e-9 && p[1] <= 60.0 + 1e-9);
        }
    }
}

#[test]
fn field_lines_leave_the_north_face_and_stay_in_bounds() {
    let m = yxg32_cylinder();
    let field = VolumeField::compute(ImageGrid::cube(26, 4.0, -50.0), &m).unwrap();
    let seeds = pole_seeds(&m, &[3.0, 8.0, 13.0], 8, 1.0);
    assert_eq!(seeds.len(), 48);

    let lines = trace_from_seeds(&field, &seeds, &TracerOptions::default());
    assert_eq!(lines.len(), 48);
    for line in &lines {
        assert_eq!(line.points.len(), line.magnitude.len());
        assert!(line.points.iter().all(|&p| field.grid.contains(p)));
        assert!(line.magnitude.iter().all(|b| b.is_finite() && *b >= 0.0));
    }
}

#[test]
fn glyphs_skip_points_inside_the_magnet() {
    let m = yxg32_cylinder();
    let grid = ImageGrid::cube(9, 10.0, -40.0);
    let glyphs = arrow_glyphs(&grid.points(), &m, &ArrowStyle::default());
    assert_eq!(glyphs.len(), 729 - 27);
    assert!(glyphs.iter().all(|g| !m.contains(g.base)));
}

#[test]
fn ovf_dump_has_header_and_one_row_per_node() {
    let m = yxg32_cylinder();
    let field = VolumeField::compute(ImageGrid::cube(4, 20.0, -30.0), &m).unwrap();
    let dir = std::env::temp_dir().join(format!("magnet_sim_validation_{}", std::process::id()));
    let path = dir.join("field_B.ovf");

    write_ovf2_text(&path, &field, &OvfMeta::flux_density()).unwrap();
    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.starts_with("# OOMMF OVF 2.0"));
    assert!(text.contains("# meshunit: mm"));
    let rows = text
        .lines()
        .filter(|l| !l.starts_with('#') && !l.trim().is_empty())
        .count();
    assert_eq!(rows, 64);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn every_scene_writes_figure_config_and_frames() {
    let root = std::env::temp_dir().join(format!("magnet_sim_scenes_{}", std::process::id()));

    for kind in [SceneKind::XzPlane, SceneKind::Volume, SceneKind::Slices] {
        let mut scene = SceneConfig::for_kind(kind);
        scene.plane.n = 41;
        scene.volume = ImageGrid::cube(26, 4.0, -50.0);

        let out_dir = root.join(kind.as_str());
        let mut opts = RunOptions::new("validation", kind.as_str());
        opts.orbit_frames = 2;
        opts.write_ovf = true;

        let out = run_scene(&scene, &out_dir, &opts).unwrap();

        assert_eq!(out.figure, out_dir.join(format!("magnet_{}.png", kind.as_str())));
        assert!(out.figure.is_file());
        assert!(out.config.is_file());
        assert_eq!(out.key_points.len(), 4);
        assert!(out.movie.is_none());

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&out.config).unwrap()).unwrap();
        assert_eq!(json["scene"]["figure"], scene.figure.as_str());
        assert_eq!(json["run"]["run_id"], kind.as_str());
        assert_relative_eq!(json["material"]["br_t"].as_f64().unwrap(), 1.115, max_relative = 1e-12);

        let ovf_path = out_dir.join("field_B.ovf");
        match kind {
            SceneKind::Volume => {
                assert_eq!(out.ovf.as_deref(), Some(ovf_path.as_path()));
                assert!(ovf_path.is_file());
            }
            _ => {
                assert!(out.ovf.is_none());
                assert!(!ovf_path.exists());
            }
        }

        // Orbit frames need a 3D view; the slices scene has none.
        match kind {
            SceneKind::Slices => assert!(out.frames.is_empty()),
            _ => {
                assert_eq!(out.frames.len(), 2);
                assert!(out.frames.iter().all(|f| f.is_file()));
            }
        }
    }

    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn smaller_magnet_runs_with_seed_rings_on_its_faces() {
    let root = std::env::temp_dir().join(format!("magnet_sim_small_{}", std::process::id()));
    let mut scene = SceneConfig::volume();
    scene.diameter = 20.0;
    scene.height = 10.0;
    scene.volume = ImageGrid::cube(26, 4.0, -50.0);

    let out = run_scene(&scene, &root, &RunOptions::new("validation", "small")).unwrap();
    assert!(out.figure.is_file());
    assert_eq!(out.key_points[1].z, 5.0);

    let _ = std::fs::remove_dir_all(&root);
}
