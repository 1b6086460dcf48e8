// src/visualisation.rs
//
// PNG rendering with plotters.
//
// Plane panels use an ordinary 2D chart in millimetres. "3D" panels are also
// 2D charts: every primitive is projected with `Camera::project`, sorted by
// `Camera::depth` (far to near) and drawn in that order, with back faces of
// closed surfaces culled.

use plotters::coord::Shift;
use plotters::coord::cartesian::Cartesian2d;
use plotters::coord::types::RangedCoordf64;
use plotters::prelude::*;
use std::path::Path;
use std::process::Command;

use crate::camera::Camera;
use crate::contour::ContourLine;
use crate::error::{MagnetSimError, Result};
use crate::glyphs::{ArrowGlyph, Quiver};
use crate::grid::Plane;
use crate::magnet::CylinderMagnet;
use crate::scene::Layers;
use crate::streamlines::{StreamLine2D, StreamLine3D};
use crate::vec3::{add, dot, normalize, scale};
use crate::vector_field::PlaneField;

type DynResult<T> = std::result::Result<T, Box<dyn std::error::Error>>;
type Area<'a> = DrawingArea<BitMapBackend<'a>, Shift>;
type Chart2d<'a, 'b> =
    ChartContext<'a, BitMapBackend<'b>, Cartesian2d<RangedCoordf64, RangedCoordf64>>;

const FONT: &str = "sans-serif";

// ---------------------------------------------------------------------------
// Colours
// ---------------------------------------------------------------------------

/// Diverging blue–grey–red map (approximation of "coolwarm"), t in [0, 1].
pub fn coolwarm(t: f64) -> RGBColor {
    const STOPS: [(f64, [f64; 3]); 5] = [
        (0.00, [59.0, 76.0, 192.0]),
        (0.25, [141.0, 176.0, 254.0]),
        (0.50, [221.0, 220.0, 220.0]),
        (0.75, [244.0, 154.0, 123.0]),
        (1.00, [180.0, 4.0, 38.0]),
    ];
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.5 };
    let seg = STOPS
        .windows(2)
        .find(|w| t <= w[1].0)
        .unwrap_or(&STOPS[3..5]);
    let (t0, c0) = seg[0];
    let (t1, c1) = seg[1];
    let x = (t - t0) / (t1 - t0);
    let ch = |a: usize| (c0[a] + x * (c1[a] - c0[a])).round().clamp(0.0, 255.0) as u8;
    RGBColor(ch(0), ch(1), ch(2))
}

/// Map `value` into [lo, hi] on the colour map. A degenerate range maps to
/// the middle of the map.
fn value_color(value: f64, lo: f64, hi: f64) -> RGBColor {
    if !lo.is_finite() || !hi.is_finite() || (hi - lo).abs() < 1e-300 {
        return coolwarm(0.5);
    }
    coolwarm((value - lo) / (hi - lo))
}

/// Scale a colour's brightness (Lambert shading).
fn shade(c: RGBColor, intensity: f64) -> RGBColor {
    let f = intensity.clamp(0.0, 1.0);
    RGBColor(
        (c.0 as f64 * f) as u8,
        (c.1 as f64 * f) as u8,
        (c.2 as f64 * f) as u8,
    )
}

fn finite_range(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for v in values {
        if v.is_finite() {
            lo = lo.min(v);
            hi = hi.max(v);
        }
    }
    if lo.is_finite() {
        (lo, hi)
    } else {
        (0.0, 1.0)
    }
}

// ---------------------------------------------------------------------------
// Shared pieces
// ---------------------------------------------------------------------------

/// Vertical colour bar filling `area`.
fn draw_colorbar(area: &Area<'_>, lo: f64, hi: f64, title: &[String]) -> DynResult<()> {
    let (lo, hi) = if hi > lo { (lo, hi) } else { (lo, lo + 1.0) };
    let (_, h) = area.dim_in_pixel();
    let title_px = 18 * title.len() as i32;
    let pad = (h as i32 / 6).max(title_px + 10);

    let mut chart = ChartBuilder::on(area)
        .margin_top(pad)
        .margin_bottom(pad)
        .margin_right(10)
        .y_label_area_size(70)
        .build_cartesian_2d(0.0..1.0, lo..hi)?;

    chart
        .configure_mesh()
        .disable_mesh()
        .x_labels(0)
        .y_labels(6)
        .label_style((FONT, 13))
        .draw()?;

    let n = 128;
    let dv = (hi - lo) / n as f64;
    chart.draw_series((0..n).map(|s| {
        let v0 = lo + s as f64 * dv;
        let c = value_color(v0 + 0.5 * dv, lo, hi);
        Rectangle::new([(0.0, v0), (1.0, v0 + dv)], c.filled())
    }))?;

    for (n, line) in title.iter().enumerate() {
        area.draw(&Text::new(
            line.clone(),
            (8, pad - title_px + 18 * n as i32 - 6),
            (FONT, 15).into_font().color(&BLACK),
        ))?;
    }
    Ok(())
}

/// Cell edges for node-centred cells along one axis, clamped to the nodes.
fn cell_edges(nodes: &[f64]) -> Vec<(f64, f64)> {
    let n = nodes.len();
    (0..n)
        .map(|i| {
            let lo = if i == 0 { nodes[0] } else { 0.5 * (nodes[i - 1] + nodes[i]) };
            let hi = if i + 1 == n { nodes[n - 1] } else { 0.5 * (nodes[i] + nodes[i + 1]) };
            (lo, hi)
        })
        .collect()
}

fn arrow_head_2d(from: (f64, f64), to: (f64, f64), size: f64) -> [(f64, f64); 3] {
    let (dx, dy) = (to.0 - from.0, to.1 - from.1);
    let l = (dx * dx + dy * dy).sqrt().max(1e-300);
    let (ux, uy) = (dx / l, dy / l);
    let back = (to.0 - size * ux, to.1 - size * uy);
    let side = (-uy * 0.5 * size, ux * 0.5 * size);
    [
        (back.0 + side.0, back.1 + side.1),
        to,
        (back.0 - side.0, back.1 - side.1),
    ]
}

// ---------------------------------------------------------------------------
// Plane panels
// ---------------------------------------------------------------------------

/// Everything drawn on one planar field map.
pub struct PlanePanel<'a> {
    pub title: String,
    pub field: &'a PlaneField,
    /// |B| in gauss, grid order.
    pub magnitude_gauss: &'a [f64],
    pub streamlines: &'a [StreamLine2D],
    pub contours: &'a [ContourLine],
    pub quiver: &'a [Quiver],
    pub quiver_length: f64,
    pub magnet: &'a CylinderMagnet,
    pub layers: Layers,
}

fn draw_heatmap(chart: &mut Chart2d<'_, '_>, panel: &PlanePanel<'_>, lo: f64, hi: f64) -> DynResult<()> {
    let g = &panel.field.grid;
    let ue = cell_edges(&g.u);
    let ve = cell_edges(&g.v);
    chart.draw_series((0..g.nv()).flat_map(|k| {
        let ue = &ue;
        let ve = &ve;
        (0..g.nu()).map(move |i| {
            let value = panel.magnitude_gauss[g.idx(i, k)];
            Rectangle::new(
                [(ue[i].0, ve[k].0), (ue[i].1, ve[k].1)],
                value_color(value, lo, hi).filled(),
            )
        })
    }))?;
    Ok(())
}

fn draw_streamlines_2d(chart: &mut Chart2d<'_, '_>, lines: &[StreamLine2D], head: f64) -> DynResult<()> {
    for line in lines {
        let pts: Vec<(f64, f64)> = line.points.iter().map(|p| (p[0], p[1])).collect();
        chart.draw_series(std::iter::once(PathElement::new(pts.clone(), BLACK.stroke_width(1))))?;

        // Direction marker half-way along the line.
        let mid = pts.len() / 2;
        if mid >= 1 && mid + 1 < pts.len() {
            let tri = arrow_head_2d(pts[mid - 1], pts[mid + 1], head);
            chart.draw_series(std::iter::once(Polygon::new(tri.to_vec(), BLACK.filled())))?;
        }
    }
    Ok(())
}

fn contour_color(n: usize) -> RGBColor {
    const COLORS: [RGBColor; 3] = [RGBColor(0, 255, 255), RGBColor(0, 255, 0), RGBColor(255, 255, 0)];
    COLORS[n % COLORS.len()]
}

fn draw_contours(chart: &mut Chart2d<'_, '_>, contours: &[ContourLine]) -> DynResult<()> {
    for (n, line) in contours.iter().enumerate() {
        let color = contour_color(n);
        chart.draw_series(line.segments.iter().map(|(a, b)| {
            PathElement::new(vec![(a[0], a[1]), (b[0], b[1])], color.stroke_width(2))
        }))?;
        if let Some(anchor) = line.label_anchor() {
            chart.draw_series(std::iter::once(Text::new(
                format!("{:.0} G", line.level),
                (anchor[0], anchor[1]),
                (FONT, 14).into_font().color(&color),
            )))?;
        }
    }
    Ok(())
}

fn draw_outline<'a, 'b: 'a>(
    chart: &mut Chart2d<'a, 'b>,
    plane: Plane,
    magnet: &CylinderMagnet,
) -> DynResult<()> {
    let r = magnet.radius();
    let h = magnet.half_height();
    let outline: Vec<(f64, f64)> = match plane {
        Plane::Xz { .. } => vec![(-r, -h), (r, -h), (r, h), (-r, h), (-r, -h)],
        Plane::Xy { .. } => (0..=120)
            .map(|n| {
                let t = 2.0 * std::f64::consts::PI * n as f64 / 120.0;
                (r * t.cos(), r * t.sin())
            })
            .collect(),
    };
    let green = RGBColor(0, 128, 0);
    chart
        .draw_series(LineSeries::new(outline, green.stroke_width(2)))?
        .label("Magnet")
        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], green.stroke_width(2)));

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .label_font((FONT, 14))
        .border_style(&BLACK)
        .background_style(WHITE.mix(0.8))
        .draw()?;
    Ok(())
}

fn draw_quiver(chart: &mut Chart2d<'_, '_>, quiver: &[Quiver], len: f64) -> DynResult<()> {
    for q in quiver {
        let from = (q.at[0] - 0.5 * len * q.dir[0], q.at[1] - 0.5 * len * q.dir[1]);
        let to = (q.at[0] + 0.5 * len * q.dir[0], q.at[1] + 0.5 * len * q.dir[1]);
        chart.draw_series(std::iter::once(PathElement::new(vec![from, to], BLACK.stroke_width(1))))?;
        let tri = arrow_head_2d(from, to, 0.35 * len);
        chart.draw_series(std::iter::once(Polygon::new(tri.to_vec(), BLACK.filled())))?;
    }
    Ok(())
}

/// One planar field map with its colour bar.
fn draw_plane_panel(area: &Area<'_>, panel: &PlanePanel<'_>) -> DynResult<()> {
    let (w, h) = area.dim_in_pixel();
    let bar_w = 130u32.min(w / 4);
    let (main, bar) = area.split_horizontally(w - bar_w);

    let (u0, u1, v0, v1) = panel.field.grid.extent();
    let (xlabel, ylabel) = panel.field.grid.plane.axis_labels();
    let (lo, hi) = finite_range(panel.magnitude_gauss.iter().copied());

    // Keep the data aspect ratio close to 1:1.
    let plot_w = (w - bar_w) as i32 - 100;
    let plot_h = h as i32 - 140;
    let want_h = (plot_w as f64 * (v1 - v0) / (u1 - u0).max(1e-12)) as i32;
    let extra = ((plot_h - want_h) / 2).max(0);

    let mut chart = ChartBuilder::on(&main)
        .caption(&panel.title, (FONT, 22))
        .margin(15)
        .margin_top(15 + extra)
        .margin_bottom(15 + extra)
        .x_label_area_size(45)
        .y_label_area_size(55)
        .build_cartesian_2d(u0..u1, v0..v1)?;

    chart
        .configure_mesh()
        .disable_mesh()
        .x_desc(xlabel)
        .y_desc(ylabel)
        .label_style((FONT, 14))
        .axis_desc_style((FONT, 16))
        .draw()?;

    if panel.layers.heatmap {
        draw_heatmap(&mut chart, panel, lo, hi)?;
    }
    if panel.layers.streamlines {
        draw_streamlines_2d(&mut chart, panel.streamlines, 0.015 * (u1 - u0))?;
    }
    if panel.layers.contours {
        draw_contours(&mut chart, panel.contours)?;
    }
    if panel.layers.quiver {
        draw_quiver(&mut chart, panel.quiver, panel.quiver_length)?;
    }
    if panel.layers.outline {
        draw_outline(&mut chart, panel.field.grid.plane, panel.magnet)?;
    }

    if panel.layers.heatmap {
        draw_colorbar(&bar, lo, hi, &["|B| [G]".to_string()])?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Projected 3D panels
// ---------------------------------------------------------------------------

enum Primitive {
    Facet { pts: Vec<[f64; 3]>, color: RGBAColor },
    Segment { a: [f64; 3], b: [f64; 3], color: RGBAColor, width: u32 },
}

struct Item {
    depth: f64,
    prim: Primitive,
}

/// Painter's list for one projected view.
struct ProjectedScene {
    camera: Camera,
    light: [f64; 3],
    items: Vec<Item>,
}

impl ProjectedScene {
    fn new(camera: Camera) -> Self {
        let light = normalize(add(camera.view_dir(), [0.0, 0.0, 0.6]));
        Self {
            camera,
            light,
            items: Vec::new(),
        }
    }

    /// Add a planar facet with outward normal `n`; culled if facing away.
    fn facet(&mut self, pts: Vec<[f64; 3]>, n: [f64; 3], base: RGBColor, alpha: f64) {
        let view = self.camera.view_dir();
        if dot(n, view) <= 1e-9 {
            return;
        }
        let intensity = 0.55 + 0.45 * dot(normalize(n), self.light).max(0.0);
        let c = shade(base, intensity);
        let centroid = scale(pts.iter().fold([0.0; 3], |acc, &p| add(acc, p)), 1.0 / pts.len() as f64);
        self.items.push(Item {
            depth: self.camera.depth(centroid),
            prim: Primitive::Facet {
                pts,
                color: c.mix(alpha),
            },
        });
    }

    fn segment(&mut self, a: [f64; 3], b: [f64; 3], color: RGBColor, width: u32) {
        let mid = scale(add(a, b), 0.5);
        self.items.push(Item {
            depth: self.camera.depth(mid),
            prim: Primitive::Segment {
                a,
                b,
                color: color.to_rgba(),
                width,
            },
        });
    }

    /// Side wall of a z-aligned cylinder between z0 and z1, meshed as
    /// n_theta x n_z quads. Tall facets sort badly against nearby lines, so
    /// long walls need several z bands.
    #[allow(clippy::too_many_arguments)]
    fn cylinder_side(
        &mut self,
        radius: f64,
        z0: f64,
        z1: f64,
        n_theta: usize,
        n_z: usize,
        color: RGBColor,
        alpha: f64,
    ) {
        let tau = 2.0 * std::f64::consts::PI;
        let n_z = n_z.max(1);
        let dz = (z1 - z0) / n_z as f64;
        for s in 0..n_theta {
            let t0 = tau * s as f64 / n_theta as f64;
            let t1 = tau * (s + 1) as f64 / n_theta as f64;
            let tm = 0.5 * (t0 + t1);
            let p = |t: f64, z: f64| [radius * t.cos(), radius * t.sin(), z];
            for b in 0..n_z {
                let za = z0 + b as f64 * dz;
                let zb = if b + 1 == n_z { z1 } else { za + dz };
                self.facet(
                    vec![p(t0, za), p(t1, za), p(t1, zb), p(t0, zb)],
                    [tm.cos(), tm.sin(), 0.0],
                    color,
                    alpha,
                );
            }
        }
    }

    /// Flat disc at height z facing `up` (+1) or down (-1).
    fn disc(&mut self, radius: f64, z: f64, up: f64, n_theta: usize, color: RGBColor, alpha: f64) {
        let tau = 2.0 * std::f64::consts::PI;
        let pts = (0..n_theta)
            .map(|s| {
                let t = tau * s as f64 / n_theta as f64;
                [radius * t.cos(), radius * t.sin(), z]
            })
            .collect();
        self.facet(pts, [0.0, 0.0, up], color, alpha);
    }

    /// Cone from a base disc at z0 to the apex at z1 (z1 > z0).
    fn cone(&mut self, radius: f64, z0: f64, z1: f64, n_theta: usize, color: RGBColor, alpha: f64) {
        let tau = 2.0 * std::f64::consts::PI;
        let len = z1 - z0;
        for s in 0..n_theta {
            let t0 = tau * s as f64 / n_theta as f64;
            let t1 = tau * (s + 1) as f64 / n_theta as f64;
            let tm = 0.5 * (t0 + t1);
            let p = |t: f64| [radius * t.cos(), radius * t.sin(), z0];
            self.facet(
                vec![p(t0), p(t1), [0.0, 0.0, z1]],
                [len * tm.cos(), len * tm.sin(), radius],
                color,
                alpha,
            );
        }
        self.disc(radius, z0, -1.0, n_theta, color, alpha);
    }

    /// Draw everything far-to-near onto a chart in screen coordinates.
    fn sort_far_to_near(&mut self) {
        self.items.sort_by(|a, b| a.depth.total_cmp(&b.depth));
    }

    fn render(mut self, chart: &mut Chart2d<'_, '_>) -> DynResult<()> {
        self.sort_far_to_near();
        let cam = self.camera;
        let area = chart.plotting_area();
        for item in &self.items {
            match &item.prim {
                Primitive::Facet { pts, color } => {
                    let poly: Vec<(f64, f64)> = pts.iter().map(|&p| cam.project(p)).collect();
                    area.draw(&Polygon::new(poly, color.filled()))?;
                }
                Primitive::Segment { a, b, color, width } => {
                    area.draw(&PathElement::new(
                        vec![cam.project(*a), cam.project(*b)],
                        color.stroke_width(*width),
                    ))?;
                }
            }
        }
        Ok(())
    }
}

/// Screen-space chart for a projected view of the cube [-extent, extent]³.
fn projected_chart<'a, 'b>(
    area: &'a Area<'b>,
    title: &str,
    camera: &Camera,
    extent: f64,
) -> DynResult<Chart2d<'a, 'b>> {
    let (w, h) = area.dim_in_pixel();
    // Half-diagonal of the cube bounds its projection.
    let half = extent * 3f64.sqrt() * camera.scale;
    let aspect = h as f64 / w.max(1) as f64;
    let (hx, hy) = if aspect >= 1.0 {
        (half, half * aspect)
    } else {
        (half / aspect, half)
    };
    let chart = ChartBuilder::on(area)
        .caption(title, (FONT, 22))
        .margin(20)
        .build_cartesian_2d(-hx..hx, -hy..hy)?;
    Ok(chart)
}

/// Bounding box wireframe with axis labels and ticks at -e, 0, e.
fn draw_axes_box(chart: &mut Chart2d<'_, '_>, camera: &Camera, e: f64) -> DynResult<()> {
    let grey = RGBColor(170, 170, 170);
    let corners = |i: usize| {
        [
            if i & 1 == 0 { -e } else { e },
            if i & 2 == 0 { -e } else { e },
            if i & 4 == 0 { -e } else { e },
        ]
    };
    let mut edges = Vec::new();
    for i in 0..8usize {
        for bit in [1usize, 2, 4] {
            if i & bit == 0 {
                edges.push((corners(i), corners(i | bit)));
            }
        }
    }
    chart.draw_series(edges.iter().map(|&(a, b)| {
        PathElement::new(vec![camera.project(a), camera.project(b)], grey.stroke_width(1))
    }))?;

    let v = camera.view_dir();
    let sx = if v[0] >= 0.0 { 1.0 } else { -1.0 };
    let sy = if v[1] >= 0.0 { 1.0 } else { -1.0 };
    let style = (FONT, 13).into_font().color(&BLACK);
    let mut labels: Vec<(String, [f64; 3])> = vec![
        ("x [mm]".to_string(), [0.0, sy * 1.3 * e, -e]),
        ("y [mm]".to_string(), [sx * 1.3 * e, 0.0, -e]),
        ("z [mm]".to_string(), [sx * 1.2 * e, -sy * 1.2 * e, 0.0]),
    ];
    for t in [-e, 0.0, e] {
        labels.push((format!("{t:.0}"), [t, sy * 1.1 * e, -e]));
        labels.push((format!("{t:.0}"), [sx * 1.1 * e, t, -e]));
        labels.push((format!("{t:.0}"), [sx * 1.1 * e, -sy * e, t]));
    }
    chart.draw_series(
        labels
            .into_iter()
            .map(|(s, p)| Text::new(s, camera.project(p), style.clone())),
    )?;
    Ok(())
}

/// How to draw the magnet body in projected views.
#[derive(Debug, Clone, Copy)]
pub enum MagnetStyle {
    /// Uniform grey.
    Plain,
    /// North half red, south half green.
    Poles,
}

/// Azimuthal and axial resolution of the magnet mesh.
const MAGNET_THETA: usize = 100;
const MAGNET_Z_BANDS: usize = 59;

fn add_magnet(scene: &mut ProjectedScene, magnet: &CylinderMagnet, style: MagnetStyle) {
    let r = magnet.radius();
    let h = magnet.half_height();
    match style {
        MagnetStyle::Plain => {
            let grey = RGBColor(128, 128, 128);
            scene.cylinder_side(r, -h, h, MAGNET_THETA, MAGNET_Z_BANDS, grey, 1.0);
            scene.disc(r, h, 1.0, 100, grey, 1.0);
            scene.disc(r, -h, -1.0, 100, grey, 1.0);
        }
        MagnetStyle::Poles => {
            let north = RGBColor(221, 64, 64);
            let south = RGBColor(0, 170, 80);
            let half_bands = MAGNET_Z_BANDS.div_ceil(2);
            scene.cylinder_side(r, 0.0, h, MAGNET_THETA, half_bands, north, 1.0);
            scene.cylinder_side(r, -h, 0.0, MAGNET_THETA, half_bands, south, 1.0);
            scene.disc(r, h, 1.0, 100, north, 1.0);
            scene.disc(r, -h, -1.0, 100, south, 1.0);
        }
    }
}

/// Blue arrow above the top face showing the magnetisation direction.
fn add_magnetization_arrow(scene: &mut ProjectedScene, magnet: &CylinderMagnet) {
    let blue = RGBColor(0, 0, 255);
    let length = magnet.height * 0.25;
    let tip = length * 0.3;
    let base = magnet.half_height() + 2.0;
    scene.cylinder_side(0.8, base, base + length - tip, 20, 1, blue, 0.9);
    scene.disc(0.8, base, -1.0, 20, blue, 0.9);
    scene.cone(1.5, base + length - tip, base + length, 20, blue, 0.9);
}

/// Field-line segments coloured by |B| over [lo, hi]. Segments entirely
/// inside the (opaque) magnet are dropped.
fn add_field_lines(
    scene: &mut ProjectedScene,
    lines: &[StreamLine3D],
    magnet: &CylinderMagnet,
    lo: f64,
    hi: f64,
) {
    for line in lines {
        for (n, w) in line.points.windows(2).enumerate() {
            if magnet.contains(w[0]) && magnet.contains(w[1]) {
                continue;
            }
            let m = 0.5 * (line.magnitude[n] + line.magnitude[n + 1]);
            scene.segment(w[0], w[1], value_color(m, lo, hi), 3);
        }
    }
}

/// Static view of the magnet body (optionally with its magnetisation arrow).
pub struct MagnetPanel<'a> {
    pub title: String,
    pub magnet: &'a CylinderMagnet,
    pub camera: Camera,
    /// Half-width of the axes cube (mm).
    pub extent: f64,
    pub style: MagnetStyle,
    pub magnetization_arrow: bool,
}

fn draw_magnet_panel(area: &Area<'_>, panel: &MagnetPanel<'_>) -> DynResult<()> {
    let mut chart = projected_chart(area, &panel.title, &panel.camera, panel.extent)?;
    draw_axes_box(&mut chart, &panel.camera, panel.extent)?;

    let mut scene = ProjectedScene::new(panel.camera);
    add_magnet(&mut scene, panel.magnet, panel.style);
    if panel.magnetization_arrow {
        add_magnetization_arrow(&mut scene, panel.magnet);
    }
    scene.render(&mut chart)
}

/// Field lines and arrow glyphs around the magnet.
pub struct VolumePanel<'a> {
    pub title: String,
    pub overlay: Vec<String>,
    pub colorbar_title: Vec<String>,
    pub magnet: &'a CylinderMagnet,
    pub camera: Camera,
    pub extent: f64,
    pub streamlines: &'a [StreamLine3D],
    pub arrows: &'a [ArrowGlyph],
}

fn draw_volume_panel(area: &Area<'_>, panel: &VolumePanel<'_>) -> DynResult<()> {
    let (w, _) = area.dim_in_pixel();
    let bar_w = 170u32.min(w / 4);
    let (main, bar) = area.split_horizontally(w - bar_w);

    let mut chart = projected_chart(&main, &panel.title, &panel.camera, panel.extent)?;
    draw_axes_box(&mut chart, &panel.camera, panel.extent)?;

    let mut scene = ProjectedScene::new(panel.camera);
    add_magnet(&mut scene, panel.magnet, MagnetStyle::Poles);

    let (lo, hi) = finite_range(panel.streamlines.iter().flat_map(|l| l.magnitude.iter().copied()));
    add_field_lines(&mut scene, panel.streamlines, panel.magnet, lo, hi);

    let (alo, ahi) = finite_range(panel.arrows.iter().map(|a| a.magnitude));
    for a in panel.arrows {
        let c = value_color(a.magnitude, alo, ahi);
        scene.segment(a.base, a.tip, c, 2);
        for barb in a.barbs {
            scene.segment(barb, a.tip, c, 2);
        }
    }
    scene.render(&mut chart)?;

    for (n, line) in panel.overlay.iter().enumerate() {
        main.draw(&Text::new(
            line.clone(),
            (20, 50 + 20 * n as i32),
            (FONT, 16).into_font().color(&BLACK),
        ))?;
    }

    if !panel.streamlines.is_empty() {
        draw_colorbar(&bar, lo, hi, &panel.colorbar_title)?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Figures
// ---------------------------------------------------------------------------

fn finish(root: &Area<'_>) -> DynResult<()> {
    root.present()?;
    Ok(())
}

/// Magnet overview (left) and planar field map (right).
pub fn save_overview_and_plane(
    path: &Path,
    size: (u32, u32),
    magnet: &MagnetPanel<'_>,
    plane: &PlanePanel<'_>,
) -> Result<()> {
    let draw = || -> DynResult<()> {
        let root = BitMapBackend::new(path, size).into_drawing_area();
        root.fill(&WHITE)?;
        let (left, right) = root.split_horizontally(size.0 * 45 / 100);
        draw_magnet_panel(&left, magnet)?;
        draw_plane_panel(&right, plane)?;
        finish(&root)
    };
    draw().map_err(MagnetSimError::plot)
}

pub fn save_volume(path: &Path, size: (u32, u32), panel: &VolumePanel<'_>) -> Result<()> {
    let draw = || -> DynResult<()> {
        let root = BitMapBackend::new(path, size).into_drawing_area();
        root.fill(&WHITE)?;
        draw_volume_panel(&root, panel)?;
        finish(&root)
    };
    draw().map_err(MagnetSimError::plot)
}

/// Planar maps side by side.
pub fn save_planes(path: &Path, size: (u32, u32), panels: &[PlanePanel<'_>]) -> Result<()> {
    let draw = || -> DynResult<()> {
        let root = BitMapBackend::new(path, size).into_drawing_area();
        root.fill(&WHITE)?;
        let areas = root.split_evenly((1, panels.len().max(1)));
        for (area, panel) in areas.iter().zip(panels) {
            draw_plane_panel(area, panel)?;
        }
        finish(&root)
    };
    draw().map_err(MagnetSimError::plot)
}

/// Use `ffmpeg` (from PATH) to stitch frames matching a glob pattern into an
/// MP4 movie.
pub fn make_movie_with_ffmpeg(pattern: &str, output: &Path, fps: u32) -> Result<()> {
    let fps = fps.to_string();
    let status = Command::new("ffmpeg")
        .args(["-y", "-framerate", fps.as_str(), "-pattern_type", "glob", "-i", pattern])
        .args(["-pix_fmt", "yuv420p"])
        .arg(output)
        .status()?;

    if !status.success() {
        return Err(MagnetSimError::Ffmpeg(format!("exited with {status}")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coolwarm_endpoints_and_middle() {
        assert_eq!(coolwarm(0.0), RGBColor(59, 76, 192));
        assert_eq!(coolwarm(1.0), RGBColor(180, 4, 38));
        assert_eq!(coolwarm(0.5), RGBColor(221, 220, 220));
        // Out-of-range and NaN inputs are clamped / centred.
        assert_eq!(coolwarm(-3.0), coolwarm(0.0));
        assert_eq!(coolwarm(f64::NAN), coolwarm(0.5));
    }

    #[test]
    fn degenerate_range_maps_to_middle() {
        assert_eq!(value_color(4.0, 2.0, 2.0), coolwarm(0.5));
    }

    #[test]
    fn cell_edges_tile_the_axis() {
        let e = cell_edges(&[0.0, 1.0, 2.0, 3.0]);
        assert_eq!(e, vec![(0.0, 0.5), (0.5, 1.5), (1.5, 2.5), (2.5, 3.0)]);
    }

    #[test]
    fn back_faces_are_culled() {
        let cam = Camera::elev_azim(0.0, 0.0);
        let mut scene = ProjectedScene::new(cam);
        scene.cylinder_side(10.0, -5.0, 5.0, 40, 1, RGBColor(128, 128, 128), 1.0);
        // Only the half facing +x survives; edge-on facets are dropped too.
        assert!(scene.items.len() < 21 && scene.items.len() >= 18);
        scene.disc(10.0, 5.0, 1.0, 40, RGBColor(128, 128, 128), 1.0);
        assert!(scene.items.len() < 21);
    }

    #[test]
    fn arrow_head_points_at_target() {
        let tri = arrow_head_2d((0.0, 0.0), (10.0, 0.0), 2.0);
        assert_eq!(tri[1], (10.0, 0.0));
        assert!((tri[0].0 - 8.0).abs() < 1e-12 && (tri[2].0 - 8.0).abs() < 1e-12);
        assert!((tri[0].1 + tri[2].1).abs() < 1e-12);
    }

    #[test]
    fn depth_sort_puts_near_items_last() {
        let cam = Camera::elev_azim(0.0, 0.0);
        let mut scene = ProjectedScene::new(cam);
        scene.segment([5.0, 0.0, 0.0], [5.0, 1.0, 0.0], RED, 1);
        scene.segment([-5.0, 0.0, 0.0], [-5.0, 1.0, 0.0], BLUE, 1);
        scene.sort_far_to_near();
        assert!(scene.items[0].depth < scene.items[1].depth);
        assert!((scene.items[1].depth - 5.0).abs() < 1e-12);
    }

    /// Even-odd point-in-polygon test in screen space.
    fn covers(poly: &[(f64, f64)], p: (f64, f64)) -> bool {
        let mut inside = false;
        for n in 0..poly.len() {
            let a = poly[n];
            let b = poly[(n + 1) % poly.len()];
            if (a.1 > p.1) != (b.1 > p.1) {
                let x = a.0 + (p.1 - a.1) * (b.0 - a.0) / (b.1 - a.1);
                if x > p.0 {
                    inside = !inside;
                }
            }
        }
        inside
    }

    #[test]
    fn line_in_front_of_lower_wall_is_not_painted_over() {
        let magnet = CylinderMagnet::new(30.0, 35.0, 1.115).unwrap();
        let cam = Camera::look_at([120.0, 120.0, 80.0], [0.0, 0.0, 0.0]);
        let mut scene = ProjectedScene::new(cam);
        add_magnet(&mut scene, &magnet, MagnetStyle::Plain);

        // Just outside the wall on the camera side, near the bottom face.
        let (c, s) = (45f64.to_radians().cos(), 45f64.to_radians().sin());
        let a = [16.0 * c, 16.0 * s, -12.5];
        let b = [16.0 * c, 16.0 * s, -11.5];
        scene.segment(a, b, RED, 3);
        scene.sort_far_to_near();

        let mid = scale(add(a, b), 0.5);
        let at = cam.project(mid);
        let pos = scene
            .items
            .iter()
            .position(|it| matches!(it.prim, Primitive::Segment { .. }))
            .unwrap();
        let covering = scene.items[pos + 1..]
            .iter()
            .filter(|it| match &it.prim {
                Primitive::Facet { pts, .. } => {
                    let poly: Vec<(f64, f64)> = pts.iter().map(|&p| cam.project(p)).collect();
                    covers(&poly, at)
                }
                Primitive::Segment { .. } => false,
            })
            .count();
        assert_eq!(covering, 0);
    }

    #[test]
    fn field_line_segments_inside_the_magnet_are_dropped() {
        let magnet = CylinderMagnet::new(30.0, 35.0, 1.115).unwrap();
        let line = StreamLine3D {
            points: vec![[0.0, 0.0, -5.0], [0.0, 0.0, 5.0], [0.0, 0.0, 20.0], [0.0, 0.0, 25.0]],
            magnitude: vec![0.8, 0.8, 0.4, 0.3],
        };
        let mut scene = ProjectedScene::new(Camera::elev_azim(0.0, 45.0));
        add_field_lines(&mut scene, &[line], &magnet, 0.3, 0.8);
        // The first segment is inside; the one crossing the face and the
        // outside one are kept.
        assert_eq!(scene.items.len(), 2);
    }

    #[test]
    fn wall_bands_split_the_height() {
        let mut scene = ProjectedScene::new(Camera::elev_azim(0.0, 0.0));
        scene.cylinder_side(10.0, -5.0, 5.0, 40, 10, RGBColor(128, 128, 128), 1.0);
        let top = scene
            .items
            .iter()
            .filter_map(|it| match &it.prim {
                Primitive::Facet { pts, .. } => Some(pts.iter().map(|p| p[2]).fold(f64::MIN, f64::max)),
                Primitive::Segment { .. } => None,
            })
            .fold(f64::MIN, f64::max);
        assert_eq!(top, 5.0);
        assert_eq!(scene.items.len() % 10, 0);
    }
}
