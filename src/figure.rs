//! Figure layout and drawing
//!
//! [`draw_figure`] lays out the axes, map, grid, labels and legend bar and
//! emits them through a [`Canvas`]. The viewer implements `Canvas` on top of
//! an egui painter and the exporter implements it as SVG, so both produce the
//! same picture.

use egui::{pos2, vec2, Align2, Color32, Pos2, Rect, Stroke};

use crate::axes;
use crate::color_scale;
use crate::labels::{Placement, StateLabel};
use crate::scene::{Legend, MapScene};
use crate::viewport::Projection;

pub const FIGURE_BACKGROUND: Color32 = Color32::WHITE;
pub const AXES_FACE: Color32 = Color32::from_rgb(0xe9, 0xf0, 0xf7);

const FILL_EDGE: Color32 = Color32::from_rgb(0x55, 0x55, 0x55);
const FILL_EDGE_WIDTH: f32 = 0.6;
const BOUNDARY: Color32 = Color32::GRAY;
const BOUNDARY_WIDTH: f32 = 1.2;
const GRID: Color32 = Color32::from_rgb(0xb0, 0xb0, 0xb0);
const GRID_WIDTH: f32 = 0.8;
const LEADER_WIDTH: f32 = 0.5;
const LABEL_HALO_WIDTH: f32 = 1.5;

const TICK_LENGTH: f32 = 4.0;
const TICK_FONT_SIZE: f32 = 10.0;
const MAX_AXIS_TICKS: usize = 8;

/// Legend bar width as a fraction of the figure width
pub const LEGEND_SHRINK: f32 = 0.3;
/// Legend bar width to height ratio
pub const LEGEND_ASPECT: f32 = 30.0;
const LEGEND_SEGMENTS: usize = 64;
const MAX_LEGEND_TICKS: usize = 6;

const LINE_SPACING: f32 = 1.2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub size: f32,
    pub color: Color32,
    pub bold: bool,
    /// Outline drawn behind the glyphs
    pub halo: Option<(Color32, f32)>,
}

impl TextStyle {
    pub fn plain(size: f32) -> Self {
        Self {
            size,
            color: Color32::BLACK,
            bold: false,
            halo: None,
        }
    }
}

/// Drawing surface in screen coordinates
pub trait Canvas {
    fn fill_rect(&mut self, rect: Rect, color: Color32);
    fn stroke_rect(&mut self, rect: Rect, stroke: Stroke);
    /// Fill a polygon given both as rings and as a triangulation; surfaces use
    /// whichever they can draw
    fn fill_region(&mut self, rings: &[Vec<Pos2>], triangles: &[[Pos2; 3]], color: Color32);
    fn polyline(&mut self, points: &[Pos2], closed: bool, stroke: Stroke);
    /// Single line of text anchored at `pos`
    fn text(&mut self, pos: Pos2, anchor: Align2, text: &str, style: TextStyle);
    /// Restrict subsequent drawing to `rect`, or lift the restriction
    fn clip(&mut self, rect: Option<Rect>);
}

/// Screen areas of the figure parts
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FigureLayout {
    pub figure: Rect,
    pub axes: Rect,
    pub colorbar: Rect,
}

impl FigureLayout {
    pub fn new(figure: Rect) -> Self {
        let bar_width = figure.width() * LEGEND_SHRINK;
        let bar_height = (bar_width / LEGEND_ASPECT).max(6.0);
        // Tick labels under the axes, then the bar, its ticks and its title
        let tick_band = TICK_LENGTH + TICK_FONT_SIZE * LINE_SPACING + 4.0;
        let legend_band = bar_height + 2.0 * tick_band + 8.0;

        let axes = Rect::from_min_max(
            pos2(figure.left() + 56.0, figure.top() + 16.0),
            pos2(
                figure.right() - 24.0,
                (figure.bottom() - tick_band - legend_band).max(figure.top() + 32.0),
            ),
        );
        let colorbar = Rect::from_center_size(
            pos2(axes.center().x, axes.bottom() + tick_band + 8.0 + bar_height / 2.0),
            vec2(bar_width, bar_height),
        );

        Self {
            figure,
            axes,
            colorbar,
        }
    }
}

/// Draw the whole figure for the given view
pub fn draw_figure(scene: &MapScene, layout: &FigureLayout, proj: &Projection, canvas: &mut dyn Canvas) {
    canvas.fill_rect(layout.figure, FIGURE_BACKGROUND);
    canvas.fill_rect(layout.axes, AXES_FACE);

    canvas.clip(Some(layout.axes));
    draw_regions(scene, proj, canvas);
    draw_grid(layout, proj, canvas);
    canvas.clip(None);

    // Labels may spill past the axes, e.g. leader labels right of the coast
    for label in &scene.labels {
        draw_label(label, proj, canvas);
    }

    canvas.stroke_rect(layout.axes, Stroke::new(0.8, Color32::BLACK));
    draw_axis_ticks(layout, proj, canvas);
    if let Some(legend) = &scene.legend {
        draw_legend(legend, layout.colorbar, canvas);
    }
}

fn draw_regions(scene: &MapScene, proj: &Projection, canvas: &mut dyn Canvas) {
    let project_rings = |rings: &[Vec<geo::Coord<f64>>]| -> Vec<Vec<Pos2>> {
        rings
            .iter()
            .map(|ring| ring.iter().map(|c| proj.to_screen(*c)).collect())
            .collect()
    };

    // Fill layer with its own dark edge
    for region in &scene.regions {
        let Some(fill) = region.fill else {
            continue;
        };
        let rings = project_rings(&region.rings);
        let triangles: Vec<[Pos2; 3]> = region
            .triangles
            .iter()
            .map(|t| t.map(|c| proj.to_screen(c)))
            .collect();
        canvas.fill_region(&rings, &triangles, fill);
        for ring in &rings {
            canvas.polyline(ring, true, Stroke::new(FILL_EDGE_WIDTH, FILL_EDGE));
        }
    }

    // Boundary layer over every region, filled or not
    for region in &scene.regions {
        for ring in project_rings(&region.rings) {
            canvas.polyline(&ring, true, Stroke::new(BOUNDARY_WIDTH, BOUNDARY));
        }
    }
}

fn draw_grid(layout: &FigureLayout, proj: &Projection, canvas: &mut dyn Canvas) {
    let visible = proj.visible(layout.axes);
    let stroke = Stroke::new(GRID_WIDTH, GRID);

    for x in axes::ticks(visible.min().x, visible.max().x, MAX_AXIS_TICKS) {
        let px = proj.to_screen(geo::Coord { x, y: 0.0 }).x;
        canvas.polyline(&[pos2(px, layout.axes.top()), pos2(px, layout.axes.bottom())], false, stroke);
    }
    for y in axes::ticks(visible.min().y, visible.max().y, MAX_AXIS_TICKS) {
        let py = proj.to_screen(geo::Coord { x: 0.0, y }).y;
        canvas.polyline(&[pos2(layout.axes.left(), py), pos2(layout.axes.right(), py)], false, stroke);
    }
}

fn draw_axis_ticks(layout: &FigureLayout, proj: &Projection, canvas: &mut dyn Canvas) {
    let visible = proj.visible(layout.axes);
    let stroke = Stroke::new(0.8, Color32::BLACK);
    let style = TextStyle::plain(TICK_FONT_SIZE);

    let xs = axes::ticks(visible.min().x, visible.max().x, MAX_AXIS_TICKS);
    let x_step = axes::nice_step(visible.width(), MAX_AXIS_TICKS);
    for x in xs {
        let px = proj.to_screen(geo::Coord { x, y: 0.0 }).x;
        let bottom = layout.axes.bottom();
        canvas.polyline(&[pos2(px, bottom), pos2(px, bottom + TICK_LENGTH)], false, stroke);
        canvas.text(
            pos2(px, bottom + TICK_LENGTH + 2.0),
            Align2::CENTER_TOP,
            &axes::format_tick(x, x_step),
            style,
        );
    }

    let ys = axes::ticks(visible.min().y, visible.max().y, MAX_AXIS_TICKS);
    let y_step = axes::nice_step(visible.height(), MAX_AXIS_TICKS);
    for y in ys {
        let py = proj.to_screen(geo::Coord { x: 0.0, y }).y;
        let left = layout.axes.left();
        canvas.polyline(&[pos2(left - TICK_LENGTH, py), pos2(left, py)], false, stroke);
        canvas.text(
            pos2(left - TICK_LENGTH - 2.0, py),
            Align2::RIGHT_CENTER,
            &axes::format_tick(y, y_step),
            style,
        );
    }
}

fn draw_label(label: &StateLabel, proj: &Projection, canvas: &mut dyn Canvas) {
    let anchor = proj.to_screen(label.anchor);

    if let Some(leader) = label.leader {
        canvas.polyline(
            &[proj.to_screen(leader.start), proj.to_screen(leader.end)],
            false,
            Stroke::new(LEADER_WIDTH, Color32::BLACK),
        );
    }

    let style = TextStyle {
        size: label.font_size,
        color: Color32::BLACK,
        bold: true,
        halo: Some((Color32::WHITE, LABEL_HALO_WIDTH)),
    };
    let lines: Vec<&str> = label.lines().collect();
    let line_height = label.font_size * LINE_SPACING;
    let n = lines.len() as f32;

    for (i, line) in lines.iter().enumerate() {
        let i = i as f32;
        let (pos, align) = match label.placement {
            // Block centered on the centroid
            Placement::Centroid => (
                pos2(anchor.x, anchor.y + (i - (n - 1.0) / 2.0) * line_height),
                Align2::CENTER_CENTER,
            ),
            // Block sits on the leader line, starting at its end
            Placement::Leader => (
                pos2(anchor.x, anchor.y - (n - i - 0.5) * line_height),
                Align2::LEFT_CENTER,
            ),
        };
        canvas.text(pos, align, line, style);
    }
}

fn draw_legend(legend: &Legend, bar: Rect, canvas: &mut dyn Canvas) {
    let segment = bar.width() / LEGEND_SEGMENTS as f32;
    for i in 0..LEGEND_SEGMENTS {
        let t = (i as f64 + 0.5) / LEGEND_SEGMENTS as f64;
        let x = bar.left() + segment * i as f32;
        // Overlap by a pixel so no seams show between segments
        let rect = Rect::from_min_max(pos2(x, bar.top()), pos2(x + segment + 1.0, bar.bottom()))
            .intersect(bar);
        canvas.fill_rect(rect, color_scale::sample(t));
    }
    canvas.stroke_rect(bar, Stroke::new(0.8, Color32::BLACK));

    let scale = legend.scale;
    let step = axes::nice_step(scale.max - scale.min, MAX_LEGEND_TICKS);
    let stroke = Stroke::new(0.8, Color32::BLACK);
    let style = TextStyle::plain(TICK_FONT_SIZE);
    for value in scale.ticks(MAX_LEGEND_TICKS) {
        let x = bar.left() + bar.width() * scale.normalize(value) as f32;
        canvas.polyline(&[pos2(x, bar.bottom()), pos2(x, bar.bottom() + TICK_LENGTH)], false, stroke);
        canvas.text(
            pos2(x, bar.bottom() + TICK_LENGTH + 2.0),
            Align2::CENTER_TOP,
            &axes::format_tick(value, step),
            style,
        );
    }

    let title_y = bar.bottom() + TICK_LENGTH + TICK_FONT_SIZE * LINE_SPACING + 6.0;
    canvas.text(
        pos2(bar.center().x, title_y),
        Align2::CENTER_TOP,
        &legend.title,
        TextStyle::plain(TICK_FONT_SIZE + 1.0),
    );
}
