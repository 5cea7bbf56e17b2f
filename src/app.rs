//! Desktop viewer: the map figure with a navigation toolbar underneath
//!
//! The window runs until the user closes it. All state lives in [`MapApp`]
//! and is touched only from the UI thread.

use anyhow::Result;
use egui::epaint::Mesh;
use egui::{vec2, Align2, Color32, CursorIcon, FontId, Painter, Pos2, Rect, Sense, Shape, Stroke};
use geo::Coord;
use image::ImageFormat;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::export::{self, ExportFormat};
use crate::figure::{draw_figure, Canvas, FigureLayout, TextStyle, FIGURE_BACKGROUND};
use crate::scene::MapScene;
use crate::viewport::{Navigator, Projection};

pub const WINDOW_TITLE: &str = "US Shipment Distribution by State";
pub const DEFAULT_SAVE_PATH: &str = "shipment_map.png";

/// Zoom factor per scrolled point
const SCROLL_ZOOM_RATE: f64 = 0.0015;
/// Smallest zoom box side, in points, that counts as a zoom
const MIN_ZOOM_BOX: f32 = 5.0;
/// Halo directions around label glyphs
const HALO_OFFSETS: [(f32, f32); 8] = [
    (-1.0, -1.0),
    (0.0, -1.0),
    (1.0, -1.0),
    (-1.0, 0.0),
    (1.0, 0.0),
    (-1.0, 1.0),
    (0.0, 1.0),
    (1.0, 1.0),
];
/// Horizontal double-strike distance used to fake bold glyphs
const BOLD_OFFSET: f32 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tool {
    None,
    Pan,
    Zoom,
}

impl Tool {
    /// Clicking the active tool's button turns it off
    fn toggled(self, tool: Tool) -> Tool {
        if self == tool {
            Tool::None
        } else {
            tool
        }
    }
}

/// A raster save waiting for the next screenshot
struct PendingCapture {
    path: PathBuf,
    format: ImageFormat,
    region: Rect,
}

pub struct MapApp {
    scene: MapScene,
    navigator: Navigator,
    tool: Tool,
    save_path: String,
    status: String,
    cursor: Option<Coord<f64>>,
    zoom_box: Option<(Pos2, Pos2)>,
    figure_rect: Rect,
    capture: Option<PendingCapture>,
}

impl MapApp {
    pub fn new(scene: MapScene) -> Self {
        let navigator = Navigator::new(scene.home);
        Self {
            scene,
            navigator,
            tool: Tool::None,
            save_path: DEFAULT_SAVE_PATH.to_string(),
            status: String::new(),
            cursor: None,
            zoom_box: None,
            figure_rect: Rect::NOTHING,
            capture: None,
        }
    }

    fn toolbar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            if ui.button("Home").on_hover_text("Reset original view").clicked() {
                self.navigator.home();
            }
            if ui
                .add_enabled(self.navigator.can_back(), egui::Button::new("Back"))
                .on_hover_text("Back to previous view")
                .clicked()
            {
                self.navigator.back();
            }
            if ui
                .add_enabled(self.navigator.can_forward(), egui::Button::new("Forward"))
                .on_hover_text("Forward to next view")
                .clicked()
            {
                self.navigator.forward();
            }

            ui.separator();
            if ui
                .selectable_label(self.tool == Tool::Pan, "Pan")
                .on_hover_text("Drag to move the map; scroll to zoom")
                .clicked()
            {
                self.tool = self.tool.toggled(Tool::Pan);
            }
            if ui
                .selectable_label(self.tool == Tool::Zoom, "Zoom")
                .on_hover_text("Drag a rectangle to zoom into it")
                .clicked()
            {
                self.tool = self.tool.toggled(Tool::Zoom);
            }

            ui.separator();
            ui.add(egui::TextEdit::singleline(&mut self.save_path).desired_width(220.0))
                .on_hover_text("Output file; the extension picks the format");
            if ui.button("Save").on_hover_text("Save the figure").clicked() {
                self.save(ui.ctx());
            }

            ui.separator();
            match self.cursor {
                Some(c) => ui.monospace(format!("x={:.3}  y={:.3}", c.x, c.y)),
                None => ui.monospace(""),
            };
            ui.label(&self.status);
        });
    }

    fn figure(&mut self, ui: &mut egui::Ui) {
        let (response, painter) = ui.allocate_painter(ui.available_size(), Sense::click_and_drag());
        self.figure_rect = response.rect;
        let layout = FigureLayout::new(response.rect);

        let before = Projection::fit(self.navigator.current(), layout.axes, self.scene.aspect);
        self.handle_input(ui, &response, &layout, &before);

        let proj = Projection::fit(self.navigator.current(), layout.axes, self.scene.aspect);
        let mut canvas = PainterCanvas::new(painter.clone());
        draw_figure(&self.scene, &layout, &proj, &mut canvas);

        if let Some((a, b)) = self.zoom_box {
            painter.rect_stroke(Rect::from_two_pos(a, b), 0.0, Stroke::new(1.0, Color32::BLACK));
        }
    }

    fn handle_input(
        &mut self,
        ui: &egui::Ui,
        response: &egui::Response,
        layout: &FigureLayout,
        proj: &Projection,
    ) {
        let hover = response.hover_pos().filter(|p| layout.axes.contains(*p));
        self.cursor = hover.map(|p| proj.to_data(p));

        match self.tool {
            Tool::Pan => {
                if hover.is_some() {
                    ui.ctx().set_cursor_icon(CursorIcon::Grab);
                }
                if response.drag_started() {
                    self.navigator.begin();
                }
                if response.dragged() {
                    let view = proj.pan(self.navigator.current(), response.drag_delta());
                    self.navigator.update(view);
                }
            }
            Tool::Zoom => {
                if hover.is_some() {
                    ui.ctx().set_cursor_icon(CursorIcon::Crosshair);
                }
                if response.drag_started() {
                    self.zoom_box = response
                        .interact_pointer_pos()
                        .filter(|p| layout.axes.contains(*p))
                        .map(|p| (p, p));
                }
                if response.dragged() {
                    if let (Some(zoom_box), Some(p)) = (self.zoom_box.as_mut(), response.interact_pointer_pos()) {
                        zoom_box.1 = layout.axes.clamp(p);
                    }
                }
                if response.drag_stopped() {
                    if let Some((a, b)) = self.zoom_box.take() {
                        if (a.x - b.x).abs() > MIN_ZOOM_BOX && (a.y - b.y).abs() > MIN_ZOOM_BOX {
                            self.navigator.push(proj.zoom_to(a, b));
                        }
                    }
                }
            }
            Tool::None => {}
        }

        if let Some(pos) = hover {
            let (scroll, pinch) = ui.input(|i| (i.smooth_scroll_delta.y, i.zoom_delta()));
            let factor = (f64::from(scroll) * SCROLL_ZOOM_RATE).exp() * f64::from(pinch);
            if (factor - 1.0).abs() > f64::EPSILON {
                let view = proj.zoom_at(self.navigator.current(), pos, factor);
                self.navigator.update(view);
            }
        }
    }

    fn save(&mut self, ctx: &egui::Context) {
        let path = PathBuf::from(self.save_path.trim());
        match ExportFormat::from_path(&path) {
            Ok(ExportFormat::Svg) => {
                let result = export::save_svg(
                    &path,
                    &self.scene,
                    self.navigator.current(),
                    self.figure_rect.size(),
                );
                self.report_save(&path, result);
            }
            Ok(ExportFormat::Raster(format)) => {
                self.capture = Some(PendingCapture {
                    path,
                    format,
                    region: self.figure_rect,
                });
                self.status = "Saving...".to_string();
                ctx.send_viewport_cmd(egui::ViewportCommand::Screenshot);
            }
            Err(e) => self.report_save(&path, Err(e)),
        }
    }

    /// Finish a raster save once the requested screenshot arrives
    fn collect_screenshot(&mut self, ctx: &egui::Context) {
        let shot = ctx.input(|i| {
            i.raw.events.iter().find_map(|e| match e {
                egui::Event::Screenshot { image, .. } => Some(image.clone()),
                _ => None,
            })
        });
        let Some(image) = shot else {
            return;
        };
        let Some(capture) = self.capture.take() else {
            return;
        };

        let cropped = image.region(&capture.region, Some(ctx.pixels_per_point()));
        let result = export::save_raster(&capture.path, &cropped, capture.format);
        self.report_save(&capture.path, result);
    }

    fn report_save(&mut self, path: &Path, result: Result<()>) {
        self.status = match result {
            Ok(()) => {
                info!("Saved view to {}", path.display());
                format!("Saved {}", path.display())
            }
            Err(e) => {
                warn!("Save failed: {:#}", e);
                format!("Save failed: {:#}", e)
            }
        };
    }
}

impl eframe::App for MapApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.collect_screenshot(ctx);

        egui::TopBottomPanel::bottom("toolbar").show(ctx, |ui| self.toolbar(ui));
        egui::CentralPanel::default()
            .frame(egui::Frame::none().fill(FIGURE_BACKGROUND))
            .show(ctx, |ui| self.figure(ui));
    }
}

/// Canvas backed by an egui painter
struct PainterCanvas {
    base: Painter,
    painter: Painter,
}

impl PainterCanvas {
    fn new(painter: Painter) -> Self {
        Self {
            base: painter.clone(),
            painter,
        }
    }
}

impl Canvas for PainterCanvas {
    fn fill_rect(&mut self, rect: Rect, color: Color32) {
        self.painter.rect_filled(rect, 0.0, color);
    }

    fn stroke_rect(&mut self, rect: Rect, stroke: Stroke) {
        self.painter.rect_stroke(rect, 0.0, stroke);
    }

    fn fill_region(&mut self, _rings: &[Vec<Pos2>], triangles: &[[Pos2; 3]], color: Color32) {
        let mut mesh = Mesh::default();
        for triangle in triangles {
            let base = mesh.vertices.len() as u32;
            for p in triangle {
                mesh.colored_vertex(*p, color);
            }
            mesh.add_triangle(base, base + 1, base + 2);
        }
        self.painter.add(Shape::mesh(mesh));
    }

    fn polyline(&mut self, points: &[Pos2], closed: bool, stroke: Stroke) {
        if points.len() < 2 {
            return;
        }
        let shape = if closed {
            Shape::closed_line(points.to_vec(), stroke)
        } else {
            Shape::line(points.to_vec(), stroke)
        };
        self.painter.add(shape);
    }

    fn text(&mut self, pos: Pos2, anchor: Align2, text: &str, style: TextStyle) {
        let font = FontId::proportional(style.size);
        if let Some((halo, width)) = style.halo {
            for (dx, dy) in HALO_OFFSETS {
                self.painter
                    .text(pos + vec2(dx, dy) * width, anchor, text, font.clone(), halo);
            }
        }
        self.painter.text(pos, anchor, text, font.clone(), style.color);
        if style.bold {
            self.painter
                .text(pos + vec2(BOLD_OFFSET, 0.0), anchor, text, font, style.color);
        }
    }

    fn clip(&mut self, rect: Option<Rect>) {
        self.painter = match rect {
            Some(rect) => self.base.with_clip_rect(rect),
            None => self.base.clone(),
        };
    }
}
