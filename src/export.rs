//! Saving the current view to a file
//!
//! `.svg` is rendered as vector graphics through the same [`draw_figure`]
//! code the viewer uses. Raster formats are written from a screenshot of the
//! viewer window, cropped to the figure.

use anyhow::{bail, Context, Result};
use egui::{Align, Align2, Color32, ColorImage, Pos2, Rect, Stroke, Vec2};
use image::ImageFormat;
use std::path::Path;
use tracing::info;

use crate::figure::{draw_figure, Canvas, FigureLayout, TextStyle};
use crate::scene::MapScene;
use crate::viewport::Projection;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Svg,
    Raster(ImageFormat),
}

impl ExportFormat {
    /// Pick the format from the file extension
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .with_context(|| format!("{} has no file extension", path.display()))?;

        if extension == "svg" {
            return Ok(ExportFormat::Svg);
        }
        match ImageFormat::from_extension(&extension) {
            Some(format @ (ImageFormat::Png | ImageFormat::Jpeg | ImageFormat::Bmp | ImageFormat::Tiff)) => {
                Ok(ExportFormat::Raster(format))
            }
            _ => bail!("unsupported export format {:?} (use svg, png, jpg, bmp or tiff)", extension),
        }
    }
}

// ============================================================================
// SVG
// ============================================================================

/// Canvas that accumulates SVG elements
#[derive(Debug, Default)]
pub struct SvgCanvas {
    body: String,
    clip_ids: usize,
    clip_open: bool,
}

impl SvgCanvas {
    pub fn finish(mut self, size: Vec2) -> String {
        self.close_clip();
        format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\" font-family=\"sans-serif\">\n{}</svg>\n",
            self.body,
            w = size.x,
            h = size.y,
        )
    }

    fn close_clip(&mut self) {
        if self.clip_open {
            self.body.push_str("</g>\n");
            self.clip_open = false;
        }
    }
}

fn svg_color(c: Color32) -> String {
    format!("#{:02x}{:02x}{:02x}", c.r(), c.g(), c.b())
}

fn svg_opacity(attr: &str, c: Color32) -> String {
    if c.a() == 255 {
        String::new()
    } else {
        format!(" {}=\"{:.3}\"", attr, f32::from(c.a()) / 255.0)
    }
}

fn svg_points(points: &[Pos2]) -> String {
    points
        .iter()
        .map(|p| format!("{:.2},{:.2}", p.x, p.y))
        .collect::<Vec<_>>()
        .join(" ")
}

fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

impl Canvas for SvgCanvas {
    fn fill_rect(&mut self, rect: Rect, color: Color32) {
        self.body.push_str(&format!(
            "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" fill=\"{}\"{}/>\n",
            rect.left(),
            rect.top(),
            rect.width(),
            rect.height(),
            svg_color(color),
            svg_opacity("fill-opacity", color),
        ));
    }

    fn stroke_rect(&mut self, rect: Rect, stroke: Stroke) {
        self.body.push_str(&format!(
            "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" fill=\"none\" stroke=\"{}\" stroke-width=\"{}\"/>\n",
            rect.left(),
            rect.top(),
            rect.width(),
            rect.height(),
            svg_color(stroke.color),
            stroke.width,
        ));
    }

    fn fill_region(&mut self, rings: &[Vec<Pos2>], _triangles: &[[Pos2; 3]], color: Color32) {
        let d: String = rings
            .iter()
            .filter(|ring| !ring.is_empty())
            .map(|ring| format!("M{}Z", svg_points(ring).replace(' ', " L")))
            .collect();
        self.body.push_str(&format!(
            "<path d=\"{}\" fill=\"{}\" fill-rule=\"evenodd\" stroke=\"none\"/>\n",
            d,
            svg_color(color)
        ));
    }

    fn polyline(&mut self, points: &[Pos2], closed: bool, stroke: Stroke) {
        if points.len() < 2 {
            return;
        }
        let element = if closed { "polygon" } else { "polyline" };
        self.body.push_str(&format!(
            "<{} points=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"{}\"{}/>\n",
            element,
            svg_points(points),
            svg_color(stroke.color),
            stroke.width,
            svg_opacity("stroke-opacity", stroke.color),
        ));
    }

    fn text(&mut self, pos: Pos2, anchor: Align2, text: &str, style: TextStyle) {
        let text_anchor = match anchor.x() {
            Align::Min => "start",
            Align::Center => "middle",
            Align::Max => "end",
        };
        let baseline = match anchor.y() {
            Align::Min => "text-before-edge",
            Align::Center => "central",
            Align::Max => "text-after-edge",
        };
        let weight = if style.bold { " font-weight=\"bold\"" } else { "" };
        let halo = match style.halo {
            Some((color, width)) => format!(
                " stroke=\"{}\" stroke-width=\"{}\" stroke-linejoin=\"round\" paint-order=\"stroke\"",
                svg_color(color),
                width
            ),
            None => String::new(),
        };
        self.body.push_str(&format!(
            "<text x=\"{:.2}\" y=\"{:.2}\" font-size=\"{}\" text-anchor=\"{}\" dominant-baseline=\"{}\" fill=\"{}\"{}{}>{}</text>\n",
            pos.x,
            pos.y,
            style.size,
            text_anchor,
            baseline,
            svg_color(style.color),
            weight,
            halo,
            escape_xml(text),
        ));
    }

    fn clip(&mut self, rect: Option<Rect>) {
        self.close_clip();
        if let Some(rect) = rect {
            self.clip_ids += 1;
            self.body.push_str(&format!(
                "<clipPath id=\"clip{id}\"><rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\"/></clipPath>\n<g clip-path=\"url(#clip{id})\">\n",
                rect.left(),
                rect.top(),
                rect.width(),
                rect.height(),
                id = self.clip_ids,
            ));
            self.clip_open = true;
        }
    }
}

/// Render the scene for `view` as an SVG document of the given pixel size
pub fn render_svg(scene: &MapScene, view: geo::Rect<f64>, size: Vec2) -> String {
    let layout = FigureLayout::new(Rect::from_min_size(Pos2::ZERO, size));
    let proj = Projection::fit(view, layout.axes, scene.aspect);
    let mut canvas = SvgCanvas::default();
    draw_figure(scene, &layout, &proj, &mut canvas);
    canvas.finish(size)
}

pub fn save_svg(path: &Path, scene: &MapScene, view: geo::Rect<f64>, size: Vec2) -> Result<()> {
    std::fs::write(path, render_svg(scene, view, size))
        .with_context(|| format!("failed to write {}", path.display()))?;
    info!("Saved SVG view to {}", path.display());
    Ok(())
}

// ============================================================================
// Raster
// ============================================================================

/// Write a captured image. Alpha is dropped since JPEG cannot store it.
pub fn save_raster(path: &Path, capture: &ColorImage, format: ImageFormat) -> Result<()> {
    let [width, height] = capture.size;
    let buffer = image::RgbaImage::from_raw(width as u32, height as u32, capture.as_raw().to_vec())
        .context("captured image has an unexpected buffer size")?;
    image::DynamicImage::ImageRgba8(buffer)
        .to_rgb8()
        .save_with_format(path, format)
        .with_context(|| format!("failed to write {}", path.display()))?;
    info!("Saved {}x{} {:?} view to {}", width, height, format, path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MergedRow;
    use egui::{pos2, vec2};
    use geo::{polygon, MultiPolygon};
    use std::path::PathBuf;

    fn scene() -> MapScene {
        let row = |name: &str, code: Option<&str>, x: f64, count: Option<i64>| MergedRow {
            state_name: name.to_string(),
            geometry: MultiPolygon::new(vec![polygon![
                (x: x, y: 35.0),
                (x: x + 4.0, y: 35.0),
                (x: x + 4.0, y: 39.0),
                (x: x, y: 39.0),
            ]]),
            state_code: code.map(str::to_string),
            shipment_count: count,
            shipment_share: count.map(|_| 0.25),
        };
        MapScene::build(&[
            row("California", Some("CA"), -122.0, Some(120)),
            row("Wyoming", None, -110.0, None),
        ])
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(ExportFormat::from_path(Path::new("map.svg")).unwrap(), ExportFormat::Svg);
        assert_eq!(
            ExportFormat::from_path(Path::new("out/map.PNG")).unwrap(),
            ExportFormat::Raster(ImageFormat::Png)
        );
        assert_eq!(
            ExportFormat::from_path(Path::new("map.jpg")).unwrap(),
            ExportFormat::Raster(ImageFormat::Jpeg)
        );
        assert!(ExportFormat::from_path(Path::new("map.gif")).is_err());
        assert!(ExportFormat::from_path(Path::new("map")).is_err());
    }

    #[test]
    fn test_svg_contains_map_parts() {
        let scene = scene();
        let svg = render_svg(&scene, scene.home, vec2(1000.0, 600.0));
        assert!(svg.starts_with("<svg"));
        assert!(svg.trim_end().ends_with("</svg>"));
        assert!(svg.contains(">120</text>"));
        assert!(svg.contains(">25.0%</text>"));
        assert!(svg.contains(">CA</text>"));
        assert!(svg.contains("font-weight=\"bold\""));
        assert!(svg.contains(crate::scene::LEGEND_TITLE));
        // One filled path for California; Wyoming is outline only
        assert_eq!(svg.matches("<path ").count(), 1);
        assert_eq!(svg.matches("<clipPath").count(), 1);
        assert_eq!(svg.matches("<g ").count(), svg.matches("</g>").count());
    }

    #[test]
    fn test_svg_escapes_text() {
        let mut canvas = SvgCanvas::default();
        canvas.text(pos2(1.0, 2.0), Align2::LEFT_TOP, "a<b & c", TextStyle::plain(10.0));
        let svg = canvas.finish(vec2(10.0, 10.0));
        assert!(svg.contains(">a&lt;b &amp; c</text>"));
    }

    #[test]
    fn test_save_svg_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path: PathBuf = dir.path().join("view.svg");
        let scene = scene();
        save_svg(&path, &scene, scene.home, vec2(800.0, 500.0)).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("<svg"));
    }

    #[test]
    fn test_save_raster_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("view.png");
        let capture = ColorImage::new([4, 3], Color32::from_rgb(10, 20, 30));
        save_raster(&path, &capture, ImageFormat::Png).unwrap();
        let decoded = image::open(&path).unwrap().to_rgb8();
        assert_eq!(decoded.dimensions(), (4, 3));
        assert_eq!(decoded.get_pixel(0, 0).0, [10, 20, 30]);
    }
}
