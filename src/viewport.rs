//! Map navigation: data-to-screen projection and view history
//!
//! A view is the data rectangle the user asked to see. Each frame it is fit
//! into the axes area with a uniform scale (y stretched by the scene aspect),
//! so the visible region may be wider or taller than the view itself.

use egui::{pos2, Pos2, Vec2};
use geo::{Coord, Rect};

/// Maps data coordinates to screen points for one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    screen_center: Pos2,
    data_center: Coord<f64>,
    /// Pixels per data unit along x and y
    sx: f64,
    sy: f64,
}

impl Projection {
    /// Fit `view` inside `screen`, centered, keeping the x/y ratio at `aspect`
    pub fn fit(view: Rect<f64>, screen: egui::Rect, aspect: f64) -> Self {
        let width = f64::from(screen.width()).max(1.0);
        let height = f64::from(screen.height()).max(1.0);
        let span_x = view.width().max(f64::EPSILON);
        let span_y = (view.height() * aspect).max(f64::EPSILON);
        let scale = (width / span_x).min(height / span_y);

        Self {
            screen_center: screen.center(),
            data_center: view.center(),
            sx: scale,
            sy: scale * aspect,
        }
    }

    pub fn to_screen(&self, c: Coord<f64>) -> Pos2 {
        pos2(
            self.screen_center.x + ((c.x - self.data_center.x) * self.sx) as f32,
            self.screen_center.y - ((c.y - self.data_center.y) * self.sy) as f32,
        )
    }

    pub fn to_data(&self, p: Pos2) -> Coord<f64> {
        Coord {
            x: self.data_center.x + f64::from(p.x - self.screen_center.x) / self.sx,
            y: self.data_center.y - f64::from(p.y - self.screen_center.y) / self.sy,
        }
    }

    /// Data rectangle covered by a screen rectangle
    pub fn visible(&self, screen: egui::Rect) -> Rect<f64> {
        Rect::new(self.to_data(screen.left_bottom()), self.to_data(screen.right_top()))
    }

    /// Shift `view` so the content follows a drag of `delta` pixels
    pub fn pan(&self, view: Rect<f64>, delta: Vec2) -> Rect<f64> {
        let dx = -f64::from(delta.x) / self.sx;
        let dy = f64::from(delta.y) / self.sy;
        Rect::new(
            Coord { x: view.min().x + dx, y: view.min().y + dy },
            Coord { x: view.max().x + dx, y: view.max().y + dy },
        )
    }

    /// Zoom `view` by `factor` (>1 zooms in) keeping the point under `pos` fixed
    pub fn zoom_at(&self, view: Rect<f64>, pos: Pos2, factor: f64) -> Rect<f64> {
        let focus = self.to_data(pos);
        let factor = if factor.is_finite() && factor > 0.0 { factor } else { 1.0 };
        let scale = |v: f64, f: f64| f + (v - f) / factor;
        Rect::new(
            Coord { x: scale(view.min().x, focus.x), y: scale(view.min().y, focus.y) },
            Coord { x: scale(view.max().x, focus.x), y: scale(view.max().y, focus.y) },
        )
    }

    /// View spanning the rectangle dragged between two screen points
    pub fn zoom_to(&self, a: Pos2, b: Pos2) -> Rect<f64> {
        Rect::new(self.to_data(a), self.to_data(b))
    }
}

/// View history with home, back and forward
#[derive(Debug, Clone)]
pub struct Navigator {
    home: Rect<f64>,
    history: Vec<Rect<f64>>,
    position: usize,
}

impl Navigator {
    pub fn new(home: Rect<f64>) -> Self {
        Self {
            home,
            history: vec![home],
            position: 0,
        }
    }

    pub fn current(&self) -> Rect<f64> {
        self.history[self.position]
    }

    /// Record a new view, dropping anything ahead of the current one
    pub fn push(&mut self, view: Rect<f64>) {
        self.history.truncate(self.position + 1);
        self.history.push(view);
        self.position += 1;
    }

    /// Start an interactive change; later `update` calls refine the new entry
    pub fn begin(&mut self) {
        self.push(self.current());
    }

    /// Replace the current view without adding history
    pub fn update(&mut self, view: Rect<f64>) {
        self.history[self.position] = view;
    }

    pub fn home(&mut self) {
        if self.current() != self.home {
            self.push(self.home);
        }
    }

    pub fn can_back(&self) -> bool {
        self.position > 0
    }

    pub fn can_forward(&self) -> bool {
        self.position + 1 < self.history.len()
    }

    pub fn back(&mut self) {
        if self.can_back() {
            self.position -= 1;
        }
    }

    pub fn forward(&mut self) {
        if self.can_forward() {
            self.position += 1;
        }
    }
}
