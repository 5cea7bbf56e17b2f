//! Sequential color scale for shipment counts

use egui::Color32;

use crate::axes;

/// ColorBrewer YlGnBu, 9 classes, light to dark
const YL_GN_BU: [[u8; 3]; 9] = [
    [255, 255, 217],
    [237, 248, 177],
    [199, 233, 180],
    [127, 205, 187],
    [65, 182, 196],
    [29, 145, 192],
    [34, 94, 168],
    [37, 52, 148],
    [8, 29, 88],
];

/// Sample the palette at `t` in `[0, 1]`, interpolating between stops
pub fn sample(t: f64) -> Color32 {
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
    let scaled = t * (YL_GN_BU.len() - 1) as f64;
    let lower = (scaled.floor() as usize).min(YL_GN_BU.len() - 2);
    let frac = scaled - lower as f64;

    let (a, b) = (YL_GN_BU[lower], YL_GN_BU[lower + 1]);
    let mix = |i: usize| (a[i] as f64 + (b[i] as f64 - a[i] as f64) * frac).round() as u8;
    Color32::from_rgb(mix(0), mix(1), mix(2))
}

/// Linear map from the data range onto the palette
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorScale {
    pub min: f64,
    pub max: f64,
}

impl ColorScale {
    /// Scale spanning the finite values, or `None` when there are none
    pub fn from_values(values: impl IntoIterator<Item = f64>) -> Option<Self> {
        values
            .into_iter()
            .filter(|v| v.is_finite())
            .fold(None, |acc: Option<Self>, v| {
                Some(match acc {
                    Some(s) => Self { min: s.min.min(v), max: s.max.max(v) },
                    None => Self { min: v, max: v },
                })
            })
    }

    /// Position of `value` in `[0, 1]`. A flat range maps everything to 0.
    pub fn normalize(&self, value: f64) -> f64 {
        let span = self.max - self.min;
        if span <= 0.0 {
            return 0.0;
        }
        ((value - self.min) / span).clamp(0.0, 1.0)
    }

    pub fn color(&self, value: f64) -> Color32 {
        sample(self.normalize(value))
    }

    /// Tick values for the legend bar
    pub fn ticks(&self, max_ticks: usize) -> Vec<f64> {
        axes::ticks(self.min, self.max, max_ticks)
    }
}
