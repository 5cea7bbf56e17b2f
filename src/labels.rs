//! Per-state label text and placement
//!
//! Large states are labelled at their centroid. States smaller than
//! [`SMALL_STATE_AREA`] get their label pushed out to the right on a leader line.
//! Both thresholds are in the boundary file's native units (degrees for the
//! usual WGS84 GeoJSON) and would need retuning for a projected CRS.

use geo::{Area, BoundingRect, Centroid, Coord, Line};

use crate::models::MergedRow;

/// Polygons below this area get a leader line
pub const SMALL_STATE_AREA: f64 = 1.0;
/// Distance from a polygon's right bound to its leader-lined label
pub const LEADER_OFFSET: f64 = 4.0;

pub const DEFAULT_FONT_SIZE: f32 = 10.0;
pub const REDUCED_FONT_SIZE: f32 = 8.0;
/// Small, crowded northeastern states that still label at their centroid
pub const REDUCED_FONT_STATES: [&str; 3] = ["MD", "CT", "MA"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Centered on the polygon centroid
    Centroid,
    /// Left-aligned at the end of a horizontal leader line, text above the line
    Leader,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StateLabel {
    pub text: String,
    pub anchor: Coord<f64>,
    pub placement: Placement,
    pub font_size: f32,
    pub leader: Option<Line<f64>>,
}

impl StateLabel {
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.text.lines()
    }
}

/// Count, share as a one-decimal percentage, and code, one per line
pub fn label_text(count: i64, share: f64, code: &str) -> String {
    format!("{}\n{:.1}%\n{}", count, share * 100.0, code)
}

/// Label for a merged row, or `None` when count or share is missing or the
/// geometry is empty
pub fn place_label(row: &MergedRow) -> Option<StateLabel> {
    let count = row.shipment_count?;
    let share = row.shipment_share?;
    let code = row.state_code.as_deref().unwrap_or_default();

    let centroid = row.geometry.centroid()?;
    let bounds = row.geometry.bounding_rect()?;
    let text = label_text(count, share, code);

    if row.geometry.unsigned_area() < SMALL_STATE_AREA {
        let anchor = Coord {
            x: bounds.max().x + LEADER_OFFSET,
            y: centroid.y(),
        };
        Some(StateLabel {
            text,
            anchor,
            placement: Placement::Leader,
            font_size: DEFAULT_FONT_SIZE,
            leader: Some(Line::new(centroid.0, anchor)),
        })
    } else {
        let font_size = if REDUCED_FONT_STATES.contains(&code) {
            REDUCED_FONT_SIZE
        } else {
            DEFAULT_FONT_SIZE
        };
        Some(StateLabel {
            text,
            anchor: centroid.0,
            placement: Placement::Centroid,
            font_size,
            leader: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{polygon, MultiPolygon};

    fn square_row(code: &str, x: f64, y: f64, side: f64) -> MergedRow {
        MergedRow {
            state_name: code.to_string(),
            geometry: MultiPolygon::new(vec![polygon![
                (x: x, y: y),
                (x: x + side, y: y),
                (x: x + side, y: y + side),
                (x: x, y: y + side),
            ]]),
            state_code: Some(code.to_string()),
            shipment_count: Some(5),
            shipment_share: Some(0.01),
        }
    }

    #[test]
    fn test_label_text() {
        assert_eq!(label_text(120, 0.25, "CA"), "120\n25.0%\nCA");
        assert_eq!(label_text(5, 0.01, "RI"), "5\n1.0%\nRI");
        assert_eq!(label_text(7, 0.1234, "TX"), "7\n12.3%\nTX");
    }

    #[test]
    fn test_large_state_at_centroid() {
        let row = square_row("CO", -108.0, 37.0, 4.0);
        let label = place_label(&row).unwrap();
        assert_eq!(label.placement, Placement::Centroid);
        assert!((label.anchor.x - (-106.0)).abs() < 1e-9);
        assert!((label.anchor.y - 39.0).abs() < 1e-9);
        assert_eq!(label.font_size, DEFAULT_FONT_SIZE);
        assert!(label.leader.is_none());
    }

    #[test]
    fn test_small_state_gets_leader_line() {
        let row = square_row("RI", -71.8, 41.2, 0.6);
        let label = place_label(&row).unwrap();
        assert_eq!(label.placement, Placement::Leader);
        assert!((label.anchor.x - (-71.2 + LEADER_OFFSET)).abs() < 1e-9);
        assert!((label.anchor.y - 41.5).abs() < 1e-9);

        let leader = label.leader.unwrap();
        assert!((leader.start.x - (-71.5)).abs() < 1e-9);
        assert_eq!(leader.start.y, leader.end.y);
        assert_eq!(leader.end, label.anchor);
        assert_eq!(label.text, "5\n1.0%\nRI");
    }

    #[test]
    fn test_reduced_font_only_for_centroid_labels() {
        let big_md = place_label(&square_row("MD", -79.0, 38.0, 1.5)).unwrap();
        assert_eq!(big_md.placement, Placement::Centroid);
        assert_eq!(big_md.font_size, REDUCED_FONT_SIZE);

        let small_ct = place_label(&square_row("CT", -73.7, 41.0, 0.9)).unwrap();
        assert_eq!(small_ct.placement, Placement::Leader);
        assert_eq!(small_ct.font_size, DEFAULT_FONT_SIZE);

        let big_ny = place_label(&square_row("NY", -79.0, 42.0, 3.0)).unwrap();
        assert_eq!(big_ny.font_size, DEFAULT_FONT_SIZE);
    }

    #[test]
    fn test_area_threshold_is_exclusive() {
        let label = place_label(&square_row("VT", 0.0, 0.0, 1.0)).unwrap();
        assert_eq!(label.placement, Placement::Centroid);
    }

    #[test]
    fn test_missing_fields_skip_label() {
        let mut row = square_row("OH", -84.0, 39.0, 3.0);
        row.shipment_share = None;
        assert!(place_label(&row).is_none());

        let mut row = square_row("OH", -84.0, 39.0, 3.0);
        row.shipment_count = None;
        assert!(place_label(&row).is_none());
    }

    #[test]
    fn test_empty_geometry_skips_label() {
        let mut row = square_row("OH", 0.0, 0.0, 1.0);
        row.geometry = MultiPolygon::new(vec![]);
        assert!(place_label(&row).is_none());
    }
}
