//! Everything needed to draw the map, in data coordinates
//!
//! The scene is built once from the merged rows and then drawn every frame
//! by the viewer, or once by the SVG exporter.

use egui::Color32;
use geo::{BoundingRect, Coord, MultiPolygon, Rect, TriangulateEarcut};

use crate::color_scale::ColorScale;
use crate::labels::{place_label, StateLabel};
use crate::models::MergedRow;

pub const LEGEND_TITLE: &str = "Shipments by state";

/// Fractional padding added around the data bounds for the home view
const HOME_MARGIN: f64 = 0.05;

/// One state's fill and outline
#[derive(Debug, Clone)]
pub struct Region {
    pub name: String,
    /// Exterior and interior rings of every polygon
    pub rings: Vec<Vec<Coord<f64>>>,
    /// Fill triangulation; empty when the region is unfilled
    pub triangles: Vec<[Coord<f64>; 3]>,
    /// `None` means no shipment count, drawn as an unfilled outline
    pub fill: Option<Color32>,
}

impl Region {
    fn new(name: &str, geometry: &MultiPolygon<f64>, fill: Option<Color32>) -> Self {
        let rings: Vec<Vec<Coord<f64>>> = geometry
            .iter()
            .flat_map(|polygon| std::iter::once(polygon.exterior()).chain(polygon.interiors()))
            .map(|ring| ring.coords().copied().collect())
            .collect();

        let triangles: Vec<[Coord<f64>; 3]> = if fill.is_some() {
            geometry
                .iter()
                .flat_map(|polygon| polygon.earcut_triangles())
                .map(|t| t.to_array())
                .collect()
        } else {
            Vec::new()
        };

        Self {
            name: name.to_string(),
            rings,
            triangles,
            fill,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Legend {
    pub title: String,
    pub scale: ColorScale,
}

#[derive(Debug, Clone)]
pub struct MapScene {
    pub regions: Vec<Region>,
    pub labels: Vec<StateLabel>,
    pub legend: Option<Legend>,
    /// Padded data bounds, used as the home view
    pub home: Rect<f64>,
    /// Vertical stretch applied to y so geographic maps keep their shape
    pub aspect: f64,
}

impl MapScene {
    pub fn build(rows: &[MergedRow]) -> Self {
        let scale = ColorScale::from_values(rows.iter().filter_map(|r| r.shipment_count).map(|c| c as f64));

        let regions = rows
            .iter()
            .map(|row| {
                let fill = match (scale, row.shipment_count) {
                    (Some(scale), Some(count)) => Some(scale.color(count as f64)),
                    _ => None,
                };
                Region::new(&row.state_name, &row.geometry, fill)
            })
            .collect();

        let labels = rows.iter().filter_map(place_label).collect();

        let bounds = rows
            .iter()
            .filter_map(|r| r.geometry.bounding_rect())
            .reduce(union)
            .unwrap_or_else(|| Rect::new(Coord { x: 0.0, y: 0.0 }, Coord { x: 1.0, y: 1.0 }));

        Self {
            regions,
            labels,
            legend: scale.map(|scale| Legend {
                title: LEGEND_TITLE.to_string(),
                scale,
            }),
            home: pad(bounds, HOME_MARGIN),
            aspect: geographic_aspect(bounds),
        }
    }
}

fn union(a: Rect<f64>, b: Rect<f64>) -> Rect<f64> {
    Rect::new(
        Coord {
            x: a.min().x.min(b.min().x),
            y: a.min().y.min(b.min().y),
        },
        Coord {
            x: a.max().x.max(b.max().x),
            y: a.max().y.max(b.max().y),
        },
    )
}

fn pad(rect: Rect<f64>, margin: f64) -> Rect<f64> {
    let dx = (rect.width() * margin).max(f64::EPSILON);
    let dy = (rect.height() * margin).max(f64::EPSILON);
    Rect::new(
        Coord {
            x: rect.min().x - dx,
            y: rect.min().y - dy,
        },
        Coord {
            x: rect.max().x + dx,
            y: rect.max().y + dy,
        },
    )
}

/// `1 / cos(mean latitude)` when the bounds look like lon/lat degrees, else 1
pub fn geographic_aspect(bounds: Rect<f64>) -> f64 {
    let looks_geographic = bounds.min().x >= -180.0
        && bounds.max().x <= 180.0
        && bounds.min().y >= -90.0
        && bounds.max().y <= 90.0;
    if !looks_geographic {
        return 1.0;
    }
    let mid_lat = (bounds.min().y + bounds.max().y) / 2.0;
    let cos = mid_lat.to_radians().cos();
    if cos > 1e-6 {
        1.0 / cos
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;

    fn row(name: &str, x: f64, count: Option<i64>, share: Option<f64>) -> MergedRow {
        MergedRow {
            state_name: name.to_string(),
            geometry: MultiPolygon::new(vec![polygon![
                (x: x, y: 30.0),
                (x: x + 3.0, y: 30.0),
                (x: x + 3.0, y: 33.0),
                (x: x, y: 33.0),
            ]]),
            state_code: count.map(|_| name[..2].to_uppercase()),
            shipment_count: count,
            shipment_share: share,
        }
    }

    #[test]
    fn test_one_label_per_complete_row() {
        let rows = vec![
            row("Texas", -100.0, Some(50), Some(0.5)),
            row("Ohio", -90.0, Some(10), None),
            row("Iowa", -80.0, None, Some(0.1)),
            row("Utah", -70.0, None, None),
        ];
        let scene = MapScene::build(&rows);
        assert_eq!(scene.regions.len(), 4);
        assert_eq!(scene.labels.len(), 1);
        assert_eq!(scene.labels[0].text, "50\n50.0%\nTE");
    }

    #[test]
    fn test_missing_counts_are_unfilled() {
        let rows = vec![
            row("Texas", -100.0, Some(50), Some(0.5)),
            row("Wyoming", -90.0, None, None),
        ];
        let scene = MapScene::build(&rows);
        assert!(scene.regions[0].fill.is_some());
        assert!(!scene.regions[0].triangles.is_empty());
        assert!(scene.regions[1].fill.is_none());
        assert!(scene.regions[1].triangles.is_empty());
        assert_eq!(scene.regions[1].rings.len(), 1);
    }

    #[test]
    fn test_no_counts_means_no_legend() {
        let scene = MapScene::build(&[row("Utah", -70.0, None, None)]);
        assert!(scene.legend.is_none());
        let scene = MapScene::build(&[row("Utah", -70.0, Some(3), None)]);
        assert_eq!(scene.legend.unwrap().title, LEGEND_TITLE);
    }

    #[test]
    fn test_home_covers_all_regions() {
        let rows = vec![row("Texas", -100.0, None, None), row("Maine", -70.0, None, None)];
        let scene = MapScene::build(&rows);
        assert!(scene.home.min().x < -100.0);
        assert!(scene.home.max().x > -67.0);
        assert!(scene.home.min().y < 30.0);
        assert!(scene.home.max().y > 33.0);
    }

    #[test]
    fn test_triangulation_covers_area() {
        let scene = MapScene::build(&[row("Texas", -100.0, Some(1), Some(1.0))]);
        let area: f64 = scene.regions[0]
            .triangles
            .iter()
            .map(|[a, b, c]| ((b.x - a.x) * (c.y - a.y) - (c.x - a.x) * (b.y - a.y)).abs() / 2.0)
            .sum();
        assert!((area - 9.0).abs() < 1e-6);
    }

    #[test]
    fn test_geographic_aspect() {
        let equator = Rect::new(Coord { x: -10.0, y: -5.0 }, Coord { x: 10.0, y: 5.0 });
        assert!((geographic_aspect(equator) - 1.0).abs() < 1e-12);

        let us = Rect::new(Coord { x: -125.0, y: 25.0 }, Coord { x: -66.0, y: 49.0 });
        let expected = 1.0 / 37f64.to_radians().cos();
        assert!((geographic_aspect(us) - expected).abs() < 1e-12);

        let projected = Rect::new(Coord { x: 0.0, y: 0.0 }, Coord { x: 5.0e5, y: 4.0e5 });
        assert_eq!(geographic_aspect(projected), 1.0);
    }
}
