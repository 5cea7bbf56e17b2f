//! Input loading for the shipment table and the state boundaries
//!
//! Shipments come from the first worksheet of a workbook or from a CSV file.
//! Boundaries come from a GeoJSON FeatureCollection with a `name` property
//! on every feature.

use anyhow::{bail, Context, Result};
use calamine::{open_workbook_auto, Data, Reader};
use csv::ReaderBuilder;
use geo::{Coord, LineString, MultiPolygon, Polygon};
use serde::Deserialize;
use std::path::Path;
use tracing::info;

use crate::models::{GeoFeature, ShipmentRecord};

pub const DEFAULT_SHIPMENTS_PATH: &str = "shipments.xlsx";
pub const DEFAULT_BOUNDARIES_PATH: &str = "us-states.json";

/// Accepted header names per column, matched case-insensitively
const STATE_COLUMN: &[&str] = &["州", "state", "state_code"];
const COUNT_COLUMN: &[&str] = &["发货数量", "shipments", "shipment_count", "count"];
const SHARE_COLUMN: &[&str] = &["发货量占比", "share", "shipment_share"];

const WORKBOOK_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xlsb", "xls", "ods"];

// ============================================================================
// Shipment table
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
enum Cell {
    Empty,
    Number(f64),
    Text(String),
}

impl Cell {
    fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            Cell::Empty
        } else if let Ok(value) = trimmed.parse::<f64>() {
            Cell::Number(value)
        } else {
            Cell::Text(trimmed.to_string())
        }
    }

    fn as_text(&self) -> Option<String> {
        match self {
            Cell::Empty => None,
            Cell::Number(v) => Some(v.to_string()),
            Cell::Text(s) => Some(s.clone()),
        }
    }

    fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(v) if v.is_finite() => Some(*v),
            _ => None,
        }
    }
}

impl From<&Data> for Cell {
    fn from(data: &Data) -> Self {
        match data {
            Data::Int(v) => Cell::Number(*v as f64),
            Data::Float(v) => Cell::Number(*v),
            Data::String(s) => Cell::parse(s),
            Data::Bool(b) => Cell::Text(b.to_string()),
            _ => Cell::Empty,
        }
    }
}

/// Header row plus data rows, whatever the source format
struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

/// Column positions of the three fields we need
#[derive(Debug, PartialEq)]
struct ColumnMap {
    state: usize,
    count: usize,
    share: usize,
}

impl ColumnMap {
    fn resolve(headers: &[String]) -> Result<Self> {
        let find = |aliases: &[&str], what: &str| {
            headers
                .iter()
                .position(|h| aliases.iter().any(|a| h.trim().eq_ignore_ascii_case(a)))
                .with_context(|| format!("missing {what} column (expected one of {aliases:?})"))
        };

        Ok(Self {
            state: find(STATE_COLUMN, "state code")?,
            count: find(COUNT_COLUMN, "shipment count")?,
            share: find(SHARE_COLUMN, "shipment share")?,
        })
    }

    fn record(&self, row: &[Cell]) -> ShipmentRecord {
        let text = |i: usize| row.get(i).and_then(Cell::as_text);
        let number = |i: usize| row.get(i).and_then(Cell::as_number);
        ShipmentRecord {
            state_code: text(self.state),
            // Counts are whole shipments; spreadsheets often store them as floats
            shipment_count: number(self.count).map(|v| v.trunc() as i64),
            shipment_share: number(self.share),
        }
    }
}

/// Load shipment records from a workbook or CSV file
pub fn load_shipments(path: &Path) -> Result<Vec<ShipmentRecord>> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    let table = if extension == "csv" {
        read_csv_table(path)?
    } else if WORKBOOK_EXTENSIONS.contains(&extension.as_str()) {
        read_workbook_table(path)?
    } else {
        bail!(
            "unsupported shipment table format {:?} for {}",
            extension,
            path.display()
        );
    };

    let columns = ColumnMap::resolve(&table.headers)
        .with_context(|| format!("reading header of {}", path.display()))?;
    let records: Vec<ShipmentRecord> = table.rows.iter().map(|row| columns.record(row)).collect();

    info!("Loaded {} shipment rows from {}", records.len(), path.display());
    Ok(records)
}

fn read_csv_table(path: &Path) -> Result<Table> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;

    let headers: Vec<String> = reader
        .headers()
        .with_context(|| format!("failed to read header of {}", path.display()))?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();

    let mut rows: Vec<Vec<Cell>> = Vec::new();
    for (i, record) in reader.records().enumerate() {
        // Line numbers are 1-based and the header takes line 1
        let record = record.with_context(|| format!("malformed row {} in {}", i + 2, path.display()))?;
        rows.push(record.iter().map(Cell::parse).collect());
    }

    Ok(Table { headers, rows })
}

fn read_workbook_table(path: &Path) -> Result<Table> {
    let mut workbook =
        open_workbook_auto(path).with_context(|| format!("failed to open {}", path.display()))?;
    let range = workbook
        .worksheet_range_at(0)
        .with_context(|| format!("{} has no worksheets", path.display()))?
        .with_context(|| format!("failed to read first worksheet of {}", path.display()))?;

    let mut rows = range.rows();
    let headers: Vec<String> = rows
        .next()
        .map(|header| {
            header
                .iter()
                .map(|c| Cell::from(c).as_text().unwrap_or_default())
                .collect()
        })
        .unwrap_or_default();
    let rows: Vec<Vec<Cell>> = rows.map(|row| row.iter().map(Cell::from).collect()).collect();

    Ok(Table { headers, rows })
}

// ============================================================================
// Boundaries
// ============================================================================

#[derive(Debug, Deserialize)]
struct FeatureCollectionJson {
    features: Vec<FeatureJson>,
}

#[derive(Debug, Deserialize)]
struct FeatureJson {
    #[serde(default)]
    properties: Option<serde_json::Map<String, serde_json::Value>>,
    #[serde(default)]
    geometry: Option<GeometryJson>,
}

/// Positions are kept as vectors since GeoJSON allows an optional altitude
#[derive(Debug, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
enum GeometryJson {
    Polygon(Vec<Vec<Vec<f64>>>),
    MultiPolygon(Vec<Vec<Vec<Vec<f64>>>>),
}

impl GeometryJson {
    fn into_multi_polygon(self) -> Result<MultiPolygon<f64>> {
        let polygons = match self {
            GeometryJson::Polygon(rings) => vec![polygon(rings)?],
            GeometryJson::MultiPolygon(polygons) => polygons
                .into_iter()
                .map(polygon)
                .collect::<Result<Vec<_>>>()?,
        };
        Ok(MultiPolygon::new(polygons))
    }
}

fn polygon(rings: Vec<Vec<Vec<f64>>>) -> Result<Polygon<f64>> {
    let mut rings = rings.into_iter().map(ring);
    let exterior = rings.next().transpose()?.unwrap_or_else(|| LineString::new(vec![]));
    let interiors = rings.collect::<Result<Vec<_>>>()?;
    Ok(Polygon::new(exterior, interiors))
}

fn ring(positions: Vec<Vec<f64>>) -> Result<LineString<f64>> {
    positions
        .into_iter()
        .map(|p| match p.as_slice() {
            [x, y, ..] => Ok(Coord { x: *x, y: *y }),
            _ => bail!("position with fewer than two coordinates"),
        })
        .collect::<Result<Vec<_>>>()
        .map(LineString::new)
}

/// Parse a GeoJSON FeatureCollection of state boundaries
pub fn parse_boundaries(json: &str) -> Result<Vec<GeoFeature>> {
    let collection: FeatureCollectionJson =
        serde_json::from_str(json).context("invalid GeoJSON feature collection")?;

    collection
        .features
        .into_iter()
        .enumerate()
        .map(|(i, feature)| {
            let name = feature
                .properties
                .as_ref()
                .and_then(|p| p.get("name"))
                .and_then(|v| v.as_str())
                .with_context(|| format!("feature {i} has no name property"))?
                .to_string();
            let geometry = match feature.geometry {
                Some(geometry) => geometry
                    .into_multi_polygon()
                    .with_context(|| format!("bad geometry for {name}"))?,
                None => MultiPolygon::new(vec![]),
            };
            Ok(GeoFeature { name, geometry })
        })
        .collect()
}

/// Load state boundaries from a GeoJSON file
pub fn load_boundaries(path: &Path) -> Result<Vec<GeoFeature>> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let features =
        parse_boundaries(&json).with_context(|| format!("failed to parse {}", path.display()))?;

    info!("Loaded {} boundary features from {}", features.len(), path.display());
    Ok(features)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::Area;
    use std::io::Write;

    fn write_temp(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_csv_with_chinese_headers() {
        let file = write_temp(".csv", "州,发货数量,发货量占比\nCA,120,0.25\nRI,5,0.01\n");
        let records = load_shipments(file.path()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(
            records[0],
            ShipmentRecord {
                state_code: Some("CA".into()),
                shipment_count: Some(120),
                shipment_share: Some(0.25),
            }
        );
    }

    #[test]
    fn test_csv_with_english_headers_in_any_order() {
        let file = write_temp(".csv", "Share,State,Shipments,note\n0.5, TX ,40.0,x\n");
        let records = load_shipments(file.path()).unwrap();
        assert_eq!(records[0].state_code.as_deref(), Some("TX"));
        assert_eq!(records[0].shipment_count, Some(40));
        assert_eq!(records[0].shipment_share, Some(0.5));
    }

    #[test]
    fn test_empty_and_bad_cells_become_null() {
        let file = write_temp(".csv", "state,count,share\nNY,,0.1\n,7,n/a\nOH,NaN,\n");
        let records = load_shipments(file.path()).unwrap();
        assert_eq!(records[0].shipment_count, None);
        assert_eq!(records[1].state_code, None);
        assert_eq!(records[1].shipment_share, None);
        assert_eq!(records[2].shipment_count, None);
        assert_eq!(records[2].shipment_share, None);
    }

    #[test]
    fn test_xlsx_first_sheet() {
        let file = tempfile::Builder::new().suffix(".xlsx").tempfile().unwrap();
        let mut workbook = rust_xlsxwriter::Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "州").unwrap();
        sheet.write_string(0, 1, "发货数量").unwrap();
        sheet.write_string(0, 2, "发货量占比").unwrap();
        sheet.write_string(1, 0, "CA").unwrap();
        sheet.write_number(1, 1, 120.0).unwrap();
        sheet.write_number(1, 2, 0.25).unwrap();
        // Count left blank
        sheet.write_string(2, 0, "WY").unwrap();
        sheet.write_number(2, 2, 0.1).unwrap();
        // Numbers stored as text still parse
        sheet.write_string(3, 0, " TX ").unwrap();
        sheet.write_string(3, 1, "42").unwrap();
        sheet.write_string(3, 2, "0.05").unwrap();
        workbook.save(file.path()).unwrap();

        let records = load_shipments(file.path()).unwrap();
        assert_eq!(
            records,
            vec![
                ShipmentRecord {
                    state_code: Some("CA".to_string()),
                    shipment_count: Some(120),
                    shipment_share: Some(0.25),
                },
                ShipmentRecord {
                    state_code: Some("WY".to_string()),
                    shipment_count: None,
                    shipment_share: Some(0.1),
                },
                ShipmentRecord {
                    state_code: Some("TX".to_string()),
                    shipment_count: Some(42),
                    shipment_share: Some(0.05),
                },
            ]
        );
    }

    #[test]
    fn test_fractional_count_truncates() {
        let file = write_temp(".csv", "state,count,share\nCA,12.9,0.3\n");
        let records = load_shipments(file.path()).unwrap();
        assert_eq!(records[0].shipment_count, Some(12));
    }

    #[test]
    fn test_missing_column_is_fatal() {
        let file = write_temp(".csv", "state,count\nCA,1\n");
        let err = load_shipments(file.path()).unwrap_err();
        assert!(format!("{err:#}").contains("shipment share"));
    }

    #[test]
    fn test_unsupported_extension() {
        let file = write_temp(".txt", "state,count,share\n");
        assert!(load_shipments(file.path()).is_err());
    }

    #[test]
    fn test_missing_file() {
        assert!(load_shipments(Path::new("does-not-exist.csv")).is_err());
        assert!(load_boundaries(Path::new("does-not-exist.json")).is_err());
    }

    #[test]
    fn test_parse_polygon_and_multipolygon() {
        let json = r#"{
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "id": "WY", "properties": {"name": "Wyoming"},
                 "geometry": {"type": "Polygon", "coordinates": [[[0,0],[2,0],[2,1],[0,1],[0,0]]]}},
                {"type": "Feature", "properties": {"name": "Hawaii"},
                 "geometry": {"type": "MultiPolygon", "coordinates": [
                    [[[0,0,5],[1,0,5],[1,1,5],[0,0,5]]],
                    [[[3,3],[4,3],[4,4],[3,3]]]
                 ]}}
            ]
        }"#;
        let features = parse_boundaries(json).unwrap();
        assert_eq!(features.len(), 2);
        assert_eq!(features[0].name, "Wyoming");
        assert_eq!(features[0].geometry.0.len(), 1);
        assert!((features[0].geometry.unsigned_area() - 2.0).abs() < 1e-12);
        assert_eq!(features[1].geometry.0.len(), 2);
    }

    #[test]
    fn test_null_geometry_is_empty() {
        let json = r#"{"type":"FeatureCollection","features":[
            {"type":"Feature","properties":{"name":"Ohio"},"geometry":null}]}"#;
        let features = parse_boundaries(json).unwrap();
        assert!(features[0].geometry.0.is_empty());
    }

    #[test]
    fn test_feature_without_name_is_fatal() {
        let json = r#"{"type":"FeatureCollection","features":[
            {"type":"Feature","properties":{"id":"OH"},"geometry":null}]}"#;
        assert!(parse_boundaries(json).is_err());
    }

    #[test]
    fn test_unsupported_geometry_is_fatal() {
        let json = r#"{"type":"FeatureCollection","features":[
            {"type":"Feature","properties":{"name":"Ohio"},
             "geometry":{"type":"Point","coordinates":[1,2]}}]}"#;
        assert!(parse_boundaries(json).is_err());
    }
}
