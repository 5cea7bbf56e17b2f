use geo::MultiPolygon;

/// One row of the shipment table. Any cell may be empty.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ShipmentRecord {
    pub state_code: Option<String>,
    pub shipment_count: Option<i64>,
    pub shipment_share: Option<f64>,
}

/// Shipment record with its state code resolved to a full name
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedShipment {
    pub record: ShipmentRecord,
    pub state_name: Option<&'static str>,
}

/// A state boundary from the GeoJSON file
#[derive(Debug, Clone)]
pub struct GeoFeature {
    pub name: String,
    pub geometry: MultiPolygon<f64>,
}

/// Boundary left-joined with its shipment record, if any
#[derive(Debug, Clone)]
pub struct MergedRow {
    pub state_name: String,
    pub geometry: MultiPolygon<f64>,
    pub state_code: Option<String>,
    pub shipment_count: Option<i64>,
    pub shipment_share: Option<f64>,
}

impl MergedRow {
    /// Boundary with no shipment data attached
    pub fn unmatched(feature: GeoFeature) -> Self {
        Self {
            state_name: feature.name,
            geometry: feature.geometry,
            state_code: None,
            shipment_count: None,
            shipment_share: None,
        }
    }

    pub fn matched(feature: GeoFeature, record: &ShipmentRecord) -> Self {
        Self {
            state_name: feature.name,
            geometry: feature.geometry,
            state_code: record.state_code.clone(),
            shipment_count: record.shipment_count,
            shipment_share: record.shipment_share,
        }
    }

    /// Both count and share are present, so the state gets a label
    pub fn has_label_data(&self) -> bool {
        self.shipment_count.is_some() && self.shipment_share.is_some()
    }
}
