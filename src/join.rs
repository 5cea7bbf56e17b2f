//! Join shipment records onto state boundaries
//!
//! Codes are resolved to full names first, then every boundary is left-joined
//! to at most one shipment record by that name.

use std::collections::HashMap;
use tracing::{debug, info, warn};

use crate::models::{EnrichedShipment, GeoFeature, MergedRow, ShipmentRecord};
use crate::state_names::state_name;

/// Attach full state names to shipment records. Unknown codes get `None`.
pub fn enrich(records: Vec<ShipmentRecord>) -> Vec<EnrichedShipment> {
    records
        .into_iter()
        .map(|record| {
            let state_name = record.state_code.as_deref().and_then(state_name);
            if state_name.is_none() {
                debug!("No state name for code {:?}", record.state_code);
            }
            EnrichedShipment { record, state_name }
        })
        .collect()
}

/// Left join boundaries to shipments on full state name.
///
/// Output has exactly one row per feature, in feature order. If two shipment
/// rows resolve to the same state, the first one is used.
pub fn merge(features: Vec<GeoFeature>, shipments: &[EnrichedShipment]) -> Vec<MergedRow> {
    let mut by_name: HashMap<&str, &ShipmentRecord> = HashMap::new();
    for shipment in shipments {
        let Some(name) = shipment.state_name else {
            continue;
        };
        if by_name.contains_key(name) {
            warn!(
                "Duplicate shipment row for {} ({:?}); keeping the first",
                name, shipment.record.state_code
            );
            continue;
        }
        by_name.insert(name, &shipment.record);
    }

    let rows: Vec<MergedRow> = features
        .into_iter()
        .map(|feature| match by_name.get(feature.name.as_str()) {
            Some(record) => MergedRow::matched(feature, record),
            None => MergedRow::unmatched(feature),
        })
        .collect();

    let matched = rows.iter().filter(|r| r.state_code.is_some()).count();
    info!("Joined {} of {} boundaries to shipment data", matched, rows.len());
    rows
}

/// Shipment codes that did not land on any boundary
pub fn unmatched_codes(shipments: &[EnrichedShipment], rows: &[MergedRow]) -> Vec<String> {
    shipments
        .iter()
        .filter(|s| {
            s.state_name
                .map_or(true, |name| !rows.iter().any(|r| r.state_name == name))
        })
        .map(|s| s.record.state_code.clone().unwrap_or_else(|| "(blank)".to_string()))
        .collect()
}
