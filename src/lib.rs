//! Choropleth of shipments per US state
//!
//! Loads a shipment table and state boundaries, joins them by state name and
//! shows the result as an interactive map.

pub mod app;
pub mod axes;
pub mod color_scale;
pub mod export;
pub mod figure;
pub mod join;
pub mod labels;
pub mod loader;
pub mod models;
pub mod scene;
pub mod state_names;
pub mod viewport;
