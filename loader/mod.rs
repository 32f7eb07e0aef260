//! Loaders that turn on-disk street data into [`Street`](crate::domain::Street) records.
//!
//! Loaders validate geometry before anything reaches the index: coordinates are
//! finite and every line has at least two points.

pub mod geojson_streets;
pub mod sdo;

use thiserror::Error;

pub use geojson_streets::{load_streets_geojson, parse_streets_geojson, StreetLoad};
pub use sdo::parse_sdo_geometry;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),

    #[error("Malformed record {record}: {reason}")]
    Malformed { record: usize, reason: String },

    #[error("Invalid SDO geometry: {reason}")]
    Sdo { reason: String },

    #[error("Invalid coordinate: {reason}")]
    InvalidCoordinate { reason: String },
}
