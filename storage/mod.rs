pub mod geometry_list;
pub mod geometry_utils;

pub use geometry_list::{GeometryList, Neighbor, Spatial};
pub use geometry_utils::{coords_are_finite, geometry_to_envelope, geometry_to_geojson};
