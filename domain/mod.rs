pub mod street;

pub use street::{RoadClass, Street};
