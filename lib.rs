pub mod client;
pub mod config;
pub mod domain;
pub mod index;
pub mod loader;
pub mod storage;

use std::error::Error;

// 重新导出主要的公共接口
pub use domain::{RoadClass, Street};
pub use index::{
    Boundable, Envelope, IndexError, IndexOptions, IndexType, IndexedEntry, KnnHit, KnnStats,
    PayloadRef, SpatialIndex,
};
pub use loader::LoadError;
pub use storage::{GeometryList, Neighbor, Spatial};

// 重新导出常用类型，便于二进制文件使用
pub use config::GeoKnnConfig;

pub type Result<T> = std::result::Result<T, Box<dyn Error + Send + Sync>>;
