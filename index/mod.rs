pub mod algorithms;
pub mod envelope;
pub mod error;
pub mod node;
pub mod spatial_index;

// 重新导出主要类型
pub use algorithms::distance::point_to_geometry_distance;
pub use algorithms::knn::{knn_search, knn_search_with_stats, KnnHit, KnnStats};
pub use algorithms::ordering::{CenterDistanceComparator, XMinComparator, YMinComparator};
pub use envelope::{Boundable, Circle, Envelope};
pub use error::{IndexError, IndexResult};
pub use node::{IndexedEntry, Node, NodeKind, PayloadRef};
pub use spatial_index::{IndexOptions, IndexType, SpatialIndex};
