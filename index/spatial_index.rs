use super::algorithms::{quadtree, str_load};
use super::envelope::Envelope;
use super::error::{IndexError, IndexResult};
use super::node::{IndexedEntry, Node, NodeKind, PayloadRef};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// 默认叶子容量
pub const DEFAULT_LEAF_CAPACITY: usize = 10;
/// 默认 R-tree 内部节点扇出
pub const DEFAULT_NODE_CAPACITY: usize = 10;
/// 默认四叉树最大深度
pub const DEFAULT_MAX_DEPTH: usize = 16;

/// 索引构建策略，构建后不可更改
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexType {
    Quadtree,
    #[default]
    Rtree,
}

impl IndexType {
    /// Case-insensitive lookup by name; unknown names yield `None`.
    pub fn from_name(name: &str) -> Option<IndexType> {
        [IndexType::Quadtree, IndexType::Rtree]
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(name.trim()))
    }

    pub fn name(&self) -> &'static str {
        match self {
            IndexType::Quadtree => "QUADTREE",
            IndexType::Rtree => "RTREE",
        }
    }
}

impl fmt::Display for IndexType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for IndexType {
    type Err = IndexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        IndexType::from_name(s).ok_or_else(|| {
            IndexError::invalid(format!(
                "unknown index type '{}', expected one of: quadtree, rtree",
                s
            ))
        })
    }
}

/// 构建参数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexOptions {
    pub index_type: IndexType,
    /// 叶子节点最多容纳的条目数
    pub leaf_capacity: usize,
    /// R-tree 内部节点的子节点数上限
    pub node_capacity: usize,
    /// 四叉树最大递归深度
    pub max_depth: usize,
}

impl Default for IndexOptions {
    fn default() -> Self {
        IndexOptions {
            index_type: IndexType::default(),
            leaf_capacity: DEFAULT_LEAF_CAPACITY,
            node_capacity: DEFAULT_NODE_CAPACITY,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl IndexOptions {
    pub fn new(index_type: IndexType, leaf_capacity: usize) -> Self {
        IndexOptions {
            index_type,
            leaf_capacity,
            node_capacity: leaf_capacity,
            ..IndexOptions::default()
        }
    }

    pub fn validate(&self) -> IndexResult<()> {
        if self.leaf_capacity < 2 {
            return Err(IndexError::invalid(format!(
                "leaf capacity must be at least 2, got {}",
                self.leaf_capacity
            )));
        }
        if self.node_capacity < 2 {
            return Err(IndexError::invalid(format!(
                "node capacity must be at least 2, got {}",
                self.node_capacity
            )));
        }
        if self.max_depth == 0 {
            return Err(IndexError::invalid("quadtree max depth must be at least 1"));
        }
        Ok(())
    }
}

/// Build-once, query-many spatial index over `(envelope, payload)` pairs.
///
/// The index never owns payload data: each entry carries a [`PayloadRef`] into
/// the caller's collection. Once built it is immutable and can be shared across
/// threads without locking.
#[derive(Debug, Clone, PartialEq)]
pub struct SpatialIndex {
    /// 根节点，空索引为 `None`
    root: Option<Node>,
    options: IndexOptions,
    len: usize,
}

impl SpatialIndex {
    /// 使用默认参数构建指定类型的索引
    pub fn build(
        entries: Vec<IndexedEntry>,
        index_type: IndexType,
        leaf_capacity: usize,
    ) -> IndexResult<Self> {
        Self::build_with(entries, IndexOptions::new(index_type, leaf_capacity))
    }

    /// 构建索引
    ///
    /// Every envelope is validated before any node is created, so a failure never
    /// leaves a partially built index behind. Zero entries produce an empty index.
    pub fn build_with(entries: Vec<IndexedEntry>, options: IndexOptions) -> IndexResult<Self> {
        options.validate()?;
        validate_entries(&entries)?;

        let len = entries.len();
        let root = match options.index_type {
            IndexType::Rtree => {
                str_load::bulk_load(entries, options.leaf_capacity, options.node_capacity)
            }
            IndexType::Quadtree => {
                quadtree::build(entries, options.leaf_capacity, options.max_depth)
            }
        };

        let index = SpatialIndex { root, options, len };
        debug!(
            index_type = %options.index_type,
            entries = len,
            depth = index.depth(),
            nodes = index.node_count(),
            "spatial index built"
        );
        Ok(index)
    }

    /// 创建空索引
    pub fn empty(index_type: IndexType) -> Self {
        SpatialIndex {
            root: None,
            options: IndexOptions {
                index_type,
                ..IndexOptions::default()
            },
            len: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// 索引中的条目数量
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn index_type(&self) -> IndexType {
        self.options.index_type
    }

    pub fn options(&self) -> &IndexOptions {
        &self.options
    }

    pub fn root(&self) -> Option<&Node> {
        self.root.as_ref()
    }

    /// 根节点包络
    pub fn envelope(&self) -> Option<Envelope> {
        self.root.as_ref().map(|node| *node.envelope_ref())
    }

    /// 树的深度，空索引为 0
    pub fn depth(&self) -> usize {
        self.root.as_ref().map_or(0, Node::depth)
    }

    pub fn node_count(&self) -> usize {
        self.root.as_ref().map_or(0, Node::node_count)
    }

    /// 导出树结构为 JSON 格式，用于调试和可视化
    pub fn export_to_json(&self) -> Result<String, serde_json::Error> {
        let visualization = TreeVisualization {
            index_type: self.options.index_type,
            entries: self.len,
            root: self.root.as_ref().map(|node| visualize(node, 0)),
        };
        serde_json::to_string_pretty(&visualization)
    }
}

/// 检查所有包络：非有限坐标为构建失败，min > max 为非法参数
fn validate_entries(entries: &[IndexedEntry]) -> IndexResult<()> {
    for (position, entry) in entries.iter().enumerate() {
        let env = &entry.envelope;
        if !env.is_finite() {
            return Err(IndexError::BuildFailure {
                position,
                reason: format!("envelope {} has non-finite coordinates", env),
            });
        }
        if !env.is_ordered() {
            return Err(IndexError::invalid(format!(
                "entry {} has malformed envelope {} (min greater than max)",
                position, env
            )));
        }
    }
    Ok(())
}

/// 用于JSON序列化的树结构
#[derive(Debug, Serialize, Deserialize)]
pub struct TreeVisualization {
    pub index_type: IndexType,
    pub entries: usize,
    pub root: Option<NodeVisualization>,
}

/// 用于JSON序列化的节点结构
#[derive(Debug, Serialize, Deserialize)]
pub struct NodeVisualization {
    pub envelope: Envelope,
    pub kind: NodeKind,
    /// 根节点深度为 0
    pub depth: usize,
    /// 数据条目（仅叶子节点）
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entries: Vec<EntryVisualization>,
    /// 子节点（仅内部节点）
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeVisualization>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EntryVisualization {
    pub envelope: Envelope,
    pub payload: PayloadRef,
}

fn visualize(node: &Node, depth: usize) -> NodeVisualization {
    match node {
        Node::Leaf { envelope, entries } => NodeVisualization {
            envelope: *envelope,
            kind: NodeKind::Leaf,
            depth,
            entries: entries
                .iter()
                .map(|e| EntryVisualization {
                    envelope: e.envelope,
                    payload: e.payload,
                })
                .collect(),
            children: Vec::new(),
        },
        Node::Internal { envelope, children } => NodeVisualization {
            envelope: *envelope,
            kind: NodeKind::Internal,
            depth,
            entries: Vec::new(),
            children: children.iter().map(|c| visualize(c, depth + 1)).collect(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boxes(n: usize) -> Vec<IndexedEntry> {
        (0..n)
            .map(|i| {
                let x = (i % 10) as f64 * 3.0;
                let y = (i / 10) as f64 * 3.0;
                IndexedEntry::new(Envelope::new(x, y, x + 1.0, y + 2.0), i)
            })
            .collect()
    }

    #[test]
    fn test_index_type_from_name() {
        assert_eq!(IndexType::from_name("quadtree"), Some(IndexType::Quadtree));
        assert_eq!(IndexType::from_name("RTREE"), Some(IndexType::Rtree));
        assert_eq!(IndexType::from_name("RTree"), Some(IndexType::Rtree));
        assert_eq!(IndexType::from_name("kdtree"), None);
        assert!("grid".parse::<IndexType>().is_err());
        assert_eq!(IndexType::Quadtree.to_string(), "QUADTREE");
    }

    #[test]
    fn test_build_empty_is_not_an_error() {
        for index_type in [IndexType::Quadtree, IndexType::Rtree] {
            let index = SpatialIndex::build(Vec::new(), index_type, 8).unwrap();
            assert!(index.is_empty());
            assert_eq!(index.len(), 0);
            assert_eq!(index.depth(), 0);
            assert_eq!(index.envelope(), None);
        }
    }

    #[test]
    fn test_build_both_strategies() {
        for index_type in [IndexType::Quadtree, IndexType::Rtree] {
            let index = SpatialIndex::build(boxes(100), index_type, 8).unwrap();
            assert_eq!(index.len(), 100);
            assert_eq!(index.index_type(), index_type);
            assert_eq!(index.root().unwrap().entry_count(), 100);
            assert!(index.root().unwrap().max_leaf_len() <= 8);
            assert_eq!(index.envelope(), Some(Envelope::new(0.0, 0.0, 28.0, 29.0)));
        }
    }

    #[test]
    fn test_malformed_envelope_is_invalid_argument() {
        let mut entries = boxes(5);
        entries.push(IndexedEntry::new(Envelope::new(10.0, 0.0, 5.0, 1.0), 5));

        let err = SpatialIndex::build(entries, IndexType::Rtree, 4).unwrap_err();
        match err {
            IndexError::InvalidArgument { reason } => assert!(reason.contains("entry 5")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_non_finite_envelope_is_build_failure() {
        let mut entries = boxes(3);
        entries.insert(1, IndexedEntry::new(Envelope::new(0.0, f64::NAN, 1.0, 1.0), 99));

        let err = SpatialIndex::build(entries, IndexType::Quadtree, 4).unwrap_err();
        assert!(matches!(err, IndexError::BuildFailure { position: 1, .. }));
    }

    #[test]
    fn test_invalid_options() {
        assert!(SpatialIndex::build(boxes(3), IndexType::Rtree, 1).is_err());

        let options = IndexOptions {
            max_depth: 0,
            ..IndexOptions::default()
        };
        assert!(SpatialIndex::build_with(boxes(3), options).is_err());
    }

    #[test]
    fn test_json_export() {
        let index = SpatialIndex::build(boxes(30), IndexType::Rtree, 4).unwrap();
        let json = index.export_to_json().expect("Failed to export JSON");

        assert!(json.contains("\"index_type\": \"rtree\""));
        assert!(json.contains("\"entries\": 30"));

        let parsed: TreeVisualization = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.root.unwrap().depth, 0);
    }
}
