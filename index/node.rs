use super::envelope::{Boundable, Envelope};
use serde::{Deserialize, Serialize};

/// 指向调用方几何列表中的位置，索引本身不持有几何数据
pub type PayloadRef = usize;

/// 索引条目：包络 + 载荷引用
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndexedEntry {
    pub envelope: Envelope,
    pub payload: PayloadRef,
}

impl IndexedEntry {
    pub fn new(envelope: Envelope, payload: PayloadRef) -> Self {
        IndexedEntry { envelope, payload }
    }
}

impl Boundable for IndexedEntry {
    fn envelope(&self) -> Envelope {
        self.envelope
    }
}

/// 节点类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    Internal,
    Leaf,
}

/// 索引树节点
///
/// Every node's envelope is the minimal box covering all of its descendants.
/// Nodes are only created through [`Node::leaf`] and [`Node::internal`], which
/// compute that envelope, so the invariant holds for every built tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// 内部节点：子节点的并集包络
    Internal {
        envelope: Envelope,
        children: Vec<Node>,
    },
    /// 叶子节点：容量受限的条目列表
    Leaf {
        envelope: Envelope,
        entries: Vec<IndexedEntry>,
    },
}

impl Node {
    /// 由非空条目创建叶子节点
    pub(crate) fn leaf(entries: Vec<IndexedEntry>) -> Node {
        debug_assert!(!entries.is_empty(), "leaf nodes are never empty");
        let envelope = Envelope::union_all(entries.iter().map(|e| &e.envelope))
            .unwrap_or_else(|| Envelope::from_point(0.0, 0.0));
        Node::Leaf { envelope, entries }
    }

    /// 由非空子节点创建内部节点
    pub(crate) fn internal(children: Vec<Node>) -> Node {
        debug_assert!(!children.is_empty(), "internal nodes are never empty");
        let envelope = Envelope::union_all(children.iter().map(Node::envelope_ref))
            .unwrap_or_else(|| Envelope::from_point(0.0, 0.0));
        Node::Internal { envelope, children }
    }

    pub fn envelope_ref(&self) -> &Envelope {
        match self {
            Node::Internal { envelope, .. } => envelope,
            Node::Leaf { envelope, .. } => envelope,
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Internal { .. } => NodeKind::Internal,
            Node::Leaf { .. } => NodeKind::Leaf,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf { .. })
    }

    /// 子树中的条目总数
    pub fn entry_count(&self) -> usize {
        match self {
            Node::Leaf { entries, .. } => entries.len(),
            Node::Internal { children, .. } => children.iter().map(Node::entry_count).sum(),
        }
    }

    /// 子树中的节点总数（包括自身）
    pub fn node_count(&self) -> usize {
        match self {
            Node::Leaf { .. } => 1,
            Node::Internal { children, .. } => {
                1 + children.iter().map(Node::node_count).sum::<usize>()
            }
        }
    }

    /// 子树深度，单个叶子为 1
    pub fn depth(&self) -> usize {
        match self {
            Node::Leaf { .. } => 1,
            Node::Internal { children, .. } => {
                1 + children.iter().map(Node::depth).max().unwrap_or(0)
            }
        }
    }

    /// Largest number of entries held by any leaf in this subtree.
    pub fn max_leaf_len(&self) -> usize {
        match self {
            Node::Leaf { entries, .. } => entries.len(),
            Node::Internal { children, .. } => {
                children.iter().map(Node::max_leaf_len).max().unwrap_or(0)
            }
        }
    }

    /// 内部节点子节点数的 (最小, 最大) 值，单个叶子返回 `None`
    pub fn fanout_bounds(&self) -> Option<(usize, usize)> {
        let Node::Internal { children, .. } = self else {
            return None;
        };
        let own = (children.len(), children.len());
        Some(
            children
                .iter()
                .filter_map(Node::fanout_bounds)
                .fold(own, |(lo, hi), (c_lo, c_hi)| (lo.min(c_lo), hi.max(c_hi))),
        )
    }
}

impl Boundable for Node {
    fn envelope(&self) -> Envelope {
        *self.envelope_ref()
    }
}
