use super::super::envelope::Envelope;
use super::super::node::{Node, PayloadRef};
use super::super::spatial_index::SpatialIndex;

/// 范围查询相关算法
impl SpatialIndex {
    /// 返回包络与查询包络相交的所有条目，按条目在原始序列中的位置排序
    pub fn search_envelope(&self, query: &Envelope) -> Vec<PayloadRef> {
        let mut results = Vec::new();

        if let Some(root) = self.root() {
            search_recursive(root, query, &mut results);
        }

        results.sort_unstable();
        results
    }
}

fn search_recursive(node: &Node, query: &Envelope, results: &mut Vec<PayloadRef>) {
    if !node.envelope_ref().intersects(query) {
        return;
    }
    match node {
        Node::Leaf { entries, .. } => results.extend(
            entries
                .iter()
                .filter(|entry| entry.envelope.intersects(query))
                .map(|entry| entry.payload),
        ),
        Node::Internal { children, .. } => {
            for child in children {
                search_recursive(child, query, results);
            }
        }
    }
}
