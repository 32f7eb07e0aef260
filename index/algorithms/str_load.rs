//! Sort-Tile-Recursive bulk loading for the R-tree strategy.
//!
//! 1. Sort all items by minimum X (stable).
//! 2. Cut the sequence into `ceil(sqrt(P))` vertical strips, where `P` is the number
//!    of groups needed at `capacity` items per group.
//! 3. Sort each strip by minimum Y (stable) and cut it into groups of `capacity`.
//! 4. Each group of entries becomes a leaf; the leaves are tiled again with the
//!    internal fan-out until a single root remains.

use super::super::envelope::Boundable;
use super::super::node::{IndexedEntry, Node};
use super::ordering::{XMinComparator, YMinComparator};

/// 批量构建 R-tree，条目为空时返回 `None`
pub(crate) fn bulk_load(
    entries: Vec<IndexedEntry>,
    leaf_capacity: usize,
    node_capacity: usize,
) -> Option<Node> {
    if entries.is_empty() {
        return None;
    }

    let mut level: Vec<Node> = tile(entries, leaf_capacity)
        .into_iter()
        .map(Node::leaf)
        .collect();

    // 自底向上逐层打包，直到只剩一个根节点
    while level.len() > 1 {
        level = tile(level, node_capacity)
            .into_iter()
            .map(Node::internal)
            .collect();
    }

    level.pop()
}

/// Partition `items` into groups of at most `capacity` using the STR tiling.
pub(crate) fn tile<T: Boundable>(mut items: Vec<T>, capacity: usize) -> Vec<Vec<T>> {
    if items.len() <= capacity {
        return vec![items];
    }

    XMinComparator.sort(&mut items);

    let group_count = items.len().div_ceil(capacity);
    let strip_count = (group_count as f64).sqrt().ceil() as usize;
    let groups_per_strip = group_count.div_ceil(strip_count);
    let strip_len = groups_per_strip * capacity;

    let mut groups = Vec::with_capacity(group_count);
    for mut strip in split_owned(items, strip_len) {
        YMinComparator.sort(&mut strip);
        groups.extend(split_owned(strip, capacity));
    }
    groups
}

/// 将向量按固定大小切分为多个拥有所有权的分组，保持原有顺序
fn split_owned<T>(items: Vec<T>, size: usize) -> Vec<Vec<T>> {
    let mut chunks = Vec::with_capacity(items.len().div_ceil(size.max(1)));
    let mut current = Vec::with_capacity(size);
    for item in items {
        current.push(item);
        if current.len() >= size {
            chunks.push(std::mem::replace(&mut current, Vec::with_capacity(size)));
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}
