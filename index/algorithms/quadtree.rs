//! Quadtree construction.
//!
//! Space is split into four quadrants around the midpoint of the current cell.
//! An entry descends into a quadrant only when its envelope fits entirely on one
//! side of the midpoint on both axes; entries straddling either midline stay at the
//! current node. Straddlers, and whole cells once the depth cap is reached, are
//! packed with the STR tiling into leaves of at most `leaf_capacity`, so every
//! internal node keeps between 2 and 4 children.
//! Recursion stops when a cell holds no more than `leaf_capacity` entries or the
//! depth cap is reached, which bounds the tree when entries are coincident.

use super::super::envelope::Envelope;
use super::super::node::{IndexedEntry, Node};
use super::str_load;

/// 内部节点的最大子节点数
const QUAD_FANOUT: usize = 4;

/// 构建四叉树，条目为空时返回 `None`
pub(crate) fn build(
    entries: Vec<IndexedEntry>,
    leaf_capacity: usize,
    max_depth: usize,
) -> Option<Node> {
    let bounds = Envelope::union_all(entries.iter().map(|e| &e.envelope))?;
    Some(build_cell(entries, bounds, 0, leaf_capacity, max_depth))
}

fn build_cell(
    entries: Vec<IndexedEntry>,
    cell: Envelope,
    depth: usize,
    leaf_capacity: usize,
    max_depth: usize,
) -> Node {
    if entries.len() <= leaf_capacity || depth >= max_depth {
        return pack_leaves(entries, leaf_capacity);
    }

    let (mid_x, mid_y) = cell.center();
    let mut straddling = Vec::new();
    // 顺序：西南、东南、西北、东北
    let mut quadrants: [Vec<IndexedEntry>; 4] = Default::default();

    for entry in entries {
        match quadrant_of(&entry.envelope, mid_x, mid_y) {
            Some(q) => quadrants[q].push(entry),
            None => straddling.push(entry),
        }
    }

    let mut children = Vec::with_capacity(QUAD_FANOUT);
    for (q, bucket) in quadrants.into_iter().enumerate() {
        if bucket.is_empty() {
            continue;
        }
        let sub_cell = quadrant_cell(&cell, mid_x, mid_y, q);
        children.push(build_cell(bucket, sub_cell, depth + 1, leaf_capacity, max_depth));
    }

    // 跨线条目排在最前；四个象限都非空时象限先合并为一个子节点
    if !straddling.is_empty() {
        let straddlers = pack_leaves(straddling, leaf_capacity);
        if children.len() < QUAD_FANOUT {
            children.insert(0, straddlers);
        } else {
            children = vec![straddlers, Node::internal(children)];
        }
    }

    // 只有一个子节点时不需要额外的一层
    if children.len() == 1 {
        if let Some(only) = children.pop() {
            return only;
        }
    }
    Node::internal(children)
}

/// Index of the quadrant fully containing `env`, or `None` if it straddles a midline.
/// An envelope touching a midline from one side belongs to that side.
fn quadrant_of(env: &Envelope, mid_x: f64, mid_y: f64) -> Option<usize> {
    let east = if env.max_x <= mid_x {
        0
    } else if env.min_x >= mid_x {
        1
    } else {
        return None;
    };
    let north = if env.max_y <= mid_y {
        0
    } else if env.min_y >= mid_y {
        1
    } else {
        return None;
    };
    Some(north * 2 + east)
}

fn quadrant_cell(cell: &Envelope, mid_x: f64, mid_y: f64, quadrant: usize) -> Envelope {
    let (min_x, max_x) = if quadrant % 2 == 0 {
        (cell.min_x, mid_x)
    } else {
        (mid_x, cell.max_x)
    };
    let (min_y, max_y) = if quadrant / 2 == 0 {
        (cell.min_y, mid_y)
    } else {
        (mid_y, cell.max_y)
    };
    Envelope::new(min_x, min_y, max_x, max_y)
}

/// 将条目打包为一个叶子，超出容量时按 STR 分组打包为扇出受限的子树
fn pack_leaves(entries: Vec<IndexedEntry>, leaf_capacity: usize) -> Node {
    if entries.len() <= leaf_capacity {
        return Node::leaf(entries);
    }

    // entries.len() > leaf_capacity, so every tiling below yields at least two groups
    let mut level: Vec<Node> = str_load::tile(entries, leaf_capacity)
        .into_iter()
        .map(Node::leaf)
        .collect();
    while level.len() > QUAD_FANOUT {
        level = str_load::tile(level, QUAD_FANOUT)
            .into_iter()
            .map(group_node)
            .collect();
    }
    Node::internal(level)
}

/// 单元素分组直接上提，避免只有一个子节点的内部节点
fn group_node(mut group: Vec<Node>) -> Node {
    if group.len() == 1 {
        if let Some(only) = group.pop() {
            return only;
        }
    }
    Node::internal(group)
}
