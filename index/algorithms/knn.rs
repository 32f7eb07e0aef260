//! K-Nearest Neighbors (KNN) search over a built spatial index.
//!
//! ## Algorithm Overview
//!
//! Branch-and-bound with a best-first worklist:
//!
//! 1. A min-heap holds nodes keyed by the distance from the query point to the
//!    node's envelope ([`CenterDistanceComparator`]). It starts with the root.
//! 2. A bounded result set keeps the best `k` hits seen so far. Its worst hit is
//!    the eviction candidate and the pruning threshold.
//! 3. Pop the closest node. Once the set is full and the node's envelope distance
//!    is strictly greater than the worst kept distance, nothing left in the heap
//!    can improve the answer: a node's envelope covers all of its descendants, so
//!    the envelope distance is a lower bound for every payload below it.
//! 4. Leaf entries are scored with the caller's exact distance (true geometry
//!    distance, not the envelope) after passing the usability filter. Filtered
//!    entries never take a result slot.
//! 5. Internal nodes push their children with their envelope distances.
//!
//! Equal distances are ordered by payload position, so the result is exactly what
//! a stable linear scan over the original entry sequence would return.

use super::super::error::{IndexError, IndexResult};
use super::super::node::{IndexedEntry, Node, PayloadRef};
use super::super::spatial_index::SpatialIndex;
use super::ordering::{compare_f64, CenterDistanceComparator};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use tracing::debug;

/// Result of a KNN search: a payload reference and its distance to the query point
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct KnnHit {
    pub payload: PayloadRef,
    pub distance: f64,
}

impl KnnHit {
    /// Ascending distance, then ascending payload position.
    fn rank(&self, other: &KnnHit) -> Ordering {
        compare_f64(self.distance, other.distance).then(self.payload.cmp(&other.payload))
    }
}

/// Work counters for a single query
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct KnnStats {
    /// 被展开的节点数
    pub nodes_visited: usize,
    /// 因下界大于当前第 k 个距离而被丢弃的节点数
    pub nodes_pruned: usize,
    /// 计算了精确距离的条目数
    pub entries_scored: usize,
    /// 被可用性过滤器跳过的条目数
    pub entries_filtered: usize,
}

/// Entry in the worklist. `seq` breaks distance ties in push order so the
/// traversal is deterministic.
struct QueueEntry<'a> {
    min_distance: f64,
    seq: usize,
    node: &'a Node,
}

// BinaryHeap is a max-heap, so the ordering is reversed for min-heap behavior
impl PartialEq for QueueEntry<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for QueueEntry<'_> {}

impl PartialOrd for QueueEntry<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueEntry<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        compare_f64(other.min_distance, self.min_distance).then(other.seq.cmp(&self.seq))
    }
}

/// 容量为 k 的有界结果集，按 (距离, 载荷位置) 升序保存
struct BoundedResults {
    k: usize,
    hits: Vec<KnnHit>,
}

impl BoundedResults {
    fn new(k: usize) -> Self {
        BoundedResults {
            k,
            hits: Vec::with_capacity(k.min(1024) + 1),
        }
    }

    /// Distance of the current k-th best hit, only once the set is full.
    fn threshold(&self) -> Option<f64> {
        if self.hits.len() >= self.k {
            self.hits.last().map(|hit| hit.distance)
        } else {
            None
        }
    }

    /// True when a candidate at `distance` cannot enter the set.
    fn excludes(&self, distance: f64) -> bool {
        self.threshold().is_some_and(|worst| distance > worst)
    }

    fn offer(&mut self, hit: KnnHit) {
        let position = self
            .hits
            .partition_point(|kept| kept.rank(&hit) == Ordering::Less);
        if position >= self.k {
            return;
        }
        self.hits.insert(position, hit);
        if self.hits.len() > self.k {
            self.hits.pop();
        }
    }

    fn into_sorted(self) -> Vec<KnnHit> {
        self.hits
    }
}

/// 校验查询参数：k 必须 >= 1，查询点必须是有限值
pub(crate) fn validate_query(query_x: f64, query_y: f64, k: usize) -> IndexResult<()> {
    if k == 0 {
        return Err(IndexError::invalid("k must be at least 1"));
    }
    if !query_x.is_finite() || !query_y.is_finite() {
        return Err(IndexError::invalid(format!(
            "query point ({}, {}) must have finite coordinates",
            query_x, query_y
        )));
    }
    Ok(())
}

/// Perform KNN search starting at `root`.
///
/// # Arguments
///
/// * `root` - Root node, `None` for an empty index
/// * `query_x`, `query_y` - Query point coordinates
/// * `k` - Number of nearest neighbors to find, at least 1
/// * `exact_distance` - True distance from the query point to an entry's payload.
///   Must never be smaller than the distance to the entry's envelope.
/// * `usable` - Entries for which this returns `false` are skipped
///
/// # Returns
///
/// At most `k` hits sorted by ascending distance, plus the work counters.
pub fn knn_search_with_stats<D, U>(
    root: Option<&Node>,
    query_x: f64,
    query_y: f64,
    k: usize,
    exact_distance: D,
    usable: U,
) -> IndexResult<(Vec<KnnHit>, KnnStats)>
where
    D: Fn(&IndexedEntry) -> f64,
    U: Fn(PayloadRef) -> bool,
{
    validate_query(query_x, query_y, k)?;

    let mut stats = KnnStats::default();
    let Some(root) = root else {
        return Ok((Vec::new(), stats));
    };

    let comparator = CenterDistanceComparator::new(query_x, query_y);
    let mut results = BoundedResults::new(k);
    let mut heap = BinaryHeap::new();
    let mut seq = 0;

    heap.push(QueueEntry {
        min_distance: comparator.distance(root),
        seq,
        node: root,
    });

    while let Some(entry) = heap.pop() {
        // 堆按下界升序弹出：一旦当前节点被剪枝，剩余节点都可以剪枝
        if results.excludes(entry.min_distance) {
            stats.nodes_pruned += 1 + heap.len();
            break;
        }
        stats.nodes_visited += 1;

        match entry.node {
            Node::Leaf { entries, .. } => {
                for indexed in entries {
                    if results.excludes(comparator.distance(indexed)) {
                        continue;
                    }
                    if !usable(indexed.payload) {
                        stats.entries_filtered += 1;
                        continue;
                    }
                    stats.entries_scored += 1;
                    results.offer(KnnHit {
                        payload: indexed.payload,
                        distance: exact_distance(indexed),
                    });
                }
            }
            Node::Internal { children, .. } => {
                for child in children {
                    let min_distance = comparator.distance(child);
                    if results.excludes(min_distance) {
                        stats.nodes_pruned += 1;
                        continue;
                    }
                    seq += 1;
                    heap.push(QueueEntry {
                        min_distance,
                        seq,
                        node: child,
                    });
                }
            }
        }
    }

    let hits = results.into_sorted();
    debug!(
        k,
        found = hits.len(),
        visited = stats.nodes_visited,
        pruned = stats.nodes_pruned,
        scored = stats.entries_scored,
        filtered = stats.entries_filtered,
        "knn query finished"
    );
    Ok((hits, stats))
}

/// [`knn_search_with_stats`] without the counters.
pub fn knn_search<D, U>(
    root: Option<&Node>,
    query_x: f64,
    query_y: f64,
    k: usize,
    exact_distance: D,
    usable: U,
) -> IndexResult<Vec<KnnHit>>
where
    D: Fn(&IndexedEntry) -> f64,
    U: Fn(PayloadRef) -> bool,
{
    knn_search_with_stats(root, query_x, query_y, k, exact_distance, usable).map(|(hits, _)| hits)
}

/// KNN 查询相关方法
impl SpatialIndex {
    /// Nearest entries ranked by envelope distance, for payloads that are boxes.
    pub fn knn<U>(
        &self,
        query_x: f64,
        query_y: f64,
        k: usize,
        usable: U,
    ) -> IndexResult<Vec<KnnHit>>
    where
        U: Fn(PayloadRef) -> bool,
    {
        knn_search(
            self.root(),
            query_x,
            query_y,
            k,
            |entry| entry.envelope.distance_to_point(query_x, query_y),
            usable,
        )
    }

    /// Nearest entries ranked by a caller-supplied exact distance.
    pub fn knn_by<D, U>(
        &self,
        query_x: f64,
        query_y: f64,
        k: usize,
        exact_distance: D,
        usable: U,
    ) -> IndexResult<Vec<KnnHit>>
    where
        D: Fn(&IndexedEntry) -> f64,
        U: Fn(PayloadRef) -> bool,
    {
        knn_search(self.root(), query_x, query_y, k, exact_distance, usable)
    }

    pub fn knn_with_stats<D, U>(
        &self,
        query_x: f64,
        query_y: f64,
        k: usize,
        exact_distance: D,
        usable: U,
    ) -> IndexResult<(Vec<KnnHit>, KnnStats)>
    where
        D: Fn(&IndexedEntry) -> f64,
        U: Fn(PayloadRef) -> bool,
    {
        knn_search_with_stats(self.root(), query_x, query_y, k, exact_distance, usable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::envelope::Envelope;
    use crate::index::spatial_index::IndexType;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    const BOTH: [IndexType; 2] = [IndexType::Quadtree, IndexType::Rtree];

    fn entries_of(boxes: &[Envelope]) -> Vec<IndexedEntry> {
        boxes
            .iter()
            .enumerate()
            .map(|(i, env)| IndexedEntry::new(*env, i))
            .collect()
    }

    fn random_boxes(count: usize, seed: u64) -> Vec<Envelope> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..count)
            .map(|_| {
                let x = rng.gen_range(0.0..1000.0);
                let y = rng.gen_range(0.0..1000.0);
                let w = rng.gen_range(0.0..20.0);
                let h = rng.gen_range(0.0..20.0);
                Envelope::new(x, y, x + w, y + h)
            })
            .collect()
    }

    /// Brute force: score every box, stable sort, truncate.
    fn linear_scan<U: Fn(usize) -> bool>(
        boxes: &[Envelope],
        x: f64,
        y: f64,
        k: usize,
        usable: U,
    ) -> Vec<KnnHit> {
        let mut hits: Vec<KnnHit> = boxes
            .iter()
            .enumerate()
            .filter(|(i, _)| usable(*i))
            .map(|(i, env)| KnnHit {
                payload: i,
                distance: env.distance_to_point(x, y),
            })
            .collect();
        hits.sort_by(|a, b| compare_f64(a.distance, b.distance));
        hits.truncate(k);
        hits
    }

    #[test]
    fn test_bounded_results_ties_broken_by_payload_position() {
        let mut results = BoundedResults::new(2);
        results.offer(KnnHit { payload: 3, distance: 5.0 });
        results.offer(KnnHit { payload: 1, distance: 1.0 });
        assert_eq!(results.threshold(), Some(5.0));

        // 距离相同、位置更靠后的候选不能替换已保留的条目
        results.offer(KnnHit { payload: 7, distance: 5.0 });
        // 距离相同、位置更靠前的候选会替换
        results.offer(KnnHit { payload: 2, distance: 5.0 });

        let payloads: Vec<usize> = results.into_sorted().iter().map(|h| h.payload).collect();
        assert_eq!(payloads, vec![1, 2]);
    }

    #[test]
    fn test_knn_concrete_scenario() {
        let boxes = [
            Envelope::new(0.0, 0.0, 1.0, 1.0), // A
            Envelope::new(5.0, 5.0, 6.0, 6.0), // B
            Envelope::new(0.5, 0.5, 1.5, 1.5), // C
        ];
        for index_type in BOTH {
            let index = SpatialIndex::build(entries_of(&boxes), index_type, 2).unwrap();
            let hits = index.knn(0.0, 0.0, 2, |_| true).unwrap();

            assert_eq!(hits.len(), 2);
            assert_eq!(hits[0].payload, 0);
            assert_eq!(hits[0].distance, 0.0);
            assert_eq!(hits[1].payload, 2);
            assert!((hits[1].distance - 0.5_f64.hypot(0.5)).abs() < 1e-12);
        }
    }

    #[test]
    fn test_knn_empty_index() {
        for index_type in BOTH {
            let index = SpatialIndex::build(Vec::new(), index_type, 4).unwrap();
            for k in [1, 5, 100] {
                assert!(index.knn(1.0, 1.0, k, |_| true).unwrap().is_empty());
            }
        }
    }

    #[test]
    fn test_knn_k_zero_is_invalid_argument() {
        let index =
            SpatialIndex::build(entries_of(&random_boxes(10, 1)), IndexType::Rtree, 4).unwrap();
        let err = index.knn(0.0, 0.0, 0, |_| true).unwrap_err();
        assert!(matches!(err, IndexError::InvalidArgument { .. }));

        // 空索引同样先校验参数
        let empty = SpatialIndex::empty(IndexType::Quadtree);
        assert!(empty.knn(0.0, 0.0, 0, |_| true).is_err());
    }

    #[test]
    fn test_knn_non_finite_query_point() {
        let boxes = random_boxes(10, 2);
        let index = SpatialIndex::build(entries_of(&boxes), IndexType::Quadtree, 4).unwrap();
        assert!(index.knn(f64::NAN, 0.0, 1, |_| true).is_err());
        assert!(index.knn(0.0, f64::INFINITY, 1, |_| true).is_err());
    }

    #[test]
    fn test_knn_k_greater_than_items() {
        let boxes = random_boxes(7, 3);
        for index_type in BOTH {
            let index = SpatialIndex::build(entries_of(&boxes), index_type, 2).unwrap();
            let hits = index.knn(500.0, 500.0, 50, |_| true).unwrap();
            assert_eq!(hits, linear_scan(&boxes, 500.0, 500.0, 50, |_| true));
            assert_eq!(hits.len(), 7);
        }
    }

    #[test]
    fn test_knn_skips_unusable_nearest() {
        let boxes = [
            Envelope::new(0.0, 0.0, 0.0, 0.0),   // D: 最近但不可用
            Envelope::new(3.0, 0.0, 3.0, 0.0),
            Envelope::new(10.0, 0.0, 10.0, 0.0),
        ];
        for index_type in BOTH {
            let index = SpatialIndex::build(entries_of(&boxes), index_type, 2).unwrap();
            let hits = index.knn(0.0, 0.0, 1, |payload| payload != 0).unwrap();
            assert_eq!(hits.len(), 1);
            assert_eq!(hits[0].payload, 1);
            assert_eq!(hits[0].distance, 3.0);
        }
    }

    #[test]
    fn test_knn_ties_keep_entry_order() {
        // 四个条目到原点的距离都为 1
        let boxes = [
            Envelope::new(20.0, 20.0, 21.0, 21.0),
            Envelope::new(0.0, 1.0, 0.0, 1.0),
            Envelope::new(1.0, 0.0, 1.0, 0.0),
            Envelope::new(-1.0, 0.0, -1.0, 0.0),
            Envelope::new(0.0, -1.0, 0.0, -1.0),
        ];
        for index_type in BOTH {
            let index = SpatialIndex::build(entries_of(&boxes), index_type, 2).unwrap();

            let hits = index.knn(0.0, 0.0, 3, |_| true).unwrap();
            let payloads: Vec<usize> = hits.iter().map(|h| h.payload).collect();
            assert_eq!(payloads, vec![1, 2, 3]);

            let all = index.knn(0.0, 0.0, 5, |_| true).unwrap();
            let payloads: Vec<usize> = all.iter().map(|h| h.payload).collect();
            assert_eq!(payloads, vec![1, 2, 3, 4, 0]);
        }
    }

    #[test]
    fn test_knn_matches_linear_scan() {
        let boxes = random_boxes(2000, 42);
        let mut rng = StdRng::seed_from_u64(7);

        for index_type in BOTH {
            for capacity in [2, 8, 16] {
                let index = SpatialIndex::build(entries_of(&boxes), index_type, capacity).unwrap();
                for _ in 0..25 {
                    let x = rng.gen_range(-100.0..1100.0);
                    let y = rng.gen_range(-100.0..1100.0);
                    let k = rng.gen_range(1..40);

                    let hits = index.knn(x, y, k, |_| true).unwrap();
                    let expected = linear_scan(&boxes, x, y, k, |_| true);
                    assert_eq!(
                        hits, expected,
                        "{} capacity {} at ({}, {}) k={}",
                        index_type, capacity, x, y, k
                    );
                }
            }
        }
    }

    #[test]
    fn test_quadtree_prunes_stacked_straddlers() {
        // 所有条目都横跨四叉树的 x 中线
        let boxes: Vec<Envelope> = (0..1000)
            .map(|i| Envelope::new(-1.0, i as f64, 1.0, i as f64))
            .collect();
        let index = SpatialIndex::build(entries_of(&boxes), IndexType::Quadtree, 4).unwrap();

        let (hits, stats) = index
            .knn_with_stats(
                0.0,
                500.2,
                3,
                |entry| entry.envelope.distance_to_point(0.0, 500.2),
                |_| true,
            )
            .unwrap();
        let payloads: Vec<usize> = hits.iter().map(|h| h.payload).collect();
        assert_eq!(payloads, vec![500, 501, 499]);
        assert_eq!(hits, linear_scan(&boxes, 0.0, 500.2, 3, |_| true));
        assert!(stats.entries_scored <= 40, "scored {}", stats.entries_scored);
        assert!(stats.nodes_pruned > 0);
    }

    #[test]
    fn test_knn_matches_linear_scan_with_filter() {
        let boxes = random_boxes(500, 11);
        let usable = |payload: usize| payload % 3 != 0;

        for index_type in BOTH {
            let index = SpatialIndex::build(entries_of(&boxes), index_type, 6).unwrap();
            let hits = index.knn(250.0, 750.0, 12, usable).unwrap();
            assert_eq!(hits, linear_scan(&boxes, 250.0, 750.0, 12, usable));
            assert!(hits.iter().all(|h| usable(h.payload)));
        }
    }

    #[test]
    fn test_knn_results_sorted_and_unique() {
        let boxes = random_boxes(300, 5);
        let index = SpatialIndex::build(entries_of(&boxes), IndexType::Quadtree, 4).unwrap();
        let hits = index.knn(100.0, 100.0, 60, |_| true).unwrap();

        assert!(hits.windows(2).all(|w| w[0].distance <= w[1].distance));
        let mut payloads: Vec<usize> = hits.iter().map(|h| h.payload).collect();
        payloads.sort_unstable();
        payloads.dedup();
        assert_eq!(payloads.len(), hits.len());
    }

    #[test]
    fn test_knn_is_idempotent() {
        let boxes = random_boxes(400, 9);
        for index_type in BOTH {
            let index = SpatialIndex::build(entries_of(&boxes), index_type, 8).unwrap();
            let first = index.knn(321.0, 123.0, 10, |_| true).unwrap();
            let second = index.knn(321.0, 123.0, 10, |_| true).unwrap();
            assert_eq!(first, second);
        }
    }

    #[test]
    fn test_knn_prunes_subtrees() {
        let boxes = random_boxes(5000, 13);
        for index_type in BOTH {
            let index = SpatialIndex::build(entries_of(&boxes), index_type, 8).unwrap();
            let (hits, stats) = index
                .knn_with_stats(
                    500.0,
                    500.0,
                    5,
                    |e| e.envelope.distance_to_point(500.0, 500.0),
                    |_| true,
                )
                .unwrap();

            assert_eq!(hits.len(), 5);
            assert!(stats.nodes_pruned > 0);
            // 剪枝后只需要对很小一部分条目计算精确距离
            assert!(stats.entries_scored < boxes.len() / 10, "{:?}", stats);
        }
    }

    #[test]
    fn test_knn_by_exact_distance_reorders_envelope_ties() {
        // 两个包络都包含查询点（包络距离 0），精确距离决定顺序
        let boxes = [
            Envelope::new(0.0, 0.0, 10.0, 10.0),
            Envelope::new(4.0, 4.0, 6.0, 6.0),
        ];
        let exact = [3.0, 1.0];
        let index = SpatialIndex::build(entries_of(&boxes), IndexType::Rtree, 4).unwrap();
        let hits = index
            .knn_by(5.0, 5.0, 2, |e| exact[e.payload], |_| true)
            .unwrap();

        assert_eq!(hits[0].payload, 1);
        assert_eq!(hits[1].payload, 0);
    }

    #[test]
    fn test_knn_filter_counts() {
        let boxes = random_boxes(50, 17);
        let index = SpatialIndex::build(entries_of(&boxes), IndexType::Rtree, 4).unwrap();
        let (hits, stats) = index
            .knn_with_stats(0.0, 0.0, 50, |e| e.envelope.distance_to_point(0.0, 0.0), |_| false)
            .unwrap();

        assert!(hits.is_empty());
        assert_eq!(stats.entries_filtered, 50);
        assert_eq!(stats.entries_scored, 0);
    }
}
