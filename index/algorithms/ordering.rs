//! Orderings over boundable objects.
//!
//! - [`XMinComparator`]: ascending minimum X, used to sort entries for bulk loading
//! - [`YMinComparator`]: ascending minimum Y, used to tile each vertical strip
//! - [`CenterDistanceComparator`]: ascending distance from a query point to the
//!   closest point of the envelope, used to order the KNN worklist
//!
//! All three treat equal keys as equal. Callers rely on `slice::sort_by`, which is
//! stable, so equal keys keep their original sequence order.

use super::super::envelope::Boundable;
use std::cmp::Ordering;

/// Compare two finite keys; equal keys (including `-0.0` vs `0.0`) compare equal.
pub(crate) fn compare_f64(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

/// 按最小 X 坐标升序排序
#[derive(Debug, Default, Clone, Copy)]
pub struct XMinComparator;

impl XMinComparator {
    pub fn compare<A: Boundable, B: Boundable>(&self, a: &A, b: &B) -> Ordering {
        compare_f64(a.envelope().min_x, b.envelope().min_x)
    }

    /// 稳定排序
    pub fn sort<T: Boundable>(&self, items: &mut [T]) {
        items.sort_by(|a, b| self.compare(a, b));
    }
}

/// 按最小 Y 坐标升序排序
#[derive(Debug, Default, Clone, Copy)]
pub struct YMinComparator;

impl YMinComparator {
    pub fn compare<A: Boundable, B: Boundable>(&self, a: &A, b: &B) -> Ordering {
        compare_f64(a.envelope().min_y, b.envelope().min_y)
    }

    pub fn sort<T: Boundable>(&self, items: &mut [T]) {
        items.sort_by(|a, b| self.compare(a, b));
    }
}

/// Orders boxes by distance from a fixed query point to the closest point on or
/// inside each box. This is not centroid distance: a box containing the query
/// point is at distance zero.
#[derive(Debug, Clone, Copy)]
pub struct CenterDistanceComparator {
    query_x: f64,
    query_y: f64,
}

impl CenterDistanceComparator {
    pub fn new(query_x: f64, query_y: f64) -> Self {
        CenterDistanceComparator { query_x, query_y }
    }

    /// 查询点到包络的最小距离
    pub fn distance<A: Boundable>(&self, a: &A) -> f64 {
        a.envelope().distance_to_point(self.query_x, self.query_y)
    }

    pub fn compare<A: Boundable, B: Boundable>(&self, a: &A, b: &B) -> Ordering {
        compare_f64(self.distance(a), self.distance(b))
    }

    pub fn sort<T: Boundable>(&self, items: &mut [T]) {
        items.sort_by(|a, b| self.compare(a, b));
    }
}
