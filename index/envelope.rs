use derive_more::Display;
use serde::{Deserialize, Serialize};

/// 轴对齐边界框 - 索引中每个几何体和每个节点的包络
#[derive(Debug, Display, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[display(fmt = "Envelope({}, {}, {}, {})", min_x, min_y, max_x, max_y)]
pub struct Envelope {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Envelope {
    /// 创建新的包络（不做校验，校验在建索引时进行）
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Envelope {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// 创建一个点包络
    pub fn from_point(x: f64, y: f64) -> Self {
        Envelope::new(x, y, x, y)
    }

    /// 所有坐标都是有限值
    pub fn is_finite(&self) -> bool {
        self.min_x.is_finite()
            && self.min_y.is_finite()
            && self.max_x.is_finite()
            && self.max_y.is_finite()
    }

    /// min <= max on both axes. NaN bounds are never ordered.
    pub fn is_ordered(&self) -> bool {
        self.min_x <= self.max_x && self.min_y <= self.max_y
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// 计算矩形面积
    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    /// 计算矩形中心点
    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    /// 计算两个矩形的并集
    pub fn union(&self, other: &Envelope) -> Envelope {
        Envelope {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    /// Minimal envelope covering every envelope yielded by `iter`, or `None` when empty.
    pub fn union_all<'a, I>(iter: I) -> Option<Envelope>
    where
        I: IntoIterator<Item = &'a Envelope>,
    {
        iter.into_iter()
            .copied()
            .reduce(|acc, env| acc.union(&env))
    }

    /// 判断两个矩形是否相交（边界接触也算相交）
    pub fn intersects(&self, other: &Envelope) -> bool {
        self.min_x <= other.max_x
            && self.max_x >= other.min_x
            && self.min_y <= other.max_y
            && self.max_y >= other.min_y
    }

    /// 判断当前矩形是否包含另一个矩形
    pub fn contains(&self, other: &Envelope) -> bool {
        self.min_x <= other.min_x
            && self.min_y <= other.min_y
            && self.max_x >= other.max_x
            && self.max_y >= other.max_y
    }

    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        self.min_x <= x && x <= self.max_x && self.min_y <= y && y <= self.max_y
    }

    /// Euclidean distance from `(x, y)` to the closest point on or inside the box.
    /// Zero when the point lies inside.
    pub fn distance_to_point(&self, x: f64, y: f64) -> f64 {
        let dx = axis_gap(x, x, self.min_x, self.max_x);
        let dy = axis_gap(y, y, self.min_y, self.max_y);
        dx.hypot(dy)
    }

    /// Euclidean distance between the closest points of two boxes. Zero when they intersect.
    pub fn distance(&self, other: &Envelope) -> f64 {
        let dx = axis_gap(self.min_x, self.max_x, other.min_x, other.max_x);
        let dy = axis_gap(self.min_y, self.max_y, other.min_y, other.max_y);
        dx.hypot(dy)
    }
}

/// Gap between intervals `[a_min, a_max]` and `[b_min, b_max]`, zero if they overlap.
fn axis_gap(a_min: f64, a_max: f64, b_min: f64, b_max: f64) -> f64 {
    if a_max < b_min {
        b_min - a_max
    } else if b_max < a_min {
        a_min - b_max
    } else {
        0.0
    }
}

/// Circular buffer region, indexed through its bounding square.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    pub center_x: f64,
    pub center_y: f64,
    pub radius: f64,
}

impl Circle {
    pub fn new(center_x: f64, center_y: f64, radius: f64) -> Self {
        Circle {
            center_x,
            center_y,
            radius,
        }
    }

    /// 最小外接矩形
    pub fn mbr(&self) -> Envelope {
        Envelope::new(
            self.center_x - self.radius,
            self.center_y - self.radius,
            self.center_x + self.radius,
            self.center_y + self.radius,
        )
    }
}

/// Anything the index can order or prune through an envelope.
///
/// Envelopes are computed when the implementing value is built, so ordering and
/// pruning never inspect the concrete geometry type.
pub trait Boundable {
    fn envelope(&self) -> Envelope;
}

impl Boundable for Envelope {
    fn envelope(&self) -> Envelope {
        *self
    }
}

impl Boundable for Circle {
    fn envelope(&self) -> Envelope {
        self.mbr()
    }
}

impl<B: Boundable + ?Sized> Boundable for &B {
    fn envelope(&self) -> Envelope {
        (**self).envelope()
    }
}
