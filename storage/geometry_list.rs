//! Typed spatial objects paired with the index built over their envelopes.

use super::geometry_utils::{coords_are_finite, geometry_to_envelope};
use crate::index::algorithms::distance::point_to_geometry_distance;
use crate::index::envelope::Envelope;
use crate::index::error::{IndexError, IndexResult};
use crate::index::node::IndexedEntry;
use crate::index::spatial_index::{IndexOptions, SpatialIndex};
use crate::index::KnnStats;
use geo::Geometry;
use tracing::debug;

/// Capability of anything that can be stored in a [`GeometryList`].
pub trait Spatial {
    fn geometry(&self) -> &Geometry<f64>;

    /// Default usability check applied by [`GeometryList::knn_query`].
    fn is_usable(&self) -> bool {
        true
    }
}

impl Spatial for Geometry<f64> {
    fn geometry(&self) -> &Geometry<f64> {
        self
    }
}

/// A KNN result translated back to the caller's object
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor<'a, T> {
    pub item: &'a T,
    /// 在原始序列中的位置
    pub position: usize,
    pub distance: f64,
}

/// 空间对象集合及其索引，构建后只读
#[derive(Debug, Clone)]
pub struct GeometryList<T> {
    items: Vec<T>,
    index: SpatialIndex,
}

impl<T: Spatial> GeometryList<T> {
    /// Build the index over every item's envelope.
    ///
    /// An item with an empty geometry is an `InvalidArgument`; one with NaN or
    /// infinite coordinates is a `BuildFailure`. Both name the item position.
    pub fn build(items: Vec<T>, options: IndexOptions) -> IndexResult<Self> {
        let entries = items
            .iter()
            .enumerate()
            .map(|(position, item)| entry_for(position, item.geometry()))
            .collect::<IndexResult<Vec<_>>>()?;

        let index = SpatialIndex::build_with(entries, options)?;
        debug!(items = items.len(), index_type = %options.index_type, "geometry list built");
        Ok(GeometryList { items, index })
    }

    /// The `k` items closest to `(x, y)` by true geometry distance.
    ///
    /// With `include_unusable == false` items whose [`Spatial::is_usable`] is false
    /// are skipped without taking a result slot.
    pub fn knn_query(
        &self,
        x: f64,
        y: f64,
        k: usize,
        include_unusable: bool,
    ) -> IndexResult<Vec<Neighbor<'_, T>>> {
        self.knn_query_with(x, y, k, |item| include_unusable || item.is_usable())
    }

    /// Like [`knn_query`](Self::knn_query) with a caller-supplied usability predicate.
    pub fn knn_query_with<P>(
        &self,
        x: f64,
        y: f64,
        k: usize,
        usable: P,
    ) -> IndexResult<Vec<Neighbor<'_, T>>>
    where
        P: Fn(&T) -> bool,
    {
        self.knn_query_with_stats(x, y, k, usable).map(|(neighbors, _)| neighbors)
    }

    pub fn knn_query_with_stats<P>(
        &self,
        x: f64,
        y: f64,
        k: usize,
        usable: P,
    ) -> IndexResult<(Vec<Neighbor<'_, T>>, KnnStats)>
    where
        P: Fn(&T) -> bool,
    {
        let (hits, stats) = self.index.knn_with_stats(
            x,
            y,
            k,
            |entry| {
                self.items
                    .get(entry.payload)
                    .map_or(f64::INFINITY, |item| {
                        point_to_geometry_distance(x, y, item.geometry())
                    })
            },
            |payload| self.items.get(payload).is_some_and(&usable),
        )?;

        let neighbors = hits
            .into_iter()
            .filter_map(|hit| {
                self.items.get(hit.payload).map(|item| Neighbor {
                    item,
                    position: hit.payload,
                    distance: hit.distance,
                })
            })
            .collect();
        Ok((neighbors, stats))
    }

    /// 返回包络与查询包络相交的所有对象，按原始顺序
    pub fn intersecting(&self, query: &Envelope) -> Vec<&T> {
        self.index
            .search_envelope(query)
            .into_iter()
            .filter_map(|payload| self.items.get(payload))
            .collect()
    }
}

impl<T> GeometryList<T> {
    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn get(&self, position: usize) -> Option<&T> {
        self.items.get(position)
    }

    pub fn index(&self) -> &SpatialIndex {
        &self.index
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// 释放索引，取回原始对象
    pub fn into_items(self) -> Vec<T> {
        self.items
    }
}

fn entry_for(position: usize, geometry: &Geometry<f64>) -> IndexResult<IndexedEntry> {
    if !coords_are_finite(geometry) {
        return Err(IndexError::BuildFailure {
            position,
            reason: "geometry has non-finite coordinates".to_string(),
        });
    }
    let envelope = geometry_to_envelope(geometry).ok_or_else(|| {
        IndexError::invalid(format!("item {} has an empty geometry", position))
    })?;
    Ok(IndexedEntry::new(envelope, position))
}
