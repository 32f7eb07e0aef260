//! Exact planar distance from a query point to a geometry.
//!
//! Street geometries are lines, so the distance is measured to the closest point
//! on the geometry (perpendicular foot on a segment, or an endpoint), never to the
//! envelope. Polygons containing the query point are at distance zero.

use geo::{Closest, ClosestPoint, Contains, Geometry, LineString, Point, Polygon};

/// 两点之间的欧氏距离
pub fn euclidean_distance(x1: f64, y1: f64, x2: f64, y2: f64) -> f64 {
    (x2 - x1).hypot(y2 - y1)
}

fn closest_distance(closest: Closest<f64>, query: &Point<f64>) -> f64 {
    match closest {
        Closest::Intersection(_) => 0.0,
        Closest::SinglePoint(p) => euclidean_distance(query.x(), query.y(), p.x(), p.y()),
        Closest::Indeterminate => f64::INFINITY,
    }
}

fn point_to_linestring(query: &Point<f64>, ls: &LineString<f64>) -> f64 {
    closest_distance(ls.closest_point(query), query)
}

fn point_to_polygon(query: &Point<f64>, poly: &Polygon<f64>) -> f64 {
    if poly.contains(query) {
        return 0.0;
    }
    // 外环和内环（洞）中最近的边界
    std::iter::once(poly.exterior())
        .chain(poly.interiors())
        .map(|ring| point_to_linestring(query, ring))
        .fold(f64::INFINITY, f64::min)
}

/// Distance from `(x, y)` to the closest point of `geometry`.
///
/// Returns `f64::INFINITY` for empty geometries, which therefore never win a slot
/// in a nearest-neighbor result.
pub fn point_to_geometry_distance(x: f64, y: f64, geometry: &Geometry<f64>) -> f64 {
    let query = Point::new(x, y);

    match geometry {
        Geometry::Point(p) => euclidean_distance(x, y, p.x(), p.y()),
        Geometry::Line(line) => closest_distance(line.closest_point(&query), &query),
        Geometry::LineString(ls) => point_to_linestring(&query, ls),
        Geometry::Polygon(poly) => point_to_polygon(&query, poly),
        Geometry::MultiPoint(mp) => mp
            .iter()
            .map(|p| euclidean_distance(x, y, p.x(), p.y()))
            .fold(f64::INFINITY, f64::min),
        Geometry::MultiLineString(mls) => mls
            .iter()
            .map(|ls| point_to_linestring(&query, ls))
            .fold(f64::INFINITY, f64::min),
        Geometry::MultiPolygon(mp) => mp
            .iter()
            .map(|poly| point_to_polygon(&query, poly))
            .fold(f64::INFINITY, f64::min),
        Geometry::GeometryCollection(gc) => gc
            .iter()
            .map(|g| point_to_geometry_distance(x, y, g))
            .fold(f64::INFINITY, f64::min),
        Geometry::Rect(rect) => point_to_polygon(&query, &rect.to_polygon()),
        Geometry::Triangle(tri) => point_to_polygon(&query, &tri.to_polygon()),
    }
}
