use crate::index::envelope::Envelope;
use geo::{BoundingRect, CoordsIter, Geometry};

/// 从 geo::Geometry 计算包络，空几何体返回 `None`
pub fn geometry_to_envelope(geometry: &Geometry<f64>) -> Option<Envelope> {
    geometry
        .bounding_rect()
        .map(|rect| Envelope::new(rect.min().x, rect.min().y, rect.max().x, rect.max().y))
}

/// 所有坐标都是有限值（没有 NaN 或无穷大）
pub fn coords_are_finite(geometry: &Geometry<f64>) -> bool {
    geometry
        .coords_iter()
        .all(|coord| coord.x.is_finite() && coord.y.is_finite())
}

/// 将 geo::Geometry 转换为 serde_json::Value (GeoJSON)
pub fn geometry_to_geojson(geometry: &Geometry<f64>) -> serde_json::Value {
    let geometry = geojson::Geometry::new(geojson::Value::from(geometry));
    serde_json::Value::Object(geojson::JsonObject::from(&geometry))
}
