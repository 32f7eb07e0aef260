//! GeoJSON street loader.
//!
//! Reads a FeatureCollection exported from OpenStreetMap road data (for example a
//! Geofabrik `roads` layer converted with ogr2ogr). Attribute conventions:
//!
//! * `oneway`: `"F"` one-way along the digitized direction, `"T"` one-way against
//!   it, `"B"` both directions. Booleans and `"yes"` / `"no"` are also accepted.
//! * `bridge`, `tunnel`: `"T"` / `"F"` or booleans.
//! * `maxspeed`: km/h, `0` means unknown.
//! * `fclass`: OSM highway class, see [`RoadClass::from_fclass`].

use super::LoadError;
use crate::domain::street::{RoadClass, Street};
use crate::storage::geometry_utils::coords_are_finite;
use geo::{Geometry, LineString};
use geojson::{Feature, GeoJson};
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// 加载结果：接受的道路和跳过的要素数量
#[derive(Debug, Clone, Default)]
pub struct StreetLoad {
    pub streets: Vec<Street>,
    /// 几何体缺失、不是线或坐标非法而被跳过的要素数
    pub skipped: usize,
}

/// 从文件加载道路
pub fn load_streets_geojson(path: impl AsRef<Path>) -> Result<StreetLoad, LoadError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)?;
    let load = parse_streets_geojson(&text)?;
    debug!(
        path = %path.display(),
        streets = load.streets.len(),
        skipped = load.skipped,
        "streets loaded"
    );
    Ok(load)
}

/// Parse a FeatureCollection (or a single Feature) of street lines.
pub fn parse_streets_geojson(text: &str) -> Result<StreetLoad, LoadError> {
    let features = match text.parse::<GeoJson>()? {
        GeoJson::FeatureCollection(collection) => collection.features,
        GeoJson::Feature(feature) => vec![feature],
        GeoJson::Geometry(_) => {
            return Err(LoadError::Malformed {
                record: 0,
                reason: "expected a FeatureCollection or Feature, found a bare geometry"
                    .to_string(),
            })
        }
    };

    let mut load = StreetLoad::default();
    for (record, feature) in features.into_iter().enumerate() {
        match street_lines(&feature) {
            Ok(lines) => {
                let template = street_attributes(&feature);
                load.streets.extend(lines.into_iter().map(|line| Street {
                    geometry: Geometry::LineString(line),
                    ..template.clone()
                }));
            }
            Err(reason) => {
                warn!(record, reason = %reason, "skipping street feature");
                load.skipped += 1;
            }
        }
    }
    Ok(load)
}

/// 提取并校验要素的线几何，多线串拆分为多条
fn street_lines(feature: &Feature) -> Result<Vec<LineString<f64>>, String> {
    let geometry = feature
        .geometry
        .clone()
        .ok_or_else(|| "feature has no geometry".to_string())?;
    let geometry: Geometry<f64> = geometry
        .try_into()
        .map_err(|e: geojson::Error| format!("unconvertible geometry: {}", e))?;

    if !coords_are_finite(&geometry) {
        return Err("geometry has non-finite coordinates".to_string());
    }

    let lines = match geometry {
        Geometry::LineString(line) => vec![line],
        Geometry::MultiLineString(multi) => multi.0,
        other => {
            return Err(format!(
                "expected LineString or MultiLineString, found {}",
                geometry_name(&other)
            ))
        }
    };

    if let Some(short) = lines.iter().find(|line| line.0.len() < 2) {
        return Err(format!("line with {} point(s)", short.0.len()));
    }
    if lines.is_empty() {
        return Err("empty MultiLineString".to_string());
    }
    Ok(lines)
}

fn geometry_name(geometry: &Geometry<f64>) -> &'static str {
    match geometry {
        Geometry::Point(_) => "Point",
        Geometry::Line(_) => "Line",
        Geometry::LineString(_) => "LineString",
        Geometry::Polygon(_) => "Polygon",
        Geometry::MultiPoint(_) => "MultiPoint",
        Geometry::MultiLineString(_) => "MultiLineString",
        Geometry::MultiPolygon(_) => "MultiPolygon",
        Geometry::GeometryCollection(_) => "GeometryCollection",
        Geometry::Rect(_) => "Rect",
        Geometry::Triangle(_) => "Triangle",
    }
}

/// 读取属性，几何体由调用方填充
fn street_attributes(feature: &Feature) -> Street {
    Street {
        geometry: Geometry::LineString(LineString::new(Vec::new())),
        name: string_property(feature, "name"),
        reference: string_property(feature, "ref"),
        one_way: feature.property("oneway").and_then(parse_one_way),
        bridge: feature.property("bridge").and_then(parse_flag),
        max_speed: feature.property("maxspeed").and_then(parse_max_speed),
        tunnel: feature.property("tunnel").and_then(parse_flag),
        road_class: string_property(feature, "fclass")
            .map(|fclass| RoadClass::from_fclass(&fclass)),
    }
}

fn string_property(feature: &Feature, key: &str) -> Option<String> {
    match feature.property(key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn parse_flag(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "t" | "true" | "yes" | "1" => Some(true),
            "f" | "false" | "no" | "0" => Some(false),
            _ => None,
        },
        Value::Number(n) => n.as_i64().map(|n| n != 0),
        _ => None,
    }
}

fn parse_one_way(value: &Value) -> Option<bool> {
    match value {
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "f" | "t" | "yes" | "true" | "-1" => Some(true),
            "b" | "no" | "false" => Some(false),
            _ => None,
        },
        other => parse_flag(other),
    }
}

fn parse_max_speed(value: &Value) -> Option<u32> {
    let speed = match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    }?;
    u32::try_from(speed).ok().filter(|speed| *speed > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    fn feature(geometry: serde_json::Value, properties: serde_json::Value) -> serde_json::Value {
        json!({ "type": "Feature", "geometry": geometry, "properties": properties })
    }

    fn collection(features: Vec<serde_json::Value>) -> String {
        json!({ "type": "FeatureCollection", "features": features }).to_string()
    }

    fn line(coords: serde_json::Value) -> serde_json::Value {
        json!({ "type": "LineString", "coordinates": coords })
    }

    #[test]
    fn test_parse_street_attributes() {
        let text = collection(vec![feature(
            line(json!([[7.74409, 45.1], [7.74276, 45.10033]])),
            json!({
                "name": "Via Roma",
                "ref": "SP 12",
                "oneway": "F",
                "maxspeed": 50,
                "bridge": "T",
                "tunnel": "F",
                "fclass": "primary"
            }),
        )]);

        let load = parse_streets_geojson(&text).unwrap();
        assert_eq!(load.skipped, 0);
        assert_eq!(load.streets.len(), 1);

        let street = &load.streets[0];
        assert_eq!(street.name.as_deref(), Some("Via Roma"));
        assert_eq!(street.reference.as_deref(), Some("SP 12"));
        assert_eq!(street.one_way, Some(true));
        assert_eq!(street.max_speed, Some(50));
        assert_eq!(street.bridge, Some(true));
        assert_eq!(street.tunnel, Some(false));
        assert_eq!(street.road_class, Some(RoadClass::Primary));
        assert!(street.is_for_car());
    }

    #[test]
    fn test_missing_attributes_are_none() {
        let text = collection(vec![feature(
            line(json!([[0.0, 0.0], [1.0, 1.0]])),
            json!({ "oneway": "B", "maxspeed": 0, "name": "" }),
        )]);

        let street = &parse_streets_geojson(&text).unwrap().streets[0];
        assert_eq!(street.name, None);
        assert_eq!(street.one_way, Some(false));
        assert_eq!(street.max_speed, None);
        assert_eq!(street.road_class, None);
        assert!(!street.is_for_car());
    }

    #[test]
    fn test_multi_line_string_is_flattened() {
        let multi = json!({
            "type": "MultiLineString",
            "coordinates": [[[0.0, 0.0], [1.0, 0.0]], [[5.0, 5.0], [6.0, 5.0], [7.0, 6.0]]]
        });
        let properties = json!({ "name": "Corso Francia", "fclass": "secondary" });
        let text = collection(vec![feature(multi, properties)]);

        let load = parse_streets_geojson(&text).unwrap();
        assert_eq!(load.streets.len(), 2);
        assert!(load.streets.iter().all(|s| {
            s.name.as_deref() == Some("Corso Francia") && s.road_class == Some(RoadClass::Secondary)
        }));
    }

    #[test]
    fn test_invalid_features_are_skipped() {
        let text = collection(vec![
            feature(json!({ "type": "Point", "coordinates": [0.0, 0.0] }), json!({})),
            feature(line(json!([[0.0, 0.0]])), json!({})),
            json!({ "type": "Feature", "geometry": null, "properties": {} }),
            feature(line(json!([[0.0, 0.0], [2.0, 2.0]])), json!({ "fclass": "footway" })),
        ]);

        let load = parse_streets_geojson(&text).unwrap();
        assert_eq!(load.skipped, 3);
        assert_eq!(load.streets.len(), 1);
        assert_eq!(load.streets[0].road_class, Some(RoadClass::Footway));
    }

    #[test]
    fn test_bare_geometry_is_malformed() {
        let text = line(json!([[0.0, 0.0], [1.0, 1.0]])).to_string();
        assert!(matches!(
            parse_streets_geojson(&text),
            Err(LoadError::Malformed { .. })
        ));
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            parse_streets_geojson("{ not json"),
            Err(LoadError::GeoJson(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        use tempfile::NamedTempFile;

        let text = collection(vec![
            feature(line(json!([[0.0, 0.0], [1.0, 0.0]])), json!({ "fclass": "residential" })),
            feature(line(json!([[0.0, 1.0], [1.0, 1.0]])), json!({ "fclass": "path" })),
        ]);
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(text.as_bytes()).unwrap();

        let load = load_streets_geojson(temp_file.path()).unwrap();
        assert_eq!(load.streets.len(), 2);
        assert_eq!(load.streets.iter().filter(|s| s.is_for_car()).count(), 1);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load_streets_geojson("/nonexistent/streets.geojson").unwrap_err();
        assert!(matches!(err, LoadError::Io(_)));
    }

    #[test]
    fn test_flag_parsing() {
        assert_eq!(parse_flag(&json!("T")), Some(true));
        assert_eq!(parse_flag(&json!(false)), Some(false));
        assert_eq!(parse_flag(&json!("maybe")), None);
        assert_eq!(parse_one_way(&json!("T")), Some(true));
        assert_eq!(parse_one_way(&json!("yes")), Some(true));
        assert_eq!(parse_max_speed(&json!("90")), Some(90));
        assert_eq!(parse_max_speed(&json!(-5)), None);
    }
}
