use crate::domain::street::Street;
use crate::index::algorithms::knn::KnnStats;
use crate::storage::geometry_list::Neighbor;
use crate::storage::geometry_utils::geometry_to_geojson;
use colored::*;
use serde_json::json;

pub struct OutputFormatter;

impl OutputFormatter {
    /// 最近邻结果表格
    pub fn format_neighbors(neighbors: &[Neighbor<'_, Street>]) -> String {
        if neighbors.is_empty() {
            return "(no streets found)".yellow().to_string();
        }

        let mut result = String::new();
        for (rank, neighbor) in neighbors.iter().enumerate() {
            let street = neighbor.item;
            result.push_str(&format!(
                "{}) {} {} {}\n",
                (rank + 1).to_string().blue(),
                Self::format_name(street),
                Self::format_class(street),
                format!("{:.6}", neighbor.distance).cyan(),
            ));
            if let Some(details) = Self::format_details(street) {
                result.push_str(&format!("   {}\n", details.dimmed()));
            }
        }
        result.trim_end().to_string()
    }

    fn format_name(street: &Street) -> String {
        match (&street.name, &street.reference) {
            (Some(name), Some(reference)) => format!("{} ({})", name.green(), reference),
            (Some(name), None) => name.green().to_string(),
            (None, Some(reference)) => reference.green().to_string(),
            (None, None) => "<unnamed>".yellow().to_string(),
        }
    }

    fn format_class(street: &Street) -> String {
        match street.road_class {
            Some(class) if class.is_for_car() => format!("[{}]", class),
            Some(class) => format!("[{}]", class).red().to_string(),
            None => "[?]".red().to_string(),
        }
    }

    fn format_details(street: &Street) -> Option<String> {
        let mut details = Vec::new();
        if let Some(speed) = street.max_speed {
            details.push(format!("{} km/h", speed));
        }
        if street.one_way == Some(true) {
            details.push("one-way".to_string());
        }
        if street.bridge == Some(true) {
            details.push("bridge".to_string());
        }
        if street.tunnel == Some(true) {
            details.push("tunnel".to_string());
        }
        if details.is_empty() {
            None
        } else {
            Some(details.join(", "))
        }
    }

    /// JSON 输出，几何体为 GeoJSON
    pub fn neighbors_to_json(
        x: f64,
        y: f64,
        neighbors: &[Neighbor<'_, Street>],
    ) -> serde_json::Value {
        let results: Vec<serde_json::Value> = neighbors
            .iter()
            .map(|neighbor| {
                let street = neighbor.item;
                json!({
                    "position": neighbor.position,
                    "distance": neighbor.distance,
                    "name": street.name,
                    "ref": street.reference,
                    "fclass": street.road_class,
                    "oneway": street.one_way,
                    "maxspeed": street.max_speed,
                    "bridge": street.bridge,
                    "tunnel": street.tunnel,
                    "for_car": street.is_for_car(),
                    "geometry": geometry_to_geojson(&street.geometry),
                })
            })
            .collect();
        json!({ "query": [x, y], "results": results })
    }

    pub fn format_stats(stats: &KnnStats) -> String {
        format!(
            "visited {} nodes, pruned {}, scored {} streets, filtered {}",
            stats.nodes_visited.to_string().cyan(),
            stats.nodes_pruned.to_string().cyan(),
            stats.entries_scored.to_string().cyan(),
            stats.entries_filtered.to_string().cyan(),
        )
    }

    pub fn format_load_summary(loaded: usize, skipped: usize) -> String {
        if skipped == 0 {
            format!("Loaded {} streets", loaded.to_string().green())
        } else {
            format!(
                "Loaded {} streets ({} features skipped)",
                loaded.to_string().green(),
                skipped.to_string().yellow()
            )
        }
    }

    pub fn format_error(err: &str) -> String {
        format!("(error) {}", err.red())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::street::RoadClass;
    use geo::{Geometry, LineString};

    fn street() -> Street {
        let line = LineString::from(vec![(0.0, 0.0), (1.0, 0.0)]);
        let mut street = Street::new(Geometry::LineString(line))
            .with_name("Via Po")
            .with_road_class(RoadClass::Tertiary);
        street.max_speed = Some(30);
        street.one_way = Some(true);
        street
    }

    #[test]
    fn test_format_neighbors() {
        let street = street();
        let neighbors = vec![Neighbor {
            item: &street,
            position: 4,
            distance: 0.25,
        }];
        let result = OutputFormatter::format_neighbors(&neighbors);
        // 注意：测试时不检查颜色代码，只检查内容
        assert!(result.contains("Via Po"));
        assert!(result.contains("tertiary"));
        assert!(result.contains("0.250000"));
        assert!(result.contains("30 km/h, one-way"));
    }

    #[test]
    fn test_format_empty() {
        assert!(OutputFormatter::format_neighbors(&[]).contains("no streets"));
    }

    #[test]
    fn test_neighbors_to_json() {
        let street = street();
        let neighbors = vec![Neighbor {
            item: &street,
            position: 4,
            distance: 0.25,
        }];
        let value = OutputFormatter::neighbors_to_json(0.5, 0.25, &neighbors);

        assert_eq!(value["query"][0], 0.5);
        assert_eq!(value["results"][0]["position"], 4);
        assert_eq!(value["results"][0]["fclass"], "tertiary");
        assert_eq!(value["results"][0]["for_car"], true);
        assert_eq!(value["results"][0]["geometry"]["type"], "LineString");
    }

    #[test]
    fn test_format_load_summary() {
        assert!(OutputFormatter::format_load_summary(10, 0).contains("10"));
        assert!(OutputFormatter::format_load_summary(10, 2).contains("skipped"));
    }
}
