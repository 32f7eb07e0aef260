//! OpenStreetMap street records.

use crate::storage::geometry_list::Spatial;
use derive_more::Display;
use geo::Geometry;
use serde::{Deserialize, Serialize};

/// OSM 道路等级（`fclass` 属性）
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoadClass {
    #[display(fmt = "motorway")]
    Motorway,
    #[display(fmt = "motorway_link")]
    MotorwayLink,
    #[display(fmt = "trunk")]
    Trunk,
    #[display(fmt = "trunk_link")]
    TrunkLink,
    #[display(fmt = "primary")]
    Primary,
    #[display(fmt = "primary_link")]
    PrimaryLink,
    #[display(fmt = "secondary")]
    Secondary,
    #[display(fmt = "secondary_link")]
    SecondaryLink,
    #[display(fmt = "tertiary")]
    Tertiary,
    #[display(fmt = "tertiary_link")]
    TertiaryLink,
    #[display(fmt = "unclassified")]
    Unclassified,
    #[display(fmt = "residential")]
    Residential,
    #[display(fmt = "living_street")]
    LivingStreet,
    #[display(fmt = "service")]
    Service,
    #[display(fmt = "pedestrian")]
    Pedestrian,
    #[display(fmt = "track")]
    Track,
    #[display(fmt = "bridleway")]
    Bridleway,
    #[display(fmt = "cycleway")]
    Cycleway,
    #[display(fmt = "footway")]
    Footway,
    #[display(fmt = "path")]
    Path,
    #[display(fmt = "steps")]
    Steps,
    #[display(fmt = "unknown")]
    Unknown,
}

impl RoadClass {
    /// Parse an OSM `fclass` value, case-insensitive.
    /// Graded tracks (`track_grade1` .. `track_grade5`) map to [`RoadClass::Track`].
    pub fn from_fclass(fclass: &str) -> RoadClass {
        let fclass = fclass.trim().to_ascii_lowercase();
        match fclass.as_str() {
            "motorway" => RoadClass::Motorway,
            "motorway_link" => RoadClass::MotorwayLink,
            "trunk" => RoadClass::Trunk,
            "trunk_link" => RoadClass::TrunkLink,
            "primary" => RoadClass::Primary,
            "primary_link" => RoadClass::PrimaryLink,
            "secondary" => RoadClass::Secondary,
            "secondary_link" => RoadClass::SecondaryLink,
            "tertiary" => RoadClass::Tertiary,
            "tertiary_link" => RoadClass::TertiaryLink,
            "unclassified" => RoadClass::Unclassified,
            "residential" => RoadClass::Residential,
            "living_street" => RoadClass::LivingStreet,
            "service" => RoadClass::Service,
            "pedestrian" => RoadClass::Pedestrian,
            "bridleway" => RoadClass::Bridleway,
            "cycleway" => RoadClass::Cycleway,
            "footway" => RoadClass::Footway,
            "path" => RoadClass::Path,
            "steps" => RoadClass::Steps,
            other if other.starts_with("track") => RoadClass::Track,
            _ => RoadClass::Unknown,
        }
    }

    /// 机动车可通行的道路等级
    pub fn is_for_car(&self) -> bool {
        matches!(
            self,
            RoadClass::Motorway
                | RoadClass::MotorwayLink
                | RoadClass::Trunk
                | RoadClass::TrunkLink
                | RoadClass::Primary
                | RoadClass::PrimaryLink
                | RoadClass::Secondary
                | RoadClass::SecondaryLink
                | RoadClass::Tertiary
                | RoadClass::TertiaryLink
                | RoadClass::Unclassified
                | RoadClass::Residential
                | RoadClass::LivingStreet
                | RoadClass::Service
        )
    }
}

/// A street segment with its optional OSM attributes
#[derive(Debug, Display, Clone, PartialEq, Serialize, Deserialize)]
#[display(fmt = "Street({}, {})", "self.label()", "self.class_name()")]
pub struct Street {
    pub geometry: Geometry<f64>,
    pub name: Option<String>,
    /// 道路编号，例如 "SP 12"
    pub reference: Option<String>,
    pub one_way: Option<bool>,
    pub bridge: Option<bool>,
    /// km/h
    pub max_speed: Option<u32>,
    pub tunnel: Option<bool>,
    pub road_class: Option<RoadClass>,
}

impl Street {
    /// 只有几何体、没有属性的道路
    pub fn new(geometry: Geometry<f64>) -> Self {
        Street {
            geometry,
            name: None,
            reference: None,
            one_way: None,
            bridge: None,
            max_speed: None,
            tunnel: None,
            road_class: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_road_class(mut self, road_class: RoadClass) -> Self {
        self.road_class = Some(road_class);
        self
    }

    /// Routable by car. Streets without a class are not.
    pub fn is_for_car(&self) -> bool {
        self.road_class.is_some_and(|class| class.is_for_car())
    }

    /// 名称，其次是道路编号
    pub fn label(&self) -> &str {
        self.name
            .as_deref()
            .or(self.reference.as_deref())
            .unwrap_or("<unnamed>")
    }

    fn class_name(&self) -> String {
        self.road_class
            .map_or_else(|| "unclassified?".to_string(), |class| class.to_string())
    }
}

impl Spatial for Street {
    fn geometry(&self) -> &Geometry<f64> {
        &self.geometry
    }

    fn is_usable(&self) -> bool {
        self.is_for_car()
    }
}
