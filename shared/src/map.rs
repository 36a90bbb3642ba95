//! Map Rendering Adapter: turns the current route and view mode into a
//! [`MapScene`] the shell draws onto its single persistent map surface.
//!
//! The route layer is replaced wholesale whenever the route changes and is
//! stamped with a generation so the shell can tell a new route from a
//! marker-only redraw.

use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};
use serde::{Deserialize, Serialize};

use crate::geo::{Bounds, GeoPoint};
use crate::route::{MapView, RoadIssueKind, RouteData, SafetyPointKind, Severity};

pub const DEFAULT_CENTER: GeoPoint = GeoPoint {
    lat: 20.5937,
    lng: 78.9629,
};
pub const DEFAULT_ZOOM: u8 = 5;
pub const FIT_PADDING_PX: u16 = 50;

pub const START_COLOR: &str = "#10b981";
pub const END_COLOR: &str = "#ef4444";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Viewport {
    /// Country-level view shown while there is no route.
    Default { center: GeoPoint, zoom: u8 },
    FitBounds { bounds: Bounds, padding_px: u16 },
}

impl Default for Viewport {
    fn default() -> Self {
        Self::Default {
            center: DEFAULT_CENTER,
            zoom: DEFAULT_ZOOM,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerKind {
    PolicePresence,
    WellLit,
    LowCrimeZone,
    Pothole,
    DamagedRoad,
}

impl MarkerKind {
    /// Icon background, as a Tailwind colour name.
    #[must_use]
    pub const fn color(self) -> &'static str {
        match self {
            Self::PolicePresence => "blue-500",
            Self::LowCrimeZone => "green-500",
            Self::WellLit => "yellow-400",
            Self::Pothole => "red-500",
            Self::DamagedRoad => "orange-500",
        }
    }
}

impl From<SafetyPointKind> for MarkerKind {
    fn from(kind: SafetyPointKind) -> Self {
        match kind {
            SafetyPointKind::PolicePresence => Self::PolicePresence,
            SafetyPointKind::WellLit => Self::WellLit,
            SafetyPointKind::LowCrimeZone => Self::LowCrimeZone,
        }
    }
}

impl From<RoadIssueKind> for MarkerKind {
    fn from(kind: RoadIssueKind) -> Self {
        match kind {
            RoadIssueKind::Pothole => Self::Pothole,
            RoadIssueKind::DamagedRoad => Self::DamagedRoad,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Marker {
    pub position: GeoPoint,
    pub kind: MarkerKind,
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteLayer {
    pub generation: u64,
    pub path: Vec<GeoPoint>,
    pub start: GeoPoint,
    pub end: GeoPoint,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerLayer {
    pub view: MapView,
    pub markers: Vec<Marker>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapScene {
    pub viewport: Viewport,
    pub route: Option<RouteLayer>,
    pub markers: Option<MarkerLayer>,
}

/// Tracks route generations and the active marker set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapAdapter {
    generation: u64,
    view: MapView,
}

impl MapAdapter {
    #[must_use]
    pub fn view(&self) -> MapView {
        self.view
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Called whenever the current route is replaced or cleared.
    pub fn route_replaced(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }

    pub fn set_view(&mut self, view: MapView) {
        self.view = view;
    }

    #[must_use]
    pub fn scene(&self, route: Option<&RouteData>) -> MapScene {
        let Some(route) = route else {
            return MapScene::default();
        };
        let (Some(start), Some(end)) = (route.start(), route.end()) else {
            return MapScene::default();
        };

        MapScene {
            viewport: Viewport::FitBounds {
                bounds: route.bounds,
                padding_px: FIT_PADDING_PX,
            },
            route: Some(RouteLayer {
                generation: self.generation,
                path: route.path.clone(),
                start,
                end,
            }),
            markers: Some(MarkerLayer {
                view: self.view,
                markers: markers_for(route, self.view),
            }),
        }
    }
}

#[must_use]
pub fn markers_for(route: &RouteData, view: MapView) -> Vec<Marker> {
    match view {
        MapView::Safety => route
            .safety_points
            .iter()
            .map(|p| Marker {
                position: p.location,
                kind: p.kind.into(),
                title: p.kind.label().to_string(),
                description: p.description.clone(),
                severity: None,
            })
            .collect(),
        MapView::RoadCondition => route
            .road_issues
            .iter()
            .map(|i| Marker {
                position: i.location,
                kind: i.kind.into(),
                title: format!("{} ({})", i.kind.label(), i.severity.as_str()),
                description: i.description.clone(),
                severity: Some(i.severity),
            })
            .collect(),
    }
}

fn point(p: GeoPoint) -> Geometry {
    Geometry::new(Value::Point(vec![p.lng, p.lat]))
}

fn feature(geometry: Geometry, properties: JsonObject) -> Feature {
    Feature {
        bbox: None,
        geometry: Some(geometry),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

fn props(pairs: impl IntoIterator<Item = (&'static str, serde_json::Value)>) -> JsonObject {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

/// GeoJSON export of a scene; coordinates are `[lng, lat]`.
#[must_use]
pub fn to_geojson(scene: &MapScene) -> FeatureCollection {
    let mut features = Vec::new();

    if let Some(route) = &scene.route {
        let line = route.path.iter().map(|p| vec![p.lng, p.lat]).collect();
        features.push(feature(
            Geometry::new(Value::LineString(line)),
            props([
                ("role", "route".into()),
                ("generation", route.generation.into()),
            ]),
        ));
        features.push(feature(
            point(route.start),
            props([("role", "start".into()), ("color", START_COLOR.into())]),
        ));
        features.push(feature(
            point(route.end),
            props([("role", "end".into()), ("color", END_COLOR.into())]),
        ));
    }

    if let Some(layer) = &scene.markers {
        for marker in &layer.markers {
            let mut properties = props([
                ("role", "marker".into()),
                ("kind", serde_json::to_value(marker.kind).unwrap_or_default()),
                ("color", marker.kind.color().into()),
                ("title", marker.title.clone().into()),
                ("description", marker.description.clone().into()),
            ]);
            if let Some(severity) = marker.severity {
                properties.insert("severity".into(), severity.as_str().into());
            }
            features.push(feature(point(marker.position), properties));
        }
    }

    let bbox = match scene.viewport {
        Viewport::FitBounds { bounds, .. } => Some(vec![
            bounds.south_west.lng,
            bounds.south_west.lat,
            bounds.north_east.lng,
            bounds.north_east.lat,
        ]),
        Viewport::Default { .. } => None,
    };

    FeatureCollection {
        bbox,
        features,
        foreign_members: None,
    }
}
