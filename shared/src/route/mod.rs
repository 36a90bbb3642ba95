//! Route domain types as returned by the route planning service.
//!
//! A [`RouteData`] is only ever constructed through [`RouteData::validated`],
//! which rejects malformed coordinates and guarantees the bounding box covers
//! the whole path.

pub mod gateway;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geo::{Bounds, CoordinateError, GeoPoint};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportMode {
    #[default]
    Walking,
    Bike,
    Car,
}

impl TransportMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Walking => "walking",
            Self::Bike => "bike",
            Self::Car => "car",
        }
    }
}

impl std::fmt::Display for TransportMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which marker set the map shows. The two are mutually exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MapView {
    #[default]
    Safety,
    RoadCondition,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteStep {
    pub instruction: String,
    pub distance: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SafetyPointKind {
    PolicePresence,
    WellLit,
    LowCrimeZone,
}

impl SafetyPointKind {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::PolicePresence => "Police presence",
            Self::WellLit => "Well lit",
            Self::LowCrimeZone => "Low crime zone",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SafetyTrend {
    Improving,
    Stable,
    Declining,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafetyPoint {
    pub location: GeoPoint,
    #[serde(rename = "type")]
    pub kind: SafetyPointKind,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub historical_trend: Option<SafetyTrend>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_reports: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoadIssueKind {
    Pothole,
    DamagedRoad,
}

impl RoadIssueKind {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pothole => "Pothole",
            Self::DamagedRoad => "Damaged road",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoadIssue {
    pub location: GeoPoint,
    #[serde(rename = "type")]
    pub kind: RoadIssueKind,
    pub description: String,
    pub severity: Severity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteData {
    pub overview: String,
    pub path: Vec<GeoPoint>,
    pub steps: Vec<RouteStep>,
    pub safety_points: Vec<SafetyPoint>,
    pub road_issues: Vec<RoadIssue>,
    pub bounds: Bounds,
}

#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
pub enum RouteValidationError {
    #[error("route path is empty")]
    EmptyPath,
    #[error("invalid coordinate in {field}: {reason}")]
    InvalidCoordinate { field: String, reason: String },
}

impl RouteValidationError {
    fn coordinate(field: impl Into<String>, e: CoordinateError) -> Self {
        Self::InvalidCoordinate {
            field: field.into(),
            reason: e.to_string(),
        }
    }
}

impl RouteData {
    /// Checks every coordinate and widens `bounds` to cover the full path.
    pub fn validated(mut self) -> Result<Self, RouteValidationError> {
        if self.path.is_empty() {
            return Err(RouteValidationError::EmptyPath);
        }

        for (i, point) in self.path.iter().enumerate() {
            point
                .validate()
                .map_err(|e| RouteValidationError::coordinate(format!("path[{i}]"), e))?;
        }
        for (i, point) in self.safety_points.iter().enumerate() {
            point.location.validate().map_err(|e| {
                RouteValidationError::coordinate(format!("safetyPoints[{i}].location"), e)
            })?;
        }
        for (i, issue) in self.road_issues.iter().enumerate() {
            issue.location.validate().map_err(|e| {
                RouteValidationError::coordinate(format!("roadIssues[{i}].location"), e)
            })?;
        }
        self.bounds
            .validate()
            .map_err(|e| RouteValidationError::coordinate("bounds", e))?;

        let mut bounds = self.bounds.normalized();
        for point in &self.path {
            bounds.extend(*point);
        }
        self.bounds = bounds;

        Ok(self)
    }

    #[must_use]
    pub fn start(&self) -> Option<GeoPoint> {
        self.path.first().copied()
    }

    #[must_use]
    pub fn end(&self) -> Option<GeoPoint> {
        self.path.last().copied()
    }
}
