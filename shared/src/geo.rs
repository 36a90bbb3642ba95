use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum CoordinateError {
    #[error("Latitude {0} is out of valid range [-90, 90]")]
    LatitudeOutOfRange(f64),
    #[error("Longitude {0} is out of valid range [-180, 180]")]
    LongitudeOutOfRange(f64),
    #[error("Coordinate value is not finite (NaN or Infinity)")]
    NonFinite,
}

/// WGS84 point as exchanged with the route service and the shell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Result<Self, CoordinateError> {
        let point = Self { lat, lng };
        point.validate()?;
        Ok(point)
    }

    pub fn validate(&self) -> Result<(), CoordinateError> {
        if !self.lat.is_finite() || !self.lng.is_finite() {
            return Err(CoordinateError::NonFinite);
        }
        if !(-90.0..=90.0).contains(&self.lat) {
            return Err(CoordinateError::LatitudeOutOfRange(self.lat));
        }
        if !(-180.0..=180.0).contains(&self.lng) {
            return Err(CoordinateError::LongitudeOutOfRange(self.lng));
        }
        Ok(())
    }

    /// `lat, lng` with six decimals, the precision shown to users.
    #[must_use]
    pub fn display_fixed(&self) -> String {
        format!("{:.6}, {:.6}", self.lat, self.lng)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bounds {
    pub south_west: GeoPoint,
    pub north_east: GeoPoint,
}

impl Bounds {
    pub fn extend(&mut self, point: GeoPoint) {
        self.south_west.lat = self.south_west.lat.min(point.lat);
        self.south_west.lng = self.south_west.lng.min(point.lng);
        self.north_east.lat = self.north_east.lat.max(point.lat);
        self.north_east.lng = self.north_east.lng.max(point.lng);
    }

    /// Corners may arrive swapped from the route service; this puts them back.
    #[must_use]
    pub fn normalized(self) -> Self {
        let mut bounds = Self {
            south_west: self.south_west,
            north_east: self.south_west,
        };
        bounds.extend(self.north_east);
        bounds
    }

    pub fn validate(&self) -> Result<(), CoordinateError> {
        self.south_west.validate()?;
        self.north_east.validate()
    }
}

#[cfg(test)]
impl Bounds {
    pub(crate) fn contains(&self, point: GeoPoint) -> bool {
        (self.south_west.lat..=self.north_east.lat).contains(&point.lat)
            && (self.south_west.lng..=self.north_east.lng).contains(&point.lng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_coordinates() {
        assert!(GeoPoint::new(0.0, 0.0).is_ok());
        assert!(GeoPoint::new(90.0, 180.0).is_ok());
        assert!(GeoPoint::new(-90.0, -180.0).is_ok());
        assert!(GeoPoint::new(28.6139, 77.2090).is_ok());
    }

    #[test]
    fn test_invalid_coordinates() {
        assert_eq!(
            GeoPoint::new(91.0, 0.0),
            Err(CoordinateError::LatitudeOutOfRange(91.0))
        );
        assert_eq!(
            GeoPoint::new(0.0, -181.0),
            Err(CoordinateError::LongitudeOutOfRange(-181.0))
        );
        assert_eq!(GeoPoint::new(f64::NAN, 0.0), Err(CoordinateError::NonFinite));
        assert_eq!(
            GeoPoint::new(0.0, f64::INFINITY),
            Err(CoordinateError::NonFinite)
        );
    }

    #[test]
    fn test_display_fixed() {
        let p = GeoPoint { lat: 12.9716, lng: 77.5946 };
        assert_eq!(p.display_fixed(), "12.971600, 77.594600");
    }

    #[test]
    fn test_normalized_swaps_corners() {
        let b = Bounds {
            south_west: GeoPoint { lat: 13.0, lng: 78.0 },
            north_east: GeoPoint { lat: 12.0, lng: 77.0 },
        }
        .normalized();
        assert_eq!(b.south_west, GeoPoint { lat: 12.0, lng: 77.0 });
        assert_eq!(b.north_east, GeoPoint { lat: 13.0, lng: 78.0 });
    }
}
