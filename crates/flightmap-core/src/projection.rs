// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use serde::{Deserialize, Serialize};

use crate::geodesic::GeoPoint;
use crate::MapError;

/// Rectangular geographic extent in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    pub lon_min: f64,
    pub lon_max: f64,
    pub lat_min: f64,
    pub lat_max: f64,
}

impl Default for Extent {
    /// Western Europe through the Near East and North Africa.
    fn default() -> Self {
        Self {
            lon_min: -20.0,
            lon_max: 45.0,
            lat_min: 25.0,
            lat_max: 70.0,
        }
    }
}

impl Extent {
    pub fn validate(&self) -> Result<(), MapError> {
        let values = [self.lon_min, self.lon_max, self.lat_min, self.lat_max];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(MapError::InvalidExtent("non-finite bound".to_string()));
        }
        if self.lon_min >= self.lon_max || self.lat_min >= self.lat_max {
            return Err(MapError::InvalidExtent(format!(
                "empty extent [{}, {}] x [{}, {}]",
                self.lon_min, self.lon_max, self.lat_min, self.lat_max
            )));
        }
        if self.lon_min < -180.0 || self.lon_max > 180.0 {
            return Err(MapError::InvalidExtent("longitude outside ±180".to_string()));
        }
        if self.lat_min < -90.0 || self.lat_max > 90.0 {
            return Err(MapError::InvalidExtent("latitude outside ±90".to_string()));
        }
        Ok(())
    }
}

/// Lambert cylindrical equal-area projection on the unit sphere,
/// standard parallel at the equator: `x = λ`, `y = sin φ`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LambertCylindrical;

impl LambertCylindrical {
    pub fn project(&self, p: GeoPoint) -> (f64, f64) {
        (p.lon.to_radians(), p.lat.to_radians().sin())
    }

    pub fn bounds(&self, extent: &Extent) -> ProjectedBounds {
        let (x_min, y_min) = self.project(GeoPoint::new(extent.lon_min, extent.lat_min));
        let (x_max, y_max) = self.project(GeoPoint::new(extent.lon_max, extent.lat_max));
        ProjectedBounds {
            x_min,
            x_max,
            y_min,
            y_max,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectedBounds {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl ProjectedBounds {
    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_projection_is_equal_area_in_latitude() {
        let proj = LambertCylindrical;
        let (_, y0) = proj.project(GeoPoint::new(0.0, 0.0));
        let (_, y90) = proj.project(GeoPoint::new(0.0, 90.0));
        let (x180, _) = proj.project(GeoPoint::new(180.0, 0.0));
        assert_eq!(y0, 0.0);
        assert!((y90 - 1.0).abs() < 1e-12);
        assert!((x180 - std::f64::consts::PI).abs() < 1e-12);
    }

    #[test]
    fn test_extent_validation() {
        assert!(Extent::default().validate().is_ok());

        let flipped = Extent {
            lon_min: 45.0,
            lon_max: -20.0,
            ..Extent::default()
        };
        assert!(matches!(flipped.validate(), Err(MapError::InvalidExtent(_))));

        let too_far = Extent {
            lat_max: 95.0,
            ..Extent::default()
        };
        assert!(too_far.validate().is_err());
    }

    #[test]
    fn test_bounds_of_default_extent() {
        let bounds = LambertCylindrical.bounds(&Extent::default());
        assert!((bounds.width() - 65f64.to_radians()).abs() < 1e-12);
        assert!((bounds.y_max - 70f64.to_radians().sin()).abs() < 1e-12);
        assert!((bounds.y_min - 25f64.to_radians().sin()).abs() < 1e-12);

        // Western Europe is more than twice as wide as it is tall here
        let aspect = bounds.width() / bounds.height();
        assert!(aspect > 2.0 && aspect < 2.4, "aspect {aspect}");
    }
}
