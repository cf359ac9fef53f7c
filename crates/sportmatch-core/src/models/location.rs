//! Geographic coordinate model

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    #[must_use]
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Reject coordinates outside the valid latitude/longitude ranges.
    pub fn validated(self) -> Result<Self> {
        if !self.lat.is_finite() || !(-90.0..=90.0).contains(&self.lat) {
            return Err(Error::InvalidInput(format!(
                "Latitude {} is out of range",
                self.lat
            )));
        }
        if !self.lon.is_finite() || !(-180.0..=180.0).contains(&self.lon) {
            return Err(Error::InvalidInput(format!(
                "Longitude {} is out of range",
                self.lon
            )));
        }
        Ok(self)
    }

    /// Great-circle distance to `other` in kilometres.
    #[must_use]
    pub fn distance_km(&self, other: &Self) -> f64 {
        crate::geo::haversine_km(*self, *other)
    }
}
