//! Rectangular latitude/longitude bounds for area queries.

use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle given by its south-west and north-east corners.
///
/// Both edges are inclusive. The rectangle does not wrap the antimeridian.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Southern edge.
    pub sw_lat: f64,
    /// Western edge.
    pub sw_lng: f64,
    /// Northern edge.
    pub ne_lat: f64,
    /// Eastern edge.
    pub ne_lng: f64,
}

impl BoundingBox {
    /// Creates a rectangle from its corners.
    #[must_use]
    pub const fn new(sw_lat: f64, sw_lng: f64, ne_lat: f64, ne_lng: f64) -> Self {
        Self {
            sw_lat,
            sw_lng,
            ne_lat,
            ne_lng,
        }
    }

    /// Builds a rectangle only when all four corners are present.
    ///
    /// Queries treat `None` as "no spatial filter".
    #[must_use]
    pub fn from_corners(
        sw_lat: Option<f64>,
        sw_lng: Option<f64>,
        ne_lat: Option<f64>,
        ne_lng: Option<f64>,
    ) -> Option<Self> {
        Some(Self::new(sw_lat?, sw_lng?, ne_lat?, ne_lng?))
    }

    /// Returns `true` if the point lies on or inside the rectangle.
    #[must_use]
    pub fn contains(&self, lat: f64, lng: f64) -> bool {
        (self.sw_lat..=self.ne_lat).contains(&lat) && (self.sw_lng..=self.ne_lng).contains(&lng)
    }
}
