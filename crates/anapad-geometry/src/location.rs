use std::fmt;

use serde::{Deserialize, Serialize};

/// Immutable point on the surface.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Location {
    /// Horizontal coordinate
    pub x: f64,
    /// Vertical coordinate
    pub y: f64,
}

impl Location {
    /// Create a location.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    #[inline]
    #[must_use]
    pub fn distance_to(&self, other: &Location) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Whether `other` lies within `radius`, boundary included.
    #[inline]
    #[must_use]
    pub fn is_within(&self, other: &Location, radius: f64) -> bool {
        self.distance_to(other) <= radius
    }
}

impl From<(f64, f64)> for Location {
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.1}, {:.1})", self.x, self.y)
    }
}
