use serde::{Deserialize, Serialize};

/// Shape of the interactive response surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SurfaceShape {
    Rectangle,
    Circle,
}

/// A point in surface-local pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocalPoint {
    pub x: f64,
    pub y: f64,
}

impl LocalPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: LocalPoint) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// On-screen placement of the response surface, resolved per pointer sample.
///
/// The surface may be re-laid-out between samples, so callers query this on
/// every sample instead of caching a frame at session start.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceFrame {
    pub shape: SurfaceShape,
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
    /// Border or indicator-ring stroke width. The wheel's ring is drawn inset
    /// from the canvas edge by this amount.
    pub inset: f64,
}

impl SurfaceFrame {
    /// Geometric center in screen coordinates.
    pub fn center(&self) -> (f64, f64) {
        (self.left + self.width / 2.0, self.top + self.height / 2.0)
    }

    /// Ring center in screen coordinates, offset by the stroke inset.
    pub fn ring_center(&self) -> (f64, f64) {
        (
            self.left + self.width / 2.0 - self.inset,
            self.top + self.height / 2.0 - self.inset,
        )
    }

    /// Ring center in surface-local coordinates.
    pub fn local_ring_center(&self) -> LocalPoint {
        LocalPoint::new(self.width / 2.0 - self.inset, self.height / 2.0 - self.inset)
    }

    pub fn to_local(&self, x: f64, y: f64) -> LocalPoint {
        LocalPoint::new(x - self.left, y - self.top)
    }
}
