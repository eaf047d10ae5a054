use serde::{Deserialize, Serialize};

/// A detected face in reduced-frame pixel coordinates.
///
/// Faces within one result carry no ordering guarantee.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Face {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Face {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// A rectangle in display space, i.e. relative to the native video origin.
///
/// Recomputed every cycle from a [`Face`]; never stored across cycles.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DisplayRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl DisplayRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn area(&self) -> f64 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Intersection with the `[0, width) x [0, height)` canvas, or `None` if
    /// the rect lies entirely outside it.
    pub fn clamp_to(&self, width: f64, height: f64) -> Option<DisplayRect> {
        let x1 = self.x.max(0.0);
        let y1 = self.y.max(0.0);
        let x2 = self.right().min(width);
        let y2 = self.bottom().min(height);
        if x2 <= x1 || y2 <= y1 {
            return None;
        }
        Some(DisplayRect::new(x1, y1, x2 - x1, y2 - y1))
    }
}
