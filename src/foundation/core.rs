use crate::foundation::error::{MockupError, MockupResult};
use crate::foundation::math::{GEOMETRY_EPSILON, cross3, point_extent};

pub use kurbo::{Affine, Point, Vec2};

/// Destination or source coordinate. May lie outside any canvas.
pub type Point2D = Point;

/// Pixel dimensions of a destination surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Canvas {
    /// Create a canvas with both dimensions > 0.
    pub fn new(width: u32, height: u32) -> MockupResult<Self> {
        let canvas = Self { width, height };
        canvas.validate()?;
        Ok(canvas)
    }

    /// Reject zero-sized canvases.
    pub fn validate(self) -> MockupResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(MockupError::invalid_argument(format!(
                "canvas dimensions must be > 0, got {}x{}",
                self.width, self.height
            )));
        }
        Ok(())
    }

    /// Build a canvas from signed dimensions, rejecting non-positive values.
    pub fn from_signed(width: i64, height: i64) -> MockupResult<Self> {
        if width <= 0 || height <= 0 || width > i64::from(u32::MAX) || height > i64::from(u32::MAX)
        {
            return Err(MockupError::invalid_argument(format!(
                "canvas dimensions must be in 1..=u32::MAX, got {width}x{height}"
            )));
        }
        Ok(Self {
            width: width as u32,
            height: height as u32,
        })
    }
}

/// Integer pixel rectangle, top-left anchored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct PixelRect {
    /// Left edge.
    pub x: u32,
    /// Top edge.
    pub y: u32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl PixelRect {
    /// Construct a rectangle.
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Exclusive right edge.
    pub fn right(self) -> u64 {
        u64::from(self.x) + u64::from(self.width)
    }

    /// Exclusive bottom edge.
    pub fn bottom(self) -> u64 {
        u64::from(self.y) + u64::from(self.height)
    }

    /// Check the rectangle is non-empty and fits inside `width x height`.
    pub fn check_within(self, width: u32, height: u32) -> MockupResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(MockupError::invalid_argument(format!(
                "crop rectangle must be non-empty, got {}x{}",
                self.width, self.height
            )));
        }
        if self.right() > u64::from(width) || self.bottom() > u64::from(height) {
            return Err(MockupError::invalid_argument(format!(
                "crop rectangle {}x{}+{}+{} exceeds source {width}x{height}",
                self.width, self.height, self.x, self.y
            )));
        }
        Ok(())
    }
}

/// Four labeled destination vertices for one warp.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Quad {
    /// Top-left vertex.
    pub top_left: Point,
    /// Top-right vertex.
    pub top_right: Point,
    /// Bottom-left vertex.
    pub bottom_left: Point,
    /// Bottom-right vertex.
    pub bottom_right: Point,
}

impl Quad {
    /// Construct from the four labeled vertices.
    pub fn new(top_left: Point, top_right: Point, bottom_left: Point, bottom_right: Point) -> Self {
        Self {
            top_left,
            top_right,
            bottom_left,
            bottom_right,
        }
    }

    /// Corners of the axis-aligned rectangle `(0,0)-(width,height)`.
    pub fn from_size(width: f64, height: f64) -> Self {
        Self::new(
            Point::new(0.0, 0.0),
            Point::new(width, 0.0),
            Point::new(0.0, height),
            Point::new(width, height),
        )
    }

    /// Vertices in `[top_left, top_right, bottom_left, bottom_right]` order.
    pub fn corners(&self) -> [Point; 4] {
        [
            self.top_left,
            self.top_right,
            self.bottom_left,
            self.bottom_right,
        ]
    }

    /// Mirror across the vertical line `x = width / 2`, swapping left and right labels.
    pub fn mirror_x(&self, width: f64) -> Self {
        let m = |p: Point| Point::new(width - p.x, p.y);
        Self::new(
            m(self.top_right),
            m(self.top_left),
            m(self.bottom_right),
            m(self.bottom_left),
        )
    }

    /// Reject quads with non-finite vertices or any collinear 3-subset.
    pub fn ensure_non_degenerate(&self) -> MockupResult<()> {
        let pts = self.corners();
        if pts.iter().any(|p| !p.x.is_finite() || !p.y.is_finite()) {
            return Err(MockupError::degenerate("quad has non-finite vertex"));
        }
        let extent = point_extent(&pts);
        let tol = GEOMETRY_EPSILON * extent * extent;
        for (i, j, k) in [(0, 1, 2), (0, 1, 3), (0, 2, 3), (1, 2, 3)] {
            if cross3(pts[i], pts[j], pts[k]).abs() <= tol {
                return Err(MockupError::degenerate(format!(
                    "quad vertices {i},{j},{k} are collinear or coincide"
                )));
            }
        }
        Ok(())
    }
}

/// Right/bottom margin used to anchor the watermark.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Margin {
    /// Distance from the right canvas edge.
    pub right: u32,
    /// Distance from the bottom canvas edge.
    pub bottom: u32,
}

impl Default for Margin {
    fn default() -> Self {
        Self {
            right: 5,
            bottom: 5,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
