use crate::foundation::core::{Affine, Canvas, Vec2};
use crate::foundation::error::MockupResult;
use crate::raster::buffer::PixelBuffer;
use crate::transform::homography::Transform3x3;
use crate::transform::warp::{WarpOptions, WarpOutput, warp_reporting};

/// Rotate `source` clockwise by `degrees` about its centre, keeping the canvas size.
///
/// The source is drawn displaced by `offset` before rotating; corners that leave the canvas are
/// clipped.
pub fn rotate(source: &PixelBuffer, degrees: f64, offset: (i32, i32)) -> MockupResult<PixelBuffer> {
    Ok(rotate_reporting(source, degrees, offset, WarpOptions::default())?.buffer)
}

/// The source-to-canvas map used by [`rotate`].
pub fn rotation_transform(width: u32, height: u32, degrees: f64, offset: (i32, i32)) -> Transform3x3 {
    let center = Vec2::new(f64::from(width) / 2.0, f64::from(height) / 2.0);
    let shift = Vec2::new(f64::from(offset.0), f64::from(offset.1));
    let affine = Affine::translate(center)
        * Affine::rotate(degrees.to_radians())
        * Affine::translate(-center)
        * Affine::translate(shift);
    Transform3x3::from_affine(affine)
}

pub(crate) fn rotate_reporting(
    source: &PixelBuffer,
    degrees: f64,
    offset: (i32, i32),
    opts: WarpOptions,
) -> MockupResult<WarpOutput> {
    let canvas = Canvas::new(source.width(), source.height())?;
    let t = rotation_transform(source.width(), source.height(), degrees, offset);
    warp_reporting(source, &t, canvas, opts)
}

#[cfg(test)]
#[path = "../../tests/unit/transform/rotate.rs"]
mod tests;
