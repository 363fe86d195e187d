use crate::foundation::core::{Canvas, Point, Quad};
use crate::foundation::error::MockupResult;
use crate::raster::buffer::PixelBuffer;
use crate::transform::homography::solve_from_size;
use crate::transform::warp::{WarpOptions, WarpOutput, warp_reporting};

/// Which parallelogram-like quad [`skew`] builds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkewVariant {
    /// Top-right corner drops by the shear; bottom-right stays pinned at the padded height.
    #[default]
    Standard,
    /// Horizontal mirror of [`SkewVariant::Standard`]: the top-left corner drops instead.
    Inverted,
    /// True parallelogram: bottom-right closes as `top_right + (bottom_left - top_left)`.
    WithFourthPoint,
}

/// Destination quad for a `width x height` source.
///
/// With `h' = height + height_padding` and `s = shear_offset`:
/// - `Standard`: `(0,0) (w,s) (0,h') (w,h')`
/// - `Inverted`: `(0,s) (w,0) (0,h') (w,h')`
/// - `WithFourthPoint`: `(0,0) (w,s) (0,h') (w,h'+s)`
pub fn skew_quad(
    width: u32,
    height: u32,
    height_padding: i32,
    shear_offset: i32,
    variant: SkewVariant,
) -> Quad {
    let w = f64::from(width);
    let padded = f64::from(height) + f64::from(height_padding);
    let shear = f64::from(shear_offset);

    let top_left = Point::new(0.0, 0.0);
    let top_right = Point::new(w, shear);
    let bottom_left = Point::new(0.0, padded);
    let standard = Quad::new(top_left, top_right, bottom_left, Point::new(w, padded));
    match variant {
        SkewVariant::Standard => standard,
        SkewVariant::Inverted => standard.mirror_x(w),
        SkewVariant::WithFourthPoint => Quad::new(
            top_left,
            top_right,
            bottom_left,
            top_right + (bottom_left - top_left),
        ),
    }
}

/// Warp `source` onto [`skew_quad`] on a `width x (height + height_padding + shear_offset)`
/// canvas.
pub fn skew(
    source: &PixelBuffer,
    height_padding: i32,
    shear_offset: i32,
    variant: SkewVariant,
) -> MockupResult<PixelBuffer> {
    Ok(skew_reporting(source, height_padding, shear_offset, variant, WarpOptions::default())?.buffer)
}

pub(crate) fn skew_reporting(
    source: &PixelBuffer,
    height_padding: i32,
    shear_offset: i32,
    variant: SkewVariant,
    opts: WarpOptions,
) -> MockupResult<WarpOutput> {
    let canvas = Canvas::from_signed(
        i64::from(source.width()),
        i64::from(source.height()) + i64::from(height_padding) + i64::from(shear_offset),
    )?;
    let quad = skew_quad(
        source.width(),
        source.height(),
        height_padding,
        shear_offset,
        variant,
    );
    let t = solve_from_size(f64::from(source.width()), f64::from(source.height()), &quad)?;
    tracing::debug!(?variant, height_padding, shear_offset, "skew");
    warp_reporting(source, &t, canvas, opts)
}

#[cfg(test)]
#[path = "../../tests/unit/transform/skew.rs"]
mod tests;
