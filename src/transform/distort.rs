//! Perspective-compression resamplers.
//!
//! [`distort`] is a per-column nearest-neighbour vertical remap: each column is squeezed into a
//! shorter run of rows, and the run length grows linearly from left to right. It is not a
//! homography. [`distort_inclined`] is the true-perspective counterpart built on the solver.

use crate::foundation::core::{Canvas, Point, Quad};
use crate::foundation::error::{MockupError, MockupResult};
use crate::raster::buffer::{PixelBuffer, ResizeFilter};
use crate::transform::homography::solve_from_size;
use crate::transform::warp::{WarpOptions, WarpOutput, warp_reporting};

/// Extra rows below the inclined quad so its lower edge is never clipped.
const INCLINE_HEADROOM: f64 = 100.0;

/// Effective height of every destination column.
///
/// Interpolates linearly from `new_height / (major_side / minor_side)` at column 0 to
/// `new_height` at column `new_width - 1`. Heights never exceed `new_height`.
pub fn column_heights(
    major_side: u32,
    minor_side: u32,
    new_width: u32,
    new_height: u32,
) -> MockupResult<Vec<f64>> {
    check_sides(major_side, minor_side)?;
    Canvas::new(new_width, new_height)?;

    let h = f64::from(new_height);
    let factor = f64::from(major_side) / f64::from(minor_side);
    let initial = (h / factor).min(h);
    if new_width == 1 {
        return Ok(vec![h]);
    }

    let last = f64::from(new_width - 1);
    Ok((0..new_width)
        .map(|x| {
            if x == new_width - 1 {
                h
            } else {
                (initial + (h - initial) * f64::from(x) / last).min(h)
            }
        })
        .collect())
}

/// Resize `source` to `new_width x new_height`, then taper it column by column.
///
/// Column `x` receives `floor(col_height(x))` rows sampled from the resized image at
/// `floor(k * new_height / col_height(x))`, clamped to the last row. Rows below that stay
/// transparent.
pub fn distort(
    source: &PixelBuffer,
    major_side: u32,
    minor_side: u32,
    new_width: u32,
    new_height: u32,
) -> MockupResult<PixelBuffer> {
    let heights = column_heights(major_side, minor_side, new_width, new_height)?;
    let resized = source.resize(new_width, new_height, ResizeFilter::default())?;
    let mut out = PixelBuffer::new_transparent(new_width, new_height)?;

    let last_row = f64::from(new_height - 1);
    let src = resized.data();
    let stride = new_width as usize * 4;
    let dst = out.data_mut();
    for (x, col_height) in heights.iter().copied().enumerate() {
        let rows = col_height.floor() as usize;
        let step = f64::from(new_height) / col_height;
        let mut pos = 0.0f64;
        for row in 0..rows {
            let sy = pos.floor().min(last_row) as usize;
            let si = sy * stride + x * 4;
            let di = row * stride + x * 4;
            dst[di..di + 4].copy_from_slice(&src[si..si + 4]);
            pos += step;
        }
    }
    Ok(out)
}

/// Resize, then map onto the trapezoid `TL(0, incline) TR(w, 0) BL(0, h/ratio + incline)
/// BR(w, h)` with `ratio = major_side / minor_side`.
///
/// The canvas is `w` wide and `max(h, h/ratio + incline + 100)` tall.
pub fn distort_inclined(
    source: &PixelBuffer,
    major_side: u32,
    minor_side: u32,
    new_width: u32,
    new_height: u32,
    incline: i32,
) -> MockupResult<PixelBuffer> {
    Ok(distort_inclined_reporting(
        source,
        major_side,
        minor_side,
        new_width,
        new_height,
        incline,
        WarpOptions::default(),
    )?
    .buffer)
}

pub(crate) fn distort_inclined_reporting(
    source: &PixelBuffer,
    major_side: u32,
    minor_side: u32,
    new_width: u32,
    new_height: u32,
    incline: i32,
    opts: WarpOptions,
) -> MockupResult<WarpOutput> {
    check_sides(major_side, minor_side)?;
    let resized = source.resize(new_width, new_height, ResizeFilter::default())?;

    let w = f64::from(new_width);
    let h = f64::from(new_height);
    let incline = f64::from(incline);
    let squeezed = h / (f64::from(major_side) / f64::from(minor_side));
    let quad = Quad::new(
        Point::new(0.0, incline),
        Point::new(w, 0.0),
        Point::new(0.0, squeezed + incline),
        Point::new(w, h),
    );
    let canvas_h = h.max(squeezed + incline + INCLINE_HEADROOM).floor();
    let canvas = Canvas::from_signed(i64::from(new_width), canvas_h as i64)?;

    let t = solve_from_size(w, h, &quad)?;
    warp_reporting(&resized, &t, canvas, opts)
}

fn check_sides(major_side: u32, minor_side: u32) -> MockupResult<()> {
    if major_side == 0 || minor_side == 0 {
        return Err(MockupError::invalid_argument(format!(
            "distortion sides must be > 0, got major={major_side} minor={minor_side}"
        )));
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/transform/distort.rs"]
mod tests;
