use crate::compose::mosaic::{BOOK_MATCH_PATTERN, mosaic};
use crate::compose::recipe::LayerOp;
use crate::foundation::core::Canvas;
use crate::foundation::error::MockupResult;
use crate::raster::buffer::PixelBuffer;
use crate::raster::color::adjust_hsl;
use crate::raster::composite::draw_at;
use crate::transform::distort::{distort, distort_inclined_reporting};
use crate::transform::homography::solve_from_size;
use crate::transform::rotate::rotate_reporting;
use crate::transform::skew::skew_reporting;
use crate::transform::warp::{WarpOptions, WarpOutput, warp_reporting};

/// A transformed layer ready for placement.
#[derive(Debug)]
pub(crate) struct TransformedLayer {
    pub(crate) buffer: PixelBuffer,
    /// Indices of ops whose transform was singular and rendered nothing.
    pub(crate) singular_ops: Vec<usize>,
}

/// Run `ops` over `crop` in order.
pub(crate) fn apply_ops(
    crop: PixelBuffer,
    ops: &[LayerOp],
    warp: WarpOptions,
) -> MockupResult<TransformedLayer> {
    let mut buf = crop;
    let mut singular_ops = Vec::new();
    for (i, op) in ops.iter().enumerate() {
        let (next, singular) = apply_op(&buf, op, warp)?;
        if singular {
            singular_ops.push(i);
        }
        buf = next;
    }
    Ok(TransformedLayer {
        buffer: buf,
        singular_ops,
    })
}

fn apply_op(buf: &PixelBuffer, op: &LayerOp, warp: WarpOptions) -> MockupResult<(PixelBuffer, bool)> {
    let plain = |b: PixelBuffer| -> MockupResult<(PixelBuffer, bool)> { Ok((b, false)) };
    let warped = |o: WarpOutput| -> MockupResult<(PixelBuffer, bool)> { Ok((o.buffer, o.singular)) };
    match *op {
        LayerOp::Resize {
            width,
            height,
            filter,
        } => plain(buf.resize(width, height, filter)?),
        LayerOp::FlipHorizontal => plain(buf.flip_horizontal()),
        LayerOp::FlipVertical => plain(buf.flip_vertical()),
        LayerOp::Rotate180 => plain(buf.rotate180()),
        LayerOp::Rotate90 => plain(buf.rotate90_cw()),
        LayerOp::Pad {
            width,
            height,
            x,
            y,
        } => {
            let mut canvas = PixelBuffer::new_transparent(width, height)?;
            draw_at(&mut canvas, buf, x, y);
            plain(canvas)
        }
        LayerOp::Homography { quad, canvas } => {
            let t = solve_from_size(f64::from(buf.width()), f64::from(buf.height()), &quad)?;
            warped(warp_reporting(
                buf,
                &t,
                Canvas::new(canvas.width, canvas.height)?,
                warp,
            )?)
        }
        LayerOp::Distort {
            major,
            minor,
            width,
            height,
        } => plain(distort(buf, major, minor, width, height)?),
        LayerOp::DistortInclined {
            major,
            minor,
            width,
            height,
            incline,
        } => warped(distort_inclined_reporting(
            buf, major, minor, width, height, incline, warp,
        )?),
        LayerOp::Skew {
            height_padding,
            shear_offset,
            variant,
        } => warped(skew_reporting(buf, height_padding, shear_offset, variant, warp)?),
        LayerOp::Rotate { degrees, offset } => {
            let offset = (clamp_i32(offset.x), clamp_i32(offset.y));
            warped(rotate_reporting(buf, degrees, offset, warp)?)
        }
        LayerOp::AdjustHsl {
            brightness,
            saturation,
        } => plain(adjust_hsl(buf, brightness, saturation)?),
        LayerOp::TrimTransparent => plain(buf.trim_transparent()?),
        LayerOp::Mosaic {
            cols,
            rows,
            ref pattern,
            spacing,
            fill,
        } => plain(mosaic(buf, cols, rows, pattern, spacing, fill)?),
        LayerOp::BookMatch { spacing, fill } => {
            plain(mosaic(buf, 2, 2, &BOOK_MATCH_PATTERN, spacing, fill)?)
        }
    }
}

fn clamp_i32(v: i64) -> i32 {
    v.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

#[cfg(test)]
#[path = "../../tests/unit/compose/layer.rs"]
mod tests;
