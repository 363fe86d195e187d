use std::borrow::Cow;

use crate::compose::recipe::VariantKind;
use crate::foundation::error::{MockupError, MockupResult};
use crate::raster::buffer::PixelBuffer;
use crate::raster::composite::draw_at;

/// Most cells a single mosaic may lay out.
pub const MAX_MOSAIC_CELLS: u32 = 256;

/// Cell pattern of a 2x2 book-match: the slab, its mirror, then both flipped top to bottom.
pub(crate) const BOOK_MATCH_PATTERN: [VariantKind; 4] = [
    VariantKind::Identity,
    VariantKind::FlipHorizontal,
    VariantKind::Rotate180FlipHorizontal,
    VariantKind::Rotate180,
];

/// Lay `tile` out on a `cols x rows` grid separated by `spacing` pixels of `fill`.
///
/// Cell `i` (row-major) shows `tile` transformed by `pattern[i % pattern.len()]`.
/// Without a fill the joints stay transparent.
#[tracing::instrument(
    level = "debug",
    skip(tile, pattern, fill),
    fields(tile_w = tile.width(), tile_h = tile.height())
)]
pub(crate) fn mosaic(
    tile: &PixelBuffer,
    cols: u32,
    rows: u32,
    pattern: &[VariantKind],
    spacing: u32,
    fill: Option<[u8; 4]>,
) -> MockupResult<PixelBuffer> {
    if cols == 0 || rows == 0 || pattern.is_empty() {
        return Err(MockupError::invalid_argument(format!(
            "mosaic needs a non-empty grid and pattern, got {cols}x{rows} with {} entries",
            pattern.len()
        )));
    }
    let width = span(tile.width(), cols, spacing)?;
    let height = span(tile.height(), rows, spacing)?;
    let mut out = match fill {
        Some(rgba) => PixelBuffer::solid(width, height, rgba)?,
        None => PixelBuffer::new_transparent(width, height)?,
    };

    let mut rendered: Vec<(VariantKind, Cow<'_, PixelBuffer>)> = Vec::with_capacity(4);
    for &kind in pattern {
        if !rendered.iter().any(|(k, _)| *k == kind) {
            rendered.push((kind, kind.apply(tile)));
        }
    }

    let step_x = i64::from(tile.width()) + i64::from(spacing);
    let step_y = i64::from(tile.height()) + i64::from(spacing);
    for row in 0..rows {
        for col in 0..cols {
            let cell = (row as usize) * (cols as usize) + col as usize;
            let kind = pattern[cell % pattern.len()];
            if let Some((_, img)) = rendered.iter().find(|(k, _)| *k == kind) {
                draw_at(&mut out, img, i64::from(col) * step_x, i64::from(row) * step_y);
            }
        }
    }
    tracing::debug!(width, height, distinct = rendered.len(), "mosaic laid out");
    Ok(out)
}

// n tiles plus the n - 1 joints between them.
fn span(tile: u32, n: u32, spacing: u32) -> MockupResult<u32> {
    tile.checked_mul(n)
        .and_then(|v| v.checked_add(spacing.checked_mul(n - 1)?))
        .ok_or_else(|| {
            MockupError::invalid_argument(format!(
                "mosaic of {n} tiles of {tile}px with {spacing}px joints overflows"
            ))
        })
}

#[cfg(test)]
#[path = "../../tests/unit/compose/mosaic.rs"]
mod tests;
