use anyhow::Context;

use crate::foundation::error::MockupResult;
use crate::raster::buffer::PixelBuffer;

/// Decode any format the `image` crate understands into a premultiplied buffer.
pub fn decode_image(bytes: &[u8]) -> MockupResult<PixelBuffer> {
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();
    PixelBuffer::from_straight_rgba8(width, height, rgba.into_raw())
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
