use std::fmt;

use crate::foundation::core::PixelRect;
use crate::foundation::error::{MockupError, MockupResult};
use crate::foundation::math::{Fnv1a64, mul_div255_u8};

/// Separable filter used by [`PixelBuffer::resize`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResizeFilter {
    /// Nearest neighbour.
    Nearest,
    /// Linear (triangle) filter.
    Bilinear,
    /// Catmull-Rom cubic filter.
    #[default]
    Bicubic,
    /// Lanczos with window 3.
    Lanczos3,
}

impl ResizeFilter {
    fn to_image(self) -> image::imageops::FilterType {
        match self {
            Self::Nearest => image::imageops::FilterType::Nearest,
            Self::Bilinear => image::imageops::FilterType::Triangle,
            Self::Bicubic => image::imageops::FilterType::CatmullRom,
            Self::Lanczos3 => image::imageops::FilterType::Lanczos3,
        }
    }
}

/// Owned premultiplied RGBA8 raster, row-major and tightly packed.
///
/// Straight alpha only exists at the boundary: [`PixelBuffer::from_straight_rgba8`] on the way
/// in and [`PixelBuffer::into_straight_rgba8`] on the way out.
///
/// Every operation returns a new buffer; inputs are never mutated, so one buffer can feed
/// several variants.
#[derive(Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl fmt::Debug for PixelBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PixelBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("fingerprint", &format_args!("{:016x}", self.fingerprint()))
            .finish()
    }
}

fn byte_len(width: u32, height: u32) -> MockupResult<usize> {
    if width == 0 || height == 0 {
        return Err(MockupError::invalid_argument(format!(
            "pixel buffer dimensions must be > 0, got {width}x{height}"
        )));
    }
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(4))
        .ok_or_else(|| MockupError::invalid_argument("pixel buffer size overflow"))
}

impl PixelBuffer {
    /// Allocate a fully transparent buffer.
    pub fn new_transparent(width: u32, height: u32) -> MockupResult<Self> {
        let len = byte_len(width, height)?;
        Ok(Self {
            width,
            height,
            data: vec![0; len],
        })
    }

    /// Wrap premultiplied RGBA8 bytes.
    pub fn from_premul_rgba8(width: u32, height: u32, data: Vec<u8>) -> MockupResult<Self> {
        let len = byte_len(width, height)?;
        if data.len() != len {
            return Err(MockupError::invalid_argument(format!(
                "expected {len} bytes for {width}x{height} rgba8, got {}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Take straight-alpha RGBA8 bytes (as decoders produce) and premultiply them.
    pub fn from_straight_rgba8(width: u32, height: u32, mut data: Vec<u8>) -> MockupResult<Self> {
        premultiply_rgba8_in_place(&mut data);
        Self::from_premul_rgba8(width, height, data)
    }

    /// Buffer filled with one straight-alpha color.
    pub fn solid(width: u32, height: u32, straight_rgba: [u8; 4]) -> MockupResult<Self> {
        let len = byte_len(width, height)?;
        let px = premul_px(straight_rgba);
        let mut data = Vec::with_capacity(len);
        for _ in 0..len / 4 {
            data.extend_from_slice(&px);
        }
        Self::from_premul_rgba8(width, height, data)
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Premultiplied RGBA8 bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub(crate) fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Consume the buffer and return its premultiplied bytes.
    pub fn into_premul_rgba8(self) -> Vec<u8> {
        self.data
    }

    /// Consume the buffer and return straight-alpha RGBA8 bytes, ready for encoders.
    pub fn into_straight_rgba8(mut self) -> Vec<u8> {
        for px in self.data.chunks_exact_mut(4) {
            let a = u32::from(px[3]);
            if a == 0 || a == 255 {
                continue;
            }
            for c in &mut px[..3] {
                *c = ((u32::from(*c) * 255 + a / 2) / a).min(255) as u8;
            }
        }
        self.data
    }

    /// Premultiplied pixel at `(x, y)`; transparent when out of bounds.
    pub fn pixel(&self, x: i64, y: i64) -> [u8; 4] {
        if x < 0 || y < 0 || x >= i64::from(self.width) || y >= i64::from(self.height) {
            return [0, 0, 0, 0];
        }
        let idx = self.index(x as u32, y as u32);
        [
            self.data[idx],
            self.data[idx + 1],
            self.data[idx + 2],
            self.data[idx + 3],
        ]
    }

    #[inline]
    pub(crate) fn index(&self, x: u32, y: u32) -> usize {
        ((y as usize) * (self.width as usize) + (x as usize)) * 4
    }

    /// Stable FNV-1a hash of dimensions and pixel bytes.
    pub fn fingerprint(&self) -> u64 {
        let mut h = Fnv1a64::new_default();
        h.write_u32(self.width);
        h.write_u32(self.height);
        h.write_bytes(&self.data);
        h.finish()
    }

    /// Copy `rect` into a new buffer. The rectangle must lie inside the source.
    pub fn crop(&self, rect: PixelRect) -> MockupResult<Self> {
        rect.check_within(self.width, self.height)?;
        let mut out = Vec::with_capacity(byte_len(rect.width, rect.height)?);
        let row_bytes = rect.width as usize * 4;
        for y in rect.y..rect.y + rect.height {
            let start = self.index(rect.x, y);
            out.extend_from_slice(&self.data[start..start + row_bytes]);
        }
        Self::from_premul_rgba8(rect.width, rect.height, out)
    }

    /// Resample to `width x height` with a separable filter.
    pub fn resize(&self, width: u32, height: u32, filter: ResizeFilter) -> MockupResult<Self> {
        byte_len(width, height)?;
        if width == self.width && height == self.height {
            return Ok(self.clone());
        }
        let view = image::ImageBuffer::<image::Rgba<u8>, &[u8]>::from_raw(
            self.width,
            self.height,
            self.data.as_slice(),
        )
        .ok_or_else(|| MockupError::invalid_argument("pixel buffer length mismatch"))?;
        let resized = image::imageops::resize(&view, width, height, filter.to_image());
        let mut data = resized.into_raw();
        clamp_premul_in_place(&mut data);
        Self::from_premul_rgba8(width, height, data)
    }

    /// Rotate by 180 degrees.
    pub fn rotate180(&self) -> Self {
        let mut data = Vec::with_capacity(self.data.len());
        for px in self.data.chunks_exact(4).rev() {
            data.extend_from_slice(px);
        }
        Self {
            data,
            ..self.clone_meta()
        }
    }

    /// Rotate by 90 degrees clockwise; width and height swap.
    pub fn rotate90_cw(&self) -> Self {
        let (w, h) = (self.height, self.width);
        let mut data = vec![0u8; self.data.len()];
        for y in 0..self.height {
            for x in 0..self.width {
                let src = self.index(x, y);
                let dx = self.height - 1 - y;
                let dy = x;
                let dst = ((dy as usize) * (w as usize) + dx as usize) * 4;
                data[dst..dst + 4].copy_from_slice(&self.data[src..src + 4]);
            }
        }
        Self {
            width: w,
            height: h,
            data,
        }
    }

    /// Mirror left to right.
    pub fn flip_horizontal(&self) -> Self {
        let row_bytes = self.width as usize * 4;
        let mut data = Vec::with_capacity(self.data.len());
        for row in self.data.chunks_exact(row_bytes) {
            for px in row.chunks_exact(4).rev() {
                data.extend_from_slice(px);
            }
        }
        Self {
            data,
            ..self.clone_meta()
        }
    }

    /// Mirror top to bottom.
    pub fn flip_vertical(&self) -> Self {
        let row_bytes = self.width as usize * 4;
        let mut data = Vec::with_capacity(self.data.len());
        for row in self.data.chunks_exact(row_bytes).rev() {
            data.extend_from_slice(row);
        }
        Self {
            data,
            ..self.clone_meta()
        }
    }

    /// Bounding box of pixels with non-zero alpha, if any.
    pub fn opaque_bounds(&self) -> Option<PixelRect> {
        let (mut min_x, mut min_y) = (u32::MAX, u32::MAX);
        let (mut max_x, mut max_y) = (0u32, 0u32);
        let mut any = false;
        for y in 0..self.height {
            for x in 0..self.width {
                if self.data[self.index(x, y) + 3] == 0 {
                    continue;
                }
                any = true;
                min_x = min_x.min(x);
                min_y = min_y.min(y);
                max_x = max_x.max(x);
                max_y = max_y.max(y);
            }
        }
        any.then(|| PixelRect::new(min_x, min_y, max_x - min_x + 1, max_y - min_y + 1))
    }

    /// Crop away fully transparent borders.
    pub fn trim_transparent(&self) -> MockupResult<Self> {
        let bounds = self
            .opaque_bounds()
            .ok_or_else(|| MockupError::invalid_argument("cannot trim a fully transparent buffer"))?;
        self.crop(bounds)
    }

    fn clone_meta(&self) -> Self {
        Self {
            width: self.width,
            height: self.height,
            data: Vec::new(),
        }
    }
}

pub(crate) fn premul_px(rgba: [u8; 4]) -> [u8; 4] {
    let a = u16::from(rgba[3]);
    [
        mul_div255_u8(u16::from(rgba[0]), a),
        mul_div255_u8(u16::from(rgba[1]), a),
        mul_div255_u8(u16::from(rgba[2]), a),
        rgba[3],
    ]
}

fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = ((px[0] as u16 * a + 127) / 255) as u8;
        px[1] = ((px[1] as u16 * a + 127) / 255) as u8;
        px[2] = ((px[2] as u16 * a + 127) / 255) as u8;
    }
}

// Cubic and Lanczos kernels overshoot; keep every channel <= alpha.
fn clamp_premul_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3];
        for c in &mut px[..3] {
            *c = (*c).min(a);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/raster/buffer.rs"]
mod tests;
