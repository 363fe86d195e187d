use rayon::prelude::*;

use crate::foundation::core::{Canvas, Point};
use crate::foundation::error::MockupResult;
use crate::raster::buffer::PixelBuffer;
use crate::transform::homography::Transform3x3;

/// Source sampling filter for [`warp`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleFilter {
    /// Nearest source texel.
    Nearest,
    /// Bilinear taps on the full-resolution source.
    Bilinear,
    /// Trilinear: bilinear taps on a 2x box mip chain, level picked from the local scale.
    #[default]
    BilinearMipmap,
}

/// Knobs for [`warp_with`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WarpOptions {
    /// Sampling filter.
    pub filter: SampleFilter,
    /// Weight edge pixels by 2x2 subsample coverage.
    pub antialias: bool,
    /// Render rows on the rayon pool.
    pub parallel: bool,
}

impl Default for WarpOptions {
    fn default() -> Self {
        Self {
            filter: SampleFilter::default(),
            antialias: true,
            parallel: true,
        }
    }
}

impl WarpOptions {
    /// Default options with `filter`.
    pub fn with_filter(filter: SampleFilter) -> Self {
        Self {
            filter,
            ..Self::default()
        }
    }
}

/// Result of a warp plus whether it was short-circuited by a singular transform.
#[derive(Clone, Debug)]
pub(crate) struct WarpOutput {
    pub(crate) buffer: PixelBuffer,
    pub(crate) singular: bool,
}

const SUBSAMPLES: [(f64, f64); 4] = [(0.25, 0.25), (0.75, 0.25), (0.25, 0.75), (0.75, 0.75)];

/// Render `source` through `transform` (source to destination) onto a transparent
/// `dest_width x dest_height` canvas.
///
/// Each destination pixel centre is inverse-mapped into the source; pixels whose preimage falls
/// outside `[0, width) x [0, height)` stay transparent. A singular transform yields an
/// all-transparent canvas and a warning instead of an error.
pub fn warp(
    source: &PixelBuffer,
    transform: &Transform3x3,
    dest_width: u32,
    dest_height: u32,
    filter: SampleFilter,
) -> MockupResult<PixelBuffer> {
    warp_with(
        source,
        transform,
        dest_width,
        dest_height,
        WarpOptions::with_filter(filter),
    )
}

/// [`warp`] with explicit [`WarpOptions`].
pub fn warp_with(
    source: &PixelBuffer,
    transform: &Transform3x3,
    dest_width: u32,
    dest_height: u32,
    opts: WarpOptions,
) -> MockupResult<PixelBuffer> {
    Ok(warp_reporting(source, transform, Canvas::new(dest_width, dest_height)?, opts)?.buffer)
}

pub(crate) fn warp_reporting(
    source: &PixelBuffer,
    transform: &Transform3x3,
    canvas: Canvas,
    opts: WarpOptions,
) -> MockupResult<WarpOutput> {
    canvas.validate()?;
    let mut out = PixelBuffer::new_transparent(canvas.width, canvas.height)?;

    let inv = match transform.inverse() {
        Ok(inv) => inv,
        Err(err) => {
            tracing::warn!(error = %err, "singular warp transform; output left transparent");
            return Ok(WarpOutput {
                buffer: out,
                singular: true,
            });
        }
    };

    let levels = match opts.filter {
        SampleFilter::BilinearMipmap => mip_chain(source),
        SampleFilter::Nearest | SampleFilter::Bilinear => Vec::new(),
    };
    let sampler = Sampler {
        base: source,
        levels: &levels,
        inv,
        filter: opts.filter,
        antialias: opts.antialias,
    };

    let row_bytes = canvas.width as usize * 4;
    let data = out.data_mut();
    if opts.parallel {
        data.par_chunks_mut(row_bytes)
            .enumerate()
            .for_each(|(y, row)| sampler.render_row(y as u32, row));
    } else {
        for (y, row) in data.chunks_mut(row_bytes).enumerate() {
            sampler.render_row(y as u32, row);
        }
    }

    Ok(WarpOutput {
        buffer: out,
        singular: false,
    })
}

struct Sampler<'a> {
    base: &'a PixelBuffer,
    // Level 1 onward; level 0 is `base`.
    levels: &'a [PixelBuffer],
    inv: Transform3x3,
    filter: SampleFilter,
    antialias: bool,
}

impl Sampler<'_> {
    fn render_row(&self, y: u32, row: &mut [u8]) {
        let sw = f64::from(self.base.width());
        let sh = f64::from(self.base.height());
        let inside = |p: Point| p.x >= 0.0 && p.y >= 0.0 && p.x < sw && p.y < sh;

        for (x, px) in row.chunks_exact_mut(4).enumerate() {
            let fx = x as f64;
            let fy = f64::from(y);
            let center = self.inv.apply(Point::new(fx + 0.5, fy + 0.5));

            let coverage = if self.antialias {
                SUBSAMPLES
                    .iter()
                    .filter_map(|(ox, oy)| self.inv.apply(Point::new(fx + ox, fy + oy)))
                    .filter(|p| inside(*p))
                    .count() as f32
                    / SUBSAMPLES.len() as f32
            } else {
                match center {
                    Some(p) if inside(p) => 1.0,
                    _ => 0.0,
                }
            };
            if coverage == 0.0 {
                continue;
            }

            // Partially covered edge pixels may have their centre just outside the source.
            let Some(c) = center else { continue };
            let c = Point::new(c.x.clamp(0.0, sw - 1e-9), c.y.clamp(0.0, sh - 1e-9));

            let color = match self.filter {
                SampleFilter::Nearest => nearest(self.base, c),
                SampleFilter::Bilinear => bilinear(self.base, c),
                SampleFilter::BilinearMipmap => self.trilinear(c, fx + 0.5, fy + 0.5),
            };
            let a = (color[3] * coverage).round().clamp(0.0, 255.0);
            for i in 0..3 {
                px[i] = (color[i] * coverage).round().clamp(0.0, a) as u8;
            }
            px[3] = a as u8;
        }
    }

    fn trilinear(&self, c: Point, dx: f64, dy: f64) -> [f32; 4] {
        let lod = self.lod(c, dx, dy);
        if self.levels.is_empty() || lod <= 0.0 {
            return bilinear(self.base, c);
        }
        let max = self.levels.len() as f64;
        let lod = lod.min(max);
        let lo = lod.floor() as usize;
        let t = (lod - lo as f64) as f32;

        let a = self.sample_level(lo, c);
        if t == 0.0 || lo == self.levels.len() {
            return a;
        }
        let b = self.sample_level(lo + 1, c);
        std::array::from_fn(|i| a[i] + (b[i] - a[i]) * t)
    }

    fn sample_level(&self, level: usize, c: Point) -> [f32; 4] {
        if level == 0 {
            return bilinear(self.base, c);
        }
        let img = &self.levels[level - 1];
        let sx = f64::from(img.width()) / f64::from(self.base.width());
        let sy = f64::from(img.height()) / f64::from(self.base.height());
        bilinear(img, Point::new(c.x * sx, c.y * sy))
    }

    // log2 of the larger source footprint axis of one destination pixel.
    fn lod(&self, c: Point, dx: f64, dy: f64) -> f64 {
        let m = &self.inv.m;
        let w = m[6] * dx + m[7] * dy + m[8];
        if w.abs() < f64::EPSILON {
            return 0.0;
        }
        let dudx = (m[0] - c.x * m[6]) / w;
        let dudy = (m[1] - c.x * m[7]) / w;
        let dvdx = (m[3] - c.y * m[6]) / w;
        let dvdy = (m[4] - c.y * m[7]) / w;
        let rho = dudx.hypot(dvdx).max(dudy.hypot(dvdy));
        if !rho.is_finite() || rho <= 1.0 {
            return 0.0;
        }
        rho.log2()
    }
}

fn texel(img: &PixelBuffer, x: i64, y: i64) -> [f32; 4] {
    let x = x.clamp(0, i64::from(img.width()) - 1);
    let y = y.clamp(0, i64::from(img.height()) - 1);
    img.pixel(x, y).map(f32::from)
}

fn nearest(img: &PixelBuffer, c: Point) -> [f32; 4] {
    texel(img, c.x.floor() as i64, c.y.floor() as i64)
}

fn bilinear(img: &PixelBuffer, c: Point) -> [f32; 4] {
    let px = c.x - 0.5;
    let py = c.y - 0.5;
    let x0 = px.floor();
    let y0 = py.floor();
    let tx = (px - x0) as f32;
    let ty = (py - y0) as f32;
    let (x0, y0) = (x0 as i64, y0 as i64);

    let p00 = texel(img, x0, y0);
    let p10 = texel(img, x0 + 1, y0);
    let p01 = texel(img, x0, y0 + 1);
    let p11 = texel(img, x0 + 1, y0 + 1);
    std::array::from_fn(|i| {
        let top = p00[i] + (p10[i] - p00[i]) * tx;
        let bottom = p01[i] + (p11[i] - p01[i]) * tx;
        top + (bottom - top) * ty
    })
}

// Successive 2x box reductions down to 1x1, excluding the base level.
fn mip_chain(base: &PixelBuffer) -> Vec<PixelBuffer> {
    let mut out: Vec<PixelBuffer> = Vec::new();
    loop {
        let prev = out.last().unwrap_or(base);
        if prev.width() == 1 && prev.height() == 1 {
            break;
        }
        match downsample_box(prev) {
            Some(next) => out.push(next),
            None => break,
        }
    }
    out
}

fn downsample_box(src: &PixelBuffer) -> Option<PixelBuffer> {
    let w = src.width().div_ceil(2);
    let h = src.height().div_ceil(2);
    let mut data = Vec::with_capacity(w as usize * h as usize * 4);
    for y in 0..h {
        for x in 0..w {
            let (sx, sy) = (i64::from(x) * 2, i64::from(y) * 2);
            let mut acc = [0u32; 4];
            for (ox, oy) in [(0, 0), (1, 0), (0, 1), (1, 1)] {
                let p = texel(src, sx + ox, sy + oy);
                for i in 0..4 {
                    acc[i] += p[i] as u32;
                }
            }
            data.extend(acc.map(|v| ((v + 2) / 4) as u8));
        }
    }
    PixelBuffer::from_premul_rgba8(w, h, data).ok()
}

#[cfg(test)]
#[path = "../../tests/unit/transform/warp.rs"]
mod tests;
