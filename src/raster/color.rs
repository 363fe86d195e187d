//! HSL lightness/saturation shifts used to tint-match individual layers.

use crate::foundation::error::{MockupError, MockupResult};
use crate::raster::buffer::PixelBuffer;

/// Shift lightness and saturation by percentages in `-100..=100`.
///
/// Works on straight color so the result does not depend on alpha; alpha is preserved.
pub fn adjust_hsl(source: &PixelBuffer, brightness: i32, saturation: i32) -> MockupResult<PixelBuffer> {
    for (name, v) in [("brightness", brightness), ("saturation", saturation)] {
        if !(-100..=100).contains(&v) {
            return Err(MockupError::invalid_argument(format!(
                "hsl {name} must be in -100..=100, got {v}"
            )));
        }
    }
    if brightness == 0 && saturation == 0 {
        return Ok(source.clone());
    }

    let sat_shift = f64::from(127 * saturation * 3) / 100.0;
    let lum_shift = f64::from(127 * brightness / 100);

    let width = source.width();
    let height = source.height();
    let mut data = source.clone().into_straight_rgba8();
    for px in data.chunks_exact_mut(4) {
        if px[3] == 0 {
            continue;
        }
        let (h, s, l) = rgb_to_hsl(f64::from(px[0]), f64::from(px[1]), f64::from(px[2]));
        let s = (s + sat_shift).clamp(0.0, 255.0);
        let l = (l + lum_shift).clamp(0.0, 255.0);
        let (r, g, b) = hsl_to_rgb(h, s, l);
        px[0] = r.clamp(0.0, 255.0) as u8;
        px[1] = g.clamp(0.0, 255.0) as u8;
        px[2] = b.clamp(0.0, 255.0) as u8;
    }
    PixelBuffer::from_straight_rgba8(width, height, data)
}

// Channels, saturation and lightness on a 0..=255 scale; hue in degrees.
fn rgb_to_hsl(r: f64, g: f64, b: f64) -> (f64, f64, f64) {
    let min = r.min(g).min(b);
    let max = r.max(g).max(b);
    let dif = max - min;
    let sum = max + min;
    let l = 0.5 * sum;
    if dif == 0.0 {
        return (0.0, 0.0, l);
    }

    let s = if l < 127.5 {
        255.0 * dif / sum
    } else {
        255.0 * dif / (510.0 - sum)
    };
    let (base, delta) = if max == r {
        (0.0, g - b)
    } else if max == g {
        (120.0, b - r)
    } else {
        (240.0, r - g)
    };
    let h = (base + 60.0 * delta / dif).rem_euclid(360.0);
    (h, s, l)
}

fn hsl_to_rgb(h: f64, s: f64, l: f64) -> (f64, f64, f64) {
    if s == 0.0 {
        return (l, l, l);
    }
    let v2 = if l < 127.5 {
        l / 255.0 * (255.0 + s)
    } else {
        l + s - s * l / 255.0
    };
    let v1 = 2.0 * l - v2;
    let v3 = v2 - v1;
    (
        hue_component(v1, v3, h + 120.0),
        hue_component(v1, v3, h),
        hue_component(v1, v3, h - 120.0),
    )
}

fn hue_component(v1: f64, v3: f64, h: f64) -> f64 {
    let h = h.rem_euclid(360.0);
    if h < 60.0 {
        v1 + v3 * h / 60.0
    } else if h < 180.0 {
        v1 + v3
    } else if h < 240.0 {
        v1 + v3 * (4.0 - h / 60.0)
    } else {
        v1
    }
}

#[cfg(test)]
#[path = "../../tests/unit/raster/color.rs"]
mod tests;
