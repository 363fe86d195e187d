use std::borrow::Cow;
use std::collections::HashSet;

use crate::assets::cache::normalize_rel_path;
use crate::compose::mosaic::MAX_MOSAIC_CELLS;
use crate::foundation::core::{Canvas, PixelRect, Quad};
use crate::foundation::error::{MockupError, MockupResult};
use crate::raster::buffer::{PixelBuffer, ResizeFilter};
use crate::transform::skew::SkewVariant;

/// Most variants a recipe may declare.
pub const MAX_VARIANTS: usize = 4;

/// Immutable configuration for one mockup template.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Recipe {
    /// Unique id used to request the template.
    pub id: String,
    /// Free-form description for listings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Destination canvas.
    pub canvas: Canvas,
    /// Straight RGBA the canvas is filled with before placement; transparent when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<[u8; 4]>,
    /// Frame asset drawn over the layers, relative to the asset root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame: Option<String>,
    /// Layers in z-order: later entries are drawn on top.
    pub layers: Vec<LayerSpec>,
    /// Whole-photo pre-transforms, one per output variant.
    #[serde(default = "VariantKind::all")]
    pub variants: Vec<VariantKind>,
    /// Flip the finished canvas horizontally before the watermark.
    #[serde(default)]
    pub mirror_output: bool,
}

/// One sub-region of the photo, its transform chain and its placement.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LayerSpec {
    /// Label for logs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Region of the (variant-transformed) photo to cut.
    #[serde(default)]
    pub crop: CropSpec,
    /// Operations applied in order to the crop.
    #[serde(default)]
    pub ops: Vec<LayerOp>,
    /// Top-left placement on the canvas; may be negative.
    #[serde(default)]
    pub offset: Offset,
}

/// Integer canvas placement.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Offset {
    /// Horizontal offset.
    pub x: i64,
    /// Vertical offset.
    pub y: i64,
}

/// How a layer cuts its region out of the photo.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CropSpec {
    /// The whole photo.
    #[default]
    Full,
    /// Fractions of the photo size in `[0, 1]`, floored to pixels and clamped to the photo.
    Fraction {
        /// Left edge.
        x: f64,
        /// Top edge.
        y: f64,
        /// Width.
        width: f64,
        /// Height.
        height: f64,
    },
    /// Exact pixels; must lie inside the photo.
    Pixels {
        /// Left edge.
        x: u32,
        /// Top edge.
        y: u32,
        /// Width.
        width: u32,
        /// Height.
        height: u32,
    },
}

impl CropSpec {
    /// Resolve against a `width x height` photo.
    pub fn resolve(&self, width: u32, height: u32) -> MockupResult<PixelRect> {
        match *self {
            Self::Full => Ok(PixelRect::new(0, 0, width, height)),
            Self::Fraction {
                x,
                y,
                width: fw,
                height: fh,
            } => {
                let (x0, w) = fraction_span(x, fw, width);
                let (y0, h) = fraction_span(y, fh, height);
                if w == 0 || h == 0 {
                    return Err(MockupError::invalid_argument(format!(
                        "fractional crop ({x}, {y}, {fw}, {fh}) is empty on a {width}x{height} photo"
                    )));
                }
                Ok(PixelRect::new(x0, y0, w, h))
            }
            Self::Pixels {
                x,
                y,
                width: w,
                height: h,
            } => {
                let rect = PixelRect::new(x, y, w, h);
                rect.check_within(width, height)?;
                Ok(rect)
            }
        }
    }

    fn validate(&self) -> MockupResult<()> {
        match *self {
            Self::Full => Ok(()),
            Self::Fraction {
                x,
                y,
                width,
                height,
            } => {
                let all_unit = [x, y, width, height]
                    .iter()
                    .all(|v| v.is_finite() && (0.0..=1.0).contains(v));
                if !all_unit || width <= 0.0 || height <= 0.0 {
                    return Err(MockupError::invalid_recipe(format!(
                        "fractional crop must lie in [0, 1] with positive size, got ({x}, {y}, {width}, {height})"
                    )));
                }
                Ok(())
            }
            Self::Pixels { width, height, .. } => {
                if width == 0 || height == 0 {
                    return Err(MockupError::invalid_recipe("pixel crop must be non-empty"));
                }
                Ok(())
            }
        }
    }
}

// floor(start * len), floor(size * len), clamped so the span ends inside `len`.
fn fraction_span(start: f64, size: f64, len: u32) -> (u32, u32) {
    let total = f64::from(len);
    let s = ((start * total).floor() as u32).min(len.saturating_sub(1));
    let n = ((size * total).floor() as u32).min(len - s);
    (s, n)
}

/// One step of a layer's transform chain.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum LayerOp {
    /// Resample to an exact size.
    Resize {
        /// Target width.
        width: u32,
        /// Target height.
        height: u32,
        /// Resampling filter.
        #[serde(default)]
        filter: ResizeFilter,
    },
    /// Mirror left to right.
    FlipHorizontal,
    /// Mirror top to bottom.
    FlipVertical,
    /// Rotate by 180 degrees.
    Rotate180,
    /// Rotate by 90 degrees clockwise.
    Rotate90,
    /// Draw onto a larger transparent canvas at `(x, y)`.
    Pad {
        /// Canvas width.
        width: u32,
        /// Canvas height.
        height: u32,
        /// Left placement.
        #[serde(default)]
        x: i64,
        /// Top placement.
        #[serde(default)]
        y: i64,
    },
    /// Projective warp of the buffer rectangle onto `quad`.
    Homography {
        /// Destination corners.
        quad: Quad,
        /// Destination canvas.
        canvas: Canvas,
    },
    /// Column-taper resampler.
    Distort {
        /// Longer side of the real surface.
        major: u32,
        /// Shorter side of the real surface.
        minor: u32,
        /// Output width.
        width: u32,
        /// Output height.
        height: u32,
    },
    /// True-perspective taper with a dropped left edge.
    DistortInclined {
        /// Longer side of the real surface.
        major: u32,
        /// Shorter side of the real surface.
        minor: u32,
        /// Resized width.
        width: u32,
        /// Resized height.
        height: u32,
        /// How far the top-left corner drops.
        incline: i32,
    },
    /// Parallelogram shear.
    Skew {
        /// Rows added to the source height.
        #[serde(default)]
        height_padding: i32,
        /// How far the sheared corner drops.
        shear_offset: i32,
        /// Quad construction.
        #[serde(default)]
        variant: SkewVariant,
    },
    /// Rotate about the centre keeping the size.
    Rotate {
        /// Clockwise angle.
        degrees: f64,
        /// Displacement applied before rotating.
        #[serde(default)]
        offset: Offset,
    },
    /// HSL lightness/saturation shift in percent.
    AdjustHsl {
        /// Lightness shift.
        #[serde(default)]
        brightness: i32,
        /// Saturation shift.
        #[serde(default)]
        saturation: i32,
    },
    /// Crop away transparent borders.
    TrimTransparent,
    /// Repeat the buffer on a `cols x rows` grid; cell `i` (row-major) uses `pattern[i % len]`.
    Mosaic {
        /// Tiles per row.
        cols: u32,
        /// Tiles per column.
        rows: u32,
        /// Per-cell transforms, cycled.
        pattern: Vec<VariantKind>,
        /// Joint width between tiles.
        #[serde(default)]
        spacing: u32,
        /// Straight RGBA behind the tiles; transparent when absent.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        fill: Option<[u8; 4]>,
    },
    /// 2x2 book-match: the buffer and its mirror on top, both flipped vertically below.
    BookMatch {
        /// Joint width between the quarters.
        #[serde(default)]
        spacing: u32,
        /// Straight RGBA behind the quarters; transparent when absent.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        fill: Option<[u8; 4]>,
    },
}

impl LayerOp {
    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Resize { .. } => "resize",
            Self::FlipHorizontal => "flip_horizontal",
            Self::FlipVertical => "flip_vertical",
            Self::Rotate180 => "rotate180",
            Self::Rotate90 => "rotate90",
            Self::Pad { .. } => "pad",
            Self::Homography { .. } => "homography",
            Self::Distort { .. } => "distort",
            Self::DistortInclined { .. } => "distort_inclined",
            Self::Skew { .. } => "skew",
            Self::Rotate { .. } => "rotate",
            Self::AdjustHsl { .. } => "adjust_hsl",
            Self::TrimTransparent => "trim_transparent",
            Self::Mosaic { .. } => "mosaic",
            Self::BookMatch { .. } => "book_match",
        }
    }

    fn validate(&self) -> MockupResult<()> {
        let positive = |what: &str, w: u32, h: u32| {
            if w == 0 || h == 0 {
                Err(MockupError::invalid_recipe(format!(
                    "{what} dimensions must be > 0, got {w}x{h}"
                )))
            } else {
                Ok(())
            }
        };
        match *self {
            Self::Resize { width, height, .. } => positive("resize", width, height),
            Self::Pad { width, height, .. } => positive("pad", width, height),
            Self::Mosaic {
                cols,
                rows,
                ref pattern,
                ..
            } => {
                positive("mosaic grid", cols, rows)?;
                if u64::from(cols) * u64::from(rows) > u64::from(MAX_MOSAIC_CELLS) {
                    return Err(MockupError::invalid_recipe(format!(
                        "mosaic grid {cols}x{rows} exceeds {MAX_MOSAIC_CELLS} cells"
                    )));
                }
                if pattern.is_empty() {
                    return Err(MockupError::invalid_recipe(
                        "mosaic pattern must list at least one transform",
                    ));
                }
                Ok(())
            }
            Self::Homography { quad, canvas } => {
                positive("homography canvas", canvas.width, canvas.height)?;
                quad.ensure_non_degenerate()
                    .map_err(|e| MockupError::invalid_recipe(format!("homography quad: {e}")))
            }
            Self::Distort {
                major,
                minor,
                width,
                height,
            }
            | Self::DistortInclined {
                major,
                minor,
                width,
                height,
                ..
            } => {
                positive("distortion sides", major, minor)?;
                positive("distortion output", width, height)
            }
            Self::Rotate { degrees, .. } if !degrees.is_finite() => Err(
                MockupError::invalid_recipe("rotation angle must be finite"),
            ),
            Self::AdjustHsl {
                brightness,
                saturation,
            } if !(-100..=100).contains(&brightness) || !(-100..=100).contains(&saturation) => {
                Err(MockupError::invalid_recipe(format!(
                    "hsl shifts must be in -100..=100, got brightness={brightness} saturation={saturation}"
                )))
            }
            _ => Ok(()),
        }
    }
}

/// Whole-photo pre-transform that distinguishes output variants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariantKind {
    /// Photo as given.
    Identity,
    /// Photo rotated by 180 degrees.
    Rotate180,
    /// Photo mirrored left to right.
    FlipHorizontal,
    /// Both of the above.
    Rotate180FlipHorizontal,
}

impl VariantKind {
    /// The four variants in their conventional order.
    pub fn all() -> Vec<Self> {
        vec![
            Self::Identity,
            Self::Rotate180,
            Self::FlipHorizontal,
            Self::Rotate180FlipHorizontal,
        ]
    }

    /// Apply to `photo`. `Identity` borrows instead of copying.
    pub fn apply(self, photo: &PixelBuffer) -> Cow<'_, PixelBuffer> {
        match self {
            Self::Identity => Cow::Borrowed(photo),
            Self::Rotate180 => Cow::Owned(photo.rotate180()),
            Self::FlipHorizontal => Cow::Owned(photo.flip_horizontal()),
            Self::Rotate180FlipHorizontal => Cow::Owned(photo.rotate180().flip_horizontal()),
        }
    }
}

impl Recipe {
    /// Check everything that can be checked without a photo.
    pub fn validate(&self) -> MockupResult<()> {
        if self.id.trim().is_empty() {
            return Err(MockupError::invalid_recipe("recipe id must be non-empty"));
        }
        let ctx = |e: MockupError, what: String| {
            MockupError::invalid_recipe(format!("recipe '{}' {what}: {}", self.id, strip(e)))
        };

        self.canvas
            .validate()
            .map_err(|e| ctx(e, "canvas".to_string()))?;
        if let Some(frame) = &self.frame {
            normalize_rel_path(frame).map_err(|e| ctx(e, "frame".to_string()))?;
        }
        if self.layers.is_empty() {
            return Err(ctx(
                MockupError::invalid_recipe("at least one layer is required"),
                "layers".to_string(),
            ));
        }
        for (li, layer) in self.layers.iter().enumerate() {
            layer
                .crop
                .validate()
                .map_err(|e| ctx(e, format!("layer {li} crop")))?;
            for (oi, op) in layer.ops.iter().enumerate() {
                op.validate()
                    .map_err(|e| ctx(e, format!("layer {li} op {oi} ({})", op.name())))?;
            }
        }

        if self.variants.is_empty() || self.variants.len() > MAX_VARIANTS {
            return Err(ctx(
                MockupError::invalid_recipe(format!(
                    "must list 1..={MAX_VARIANTS} variants, got {}",
                    self.variants.len()
                )),
                "variants".to_string(),
            ));
        }
        let mut seen = HashSet::new();
        for v in &self.variants {
            if !seen.insert(*v) {
                return Err(ctx(
                    MockupError::invalid_recipe(format!("duplicate variant {v:?}")),
                    "variants".to_string(),
                ));
            }
        }
        Ok(())
    }
}

// Inner message without the kind prefix, so re-wrapped errors read once.
fn strip(e: MockupError) -> String {
    match e {
        MockupError::DegenerateGeometry(m)
        | MockupError::InvalidArgument(m)
        | MockupError::InvalidRecipe(m)
        | MockupError::AssetUnavailable(m)
        | MockupError::Serde(m) => m,
        MockupError::Other(e) => format!("{e:#}"),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/compose/recipe.rs"]
mod tests;
