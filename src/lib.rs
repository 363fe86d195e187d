//! stonemock renders product mockups of stone slabs.
//!
//! A source photo of a slab is cut into layers, each layer is pushed through a chain of
//! geometric transforms (four-point homography, column-taper distortion, parallelogram skew,
//! rotation) and the results are composited onto a template canvas with a frame overlay and a
//! watermark. Templates are plain data ([`Recipe`]) collected in a [`RecipeBook`].
//!
//! - Build a [`MockupEngine`] from an [`EngineConfig`] and a [`RecipeBook`]
//! - Call [`MockupEngine::compose`] with a decoded [`PixelBuffer`] and a recipe id
//!
//! The geometry building blocks ([`solve`], [`warp`], [`distort`], [`skew`], [`rotate`]) are
//! exported for direct use.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod assets;
mod compose;
mod engine;
mod foundation;
mod raster;
mod transform;

pub use crate::assets::cache::{AssetCache, normalize_rel_path};
pub use crate::assets::decode::decode_image;
pub use crate::compose::book::RecipeBook;
pub use crate::compose::mosaic::MAX_MOSAIC_CELLS;
pub use crate::compose::pipeline::{ComposeReport, ComposeWarning, VariantOutcome};
pub use crate::compose::recipe::{
    CropSpec, LayerOp, LayerSpec, MAX_VARIANTS, Offset, Recipe, VariantKind,
};
pub use crate::compose::watermark::watermark_origin;
pub use crate::engine::{EngineConfig, MockupEngine};
pub use crate::foundation::core::{
    Affine, Canvas, Margin, PixelRect, Point, Point2D, Quad, Vec2,
};
pub use crate::foundation::error::{ComposeError, ComposeStage, MockupError, MockupResult};
pub use crate::foundation::math::GEOMETRY_EPSILON;
pub use crate::raster::buffer::{PixelBuffer, ResizeFilter};
pub use crate::raster::color::adjust_hsl;
pub use crate::raster::composite::{PremulRgba8, draw_at, over};
pub use crate::transform::distort::{column_heights, distort, distort_inclined};
pub use crate::transform::homography::{Transform3x3, solve, solve_from_size};
pub use crate::transform::rotate::{rotate, rotation_transform};
pub use crate::transform::skew::{SkewVariant, skew, skew_quad};
pub use crate::transform::warp::{SampleFilter, WarpOptions, warp, warp_with};
