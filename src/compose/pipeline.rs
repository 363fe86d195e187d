use std::fmt;

use rayon::prelude::*;

use crate::assets::cache::AssetCache;
use crate::compose::layer::{TransformedLayer, apply_ops};
use crate::compose::recipe::{LayerSpec, Recipe, VariantKind};
use crate::compose::watermark::watermark_origin;
use crate::foundation::core::Margin;
use crate::foundation::error::{ComposeError, ComposeStage, MockupError, MockupResult};
use crate::raster::buffer::PixelBuffer;
use crate::raster::composite::draw_at;
use crate::transform::warp::WarpOptions;

/// Shared, read-only inputs of one `compose` call.
pub(crate) struct ComposeContext<'a> {
    pub(crate) assets: &'a AssetCache,
    pub(crate) watermark: Option<&'a str>,
    pub(crate) margin: Margin,
    pub(crate) warp: WarpOptions,
    pub(crate) parallel: bool,
}

/// Something that degraded a variant without failing it.
#[derive(Debug)]
pub struct ComposeWarning {
    /// Variant index.
    pub variant: usize,
    /// Layer index, for transform warnings.
    pub layer: Option<usize>,
    /// Stage that raised it.
    pub stage: ComposeStage,
    /// What happened.
    pub error: MockupError,
}

impl fmt::Display for ComposeWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "variant {}", self.variant)?;
        if let Some(l) = self.layer {
            write!(f, " layer {l}")?;
        }
        write!(f, " at {}: {}", self.stage, self.error)
    }
}

/// Result of rendering one variant.
#[derive(Debug)]
pub struct VariantOutcome {
    /// Position in the requested variant list.
    pub index: usize,
    /// Pre-transform applied to the photo.
    pub kind: VariantKind,
    /// Finished canvas or the error that aborted this variant.
    pub result: Result<PixelBuffer, ComposeError>,
}

/// Every variant outcome of a `compose` call plus non-fatal warnings.
#[derive(Debug)]
pub struct ComposeReport {
    /// Recipe that was composed.
    pub recipe_id: String,
    /// One entry per requested variant, in order.
    pub variants: Vec<VariantOutcome>,
    /// Skipped overlays and singular transforms.
    pub warnings: Vec<ComposeWarning>,
}

impl ComposeReport {
    /// Number of variants that produced an image.
    pub fn succeeded(&self) -> usize {
        self.variants.iter().filter(|v| v.result.is_ok()).count()
    }

    /// Successful images in variant order, or the first error when none succeeded.
    pub fn into_images(self) -> Result<Vec<PixelBuffer>, ComposeError> {
        let mut images = Vec::with_capacity(self.variants.len());
        let mut first_err = None;
        for v in self.variants {
            match v.result {
                Ok(img) => images.push(img),
                Err(e) => {
                    if first_err.is_none() {
                        first_err = Some(e);
                    }
                }
            }
        }
        match first_err {
            Some(e) if images.is_empty() => Err(e),
            None if images.is_empty() => Err(ComposeError::call(
                self.recipe_id,
                MockupError::invalid_argument("no variants were rendered"),
            )),
            _ => Ok(images),
        }
    }
}

struct VariantRun {
    outcome: VariantOutcome,
    warnings: Vec<ComposeWarning>,
}

/// Render the first `variant_count` variants of `recipe` from `photo`.
#[tracing::instrument(
    skip(ctx, photo, recipe),
    fields(recipe = %recipe.id, photo_w = photo.width(), photo_h = photo.height())
)]
pub(crate) fn compose_recipe(
    ctx: &ComposeContext<'_>,
    photo: &PixelBuffer,
    recipe: &Recipe,
    variant_count: usize,
) -> Result<ComposeReport, ComposeError> {
    if variant_count == 0 || variant_count > recipe.variants.len() {
        return Err(ComposeError::call(
            &recipe.id,
            MockupError::invalid_argument(format!(
                "variant count must be in 1..={}, got {variant_count}",
                recipe.variants.len()
            )),
        ));
    }

    let kinds = &recipe.variants[..variant_count];
    let runs: Vec<VariantRun> = if ctx.parallel {
        kinds
            .par_iter()
            .copied()
            .enumerate()
            .map(|(index, kind)| render_variant(ctx, photo, recipe, index, kind))
            .collect()
    } else {
        kinds
            .iter()
            .copied()
            .enumerate()
            .map(|(index, kind)| render_variant(ctx, photo, recipe, index, kind))
            .collect()
    };

    let mut report = ComposeReport {
        recipe_id: recipe.id.clone(),
        variants: Vec::with_capacity(runs.len()),
        warnings: Vec::new(),
    };
    for run in runs {
        report.warnings.extend(run.warnings);
        report.variants.push(run.outcome);
    }
    tracing::debug!(
        succeeded = report.succeeded(),
        requested = variant_count,
        warnings = report.warnings.len(),
        "compose finished"
    );
    Ok(report)
}

#[tracing::instrument(level = "debug", skip(ctx, photo, recipe), fields(recipe = %recipe.id))]
fn render_variant(
    ctx: &ComposeContext<'_>,
    photo: &PixelBuffer,
    recipe: &Recipe,
    index: usize,
    kind: VariantKind,
) -> VariantRun {
    let mut warnings = Vec::new();
    let result = run_stages(ctx, photo, recipe, index, kind, &mut warnings);
    if let Err(err) = &result {
        tracing::warn!(error = %err, "variant failed");
    }
    VariantRun {
        outcome: VariantOutcome {
            index,
            kind,
            result,
        },
        warnings,
    }
}

fn run_stages(
    ctx: &ComposeContext<'_>,
    photo: &PixelBuffer,
    recipe: &Recipe,
    index: usize,
    kind: VariantKind,
    warnings: &mut Vec<ComposeWarning>,
) -> Result<PixelBuffer, ComposeError> {
    let fail = |stage: ComposeStage, e: MockupError| {
        ComposeError::variant(&recipe.id, index, stage, e)
    };

    let base = kind.apply(photo);

    tracing::debug!(stage = %ComposeStage::CropLayers, layers = recipe.layers.len());
    let crops = recipe
        .layers
        .iter()
        .enumerate()
        .map(|(li, layer)| {
            layer
                .crop
                .resolve(base.width(), base.height())
                .and_then(|rect| base.crop(rect))
                .map_err(|e| fail(ComposeStage::CropLayers, e).with_layer(li))
        })
        .collect::<Result<Vec<_>, _>>()?;
    drop(base);

    tracing::debug!(stage = %ComposeStage::TransformLayers);
    let transform = |(li, (crop, layer)): (usize, (PixelBuffer, &LayerSpec))| {
        apply_ops(crop, &layer.ops, ctx.warp)
            .map_err(|e| fail(ComposeStage::TransformLayers, e).with_layer(li))
    };
    let layers: Vec<TransformedLayer> = if ctx.parallel {
        crops
            .into_par_iter()
            .zip(recipe.layers.par_iter())
            .enumerate()
            .map(transform)
            .collect::<Result<_, _>>()?
    } else {
        crops
            .into_iter()
            .zip(recipe.layers.iter())
            .enumerate()
            .map(transform)
            .collect::<Result<_, _>>()?
    };
    for (li, layer) in layers.iter().enumerate() {
        for &oi in &layer.singular_ops {
            let op = recipe.layers[li].ops[oi].name();
            tracing::warn!(layer = li, op, "singular transform rendered nothing");
            warnings.push(ComposeWarning {
                variant: index,
                layer: Some(li),
                stage: ComposeStage::TransformLayers,
                error: MockupError::degenerate(format!(
                    "op {oi} ({op}) has a singular transform"
                )),
            });
        }
    }

    tracing::debug!(stage = %ComposeStage::PlaceOnCanvas);
    let (cw, ch) = (recipe.canvas.width, recipe.canvas.height);
    let mut canvas = match recipe.background {
        Some(rgba) => PixelBuffer::solid(cw, ch, rgba),
        None => PixelBuffer::new_transparent(cw, ch),
    }
    .map_err(|e| fail(ComposeStage::PlaceOnCanvas, e))?;
    for (li, (layer, spec)) in layers.iter().zip(&recipe.layers).enumerate() {
        let touched = draw_at(&mut canvas, &layer.buffer, spec.offset.x, spec.offset.y);
        if touched == 0 {
            tracing::debug!(layer = li, "layer lies entirely off canvas");
        }
    }
    drop(layers);

    if let Some(frame) = &recipe.frame {
        tracing::debug!(stage = %ComposeStage::OverlayFrame, frame = %frame);
        let res = overlay_frame(ctx.assets, &mut canvas, frame);
        absorb(res, index, ComposeStage::OverlayFrame, warnings)
            .map_err(|e| fail(ComposeStage::OverlayFrame, e))?;
    }

    if recipe.mirror_output {
        canvas = canvas.flip_horizontal();
    }

    if let Some(mark) = ctx.watermark {
        tracing::debug!(stage = %ComposeStage::Watermark, watermark = %mark);
        let res = overlay_watermark(ctx.assets, &mut canvas, mark, ctx.margin);
        absorb(res, index, ComposeStage::Watermark, warnings)
            .map_err(|e| fail(ComposeStage::Watermark, e))?;
    }

    Ok(canvas)
}

// Non-fatal errors become warnings; everything else still fails the variant.
fn absorb(
    res: MockupResult<()>,
    variant: usize,
    stage: ComposeStage,
    warnings: &mut Vec<ComposeWarning>,
) -> MockupResult<()> {
    match res {
        Err(error) if error.is_non_fatal() => {
            tracing::warn!(%stage, error = %error, "overlay skipped");
            warnings.push(ComposeWarning {
                variant,
                layer: None,
                stage,
                error,
            });
            Ok(())
        }
        other => other,
    }
}

fn overlay_frame(assets: &AssetCache, canvas: &mut PixelBuffer, frame: &str) -> MockupResult<()> {
    let img = assets.get_fitted(frame, canvas.width(), canvas.height())?;
    draw_at(canvas, &img, 0, 0);
    Ok(())
}

fn overlay_watermark(
    assets: &AssetCache,
    canvas: &mut PixelBuffer,
    mark: &str,
    margin: Margin,
) -> MockupResult<()> {
    let img = assets.get(mark)?;
    let (x, y) = watermark_origin(
        canvas.width(),
        canvas.height(),
        img.width(),
        img.height(),
        margin,
    );
    draw_at(canvas, &img, x, y);
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/compose/pipeline.rs"]
mod tests;
