use std::collections::BTreeSet;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rayon::prelude::*;

use crate::assets::cache::AssetCache;
use crate::compose::book::RecipeBook;
use crate::compose::pipeline::{ComposeContext, ComposeReport, compose_recipe};
use crate::foundation::core::Margin;
use crate::foundation::error::{ComposeError, MockupError, MockupResult};
use crate::raster::buffer::PixelBuffer;
use crate::transform::warp::{SampleFilter, WarpOptions};

/// Engine configuration, usually loaded from JSON.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Directory frame and watermark paths are resolved against.
    pub asset_root: PathBuf,
    /// Watermark asset drawn on every variant; `None` disables it.
    pub watermark: Option<String>,
    /// Distance of the watermark from the bottom-right canvas corner.
    pub watermark_margin: Margin,
    /// Sampling filter for every warp.
    pub filter: SampleFilter,
    /// Coverage-weighted warp edges.
    pub antialias: bool,
    /// Run variants, layers and warp rows on rayon.
    pub parallel: bool,
    /// Dedicated worker count. `None` uses the global rayon pool.
    pub threads: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            asset_root: PathBuf::from("assets"),
            watermark: Some("watermark.png".to_string()),
            watermark_margin: Margin::default(),
            filter: SampleFilter::default(),
            antialias: true,
            parallel: true,
            threads: None,
        }
    }
}

impl EngineConfig {
    /// Parse from JSON text.
    pub fn from_json_str(json: &str) -> MockupResult<Self> {
        serde_json::from_str(json).map_err(|e| MockupError::serde(format!("parse config JSON: {e}")))
    }

    /// Parse a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> MockupResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            MockupError::invalid_argument(format!("open config JSON '{}': {e}", path.display()))
        })?;
        serde_json::from_reader(BufReader::new(f))
            .map_err(|e| MockupError::serde(format!("parse config JSON '{}': {e}", path.display())))
    }

    /// Reject settings no engine can run with.
    pub fn validate(&self) -> MockupResult<()> {
        if let Some(n) = self.threads
            && n == 0
        {
            return Err(MockupError::invalid_argument(
                "config 'threads' must be >= 1 when set",
            ));
        }
        if let Some(mark) = &self.watermark
            && mark.trim().is_empty()
        {
            return Err(MockupError::invalid_argument(
                "config 'watermark' must be a non-empty path when set",
            ));
        }
        Ok(())
    }

    fn warp_options(&self) -> WarpOptions {
        WarpOptions {
            filter: self.filter,
            antialias: self.antialias,
            parallel: self.parallel,
        }
    }
}

/// Recipe-driven mockup compositor.
///
/// Owns the recipe table and the process-wide asset cache; both are read-only after
/// construction, so one engine can serve concurrent `compose` calls from many threads.
pub struct MockupEngine {
    config: EngineConfig,
    recipes: RecipeBook,
    assets: Arc<AssetCache>,
    pool: Option<rayon::ThreadPool>,
}

impl std::fmt::Debug for MockupEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockupEngine")
            .field("config", &self.config)
            .field("recipes", &self.recipes.len())
            .field("assets", &self.assets)
            .field("dedicated_pool", &self.pool.is_some())
            .finish()
    }
}

impl MockupEngine {
    /// Create an engine. Fails on an invalid configuration.
    pub fn new(config: EngineConfig, recipes: RecipeBook) -> MockupResult<Self> {
        config.validate()?;
        let pool = if config.parallel && config.threads.is_some() {
            Some(build_thread_pool(config.threads)?)
        } else {
            None
        };
        let assets = Arc::new(AssetCache::new(config.asset_root.clone()));
        tracing::debug!(
            recipes = recipes.len(),
            asset_root = %config.asset_root.display(),
            threads = ?config.threads,
            "mockup engine ready"
        );
        Ok(Self {
            config,
            recipes,
            assets,
            pool,
        })
    }

    /// Active configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Loaded recipes.
    pub fn recipes(&self) -> &RecipeBook {
        &self.recipes
    }

    /// Shared frame and watermark cache.
    pub fn assets(&self) -> &AssetCache {
        &self.assets
    }

    /// Decode every frame and the watermark up front.
    ///
    /// Returns the assets that could not be loaded; they stay cached as unavailable and the
    /// corresponding overlays will be skipped.
    pub fn preload(&self) -> Vec<MockupError> {
        let mut paths: BTreeSet<&str> = self
            .recipes
            .iter()
            .filter_map(|r| r.frame.as_deref())
            .collect();
        if let Some(mark) = self.config.watermark.as_deref() {
            paths.insert(mark);
        }
        let paths: Vec<&str> = paths.into_iter().collect();

        let load = || -> Vec<MockupError> {
            if self.config.parallel {
                paths
                    .par_iter()
                    .filter_map(|p| self.assets.get(p).err())
                    .collect()
            } else {
                paths
                    .iter()
                    .filter_map(|p| self.assets.get(p).err())
                    .collect()
            }
        };
        let failures = match &self.pool {
            Some(pool) => pool.install(load),
            None => load(),
        };
        for err in &failures {
            tracing::warn!(error = %err, "asset preload failed");
        }
        failures
    }

    /// Render `variant_count` variants of `recipe_id` from `photo`.
    ///
    /// Returns the successful variants in order, or the first error when none succeeded.
    pub fn compose(
        &self,
        photo: &PixelBuffer,
        recipe_id: &str,
        variant_count: u8,
    ) -> Result<Vec<PixelBuffer>, ComposeError> {
        self.compose_report(photo, recipe_id, variant_count)?
            .into_images()
    }

    /// Like [`MockupEngine::compose`] but returns every variant outcome and warning.
    pub fn compose_report(
        &self,
        photo: &PixelBuffer,
        recipe_id: &str,
        variant_count: u8,
    ) -> Result<ComposeReport, ComposeError> {
        let recipe = self
            .recipes
            .get(recipe_id)
            .map_err(|e| ComposeError::call(recipe_id, e))?;
        let ctx = ComposeContext {
            assets: &self.assets,
            watermark: self.config.watermark.as_deref(),
            margin: self.config.watermark_margin,
            warp: self.config.warp_options(),
            parallel: self.config.parallel,
        };
        let run = || compose_recipe(&ctx, photo, recipe, usize::from(variant_count));
        match &self.pool {
            Some(pool) => pool.install(run),
            None => run(),
        }
    }
}

fn build_thread_pool(threads: Option<usize>) -> MockupResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(MockupError::invalid_argument(
            "engine 'threads' must be >= 1 when set",
        ));
    }

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| MockupError::invalid_argument(format!("failed to build rayon thread pool: {e}")))
}

#[cfg(test)]
#[path = "../tests/unit/engine.rs"]
mod tests;
