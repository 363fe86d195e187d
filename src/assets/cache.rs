use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

use anyhow::Context;

use crate::assets::decode::decode_image;
use crate::foundation::error::{MockupError, MockupResult};
use crate::raster::buffer::{PixelBuffer, ResizeFilter};

type FittedKey = (String, u32, u32);

#[derive(Default)]
struct Slot {
    image: OnceLock<Result<Arc<PixelBuffer>, String>>,
    decodes: AtomicU64,
}

/// Process-wide, load-once cache of frame and watermark images under one root directory.
///
/// Entries are keyed by normalized relative path and initialized exactly once; a failed load
/// is remembered and reported again as [`MockupError::AssetUnavailable`] without touching the
/// filesystem. Cached images are shared read-only. Copies resized to a canvas size are cached
/// alongside the native image, keyed by `(path, width, height)`.
pub struct AssetCache {
    root: PathBuf,
    slots: Mutex<HashMap<String, Arc<Slot>>>,
    fitted: Mutex<HashMap<FittedKey, Arc<Slot>>>,
}

impl std::fmt::Debug for AssetCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetCache")
            .field("root", &self.root)
            .field("entries", &self.lock().len())
            .field("fitted", &lock_map(&self.fitted).len())
            .finish()
    }
}

impl AssetCache {
    /// Cache reading assets relative to `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            slots: Mutex::new(HashMap::new()),
            fitted: Mutex::new(HashMap::new()),
        }
    }

    /// Asset root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Load (once) and return the image at `source`.
    pub fn get(&self, source: &str) -> MockupResult<Arc<PixelBuffer>> {
        let key = normalize_rel_path(source)?;
        let slot = self.slot(&key);
        let loaded = slot.image.get_or_init(|| {
            slot.decodes.fetch_add(1, Ordering::Relaxed);
            let result = self.load(&key);
            match &result {
                Ok(img) => tracing::debug!(
                    asset = %key,
                    width = img.width(),
                    height = img.height(),
                    "asset decoded"
                ),
                Err(err) => tracing::warn!(asset = %key, error = %err, "asset failed to load"),
            }
            result.map(Arc::new).map_err(|e| format!("{e:#}"))
        });
        loaded
            .clone()
            .map_err(|msg| MockupError::asset_unavailable(format!("'{key}': {msg}")))
    }

    /// The image at `source` resized to exactly `width x height`.
    ///
    /// Returns the native image when it already has that size. Otherwise the resize runs once
    /// per `(source, width, height)` and later calls share the result.
    pub fn get_fitted(
        &self,
        source: &str,
        width: u32,
        height: u32,
    ) -> MockupResult<Arc<PixelBuffer>> {
        let native = self.get(source)?;
        if native.width() == width && native.height() == height {
            return Ok(native);
        }
        let key = (normalize_rel_path(source)?, width, height);
        let slot = Arc::clone(lock_map(&self.fitted).entry(key.clone()).or_default());
        let fitted = slot.image.get_or_init(|| {
            slot.decodes.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(asset = %key.0, width, height, "asset resized to canvas");
            native
                .resize(width, height, ResizeFilter::default())
                .map(Arc::new)
                .map_err(|e| e.to_string())
        });
        fitted.clone().map_err(|msg| {
            MockupError::invalid_argument(format!("resize '{}' to {width}x{height}: {msg}", key.0))
        })
    }

    /// How many times `source` was resized to `width x height`. Zero when never requested.
    pub fn resize_count(&self, source: &str, width: u32, height: u32) -> u64 {
        let Ok(key) = normalize_rel_path(source) else {
            return 0;
        };
        lock_map(&self.fitted)
            .get(&(key, width, height))
            .map(|slot| slot.decodes.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    /// How many times `source` was read and decoded. Zero for unknown keys.
    pub fn decode_count(&self, source: &str) -> u64 {
        let Ok(key) = normalize_rel_path(source) else {
            return 0;
        };
        self.lock()
            .get(&key)
            .map(|slot| slot.decodes.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    /// Normalized cache key for `source`.
    pub fn normalize_source(&self, source: &str) -> MockupResult<String> {
        normalize_rel_path(source)
    }

    fn slot(&self, key: &str) -> Arc<Slot> {
        Arc::clone(self.lock().entry(key.to_string()).or_default())
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Arc<Slot>>> {
        lock_map(&self.slots)
    }

    fn load(&self, key: &str) -> anyhow::Result<PixelBuffer> {
        let path = self.root.join(Path::new(key));
        let bytes = std::fs::read(&path)
            .with_context(|| format!("read asset bytes from '{}'", path.display()))?;
        decode_image(&bytes).map_err(anyhow::Error::from)
    }
}

fn lock_map<K>(map: &Mutex<HashMap<K, Arc<Slot>>>) -> MutexGuard<'_, HashMap<K, Arc<Slot>>> {
    map.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Normalize an asset path to a stable cache key.
///
/// The result uses `/` separators and drops `.` segments. Absolute paths and parent traversals
/// (`..`) are rejected as [`MockupError::AssetUnavailable`].
pub fn normalize_rel_path(source: &str) -> MockupResult<String> {
    let s = source.replace('\\', "/");
    if s.starts_with('/') || s.get(1..2) == Some(":") {
        return Err(MockupError::asset_unavailable(format!(
            "asset paths must be relative, got '{source}'"
        )));
    }

    let mut out = Vec::<&str>::new();
    for part in s.split('/') {
        if part.is_empty() || part == "." {
            continue;
        }
        if part == ".." {
            return Err(MockupError::asset_unavailable(format!(
                "asset paths must not contain '..', got '{source}'"
            )));
        }
        out.push(part);
    }

    if out.is_empty() {
        return Err(MockupError::asset_unavailable(
            "asset path must contain a file name",
        ));
    }
    Ok(out.join("/"))
}

#[cfg(test)]
#[path = "../../tests/unit/assets/cache.rs"]
mod tests;
