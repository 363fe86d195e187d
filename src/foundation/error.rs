use std::fmt;

/// Convenience result type used across stonemock.
pub type MockupResult<T> = Result<T, MockupError>;

/// Top-level error taxonomy used by engine APIs.
#[derive(thiserror::Error, Debug)]
pub enum MockupError {
    /// A quadrilateral or transform is singular (collinear or duplicate points).
    #[error("degenerate geometry: {0}")]
    DegenerateGeometry(String),

    /// Non-positive dimensions or out-of-range rectangles.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Unknown recipe id or malformed recipe parameters.
    #[error("invalid recipe: {0}")]
    InvalidRecipe(String),

    /// Frame or watermark asset is missing or cannot be decoded.
    ///
    /// The compositor treats this as non-fatal and skips the overlay.
    #[error("asset unavailable: {0}")]
    AssetUnavailable(String),

    /// Errors when serializing or deserializing recipes or configuration.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl MockupError {
    /// Build a [`MockupError::DegenerateGeometry`] value.
    pub fn degenerate(msg: impl Into<String>) -> Self {
        Self::DegenerateGeometry(msg.into())
    }

    /// Build a [`MockupError::InvalidArgument`] value.
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Build a [`MockupError::InvalidRecipe`] value.
    pub fn invalid_recipe(msg: impl Into<String>) -> Self {
        Self::InvalidRecipe(msg.into())
    }

    /// Build a [`MockupError::AssetUnavailable`] value.
    pub fn asset_unavailable(msg: impl Into<String>) -> Self {
        Self::AssetUnavailable(msg.into())
    }

    /// Build a [`MockupError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Whether this error only degrades output instead of aborting it.
    pub fn is_non_fatal(&self) -> bool {
        matches!(self, Self::AssetUnavailable(_))
    }
}

/// Stage of the per-variant composition state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ComposeStage {
    /// Recipe lookup and argument checks, before any pixel work.
    Start,
    /// Cutting sub-regions out of the (pre-transformed) photo.
    CropLayers,
    /// Running each crop through its layer operations.
    TransformLayers,
    /// Drawing transformed layers onto the recipe canvas in z-order.
    PlaceOnCanvas,
    /// Drawing the static frame asset.
    OverlayFrame,
    /// Drawing the watermark logo.
    Watermark,
}

impl fmt::Display for ComposeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Start => "start",
            Self::CropLayers => "crop-layers",
            Self::TransformLayers => "transform-layers",
            Self::PlaceOnCanvas => "place-on-canvas",
            Self::OverlayFrame => "overlay-frame",
            Self::Watermark => "watermark",
        };
        f.write_str(s)
    }
}

/// A [`MockupError`] annotated with where in a `compose` call it happened.
#[derive(Debug)]
pub struct ComposeError {
    /// Recipe being composed.
    pub recipe_id: String,
    /// Variant index, when the failure is scoped to one variant.
    pub variant: Option<usize>,
    /// Layer index inside the recipe, when scoped to one layer.
    pub layer: Option<usize>,
    /// Stage that failed.
    pub stage: ComposeStage,
    /// Underlying error.
    pub source: MockupError,
}

impl ComposeError {
    /// Error scoped to the whole call (no variant or layer).
    pub fn call(recipe_id: impl Into<String>, source: MockupError) -> Self {
        Self {
            recipe_id: recipe_id.into(),
            variant: None,
            layer: None,
            stage: ComposeStage::Start,
            source,
        }
    }

    /// Error scoped to one variant stage.
    pub fn variant(
        recipe_id: impl Into<String>,
        variant: usize,
        stage: ComposeStage,
        source: MockupError,
    ) -> Self {
        Self {
            recipe_id: recipe_id.into(),
            variant: Some(variant),
            layer: None,
            stage,
            source,
        }
    }

    /// Attach a layer index.
    pub fn with_layer(mut self, layer: usize) -> Self {
        self.layer = Some(layer);
        self
    }
}

impl fmt::Display for ComposeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "recipe '{}'", self.recipe_id)?;
        if let Some(v) = self.variant {
            write!(f, " variant {v}")?;
        }
        if let Some(l) = self.layer {
            write!(f, " layer {l}")?;
        }
        write!(f, " at {}: {}", self.stage, self.source)
    }
}

impl std::error::Error for ComposeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
