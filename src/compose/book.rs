use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use crate::compose::recipe::Recipe;
use crate::foundation::error::{MockupError, MockupResult};

const BUILTIN_JSON: &str = include_str!("../../recipes/builtin.json");

/// Immutable table of validated recipes keyed by id.
///
/// Cloning is cheap; clones share the same recipes.
#[derive(Clone, Debug, Default)]
pub struct RecipeBook {
    recipes: Arc<BTreeMap<String, Recipe>>,
}

impl RecipeBook {
    /// Build from recipes, validating each one and rejecting duplicate ids.
    pub fn new(recipes: impl IntoIterator<Item = Recipe>) -> MockupResult<Self> {
        let mut map = BTreeMap::new();
        for recipe in recipes {
            recipe.validate()?;
            if map.contains_key(&recipe.id) {
                return Err(MockupError::invalid_recipe(format!(
                    "duplicate recipe id '{}'",
                    recipe.id
                )));
            }
            map.insert(recipe.id.clone(), recipe);
        }
        Ok(Self {
            recipes: Arc::new(map),
        })
    }

    /// Parse a JSON array of recipes.
    pub fn from_json_str(json: &str) -> MockupResult<Self> {
        let recipes: Vec<Recipe> = serde_json::from_str(json)
            .map_err(|e| MockupError::serde(format!("parse recipe JSON: {e}")))?;
        Self::new(recipes)
    }

    /// Parse a JSON array of recipes from a reader.
    pub fn from_reader<R: std::io::Read>(r: R) -> MockupResult<Self> {
        let recipes: Vec<Recipe> = serde_json::from_reader(r)
            .map_err(|e| MockupError::serde(format!("parse recipe JSON: {e}")))?;
        Self::new(recipes)
    }

    /// Parse a JSON recipe file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> MockupResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            MockupError::invalid_recipe(format!("open recipe JSON '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    /// Recipes compiled into the crate.
    pub fn builtin() -> MockupResult<Self> {
        Self::from_json_str(BUILTIN_JSON)
    }

    /// Look up a recipe; unknown ids are [`MockupError::InvalidRecipe`].
    pub fn get(&self, id: &str) -> MockupResult<&Recipe> {
        self.recipes
            .get(id)
            .ok_or_else(|| MockupError::invalid_recipe(format!("unknown recipe '{id}'")))
    }

    /// Recipes in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Recipe> {
        self.recipes.values()
    }

    /// Number of recipes.
    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    /// Whether the book is empty.
    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/compose/book.rs"]
mod tests;
