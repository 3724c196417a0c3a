//! # Recipe Store
//!
//! Named bills of materials, keyed by case-insensitive name and kept
//! sorted by name on disk.

use std::sync::Arc;
use tracing::debug;

use crate::error::StoreResult;
use crate::storage::Storage;
use papeleria_core::validation::validate_required;
use papeleria_core::Recipe;

#[derive(Debug, Clone)]
pub struct RecipeStore {
    storage: Arc<Storage>,
}

impl RecipeStore {
    pub fn new(storage: Arc<Storage>) -> Self {
        RecipeStore { storage }
    }

    pub async fn list(&self) -> StoreResult<Vec<Recipe>> {
        self.storage.load_recipes().await
    }

    /// Case-insensitive lookup by name.
    pub async fn get_by_name(&self, name: &str) -> StoreResult<Option<Recipe>> {
        let recipes = self.list().await?;
        Ok(recipes.into_iter().find(|r| r.has_name(name)))
    }

    /// Replaces the recipe with the same name, or adds it.
    ///
    /// ## Returns
    /// * `Err(StoreError::Validation)` - the recipe name is blank
    pub async fn upsert(&self, recipe: Recipe) -> StoreResult<()> {
        validate_required("recipe name", &recipe.name)?;
        debug!(name = %recipe.name, items = recipe.items.len(), "Saving recipe");

        let guard = self.storage.lock().await;
        let mut recipes = self.storage.load_recipes().await?;
        recipes.retain(|r| !r.has_name(&recipe.name));
        recipes.push(recipe);
        recipes.sort_by_cached_key(|r| r.name.to_lowercase());
        self.storage.save_recipes(&guard, &recipes).await
    }

    /// Deletes a recipe by name.
    ///
    /// ## Returns
    /// * `Ok(true)` - A recipe was removed
    /// * `Ok(false)` - No recipe had that name; nothing written
    pub async fn remove_by_name(&self, name: &str) -> StoreResult<bool> {
        let guard = self.storage.lock().await;
        let mut recipes = self.storage.load_recipes().await?;
        let before = recipes.len();
        recipes.retain(|r| !r.has_name(name));
        if recipes.len() == before {
            return Ok(false);
        }
        self.storage.save_recipes(&guard, &recipes).await?;
        debug!(name = %name, "Recipe removed");
        Ok(true)
    }
}
