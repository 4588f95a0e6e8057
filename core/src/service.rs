use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use chrono::Local;

use crate::catalog::{IngredientStore, LoadSource, RecipeStore};
use crate::db::SqliteStorage;
use crate::models::{
    EXPORT_VERSION, ExportData, ImportSummary, Ingredient, PurchaseItem, PurchaseList, Recipe,
    RecipeDetail, RecipeIngredientDetail, validate_export,
};
use crate::purchase::{PurchaseSelection, aggregate};
use crate::storage::{FileStorage, KeyValueStore, MemoryStorage};

/// Owns the ingredient and recipe catalogs plus the transient purchase
/// selection.
///
/// Built once at startup and handed to whatever drives it (CLI, HTTP
/// server). Nothing is read from storage until [`Kitchen::initialize`].
pub struct Kitchen {
    ingredients: IngredientStore,
    recipes: RecipeStore,
    selection: PurchaseSelection,
}

/// How each catalog was obtained by [`Kitchen::initialize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitReport {
    pub ingredients: LoadSource,
    pub recipes: LoadSource,
}

impl Kitchen {
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self {
            ingredients: IngredientStore::new(storage.clone()),
            recipes: RecipeStore::new(storage),
            selection: PurchaseSelection::new(),
        }
    }

    pub fn open_sqlite(path: &Path) -> Result<Self> {
        let mut kitchen = Self::new(Arc::new(SqliteStorage::open(path)?));
        kitchen.initialize()?;
        Ok(kitchen)
    }

    pub fn open_dir(dir: &Path) -> Result<Self> {
        let mut kitchen = Self::new(Arc::new(FileStorage::open(dir)?));
        kitchen.initialize()?;
        Ok(kitchen)
    }

    pub fn in_memory() -> Result<Self> {
        let mut kitchen = Self::new(Arc::new(MemoryStorage::new()));
        kitchen.initialize()?;
        Ok(kitchen)
    }

    pub fn initialize(&mut self) -> Result<InitReport> {
        let report = InitReport {
            ingredients: self.ingredients.load()?,
            recipes: self.recipes.load()?,
        };
        tracing::info!(
            ingredients = self.ingredients.len(),
            recipes = self.recipes.len(),
            "kitchen initialized"
        );
        Ok(report)
    }

    // --- Ingredients ---

    #[must_use]
    pub fn ingredients(&self) -> &[Ingredient] {
        self.ingredients.list()
    }

    #[must_use]
    pub fn get_ingredient(&self, id: &str) -> Option<&Ingredient> {
        self.ingredients.get(id)
    }

    pub fn add_ingredient(&mut self, ingredient: Ingredient) -> Result<()> {
        self.ingredients.add(ingredient)
    }

    pub fn update_ingredient(&mut self, ingredient: Ingredient) -> Result<bool> {
        self.ingredients.update(ingredient)
    }

    /// Removes the ingredient only; recipes that use it keep the dangling id.
    pub fn delete_ingredient(&mut self, id: &str) -> Result<usize> {
        self.ingredients.delete(id)
    }

    // --- Recipes ---

    #[must_use]
    pub fn recipes(&self) -> &[Recipe] {
        self.recipes.list()
    }

    #[must_use]
    pub fn get_recipe(&self, id: &str) -> Option<&Recipe> {
        self.recipes.get(id)
    }

    pub fn add_recipe(&mut self, recipe: Recipe) -> Result<()> {
        self.recipes.add(recipe)
    }

    pub fn update_recipe(&mut self, recipe: Recipe) -> Result<bool> {
        self.recipes.update(recipe)
    }

    pub fn delete_recipe(&mut self, id: &str) -> Result<usize> {
        self.recipes.delete(id)
    }

    /// A recipe with each ingredient joined against the catalog.
    #[must_use]
    pub fn recipe_detail(&self, id: &str) -> Option<RecipeDetail> {
        let recipe = self.recipes.get(id)?;
        let ingredients = recipe
            .ingredients
            .iter()
            .map(|part| {
                let found = self.ingredients.get(&part.ingredient_id);
                RecipeIngredientDetail {
                    ingredient_id: part.ingredient_id.clone(),
                    amount: part.amount,
                    name: found.map(|i| i.name.clone()),
                    unit: found.map(|i| i.unit.clone()),
                }
            })
            .collect();
        Some(RecipeDetail {
            id: recipe.id.clone(),
            name: recipe.name.clone(),
            description: recipe.description.clone(),
            ingredients,
        })
    }

    // --- Purchase selection ---

    #[must_use]
    pub fn purchase_items(&self) -> &[PurchaseItem] {
        self.selection.items()
    }

    pub fn select(&mut self, item: PurchaseItem) {
        self.selection.add(item);
    }

    pub fn deselect(&mut self, recipe_id: &str) -> bool {
        self.selection.remove(recipe_id)
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    #[must_use]
    pub fn purchase_list(&self) -> PurchaseList {
        aggregate(
            self.selection.items(),
            self.recipes.list(),
            self.ingredients.list(),
        )
    }

    // --- Export / Import ---

    #[must_use]
    pub fn export(&self) -> ExportData {
        ExportData {
            version: EXPORT_VERSION,
            exported_at: Local::now().to_rfc3339(),
            ingredients: self.ingredients.list().to_vec(),
            recipes: self.recipes.list().to_vec(),
        }
    }

    /// Replace both catalogs with the contents of a backup. The purchase
    /// selection is cleared since it may point at recipes that are gone.
    ///
    /// Every record is validated before anything is written. If the recipe
    /// write fails, the previous ingredient list is written back.
    pub fn import(&mut self, data: ExportData) -> Result<ImportSummary> {
        let data = validate_export(&data)?;
        let summary = ImportSummary {
            ingredients_imported: data.ingredients.len(),
            recipes_imported: data.recipes.len(),
        };

        let previous = self.ingredients.list().to_vec();
        self.ingredients.replace_all(data.ingredients)?;
        if let Err(e) = self.recipes.replace_all(data.recipes) {
            if let Err(restore) = self.ingredients.replace_all(previous) {
                tracing::error!("failed to restore ingredients after import error: {restore:#}");
            }
            return Err(e);
        }
        self.selection.clear();
        Ok(summary)
    }
}
