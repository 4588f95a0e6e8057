use indexmap::IndexMap;

use crate::models::{Ingredient, PurchaseItem, PurchaseLine, PurchaseList, Recipe};

/// In-progress shopping calculation: at most one entry per recipe.
///
/// Lives in memory only.
#[derive(Debug, Clone, Default)]
pub struct PurchaseSelection {
    items: Vec<PurchaseItem>,
}

impl PurchaseSelection {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or, when the recipe is already selected, overwrite its table
    /// count in place.
    pub fn add(&mut self, item: PurchaseItem) {
        if let Some(existing) = self
            .items
            .iter_mut()
            .find(|i| i.recipe_id == item.recipe_id)
        {
            existing.table_count = item.table_count;
        } else {
            self.items.push(item);
        }
    }

    pub fn remove(&mut self, recipe_id: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|i| i.recipe_id != recipe_id);
        self.items.len() != before
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    #[must_use]
    pub fn items(&self) -> &[PurchaseItem] {
        &self.items
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Total up `amount × table_count` per ingredient across every selected
/// recipe.
///
/// Lines appear in the order ingredients are first met. Recipes that cannot
/// be found are listed in `missing_recipes`; ingredient ids that cannot be
/// found still get a line, just without name or unit.
#[must_use]
pub fn aggregate(
    selection: &[PurchaseItem],
    recipes: &[Recipe],
    ingredients: &[Ingredient],
) -> PurchaseList {
    let mut totals: IndexMap<&str, f64> = IndexMap::new();
    let mut missing_recipes = Vec::new();

    for item in selection {
        let Some(recipe) = recipes.iter().find(|r| r.id == item.recipe_id) else {
            missing_recipes.push(item.recipe_id.clone());
            continue;
        };
        let tables = f64::from(item.table_count);
        for part in &recipe.ingredients {
            *totals.entry(part.ingredient_id.as_str()).or_insert(0.0) += part.amount * tables;
        }
    }

    let lines = totals
        .into_iter()
        .map(|(ingredient_id, total)| {
            let found = ingredients.iter().find(|i| i.id == ingredient_id);
            if found.is_none() {
                tracing::debug!(ingredient_id, "purchase line has no catalog entry");
            }
            PurchaseLine {
                ingredient_id: ingredient_id.to_string(),
                name: found.map(|i| i.name.clone()),
                unit: found.map(|i| i.unit.clone()),
                total,
            }
        })
        .collect();

    PurchaseList {
        lines,
        missing_recipes,
    }
}
