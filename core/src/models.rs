use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

/// Storage key the ingredient catalog is persisted under.
pub const INGREDIENTS_KEY: &str = "chef-ingredients";
/// Storage key the recipe catalog is persisted under.
pub const RECIPES_KEY: &str = "chef-recipes";

pub const EXPORT_VERSION: i64 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    pub id: String,
    pub name: String,
    pub unit: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeIngredient {
    pub ingredient_id: String,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub ingredients: Vec<RecipeIngredient>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseItem {
    pub recipe_id: String,
    pub table_count: u32,
}

/// One aggregated row of the shopping list.
///
/// `name` and `unit` are `None` when the ingredient id no longer resolves
/// against the catalog.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseLine {
    pub ingredient_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    pub total: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseList {
    pub lines: Vec<PurchaseLine>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub missing_recipes: Vec<String>,
}

impl PurchaseList {
    #[must_use]
    pub fn line(&self, ingredient_id: &str) -> Option<&PurchaseLine> {
        self.lines.iter().find(|l| l.ingredient_id == ingredient_id)
    }
}

// --- Recipe detail (ingredients joined against the catalog) ---

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeIngredientDetail {
    pub ingredient_id: String,
    pub amount: f64,
    // Joined fields for display
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecipeDetail {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub ingredients: Vec<RecipeIngredientDetail>,
}

// --- Export / Import ---

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportData {
    pub version: i64,
    pub exported_at: String,
    #[serde(default)]
    pub ingredients: Vec<Ingredient>,
    #[serde(default)]
    pub recipes: Vec<Recipe>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub ingredients_imported: usize,
    pub recipes_imported: usize,
}

/// Generate a fresh record id.
#[must_use]
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

pub fn validate_name(field: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        bail!("{field} must not be empty");
    }
    Ok(trimmed.to_string())
}

pub fn validate_amount(amount: f64) -> Result<f64> {
    if !amount.is_finite() {
        bail!("Amount must be a finite number");
    }
    if amount < 0.0 {
        bail!("Amount must not be negative (got {amount})");
    }
    Ok(amount)
}

pub fn validate_table_count(count: u32) -> Result<u32> {
    if count == 0 {
        bail!("Table count must be at least 1");
    }
    Ok(count)
}

/// Validate an ingredient before it reaches a store. Trims name and unit and
/// drops blank descriptions.
pub fn validate_ingredient(ingredient: &Ingredient) -> Result<Ingredient> {
    Ok(Ingredient {
        id: validate_name("id", &ingredient.id)?,
        name: validate_name("name", &ingredient.name)?,
        unit: validate_name("unit", &ingredient.unit)?,
        description: normalize_description(ingredient.description.as_deref()),
    })
}

pub fn validate_recipe(recipe: &Recipe) -> Result<Recipe> {
    let ingredients = recipe
        .ingredients
        .iter()
        .map(|ri| {
            Ok(RecipeIngredient {
                ingredient_id: validate_name("ingredientId", &ri.ingredient_id)?,
                amount: validate_amount(ri.amount)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(Recipe {
        id: validate_name("id", &recipe.id)?,
        name: validate_name("name", &recipe.name)?,
        ingredients,
        description: normalize_description(recipe.description.as_deref()),
    })
}

/// Check a backup before it replaces anything: the version must be readable
/// and every record must pass the same checks as a single add.
pub fn validate_export(data: &ExportData) -> Result<ExportData> {
    if data.version > EXPORT_VERSION {
        bail!(
            "Unsupported export version {} (this build reads up to {EXPORT_VERSION})",
            data.version
        );
    }
    let ingredients = data
        .ingredients
        .iter()
        .map(|i| validate_ingredient(i).with_context(|| format!("Invalid ingredient '{}'", i.id)))
        .collect::<Result<Vec<_>>>()?;
    let recipes = data
        .recipes
        .iter()
        .map(|r| validate_recipe(r).with_context(|| format!("Invalid recipe '{}'", r.id)))
        .collect::<Result<Vec<_>>>()?;
    Ok(ExportData {
        version: data.version,
        exported_at: data.exported_at.clone(),
        ingredients,
        recipes,
    })
}

fn normalize_description(description: Option<&str>) -> Option<String> {
    description
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ingredient_json_shape() {
        let ing = Ingredient {
            id: "i1".to_string(),
            name: "Rice".to_string(),
            unit: "g".to_string(),
            description: None,
        };
        let json = serde_json::to_value(&ing).unwrap();
        assert_eq!(json, serde_json::json!({"id": "i1", "name": "Rice", "unit": "g"}));
    }

    #[test]
    fn test_recipe_uses_camel_case_fields() {
        let raw = r#"{"id":"r1","name":"Fried rice","ingredients":[{"ingredientId":"i1","amount":100}]}"#;
        let recipe: Recipe = serde_json::from_str(raw).unwrap();
        assert_eq!(recipe.ingredients[0].ingredient_id, "i1");
        assert!((recipe.ingredients[0].amount - 100.0).abs() < f64::EPSILON);
        assert!(recipe.description.is_none());

        let back = serde_json::to_string(&recipe).unwrap();
        assert!(back.contains("\"ingredientId\":\"i1\""));
    }

    #[test]
    fn test_recipe_without_ingredients_field() {
        let recipe: Recipe = serde_json::from_str(r#"{"id":"r1","name":"Empty"}"#).unwrap();
        assert!(recipe.ingredients.is_empty());
    }

    #[test]
    fn test_purchase_item_json() {
        let item: PurchaseItem =
            serde_json::from_str(r#"{"recipeId":"r1","tableCount":3}"#).unwrap();
        assert_eq!(item.recipe_id, "r1");
        assert_eq!(item.table_count, 3);
    }

    #[test]
    fn test_validate_amount() {
        assert!(validate_amount(0.0).is_ok());
        assert!(validate_amount(12.5).is_ok());
        assert!(validate_amount(-1.0).is_err());
        assert!(validate_amount(f64::NAN).is_err());
        assert!(validate_amount(f64::INFINITY).is_err());
    }

    #[test]
    fn test_validate_table_count() {
        assert!(validate_table_count(0).is_err());
        assert_eq!(validate_table_count(4).unwrap(), 4);
    }

    #[test]
    fn test_validate_ingredient_trims() {
        let ing = Ingredient {
            id: " i1 ".to_string(),
            name: "  Salt ".to_string(),
            unit: "g".to_string(),
            description: Some("   ".to_string()),
        };
        let clean = validate_ingredient(&ing).unwrap();
        assert_eq!(clean.id, "i1");
        assert_eq!(clean.name, "Salt");
        assert!(clean.description.is_none());
    }

    #[test]
    fn test_validate_ingredient_rejects_blank_unit() {
        let ing = Ingredient {
            id: "i1".to_string(),
            name: "Salt".to_string(),
            unit: " ".to_string(),
            description: None,
        };
        assert!(validate_ingredient(&ing).is_err());
    }

    #[test]
    fn test_validate_recipe_rejects_negative_amount() {
        let recipe = Recipe {
            id: "r1".to_string(),
            name: "Soup".to_string(),
            ingredients: vec![RecipeIngredient {
                ingredient_id: "i1".to_string(),
                amount: -5.0,
            }],
            description: None,
        };
        assert!(validate_recipe(&recipe).is_err());
    }

    #[test]
    fn test_new_id_unique() {
        assert_ne!(new_id(), new_id());
    }
}
