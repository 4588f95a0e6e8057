use anyhow::Result;
use std::process;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use prep_core::models::{Recipe, RecipeIngredient, new_id, validate_recipe};
use prep_core::service::Kitchen;

use super::helpers::{format_amount, parse_recipe_part, report_not_found, truncate};

/// Parse `ID=AMOUNT` arguments and warn about ids the catalog does not know.
/// Unknown ids are still accepted.
fn parse_parts(kitchen: &Kitchen, raw: &[String]) -> Result<Vec<RecipeIngredient>> {
    let parts = raw
        .iter()
        .map(|s| parse_recipe_part(s))
        .collect::<Result<Vec<_>>>()?;
    for part in &parts {
        if kitchen.get_ingredient(&part.ingredient_id).is_none() {
            let id = &part.ingredient_id;
            eprintln!("Warning: ingredient '{id}' is not in the catalog");
        }
    }
    Ok(parts)
}

pub(crate) fn cmd_recipe_list(kitchen: &Kitchen, json: bool) -> Result<()> {
    #[derive(Tabled)]
    struct RecipeRow {
        #[tabled(rename = "ID")]
        id: String,
        #[tabled(rename = "Name")]
        name: String,
        #[tabled(rename = "Ingredients")]
        ingredients: usize,
        #[tabled(rename = "Description")]
        description: String,
    }

    let recipes = kitchen.recipes();
    if json {
        println!("{}", serde_json::to_string_pretty(recipes)?);
        return Ok(());
    }

    if recipes.is_empty() {
        eprintln!("No recipes found");
        process::exit(2);
    }

    let rows: Vec<RecipeRow> = recipes
        .iter()
        .map(|r| RecipeRow {
            id: r.id.clone(),
            name: truncate(&r.name, 30),
            ingredients: r.ingredients.len(),
            description: r
                .description
                .as_deref()
                .map(|d| truncate(d, 40))
                .unwrap_or_default(),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(2..3)).with(Alignment::right()))
        .to_string();
    println!("{table}");
    Ok(())
}

pub(crate) fn cmd_recipe_show(kitchen: &Kitchen, id: &str, json: bool) -> Result<()> {
    let Some(detail) = kitchen.recipe_detail(id) else {
        report_not_found(&format!("Recipe '{id}' not found"), json);
        process::exit(2);
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&detail)?);
        return Ok(());
    }

    let name = &detail.name;
    println!("=== {name} ===");
    if let Some(description) = &detail.description {
        println!("  {description}");
    }
    println!("\n  INGREDIENTS:");
    if detail.ingredients.is_empty() {
        println!("    (none)");
    }
    for ing in &detail.ingredients {
        let amount = format_amount(ing.amount);
        match (&ing.name, &ing.unit) {
            (Some(name), Some(unit)) => println!("    {name} — {amount} {unit}"),
            _ => {
                let missing = &ing.ingredient_id;
                println!("    ? ({missing}, not in catalog) — {amount}");
            }
        }
    }
    Ok(())
}

pub(crate) fn cmd_recipe_add(
    kitchen: &mut Kitchen,
    id: Option<String>,
    name: &str,
    parts: &[String],
    description: Option<String>,
    json: bool,
) -> Result<()> {
    let ingredients = parse_parts(kitchen, parts)?;
    let recipe = validate_recipe(&Recipe {
        id: id.unwrap_or_else(new_id),
        name: name.to_string(),
        ingredients,
        description,
    })?;
    if kitchen.get_recipe(&recipe.id).is_some() {
        eprintln!("Warning: a recipe with id '{}' already exists", recipe.id);
    }
    kitchen.add_recipe(recipe.clone())?;

    if json {
        println!("{}", serde_json::to_string_pretty(&recipe)?);
    } else {
        let id = &recipe.id;
        let count = recipe.ingredients.len();
        println!("Created recipe: {name} (id: {id}, {count} ingredients)");
        if count == 0 {
            println!("Add ingredients with: prep recipe update {id} --ingredient <ID=AMOUNT>");
        }
    }
    Ok(())
}

/// Rename, re-describe, or replace the ingredient list of a recipe. Passing
/// any `--ingredient` replaces the whole list.
pub(crate) fn cmd_recipe_update(
    kitchen: &mut Kitchen,
    id: &str,
    name: Option<String>,
    parts: &[String],
    description: Option<String>,
    json: bool,
) -> Result<()> {
    let Some(existing) = kitchen.get_recipe(id).cloned() else {
        report_not_found(&format!("Recipe '{id}' not found"), json);
        process::exit(2);
    };

    let ingredients = if parts.is_empty() {
        existing.ingredients
    } else {
        parse_parts(kitchen, parts)?
    };
    let updated = validate_recipe(&Recipe {
        id: existing.id,
        name: name.unwrap_or(existing.name),
        ingredients,
        description: description.or(existing.description),
    })?;
    kitchen.update_recipe(updated.clone())?;

    if json {
        println!("{}", serde_json::to_string_pretty(&updated)?);
    } else {
        let name = &updated.name;
        println!("Updated recipe: {name} (id: {id})");
    }
    Ok(())
}

pub(crate) fn cmd_recipe_delete(kitchen: &mut Kitchen, id: &str, json: bool) -> Result<()> {
    if kitchen.delete_recipe(id)? == 0 {
        report_not_found(&format!("Recipe '{id}' not found"), json);
        process::exit(2);
    }
    if json {
        println!("{}", serde_json::json!({ "deleted": id }));
    } else {
        println!("Deleted recipe {id}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_with_empty_description_clears_it() {
        let mut kitchen = Kitchen::in_memory().unwrap();
        cmd_recipe_add(
            &mut kitchen,
            Some("r1".to_string()),
            "Fried rice",
            &["default-1=200".to_string()],
            Some("Leftover rice works best".to_string()),
            true,
        )
        .unwrap();

        cmd_recipe_update(&mut kitchen, "r1", None, &[], Some(String::new()), true).unwrap();
        let recipe = kitchen.get_recipe("r1").unwrap();
        assert!(recipe.description.is_none());
        assert_eq!(recipe.ingredients.len(), 1);
    }

    #[test]
    fn test_update_ingredients_replaces_list() {
        let mut kitchen = Kitchen::in_memory().unwrap();
        cmd_recipe_add(
            &mut kitchen,
            Some("r1".to_string()),
            "Stew",
            &["default-4=300".to_string(), "default-6=2".to_string()],
            None,
            true,
        )
        .unwrap();

        cmd_recipe_update(&mut kitchen, "r1", None, &["default-3=150".to_string()], None, true)
            .unwrap();
        let recipe = kitchen.get_recipe("r1").unwrap();
        assert_eq!(recipe.ingredients.len(), 1);
        assert_eq!(recipe.ingredients[0].ingredient_id, "default-3");
        assert_eq!(recipe.name, "Stew");
    }
}
