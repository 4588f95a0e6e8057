use anyhow::Result;
use std::process;
use tabled::{Table, Tabled, settings::Style};

use prep_core::models::{Ingredient, new_id, validate_ingredient};
use prep_core::service::Kitchen;

use super::helpers::{report_not_found, truncate};

/// Case-insensitive substring match on name or id.
fn filter_ingredients<'a>(ingredients: &'a [Ingredient], search: Option<&str>) -> Vec<&'a Ingredient> {
    let needle = search.map(str::to_lowercase);
    ingredients
        .iter()
        .filter(|i| {
            needle.as_deref().is_none_or(|n| {
                i.name.to_lowercase().contains(n) || i.id.to_lowercase().contains(n)
            })
        })
        .collect()
}

pub(crate) fn cmd_ingredient_list(kitchen: &Kitchen, search: Option<&str>, json: bool) -> Result<()> {
    #[derive(Tabled)]
    struct IngredientRow {
        #[tabled(rename = "ID")]
        id: String,
        #[tabled(rename = "Name")]
        name: String,
        #[tabled(rename = "Unit")]
        unit: String,
        #[tabled(rename = "Description")]
        description: String,
    }

    let ingredients = filter_ingredients(kitchen.ingredients(), search);

    if json {
        println!("{}", serde_json::to_string_pretty(&ingredients)?);
        return Ok(());
    }

    if ingredients.is_empty() {
        eprintln!("No ingredients found");
        process::exit(2);
    }

    let rows: Vec<IngredientRow> = ingredients
        .iter()
        .map(|i| IngredientRow {
            id: i.id.clone(),
            name: truncate(&i.name, 30),
            unit: i.unit.clone(),
            description: i
                .description
                .as_deref()
                .map(|d| truncate(d, 40))
                .unwrap_or_default(),
        })
        .collect();

    let table = Table::new(&rows).with(Style::rounded()).to_string();
    println!("{table}");
    Ok(())
}

pub(crate) fn cmd_ingredient_show(kitchen: &Kitchen, id: &str, json: bool) -> Result<()> {
    let Some(ingredient) = kitchen.get_ingredient(id) else {
        report_not_found(&format!("Ingredient '{id}' not found"), json);
        process::exit(2);
    };

    if json {
        println!("{}", serde_json::to_string_pretty(ingredient)?);
        return Ok(());
    }

    let name = &ingredient.name;
    let unit = &ingredient.unit;
    println!("=== {name} ===");
    println!("  ID:   {}", ingredient.id);
    println!("  Unit: {unit}");
    if let Some(description) = &ingredient.description {
        println!("  {description}");
    }
    Ok(())
}

pub(crate) fn cmd_ingredient_add(
    kitchen: &mut Kitchen,
    id: Option<String>,
    name: &str,
    unit: &str,
    description: Option<String>,
    json: bool,
) -> Result<()> {
    let ingredient = validate_ingredient(&Ingredient {
        id: id.unwrap_or_else(new_id),
        name: name.to_string(),
        unit: unit.to_string(),
        description,
    })?;
    if kitchen.get_ingredient(&ingredient.id).is_some() {
        eprintln!("Warning: an ingredient with id '{}' already exists", ingredient.id);
    }
    kitchen.add_ingredient(ingredient.clone())?;

    if json {
        println!("{}", serde_json::to_string_pretty(&ingredient)?);
    } else {
        let id = &ingredient.id;
        let name = &ingredient.name;
        println!("Added ingredient: {name} (id: {id})");
    }
    Ok(())
}

pub(crate) fn cmd_ingredient_update(
    kitchen: &mut Kitchen,
    id: &str,
    name: Option<String>,
    unit: Option<String>,
    description: Option<String>,
    json: bool,
) -> Result<()> {
    let Some(existing) = kitchen.get_ingredient(id).cloned() else {
        report_not_found(&format!("Ingredient '{id}' not found"), json);
        process::exit(2);
    };

    let updated = validate_ingredient(&Ingredient {
        id: existing.id,
        name: name.unwrap_or(existing.name),
        unit: unit.unwrap_or(existing.unit),
        description: description.or(existing.description),
    })?;
    kitchen.update_ingredient(updated.clone())?;

    if json {
        println!("{}", serde_json::to_string_pretty(&updated)?);
    } else {
        let name = &updated.name;
        println!("Updated ingredient: {name} (id: {id})");
    }
    Ok(())
}

pub(crate) fn cmd_ingredient_delete(kitchen: &mut Kitchen, id: &str, json: bool) -> Result<()> {
    let removed = kitchen.delete_ingredient(id)?;
    if removed == 0 {
        report_not_found(&format!("Ingredient '{id}' not found"), json);
        process::exit(2);
    }

    let used_by = kitchen
        .recipes()
        .iter()
        .filter(|r| r.ingredients.iter().any(|p| p.ingredient_id == id))
        .count();

    if json {
        println!("{}", serde_json::json!({ "deleted": id, "recipes_referencing": used_by }));
    } else {
        println!("Deleted ingredient {id}");
        if used_by > 0 {
            eprintln!("Note: {used_by} recipe(s) still reference '{id}'");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_ignores_case_on_id_and_name() {
        let kitchen = Kitchen::in_memory().unwrap();
        let found = filter_ingredients(kitchen.ingredients(), Some("DEFAULT-1"));
        let ids: Vec<&str> = found.iter().map(|i| i.id.as_str()).collect();
        assert!(ids.contains(&"default-1"));
        assert!(ids.contains(&"default-10"));
        assert!(!ids.contains(&"default-2"));

        assert_eq!(filter_ingredients(kitchen.ingredients(), Some("大米")).len(), 1);
        assert_eq!(filter_ingredients(kitchen.ingredients(), None).len(), 20);
    }

    #[test]
    fn test_update_with_empty_description_clears_it() {
        let mut kitchen = Kitchen::in_memory().unwrap();
        assert!(kitchen.get_ingredient("default-1").unwrap().description.is_some());

        cmd_ingredient_update(&mut kitchen, "default-1", None, None, Some(String::new()), true)
            .unwrap();
        let updated = kitchen.get_ingredient("default-1").unwrap();
        assert!(updated.description.is_none());
        assert_eq!(updated.unit, "克");
    }

    #[test]
    fn test_update_without_description_keeps_it() {
        let mut kitchen = Kitchen::in_memory().unwrap();
        let before = kitchen.get_ingredient("default-2").unwrap().description.clone();

        cmd_ingredient_update(&mut kitchen, "default-2", Some("Flour".to_string()), None, None, true)
            .unwrap();
        let updated = kitchen.get_ingredient("default-2").unwrap();
        assert_eq!(updated.name, "Flour");
        assert_eq!(updated.description, before);
    }
}
