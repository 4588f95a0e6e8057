use anyhow::{Result, bail};
use std::process;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use prep_core::models::PurchaseItem;
use prep_core::service::Kitchen;

use super::helpers::{format_amount, parse_selection, truncate};

/// Build a one-off selection from `RECIPE_ID=TABLES` arguments and print the
/// aggregated shopping list. The selection is never stored.
pub(crate) fn cmd_purchase(kitchen: &mut Kitchen, selections: &[String], json: bool) -> Result<()> {
    #[derive(Tabled)]
    struct PurchaseRow {
        #[tabled(rename = "Ingredient")]
        name: String,
        #[tabled(rename = "Amount")]
        amount: String,
        #[tabled(rename = "Unit")]
        unit: String,
    }

    if selections.is_empty() {
        bail!("Select at least one recipe with --select <RECIPE_ID=TABLES>");
    }
    kitchen.clear_selection();
    for raw in selections {
        kitchen.select(parse_selection(raw)?);
    }

    let list = kitchen.purchase_list();

    if json {
        println!("{}", serde_json::to_string_pretty(&list)?);
        return Ok(());
    }

    for missing in &list.missing_recipes {
        eprintln!("Warning: recipe '{missing}' not found, skipped");
    }

    if list.lines.is_empty() {
        eprintln!("Nothing to buy");
        process::exit(2);
    }

    let rows: Vec<PurchaseRow> = list
        .lines
        .iter()
        .map(|l| PurchaseRow {
            name: l.name.as_deref().map_or_else(
                || format!("? ({})", truncate(&l.ingredient_id, 20)),
                |n| truncate(n, 30),
            ),
            amount: format_amount(l.total),
            unit: l.unit.clone().unwrap_or_else(|| "-".to_string()),
        })
        .collect();

    println!(
        "{}",
        shopping_list_header(kitchen.purchase_items(), list.missing_recipes.len())
    );
    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(1..2)).with(Alignment::right()))
        .to_string();
    println!("{table}");
    Ok(())
}

fn shopping_list_header(items: &[PurchaseItem], missing: usize) -> String {
    let tables: u64 = items.iter().map(|i| u64::from(i.table_count)).sum();
    let recipes = items.len().saturating_sub(missing);
    format!("=== Shopping list ({recipes} recipes, {tables} tables) ===")
}

#[cfg(test)]
mod tests {
    use super::*;
    use prep_core::models::{Recipe, RecipeIngredient};

    fn item(recipe_id: &str, table_count: u32) -> PurchaseItem {
        PurchaseItem {
            recipe_id: recipe_id.to_string(),
            table_count,
        }
    }

    #[test]
    fn test_header_counts_found_recipes() {
        let items = [item("r1", 2), item("r2", 3), item("gone", 1)];
        assert_eq!(
            shopping_list_header(&items, 1),
            "=== Shopping list (2 recipes, 6 tables) ==="
        );
    }

    #[test]
    fn test_header_large_table_counts() {
        let items = [item("r1", 4_000_000_000), item("r2", 4_000_000_000)];
        assert_eq!(
            shopping_list_header(&items, 0),
            "=== Shopping list (2 recipes, 8000000000 tables) ==="
        );
    }

    #[test]
    fn test_purchase_with_large_table_counts() {
        let mut kitchen = Kitchen::in_memory().unwrap();
        for id in ["r1", "r2"] {
            kitchen
                .add_recipe(Recipe {
                    id: id.to_string(),
                    name: id.to_string(),
                    ingredients: vec![RecipeIngredient {
                        ingredient_id: "default-1".to_string(),
                        amount: 1.0,
                    }],
                    description: None,
                })
                .unwrap();
        }
        let selections = vec!["r1=4000000000".to_string(), "r2=4000000000".to_string()];
        cmd_purchase(&mut kitchen, &selections, false).unwrap();
        let total = kitchen.purchase_list().lines[0].total;
        assert!((total - 8_000_000_000.0).abs() < 1.0);
    }
}
