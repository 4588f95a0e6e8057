use anyhow::{Context, Result};
use std::path::Path;

use prep_core::models::ExportData;
use prep_core::service::Kitchen;

pub(crate) fn cmd_export(kitchen: &Kitchen, output: Option<&Path>) -> Result<()> {
    let data = kitchen.export();
    let json = serde_json::to_string_pretty(&data)?;
    match output {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            let ingredients = data.ingredients.len();
            let recipes = data.recipes.len();
            eprintln!(
                "Exported {ingredients} ingredients and {recipes} recipes to {}",
                path.display()
            );
        }
        None => println!("{json}"),
    }
    Ok(())
}

pub(crate) fn cmd_import(kitchen: &mut Kitchen, file: &Path, json: bool) -> Result<()> {
    let input = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read file: {}", file.display()))?;
    let data: ExportData = serde_json::from_str(&input)
        .with_context(|| format!("Failed to parse backup: {}", file.display()))?;

    let summary = kitchen.import(data)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        let ingredients = summary.ingredients_imported;
        let recipes = summary.recipes_imported;
        println!("Imported {ingredients} ingredients and {recipes} recipes");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_import_rejects_bad_backup_and_keeps_catalogs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("backup.json");
        std::fs::write(
            &path,
            r#"{
                "version": 1,
                "exportedAt": "2026-01-01T00:00:00+00:00",
                "ingredients": [{"id": "i1", "name": "Rice", "unit": "g"}],
                "recipes": [{"id": "r1", "name": "Bowl", "ingredients": [{"ingredientId": "i1", "amount": -2}]}]
            }"#,
        )
        .unwrap();

        let mut kitchen = Kitchen::in_memory().unwrap();
        let err = cmd_import(&mut kitchen, &path, false).unwrap_err();
        assert!(format!("{err:#}").contains("negative"));
        assert_eq!(kitchen.ingredients().len(), 20);
        assert!(kitchen.recipes().is_empty());
    }

    #[test]
    fn test_export_then_import_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("backup.json");

        let mut source = Kitchen::in_memory().unwrap();
        source.delete_ingredient("default-20").unwrap();
        cmd_export(&source, Some(&path)).unwrap();

        let mut target = Kitchen::in_memory().unwrap();
        cmd_import(&mut target, &path, true).unwrap();
        assert_eq!(target.ingredients().len(), 19);
    }
}
