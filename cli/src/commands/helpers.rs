use anyhow::{Context, Result, bail};
use serde::Serialize;

use prep_core::models::{PurchaseItem, RecipeIngredient, validate_amount, validate_table_count};

/// Split `"key=value"` at the last `=`. Both sides must be non-empty.
fn split_pair(s: &str) -> Result<(&str, &str)> {
    let (key, value) = s
        .rsplit_once('=')
        .with_context(|| format!("Invalid pair '{s}'. Use the form ID=VALUE"))?;
    let key = key.trim();
    let value = value.trim();
    if key.is_empty() || value.is_empty() {
        bail!("Invalid pair '{s}'. Use the form ID=VALUE");
    }
    Ok((key, value))
}

/// Parse `"INGREDIENT_ID=AMOUNT"`, e.g. `"default-1=200"`.
pub(crate) fn parse_recipe_part(s: &str) -> Result<RecipeIngredient> {
    let (id, amount) = split_pair(s)?;
    let amount: f64 = amount
        .parse()
        .with_context(|| format!("Invalid amount '{amount}' in '{s}'"))?;
    Ok(RecipeIngredient {
        ingredient_id: id.to_string(),
        amount: validate_amount(amount)?,
    })
}

/// Parse `"RECIPE_ID=TABLES"`, e.g. `"r1=3"`.
pub(crate) fn parse_selection(s: &str) -> Result<PurchaseItem> {
    let (id, tables) = split_pair(s)?;
    let tables: u32 = tables
        .parse()
        .with_context(|| format!("Invalid table count '{tables}' in '{s}'"))?;
    Ok(PurchaseItem {
        recipe_id: id.to_string(),
        table_count: validate_table_count(tables)?,
    })
}

/// Whole numbers print without decimals, everything else with up to two.
pub(crate) fn format_amount(v: f64) -> String {
    let v = no_neg_zero(v);
    if v.fract() == 0.0 {
        format!("{v:.0}")
    } else {
        let s = format!("{v:.2}");
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

pub(crate) fn json_error(message: &str) -> String {
    #[derive(Serialize)]
    struct CliError<'a> {
        error: &'a str,
    }
    serde_json::to_string(&CliError { error: message })
        .unwrap_or_else(|_| format!("{{\"error\":\"{message}\"}}"))
}

/// Report a missing record the way every command does: JSON error on stdout
/// with `--json`, plain message on stderr otherwise. Callers exit with 2.
pub(crate) fn report_not_found(message: &str, json: bool) {
    if json {
        println!("{}", json_error(message));
    } else {
        eprintln!("{message}");
    }
}

pub(crate) fn no_neg_zero(v: f64) -> f64 {
    if v == 0.0 { 0.0 } else { v }
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let end = s.char_indices().nth(max - 3).map_or(s.len(), |(i, _)| i);
        format!("{}...", &s[..end])
    }
}
