mod commands;
mod config;
mod logging;
mod server;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;

use crate::commands::{
    cmd_export, cmd_import, cmd_ingredient_add, cmd_ingredient_delete, cmd_ingredient_list,
    cmd_ingredient_show, cmd_ingredient_update, cmd_purchase, cmd_recipe_add, cmd_recipe_delete,
    cmd_recipe_list, cmd_recipe_show, cmd_recipe_update,
};
use crate::config::{Backend, Config};

#[derive(Parser)]
#[command(
    name = "prep",
    version,
    about = "Manage ingredients and recipes, and work out what to buy"
)]
struct Cli {
    /// Directory holding the catalogs (default: platform data dir)
    #[arg(long, global = true, env = "PREP_DATA_DIR", value_name = "PATH")]
    data_dir: Option<PathBuf>,
    /// Storage backend
    #[arg(long, global = true, env = "PREP_BACKEND", value_enum, default_value = "sqlite")]
    backend: Backend,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage the ingredient catalog
    Ingredient {
        #[command(subcommand)]
        command: IngredientCommands,
    },
    /// Manage recipes
    Recipe {
        #[command(subcommand)]
        command: RecipeCommands,
    },
    /// Work out the shopping list for a set of recipes and table counts
    Purchase {
        /// Recipe and number of tables, e.g. "r1=3" (repeatable)
        #[arg(short, long = "select", value_name = "RECIPE_ID=TABLES", required = true)]
        selections: Vec<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Export ingredients and recipes as a JSON backup
    Export {
        /// Write to this file instead of stdout
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// Replace ingredients and recipes with the contents of a JSON backup
    Import {
        /// Path to the backup file
        file: PathBuf,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Start the REST API server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8080")]
        port: u16,
        /// Address to bind to (default: 127.0.0.1, use 0.0.0.0 to expose to network)
        #[arg(short, long, default_value = "127.0.0.1")]
        bind: String,
        /// Disable API key authentication (for development/testing)
        #[arg(long)]
        no_auth: bool,
    },
}

#[derive(Subcommand)]
enum IngredientCommands {
    /// List ingredients
    List {
        /// Only show ingredients whose name or id contains this text
        #[arg(short, long)]
        search: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one ingredient
    Show {
        /// Ingredient ID
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Add an ingredient
    Add {
        /// Ingredient name
        name: String,
        /// Unit of measure (e.g. "g", "ml", "pcs")
        unit: String,
        /// Description
        #[arg(short, long)]
        description: Option<String>,
        /// Explicit ID (default: generated)
        #[arg(long)]
        id: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Change an ingredient's name, unit or description
    Update {
        /// Ingredient ID
        id: String,
        /// New name
        #[arg(long)]
        name: Option<String>,
        /// New unit
        #[arg(long)]
        unit: Option<String>,
        /// New description (an empty string clears it)
        #[arg(short, long)]
        description: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete an ingredient (recipes keep their reference)
    Delete {
        /// Ingredient ID
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum RecipeCommands {
    /// List recipes
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show a recipe with its ingredients
    Show {
        /// Recipe ID
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Create a recipe
    Add {
        /// Recipe name
        name: String,
        /// Ingredient and amount per table, e.g. "default-3=500" (repeatable)
        #[arg(short, long = "ingredient", value_name = "ID=AMOUNT")]
        ingredients: Vec<String>,
        /// Description
        #[arg(short, long)]
        description: Option<String>,
        /// Explicit ID (default: generated)
        #[arg(long)]
        id: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Change a recipe; any --ingredient replaces the whole ingredient list
    Update {
        /// Recipe ID
        id: String,
        /// New name
        #[arg(long)]
        name: Option<String>,
        /// Ingredient and amount per table, e.g. "default-3=500" (repeatable)
        #[arg(short, long = "ingredient", value_name = "ID=AMOUNT")]
        ingredients: Vec<String>,
        /// New description (an empty string clears it)
        #[arg(short, long)]
        description: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a recipe
    Delete {
        /// Recipe ID
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() {
    logging::init_tracing();
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load(cli.data_dir.as_deref(), cli.backend)?;
    let mut kitchen = config.open_kitchen()?;

    match cli.command {
        Commands::Ingredient { command } => match command {
            IngredientCommands::List { search, json } => {
                cmd_ingredient_list(&kitchen, search.as_deref(), json)
            }
            IngredientCommands::Show { id, json } => cmd_ingredient_show(&kitchen, &id, json),
            IngredientCommands::Add {
                name,
                unit,
                description,
                id,
                json,
            } => cmd_ingredient_add(&mut kitchen, id, &name, &unit, description, json),
            IngredientCommands::Update {
                id,
                name,
                unit,
                description,
                json,
            } => cmd_ingredient_update(&mut kitchen, &id, name, unit, description, json),
            IngredientCommands::Delete { id, json } => {
                cmd_ingredient_delete(&mut kitchen, &id, json)
            }
        },
        Commands::Recipe { command } => match command {
            RecipeCommands::List { json } => cmd_recipe_list(&kitchen, json),
            RecipeCommands::Show { id, json } => cmd_recipe_show(&kitchen, &id, json),
            RecipeCommands::Add {
                name,
                ingredients,
                description,
                id,
                json,
            } => cmd_recipe_add(&mut kitchen, id, &name, &ingredients, description, json),
            RecipeCommands::Update {
                id,
                name,
                ingredients,
                description,
                json,
            } => cmd_recipe_update(&mut kitchen, &id, name, &ingredients, description, json),
            RecipeCommands::Delete { id, json } => cmd_recipe_delete(&mut kitchen, &id, json),
        },
        Commands::Purchase { selections, json } => cmd_purchase(&mut kitchen, &selections, json),
        Commands::Export { output } => cmd_export(&kitchen, output.as_deref()),
        Commands::Import { file, json } => cmd_import(&mut kitchen, &file, json),
        Commands::Serve {
            port,
            bind,
            no_auth,
        } => {
            let (api_key, new_api_key) = if no_auth {
                (None, false)
            } else {
                let (key, new) = config.load_or_create_api_key()?;
                (Some(key), new)
            };
            server::start_server(kitchen, port, &bind, api_key, new_api_key).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_purchase_selections() {
        let cli = Cli::try_parse_from(["prep", "purchase", "-s", "r1=3", "--select", "r2=1"])
            .unwrap();
        match cli.command {
            Commands::Purchase { selections, json } => {
                assert_eq!(selections, vec!["r1=3", "r2=1"]);
                assert!(!json);
            }
            _ => panic!("expected purchase"),
        }
    }

    #[test]
    fn test_purchase_requires_selection() {
        assert!(Cli::try_parse_from(["prep", "purchase"]).is_err());
    }

    #[test]
    fn test_empty_description_is_accepted() {
        let cli = Cli::try_parse_from(["prep", "ingredient", "update", "default-1", "--description", ""])
            .unwrap();
        match cli.command {
            Commands::Ingredient {
                command: IngredientCommands::Update { description, .. },
            } => assert_eq!(description.as_deref(), Some("")),
            _ => panic!("expected ingredient update"),
        }
    }

    #[test]
    fn test_global_backend_flag() {
        let cli = Cli::try_parse_from(["prep", "recipe", "list", "--backend", "files"]).unwrap();
        assert_eq!(cli.backend, Backend::Files);
    }
}
