use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pantry_recipes::recipe_service::RecipeService;
use pantry_recipes::search_config::{ProviderConfig, SearchConfig};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// pantry-recipes - find recipes for the ingredients you have
#[derive(Parser)]
#[command(name = "pantry-recipes")]
#[command(about = "Ingredient-based recipe search with fallback sources", long_about = None)]
struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search recipes for a comma-separated ingredient list
    Search {
        ingredients: String,

        /// quick, healthy, vegetarian, vegan, glutenfree, sweet, comfort or spicy
        #[arg(long)]
        filter: Option<String>,

        /// Number of recipes to return (1-25)
        #[arg(long)]
        number: Option<usize>,
    },
    /// Show one recipe with ingredients, steps and nutrition
    Show { id: i64 },
    /// Rescale a recipe's ingredients to a number of servings
    Scale { id: i64, servings: u32 },
    /// Report which external sources are configured
    Status,
}

fn init_logging(json: bool) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr);

    let installed = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| anyhow::anyhow!(e))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{rendered}");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    init_logging(cli.json_logs)?;

    let service = RecipeService::from_config(SearchConfig::from_env(), &ProviderConfig::from_env())
        .context("Failed to initialize recipe service")?;
    info!(status = ?service.source_status(), "Starting pantry-recipes");

    match cli.command {
        Commands::Search {
            ingredients,
            filter,
            number,
        } => {
            let outcome = service.search(&ingredients, filter.as_deref(), number).await?;
            print_json(&outcome)
        }
        Commands::Show { id } => print_json(&service.get_by_id(id).await?),
        Commands::Scale { id, servings } => print_json(&service.customize_servings(id, servings).await?),
        Commands::Status => print_json(&service.source_status()),
    }
}
