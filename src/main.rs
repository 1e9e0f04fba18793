use clap::{Parser, Subcommand};
use env_logger::{Builder, Env};
use log::{debug, error};
use recipe_keeper::presentation::language_variant;
use recipe_keeper::{
    load_config, open_store, render_list, validate_url, AppConfig, DisplayOptions, ImportError,
    Importer, RecipeView, Variant, SUCCESS_MESSAGE,
};
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "recipe-keeper", version, about = "Import recipes from the web into a local cookbook")]
struct Cli {
    /// SQLite database file (overrides config and DB_FILE)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Directory for cached recipe images
    #[arg(long, global = true)]
    images_dir: Option<PathBuf>,

    /// Log every pipeline stage
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create the database schema
    Init,
    /// Fetch a recipe page, interpret it and save the result
    Import { url: String },
    /// List saved recipes, newest first
    List {
        /// Language code of the names to show
        #[arg(long)]
        lang: Option<String>,
    },
    /// Show one recipe
    Show {
        id: i64,
        /// Scale ingredient quantities to this many servings
        #[arg(long)]
        servings: Option<u32>,
        /// original, metric or imperial
        #[arg(long)]
        units: Option<String>,
        /// Language code of the text to show
        #[arg(long)]
        lang: Option<String>,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Delete a recipe and its cached image
    Delete { id: i64 },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            return ExitCode::FAILURE;
        }
    };
    if let Some(db) = &cli.db {
        config.database.path = db.clone();
    }
    if let Some(dir) = &cli.images_dir {
        config.images.dir = dir.clone();
    }
    config.debug |= cli.debug;

    Builder::from_env(Env::default().default_filter_or(if config.debug {
        "debug"
    } else {
        "info"
    }))
    .init();
    debug!("Loaded configuration: {:?}", config.database);

    match run(cli.command, &config).await {
        Ok(code) => code,
        Err(e) => {
            error!("{}", e);
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command, config: &AppConfig) -> Result<ExitCode, Box<dyn Error>> {
    match command {
        Command::Init => {
            open_store(config)?;
            println!(
                "Initialized database at {}",
                config.database.path.display()
            );
        }

        Command::Import { url } => {
            if validate_url(&url).is_err() {
                eprintln!("Invalid URL.");
                return Ok(ExitCode::FAILURE);
            }
            let importer = Importer::from_config(config)?;
            let mut store = open_store(config)?;
            match importer.import(&mut store, &url).await {
                Ok(outcome) => {
                    println!("{SUCCESS_MESSAGE}");
                    println!("Saved as recipe {}: {}", outcome.id, outcome.name);
                }
                Err(failure) => {
                    eprintln!("{}", failure.stage.failure_message());
                    return Ok(ExitCode::FAILURE);
                }
            }
        }

        Command::List { lang } => {
            let variant = match lang {
                Some(lang) => language_variant(&lang, &config.languages)?,
                None => Variant::Primary,
            };
            let store = open_store(config)?;
            print!("{}", render_list(&store.list()?, variant));
        }

        Command::Show {
            id,
            servings,
            units,
            lang,
            json,
        } => {
            let options = DisplayOptions::from_tokens(
                servings,
                units.as_deref(),
                lang.as_deref(),
                &config.languages,
            )?;
            let store = open_store(config)?;
            let view = RecipeView::new(&store.get(id)?, &options);
            if json {
                println!("{}", serde_json::to_string_pretty(&view)?);
            } else {
                print!("{view}");
            }
        }

        Command::Delete { id } => {
            let mut store = open_store(config)?;
            if !store.delete(id)? {
                return Err(ImportError::NotFound(id).into());
            }
            println!("Deleted recipe {id}.");
        }
    }

    Ok(ExitCode::SUCCESS)
}
