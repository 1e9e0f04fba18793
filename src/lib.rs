pub mod config;
pub mod error;
pub mod model;
pub mod normalizer;
pub mod pipeline;
pub mod presentation;
pub mod providers;
pub mod store;
pub mod units;
pub mod url_to_text;

pub use config::{load_config, AppConfig, LanguageConfig};
pub use error::{ImportError, Result};
pub use model::{Ingredient, LocalizedText, Recipe, RecipeRecord, RecipeSummary, Step, Variant};
pub use normalizer::Normalizer;
pub use pipeline::{validate_url, ImportFailure, ImportOutcome, Importer, Stage, SUCCESS_MESSAGE};
pub use presentation::{render_list, scale_quantity, DisplayOptions, RecipeView};
pub use store::Store;
pub use units::{convert_unit, UnitSystem};

/// Open the configured database and image directory, creating the schema if needed.
pub fn open_store(config: &AppConfig) -> Result<Store> {
    Store::open(&config.database.path, &config.images.dir)
}
