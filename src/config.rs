use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;

/// Application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    /// SQLite database settings
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Where downloaded recipe images are cached
    #[serde(default)]
    pub images: ImagesConfig,
    /// Completion endpoint settings
    #[serde(default)]
    pub llm: LlmConfig,
    /// Language pair used for translated fields
    #[serde(default)]
    pub languages: LanguageConfig,
    /// Verbose logging of every pipeline stage
    #[serde(default)]
    pub debug: bool,
    /// Request timeout in seconds for page, image and LLM requests
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ImagesConfig {
    #[serde(default = "default_images_dir")]
    pub dir: PathBuf,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            dir: default_images_dir(),
        }
    }
}

/// Configuration for the LLM provider
#[derive(Debug, Deserialize, Clone)]
pub struct LlmConfig {
    /// Provider name: "openai" or "ollama"
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Model identifier (e.g., "gpt-4o-mini", "llama3.1")
    #[serde(default = "default_model")]
    pub model: String,
    /// Temperature for generation (0.0-1.0)
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Maximum tokens to generate
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// API key for authentication (can also be set via OPENAI_API_KEY)
    pub api_key: Option<String>,
    /// Base URL for API endpoint (for custom or proxy endpoints)
    pub base_url: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            api_key: None,
            base_url: None,
        }
    }
}

/// Languages every textual field is requested in.
///
/// Without a secondary language the LLM is asked for a single variant. An empty
/// `secondary` in config.toml switches translation off.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct LanguageConfig {
    #[serde(default = "default_primary_language")]
    pub primary: String,
    #[serde(default = "default_secondary_language")]
    pub secondary: Option<String>,
}

impl Default for LanguageConfig {
    fn default() -> Self {
        Self {
            primary: default_primary_language(),
            secondary: default_secondary_language(),
        }
    }
}

impl LanguageConfig {
    pub fn single(primary: impl Into<String>) -> Self {
        Self {
            primary: primary.into(),
            secondary: None,
        }
    }

    /// The secondary language, ignoring blanks and repeats of the primary.
    pub fn secondary(&self) -> Option<&str> {
        self.secondary
            .as_deref()
            .map(str::trim)
            .filter(|lang| !lang.is_empty() && !lang.eq_ignore_ascii_case(&self.primary))
    }
}

// Default value functions
fn default_database_path() -> PathBuf {
    PathBuf::from("recipes.db")
}

fn default_images_dir() -> PathBuf {
    PathBuf::from("images")
}

fn default_provider() -> String {
    "openai".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_temperature() -> f32 {
    0.2
}

fn default_max_tokens() -> u32 {
    2000
}

fn default_primary_language() -> String {
    "nl".to_string()
}

fn default_secondary_language() -> Option<String> {
    Some("en".to_string())
}

fn default_timeout() -> u64 {
    30
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            images: ImagesConfig::default(),
            llm: LlmConfig::default(),
            languages: LanguageConfig::default(),
            debug: false,
            timeout: default_timeout(),
        }
    }
}

/// Load configuration from file and environment variables
///
/// Configuration is loaded with the following priority (highest to lowest):
/// 1. `DB_FILE` and `DEBUG` environment variables
/// 2. Environment variables with RECIPE_KEEPER__ prefix
/// 3. config.toml file in current directory
/// 4. Default values
///
/// Environment variable format: RECIPE_KEEPER__LLM__API_KEY
pub fn load_config() -> Result<AppConfig, ConfigError> {
    let settings = Config::builder()
        // Optional config file (can be missing)
        .add_source(File::with_name("config").required(false))
        .set_override_option("database.path", std::env::var("DB_FILE").ok())?
        .set_override_option(
            "debug",
            std::env::var("DEBUG").ok().map(|v| v.eq_ignore_ascii_case("true")),
        )?
        // Use double underscore for nested: RECIPE_KEEPER__LLM__API_KEY
        .add_source(
            Environment::with_prefix("RECIPE_KEEPER")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    settings.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = AppConfig::default();
        assert_eq!(config.database.path, PathBuf::from("recipes.db"));
        assert_eq!(config.images.dir, PathBuf::from("images"));
        assert_eq!(config.llm.provider, "openai");
        assert_eq!(config.llm.max_tokens, 2000);
        assert_eq!(config.timeout, 30);
        assert!(!config.debug);
    }

    #[test]
    fn test_default_languages_are_bilingual() {
        let languages = LanguageConfig::default();
        assert_eq!(languages.primary, "nl");
        assert_eq!(languages.secondary.as_deref(), Some("en"));
        assert_eq!(languages.secondary(), Some("en"));
        assert_eq!(LanguageConfig::single("en").secondary(), None);
    }

    #[test]
    fn test_deserialize_partial_toml() {
        let settings = Config::builder()
            .add_source(File::from_str(
                r#"
                debug = true

                [llm]
                provider = "ollama"
                model = "llama3.1"

                [languages]
                primary = "en"
                secondary = ""
                "#,
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap();

        let config: AppConfig = settings.try_deserialize().unwrap();
        assert!(config.debug);
        assert_eq!(config.llm.provider, "ollama");
        assert_eq!(config.llm.model, "llama3.1");
        assert!(config.llm.api_key.is_none());
        assert_eq!(config.languages.primary, "en");
        assert!(config.languages.secondary().is_none());
        assert_eq!(config.database.path, PathBuf::from("recipes.db"));
    }
}
