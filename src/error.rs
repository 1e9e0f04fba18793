use thiserror::Error;

/// Errors that can occur while importing, storing or displaying recipes
#[derive(Error, Debug)]
pub enum ImportError {
    /// Failed to fetch a page or image from a URL
    #[error("Failed to fetch URL: {0}")]
    FetchError(#[from] reqwest::Error),

    /// The submitted string is not an absolute http(s) URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The completion endpoint could not be reached or answered with an error
    #[error("LLM request failed: {0}")]
    LlmRequestError(String),

    /// The completion reply was not valid JSON
    #[error("LLM reply is not valid JSON: {0}")]
    LlmParseError(#[from] serde_json::Error),

    /// The completion reply was JSON but did not satisfy the recipe contract
    #[error("LLM reply is missing required data: {0}")]
    LlmSchemaError(String),

    /// No usable LLM provider could be built from configuration
    #[error("Provider error: {0}")]
    ProviderError(String),

    /// Database error
    #[error("Database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    /// Failed to write or remove a cached image
    #[error("Image cache error: {0}")]
    ImageIoError(#[from] std::io::Error),

    /// Requested recipe does not exist
    #[error("Recipe {0} not found")]
    NotFound(i64),

    /// A display option token could not be understood
    #[error("Invalid option: {0}")]
    InvalidOption(String),

    /// Error parsing HTTP headers
    #[error("Header parse error: {0}")]
    HeaderError(#[from] reqwest::header::InvalidHeaderValue),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(#[from] config::ConfigError),
}

pub type Result<T> = std::result::Result<T, ImportError>;
