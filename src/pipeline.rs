//! Import flow for one submitted URL: fetch, normalize, persist.

use crate::config::{AppConfig, LanguageConfig};
use crate::error::{ImportError, Result};
use crate::normalizer::Normalizer;
use crate::providers::{LlmProvider, ProviderFactory};
use crate::store::{DownloadedImage, Store};
use crate::url_to_text::fetchers::RequestFetcher;
use crate::url_to_text::{fetch_page, TextSource};
use log::{debug, error, info, warn};
use reqwest::Url;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

pub const SUCCESS_MESSAGE: &str = "Recipe processed and saved successfully!";

/// The part of an import that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Validate,
    Fetch,
    Interpret,
    Save,
}

impl Stage {
    /// Status line shown to the user when this stage fails.
    pub fn failure_message(&self) -> &'static str {
        match self {
            Stage::Validate => "Invalid URL.",
            Stage::Fetch => "Error fetching recipe from URL.",
            Stage::Interpret => "Error interpreting recipe.",
            Stage::Save => "Error saving recipe to database.",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.failure_message())
    }
}

#[derive(Error, Debug)]
#[error("{stage} ({error})")]
pub struct ImportFailure {
    pub stage: Stage,
    #[source]
    pub error: ImportError,
}

impl ImportFailure {
    fn at(stage: Stage) -> impl FnOnce(ImportError) -> Self {
        move |error| {
            error!("{:?} stage failed: {}", stage, error);
            Self { stage, error }
        }
    }
}

/// What a successful import produced.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportOutcome {
    pub id: i64,
    pub name: String,
    pub source: TextSource,
    pub image_path: Option<String>,
}

/// Accept only absolute http(s) URLs.
pub fn validate_url(url: &str) -> Result<Url> {
    let parsed = Url::parse(url.trim()).map_err(|e| ImportError::InvalidUrl(format!("{url}: {e}")))?;
    match parsed.scheme() {
        "http" | "https" if parsed.host_str().is_some() => Ok(parsed),
        _ => Err(ImportError::InvalidUrl(format!(
            "{url}: only http and https URLs are supported"
        ))),
    }
}

pub struct Importer {
    fetcher: RequestFetcher,
    normalizer: Normalizer,
}

impl Importer {
    pub fn new(fetcher: RequestFetcher, normalizer: Normalizer) -> Self {
        Self {
            fetcher,
            normalizer,
        }
    }

    pub fn builder() -> ImporterBuilder {
        ImporterBuilder::default()
    }

    /// Build the fetcher and the configured provider from application config.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Self::builder()
            .timeout(Duration::from_secs(config.timeout))
            .languages(config.languages.clone())
            .provider(ProviderFactory::create(
                &config.llm,
                Duration::from_secs(config.timeout),
            )?)
            .build()
    }

    /// Run one import. Each stage stops the flow at its first error and nothing
    /// partial is stored.
    pub async fn import(
        &self,
        store: &mut Store,
        url: &str,
    ) -> std::result::Result<ImportOutcome, ImportFailure> {
        let page_url = validate_url(url).map_err(ImportFailure::at(Stage::Validate))?;
        let url = page_url.as_str();
        info!("Importing {}", url);

        let page = fetch_page(&self.fetcher, url)
            .await
            .map_err(ImportFailure::at(Stage::Fetch))?;

        let mut record = self
            .normalizer
            .normalize(&page.text, page.image_url.as_deref())
            .await
            .map_err(ImportFailure::at(Stage::Interpret))?;
        record.total_time = page.total_time.or_else(|| {
            let minutes: Vec<u32> = record.steps.iter().filter_map(|step| step.minutes).collect();
            (!minutes.is_empty()).then(|| minutes.iter().sum())
        });

        let image_url = resolve_image_url(&page_url, &record.image_url);
        let image_bytes = match &image_url {
            Some(image_url) => self.download_image(image_url).await,
            None => None,
        };
        let image = image_url
            .as_deref()
            .zip(image_bytes.as_deref())
            .map(|(url, bytes)| DownloadedImage { url, bytes });

        let saved = store
            .save(url, &record, image)
            .map_err(ImportFailure::at(Stage::Save))?;

        info!("{} ({} -> recipe {})", SUCCESS_MESSAGE, url, saved.id);
        Ok(ImportOutcome {
            id: saved.id,
            name: record.name.primary,
            source: page.source,
            image_path: saved.image_path,
        })
    }

    /// Download failures are not fatal; the recipe is saved without an image.
    async fn download_image(&self, image_url: &str) -> Option<Vec<u8>> {
        match self.fetcher.fetch_bytes(image_url).await {
            Ok(bytes) if !bytes.is_empty() => Some(bytes),
            Ok(_) => {
                warn!("Image at {} is empty, skipping", image_url);
                None
            }
            Err(e) => {
                warn!("Could not download image {}: {}", image_url, e);
                None
            }
        }
    }
}

/// Absolute image URL, resolving paths relative to the recipe page.
fn resolve_image_url(page_url: &Url, image_url: &str) -> Option<String> {
    let image_url = image_url.trim();
    if image_url.is_empty() {
        return None;
    }
    match page_url.join(image_url) {
        Ok(resolved) if matches!(resolved.scheme(), "http" | "https") => Some(resolved.into()),
        _ => {
            debug!("Ignoring unusable image URL {}", image_url);
            None
        }
    }
}

/// Builder for an [`Importer`] when not everything comes from [`AppConfig`].
#[derive(Default)]
pub struct ImporterBuilder {
    provider: Option<Box<dyn LlmProvider>>,
    languages: Option<LanguageConfig>,
    timeout: Option<Duration>,
}

impl ImporterBuilder {
    pub fn provider(mut self, provider: Box<dyn LlmProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn languages(mut self, languages: LanguageConfig) -> Self {
        self.languages = Some(languages);
        self
    }

    /// Timeout for page and image requests
    pub fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = Some(duration);
        self
    }

    pub fn build(self) -> Result<Importer> {
        let provider = self.provider.ok_or_else(|| {
            ImportError::ProviderError("No LLM provider specified".to_string())
        })?;
        let fetcher = RequestFetcher::new(self.timeout)?;
        let normalizer = Normalizer::new(provider, self.languages.unwrap_or_default());
        debug!("Importer ready with provider {}", normalizer.provider_name());
        Ok(Importer::new(fetcher, normalizer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("https://example.com/recipe").is_ok());
        assert!(validate_url(" http://example.com ").is_ok());
        assert!(matches!(
            validate_url("not a url"),
            Err(ImportError::InvalidUrl(_))
        ));
        assert!(matches!(
            validate_url("ftp://example.com/recipe"),
            Err(ImportError::InvalidUrl(_))
        ));
        assert!(matches!(
            validate_url("file:///etc/passwd"),
            Err(ImportError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_stage_messages() {
        assert_eq!(Stage::Fetch.to_string(), "Error fetching recipe from URL.");
        assert_eq!(Stage::Interpret.failure_message(), "Error interpreting recipe.");
        assert_eq!(Stage::Save.failure_message(), "Error saving recipe to database.");
        assert_eq!(Stage::Validate.failure_message(), "Invalid URL.");
    }

    #[test]
    fn test_resolve_image_url() {
        let page = Url::parse("https://example.com/recipes/soup").unwrap();
        assert_eq!(
            resolve_image_url(&page, "/img/soup.jpg").as_deref(),
            Some("https://example.com/img/soup.jpg")
        );
        assert_eq!(
            resolve_image_url(&page, "https://cdn.example.com/a.png").as_deref(),
            Some("https://cdn.example.com/a.png")
        );
        assert_eq!(resolve_image_url(&page, "  "), None);
        assert_eq!(resolve_image_url(&page, "data:image/png;base64,AAAA"), None);
    }

    #[test]
    fn test_builder_requires_provider() {
        assert!(matches!(
            Importer::builder().build(),
            Err(ImportError::ProviderError(_))
        ));
    }
}
