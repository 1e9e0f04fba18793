pub mod fetchers;
pub mod html;

use crate::error::Result;
use fetchers::RequestFetcher;
use html::{find_image_url, visible_text, JsonLdExtractor};
use log::{debug, info};
use scraper::Html;

/// Where the text of an [`ExtractedPage`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextSource {
    /// Composed from an embedded JSON-LD recipe
    Structured,
    /// Visible text of the page body
    BodyText,
}

/// Text to hand to the normalizer plus the hints found next to it.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedPage {
    pub text: String,
    pub image_url: Option<String>,
    pub total_time: Option<u32>,
    pub source: TextSource,
}

/// Fetch `url` and extract recipe text from it.
///
/// Network and HTTP status failures are errors. A page without usable structured
/// data is not: its body text is returned instead.
pub async fn fetch_page(fetcher: &RequestFetcher, url: &str) -> Result<ExtractedPage> {
    let html = fetcher.fetch(url).await?;
    let page = extract_from_html(&html);
    info!(
        "Extracted {} characters from {} ({:?})",
        page.text.len(),
        url,
        page.source
    );
    Ok(page)
}

/// Extract recipe text from an already fetched document.
pub fn extract_from_html(html: &str) -> ExtractedPage {
    let document = Html::parse_document(html);
    let image_url = find_image_url(&document);
    debug!("Image candidate: {:?}", image_url);

    match JsonLdExtractor.parse(&document) {
        Some(recipe) => ExtractedPage {
            text: recipe.to_text(),
            image_url,
            total_time: recipe.total_time,
            source: TextSource::Structured,
        },
        None => ExtractedPage {
            text: visible_text(&document),
            image_url,
            total_time: None,
            source: TextSource::BodyText,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structured_page() {
        let html = r#"
            <html>
            <head>
                <meta property="og:image" content="https://example.com/soup.jpg">
                <script type="application/ld+json">
                {"@type": "Recipe", "name": "Soup", "recipeYield": "2", "recipeIngredient": ["water"], "totalTime": "PT1H"}
                </script>
            </head>
            <body><p>Lots of blog text</p></body>
            </html>
        "#;

        let page = extract_from_html(html);
        assert_eq!(page.source, TextSource::Structured);
        assert_eq!(
            page.text,
            "Recipe Name: Soup\nServings: 2\nIngredients:\n- water\n"
        );
        assert_eq!(page.image_url.as_deref(), Some("https://example.com/soup.jpg"));
        assert_eq!(page.total_time, Some(60));
    }

    #[test]
    fn test_falls_back_to_body_text() {
        let html = r#"
            <html>
            <head>
                <script type="application/ld+json">{"@type": "Recipe", "name": "Soup"}</script>
            </head>
            <body><h1>Soup</h1><p>Boil water.</p></body>
            </html>
        "#;

        let page = extract_from_html(html);
        assert_eq!(page.source, TextSource::BodyText);
        assert_eq!(page.text, "Soup Boil water.");
        assert!(page.image_url.is_none());
    }
}
