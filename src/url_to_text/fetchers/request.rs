use crate::error::Result;
use log::debug;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::Client;
use std::time::Duration;

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Plain HTTP fetcher shared by page and image downloads.
#[derive(Clone)]
pub struct RequestFetcher {
    client: Client,
}

impl RequestFetcher {
    pub fn new(timeout: Option<Duration>) -> Result<Self> {
        let timeout = timeout.unwrap_or(Duration::from_secs(30));

        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
        headers.insert(ACCEPT, "text/html,application/xhtml+xml,*/*;q=0.8".parse()?);

        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self { client })
    }

    /// Fetch a page as text. Non-2xx statuses are errors.
    pub async fn fetch(&self, url: &str) -> Result<String> {
        debug!("Fetching page {}", url);
        let response = self.client.get(url).send().await?.error_for_status()?;
        let html = response.text().await?;
        debug!("Fetched {} bytes from {}", html.len(), url);
        Ok(html)
    }

    /// Fetch raw bytes, used for recipe images.
    pub async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>> {
        debug!("Fetching bytes {}", url);
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.bytes().await?.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    #[tokio::test]
    async fn test_fetch_sends_browser_user_agent() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/page")
            .match_header("user-agent", BROWSER_USER_AGENT)
            .with_status(200)
            .with_body("<html><body>hello</body></html>")
            .create_async()
            .await;

        let fetcher = RequestFetcher::new(None).unwrap();
        let body = fetcher.fetch(&format!("{}/page", server.url())).await.unwrap();
        assert!(body.contains("hello"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_rejects_error_status() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/missing")
            .with_status(404)
            .with_body("not here")
            .create_async()
            .await;

        let fetcher = RequestFetcher::new(Some(Duration::from_secs(5))).unwrap();
        let result = fetcher.fetch(&format!("{}/missing", server.url())).await;
        assert!(result.is_err());
    }
}
