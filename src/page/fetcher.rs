use crate::config::Settings;
use crate::error::{Error, Result};
use reqwest::{Client, Response};
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, warn};

/// HTTP fetcher for page markup.
#[derive(Debug, Clone)]
pub struct PageFetcher {
    client: Client,
    timeout_duration: Duration,
    retry_attempts: usize,
    max_page_size: usize,
    user_agent: String,
}

impl Default for PageFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl PageFetcher {
    pub fn new() -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .redirect(reqwest::redirect::Policy::limited(10))
            .gzip(true)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            timeout_duration: Duration::from_secs(30),
            retry_attempts: 3,
            max_page_size: 5 * 1024 * 1024,
            user_agent: format!("page-prune/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new()
            .with_timeout(Duration::from_secs(settings.timeout))
            .with_retry_attempts(settings.retry_attempts)
            .with_max_page_size(settings.max_page_size)
            .with_user_agent(settings.user_agent.clone())
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_duration = timeout;
        self
    }

    pub fn with_retry_attempts(mut self, attempts: usize) -> Self {
        self.retry_attempts = attempts;
        self
    }

    pub fn with_max_page_size(mut self, max_page_size: usize) -> Self {
        self.max_page_size = max_page_size;
        self
    }

    pub fn with_user_agent(mut self, user_agent: String) -> Self {
        self.user_agent = user_agent;
        self
    }

    /// Fetch page markup, retrying transient failures.
    pub async fn fetch_page(&self, url: &str) -> Result<String> {
        validate_page_url(url)?;

        let mut last_error = Error::HttpError(format!("No attempts made for {}", url));
        let attempts = self.retry_attempts.max(1);

        for attempt in 1..=attempts {
            match self.fetch_once(url).await {
                Ok(markup) => return Ok(markup),
                Err(e) if e.is_temporary() && attempt < attempts => {
                    warn!("Fetch attempt {}/{} for {} failed: {}", attempt, attempts, url, e);
                    last_error = e;
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error)
    }

    async fn fetch_once(&self, url: &str) -> Result<String> {
        debug!("Fetching page from: {}", url);

        let response = timeout(self.timeout_duration, self.fetch_response(url))
            .await
            .map_err(|_| Error::Timeout(format!("Request to {} timed out", url)))?;

        let response = response?;

        if !response.status().is_success() {
            return Err(Error::HttpError(format!(
                "HTTP {} for {}: {}",
                response.status().as_u16(),
                url,
                response.status().canonical_reason().unwrap_or("Unknown error")
            )));
        }

        let content = response
            .bytes()
            .await
            .map_err(|e| Error::HttpError(format!("Failed to read response body: {}", e)))?;

        if content.len() > self.max_page_size {
            return Err(Error::Page(format!(
                "Page at {} is {} bytes, exceeding the {} byte limit",
                url,
                content.len(),
                self.max_page_size
            )));
        }

        debug!("Downloaded {} bytes from {}", content.len(), url);

        Ok(String::from_utf8_lossy(&content).into_owned())
    }

    async fn fetch_response(&self, url: &str) -> Result<Response> {
        let response = self
            .client
            .get(url)
            .header("User-Agent", &self.user_agent)
            .header("Accept", "text/html, application/xhtml+xml, */*")
            .send()
            .await
            .map_err(|e| Error::HttpError(format!("Request failed: {}", e)))?;

        Ok(response)
    }
}

/// Reject URLs the fetcher cannot handle before issuing a request.
pub fn validate_page_url(url: &str) -> Result<()> {
    let parsed = url::Url::parse(url)
        .map_err(|_| Error::InvalidUrl(format!("Cannot parse URL: {}", url)))?;

    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(Error::InvalidUrl(format!(
            "Unsupported scheme '{}' in {}",
            other, url
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PAGE_BODY: &str =
        "<html><body><p class=\"promo\">promo</p><article>real</article></body></html>";

    #[tokio::test]
    async fn test_fetch_page_success() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/page"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(PAGE_BODY)
                    .insert_header("content-type", "text/html"),
            )
            .mount(&mock_server)
            .await;

        let fetcher = PageFetcher::new();
        let url = format!("{}/page", mock_server.uri());

        let markup = fetcher.fetch_page(&url).await.unwrap();
        assert!(markup.contains("promo"));
        assert!(markup.contains("real"));
    }

    #[tokio::test]
    async fn test_fetch_page_404() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let fetcher = PageFetcher::new().with_retry_attempts(1);
        let url = format!("{}/missing", mock_server.uri());

        match fetcher.fetch_page(&url).await {
            Err(Error::HttpError(msg)) => assert!(msg.contains("404")),
            other => panic!("Expected HttpError, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_fetch_page_too_large() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/big"))
            .respond_with(ResponseTemplate::new(200).set_body_string("x".repeat(2048)))
            .mount(&mock_server)
            .await;

        let fetcher = PageFetcher::new().with_max_page_size(1024);
        let url = format!("{}/big", mock_server.uri());

        match fetcher.fetch_page(&url).await {
            Err(Error::Page(msg)) => assert!(msg.contains("limit")),
            other => panic!("Expected Page error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_validate_page_url() {
        assert!(validate_page_url("https://example.com").is_ok());
        assert!(validate_page_url("http://example.org/a?b=c").is_ok());
        assert!(validate_page_url("ftp://example.com").is_err());
        assert!(validate_page_url("not a url").is_err());
    }
}
