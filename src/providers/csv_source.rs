use crate::core::cache::KeyValueCollection;
use crate::core::dataset::DataSource;
use crate::providers::util::{is_remote, with_retry};
use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Fetches CSV resources from http(s) URLs or local paths.
///
/// Remote downloads are kept in `cache` for `ttl`, keyed by URL.
pub struct CsvSource {
    client: reqwest::Client,
    cache: Option<Arc<dyn KeyValueCollection>>,
    ttl: Option<Duration>,
    retries: usize,
    delay_ms: u64,
}

impl CsvSource {
    pub fn new(cache: Option<Arc<dyn KeyValueCollection>>, ttl: Option<Duration>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("fundcmp/0.1")
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            cache,
            ttl,
            retries: 3,
            delay_ms: 500,
        })
    }

    pub fn with_retries(mut self, retries: usize, delay_ms: u64) -> Self {
        self.retries = retries;
        self.delay_ms = delay_ms;
        self
    }

    async fn get(&self, url: &str) -> Result<Vec<u8>> {
        debug!("Requesting {}", url);
        let response = with_retry(
            || async {
                self.client
                    .get(url)
                    .send()
                    .await
                    .and_then(|r| r.error_for_status())
            },
            self.retries,
            self.delay_ms,
        )
        .await
        .with_context(|| format!("Failed to download {url}"))?;

        let body = response
            .bytes()
            .await
            .with_context(|| format!("Failed to read response body from {url}"))?;
        Ok(body.to_vec())
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>> {
        let body = self.get(url).await?;
        if !looks_like_html(&body) {
            return Ok(body);
        }

        // Large Drive files answer with a "can't scan for viruses" page first.
        if is_drive_url(url) && !url.contains("confirm=") {
            debug!("Drive returned a confirmation page for {}, confirming", url);
            let body = self.get(&format!("{url}&confirm=t")).await?;
            if !looks_like_html(&body) {
                return Ok(body);
            }
        }
        bail!("Expected CSV but received an HTML page from {url}");
    }
}

fn looks_like_html(body: &[u8]) -> bool {
    let head = String::from_utf8_lossy(&body[..body.len().min(512)]).to_lowercase();
    let head = head.trim_start();
    head.starts_with("<!doctype html") || head.starts_with("<html")
}

fn is_drive_url(url: &str) -> bool {
    url.contains("drive.google.com") || url.contains("drive.usercontent.google.com")
}

#[async_trait]
impl DataSource for CsvSource {
    async fn fetch(&self, location: &str) -> Result<Vec<u8>> {
        if !is_remote(location) {
            debug!("Reading local file {}", location);
            return tokio::fs::read(location)
                .await
                .with_context(|| format!("Failed to read {location}"));
        }

        if let Some(cache) = &self.cache
            && let Some(cached) = cache.get(location.as_bytes()).await
        {
            info!("Using cached copy of {}", location);
            return Ok(cached);
        }

        let body = self.download(location).await?;
        info!("Downloaded {} bytes from {}", body.len(), location);

        if let Some(cache) = &self.cache
            && self.ttl.is_some()
        {
            cache.put(location.as_bytes(), &body, self.ttl).await;
        }
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryCollection;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const INFO_CSV: &str = "Nome Comercial,CNPJ da Classe\nAlpha FIA,11.111.111/0001-11\n";

    async fn create_csv_mock_server(file: &str, body: &str, status_code: u16) -> MockServer {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("/{file}")))
            .respond_with(ResponseTemplate::new(status_code).set_body_string(body))
            .mount(&mock_server)
            .await;
        mock_server
    }

    fn source(cache: Option<Arc<dyn KeyValueCollection>>) -> CsvSource {
        CsvSource::new(cache, Some(Duration::from_secs(60)))
            .unwrap()
            .with_retries(1, 0)
    }

    #[tokio::test]
    async fn test_successful_download() {
        let mock_server = create_csv_mock_server("info.csv", INFO_CSV, 200).await;
        let url = format!("{}/info.csv", mock_server.uri());

        let body = source(None).fetch(&url).await.unwrap();
        assert_eq!(body, INFO_CSV.as_bytes());
    }

    #[tokio::test]
    async fn test_download_is_cached() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/info.csv"))
            .respond_with(ResponseTemplate::new(200).set_body_string(INFO_CSV))
            .expect(1)
            .mount(&mock_server)
            .await;
        let url = format!("{}/info.csv", mock_server.uri());
        let cache: Arc<dyn KeyValueCollection> = Arc::new(MemoryCollection::new());

        let provider = source(Some(Arc::clone(&cache)));
        provider.fetch(&url).await.unwrap();
        let second = provider.fetch(&url).await.unwrap();

        assert_eq!(second, INFO_CSV.as_bytes());
        assert!(cache.get(url.as_bytes()).await.is_some());
    }

    #[tokio::test]
    async fn test_server_error() {
        let mock_server = create_csv_mock_server("info.csv", "Server Error", 500).await;
        let url = format!("{}/info.csv", mock_server.uri());

        let err = source(None).fetch(&url).await.unwrap_err();
        assert!(err.to_string().starts_with("Failed to download"));
    }

    #[tokio::test]
    async fn test_html_page_is_rejected() {
        let mock_server =
            create_csv_mock_server("info.csv", "<!DOCTYPE html><html></html>", 200).await;
        let url = format!("{}/info.csv", mock_server.uri());

        let err = source(None).fetch(&url).await.unwrap_err();
        assert!(err.to_string().contains("HTML page"));
    }

    #[tokio::test]
    async fn test_local_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), INFO_CSV).unwrap();

        let body = source(None)
            .fetch(file.path().to_str().unwrap())
            .await
            .unwrap();
        assert_eq!(body, INFO_CSV.as_bytes());

        let err = source(None).fetch("/does/not/exist.csv").await.unwrap_err();
        assert!(err.to_string().contains("Failed to read"));
    }

    #[test]
    fn test_drive_confirmation_detection() {
        assert!(looks_like_html(b"  <!DOCTYPE html><html>"));
        assert!(looks_like_html(b"<HTML><body>"));
        assert!(!looks_like_html(INFO_CSV.as_bytes()));
        assert!(is_drive_url("https://drive.google.com/uc?id=abc"));
        assert!(!is_drive_url("https://example.com/uc?id=abc"));
    }
}
