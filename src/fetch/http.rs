//! Static retrieval over a pooled reqwest client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use reqwest::Client;
use tracing::{debug, instrument};

use super::{FetchMethod, PageSource, RawPage, SourceError};
use crate::error::ConfigError;

/// Desktop Chrome user agent; patent sites serve reduced markup to unknown clients.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Plain HTTP GET source.
pub struct HttpSource {
    client: Client,
}

impl HttpSource {
    /// Create a client sending `user_agent` with browser-like accept headers.
    pub fn new(user_agent: &str) -> Result<Self, ConfigError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            ),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));

        let client = Client::builder()
            .user_agent(user_agent)
            .default_headers(headers)
            // Keep connections alive for reuse across a batch
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .tcp_nodelay(true)
            .use_rustls_tls()
            .brotli(true)
            .gzip(true)
            .deflate(true)
            .connect_timeout(Duration::from_secs(10))
            .redirect(reqwest::redirect::Policy::limited(10))
            .cookie_store(true)
            .build()?;

        Ok(Self { client })
    }

    /// Get the underlying reqwest client
    #[must_use]
    pub fn inner(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl PageSource for HttpSource {
    fn method(&self) -> FetchMethod {
        FetchMethod::Static
    }

    #[instrument(skip(self))]
    async fn load(&self, url: &str, timeout: Duration) -> Result<RawPage, SourceError> {
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(classify)?;

        let status = response.status().as_u16();
        debug!(
            status,
            version = ?response.version(),
            content_encoding = ?response.headers().get("content-encoding"),
            "Response received"
        );

        let body = response.text().await.map_err(classify)?;
        Ok(RawPage {
            status: Some(status),
            body,
        })
    }
}

fn classify(err: reqwest::Error) -> SourceError {
    if err.is_timeout() {
        SourceError::Timeout
    } else {
        SourceError::Unavailable(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[tokio::test]
    async fn returns_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/patent/US1"))
            .and(header_exists("user-agent"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>claims</html>"))
            .expect(1)
            .mount(&server)
            .await;

        let source = HttpSource::new(DEFAULT_USER_AGENT).unwrap();
        let page = source
            .load(&format!("{}/patent/US1", server.uri()), Duration::from_secs(5))
            .await
            .unwrap();

        assert_eq!(page.status, Some(200));
        assert_eq!(page.body, "<html>claims</html>");
    }

    #[tokio::test]
    async fn not_found_is_a_page_not_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_string("Not Found"))
            .mount(&server)
            .await;

        let source = HttpSource::new(DEFAULT_USER_AGENT).unwrap();
        let page = source
            .load(&format!("{}/patent/missing", server.uri()), Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(page.status, Some(404));
    }

    #[tokio::test]
    async fn slow_response_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("late")
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let source = HttpSource::new(DEFAULT_USER_AGENT).unwrap();
        let err = source
            .load(&server.uri(), Duration::from_millis(100))
            .await
            .unwrap_err();
        assert_eq!(err, SourceError::Timeout);
    }

    #[tokio::test]
    async fn refused_connection_is_unavailable() {
        let source = HttpSource::new(DEFAULT_USER_AGENT).unwrap();
        let err = source
            .load("http://127.0.0.1:9/", Duration::from_secs(2))
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::Unavailable(_)));
    }
}
