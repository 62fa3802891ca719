use crate::config::HttpConfig;
use crate::constants::HTML_ACCEPT;
use crate::error::{Result, ScraperError};
use crate::types::RawPage;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT};
use reqwest::{Client, RequestBuilder};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::{debug, info};

/// Cookie-holding HTTP session for one batch.
///
/// Opened at batch start and consumed by [`HttpSession::close`] at batch end;
/// adapters only ever borrow it.
pub struct HttpSession {
    client: Client,
    delay: Duration,
    requests: AtomicUsize,
}

impl HttpSession {
    pub fn open(config: &HttpConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(HTML_ACCEPT));

        let client = Client::builder()
            .cookie_store(true)
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        debug!("Opened HTTP session");
        Ok(Self {
            client,
            delay: Duration::from_millis(config.delay_ms),
            requests: AtomicUsize::new(0),
        })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub async fn get(&self, url: &str, headers: &[(&str, &str)]) -> Result<RawPage> {
        let request = with_headers(self.client.get(url), headers)?;
        self.send(request).await
    }

    pub async fn post_form(
        &self,
        url: &str,
        form: &[(&str, &str)],
        headers: &[(&str, &str)],
    ) -> Result<RawPage> {
        let request = with_headers(self.client.post(url).form(form), headers)?;
        self.send(request).await
    }

    /// GET returning a JSON body, for the property-data and obituary APIs.
    ///
    /// A non-success status is `Ok(None)`; only transport and decode
    /// failures are errors.
    pub async fn get_json(
        &self,
        url: &str,
        query: &[(&str, String)],
        headers: &[(&str, &str)],
    ) -> Result<Option<serde_json::Value>> {
        let request = with_headers(self.client.get(url).query(query), headers)?;
        self.requests.fetch_add(1, Ordering::Relaxed);
        let response = request.send().await?;
        let status = response.status();
        debug!("{} {}", status.as_u16(), response.url());
        if !status.is_success() {
            return Ok(None);
        }
        Ok(Some(response.json().await?))
    }

    /// Politeness delay between case pages.
    pub async fn pause(&self) {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }

    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::Relaxed)
    }

    pub fn close(self) {
        info!("Closing HTTP session after {} requests", self.request_count());
    }

    async fn send(&self, request: RequestBuilder) -> Result<RawPage> {
        self.requests.fetch_add(1, Ordering::Relaxed);
        let response = request.send().await?;
        let status = response.status();
        let url = response.url().to_string();
        debug!("{} {}", status.as_u16(), url);

        if !status.is_success() {
            return Err(ScraperError::Api {
                message: format!("{} responded with status {}", url, status),
            });
        }

        let body = response.text().await?;
        Ok(RawPage {
            url,
            status: status.as_u16(),
            body,
        })
    }
}

fn with_headers(mut request: RequestBuilder, headers: &[(&str, &str)]) -> Result<RequestBuilder> {
    for (name, value) in headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| ScraperError::Config(format!("Invalid header name {}: {}", name, e)))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| ScraperError::Config(format!("Invalid header value for {}: {}", name, e)))?;
        request = request.header(name, value);
    }
    Ok(request)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_and_close_fresh_session() {
        let session = HttpSession::open(&HttpConfig::default()).unwrap();
        assert_eq!(session.request_count(), 0);
        session.close();
    }

    #[test]
    fn test_bad_header_name_is_config_error() {
        let session = HttpSession::open(&HttpConfig::default()).unwrap();
        let result = with_headers(session.client().get("http://localhost"), &[("bad header", "x")]);
        assert!(matches!(result, Err(ScraperError::Config(_))));
    }
}
