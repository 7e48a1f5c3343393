//! Cookie-aware request executor bound to one portal session.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, RequestBuilder};
use tracing::debug;

use super::cookies::PortalCookieJar;
use super::error::{KBankError, Result, Step};

/// HTTP session for the portal hosts.
///
/// Owns the cookie jar for its whole lifetime; nothing else aliases it.
/// Every request is bounded by the configured timeout, and a request that
/// exceeds it fails as a transport error.
pub struct PortalHttp {
    client: Client,
}

impl PortalHttp {
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self> {
        let jar = Arc::new(PortalCookieJar::new());
        let client = Client::builder()
            .user_agent(user_agent)
            .cookie_provider(jar)
            .timeout(timeout)
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .build()
            .map_err(KBankError::Client)?;

        Ok(Self { client })
    }

    /// GET `url` without a body and return the response text.
    pub async fn get(&self, step: Step, url: &str) -> Result<String> {
        debug!(%step, url, "GET");
        self.send(step, url, self.client.get(url)).await
    }

    /// POST `form` as `application/x-www-form-urlencoded`.
    ///
    /// An empty form still sends the content type and an empty body.
    pub async fn post_form(&self, step: Step, url: &str, form: &[(&str, &str)]) -> Result<String> {
        debug!(%step, url, fields = form.len(), "POST");
        self.send(step, url, self.client.post(url).form(form)).await
    }

    async fn send(&self, step: Step, url: &str, req: RequestBuilder) -> Result<String> {
        let response = req
            .send()
            .await
            .map_err(|source| KBankError::Transport { step, source })?;

        let status = response.status();
        if !status.is_success() {
            return Err(KBankError::Status {
                step,
                status,
                url: url.to_string(),
            });
        }

        response
            .text()
            .await
            .map_err(|source| KBankError::Transport { step, source })
    }
}
