use std::future::Future;
use std::time::Duration;

use url::Url;

use crate::ProviderError;

/// Fetches a URL and returns the body. Swappable so lookups can be exercised without a network.
pub trait HttpTransport: Send + Sync {
    fn get(&self, url: Url) -> impl Future<Output = Result<String, ProviderError>> + Send;
}

pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| ProviderError::Upstream(format!("http client init failed: {err}")))?;
        Ok(Self { client })
    }
}

impl HttpTransport for ReqwestTransport {
    async fn get(&self, url: Url) -> Result<String, ProviderError> {
        // The query string has the access token, so only ever log the path
        let path = url.path().to_string();
        debug!("GET {path}");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| {
                ProviderError::Upstream(format!("{path}: request error: {}", err.without_url()))
            })?;
        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Upstream(format!("{path}: HTTP {status}")));
        }
        response
            .text()
            .await
            .map_err(|err| {
                ProviderError::Upstream(format!("{path}: bad body: {}", err.without_url()))
            })
    }
}
