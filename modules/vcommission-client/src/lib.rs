pub mod error;
pub mod types;

pub use error::{Result, VcommissionError};
pub use types::{Coupon, CouponsResponse, DeeplinkRequest, DeeplinkResponse};

use std::time::Duration;

/// Trackier publisher API (hosts the coupon catalog).
pub const DEFAULT_COUPONS_BASE_URL: &str = "https://api.trackier.com";

/// vCommission publisher API (hosts deep-link conversion).
pub const DEFAULT_DEEPLINK_BASE_URL: &str = "https://api.vcommission.com";

pub struct VcommissionClient {
    client: reqwest::Client,
    api_key: String,
    coupons_base: String,
    deeplink_base: String,
}

impl VcommissionClient {
    /// Build a client whose every request is bounded by `timeout`.
    pub fn new(api_key: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Self::with_http_client(client, api_key)
    }

    /// Use a preconfigured `reqwest::Client` (timeouts, proxies) as-is.
    pub fn with_http_client(client: reqwest::Client, api_key: &str) -> Result<Self> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(VcommissionError::MissingCredential);
        }
        Ok(Self {
            client,
            api_key: api_key.to_string(),
            coupons_base: DEFAULT_COUPONS_BASE_URL.to_string(),
            deeplink_base: DEFAULT_DEEPLINK_BASE_URL.to_string(),
        })
    }

    pub fn with_base_urls(mut self, coupons_base: &str, deeplink_base: &str) -> Self {
        self.coupons_base = coupons_base.trim_end_matches('/').to_string();
        self.deeplink_base = deeplink_base.trim_end_matches('/').to_string();
        self
    }

    /// Fetch the full publisher coupon catalog.
    pub async fn coupons(&self) -> Result<Vec<Coupon>> {
        let url = format!("{}/v2/publishers/coupons", self.coupons_base);
        let resp = self
            .client
            .get(&url)
            .query(&[("apikey", self.api_key.as_str())])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(VcommissionError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = resp.text().await?;
        let parsed: CouponsResponse = serde_json::from_str(&body)?;
        tracing::debug!(count = parsed.data.len(), "Fetched coupon catalog");
        Ok(parsed.data)
    }

    /// Convert a merchant URL into a tracked deep link.
    /// `Ok(None)` means the API answered but offered no link.
    pub async fn deeplink(&self, target: &str) -> Result<Option<String>> {
        let url = format!("{}/v2/publisher/deeplink", self.deeplink_base);
        let body = DeeplinkRequest {
            api_key: &self.api_key,
            url: target,
        };

        let resp = self.client.post(&url).json(&body).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(VcommissionError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let text = resp.text().await?;
        let parsed: DeeplinkResponse = serde_json::from_str(&text)?;
        Ok(parsed.into_link())
    }
}
