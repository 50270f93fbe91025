use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use dealflow_common::Platform;
use tracing::{debug, info, warn};
use vcommission_client::Coupon;

use crate::traits::AffiliateNetwork;

/// Query key carrying the Amazon Associates tag.
pub const TRACKING_PARAM: &str = "tag";

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// How non-Amazon links are monetized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RemoteMode {
    /// Match the platform against the publisher coupon catalog.
    #[default]
    Coupons,
    /// Ask the network to wrap the exact merchant URL.
    Deeplink,
}

impl FromStr for RemoteMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "coupons" | "coupon" => Ok(RemoteMode::Coupons),
            "deeplink" | "deep-link" => Ok(RemoteMode::Deeplink),
            other => Err(format!("unknown affiliate mode {other:?} (expected coupons or deeplink)")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AffiliateSettings {
    /// Amazon Associates tag. `None` makes Amazon conversion a no-op.
    pub amazon_tag: Option<String>,
    pub remote_mode: RemoteMode,
    /// Upper bound on a single remote lookup.
    pub request_timeout: Duration,
}

impl Default for AffiliateSettings {
    fn default() -> Self {
        Self {
            amazon_tag: None,
            remote_mode: RemoteMode::default(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionMethod {
    LocalTag,
    Remote,
    Passthrough,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversion {
    pub url: String,
    pub method: ConversionMethod,
}

impl Conversion {
    fn passthrough(url: &str) -> Self {
        Self {
            url: url.to_string(),
            method: ConversionMethod::Passthrough,
        }
    }
}

/// Turns merchant URLs into affiliate URLs.
///
/// Fail-open: whatever goes wrong, the caller gets a working link back.
pub struct AffiliateConverter {
    settings: AffiliateSettings,
    network: Option<Arc<dyn AffiliateNetwork>>,
}

impl AffiliateConverter {
    /// `network` is `None` when no API credential is configured; remote
    /// conversion then passes links through without any request.
    pub fn new(settings: AffiliateSettings, network: Option<Arc<dyn AffiliateNetwork>>) -> Self {
        Self { settings, network }
    }

    pub async fn convert(&self, url: &str, platform: Platform) -> Conversion {
        match platform {
            Platform::Amazon => self.convert_local(url),
            _ => self.convert_remote(url, platform).await,
        }
    }

    fn convert_local(&self, url: &str) -> Conversion {
        let Some(tag) = self
            .settings
            .amazon_tag
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
        else {
            return Conversion::passthrough(url);
        };

        match set_query_param(url, TRACKING_PARAM, tag) {
            Some(tagged) => Conversion {
                url: tagged,
                method: ConversionMethod::LocalTag,
            },
            None => {
                warn!(url, "Unparseable Amazon URL, leaving untagged");
                Conversion::passthrough(url)
            }
        }
    }

    async fn convert_remote(&self, url: &str, platform: Platform) -> Conversion {
        let Some(network) = self.network.as_ref() else {
            debug!(%platform, "No affiliate network configured, passing link through");
            return Conversion::passthrough(url);
        };

        let lookup = self.lookup(network.as_ref(), url, platform);
        let result = match tokio::time::timeout(self.settings.request_timeout, lookup).await {
            Ok(result) => result,
            Err(_) => Err(anyhow::anyhow!(
                "timed out after {:?}",
                self.settings.request_timeout
            )),
        };

        let result = result.map(|found| found.filter(|link| !link.trim().is_empty()));

        match result {
            Ok(Some(link)) => {
                info!(%platform, "Affiliate link found");
                Conversion {
                    url: link,
                    method: ConversionMethod::Remote,
                }
            }
            Ok(None) => {
                warn!(%platform, mode = ?self.settings.remote_mode, "No affiliate link available");
                Conversion::passthrough(url)
            }
            Err(e) => {
                warn!(%platform, error = %e, "Affiliate lookup failed, keeping original link");
                Conversion::passthrough(url)
            }
        }
    }

    async fn lookup(
        &self,
        network: &dyn AffiliateNetwork,
        url: &str,
        platform: Platform,
    ) -> anyhow::Result<Option<String>> {
        match self.settings.remote_mode {
            RemoteMode::Coupons => {
                let keywords = platform_keywords(platform);
                if keywords.is_empty() {
                    return Ok(None);
                }
                let coupons = network.coupons().await?;
                Ok(first_matching_link(&coupons, &keywords))
            }
            RemoteMode::Deeplink => network.deeplink(url).await,
        }
    }
}

/// Keywords that identify a platform's entries in the coupon catalog.
/// `Unknown` has none, so it never matches anything.
pub fn platform_keywords(platform: Platform) -> Vec<&'static str> {
    match platform {
        Platform::Unknown => Vec::new(),
        Platform::RelianceDigital => vec!["reliance", "digital"],
        other => vec![other.as_str()],
    }
}

/// First coupon whose name or advertiser mentions a keyword and that carries a link.
pub fn first_matching_link(coupons: &[Coupon], keywords: &[&str]) -> Option<String> {
    coupons
        .iter()
        .filter(|c| c.matches_any(keywords))
        .find_map(|c| c.usable_link().map(str::to_string))
}

/// Set `key=value` on the URL's query, replacing any existing values of `key`
/// and keeping every other pair. `None` if the URL can't be parsed.
pub fn set_query_param(url: &str, key: &str, value: &str) -> Option<String> {
    let mut parsed = url::Url::parse(url).ok()?;
    if parsed.cannot_be_a_base() {
        return None;
    }

    let kept: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(k, _)| k.as_ref() != key)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    parsed
        .query_pairs_mut()
        .clear()
        .extend_pairs(kept)
        .append_pair(key, value);

    Some(parsed.to_string())
}
