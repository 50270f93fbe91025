use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use dealflow_common::{PipelineError, Result};
use vcommission_client::{VcommissionClient, DEFAULT_COUPONS_BASE_URL, DEFAULT_DEEPLINK_BASE_URL};

use crate::affiliate::{AffiliateConverter, AffiliateSettings, RemoteMode, DEFAULT_REQUEST_TIMEOUT};
use crate::traits::AffiliateNetwork;

/// Runtime configuration. Loaded once at startup and passed down explicitly;
/// nothing below `main` reads the environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    // Affiliate programs
    pub amazon_tag: Option<String>,
    pub vcommission_api_key: Option<String>,
    pub remote_mode: RemoteMode,
    pub coupons_base_url: String,
    pub deeplink_base_url: String,
    pub request_timeout: Duration,

    // Storage
    pub data_dir: PathBuf,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key → value source. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let remote_mode = match get("VCOMMISSION_MODE") {
            Some(mode) => mode.parse::<RemoteMode>().map_err(PipelineError::Config)?,
            None => RemoteMode::default(),
        };

        let request_timeout = match get("AFFILIATE_TIMEOUT_SECS") {
            Some(secs) => {
                let secs: u64 = secs.parse().map_err(|_| {
                    PipelineError::Config(format!("AFFILIATE_TIMEOUT_SECS must be a number, got {secs:?}"))
                })?;
                if secs == 0 {
                    return Err(PipelineError::Config(
                        "AFFILIATE_TIMEOUT_SECS must be greater than zero".to_string(),
                    ));
                }
                Duration::from_secs(secs)
            }
            None => DEFAULT_REQUEST_TIMEOUT,
        };

        Ok(Self {
            amazon_tag: get("AMAZON_TAG"),
            vcommission_api_key: get("VCOMMISSION_API_KEY"),
            remote_mode,
            coupons_base_url: get("VCOMMISSION_BASE_URL")
                .unwrap_or_else(|| DEFAULT_COUPONS_BASE_URL.to_string()),
            deeplink_base_url: get("VCOMMISSION_DEEPLINK_URL")
                .unwrap_or_else(|| DEFAULT_DEEPLINK_BASE_URL.to_string()),
            request_timeout,
            data_dir: get("DEALFLOW_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("data")),
        })
    }

    pub fn affiliate_settings(&self) -> AffiliateSettings {
        AffiliateSettings {
            amazon_tag: self.amazon_tag.clone(),
            remote_mode: self.remote_mode,
            request_timeout: self.request_timeout,
        }
    }

    /// Converter wired to the real network, or network-less without an API key.
    pub fn converter(&self) -> anyhow::Result<AffiliateConverter> {
        let network: Option<Arc<dyn AffiliateNetwork>> = match self.vcommission_api_key.as_deref() {
            Some(key) => {
                let client = VcommissionClient::new(key, self.request_timeout)?
                    .with_base_urls(&self.coupons_base_url, &self.deeplink_base_url);
                Some(Arc::new(client))
            }
            None => None,
        };
        Ok(AffiliateConverter::new(self.affiliate_settings(), network))
    }

    pub fn log_keys(&self) {
        fn preview(val: &Option<String>) -> String {
            match val {
                Some(v) => {
                    let n = v.chars().count().min(5);
                    let head: String = v.chars().take(n).collect();
                    format!("{head}...({} chars)", v.chars().count())
                }
                None => "<not set>".to_string(),
            }
        }

        tracing::info!("Config loaded:");
        tracing::info!("  AMAZON_TAG: {}", preview(&self.amazon_tag));
        tracing::info!("  VCOMMISSION_API_KEY: {}", preview(&self.vcommission_api_key));
        tracing::info!("  VCOMMISSION_MODE: {:?}", self.remote_mode);
        tracing::info!("  AFFILIATE_TIMEOUT_SECS: {}", self.request_timeout.as_secs());
        tracing::info!("  DEALFLOW_DATA_DIR: {}", self.data_dir.display());
    }
}
