// Test doubles for the pipeline.
//
// - MockNetwork (AffiliateNetwork): canned coupon catalog and deep links,
//   failure and latency injection, call counting.
// - Deal fixtures with a fixed timestamp.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use dealflow_common::{deal_id, Deal, Platform};
use vcommission_client::{Coupon, VcommissionError};

use crate::traits::AffiliateNetwork;

// ---------------------------------------------------------------------------
// MockNetwork
// ---------------------------------------------------------------------------

/// In-memory affiliate network. Builder style:
/// `.on_coupon()`, `.on_deeplink()`, `.failing_with_status()`, `.with_delay()`.
#[derive(Default)]
pub struct MockNetwork {
    coupons: Vec<Coupon>,
    deeplinks: HashMap<String, String>,
    failure_status: Option<u16>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl MockNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_coupon(mut self, name: &str, advertiser: &str, link: &str) -> Self {
        self.coupons.push(Coupon {
            name: Some(name.to_string()),
            advertiser: Some(advertiser.to_string()),
            link: Some(link.to_string()),
            code: None,
        });
        self
    }

    pub fn on_deeplink(mut self, url: &str, link: &str) -> Self {
        self.deeplinks.insert(url.to_string(), link.to_string());
        self
    }

    /// Every call fails as if the API answered with `status`.
    pub fn failing_with_status(mut self, status: u16) -> Self {
        self.failure_status = Some(status);
        self
    }

    /// Every call sleeps before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of requests received so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn begin_call(&self) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(status) = self.failure_status {
            return Err(VcommissionError::Api {
                status,
                message: "Internal Server Error".to_string(),
            }
            .into());
        }
        Ok(())
    }
}

#[async_trait]
impl AffiliateNetwork for MockNetwork {
    async fn coupons(&self) -> Result<Vec<Coupon>> {
        self.begin_call().await?;
        Ok(self.coupons.clone())
    }

    async fn deeplink(&self, url: &str) -> Result<Option<String>> {
        self.begin_call().await?;
        Ok(self.deeplinks.get(url).cloned())
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub fn fixed_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap()
}

/// Minimal deal with an explicit id and link.
pub fn deal(id: &str, link: &str) -> Deal {
    Deal {
        id: id.to_string(),
        title: format!("Deal {id}"),
        image: String::new(),
        price: "₹499".to_string(),
        mrp: "₹999".to_string(),
        discount: "50% OFF".to_string(),
        platform: Platform::Unknown,
        original_link: link.to_string(),
        timestamp: fixed_time(),
    }
}

/// Intake-style deal: id derived from the title, collector's platform guess.
pub fn raw_deal(title: &str, link: &str, platform: Platform) -> Deal {
    Deal {
        id: deal_id(title),
        title: title.to_string(),
        platform,
        ..deal("", link)
    }
}
