// Trait seam for the remote affiliate network.
//
// The converter only talks to `AffiliateNetwork`; production wires in
// `VcommissionClient`, tests use `testing::MockNetwork`.

use anyhow::Result;
use async_trait::async_trait;
use vcommission_client::{Coupon, VcommissionClient};

#[async_trait]
pub trait AffiliateNetwork: Send + Sync {
    /// Full promotional-link catalog for the publisher account.
    async fn coupons(&self) -> Result<Vec<Coupon>>;

    /// Tracked deep link for a merchant URL. `None` when the network has none.
    async fn deeplink(&self, url: &str) -> Result<Option<String>>;
}

#[async_trait]
impl AffiliateNetwork for VcommissionClient {
    async fn coupons(&self) -> Result<Vec<Coupon>> {
        Ok(self.coupons().await?)
    }

    async fn deeplink(&self, url: &str) -> Result<Option<String>> {
        Ok(self.deeplink(url).await?)
    }
}
