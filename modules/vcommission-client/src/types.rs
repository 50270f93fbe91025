use serde::{Deserialize, Deserializer, Serialize};

// --- Coupon catalog ---

/// Envelope returned by `GET /v2/publishers/coupons`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CouponsResponse {
    #[serde(default)]
    pub data: Vec<Coupon>,
}

/// A promotional entry from the publisher coupon catalog.
///
/// The API is loose about field types, so every field is optional and
/// non-string values read as absent rather than failing the whole page.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Coupon {
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub advertiser: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub link: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub code: Option<String>,
}

impl Coupon {
    /// True when the name or advertiser contains any keyword, ignoring case.
    /// Keywords are expected to be lower-case already.
    pub fn matches_any(&self, keywords: &[&str]) -> bool {
        let name = self.name.as_deref().unwrap_or_default().to_lowercase();
        let advertiser = self.advertiser.as_deref().unwrap_or_default().to_lowercase();
        keywords
            .iter()
            .any(|kw| name.contains(kw) || advertiser.contains(kw))
    }

    /// The coupon's tracking link, if present and non-blank.
    pub fn usable_link(&self) -> Option<&str> {
        self.link.as_deref().map(str::trim).filter(|l| !l.is_empty())
    }
}

// --- Deep links ---

/// Body for `POST /v2/publisher/deeplink`.
#[derive(Debug, Clone, Serialize)]
pub struct DeeplinkRequest<'a> {
    #[serde(rename = "apiKey")]
    pub api_key: &'a str,
    pub url: &'a str,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeeplinkResponse {
    #[serde(rename = "shortUrl", default, deserialize_with = "lenient_string")]
    pub short_url: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub url: Option<String>,
}

impl DeeplinkResponse {
    /// Prefer the short link, fall back to the long one.
    pub fn into_link(self) -> Option<String> {
        self.short_url
            .filter(|s| !s.trim().is_empty())
            .or(self.url.filter(|s| !s.trim().is_empty()))
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => Some(s),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coupons_tolerate_odd_field_types() {
        let json = r#"{"data":[
            {"name":"Flipkart Big Saving Days","advertiser":{"id":7},"link":"https://track.example/f"},
            {"name":null,"advertiser":"Myntra","link":""}
        ]}"#;
        let resp: CouponsResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.data.len(), 2);
        assert!(resp.data[0].advertiser.is_none());
        assert!(resp.data[0].matches_any(&["flipkart"]));
        assert!(resp.data[1].matches_any(&["myntra"]));
        assert!(resp.data[1].usable_link().is_none());
    }

    #[test]
    fn missing_data_is_empty_catalog() {
        let resp: CouponsResponse = serde_json::from_str("{}").unwrap();
        assert!(resp.data.is_empty());
    }

    #[test]
    fn deeplink_prefers_short_url() {
        let resp: DeeplinkResponse =
            serde_json::from_str(r#"{"shortUrl":"https://vc.lk/a","url":"https://long"}"#).unwrap();
        assert_eq!(resp.into_link().as_deref(), Some("https://vc.lk/a"));

        let resp: DeeplinkResponse =
            serde_json::from_str(r#"{"shortUrl":"","url":"https://long"}"#).unwrap();
        assert_eq!(resp.into_link().as_deref(), Some("https://long"));

        let resp: DeeplinkResponse = serde_json::from_str("{}").unwrap();
        assert!(resp.into_link().is_none());
    }
}
