use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::identity::deal_id;
use crate::pricing::{derive_discount, discount_label};

// --- Platform ---

/// Merchant a deal links to. Closed set; anything unrecognised is `Unknown`.
///
/// Serialized as the lower-case merchant key. Deserialization is total:
/// missing, null, empty, or unknown keys all become `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "&'static str")]
pub enum Platform {
    Amazon,
    Flipkart,
    Myntra,
    Ajio,
    Meesho,
    Croma,
    RelianceDigital,
    ShopClues,
    Snapdeal,
    TataCliq,
    Nykaa,
    Pepperfry,
    FirstCry,
    JioMart,
    Purplle,
    #[default]
    Unknown,
}

impl Platform {
    /// Every known merchant, excluding `Unknown`.
    pub const MERCHANTS: [Platform; 15] = [
        Platform::Amazon,
        Platform::Flipkart,
        Platform::Myntra,
        Platform::Ajio,
        Platform::Meesho,
        Platform::Croma,
        Platform::RelianceDigital,
        Platform::ShopClues,
        Platform::Snapdeal,
        Platform::TataCliq,
        Platform::Nykaa,
        Platform::Pepperfry,
        Platform::FirstCry,
        Platform::JioMart,
        Platform::Purplle,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Amazon => "amazon",
            Platform::Flipkart => "flipkart",
            Platform::Myntra => "myntra",
            Platform::Ajio => "ajio",
            Platform::Meesho => "meesho",
            Platform::Croma => "croma",
            Platform::RelianceDigital => "reliancedigital",
            Platform::ShopClues => "shopclues",
            Platform::Snapdeal => "snapdeal",
            Platform::TataCliq => "tatacliq",
            Platform::Nykaa => "nykaa",
            Platform::Pepperfry => "pepperfry",
            Platform::FirstCry => "firstcry",
            Platform::JioMart => "jiomart",
            Platform::Purplle => "purplle",
            Platform::Unknown => "unknown",
        }
    }

    /// Case-insensitive lookup by merchant key. Never fails.
    pub fn from_key(key: &str) -> Self {
        let key = key.trim();
        Self::MERCHANTS
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(key))
            .unwrap_or(Platform::Unknown)
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Platform::Unknown)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Option<String>> for Platform {
    fn from(value: Option<String>) -> Self {
        value.as_deref().map(Platform::from_key).unwrap_or_default()
    }
}

impl From<Platform> for &'static str {
    fn from(value: Platform) -> Self {
        value.as_str()
    }
}

// --- Deal ---

/// A single deal record, as stored in both the intake buffer and the catalog.
///
/// `original_link` holds the raw scraped link in the intake buffer and the
/// final affiliate link in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deal {
    #[serde(default)]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub mrp: String,
    #[serde(default)]
    pub discount: String,
    #[serde(default)]
    pub platform: Platform,
    pub original_link: String,
    pub timestamp: DateTime<Utc>,
}

impl Deal {
    /// Records without an id are never deduplicated.
    pub fn has_identity(&self) -> bool {
        !self.id.trim().is_empty()
    }
}

// --- CapturedDeal ---

/// A record as handed over by the collector, before normalization.
/// Only `title` and `original_link` are required to be non-empty.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CapturedDeal {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub price: Option<String>,
    #[serde(default)]
    pub mrp: Option<String>,
    #[serde(default)]
    pub discount: Option<String>,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub original_link: String,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

impl CapturedDeal {
    /// Normalize into a `Deal`. Returns `None` when the title or link is blank.
    pub fn into_deal(self, captured_at: DateTime<Utc>) -> Option<Deal> {
        let title = self.title.trim().to_string();
        let original_link = self.original_link.trim().to_string();
        if title.is_empty() || original_link.is_empty() {
            return None;
        }

        let price = self.price.unwrap_or_default().trim().to_string();
        let mrp = self.mrp.unwrap_or_default().trim().to_string();
        let discount = match self.discount.as_deref().map(discount_label) {
            Some(label) if !label.is_empty() => label,
            _ => derive_discount(&price, &mrp),
        };
        let id = match self.id {
            Some(id) if !id.trim().is_empty() => id.trim().to_string(),
            _ => deal_id(&title),
        };

        Some(Deal {
            id,
            title,
            image: self.image.unwrap_or_default().trim().to_string(),
            price,
            mrp,
            discount,
            platform: Platform::from(self.platform),
            original_link,
            timestamp: self.timestamp.unwrap_or(captured_at),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_round_trips_through_key() {
        for p in Platform::MERCHANTS {
            assert_eq!(Platform::from_key(p.as_str()), p);
        }
        assert_eq!(Platform::from_key("AMAZON"), Platform::Amazon);
        assert_eq!(Platform::from_key("ebay"), Platform::Unknown);
        assert_eq!(Platform::from_key(""), Platform::Unknown);
    }

    #[test]
    fn deal_platform_is_never_missing() {
        let json = r#"[
            {"id":"a","title":"A","original_link":"https://x","timestamp":"2024-05-01T10:00:00Z"},
            {"id":"b","title":"B","platform":null,"original_link":"https://x","timestamp":"2024-05-01T10:00:00Z"},
            {"id":"c","title":"C","platform":"","original_link":"https://x","timestamp":"2024-05-01T10:00:00Z"},
            {"id":"d","title":"D","platform":"Flipkart","original_link":"https://x","timestamp":"2024-05-01T10:00:00.123456Z"}
        ]"#;
        let deals: Vec<Deal> = serde_json::from_str(json).unwrap();
        assert_eq!(deals[0].platform, Platform::Unknown);
        assert_eq!(deals[1].platform, Platform::Unknown);
        assert_eq!(deals[2].platform, Platform::Unknown);
        assert_eq!(deals[3].platform, Platform::Flipkart);
    }

    #[test]
    fn deal_serializes_platform_as_key() {
        let deal = Deal {
            id: "x".into(),
            title: "t".into(),
            image: String::new(),
            price: String::new(),
            mrp: String::new(),
            discount: String::new(),
            platform: Platform::RelianceDigital,
            original_link: "https://x".into(),
            timestamp: "2024-05-01T10:00:00Z".parse().unwrap(),
        };
        let value = serde_json::to_value(&deal).unwrap();
        assert_eq!(value["platform"], "reliancedigital");
        assert_eq!(value["timestamp"], "2024-05-01T10:00:00Z");
    }

    #[test]
    fn captured_deal_fills_identity_and_discount() {
        let now: DateTime<Utc> = "2024-05-01T10:00:00Z".parse().unwrap();
        let captured = CapturedDeal {
            title: "  boAt Airdopes 141  ".into(),
            price: Some("₹1,099".into()),
            mrp: Some("₹4,490".into()),
            platform: Some("amazon".into()),
            original_link: "https://flipshope.com/redirect/2/B0FAKE123".into(),
            ..Default::default()
        };
        let deal = captured.into_deal(now).unwrap();
        assert_eq!(deal.title, "boAt Airdopes 141");
        assert_eq!(deal.id, deal_id("boAt Airdopes 141"));
        assert_eq!(deal.discount, "76% OFF");
        assert_eq!(deal.platform, Platform::Amazon);
        assert_eq!(deal.timestamp, now);
    }

    #[test]
    fn captured_deal_without_link_is_dropped() {
        let captured = CapturedDeal {
            title: "Something".into(),
            ..Default::default()
        };
        assert!(captured.into_deal(Utc::now()).is_none());
    }
}
