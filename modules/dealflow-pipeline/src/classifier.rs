// Platform classification by keyword tables.
//
// Two tables: merchant domains matched against the URL's host, and looser
// aliases matched against an auxiliary signal (image URL, alt text). Both
// are validated on construction so that no keyword overlaps a keyword of a
// different platform, and a haystack containing keywords of more than one
// platform is ambiguous rather than resolved by table order.

use dealflow_common::Platform;
use thiserror::Error;

use crate::resolver::platform_for_code;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClassifierError {
    #[error("keyword {keyword:?} for {platform} overlaps {other_keyword:?} for {other_platform}")]
    KeywordConflict {
        platform: Platform,
        keyword: String,
        other_platform: Platform,
        other_keyword: String,
    },

    #[error("empty keyword for {0}")]
    EmptyKeyword(Platform),
}

/// Merchant domain fragments, matched against the lower-cased URL without
/// query string or fragment.
const DOMAIN_KEYWORDS: &[(Platform, &[&str])] = &[
    (Platform::Amazon, &["amazon.in", "amazon.com", "amzn.to", "amzn.in"]),
    (Platform::Flipkart, &["flipkart.com", "fkrt.it"]),
    (Platform::Myntra, &["myntra.com", "myntr.it"]),
    (Platform::Ajio, &["ajio.com", "ajiio.in"]),
    (Platform::Meesho, &["meesho.com"]),
    (Platform::Croma, &["croma.com"]),
    (Platform::RelianceDigital, &["reliancedigital.in"]),
    (Platform::ShopClues, &["shopclues.com"]),
    (Platform::Snapdeal, &["snapdeal.com"]),
    (Platform::TataCliq, &["tatacliq.com"]),
    (Platform::Nykaa, &["nykaa.com", "nykaafashion.com"]),
    (Platform::Pepperfry, &["pepperfry.com"]),
    (Platform::FirstCry, &["firstcry.com"]),
    (Platform::JioMart, &["jiomart.com"]),
    (Platform::Purplle, &["purplle.com"]),
];

/// Lower-confidence aliases for image URLs, CDN hosts, and alt text.
const ALIAS_KEYWORDS: &[(Platform, &[&str])] = &[
    (Platform::Amazon, &["amazon", "amzn"]),
    (Platform::Flipkart, &["flipkart", "flixcart", "fkrt"]),
    (Platform::Myntra, &["myntra", "myntassets"]),
    (Platform::Ajio, &["ajio"]),
    (Platform::Meesho, &["meesho"]),
    (Platform::Croma, &["croma"]),
    (
        Platform::RelianceDigital,
        &["reliance digital", "reliancedigital", "reliance"],
    ),
    (Platform::ShopClues, &["shopclues"]),
    (Platform::Snapdeal, &["snapdeal"]),
    (Platform::TataCliq, &["tatacliq", "tata cliq"]),
    (Platform::Nykaa, &["nykaa"]),
    (Platform::Pepperfry, &["pepperfry"]),
    (Platform::FirstCry, &["firstcry", "first cry"]),
    (Platform::JioMart, &["jiomart", "jio mart"]),
    (Platform::Purplle, &["purplle"]),
];

/// Keyword → platform mapping in which no keyword is a substring of another
/// platform's keyword.
#[derive(Debug, Clone)]
pub struct KeywordTable {
    entries: Vec<(Platform, Vec<String>)>,
}

impl KeywordTable {
    pub fn new(entries: &[(Platform, &[&str])]) -> Result<Self, ClassifierError> {
        let entries: Vec<(Platform, Vec<String>)> = entries
            .iter()
            .map(|(platform, keywords)| {
                let keywords = keywords
                    .iter()
                    .map(|kw| kw.trim().to_lowercase())
                    .collect::<Vec<_>>();
                (*platform, keywords)
            })
            .collect();

        for (platform, keywords) in &entries {
            if keywords.iter().any(|kw| kw.is_empty()) {
                return Err(ClassifierError::EmptyKeyword(*platform));
            }
        }

        for (i, (platform, keywords)) in entries.iter().enumerate() {
            for keyword in keywords {
                for (other_platform, other_keywords) in &entries[i + 1..] {
                    if other_platform == platform {
                        continue;
                    }
                    if let Some(other) = other_keywords
                        .iter()
                        .find(|o| o.contains(keyword.as_str()) || keyword.contains(o.as_str()))
                    {
                        return Err(ClassifierError::KeywordConflict {
                            platform: *platform,
                            keyword: keyword.clone(),
                            other_platform: *other_platform,
                            other_keyword: other.clone(),
                        });
                    }
                }
            }
        }

        Ok(Self { entries })
    }

    /// The single platform with a keyword in `haystack` (already lower-cased).
    /// `None` when nothing matches or keywords of several platforms match.
    pub fn find(&self, haystack: &str) -> Option<Platform> {
        let mut hits = self
            .entries
            .iter()
            .filter(|(_, keywords)| keywords.iter().any(|kw| haystack.contains(kw.as_str())))
            .map(|(platform, _)| *platform);

        let first = hits.next()?;
        if hits.any(|other| other != first) {
            tracing::debug!(haystack, "Keywords of several platforms matched");
            return None;
        }
        Some(first)
    }
}

#[derive(Debug, Clone)]
pub struct Classifier {
    domains: KeywordTable,
    aliases: KeywordTable,
}

impl Classifier {
    pub fn new(domains: KeywordTable, aliases: KeywordTable) -> Self {
        Self { domains, aliases }
    }

    /// Built-in tables, validated.
    pub fn standard() -> Result<Self, ClassifierError> {
        Ok(Self::new(
            KeywordTable::new(DOMAIN_KEYWORDS)?,
            KeywordTable::new(ALIAS_KEYWORDS)?,
        ))
    }

    /// Identify the merchant behind `url`, falling back to `aux` (image URL,
    /// alt text, or a bare indirection code). Unmatched input is `Unknown`.
    pub fn classify(&self, url: &str, aux: Option<&str>) -> Platform {
        if let Some(platform) = self.domains.find(&match_target(url)) {
            return platform;
        }

        let Some(aux) = aux.map(str::trim).filter(|a| !a.is_empty()) else {
            return Platform::Unknown;
        };

        if aux.chars().all(|c| c.is_ascii_digit()) {
            return platform_for_code(aux).unwrap_or_default();
        }

        self.aliases
            .find(&aux.to_lowercase())
            .unwrap_or_default()
    }
}

/// The URL's host, or the whole normalized URL when it does not parse.
fn match_target(url: &str) -> String {
    match url::Url::parse(url.trim()) {
        Ok(parsed) => match parsed.host_str() {
            Some(host) => host.to_lowercase(),
            None => normalize_url(url),
        },
        Err(_) => normalize_url(url),
    }
}

/// Lower-case and drop `?query` and `#fragment`.
pub fn normalize_url(url: &str) -> String {
    let end = url.find(['?', '#']).unwrap_or(url.len());
    url[..end].trim().to_lowercase()
}
