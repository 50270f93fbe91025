// Decodes aggregator indirection links (`.../redirect/<code>/<item_id>`) into
// merchant URLs. Anything that doesn't look like an indirection link is
// already a merchant URL and passes through with the collector's guess.

use std::sync::LazyLock;

use dealflow_common::Platform;
use regex::Regex;

static REDIRECT_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/redirect/([A-Za-z0-9_-]+)/([A-Za-z0-9_-]+)").expect("valid redirect regex")
});

struct RedirectTarget {
    code: &'static str,
    platform: Platform,
    template: &'static str,
}

/// Merchant code → URL template. `{id}` is replaced with the item id.
const REDIRECT_TARGETS: &[RedirectTarget] = &[
    RedirectTarget {
        code: "1",
        platform: Platform::Flipkart,
        template: "https://www.flipkart.com/p/p/item?pid={id}",
    },
    RedirectTarget {
        code: "2",
        platform: Platform::Amazon,
        template: "https://www.amazon.in/dp/{id}",
    },
    RedirectTarget {
        code: "6",
        platform: Platform::Ajio,
        template: "https://www.ajio.com/p/{id}",
    },
    RedirectTarget {
        code: "7",
        platform: Platform::Myntra,
        template: "https://www.myntra.com/product/p/p/{id}/buy",
    },
    RedirectTarget {
        code: "14",
        platform: Platform::RelianceDigital,
        template: "https://www.reliancedigital.in/product/{id}",
    },
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub url: String,
    pub platform: Platform,
    /// The link was an indirection link with a known merchant code.
    pub via_indirection: bool,
}

/// Recover the merchant URL behind `raw_link`.
///
/// Unknown merchant codes yield the original link and `Platform::Unknown`.
/// Non-indirection links are returned unchanged with `fallback`.
pub fn resolve(raw_link: &str, fallback: Platform) -> Resolution {
    let Some(caps) = REDIRECT_PATH.captures(raw_link) else {
        return Resolution {
            url: raw_link.to_string(),
            platform: fallback,
            via_indirection: false,
        };
    };

    let code = &caps[1];
    let item_id = &caps[2];

    match REDIRECT_TARGETS.iter().find(|t| t.code == code) {
        Some(target) => Resolution {
            url: target.template.replace("{id}", item_id),
            platform: target.platform,
            via_indirection: true,
        },
        None => {
            tracing::debug!(code, link = raw_link, "Unknown redirect code");
            Resolution {
                url: raw_link.to_string(),
                platform: Platform::Unknown,
                via_indirection: false,
            }
        }
    }
}

/// Merchant behind an indirection code, if the code is known.
pub fn platform_for_code(code: &str) -> Option<Platform> {
    let code = code.trim();
    REDIRECT_TARGETS
        .iter()
        .find(|t| t.code == code)
        .map(|t| t.platform)
}
