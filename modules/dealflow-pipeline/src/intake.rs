// Collector hand-off: normalize freshly captured records and push them onto
// the front of the intake buffer (capped separately from the catalog).

use std::fmt;
use std::path::Path;

use chrono::{DateTime, Utc};
use dealflow_common::{CapturedDeal, Deal, PipelineError, Result, MAX_INTAKE_DEALS};
use tracing::{info, warn};

use crate::store::DealStore;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestStats {
    pub accepted: usize,
    pub skipped: usize,
    pub duplicates_dropped: usize,
    pub evicted: usize,
    pub buffer_size: usize,
}

impl fmt::Display for IngestStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "accepted={} skipped={} duplicates={} evicted={} buffer={}",
            self.accepted, self.skipped, self.duplicates_dropped, self.evicted, self.buffer_size
        )
    }
}

/// Normalize captured records, dropping those without a title or link.
pub fn normalize_captured(records: Vec<CapturedDeal>, captured_at: DateTime<Utc>) -> (Vec<Deal>, usize) {
    let total = records.len();
    let deals: Vec<Deal> = records
        .into_iter()
        .filter_map(|r| r.into_deal(captured_at))
        .collect();
    let skipped = total - deals.len();
    if skipped > 0 {
        warn!(skipped, "Dropped captured records without title or link");
    }
    (deals, skipped)
}

/// Read captured records from a JSON array file.
pub fn read_captured(path: &Path) -> Result<Vec<CapturedDeal>> {
    let text = std::fs::read_to_string(path).map_err(|e| PipelineError::io(path, e))?;
    serde_json::from_str(&text).map_err(|e| PipelineError::parse(path, e))
}

pub fn ingest(
    store: &DealStore,
    records: Vec<CapturedDeal>,
    captured_at: DateTime<Utc>,
) -> Result<IngestStats> {
    let (deals, skipped) = normalize_captured(records, captured_at);
    let accepted = deals.len();

    let report = store.append_intake(deals, MAX_INTAKE_DEALS)?;
    info!(
        accepted,
        buffer = report.deals.len(),
        path = %store.intake_path().display(),
        "Intake buffer updated"
    );

    Ok(IngestStats {
        accepted,
        skipped,
        duplicates_dropped: report.duplicates_dropped,
        evicted: report.evicted,
        buffer_size: report.deals.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixed_time;
    use dealflow_common::{deal_id, Platform};

    fn captured(title: &str, link: &str) -> CapturedDeal {
        CapturedDeal {
            title: title.to_string(),
            original_link: link.to_string(),
            platform: Some("flipkart".to_string()),
            discount: Some("Flat 40% off".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn normalize_fills_defaults_and_skips_blank() {
        let (deals, skipped) = normalize_captured(
            vec![captured("Mixer Grinder", "https://x.example/1"), captured("", "https://x.example/2")],
            fixed_time(),
        );
        assert_eq!(skipped, 1);
        assert_eq!(deals.len(), 1);
        assert_eq!(deals[0].id, deal_id("Mixer Grinder"));
        assert_eq!(deals[0].discount, "40% OFF");
        assert_eq!(deals[0].platform, Platform::Flipkart);
        assert_eq!(deals[0].timestamp, fixed_time());
    }

    #[test]
    fn ingest_respects_intake_cap() {
        let dir = tempfile::tempdir().unwrap();
        let store = DealStore::new(dir.path());

        let batch: Vec<CapturedDeal> = (0..250)
            .map(|i| captured(&format!("Item {i}"), &format!("https://x.example/{i}")))
            .collect();
        let stats = ingest(&store, batch, fixed_time()).unwrap();

        assert_eq!(stats.accepted, 250);
        assert_eq!(stats.buffer_size, MAX_INTAKE_DEALS);
        assert_eq!(stats.evicted, 50);
        assert_eq!(store.load_intake().unwrap().len(), MAX_INTAKE_DEALS);
    }
}
