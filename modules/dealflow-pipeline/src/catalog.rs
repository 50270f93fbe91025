// Rolling catalog merge.
//
// New deals go in front of the previous catalog, the first occurrence of each
// id survives, and the tail beyond `max_size` is evicted. The same policy is
// used for the intake buffer and the finalized catalog.

use std::collections::HashSet;

use dealflow_common::Deal;

#[derive(Debug, Clone, Default)]
pub struct MergeReport {
    pub deals: Vec<Deal>,
    /// Later occurrences of an already-seen id.
    pub duplicates_dropped: usize,
    /// Unique records cut off by the size cap.
    pub evicted: usize,
}

/// Merge `new_deals` in front of `previous`, dedupe by id, cap at `max_size`.
pub fn merge(new_deals: Vec<Deal>, previous: Vec<Deal>, max_size: usize) -> Vec<Deal> {
    merge_with_report(new_deals, previous, max_size).deals
}

pub fn merge_with_report(new_deals: Vec<Deal>, previous: Vec<Deal>, max_size: usize) -> MergeReport {
    let mut seen: HashSet<String> = HashSet::with_capacity(new_deals.len() + previous.len());
    let mut deals = Vec::with_capacity(new_deals.len() + previous.len());
    let mut duplicates_dropped = 0;

    for deal in new_deals.into_iter().chain(previous) {
        // Records without an id are always kept.
        if deal.has_identity() && !seen.insert(deal.id.clone()) {
            duplicates_dropped += 1;
            continue;
        }
        deals.push(deal);
    }

    let evicted = deals.len().saturating_sub(max_size);
    deals.truncate(max_size);

    MergeReport {
        deals,
        duplicates_dropped,
        evicted,
    }
}
