// Batch driver: one pass over the intake buffer.
//
//   Idle → Loading → PerRecordProcessing → Merging → Persisting → CleaningUp → Idle
//
// Records are processed one at a time. Nothing on disk changes until the
// merged catalog is written, and the intake batch is only removed after
// that write succeeded.

use std::fmt;

use dealflow_common::{Deal, Result, MAX_CATALOG_DEALS};
use tracing::{debug, info};

use crate::affiliate::{AffiliateConverter, ConversionMethod};
use crate::catalog::merge_with_report;
use crate::classifier::Classifier;
use crate::resolver::resolve;
use crate::store::DealStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Loading,
    PerRecordProcessing,
    Merging,
    Persisting,
    CleaningUp,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Idle => "idle",
            Phase::Loading => "loading",
            Phase::PerRecordProcessing => "processing",
            Phase::Merging => "merging",
            Phase::Persisting => "persisting",
            Phase::CleaningUp => "cleaning_up",
        };
        f.write_str(name)
    }
}

/// Every stage a deal's link passes through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkTrail {
    pub raw: String,
    pub resolved: String,
    pub affiliate: String,
}

#[derive(Debug, Clone)]
pub struct ProcessedDeal {
    pub deal: Deal,
    pub trail: LinkTrail,
    pub method: ConversionMethod,
    pub via_indirection: bool,
    /// Platform came from the classifier rather than the resolver or collector.
    pub classified: bool,
}

impl ProcessedDeal {
    /// The catalog only exposes the final link.
    pub fn into_deal(self) -> Deal {
        Deal {
            original_link: self.trail.affiliate,
            ..self.deal
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStats {
    pub processed: usize,
    pub via_indirection: usize,
    pub classified: usize,
    pub unknown_platform: usize,
    pub converted_local: usize,
    pub converted_remote: usize,
    pub passed_through: usize,
    pub duplicates_dropped: usize,
    pub evicted: usize,
    pub catalog_size: usize,
    pub intake_removed: bool,
}

impl RunStats {
    fn record(&mut self, processed: &ProcessedDeal) {
        self.processed += 1;
        if processed.via_indirection {
            self.via_indirection += 1;
        }
        if processed.classified {
            self.classified += 1;
        }
        if processed.deal.platform.is_unknown() {
            self.unknown_platform += 1;
        }
        match processed.method {
            ConversionMethod::LocalTag => self.converted_local += 1,
            ConversionMethod::Remote => self.converted_remote += 1,
            ConversionMethod::Passthrough => self.passed_through += 1,
        }
    }
}

impl fmt::Display for RunStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "processed={} indirection={} classified={} unknown={} local={} remote={} passthrough={} \
             duplicates={} evicted={} catalog={}",
            self.processed,
            self.via_indirection,
            self.classified,
            self.unknown_platform,
            self.converted_local,
            self.converted_remote,
            self.passed_through,
            self.duplicates_dropped,
            self.evicted,
            self.catalog_size,
        )
    }
}

pub struct Pipeline {
    store: DealStore,
    classifier: Classifier,
    converter: AffiliateConverter,
    max_catalog: usize,
}

impl Pipeline {
    pub fn new(store: DealStore, classifier: Classifier, converter: AffiliateConverter) -> Self {
        Self {
            store,
            classifier,
            converter,
            max_catalog: MAX_CATALOG_DEALS,
        }
    }

    pub fn with_max_catalog(mut self, max_catalog: usize) -> Self {
        self.max_catalog = max_catalog;
        self
    }

    /// Resolve, classify (only when still unknown), and convert a single deal.
    pub async fn process(&self, deal: Deal) -> ProcessedDeal {
        let raw = deal.original_link.clone();
        let resolution = resolve(&raw, deal.platform);

        let mut platform = resolution.platform;
        let mut classified = false;
        if platform.is_unknown() {
            let aux = Some(deal.image.as_str()).filter(|s| !s.is_empty());
            platform = self.classifier.classify(&resolution.url, aux);
            classified = !platform.is_unknown();
        }

        let conversion = self.converter.convert(&resolution.url, platform).await;

        debug!(
            id = deal.id.as_str(),
            %platform,
            raw = raw.as_str(),
            resolved = resolution.url.as_str(),
            affiliate = conversion.url.as_str(),
            method = ?conversion.method,
            "Processed deal"
        );

        ProcessedDeal {
            deal: Deal { platform, ..deal },
            trail: LinkTrail {
                raw,
                resolved: resolution.url,
                affiliate: conversion.url,
            },
            method: conversion.method,
            via_indirection: resolution.via_indirection,
            classified,
        }
    }

    /// One full pass. Only a missing or unreadable intake batch (or a failed
    /// catalog write) is an error; in both cases the catalog is untouched.
    pub async fn run(&self) -> Result<RunStats> {
        let mut stats = RunStats::default();

        enter(Phase::Loading);
        let intake = self.store.load_intake()?;
        info!(count = intake.len(), "Loaded intake batch");

        enter(Phase::PerRecordProcessing);
        let mut processed = Vec::with_capacity(intake.len());
        for deal in intake {
            let result = self.process(deal).await;
            stats.record(&result);
            processed.push(result.into_deal());
        }

        enter(Phase::Merging);
        let previous = self.store.load_catalog();
        let report = merge_with_report(processed, previous, self.max_catalog);
        stats.duplicates_dropped = report.duplicates_dropped;
        stats.evicted = report.evicted;
        stats.catalog_size = report.deals.len();

        enter(Phase::Persisting);
        self.store.write_catalog(&report.deals)?;
        info!(
            count = report.deals.len(),
            path = %self.store.catalog_path().display(),
            "Catalog saved"
        );

        enter(Phase::CleaningUp);
        stats.intake_removed = self.store.remove_intake();

        enter(Phase::Idle);
        Ok(stats)
    }
}

fn enter(phase: Phase) {
    debug!(%phase, "Pipeline phase");
}
