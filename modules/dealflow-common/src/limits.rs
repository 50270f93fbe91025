/// Maximum number of deals kept in the finalized catalog (`deals.json`).
pub const MAX_CATALOG_DEALS: usize = 300;

/// Maximum number of records kept in the raw intake buffer (`deals_raw.json`).
/// Independent of the catalog window.
pub const MAX_INTAKE_DEALS: usize = 200;

/// Intake buffer written by the collector and consumed by a pipeline run.
pub const INTAKE_FILE: &str = "deals_raw.json";

/// Finalized, affiliate-converted catalog.
pub const CATALOG_FILE: &str = "deals.json";
