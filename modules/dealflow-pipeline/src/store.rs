// JSON file storage for the intake buffer and the finalized catalog.
//
// Both files are pretty-printed JSON arrays of deals. Writes go to a temp
// file in the same directory which is then renamed over the target, so a
// reader never observes a half-written catalog.

use std::fs;
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use dealflow_common::{Deal, PipelineError, Result, CATALOG_FILE, INTAKE_FILE};
use tempfile::NamedTempFile;
use tracing::{info, warn};

use crate::catalog::{merge_with_report, MergeReport};

#[derive(Debug, Clone)]
pub struct DealStore {
    dir: PathBuf,
}

impl DealStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn intake_path(&self) -> PathBuf {
        self.dir.join(INTAKE_FILE)
    }

    pub fn catalog_path(&self) -> PathBuf {
        self.dir.join(CATALOG_FILE)
    }

    /// Read the pending intake batch. A missing batch is fatal for the run.
    pub fn load_intake(&self) -> Result<Vec<Deal>> {
        let path = self.intake_path();
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(PipelineError::IntakeMissing { path })
            }
            Err(e) => return Err(PipelineError::io(path, e)),
        };
        serde_json::from_str(&text).map_err(|e| PipelineError::parse(path, e))
    }

    /// Read the persisted catalog. Missing or corrupt catalogs read as empty.
    pub fn load_catalog(&self) -> Vec<Deal> {
        let path = self.catalog_path();
        match read_deals(&path) {
            Ok(Some(deals)) => deals,
            Ok(None) => {
                info!(path = %path.display(), "No existing catalog, starting fresh");
                Vec::new()
            }
            Err(e) => {
                warn!(error = %e, "Existing catalog unreadable, treating as empty");
                Vec::new()
            }
        }
    }

    /// Atomically replace the catalog.
    pub fn write_catalog(&self, deals: &[Deal]) -> Result<()> {
        write_deals_atomic(&self.catalog_path(), deals)
    }

    /// Delete the consumed intake batch. Failures are logged only: the catalog
    /// is already persisted by the time this runs.
    pub fn remove_intake(&self) -> bool {
        let path = self.intake_path();
        match fs::remove_file(&path) {
            Ok(()) => {
                info!(path = %path.display(), "Removed consumed intake batch");
                true
            }
            Err(e) if e.kind() == ErrorKind::NotFound => true,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Could not remove intake batch");
                false
            }
        }
    }

    /// Put freshly captured deals in front of the intake buffer, with the
    /// same dedupe and cap policy as the catalog.
    pub fn append_intake(&self, captured: Vec<Deal>, max_size: usize) -> Result<MergeReport> {
        let path = self.intake_path();
        let existing = match read_deals(&path) {
            Ok(existing) => existing.unwrap_or_default(),
            Err(e) => {
                warn!(error = %e, "Existing intake buffer unreadable, replacing it");
                Vec::new()
            }
        };

        let report = merge_with_report(captured, existing, max_size);
        write_deals_atomic(&path, &report.deals)?;
        Ok(report)
    }
}

/// `Ok(None)` when the file does not exist.
fn read_deals(path: &Path) -> Result<Option<Vec<Deal>>> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(PipelineError::io(path, e)),
    };
    serde_json::from_str(&text)
        .map(Some)
        .map_err(|e| PipelineError::parse(path, e))
}

fn write_deals_atomic(path: &Path, deals: &[Deal]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir).map_err(|e| PipelineError::io(&dir, e))?;

    let tmp = NamedTempFile::new_in(&dir).map_err(|e| PipelineError::io(&dir, e))?;
    {
        let mut writer = BufWriter::new(tmp.as_file());
        serde_json::to_writer_pretty(&mut writer, deals)
            .map_err(|e| PipelineError::io(path, e.into()))?;
        writer.flush().map_err(|e| PipelineError::io(path, e))?;
    }
    tmp.as_file()
        .sync_all()
        .map_err(|e| PipelineError::io(path, e))?;
    tmp.persist(path)
        .map_err(|e| PipelineError::io(path, e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::deal;

    #[test]
    fn missing_intake_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let store = DealStore::new(dir.path());
        assert!(matches!(
            store.load_intake(),
            Err(PipelineError::IntakeMissing { .. })
        ));
    }

    #[test]
    fn corrupt_catalog_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = DealStore::new(dir.path());
        fs::write(store.catalog_path(), "{ not json").unwrap();
        assert!(store.load_catalog().is_empty());
    }

    #[test]
    fn catalog_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let store = DealStore::new(dir.path().join("nested"));
        let deals = vec![deal("a", "https://www.amazon.in/dp/A"), deal("b", "https://x.example/b")];

        store.write_catalog(&deals).unwrap();
        assert_eq!(store.load_catalog(), deals);

        let text = fs::read_to_string(store.catalog_path()).unwrap();
        assert!(text.starts_with("[\n  {"), "catalog should be pretty-printed");
        // Only the catalog itself is left behind in the directory.
        assert_eq!(fs::read_dir(store.dir()).unwrap().count(), 1);
    }

    #[test]
    fn non_ascii_is_written_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let store = DealStore::new(dir.path());
        let mut d = deal("a", "https://x.example/a");
        d.price = "₹1,299".into();
        store.write_catalog(&[d]).unwrap();
        let text = fs::read_to_string(store.catalog_path()).unwrap();
        assert!(text.contains("₹1,299"));
    }

    #[test]
    fn append_intake_caps_and_puts_new_first() {
        let dir = tempfile::tempdir().unwrap();
        let store = DealStore::new(dir.path());

        let first: Vec<Deal> = (0..3).map(|i| deal(&format!("d{i}"), "https://x.example")).collect();
        store.append_intake(first, 4).unwrap();

        let second = vec![deal("d2", "https://x.example/new"), deal("d9", "https://x.example")];
        let report = store.append_intake(second, 4).unwrap();
        assert_eq!(report.duplicates_dropped, 1);
        assert_eq!(report.evicted, 0);

        let intake = store.load_intake().unwrap();
        let ids: Vec<&str> = intake.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["d2", "d9", "d0", "d1"]);
        assert_eq!(intake[0].original_link, "https://x.example/new");
    }

    #[test]
    fn remove_intake_is_quiet_when_absent() {
        let dir = tempfile::tempdir().unwrap();
        let store = DealStore::new(dir.path());
        assert!(store.remove_intake());
    }
}
