//! Batched snapshot persistence with per-store merge policies.
//!
//! The persister owns the identity-keyed record map for one store, seeded
//! once from the on-disk snapshot. Every flush rewrites the whole snapshot
//! (temp file + atomic rename), so a completed flush always leaves a fully
//! valid file and an interrupted run keeps the previous one.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};

use crate::domain::{CourseDetail, CourseListing};

/// Identity and conflict behaviour for one record store.
pub trait MergePolicy: Send + Sync + 'static {
    type Record: Serialize + DeserializeOwned + Clone + Send + 'static;

    fn identity(record: &Self::Record) -> String;

    /// Whether an incoming record replaces an existing one with the same
    /// identity. When false, the existing record wins and the incoming one
    /// is silently dropped.
    const REPLACES_EXISTING: bool;
}

/// Listing store: first record for an identity wins, duplicates dropped.
pub struct ListingMerge;

impl MergePolicy for ListingMerge {
    type Record = CourseListing;

    fn identity(record: &Self::Record) -> String {
        record.identity()
    }

    const REPLACES_EXISTING: bool = false;
}

/// Detail store: last write wins, records replaced wholesale.
pub struct DetailMerge;

impl MergePolicy for DetailMerge {
    type Record = CourseDetail;

    fn identity(record: &Self::Record) -> String {
        record.id.clone()
    }

    const REPLACES_EXISTING: bool = true;
}

pub struct BatchPersister<M: MergePolicy> {
    path: PathBuf,
    batch_size: usize,
    records: IndexMap<String, M::Record>,
    pending: usize,
}

impl<M: MergePolicy> BatchPersister<M> {
    /// Seed the in-memory map from the existing snapshot. A missing file is
    /// an empty store.
    pub fn load(path: impl Into<PathBuf>, batch_size: usize) -> Result<Self> {
        let path = path.into();
        let existing: Vec<M::Record> = load_snapshot(&path)?;

        let mut records = IndexMap::with_capacity(existing.len());
        for record in existing {
            records.insert(M::identity(&record), record);
        }
        debug!("Loaded {} record(s) from {}", records.len(), path.display());

        Ok(Self {
            path,
            batch_size: batch_size.max(1),
            records,
            pending: 0,
        })
    }

    /// Merge one harvested record into the map per the store's policy.
    pub fn accumulate(&mut self, record: M::Record) {
        let identity = M::identity(&record);
        if M::REPLACES_EXISTING {
            // IndexMap keeps the original insertion slot, so replacing a
            // record does not reorder the persisted snapshot.
            self.records.insert(identity, record);
        } else if !self.records.contains_key(&identity) {
            self.records.insert(identity, record);
        }
        self.pending += 1;
    }

    /// Flush when the accumulated-since-last-flush count has reached the
    /// batch size. Returns whether a flush happened.
    pub fn flush_if_due(&mut self) -> Result<bool> {
        if self.pending >= self.batch_size {
            self.flush()?;
            return Ok(true);
        }
        Ok(false)
    }

    /// Flush any pending batch, e.g. between the initial pass and the
    /// retry pass.
    pub fn flush_pending(&mut self) -> Result<()> {
        if self.pending > 0 {
            self.flush()?;
        }
        Ok(())
    }

    /// Unconditional end-of-pass flush; a pending batch is never dropped
    /// and the snapshot file exists even for an empty run.
    pub fn flush_final(&mut self) -> Result<()> {
        self.flush()
    }

    fn flush(&mut self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("failed to create data directory {}", parent.display())
                })?;
            }
        }

        let snapshot: Vec<&M::Record> = self.records.values().collect();
        let body = serde_json::to_vec_pretty(&snapshot).context("failed to serialize snapshot")?;

        let tmp_path = self.path.with_extension("json.tmp");
        std::fs::write(&tmp_path, body)
            .with_context(|| format!("failed to write snapshot {}", tmp_path.display()))?;
        std::fs::rename(&tmp_path, &self.path)
            .with_context(|| format!("failed to replace snapshot {}", self.path.display()))?;

        info!(
            "Wrote snapshot of {} record(s) to {} ({} newly accumulated)",
            self.records.len(),
            self.path.display(),
            self.pending
        );
        self.pending = 0;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, identity: &str) -> Option<&M::Record> {
        self.records.get(identity)
    }
}

/// Read a snapshot file into records; a missing file is an empty store.
pub fn load_snapshot<R: DeserializeOwned>(path: &Path) -> Result<Vec<R>> {
    match std::fs::read_to_string(path) {
        Ok(raw) => serde_json::from_str(&raw)
            .with_context(|| format!("corrupt snapshot file {}", path.display())),
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(error) => {
            Err(error).with_context(|| format!("failed to read snapshot {}", path.display()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(class_number: &str, term_code: &str, keyword: &str) -> CourseListing {
        CourseListing {
            class_number: class_number.to_string(),
            term_code: term_code.to_string(),
            keyword: keyword.to_string(),
            scraped_at: "2026-01-15T09:30:00".to_string(),
            retry_attempt: 0,
        }
    }

    fn detail(id_class: &str, title: &str) -> CourseDetail {
        CourseDetail {
            id: format!("cn{id_class}tc0975"),
            course_dept: "CS".to_string(),
            course_code: "1101".to_string(),
            class_section: "01".to_string(),
            course_title: title.to_string(),
            school: "Engineering".to_string(),
            career: "Undergraduate".to_string(),
            class_type: "Lecture".to_string(),
            credit_hours: "3".to_string(),
            grading_basis: "Graded".to_string(),
            consent: "None".to_string(),
            term_year: "2026".to_string(),
            term_season: "Fall".to_string(),
            session: "Regular".to_string(),
            dates: "08/26 - 12/10".to_string(),
            requirements: "None".to_string(),
            description: None,
            notes: None,
            status: "Open".to_string(),
            capacity: "100".to_string(),
            enrolled: "50".to_string(),
            wl_capacity: "10".to_string(),
            wl_occupied: "0".to_string(),
            attributes: None,
            meeting_days: vec![],
            meeting_times: vec![],
            meeting_dates: vec![],
            instructors: vec![],
        }
    }

    #[test]
    fn listing_duplicates_are_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("listings.json");
        let mut persister = BatchPersister::<ListingMerge>::load(&path, 10).unwrap();

        persister.accumulate(listing("12345", "0975", "101"));
        persister.accumulate(listing("12345", "0975", "202"));

        assert_eq!(persister.len(), 1);
        assert_eq!(persister.get("12345:0975").unwrap().keyword, "101");
    }

    #[test]
    fn detail_records_are_replaced_wholesale() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("details.json");
        let mut persister = BatchPersister::<DetailMerge>::load(&path, 10).unwrap();

        persister.accumulate(detail("12345", "Old Title"));
        persister.accumulate(detail("12345", "New Title"));

        assert_eq!(persister.len(), 1);
        assert_eq!(persister.get("cn12345tc0975").unwrap().course_title, "New Title");
    }

    #[test]
    fn flush_is_due_at_batch_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("listings.json");
        let mut persister = BatchPersister::<ListingMerge>::load(&path, 3).unwrap();

        persister.accumulate(listing("1", "0975", "101"));
        persister.accumulate(listing("2", "0975", "101"));
        assert!(!persister.flush_if_due().unwrap());
        assert!(!path.exists());

        persister.accumulate(listing("3", "0975", "101"));
        assert!(persister.flush_if_due().unwrap());
        assert!(path.exists());

        // counter resets after a flush
        persister.accumulate(listing("4", "0975", "101"));
        assert!(!persister.flush_if_due().unwrap());
    }

    #[test]
    fn final_flush_writes_even_with_no_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("listings.json");
        let mut persister = BatchPersister::<ListingMerge>::load(&path, 10).unwrap();

        persister.flush_final().unwrap();
        let stored: Vec<CourseListing> = load_snapshot(&path).unwrap();
        assert!(stored.is_empty());
    }

    #[test]
    fn snapshot_round_trip_preserves_existing_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("listings.json");

        {
            let mut persister = BatchPersister::<ListingMerge>::load(&path, 10).unwrap();
            persister.accumulate(listing("12345", "0975", "101"));
            persister.flush_final().unwrap();
        }

        // A second run seeds from disk and keeps merging on top.
        let mut persister = BatchPersister::<ListingMerge>::load(&path, 10).unwrap();
        assert_eq!(persister.len(), 1);
        persister.accumulate(listing("12345", "0975", "999"));
        persister.accumulate(listing("67890", "0975", "101"));
        persister.flush_final().unwrap();

        let stored: Vec<CourseListing> = load_snapshot(&path).unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].class_number, "12345");
        assert_eq!(stored[0].keyword, "101");
        assert_eq!(stored[1].class_number, "67890");
    }

    #[test]
    fn snapshot_on_disk_reflects_last_flush_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("listings.json");
        let mut persister = BatchPersister::<ListingMerge>::load(&path, 1).unwrap();

        persister.accumulate(listing("1", "0975", "101"));
        persister.flush_if_due().unwrap();

        // Accumulated but never flushed: a crash here must leave only the
        // flushed state on disk.
        persister.accumulate(listing("2", "0975", "101"));

        let stored: Vec<CourseListing> = load_snapshot(&path).unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].class_number, "1");
    }

    #[test]
    fn missing_snapshot_is_empty_store() {
        let stored: Vec<CourseListing> =
            load_snapshot(Path::new("/nonexistent/listings.json")).unwrap();
        assert!(stored.is_empty());
    }
}
