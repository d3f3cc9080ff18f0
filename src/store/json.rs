//! JSON file-backed record store.
//!
//! The whole store is a single document:
//!
//! ```text
//! { "version": 1, "next_id": 3, "records": [ { "id": 1, ... }, ... ] }
//! ```
//!
//! A missing file is an empty store. Writes go to a sibling `.tmp` file that is
//! renamed over the original, so a failed write leaves the previous document
//! intact and never a partial record.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::domain::{FitRecord, RecordId, UserId};
use crate::error::StoreError;
use crate::store::FitStore;

const STORE_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct StoreDocument {
    version: u32,
    next_id: u64,
    records: Vec<FitRecord>,
}

impl Default for StoreDocument {
    fn default() -> Self {
        Self {
            version: STORE_VERSION,
            next_id: 1,
            records: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<StoreDocument, StoreError> {
        if !self.path.exists() {
            return Ok(StoreDocument::default());
        }
        let file = File::open(&self.path)?;
        let doc: StoreDocument = serde_json::from_reader(BufReader::new(file))?;
        if doc.version != STORE_VERSION {
            return Err(StoreError::Corrupt(format!(
                "unsupported store version {} in '{}'",
                doc.version,
                self.path.display()
            )));
        }
        Ok(doc)
    }

    fn save(&self, doc: &StoreDocument) -> Result<(), StoreError> {
        let tmp = self.tmp_path();
        let saved = write_document(&tmp, doc).and_then(|()| fs::rename(&tmp, &self.path).map_err(StoreError::from));
        if saved.is_err() {
            fs::remove_file(&tmp).ok();
        }
        saved
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "quadfit-store".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

fn write_document(path: &Path, doc: &StoreDocument) -> Result<(), StoreError> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, doc)?;
    writer.flush()?;
    Ok(())
}

impl FitStore for JsonFileStore {
    fn create_fit_record(
        &mut self,
        owner: &UserId,
        dataset_name: &str,
        serialized_params: &str,
    ) -> Result<RecordId, StoreError> {
        let mut doc = self.load()?;
        let id = RecordId(doc.next_id);
        doc.next_id += 1;
        doc.records.push(FitRecord {
            id,
            owner: owner.clone(),
            dataset_name: dataset_name.to_string(),
            params: serialized_params.to_string(),
            created_at: Utc::now(),
        });
        self.save(&doc)?;
        log::debug!("stored fit record {id} in '{}'", self.path.display());
        Ok(id)
    }

    fn list_fit_records(&self, owner: &UserId) -> Result<Vec<FitRecord>, StoreError> {
        let doc = self.load()?;
        Ok(doc.records.into_iter().filter(|r| &r.owner == owner).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_store_path(tag: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        std::env::temp_dir().join(format!("quadfit-{tag}-{}-{nanos}.json", std::process::id()))
    }

    #[test]
    fn missing_file_is_an_empty_store() {
        let store = JsonFileStore::new(temp_store_path("missing"));
        assert!(store.list_fit_records(&UserId::new("alice")).unwrap().is_empty());
    }

    #[test]
    fn records_survive_reopening() {
        let path = temp_store_path("reopen");
        let alice = UserId::new("alice");

        let mut store = JsonFileStore::new(&path);
        let first = store.create_fit_record(&alice, "parabola", r#"{"version":1,"a":2.0,"b":-3.0,"c":5.0}"#).unwrap();
        let second = store.create_fit_record(&UserId::new("bob"), "other", "1, 2, 3").unwrap();
        assert_eq!(first, RecordId(1));
        assert_eq!(second, RecordId(2));

        let reopened = JsonFileStore::new(&path);
        let records = reopened.list_fit_records(&alice).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].dataset_name, "parabola");
        assert_eq!(records[0].fit_params().unwrap().coefficients(), [2.0, -3.0, 5.0]);
        assert!(!reopened.tmp_path().exists());

        fs::remove_file(&path).ok();
    }

    #[test]
    fn unknown_store_version_is_corrupt() {
        let path = temp_store_path("version");
        fs::write(&path, r#"{"version":99,"next_id":1,"records":[]}"#).unwrap();
        let store = JsonFileStore::new(&path);
        assert!(matches!(
            store.list_fit_records(&UserId::new("alice")),
            Err(StoreError::Corrupt(_))
        ));
        fs::remove_file(&path).ok();
    }

    #[test]
    fn garbage_file_is_a_json_error() {
        let path = temp_store_path("garbage");
        fs::write(&path, "not json").unwrap();
        let mut store = JsonFileStore::new(&path);
        assert!(matches!(
            store.create_fit_record(&UserId::new("alice"), "x", "{}"),
            Err(StoreError::Json(_))
        ));
        assert_eq!(fs::read_to_string(&path).unwrap(), "not json");
        fs::remove_file(&path).ok();
    }

    #[test]
    fn failed_save_leaves_no_temp_file() {
        // Renaming a file over a directory fails after the temp file is written.
        let path = temp_store_path("dir-target");
        fs::create_dir(&path).unwrap();
        let store = JsonFileStore::new(&path);

        assert!(matches!(store.save(&StoreDocument::default()), Err(StoreError::Io(_))));
        assert!(!store.tmp_path().exists());
        assert!(path.is_dir());

        fs::remove_dir(&path).ok();
    }
}
