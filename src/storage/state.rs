//! Durable account state.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{StorageConfig, StorageError};
use crate::models::{MonthlySpendState, StoredSlot};

/// Everything restored on startup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistedState {
    /// Order id to last known delivery slot
    #[serde(default)]
    pub stored_delivery_slots: BTreeMap<String, StoredSlot>,

    #[serde(default)]
    pub monthly_spend: MonthlySpendState,
}

/// Reads and writes [`PersistedState`] as a single JSON document.
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn for_config(config: &StorageConfig) -> Self {
        Self::new(config.state_file())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the stored state; a missing file yields the default state.
    pub fn load(&self) -> Result<PersistedState, StorageError> {
        if !self.path.exists() {
            debug!("No stored state at {:?}", self.path);
            return Ok(PersistedState::default());
        }

        let reader = BufReader::new(File::open(&self.path)?);
        let state: PersistedState = serde_json::from_reader(reader)?;
        info!(
            "Loaded state: {} stored slots, spend month {:?}",
            state.stored_delivery_slots.len(),
            state.monthly_spend.month_key
        );
        Ok(state)
    }

    /// Write the state, replacing the previous file.
    ///
    /// Goes through a sibling temp file and a rename.
    pub fn save(&self, state: &PersistedState) -> Result<(), StorageError> {
        let parent = self
            .path
            .parent()
            .ok_or_else(|| StorageError::InvalidPath(self.path.display().to_string()))?;
        fs::create_dir_all(parent)?;

        let tmp = self.path.with_extension("json.tmp");
        {
            let mut writer = BufWriter::new(File::create(&tmp)?);
            serde_json::to_writer_pretty(&mut writer, state)?;
            writer.flush()?;
        }
        fs::rename(&tmp, &self.path)?;

        debug!("Saved state to {:?}", self.path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn sample_state() -> PersistedState {
        let mut state = PersistedState::default();
        state.stored_delivery_slots.insert(
            "1001".to_string(),
            StoredSlot {
                start: "2025-06-01T10:00:00+02:00".to_string(),
                end: "2025-06-01T11:00:00+02:00".to_string(),
            },
        );
        state.monthly_spend.total = 1520.5;
        state.monthly_spend.month_key = Some("2025-06".to_string());
        state
            .monthly_spend
            .processed_order_ids
            .insert("1001".to_string());
        state
    }

    #[test]
    fn test_load_missing_is_default() {
        let temp_dir = TempDir::new().unwrap();
        let store = StateStore::new(temp_dir.path().join("state/account_state.json"));
        assert_eq!(store.load().unwrap(), PersistedState::default());
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let config = StorageConfig::new(temp_dir.path().to_path_buf());
        let store = StateStore::for_config(&config);

        store.save(&sample_state()).unwrap();
        assert!(store.path().exists());
        assert_eq!(store.load().unwrap(), sample_state());
    }

    #[test]
    fn test_save_overwrites() {
        let temp_dir = TempDir::new().unwrap();
        let store = StateStore::new(temp_dir.path().join("account_state.json"));

        store.save(&sample_state()).unwrap();
        store.save(&PersistedState::default()).unwrap();
        assert_eq!(store.load().unwrap(), PersistedState::default());
    }

    #[test]
    fn test_wire_format() {
        let temp_dir = TempDir::new().unwrap();
        let store = StateStore::new(temp_dir.path().join("account_state.json"));
        store.save(&sample_state()).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(
            raw["stored_delivery_slots"]["1001"]["start"],
            "2025-06-01T10:00:00+02:00"
        );
        assert_eq!(raw["monthly_spend"]["monthly_total"], 1520.5);
        assert_eq!(raw["monthly_spend"]["current_month"], "2025-06");
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("account_state.json");
        fs::write(&path, "{not json").unwrap();

        let result = StateStore::new(path).load();
        assert!(matches!(result, Err(StorageError::Json(_))));
    }
}
