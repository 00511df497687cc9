//! JSON files in a data directory

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use super::{ConflictRepository, OperationRepository};
use crate::conflict::Conflict;
use crate::core::error::Result;
use crate::intrigue::Operation;

const CONFLICTS_FILE: &str = "conflicts.json";
const OPERATIONS_FILE: &str = "operations.json";

/// `conflicts.json` and `operations.json` under one directory
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    /// Use `dir`, creating it if needed
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn read<T: DeserializeOwned>(&self, file: &str) -> Result<Vec<T>> {
        let path = self.dir.join(file);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let contents = fs::read_to_string(&path)?;
        if contents.trim().is_empty() {
            return Ok(Vec::new());
        }
        let records: Vec<T> = serde_json::from_str(&contents)?;
        tracing::debug!("Loaded {} records from {:?}", records.len(), path);
        Ok(records)
    }

    /// Write beside the target, then rename over it
    fn write<T: Serialize>(&self, file: &str, records: &[T]) -> Result<()> {
        let path = self.dir.join(file);
        let staging = self.dir.join(format!("{}.tmp", file));
        let contents = serde_json::to_string_pretty(records)?;
        fs::write(&staging, contents)?;
        if let Err(e) = fs::rename(&staging, &path) {
            let _ = fs::remove_file(&staging);
            return Err(e.into());
        }
        tracing::debug!("Saved {} records to {:?}", records.len(), path);
        Ok(())
    }
}

impl ConflictRepository for JsonFileStore {
    fn load_conflicts(&self) -> Result<Vec<Conflict>> {
        self.read(CONFLICTS_FILE)
    }

    fn save_conflicts(&mut self, conflicts: &[Conflict]) -> Result<()> {
        self.write(CONFLICTS_FILE, conflicts)
    }
}

impl OperationRepository for JsonFileStore {
    fn load_operations(&self) -> Result<Vec<Operation>> {
        self.read(OPERATIONS_FILE)
    }

    fn save_operations(&mut self, operations: &[Operation]) -> Result<()> {
        self.write(OPERATIONS_FILE, operations)
    }
}
