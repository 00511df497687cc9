//! In-memory store for tests and embedding hosts

use super::{ConflictRepository, OperationRepository};
use crate::conflict::Conflict;
use crate::core::error::Result;
use crate::intrigue::Operation;

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    pub conflicts: Vec<Conflict>,
    pub operations: Vec<Operation>,
    /// Number of successful saves, both collections
    pub saves: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_conflicts(conflicts: Vec<Conflict>) -> Self {
        Self {
            conflicts,
            ..Self::default()
        }
    }
}

impl ConflictRepository for MemoryStore {
    fn load_conflicts(&self) -> Result<Vec<Conflict>> {
        Ok(self.conflicts.clone())
    }

    fn save_conflicts(&mut self, conflicts: &[Conflict]) -> Result<()> {
        self.conflicts = conflicts.to_vec();
        self.saves += 1;
        Ok(())
    }
}

impl OperationRepository for MemoryStore {
    fn load_operations(&self) -> Result<Vec<Operation>> {
        Ok(self.operations.clone())
    }

    fn save_operations(&mut self, operations: &[Operation]) -> Result<()> {
        self.operations = operations.to_vec();
        self.saves += 1;
        Ok(())
    }
}
