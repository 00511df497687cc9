//! Persistence collaborator: whole-collection load and save
//!
//! The engine never reads or writes files itself. It is handed a
//! repository and always swaps complete collections through it.

pub mod json;
pub mod memory;

pub use json::JsonFileStore;
pub use memory::MemoryStore;

use crate::conflict::Conflict;
use crate::core::error::Result;
use crate::intrigue::Operation;

pub trait ConflictRepository {
    fn load_conflicts(&self) -> Result<Vec<Conflict>>;

    /// Replace the stored collection; on error the previous one is kept
    fn save_conflicts(&mut self, conflicts: &[Conflict]) -> Result<()>;
}

pub trait OperationRepository {
    fn load_operations(&self) -> Result<Vec<Operation>>;

    /// Replace the stored collection; on error the previous one is kept
    fn save_operations(&mut self, operations: &[Operation]) -> Result<()>;
}
