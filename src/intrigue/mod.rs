//! Covert operation resolver

pub mod effects;
pub mod kinds;
pub mod operation;
pub mod resolution;

pub use effects::{apply_effects, sabotage_reduction, OperationEffect};
pub use kinds::{OperationKind, OperationStatus, Scale, Security, Similarity, TargetStrength, Unrest};
pub use operation::{
    active_operations_by_faction, cooldown_remaining, find_operation, find_operation_mut,
    next_operation_id, operations_by_target, Circumstances, Operation, OperationBuilder, OperationFlags,
};
pub use resolution::{compute_modifiers, resolve, roll_detection, DetectionCause, DetectionCheck, Resolution};
