//! Warbar Engine - conflict resolution for turn-based faction wars
//!
//! Combat modifiers and momentum, damage distribution over theaters and
//! sub-units, AI-controlled factions and covert operations. Storage and
//! presentation are left to the host through [`store`] and plain report
//! types.

pub mod combat;
pub mod conflict;
pub mod core;
pub mod engine;
pub mod frontline;
pub mod intrigue;
pub mod npc;
pub mod store;

pub use engine::{Engine, OperationReport};
