//! Conflict records and every state transition they go through

pub mod builder;
pub mod control;
pub mod fronts;
pub mod migration;
pub mod model;
pub mod resolution;

pub use builder::{next_conflict_id, ConflictBuilder};
pub use fronts::FrontEffect;
pub use migration::{migrate_all, migrate_conflict};
pub use model::{AutoResolve, AutoResolveCheck, Conflict, ConflictMode, SCHEMA_VERSION};
pub use resolution::{AutoTick, SideOrders, SideTurn, TurnReport};
