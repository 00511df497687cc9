//! Damage and distribution across the unassigned pool, theaters and sub-units

pub mod spill;
pub mod sub_unit;
pub mod theater;

pub use spill::{cancel_opposite, spill_evenly, Absorber, Spill};
pub use sub_unit::{CascadeReport, SideUnits, SubUnit, SubUnitStatus};
pub use theater::{ShiftReport, Theater, TheaterBoard, TheaterStatus};
