//! One-time upgrade of stored conflicts to the current layout
//!
//! Runs at load time. Older records may lack health pools or the
//! unassigned shares, or carry values outside today's bounds; the
//! upgrade rebuilds the derived pools from what is stored so every
//! invariant holds afterwards.

use super::model::{Conflict, SCHEMA_VERSION};
use crate::combat::constants::{STRATEGIC_MOMENTUM_CAP, TACTICAL_MOMENTUM_CAP};
use crate::core::config::ConflictDefaults;
use crate::core::error::Result;
use crate::core::types::{Side, Winner};
use crate::frontline::{SubUnitStatus, TheaterStatus};

/// Upgrade one conflict; returns whether anything was done
pub fn migrate_conflict(conflict: &mut Conflict, defaults: &ConflictDefaults) -> Result<bool> {
    if conflict.schema_version >= SCHEMA_VERSION {
        return Ok(false);
    }
    let from = conflict.schema_version;

    if conflict.max_value <= 0 {
        conflict.max_value = defaults.max_value;
    }
    let (lo, hi) = conflict.bar_bounds();
    conflict.warbar = conflict.warbar.clamp(lo, hi);

    for theater in &mut conflict.board.theaters {
        if theater.max_value <= 0 {
            theater.max_value = conflict.max_value;
        }
        theater.current_value = theater.current_value.clamp(-theater.max_value, theater.max_value);
        if theater.current_value.abs() >= theater.max_value {
            if theater.status == TheaterStatus::Active {
                theater.close(Side::from_sign(theater.current_value));
            }
        } else if theater.status == TheaterStatus::Active {
            theater.captured_by = None;
        }
    }
    let assigned: i32 = conflict.board.theaters.iter().map(|t| t.current_value).sum();
    conflict.board.unassigned = conflict.warbar - assigned;

    conflict.tactical_momentum = conflict
        .tactical_momentum
        .clamp(-TACTICAL_MOMENTUM_CAP, TACTICAL_MOMENTUM_CAP);

    for side in Side::BOTH {
        let strategic = conflict.strategic_momentum.get_mut(side);
        *strategic = (*strategic).min(STRATEGIC_MOMENTUM_CAP);

        if *conflict.max_health.get(side) <= 0 {
            *conflict.max_health.get_mut(side) = defaults.max_health;
            if *conflict.health.get(side) <= 0 && !conflict.concluded {
                *conflict.health.get_mut(side) = defaults.max_health;
            }
        }

        let units = conflict.units.get_mut(side);
        for unit in &mut units.units {
            unit.max_hp = unit.max_hp.max(1);
            unit.current_hp = unit.current_hp.clamp(0, unit.max_hp);
            unit.status = if unit.current_hp == 0 {
                SubUnitStatus::Neutralized
            } else {
                SubUnitStatus::Active
            };
        }
        let in_units: i32 = units.units.iter().map(|u| u.current_hp).sum();

        let health = conflict.health.get_mut(side);
        *health = (*health).max(in_units);
        let max_health = conflict.max_health.get_mut(side);
        *max_health = (*max_health).max(*health);
        units.unassigned_hp = *health - in_units;
    }

    match (conflict.concluded, conflict.victor) {
        (true, None) => conflict.victor = Some(Winner::Stalemate),
        (false, Some(_)) => conflict.concluded = true,
        _ => {}
    }

    conflict.schema_version = SCHEMA_VERSION;
    conflict.check_invariants()?;
    tracing::info!(
        "Migrated conflict {} from schema {} to {} ({} theaters, {}+{} sub-units)",
        conflict.id,
        from,
        SCHEMA_VERSION,
        conflict.board.theaters.len(),
        conflict.units.attacker.units.len(),
        conflict.units.defender.units.len()
    );
    Ok(true)
}

/// Upgrade a loaded collection; returns how many records changed
pub fn migrate_all(conflicts: &mut [Conflict], defaults: &ConflictDefaults) -> Result<usize> {
    let mut count = 0;
    for conflict in conflicts.iter_mut() {
        if migrate_conflict(conflict, defaults)? {
            count += 1;
        }
    }
    if count > 0 {
        tracing::info!("Migration complete: {} conflicts upgraded", count);
    }
    Ok(count)
}
