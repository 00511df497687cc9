//! Theaters, sub-units and direct shifts of the warbar or health pools
//!
//! Every shift goes through the distribution engine so that
//! `warbar == unassigned + Σ theater values` and
//! `health == unassigned_hp + Σ sub-unit hp` hold after each call.

use chrono::{DateTime, Utc};

use super::model::Conflict;
use crate::core::error::{invalid, EngineError, Result};
use crate::core::types::{Side, SubUnitId, TheaterId, Winner};
use crate::frontline::{CascadeReport, ShiftReport, SubUnit, Theater};

/// Where a turn's damage landed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FrontEffect {
    #[default]
    None,
    Bar(ShiftReport),
    Health { side: Side, report: CascadeReport },
}

impl Conflict {
    fn require_bar_mode(&self) -> Result<()> {
        if self.mode.is_attrition() {
            return Err(EngineError::InvalidTransition(format!(
                "conflict {} tracks health pools, not a warbar",
                self.id
            )));
        }
        Ok(())
    }

    fn require_attrition_mode(&self) -> Result<()> {
        if !self.mode.is_attrition() {
            return Err(EngineError::InvalidTransition(format!(
                "conflict {} has no health pools in {} mode",
                self.id, self.mode
            )));
        }
        Ok(())
    }

    fn theater_not_found(&self, theater: TheaterId) -> EngineError {
        EngineError::TheaterNotFound {
            conflict: self.id,
            theater,
        }
    }

    /// Clamp a signed shift so the bar stays in bounds, then distribute it
    pub(crate) fn apply_bar_shift(&mut self, shift: i32) -> ShiftReport {
        let (lo, hi) = self.bar_bounds();
        let target = (self.warbar + shift).clamp(lo, hi);
        let report = self.board.apply_shift(target - self.warbar);
        self.warbar = self.board.total();
        report
    }

    /// Damage one side's pool, never below zero
    pub(crate) fn apply_health_damage(&mut self, side: Side, amount: i32) -> CascadeReport {
        let amount = amount.min(*self.health.get(side)).max(0);
        let report = self.units.get_mut(side).apply_damage(amount);
        *self.health.get_mut(side) -= amount;
        report
    }

    /// Heal one side's pool, never above its maximum
    pub(crate) fn apply_health_heal(&mut self, side: Side, amount: i32) -> CascadeReport {
        let room = *self.max_health.get(side) - *self.health.get(side);
        let amount = amount.min(room).max(0);
        let report = self.units.get_mut(side).apply_heal(amount);
        *self.health.get_mut(side) += amount;
        report
    }

    /// Conclude if the bar or a health pool has reached its bound
    pub(crate) fn check_conclusion(&mut self, now: DateTime<Utc>) -> Option<Winner> {
        if self.concluded {
            return self.victor;
        }
        let victor = if self.mode.is_attrition() {
            if *self.health.get(Side::Defender) <= 0 {
                Some(Winner::Attacker)
            } else if *self.health.get(Side::Attacker) <= 0 {
                Some(Winner::Defender)
            } else {
                None
            }
        } else if self.warbar >= self.max_value {
            Some(Winner::Attacker)
        } else if !self.mode.is_one_way() && self.warbar <= -self.max_value {
            Some(Winner::Defender)
        } else {
            None
        };
        if let Some(victor) = victor {
            self.conclude(victor, now);
        }
        victor
    }

    pub(crate) fn conclude(&mut self, victor: Winner, now: DateTime<Utc>) {
        self.concluded = true;
        self.victor = Some(victor);
        self.auto_resolve.enabled = false;
        self.last_update = now;
        tracing::info!("Conflict {} '{}' concluded: {}", self.id, self.name, victor);
    }

    /// GM shift of the warbar, positive towards the attacker
    pub fn shift_warbar(&mut self, shift: i32, now: DateTime<Utc>) -> Result<ShiftReport> {
        self.ensure_open()?;
        self.require_bar_mode()?;
        if shift == 0 {
            return invalid("warbar shift must not be zero");
        }
        let report = self.apply_bar_shift(shift);
        self.last_update = now;
        self.check_conclusion(now);
        Ok(report)
    }

    /// GM damage against one side's health pool
    pub fn damage_side(&mut self, side: Side, amount: i32, now: DateTime<Utc>) -> Result<CascadeReport> {
        self.ensure_open()?;
        self.require_attrition_mode()?;
        if amount <= 0 {
            return invalid(format!("damage must be positive, got {}", amount));
        }
        let report = self.apply_health_damage(side, amount);
        self.last_update = now;
        self.check_conclusion(now);
        Ok(report)
    }

    pub fn heal_side(&mut self, side: Side, amount: i32, now: DateTime<Utc>) -> Result<CascadeReport> {
        self.ensure_open()?;
        self.require_attrition_mode()?;
        if amount <= 0 {
            return invalid(format!("healing must be positive, got {}", amount));
        }
        let report = self.apply_health_heal(side, amount);
        self.last_update = now;
        Ok(report)
    }

    pub fn add_theater(&mut self, name: &str, max_value: i32, now: DateTime<Utc>) -> Result<TheaterId> {
        self.ensure_open()?;
        self.require_bar_mode()?;
        let name = name.trim();
        if name.is_empty() {
            return invalid("theater name must not be empty");
        }
        if max_value <= 0 {
            return invalid(format!("theater max value must be positive, got {}", max_value));
        }
        let id = self.board.add(name, max_value);
        self.last_update = now;
        tracing::debug!("Theater {} '{}' opened in conflict {}", id, name, self.id);
        Ok(id)
    }

    /// Remove a theater; its value stays in the warbar via the pool
    pub fn remove_theater(&mut self, id: TheaterId, now: DateTime<Utc>) -> Result<Theater> {
        self.ensure_open()?;
        let removed = self.board.remove(id).ok_or_else(|| self.theater_not_found(id))?;
        self.last_update = now;
        Ok(removed)
    }

    /// Close an active theater by GM decision, keeping its value
    pub fn close_theater(
        &mut self,
        id: TheaterId,
        captured_by: Option<Side>,
        now: DateTime<Utc>,
    ) -> Result<()> {
        self.ensure_open()?;
        let conflict = self.id;
        let theater = self.board.get_mut(id).ok_or(EngineError::TheaterNotFound { conflict, theater: id })?;
        if !theater.is_active() {
            return Err(EngineError::InvalidTransition(format!("theater {} is already closed", id)));
        }
        theater.close(captured_by);
        self.last_update = now;
        Ok(())
    }

    /// Reopen a closed theater at zero; the warbar loses its old value
    pub fn reopen_theater(&mut self, id: TheaterId, now: DateTime<Utc>) -> Result<()> {
        self.ensure_open()?;
        let theater = self.board.get(id).ok_or_else(|| self.theater_not_found(id))?;
        if theater.is_active() {
            return Err(EngineError::InvalidTransition(format!("theater {} is already active", id)));
        }
        let warbar = self.board.total() - theater.current_value;
        let (lo, hi) = self.bar_bounds();
        if warbar < lo || warbar > hi {
            return Err(EngineError::InvalidTransition(format!(
                "reopening theater {} would put the warbar at {}",
                id, warbar
            )));
        }
        if let Some(theater) = self.board.get_mut(id) {
            theater.reopen();
        }
        self.warbar = warbar;
        self.last_update = now;
        tracing::info!("Theater {} reopened in conflict {}", id, self.id);
        Ok(())
    }

    /// Shift one theater only; what the bar or the theater cannot take is dropped
    pub fn shift_theater(&mut self, id: TheaterId, shift: i32, now: DateTime<Utc>) -> Result<ShiftReport> {
        self.ensure_open()?;
        if shift == 0 {
            return invalid("theater shift must not be zero");
        }
        match self.board.get(id) {
            None => return Err(self.theater_not_found(id)),
            Some(theater) if !theater.is_active() => {
                return Err(EngineError::InvalidTransition(format!("theater {} is closed", id)));
            }
            Some(_) => {}
        }
        let (lo, hi) = self.bar_bounds();
        let bounded = shift.clamp(lo - self.warbar, hi - self.warbar);
        let mut report = self
            .board
            .shift_one(id, bounded)
            .ok_or_else(|| self.theater_not_found(id))?;
        report.requested = shift;
        report.overflow += (shift - bounded).abs();
        self.warbar = self.board.total();
        self.last_update = now;
        self.check_conclusion(now);
        Ok(report)
    }

    /// Carve a sub-unit out of a side's unassigned health
    pub fn add_sub_unit(&mut self, side: Side, name: &str, max_hp: i32, now: DateTime<Utc>) -> Result<SubUnitId> {
        self.ensure_open()?;
        self.require_attrition_mode()?;
        let name = name.trim();
        if name.is_empty() {
            return invalid("sub-unit name must not be empty");
        }
        let id = self.units.get_mut(side).add(name, max_hp)?;
        self.last_update = now;
        tracing::debug!("Sub-unit {} '{}' raised for the {}", id, name, side);
        Ok(id)
    }

    pub fn remove_sub_unit(&mut self, side: Side, id: SubUnitId, now: DateTime<Utc>) -> Result<SubUnit> {
        self.ensure_open()?;
        let removed = self
            .units
            .get_mut(side)
            .remove(id)
            .ok_or(EngineError::SubUnitNotFound { side, unit: id })?;
        self.last_update = now;
        Ok(removed)
    }

    /// Damage one sub-unit; returns the hp it lost
    pub fn damage_sub_unit(&mut self, side: Side, id: SubUnitId, amount: i32, now: DateTime<Utc>) -> Result<i32> {
        self.ensure_open()?;
        self.require_attrition_mode()?;
        if amount <= 0 {
            return invalid(format!("damage must be positive, got {}", amount));
        }
        let taken = self
            .units
            .get_mut(side)
            .damage_unit(id, amount)
            .ok_or(EngineError::SubUnitNotFound { side, unit: id })?;
        *self.health.get_mut(side) -= taken;
        self.last_update = now;
        self.check_conclusion(now);
        Ok(taken)
    }

    /// Heal one sub-unit; returns the hp it regained
    pub fn heal_sub_unit(&mut self, side: Side, id: SubUnitId, amount: i32, now: DateTime<Utc>) -> Result<i32> {
        self.ensure_open()?;
        self.require_attrition_mode()?;
        if amount <= 0 {
            return invalid(format!("healing must be positive, got {}", amount));
        }
        let room = *self.max_health.get(side) - *self.health.get(side);
        let healed = self
            .units
            .get_mut(side)
            .heal_unit(id, amount.min(room))
            .ok_or(EngineError::SubUnitNotFound { side, unit: id })?;
        *self.health.get_mut(side) += healed;
        self.last_update = now;
        Ok(healed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conflict::{ConflictBuilder, ConflictMode};
    use crate::core::types::ConflictId;
    use crate::frontline::{SubUnitStatus, TheaterStatus};
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 1, 8, 0, 0).unwrap()
    }

    fn bar(mode: ConflictMode) -> Conflict {
        ConflictBuilder::new("Aurora", "Kestrel")
            .mode(mode)
            .build(ConflictId(1), now())
            .unwrap()
    }

    fn attrition() -> Conflict {
        bar(ConflictMode::AttritionManual)
    }

    #[test]
    fn test_shift_without_theaters_goes_to_pool() {
        let mut c = bar(ConflictMode::PushPullManual);
        let report = c.shift_warbar(-30, now()).unwrap();
        assert_eq!(c.warbar, -30);
        assert_eq!(c.board.unassigned, -30);
        assert_eq!(report.applied_total(), -30);
        assert!(c.check_invariants().is_ok());
    }

    #[test]
    fn test_shift_clamps_and_concludes() {
        let mut c = bar(ConflictMode::PushPullManual);
        c.add_theater("North", 50, now()).unwrap();
        c.shift_warbar(90, now()).unwrap();
        let report = c.shift_warbar(40, now()).unwrap();
        assert_eq!(c.warbar, 100);
        assert_eq!(report.applied_total(), 10);
        assert!(c.concluded);
        assert_eq!(c.victor, Some(Winner::Attacker));
        assert!(c.shift_warbar(1, now()).is_err());
    }

    #[test]
    fn test_one_way_floor() {
        let mut c = bar(ConflictMode::OneWayManual);
        c.shift_warbar(-25, now()).unwrap();
        assert_eq!(c.warbar, 0);
        assert!(!c.concluded);
    }

    #[test]
    fn test_theater_ops_keep_warbar_in_sync() {
        let mut c = bar(ConflictMode::PushPullManual);
        let north = c.add_theater("North", 20, now()).unwrap();
        let south = c.add_theater("South", 50, now()).unwrap();
        c.shift_warbar(31, now()).unwrap();
        assert_eq!(c.board.get(north).unwrap().current_value, 16);
        assert_eq!(c.board.get(south).unwrap().current_value, 15);

        c.shift_theater(north, 10, now()).unwrap();
        assert_eq!(c.board.get(north).unwrap().status, TheaterStatus::Closed);
        assert_eq!(c.warbar, 35);
        assert!(c.check_invariants().is_ok());

        c.reopen_theater(north, now()).unwrap();
        assert_eq!(c.warbar, 15);
        assert!(c.reopen_theater(north, now()).is_err());

        c.remove_theater(south, now()).unwrap();
        assert_eq!(c.warbar, 15);
        assert_eq!(c.board.unassigned, 15);
        assert!(c.check_invariants().is_ok());
    }

    #[test]
    fn test_theater_errors() {
        let mut c = bar(ConflictMode::PushPullManual);
        assert!(matches!(
            c.shift_theater(TheaterId(4), 5, now()),
            Err(EngineError::TheaterNotFound { .. })
        ));
        assert!(c.add_theater("Empty", 0, now()).is_err());
        assert!(matches!(
            attrition().add_theater("North", 10, now()),
            Err(EngineError::InvalidTransition(_))
        ));
    }

    #[test]
    fn test_manual_close_keeps_value() {
        let mut c = bar(ConflictMode::PushPullManual);
        let id = c.add_theater("North", 50, now()).unwrap();
        c.shift_warbar(12, now()).unwrap();
        c.close_theater(id, Some(Side::Attacker), now()).unwrap();
        assert_eq!(c.warbar, 12);
        assert!(c.close_theater(id, None, now()).is_err());
        // closed theater takes nothing, the pool does
        c.shift_warbar(5, now()).unwrap();
        assert_eq!(c.board.unassigned, 5);
    }

    #[test]
    fn test_closed_theater_refuses_targeted_shift() {
        let mut c = bar(ConflictMode::PushPullManual);
        let id = c.add_theater("North", 50, now()).unwrap();
        c.close_theater(id, None, now()).unwrap();
        let stamped = c.last_update;
        let later = now() + chrono::Duration::hours(2);
        assert!(matches!(
            c.shift_theater(id, 5, later),
            Err(EngineError::InvalidTransition(_))
        ));
        assert_eq!(c.warbar, 0);
        assert_eq!(c.last_update, stamped);
    }

    #[test]
    fn test_sub_unit_damage_tracks_health() {
        let mut c = attrition();
        let fleet = c.add_sub_unit(Side::Defender, "Third Fleet", 30, now()).unwrap();
        c.damage_side(Side::Defender, 80, now()).unwrap();
        assert_eq!(c.health.defender, 20);
        assert_eq!(c.units.defender.get(fleet).unwrap().current_hp, 20);

        assert_eq!(c.damage_sub_unit(Side::Defender, fleet, 50, now()).unwrap(), 20);
        assert_eq!(c.units.defender.get(fleet).unwrap().status, SubUnitStatus::Neutralized);
        assert_eq!(c.health.defender, 0);
        assert_eq!(c.victor, Some(Winner::Attacker));
        assert!(c.check_invariants().is_ok());
    }

    #[test]
    fn test_heal_never_exceeds_max_health() {
        let mut c = attrition();
        let fleet = c.add_sub_unit(Side::Attacker, "Vanguard", 40, now()).unwrap();
        c.damage_side(Side::Attacker, 70, now()).unwrap();
        assert_eq!(c.health.attacker, 30);

        c.heal_side(Side::Attacker, 500, now()).unwrap();
        assert_eq!(c.health.attacker, 100);
        assert_eq!(c.units.attacker.get(fleet).unwrap().current_hp, 40);
        assert_eq!(c.heal_sub_unit(Side::Attacker, fleet, 5, now()).unwrap(), 0);
        assert!(c.check_invariants().is_ok());
    }

    #[test]
    fn test_removed_unit_returns_hp_to_pool() {
        let mut c = attrition();
        let fleet = c.add_sub_unit(Side::Defender, "Reserve", 25, now()).unwrap();
        c.damage_sub_unit(Side::Defender, fleet, 5, now()).unwrap();
        let removed = c.remove_sub_unit(Side::Defender, fleet, now()).unwrap();
        assert_eq!(removed.current_hp, 20);
        assert_eq!(c.units.defender.unassigned_hp, 95);
        assert_eq!(c.health.defender, 95);
        assert!(c.check_invariants().is_ok());
        assert!(c.remove_sub_unit(Side::Defender, fleet, now()).is_err());
    }

    #[test]
    fn test_sub_unit_errors() {
        let mut c = attrition();
        assert!(c.add_sub_unit(Side::Attacker, "Huge", 101, now()).is_err());
        assert!(matches!(
            c.damage_sub_unit(Side::Attacker, SubUnitId(9), 3, now()),
            Err(EngineError::SubUnitNotFound { .. })
        ));
        assert!(c.damage_side(Side::Attacker, 0, now()).is_err());
        assert!(bar(ConflictMode::PushPullManual)
            .add_sub_unit(Side::Attacker, "Fleet", 10, now())
            .is_err());
    }
}
