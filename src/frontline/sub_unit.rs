//! Sub-units: fleets and squads carved out of a side's health pool

use serde::{Deserialize, Serialize};

use super::spill::{cancel_opposite, spill_evenly, Absorber};
use crate::core::error::{invalid, Result};
use crate::core::types::SubUnitId;

/// Spill direction for damage
pub const DAMAGE: i32 = -1;
/// Spill direction for healing
pub const HEAL: i32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubUnitStatus {
    Active,
    Neutralized,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubUnit {
    pub id: SubUnitId,
    pub name: String,
    pub max_hp: i32,
    pub current_hp: i32,
    pub status: SubUnitStatus,
}

impl SubUnit {
    /// A fresh unit at full health
    pub fn new(id: SubUnitId, name: impl Into<String>, max_hp: i32) -> Self {
        Self {
            id,
            name: name.into(),
            max_hp,
            current_hp: max_hp,
            status: SubUnitStatus::Active,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == SubUnitStatus::Active
    }

    fn take_damage(&mut self, amount: i32) -> i32 {
        let taken = amount.min(self.current_hp).max(0);
        self.current_hp -= taken;
        if self.current_hp == 0 && self.is_active() {
            self.status = SubUnitStatus::Neutralized;
            tracing::info!("Sub-unit {} '{}' neutralized", self.id, self.name);
        }
        taken
    }

    fn restore(&mut self, amount: i32) -> i32 {
        let healed = amount.min(self.max_hp - self.current_hp).max(0);
        self.current_hp += healed;
        if self.current_hp > 0 && !self.is_active() {
            self.status = SubUnitStatus::Active;
            tracing::info!("Sub-unit {} '{}' back in action", self.id, self.name);
        }
        healed
    }
}

impl Absorber for SubUnit {
    fn accepts(&self, direction: i32) -> bool {
        if direction == DAMAGE {
            self.is_active() && self.current_hp > 0
        } else {
            self.current_hp < self.max_hp
        }
    }

    fn absorb(&mut self, direction: i32, amount: i32) -> i32 {
        if direction == DAMAGE {
            self.take_damage(amount)
        } else {
            self.restore(amount)
        }
    }
}

/// Where one damage or heal cascade ended up
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CascadeReport {
    /// Signed change of the side's health (negative for damage)
    pub requested: i32,
    /// Signed change of the unassigned pool
    pub pool_delta: i32,
    /// Signed change per unit that moved, in list order
    pub unit_deltas: Vec<(SubUnitId, i32)>,
    pub neutralized: Vec<SubUnitId>,
    pub reactivated: Vec<SubUnitId>,
}

impl CascadeReport {
    pub fn applied_total(&self) -> i32 {
        self.pool_delta + self.unit_deltas.iter().map(|(_, d)| d).sum::<i32>()
    }
}

/// One side's sub-units plus the health not assigned to any of them
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideUnits {
    pub unassigned_hp: i32,
    pub units: Vec<SubUnit>,
}

impl SideUnits {
    /// Everything unassigned, no units yet
    pub fn with_health(health: i32) -> Self {
        Self {
            unassigned_hp: health,
            units: Vec::new(),
        }
    }

    /// `unassigned_hp + Σ current_hp`, which must equal the side's health
    pub fn total(&self) -> i32 {
        self.unassigned_hp + self.units.iter().map(|u| u.current_hp).sum::<i32>()
    }

    pub fn get(&self, id: SubUnitId) -> Option<&SubUnit> {
        self.units.iter().find(|u| u.id == id)
    }

    pub fn get_mut(&mut self, id: SubUnitId) -> Option<&mut SubUnit> {
        self.units.iter_mut().find(|u| u.id == id)
    }

    /// Carve a new full-health unit out of the unassigned pool
    pub fn add(&mut self, name: impl Into<String>, max_hp: i32) -> Result<SubUnitId> {
        if max_hp <= 0 {
            return invalid(format!("sub-unit max hp must be positive, got {}", max_hp));
        }
        if max_hp > self.unassigned_hp {
            return invalid(format!(
                "sub-unit needs {} hp but only {} is unassigned",
                max_hp, self.unassigned_hp
            ));
        }
        let id = SubUnitId(self.units.iter().map(|u| u.id.0).max().unwrap_or(0) + 1);
        self.unassigned_hp -= max_hp;
        self.units.push(SubUnit::new(id, name, max_hp));
        Ok(id)
    }

    /// Remove a unit; its remaining hp returns to the pool
    pub fn remove(&mut self, id: SubUnitId) -> Option<SubUnit> {
        let index = self.units.iter().position(|u| u.id == id)?;
        let removed = self.units.remove(index);
        self.unassigned_hp += removed.current_hp;
        Some(removed)
    }

    /// Damage drains the pool first, then spreads over active units
    pub fn apply_damage(&mut self, amount: i32) -> CascadeReport {
        self.cascade(DAMAGE, amount)
    }

    /// Healing spreads over units below max hp; the rest returns to the pool
    pub fn apply_heal(&mut self, amount: i32) -> CascadeReport {
        self.cascade(HEAL, amount)
    }

    fn cascade(&mut self, direction: i32, amount: i32) -> CascadeReport {
        let mut report = CascadeReport {
            requested: direction * amount.max(0),
            ..CascadeReport::default()
        };
        if amount <= 0 {
            return report;
        }

        let consumed = cancel_opposite(&mut self.unassigned_hp, direction, amount);
        report.pool_delta = direction * consumed;

        let was_active: Vec<bool> = self.units.iter().map(|u| u.is_active()).collect();
        let spill = spill_evenly(&mut self.units, direction, amount - consumed);

        for (index, unit) in self.units.iter().enumerate() {
            if spill.taken[index] != 0 {
                report.unit_deltas.push((unit.id, direction * spill.taken[index]));
            }
            match (was_active[index], unit.is_active()) {
                (true, false) => report.neutralized.push(unit.id),
                (false, true) => report.reactivated.push(unit.id),
                _ => {}
            }
        }

        self.unassigned_hp += direction * spill.leftover;
        report.pool_delta += direction * spill.leftover;
        report
    }

    /// Damage one unit; returns the hp it actually lost
    pub fn damage_unit(&mut self, id: SubUnitId, amount: i32) -> Option<i32> {
        let unit = self.get_mut(id)?;
        if !unit.is_active() {
            return Some(0);
        }
        Some(unit.take_damage(amount))
    }

    /// Heal one unit; returns the hp it actually regained
    pub fn heal_unit(&mut self, id: SubUnitId, amount: i32) -> Option<i32> {
        let unit = self.get_mut(id)?;
        Some(unit.restore(amount))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn side(health: i32, units: &[i32]) -> SideUnits {
        let mut side = SideUnits::with_health(health);
        for (i, &hp) in units.iter().enumerate() {
            side.add(format!("Fleet {}", i + 1), hp).unwrap();
        }
        side
    }

    #[test]
    fn test_add_carves_from_pool() {
        let mut s = side(100, &[30, 20]);
        assert_eq!(s.unassigned_hp, 50);
        assert_eq!(s.total(), 100);
        assert!(s.add("Too big", 60).is_err());
        assert!(s.add("Empty", 0).is_err());
    }

    #[test]
    fn test_damage_drains_pool_first() {
        let mut s = side(100, &[30, 20]);
        let report = s.apply_damage(45);
        assert_eq!(s.unassigned_hp, 5);
        assert_eq!(report.pool_delta, -45);
        assert!(report.unit_deltas.is_empty());
        assert_eq!(s.total(), 55);
    }

    #[test]
    fn test_damage_spills_and_neutralizes() {
        let mut s = side(60, &[30, 4]);
        s.unassigned_hp = 0;
        s.units[0].current_hp = 30;
        let report = s.apply_damage(20);

        // 10 each, the small unit caps at 4 and its 6 goes to the other
        assert_eq!(s.units[1].current_hp, 0);
        assert_eq!(s.units[1].status, SubUnitStatus::Neutralized);
        assert_eq!(s.units[0].current_hp, 14);
        assert_eq!(report.neutralized, vec![SubUnitId(2)]);
        assert_eq!(report.applied_total(), -20);
    }

    #[test]
    fn test_neutralized_unit_rejects_damage() {
        let mut s = side(10, &[10]);
        s.apply_damage(10);
        assert_eq!(s.damage_unit(SubUnitId(1), 5), Some(0));
        assert_eq!(s.damage_unit(SubUnitId(7), 5), None);
    }

    #[test]
    fn test_heal_reactivates_and_overflows_to_pool() {
        let mut s = side(20, &[10, 10]);
        s.apply_damage(20);
        assert!(s.units.iter().all(|u| !u.is_active()));

        let report = s.apply_heal(25);
        assert_eq!(s.units[0].current_hp, 10);
        assert_eq!(s.units[1].current_hp, 10);
        assert_eq!(s.unassigned_hp, 5);
        assert_eq!(report.reactivated, vec![SubUnitId(1), SubUnitId(2)]);
        assert_eq!(report.applied_total(), 25);
    }

    #[test]
    fn test_remove_returns_hp() {
        let mut s = side(50, &[20]);
        s.damage_unit(SubUnitId(1), 5);
        let removed = s.remove(SubUnitId(1)).unwrap();
        assert_eq!(removed.current_hp, 15);
        assert_eq!(s.unassigned_hp, 45);
        assert!(s.units.is_empty());
    }

    #[test]
    fn test_targeted_heal_caps_at_max() {
        let mut s = side(50, &[20]);
        s.damage_unit(SubUnitId(1), 20);
        assert_eq!(s.heal_unit(SubUnitId(1), 50), Some(20));
        assert!(s.units[0].is_active());
    }
}
