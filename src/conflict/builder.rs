//! Fully populated conflict records

use chrono::{DateTime, Utc};

use super::model::{AutoResolve, Conflict, ConflictMode, SCHEMA_VERSION};
use crate::combat::{Stats, TheaterKind};
use crate::core::config::ConflictDefaults;
use crate::core::error::{invalid, Result};
use crate::core::types::{ConflictId, PerSide, Side};
use crate::frontline::{SideUnits, TheaterBoard};
use crate::npc::NpcConfig;

/// Builder for new conflicts
///
/// Every field of the record is set at build time so nothing downstream
/// has to backfill defaults.
#[derive(Debug, Clone)]
pub struct ConflictBuilder {
    name: Option<String>,
    attacker: String,
    defender: String,
    mode: ConflictMode,
    theater_kind: TheaterKind,
    max_value: i32,
    max_health: i32,
    stats: PerSide<Stats>,
    npc: PerSide<Option<NpcConfig>>,
    auto_resolve: AutoResolve,
}

impl ConflictBuilder {
    pub fn new(attacker: impl Into<String>, defender: impl Into<String>) -> Self {
        Self::with_defaults(attacker, defender, &ConflictDefaults::default())
    }

    /// Start from configured bar size, health and auto-resolve schedule
    pub fn with_defaults(
        attacker: impl Into<String>,
        defender: impl Into<String>,
        defaults: &ConflictDefaults,
    ) -> Self {
        Self {
            name: None,
            attacker: attacker.into(),
            defender: defender.into(),
            mode: ConflictMode::default(),
            theater_kind: TheaterKind::default(),
            max_value: defaults.max_value,
            max_health: defaults.max_health,
            stats: PerSide::default(),
            npc: PerSide::default(),
            auto_resolve: AutoResolve {
                interval_hours: defaults.auto_resolve_interval_hours,
                max_turns: defaults.auto_resolve_max_turns,
                ..AutoResolve::default()
            },
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn mode(mut self, mode: ConflictMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn theater_kind(mut self, kind: TheaterKind) -> Self {
        self.theater_kind = kind;
        self
    }

    pub fn max_value(mut self, max_value: i32) -> Self {
        self.max_value = max_value;
        self
    }

    pub fn max_health(mut self, max_health: i32) -> Self {
        self.max_health = max_health;
        self
    }

    pub fn stats(mut self, side: Side, stats: Stats) -> Self {
        *self.stats.get_mut(side) = stats;
        self
    }

    /// Hand a side to the AI; its stats come from the doctrine
    pub fn npc(mut self, side: Side, config: NpcConfig) -> Self {
        *self.stats.get_mut(side) = config.stats();
        *self.npc.get_mut(side) = Some(config);
        self
    }

    /// Run NPC-vs-NPC turns on a schedule
    pub fn auto_resolve(mut self, interval_hours: f64, max_turns: u32) -> Self {
        self.auto_resolve.enabled = true;
        self.auto_resolve.interval_hours = interval_hours;
        self.auto_resolve.max_turns = max_turns;
        self
    }

    pub fn build(self, id: ConflictId, now: DateTime<Utc>) -> Result<Conflict> {
        let attacker = self.attacker.trim().to_string();
        let defender = self.defender.trim().to_string();
        if attacker.is_empty() || defender.is_empty() {
            return invalid("both factions must be named");
        }
        if attacker.eq_ignore_ascii_case(&defender) {
            return invalid(format!("{} cannot fight itself", attacker));
        }
        if self.max_value <= 0 {
            return invalid(format!("max value must be positive, got {}", self.max_value));
        }
        if self.max_health <= 0 {
            return invalid(format!("max health must be positive, got {}", self.max_health));
        }
        for side in Side::BOTH {
            let stats = self.stats.get(side);
            if stats.exosphere < 0 || stats.naval < 0 || stats.military < 0 {
                return invalid(format!("{} stats must not be negative", side));
            }
            if let Some(npc) = self.npc.get(side) {
                if npc.base_power <= 0 {
                    return invalid(format!("{} base power must be positive", side));
                }
            }
        }
        if self.auto_resolve.enabled {
            if !self.mode.is_auto() || self.npc.attacker.is_none() || self.npc.defender.is_none() {
                return invalid("auto-resolve needs a rolled mode and two AI-controlled sides");
            }
            if self.auto_resolve.interval_hours <= 0.0 || self.auto_resolve.max_turns == 0 {
                return invalid("auto-resolve needs a positive interval and turn limit");
            }
        }

        let name = self
            .name
            .unwrap_or_else(|| format!("{} vs {}", attacker, defender));

        let conflict = Conflict {
            schema_version: SCHEMA_VERSION,
            id,
            name,
            attacker,
            defender,
            mode: self.mode,
            theater_kind: self.theater_kind,
            warbar: 0,
            max_value: self.max_value,
            health: PerSide::splat(self.max_health),
            max_health: PerSide::splat(self.max_health),
            tactical_momentum: 0,
            strategic_momentum: PerSide::default(),
            stats: self.stats,
            modifiers: PerSide::default(),
            board: TheaterBoard::default(),
            units: PerSide::splat(SideUnits::with_health(self.max_health)),
            npc: self.npc,
            pending_super_units: PerSide::default(),
            auto_resolve: self.auto_resolve,
            initiative: Side::Attacker,
            turn: 0,
            concluded: false,
            victor: None,
            created_at: now,
            last_update: now,
        };
        tracing::info!(
            "Conflict {} '{}' created: {} vs {} ({})",
            conflict.id,
            conflict.name,
            conflict.attacker,
            conflict.defender,
            conflict.mode
        );
        Ok(conflict)
    }
}

/// Next free conflict id: one past the highest in use
pub fn next_conflict_id(conflicts: &[Conflict]) -> ConflictId {
    ConflictId(conflicts.iter().map(|c| c.id.0).max().unwrap_or(0) + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::npc::{Archetype, Personality, TechLevel};
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 1, 8, 0, 0).unwrap()
    }

    #[test]
    fn test_defaults_are_populated() {
        let conflict = ConflictBuilder::new("Aurora", "Kestrel")
            .mode(ConflictMode::AttritionManual)
            .max_health(80)
            .build(ConflictId(3), now())
            .unwrap();

        assert_eq!(conflict.name, "Aurora vs Kestrel");
        assert_eq!(conflict.schema_version, SCHEMA_VERSION);
        assert_eq!(conflict.health, PerSide::splat(80));
        assert_eq!(conflict.units.defender.unassigned_hp, 80);
        assert_eq!(conflict.initiative, Side::Attacker);
        assert!(!conflict.auto_resolve.enabled);
        assert!(conflict.check_invariants().is_ok());
    }

    #[test]
    fn test_npc_side_gets_doctrine_stats() {
        let npc = NpcConfig::new(Archetype::Nato, TechLevel::Advanced, Personality::Aggressive);
        let expected = npc.stats();
        let conflict = ConflictBuilder::new("Aurora", "Kestrel")
            .npc(Side::Defender, npc)
            .build(ConflictId(1), now())
            .unwrap();
        assert_eq!(conflict.stats.defender, expected);
        assert!(conflict.is_npc(Side::Defender));
        assert!(!conflict.is_npc(Side::Attacker));
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(ConflictBuilder::new("Aurora", "aurora").build(ConflictId(1), now()).is_err());
        assert!(ConflictBuilder::new("", "Kestrel").build(ConflictId(1), now()).is_err());
        assert!(ConflictBuilder::new("Aurora", "Kestrel")
            .max_value(0)
            .build(ConflictId(1), now())
            .is_err());
        assert!(ConflictBuilder::new("Aurora", "Kestrel")
            .stats(Side::Attacker, Stats::new(-1, 0, 0))
            .build(ConflictId(1), now())
            .is_err());
    }

    #[test]
    fn test_next_id_follows_max() {
        let a = ConflictBuilder::new("A", "B").build(ConflictId(4), now()).unwrap();
        let b = ConflictBuilder::new("C", "D").build(ConflictId(9), now()).unwrap();
        assert_eq!(next_conflict_id(&[a, b]), ConflictId(10));
        assert_eq!(next_conflict_id(&[]), ConflictId(1));
    }
}
