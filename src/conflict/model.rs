//! Conflict record and its invariants

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::combat::constants::{STRATEGIC_MOMENTUM_CAP, TACTICAL_MOMENTUM_CAP};
use crate::combat::{CombatModifier, Stats, SuperUnitIntel, TheaterKind};
use crate::core::error::{EngineError, Result};
use crate::core::types::{ConflictId, PerSide, Side, Winner};
use crate::frontline::{SideUnits, SubUnitStatus, TheaterBoard, TheaterStatus};
use crate::npc::NpcConfig;

/// Current record layout; older records are migrated on load
pub const SCHEMA_VERSION: u32 = 2;

/// How turns move the conflict
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictMode {
    /// Rolled turns, bar spans -max..=max
    PushPullAuto,
    /// GM-supplied shifts, bar spans -max..=max
    #[default]
    #[serde(alias = "pushpull_manual")]
    PushPullManual,
    /// Rolled turns, bar spans 0..=max
    OneWayAuto,
    /// GM-supplied shifts, bar spans 0..=max
    #[serde(alias = "oneway_manual")]
    OneWayManual,
    /// GM-supplied damage against two health pools
    AttritionManual,
}

impl ConflictMode {
    pub const ALL: [ConflictMode; 5] = [
        ConflictMode::PushPullAuto,
        ConflictMode::PushPullManual,
        ConflictMode::OneWayAuto,
        ConflictMode::OneWayManual,
        ConflictMode::AttritionManual,
    ];

    /// Turns are rolled rather than dictated
    pub fn is_auto(self) -> bool {
        matches!(self, ConflictMode::PushPullAuto | ConflictMode::OneWayAuto)
    }

    pub fn is_attrition(self) -> bool {
        self == ConflictMode::AttritionManual
    }

    pub fn is_one_way(self) -> bool {
        matches!(self, ConflictMode::OneWayAuto | ConflictMode::OneWayManual)
    }

    fn key(self) -> &'static str {
        match self {
            ConflictMode::PushPullAuto => "push_pull_auto",
            ConflictMode::PushPullManual => "push_pull_manual",
            ConflictMode::OneWayAuto => "one_way_auto",
            ConflictMode::OneWayManual => "one_way_manual",
            ConflictMode::AttritionManual => "attrition_manual",
        }
    }
}

impl fmt::Display for ConflictMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for ConflictMode {
    type Err = EngineError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase().replace([' ', '-', '_'], "");
        ConflictMode::ALL
            .into_iter()
            .find(|mode| mode.key().replace('_', "") == key)
            .ok_or_else(|| EngineError::Validation(format!("unknown conflict mode '{}'", s)))
    }
}

/// Schedule for NPC-vs-NPC turns run by the scheduling collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoResolve {
    pub enabled: bool,
    pub interval_hours: f64,
    pub max_turns: u32,
    pub turn_count: u32,
    pub last_resolution: Option<DateTime<Utc>>,
}

impl Default for AutoResolve {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_hours: 12.0,
            max_turns: 50,
            turn_count: 0,
            last_resolution: None,
        }
    }
}

/// What the scheduler should do with a conflict right now
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AutoResolveCheck {
    Disabled,
    /// One side is still player-controlled
    NotNpcVsNpc,
    Waiting { hours_left: f64 },
    /// Turn limit hit: the defender held
    TurnLimitReached,
    Due,
}

/// One ongoing confrontation between two factions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conflict {
    #[serde(default)]
    pub schema_version: u32,
    pub id: ConflictId,
    pub name: String,
    /// Faction names
    pub attacker: String,
    pub defender: String,
    #[serde(default)]
    pub mode: ConflictMode,
    /// Which stat the contested ground compares
    #[serde(default)]
    pub theater_kind: TheaterKind,

    /// Signed overall advantage, positive favours the attacker
    #[serde(default)]
    pub warbar: i32,
    #[serde(default = "default_max")]
    pub max_value: i32,
    /// Attrition pools
    #[serde(default)]
    pub health: PerSide<i32>,
    #[serde(default)]
    pub max_health: PerSide<i32>,

    #[serde(default, alias = "momentum")]
    pub tactical_momentum: i32,
    #[serde(default)]
    pub strategic_momentum: PerSide<u8>,
    #[serde(default)]
    pub stats: PerSide<Stats>,
    #[serde(default)]
    pub modifiers: PerSide<Vec<CombatModifier>>,

    /// Theaters plus the unassigned share of the warbar
    #[serde(default)]
    pub board: TheaterBoard,
    /// Sub-units plus the unassigned share of each side's health
    #[serde(default)]
    pub units: PerSide<SideUnits>,

    #[serde(default)]
    pub npc: PerSide<Option<NpcConfig>>,
    #[serde(default)]
    pub pending_super_units: PerSide<Vec<SuperUnitIntel>>,
    #[serde(default)]
    pub auto_resolve: AutoResolve,

    #[serde(default = "default_initiative")]
    pub initiative: Side,
    #[serde(default)]
    pub turn: u32,
    #[serde(default)]
    pub concluded: bool,
    #[serde(default)]
    pub victor: Option<Winner>,
    pub created_at: DateTime<Utc>,
    pub last_update: DateTime<Utc>,
}

fn default_max() -> i32 {
    100
}

fn default_initiative() -> Side {
    Side::Attacker
}

impl Conflict {
    pub fn faction(&self, side: Side) -> &str {
        match side {
            Side::Attacker => &self.attacker,
            Side::Defender => &self.defender,
        }
    }

    /// Lowest and highest warbar value this mode allows
    pub fn bar_bounds(&self) -> (i32, i32) {
        if self.mode.is_one_way() {
            (0, self.max_value)
        } else {
            (-self.max_value, self.max_value)
        }
    }

    pub fn is_npc(&self, side: Side) -> bool {
        self.npc.get(side).is_some()
    }

    pub(crate) fn ensure_open(&self) -> Result<()> {
        if self.concluded {
            return Err(EngineError::InvalidTransition(format!(
                "conflict {} has already concluded",
                self.id
            )));
        }
        Ok(())
    }

    pub fn hours_since_update(&self, now: DateTime<Utc>) -> f64 {
        (now - self.last_update).num_seconds() as f64 / 3600.0
    }

    /// An open conflict nobody has touched for `threshold_hours`
    pub fn is_stagnant(&self, now: DateTime<Utc>, threshold_hours: f64) -> bool {
        !self.concluded && self.hours_since_update(now) >= threshold_hours
    }

    pub fn auto_resolve_check(&self, now: DateTime<Utc>) -> AutoResolveCheck {
        let auto = &self.auto_resolve;
        if !auto.enabled || self.concluded {
            return AutoResolveCheck::Disabled;
        }
        if !(self.is_npc(Side::Attacker) && self.is_npc(Side::Defender)) {
            return AutoResolveCheck::NotNpcVsNpc;
        }
        if let Some(last) = auto.last_resolution {
            let since = (now - last).num_seconds() as f64 / 3600.0;
            if since < auto.interval_hours {
                return AutoResolveCheck::Waiting {
                    hours_left: auto.interval_hours - since,
                };
            }
        }
        if auto.turn_count >= auto.max_turns {
            return AutoResolveCheck::TurnLimitReached;
        }
        AutoResolveCheck::Due
    }

    /// Verify every structural invariant; run before each persisted write
    pub fn check_invariants(&self) -> Result<()> {
        let fail = |message: String| Err(EngineError::InvariantViolation(format!("conflict {}: {}", self.id, message)));

        if self.max_value <= 0 {
            return fail(format!("max value {} is not positive", self.max_value));
        }
        let (lo, hi) = self.bar_bounds();
        if self.warbar < lo || self.warbar > hi {
            return fail(format!("warbar {} outside {}..={}", self.warbar, lo, hi));
        }
        if self.warbar != self.board.total() {
            return fail(format!(
                "warbar {} != unassigned {} + theaters {}",
                self.warbar,
                self.board.unassigned,
                self.board.total() - self.board.unassigned
            ));
        }
        for theater in &self.board.theaters {
            if theater.max_value <= 0 || theater.current_value.abs() > theater.max_value {
                return fail(format!(
                    "theater {} value {} outside ±{}",
                    theater.id, theater.current_value, theater.max_value
                ));
            }
            if theater.status == TheaterStatus::Active && theater.captured_by.is_some() {
                return fail(format!("active theater {} has a capturer", theater.id));
            }
        }

        if self.tactical_momentum.abs() > TACTICAL_MOMENTUM_CAP {
            return fail(format!("tactical momentum {}", self.tactical_momentum));
        }
        for side in Side::BOTH {
            if *self.strategic_momentum.get(side) > STRATEGIC_MOMENTUM_CAP {
                return fail(format!("{} strategic momentum {}", side, self.strategic_momentum.get(side)));
            }

            let health = *self.health.get(side);
            let units = self.units.get(side);
            if self.mode.is_attrition() {
                if health < 0 || health > *self.max_health.get(side) {
                    return fail(format!("{} health {} outside 0..={}", side, health, self.max_health.get(side)));
                }
                if health != units.total() {
                    return fail(format!(
                        "{} health {} != unassigned {} + sub-units {}",
                        side,
                        health,
                        units.unassigned_hp,
                        units.total() - units.unassigned_hp
                    ));
                }
            }
            if units.unassigned_hp < 0 {
                return fail(format!("{} unassigned hp {} is negative", side, units.unassigned_hp));
            }
            for unit in &units.units {
                if unit.current_hp < 0 || unit.current_hp > unit.max_hp {
                    return fail(format!("{} sub-unit {} hp {}/{}", side, unit.id, unit.current_hp, unit.max_hp));
                }
                if (unit.current_hp == 0) != (unit.status == SubUnitStatus::Neutralized) {
                    return fail(format!("{} sub-unit {} status does not match hp", side, unit.id));
                }
            }
        }

        if self.concluded != self.victor.is_some() {
            return fail("concluded flag and victor disagree".into());
        }
        Ok(())
    }
}
