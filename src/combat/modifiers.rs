//! Roll modifiers for a combat round
//!
//! A side's roll is adjusted by stat advantage in the contested theater,
//! game-master modifiers, action bonuses, a deployed super unit and
//! tactical momentum. Lines are produced in a fixed order so the
//! breakdown renders the same way every time.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::constants::*;
use crate::core::error::EngineError;
use crate::core::types::{ModifierBreakdown, ModifierId, PerSide, Side};

/// The three stat categories a faction fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatKind {
    Exosphere,
    Naval,
    Military,
}

impl StatKind {
    pub const ALL: [StatKind; 3] = [StatKind::Exosphere, StatKind::Naval, StatKind::Military];
}

impl fmt::Display for StatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatKind::Exosphere => write!(f, "exosphere"),
            StatKind::Naval => write!(f, "naval"),
            StatKind::Military => write!(f, "military"),
        }
    }
}

/// Where the fighting happens; decides which stat is compared
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TheaterKind {
    Space,
    Sea,
    #[default]
    Land,
    Combined,
}

impl TheaterKind {
    pub fn stat_kind(self) -> StatKind {
        match self {
            TheaterKind::Space => StatKind::Exosphere,
            TheaterKind::Sea => StatKind::Naval,
            TheaterKind::Land | TheaterKind::Combined => StatKind::Military,
        }
    }

    fn label(self) -> &'static str {
        match self {
            TheaterKind::Space => "Space",
            TheaterKind::Sea => "Naval",
            TheaterKind::Land => "Land",
            TheaterKind::Combined => "Combined",
        }
    }
}

/// Per-side stat magnitudes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub exosphere: i32,
    pub naval: i32,
    pub military: i32,
}

impl Stats {
    pub fn new(exosphere: i32, naval: i32, military: i32) -> Self {
        Self {
            exosphere,
            naval,
            military,
        }
    }

    pub fn get(&self, kind: StatKind) -> i32 {
        match kind {
            StatKind::Exosphere => self.exosphere,
            StatKind::Naval => self.naval,
            StatKind::Military => self.military,
        }
    }

    pub fn get_mut(&mut self, kind: StatKind) -> &mut i32 {
        match kind {
            StatKind::Exosphere => &mut self.exosphere,
            StatKind::Naval => &mut self.naval,
            StatKind::Military => &mut self.military,
        }
    }
}

/// Main action chosen for a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MainAction {
    Attack,
    Defend,
    SuperUnit,
}

/// Minor action chosen for a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MinorAction {
    PrepareAttack,
    Sabotage,
    FortifyDefense,
    Heal,
    PrepareSuperUnit,
}

/// How long a game-master modifier stays in force
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ModifierDuration {
    Permanent,
    NextResolution,
    Turns(u32),
    /// A stored value that could not be read; kept as-is, never decays
    Unrecognized(String),
}

impl ModifierDuration {
    fn parse_strict(raw: &str, allow_zero: bool) -> Result<Self, EngineError> {
        let key = raw.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        match key.as_str() {
            "permanent" => return Ok(ModifierDuration::Permanent),
            "next_resolution" => return Ok(ModifierDuration::NextResolution),
            _ => {}
        }
        let count = key
            .strip_suffix("_turns")
            .or_else(|| key.strip_suffix("_turn"))
            .and_then(|n| n.parse::<u32>().ok());
        match count {
            Some(n) if n > 0 || allow_zero => Ok(ModifierDuration::Turns(n)),
            _ => Err(EngineError::Validation(format!("malformed modifier duration '{}'", raw))),
        }
    }
}

impl FromStr for ModifierDuration {
    type Err = EngineError;

    /// Strict parse for fresh input: `permanent`, `next_resolution`, `N_turns`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_strict(s, false)
    }
}

impl From<String> for ModifierDuration {
    fn from(raw: String) -> Self {
        Self::parse_strict(&raw, true).unwrap_or(ModifierDuration::Unrecognized(raw))
    }
}

impl From<ModifierDuration> for String {
    fn from(duration: ModifierDuration) -> Self {
        duration.to_string()
    }
}

impl fmt::Display for ModifierDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModifierDuration::Permanent => write!(f, "permanent"),
            ModifierDuration::NextResolution => write!(f, "next_resolution"),
            ModifierDuration::Turns(n) => write!(f, "{}_turns", n),
            ModifierDuration::Unrecognized(raw) => write!(f, "{}", raw),
        }
    }
}

/// A time-limited bonus or penalty set by a game master
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatModifier {
    pub id: ModifierId,
    pub name: String,
    pub value: i32,
    pub duration: ModifierDuration,
}

/// Intel progress on a deployed super unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuperUnitIntel {
    pub name: String,
    pub current_intel: u32,
    pub max_intel: u32,
}

impl SuperUnitIntel {
    /// Tiered modifier: full intel +2, half or more 0, below half -2
    pub fn combat_modifier(&self) -> i32 {
        if self.max_intel == 0 {
            return 0;
        }
        let progress = self.current_intel as f64 / self.max_intel as f64;
        if progress >= 1.0 {
            SUPER_UNIT_FULL_INTEL_BONUS
        } else if progress >= 0.5 {
            SUPER_UNIT_PARTIAL_INTEL_BONUS
        } else {
            SUPER_UNIT_LOW_INTEL_PENALTY
        }
    }
}

/// Advantage granted by an own/enemy stat ratio
pub fn advantage_for_ratio(ratio: f64) -> i32 {
    if ratio >= OVERWHELMING_RATIO {
        OVERWHELMING_BONUS
    } else if ratio >= SUPERIOR_RATIO {
        SUPERIOR_BONUS
    } else if ratio >= PARITY_RATIO {
        PARITY_BONUS
    } else {
        0
    }
}

/// Stat advantage for `side` in a theater of the given kind
///
/// An enemy stat of zero gives no advantage rather than an infinite one.
pub fn stat_advantage(side: Side, theater: TheaterKind, stats: &PerSide<Stats>) -> i32 {
    let kind = theater.stat_kind();
    let own = stats.get(side).get(kind);
    let enemy = stats.get(side.opponent()).get(kind);
    if enemy == 0 {
        return 0;
    }
    advantage_for_ratio(own as f64 / enemy as f64)
}

/// Everything about the conflict a side's modifiers depend on
#[derive(Debug, Clone, Copy)]
pub struct CombatContext<'a> {
    pub side: Side,
    pub theater: TheaterKind,
    pub stats: &'a PerSide<Stats>,
    pub active_modifiers: &'a [CombatModifier],
    pub tactical_momentum: i32,
    pub super_unit: Option<&'a SuperUnitIntel>,
}

/// Ordered modifiers for one side's roll this round
pub fn combat_modifiers(
    ctx: &CombatContext<'_>,
    main: MainAction,
    minor: MinorAction,
) -> ModifierBreakdown {
    let mut breakdown = ModifierBreakdown::new();

    let advantage = stat_advantage(ctx.side, ctx.theater, ctx.stats);
    if advantage != 0 {
        breakdown.push(format!("Stat Advantage ({})", ctx.theater.label()), advantage);
    }

    for modifier in ctx.active_modifiers {
        breakdown.push(modifier.name.clone(), modifier.value);
    }

    if main == MainAction::Defend {
        breakdown.push("Defense Stance", DEFEND_BONUS);
    }

    // Sabotage lands on the opponent and fortify/heal/prepare_super_unit
    // have no roll effect.
    if minor == MinorAction::PrepareAttack {
        breakdown.push("Prepared Attack", PREPARED_ATTACK_BONUS);
    }

    if main == MainAction::SuperUnit {
        if let Some(unit) = ctx.super_unit {
            breakdown.push(format!("Super Unit ({})", unit.name), unit.combat_modifier());
        }
    }

    if Side::from_sign(ctx.tactical_momentum) == Some(ctx.side) {
        breakdown.push("Tactical Momentum", ctx.tactical_momentum.abs());
    }

    breakdown
}

/// Append the enemy-sabotage penalty to a breakdown
///
/// The penalty itself is unconditional; callers decide whether the
/// opponent actually sabotaged this turn.
pub fn apply_sabotage_penalty(breakdown: &mut ModifierBreakdown) {
    breakdown.push("Enemy Sabotage", SABOTAGE_PENALTY);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(att_military: i32, def_military: i32) -> PerSide<Stats> {
        PerSide::new(Stats::new(10, 10, att_military), Stats::new(10, 10, def_military))
    }

    #[test]
    fn test_advantage_thresholds() {
        assert_eq!(advantage_for_ratio(3.0), 3);
        assert_eq!(advantage_for_ratio(2.5), 3);
        assert_eq!(advantage_for_ratio(2.49), 2);
        assert_eq!(advantage_for_ratio(1.5), 2);
        assert_eq!(advantage_for_ratio(1.49), 1);
        assert_eq!(advantage_for_ratio(0.75), 1);
        assert_eq!(advantage_for_ratio(0.74), 0);
    }

    #[test]
    fn test_land_ratio_three_gives_plus_three() {
        let s = stats(30, 10);
        assert_eq!(stat_advantage(Side::Attacker, TheaterKind::Land, &s), 3);
        // 10 / 30 is below parity
        assert_eq!(stat_advantage(Side::Defender, TheaterKind::Land, &s), 0);
    }

    #[test]
    fn test_zero_enemy_stat_gives_nothing() {
        let s = stats(50, 0);
        assert_eq!(stat_advantage(Side::Attacker, TheaterKind::Combined, &s), 0);
    }

    #[test]
    fn test_theater_kind_picks_stat() {
        let s = PerSide::new(Stats::new(30, 10, 10), Stats::new(10, 10, 10));
        assert_eq!(stat_advantage(Side::Attacker, TheaterKind::Space, &s), 3);
        assert_eq!(stat_advantage(Side::Attacker, TheaterKind::Sea, &s), 1);
    }

    #[test]
    fn test_combat_modifiers_order_and_total() {
        let s = stats(20, 10);
        let mods = vec![CombatModifier {
            id: ModifierId(1),
            name: "Supply Lines".into(),
            value: -1,
            duration: ModifierDuration::Permanent,
        }];
        let ctx = CombatContext {
            side: Side::Defender,
            theater: TheaterKind::Land,
            stats: &s,
            active_modifiers: &mods,
            tactical_momentum: -2,
            super_unit: None,
        };
        let breakdown = combat_modifiers(&ctx, MainAction::Defend, MinorAction::PrepareAttack);

        let labels: Vec<&str> = breakdown.lines.iter().map(|l| l.label.as_str()).collect();
        // 10 / 20 = 0.5 -> no stat line
        assert_eq!(
            labels,
            vec!["Supply Lines", "Defense Stance", "Prepared Attack", "Tactical Momentum"]
        );
        assert_eq!(breakdown.total, -1 + 2 + 1 + 2);
    }

    #[test]
    fn test_momentum_only_counts_for_favoured_side() {
        let s = stats(10, 10);
        let ctx = CombatContext {
            side: Side::Attacker,
            theater: TheaterKind::Land,
            stats: &s,
            active_modifiers: &[],
            tactical_momentum: -3,
            super_unit: None,
        };
        let breakdown = combat_modifiers(&ctx, MainAction::Attack, MinorAction::Heal);
        assert!(breakdown.lines.iter().all(|l| l.label != "Tactical Momentum"));
        // parity stat advantage only
        assert_eq!(breakdown.total, 1);
    }

    #[test]
    fn test_super_unit_intel_tiers() {
        let mut unit = SuperUnitIntel {
            name: "Leviathan".into(),
            current_intel: 10,
            max_intel: 10,
        };
        assert_eq!(unit.combat_modifier(), 2);
        unit.current_intel = 5;
        assert_eq!(unit.combat_modifier(), 0);
        unit.current_intel = 4;
        assert_eq!(unit.combat_modifier(), -2);
        unit.max_intel = 0;
        assert_eq!(unit.combat_modifier(), 0);
    }

    #[test]
    fn test_duration_parsing() {
        assert_eq!("Permanent".parse::<ModifierDuration>().unwrap(), ModifierDuration::Permanent);
        assert_eq!(
            "Next Resolution".parse::<ModifierDuration>().unwrap(),
            ModifierDuration::NextResolution
        );
        assert_eq!("3 Turns".parse::<ModifierDuration>().unwrap(), ModifierDuration::Turns(3));
        assert!("0_turns".parse::<ModifierDuration>().is_err());
        assert!("soon".parse::<ModifierDuration>().is_err());

        // Stored values never fail to load
        let stored: ModifierDuration = String::from("x_turns").into();
        assert_eq!(stored, ModifierDuration::Unrecognized("x_turns".into()));
    }

    #[test]
    fn test_duration_serde_as_string() {
        let json = serde_json::to_string(&ModifierDuration::Turns(2)).unwrap();
        assert_eq!(json, "\"2_turns\"");
        let back: ModifierDuration = serde_json::from_str("\"next_resolution\"").unwrap();
        assert_eq!(back, ModifierDuration::NextResolution);
    }
}
