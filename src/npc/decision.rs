//! Action selection for AI-controlled sides

use serde::{Deserialize, Serialize};

use super::learning::LearningData;
use super::profile::{generate_stats, Archetype, Personality, TechLevel};
use crate::combat::{MainAction, MinorAction, Stats};
use crate::core::config::NpcTuning;
use crate::core::random::RandomSource;
use crate::core::types::Side;

/// Base power used when none is given
pub const DEFAULT_BASE_POWER: i32 = 50;

/// Settings of one AI-controlled side
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NpcConfig {
    pub archetype: Archetype,
    pub tech_level: TechLevel,
    pub personality: Personality,
    pub base_power: i32,
    #[serde(default)]
    pub learning: LearningData,
}

impl NpcConfig {
    pub fn new(archetype: Archetype, tech_level: TechLevel, personality: Personality) -> Self {
        Self {
            archetype,
            tech_level,
            personality,
            base_power: DEFAULT_BASE_POWER,
            learning: LearningData::default(),
        }
    }

    pub fn with_base_power(mut self, base_power: i32) -> Self {
        self.base_power = base_power;
        self
    }

    /// Stats this side fields under its doctrine and tech
    pub fn stats(&self) -> Stats {
        generate_stats(self.archetype, self.tech_level, self.base_power)
    }
}

/// What the NPC sees of the current conflict
#[derive(Debug, Clone, Copy)]
pub struct Situation {
    pub side: Side,
    pub tactical_momentum: i32,
    pub super_unit_staged: bool,
}

/// Chosen actions plus the aggression that drove them
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NpcDecision {
    pub main: MainAction,
    pub minor: MinorAction,
    pub aggression: f64,
}

/// Doctrine and temperament, shifted by momentum and recent form, clamped to [0, 1]
pub fn effective_aggression(config: &NpcConfig, situation: &Situation, tuning: &NpcTuning) -> f64 {
    let mut aggression =
        config.archetype.profile().aggression + config.personality.profile().aggression_modifier;

    if config.personality == Personality::Adaptive {
        if Side::from_sign(situation.tactical_momentum) == Some(situation.side) {
            aggression += tuning.adaptive_swing;
        } else {
            aggression -= tuning.adaptive_swing;
        }
    }

    aggression += config.learning.aggression_shift(tuning);
    aggression.clamp(0.0, 1.0)
}

/// Pick a main and a minor action for this turn
pub fn choose_actions(
    config: &NpcConfig,
    situation: &Situation,
    tuning: &NpcTuning,
    rng: &mut dyn RandomSource,
) -> NpcDecision {
    let aggression = effective_aggression(config, situation, tuning);
    let main = choose_main(config, situation, aggression, rng);
    let minor = choose_minor(config.archetype, main, tuning, rng);
    tracing::debug!(
        "NPC {} ({}/{}) aggression {:.2} chose {:?} + {:?}",
        situation.side,
        config.archetype,
        config.personality,
        aggression,
        main,
        minor
    );
    NpcDecision {
        main,
        minor,
        aggression,
    }
}

fn choose_main(
    config: &NpcConfig,
    situation: &Situation,
    aggression: f64,
    rng: &mut dyn RandomSource,
) -> MainAction {
    let bias = config.personality.profile().bias;
    let super_unit_ready = situation.super_unit_staged
        && config
            .archetype
            .profile()
            .preferred_main
            .contains(&MainAction::SuperUnit);

    let weights = [
        (MainAction::Attack, bias.attack * aggression),
        (MainAction::Defend, bias.defend * (1.0 - aggression)),
        (
            MainAction::SuperUnit,
            if super_unit_ready { bias.super_unit } else { 0.0 },
        ),
    ];
    let total: f64 = weights.iter().map(|(_, w)| w).sum();
    if total <= 0.0 {
        return MainAction::Defend;
    }

    let mut draw = rng.next_f64() * total;
    for (action, weight) in weights {
        if weight <= 0.0 {
            continue;
        }
        if draw < weight {
            return action;
        }
        draw -= weight;
    }

    // Float rounding left the draw past the end
    weights
        .iter()
        .rev()
        .find(|(_, w)| *w > 0.0)
        .map(|(action, _)| *action)
        .unwrap_or(MainAction::Defend)
}

fn choose_minor(
    archetype: Archetype,
    main: MainAction,
    tuning: &NpcTuning,
    rng: &mut dyn RandomSource,
) -> MinorAction {
    let preferred = archetype.profile().preferred_minor;
    let candidates: &[(MinorAction, f64)] = match main {
        MainAction::Attack => &[
            (MinorAction::PrepareAttack, tuning.prepare_attack_chance),
            (MinorAction::Sabotage, tuning.sabotage_chance),
        ],
        MainAction::Defend => &[
            (MinorAction::FortifyDefense, tuning.fortify_chance),
            (MinorAction::Heal, tuning.heal_chance),
        ],
        MainAction::SuperUnit => &[(MinorAction::PrepareSuperUnit, tuning.prepare_super_unit_chance)],
    };

    // Only preferred candidates cost a draw
    for &(minor, chance) in candidates {
        if preferred.contains(&minor) && rng.next_f64() < chance {
            return minor;
        }
    }

    if preferred.is_empty() {
        return MinorAction::PrepareAttack;
    }
    let index = rng.range_inclusive(0, preferred.len() as i32 - 1);
    preferred[index as usize]
}
