//! Engine configuration with documented tunables
//!
//! Rule constants that define the game itself live in
//! `combat::constants`. The values here are the knobs a game master
//! community is expected to tune: bar sizes, NPC temperament, cooldowns.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::core::error::{EngineError, Result};
use crate::intrigue::OperationKind;

/// Defaults applied when a conflict is created
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConflictDefaults {
    /// Magnitude bound of the warbar (push-pull spans -max..=max)
    pub max_value: i32,

    /// Starting health pool per side in attrition mode
    pub max_health: i32,

    /// Hours without an update before a conflict counts as stagnant
    ///
    /// The scheduling collaborator polls this once a day, so values
    /// below 24 only matter when it is run more often.
    pub stagnation_hours: f64,

    /// Rolled totals this close count as a stalemate
    pub stalemate_band: i32,

    /// Hours between automatic NPC-vs-NPC turns
    pub auto_resolve_interval_hours: f64,

    /// Automatic turns before the defender is declared the winner
    pub auto_resolve_max_turns: u32,
}

impl Default for ConflictDefaults {
    fn default() -> Self {
        Self {
            max_value: 100,
            max_health: 100,
            stagnation_hours: 24.0,
            stalemate_band: 2,
            auto_resolve_interval_hours: 12.0,
            auto_resolve_max_turns: 50,
        }
    }
}

/// Temperament knobs for AI-controlled sides
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NpcTuning {
    /// Aggression shift applied to adaptive personalities
    ///
    /// Added when tactical momentum favours the NPC, subtracted otherwise.
    pub adaptive_swing: f64,

    /// Aggression removed when recent losses outnumber recent wins
    pub loss_caution: f64,

    /// Aggression added when recent wins outnumber recent losses
    pub win_boldness: f64,

    /// Number of outcomes kept in the rolling history
    pub history_len: usize,

    /// Amount both win/loss counters lose on every learning update
    ///
    /// At 0.1 a single result stops influencing behaviour after about
    /// ten resolutions.
    pub learning_decay: f64,

    /// Chance of preparing the next attack after choosing to attack
    pub prepare_attack_chance: f64,

    /// Chance of sabotage after choosing to attack
    pub sabotage_chance: f64,

    /// Chance of fortifying after choosing to defend
    pub fortify_chance: f64,

    /// Chance of healing after choosing to defend
    pub heal_chance: f64,

    /// Chance of staging another super unit after deploying one
    pub prepare_super_unit_chance: f64,
}

impl Default for NpcTuning {
    fn default() -> Self {
        Self {
            adaptive_swing: 0.2,
            loss_caution: 0.2,
            win_boldness: 0.1,
            history_len: 5,
            learning_decay: 0.1,
            prepare_attack_chance: 0.6,
            sabotage_chance: 0.4,
            fortify_chance: 0.5,
            heal_chance: 0.3,
            prepare_super_unit_chance: 0.7,
        }
    }
}

/// Covert operation knobs
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IntrigueTuning {
    /// Cooldown hours that replace an operation type's built-in value
    pub cooldown_hours: BTreeMap<OperationKind, f64>,
}

impl IntrigueTuning {
    /// Effective cooldown for an operation type
    pub fn cooldown_for(&self, kind: OperationKind) -> f64 {
        self.cooldown_hours
            .get(&kind)
            .copied()
            .unwrap_or_else(|| kind.profile().cooldown_hours)
    }
}

/// Complete engine configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub conflict: ConflictDefaults,
    pub npc: NpcTuning,
    pub intrigue: IntrigueTuning,
}

impl EngineConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a TOML document; missing keys keep their defaults
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: EngineConfig = toml::from_str(contents)
            .map_err(|e| EngineError::Config(format!("failed to parse engine TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config = Self::from_toml_str(&contents)?;
        tracing::debug!("Loaded engine config from {:?}", path);
        Ok(config)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        if self.conflict.max_value <= 0 {
            return Err(EngineError::Config(format!(
                "conflict.max_value ({}) must be positive",
                self.conflict.max_value
            )));
        }
        if self.conflict.max_health <= 0 {
            return Err(EngineError::Config(format!(
                "conflict.max_health ({}) must be positive",
                self.conflict.max_health
            )));
        }
        if self.conflict.stagnation_hours < 0.0 {
            return Err(EngineError::Config("conflict.stagnation_hours must not be negative".into()));
        }
        if self.conflict.stalemate_band < 0 {
            return Err(EngineError::Config("conflict.stalemate_band must not be negative".into()));
        }
        if self.conflict.auto_resolve_interval_hours <= 0.0 || self.conflict.auto_resolve_max_turns == 0 {
            return Err(EngineError::Config(
                "conflict auto-resolve interval and turn limit must be positive".into(),
            ));
        }

        let npc = &self.npc;
        let chances = [
            ("npc.prepare_attack_chance", npc.prepare_attack_chance),
            ("npc.sabotage_chance", npc.sabotage_chance),
            ("npc.fortify_chance", npc.fortify_chance),
            ("npc.heal_chance", npc.heal_chance),
            ("npc.prepare_super_unit_chance", npc.prepare_super_unit_chance),
            ("npc.adaptive_swing", npc.adaptive_swing),
            ("npc.loss_caution", npc.loss_caution),
            ("npc.win_boldness", npc.win_boldness),
        ];
        for (name, value) in chances {
            if !(0.0..=1.0).contains(&value) {
                return Err(EngineError::Config(format!("{} ({}) must be within [0, 1]", name, value)));
            }
        }
        if npc.history_len == 0 {
            return Err(EngineError::Config("npc.history_len must be at least 1".into()));
        }
        if npc.learning_decay < 0.0 {
            return Err(EngineError::Config("npc.learning_decay must not be negative".into()));
        }

        for (kind, hours) in &self.intrigue.cooldown_hours {
            if *hours < 0.0 {
                return Err(EngineError::Config(format!(
                    "cooldown for {:?} ({}) must not be negative",
                    kind, hours
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = EngineConfig::from_toml_str(
            r#"
            [conflict]
            max_value = 150

            [npc]
            adaptive_swing = 0.25

            [intrigue.cooldown_hours]
            sabotage = 6.0
            "#,
        )
        .unwrap();

        assert_eq!(config.conflict.max_value, 150);
        assert_eq!(config.conflict.max_health, 100);
        assert!((config.npc.adaptive_swing - 0.25).abs() < f64::EPSILON);
        assert_eq!(config.npc.history_len, 5);
        assert!((config.intrigue.cooldown_for(OperationKind::Sabotage) - 6.0).abs() < f64::EPSILON);
        assert!((config.intrigue.cooldown_for(OperationKind::Assassination) - 168.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_rejects_bad_probability() {
        let result = EngineConfig::from_toml_str("[npc]\nheal_chance = 1.5\n");
        assert!(matches!(result, Err(EngineError::Config(_))));
    }

    #[test]
    fn test_rejects_non_positive_bar() {
        let mut config = EngineConfig::default();
        config.conflict.max_value = 0;
        assert!(config.validate().is_err());
    }
}
