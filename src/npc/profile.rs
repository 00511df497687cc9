//! Doctrine, temperament and technology tables for AI-controlled sides

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::combat::{MainAction, MinorAction, Stats};
use crate::core::error::EngineError;

/// Military doctrine of an NPC faction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Archetype {
    #[default]
    Nato,
    Csat,
    Guerrilla,
    Swarm,
    Elite,
    DefensiveBloc,
    Insurgent,
}

/// Static description of an archetype
#[derive(Debug, Clone, Copy)]
pub struct ArchetypeProfile {
    pub name: &'static str,
    /// Share of base power per stat: exosphere, naval, military
    pub stat_weights: [f64; 3],
    pub preferred_main: &'static [MainAction],
    pub preferred_minor: &'static [MinorAction],
    pub aggression: f64,
}

impl Archetype {
    pub const ALL: [Archetype; 7] = [
        Archetype::Nato,
        Archetype::Csat,
        Archetype::Guerrilla,
        Archetype::Swarm,
        Archetype::Elite,
        Archetype::DefensiveBloc,
        Archetype::Insurgent,
    ];

    pub fn profile(self) -> ArchetypeProfile {
        use MainAction::*;
        use MinorAction::*;
        match self {
            Archetype::Nato => ArchetypeProfile {
                name: "NATO Doctrine",
                stat_weights: [0.3, 0.3, 0.4],
                preferred_main: &[Attack, SuperUnit],
                preferred_minor: &[PrepareAttack, Sabotage],
                aggression: 0.6,
            },
            Archetype::Csat => ArchetypeProfile {
                name: "CSAT Doctrine",
                stat_weights: [0.2, 0.2, 0.6],
                preferred_main: &[Attack, Defend],
                preferred_minor: &[FortifyDefense, Heal],
                aggression: 0.5,
            },
            Archetype::Guerrilla => ArchetypeProfile {
                name: "Guerrilla Force",
                stat_weights: [0.1, 0.1, 0.8],
                preferred_main: &[Defend],
                preferred_minor: &[Sabotage, PrepareAttack],
                aggression: 0.4,
            },
            Archetype::Swarm => ArchetypeProfile {
                name: "Swarm Doctrine",
                stat_weights: [0.4, 0.2, 0.4],
                preferred_main: &[Attack],
                preferred_minor: &[PrepareAttack, Sabotage],
                aggression: 0.8,
            },
            Archetype::Elite => ArchetypeProfile {
                name: "Elite Force",
                stat_weights: [0.3, 0.2, 0.5],
                preferred_main: &[Attack, SuperUnit],
                preferred_minor: &[PrepareAttack, PrepareSuperUnit],
                aggression: 0.7,
            },
            Archetype::DefensiveBloc => ArchetypeProfile {
                name: "Defensive Bloc",
                stat_weights: [0.2, 0.3, 0.5],
                preferred_main: &[Defend],
                preferred_minor: &[FortifyDefense, Heal],
                aggression: 0.3,
            },
            Archetype::Insurgent => ArchetypeProfile {
                name: "Insurgent/Rebel Force",
                stat_weights: [0.05, 0.05, 0.9],
                preferred_main: &[Defend],
                preferred_minor: &[Sabotage, PrepareAttack],
                aggression: 0.6,
            },
        }
    }

    fn key(self) -> &'static str {
        match self {
            Archetype::Nato => "nato",
            Archetype::Csat => "csat",
            Archetype::Guerrilla => "guerrilla",
            Archetype::Swarm => "swarm",
            Archetype::Elite => "elite",
            Archetype::DefensiveBloc => "defensive_bloc",
            Archetype::Insurgent => "insurgent",
        }
    }
}

/// Behavioural layer on top of an archetype
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Personality {
    Aggressive,
    Defensive,
    Adaptive,
    #[default]
    Balanced,
    Berserker,
}

/// Relative weight of each main action
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActionBias {
    pub attack: f64,
    pub defend: f64,
    pub super_unit: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct PersonalityProfile {
    pub name: &'static str,
    pub aggression_modifier: f64,
    pub bias: ActionBias,
}

impl Personality {
    pub const ALL: [Personality; 5] = [
        Personality::Aggressive,
        Personality::Defensive,
        Personality::Adaptive,
        Personality::Balanced,
        Personality::Berserker,
    ];

    pub fn profile(self) -> PersonalityProfile {
        let (name, aggression_modifier, attack, defend, super_unit) = match self {
            Personality::Aggressive => ("Aggressive", 0.3, 0.7, 0.2, 0.1),
            Personality::Defensive => ("Defensive", -0.3, 0.2, 0.7, 0.1),
            Personality::Adaptive => ("Adaptive", 0.0, 0.4, 0.4, 0.2),
            Personality::Balanced => ("Balanced", 0.0, 0.5, 0.4, 0.1),
            Personality::Berserker => ("Berserker", 0.5, 0.9, 0.05, 0.05),
        };
        PersonalityProfile {
            name,
            aggression_modifier,
            bias: ActionBias {
                attack,
                defend,
                super_unit,
            },
        }
    }

    fn key(self) -> &'static str {
        match self {
            Personality::Aggressive => "aggressive",
            Personality::Defensive => "defensive",
            Personality::Adaptive => "adaptive",
            Personality::Balanced => "balanced",
            Personality::Berserker => "berserker",
        }
    }
}

/// Technology era, scaling every generated stat
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TechLevel {
    Legacy,
    #[default]
    Modern,
    Advanced,
    CuttingEdge,
}

impl TechLevel {
    pub const ALL: [TechLevel; 4] = [
        TechLevel::Legacy,
        TechLevel::Modern,
        TechLevel::Advanced,
        TechLevel::CuttingEdge,
    ];

    pub fn stat_multiplier(self) -> f64 {
        match self {
            TechLevel::Legacy => 0.7,
            TechLevel::Modern => 1.0,
            TechLevel::Advanced => 1.2,
            TechLevel::CuttingEdge => 1.4,
        }
    }

    fn key(self) -> &'static str {
        match self {
            TechLevel::Legacy => "legacy",
            TechLevel::Modern => "modern",
            TechLevel::Advanced => "advanced",
            TechLevel::CuttingEdge => "cutting_edge",
        }
    }
}

macro_rules! keyed_enum {
    ($($ty:ident => $what:literal),*) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(self.key())
                }
            }

            impl FromStr for $ty {
                type Err = EngineError;

                fn from_str(s: &str) -> Result<Self, Self::Err> {
                    let key = s.trim().to_ascii_lowercase().replace([' ', '-'], "_");
                    $ty::ALL
                        .into_iter()
                        .find(|v| v.key() == key)
                        .ok_or_else(|| EngineError::Validation(format!("unknown {} '{}'", $what, s)))
                }
            }
        )*
    };
}

keyed_enum!(Archetype => "archetype", Personality => "personality", TechLevel => "tech level");

/// Distribute `base_power` over the three stats by doctrine and tech
pub fn generate_stats(archetype: Archetype, tech: TechLevel, base_power: i32) -> Stats {
    let weights = archetype.profile().stat_weights;
    let multiplier = tech.stat_multiplier();
    let scaled = |weight: f64| (base_power as f64 * weight * multiplier).floor() as i32;
    Stats::new(scaled(weights[0]), scaled(weights[1]), scaled(weights[2]))
}
