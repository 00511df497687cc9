//! Modifier and momentum calculator

pub mod constants;
pub mod modifiers;
pub mod momentum;

pub use modifiers::{
    advantage_for_ratio, apply_sabotage_penalty, combat_modifiers, stat_advantage, CombatContext,
    CombatModifier, MainAction, MinorAction, ModifierDuration, StatKind, Stats, SuperUnitIntel,
    TheaterKind,
};
pub use momentum::{
    damage_from_margin, decay_modifiers, update_strategic_momentum, update_tactical_momentum,
};
