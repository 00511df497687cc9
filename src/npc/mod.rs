//! NPC decision engine

pub mod decision;
pub mod learning;
pub mod profile;

pub use decision::{choose_actions, effective_aggression, NpcConfig, NpcDecision, Situation};
pub use learning::{LearningData, Outcome, OutcomeRecord};
pub use profile::{generate_stats, ActionBias, Archetype, Personality, TechLevel};
