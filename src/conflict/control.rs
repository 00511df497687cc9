//! GM-facing controls: modifiers, initiative, AI hand-over, super units, ending

use chrono::{DateTime, Utc};

use super::model::Conflict;
use crate::combat::{CombatModifier, ModifierDuration, Stats, SuperUnitIntel};
use crate::core::error::{invalid, EngineError, Result};
use crate::core::types::{ModifierId, Side, Winner};
use crate::npc::NpcConfig;

impl Conflict {
    /// Add a GM modifier; the duration must parse strictly
    pub fn add_modifier(
        &mut self,
        side: Side,
        name: &str,
        value: i32,
        duration: &str,
        now: DateTime<Utc>,
    ) -> Result<ModifierId> {
        self.ensure_open()?;
        let name = name.trim();
        if name.is_empty() {
            return invalid("modifier name must not be empty");
        }
        let duration: ModifierDuration = duration.parse()?;
        let modifiers = self.modifiers.get_mut(side);
        let id = ModifierId(modifiers.iter().map(|m| m.id.0).max().unwrap_or(0) + 1);
        modifiers.push(CombatModifier {
            id,
            name: name.to_string(),
            value,
            duration,
        });
        self.last_update = now;
        tracing::debug!("Modifier {} '{}' ({:+}) added for the {}", id, name, value, side);
        Ok(id)
    }

    pub fn remove_modifier(&mut self, side: Side, id: ModifierId, now: DateTime<Utc>) -> Result<CombatModifier> {
        self.ensure_open()?;
        let modifiers = self.modifiers.get_mut(side);
        let index = modifiers
            .iter()
            .position(|m| m.id == id)
            .ok_or(EngineError::ModifierNotFound { side, modifier: id })?;
        let removed = modifiers.remove(index);
        self.last_update = now;
        Ok(removed)
    }

    /// Hand the initiative to the other side
    pub fn pass_initiative(&mut self, now: DateTime<Utc>) -> Result<Side> {
        self.ensure_open()?;
        self.initiative = self.initiative.opponent();
        self.last_update = now;
        Ok(self.initiative)
    }

    /// End the conflict by GM decision
    pub fn end(&mut self, victor: Winner, now: DateTime<Utc>) -> Result<()> {
        self.ensure_open()?;
        self.conclude(victor, now);
        Ok(())
    }

    pub fn set_stats(&mut self, side: Side, stats: Stats, now: DateTime<Utc>) -> Result<()> {
        self.ensure_open()?;
        if stats.exosphere < 0 || stats.naval < 0 || stats.military < 0 {
            return invalid(format!("{} stats must not be negative", side));
        }
        *self.stats.get_mut(side) = stats;
        self.last_update = now;
        Ok(())
    }

    /// Put a side under AI control; its stats are regenerated from the doctrine
    pub fn configure_npc(&mut self, side: Side, config: NpcConfig, now: DateTime<Utc>) -> Result<()> {
        self.ensure_open()?;
        if config.base_power <= 0 {
            return invalid(format!("base power must be positive, got {}", config.base_power));
        }
        *self.stats.get_mut(side) = config.stats();
        tracing::info!(
            "Conflict {}: {} side now AI-controlled ({}, {}, {})",
            self.id,
            side,
            config.archetype,
            config.tech_level,
            config.personality
        );
        *self.npc.get_mut(side) = Some(config);
        self.last_update = now;
        Ok(())
    }

    /// Return a side to its players; scheduled turns stop
    pub fn release_npc(&mut self, side: Side, now: DateTime<Utc>) -> Result<NpcConfig> {
        self.ensure_open()?;
        let config = self
            .npc
            .get_mut(side)
            .take()
            .ok_or_else(|| EngineError::InvalidTransition(format!("{} side is not AI-controlled", side)))?;
        self.auto_resolve.enabled = false;
        self.last_update = now;
        Ok(config)
    }

    /// Queue a super unit for a later `super_unit` main action
    pub fn stage_super_unit(
        &mut self,
        side: Side,
        name: &str,
        current_intel: u32,
        max_intel: u32,
        now: DateTime<Utc>,
    ) -> Result<()> {
        self.ensure_open()?;
        let name = name.trim();
        if name.is_empty() {
            return invalid("super unit name must not be empty");
        }
        if current_intel > max_intel {
            return invalid(format!("intel {} exceeds its maximum {}", current_intel, max_intel));
        }
        self.pending_super_units.get_mut(side).push(SuperUnitIntel {
            name: name.to_string(),
            current_intel,
            max_intel,
        });
        self.last_update = now;
        Ok(())
    }

    /// Schedule NPC-vs-NPC turns; both sides must be AI-controlled
    pub fn enable_auto_resolve(&mut self, interval_hours: f64, max_turns: u32, now: DateTime<Utc>) -> Result<()> {
        self.ensure_open()?;
        if !self.mode.is_auto() {
            return Err(EngineError::InvalidTransition(format!(
                "conflict {} in {} mode cannot roll its own turns",
                self.id, self.mode
            )));
        }
        if !(self.is_npc(Side::Attacker) && self.is_npc(Side::Defender)) {
            return Err(EngineError::InvalidTransition(
                "auto-resolve needs both sides AI-controlled".into(),
            ));
        }
        if interval_hours <= 0.0 || max_turns == 0 {
            return invalid("auto-resolve needs a positive interval and turn limit");
        }
        self.auto_resolve.enabled = true;
        self.auto_resolve.interval_hours = interval_hours;
        self.auto_resolve.max_turns = max_turns;
        self.last_update = now;
        Ok(())
    }

    pub fn disable_auto_resolve(&mut self, now: DateTime<Utc>) -> Result<()> {
        self.ensure_open()?;
        self.auto_resolve.enabled = false;
        self.last_update = now;
        Ok(())
    }
}
