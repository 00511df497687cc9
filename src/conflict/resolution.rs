//! Turn resolution: rolled turns, GM turns and scheduled NPC turns

use chrono::{DateTime, Utc};

use super::fronts::FrontEffect;
use super::model::{AutoResolveCheck, Conflict};
use crate::combat::constants::{DEFEND_DAMAGE_DIVISOR, DIE_MAX, DIE_MIN};
use crate::combat::{
    apply_sabotage_penalty, combat_modifiers, damage_from_margin, decay_modifiers,
    update_strategic_momentum, update_tactical_momentum, CombatContext, MainAction, MinorAction,
    SuperUnitIntel,
};
use crate::core::config::{EngineConfig, NpcTuning};
use crate::core::error::{invalid, EngineError, Result};
use crate::core::random::RandomSource;
use crate::core::types::{ModifierBreakdown, PerSide, Side, Winner};
use crate::npc::{choose_actions, Outcome, Situation};

/// Who decides a side's actions this turn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SideOrders {
    /// Actions and d20 roll supplied by the players
    Player {
        main: MainAction,
        minor: MinorAction,
        roll: i32,
    },
    /// The side's AI picks its actions and rolls its own die
    Npc,
}

/// One side's half of a rolled turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SideTurn {
    pub main: MainAction,
    pub minor: MinorAction,
    pub roll: i32,
    pub modifiers: ModifierBreakdown,
    pub total: i32,
    pub by_npc: bool,
    /// Super unit spent on this turn
    pub super_unit: Option<SuperUnitIntel>,
}

/// Everything a presentation layer needs to narrate a turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnReport {
    pub turn: u32,
    /// Present for rolled turns
    pub sides: Option<PerSide<SideTurn>>,
    pub winner: Winner,
    pub margin: i32,
    pub damage: i32,
    pub effect: FrontEffect,
    pub tactical_momentum: i32,
    pub strategic_momentum: PerSide<u8>,
    pub concluded: Option<Winner>,
}

/// Result of one scheduler tick against a conflict
#[derive(Debug, Clone, PartialEq)]
pub enum AutoTick {
    Skipped(AutoResolveCheck),
    Resolved(Box<TurnReport>),
    /// Turn limit reached; the defender held
    TurnLimit,
}

impl Conflict {
    fn validate_orders(&self, orders: &PerSide<SideOrders>) -> Result<()> {
        self.ensure_open()?;
        if !self.mode.is_auto() {
            return Err(EngineError::InvalidTransition(format!(
                "conflict {} in {} mode takes GM shifts, not rolls",
                self.id, self.mode
            )));
        }
        for side in Side::BOTH {
            match *orders.get(side) {
                SideOrders::Player { main, roll, .. } => {
                    if !(DIE_MIN..=DIE_MAX).contains(&roll) {
                        return invalid(format!("{} roll {} outside {}..={}", side, roll, DIE_MIN, DIE_MAX));
                    }
                    if main == MainAction::SuperUnit && self.pending_super_units.get(side).is_empty() {
                        return invalid(format!("{} has no super unit staged", side));
                    }
                }
                SideOrders::Npc => {
                    if !self.is_npc(side) {
                        return invalid(format!("{} side is not AI-controlled", side));
                    }
                }
            }
        }
        Ok(())
    }

    /// Resolve one rolled turn
    ///
    /// AI sides pick actions first, then roll in attacker, defender order.
    /// Totals within the stalemate band are a stalemate; otherwise the
    /// margin and the winner's strategic momentum set the damage, halved
    /// when the loser stood on the defensive.
    pub fn resolve_auto_turn(
        &mut self,
        orders: &PerSide<SideOrders>,
        config: &EngineConfig,
        rng: &mut dyn RandomSource,
        now: DateTime<Utc>,
    ) -> Result<TurnReport> {
        self.validate_orders(orders)?;

        let mut actions = PerSide::new(
            (MainAction::Attack, MinorAction::PrepareAttack, false),
            (MainAction::Attack, MinorAction::PrepareAttack, false),
        );
        for side in Side::BOTH {
            *actions.get_mut(side) = match *orders.get(side) {
                SideOrders::Player { main, minor, .. } => (main, minor, false),
                SideOrders::Npc => {
                    let Some(npc) = self.npc.get(side).as_ref() else {
                        return invalid(format!("{} side is not AI-controlled", side));
                    };
                    let situation = Situation {
                        side,
                        tactical_momentum: self.tactical_momentum,
                        super_unit_staged: !self.pending_super_units.get(side).is_empty(),
                    };
                    let decision = choose_actions(npc, &situation, &config.npc, rng);
                    (decision.main, decision.minor, true)
                }
            };
        }
        let mut rolls = PerSide::new(0, 0);
        for side in Side::BOTH {
            *rolls.get_mut(side) = match *orders.get(side) {
                SideOrders::Player { roll, .. } => roll,
                SideOrders::Npc => rng.roll_d20(),
            };
        }

        let build_side = |side: Side| -> SideTurn {
            let (main, minor, by_npc) = *actions.get(side);
            let super_unit = if main == MainAction::SuperUnit {
                self.pending_super_units.get(side).first().cloned()
            } else {
                None
            };
            let ctx = CombatContext {
                side,
                theater: self.theater_kind,
                stats: &self.stats,
                active_modifiers: self.modifiers.get(side),
                tactical_momentum: self.tactical_momentum,
                super_unit: super_unit.as_ref(),
            };
            let mut modifiers = combat_modifiers(&ctx, main, minor);
            if actions.get(side.opponent()).1 == MinorAction::Sabotage {
                apply_sabotage_penalty(&mut modifiers);
            }
            let roll = *rolls.get(side);
            SideTurn {
                main,
                minor,
                roll,
                total: roll + modifiers.total,
                modifiers,
                by_npc,
                super_unit,
            }
        };
        let sides = PerSide::new(build_side(Side::Attacker), build_side(Side::Defender));

        let difference = sides.attacker.total - sides.defender.total;
        let margin = difference.abs();
        let winner = if margin <= config.conflict.stalemate_band {
            Winner::Stalemate
        } else if difference > 0 {
            Winner::Attacker
        } else {
            Winner::Defender
        };

        let mut damage = 0;
        let mut effect = FrontEffect::None;
        if let Some(side) = winner.side() {
            damage = damage_from_margin(margin, *self.strategic_momentum.get(side));
            if sides.get(side.opponent()).main == MainAction::Defend {
                damage /= DEFEND_DAMAGE_DIVISOR;
            }
            effect = self.deal_damage(side, damage);
        }

        for side in Side::BOTH {
            if sides.get(side).super_unit.is_some() {
                let spent = self.pending_super_units.get_mut(side).remove(0);
                tracing::debug!("{} committed super unit '{}'", side, spent.name);
            }
        }

        let mut report = TurnReport {
            turn: 0,
            sides: Some(sides),
            winner,
            margin,
            damage,
            effect,
            tactical_momentum: 0,
            strategic_momentum: PerSide::default(),
            concluded: None,
        };
        self.finish_turn(&mut report, &config.npc, now);
        Ok(report)
    }

    /// Resolve a GM-dictated turn: `amount` of damage to the loser
    pub fn resolve_manual_turn(
        &mut self,
        winner: Winner,
        amount: i32,
        tuning: &NpcTuning,
        now: DateTime<Utc>,
    ) -> Result<TurnReport> {
        self.ensure_open()?;
        if self.mode.is_auto() {
            return Err(EngineError::InvalidTransition(format!(
                "conflict {} in {} mode resolves by rolls",
                self.id, self.mode
            )));
        }
        let (damage, effect) = match winner.side() {
            Some(side) => {
                if amount <= 0 {
                    return invalid(format!("damage must be positive, got {}", amount));
                }
                (amount, self.deal_damage(side, amount))
            }
            None => {
                if amount < 0 {
                    return invalid(format!("damage must not be negative, got {}", amount));
                }
                (0, FrontEffect::None)
            }
        };

        let mut report = TurnReport {
            turn: 0,
            sides: None,
            winner,
            margin: damage,
            damage,
            effect,
            tactical_momentum: 0,
            strategic_momentum: PerSide::default(),
            concluded: None,
        };
        self.finish_turn(&mut report, tuning, now);
        Ok(report)
    }

    /// Run a scheduled NPC-vs-NPC turn if one is due
    pub fn run_auto_resolve(
        &mut self,
        config: &EngineConfig,
        rng: &mut dyn RandomSource,
        now: DateTime<Utc>,
    ) -> Result<AutoTick> {
        match self.auto_resolve_check(now) {
            AutoResolveCheck::Due => {
                let orders = PerSide::splat(SideOrders::Npc);
                let report = self.resolve_auto_turn(&orders, config, rng, now)?;
                self.auto_resolve.turn_count += 1;
                self.auto_resolve.last_resolution = Some(now);
                tracing::info!(
                    "Auto-resolved conflict {} (turn {}/{})",
                    self.id,
                    self.auto_resolve.turn_count,
                    self.auto_resolve.max_turns
                );
                Ok(AutoTick::Resolved(Box::new(report)))
            }
            AutoResolveCheck::TurnLimitReached => {
                tracing::info!(
                    "Conflict {} reached {} turns; {} held",
                    self.id,
                    self.auto_resolve.max_turns,
                    self.defender
                );
                self.conclude(Winner::Defender, now);
                Ok(AutoTick::TurnLimit)
            }
            other => Ok(AutoTick::Skipped(other)),
        }
    }

    /// Land `damage` against the side opposite `winner`
    fn deal_damage(&mut self, winner: Side, damage: i32) -> FrontEffect {
        if self.mode.is_attrition() {
            let loser = winner.opponent();
            FrontEffect::Health {
                side: loser,
                report: self.apply_health_damage(loser, damage),
            }
        } else {
            FrontEffect::Bar(self.apply_bar_shift(winner.sign() * damage))
        }
    }

    /// Bookkeeping shared by every kind of turn
    fn finish_turn(&mut self, report: &mut TurnReport, tuning: &NpcTuning, now: DateTime<Utc>) {
        let winner = report.winner;
        self.tactical_momentum = update_tactical_momentum(self.tactical_momentum, winner);
        update_strategic_momentum(&mut self.strategic_momentum, winner);

        for side in Side::BOTH {
            decay_modifiers(self.modifiers.get_mut(side));
            if let Some(npc) = self.npc.get_mut(side).as_mut() {
                let (outcome, margin) = match winner.side() {
                    None => (Outcome::Stalemate, report.margin),
                    Some(w) if w == side => (Outcome::Win, report.margin),
                    Some(_) => (Outcome::Loss, -report.margin),
                };
                npc.learning.record(outcome, margin, tuning);
            }
        }

        self.turn += 1;
        self.initiative = self.initiative.opponent();
        self.last_update = now;
        report.turn = self.turn;
        report.tactical_momentum = self.tactical_momentum;
        report.strategic_momentum = self.strategic_momentum.clone();
        report.concluded = self.check_conclusion(now);

        tracing::info!(
            "Conflict {} turn {}: {} by {} (damage {}, momentum {:+})",
            self.id,
            self.turn,
            winner,
            report.margin,
            report.damage,
            self.tactical_momentum
        );
    }
}
