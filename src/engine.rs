//! Engine service: load, mutate a draft, verify, save
//!
//! Each call loads the whole collection, works on a clone of the one
//! record it touches and only writes back once that clone passes
//! `check_invariants`. A failed call leaves the store untouched.
//!
//! Calls are not serialized against each other. A host running several
//! triggers at once must queue them per conflict, or the last save wins.

use chrono::{DateTime, Utc};

use crate::conflict::{
    migrate_all, next_conflict_id, AutoTick, Conflict, ConflictBuilder, SideOrders, TurnReport,
};
use crate::core::config::EngineConfig;
use crate::core::error::{EngineError, Result};
use crate::core::random::RandomSource;
use crate::core::types::{ConflictId, OperationId, PerSide, Winner};
use crate::intrigue::{
    apply_effects, cooldown_remaining, find_operation, next_operation_id, resolve, roll_detection,
    DetectionCheck, Operation, OperationBuilder, OperationEffect, OperationKind, Resolution,
};
use crate::store::{ConflictRepository, OperationRepository};

/// What resolving an operation did
#[derive(Debug, Clone, PartialEq)]
pub struct OperationReport {
    pub operation: Operation,
    pub resolution: Resolution,
    pub detection: DetectionCheck,
    pub effects: Vec<OperationEffect>,
}

pub struct Engine<S> {
    store: S,
    config: EngineConfig,
}

impl<S> Engine<S>
where
    S: ConflictRepository + OperationRepository,
{
    pub fn new(store: S, config: EngineConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Every stored conflict, upgraded to the current layout
    pub fn conflicts(&self) -> Result<Vec<Conflict>> {
        let mut conflicts = self.store.load_conflicts()?;
        migrate_all(&mut conflicts, &self.config.conflict)?;
        Ok(conflicts)
    }

    pub fn conflict(&self, id: ConflictId) -> Result<Conflict> {
        self.conflicts()?
            .into_iter()
            .find(|c| c.id == id)
            .ok_or(EngineError::ConflictNotFound(id))
    }

    /// Persist upgraded records once, so later loads skip the migration
    pub fn migrate_store(&mut self) -> Result<usize> {
        let mut conflicts = self.store.load_conflicts()?;
        let count = migrate_all(&mut conflicts, &self.config.conflict)?;
        if count > 0 {
            self.store.save_conflicts(&conflicts)?;
        }
        Ok(count)
    }

    pub fn create_conflict(&mut self, builder: ConflictBuilder, now: DateTime<Utc>) -> Result<Conflict> {
        let mut conflicts = self.conflicts()?;
        let conflict = builder.build(next_conflict_id(&conflicts), now)?;
        conflict.check_invariants()?;
        conflicts.push(conflict.clone());
        self.store.save_conflicts(&conflicts)?;
        Ok(conflict)
    }

    /// Run `change` against a draft of one conflict and commit it if it holds
    pub fn update_conflict<T>(
        &mut self,
        id: ConflictId,
        change: impl FnOnce(&mut Conflict) -> Result<T>,
    ) -> Result<T> {
        let mut conflicts = self.conflicts()?;
        let index = conflicts
            .iter()
            .position(|c| c.id == id)
            .ok_or(EngineError::ConflictNotFound(id))?;

        let mut draft = conflicts[index].clone();
        let outcome = change(&mut draft)?;
        draft.check_invariants()?;
        conflicts[index] = draft;
        self.store.save_conflicts(&conflicts)?;
        Ok(outcome)
    }

    pub fn resolve_turn(
        &mut self,
        id: ConflictId,
        orders: &PerSide<SideOrders>,
        rng: &mut dyn RandomSource,
        now: DateTime<Utc>,
    ) -> Result<TurnReport> {
        let config = self.config.clone();
        self.update_conflict(id, |c| c.resolve_auto_turn(orders, &config, rng, now))
    }

    pub fn resolve_manual_turn(
        &mut self,
        id: ConflictId,
        winner: Winner,
        amount: i32,
        now: DateTime<Utc>,
    ) -> Result<TurnReport> {
        let tuning = self.config.npc.clone();
        self.update_conflict(id, |c| c.resolve_manual_turn(winner, amount, &tuning, now))
    }

    /// Open conflicts idle for at least the configured stagnation window
    pub fn stagnant_conflicts(&self, now: DateTime<Utc>) -> Result<Vec<ConflictId>> {
        let threshold = self.config.conflict.stagnation_hours;
        Ok(self
            .conflicts()?
            .iter()
            .filter(|c| c.is_stagnant(now, threshold))
            .map(|c| c.id)
            .collect())
    }

    /// One scheduler tick over every NPC-vs-NPC conflict
    ///
    /// A conflict whose turn fails is logged and left as it was; the
    /// others still advance.
    pub fn run_due_npc_turns(
        &mut self,
        rng: &mut dyn RandomSource,
        now: DateTime<Utc>,
    ) -> Result<Vec<(ConflictId, AutoTick)>> {
        let mut conflicts = self.conflicts()?;
        let mut ticks = Vec::new();
        for slot in conflicts.iter_mut() {
            let mut draft = slot.clone();
            let tick = match draft
                .run_auto_resolve(&self.config, rng, now)
                .and_then(|tick| draft.check_invariants().map(|_| tick))
            {
                Ok(tick) => tick,
                Err(e) => {
                    tracing::error!("Failed to auto-resolve conflict {}: {}", slot.id, e);
                    continue;
                }
            };
            if !matches!(tick, AutoTick::Skipped(_)) {
                *slot = draft;
                ticks.push((slot.id, tick));
            }
        }
        if !ticks.is_empty() {
            self.store.save_conflicts(&conflicts)?;
        }
        Ok(ticks)
    }

    pub fn operations(&self) -> Result<Vec<Operation>> {
        self.store.load_operations()
    }

    /// Hours before `operator` may run `kind` again
    pub fn cooldown(&self, operator: &str, kind: OperationKind, now: DateTime<Utc>) -> Result<Option<f64>> {
        let operations = self.operations()?;
        Ok(cooldown_remaining(
            &operations,
            operator,
            kind,
            self.config.intrigue.cooldown_for(kind),
            now,
        ))
    }

    /// Record a new pending operation if its operator is off cooldown
    pub fn plan_operation(&mut self, builder: OperationBuilder, now: DateTime<Utc>) -> Result<Operation> {
        let mut operations = self.operations()?;
        let operation = builder.build(next_operation_id(&operations), now)?;
        let cooldown = self.config.intrigue.cooldown_for(operation.kind);
        if let Some(hours) = cooldown_remaining(&operations, &operation.operator, operation.kind, cooldown, now) {
            return Err(EngineError::InvalidTransition(format!(
                "{} cannot run {} for another {:.1} hours",
                operation.operator, operation.kind, hours
            )));
        }
        operations.push(operation.clone());
        self.store.save_operations(&operations)?;
        tracing::info!(
            "Operation {} planned: {} by {} against {}",
            operation.id,
            operation.kind,
            operation.operator_faction,
            operation.target_faction
        );
        Ok(operation)
    }

    pub fn cancel_operation(&mut self, id: OperationId) -> Result<Operation> {
        let mut operations = self.operations()?;
        let index = operations
            .iter()
            .position(|op| op.id == id)
            .ok_or(EngineError::OperationNotFound(id))?;
        let mut draft = operations[index].clone();
        draft.cancel()?;
        operations[index] = draft.clone();
        self.store.save_operations(&operations)?;
        Ok(draft)
    }

    /// Roll, check for detection, then apply what survived
    ///
    /// The terminal operation is saved before any conflict it changed. If
    /// the conflict save fails the previous operations are written back,
    /// so the call either lands whole or can be retried from scratch.
    pub fn resolve_operation(
        &mut self,
        id: OperationId,
        roll: i32,
        rng: &mut dyn RandomSource,
        now: DateTime<Utc>,
    ) -> Result<OperationReport> {
        let previous = self.operations()?;
        let mut operation = find_operation(&previous, id)?.clone();

        let resolution = resolve(&mut operation, roll, now)?;
        let detection = roll_detection(&mut operation, rng)?;

        let mut conflicts = self.conflicts()?;
        let effects = apply_effects(&mut operation, &mut conflicts);
        let touched_conflicts = effects
            .iter()
            .any(|e| matches!(e, OperationEffect::StatReduced { .. }));
        if touched_conflicts {
            for conflict in &conflicts {
                conflict.check_invariants()?;
            }
        }

        let mut operations = previous.clone();
        if let Some(slot) = operations.iter_mut().find(|op| op.id == id) {
            *slot = operation.clone();
        }
        self.store.save_operations(&operations)?;

        if touched_conflicts {
            if let Err(e) = self.store.save_conflicts(&conflicts) {
                if let Err(restore) = self.store.save_operations(&previous) {
                    tracing::error!(
                        "Operation {} left {} after a failed conflict save: {}",
                        id,
                        operation.status,
                        restore
                    );
                }
                return Err(e);
            }
        }

        Ok(OperationReport {
            operation,
            resolution,
            detection,
            effects,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::{MainAction, MinorAction, Stats};
    use crate::conflict::ConflictMode;
    use crate::core::random::ScriptedRandom;
    use crate::core::types::Side;
    use crate::intrigue::OperationStatus;
    use crate::store::MemoryStore;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 1, 8, 0, 0).unwrap()
    }

    fn engine() -> Engine<MemoryStore> {
        Engine::new(MemoryStore::new(), EngineConfig::default())
    }

    #[test]
    fn test_create_assigns_sequential_ids() {
        let mut engine = engine();
        let a = engine.create_conflict(ConflictBuilder::new("Aurora", "Kestrel"), now()).unwrap();
        let b = engine.create_conflict(ConflictBuilder::new("Meridian", "Kestrel"), now()).unwrap();
        assert_eq!(a.id, ConflictId(1));
        assert_eq!(b.id, ConflictId(2));
        assert_eq!(engine.store().conflicts.len(), 2);
    }

    #[test]
    fn test_failed_update_leaves_store_untouched() {
        let mut engine = engine();
        let c = engine.create_conflict(ConflictBuilder::new("Aurora", "Kestrel"), now()).unwrap();
        let saves = engine.store().saves;

        let result = engine.update_conflict(c.id, |c| c.shift_warbar(0, now()));
        assert!(result.is_err());
        assert_eq!(engine.store().saves, saves);

        // a change that breaks the bookkeeping is caught before the write
        let result = engine.update_conflict(c.id, |c| {
            c.warbar = 12;
            Ok(())
        });
        assert!(matches!(result, Err(EngineError::InvariantViolation(_))));
        assert_eq!(engine.conflict(c.id).unwrap().warbar, 0);

        assert!(matches!(
            engine.update_conflict(ConflictId(99), |_| Ok(())),
            Err(EngineError::ConflictNotFound(_))
        ));
    }

    #[test]
    fn test_turn_is_persisted() {
        let mut engine = engine();
        let c = engine
            .create_conflict(
                ConflictBuilder::new("Aurora", "Kestrel")
                    .mode(ConflictMode::PushPullAuto)
                    .stats(Side::Attacker, Stats::new(0, 0, 20))
                    .stats(Side::Defender, Stats::new(0, 0, 20)),
                now(),
            )
            .unwrap();
        let orders = PerSide::new(
            SideOrders::Player {
                main: MainAction::Attack,
                minor: MinorAction::PrepareAttack,
                roll: 18,
            },
            SideOrders::Player {
                main: MainAction::Attack,
                minor: MinorAction::Heal,
                roll: 4,
            },
        );
        let report = engine
            .resolve_turn(c.id, &orders, &mut ScriptedRandom::default(), now())
            .unwrap();
        assert_eq!(report.winner, Winner::Attacker);
        assert_eq!(engine.conflict(c.id).unwrap().warbar, report.damage);
    }

    #[test]
    fn test_ids_continue_after_seeded_store() {
        let seeded = ConflictBuilder::new("Aurora", "Kestrel").build(ConflictId(7), now()).unwrap();
        let mut engine = Engine::new(MemoryStore::with_conflicts(vec![seeded]), EngineConfig::default());
        let next = engine.create_conflict(ConflictBuilder::new("Meridian", "Kestrel"), now()).unwrap();
        assert_eq!(next.id, ConflictId(8));
        let store = engine.into_store();
        assert_eq!(store.conflicts.len(), 2);
        assert_eq!(store.saves, 1);
    }

    #[test]
    fn test_stagnation_listing() {
        let mut engine = engine();
        let c = engine.create_conflict(ConflictBuilder::new("Aurora", "Kestrel"), now()).unwrap();
        assert!(engine.stagnant_conflicts(now() + Duration::hours(3)).unwrap().is_empty());
        assert_eq!(engine.stagnant_conflicts(now() + Duration::hours(30)).unwrap(), vec![c.id]);
    }

    #[test]
    fn test_operation_cooldown_blocks_replanning() {
        let mut engine = engine();
        let op = engine
            .plan_operation(
                OperationBuilder::new(OperationKind::Espionage, "Aurora", "Kestrel").operator("agent-7"),
                now(),
            )
            .unwrap();
        let report = engine
            .resolve_operation(op.id, 20, &mut ScriptedRandom::default(), now())
            .unwrap();
        assert_eq!(report.operation.status, OperationStatus::Success);
        assert_eq!(report.detection, DetectionCheck::Skipped);

        let again = OperationBuilder::new(OperationKind::Espionage, "Aurora", "Kestrel").operator("agent-7");
        assert!(matches!(
            engine.plan_operation(again.clone(), now() + Duration::hours(2)),
            Err(EngineError::InvalidTransition(_))
        ));
        assert!(engine.plan_operation(again, now() + Duration::hours(12)).is_ok());
    }

    #[test]
    fn test_cancel_operation() {
        let mut engine = engine();
        let op = engine
            .plan_operation(OperationBuilder::new(OperationKind::Rebellion, "Aurora", "Kestrel"), now())
            .unwrap();
        assert_eq!(engine.cancel_operation(op.id).unwrap().status, OperationStatus::Cancelled);
        assert!(engine.cancel_operation(op.id).is_err());
        assert!(matches!(
            engine.cancel_operation(OperationId(42)),
            Err(EngineError::OperationNotFound(_))
        ));
    }
}
