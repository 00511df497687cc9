//! What a successful operation does to the world

use std::fmt;

use super::kinds::{OperationKind, OperationStatus, Scale};
use super::operation::Operation;
use crate::combat::StatKind;
use crate::conflict::Conflict;
use crate::core::types::{ConflictId, Side};

/// One applied effect, for narration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationEffect {
    IntelGathered {
        target: String,
    },
    StatReduced {
        conflict: ConflictId,
        side: Side,
        stat: StatKind,
        from: i32,
        to: i32,
    },
    RebellionIncited {
        target: String,
    },
    InfluenceSpread {
        target: String,
        influence_type: String,
        scale: Scale,
    },
    TargetEliminated {
        target_name: String,
    },
    ProtectionEstablished {
        target: String,
    },
}

impl fmt::Display for OperationEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationEffect::IntelGathered { target } => {
                write!(f, "Intelligence gathered on {}", target)
            }
            OperationEffect::StatReduced {
                conflict,
                side,
                stat,
                from,
                to,
            } => write!(
                f,
                "Sabotage reduced the {} {} in conflict {} from {} to {}",
                side, stat, conflict, from, to
            ),
            OperationEffect::RebellionIncited { target } => {
                write!(f, "Rebellion incited in {} territory", target)
            }
            OperationEffect::InfluenceSpread {
                target,
                influence_type,
                scale,
            } => write!(
                f,
                "{} influence increased in {} ({} scale)",
                influence_type, target, scale
            ),
            OperationEffect::TargetEliminated { target_name } => {
                write!(f, "Assassination of {} successful", target_name)
            }
            OperationEffect::ProtectionEstablished { target } => {
                write!(f, "Counter-intelligence protection established against {}", target)
            }
        }
    }
}

/// Stat points a sabotage removes; half, rounded down, on a partial success
pub fn sabotage_reduction(scale: Scale, status: OperationStatus) -> i32 {
    let full = scale.sabotage_reduction();
    if status == OperationStatus::Partial {
        full / 2
    } else {
        full
    }
}

/// Apply a succeeded operation; anything else has no effect
///
/// Sabotage lowers the chosen stat of the target faction in every open
/// conflict it fights in. The other kinds only set flags on the
/// operation for processes outside the engine.
pub fn apply_effects(operation: &mut Operation, conflicts: &mut [Conflict]) -> Vec<OperationEffect> {
    if !operation.status.succeeded() {
        return Vec::new();
    }

    let target = operation.target_faction.clone();
    let mut effects = Vec::new();
    match operation.kind {
        OperationKind::Espionage => {
            operation.flags.intel_gathered = true;
            effects.push(OperationEffect::IntelGathered { target });
        }
        OperationKind::Sabotage => {
            let stat = operation
                .circumstances
                .target_category
                .unwrap_or(StatKind::Military);
            let reduction = sabotage_reduction(operation.scale, operation.status);
            for conflict in conflicts.iter_mut().filter(|c| !c.concluded) {
                for side in Side::BOTH {
                    if conflict.faction(side) != target {
                        continue;
                    }
                    let value = conflict.stats.get_mut(side).get_mut(stat);
                    let from = *value;
                    *value = (from - reduction).max(0);
                    tracing::info!(
                        "Sabotage by {} cut {} {} in conflict {}: {} -> {}",
                        operation.operator_faction,
                        target,
                        stat,
                        conflict.id,
                        from,
                        *value
                    );
                    effects.push(OperationEffect::StatReduced {
                        conflict: conflict.id,
                        side,
                        stat,
                        from,
                        to: *value,
                    });
                }
            }
        }
        OperationKind::Rebellion => {
            operation.flags.rebellion_active = true;
            effects.push(OperationEffect::RebellionIncited { target });
        }
        OperationKind::Influence => {
            operation.flags.influence_progress = Some(operation.scale);
            let influence_type = operation
                .circumstances
                .influence_type
                .clone()
                .unwrap_or_else(|| "political".to_string());
            effects.push(OperationEffect::InfluenceSpread {
                target,
                influence_type,
                scale: operation.scale,
            });
        }
        OperationKind::Assassination => {
            operation.flags.target_eliminated = true;
            let target_name = operation
                .circumstances
                .target_name
                .clone()
                .unwrap_or_else(|| "key figure".to_string());
            effects.push(OperationEffect::TargetEliminated { target_name });
        }
        OperationKind::CounterIntel => {
            operation.flags.protection_active = true;
            effects.push(OperationEffect::ProtectionEstablished { target });
        }
    }
    effects
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::Stats;
    use crate::conflict::{ConflictBuilder, ConflictMode};
    use crate::core::types::OperationId;
    use crate::intrigue::operation::{Circumstances, OperationBuilder};
    use chrono::{TimeZone, Utc};

    fn conflict(id: u32, attacker: &str, defender: &str) -> Conflict {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        ConflictBuilder::new(attacker, defender)
            .mode(ConflictMode::PushPullManual)
            .stats(Side::Attacker, Stats::new(10, 10, 8))
            .stats(Side::Defender, Stats::new(10, 10, 30))
            .build(ConflictId(id), now)
            .unwrap()
    }

    fn sabotage(scale: Scale, status: OperationStatus) -> Operation {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        let mut op = OperationBuilder::new(OperationKind::Sabotage, "Aurora", "Kestrel")
            .scale(scale)
            .circumstances(Circumstances {
                target_category: Some(StatKind::Military),
                ..Circumstances::default()
            })
            .build(OperationId(1), now)
            .unwrap();
        op.status = status;
        op
    }

    #[test]
    fn test_sabotage_hits_every_open_conflict() {
        let mut conflicts = vec![
            conflict(1, "Kestrel", "Aurora"),
            conflict(2, "Meridian", "Kestrel"),
            conflict(3, "Kestrel", "Meridian"),
        ];
        conflicts[2].concluded = true;
        let mut op = sabotage(Scale::Large, OperationStatus::Success);

        let effects = apply_effects(&mut op, &mut conflicts);
        assert_eq!(effects.len(), 2);
        // attacker military 8 floors at 0
        assert_eq!(conflicts[0].stats.attacker.military, 0);
        assert_eq!(conflicts[1].stats.defender.military, 15);
        assert_eq!(conflicts[2].stats.attacker.military, 8);
    }

    #[test]
    fn test_partial_sabotage_is_halved() {
        assert_eq!(sabotage_reduction(Scale::Small, OperationStatus::Partial), 2);
        assert_eq!(sabotage_reduction(Scale::Massive, OperationStatus::Partial), 10);
        assert_eq!(sabotage_reduction(Scale::Medium, OperationStatus::Success), 10);
    }

    #[test]
    fn test_failed_operation_does_nothing() {
        let mut conflicts = vec![conflict(1, "Kestrel", "Aurora")];
        let mut op = sabotage(Scale::Massive, OperationStatus::Detected);
        assert!(apply_effects(&mut op, &mut conflicts).is_empty());
        assert_eq!(conflicts[0].stats.attacker.military, 8);
    }

    #[test]
    fn test_flag_effects() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        let mut op = OperationBuilder::new(OperationKind::Assassination, "Aurora", "Kestrel")
            .circumstances(Circumstances {
                target_name: Some("Admiral Voss".into()),
                ..Circumstances::default()
            })
            .build(OperationId(2), now)
            .unwrap();
        op.status = OperationStatus::Partial;
        let effects = apply_effects(&mut op, &mut []);
        assert!(op.flags.target_eliminated);
        assert_eq!(effects[0].to_string(), "Assassination of Admiral Voss successful");
    }
}
