//! Rolling an operation and checking whether it was caught

use chrono::{DateTime, Utc};
use std::fmt;

use super::kinds::{OperationKind, OperationStatus};
use super::operation::Operation;
use crate::combat::constants::{DIE_MAX, DIE_MIN};
use crate::core::error::{invalid, EngineError, Result};
use crate::core::random::RandomSource;
use crate::core::types::ModifierBreakdown;

/// Penalty when the target runs counter-intelligence
pub const ENEMY_COUNTERINTEL_PENALTY: i32 = -3;
/// Bonus for counter-intelligence run from a defensive posture
pub const DEFENSIVE_STANCE_BONUS: i32 = 2;

// Margin tiers
const EXCEPTIONAL_MARGIN: i32 = 10;
const SUCCESS_MARGIN: i32 = 5;
const PARTIAL_MARGIN: i32 = 0;
const FAILURE_MARGIN: i32 = -5;

/// Modifiers applied to an operation's roll, in display order
pub fn compute_modifiers(operation: &Operation) -> ModifierBreakdown {
    let mut breakdown = ModifierBreakdown::new();
    let mut push_nonzero = |label: &str, value: i32| {
        if value != 0 {
            breakdown.push(label, value);
        }
    };

    push_nonzero("Operator Skill", operation.operator_skill);
    push_nonzero("Operation Scale", operation.scale.roll_modifier());
    push_nonzero("Target Strength", operation.target_strength.roll_modifier());

    let c = &operation.circumstances;
    match operation.kind {
        OperationKind::Rebellion => push_nonzero("Target Unrest", c.target_unrest.roll_modifier()),
        OperationKind::Influence => {
            push_nonzero("Cultural Similarity", c.cultural_similarity.roll_modifier())
        }
        OperationKind::Assassination => {
            push_nonzero("Target Security", c.target_security.roll_modifier())
        }
        OperationKind::CounterIntel if c.defensive_stance => {
            push_nonzero("Defensive Stance", DEFENSIVE_STANCE_BONUS)
        }
        _ => {}
    }

    if c.target_has_counterintel {
        push_nonzero("Enemy Counter-Intel", ENEMY_COUNTERINTEL_PENALTY);
    }

    breakdown
}

/// How a resolution came out, for narration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    CriticalSuccess,
    CriticalFailure,
    Exceptional,
    Success,
    Partial,
    Failure,
    MajorFailure,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Outcome::CriticalSuccess => "Critical success: executed flawlessly",
            Outcome::CriticalFailure => "Critical failure: agents identified",
            Outcome::Exceptional => "Exceptional success",
            Outcome::Success => "Success",
            Outcome::Partial => "Partial success: mixed results",
            Outcome::Failure => "Failure",
            Outcome::MajorFailure => "Major failure: the operation backfired",
        };
        f.write_str(text)
    }
}

/// Result of [`resolve`]
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub outcome: Outcome,
    pub status: OperationStatus,
    pub total: i32,
    /// `None` for natural 1s and 20s
    pub margin: Option<i32>,
    pub detection_risk: f64,
}

/// Roll an open operation against its DC
///
/// A natural 20 always succeeds and cannot be detected, a natural 1 is
/// detected on the spot. Otherwise the margin over the DC picks the tier
/// and scales the detection risk.
pub fn resolve(operation: &mut Operation, roll: i32, now: DateTime<Utc>) -> Result<Resolution> {
    if !(DIE_MIN..=DIE_MAX).contains(&roll) {
        return invalid(format!("roll {} outside {}..={}", roll, DIE_MIN, DIE_MAX));
    }
    if !operation.status.is_open() {
        return Err(EngineError::InvalidTransition(format!(
            "operation {} is already {}",
            operation.id, operation.status
        )));
    }

    let modifiers = compute_modifiers(operation);
    let total = roll + modifiers.total;
    operation.roll = Some(roll);
    operation.total = Some(total);
    operation.modifiers = modifiers;
    operation.resolved_at = Some(now);

    let (outcome, margin) = if roll == DIE_MAX {
        operation.detection_risk = 0.0;
        (Outcome::CriticalSuccess, None)
    } else if roll == DIE_MIN {
        operation.detected_by = Some(operation.target_faction.clone());
        (Outcome::CriticalFailure, None)
    } else {
        let margin = total - operation.difficulty;
        let outcome = if margin >= EXCEPTIONAL_MARGIN {
            operation.detection_risk *= 0.5;
            Outcome::Exceptional
        } else if margin >= SUCCESS_MARGIN {
            Outcome::Success
        } else if margin >= PARTIAL_MARGIN {
            operation.detection_risk *= 1.5;
            Outcome::Partial
        } else if margin >= FAILURE_MARGIN {
            operation.detection_risk *= 2.0;
            Outcome::Failure
        } else {
            operation.detection_risk = 1.0;
            Outcome::MajorFailure
        };
        (outcome, Some(margin))
    };
    operation.detection_risk = operation.detection_risk.clamp(0.0, 1.0);

    operation.status = match outcome {
        Outcome::CriticalSuccess | Outcome::Exceptional | Outcome::Success => OperationStatus::Success,
        Outcome::Partial => OperationStatus::Partial,
        Outcome::Failure | Outcome::MajorFailure => OperationStatus::Failure,
        Outcome::CriticalFailure => OperationStatus::Detected,
    };

    tracing::info!(
        "Operation {} ({}) rolled {} total {} vs DC {}: {}",
        operation.id,
        operation.kind,
        roll,
        total,
        operation.difficulty,
        operation.status
    );

    Ok(Resolution {
        outcome,
        status: operation.status,
        total,
        margin,
        detection_risk: operation.detection_risk,
    })
}

/// Why a detected operation was caught
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionCause {
    /// Risk of 70% or more
    Obvious,
    /// Risk of 40% or more
    CounterIntelligence,
    BadLuck,
}

impl DetectionCause {
    pub fn for_risk(risk: f64) -> Self {
        if risk >= 0.7 {
            DetectionCause::Obvious
        } else if risk >= 0.4 {
            DetectionCause::CounterIntelligence
        } else {
            DetectionCause::BadLuck
        }
    }
}

impl fmt::Display for DetectionCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            DetectionCause::Obvious => "the operation was obvious and immediately noticed",
            DetectionCause::CounterIntelligence => "counter-intelligence identified the operation",
            DetectionCause::BadLuck => "a stroke of bad luck exposed the operation",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionCheck {
    /// A natural 1 or 20 already settled it
    Skipped,
    Undetected,
    Detected(DetectionCause),
}

/// Draw once against the detection risk of a freshly resolved operation
pub fn roll_detection(operation: &mut Operation, rng: &mut dyn RandomSource) -> Result<DetectionCheck> {
    if matches!(operation.roll, Some(DIE_MIN) | Some(DIE_MAX)) {
        return Ok(DetectionCheck::Skipped);
    }
    let resolved = matches!(
        operation.status,
        OperationStatus::Success | OperationStatus::Partial | OperationStatus::Failure
    );
    if !resolved || operation.detection_rolled {
        return Err(EngineError::InvalidTransition(format!(
            "operation {} ({}) cannot be checked for detection",
            operation.id, operation.status
        )));
    }

    operation.detection_rolled = true;
    // no draw at zero risk so seeded streams stay aligned
    if operation.detection_risk <= 0.0 {
        return Ok(DetectionCheck::Undetected);
    }
    let draw = rng.next_f64();
    if draw < operation.detection_risk {
        let cause = DetectionCause::for_risk(operation.detection_risk);
        operation.status = OperationStatus::Detected;
        operation.detected_by = Some(operation.target_faction.clone());
        tracing::warn!(
            "Operation {} detected by {}: {}",
            operation.id,
            operation.target_faction,
            cause
        );
        Ok(DetectionCheck::Detected(cause))
    } else {
        Ok(DetectionCheck::Undetected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::random::ScriptedRandom;
    use crate::core::types::OperationId;
    use crate::intrigue::kinds::{Scale, Security, TargetStrength};
    use crate::intrigue::operation::{Circumstances, OperationBuilder};
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    fn sabotage(skill: i32, strength: TargetStrength) -> Operation {
        OperationBuilder::new(OperationKind::Sabotage, "Aurora", "Kestrel")
            .operator_skill(skill)
            .target_strength(strength)
            .difficulty(14)
            .build(OperationId(1), now())
            .unwrap()
    }

    #[test]
    fn test_success_with_risk_unchanged() {
        let mut op = sabotage(2, TargetStrength::Weak);
        let risk = op.detection_risk;
        let resolution = resolve(&mut op, 18, now()).unwrap();

        assert_eq!(resolution.total, 23);
        assert_eq!(resolution.margin, Some(9));
        assert_eq!(op.status, OperationStatus::Success);
        assert_eq!(op.detection_risk, risk);
        assert_eq!(op.total, Some(op.roll.unwrap() + op.modifiers.total));
    }

    #[test]
    fn test_margin_tiers_scale_risk() {
        let cases = [
            (20, OperationStatus::Success, 0.0),
            (19, OperationStatus::Success, 0.15),
            (14, OperationStatus::Success, 0.30),
            (10, OperationStatus::Partial, 0.45),
            (5, OperationStatus::Failure, 0.60),
            (2, OperationStatus::Failure, 1.0),
        ];
        for (roll, status, risk) in cases {
            // skill 5, medium target: total = roll + 5 vs DC 14
            let mut op = sabotage(5, TargetStrength::Medium);
            resolve(&mut op, roll, now()).unwrap();
            assert_eq!(op.status, status, "roll {}", roll);
            assert!((op.detection_risk - risk).abs() < 1e-9, "roll {} risk {}", roll, op.detection_risk);
        }
    }

    #[test]
    fn test_exceptional_halves_risk() {
        let mut op = sabotage(5, TargetStrength::Weak);
        // 19 + 8 = 27 vs 14
        resolve(&mut op, 19, now()).unwrap();
        assert!((op.detection_risk - 0.15).abs() < 1e-9);
    }

    #[test]
    fn test_natural_one_is_detected() {
        let mut op = sabotage(5, TargetStrength::Weak);
        let resolution = resolve(&mut op, 1, now()).unwrap();
        assert_eq!(resolution.outcome, Outcome::CriticalFailure);
        assert_eq!(op.status, OperationStatus::Detected);
        assert_eq!(op.detected_by.as_deref(), Some("Kestrel"));

        let mut rng = ScriptedRandom::floats(vec![0.0]);
        assert_eq!(roll_detection(&mut op, &mut rng).unwrap(), DetectionCheck::Skipped);
    }

    #[test]
    fn test_rejects_bad_roll_and_terminal() {
        let mut op = sabotage(0, TargetStrength::Medium);
        assert!(matches!(resolve(&mut op, 21, now()), Err(EngineError::Validation(_))));
        assert!(op.roll.is_none());
        resolve(&mut op, 10, now()).unwrap();
        assert!(matches!(resolve(&mut op, 10, now()), Err(EngineError::InvalidTransition(_))));
    }

    #[test]
    fn test_detection_roll() {
        let mut op = sabotage(0, TargetStrength::Medium);
        resolve(&mut op, 12, now()).unwrap();
        // 12 vs 14: failure, risk 0.30 * 2
        let mut rng = ScriptedRandom::floats(vec![0.55]);
        let check = roll_detection(&mut op, &mut rng).unwrap();
        assert_eq!(check, DetectionCheck::Detected(DetectionCause::CounterIntelligence));
        assert_eq!(op.status, OperationStatus::Detected);
        assert!(roll_detection(&mut op, &mut rng).is_err());

        let mut lucky = sabotage(0, TargetStrength::Medium);
        resolve(&mut lucky, 12, now()).unwrap();
        let mut rng = ScriptedRandom::floats(vec![0.95]);
        assert_eq!(roll_detection(&mut lucky, &mut rng).unwrap(), DetectionCheck::Undetected);
        assert_eq!(lucky.status, OperationStatus::Failure);
    }

    #[test]
    fn test_zero_risk_skips_the_draw() {
        let mut op = sabotage(0, TargetStrength::Medium);
        resolve(&mut op, 15, now()).unwrap();
        op.detection_risk = 0.0;
        let mut rng = ScriptedRandom::floats(vec![0.0]);
        assert_eq!(roll_detection(&mut op, &mut rng).unwrap(), DetectionCheck::Undetected);
        assert_eq!(rng.floats_drawn(), 0);
        assert_eq!(op.status, OperationStatus::Success);
        assert!(roll_detection(&mut op, &mut rng).is_err());
    }

    #[test]
    fn test_situational_modifiers() {
        let op = OperationBuilder::new(OperationKind::Assassination, "Aurora", "Kestrel")
            .scale(Scale::Small)
            .circumstances(Circumstances {
                target_security: Security::Maximum,
                target_has_counterintel: true,
                ..Circumstances::default()
            })
            .build(OperationId(1), now())
            .unwrap();
        let breakdown = compute_modifiers(&op);
        let labels: Vec<&str> = breakdown.lines.iter().map(|l| l.label.as_str()).collect();
        assert_eq!(labels, vec!["Operation Scale", "Target Security", "Enemy Counter-Intel"]);
        assert_eq!(breakdown.total, 2 - 5 - 3);
    }

    #[test]
    fn test_detection_cause_thresholds() {
        assert_eq!(DetectionCause::for_risk(0.7), DetectionCause::Obvious);
        assert_eq!(DetectionCause::for_risk(0.45), DetectionCause::CounterIntelligence);
        assert_eq!(DetectionCause::for_risk(0.1), DetectionCause::BadLuck);
    }
}
