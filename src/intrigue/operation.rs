//! Covert operation records, their planning and the ledger queries over them

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::kinds::{OperationKind, OperationStatus, Scale, Security, Similarity, TargetStrength, Unrest};
use crate::combat::StatKind;
use crate::core::error::{invalid, EngineError, Result};
use crate::core::types::{ModifierBreakdown, OperationId};

/// Bounds of the operator skill modifier
pub const MIN_OPERATOR_SKILL: i32 = -5;
pub const MAX_OPERATOR_SKILL: i32 = 5;

/// Circumstances that only matter to some operation kinds
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Circumstances {
    /// Rebellion only
    pub target_unrest: Unrest,
    /// Influence only
    pub cultural_similarity: Similarity,
    /// Assassination only
    pub target_security: Security,
    /// Counter-intelligence only
    pub defensive_stance: bool,
    /// Target runs its own counter-intelligence
    pub target_has_counterintel: bool,
    /// Stat category a sabotage hits
    pub target_category: Option<StatKind>,
    /// Flavour of an influence campaign (political, religious, ...)
    pub influence_type: Option<String>,
    /// Who an assassination is aimed at
    pub target_name: Option<String>,
}

/// Narrative state left behind for processes outside the engine
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OperationFlags {
    pub intel_gathered: bool,
    pub rebellion_active: bool,
    pub influence_progress: Option<Scale>,
    pub target_eliminated: bool,
    pub protection_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    pub id: OperationId,
    pub kind: OperationKind,
    /// Agent running the operation; cooldowns are tracked per agent and kind
    pub operator: String,
    pub operator_faction: String,
    pub target_faction: String,
    #[serde(default)]
    pub description: String,
    pub scale: Scale,
    pub target_strength: TargetStrength,
    pub operator_skill: i32,
    /// DC the total must meet
    pub difficulty: i32,
    /// Chance of discovery in [0, 1], adjusted during resolution
    pub detection_risk: f64,
    pub status: OperationStatus,
    #[serde(default)]
    pub circumstances: Circumstances,
    pub roll: Option<i32>,
    #[serde(default)]
    pub modifiers: ModifierBreakdown,
    pub total: Option<i32>,
    #[serde(default)]
    pub detection_rolled: bool,
    pub detected_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub flags: OperationFlags,
}

impl Operation {
    /// Open operations can be cancelled
    pub fn cancel(&mut self) -> Result<()> {
        if !self.status.is_open() {
            return Err(EngineError::InvalidTransition(format!(
                "operation {} is already {}",
                self.id, self.status
            )));
        }
        self.status = OperationStatus::Cancelled;
        tracing::info!("Operation {} cancelled", self.id);
        Ok(())
    }

    pub fn involves(&self, faction: &str) -> bool {
        self.operator_faction == faction || self.target_faction == faction
    }
}

/// Plans an operation and derives its DC and detection risk
#[derive(Debug, Clone)]
pub struct OperationBuilder {
    kind: OperationKind,
    operator: Option<String>,
    operator_faction: String,
    target_faction: String,
    description: String,
    scale: Scale,
    target_strength: TargetStrength,
    operator_skill: i32,
    difficulty: Option<i32>,
    circumstances: Circumstances,
}

impl OperationBuilder {
    pub fn new(
        kind: OperationKind,
        operator_faction: impl Into<String>,
        target_faction: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            operator: None,
            operator_faction: operator_faction.into(),
            target_faction: target_faction.into(),
            description: String::new(),
            scale: Scale::default(),
            target_strength: TargetStrength::default(),
            operator_skill: 0,
            difficulty: None,
            circumstances: Circumstances::default(),
        }
    }

    /// Defaults to the operator faction
    pub fn operator(mut self, operator: impl Into<String>) -> Self {
        self.operator = Some(operator.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn scale(mut self, scale: Scale) -> Self {
        self.scale = scale;
        self
    }

    pub fn target_strength(mut self, strength: TargetStrength) -> Self {
        self.target_strength = strength;
        self
    }

    pub fn operator_skill(mut self, skill: i32) -> Self {
        self.operator_skill = skill;
        self
    }

    /// Replace the derived DC
    pub fn difficulty(mut self, difficulty: i32) -> Self {
        self.difficulty = Some(difficulty);
        self
    }

    pub fn circumstances(mut self, circumstances: Circumstances) -> Self {
        self.circumstances = circumstances;
        self
    }

    pub fn build(self, id: OperationId, now: DateTime<Utc>) -> Result<Operation> {
        if !(MIN_OPERATOR_SKILL..=MAX_OPERATOR_SKILL).contains(&self.operator_skill) {
            return invalid(format!(
                "operator skill {} outside {}..={}",
                self.operator_skill, MIN_OPERATOR_SKILL, MAX_OPERATOR_SKILL
            ));
        }
        if self.operator_faction.trim().is_empty() || self.target_faction.trim().is_empty() {
            return invalid("operation needs both an operator and a target faction");
        }
        if self.operator_faction == self.target_faction {
            return invalid(format!("{} cannot target itself", self.operator_faction));
        }

        let profile = self.kind.profile();
        let difficulty = self
            .difficulty
            .unwrap_or(profile.base_dc + self.target_strength.dc_shift());
        let detection_risk = (profile.base_detection + self.scale.detection_shift()).clamp(0.0, 1.0);

        Ok(Operation {
            id,
            kind: self.kind,
            operator: self.operator.unwrap_or_else(|| self.operator_faction.clone()),
            operator_faction: self.operator_faction,
            target_faction: self.target_faction,
            description: self.description,
            scale: self.scale,
            target_strength: self.target_strength,
            operator_skill: self.operator_skill,
            difficulty,
            detection_risk,
            status: OperationStatus::Pending,
            circumstances: self.circumstances,
            roll: None,
            modifiers: ModifierBreakdown::new(),
            total: None,
            detection_rolled: false,
            detected_by: None,
            created_at: now,
            resolved_at: None,
            flags: OperationFlags::default(),
        })
    }
}

pub fn next_operation_id(operations: &[Operation]) -> OperationId {
    OperationId(operations.iter().map(|op| op.id.0).max().unwrap_or(0) + 1)
}

pub fn find_operation(operations: &[Operation], id: OperationId) -> Result<&Operation> {
    operations
        .iter()
        .find(|op| op.id == id)
        .ok_or(EngineError::OperationNotFound(id))
}

pub fn find_operation_mut(operations: &mut [Operation], id: OperationId) -> Result<&mut Operation> {
    operations
        .iter_mut()
        .find(|op| op.id == id)
        .ok_or(EngineError::OperationNotFound(id))
}

/// Open operations run by or aimed at `faction`
pub fn active_operations_by_faction<'a>(operations: &'a [Operation], faction: &str) -> Vec<&'a Operation> {
    operations
        .iter()
        .filter(|op| op.status.is_open() && op.involves(faction))
        .collect()
}

/// Operations aimed at `faction`, optionally only those in one status
pub fn operations_by_target<'a>(
    operations: &'a [Operation],
    faction: &str,
    status: Option<OperationStatus>,
) -> Vec<&'a Operation> {
    operations
        .iter()
        .filter(|op| op.target_faction == faction)
        .filter(|op| status.map_or(true, |s| op.status == s))
        .collect()
}

/// Hours until `operator` may run `kind` again, or `None` when eligible
///
/// Measured from the most recently resolved operation of that kind.
pub fn cooldown_remaining(
    operations: &[Operation],
    operator: &str,
    kind: OperationKind,
    cooldown_hours: f64,
    now: DateTime<Utc>,
) -> Option<f64> {
    let last = operations
        .iter()
        .filter(|op| op.operator == operator && op.kind == kind)
        .filter_map(|op| op.resolved_at)
        .max()?;

    let hours_since = (now - last).num_seconds() as f64 / 3600.0;
    let remaining = cooldown_hours - hours_since;
    (remaining > 0.0).then_some(remaining)
}
