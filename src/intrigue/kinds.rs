//! Operation types and the graded parameters an operation is planned with

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::core::error::EngineError;

/// Kind of covert operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Espionage,
    Sabotage,
    Rebellion,
    Influence,
    Assassination,
    #[serde(rename = "counterintel", alias = "counter_intel")]
    CounterIntel,
}

/// Fixed numbers of an operation kind
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OperationProfile {
    pub name: &'static str,
    pub base_dc: i32,
    pub base_detection: f64,
    pub cooldown_hours: f64,
}

impl OperationKind {
    pub const ALL: [OperationKind; 6] = [
        OperationKind::Espionage,
        OperationKind::Sabotage,
        OperationKind::Rebellion,
        OperationKind::Influence,
        OperationKind::Assassination,
        OperationKind::CounterIntel,
    ];

    pub fn profile(self) -> OperationProfile {
        let (name, base_dc, base_detection, cooldown_hours) = match self {
            OperationKind::Espionage => ("Espionage", 12, 0.15, 12.0),
            OperationKind::Sabotage => ("Sabotage", 14, 0.30, 24.0),
            OperationKind::Rebellion => ("Incite Rebellion", 16, 0.50, 72.0),
            OperationKind::Influence => ("Spread Influence", 13, 0.20, 24.0),
            OperationKind::Assassination => ("Assassination", 18, 0.40, 168.0),
            OperationKind::CounterIntel => ("Counter-Intelligence", 10, 0.10, 12.0),
        };
        OperationProfile {
            name,
            base_dc,
            base_detection,
            cooldown_hours,
        }
    }

    fn key(self) -> &'static str {
        match self {
            OperationKind::Espionage => "espionage",
            OperationKind::Sabotage => "sabotage",
            OperationKind::Rebellion => "rebellion",
            OperationKind::Influence => "influence",
            OperationKind::Assassination => "assassination",
            OperationKind::CounterIntel => "counterintel",
        }
    }
}

/// Size of the operation: bigger is harder to pull off and harder to hide
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scale {
    Small,
    #[default]
    Medium,
    Large,
    Massive,
}

impl Scale {
    pub const ALL: [Scale; 4] = [Scale::Small, Scale::Medium, Scale::Large, Scale::Massive];

    pub fn roll_modifier(self) -> i32 {
        match self {
            Scale::Small => 2,
            Scale::Medium => 0,
            Scale::Large => -2,
            Scale::Massive => -4,
        }
    }

    pub fn detection_shift(self) -> f64 {
        match self {
            Scale::Small => -0.05,
            Scale::Medium => 0.0,
            Scale::Large => 0.10,
            Scale::Massive => 0.20,
        }
    }

    /// Stat points a successful sabotage of this size removes
    pub fn sabotage_reduction(self) -> i32 {
        match self {
            Scale::Small => 5,
            Scale::Medium => 10,
            Scale::Large => 15,
            Scale::Massive => 20,
        }
    }

    fn key(self) -> &'static str {
        match self {
            Scale::Small => "small",
            Scale::Medium => "medium",
            Scale::Large => "large",
            Scale::Massive => "massive",
        }
    }
}

/// How well defended the target faction is overall
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetStrength {
    Weak,
    #[default]
    Medium,
    Strong,
    VeryStrong,
}

impl TargetStrength {
    pub const ALL: [TargetStrength; 4] = [
        TargetStrength::Weak,
        TargetStrength::Medium,
        TargetStrength::Strong,
        TargetStrength::VeryStrong,
    ];

    pub fn roll_modifier(self) -> i32 {
        match self {
            TargetStrength::Weak => 3,
            TargetStrength::Medium => 0,
            TargetStrength::Strong => -2,
            TargetStrength::VeryStrong => -4,
        }
    }

    pub fn dc_shift(self) -> i32 {
        match self {
            TargetStrength::Weak => -2,
            TargetStrength::Medium => 0,
            TargetStrength::Strong => 2,
            TargetStrength::VeryStrong => 4,
        }
    }

    fn key(self) -> &'static str {
        match self {
            TargetStrength::Weak => "weak",
            TargetStrength::Medium => "medium",
            TargetStrength::Strong => "strong",
            TargetStrength::VeryStrong => "very_strong",
        }
    }
}

/// Unrest in the target territory, feeding rebellions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Unrest {
    #[default]
    Low,
    Medium,
    High,
    Critical,
}

impl Unrest {
    pub fn roll_modifier(self) -> i32 {
        match self {
            Unrest::Low => -2,
            Unrest::Medium => 0,
            Unrest::High => 2,
            Unrest::Critical => 4,
        }
    }
}

/// Cultural distance between operator and target, feeding influence
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Similarity {
    Opposed,
    #[default]
    Neutral,
    Similar,
    Identical,
}

impl Similarity {
    pub fn roll_modifier(self) -> i32 {
        match self {
            Similarity::Opposed => -3,
            Similarity::Neutral => 0,
            Similarity::Similar => 2,
            Similarity::Identical => 4,
        }
    }
}

/// Protection around an assassination target
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Security {
    Low,
    #[default]
    Medium,
    High,
    Maximum,
}

impl Security {
    pub fn roll_modifier(self) -> i32 {
        match self {
            Security::Low => 3,
            Security::Medium => 0,
            Security::High => -3,
            Security::Maximum => -5,
        }
    }
}

/// Lifecycle of an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationStatus {
    Pending,
    Active,
    Success,
    Partial,
    Failure,
    Detected,
    Cancelled,
}

impl OperationStatus {
    /// Still waiting for a roll
    pub fn is_open(self) -> bool {
        matches!(self, OperationStatus::Pending | OperationStatus::Active)
    }

    /// Success or partial success
    pub fn succeeded(self) -> bool {
        matches!(self, OperationStatus::Success | OperationStatus::Partial)
    }
}

impl fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OperationStatus::Pending => "pending",
            OperationStatus::Active => "active",
            OperationStatus::Success => "success",
            OperationStatus::Partial => "partial",
            OperationStatus::Failure => "failure",
            OperationStatus::Detected => "detected",
            OperationStatus::Cancelled => "cancelled",
        };
        f.write_str(name)
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
                    // separators are optional: "counter-intel" == "counterintel"
                    let key = s.trim().to_ascii_lowercase().replace([' ', '-', '_'], "");
                    $ty::ALL
                        .into_iter()
                        .find(|v| v.key().replace('_', "") == key)
                        .ok_or_else(|| EngineError::Validation(format!("unknown {} '{}'", $what, s)))
                }
            }
        )*
    };
}

keyed_enum!(
    OperationKind => "operation type",
    Scale => "scale",
    TargetStrength => "target strength"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profiles() {
        let dcs: Vec<i32> = OperationKind::ALL.iter().map(|k| k.profile().base_dc).collect();
        assert_eq!(dcs, vec![12, 14, 16, 13, 18, 10]);
        let cooldowns: Vec<f64> = OperationKind::ALL.iter().map(|k| k.profile().cooldown_hours).collect();
        assert_eq!(cooldowns, vec![12.0, 24.0, 72.0, 24.0, 168.0, 12.0]);
    }

    #[test]
    fn test_parse_kind() {
        assert_eq!("counterintel".parse::<OperationKind>().unwrap(), OperationKind::CounterIntel);
        assert_eq!("Counter-Intel".parse::<OperationKind>().unwrap(), OperationKind::CounterIntel);
        assert_eq!("very strong".parse::<TargetStrength>().unwrap(), TargetStrength::VeryStrong);
        assert!("heist".parse::<OperationKind>().is_err());
    }

    #[test]
    fn test_serde_keys() {
        let json = serde_json::to_string(&OperationKind::CounterIntel).unwrap();
        assert_eq!(json, "\"counterintel\"");
        let kind: OperationKind = serde_json::from_str("\"counter_intel\"").unwrap();
        assert_eq!(kind, OperationKind::CounterIntel);
    }

    #[test]
    fn test_status_predicates() {
        assert!(OperationStatus::Active.is_open());
        assert!(!OperationStatus::Detected.is_open());
        assert!(OperationStatus::Partial.succeeded());
        assert!(!OperationStatus::Failure.succeeded());
    }
}
