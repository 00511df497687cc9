//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::core::error::EngineError;

/// Unique identifier for a conflict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConflictId(pub u32);

/// Theater identifier, unique within one conflict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TheaterId(pub u32);

/// Sub-unit identifier, unique within one side of a conflict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubUnitId(pub u32);

/// Combat modifier identifier, unique within one side of a conflict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModifierId(pub u32);

/// Unique identifier for a covert operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperationId(pub u32);

macro_rules! display_id {
    ($($ty:ident),*) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "#{}", self.0)
            }
        })*
    };
}

display_id!(ConflictId, TheaterId, SubUnitId, ModifierId, OperationId);

/// One of the two sides of a conflict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Attacker,
    Defender,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::Attacker, Side::Defender];

    pub fn opponent(self) -> Side {
        match self {
            Side::Attacker => Side::Defender,
            Side::Defender => Side::Attacker,
        }
    }

    /// Direction of this side on the warbar: attacker pushes positive
    pub fn sign(self) -> i32 {
        match self {
            Side::Attacker => 1,
            Side::Defender => -1,
        }
    }

    /// The side a signed value favours, if any
    pub fn from_sign(value: i32) -> Option<Side> {
        match value.signum() {
            1 => Some(Side::Attacker),
            -1 => Some(Side::Defender),
            _ => None,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Attacker => write!(f, "attacker"),
            Side::Defender => write!(f, "defender"),
        }
    }
}

/// Result of a single resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Winner {
    Attacker,
    Defender,
    Stalemate,
}

impl Winner {
    pub fn side(self) -> Option<Side> {
        match self {
            Winner::Attacker => Some(Side::Attacker),
            Winner::Defender => Some(Side::Defender),
            Winner::Stalemate => None,
        }
    }

    pub fn from_side(side: Side) -> Winner {
        match side {
            Side::Attacker => Winner::Attacker,
            Side::Defender => Winner::Defender,
        }
    }
}

impl FromStr for Winner {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "attacker" => Ok(Winner::Attacker),
            "defender" => Ok(Winner::Defender),
            "stalemate" | "draw" => Ok(Winner::Stalemate),
            other => Err(EngineError::Validation(format!("unknown winner '{}'", other))),
        }
    }
}

impl fmt::Display for Winner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Winner::Attacker => write!(f, "attacker"),
            Winner::Defender => write!(f, "defender"),
            Winner::Stalemate => write!(f, "stalemate"),
        }
    }
}

/// A value held once per side
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerSide<T> {
    pub attacker: T,
    pub defender: T,
}

impl<T> PerSide<T> {
    pub fn new(attacker: T, defender: T) -> Self {
        Self { attacker, defender }
    }

    pub fn get(&self, side: Side) -> &T {
        match side {
            Side::Attacker => &self.attacker,
            Side::Defender => &self.defender,
        }
    }

    pub fn get_mut(&mut self, side: Side) -> &mut T {
        match side {
            Side::Attacker => &mut self.attacker,
            Side::Defender => &mut self.defender,
        }
    }
}

impl<T: Clone> PerSide<T> {
    pub fn splat(value: T) -> Self {
        Self {
            attacker: value.clone(),
            defender: value,
        }
    }
}

/// A labelled contribution to a roll, kept in insertion order for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModifierLine {
    pub label: String,
    pub value: i32,
}

/// Ordered modifier lines plus their sum
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModifierBreakdown {
    pub lines: Vec<ModifierLine>,
    pub total: i32,
}

impl ModifierBreakdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a line and fold it into the total
    pub fn push(&mut self, label: impl Into<String>, value: i32) {
        self.lines.push(ModifierLine {
            label: label.into(),
            value,
        });
        self.total += value;
    }
}
