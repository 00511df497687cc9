//! Combat rule constants - all fixed values in one place
//!
//! Modifiers are ADDITIVE to a d20 roll. The only multiplicative rule is the
//! strategic momentum damage multiplier.

// Dice
pub const DIE_MIN: i32 = 1;
pub const DIE_MAX: i32 = 20;

// Stat advantage ratio thresholds (own / enemy)
pub const OVERWHELMING_RATIO: f64 = 2.5;
pub const SUPERIOR_RATIO: f64 = 1.5;
pub const PARITY_RATIO: f64 = 0.75;

pub const OVERWHELMING_BONUS: i32 = 3;
pub const SUPERIOR_BONUS: i32 = 2;
pub const PARITY_BONUS: i32 = 1;

// Action bonuses
pub const DEFEND_BONUS: i32 = 2;
pub const PREPARED_ATTACK_BONUS: i32 = 1;
pub const SABOTAGE_PENALTY: i32 = -1;

/// A defending loser takes this fraction (1/n) of the damage
pub const DEFEND_DAMAGE_DIVISOR: i32 = 2;

// Super unit intel tiers
pub const SUPER_UNIT_FULL_INTEL_BONUS: i32 = 2;
pub const SUPER_UNIT_PARTIAL_INTEL_BONUS: i32 = 0;
pub const SUPER_UNIT_LOW_INTEL_PENALTY: i32 = -2;

// Momentum bounds
pub const TACTICAL_MOMENTUM_CAP: i32 = 3;
pub const STRATEGIC_MOMENTUM_CAP: u8 = 10;

// Damage tiers by victory margin (inclusive upper bounds)
pub const NARROW_MARGIN: i32 = 5;
pub const MARGINAL_MARGIN: i32 = 10;
pub const CLEAR_MARGIN: i32 = 15;

pub const NARROW_DAMAGE: i32 = 5;
pub const MARGINAL_DAMAGE: i32 = 10;
pub const CLEAR_DAMAGE: i32 = 15;
pub const DECISIVE_DAMAGE: i32 = 20;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratio_thresholds_ordered() {
        assert!(OVERWHELMING_RATIO > SUPERIOR_RATIO);
        assert!(SUPERIOR_RATIO > PARITY_RATIO);
        assert!(OVERWHELMING_BONUS > SUPERIOR_BONUS && SUPERIOR_BONUS > PARITY_BONUS);
    }

    #[test]
    fn test_damage_tiers_increase() {
        assert!(NARROW_MARGIN < MARGINAL_MARGIN && MARGINAL_MARGIN < CLEAR_MARGIN);
        assert!(NARROW_DAMAGE < MARGINAL_DAMAGE);
        assert!(MARGINAL_DAMAGE < CLEAR_DAMAGE);
        assert!(CLEAR_DAMAGE < DECISIVE_DAMAGE);
    }
}
