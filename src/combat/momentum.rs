//! Momentum bookkeeping, damage from margin and modifier decay

use super::constants::*;
use super::modifiers::{CombatModifier, ModifierDuration};
use crate::core::types::{PerSide, Winner};

/// Next tactical momentum after a resolution
///
/// Positive favours the attacker. The previous winner is read from the
/// sign of `previous`; a repeat winner grows the streak up to the cap,
/// a new winner starts over at one, a stalemate clears it.
pub fn update_tactical_momentum(previous: i32, winner: Winner) -> i32 {
    let Some(side) = winner.side() else {
        return 0;
    };
    let magnitude = if previous.signum() == side.sign() {
        (previous.abs() + 1).min(TACTICAL_MOMENTUM_CAP)
    } else {
        1
    };
    side.sign() * magnitude
}

/// Winner gains one strategic momentum, loser loses one
pub fn update_strategic_momentum(strategic: &mut PerSide<u8>, winner: Winner) {
    let Some(side) = winner.side() else {
        return;
    };
    let won = strategic.get_mut(side);
    *won = won.saturating_add(1).min(STRATEGIC_MOMENTUM_CAP);
    let lost = strategic.get_mut(side.opponent());
    *lost = lost.saturating_sub(1);
}

/// Warbar damage for a victory margin, scaled by the winner's strategic momentum
pub fn damage_from_margin(margin: i32, strategic_momentum: u8) -> i32 {
    let base = if margin <= NARROW_MARGIN {
        NARROW_DAMAGE
    } else if margin <= MARGINAL_MARGIN {
        MARGINAL_DAMAGE
    } else if margin <= CLEAR_MARGIN {
        CLEAR_DAMAGE
    } else {
        DECISIVE_DAMAGE
    };
    // floor(base * (1 + m/10)) without going through floats
    let momentum = i32::from(strategic_momentum.min(STRATEGIC_MOMENTUM_CAP));
    base * (10 + momentum) / 10
}

/// Expire and count down modifiers after a resolution
///
/// Entries with an unreadable duration are kept untouched.
pub fn decay_modifiers(modifiers: &mut Vec<CombatModifier>) {
    modifiers.retain_mut(|modifier| match modifier.duration {
        ModifierDuration::NextResolution => false,
        ModifierDuration::Turns(n) => {
            let left = n.saturating_sub(1);
            if left == 0 {
                false
            } else {
                modifier.duration = ModifierDuration::Turns(left);
                true
            }
        }
        ModifierDuration::Permanent | ModifierDuration::Unrecognized(_) => true,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::ModifierId;

    #[test]
    fn test_tactical_streak_caps_at_three() {
        assert_eq!(update_tactical_momentum(2, Winner::Attacker), 3);
        assert_eq!(update_tactical_momentum(3, Winner::Attacker), 3);
        assert_eq!(update_tactical_momentum(-1, Winner::Defender), -2);
    }

    #[test]
    fn test_tactical_resets_on_new_winner() {
        assert_eq!(update_tactical_momentum(3, Winner::Defender), -1);
        assert_eq!(update_tactical_momentum(-2, Winner::Attacker), 1);
        assert_eq!(update_tactical_momentum(0, Winner::Attacker), 1);
        assert_eq!(update_tactical_momentum(-3, Winner::Stalemate), 0);
    }

    #[test]
    fn test_strategic_bounds() {
        let mut strategic = PerSide::new(10u8, 0u8);
        update_strategic_momentum(&mut strategic, Winner::Attacker);
        assert_eq!(strategic, PerSide::new(10, 0));

        update_strategic_momentum(&mut strategic, Winner::Defender);
        assert_eq!(strategic, PerSide::new(9, 1));

        update_strategic_momentum(&mut strategic, Winner::Stalemate);
        assert_eq!(strategic, PerSide::new(9, 1));
    }

    #[test]
    fn test_damage_from_margin() {
        assert_eq!(damage_from_margin(0, 0), 5);
        assert_eq!(damage_from_margin(5, 0), 5);
        assert_eq!(damage_from_margin(6, 0), 10);
        assert_eq!(damage_from_margin(15, 0), 15);
        assert_eq!(damage_from_margin(16, 0), 20);
        assert_eq!(damage_from_margin(12, 5), 22);
        assert_eq!(damage_from_margin(3, 3), 6);
        assert_eq!(damage_from_margin(40, 10), 40);
    }

    fn modifier(id: u32, duration: ModifierDuration) -> CombatModifier {
        CombatModifier {
            id: ModifierId(id),
            name: format!("mod {}", id),
            value: 1,
            duration,
        }
    }

    #[test]
    fn test_decay_modifiers() {
        let mut mods = vec![
            modifier(1, ModifierDuration::Permanent),
            modifier(2, ModifierDuration::NextResolution),
            modifier(3, ModifierDuration::Turns(2)),
            modifier(4, ModifierDuration::Turns(1)),
            modifier(5, ModifierDuration::Unrecognized("soon_turns".into())),
        ];
        decay_modifiers(&mut mods);

        let ids: Vec<u32> = mods.iter().map(|m| m.id.0).collect();
        assert_eq!(ids, vec![1, 3, 5]);
        assert_eq!(mods[1].duration, ModifierDuration::Turns(1));
        assert_eq!(mods[2].duration, ModifierDuration::Unrecognized("soon_turns".into()));
    }
}
