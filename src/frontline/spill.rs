//! Cancel-then-spill distribution shared by theaters and sub-units
//!
//! A signed amount first eats into a pool holding the opposite sign, then
//! spreads evenly over every recipient still accepting it. Whatever the
//! recipients cannot hold is handed back as leftover, so the caller can
//! park it in the pool and nothing is lost to integer division or caps.

/// Something that can take part of a spilled amount
pub trait Absorber {
    /// Whether this recipient takes part in a spill in `direction` (+1 / -1)
    fn accepts(&self, direction: i32) -> bool;

    /// Take up to `amount` (positive) in `direction`, returning how much was taken
    fn absorb(&mut self, direction: i32, amount: i32) -> i32;
}

/// Per-recipient intake of one spill
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Spill {
    /// Unsigned amount taken by each recipient, aligned with the input slice
    pub taken: Vec<i32>,
    /// Unsigned amount no recipient could take
    pub leftover: i32,
}

/// Move a pool of the opposite sign toward zero; returns the amount consumed
pub fn cancel_opposite(pool: &mut i32, direction: i32, amount: i32) -> i32 {
    if amount <= 0 || pool.signum() != -direction {
        return 0;
    }
    let consumed = amount.min(pool.abs());
    *pool += direction * consumed;
    consumed
}

/// Spread `amount` evenly over accepting recipients in list order
///
/// Each round splits the remainder `amount / n` per recipient, with the
/// first `amount % n` getting one extra. Recipients that hit a cap stop
/// accepting, and the next round re-spreads what they could not take.
pub fn spill_evenly<T: Absorber>(items: &mut [T], direction: i32, amount: i32) -> Spill {
    let mut taken = vec![0; items.len()];
    let mut remaining = amount.max(0);

    while remaining > 0 {
        let accepting: Vec<usize> = items
            .iter()
            .enumerate()
            .filter(|(_, item)| item.accepts(direction))
            .map(|(i, _)| i)
            .collect();
        if accepting.is_empty() {
            break;
        }

        let count = accepting.len() as i32;
        let per_item = remaining / count;
        let extra = remaining % count;

        let mut round_taken = 0;
        for (slot, &index) in accepting.iter().enumerate() {
            let share = per_item + if (slot as i32) < extra { 1 } else { 0 };
            if share == 0 {
                continue;
            }
            let got = items[index].absorb(direction, share);
            taken[index] += got;
            round_taken += got;
        }

        if round_taken == 0 {
            break;
        }
        remaining -= round_taken;
    }

    Spill {
        taken,
        leftover: remaining,
    }
}
