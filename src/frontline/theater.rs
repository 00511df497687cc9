//! Theaters: named fronts whose values add up to the warbar

use serde::{Deserialize, Serialize};

use super::spill::{cancel_opposite, spill_evenly, Absorber};
use crate::core::types::{Side, TheaterId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TheaterStatus {
    Active,
    Closed,
}

/// A named sub-front
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Theater {
    pub id: TheaterId,
    pub name: String,
    pub max_value: i32,
    /// Signed, positive favours the attacker, bounded by `max_value`
    pub current_value: i32,
    pub status: TheaterStatus,
    pub captured_by: Option<Side>,
}

impl Theater {
    pub fn new(id: TheaterId, name: impl Into<String>, max_value: i32) -> Self {
        Self {
            id,
            name: name.into(),
            max_value,
            current_value: 0,
            status: TheaterStatus::Active,
            captured_by: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == TheaterStatus::Active
    }

    pub fn close(&mut self, captured_by: Option<Side>) {
        self.status = TheaterStatus::Closed;
        self.captured_by = captured_by;
    }

    /// Back to neutral and active
    pub fn reopen(&mut self) {
        self.status = TheaterStatus::Active;
        self.captured_by = None;
        self.current_value = 0;
    }

    /// Move the value in `direction`, closing on reaching the bound
    fn push(&mut self, direction: i32, amount: i32) -> i32 {
        let before = self.current_value;
        self.current_value = (before + direction * amount).clamp(-self.max_value, self.max_value);
        if self.current_value.abs() >= self.max_value {
            let capturer = Side::from_sign(direction);
            self.close(capturer);
            tracing::info!(
                "Theater {} '{}' captured by {:?}",
                self.id,
                self.name,
                capturer
            );
        }
        (self.current_value - before).abs()
    }
}

impl Absorber for Theater {
    fn accepts(&self, _direction: i32) -> bool {
        self.is_active()
    }

    fn absorb(&mut self, direction: i32, amount: i32) -> i32 {
        self.push(direction, amount)
    }
}

/// Where one shift ended up
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShiftReport {
    /// Signed shift requested
    pub requested: i32,
    /// Unsigned amount spent cancelling the opposite-signed pool
    pub cancelled: i32,
    /// Signed change of the unassigned pool
    pub pool_delta: i32,
    /// Signed change per theater that moved, in list order
    pub theater_deltas: Vec<(TheaterId, i32)>,
    /// Theaters closed by this shift and who took them
    pub captured: Vec<(TheaterId, Side)>,
    /// Unsigned amount a targeted shift could not place
    pub overflow: i32,
}

impl ShiftReport {
    /// Sum of every recipient's change; equals `requested` for a cascade
    pub fn applied_total(&self) -> i32 {
        self.pool_delta + self.theater_deltas.iter().map(|(_, d)| d).sum::<i32>()
    }
}

/// Theaters of one conflict plus the unassigned part of the warbar
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TheaterBoard {
    pub unassigned: i32,
    pub theaters: Vec<Theater>,
}

impl TheaterBoard {
    pub fn is_empty(&self) -> bool {
        self.theaters.is_empty()
    }

    /// `unassigned + Σ current_value`
    pub fn total(&self) -> i32 {
        self.unassigned + self.theaters.iter().map(|t| t.current_value).sum::<i32>()
    }

    pub fn active_count(&self) -> usize {
        self.theaters.iter().filter(|t| t.is_active()).count()
    }

    pub fn get(&self, id: TheaterId) -> Option<&Theater> {
        self.theaters.iter().find(|t| t.id == id)
    }

    pub fn get_mut(&mut self, id: TheaterId) -> Option<&mut Theater> {
        self.theaters.iter_mut().find(|t| t.id == id)
    }

    /// Add a neutral theater; ids continue from the highest existing one
    pub fn add(&mut self, name: impl Into<String>, max_value: i32) -> TheaterId {
        let id = TheaterId(self.theaters.iter().map(|t| t.id.0).max().unwrap_or(0) + 1);
        self.theaters.push(Theater::new(id, name, max_value));
        id
    }

    /// Remove a theater; its value folds into the unassigned pool
    pub fn remove(&mut self, id: TheaterId) -> Option<Theater> {
        let index = self.theaters.iter().position(|t| t.id == id)?;
        let removed = self.theaters.remove(index);
        self.unassigned += removed.current_value;
        Some(removed)
    }

    /// Cancel against the pool, then spill evenly over active theaters
    pub fn apply_shift(&mut self, shift: i32) -> ShiftReport {
        let mut report = ShiftReport {
            requested: shift,
            ..ShiftReport::default()
        };
        if shift == 0 {
            return report;
        }
        let direction = shift.signum();
        let amount = shift.abs();

        let cancelled = cancel_opposite(&mut self.unassigned, direction, amount);
        report.cancelled = cancelled;
        report.pool_delta = direction * cancelled;

        let closed_before: Vec<bool> = self.theaters.iter().map(|t| !t.is_active()).collect();
        let spill = spill_evenly(&mut self.theaters, direction, amount - cancelled);

        for (index, theater) in self.theaters.iter().enumerate() {
            if spill.taken[index] != 0 {
                report
                    .theater_deltas
                    .push((theater.id, direction * spill.taken[index]));
            }
            if !closed_before[index] && !theater.is_active() {
                if let Some(side) = theater.captured_by {
                    report.captured.push((theater.id, side));
                }
            }
        }

        // No active theater left to take it: park it unassigned
        self.unassigned += direction * spill.leftover;
        report.pool_delta += direction * spill.leftover;

        report
    }

    /// Shift a single active theater; what its bound cuts off is dropped
    pub fn shift_one(&mut self, id: TheaterId, shift: i32) -> Option<ShiftReport> {
        let theater = self.get_mut(id)?;
        let mut report = ShiftReport {
            requested: shift,
            ..ShiftReport::default()
        };
        if shift == 0 || !theater.is_active() {
            report.overflow = shift.abs();
            return Some(report);
        }
        let direction = shift.signum();
        let taken = theater.push(direction, shift.abs());
        report.theater_deltas.push((id, direction * taken));
        report.overflow = shift.abs() - taken;
        if !theater.is_active() {
            if let Some(side) = theater.captured_by {
                report.captured.push((id, side));
            }
        }
        Some(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board(theaters: &[(i32, i32)], unassigned: i32) -> TheaterBoard {
        let mut board = TheaterBoard {
            unassigned,
            theaters: Vec::new(),
        };
        for (i, &(max, value)) in theaters.iter().enumerate() {
            let id = board.add(format!("T{}", i + 1), max);
            if let Some(t) = board.get_mut(id) {
                t.current_value = value;
            }
        }
        board
    }

    #[test]
    fn test_spill_sixteen_fifteen() {
        let mut b = board(&[(50, 0), (50, 0)], 0);
        let report = b.apply_shift(31);

        assert_eq!(b.theaters[0].current_value, 16);
        assert_eq!(b.theaters[1].current_value, 15);
        assert_eq!(b.unassigned, 0);
        assert_eq!(b.total(), 31);
        assert_eq!(report.applied_total(), 31);
        assert!(report.captured.is_empty());
    }

    #[test]
    fn test_cancels_opposite_pool_first() {
        let mut b = board(&[(50, 0), (50, 0)], -10);
        let report = b.apply_shift(14);

        assert_eq!(report.cancelled, 10);
        assert_eq!(b.unassigned, 0);
        assert_eq!(b.theaters[0].current_value, 2);
        assert_eq!(b.theaters[1].current_value, 2);
        assert_eq!(b.total(), 4);
        assert_eq!(report.applied_total(), 14);
    }

    #[test]
    fn test_same_sign_pool_is_not_consumed() {
        let mut b = board(&[(50, 0)], 10);
        b.apply_shift(5);
        assert_eq!(b.unassigned, 10);
        assert_eq!(b.theaters[0].current_value, 5);
    }

    #[test]
    fn test_capture_closes_and_records_side() {
        let mut b = board(&[(10, -8), (50, 0)], 0);
        let report = b.apply_shift(-8);

        assert_eq!(b.theaters[0].current_value, -10);
        assert_eq!(b.theaters[0].status, TheaterStatus::Closed);
        assert_eq!(b.theaters[0].captured_by, Some(Side::Defender));
        assert_eq!(report.captured, vec![(TheaterId(1), Side::Defender)]);
        assert_eq!(b.active_count(), 1);
        // first theater could take only 2 of its 4, the rest re-spilled
        assert_eq!(b.theaters[1].current_value, -6);
        assert_eq!(report.applied_total(), -8);
    }

    #[test]
    fn test_all_closed_goes_to_pool() {
        let mut b = board(&[(10, 0)], 0);
        b.theaters[0].close(Some(Side::Attacker));
        let report = b.apply_shift(7);
        assert_eq!(b.unassigned, 7);
        assert_eq!(report.pool_delta, 7);
        assert_eq!(b.total(), 7);
    }

    #[test]
    fn test_remove_folds_value_into_pool() {
        let mut b = board(&[(50, 12), (50, -3)], 4);
        let before = b.total();
        let removed = b.remove(TheaterId(1)).unwrap();
        assert_eq!(removed.current_value, 12);
        assert_eq!(b.total(), before);
        assert!(b.remove(TheaterId(9)).is_none());
    }

    #[test]
    fn test_reopen_resets() {
        let mut b = board(&[(10, 0)], 0);
        b.apply_shift(10);
        assert!(!b.theaters[0].is_active());
        b.theaters[0].reopen();
        assert_eq!(b.theaters[0].current_value, 0);
        assert_eq!(b.theaters[0].captured_by, None);
        assert!(b.theaters[0].is_active());
    }

    #[test]
    fn test_shift_one_drops_overflow() {
        let mut b = board(&[(50, 40), (50, 0)], 0);
        let report = b.shift_one(TheaterId(1), 30).unwrap();
        assert_eq!(b.theaters[0].current_value, 50);
        assert_eq!(report.overflow, 20);
        assert_eq!(report.captured, vec![(TheaterId(1), Side::Attacker)]);
        assert_eq!(b.theaters[1].current_value, 0);
    }

    #[test]
    fn test_ids_continue_from_max() {
        let mut b = board(&[(10, 0), (10, 0)], 0);
        b.remove(TheaterId(1));
        assert_eq!(b.add("Gulf", 20), TheaterId(3));
    }
}
