//! Rolling win/loss memory that nudges NPC aggression

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::core::config::NpcTuning;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Win,
    Loss,
    Stalemate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeRecord {
    pub outcome: Outcome,
    /// Positive when won, negative when lost
    pub margin: i32,
}

/// Decaying counters plus the last few outcomes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LearningData {
    pub recent_wins: f64,
    pub recent_losses: f64,
    pub history: VecDeque<OutcomeRecord>,
}

impl LearningData {
    /// Record one resolution, then let both counters fade a little
    pub fn record(&mut self, outcome: Outcome, margin: i32, tuning: &NpcTuning) {
        match outcome {
            Outcome::Win => self.recent_wins += 1.0,
            Outcome::Loss => self.recent_losses += 1.0,
            Outcome::Stalemate => {}
        }

        self.history.push_back(OutcomeRecord { outcome, margin });
        while self.history.len() > tuning.history_len {
            self.history.pop_front();
        }

        self.recent_wins = (self.recent_wins - tuning.learning_decay).max(0.0);
        self.recent_losses = (self.recent_losses - tuning.learning_decay).max(0.0);
    }

    /// Aggression shift from recent form: cautious after losses, bolder after wins
    pub fn aggression_shift(&self, tuning: &NpcTuning) -> f64 {
        if self.recent_losses > self.recent_wins {
            -tuning.loss_caution
        } else if self.recent_wins > self.recent_losses {
            tuning.win_boldness
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_decay() {
        let tuning = NpcTuning::default();
        let mut data = LearningData::default();
        data.record(Outcome::Win, 7, &tuning);
        assert!((data.recent_wins - 0.9).abs() < 1e-9);
        assert_eq!(data.recent_losses, 0.0);

        data.record(Outcome::Loss, -3, &tuning);
        assert!((data.recent_wins - 0.8).abs() < 1e-9);
        assert!((data.recent_losses - 0.9).abs() < 1e-9);
        assert!(data.aggression_shift(&tuning) < 0.0);
    }

    #[test]
    fn test_history_is_bounded() {
        let tuning = NpcTuning::default();
        let mut data = LearningData::default();
        for margin in 0..8 {
            data.record(Outcome::Stalemate, margin, &tuning);
        }
        assert_eq!(data.history.len(), 5);
        assert_eq!(data.history.front().map(|r| r.margin), Some(3));
    }

    #[test]
    fn test_even_record_is_neutral() {
        let tuning = NpcTuning::default();
        assert_eq!(LearningData::default().aggression_shift(&tuning), 0.0);
    }
}
