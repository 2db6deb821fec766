//! Stuck and oscillation detection over the recent-move history.

use crate::history::MoveHistory;
use crate::types::Direction;

/// Entries required before the history is considered at all
pub const MIN_HISTORY: usize = 5;

/// Identical trailing turns that count as a turn lock
const TURN_LOCK_RUN: usize = 4;

/// Trailing repeats of `last_turn` that count as persistent repetition
const REPEAT_RUN: usize = 3;

/// Why the detector considers the robot stuck
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StuckReason {
    /// Last four turns all went the same way
    TurnLock(Direction),
    /// Obstacle handler blocked more times than the threshold
    RepeatedBlocks(u32),
    /// Last three turns all repeated `last_turn`
    Repetition(Direction),
}

/// Stuck detector with a configurable block threshold
#[derive(Clone, Copy, Debug)]
pub struct StuckDetector {
    /// Fires once `consecutive_blocks` exceeds this
    pub block_threshold: u32,
}

impl Default for StuckDetector {
    fn default() -> Self {
        Self { block_threshold: 5 }
    }
}

impl StuckDetector {
    pub fn new(block_threshold: u32) -> Self {
        Self { block_threshold }
    }

    /// Check the rules in order and report the first that matches.
    ///
    /// Histories shorter than [`MIN_HISTORY`] never report stuck.
    pub fn detect(
        &self,
        history: &MoveHistory,
        last_turn: Option<Direction>,
        consecutive_blocks: u32,
    ) -> Option<StuckReason> {
        if history.len() < MIN_HISTORY {
            return None;
        }

        for turn in [Direction::Left, Direction::Right] {
            if history.ends_with_run(turn, TURN_LOCK_RUN) {
                return Some(StuckReason::TurnLock(turn));
            }
        }

        if consecutive_blocks > self.block_threshold {
            return Some(StuckReason::RepeatedBlocks(consecutive_blocks));
        }

        if let Some(turn) = last_turn
            && history.ends_with_run(turn, REPEAT_RUN)
        {
            return Some(StuckReason::Repetition(turn));
        }

        None
    }

    pub fn is_stuck(
        &self,
        history: &MoveHistory,
        last_turn: Option<Direction>,
        consecutive_blocks: u32,
    ) -> bool {
        self.detect(history, last_turn, consecutive_blocks).is_some()
    }
}
