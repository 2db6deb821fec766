//! Patrol decision state
//!
//! Owned by the patrol engine and written only from the loop thread.

use crate::history::{MoveHistory, ObstacleHistory};
use crate::types::{Direction, SensorSnapshot};

/// Coarse activity of the patrol, reported through status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum PatrolPhase {
    /// No loop running
    #[default]
    Idle,
    /// Path ahead clear, advancing
    Moving,
    /// Backing up and turning away from an obstacle
    Avoiding,
    /// Running the escape maneuver
    Escaping,
}

impl PatrolPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            PatrolPhase::Idle => "Idle",
            PatrolPhase::Moving => "Moving",
            PatrolPhase::Avoiding => "Avoiding",
            PatrolPhase::Escaping => "Escaping",
        }
    }
}

/// Mutable decision state of one controller
#[derive(Clone, Debug, Default)]
pub struct PatrolState {
    pub(crate) phase: PatrolPhase,
    /// Most recent avoidance turn; only ever Left or Right
    pub(crate) last_turn: Option<Direction>,
    /// Obstacle handling escalation counter
    pub(crate) consecutive_blocks: u32,
    /// Reserved counter, reset alongside `consecutive_blocks`
    pub(crate) stuck_counter: u32,
    /// Last side seen open while advancing
    pub(crate) last_clear_direction: Option<Direction>,
    pub(crate) move_history: MoveHistory,
    pub(crate) obstacle_history: ObstacleHistory,
}

impl PatrolState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> PatrolPhase {
        self.phase
    }

    pub fn last_turn(&self) -> Option<Direction> {
        self.last_turn
    }

    pub fn consecutive_blocks(&self) -> u32 {
        self.consecutive_blocks
    }

    pub fn stuck_counter(&self) -> u32 {
        self.stuck_counter
    }

    pub fn last_clear_direction(&self) -> Option<Direction> {
        self.last_clear_direction
    }

    pub fn move_history(&self) -> &MoveHistory {
        &self.move_history
    }

    pub fn obstacle_history(&self) -> &ObstacleHistory {
        &self.obstacle_history
    }

    /// Remember a completed avoidance turn.
    ///
    /// Non-turn directions are ignored so `last_turn` stays Left/Right.
    pub(crate) fn record_turn(&mut self, turn: Direction) {
        if !turn.is_turn() {
            tracing::warn!("Ignoring non-turn direction {} in turn history", turn);
            return;
        }
        self.last_turn = Some(turn);
        self.move_history.push(turn);
    }

    pub(crate) fn record_reading(&mut self, snapshot: SensorSnapshot) {
        self.obstacle_history.push(snapshot);
    }

    /// Path ahead is clear: drop escalation counters.
    pub(crate) fn reset_blocks(&mut self) {
        self.consecutive_blocks = 0;
        self.stuck_counter = 0;
    }

    /// State after an escape maneuver turned toward `turn`.
    pub(crate) fn reset_after_escape(&mut self, turn: Direction) {
        self.reset_blocks();
        self.move_history.clear();
        if turn.is_turn() {
            self.last_turn = Some(turn);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_turn_sets_last_turn_and_history() {
        let mut state = PatrolState::new();
        state.record_turn(Direction::Left);
        state.record_turn(Direction::Right);

        assert_eq!(state.last_turn(), Some(Direction::Right));
        assert_eq!(state.move_history().len(), 2);
    }

    #[test]
    fn test_record_turn_rejects_non_turns() {
        let mut state = PatrolState::new();
        state.record_turn(Direction::Forward);
        state.record_turn(Direction::Stop);

        assert_eq!(state.last_turn(), None);
        assert!(state.move_history().is_empty());
    }

    #[test]
    fn test_reset_after_escape() {
        let mut state = PatrolState::new();
        for _ in 0..4 {
            state.record_turn(Direction::Left);
        }
        state.consecutive_blocks = 4;
        state.stuck_counter = 2;

        state.reset_after_escape(Direction::Right);

        assert!(state.move_history().is_empty());
        assert_eq!(state.consecutive_blocks(), 0);
        assert_eq!(state.stuck_counter(), 0);
        assert_eq!(state.last_turn(), Some(Direction::Right));
    }
}
