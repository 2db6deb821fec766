//! Turn selection after an obstacle.
//!
//! Prefers the open side, falls back to persistence-biased randomness when
//! both sides are blocked, and to history balancing when both are clear so
//! the robot does not circle.

use crate::history::MoveHistory;
use crate::random::RandomSource;
use crate::types::{Direction, SensorSnapshot};

use super::state::PatrolState;

/// Configuration for turn selection.
#[derive(Clone, Debug)]
pub struct TurnPolicyConfig {
    /// Chance of repeating `last_turn` when both sides are blocked
    pub repeat_last_turn_probability: f32,
    /// Left/right count difference that triggers anti-bias correction
    pub anti_bias_margin: usize,
}

impl Default for TurnPolicyConfig {
    fn default() -> Self {
        Self {
            repeat_last_turn_probability: 0.7,
            anti_bias_margin: 2,
        }
    }
}

/// Turn-selection policy
#[derive(Clone, Debug, Default)]
pub struct TurnPolicy {
    config: TurnPolicyConfig,
}

impl TurnPolicy {
    pub fn new(config: TurnPolicyConfig) -> Self {
        Self { config }
    }

    /// Pick Left or Right for the post-backup `snapshot`.
    pub fn choose_turn(
        &self,
        snapshot: &SensorSnapshot,
        state: &PatrolState,
        random: &mut dyn RandomSource,
    ) -> Direction {
        match (snapshot.left, snapshot.right) {
            (false, true) => Direction::Left,
            (true, false) => Direction::Right,
            (true, true) => match state.last_turn {
                Some(turn) if random.chance(self.config.repeat_last_turn_probability) => turn,
                _ => random.either_turn(),
            },
            (false, false) => self.best_turn(state, random),
        }
    }

    /// Tiebreak when both sides are open.
    pub fn best_turn(&self, state: &PatrolState, random: &mut dyn RandomSource) -> Direction {
        let history = &state.move_history;
        if history.is_empty() {
            return random.either_turn();
        }

        if let Some(turn) = self.less_used_turn(history) {
            return turn;
        }

        if let Some(open) = state.last_clear_direction {
            return open;
        }

        // 2:1 against repeating the last turn; no last turn leans Left
        let favored = match state.last_turn {
            Some(Direction::Left) => Direction::Right,
            _ => Direction::Left,
        };
        random.favor_turn(favored)
    }

    /// Direction for the escape maneuver: the side turned less recently.
    pub fn escape_turn(&self, history: &MoveHistory, random: &mut dyn RandomSource) -> Direction {
        let lefts = history.count(Direction::Left);
        let rights = history.count(Direction::Right);

        match lefts.cmp(&rights) {
            std::cmp::Ordering::Less => Direction::Left,
            std::cmp::Ordering::Greater => Direction::Right,
            std::cmp::Ordering::Equal => random.either_turn(),
        }
    }

    /// Opposite of the dominant side once it leads by more than the margin.
    fn less_used_turn(&self, history: &MoveHistory) -> Option<Direction> {
        let lefts = history.count(Direction::Left);
        let rights = history.count(Direction::Right);
        let margin = self.config.anti_bias_margin;

        if lefts > rights + margin {
            Some(Direction::Right)
        } else if rights > lefts + margin {
            Some(Direction::Left)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::{ScriptedRandom, SeededRandom};
    use Direction::{Left, Right};

    fn state_with(moves: &[Direction], last_turn: Option<Direction>) -> PatrolState {
        let mut state = PatrolState::new();
        state.move_history = moves.iter().copied().collect();
        state.last_turn = last_turn;
        state
    }

    #[test]
    fn test_open_left_side_always_wins() {
        let policy = TurnPolicy::default();
        let snapshot = SensorSnapshot::new(true, false, true);
        let mut random = SeededRandom::new(1);

        for last_turn in [None, Some(Left), Some(Right)] {
            let state = state_with(&[Right, Right, Right, Right, Right], last_turn);
            for _ in 0..50 {
                assert_eq!(policy.choose_turn(&snapshot, &state, &mut random), Left);
            }
        }
    }

    #[test]
    fn test_open_right_side_always_wins() {
        let policy = TurnPolicy::default();
        let snapshot = SensorSnapshot::new(true, true, false);
        let state = state_with(&[Left, Left], Some(Left));
        let mut random = SeededRandom::new(1);

        for _ in 0..50 {
            assert_eq!(policy.choose_turn(&snapshot, &state, &mut random), Right);
        }
    }

    #[test]
    fn test_both_blocked_repeats_last_turn() {
        let policy = TurnPolicy::default();
        let snapshot = SensorSnapshot::boxed_in();
        let state = state_with(&[Right], Some(Right));

        // Draw below 0.7 keeps the last turn
        let mut random = ScriptedRandom::constant(0.2);
        assert_eq!(policy.choose_turn(&snapshot, &state, &mut random), Right);

        // Draw above 0.7 falls through to a coin flip (0.1 < 0.5 -> Left)
        let mut random = ScriptedRandom::new(vec![0.9, 0.1]);
        assert_eq!(policy.choose_turn(&snapshot, &state, &mut random), Left);
    }

    #[test]
    fn test_both_blocked_repeat_rate() {
        let policy = TurnPolicy::default();
        let snapshot = SensorSnapshot::boxed_in();
        let state = state_with(&[], Some(Left));
        let mut random = SeededRandom::new(42);

        let trials = 10000;
        let lefts = (0..trials)
            .filter(|_| policy.choose_turn(&snapshot, &state, &mut random) == Left)
            .count();

        // 0.7 repeat + 0.3 * 0.5 coin flip
        let ratio = lefts as f32 / trials as f32;
        assert!((ratio - 0.85).abs() < 0.05);
    }

    #[test]
    fn test_anti_bias_prefers_less_used_side() {
        let policy = TurnPolicy::default();
        let state = state_with(&[Left, Left, Left, Left, Right], Some(Right));
        let mut random = SeededRandom::new(9);

        for _ in 0..20 {
            assert_eq!(policy.best_turn(&state, &mut random), Right);
        }

        let state = state_with(&[Right, Right, Right], Some(Right));
        assert_eq!(policy.best_turn(&state, &mut random), Left);
    }

    #[test]
    fn test_both_clear_delegates_to_tiebreak() {
        let policy = TurnPolicy::default();
        let state = state_with(&[Left, Left, Left, Left, Right], Some(Right));
        let mut random = SeededRandom::new(5);

        assert_eq!(
            policy.choose_turn(&SensorSnapshot::new(true, false, false), &state, &mut random),
            Right
        );
    }

    #[test]
    fn test_balanced_history_reuses_last_clear_direction() {
        let policy = TurnPolicy::default();
        let mut state = state_with(&[Left, Right, Left], Some(Left));
        state.last_clear_direction = Some(Left);
        let mut random = SeededRandom::new(5);

        for _ in 0..20 {
            assert_eq!(policy.best_turn(&state, &mut random), Left);
        }
    }

    #[test]
    fn test_weighted_draw_against_last_turn() {
        let policy = TurnPolicy::default();
        let state = state_with(&[Left, Right], Some(Left));

        // 0.5 < 2/3 picks the favored side, Right
        let mut random = ScriptedRandom::constant(0.5);
        assert_eq!(policy.best_turn(&state, &mut random), Right);

        // 0.8 lands on the unfavored side
        let mut random = ScriptedRandom::constant(0.8);
        assert_eq!(policy.best_turn(&state, &mut random), Left);

        let state = state_with(&[Right, Left], Some(Right));
        let mut random = ScriptedRandom::constant(0.5);
        assert_eq!(policy.best_turn(&state, &mut random), Left);
    }

    #[test]
    fn test_empty_history_is_coin_flip() {
        let policy = TurnPolicy::default();
        let mut state = state_with(&[], Some(Left));
        state.last_clear_direction = Some(Left);

        let mut random = ScriptedRandom::constant(0.9);
        assert_eq!(policy.best_turn(&state, &mut random), Right);
    }

    #[test]
    fn test_escape_turn_goes_toward_fewer_turns() {
        let policy = TurnPolicy::default();
        let mut random = SeededRandom::new(3);

        let h: MoveHistory = [Left, Left, Right].into_iter().collect();
        assert_eq!(policy.escape_turn(&h, &mut random), Right);

        let h: MoveHistory = [Right, Right, Left].into_iter().collect();
        assert_eq!(policy.escape_turn(&h, &mut random), Left);

        let h: MoveHistory = [Left, Right].into_iter().collect();
        let mut random = ScriptedRandom::constant(0.1);
        assert_eq!(policy.escape_turn(&h, &mut random), Left);
    }
}
