//! State shared between the controller and the patrol loop thread.
//!
//! Everything here is atomic so `status()` never waits on the loop, which
//! may be blocked in a multi-second motor command.

use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU32, AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::patrol::{PatrolPhase, PatrolState};
use crate::types::Direction;

/// Snapshot reported by `PatrolController::status`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PatrolStatus {
    pub is_patrolling: bool,
    pub last_turn: Option<Direction>,
    pub consecutive_blocks: u32,
    pub phase: PatrolPhase,
    /// Loop iterations completed since construction
    pub iterations: u64,
    /// Escape maneuvers run since construction
    pub escapes: u32,
    /// Faulted iterations since construction
    pub faults: u32,
}

/// Atomic wrapper for `Option<Direction>` limited to turns.
#[derive(Debug, Default)]
struct AtomicTurn(AtomicU8);

impl AtomicTurn {
    fn load(&self, order: Ordering) -> Option<Direction> {
        match self.0.load(order) {
            1 => Some(Direction::Left),
            2 => Some(Direction::Right),
            _ => None,
        }
    }

    fn store(&self, turn: Option<Direction>, order: Ordering) {
        let raw = match turn {
            Some(Direction::Left) => 1,
            Some(Direction::Right) => 2,
            _ => 0,
        };
        self.0.store(raw, order);
    }
}

/// Atomic wrapper for `PatrolPhase`.
#[derive(Debug, Default)]
struct AtomicPhase(AtomicU8);

impl AtomicPhase {
    fn load(&self, order: Ordering) -> PatrolPhase {
        match self.0.load(order) {
            1 => PatrolPhase::Moving,
            2 => PatrolPhase::Avoiding,
            3 => PatrolPhase::Escaping,
            _ => PatrolPhase::Idle,
        }
    }

    fn store(&self, phase: PatrolPhase, order: Ordering) {
        let raw = match phase {
            PatrolPhase::Idle => 0,
            PatrolPhase::Moving => 1,
            PatrolPhase::Avoiding => 2,
            PatrolPhase::Escaping => 3,
        };
        self.0.store(raw, order);
    }
}

/// Shared state between the controller and its loop thread.
#[derive(Debug, Default)]
pub struct SharedState {
    /// Cancellation flag; the loop runs while this is set
    patrolling: AtomicBool,

    /// Incremented on every start so a loop outliving its stop can tell it
    /// has been superseded
    generation: AtomicU64,

    /// Serializes start against a loop clearing its own flag on exit
    lifecycle: Mutex<()>,

    last_turn: AtomicTurn,
    consecutive_blocks: AtomicU32,
    phase: AtomicPhase,
    iterations: AtomicU64,
    escapes: AtomicU32,
    faults: AtomicU32,
}

impl SharedState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the patrolling flag for a new loop and return its generation,
    /// or `None` when a loop is already active.
    pub fn begin(&self) -> Option<u64> {
        let _guard = self.lifecycle.lock();
        if self.patrolling.load(Ordering::Acquire) {
            return None;
        }
        // Generation first: a stale loop that sees the flag raised must
        // also see that it has been superseded.
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        self.phase.store(PatrolPhase::Moving, Ordering::Release);
        self.patrolling.store(true, Ordering::Release);
        Some(generation)
    }

    /// Request cancellation of the active loop.
    pub fn request_stop(&self) {
        let _guard = self.lifecycle.lock();
        self.patrolling.store(false, Ordering::Release);
    }

    /// Clear the flag on loop exit, unless a newer loop has taken over.
    pub fn finish(&self, generation: u64) {
        let _guard = self.lifecycle.lock();
        if self.generation.load(Ordering::Acquire) == generation {
            self.patrolling.store(false, Ordering::Release);
            self.phase.store(PatrolPhase::Idle, Ordering::Release);
        }
    }

    /// True while the loop of `generation` should keep running.
    pub fn should_continue(&self, generation: u64) -> bool {
        self.patrolling.load(Ordering::Acquire)
            && self.generation.load(Ordering::Acquire) == generation
    }

    pub fn is_patrolling(&self) -> bool {
        self.patrolling.load(Ordering::Acquire)
    }

    /// Mirror the loop-owned state for status readers.
    ///
    /// Ignored once `generation` has been superseded, so a loop still
    /// draining after its stop cannot overwrite a newer loop's status.
    pub fn publish(&self, generation: u64, state: &PatrolState, escapes: u32) {
        let _guard = self.lifecycle.lock();
        if self.generation.load(Ordering::Acquire) != generation {
            return;
        }
        self.last_turn.store(state.last_turn(), Ordering::Release);
        self.consecutive_blocks
            .store(state.consecutive_blocks(), Ordering::Release);
        self.phase.store(state.phase(), Ordering::Release);
        self.escapes.store(escapes, Ordering::Relaxed);
    }

    /// Increment iteration count.
    pub fn increment_iterations(&self) {
        self.iterations.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment fault count.
    pub fn increment_faults(&self) {
        self.faults.fetch_add(1, Ordering::Relaxed);
    }

    pub fn status(&self) -> PatrolStatus {
        let is_patrolling = self.is_patrolling();
        PatrolStatus {
            is_patrolling,
            last_turn: self.last_turn.load(Ordering::Acquire),
            consecutive_blocks: self.consecutive_blocks.load(Ordering::Acquire),
            phase: if is_patrolling {
                self.phase.load(Ordering::Acquire)
            } else {
                PatrolPhase::Idle
            },
            iterations: self.iterations.load(Ordering::Relaxed),
            escapes: self.escapes.load(Ordering::Relaxed),
            faults: self.faults.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_begin_is_exclusive() {
        let shared = SharedState::new();

        let first = shared.begin();
        assert_eq!(first, Some(1));
        assert_eq!(shared.begin(), None);
        assert!(shared.is_patrolling());
        assert_eq!(shared.status().phase, PatrolPhase::Moving);

        shared.request_stop();
        assert!(!shared.should_continue(1));
        assert_eq!(shared.begin(), Some(2));
    }

    #[test]
    fn test_stale_generation_stops_even_when_restarted() {
        let shared = SharedState::new();
        let old = shared.begin().unwrap();
        shared.request_stop();
        let new = shared.begin().unwrap();

        assert!(!shared.should_continue(old));
        assert!(shared.should_continue(new));

        // Old loop exiting must not clear the new loop's flag
        shared.finish(old);
        assert!(shared.is_patrolling());

        shared.finish(new);
        assert!(!shared.is_patrolling());
    }

    #[test]
    fn test_publish_round_trips_status() {
        let shared = SharedState::new();
        let mut state = PatrolState::new();
        state.record_turn(Direction::Right);
        state.consecutive_blocks = 2;
        state.phase = PatrolPhase::Avoiding;

        let generation = shared.begin().unwrap();
        shared.publish(generation, &state, 3);
        shared.increment_iterations();
        shared.increment_faults();

        let status = shared.status();
        assert!(status.is_patrolling);
        assert_eq!(status.last_turn, Some(Direction::Right));
        assert_eq!(status.consecutive_blocks, 2);
        assert_eq!(status.phase, PatrolPhase::Avoiding);
        assert_eq!(status.iterations, 1);
        assert_eq!(status.escapes, 3);
        assert_eq!(status.faults, 1);
    }

    #[test]
    fn test_superseded_loop_cannot_publish() {
        let shared = SharedState::new();
        let old = shared.begin().unwrap();
        shared.request_stop();
        let new = shared.begin().unwrap();

        let mut current = PatrolState::new();
        current.record_turn(Direction::Left);
        current.consecutive_blocks = 1;
        current.phase = PatrolPhase::Avoiding;
        shared.publish(new, &current, 0);

        // Old loop exiting with its own view of the state
        let mut stale = PatrolState::new();
        stale.record_turn(Direction::Right);
        stale.phase = PatrolPhase::Idle;
        shared.publish(old, &stale, 7);
        shared.finish(old);

        let status = shared.status();
        assert!(status.is_patrolling);
        assert_eq!(status.phase, PatrolPhase::Avoiding);
        assert_eq!(status.last_turn, Some(Direction::Left));
        assert_eq!(status.consecutive_blocks, 1);
        assert_eq!(status.escapes, 0);
    }

    #[test]
    fn test_idle_status_reports_idle_phase() {
        let shared = SharedState::new();
        let generation = shared.begin().unwrap();
        let mut state = PatrolState::new();
        state.phase = PatrolPhase::Escaping;
        shared.publish(generation, &state, 0);

        shared.request_stop();
        assert_eq!(shared.status().phase, PatrolPhase::Idle);
    }
}
