//! Patrol decision engine.
//!
//! One [`PatrolEngine::step`] is one iteration of the polling loop minus the
//! trailing poll sleep: read sensors, check for a stuck pattern, then either
//! advance, avoid an obstacle, or escape. Motor commands block for their
//! duration, so a step can take several seconds.

use std::sync::Arc;
use std::time::Duration;

use crate::config::{PatrolConfig, secs};
use crate::drivers::{MotorDriver, SensorReader};
use crate::error::Result;
use crate::random::RandomSource;
use crate::types::{Direction, SensorSnapshot};

use super::detector::StuckDetector;
use super::policy::{TurnPolicy, TurnPolicyConfig};
use super::state::{PatrolPhase, PatrolState};

/// What a single step ended up doing
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    /// Center clear, moved forward
    Advanced,
    /// Backed up and turned toward the given side
    Turned(Direction),
    /// Obstacle handling escalated to the escape maneuver toward the given side
    Escaped(Direction),
    /// Stuck pattern detected before sensing; escaped toward the given side
    Unstuck(Direction),
}

/// Decision engine driving the motors from sensor reads
pub struct PatrolEngine {
    config: PatrolConfig,
    motor: Arc<dyn MotorDriver>,
    sensors: Arc<dyn SensorReader>,
    random: Box<dyn RandomSource>,
    detector: StuckDetector,
    policy: TurnPolicy,
    state: PatrolState,
    escapes: u32,
}

impl PatrolEngine {
    pub fn new(
        config: PatrolConfig,
        motor: Arc<dyn MotorDriver>,
        sensors: Arc<dyn SensorReader>,
        random: Box<dyn RandomSource>,
    ) -> Self {
        let detector = StuckDetector::new(config.policy.stuck_block_threshold);
        let policy = TurnPolicy::new(TurnPolicyConfig {
            repeat_last_turn_probability: config.policy.repeat_last_turn_probability,
            anti_bias_margin: config.policy.anti_bias_margin,
        });

        Self {
            config,
            motor,
            sensors,
            random,
            detector,
            policy,
            state: PatrolState::new(),
            escapes: 0,
        }
    }

    pub fn state(&self) -> &PatrolState {
        &self.state
    }

    pub fn config(&self) -> &PatrolConfig {
        &self.config
    }

    pub fn motor(&self) -> &Arc<dyn MotorDriver> {
        &self.motor
    }

    /// Escape maneuvers run since construction
    pub fn escapes(&self) -> u32 {
        self.escapes
    }

    pub(crate) fn set_phase(&mut self, phase: PatrolPhase) {
        self.state.phase = phase;
    }

    #[cfg(test)]
    pub(crate) fn state_mut(&mut self) -> &mut PatrolState {
        &mut self.state
    }

    /// Run one loop iteration.
    pub fn step(&mut self) -> Result<StepOutcome> {
        let snapshot = self.sensors.read()?;
        self.state.record_reading(snapshot);
        tracing::trace!("Sensors {}", snapshot);

        if let Some(reason) = self.detector.detect(
            &self.state.move_history,
            self.state.last_turn,
            self.state.consecutive_blocks,
        ) {
            tracing::warn!("Stuck detected ({:?}), escaping", reason);
            let turn = self.execute_escape()?;
            return Ok(StepOutcome::Unstuck(turn));
        }

        if !snapshot.center {
            self.move_forward(&snapshot)?;
            self.state.reset_blocks();
            Ok(StepOutcome::Advanced)
        } else {
            self.handle_obstacle()
        }
    }

    /// Back up, re-sense, and turn away; escalates to escape when blocked
    /// too many times in a row.
    pub fn handle_obstacle(&mut self) -> Result<StepOutcome> {
        self.state.phase = PatrolPhase::Avoiding;
        tracing::info!("Obstacle detected, executing avoidance maneuver");

        let backup = secs(self.config.timing.backup);
        self.maneuver(Direction::Backward, backup, backup)?;

        let snapshot = self.sensors.read()?;
        self.state.consecutive_blocks += 1;

        if self.state.consecutive_blocks > self.config.policy.escape_block_threshold {
            tracing::info!(
                "Blocked {} times in a row, escalating to escape",
                self.state.consecutive_blocks
            );
            let turn = self.execute_escape()?;
            return Ok(StepOutcome::Escaped(turn));
        }

        let turn = self
            .policy
            .choose_turn(&snapshot, &self.state, &mut *self.random);
        tracing::debug!(
            "Turning {} after backup (sensors {}, blocks {})",
            turn,
            snapshot,
            self.state.consecutive_blocks
        );

        let duration = secs(self.config.timing.turn);
        self.maneuver(turn, duration, duration)?;
        self.state.record_turn(turn);

        Ok(StepOutcome::Turned(turn))
    }

    /// Long backup and turn toward the less-used side, then forget the
    /// history that led here.
    pub fn execute_escape(&mut self) -> Result<Direction> {
        self.state.phase = PatrolPhase::Escaping;
        tracing::info!("Executing escape maneuver");

        let backup = secs(self.config.timing.escape_backup);
        self.maneuver(Direction::Backward, backup, backup)?;

        let turn = self
            .policy
            .escape_turn(&self.state.move_history, &mut *self.random);
        let duration = secs(self.config.timing.escape_turn);
        self.maneuver(turn, duration, duration)?;

        self.state.reset_after_escape(turn);
        self.escapes += 1;
        tracing::info!("Escape complete, turned {}", turn);

        Ok(turn)
    }

    /// Advance with a small heading nudge away from a blocked side.
    pub fn move_forward(&mut self, snapshot: &SensorSnapshot) -> Result<()> {
        self.state.phase = PatrolPhase::Moving;

        if let Some(open) = snapshot.open_side() {
            self.state.last_clear_direction = Some(open);
        }

        let correction = secs(self.config.timing.correction);
        if snapshot.left {
            tracing::debug!("Too close to left, nudging right");
            self.maneuver(Direction::Right, correction, correction)?;
        } else if snapshot.right {
            tracing::debug!("Too close to right, nudging left");
            self.maneuver(Direction::Left, correction, correction)?;
        }

        // Settle shorter than the move so consecutive forwards overlap
        self.maneuver(
            Direction::Forward,
            secs(self.config.timing.forward),
            secs(self.config.timing.forward_settle),
        )
    }

    /// Issue a blocking command, then wait `settle` before continuing.
    fn maneuver(&self, direction: Direction, duration: Duration, settle: Duration) -> Result<()> {
        self.motor.drive(direction, duration)?;
        pause(settle);
        Ok(())
    }
}

/// Sleep unless the duration is zero
#[inline]
pub(crate) fn pause(duration: Duration) {
    if !duration.is_zero() {
        std::thread::sleep(duration);
    }
}
