//! Patrol thread: polls sensors and drives the motors until cancelled.
//!
//! Each iteration runs one engine step and sleeps the poll interval.
//! Cancellation is checked only between iterations; a motor command in
//! flight always runs to completion.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::secs;
use crate::drivers::MotorDriver;
use crate::patrol::engine::pause;
use crate::patrol::{PatrolEngine, PatrolPhase, StepOutcome};
use crate::shared::SharedState;

/// Patrol thread state and logic.
pub struct PatrolThread {
    engine: Arc<Mutex<PatrolEngine>>,
    shared_state: Arc<SharedState>,
    generation: u64,
}

impl PatrolThread {
    /// Create a new patrol thread for the loop started as `generation`.
    pub fn new(
        engine: Arc<Mutex<PatrolEngine>>,
        shared_state: Arc<SharedState>,
        generation: u64,
    ) -> Self {
        Self {
            engine,
            shared_state,
            generation,
        }
    }

    /// Run the patrol loop until stopped or out of fault retries.
    pub fn run(&mut self) {
        // Blocks while a superseded loop finishes its last command
        let mut engine = self.engine.lock();
        let _exit = ExitGuard {
            shared_state: Arc::clone(&self.shared_state),
            motor: Arc::clone(engine.motor()),
            generation: self.generation,
        };

        let poll_interval = secs(engine.config().timing.poll_interval);
        let retry_backoff = secs(engine.config().faults.retry_backoff);
        let max_faults = engine.config().faults.max_consecutive_faults;
        let mut consecutive_faults = 0u32;

        tracing::info!("Patrol thread started (run {})", self.generation);

        while self.shared_state.should_continue(self.generation) {
            match engine.step() {
                Ok(outcome) => {
                    consecutive_faults = 0;
                    self.shared_state.increment_iterations();
                    self.shared_state
                        .publish(self.generation, engine.state(), engine.escapes());

                    // Breaking out of a stuck pattern restarts the cycle
                    // without the poll sleep
                    if matches!(outcome, StepOutcome::Unstuck(_)) {
                        continue;
                    }
                    pause(poll_interval);
                }
                Err(e) => {
                    consecutive_faults += 1;
                    // A step can fail after bumping the block counter
                    self.shared_state
                        .publish(self.generation, engine.state(), engine.escapes());
                    self.shared_state.increment_faults();
                    tracing::error!(
                        "Patrol iteration failed ({}/{}): {}",
                        consecutive_faults,
                        max_faults,
                        e
                    );

                    if let Err(stop_err) = engine.motor().stop() {
                        tracing::error!("Failed to send stop command: {}", stop_err);
                    }

                    if !e.is_device_fault() {
                        tracing::warn!("Non-device error, patrol going idle");
                        break;
                    }
                    if consecutive_faults >= max_faults {
                        tracing::warn!(
                            "Giving up after {} consecutive faults, patrol going idle",
                            consecutive_faults
                        );
                        break;
                    }
                    pause(retry_backoff);
                }
            }
        }

        engine.set_phase(PatrolPhase::Idle);
        self.shared_state
            .publish(self.generation, engine.state(), engine.escapes());
        tracing::info!("Patrol thread exited (run {})", self.generation);
    }
}

/// Clears the patrolling flag however the loop ends, including by panic.
struct ExitGuard {
    shared_state: Arc<SharedState>,
    motor: Arc<dyn MotorDriver>,
    generation: u64,
}

impl Drop for ExitGuard {
    fn drop(&mut self) {
        if std::thread::panicking() {
            tracing::error!("Patrol thread panicked (run {})", self.generation);
            if let Err(e) = self.motor.stop() {
                tracing::error!("Failed to send stop command: {}", e);
            }
        }
        self.shared_state.finish(self.generation);
    }
}

