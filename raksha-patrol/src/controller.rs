//! Patrol controller: start/stop lifecycle around the patrol thread.

use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::config::{PatrolConfig, secs};
use crate::drivers::{MotorDriver, SensorReader};
use crate::error::Result;
use crate::patrol::{PatrolEngine, PatrolState};
use crate::random::{RandomSource, SeededRandom};
use crate::shared::{PatrolStatus, SharedState};
use crate::threads::spawn_patrol_thread;

/// How often `stop_patrol` checks whether the loop thread has exited
const JOIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Owns the patrol engine and runs it on a background thread on demand.
///
/// All methods take `&self`, so a controller can sit behind an `Arc` and be
/// driven from several request handlers.
pub struct PatrolController {
    motor: Arc<dyn MotorDriver>,
    engine: Arc<Mutex<PatrolEngine>>,
    shared_state: Arc<SharedState>,
    handle: Mutex<Option<JoinHandle<()>>>,
    join_timeout: Duration,
}

impl PatrolController {
    /// Create a controller drawing randomness from `config.policy.seed`.
    pub fn new(
        config: PatrolConfig,
        motor: Arc<dyn MotorDriver>,
        sensors: Arc<dyn SensorReader>,
    ) -> Result<Self> {
        let random = Box::new(SeededRandom::new(config.policy.seed));
        Self::with_random(config, motor, sensors, random)
    }

    /// Create a controller with a caller-supplied random source.
    pub fn with_random(
        config: PatrolConfig,
        motor: Arc<dyn MotorDriver>,
        sensors: Arc<dyn SensorReader>,
        random: Box<dyn RandomSource>,
    ) -> Result<Self> {
        config.validate()?;
        let join_timeout = secs(config.timing.join_timeout);
        let engine = PatrolEngine::new(config, Arc::clone(&motor), sensors, random);

        Ok(Self {
            motor,
            engine: Arc::new(Mutex::new(engine)),
            shared_state: Arc::new(SharedState::new()),
            handle: Mutex::new(None),
            join_timeout,
        })
    }

    /// Start patrolling. Returns false if a patrol is already running.
    pub fn start_patrol(&self) -> bool {
        let mut handle = self.handle.lock();

        let Some(generation) = self.shared_state.begin() else {
            tracing::debug!("Patrol already running, ignoring start");
            return false;
        };

        match spawn_patrol_thread(
            Arc::clone(&self.engine),
            Arc::clone(&self.shared_state),
            generation,
        ) {
            Ok(new_handle) => {
                // A previous handle here belongs to a loop that outlived its
                // stop timeout; it exits on its own at the next iteration.
                *handle = Some(new_handle);
                tracing::info!("Smart patrol started");
                true
            }
            Err(e) => {
                tracing::error!("Failed to spawn patrol thread: {}", e);
                self.shared_state.finish(generation);
                false
            }
        }
    }

    /// Stop patrolling and halt the motors.
    ///
    /// Waits up to the configured join timeout for the loop to exit; a motor
    /// command already in flight may outlast it. Always ends by issuing a
    /// stop command, even when no patrol was running.
    pub fn stop_patrol(&self) {
        self.shared_state.request_stop();

        let handle = self.handle.lock().take();
        if let Some(handle) = handle {
            self.join_with_timeout(handle);
        }

        if let Err(e) = self.motor.stop() {
            tracing::error!("Failed to send stop command: {}", e);
        }
        tracing::info!("Smart patrol stopped");
    }

    /// Current status, read without waiting on the loop.
    pub fn status(&self) -> PatrolStatus {
        self.shared_state.status()
    }

    pub fn is_patrolling(&self) -> bool {
        self.shared_state.is_patrolling()
    }

    /// Run `f` on the decision state if no loop currently holds it.
    pub fn inspect<R>(&self, f: impl FnOnce(&PatrolState) -> R) -> Option<R> {
        self.engine.try_lock().map(|engine| f(engine.state()))
    }

    fn join_with_timeout(&self, handle: JoinHandle<()>) {
        // A timeout past the end of the clock means wait for as long as it takes
        let deadline = Instant::now().checked_add(self.join_timeout);
        while !handle.is_finished() && deadline.is_none_or(|d| Instant::now() < d) {
            std::thread::sleep(JOIN_POLL_INTERVAL);
        }

        if handle.is_finished() {
            if let Err(e) = handle.join() {
                tracing::error!("Patrol thread panicked: {:?}", e);
            }
        } else {
            tracing::warn!(
                "Patrol thread still busy after {:.1}s, leaving it to exit on its own",
                self.join_timeout.as_secs_f32()
            );
        }
    }
}

impl Drop for PatrolController {
    fn drop(&mut self) {
        if self.is_patrolling() {
            self.stop_patrol();
        }
    }
}
