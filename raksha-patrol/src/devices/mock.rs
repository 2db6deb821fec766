//! Mock motor and sensor drivers for testing and dry runs

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::Mutex;

use crate::drivers::{MotorDriver, SensorReader};
use crate::error::{PatrolError, Result};
use crate::random::{RandomSource, SeededRandom};
use crate::types::{Direction, SensorSnapshot};

/// A motor command as received by the mock driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotorCommand {
    Forward(Duration),
    Backward(Duration),
    TurnLeft(Duration),
    TurnRight(Duration),
    Stop,
}

impl MotorCommand {
    pub fn direction(&self) -> Direction {
        match self {
            MotorCommand::Forward(_) => Direction::Forward,
            MotorCommand::Backward(_) => Direction::Backward,
            MotorCommand::TurnLeft(_) => Direction::Left,
            MotorCommand::TurnRight(_) => Direction::Right,
            MotorCommand::Stop => Direction::Stop,
        }
    }

    pub fn duration(&self) -> Duration {
        match *self {
            MotorCommand::Forward(d)
            | MotorCommand::Backward(d)
            | MotorCommand::TurnLeft(d)
            | MotorCommand::TurnRight(d) => d,
            MotorCommand::Stop => Duration::ZERO,
        }
    }
}

#[derive(Debug, Default)]
struct MockMotorState {
    commands: Vec<MotorCommand>,
    pending_faults: usize,
}

#[derive(Debug, Default)]
struct MockMotorInner {
    state: Mutex<MockMotorState>,
    realtime: bool,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

/// Mock motor driver
///
/// Records every command. In realtime mode each motion command sleeps
/// for its duration like real hardware would.
#[derive(Clone, Default)]
pub struct MockMotorDriver {
    inner: Arc<MockMotorInner>,
}

impl MockMotorDriver {
    /// Create new mock motor driver that returns immediately
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock that blocks for each command's duration
    pub fn realtime() -> Self {
        Self {
            inner: Arc::new(MockMotorInner {
                realtime: true,
                ..Default::default()
            }),
        }
    }

    /// All commands received so far
    pub fn commands(&self) -> Vec<MotorCommand> {
        self.inner.state.lock().commands.clone()
    }

    pub fn last_command(&self) -> Option<MotorCommand> {
        self.inner.state.lock().commands.last().copied()
    }

    /// Number of stop commands received
    pub fn stop_count(&self) -> usize {
        self.inner
            .state
            .lock()
            .commands
            .iter()
            .filter(|c| **c == MotorCommand::Stop)
            .count()
    }

    /// Forget recorded commands
    pub fn clear(&self) {
        self.inner.state.lock().commands.clear();
    }

    /// Make the next `count` commands fail with an actuator fault
    pub fn fail_next(&self, count: usize) {
        self.inner.state.lock().pending_faults = count;
    }

    /// Most commands ever executing at the same time
    pub fn max_concurrent(&self) -> usize {
        self.inner.max_in_flight.load(Ordering::SeqCst)
    }

    fn execute(&self, command: MotorCommand) -> Result<()> {
        {
            let mut state = self.inner.state.lock();
            if state.pending_faults > 0 {
                state.pending_faults -= 1;
                return Err(PatrolError::Actuator(format!(
                    "injected fault on {:?}",
                    command
                )));
            }
            state.commands.push(command);
        }
        tracing::trace!("Mock motor: {:?}", command);

        let active = self.inner.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.inner.max_in_flight.fetch_max(active, Ordering::SeqCst);

        let duration = command.duration();
        if self.inner.realtime && !duration.is_zero() {
            std::thread::sleep(duration);
        }

        self.inner.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }
}

impl MotorDriver for MockMotorDriver {
    fn forward(&self, duration: Duration) -> Result<()> {
        self.execute(MotorCommand::Forward(duration))
    }

    fn backward(&self, duration: Duration) -> Result<()> {
        self.execute(MotorCommand::Backward(duration))
    }

    fn turn_left(&self, duration: Duration) -> Result<()> {
        self.execute(MotorCommand::TurnLeft(duration))
    }

    fn turn_right(&self, duration: Duration) -> Result<()> {
        self.execute(MotorCommand::TurnRight(duration))
    }

    fn stop(&self) -> Result<()> {
        self.execute(MotorCommand::Stop)
    }
}

#[derive(Debug, Default)]
struct ScriptState {
    readings: Vec<SensorSnapshot>,
    index: usize,
    reads: usize,
    pending_faults: usize,
}

/// Sensor reader replaying a fixed list of snapshots, cycling when exhausted
#[derive(Clone, Default)]
pub struct ScriptedSensorReader {
    state: Arc<Mutex<ScriptState>>,
}

impl ScriptedSensorReader {
    pub fn new(readings: Vec<SensorSnapshot>) -> Self {
        Self {
            state: Arc::new(Mutex::new(ScriptState {
                readings,
                ..Default::default()
            })),
        }
    }

    /// Replace the script and restart from its first entry
    pub fn set_readings(&self, readings: Vec<SensorSnapshot>) {
        let mut state = self.state.lock();
        state.readings = readings;
        state.index = 0;
    }

    /// Successful reads so far
    pub fn reads(&self) -> usize {
        self.state.lock().reads
    }

    /// Make the next `count` reads fail with a sensor fault
    pub fn fail_next(&self, count: usize) {
        self.state.lock().pending_faults = count;
    }
}

impl SensorReader for ScriptedSensorReader {
    fn read(&self) -> Result<SensorSnapshot> {
        let mut state = self.state.lock();
        if state.pending_faults > 0 {
            state.pending_faults -= 1;
            return Err(PatrolError::Sensor("injected read fault".to_string()));
        }
        if state.readings.is_empty() {
            return Err(PatrolError::Sensor("no readings scripted".to_string()));
        }

        let snapshot = state.readings[state.index % state.readings.len()];
        state.index += 1;
        state.reads += 1;
        Ok(snapshot)
    }
}

/// Sensor reader reporting each side blocked with a fixed probability
pub struct RandomSensorReader {
    random: Mutex<SeededRandom>,
    obstacle_rate: f32,
}

impl RandomSensorReader {
    /// `seed` of 0 uses OS entropy
    pub fn new(obstacle_rate: f32, seed: u64) -> Self {
        Self {
            random: Mutex::new(SeededRandom::new(seed)),
            obstacle_rate: obstacle_rate.clamp(0.0, 1.0),
        }
    }
}

impl SensorReader for RandomSensorReader {
    fn read(&self) -> Result<SensorSnapshot> {
        let mut random = self.random.lock();
        let rate = self.obstacle_rate;
        Ok(SensorSnapshot::new(
            random.chance(rate),
            random.chance(rate),
            random.chance(rate),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_commands() {
        let motor = MockMotorDriver::new();
        motor.forward(Duration::from_millis(300)).unwrap();
        motor.drive(Direction::Left, Duration::from_millis(10)).unwrap();
        motor.stop().unwrap();

        assert_eq!(
            motor.commands(),
            vec![
                MotorCommand::Forward(Duration::from_millis(300)),
                MotorCommand::TurnLeft(Duration::from_millis(10)),
                MotorCommand::Stop,
            ]
        );
        assert_eq!(motor.stop_count(), 1);
        assert_eq!(motor.max_concurrent(), 1);
    }

    #[test]
    fn test_realtime_blocks_for_duration() {
        let motor = MockMotorDriver::realtime();
        let start = std::time::Instant::now();
        motor.backward(Duration::from_millis(30)).unwrap();

        assert!(start.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn test_motor_fault_injection() {
        let motor = MockMotorDriver::new();
        motor.fail_next(1);

        assert!(matches!(motor.stop(), Err(PatrolError::Actuator(_))));
        assert!(motor.stop().is_ok());
        assert_eq!(motor.commands(), vec![MotorCommand::Stop]);
    }

    #[test]
    fn test_scripted_reader_cycles() {
        let reader = ScriptedSensorReader::new(vec![
            SensorSnapshot::clear(),
            SensorSnapshot::boxed_in(),
        ]);

        assert_eq!(reader.read().unwrap(), SensorSnapshot::clear());
        assert_eq!(reader.read().unwrap(), SensorSnapshot::boxed_in());
        assert_eq!(reader.read().unwrap(), SensorSnapshot::clear());
        assert_eq!(reader.reads(), 3);
    }

    #[test]
    fn test_scripted_reader_faults() {
        let reader = ScriptedSensorReader::new(vec![SensorSnapshot::clear()]);
        reader.fail_next(2);

        assert!(reader.read().is_err());
        assert!(reader.read().is_err());
        assert!(reader.read().is_ok());

        let empty = ScriptedSensorReader::new(Vec::new());
        assert!(matches!(empty.read(), Err(PatrolError::Sensor(_))));
    }

    #[test]
    fn test_random_reader_extremes() {
        let never = RandomSensorReader::new(0.0, 1);
        let always = RandomSensorReader::new(1.0, 1);

        for _ in 0..100 {
            assert_eq!(never.read().unwrap(), SensorSnapshot::clear());
            assert_eq!(always.read().unwrap(), SensorSnapshot::boxed_in());
        }
    }
}
