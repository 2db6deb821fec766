//! Collaborator traits for the drive base and proximity sensors
//!
//! Both are shared, externally owned services: the controller holds them
//! behind `Arc` and never assumes exclusive access, so methods take `&self`
//! and implementations manage their own interior state.

use std::time::Duration;

use crate::error::Result;
use crate::types::{Direction, SensorSnapshot};

/// Differential drive motor driver
///
/// Every motion command blocks for `duration` and leaves the motors
/// stopped when it returns.
pub trait MotorDriver: Send + Sync {
    fn forward(&self, duration: Duration) -> Result<()>;

    fn backward(&self, duration: Duration) -> Result<()>;

    fn turn_left(&self, duration: Duration) -> Result<()>;

    fn turn_right(&self, duration: Duration) -> Result<()>;

    /// Stop all motors immediately
    fn stop(&self) -> Result<()>;

    /// Dispatch a `Direction` to the matching command.
    ///
    /// `Stop` ignores the duration.
    fn drive(&self, direction: Direction, duration: Duration) -> Result<()> {
        match direction {
            Direction::Forward => self.forward(duration),
            Direction::Backward => self.backward(duration),
            Direction::Left => self.turn_left(duration),
            Direction::Right => self.turn_right(duration),
            Direction::Stop => self.stop(),
        }
    }
}

/// Proximity sensor bank
pub trait SensorReader: Send + Sync {
    /// Read all obstacle flags at once.
    fn read(&self) -> Result<SensorSnapshot>;
}
