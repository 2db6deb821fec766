//! RakshaPatrol - Reactive obstacle-avoidance patrol for wheeled robots
//!
//! A polling loop reads three boolean proximity flags (center, left, right),
//! decides a motion, and issues blocking, bounded-duration motor commands.
//! Recent turn history steers the choice of turn so the robot does not
//! oscillate or circle, and an escape maneuver breaks out of repeated
//! blocking.
//!
//! ## Components
//!
//! - [`PatrolController`]: start/stop lifecycle and status
//! - [`patrol::PatrolEngine`]: one loop iteration (sense, detect, act)
//! - [`patrol::StuckDetector`] and [`patrol::TurnPolicy`]: decision rules
//! - [`drivers`]: the motor and sensor traits hardware must implement
//! - [`devices::mock`]: simulated devices for tests and dry runs
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use raksha_patrol::devices::{MockMotorDriver, RandomSensorReader};
//! use raksha_patrol::{PatrolConfig, PatrolController};
//!
//! let controller = PatrolController::new(
//!     PatrolConfig::default(),
//!     Arc::new(MockMotorDriver::realtime()),
//!     Arc::new(RandomSensorReader::new(0.2, 42)),
//! )?;
//!
//! assert!(controller.start_patrol());
//! std::thread::sleep(std::time::Duration::from_secs(5));
//! controller.stop_patrol();
//! # Ok::<(), raksha_patrol::PatrolError>(())
//! ```

pub mod config;
pub mod controller;
pub mod devices;
pub mod drivers;
pub mod error;
pub mod history;
pub mod patrol;
pub mod random;
pub mod shared;
mod threads;
pub mod types;

// Re-export commonly used types
pub use config::PatrolConfig;
pub use controller::PatrolController;
pub use drivers::{MotorDriver, SensorReader};
pub use error::{PatrolError, Result};
pub use shared::PatrolStatus;
pub use types::{Direction, SensorSnapshot};
