//! Device implementations of the collaborator traits
//!
//! Only simulated devices live here; real hardware drivers are provided
//! by the embedding application.

pub mod mock;

pub use mock::{MockMotorDriver, MotorCommand, RandomSensorReader, ScriptedSensorReader};
