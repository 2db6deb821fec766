//! Patrol decision logic: state, stuck detection, turn policy, and the
//! engine tying them to the motor and sensor drivers.

mod detector;
pub mod engine;
mod policy;
mod state;

pub use detector::{MIN_HISTORY, StuckDetector, StuckReason};
pub use engine::{PatrolEngine, StepOutcome};
pub use policy::{TurnPolicy, TurnPolicyConfig};
pub use state::{PatrolPhase, PatrolState};
