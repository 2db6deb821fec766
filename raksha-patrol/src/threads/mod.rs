//! Background thread for the patrol loop.
//!
//! One thread per started patrol; it owns the engine lock for its whole
//! run, so decision state has a single writer.

mod patrol;

pub use patrol::PatrolThread;

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::Mutex;

use crate::error::Result;
use crate::patrol::PatrolEngine;
use crate::shared::SharedState;

/// Spawn the patrol loop for `generation` and return its handle.
pub fn spawn_patrol_thread(
    engine: Arc<Mutex<PatrolEngine>>,
    shared_state: Arc<SharedState>,
    generation: u64,
) -> Result<JoinHandle<()>> {
    let handle = thread::Builder::new()
        .name(format!("patrol-{}", generation))
        .spawn(move || {
            let mut patrol_thread = PatrolThread::new(engine, shared_state, generation);
            patrol_thread.run();
        })?;

    Ok(handle)
}
