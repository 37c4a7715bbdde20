//! Background analysis execution.
//!
//! An [`Analysis`] runs on a dedicated worker thread owned by an
//! [`AnalysisManager`]. The manager keeps at most one analysis alive per consumer,
//! and every started analysis ends with exactly one terminal callback
//! (finished, error or interrupted) delivered through the consumer's
//! [`CallbackQueue`] on the consumer's own thread.

pub mod cancel;
mod dispatch;
mod manager;
mod worker;

pub use cancel::{pad_to_minimum, Interruptible, ProgressCounter, StopFlag, PADDING_STEP};
pub use dispatch::{callback_channel, Callback, CallbackQueue, Dispatcher};
pub use manager::AnalysisManager;

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("analysis interrupted")]
    Interrupted,

    #[error("computation failed: {0}")]
    Computation(String),

    #[error("analysis panicked: {0}")]
    Panicked(String),

    #[error("failed to spawn worker thread: {0}")]
    Spawn(String),

    #[error("unknown attribute: {0}")]
    UnknownAttribute(String),
}

/// A cancellable, progress-reporting unit of background work.
///
/// `run`, `stop` and `progress` are called from different threads at the same
/// time, so implementations keep their state behind atomics or locks. Results
/// must stay inside the analysis until one of the terminal callbacks hands them
/// to the consumer; `run` never touches consumer state.
///
/// Cancellation is cooperative. An implementation that ignores `stop` keeps its
/// worker thread alive until `run` returns on its own.
pub trait Analysis: Send + Sync + 'static {
    /// Consumer state the terminal callbacks act on.
    type Target: 'static;

    /// Performs the computation on the worker thread.
    fn run(&self) -> Result<(), AnalysisError>;

    /// Requests cancellation. Must be idempotent and must not block.
    fn stop(&self);

    /// Current progress in percent.
    fn progress(&self) -> u8;

    fn on_finish(&self, target: &mut Self::Target, delivery: &Delivery);

    fn on_error(&self, target: &mut Self::Target, delivery: &Delivery, error: &AnalysisError);

    fn on_interrupt(&self, target: &mut Self::Target, delivery: &Delivery);
}

/// Terminal state of one worker run.
#[derive(Debug)]
pub enum Outcome {
    Finished,
    Failed(AnalysisError),
    Interrupted,
}

/// Identifies the run a terminal callback belongs to.
///
/// Every `start` on a manager issues a new generation. A callback whose
/// generation is no longer the manager's latest comes from a superseded run and
/// must not touch consumer state.
#[derive(Debug, Clone)]
pub struct Delivery {
    generation: u64,
    latest: Arc<AtomicU64>,
}

impl Delivery {
    pub(crate) fn new(generation: u64, latest: Arc<AtomicU64>) -> Self {
        Self { generation, latest }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// True while no newer run has been started on the same manager.
    pub fn is_current(&self) -> bool {
        self.latest.load(Ordering::Acquire) == self.generation
    }
}
