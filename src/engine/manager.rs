//! Per-consumer coordinator owning at most one running analysis.

use super::worker::Worker;
use super::{callback_channel, Analysis, CallbackQueue, Delivery, Dispatcher};
use parking_lot::Mutex;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

/// Runs analyses for a single consumer, one at a time.
///
/// Starting a new analysis stops the previous one without waiting for it. The
/// superseded run still delivers its terminal callback, tagged with an older
/// generation, so the consumer can tell it apart from the current run via
/// [`Delivery::is_current`].
pub struct AnalysisManager<V: 'static> {
    /// Serialises `start` calls; held across thread creation.
    starting: Mutex<()>,
    /// Only ever locked briefly, so readers never wait on a spawn.
    active: Mutex<Option<Worker<V>>>,
    dispatcher: Dispatcher<V>,
    latest: Arc<AtomicU64>,
}

impl<V: 'static> AnalysisManager<V> {
    /// Creates a manager and the queue its callbacks are delivered to.
    pub fn new() -> (Self, CallbackQueue<V>) {
        let (dispatcher, queue) = callback_channel();
        (Self::with_dispatcher(dispatcher), queue)
    }

    pub fn with_dispatcher(dispatcher: Dispatcher<V>) -> Self {
        Self {
            starting: Mutex::new(()),
            active: Mutex::new(None),
            dispatcher,
            latest: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Stops the active analysis (if any) and starts `analysis` in its place.
    ///
    /// Returns the generation assigned to the new run.
    pub fn start<A>(&self, analysis: A) -> u64
    where
        A: Analysis<Target = V>,
    {
        let _starting = self.starting.lock();
        // The previous slot stays installed (stopped) until its replacement exists,
        // so `is_running` and `progress` keep describing a real slot meanwhile.
        if let Some(previous) = self.active.lock().as_ref() {
            previous.stop();
        }

        let generation = self.latest.fetch_add(1, Ordering::AcqRel) + 1;
        let delivery = Delivery::new(generation, self.latest.clone());
        let analysis: Arc<dyn Analysis<Target = V>> = Arc::new(analysis);
        let worker = Worker::start(analysis, delivery, self.dispatcher.clone());
        let previous = self.active.lock().replace(worker);
        drop(previous);
        generation
    }

    /// Requests cancellation of the active analysis. No-op when idle.
    pub fn stop(&self) {
        if let Some(worker) = self.active.lock().as_ref() {
            worker.stop();
        }
    }

    /// Progress of the running analysis, or 0 when idle.
    pub fn progress(&self) -> u8 {
        match self.active.lock().as_ref() {
            Some(worker) if !worker.is_terminal() => worker.progress(),
            _ => 0,
        }
    }

    pub fn is_running(&self) -> bool {
        self.active
            .lock()
            .as_ref()
            .is_some_and(|worker| !worker.is_terminal())
    }

    /// The generation of the most recent `start`, 0 before the first one.
    pub fn generation(&self) -> u64 {
        self.latest.load(Ordering::Acquire)
    }
}

impl<V: 'static> Drop for AnalysisManager<V> {
    fn drop(&mut self) {
        if let Some(worker) = self.active.get_mut().take() {
            worker.stop();
        }
    }
}
