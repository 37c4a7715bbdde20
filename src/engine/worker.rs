//! Thread lifecycle around exactly one analysis.

use super::{Analysis, AnalysisError, Delivery, Dispatcher, Outcome};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::thread::JoinHandle;

/// Runs one analysis on a dedicated background thread.
///
/// The worker thread is the only place a terminal callback is dispatched from,
/// and it does so once, after `run` has returned or panicked.
pub(crate) struct Worker<V: 'static> {
    analysis: Arc<dyn Analysis<Target = V>>,
    stopped: Arc<AtomicBool>,
    terminal: Arc<AtomicBool>,
    generation: u64,
    handle: Option<JoinHandle<()>>,
}

impl<V: 'static> Worker<V> {
    /// Spawns the worker thread and begins `analysis.run()`.
    pub(crate) fn start(
        analysis: Arc<dyn Analysis<Target = V>>,
        delivery: Delivery,
        dispatcher: Dispatcher<V>,
    ) -> Self {
        let stopped = Arc::new(AtomicBool::new(false));
        let terminal = Arc::new(AtomicBool::new(false));
        let generation = delivery.generation();

        let thread_analysis = analysis.clone();
        let thread_stopped = stopped.clone();
        let thread_terminal = terminal.clone();
        let thread_delivery = delivery.clone();
        let thread_dispatcher = dispatcher.clone();
        let spawned = std::thread::Builder::new()
            .name(format!("analysis-{generation}"))
            .spawn(move || {
                let outcome = execute(thread_analysis.as_ref(), &thread_stopped);
                finish(
                    thread_analysis,
                    outcome,
                    &thread_terminal,
                    thread_delivery,
                    &thread_dispatcher,
                );
            });

        let handle = match spawned {
            Ok(handle) => Some(handle),
            Err(e) => {
                tracing::warn!(generation, error = %e, "could not spawn analysis thread");
                finish(
                    analysis.clone(),
                    Outcome::Failed(AnalysisError::Spawn(e.to_string())),
                    &terminal,
                    delivery,
                    &dispatcher,
                );
                None
            }
        };

        tracing::debug!(generation, "analysis started");
        Self {
            analysis,
            stopped,
            terminal,
            generation,
            handle,
        }
    }

    /// Requests cooperative cancellation. Never blocks.
    pub(crate) fn stop(&self) {
        if self.terminal.load(Ordering::Acquire) {
            return;
        }
        if self.stopped.swap(true, Ordering::AcqRel) {
            return;
        }
        tracing::debug!(generation = self.generation, "stopping analysis");
        self.analysis.stop();
    }

    pub(crate) fn progress(&self) -> u8 {
        self.analysis.progress().min(100)
    }

    /// True once the terminal callback has been handed to the dispatcher.
    pub(crate) fn is_terminal(&self) -> bool {
        self.terminal.load(Ordering::Acquire)
    }
}

impl<V: 'static> Drop for Worker<V> {
    fn drop(&mut self) {
        // Reap the thread when it is already done; otherwise let it exit on its own.
        if let Some(handle) = self.handle.take() {
            if handle.is_finished() {
                let _ = handle.join();
            }
        }
    }
}

fn execute<V: 'static>(analysis: &dyn Analysis<Target = V>, stopped: &AtomicBool) -> Outcome {
    if stopped.load(Ordering::Acquire) {
        return Outcome::Interrupted;
    }

    let result = panic::catch_unwind(AssertUnwindSafe(|| analysis.run()));

    // A stop request wins over whatever `run` produced.
    if stopped.load(Ordering::Acquire) {
        return Outcome::Interrupted;
    }
    match result {
        Ok(Ok(())) => Outcome::Finished,
        Ok(Err(AnalysisError::Interrupted)) => Outcome::Interrupted,
        Ok(Err(e)) => Outcome::Failed(e),
        Err(payload) => Outcome::Failed(AnalysisError::Panicked(panic_message(payload.as_ref()))),
    }
}

fn finish<V: 'static>(
    analysis: Arc<dyn Analysis<Target = V>>,
    outcome: Outcome,
    terminal: &AtomicBool,
    delivery: Delivery,
    dispatcher: &Dispatcher<V>,
) {
    let generation = delivery.generation();
    match &outcome {
        Outcome::Failed(e) => tracing::warn!(generation, error = %e, "analysis failed"),
        other => tracing::debug!(generation, outcome = ?other, "analysis ended"),
    }

    let delivered = dispatcher.dispatch(move |target: &mut V| match outcome {
        Outcome::Finished => analysis.on_finish(target, &delivery),
        Outcome::Failed(e) => analysis.on_error(target, &delivery, &e),
        Outcome::Interrupted => analysis.on_interrupt(target, &delivery),
    });
    // Only after the callback is queued, so "not running" implies "callback pending".
    terminal.store(true, Ordering::Release);
    if !delivered {
        tracing::debug!(generation, "consumer gone, dropping terminal callback");
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{callback_channel, StopFlag};
    use std::sync::atomic::AtomicU64;
    use std::time::{Duration, Instant};

    #[derive(Debug, PartialEq)]
    enum Seen {
        Finish,
        Error(String),
        Interrupt,
    }

    /// Sleeps until stopped or until `work` has elapsed.
    struct Probe {
        work: Duration,
        fail: Option<&'static str>,
        panic: bool,
        stop: StopFlag,
    }

    impl Probe {
        fn new(work: Duration) -> Self {
            Self {
                work,
                fail: None,
                panic: false,
                stop: StopFlag::new(),
            }
        }
    }

    impl Analysis for Probe {
        type Target = Vec<Seen>;

        fn run(&self) -> Result<(), AnalysisError> {
            if self.panic {
                panic!("probe exploded");
            }
            let started = Instant::now();
            while started.elapsed() < self.work && !self.stop.is_stopped() {
                std::thread::sleep(Duration::from_millis(2));
            }
            match self.fail {
                Some(msg) => Err(AnalysisError::Computation(msg.into())),
                None => Ok(()),
            }
        }

        fn stop(&self) {
            self.stop.stop();
        }

        fn progress(&self) -> u8 {
            0
        }

        fn on_finish(&self, target: &mut Vec<Seen>, _: &Delivery) {
            target.push(Seen::Finish);
        }

        fn on_error(&self, target: &mut Vec<Seen>, _: &Delivery, error: &AnalysisError) {
            target.push(Seen::Error(error.to_string()));
        }

        fn on_interrupt(&self, target: &mut Vec<Seen>, _: &Delivery) {
            target.push(Seen::Interrupt);
        }
    }

    fn run_to_end(probe: Probe, stop_early: bool) -> Vec<Seen> {
        let (dispatcher, mut queue) = callback_channel();
        let delivery = Delivery::new(1, Arc::new(AtomicU64::new(1)));
        let analysis: Arc<dyn Analysis<Target = Vec<Seen>>> = Arc::new(probe);
        let worker = Worker::start(analysis, delivery, dispatcher);
        if stop_early {
            worker.stop();
            worker.stop();
        }

        let deadline = Instant::now() + Duration::from_secs(5);
        while !worker.is_terminal() && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(5));
        }
        // Stopping after the terminal state must not produce anything new.
        worker.stop();
        drop(worker);

        let mut seen = Vec::new();
        let deadline = Instant::now() + Duration::from_secs(5);
        while seen.is_empty() && Instant::now() < deadline {
            queue.drain(&mut seen);
            std::thread::sleep(Duration::from_millis(5));
        }
        queue.drain(&mut seen);
        seen
    }

    #[test]
    fn completed_run_finishes() {
        assert_eq!(run_to_end(Probe::new(Duration::from_millis(5)), false), vec![Seen::Finish]);
    }

    #[test]
    fn stop_turns_success_into_interrupt() {
        let seen = run_to_end(Probe::new(Duration::from_secs(10)), true);
        assert_eq!(seen, vec![Seen::Interrupt]);
    }

    #[test]
    fn returned_error_is_reported() {
        let mut probe = Probe::new(Duration::from_millis(1));
        probe.fail = Some("bad input");
        let seen = run_to_end(probe, false);
        assert_eq!(seen, vec![Seen::Error("computation failed: bad input".into())]);
    }

    #[test]
    fn panic_is_converted_into_error() {
        let mut probe = Probe::new(Duration::ZERO);
        probe.panic = true;
        let seen = run_to_end(probe, false);
        assert_eq!(seen, vec![Seen::Error("analysis panicked: probe exploded".into())]);
    }
}
