use super::RiskView;
use crate::engine::{
    pad_to_minimum, Analysis, AnalysisError, Delivery, Interruptible, StopFlag,
};
use crate::model::{AnalysisContext, MsuStatistics, ViewContent};
use crate::risk::RiskEstimateBuilder;
use parking_lot::Mutex;
use std::time::{Duration, Instant};

/// Minimal sample unique statistics for the view's quasi-identifiers.
pub struct MsuAnalysis {
    builder: RiskEstimateBuilder,
    max_size: usize,
    minimum_working_time: Duration,
    stop: StopFlag,
    result: Mutex<Option<MsuStatistics>>,
}

impl MsuAnalysis {
    pub fn new(builder: RiskEstimateBuilder, context: &AnalysisContext) -> Self {
        Self {
            builder,
            max_size: context.max_msu_size,
            minimum_working_time: context.minimum_working_time,
            stop: StopFlag::new(),
            result: Mutex::new(None),
        }
    }
}

impl Analysis for MsuAnalysis {
    type Target = RiskView;

    fn run(&self) -> Result<(), AnalysisError> {
        let started = Instant::now();
        let statistics = self.builder.msu_statistics(self.max_size)?;
        *self.result.lock() = Some(statistics);

        // Keep the progress indicator on screen for fast results.
        if !pad_to_minimum(started, self.minimum_working_time, &self.stop) {
            return Err(AnalysisError::Interrupted);
        }
        Ok(())
    }

    fn stop(&self) {
        self.builder.interrupt();
        self.stop.stop();
    }

    fn progress(&self) -> u8 {
        self.builder.progress()
    }

    fn on_finish(&self, view: &mut RiskView, delivery: &Delivery) {
        if !delivery.is_current() {
            return;
        }
        let statistics = self.result.lock().take();
        match statistics {
            Some(statistics) if !self.stop.is_stopped() && view.accepts(delivery) => {
                view.render(ViewContent::Msu(statistics));
            }
            _ => view.interrupted(),
        }
    }

    fn on_error(&self, view: &mut RiskView, delivery: &Delivery, error: &AnalysisError) {
        if delivery.is_current() {
            view.set_status_error(error.to_string());
        }
    }

    fn on_interrupt(&self, view: &mut RiskView, delivery: &Delivery) {
        if delivery.is_current() {
            view.interrupted();
        }
    }
}
