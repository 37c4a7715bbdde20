use super::RiskView;
use crate::engine::{
    pad_to_minimum, Analysis, AnalysisError, Delivery, Interruptible, StopFlag,
};
use crate::model::{AnalysisContext, RiskSummary, ViewContent};
use crate::risk::RiskEstimateBuilder;
use parking_lot::Mutex;
use std::time::{Duration, Instant};

/// Prosecutor re-identification risk for the view's quasi-identifiers.
pub struct RiskAnalysis {
    builder: RiskEstimateBuilder,
    minimum_working_time: Duration,
    stop: StopFlag,
    summary: Mutex<Option<RiskSummary>>,
}

impl RiskAnalysis {
    pub fn new(builder: RiskEstimateBuilder, context: &AnalysisContext) -> Self {
        Self {
            builder,
            minimum_working_time: context.minimum_working_time,
            stop: StopFlag::new(),
            summary: Mutex::new(None),
        }
    }
}

impl Analysis for RiskAnalysis {
    type Target = RiskView;

    fn run(&self) -> Result<(), AnalysisError> {
        let started = Instant::now();
        let summary = self.builder.risk_summary()?;
        *self.summary.lock() = Some(summary);

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
        match self.summary.lock().take() {
            Some(summary) if !self.stop.is_stopped() && view.accepts(delivery) => {
                view.render(ViewContent::Risk(summary));
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
