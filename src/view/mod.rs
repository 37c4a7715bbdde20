//! Risk views: consumers of the analysis framework.
//!
//! A [`RiskView`] owns one [`AnalysisManager`] and the presentation state the
//! analyses render into. It is only ever touched from the interactive thread,
//! which is also where the view's [`CallbackQueue`] is drained.

mod estimate;
mod msu;

pub use estimate::RiskAnalysis;
pub use msu::MsuAnalysis;

use crate::engine::{AnalysisManager, CallbackQueue, Delivery};
use crate::model::{AnalysisContext, AnalysisKind, ViewContent, ViewStatus};
use crate::risk::RiskEstimateBuilder;

pub struct RiskView {
    kind: AnalysisKind,
    enabled: bool,
    context: Option<AnalysisContext>,
    status: ViewStatus,
    content: Option<ViewContent>,
    last_error: Option<String>,
    manager: AnalysisManager<RiskView>,
}

impl RiskView {
    pub fn new(kind: AnalysisKind) -> (Self, CallbackQueue<RiskView>) {
        let (manager, queue) = AnalysisManager::new();
        let view = Self {
            kind,
            enabled: true,
            context: None,
            status: ViewStatus::Empty,
            content: None,
            last_error: None,
            manager,
        };
        (view, queue)
    }

    /// Re-runs the view's analysis for a new context snapshot.
    pub fn update(&mut self, context: AnalysisContext) {
        self.context = Some(context);
        self.trigger_update();
    }

    /// Stops any running analysis and forgets the context and the rendered result.
    pub fn reset(&mut self) {
        self.manager.stop();
        self.context = None;
        self.content = None;
        self.last_error = None;
        self.set_status_empty();
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        if self.enabled == enabled {
            return;
        }
        self.enabled = enabled;
        tracing::debug!(kind = ?self.kind, enabled, "view toggled");
        self.trigger_update();
    }

    pub fn kind(&self) -> AnalysisKind {
        self.kind
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// True when the stored context can produce an analysis.
    pub fn is_valid(&self) -> bool {
        self.context.as_ref().is_some_and(|c| builder_for(c).is_some())
    }

    pub fn status(&self) -> ViewStatus {
        self.status
    }

    pub fn content(&self) -> Option<&ViewContent> {
        self.content.as_ref()
    }

    pub fn context(&self) -> Option<&AnalysisContext> {
        self.context.as_ref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn progress(&self) -> u8 {
        self.manager.progress()
    }

    pub fn is_running(&self) -> bool {
        self.manager.is_running()
    }

    pub(crate) fn set_status_empty(&mut self) {
        self.status = ViewStatus::Empty;
    }

    pub(crate) fn set_status_working(&mut self) {
        self.status = ViewStatus::Working;
    }

    pub(crate) fn set_status_error(&mut self, message: String) {
        self.last_error = Some(message);
        self.status = ViewStatus::Empty;
    }

    pub(crate) fn render(&mut self, content: ViewContent) {
        self.content = Some(content);
        self.last_error = None;
        self.status = ViewStatus::Done;
    }

    /// Shared interrupt handling: a replacement may be on its way, so a view that
    /// can still compute shows "working"; anything else goes blank.
    pub(crate) fn interrupted(&mut self) {
        if !self.is_enabled() || !self.is_valid() {
            self.set_status_empty();
        } else {
            self.set_status_working();
        }
    }

    /// Whether a finished run may render: it must be the latest run and the view
    /// must still be able to show it.
    pub(crate) fn accepts(&self, delivery: &Delivery) -> bool {
        delivery.is_current() && self.is_enabled() && self.is_valid()
    }

    fn trigger_update(&mut self) {
        let request = match self.context.clone() {
            Some(context) if self.enabled => builder_for(&context).map(|b| (context, b)),
            _ => None,
        };
        let Some((context, builder)) = request else {
            self.manager.stop();
            self.set_status_empty();
            return;
        };

        let generation = match self.kind {
            AnalysisKind::Msu => self.manager.start(MsuAnalysis::new(builder, &context)),
            AnalysisKind::Risk => self.manager.start(RiskAnalysis::new(builder, &context)),
        };
        tracing::debug!(
            kind = ?self.kind,
            generation,
            quasi_identifiers = ?context.quasi_identifiers,
            "analysis requested"
        );
        self.set_status_working();
    }
}

fn builder_for(context: &AnalysisContext) -> Option<RiskEstimateBuilder> {
    if context.quasi_identifiers.is_empty() {
        return None;
    }
    RiskEstimateBuilder::new(context.dataset.clone(), &context.quasi_identifiers).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{synthetic, Dataset};
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    fn context(dataset: &Arc<Dataset>, qis: &[&str], minimum: Duration) -> AnalysisContext {
        AnalysisContext {
            dataset: dataset.clone(),
            quasi_identifiers: qis.iter().map(|s| s.to_string()).collect(),
            max_msu_size: 2,
            minimum_working_time: minimum,
        }
    }

    /// Drains callbacks until the view's current run has ended.
    fn settle(view: &mut RiskView, queue: &mut CallbackQueue<RiskView>) {
        let deadline = Instant::now() + Duration::from_secs(10);
        while view.is_running() && Instant::now() < deadline {
            queue.drain(view);
            std::thread::sleep(Duration::from_millis(5));
        }
        queue.drain(view);
    }

    #[test]
    fn finished_analysis_renders() {
        let dataset = Arc::new(synthetic(300, 11));
        let (mut view, mut queue) = RiskView::new(AnalysisKind::Msu);
        view.update(context(&dataset, &["age", "sex"], Duration::ZERO));
        assert_eq!(view.status(), ViewStatus::Working);

        settle(&mut view, &mut queue);
        assert_eq!(view.status(), ViewStatus::Done);
        match view.content() {
            Some(ViewContent::Msu(stats)) => assert_eq!(stats.attributes, vec!["age", "sex"]),
            other => panic!("unexpected content: {other:?}"),
        }
    }

    #[test]
    fn disabled_or_invalid_view_stays_empty() {
        let dataset = Arc::new(synthetic(50, 2));
        let (mut view, mut queue) = RiskView::new(AnalysisKind::Risk);

        view.update(context(&dataset, &[], Duration::ZERO));
        assert_eq!(view.status(), ViewStatus::Empty);
        assert!(!view.is_valid());

        view.update(context(&dataset, &["no-such-column"], Duration::ZERO));
        assert_eq!(view.status(), ViewStatus::Empty);
        assert!(!view.is_running());

        view.set_enabled(false);
        view.update(context(&dataset, &["age"], Duration::ZERO));
        assert_eq!(view.status(), ViewStatus::Empty);
        assert!(!view.is_running());
        assert_eq!(queue.drain(&mut view), 0);
    }

    #[test]
    fn newer_context_wins_over_superseded_run() {
        let dataset = Arc::new(synthetic(2_000, 5));
        let (mut view, mut queue) = RiskView::new(AnalysisKind::Risk);

        view.update(context(&dataset, &["age", "sex"], Duration::from_secs(5)));
        view.update(context(&dataset, &["zipcode"], Duration::ZERO));
        settle(&mut view, &mut queue);

        let expected = RiskEstimateBuilder::new(dataset.clone(), &["zipcode".to_string()])
            .unwrap()
            .risk_summary()
            .unwrap();
        assert_eq!(view.status(), ViewStatus::Done);
        assert_eq!(view.content(), Some(&ViewContent::Risk(expected.clone())));

        // The superseded run's interrupt is stale and must not disturb the result.
        std::thread::sleep(Duration::from_millis(100));
        queue.drain(&mut view);
        assert_eq!(view.status(), ViewStatus::Done);
        assert_eq!(view.content(), Some(&ViewContent::Risk(expected)));
    }

    #[test]
    fn disabling_a_running_view_discards_its_result() {
        let dataset = Arc::new(synthetic(500, 9));
        let (mut view, mut queue) = RiskView::new(AnalysisKind::Msu);
        view.update(context(&dataset, &["age", "zipcode"], Duration::from_secs(5)));
        assert!(view.is_running());

        view.set_enabled(false);
        settle(&mut view, &mut queue);
        assert_eq!(view.status(), ViewStatus::Empty);
        assert!(view.content().is_none());

        view.set_enabled(true);
        assert_eq!(view.status(), ViewStatus::Working);
        view.reset();
        settle(&mut view, &mut queue);
        assert_eq!(view.status(), ViewStatus::Empty);
        assert!(view.context().is_none());
    }
}
