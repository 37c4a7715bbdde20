//! Model-to-view synchronization.
//!
//! The workbench owns the current selection and pushes a fresh context snapshot
//! into every view whenever it changes. All of it lives on the interactive
//! thread, which also drains the views' callback queues.

use super::post_process::{build_report, export_report};
use crate::dataset::Dataset;
use crate::engine::CallbackQueue;
use crate::model::{AnalysisContext, AnalysisKind};
use crate::view::RiskView;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Commands emitted by UI layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiCommand {
    SelectNext,
    SelectPrevious,
    ToggleSelected,
    GrowMsuSize,
    ShrinkMsuSize,
    ToggleView(AnalysisKind),
    Rerun,
    Reset,
    Export,
    Quit,
}

/// A view together with the queue its terminal callbacks arrive on.
pub struct Panel {
    pub view: RiskView,
    queue: CallbackQueue<RiskView>,
}

impl Panel {
    fn new(kind: AnalysisKind) -> Self {
        let (view, queue) = RiskView::new(kind);
        Self { view, queue }
    }
}

pub struct Workbench {
    dataset: Arc<Dataset>,
    selected: Vec<bool>,
    cursor: usize,
    max_msu_size: usize,
    minimum_working_time: Duration,
    export_dir: PathBuf,
    pub info: String,
    panels: Vec<Panel>,
}

impl Workbench {
    pub fn new(
        dataset: Arc<Dataset>,
        quasi_identifiers: &[String],
        max_msu_size: usize,
        minimum_working_time: Duration,
        export_dir: PathBuf,
    ) -> Self {
        let selected = dataset
            .attributes
            .iter()
            .map(|a| quasi_identifiers.contains(a))
            .collect();
        Self {
            dataset,
            selected,
            cursor: 0,
            max_msu_size: max_msu_size.max(1),
            minimum_working_time,
            export_dir,
            info: String::new(),
            panels: vec![Panel::new(AnalysisKind::Msu), Panel::new(AnalysisKind::Risk)],
        }
    }

    /// Snapshot of the current selection.
    pub fn context(&self) -> AnalysisContext {
        AnalysisContext {
            dataset: self.dataset.clone(),
            quasi_identifiers: self.quasi_identifiers(),
            max_msu_size: self.max_msu_size,
            minimum_working_time: self.minimum_working_time,
        }
    }

    pub fn quasi_identifiers(&self) -> Vec<String> {
        self.dataset
            .attributes
            .iter()
            .zip(&self.selected)
            .filter(|(_, on)| **on)
            .map(|(a, _)| a.clone())
            .collect()
    }

    /// Attributes with their selection flag, in dataset order.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, bool)> + '_ {
        self.dataset
            .attributes
            .iter()
            .map(String::as_str)
            .zip(self.selected.iter().copied())
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn max_msu_size(&self) -> usize {
        self.max_msu_size
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn panels(&self) -> &[Panel] {
        &self.panels
    }

    pub fn panel(&self, kind: AnalysisKind) -> Option<&Panel> {
        self.panels.iter().find(|p| p.view.kind() == kind)
    }

    /// Pushes the current selection into every view.
    pub fn refresh(&mut self) {
        let context = self.context();
        for panel in &mut self.panels {
            panel.view.update(context.clone());
        }
    }

    /// Runs every terminal callback that has arrived since the last call.
    pub fn deliver_pending(&mut self) -> usize {
        self.panels
            .iter_mut()
            .map(|panel| panel.queue.drain(&mut panel.view))
            .sum()
    }

    /// Applies a UI command. Returns `false` once the UI should quit.
    pub fn apply(&mut self, cmd: UiCommand) -> bool {
        match cmd {
            UiCommand::SelectNext => {
                if self.cursor + 1 < self.selected.len() {
                    self.cursor += 1;
                }
            }
            UiCommand::SelectPrevious => {
                self.cursor = self.cursor.saturating_sub(1);
            }
            UiCommand::ToggleSelected => {
                if let Some(on) = self.selected.get_mut(self.cursor) {
                    *on = !*on;
                    self.info = format!("Quasi-identifiers: {}", self.quasi_identifiers().join(", "));
                    self.refresh();
                }
            }
            UiCommand::GrowMsuSize => {
                if self.max_msu_size < self.selected.len() {
                    self.max_msu_size += 1;
                    self.info = format!("Max MSU size: {}", self.max_msu_size);
                    self.refresh();
                }
            }
            UiCommand::ShrinkMsuSize => {
                if self.max_msu_size > 1 {
                    self.max_msu_size -= 1;
                    self.info = format!("Max MSU size: {}", self.max_msu_size);
                    self.refresh();
                }
            }
            UiCommand::ToggleView(kind) => {
                if let Some(panel) = self.panels.iter_mut().find(|p| p.view.kind() == kind) {
                    let enabled = !panel.view.is_enabled();
                    panel.view.set_enabled(enabled);
                    self.info = format!(
                        "{} {}",
                        kind.label(),
                        if enabled { "enabled" } else { "disabled" }
                    );
                }
            }
            UiCommand::Rerun => {
                self.info = "Rerun requested…".into();
                self.refresh();
            }
            UiCommand::Reset => {
                for panel in &mut self.panels {
                    panel.view.reset();
                }
                self.info = "Reset".into();
            }
            UiCommand::Export => self.export(),
            UiCommand::Quit => {
                for panel in &mut self.panels {
                    panel.view.reset();
                }
                return false;
            }
        }
        true
    }

    fn export(&mut self) {
        let mut messages = Vec::new();
        for panel in &self.panels {
            let Some(report) = build_report(&panel.view) else {
                continue;
            };
            let path = self
                .export_dir
                .join(format!("{}-report.json", panel_slug(panel.view.kind())));
            match export_report(&path, &report) {
                Ok(()) => messages.push(format!("Exported: {}", path.display())),
                Err(e) => messages.push(format!("Export failed: {e:#}")),
            }
        }
        self.info = if messages.is_empty() {
            "Nothing to export yet".into()
        } else {
            messages.join("; ")
        };
    }
}

fn panel_slug(kind: AnalysisKind) -> &'static str {
    match kind {
        AnalysisKind::Msu => "msu",
        AnalysisKind::Risk => "risk",
    }
}
