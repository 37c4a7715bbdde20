//! Application-level orchestration utilities.
//!
//! This module owns the model-to-view synchronization (the workbench holding the
//! current selection and the views that analyse it) and post-run processing such
//! as report building and export. UI/CLI layers call into this module to keep
//! responsibilities separated.

mod controller;
mod post_process;

pub use controller::{Panel, UiCommand, Workbench};
pub use post_process::{build_report, export_report};
