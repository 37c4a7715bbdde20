//! Re-identification risk analysis for tabular datasets.
//!
//! Analyses run on a dedicated worker thread managed by [`engine::AnalysisManager`];
//! their results are handed back to the interactive thread through a callback queue.

pub mod cli;
pub mod dataset;
pub mod engine;
pub mod metrics;
pub mod model;
pub mod orchestrator;
pub mod risk;
mod text_summary;
#[cfg(feature = "tui")]
mod tui;
pub mod view;
