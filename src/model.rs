use crate::dataset::Dataset;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Which analysis a view runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisKind {
    /// Minimal sample uniques
    Msu,
    /// Prosecutor re-identification risk
    Risk,
}

impl AnalysisKind {
    pub fn label(self) -> &'static str {
        match self {
            AnalysisKind::Msu => "MSU statistics",
            AnalysisKind::Risk => "Risk estimate",
        }
    }
}

/// Snapshot of everything an analysis needs, taken when it is started.
///
/// The dataset is shared behind an `Arc` and never mutated after loading, so the
/// worker thread reads it without coordinating with the interactive thread.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisContext {
    #[serde(skip)]
    pub dataset: Arc<Dataset>,
    pub quasi_identifiers: Vec<String>,
    pub max_msu_size: usize,
    #[serde(with = "humantime_serde")]
    pub minimum_working_time: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViewStatus {
    Empty,
    Working,
    Done,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MsuStatistics {
    pub attributes: Vec<String>,
    pub msu_count: u64,
    /// Fraction of MSUs of size `i + 1`.
    pub size_distribution: Vec<f64>,
    /// Fraction of MSUs containing each attribute; `None` when no MSU was found.
    pub column_contribution: Vec<Option<f64>>,
    /// Mean size of the MSUs containing each attribute.
    pub column_average_key_size: Vec<Option<f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskSummary {
    pub records: u64,
    pub classes: u64,
    pub lowest_risk: f64,
    pub average_risk: f64,
    pub highest_risk: f64,
    pub records_at_highest_risk: f64,
    pub sample_uniques: f64,
    pub mean_class_size: Option<f64>,
    pub median_class_size: Option<f64>,
    pub p25_class_size: Option<f64>,
    pub p75_class_size: Option<f64>,
}

impl Default for RiskSummary {
    fn default() -> Self {
        Self {
            records: 0,
            classes: 0,
            lowest_risk: 0.0,
            average_risk: 0.0,
            highest_risk: 0.0,
            records_at_highest_risk: 0.0,
            sample_uniques: 0.0,
            mean_class_size: None,
            median_class_size: None,
            p25_class_size: None,
            p75_class_size: None,
        }
    }
}

/// Result rendered by a view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ViewContent {
    Msu(MsuStatistics),
    Risk(RiskSummary),
}

/// A finished result together with the selection that produced it.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub timestamp_utc: String,
    pub kind: AnalysisKind,
    pub records: usize,
    pub context: AnalysisContext,
    pub content: ViewContent,
}
