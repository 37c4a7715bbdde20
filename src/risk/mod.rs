//! Re-identification risk computations.
//!
//! [`RiskEstimateBuilder`] wraps a dataset and a set of quasi-identifiers and
//! exposes the long-running computations the views run in the background. Each
//! computation polls the builder's stop flag and can be interrupted from any
//! thread through [`Interruptible::interrupt`].

mod classes;
mod msu;

use crate::dataset::Dataset;
use crate::engine::{AnalysisError, Interruptible, ProgressCounter, StopFlag};
use crate::model::{MsuStatistics, RiskSummary};
use std::sync::Arc;

/// Rows processed between two stop-flag checks.
const CHECK_INTERVAL: usize = 1024;

pub struct RiskEstimateBuilder {
    dataset: Arc<Dataset>,
    columns: Vec<usize>,
    names: Vec<String>,
    stop: StopFlag,
    progress: ProgressCounter,
}

impl RiskEstimateBuilder {
    pub fn new(dataset: Arc<Dataset>, quasi_identifiers: &[String]) -> Result<Self, AnalysisError> {
        let columns = quasi_identifiers
            .iter()
            .map(|name| {
                dataset
                    .column_index(name)
                    .ok_or_else(|| AnalysisError::UnknownAttribute(name.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            dataset,
            columns,
            names: quasi_identifiers.to_vec(),
            stop: StopFlag::new(),
            progress: ProgressCounter::new(),
        })
    }

    /// Searches minimal sample uniques of up to `max_size` attributes.
    pub fn msu_statistics(&self, max_size: usize) -> Result<MsuStatistics, AnalysisError> {
        msu::compute(self, max_size)
    }

    /// Prosecutor risk over the equivalence classes of the quasi-identifiers.
    pub fn risk_summary(&self) -> Result<RiskSummary, AnalysisError> {
        classes::compute(self)
    }

    fn checkpoint(&self) -> Result<(), AnalysisError> {
        if self.stop.is_stopped() {
            Err(AnalysisError::Interrupted)
        } else {
            Ok(())
        }
    }

    fn project<'a>(&self, row: &'a [String], columns: &[usize]) -> Vec<&'a str> {
        columns.iter().map(|&c| row[c].as_str()).collect()
    }
}

impl Interruptible for RiskEstimateBuilder {
    fn progress(&self) -> u8 {
        self.progress.get()
    }

    fn interrupt(&self) {
        self.stop.stop();
    }
}

#[cfg(test)]
pub(crate) fn dataset_from(attributes: &[&str], rows: &[&[&str]]) -> Arc<Dataset> {
    Arc::new(Dataset {
        attributes: attributes.iter().map(|s| s.to_string()).collect(),
        rows: rows
            .iter()
            .map(|r| r.iter().map(|s| s.to_string()).collect())
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_quasi_identifier_is_rejected() {
        let dataset = dataset_from(&["age"], &[&["30"]]);
        let err = RiskEstimateBuilder::new(dataset, &["zip".to_string()])
            .err()
            .unwrap();
        assert!(matches!(err, AnalysisError::UnknownAttribute(name) if name == "zip"));
    }

    #[test]
    fn interrupted_builder_refuses_work() {
        let dataset = crate::dataset::synthetic(200, 1);
        let builder = RiskEstimateBuilder::new(Arc::new(dataset), &["age".to_string()]).unwrap();
        builder.interrupt();
        assert!(matches!(builder.risk_summary(), Err(AnalysisError::Interrupted)));
        assert!(matches!(builder.msu_statistics(2), Err(AnalysisError::Interrupted)));
    }
}
