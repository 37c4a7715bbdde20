use super::{RiskEstimateBuilder, CHECK_INTERVAL};
use crate::engine::AnalysisError;
use crate::metrics::{compute_metrics, fraction};
use crate::model::RiskSummary;
use std::collections::HashMap;

pub(super) fn compute(builder: &RiskEstimateBuilder) -> Result<RiskSummary, AnalysisError> {
    builder.checkpoint()?;
    let rows = &builder.dataset.rows;
    let total = rows.len() as u64;

    let mut counts: HashMap<Vec<&str>, u64> = HashMap::new();
    for (i, row) in rows.iter().enumerate() {
        if i % CHECK_INTERVAL == 0 {
            builder.checkpoint()?;
            builder.progress.advance_fraction(i as u64, total);
        }
        *counts.entry(builder.project(row, &builder.columns)).or_default() += 1;
    }
    builder.checkpoint()?;

    let sizes: Vec<u64> = counts.into_values().collect();
    let (Some(&smallest), Some(&largest)) = (sizes.iter().min(), sizes.iter().max()) else {
        builder.progress.advance(100);
        return Ok(RiskSummary::default());
    };

    let at_highest: u64 = sizes.iter().filter(|&&s| s == smallest).sum();
    let uniques = sizes.iter().filter(|&&s| s == 1).count() as u64;
    let as_f64: Vec<f64> = sizes.iter().map(|&s| s as f64).collect();
    let metrics = compute_metrics(&as_f64);

    builder.progress.advance(100);
    Ok(RiskSummary {
        records: total,
        classes: sizes.len() as u64,
        lowest_risk: 1.0 / largest as f64,
        average_risk: fraction(sizes.len() as u64, total),
        highest_risk: 1.0 / smallest as f64,
        records_at_highest_risk: fraction(at_highest, total),
        sample_uniques: fraction(uniques, total),
        mean_class_size: metrics.map(|m| m.0),
        median_class_size: metrics.map(|m| m.1),
        p25_class_size: metrics.map(|m| m.2),
        p75_class_size: metrics.map(|m| m.3),
    })
}
