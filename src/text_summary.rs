//! Text summary builder for CLI output.
//!
//! This module formats human-readable lines for text mode.

use crate::model::{AnalysisReport, MsuStatistics, RiskSummary, ViewContent};

/// Pre-formatted lines for text output.
pub(crate) struct TextSummary {
    pub lines: Vec<String>,
}

/// Build a text summary from a finished report.
pub(crate) fn build_text_summary(report: &AnalysisReport) -> TextSummary {
    let mut lines = vec![
        format!("Analysis: {}", report.kind.label()),
        format!("Records: {}", report.records),
        format!(
            "Quasi-identifiers: {}",
            report.context.quasi_identifiers.join(", ")
        ),
    ];

    match &report.content {
        ViewContent::Msu(stats) => msu_lines(stats, &mut lines),
        ViewContent::Risk(summary) => risk_lines(summary, &mut lines),
    }

    TextSummary { lines }
}

fn msu_lines(stats: &MsuStatistics, lines: &mut Vec<String>) {
    lines.push(format!("MSUs found: {}", stats.msu_count));
    if stats.msu_count == 0 {
        lines.push("No MSUs found".into());
        return;
    }
    for (i, fraction) in stats.size_distribution.iter().enumerate() {
        lines.push(format!("  size {:>2}: {:>6.2}%", i + 1, fraction * 100.0));
    }
    lines.push("Attribute        contribution  avg key size".into());
    for (i, attribute) in stats.attributes.iter().enumerate() {
        let contribution = stats.column_contribution[i]
            .map(|c| format!("{:.2}%", c * 100.0))
            .unwrap_or_else(|| "-".into());
        let size = stats.column_average_key_size[i]
            .map(|s| format!("{s:.2}"))
            .unwrap_or_else(|| "-".into());
        lines.push(format!("  {attribute:<15}{contribution:>12}  {size:>12}"));
    }
}

fn risk_lines(summary: &RiskSummary, lines: &mut Vec<String>) {
    lines.push(format!("Equivalence classes: {}", summary.classes));
    lines.push(format!(
        "Risk: lowest {:.4} avg {:.4} highest {:.4}",
        summary.lowest_risk, summary.average_risk, summary.highest_risk
    ));
    lines.push(format!(
        "Records at highest risk: {:.2}%",
        summary.records_at_highest_risk * 100.0
    ));
    lines.push(format!(
        "Sample uniques: {:.2}%",
        summary.sample_uniques * 100.0
    ));
    if let (Some(mean), Some(median), Some(p25), Some(p75)) = (
        summary.mean_class_size,
        summary.median_class_size,
        summary.p25_class_size,
        summary.p75_class_size,
    ) {
        lines.push(format!(
            "Class size: avg {mean:.2} med {median:.0} p25 {p25:.0} p75 {p75:.0}"
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AnalysisContext, AnalysisKind};
    use std::sync::Arc;
    use std::time::Duration;

    fn report(content: ViewContent) -> AnalysisReport {
        AnalysisReport {
            timestamp_utc: "now".into(),
            kind: AnalysisKind::Msu,
            records: 3,
            context: AnalysisContext {
                dataset: Arc::new(Default::default()),
                quasi_identifiers: vec!["zip".into(), "age".into()],
                max_msu_size: 2,
                minimum_working_time: Duration::ZERO,
            },
            content,
        }
    }

    #[test]
    fn msu_summary_lists_attributes() {
        let summary = build_text_summary(&report(ViewContent::Msu(MsuStatistics {
            attributes: vec!["zip".into(), "age".into()],
            msu_count: 2,
            size_distribution: vec![0.5, 0.5],
            column_contribution: vec![Some(1.0), Some(0.5)],
            column_average_key_size: vec![Some(1.5), None],
        })));

        assert_eq!(summary.lines[2], "Quasi-identifiers: zip, age");
        assert!(summary.lines.iter().any(|l| l.contains("size  1:  50.00%")));
        assert!(summary
            .lines
            .iter()
            .any(|l| l.starts_with("  age") && l.ends_with('-')));
    }

    #[test]
    fn msu_summary_without_msus() {
        let summary = build_text_summary(&report(ViewContent::Msu(MsuStatistics {
            attributes: vec!["zip".into()],
            msu_count: 0,
            size_distribution: vec![0.0],
            column_contribution: vec![None],
            column_average_key_size: vec![None],
        })));
        assert_eq!(summary.lines.last().map(String::as_str), Some("No MSUs found"));
    }
}
