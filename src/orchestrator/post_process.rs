//! Post-run processing utilities.
//!
//! Turns a finished view into a report and writes it to disk on request.

use crate::model::{AnalysisReport, ViewStatus};
use crate::view::RiskView;
use anyhow::{Context, Result};
use std::path::Path;

/// Build a report from a view that has rendered a result for its current context.
pub fn build_report(view: &RiskView) -> Option<AnalysisReport> {
    if view.status() != ViewStatus::Done {
        return None;
    }
    let context = view.context()?;
    let content = view.content()?;

    Some(AnalysisReport {
        timestamp_utc: time::OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_else(|_| "now".into()),
        kind: view.kind(),
        records: context.dataset.len(),
        context: context.clone(),
        content: content.clone(),
    })
}

/// Write `report` as pretty-printed JSON.
pub fn export_report(path: &Path, report: &AnalysisReport) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create export directory {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(report).context("serialize report")?;
    std::fs::write(path, json).with_context(|| format!("write report {}", path.display()))?;
    tracing::info!(path = %path.display(), kind = ?report.kind, "report exported");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AnalysisContext, AnalysisKind, ViewContent};
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    #[test]
    fn exports_finished_view() {
        let dataset = Arc::new(crate::dataset::synthetic(100, 4));
        let (mut view, mut queue) = RiskView::new(AnalysisKind::Risk);
        assert!(build_report(&view).is_none());

        view.update(AnalysisContext {
            dataset,
            quasi_identifiers: vec!["sex".into()],
            max_msu_size: 1,
            minimum_working_time: Duration::ZERO,
        });
        let deadline = Instant::now() + Duration::from_secs(10);
        while view.is_running() && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(5));
        }
        queue.drain(&mut view);

        let report = build_report(&view).unwrap();
        assert_eq!(report.records, 100);
        assert!(matches!(report.content, ViewContent::Risk(_)));

        let dir = std::env::temp_dir().join(format!("risk-report-{}", std::process::id()));
        let path = dir.join("risk.json");
        export_report(&path, &report).unwrap();
        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        std::fs::remove_dir_all(&dir).ok();

        assert_eq!(written["kind"], "risk");
        assert_eq!(written["context"]["quasi_identifiers"][0], "sex");
        assert_eq!(written["content"]["kind"], "risk");
        assert_eq!(written["context"]["minimum_working_time"], "0s");
    }
}
