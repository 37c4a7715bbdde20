use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Color,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Bar, BarChart, BarGroup, Block, Borders, Gauge, Paragraph},
    Frame,
};

use crate::model::{MsuStatistics, RiskSummary, ViewStatus};
use crate::view::RiskView;

/// Status line plus progress gauge shown at the top of every panel.
pub fn render_progress(f: &mut Frame, area: Rect, view: &RiskView) {
    let (label, color) = match (view.is_enabled(), view.status()) {
        (false, _) => ("disabled".to_string(), Color::DarkGray),
        (true, ViewStatus::Working) => (format!("working {}%", view.progress()), Color::Yellow),
        (true, ViewStatus::Done) => ("done".to_string(), Color::Green),
        (true, ViewStatus::Empty) => match view.last_error() {
            Some(e) => (format!("error: {e}"), Color::Red),
            None => ("idle".to_string(), Color::Gray),
        },
    };

    let percent = match view.status() {
        ViewStatus::Done => 100,
        ViewStatus::Working => u16::from(view.progress()),
        ViewStatus::Empty => 0,
    };

    let gauge = Gauge::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(view.kind().label()),
        )
        .gauge_style(Style::default().fg(color))
        .percent(percent.min(100))
        .label(label);
    f.render_widget(gauge, area);
}

/// Bar chart of the MSU size distribution next to the per-attribute table.
pub fn render_msu(f: &mut Frame, area: Rect, stats: &MsuStatistics) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)].as_ref())
        .split(area);

    let bars: Vec<Bar> = stats
        .size_distribution
        .iter()
        .enumerate()
        .map(|(i, fraction)| {
            let percent = (fraction * 100.0).round() as u64;
            Bar::default()
                .label(Line::from(format!("{}", i + 1)))
                .value(percent)
                .text_value(format!("{percent}%"))
                .style(Style::default().fg(Color::Cyan))
        })
        .collect();

    let bar_count = bars.len().max(1) as u16;
    let bar_width = (cols[0].width.saturating_sub(2) / bar_count)
        .saturating_sub(1)
        .clamp(1, 9);

    let chart = BarChart::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("MSU size distribution ({} MSUs)", stats.msu_count)),
        )
        .data(BarGroup::default().bars(&bars))
        .bar_width(bar_width)
        .bar_gap(1)
        .max(100);
    f.render_widget(chart, cols[0]);

    let mut lines = vec![Line::from(Span::styled(
        format!("{:<16}{:>10}{:>10}", "attribute", "contrib", "avg size"),
        Style::default().add_modifier(Modifier::BOLD),
    ))];
    for (i, attribute) in stats.attributes.iter().enumerate() {
        let contribution = stats
            .column_contribution
            .get(i)
            .copied()
            .flatten()
            .map(|c| format!("{:.1}%", c * 100.0))
            .unwrap_or_else(|| "-".into());
        let size = stats
            .column_average_key_size
            .get(i)
            .copied()
            .flatten()
            .map(|s| format!("{s:.2}"))
            .unwrap_or_else(|| "-".into());
        lines.push(Line::from(format!(
            "{attribute:<16}{contribution:>10}{size:>10}"
        )));
    }
    let table = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Attribute contribution"),
    );
    f.render_widget(table, cols[1]);
}

fn kv(label: &str, value: String, color: Color) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{label:<24}"), Style::default().fg(Color::Gray)),
        Span::styled(value, Style::default().fg(color)),
    ])
}

pub fn render_risk(f: &mut Frame, area: Rect, summary: &RiskSummary) {
    let highest = if summary.highest_risk >= 0.5 {
        Color::Red
    } else if summary.highest_risk >= 0.2 {
        Color::Yellow
    } else {
        Color::Green
    };

    let mut lines = vec![
        kv("Records", summary.records.to_string(), Color::White),
        kv("Equivalence classes", summary.classes.to_string(), Color::White),
        kv("Lowest risk", format!("{:.4}", summary.lowest_risk), Color::Green),
        kv("Average risk", format!("{:.4}", summary.average_risk), Color::White),
        kv("Highest risk", format!("{:.4}", summary.highest_risk), highest),
        kv(
            "Records at highest risk",
            format!("{:.2}%", summary.records_at_highest_risk * 100.0),
            highest,
        ),
        kv(
            "Sample uniques",
            format!("{:.2}%", summary.sample_uniques * 100.0),
            Color::White,
        ),
    ];
    if let (Some(mean), Some(median)) = (summary.mean_class_size, summary.median_class_size) {
        lines.push(kv(
            "Class size (avg / med)",
            format!("{mean:.2} / {median:.0}"),
            Color::White,
        ));
    }
    if let (Some(p25), Some(p75)) = (summary.p25_class_size, summary.p75_class_size) {
        lines.push(kv(
            "Class size (p25 / p75)",
            format!("{p25:.0} / {p75:.0}"),
            Color::White,
        ));
    }

    let p = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Prosecutor risk"),
    );
    f.render_widget(p, area);
}
