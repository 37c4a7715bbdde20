mod charts;
mod help;

use crate::cli::Cli;
use crate::dataset::Dataset;
use crate::model::{AnalysisKind, ViewContent, ViewStatus};
use crate::orchestrator::{Panel, UiCommand, Workbench};
use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::Color,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Tabs, Wrap},
    Terminal,
};
use std::sync::Arc;
use std::{io, time::Duration, time::Instant};

const TAB_COUNT: usize = 2;

pub async fn run(args: Cli, dataset: Arc<Dataset>) -> Result<()> {
    let quasi_identifiers = crate::cli::selected_quasi_identifiers(&args, &dataset)?;

    // The TUI thread is the interactive thread: it owns the workbench and runs every callback.
    let ui_handle =
        std::thread::spawn(move || run_threaded(args, dataset, quasi_identifiers));

    match tokio::task::spawn_blocking(move || ui_handle.join()).await {
        Ok(Ok(res)) => res,
        Ok(Err(_)) => Err(anyhow::anyhow!("TUI thread panicked")),
        Err(e) => Err(anyhow::Error::new(e).context("join TUI thread")),
    }
}

/// Run the TUI loop on a dedicated thread.
pub fn run_threaded(args: Cli, dataset: Arc<Dataset>, quasi_identifiers: Vec<String>) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).ok();

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;
    terminal.clear().ok();

    let mut bench = Workbench::new(
        dataset,
        &quasi_identifiers,
        args.max_msu_size,
        Duration::from(args.minimum_working_time),
        args.export_dir.clone(),
    );
    bench.refresh();
    tracing::info!(
        quasi_identifiers = ?bench.quasi_identifiers(),
        "workbench started"
    );

    let mut tab = 0usize;
    let tick_rate = Duration::from_millis(100);
    let mut last_tick = Instant::now();

    let res = loop {
        // Terminal callbacks only ever run here, between frames.
        bench.deliver_pending();

        if last_tick.elapsed() >= tick_rate {
            terminal.draw(|f| draw(f.area(), f, &bench, tab)).ok();
            last_tick = Instant::now();
        }

        // Poll input with a short timeout to avoid blocking the render loop.
        if event::poll(Duration::from_millis(10)).unwrap_or(false) {
            if let Ok(Event::Key(k)) = event::read() {
                if k.kind != KeyEventKind::Press {
                    continue;
                }
                match k.code {
                    KeyCode::Tab => {
                        tab = (tab + 1) % TAB_COUNT;
                        continue;
                    }
                    KeyCode::Char('?') => {
                        tab = 1;
                        continue;
                    }
                    _ => {}
                }
                if let Some(cmd) = command_for(k.modifiers, k.code) {
                    if !bench.apply(cmd) {
                        break Ok(());
                    }
                }
            }
        }
    };

    disable_raw_mode().ok();
    let mut stdout = io::stdout();
    execute!(stdout, LeaveAlternateScreen).ok();
    res
}

fn command_for(modifiers: KeyModifiers, code: KeyCode) -> Option<UiCommand> {
    let cmd = match (modifiers, code) {
        (_, KeyCode::Char('q')) | (KeyModifiers::CONTROL, KeyCode::Char('c')) => UiCommand::Quit,
        (_, KeyCode::Up) => UiCommand::SelectPrevious,
        (_, KeyCode::Down) => UiCommand::SelectNext,
        (_, KeyCode::Char(' ')) | (_, KeyCode::Enter) => UiCommand::ToggleSelected,
        (_, KeyCode::Char('+')) | (_, KeyCode::Char('=')) => UiCommand::GrowMsuSize,
        (_, KeyCode::Char('-')) => UiCommand::ShrinkMsuSize,
        (_, KeyCode::Char('m')) => UiCommand::ToggleView(AnalysisKind::Msu),
        (_, KeyCode::Char('k')) => UiCommand::ToggleView(AnalysisKind::Risk),
        (_, KeyCode::Char('r')) => UiCommand::Rerun,
        (_, KeyCode::Char('x')) => UiCommand::Reset,
        (_, KeyCode::Char('s')) => UiCommand::Export,
        _ => return None,
    };
    Some(cmd)
}

fn draw(area: Rect, f: &mut ratatui::Frame, bench: &Workbench, tab: usize) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)].as_ref())
        .split(area);

    let tabs = Tabs::new(vec![Line::from("Workbench"), Line::from("Help")])
        .select(tab)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("risk-analysis-cli"),
        )
        .highlight_style(Style::default().fg(Color::Yellow));
    f.render_widget(tabs, chunks[0]);

    match tab {
        0 => draw_workbench(chunks[1], f, bench),
        _ => help::draw_help(chunks[1], f),
    }
}

fn draw_workbench(area: Rect, f: &mut ratatui::Frame, bench: &Workbench) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(3)].as_ref())
        .split(area);

    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(28), Constraint::Min(0)].as_ref())
        .split(rows[0]);

    draw_attributes(cols[0], f, bench);

    let panels = bench.panels();
    let constraints: Vec<Constraint> = panels
        .iter()
        .map(|_| Constraint::Ratio(1, panels.len().max(1) as u32))
        .collect();
    let panel_areas = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(cols[1]);
    for (panel, panel_area) in panels.iter().zip(panel_areas.iter()) {
        draw_panel(*panel_area, f, panel);
    }

    let status = Paragraph::new(Line::from(vec![
        Span::styled("Info: ", Style::default().fg(Color::Gray)),
        Span::raw(bench.info.clone()),
    ]))
    .wrap(Wrap { trim: true })
    .block(Block::default().borders(Borders::ALL).title("Status"));
    f.render_widget(status, rows[1]);
}

fn draw_attributes(area: Rect, f: &mut ratatui::Frame, bench: &Workbench) {
    let dataset = bench.dataset();
    let mut lines = vec![
        Line::from(vec![
            Span::styled("Records: ", Style::default().fg(Color::Gray)),
            Span::raw(dataset.len().to_string()),
        ]),
        Line::from(vec![
            Span::styled("Max MSU size: ", Style::default().fg(Color::Gray)),
            Span::raw(bench.max_msu_size().to_string()),
        ]),
        Line::from(""),
    ];

    for (i, (attribute, selected)) in bench.attributes().enumerate() {
        let cursor = if i == bench.cursor() { "> " } else { "  " };
        let mark = if selected { "[x] " } else { "[ ] " };
        let style = if i == bench.cursor() {
            Style::default().fg(Color::Yellow)
        } else if selected {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default()
        };
        lines.push(Line::from(Span::styled(
            format!("{cursor}{mark}{attribute}"),
            style,
        )));
    }

    let p = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Quasi-identifiers"),
    );
    f.render_widget(p, area);
}

fn draw_panel(area: Rect, f: &mut ratatui::Frame, panel: &Panel) {
    let view = &panel.view;
    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)].as_ref())
        .split(area);

    charts::render_progress(f, parts[0], view);

    match (view.status(), view.content()) {
        (ViewStatus::Done, Some(ViewContent::Msu(stats))) => charts::render_msu(f, parts[1], stats),
        (ViewStatus::Done, Some(ViewContent::Risk(summary))) => {
            charts::render_risk(f, parts[1], summary)
        }
        (status, _) => {
            let message = if !view.is_enabled() {
                "View disabled (press m/k to enable)"
            } else if status == ViewStatus::Working {
                "Analysing…"
            } else if !view.is_valid() {
                "Select at least one quasi-identifier"
            } else {
                "No result"
            };
            let p = Paragraph::new(message).block(Block::default().borders(Borders::ALL));
            f.render_widget(p, parts[1]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_map_to_commands() {
        let none = KeyModifiers::NONE;
        assert_eq!(command_for(none, KeyCode::Char('q')), Some(UiCommand::Quit));
        assert_eq!(
            command_for(KeyModifiers::CONTROL, KeyCode::Char('c')),
            Some(UiCommand::Quit)
        );
        assert_eq!(command_for(none, KeyCode::Char('c')), None);
        assert_eq!(
            command_for(none, KeyCode::Char('k')),
            Some(UiCommand::ToggleView(AnalysisKind::Risk))
        );
        assert_eq!(command_for(none, KeyCode::Char(' ')), Some(UiCommand::ToggleSelected));
        assert_eq!(command_for(none, KeyCode::Down), Some(UiCommand::SelectNext));
        assert_eq!(command_for(none, KeyCode::Char('z')), None);
    }
}
