use ratatui::{
    layout::Rect,
    style::Color,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

const KEYBINDS: &[(&str, &str)] = &[
    ("↑/↓", "Move attribute cursor"),
    ("space", "Toggle quasi-identifier"),
    ("+ / -", "Grow/shrink max MSU size"),
    ("m", "Enable/disable MSU view"),
    ("k", "Enable/disable risk view"),
    ("r", "Rerun enabled views"),
    ("x", "Reset (stop and clear) all views"),
    ("s", "Export finished reports as JSON"),
    ("tab", "Switch tabs"),
    ("?", "Show this help"),
    ("q / Ctrl-C", "Quit"),
];

fn keybind_line(key: &'static str, action: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::raw("  "),
        Span::styled(format!("{key:<12}"), Style::default().fg(Color::Magenta)),
        Span::raw(action),
    ])
}

pub fn draw_help(area: Rect, f: &mut Frame) {
    let mut lines = vec![Line::from("Keybinds:")];
    lines.extend(KEYBINDS.iter().map(|(key, action)| keybind_line(key, action)));
    lines.push(Line::from(""));
    lines.push(Line::from(
        "Changing the selection restarts every enabled view; a superseded run is stopped and its result dropped.",
    ));

    let p = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Help"));
    f.render_widget(p, area);
}
