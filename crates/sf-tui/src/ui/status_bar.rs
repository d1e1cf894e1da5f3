use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::app::{App, Mode};

pub fn render(f: &mut Frame, area: Rect, app: &App) {
    let status_line = if let Some(ref msg) = app.status_message {
        let color = if msg.starts_with("Error") || msg.contains("failed") {
            Color::Red
        } else {
            Color::Green
        };
        Line::from(Span::styled(format!(" {msg}"), Style::default().fg(color)))
    } else {
        Line::from("")
    };

    let hints = match &app.mode {
        Mode::CreateDialog | Mode::RenameDialog => Line::from(vec![
            hint("Enter", "submit"),
            Span::raw(" "),
            hint("Esc", "cancel"),
        ]),
        Mode::ConfirmDialog { .. } => Line::from(vec![
            hint("Y", "es"),
            Span::raw(" "),
            hint("N", "o"),
        ]),
        Mode::Loading(_) => Line::from(vec![hint("Ctrl+C", "quit")]),
        Mode::SiteList | Mode::HelpDialog => Line::from(vec![
            hint("N", "ew"),
            Span::raw(" "),
            hint("R", "ename"),
            Span::raw(" "),
            hint("P", "ause/resume"),
            Span::raw(" "),
            hint("D", "elete"),
            Span::raw(" "),
            hint("F", "ix"),
            Span::raw(" "),
            hint("L", "ink"),
            Span::raw(" "),
            hint("?", "help"),
            Span::raw(" "),
            hint("Q", "uit"),
        ]),
    };

    let widget = Paragraph::new(vec![status_line, hints]);
    f.render_widget(widget, area);
}

fn hint(key: &str, label: &str) -> Span<'static> {
    Span::styled(
        format!("[{key}]{label}"),
        Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    )
}
