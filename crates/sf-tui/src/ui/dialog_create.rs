use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::Frame;

use crate::app::App;
use crate::ui::layout::centered_rect;

pub fn render(f: &mut Frame, app: &App) {
    let area = centered_rect(60, 40, f.area());
    f.render_widget(Clear, area);

    let block = Block::default()
        .title(" New Site ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));

    let inner = block.inner(area);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(1), // label
            Constraint::Length(1), // input
            Constraint::Length(1), // blank
            Constraint::Length(1), // id preview
            Constraint::Min(0),
            Constraint::Length(1), // help text
        ])
        .split(inner);

    f.render_widget(
        Paragraph::new(Span::styled("Site name:", Style::default().fg(Color::White))),
        chunks[0],
    );
    render_input(f, chunks[1], &app.create_form.name);
    render_preview(f, chunks[3], app.create_form.preview());
    f.render_widget(Paragraph::new(help_line("create")), chunks[5]);
}

/// Text input without a border, underlined so the row stays one line tall.
pub fn render_input(f: &mut Frame, area: Rect, value: &str) {
    let style = Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::UNDERLINED);
    f.render_widget(
        Paragraph::new(Span::styled(format!(" {value}"), style)),
        area,
    );
}

/// "Id: <slug>" when the name is usable, otherwise the reason it is not.
pub fn render_preview(f: &mut Frame, area: Rect, preview: Result<String, String>) {
    let line = match preview {
        Ok(id) => Line::from(vec![
            Span::styled("Id: ", Style::default().fg(Color::DarkGray)),
            Span::styled(id, Style::default().fg(Color::Green)),
        ]),
        Err(reason) => Line::from(Span::styled(reason, Style::default().fg(Color::Red))),
    };
    f.render_widget(Paragraph::new(line), area);
}

pub fn help_line(submit: &str) -> Line<'static> {
    Line::from(vec![
        Span::styled(" Enter", Style::default().fg(Color::Yellow)),
        Span::styled(format!(" {submit}  "), Style::default().fg(Color::DarkGray)),
        Span::styled("Esc", Style::default().fg(Color::Yellow)),
        Span::styled(" cancel", Style::default().fg(Color::DarkGray)),
    ])
}
