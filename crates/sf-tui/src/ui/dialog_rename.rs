use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::Frame;

use crate::app::App;
use crate::ui::dialog_create::{help_line, render_input, render_preview};
use crate::ui::layout::centered_rect;

pub fn render(f: &mut Frame, app: &App) {
    let area = centered_rect(60, 45, f.area());
    f.render_widget(Clear, area);

    let block = Block::default()
        .title(" Rename Site ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));

    let inner = block.inner(area);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(1), // current id
            Constraint::Length(1), // blank
            Constraint::Length(1), // label
            Constraint::Length(1), // input
            Constraint::Length(1), // blank
            Constraint::Length(1), // id preview
            Constraint::Min(0),
            Constraint::Length(1), // help text
        ])
        .split(inner);

    f.render_widget(
        Paragraph::new(Line::from(vec![
            Span::styled("Current: ", Style::default().fg(Color::DarkGray)),
            Span::styled(
                app.rename_form.from.clone(),
                Style::default().fg(Color::White),
            ),
        ])),
        chunks[0],
    );
    f.render_widget(
        Paragraph::new(Span::styled("New name:", Style::default().fg(Color::White))),
        chunks[2],
    );
    render_input(f, chunks[3], &app.rename_form.name);
    render_preview(f, chunks[5], app.rename_form.preview());
    f.render_widget(Paragraph::new(help_line("rename")), chunks[7]);
}
