use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Frame;

use crate::ui::layout::centered_rect;

pub fn render(f: &mut Frame) {
    let area = centered_rect(60, 70, f.area());
    f.render_widget(Clear, area);

    let block = Block::default()
        .title(" Help: Keybindings ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let lines = vec![
        section_header("Sites"),
        key_line("N", "Create a site"),
        key_line("R", "Rename the selected site"),
        key_line("P", "Pause or resume"),
        key_line("D", "Delete the selected site"),
        key_line("F", "Repair (finish or regenerate)"),
        key_line("L", "Relink shared directories"),
        key_line("Up/Down j/k", "Move selection"),
        key_line("?", "Show this help"),
        key_line("Q", "Quit"),
        Line::from(""),
        section_header("Dialogs"),
        key_line("Enter", "Submit / confirm"),
        key_line("Esc", "Cancel / close"),
        Line::from(""),
        section_header("Deploying"),
        Line::from(Span::styled(
            "    Push to the main branch of a site's repository.",
            Style::default().fg(Color::White),
        )),
    ];

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false });
    f.render_widget(paragraph, area);
}

fn section_header(title: &str) -> Line<'static> {
    Line::from(Span::styled(
        format!("  {title}"),
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    ))
}

fn key_line(key: &str, desc: &str) -> Line<'static> {
    Line::from(vec![
        Span::styled(
            format!("    {key:<13}"),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(desc.to_string(), Style::default().fg(Color::White)),
    ])
}
