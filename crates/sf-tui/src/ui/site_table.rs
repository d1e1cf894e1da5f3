use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState};
use ratatui::Frame;

use sf_core::models::{SiteHealth, SiteListing};

use crate::app::App;

pub fn render(f: &mut Frame, area: Rect, app: &App) {
    let items: Vec<ListItem> = app
        .sites
        .iter()
        .map(|site| {
            let mut spans = vec![
                Span::raw(" "),
                health_icon(site.health()),
                Span::raw(" "),
                Span::styled(
                    truncate(&site.record.id, 24),
                    Style::default().fg(Color::White),
                ),
                Span::raw("  "),
                Span::styled(
                    format!(":{}", site.record.port),
                    Style::default().fg(Color::DarkGray),
                ),
            ];
            if let Some(op) = site.pending {
                spans.push(Span::styled(
                    format!("  {op} pending"),
                    Style::default().fg(Color::Red),
                ));
            }
            ListItem::new(Line::from(spans))
        })
        .collect();

    let (online, total) = app.online_count();
    let list = List::new(items)
        .block(
            Block::default()
                .title(format!(" Sites {online}/{total} online "))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray)),
        )
        .highlight_style(
            Style::default()
                .bg(Color::Rgb(0x1A, 0x3A, 0x5C))
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    let mut state = ListState::default();
    if !app.sites.is_empty() {
        state.select(Some(app.selected_index));
    }

    f.render_stateful_widget(list, area, &mut state);
}

pub fn health_icon(health: SiteHealth) -> Span<'static> {
    match health {
        SiteHealth::Online => Span::styled("▶", Style::default().fg(Color::Green)),
        SiteHealth::Offline => Span::styled("✗", Style::default().fg(Color::Red)),
        SiteHealth::Paused => Span::styled("■", Style::default().fg(Color::DarkGray)),
        SiteHealth::Drift => Span::styled("◉", Style::default().fg(Color::Yellow)),
        SiteHealth::Unknown => Span::styled("?", Style::default().fg(Color::DarkGray)),
    }
}

pub fn health_color(site: &SiteListing) -> Color {
    match site.health() {
        SiteHealth::Online => Color::Green,
        SiteHealth::Offline => Color::Red,
        SiteHealth::Drift => Color::Yellow,
        SiteHealth::Paused | SiteHealth::Unknown => Color::DarkGray,
    }
}

fn truncate(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        text.to_string()
    } else {
        let truncated: String = text.chars().take(max_len - 3).collect();
        format!("{truncated}...")
    }
}
