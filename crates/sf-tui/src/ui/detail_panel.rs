use chrono::{DateTime, Utc};
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;

use sf_core::models::{Operation, SiteListing, SiteStatus};

use crate::app::App;
use crate::ui::site_table::health_color;

pub fn render_with_now(f: &mut Frame, area: Rect, app: &App, now: DateTime<Utc>) {
    let block = Block::default()
        .title(" Details ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));

    let Some(site) = app.selected_site() else {
        let empty = Paragraph::new(" No sites yet. Press N to create one.").block(block);
        f.render_widget(empty, area);
        return;
    };

    let lines = build_detail_lines(site, now);
    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false });
    f.render_widget(paragraph, area);
}

fn build_detail_lines(site: &SiteListing, now: DateTime<Utc>) -> Vec<Line<'static>> {
    let record = &site.record;
    let status_color = match record.status {
        SiteStatus::Active => Color::Green,
        SiteStatus::Paused => Color::Yellow,
    };

    let mut lines = vec![
        detail_line("Site", &record.id, Color::White),
        detail_line("URL", &site.url, Color::Cyan),
        detail_line("Port", &record.port.to_string(), Color::White),
        detail_line("Status", &record.status.to_string(), status_color),
        detail_line("Health", &site.health().to_string(), health_color(site)),
    ];

    let process = match (&site.process, site.supervisor_reachable) {
        (_, false) => "pm2 unreachable".to_string(),
        (Some(p), true) => format!("{} ({})", p.name, p.status),
        (None, true) => "not registered".to_string(),
    };
    lines.push(detail_line("Process", &process, Color::White));

    let age = now.signed_duration_since(record.created_at);
    lines.push(detail_line(
        "Created",
        &format!("{} ago", format_duration(age)),
        Color::DarkGray,
    ));

    if !record.repo.is_empty() {
        lines.push(detail_line("Repo", &record.repo, Color::DarkGray));
    }

    if let Some(op) = site.pending {
        let hint = match op {
            Operation::Delete => "interrupted, F finishes it",
            Operation::Create | Operation::Rename => "interrupted, F resumes it",
        };
        lines.push(detail_line("Pending", &format!("{op}: {hint}"), Color::Red));
    }

    lines
}

fn format_duration(d: chrono::Duration) -> String {
    let total_secs = d.num_seconds().max(0);
    let days = total_secs / 86_400;
    let hours = (total_secs % 86_400) / 3600;
    let mins = (total_secs % 3600) / 60;

    if days > 0 {
        format!("{days}d {hours}h")
    } else if hours > 0 {
        format!("{hours}h {mins:02}m")
    } else if mins > 0 {
        format!("{mins}m")
    } else {
        format!("{total_secs}s")
    }
}

fn detail_line(label: &str, value: &str, color: Color) -> Line<'static> {
    Line::from(vec![
        Span::styled(
            format!("  {label:<9} "),
            Style::default().fg(Color::DarkGray),
        ),
        Span::styled(value.to_string(), Style::default().fg(color)),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations_pick_the_largest_units() {
        assert_eq!(format_duration(chrono::Duration::seconds(42)), "42s");
        assert_eq!(format_duration(chrono::Duration::seconds(150)), "2m");
        assert_eq!(format_duration(chrono::Duration::seconds(3 * 3600 + 300)), "3h 05m");
        assert_eq!(format_duration(chrono::Duration::days(2)), "2d 0h");
        assert_eq!(format_duration(chrono::Duration::seconds(-5)), "0s");
    }
}
