// Each test binary compiles this module independently and uses a different
// subset of helpers, so unused-function warnings are expected.
#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};

use sf_core::models::{ProcessInfo, ProcessState, SiteListing, SiteStatus, TenantRecord};
use sf_tui::app::App;
use sf_tui::ui;
use ratatui::{backend::TestBackend, Terminal};

/// Render the app to a string using a TestBackend of the given dimensions.
pub fn render_to_string(app: &App, width: u16, height: u16) -> String {
    let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
    terminal.draw(|f| ui::render(f, app, None)).unwrap();
    terminal.backend().to_string()
}

/// Render the app with a fixed `now` for deterministic ages.
pub fn render_to_string_at(app: &App, width: u16, height: u16, now: DateTime<Utc>) -> String {
    let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
    terminal.draw(|f| ui::render(f, app, Some(now))).unwrap();
    terminal.backend().to_string()
}

pub fn created_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
}

/// A listing for `id` on `port`. `process` is the pm2 state, `None` when pm2
/// has no entry.
pub fn make_listing(
    id: &str,
    port: u16,
    status: SiteStatus,
    process: Option<ProcessState>,
) -> SiteListing {
    let mut record = TenantRecord::new(
        id.to_string(),
        port,
        format!("https://{id}.example.test"),
        format!("/srv/apps/repos/{id}.git"),
    );
    record.status = status;
    record.created_at = created_at();
    SiteListing {
        url: format!("https://{id}.example.test"),
        process: process.map(|state| ProcessInfo {
            name: format!("{id}:{port}"),
            status: state,
        }),
        supervisor_reachable: true,
        pending: None,
        record,
    }
}

/// Three sites: one online, one paused, one active but down.
pub fn sample_app() -> App {
    let mut app = App::new();
    app.sites = vec![
        make_listing("client-a", 4001, SiteStatus::Active, Some(ProcessState::Online)),
        make_listing("client-b", 4002, SiteStatus::Paused, Some(ProcessState::Stopped)),
        make_listing("client-c", 4003, SiteStatus::Active, Some(ProcessState::Errored)),
    ];
    app
}
