pub mod detail_panel;
pub mod dialog_confirm;
pub mod dialog_create;
pub mod dialog_help;
pub mod dialog_rename;
pub mod layout;
pub mod site_table;
pub mod status_bar;

use chrono::{DateTime, Utc};
use ratatui::Frame;

use crate::app::{App, Mode};

/// Top-level render dispatch. Pass `now` to pin timestamps for deterministic output,
/// or `None` to use the current time.
pub fn render(f: &mut Frame, app: &App, now: Option<DateTime<Utc>>) {
    let now = now.unwrap_or_else(Utc::now);
    let chunks = layout::main_layout(f.area());

    layout::render_title(f, chunks[0]);

    let content_chunks = layout::content_layout(chunks[1]);
    site_table::render(f, content_chunks[0], app);
    detail_panel::render_with_now(f, content_chunks[1], app, now);

    status_bar::render(f, chunks[2], app);

    // Overlay dialogs
    match &app.mode {
        Mode::CreateDialog => dialog_create::render(f, app),
        Mode::RenameDialog => dialog_rename::render(f, app),
        Mode::ConfirmDialog { message, .. } => dialog_confirm::render(f, message),
        Mode::HelpDialog => dialog_help::render(f),
        Mode::Loading(msg) => dialog_confirm::render_loading(f, msg),
        Mode::SiteList => {}
    }
}
