mod common;

use chrono::Duration;
use sf_core::models::{Operation, ProcessState, SiteStatus};
use sf_tui::app::App;

use common::{created_at, make_listing, render_to_string_at};

#[test]
fn detail_shows_record_fields() {
    let mut app = App::new();
    app.sites.push(make_listing(
        "client-a",
        4001,
        SiteStatus::Active,
        Some(ProcessState::Online),
    ));
    let now = created_at() + Duration::days(2) + Duration::hours(3);
    let output = render_to_string_at(&app, 100, 30, now);
    assert!(output.contains("Site      client-a"));
    assert!(output.contains("Port      4001"));
    assert!(output.contains("Status    active"));
    assert!(output.contains("Health    online"));
    assert!(output.contains("Process   client-a:4001 (online)"));
    assert!(output.contains("Created   2d 3h ago"));
    assert!(output.contains("Repo      /srv/apps/repos/client-a.git"));
}

#[test]
fn unregistered_process() {
    let mut app = App::new();
    app.sites
        .push(make_listing("client-a", 4001, SiteStatus::Active, None));
    let now = created_at() + Duration::minutes(5);
    let output = render_to_string_at(&app, 100, 30, now);
    assert!(output.contains("not registered"));
    assert!(output.contains("Health    offline"));
    assert!(output.contains("Created   5m ago"));
}

#[test]
fn interrupted_delete_hint() {
    let mut app = App::new();
    let mut listing = make_listing("client-a", 4001, SiteStatus::Paused, None);
    listing.pending = Some(Operation::Delete);
    app.sites.push(listing);
    let output = render_to_string_at(&app, 100, 30, created_at());
    assert!(output.contains("delete: interrupted, F finishes it"));
    assert!(output.contains("Status    paused"));
}
