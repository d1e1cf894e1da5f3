mod common;

use sf_tui::app::{App, ConfirmAction, Mode, RenameSiteForm};

use common::{render_to_string, sample_app};

#[test]
fn create_dialog_previews_id() {
    let mut app = App::new();
    app.mode = Mode::CreateDialog;
    app.create_form.name = "Client D".into();
    let output = render_to_string(&app, 100, 30);
    assert!(output.contains("New Site"));
    assert!(output.contains("Site name:"));
    assert!(output.contains(" Client D"));
    assert!(output.contains("Id: client-d"));
    assert!(output.contains("Enter create  Esc cancel"));
}

#[test]
fn create_dialog_rejects_empty_name() {
    let mut app = App::new();
    app.mode = Mode::CreateDialog;
    app.create_form.name = "!!!".into();
    let output = render_to_string(&app, 100, 30);
    assert!(output.contains("invalid site name"));
    assert!(!output.contains("Id: "));
}

#[test]
fn rename_dialog_shows_current_id() {
    let mut app = sample_app();
    app.mode = Mode::RenameDialog;
    app.rename_form = RenameSiteForm::for_site("client-a");
    app.rename_form.name = "Client Z".into();
    let output = render_to_string(&app, 100, 30);
    assert!(output.contains("Rename Site"));
    assert!(output.contains("Current: client-a"));
    assert!(output.contains("Id: client-z"));
    assert!(output.contains("Enter rename  Esc cancel"));
}

#[test]
fn rename_dialog_same_id() {
    let mut app = sample_app();
    app.mode = Mode::RenameDialog;
    app.rename_form = RenameSiteForm::for_site("client-a");
    app.rename_form.name = "CLIENT_A".into();
    let output = render_to_string(&app, 100, 30);
    assert!(output.contains("'client-a' is the current name"));
}

#[test]
fn confirm_delete_dialog() {
    let mut app = sample_app();
    app.mode = Mode::ConfirmDialog {
        message: "Delete site 'client-a'? Its code, storage and repository are removed for good."
            .into(),
        action: ConfirmAction::DeleteSite("client-a".into()),
    };
    let output = render_to_string(&app, 100, 30);
    assert!(output.contains("Confirm"));
    assert!(output.contains("Delete site 'client-a'?"));
    assert!(output.contains("[Y]es"));
    assert!(output.contains("[Y]es [N]o"));
}

#[test]
fn loading_overlay() {
    let mut app = sample_app();
    app.mode = Mode::Loading("Creating client-d...".into());
    let output = render_to_string(&app, 100, 30);
    assert!(output.contains("Working"));
    assert!(output.contains("Creating client-d..."));
    assert!(output.contains("Ctrl+C to leave early"));
}

#[test]
fn help_dialog_lists_operations() {
    let mut app = App::new();
    app.mode = Mode::HelpDialog;
    let output = render_to_string(&app, 100, 30);
    assert!(output.contains("Help: Keybindings"));
    for desc in [
        "Create a site",
        "Rename the selected site",
        "Pause or resume",
        "Delete the selected site",
        "Repair (finish or regenerate)",
        "Relink shared directories",
    ] {
        assert!(output.contains(desc), "missing {desc}");
    }
}
