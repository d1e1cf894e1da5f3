use std::future::Future;
use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tokio::sync::mpsc;

use sf_core::services::lifecycle::{RepairOutcome, SiteManager};

use crate::app::{App, ConfirmAction, CreateSiteForm, Mode, RenameSiteForm};
use crate::event::AppEvent;

/// Handle a key event, dispatching based on current mode.
pub fn handle_key(
    app: &mut App,
    key: KeyEvent,
    manager: &Arc<SiteManager>,
    event_tx: &mpsc::UnboundedSender<AppEvent>,
) {
    tracing::debug!(mode = ?app.mode, key = ?key.code, "handle_key");
    match &app.mode {
        Mode::SiteList => handle_site_list(app, key, manager, event_tx),
        Mode::CreateDialog => handle_create_dialog(app, key, manager, event_tx),
        Mode::RenameDialog => handle_rename_dialog(app, key, manager, event_tx),
        Mode::ConfirmDialog { .. } => handle_confirm_dialog(app, key, manager, event_tx),
        Mode::HelpDialog => handle_help_dialog(app, key),
        Mode::Loading(_) => handle_loading(app, key),
    }
}

// ─── Site List Mode ─────────────────────────────────────────────────────

fn handle_site_list(
    app: &mut App,
    key: KeyEvent,
    manager: &Arc<SiteManager>,
    event_tx: &mpsc::UnboundedSender<AppEvent>,
) {
    if is_ctrl_c(&key) {
        app.should_quit = true;
        return;
    }

    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => {
            app.should_quit = true;
        }
        KeyCode::Up | KeyCode::Char('k') => app.select_prev(),
        KeyCode::Down | KeyCode::Char('j') => app.select_next(),
        KeyCode::Char('n') => {
            app.create_form = CreateSiteForm::default();
            app.mode = Mode::CreateDialog;
        }
        KeyCode::Char('r') => {
            if let Some(site) = app.selected_site() {
                app.rename_form = RenameSiteForm::for_site(&site.record.id);
                app.mode = Mode::RenameDialog;
            }
        }
        KeyCode::Char('p') => {
            if let Some(site) = app.selected_site() {
                let id = site.record.id.clone();
                let sm = Arc::clone(manager);
                launch(app, None, event_tx, async move {
                    sm.toggle(&id)
                        .await
                        .map(|record| format!("{} is now {}", record.id, record.status))
                        .map_err(|e| format!("Pause/resume of {id} failed: {e}"))
                });
            }
        }
        KeyCode::Char('d') => {
            if let Some(site) = app.selected_site() {
                app.mode = Mode::ConfirmDialog {
                    message: format!(
                        "Delete site '{}'? Its code, storage and repository are removed for good.",
                        site.record.id
                    ),
                    action: ConfirmAction::DeleteSite(site.record.id.clone()),
                };
            }
        }
        KeyCode::Char('f') => {
            if let Some(site) = app.selected_site() {
                let id = site.record.id.clone();
                let sm = Arc::clone(manager);
                launch(app, Some(format!("Repairing {id}...")), event_tx, async move {
                    match sm.repair(&id).await {
                        Ok(RepairOutcome::Restored(record)) => {
                            Ok(format!("Repaired {} on port {}", record.id, record.port))
                        }
                        Ok(RepairOutcome::Deleted(id)) => Ok(format!("Finished deleting {id}")),
                        Err(e) => Err(format!("Repair of {id} failed: {e}")),
                    }
                });
            }
        }
        KeyCode::Char('l') => {
            if let Some(site) = app.selected_site() {
                let id = site.record.id.clone();
                let sm = Arc::clone(manager);
                launch(app, None, event_tx, async move {
                    sm.relink(&id)
                        .await
                        .map(|report| {
                            format!(
                                "Relinked {id}: {} created, {} unchanged, {} skipped",
                                report.created(),
                                report.unchanged(),
                                report.skipped()
                            )
                        })
                        .map_err(|e| format!("Relink of {id} failed: {e}"))
                });
            }
        }
        KeyCode::Char('?') => {
            app.mode = Mode::HelpDialog;
        }
        _ => {}
    }
}

// ─── Dialog Handlers ────────────────────────────────────────────────────

fn handle_create_dialog(
    app: &mut App,
    key: KeyEvent,
    manager: &Arc<SiteManager>,
    event_tx: &mpsc::UnboundedSender<AppEvent>,
) {
    match key.code {
        KeyCode::Esc => {
            app.mode = Mode::SiteList;
        }
        KeyCode::Enter => {
            let id = match app.create_form.preview() {
                Ok(id) => id,
                Err(reason) => {
                    app.set_status(format!("Error: {reason}"));
                    return;
                }
            };
            let name = app.create_form.name.trim().to_string();
            let sm = Arc::clone(manager);
            launch(app, Some(format!("Creating {id}...")), event_tx, async move {
                sm.create(&name)
                    .await
                    .map(|record| {
                        format!(
                            "Created {} on port {}. Push to {}",
                            record.id, record.port, record.repo
                        )
                    })
                    .map_err(|e| format!("Create of {id} failed: {e}"))
            });
        }
        KeyCode::Backspace => {
            app.create_form.name.pop();
        }
        KeyCode::Char(c) => {
            app.create_form.name.push(c);
        }
        _ => {}
    }
}

fn handle_rename_dialog(
    app: &mut App,
    key: KeyEvent,
    manager: &Arc<SiteManager>,
    event_tx: &mpsc::UnboundedSender<AppEvent>,
) {
    match key.code {
        KeyCode::Esc => {
            app.mode = Mode::SiteList;
        }
        KeyCode::Enter => {
            let new_id = match app.rename_form.preview() {
                Ok(id) => id,
                Err(reason) => {
                    app.set_status(format!("Error: {reason}"));
                    return;
                }
            };
            let old_id = app.rename_form.from.clone();
            let name = app.rename_form.name.trim().to_string();
            let sm = Arc::clone(manager);
            launch(
                app,
                Some(format!("Renaming {old_id} to {new_id}...")),
                event_tx,
                async move {
                    sm.rename(&old_id, &name)
                        .await
                        .map(|record| format!("Renamed {old_id} to {}", record.id))
                        .map_err(|e| format!("Rename of {old_id} failed: {e}"))
                },
            );
        }
        KeyCode::Backspace => {
            app.rename_form.name.pop();
        }
        KeyCode::Char(c) => {
            app.rename_form.name.push(c);
        }
        _ => {}
    }
}

fn handle_confirm_dialog(
    app: &mut App,
    key: KeyEvent,
    manager: &Arc<SiteManager>,
    event_tx: &mpsc::UnboundedSender<AppEvent>,
) {
    match key.code {
        KeyCode::Esc | KeyCode::Char('n') => {
            app.mode = Mode::SiteList;
        }
        KeyCode::Char('y') | KeyCode::Enter => {
            let Mode::ConfirmDialog { action, .. } = &app.mode else {
                return;
            };
            match action.clone() {
                ConfirmAction::Quit => {
                    app.should_quit = true;
                }
                ConfirmAction::DeleteSite(id) => {
                    let sm = Arc::clone(manager);
                    launch(app, Some(format!("Deleting {id}...")), event_tx, async move {
                        sm.delete(&id)
                            .await
                            .map(|()| format!("Deleted {id}"))
                            .map_err(|e| format!("Delete of {id} failed: {e}"))
                    });
                }
            }
        }
        _ => {}
    }
}

fn handle_help_dialog(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('?') => {
            app.mode = Mode::SiteList;
        }
        _ => {}
    }
}

/// Operations keep running when the UI exits; an interrupted one is finished
/// later with repair.
fn handle_loading(app: &mut App, key: KeyEvent) {
    if is_ctrl_c(&key) {
        app.mode = Mode::ConfirmDialog {
            message: "An operation is still running. Quit anyway? Use repair on the site afterwards."
                .into(),
            action: ConfirmAction::Quit,
        };
    }
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn is_ctrl_c(key: &KeyEvent) -> bool {
    key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c')
}

/// Run a lifecycle operation in the background and report its outcome as an
/// Info or Error event.
fn launch<F>(
    app: &mut App,
    loading: Option<String>,
    event_tx: &mpsc::UnboundedSender<AppEvent>,
    operation: F,
) where
    F: Future<Output = Result<String, String>> + Send + 'static,
{
    match loading {
        Some(msg) => app.mode = Mode::Loading(msg),
        None => app.mode = Mode::SiteList,
    }
    let tx = event_tx.clone();
    tokio::spawn(async move {
        let event = match operation.await {
            Ok(msg) => AppEvent::Info(msg),
            Err(msg) => AppEvent::Error(msg),
        };
        let _ = tx.send(event);
    });
}

/// Start a List query unless one is already running.
pub fn spawn_refresh(
    app: &mut App,
    manager: &Arc<SiteManager>,
    event_tx: &mpsc::UnboundedSender<AppEvent>,
) {
    if app.refreshing {
        return;
    }
    app.refreshing = true;
    let tx = event_tx.clone();
    let sm = Arc::clone(manager);
    tokio::spawn(async move {
        let result = sm.list().await.map_err(|e| format!("List failed: {e}"));
        let _ = tx.send(AppEvent::SitesLoaded(result));
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use sf_core::models::{PlatformConfig, SiteListing, TenantRecord};

    fn manager() -> (tempfile::TempDir, Arc<SiteManager>) {
        let dir = tempfile::tempdir().unwrap();
        let config = PlatformConfig::with_root(dir.path(), "example.test");
        (dir, Arc::new(SiteManager::new(config)))
    }

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn listing(id: &str) -> SiteListing {
        SiteListing {
            record: TenantRecord::new(id.into(), 4001, format!("https://{id}.test"), String::new()),
            url: format!("https://{id}.test"),
            process: None,
            supervisor_reachable: true,
            pending: None,
        }
    }

    #[test]
    fn typing_fills_create_form() {
        let (_dir, sm) = manager();
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut app = App::new();
        handle_key(&mut app, press(KeyCode::Char('n')), &sm, &tx);
        assert_eq!(app.mode, Mode::CreateDialog);
        for c in "Ab c".chars() {
            handle_key(&mut app, press(KeyCode::Char(c)), &sm, &tx);
        }
        handle_key(&mut app, press(KeyCode::Backspace), &sm, &tx);
        assert_eq!(app.create_form.name, "Ab ");
        handle_key(&mut app, press(KeyCode::Esc), &sm, &tx);
        assert_eq!(app.mode, Mode::SiteList);
    }

    #[test]
    fn invalid_name_stays_in_dialog() {
        let (_dir, sm) = manager();
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut app = App::new();
        app.mode = Mode::CreateDialog;
        app.create_form.name = "!!!".into();
        handle_key(&mut app, press(KeyCode::Enter), &sm, &tx);
        assert_eq!(app.mode, Mode::CreateDialog);
        assert!(app.status_message.unwrap().starts_with("Error"));
    }

    #[test]
    fn delete_asks_for_confirmation() {
        let (_dir, sm) = manager();
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut app = App::new();
        app.sites = vec![listing("client-a")];
        handle_key(&mut app, press(KeyCode::Char('d')), &sm, &tx);
        assert!(matches!(
            app.mode,
            Mode::ConfirmDialog { action: ConfirmAction::DeleteSite(ref id), .. } if id == "client-a"
        ));
        handle_key(&mut app, press(KeyCode::Char('n')), &sm, &tx);
        assert_eq!(app.mode, Mode::SiteList);
    }

    #[test]
    fn rename_needs_a_selection() {
        let (_dir, sm) = manager();
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut app = App::new();
        handle_key(&mut app, press(KeyCode::Char('r')), &sm, &tx);
        assert_eq!(app.mode, Mode::SiteList);
        app.sites = vec![listing("client-a")];
        handle_key(&mut app, press(KeyCode::Char('r')), &sm, &tx);
        assert_eq!(app.mode, Mode::RenameDialog);
        assert_eq!(app.rename_form.from, "client-a");
    }

    #[test]
    fn ctrl_c_while_loading_asks_before_quitting() {
        let (_dir, sm) = manager();
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut app = App::new();
        app.mode = Mode::Loading("Creating a...".into());
        handle_key(&mut app, press(KeyCode::Char('q')), &sm, &tx);
        assert!(matches!(app.mode, Mode::Loading(_)));
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        handle_key(&mut app, ctrl_c, &sm, &tx);
        handle_key(&mut app, press(KeyCode::Char('y')), &sm, &tx);
        assert!(app.should_quit);
    }
}
