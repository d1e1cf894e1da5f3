use std::time::Duration;

use crossterm::event::{self, Event, KeyEvent};
use tokio::sync::mpsc;

use sf_core::models::SiteListing;

/// Events flowing into the main loop.
#[derive(Debug)]
pub enum AppEvent {
    /// A key press from the user.
    Key(KeyEvent),
    /// Periodic tick for refreshing the site list.
    Tick,
    /// A lifecycle operation failed.
    Error(String),
    /// A lifecycle operation completed successfully with a message.
    Info(String),
    /// Result of a background List query.
    SitesLoaded(Result<Vec<SiteListing>, String>),
}

/// Spawn the crossterm input polling task.
pub fn spawn_input_task(tx: mpsc::UnboundedSender<AppEvent>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let has_event = tokio::task::spawn_blocking(|| {
                event::poll(Duration::from_millis(50)).unwrap_or(false)
            })
            .await
            .unwrap_or(false);

            if has_event {
                if let Ok(Event::Key(key)) = tokio::task::spawn_blocking(event::read)
                    .await
                    .unwrap_or(Err(std::io::Error::other("spawn_blocking failed")))
                {
                    if tx.send(AppEvent::Key(key)).is_err() {
                        break;
                    }
                }
            }
        }
    })
}

/// Spawn the periodic tick task. pm2 is slow to answer, so ticks are sparse.
pub fn spawn_tick_task(tx: mpsc::UnboundedSender<AppEvent>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(5));
        loop {
            interval.tick().await;
            if tx.send(AppEvent::Tick).is_err() {
                break;
            }
        }
    })
}
