//! Event bus for the review UI.
//!
//! Terminal input, timer ticks, and background store results all arrive as
//! `AppEvent`s on one unbounded channel drained by the main loop. Render
//! (33 ms) and tick (250 ms) intervals are independent.

use crossterm::event::{Event, EventStream, KeyEvent, KeyEventKind, MouseEvent};
use futures::{FutureExt, StreamExt};
use revcheck_core::Session;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::interval;

#[derive(Debug)]
#[non_exhaustive]
pub enum AppEvent {
    /// Key press. Release and repeat events are filtered out in
    /// [`spawn_event_task`].
    Key(KeyEvent),
    Mouse(MouseEvent),
    Resize(u16, u16),
    /// Logic tick (notice expiry).
    Tick,
    Render,
    /// A background session fetch finished. `index` is the navigation
    /// position it was issued for.
    SessionLoaded {
        index: usize,
        result: revcheck_core::Result<Session>,
    },
    Quit,
}

pub struct EventHandler {
    pub tx: mpsc::UnboundedSender<AppEvent>,
    pub rx: mpsc::UnboundedReceiver<AppEvent>,
}

impl EventHandler {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { tx, rx }
    }
}

impl Default for EventHandler {
    fn default() -> Self {
        Self::new()
    }
}

/// Spawns the task feeding terminal input and timers into `tx`.
///
/// `reader.next().fuse()` keeps `select!` from polling a finished stream.
/// Send errors are ignored; once the receiver is gone nothing listens.
pub fn spawn_event_task(tx: mpsc::UnboundedSender<AppEvent>) {
    tokio::spawn(async move {
        let mut tick_interval = interval(Duration::from_millis(250));
        let mut render_interval = interval(Duration::from_millis(33));
        let mut reader = EventStream::new();

        loop {
            let tick_tick = tick_interval.tick();
            let render_tick = render_interval.tick();
            let crossterm_event = reader.next().fuse();

            tokio::select! {
                _ = tick_tick => {
                    let _ = tx.send(AppEvent::Tick);
                }
                _ = render_tick => {
                    let _ = tx.send(AppEvent::Render);
                }
                maybe_event = crossterm_event => {
                    match maybe_event {
                        Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                            let _ = tx.send(AppEvent::Key(key));
                        }
                        Some(Ok(Event::Resize(w, h))) => {
                            let _ = tx.send(AppEvent::Resize(w, h));
                        }
                        Some(Ok(Event::Mouse(mouse))) => {
                            let _ = tx.send(AppEvent::Mouse(mouse));
                        }
                        None => {
                            let _ = tx.send(AppEvent::Quit);
                            break;
                        }
                        _ => {}
                    }
                }
            }
        }
    });
}

/// Fetches session `index` on a background task and reports back on `tx`.
///
/// The store call is not cancelled if the reviewer navigates away; the stale
/// result is discarded when it arrives.
pub fn spawn_session_fetch(
    store: revcheck_core::SqliteStore,
    index: usize,
    tx: mpsc::UnboundedSender<AppEvent>,
) {
    use revcheck_core::ReviewStore as _;
    tokio::spawn(async move {
        let result = store.fetch_session(index).await;
        let _ = tx.send(AppEvent::SessionLoaded { index, result });
    });
}
