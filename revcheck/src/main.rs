//! revcheck: review machine-revised conversation transcripts.
//!
//! One-shot subcommands (`import`, `stats`, `export`) run against the SQLite
//! store and exit. `review`, the default, opens the terminal UI.
//!
//! # Review startup order
//!
//! 1. Theme and store are ready and the first session is loaded before the
//!    terminal is touched, so there is no empty first frame.
//! 2. `install_panic_hook()` restores the terminal before a panic prints.
//! 3. `register_sigterm()` gives the flag polled by the event loop.
//! 4. `init_tui()` enters the alternate screen and raw mode.
//! 5. The event task starts; the loop runs until quit.
//!
//! `restore_tui()` runs once, after the loop, whatever ended it.

mod app;
mod cli;
mod config;
mod event;
mod logging;
mod theme;
mod tui;
mod ui;

use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use clap::Parser;
use revcheck_core::{
    Command, ConversationType, ExportArtifact, ReviewController, ReviewError, ReviewStore,
    SheetFormat, SqliteStore,
};
use tokio::sync::mpsc;

use crate::app::AppState;
use crate::cli::{Cli, Commands};
use crate::config::Config;
use crate::event::{AppEvent, EventHandler};
use crate::theme::Theme;
use crate::ui::keybindings::{handle_key, handle_mouse, KeyAction, ReviewAction};

fn to_io(err: ReviewError) -> io::Error {
    io::Error::other(err)
}

#[tokio::main]
async fn main() -> io::Result<()> {
    let cli = Cli::parse();
    let config = Config::load();
    let interactive = matches!(cli.command, None | Some(Commands::Review));
    let _log_guard = logging::init(&config.log_dir, !interactive);

    let db_path = cli.db.clone().unwrap_or_else(|| config.db_path.clone());
    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let store = SqliteStore::open(&db_path.to_string_lossy(), config.manual_policy())
        .await
        .map_err(to_io)?;

    match cli.command {
        Some(Commands::Import { file }) => run_import(&store, &file).await,
        Some(Commands::Stats) => run_stats(&store).await,
        Some(Commands::Export { out, format }) => {
            let format = match format {
                Some(name) => name.parse().map_err(to_io)?,
                None => config.export_format(),
            };
            run_export(&store, out.as_deref().unwrap_or(&config.export_dir), format).await
        }
        Some(Commands::Review) | None => run_review(store, &config).await,
    }
}

async fn run_import(store: &SqliteStore, file: &Path) -> io::Result<()> {
    let summary = store.import_path(file).await.map_err(to_io)?;
    println!(
        "imported {} sessions ({} rows) from {} as batch {}",
        summary.total_sessions,
        summary.total_rows,
        file.display(),
        summary.batch_id
    );
    Ok(())
}

async fn run_stats(store: &SqliteStore) -> io::Result<()> {
    let stats = store.fetch_statistics().await.map_err(to_io)?;
    for ct in ConversationType::ALL {
        println!("{} {:<16} {}", ct.code(), ct.label(), stats.count(ct));
    }
    println!("  {:<16} {}", "total", stats.total());
    Ok(())
}

async fn run_export(
    store: &SqliteStore,
    out_dir: &Path,
    format: SheetFormat,
) -> io::Result<()> {
    let artifact = store.request_export(format).await.map_err(to_io)?;
    let path = write_artifact(out_dir, &artifact)?;
    println!("{}", path.display());
    Ok(())
}

fn write_artifact(dir: &Path, artifact: &ExportArtifact) -> io::Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(&artifact.filename);
    std::fs::write(&path, &artifact.bytes)?;
    tracing::info!(path = %path.display(), "export written");
    Ok(path)
}

async fn run_review(store: SqliteStore, config: &Config) -> io::Result<()> {
    let theme = Theme::from_name(&config.theme);
    let mut state = AppState::default();
    let mut review = ReviewController::new(store, config.manual_policy());

    if let Err(err) = review.start().await {
        tracing::warn!(%err, "initial load failed");
        state.notify_error(err);
    }
    state.reset_rows(review.session().map_or(0, |s| s.rows.len()));

    tui::install_panic_hook();
    let term_flag = tui::register_sigterm();
    let mut terminal = tui::init_tui()?;

    let handler = EventHandler::new();
    event::spawn_event_task(handler.tx.clone());

    let result = event_loop(
        &mut terminal,
        &mut state,
        &mut review,
        &theme,
        config,
        handler,
        &term_flag,
    )
    .await;

    tui::restore_tui()?;
    result
}

/// Runs until quit, SIGTERM, or a draw error. Every exit, including a
/// failed draw, returns here so the caller can restore the terminal.
async fn event_loop(
    terminal: &mut tui::Tui,
    state: &mut AppState,
    review: &mut ReviewController<SqliteStore>,
    theme: &Theme,
    config: &Config,
    handler: EventHandler,
    term_flag: &AtomicBool,
) -> io::Result<()> {
    let EventHandler { tx, mut rx } = handler;

    loop {
        tokio::select! {
            // Polls SIGTERM even when no events arrive.
            _ = tokio::time::sleep(Duration::from_millis(50)) => {}
            maybe_event = rx.recv() => {
                match maybe_event {
                    Some(AppEvent::Render) => {
                        terminal.draw(|frame| ui::render(frame, state, review, theme))?;
                    }
                    Some(AppEvent::Key(key)) => match handle_key(key, state) {
                        KeyAction::Quit => return Ok(()),
                        KeyAction::Continue => {}
                        KeyAction::Review(action) => {
                            perform(action, review, state, &tx, config).await;
                        }
                    },
                    Some(AppEvent::Mouse(mouse)) => {
                        handle_mouse(mouse, state);
                    }
                    Some(AppEvent::Tick) => state.expire_notice(Instant::now()),
                    Some(AppEvent::SessionLoaded { index, result }) => {
                        match review.apply_loaded(index, result) {
                            Ok(true) => {
                                let rows = review.session().map_or(0, |s| s.rows.len());
                                // Navigation zeroes the row count; a reload keeps the cursor.
                                if state.row_count == 0 {
                                    state.reset_rows(rows);
                                } else {
                                    state.set_row_count(rows);
                                }
                            }
                            Ok(false) => {}
                            Err(err) => {
                                state.loading = false;
                                state.notify_error(err);
                            }
                        }
                    }
                    // The next Render picks up the new frame size.
                    Some(AppEvent::Resize(_, _)) => {}
                    Some(AppEvent::Quit) | None => return Ok(()),
                }
            }
        }
        if term_flag.load(Ordering::Relaxed) {
            return Ok(());
        }
    }
}

/// Runs one reviewer action against the controller. Failures become error
/// notices; nothing is retried.
async fn perform(
    action: ReviewAction,
    review: &mut ReviewController<SqliteStore>,
    state: &mut AppState,
    tx: &mpsc::UnboundedSender<AppEvent>,
    config: &Config,
) {
    match action {
        ReviewAction::Accept | ReviewAction::Reject => {
            let Some(row_index) = ui::selected_row(state, review).map(|r| r.index) else {
                state.notify_error(ReviewError::validation("no row selected"));
                return;
            };
            let command = if action == ReviewAction::Accept {
                Command::Accept
            } else {
                Command::Reject
            };
            let decision = command.decision();
            match review.dispatch(row_index, command).await {
                Ok(()) => state.notify(format!("row {row_index}: {decision}")),
                Err(err) => state.notify_error(err),
            }
        }
        ReviewAction::BeginEdit => match ui::selected_row(state, review) {
            Some(row) => state.open_editor(row.index, row.editor_seed()),
            None => state.notify_error(ReviewError::validation("no row selected")),
        },
        ReviewAction::SubmitManual(editor) => {
            let row_index = editor.row_index;
            match review.dispatch(row_index, Command::Manual(editor.buffer)).await {
                Ok(()) => state.notify(format!("row {row_index}: manual")),
                Err(err) => state.notify_error(err),
            }
        }
        ReviewAction::Save => match review.save().await {
            Ok(_) => state.notify("session saved"),
            Err(err @ ReviewError::Conflict { .. }) => {
                state.notify_error(err);
                // Reload so the reviewer sees what changed before saving again.
                state.loading = true;
                let index = review.current_index();
                event::spawn_session_fetch(review.store().clone(), index, tx.clone());
            }
            Err(err) => state.notify_error(err),
        },
        ReviewAction::Export => {
            let written = review
                .export(config.export_format())
                .await
                .map_err(to_io)
                .and_then(|artifact| write_artifact(&config.export_dir, &artifact));
            match written {
                Ok(path) => state.notify(format!("exported to {}", path.display())),
                Err(err) => state.notify_error(err),
            }
        }
        ReviewAction::PrevSession | ReviewAction::NextSession => {
            let delta = if action == ReviewAction::NextSession { 1 } else { -1 };
            match review.navigate(delta) {
                Some(index) => {
                    state.begin_loading();
                    event::spawn_session_fetch(review.store().clone(), index, tx.clone());
                }
                None if delta > 0 => state.notify("already at the last session"),
                None => state.notify("already at the first session"),
            }
        }
    }
}
