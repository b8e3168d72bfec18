//! Filesystem watcher feeding the reload hub.
//!
//! Watches every directory the mirror walk discovered and turns write
//! events into re-mirrored files plus change events:
//!
//! ```text
//! notify → bridge thread → event loop → Mirror::mirror_file → ChangeEvent
//! ```
//!
//! Directories created after the initial walk are not watched; a change
//! inside one produces no notification until the server is restarted. The
//! watcher is fail-fast: an unrecoverable notify failure ends the whole
//! serving loop rather than degrading silently.

#[cfg(test)]
mod tests;

use std::sync::Arc;

use anyhow::{Context, Result};
use notify::event::{CreateKind, ModifyKind};
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use thiserror::Error;
use tokio::sync::mpsc;

use crate::mirror::Mirror;
use crate::reload::ChangeEvent;

/// Fatal watch-loop failures. None of these are retried; the caller is
/// expected to take the whole server down.
#[derive(Debug, Error)]
pub enum WatchError {
    #[error("watcher event stream closed unexpectedly")]
    EventStreamClosed,

    #[error("watcher error stream closed unexpectedly")]
    ErrorStreamClosed,

    #[error("watcher failure: {0}")]
    Notify(#[from] notify::Error),
}

/// Long-lived watch actor.
///
/// Construction performs the complete mirror setup: the notify watcher is
/// created, the source tree walked (each discovered directory attached to
/// the watcher), and every file mirrored. Any failure along the way is
/// setup-fatal and surfaces to the caller.
pub struct WatchActor {
    /// Watcher handle (must be kept alive for events to flow)
    watcher: RecommendedWatcher,
    /// Raw notify results (sync → async bridged in `run`)
    notify_rx: std::sync::mpsc::Receiver<notify::Result<notify::Event>>,
    mirror: Arc<Mirror>,
    reload_tx: mpsc::Sender<ChangeEvent>,
}

impl WatchActor {
    pub fn new(mirror: Arc<Mirror>, reload_tx: mpsc::Sender<ChangeEvent>) -> Result<Self> {
        // Sync channel for notify (it doesn't support async)
        let (notify_tx, notify_rx) = std::sync::mpsc::channel();

        let mut watcher = notify::recommended_watcher(move |res| {
            let _ = notify_tx.send(res);
        })
        .context("failed to create filesystem watcher")?;

        // Initial walk: watch each directory as it is discovered, mirror
        // each file. Events start buffering in notify_rx right away.
        mirror.setup(|dir| {
            watcher
                .watch(dir, RecursiveMode::NonRecursive)
                .with_context(|| format!("failed to watch dir: {}", dir.display()))
        })?;

        Ok(Self {
            watcher,
            notify_rx,
            mirror,
            reload_tx,
        })
    }

    /// Run the watch loop until cancelled or a fatal failure.
    ///
    /// Selects over three sources: the cancellation channel (clean stop,
    /// `Ok`), the change-event stream, and the watcher-error stream. An
    /// unexpected close of either stream, or any reported watcher error,
    /// returns `Err` immediately.
    pub async fn run(self, mut cancel: mpsc::Receiver<()>) -> Result<(), WatchError> {
        let Self {
            watcher,
            notify_rx,
            mirror,
            reload_tx,
        } = self;
        // Keep the watcher alive for as long as the loop runs.
        let _watcher = watcher;

        let (event_tx, mut event_rx) = mpsc::channel::<notify::Event>(64);
        let (error_tx, mut error_rx) = mpsc::channel::<notify::Error>(8);

        // Bridge thread: split notify results onto the two async channels.
        std::thread::spawn(move || {
            while let Ok(result) = notify_rx.recv() {
                let alive = match result {
                    Ok(event) => event_tx.blocking_send(event).is_ok(),
                    Err(e) => error_tx.blocking_send(e).is_ok(),
                };
                if !alive {
                    break;
                }
            }
        });

        loop {
            tokio::select! {
                _ = cancel.recv() => {
                    crate::debug!("watch"; "stopping on cancellation");
                    return Ok(());
                }
                event = event_rx.recv() => match event {
                    Some(event) => handle_event(&mirror, &reload_tx, event).await,
                    None => return Err(WatchError::EventStreamClosed),
                },
                error = error_rx.recv() => match error {
                    Some(e) => return Err(WatchError::Notify(e)),
                    None => return Err(WatchError::ErrorStreamClosed),
                },
            }
        }
    }
}

/// Whether a notify event kind corresponds to written file content.
///
/// `Create` is included because some platforms deliver a fresh file's
/// content as a single create event with no modify following it.
fn is_write_kind(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Modify(ModifyKind::Data(_) | ModifyKind::Any)
            | EventKind::Create(CreateKind::File | CreateKind::Any)
    )
}

/// Re-mirror one changed file and emit its change event.
///
/// A re-mirror failure at runtime is logged and skipped; only the watch
/// machinery itself is allowed to take the loop down.
async fn handle_event(mirror: &Mirror, reload_tx: &mpsc::Sender<ChangeEvent>, event: notify::Event) {
    if !is_write_kind(&event.kind) {
        return;
    }

    for path in &event.paths {
        if path.is_dir() {
            continue;
        }
        crate::debug!("watch"; "noticed write in: '{}'", path.display());

        if let Err(e) = mirror.mirror_file(path) {
            crate::log!("watch"; "failed to re-mirror '{}': {:#}", path.display(), e);
            continue;
        }

        if let Some(rel) = mirror.relative_url(path) {
            // Blocking hand-off to the dispatcher; parks until the
            // dispatcher side is consuming.
            if reload_tx.send(ChangeEvent::new(rel)).await.is_err() {
                crate::debug!("watch"; "reload hub gone, dropping event");
            }
        }
    }
}
