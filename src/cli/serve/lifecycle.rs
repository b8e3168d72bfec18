//! Server lifecycle management.

use std::{
    net::SocketAddr,
    sync::Arc,
    thread::{self, JoinHandle},
    time::Duration,
};

use anyhow::Result;
use crossbeam::channel::Receiver;
use tiny_http::Server;
use tokio::sync::mpsc;

use crate::reload::ReloadHub;
use crate::watch::WatchActor;

/// Maximum number of port binding attempts.
const MAX_PORT_RETRIES: u16 = 10;

/// Bind the HTTP server, with automatic port retry.
pub fn bind_with_retry(base_port: u16) -> Result<(Server, SocketAddr)> {
    for offset in 0..MAX_PORT_RETRIES {
        let port = base_port.saturating_add(offset);
        let addr: SocketAddr = ([127, 0, 0, 1], port).into();

        match Server::http(addr) {
            Ok(server) => {
                if offset > 0 {
                    crate::log!("serve"; "port {} in use, using {} instead", base_port, port);
                }
                return Ok((server, addr));
            }
            Err(_) if offset + 1 < MAX_PORT_RETRIES => continue,
            Err(e) => {
                return Err(anyhow::anyhow!(
                    "failed to bind after {} attempts (ports {}-{}): {}",
                    MAX_PORT_RETRIES,
                    base_port,
                    port,
                    e
                ));
            }
        }
    }
    unreachable!()
}

/// Run the watch loop and the reload dispatcher on their own runtime thread.
///
/// The thread owns the tokio runtime: the watcher task, the lazily started
/// dispatcher and every connection task live on it. It unwinds when the
/// watcher stops - on the cancellation signal or on a fatal watch error,
/// the latter also taking the HTTP loop down (fail-fast, no degraded
/// serve-without-reload mode).
pub fn spawn_watch(
    watch_actor: WatchActor,
    hub: Arc<ReloadHub>,
    rt: tokio::runtime::Runtime,
    shutdown_rx: Receiver<()>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        rt.block_on(async move {
            let (cancel_tx, cancel_rx) = mpsc::channel::<()>(1);
            let watch_handle = tokio::spawn(watch_actor.run(cancel_rx));

            // Bridge the process shutdown signal onto the watcher's
            // cancellation channel.
            let bridge = tokio::spawn(async move {
                loop {
                    if shutdown_rx.try_recv().is_ok() || crate::core::is_shutdown() {
                        let _ = cancel_tx.send(()).await;
                        break;
                    }
                    tokio::time::sleep(Duration::from_millis(100)).await;
                }
            });

            match watch_handle.await {
                Ok(Ok(())) => crate::debug!("watch"; "stopped cleanly"),
                Ok(Err(e)) => {
                    crate::log!("error"; "watch failed: {}", e);
                    crate::core::request_shutdown();
                }
                Err(e) => {
                    crate::log!("error"; "watch task died: {}", e);
                    crate::core::request_shutdown();
                }
            }
            bridge.abort();

            // The watcher dropped its event sender, which is the
            // dispatcher's shutdown trigger; let its close sweep finish
            // before the runtime goes away.
            let _ = tokio::time::timeout(Duration::from_millis(500), hub.join()).await;
        });
    })
}

/// Wait for the watch runtime thread to finish (max 2 seconds).
pub fn wait_for_shutdown(handle: JoinHandle<()>) {
    for _ in 0..40 {
        if handle.is_finished() {
            let _ = handle.join();
            return;
        }
        thread::sleep(Duration::from_millis(50));
    }
}
