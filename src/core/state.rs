//! Process-wide serve state.
//!
//! Two concerns live here:
//! - `SHUTDOWN`: has shutdown been requested? (Ctrl+C or fatal watch error)
//! - registration of the HTTP server and the actor shutdown channel, so a
//!   single `request_shutdown()` can unwind both.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use tiny_http::Server;

/// Shutdown has been requested (Ctrl+C received or fatal watch error)
static SHUTDOWN: AtomicBool = AtomicBool::new(false);

/// HTTP server reference for graceful shutdown
static SERVER: OnceLock<Arc<Server>> = OnceLock::new();

/// Shutdown signal sender for the actor runtime
static SHUTDOWN_TX: OnceLock<crossbeam::channel::Sender<()>> = OnceLock::new();

/// Setup the global Ctrl+C handler. Call once at program start
///
/// The handler behavior depends on whether a server has been registered:
/// - Before `register_server()`: sets the flag and exits immediately
/// - After `register_server()`: graceful shutdown (unblock server, cancel watcher)
pub fn setup_shutdown_handler() -> anyhow::Result<()> {
    ctrlc::set_handler(|| {
        if SERVER.get().is_none() {
            // Nothing bound yet, nothing to unwind
            std::process::exit(0);
        }
        crate::log!("serve"; "shutting down...");
        request_shutdown();
    })
    .map_err(|e| anyhow::anyhow!("failed to set Ctrl+C handler: {}", e))
}

/// Register the HTTP server and actor channel for graceful shutdown
///
/// Call this after binding the server, before entering the request loop
pub fn register_server(server: Arc<Server>, shutdown_tx: crossbeam::channel::Sender<()>) {
    let _ = SERVER.set(server);
    let _ = SHUTDOWN_TX.set(shutdown_tx);
}

/// Request process shutdown: flag, cancel the actor runtime, unblock the
/// HTTP accept loop. Safe to call more than once and from any thread;
/// used by the Ctrl+C handler and by the fatal watch-error path.
pub fn request_shutdown() {
    SHUTDOWN.store(true, Ordering::SeqCst);

    if let Some(tx) = SHUTDOWN_TX.get() {
        let _ = tx.send(());
    }

    if let Some(server) = SERVER.get() {
        server.unblock();
    }
}

/// Check if shutdown has been requested
///
/// Uses Relaxed ordering for performance - worst case is processing
/// a few more items before stopping, which is acceptable
pub fn is_shutdown() -> bool {
    SHUTDOWN.load(Ordering::Relaxed)
}
