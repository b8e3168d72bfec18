//! Development server with live reload support.
//!
//! Wires the subsystems together: mirror the source tree, start the
//! watcher and reload hub on a dedicated runtime, accept WebSocket
//! subscribers, and serve the mirror over HTTP until shutdown.

mod lifecycle;
mod path;
mod response;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tiny_http::{Request, Server};
use tokio::sync::mpsc;

use crate::config::ServeConfig;
use crate::embed::serve::StreamerVars;
use crate::mirror::Mirror;
use crate::reload::{self, ReloadHub};
use crate::watch::WatchActor;

/// Run the serve command until shutdown or setup failure.
pub fn run(config: ServeConfig) -> Result<()> {
    let mirror = Arc::new(Mirror::new(&config.source_dir)?);

    // Setup: create the watcher, walk and mirror the tree. Any failure
    // here is fatal and prevents serving entirely.
    let (reload_tx, reload_rx) = mpsc::channel(1);
    let watch_actor = WatchActor::new(Arc::clone(&mirror), reload_tx)
        .context("failed to build watched mirror")?;
    let hub = Arc::new(ReloadHub::new(reload_rx, config.delivery));

    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .context("failed to create tokio runtime")?;

    // The subscriber listener binds first: the emitted script must carry
    // the port that actually got bound.
    let ws_port = reload::start_ws_server(config.ws_port, Arc::clone(&hub), rt.handle().clone())?;
    mirror.write_streamer(&StreamerVars {
        scheme_suffix: config.scheme_suffix(),
        ws_port,
        ws_path: config.ws_path.clone(),
        force_reload: config.force_reload,
    })?;
    crate::debug!("reload"; "delta streamer socket: ws{}://127.0.0.1:{}{}",
        config.scheme_suffix(), ws_port, config.ws_path);

    let (server, addr) = lifecycle::bind_with_retry(config.port)?;
    let server = Arc::new(server);
    let (shutdown_tx, shutdown_rx) = crossbeam::channel::unbounded::<()>();
    crate::core::register_server(Arc::clone(&server), shutdown_tx);

    let watch_handle = lifecycle::spawn_watch(watch_actor, Arc::clone(&hub), rt, shutdown_rx);

    crate::log!("serve"; "serving '{}' on http://{}", mirror.source_root().display(), addr);
    crate::debug!("serve"; "mirror root: '{}'", mirror.mirror_root().display());

    run_request_loop(&server, &config, mirror.mirror_root());

    lifecycle::wait_for_shutdown(watch_handle);
    crate::log!("serve"; "shutdown complete");
    Ok(())
}

/// Accept requests until the server is unblocked by shutdown.
fn run_request_loop(server: &Server, config: &ServeConfig, mirror_root: &Path) {
    // Small pool so one slow read doesn't block other requests
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(4)
        .build()
        .expect("failed to create thread pool");

    for request in server.incoming_requests() {
        if crate::core::is_shutdown() {
            break;
        }

        let cache_control = config.cache_control.clone();
        let root = mirror_root.to_path_buf();
        pool.spawn(move || {
            if let Err(e) = handle_request(request, &cache_control, &root) {
                crate::log!("serve"; "request error: {e}");
            }
        });
    }
}

/// Handle a single HTTP request against the mirror tree.
fn handle_request(request: Request, cache_control: &str, mirror_root: &Path) -> Result<()> {
    crate::log!("serve"; "{} {}", request.method(), request.url());

    match path::resolve_path(request.url(), mirror_root) {
        Some(path) => response::respond_file(request, &path, cache_control),
        None => response::respond_not_found(request),
    }
}
