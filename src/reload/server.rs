//! WebSocket accept loop for reload subscribers.
//!
//! Binds a TCP listener (retrying on busy ports) and hands every accepted
//! stream to the connection handler on the actor runtime. The handshake and
//! everything after it live in `client`; this module only produces the
//! stream of inbound connections.

use std::net::TcpListener;
use std::sync::Arc;

use anyhow::Result;

use super::client::handle_connection;
use super::hub::ReloadHub;

/// Maximum port retry attempts
const MAX_PORT_RETRIES: u16 = 10;

/// Start the subscriber accept loop.
///
/// Returns the actually bound port, which may differ from `base_port` when
/// that one was taken; the caller parameterizes the client script with it.
pub fn start_ws_server(
    base_port: u16,
    hub: Arc<ReloadHub>,
    handle: tokio::runtime::Handle,
) -> Result<u16> {
    let (listener, actual_port) = try_bind_port(base_port, MAX_PORT_RETRIES)?;
    listener.set_nonblocking(true)?;

    // Accept on a plain thread; connections run as tasks on the runtime.
    std::thread::spawn(move || {
        loop {
            match listener.accept() {
                Ok((stream, addr)) => {
                    crate::debug!("reload"; "client connected: {}", addr);

                    // Handshake and writes want blocking mode.
                    let _ = stream.set_nonblocking(false);
                    handle.spawn(handle_connection(Arc::clone(&hub), stream));
                }
                Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    if crate::core::is_shutdown() {
                        break;
                    }
                    std::thread::sleep(std::time::Duration::from_millis(100));
                }
                Err(e) => {
                    crate::log!("reload"; "accept error: {}", e);
                    std::thread::sleep(std::time::Duration::from_millis(100));
                }
            }
        }
    });

    Ok(actual_port)
}

/// Try binding to port, retry with incremented port if in use
fn try_bind_port(base_port: u16, max_retries: u16) -> Result<(TcpListener, u16)> {
    let mut last_error = None;

    for offset in 0..max_retries {
        let port = base_port.saturating_add(offset);
        match TcpListener::bind(format!("127.0.0.1:{}", port)) {
            Ok(listener) => {
                let actual_port = listener.local_addr()?.port();
                return Ok((listener, actual_port));
            }
            Err(e) => {
                last_error = Some(e);
                continue;
            }
        }
    }

    Err(anyhow::anyhow!(
        "failed to bind subscriber listener after {} attempts: {}",
        max_retries,
        last_error.map(|e| e.to_string()).unwrap_or_default()
    ))
}
