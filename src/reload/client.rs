//! Per-connection subscriber handling.

use std::net::TcpStream;
use std::sync::Arc;

use tokio::sync::mpsc;
use tungstenite::WebSocket;
use tungstenite::protocol::Message;
use tungstenite::protocol::frame::CloseFrame;
use tungstenite::protocol::frame::coding::CloseCode;

use super::hub::{ReloadHub, SubscriberId};
use super::ChangeEvent;

/// Handle one accepted transport connection for its whole lifetime.
///
/// Performs the WebSocket server handshake (a failure here is isolated to
/// this connection), attaches a fresh subscriber to the hub, and blocks
/// until the forwarding task finishes - because the dispatcher closed the
/// channel, or because a send to the peer failed. Then the subscriber is
/// detached and the socket closed with a normal closure.
///
/// Reconnection is the client's business; none is attempted here.
pub async fn handle_connection(hub: Arc<ReloadHub>, stream: TcpStream) {
    let ws = match tungstenite::accept(stream) {
        Ok(ws) => ws,
        Err(e) => {
            crate::log!("reload"; "handshake failed: {}", e);
            return;
        }
    };

    let id = SubscriberId::next();
    // Capacity 1 is the closest tokio equivalent of an unbuffered channel:
    // the dispatcher's hand-off parks until this forwarder picks it up.
    let (tx, rx) = mpsc::channel::<ChangeEvent>(1);

    let forwarder = tokio::spawn(forward_events(rx, ws));
    hub.register(id, tx);
    crate::debug!("reload"; "subscriber {} attached", id);

    // Block until the forwarder is done, whichever way it ended.
    let ws = forwarder.await;
    hub.deregister(id);

    if let Ok(mut ws) = ws {
        let _ = ws.close(Some(CloseFrame {
            code: CloseCode::Normal,
            reason: "".into(),
        }));
    }
    crate::debug!("reload"; "subscriber {} detached", id);
}

/// Forward every received event onto the socket as a text message carrying
/// the changed resource's path.
///
/// Exits when the channel is closed by the dispatcher or a write fails;
/// returns the socket so the handler can close it properly.
async fn forward_events(
    mut rx: mpsc::Receiver<ChangeEvent>,
    mut ws: WebSocket<TcpStream>,
) -> WebSocket<TcpStream> {
    while let Some(event) = rx.recv().await {
        if let Err(e) = ws.send(Message::Text(event.path().to_string().into())) {
            crate::debug!("reload"; "send failed, dropping subscriber: {}", e);
            break;
        }
    }
    ws
}
