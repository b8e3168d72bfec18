//! Serve configuration assembled from CLI arguments.

use std::path::PathBuf;

use clap::ValueEnum;

/// How the dispatcher hands an event to one subscriber.
///
/// `Block` is the historical behavior: delivery to each subscriber is a
/// blocking hand-off, so one stalled browser tab delays every subscriber
/// iterated after it for that event. `Drop` trades completeness for
/// liveness and discards the event for a subscriber whose channel is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum DeliveryPolicy {
    /// Blocking hand-off per subscriber (stalled subscriber stalls the rest).
    #[default]
    Block,
    /// Non-blocking hand-off, event dropped for a full subscriber channel.
    Drop,
}

/// Runtime configuration for the serve command.
#[derive(Debug, Clone)]
pub struct ServeConfig {
    /// Directory being served (the tree that gets mirrored).
    pub source_dir: PathBuf,
    /// HTTP port for the static file handler.
    pub port: u16,
    /// Port for the WebSocket reload listener.
    pub ws_port: u16,
    /// Request path clients use for the reload socket.
    pub ws_path: String,
    /// Reload every attached page on any change.
    pub force_reload: bool,
    /// Emit `wss://` in the client script (TLS terminated in front of us).
    pub tls: bool,
    /// Cache-Control header value for served files.
    pub cache_control: String,
    /// Per-subscriber delivery policy of the dispatcher.
    pub delivery: DeliveryPolicy,
}

impl ServeConfig {
    /// Scheme suffix for the client script (`""` or `"s"`).
    pub fn scheme_suffix(&self) -> &'static str {
        if self.tls { "s" } else { "" }
    }
}
