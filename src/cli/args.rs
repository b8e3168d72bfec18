//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::DeliveryPolicy;

/// mira live-reloading static file server CLI
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Serve a directory with live reload
    #[command(visible_alias = "s")]
    Serve {
        /// Directory to serve (defaults to the current working directory)
        #[arg(value_hint = clap::ValueHint::DirPath)]
        dir: Option<PathBuf>,

        /// Port to serve the http server on
        #[arg(short, long, default_value_t = 8080)]
        port: u16,

        /// Base port for the reload WebSocket listener (retries upward when taken)
        #[arg(long, default_value_t = 35900)]
        ws_port: u16,

        /// Path the delta streamer WebSocket is hosted on
        #[arg(long, default_value = "/delta-streamer-ws")]
        ws_path: String,

        /// Reload all attached browser pages on any file change
        #[arg(short, long)]
        force_reload: bool,

        /// Emit wss:// in the client script (TLS terminated in front of mira)
        #[arg(long)]
        tls: bool,

        /// Cache-Control header value for served files
        #[arg(long, default_value = "no-cache")]
        cache_control: String,

        /// How the dispatcher hands events to a slow subscriber
        #[arg(long, value_enum, default_value = "block")]
        delivery: DeliveryPolicy,
    },
}
