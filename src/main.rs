//! mira - a live-reloading static file server.
//!
//! Mirrors the served directory into a scratch tree with a reload script
//! injected into every HTML document, watches the original for changes,
//! and streams change notifications to attached browser tabs over
//! WebSocket.

mod cli;
mod config;
mod core;
mod embed;
mod logger;
mod mirror;
mod reload;
mod utils;
mod watch;

use anyhow::Result;
use clap::{ColorChoice, Parser};

use cli::{Cli, Commands};
use config::ServeConfig;

fn main() -> Result<()> {
    // Setup global Ctrl+C handler (before any blocking operations)
    core::setup_shutdown_handler()?;

    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    logger::set_verbose(cli.verbose);

    match cli.command {
        Commands::Serve {
            dir,
            port,
            ws_port,
            ws_path,
            force_reload,
            tls,
            cache_control,
            delivery,
        } => {
            let source_dir = match dir {
                Some(dir) => dir,
                None => std::env::current_dir()?,
            };

            cli::serve::run(ServeConfig {
                source_dir,
                port,
                ws_port,
                ws_path,
                force_reload,
                tls,
                cache_control,
                delivery,
            })
        }
    }
}
