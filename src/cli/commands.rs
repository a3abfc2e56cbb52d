use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

use crate::app::App;
use crate::config::RuntimeConfig;
use crate::server::HttpServer;

/// Schema-driven CRUD service
#[derive(Debug, Parser)]
#[command(name = "crudhook", version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Serve every resource schema found under the service root
    Serve {
        /// Service root containing config.yml and the resources directory
        #[arg(short, long, default_value = ".", env = "CRUDHOOK_ROOT")]
        root: PathBuf,

        /// Bind address; overrides server.host/server.port from the config
        #[arg(long)]
        addr: Option<String>,
    },
    /// Print the route table that `serve` would expose
    Routes {
        /// Service root containing config.yml and the resources directory
        #[arg(short, long, default_value = ".", env = "CRUDHOOK_ROOT")]
        root: PathBuf,
    },
}

pub fn run_cli(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Serve { root, addr } => {
            let app = App::from_root(&root)?;
            let addr = addr.unwrap_or_else(|| app.config().bind_addr());
            serve(app, &addr)
        }
        Commands::Routes { root } => {
            let app = App::from_root(&root)?;
            for line in app.router().describe() {
                println!("{line}");
            }
            Ok(())
        }
    }
}

/// Configure the coroutine runtime, start the server on `addr`, and block until
/// the process is asked to stop.
pub fn serve(app: App, addr: &str) -> Result<()> {
    RuntimeConfig::from_env().apply();
    let service = app.into_service();
    let handle = HttpServer(service)
        .start(addr)
        .with_context(|| format!("Failed to start server on {addr}"))?;
    info!(addr = %handle.addr(), "crudhook ready");
    wait_for_shutdown(handle)
}

#[cfg(unix)]
fn wait_for_shutdown(handle: crate::server::ServerHandle) -> Result<()> {
    use signal_hook::consts::{SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;

    let mut signals =
        Signals::new([SIGINT, SIGTERM]).context("Failed to install signal handlers")?;
    if let Some(signal) = signals.forever().next() {
        info!(signal, "Shutdown signal received");
    }
    handle.stop();
    Ok(())
}

#[cfg(not(unix))]
fn wait_for_shutdown(handle: crate::server::ServerHandle) -> Result<()> {
    handle
        .join()
        .map_err(|e| anyhow::anyhow!("server coroutine panicked: {e:?}"))
}
