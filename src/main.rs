use clap::Parser;
use crudhook::cli::{run_cli, Cli};
use crudhook::logging::{init_logging, LogConfig};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _log_guard = init_logging(&LogConfig::from_env())?;
    run_cli(cli)
}
