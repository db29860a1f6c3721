// Keeps the tray agent from opening a console window on Windows. Disable during development to
// see stdout.
#![windows_subsystem = "windows"]

use anyhow::Result;
use clap::Parser;
use ticker::{
    agent::{args::AgentArgs, start_agent},
    utils::{
        dir::TickerPaths,
        logging::{enable_logging, AGENT_PREFIX},
    },
};
use tracing::error;

fn main() -> Result<()> {
    let args = AgentArgs::parse();
    let paths = TickerPaths::resolve()?;
    enable_logging(
        AGENT_PREFIX,
        &paths.diagnostics_dir,
        args.log,
        args.log_console,
    )?;

    start_agent(paths).inspect_err(|e| {
        error!("Error running agent {e:?}");
    })
}
