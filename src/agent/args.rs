use clap::Parser;
use tracing::level_filters::LevelFilter;

#[derive(Parser, Debug)]
#[command(name = "ticker", version)]
#[command(about = "Logs session lock/unlock events and ad-hoc tasks to TickerLog.csv", long_about = None)]
pub struct AgentArgs {
    /// This option is for debugging purposes only.
    #[arg(long = "log-console")]
    pub log_console: bool,
    #[arg(long = "log-filter")]
    pub log: Option<LevelFilter>,
}
