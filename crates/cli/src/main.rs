mod check_commands;
mod run_commands;

use std::path::PathBuf;

use {
    clap::{Parser, Subcommand},
    tracing::info,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(
    name = "onair",
    version,
    about = "onair: mirror a Twitch broadcast into one Telegram channel post"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Config file (default: onair.{toml,yaml,yml,json} in ./ or ~/.config/onair/).
    #[arg(long, global = true, env = "ONAIR_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll the broadcast and keep the channel post in sync (default).
    Run,
    /// Validate the configuration file and report errors/warnings.
    Check,
    /// Fetch the stream once and print the caption that would be posted.
    Preview,
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    info!(version = env!("CARGO_PKG_VERSION"), "onair starting");

    let config = cli.config.as_deref();
    match cli.command {
        None | Some(Commands::Run) => run_commands::run(config).await,
        Some(Commands::Check) => check_commands::check(config),
        Some(Commands::Preview) => run_commands::preview(config).await,
    }
}
