use anyhow::Context;
use clap::{Parser, Subcommand};
use shelf_kernel::settings::Settings;

/// Operate the shelf book catalog service.
#[derive(Debug, Parser)]
#[command(name = "shelfctl", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP API until interrupted
    Serve,
    /// Apply database migrations and exit
    Migrate,
    /// Print the effective configuration with secrets redacted
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = Settings::load().with_context(|| "failed to load shelf settings")?;
    shelf_telemetry::init(&settings.telemetry)?;

    tracing::info!(env = ?settings.environment, command = ?cli.command, "shelfctl starting");

    match cli.command {
        Command::Serve => shelf_app::serve(settings).await,
        Command::Migrate => shelf_app::migrate(settings).await,
        Command::Config => {
            let rendered = serde_json::to_string_pretty(&settings.redacted())
                .context("failed to render configuration")?;
            println!("{rendered}");
            Ok(())
        }
    }
}
