use anyhow::Context;
use clap::{Parser, Subcommand};
use stacks_kernel::settings::Settings;

/// Library catalog service
#[derive(Debug, Parser)]
#[command(name = "stacks", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Apply migrations and serve HTTP until interrupted (default)
    Serve,
    /// Apply pending migrations and exit
    Migrate,
    /// Print the effective settings as JSON
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = Settings::load().context("failed to load STACKS settings")?;
    stacks_telemetry::init(&settings.telemetry)?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => stacks_app::run(settings).await,
        Command::Migrate => {
            let applied = stacks_app::migrate(&settings).await?;
            tracing::info!(applied, "database is up to date");
            Ok(())
        }
        Command::Config => {
            let rendered = serde_json::to_string_pretty(&settings)
                .context("failed to render settings")?;
            println!("{rendered}");
            Ok(())
        }
    }
}
