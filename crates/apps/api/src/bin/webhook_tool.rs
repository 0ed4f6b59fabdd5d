use app_state::load_app_settings;
use clap::{Parser, Subcommand};
use color_eyre::Result;
use color_eyre::eyre::eyre;
use common_services::telegram::TelegramClient;
use reqwest::Client;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Configures the bot's webhook so the gateway pushes photo updates to the
/// server instead of requiring polling.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Point the webhook at a public URL (e.g. https://your-domain/telegram-webhook).
    Setup { url: String },
    /// Remove the webhook configuration.
    Delete,
    /// Show the current webhook state.
    Info,
}

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    color_eyre::install()?;

    let settings = load_app_settings()?;
    let client = TelegramClient::from_settings(Client::new(), &settings.telegram)
        .ok_or_else(|| eyre!("no bot token configured, set telegram.bot_token first"))?;

    match Args::parse().command {
        Command::Setup { url } => {
            client.set_webhook(&url).await?;
            let info = client.webhook_info().await?;
            println!("{}", serde_json::to_string_pretty(&info)?);
        }
        Command::Delete => client.delete_webhook().await?,
        Command::Info => {
            let info = client.webhook_info().await?;
            println!("{}", serde_json::to_string_pretty(&info)?);
        }
    }

    Ok(())
}
