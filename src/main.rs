use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use voice_assistant::voice::console;
use voice_assistant::{ApiServerBuilder, Config, GeminiClient, HttpRelay};

/// Voice Assistant - speak a question, hear the answer
#[derive(Parser)]
#[command(name = "voice-assistant", version, about)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the prompt relay (default)
    Serve {
        /// Port to listen on
        #[arg(long)]
        port: Option<u16>,
    },
    /// Chat with a relay from the terminal, one line per utterance
    Chat {
        /// Relay base URL
        #[arg(long)]
        relay_url: Option<String>,

        /// Command used to speak responses (e.g. "espeak")
        #[arg(long, env = "VOICE_SPEAK_WITH")]
        speak_with: Option<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,voice_assistant=info",
        1 => "info,voice_assistant=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load()?;
    tracing::debug!(?config, "loaded configuration");

    match cli.command.unwrap_or(Command::Serve { port: None }) {
        Command::Serve { port } => serve(config, port).await,
        Command::Chat {
            relay_url,
            speak_with,
        } => chat(&config, relay_url.as_deref(), speak_with).await,
    }
}

/// Run the relay until interrupted
async fn serve(mut config: Config, port: Option<u16>) -> anyhow::Result<()> {
    let api_key = config.provider.require_api_key()?;
    let generator = GeminiClient::new(
        api_key,
        config.provider.model.clone(),
        &config.provider.base_url,
    )?;

    let mut server = ApiServerBuilder::new(Arc::new(generator)).server_config(&config.server);
    if let Some(port) = port {
        server = server.port(port);
    }

    server.build().run().await?;
    Ok(())
}

/// Run the terminal voice client
async fn chat(config: &Config, relay_url: Option<&str>, speak_with: Option<String>) -> anyhow::Result<()> {
    let relay_url = match relay_url {
        Some(url) => voice_assistant::config::parse_url("relay URL", url)?,
        None => config.client.relay_url.clone(),
    };

    let relay = HttpRelay::new(&relay_url)?;
    tracing::info!(endpoint = %relay.endpoint(), "using relay");

    console::run_chat(Arc::new(relay), speak_with).await?;
    Ok(())
}
