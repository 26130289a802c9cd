//! Qwen3 Voice API CLI
//!
//! Runs the HTTP server and inspects its configuration and voice library.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use qwen3_voice_api::engine::BackendKind;
use qwen3_voice_api::server::{ServerConfig, TtsServer};
use qwen3_voice_api::voice::{CustomVoiceStore, NATIVE_VOICES};
use qwen3_voice_api::{SERVICE_NAME, VERSION};

/// Qwen3 Voice API - local HTTP service for Qwen3-TTS
#[derive(Parser, Debug)]
#[command(name = "qwen3-voice-api")]
#[command(author, version, about, long_about = None)]
#[command(long_about = "
Local HTTP API for the Qwen3-TTS model family.

Examples:
  # Serve with a model worker on the default address
  qwen3-voice-api serve --config server.yaml

  # Serve without a model worker (synthetic tones, for development)
  qwen3-voice-api serve --offline --port 9000

  # Print the default configuration
  qwen3-voice-api config > server.yaml
")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Path to a YAML config file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Address to bind
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// Custom voices directory
        #[arg(long)]
        voices_dir: Option<PathBuf>,

        /// Model worker base URL
        #[arg(long)]
        backend_url: Option<String>,

        /// Use the built-in offline backend instead of a model worker
        #[arg(long)]
        offline: bool,
    },

    /// List native and custom voices
    Voices {
        /// Path to a YAML config file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Custom voices directory
        #[arg(long)]
        voices_dir: Option<PathBuf>,
    },

    /// Print the default configuration as YAML
    Config,
}

fn load_config(path: Option<&PathBuf>) -> Result<ServerConfig> {
    match path {
        Some(path) => ServerConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => Ok(ServerConfig::default()),
    }
}

fn setup_logging(verbose: bool, level: &str) {
    let level = if verbose { "debug" } else { level };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            config,
            host,
            port,
            voices_dir,
            backend_url,
            offline,
        } => {
            let mut config = load_config(config.as_ref())?;
            setup_logging(cli.verbose, &config.logging.level);
            info!("{} v{}", SERVICE_NAME, VERSION);

            if let Some(host) = host {
                config.host = host;
            }
            if let Some(port) = port {
                config.port = port;
            }
            if let Some(dir) = voices_dir {
                config.storage.voices_dir = dir;
            }
            if let Some(url) = backend_url {
                config.backend.base_url = url;
                config.backend.kind = BackendKind::Remote;
            }
            if offline {
                config.backend.kind = BackendKind::Offline;
            }

            let server = TtsServer::new(config).context("Failed to initialize server")?;
            server.run().await.context("Server stopped")?;
            Ok(())
        }

        Commands::Voices { config, voices_dir } => {
            let mut config = load_config(config.as_ref())?;
            setup_logging(cli.verbose, "warn");
            if let Some(dir) = voices_dir {
                config.storage.voices_dir = dir;
            }

            println!("Native voices:");
            for voice in NATIVE_VOICES.iter() {
                println!(
                    "  {:<10} {:<7} {:<10} {}",
                    voice.name,
                    format!("{:?}", voice.gender).to_lowercase(),
                    voice.native_language,
                    voice.description
                );
            }

            let store = CustomVoiceStore::open(
                &config.storage.voices_dir,
                config.limits.max_description_chars,
            )
            .context("Failed to open custom voices directory")?;
            println!("\nCustom voices ({}):", store.root().display());
            if store.is_empty() {
                println!("  (none)");
            }
            for meta in store.list() {
                println!(
                    "  {:<20} {:<7} {:<5} {:<3} {}",
                    meta.name,
                    meta.source.as_str(),
                    meta.model.as_str(),
                    meta.language,
                    meta.description
                );
            }
            Ok(())
        }

        Commands::Config => {
            print!("{}", ServerConfig::default().to_yaml()?);
            Ok(())
        }
    }
}
