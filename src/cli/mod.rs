use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde_json::json;

use crate::config::{AppConfig, Environment};
use crate::state::AppState;

#[derive(Parser, Debug)]
#[command(name = "donation-server")]
#[command(about = "Donation and media backend with a single admin login")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(about = "Start the HTTP server (default)")]
    Serve(ServeArgs),

    #[command(about = "Print a bcrypt hash suitable for ADMIN_PASSWORD_HASH")]
    HashPassword {
        #[arg(help = "Password to hash")]
        password: String,
        #[arg(long, default_value_t = bcrypt::DEFAULT_COST, help = "bcrypt cost factor (4-31)")]
        cost: u32,
    },
}

/// Flags override the matching environment variables.
#[derive(clap::Args, Debug, Default, Clone)]
pub struct ServeArgs {
    #[arg(long, help = "Bind address [env: HOST]")]
    pub host: Option<String>,
    #[arg(long, help = "Bind port [env: PORT]")]
    pub port: Option<u16>,
    #[arg(long, help = "Directory for collection files [env: DATA_DIR]")]
    pub data_dir: Option<PathBuf>,
    #[arg(long, help = "Directory for uploaded files [env: UPLOADS_DIR]")]
    pub uploads_dir: Option<PathBuf>,
    #[arg(long, help = "Base URL used in media links [env: PUBLIC_URL]")]
    pub public_url: Option<String>,
}

impl ServeArgs {
    pub fn apply(self, config: &mut AppConfig) {
        if let Some(host) = self.host {
            config.server.host = host;
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(dir) = self.data_dir {
            config.storage.data_dir = dir;
        }
        if let Some(dir) = self.uploads_dir {
            config.storage.uploads_dir = dir;
        }
        if let Some(url) = self.public_url {
            config.server.public_url = Some(url);
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command.unwrap_or(Commands::Serve(ServeArgs::default())) {
        Commands::Serve(args) => serve(args).await,
        Commands::HashPassword { password, cost } => {
            let hash = bcrypt::hash(password, cost)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&json!({ "hash": hash }))?);
            } else {
                println!("{hash}");
            }
            Ok(())
        }
    }
}

async fn serve(args: ServeArgs) -> anyhow::Result<()> {
    let mut config = AppConfig::from_env()?;
    args.apply(&mut config);
    config.validate()?;

    init_tracing(config.environment);
    tracing::info!("Starting donation server in {:?} mode", config.environment);

    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| anyhow::anyhow!("failed to bind {}: {}", bind_addr, e))?;

    crate::serve(AppState::new(config), listener, crate::shutdown_signal()).await
}

/// `RUST_LOG` wins; otherwise development logs at debug and production at info.
pub fn init_tracing(environment: Environment) {
    let default_filter = match environment {
        Environment::Development => "debug,tower_http=debug",
        Environment::Production => "info,tower_http=info",
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .try_init();
}
