mod api;
mod commands;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;
use tracing::info;

use finsight_chat::GeminiChatClient;
use finsight_config::Config;
use finsight_core::DocType;
use finsight_store::DocumentStore;

use api::AppState;

#[derive(Parser)]
#[command(name = "finsight")]
#[command(about = "Financial document extraction, storage, export, and chat")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Port to bind the HTTP server to
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Show a running instance's health
    Status,
    /// Process a single document from disk and store the result
    Ingest {
        /// Path to a PDF, JPG, or PNG document
        file: PathBuf,
        /// Document type hint: invoice, receipt, general, or layout
        #[arg(long, default_value = "general")]
        doc_type: DocType,
    },
    /// Write the CSV export of all stored records
    Export {
        /// Output path; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Missing credentials are fatal here, before any command runs.
    let config = Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { port } => {
            let config = Config {
                port: port.unwrap_or(config.port),
                ..config
            };
            run_server(config).await?;
        }
        Commands::Status => {
            let client = reqwest::Client::new();
            match client
                .get(format!("http://localhost:{}/api/health", config.port))
                .send()
                .await
            {
                Ok(resp) => {
                    let body: serde_json::Value = resp.json().await?;
                    println!("{}", serde_json::to_string_pretty(&body)?);
                }
                Err(_) => {
                    println!("finsight is not running on port {}", config.port);
                }
            }
        }
        Commands::Ingest { file, doc_type } => {
            commands::ingest(&config, &file, doc_type).await?;
        }
        Commands::Export { output } => {
            commands::export(&config, output.as_deref())?;
        }
    }

    Ok(())
}

async fn run_server(config: Config) -> Result<()> {
    info!(
        port = config.port,
        bind = %config.bind_address,
        db = %config.db_path,
        "Starting finsight"
    );

    let store = DocumentStore::open(&config.db_path)?;
    let ocr = commands::build_ocr_client(&config)?;
    let chat = GeminiChatClient::new(
        &config.chat_api_key,
        &config.chat_model,
        config.request_timeout(),
    )?;

    let state = Arc::new(AppState {
        store: Mutex::new(store),
        ocr: Arc::new(ocr),
        chat: Arc::new(chat),
    });

    let app = api::build_router(state).layer(CorsLayer::permissive());

    let addr = format!("{}:{}", config.bind_address, config.port);
    let listener = TcpListener::bind(&addr).await?;
    info!(addr = %addr, "HTTP API listening");
    axum::serve(listener, app).await?;

    Ok(())
}
