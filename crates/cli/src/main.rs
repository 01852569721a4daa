mod config;
mod error;
mod server;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::Local;
use clap::{Parser, Subcommand};
use runtime::tools::builtin::default_registry;
use runtime::{Assistant, Dispatcher, ModelBackend, TurnRequest};
use storage::{AuditRecord, AuditStore};
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::Config;
use error::{Error, Result};

#[derive(Parser)]
#[command(name = "parley")]
#[command(about = "A tool-calling assistant for weather, news and currency questions", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to the config file (default: ./parley.toml if present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP chat service
    Serve {
        /// Listen address, overrides server.addr
        #[arg(long)]
        addr: Option<String>,
    },
    /// Run a single turn and print the outcome as JSON
    Ask {
        /// The user message
        #[arg(short, long)]
        message: String,
        #[arg(short, long, default_value = "cli_user")]
        user_id: String,
    },
    /// Show recent function calls from the audit log
    Logs {
        /// Show only the last N calls
        #[arg(short, long, default_value = "20")]
        limit: usize,
        /// Filter by function name
        #[arg(short, long)]
        function: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::resolve(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve { addr } => cmd_serve(config, addr).await,
        Commands::Ask { message, user_id } => cmd_ask(config, user_id, message).await,
        Commands::Logs { limit, function } => cmd_logs(&config, limit, function.as_deref()),
    }
}

async fn cmd_serve(config: Config, addr: Option<String>) -> Result<()> {
    let addr = addr.unwrap_or_else(|| config.server.addr.clone());
    let addr: SocketAddr = addr
        .parse()
        .map_err(|e: std::net::AddrParseError| Error::InvalidAddr {
            addr: addr.clone(),
            reason: e.to_string(),
        })?;

    let assistant = build_assistant(&config)?;
    server::serve(addr, server::router(Arc::new(assistant))).await?;
    Ok(())
}

async fn cmd_ask(config: Config, user_id: String, message: String) -> Result<()> {
    let assistant = build_assistant(&config)?;
    let outcome = assistant
        .handle_turn(&TurnRequest::new(user_id, message))
        .await?;
    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}

fn cmd_logs(config: &Config, limit: usize, function: Option<&str>) -> Result<()> {
    let path = &config.audit.db_path;
    if !path.exists() {
        return Err(Error::DatabaseNotFound { path: path.clone() });
    }

    let store = AuditStore::open(path)?;
    let records = store.recent(limit, function)?;
    if records.is_empty() {
        println!("No function calls recorded.");
        return Ok(());
    }

    for record in &records {
        print_record(record);
    }
    Ok(())
}

fn print_record(record: &AuditRecord) {
    let time = record
        .timestamp
        .with_timezone(&Local)
        .format("%Y-%m-%d %H:%M:%S");
    println!("[{time}] {}", record.function_name);
    println!("  args:   {}", record.arguments);

    let result = record.result.to_string();
    // Keep long provider payloads readable.
    if result.chars().count() > 200 {
        let head: String = result.chars().take(200).collect();
        println!("  result: {head}...");
    } else {
        println!("  result: {result}");
    }
}

fn build_assistant(config: &Config) -> Result<Assistant<ModelBackend>> {
    let registry = default_registry(&config.tools).map_err(|e| Error::Tools(e.to_string()))?;
    let audit = Arc::new(AuditStore::open(&config.audit.db_path)?);
    let backend = ModelBackend::from_settings(&config.model)?;

    info!(
        backend = %backend,
        tools = registry.len(),
        audit_db = %config.audit.db_path.display(),
        "assistant ready"
    );
    Ok(Assistant::new(backend, Dispatcher::new(Arc::new(registry), audit)))
}
