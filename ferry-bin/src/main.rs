use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use ferry_config::{ConfigLoader, FerryConfig};
use ferry_llm::GeminiProvider;
use ferry_mcp::{McpSession, SseConfig, StdioConfig, TransportConfig};
use ferry_runtime::Coordinator;

#[derive(Parser)]
#[command(name = "ferry", version, about = "Chat ↔ LLM ↔ workspace coordinator")]
struct Cli {
    /// Path to ferry.toml (defaults to FERRY_CONFIG or ~/.ferry/ferry.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("❌ Error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let loader = ConfigLoader::load(cli.config.as_deref())?;
    let config = loader.get();

    init_tracing(&config, cli.log_level.as_deref());

    let api_key = match &config.llm.api_key {
        Some(key) => key.clone(),
        None => {
            warn!("no GEMINI_API_KEY configured; generation calls will fail");
            String::new()
        }
    };
    let llm = Arc::new(
        GeminiProvider::new(api_key, config.llm.model.clone())
            .with_base_url(config.llm.base_url.clone()),
    );

    // Both sessions are mandatory: either one failing to connect or to
    // complete its handshake aborts startup.
    info!(command = config.docs.command.as_str(), "connecting to docs backend over stdio");
    let docs = Arc::new(
        McpSession::connect(
            "docs",
            &TransportConfig::Stdio(StdioConfig {
                command: config.docs.command.clone(),
                args: config.docs.args.clone(),
                working_dir: config.docs.working_dir.clone(),
                env: config.docs.env.clone(),
            }),
        )
        .await?,
    );

    info!(url = config.chat.sse_url.as_str(), "connecting to chat backend over sse");
    let chat = Arc::new(
        McpSession::connect(
            "chat",
            &TransportConfig::Sse(SseConfig {
                url: config.chat.sse_url.clone(),
            }),
        )
        .await?,
    );

    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown signal received");
            signal_cancel.cancel();
        }
    });

    let mut coordinator = Coordinator::new(chat.clone(), docs.clone(), llm, config);
    coordinator.run(cancel).await;

    chat.shutdown();
    docs.shutdown();
    Ok(())
}

fn init_tracing(config: &FerryConfig, override_level: Option<&str>) {
    let log_level = override_level
        .unwrap_or(&config.logging.level)
        .to_string();

    if config.logging.format == "json" {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
            )
            .json()
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
            )
            .with_target(false)
            .init();
    }
}
