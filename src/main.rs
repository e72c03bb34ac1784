use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tracing::info;

use finaura::analysis::{AnalysisMode, ReasoningOptions, ReasoningService, RemoteReasoning};
use finaura::chat::ChatSession;
use finaura::config::Config;
use finaura::gateway::DataGateway;
use finaura::ingest;
use finaura::llm::{LLMProviderConfig, LLM};
use finaura::settings::{CredentialStore, SettingsStorage};
use finaura::state::DashboardState;
use finaura::{create_router, utils, AppState};

#[derive(Parser, Debug)]
#[command(name = "finaura", version, about = "Financial forensic intelligence over tabular data")]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP API (default)
    Serve,
    /// Analyze one file and print the result as JSON
    Analyze {
        /// CSV, XLSX/XLS or JSON file
        file: PathBuf,
        /// full_audit, risk_modeling, growth_engine or tax_brain
        #[arg(long, default_value = "full_audit")]
        mode: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    utils::init_tracing();
    let args = Args::parse();

    let config = Config::from_env()?;
    info!("Configuration loaded: {:?}", config.server);

    let llm = LLM::new(LLMProviderConfig {
        name: config.llm.provider.clone(),
        api_base: config.llm.api_base.clone(),
    })?;
    let reasoning = Arc::new(RemoteReasoning::new(llm, ReasoningOptions::from(&config.llm)));
    let credentials = CredentialStore::initialize(
        SettingsStorage::with_path(config.storage.settings_dir.clone()),
        config.llm.default_api_key.as_deref(),
    )
    .await;

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config, reasoning, credentials).await,
        Command::Analyze { file, mode } => {
            let mode: AnalysisMode = mode.parse()?;
            let dataset = ingest::normalize_path(&file).await?;
            let credential = credentials.current().await;
            let result = reasoning
                .analyze(dataset.records(), mode, credential.as_ref())
                .await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }
    }
}

async fn serve(
    config: Config,
    reasoning: Arc<RemoteReasoning>,
    credentials: CredentialStore,
) -> anyhow::Result<()> {
    let dashboard = DashboardState::new();
    let gateway = DataGateway::new(dashboard, reasoning, credentials.clone());
    let state = AppState {
        config: config.clone(),
        gateway,
        credentials,
        chat: Arc::new(Mutex::new(ChatSession::mount(None, 0))),
    };

    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .with_context(|| format!("invalid listen address {}:{}", config.server.host, config.server.port))?;
    info!("Server listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    Ok(())
}
