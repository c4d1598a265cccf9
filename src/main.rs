use clap::{Parser, Subcommand};
use dotenv::dotenv;
use onchain_agent_gateway::{
    agent::{model::OpenAiChatModel, AgentRuntime, AgentSettings},
    auth::Authenticator,
    config::Config,
    ethereum, modes,
    server::{self, AppState},
    tools::{faucet::FaucetTool, ToolContext, ToolRegistry},
    wallet::{Wallet, WalletHandle},
    wallet_store::{self, WalletStateStore},
};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(about = "Chat agent that supplies and withdraws ETH on Aave through its own wallet")]
struct Cli {
    #[command(subcommand)]
    mode: Option<Mode>,
}

#[derive(Subcommand)]
enum Mode {
    /// Serve the HTTP chat endpoint (default)
    Serve,
    /// Chat with the agent on stdin
    Chat,
    /// Let the agent act on its own at a fixed interval
    Auto {
        #[arg(long, default_value_t = 10)]
        interval: u64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    info!("Starting onchain agent...");

    let config = Config::from_env()?;
    let runtime = Arc::new(build_runtime(&config).await?);

    match cli.mode.unwrap_or(Mode::Serve) {
        Mode::Serve => {
            let auth = Authenticator::new(&config.jwt_secret, config.jwt_ttl);
            let state = AppState::new(
                runtime,
                auth,
                config.require_auth,
                &config.allowed_origin,
            )?;
            server::run(&config.bind_addr, Arc::new(state)).await?;
        }
        Mode::Chat => modes::run_chat_mode(&runtime).await?,
        Mode::Auto { interval } => {
            modes::run_autonomous_mode(&runtime, Duration::from_secs(interval)).await?
        }
    }

    Ok(())
}

async fn build_runtime(config: &Config) -> anyhow::Result<AgentRuntime> {
    let store = WalletStateStore::new(&config.wallet_data_file);
    let state = wallet_store::load_or_create(&store, config.network, config.private_key.as_deref())?;
    let network = state.network()?;

    let wallet = ethereum::connect(&state, &config.rpc_url_for(network), config.poll_interval).await?;
    info!("Wallet {} on {}", wallet.address(), network);

    let faucet = config
        .faucet_url
        .clone()
        .map(|url| FaucetTool::new(reqwest::Client::new(), url));
    let registry = ToolRegistry::standard(faucet)?;

    let model = OpenAiChatModel::new(
        &config.openai_base_url,
        &config.openai_api_key,
        &config.openai_model,
        config.model_timeout,
    )?;

    let tools = ToolContext {
        wallet: WalletHandle::new(wallet),
        confirmation_timeout: config.confirmation_timeout,
    };
    let settings = AgentSettings {
        default_thread_id: config.thread_id.clone(),
        max_iterations: config.max_iterations,
    };

    Ok(AgentRuntime::new(Arc::new(model), registry, tools, settings))
}
