// Squadcast entry point.
//
// Startup sequence:
// 1. Initialize tracing (stderr, RUST_LOG overrides the default filter)
// 2. Load config
// 3. Open database and restore the saved squad
// 4. Build the stats and LLM clients
// 5. Serve the HTTP API until Ctrl+C

use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use squadcast_app::api::{self, ApiSettings, AppState, SquadStore};
use squadcast_app::stats::FplClient;
use squadcast_core::config;
use squadcast_core::db::Database;
use squadcast_llm::LlmClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize tracing
    init_tracing()?;
    info!("Squadcast starting up");

    // 2. Load config
    let config = config::load_config().context("failed to load configuration")?;
    info!(
        "Config loaded: stats API {}, budget {}, horizon {}",
        config.stats_api.base_url, config.squad.budget, config.predictions.horizon
    );

    // 3. Open database and restore the squad
    if let Some(parent) = config.db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create database directory {}", parent.display())
            })?;
        }
    }
    let db_path = config.db_path.to_string_lossy().to_string();
    let db = Database::open(&db_path).context("failed to open database")?;
    info!("Database opened at {db_path}");
    let squad = SquadStore::restore(db, config.squad.budget)?;

    // 4. Upstream clients
    let stats = FplClient::new(&config.stats_api).context("failed to build stats client")?;
    let llm = LlmClient::from_config(&config);
    match &llm {
        LlmClient::Active(client) => info!("LLM client initialized (model {})", client.model()),
        LlmClient::Disabled => info!("LLM client disabled (no API key)"),
    }

    let state = Arc::new(AppState::new(
        Arc::new(stats),
        squad,
        llm,
        ApiSettings::from(&config),
    ));

    // 5. Serve
    let addr = config.server.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Listening on http://{addr}");

    axum::serve(listener, api::create_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Squadcast shut down cleanly");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl+C: {e}");
        std::future::pending::<()>().await;
    }
}

fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("squadcast=info,tower_http=info,warn")),
        )
        .with_target(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
