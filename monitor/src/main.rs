use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use monitor::api::{create_router, AppState};
use monitor::config::Config;

#[derive(Parser)]
#[command(name = "monitor")]
#[command(about = "Operational dashboards for the data.gouv.fr platform")]
struct Args {
    /// Address to bind, overriding MONITOR_HOST
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on, overriding MONITOR_PORT
    #[arg(long)]
    port: Option<u16>,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "monitor=info,tower_http=debug".into()),
        )
        .with(args.json_logs.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!args.json_logs).then(tracing_subscriber::fmt::layer))
        .init();

    let mut config = Config::from_env();
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    if config.server.api_keys.is_empty() {
        tracing::warn!(
            "MONITOR_API_KEYS is not set: every dashboard route answers 401. Set MONITOR_API_KEYS to enable access."
        );
    }
    if config.catalog.api_key.is_none() {
        tracing::warn!("DATAGOUV_API_KEY is not set: member emails and write-back actions will fail");
    }

    let addr = format!("{}:{}", config.server.host, config.server.port);
    tracing::info!(
        "Reading snapshots from {}/{}/{}",
        config.storage.endpoint,
        config.storage.bucket,
        config.storage.folder
    );

    let state = AppState::new(config)?;
    let app = create_router(state);

    tracing::info!("Monitor starting on http://{}", addr);
    tracing::info!("  Health check: http://{}/api/v1/health", addr);
    tracing::info!("  API docs:     http://{}/api/v1/docs", addr);
    tracing::info!("  OpenAPI spec: http://{}/api/v1/openapi.json", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, draining connections...");
}
