use std::sync::Arc;

use time_llm_mcp::{
    build_app,
    capabilities::{DashScopeGenerator, PlaceholderGenerator, SystemClock, TextGenerator},
    config::Config,
    logging, AppState,
};
use tokio::signal;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_logging();

    let config = Config::from_env()?;
    let bind_socket = config.bind_socket()?;

    let generator: Arc<dyn TextGenerator> = match config.dashscope_api_key.clone() {
        Some(api_key) => Arc::new(DashScopeGenerator::with_config(
            api_key,
            Some(config.dashscope_base_url.clone()),
            Some(config.default_model.clone()),
        )),
        None => {
            warn!("DASHSCOPE_API_KEY not configured, generate_text uses placeholder output");
            Arc::new(PlaceholderGenerator)
        }
    };
    let clock = Arc::new(SystemClock::new(config.timezone));

    let state = AppState::from_config(&config, clock, generator)?;
    let app = build_app(state);
    let listener = tokio::net::TcpListener::bind(bind_socket).await?;

    info!(
        bind_addr = %config.bind_addr,
        bind_port = config.bind_port,
        timezone = %config.timezone,
        "server starting"
    );

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received SIGINT, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}
