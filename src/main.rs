use anyhow::Result;
use std::net::SocketAddr;
use tracing::{error, info};
use tracing_subscriber::prelude::*;

use codelang_detect::{config, server, state};

#[tokio::main]
async fn main() -> Result<()> {
    // CODELANG_LOG_DIR, else the per-user data dir
    let log_dir = std::env::var("CODELANG_LOG_DIR").unwrap_or_else(|_| {
        dirs::data_local_dir()
            .map(|d| d.join("codelang-detect").join("logs").to_string_lossy().to_string())
            .unwrap_or_else(|| ".codelang-data/logs".to_string())
    });
    std::fs::create_dir_all(&log_dir).ok();

    // codelang-detect.log, one file per day
    let file_appender = tracing_appender::rolling::daily(&log_dir, "codelang-detect.log");
    let (non_blocking_writer, _guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "codelang_detect=info,tower_http=info".into());

    // Stdout for the editor that spawned the sidecar
    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .compact();

    // Same events to the rolling file, without ANSI colours
    let file_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false)
        .with_writer(non_blocking_writer)
        .compact();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    // Panics in handlers or the batch pool go to the log before unwinding
    let default_panic = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let location = info
            .location()
            .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()))
            .unwrap_or_default();
        let payload = if let Some(s) = info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic payload".to_string()
        };
        error!(target: "codelang_detect::panic", location = %location, payload = %payload, "PANIC: thread panicked");
        default_panic(info);
    }));

    let config = config::AppConfig::from_env();
    let addr: SocketAddr = config.listen_addr.parse()?;

    info!(
        listen_addr = %config.listen_addr,
        max_input_bytes = config.max_input_bytes,
        max_batch_items = config.max_batch_items,
        max_body_bytes = config.max_body_bytes,
        auth = config.auth_token.is_some(),
        catalog = config.catalog_path.as_deref().unwrap_or("<builtin>"),
        log_dir = %log_dir,
        "codelang-detect starting"
    );

    let app_state = state::AppState::new(config)?;
    info!(
        languages = app_state.detector.catalog().len(),
        signals = app_state.detector.signals().len(),
        "Detector ready"
    );

    let app_state_shutdown = app_state.clone();
    let app = server::create_app(app_state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("codelang-detect listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(app_state_shutdown))
        .await?;

    info!("codelang-detect shutdown complete");
    Ok(())
}

async fn shutdown_signal(app_state: state::AppState) {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    // Windows has no SIGTERM. Editors stop the sidecar with POST /shutdown.
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => { info!("Received Ctrl+C, initiating shutdown"); },
        _ = terminate => { info!("Received terminate signal, initiating shutdown"); },
        _ = app_state.wait_for_shutdown() => { info!("Received HTTP shutdown request, initiating shutdown"); },
    }
}
