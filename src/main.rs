use std::error::Error;
use std::path::PathBuf;

use tokio::net::TcpListener;
use tokio::signal;
use tutormarket::config::Configuration;
use tutormarket::telemetry;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    telemetry::setup_logging();

    let mut config = Configuration::default();
    if let Ok(path) = std::env::var("CONFIG_PATH") {
        config = config.path(PathBuf::from(path));
    }
    let config = config.read()?;

    let metrics = if config.metrics {
        Some(telemetry::setup_metrics_recorder()?)
    } else {
        None
    };

    let state = tutormarket::initialize_state(config.clone(), metrics).await?;
    let app = tutormarket::app(state);

    let listener = TcpListener::bind(&config.address).await?;
    tracing::info!(address = %config.address, name = %config.name, "server is listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Resolve on `Ctrl+C` or `SIGTERM`.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for Ctrl+C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            },
            Err(err) => {
                tracing::error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutting down");
}
