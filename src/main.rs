use qrflash::config::Config;
use qrflash::subscriber::Subscriber;
use qrflash::web::start_http_server;
use qrflash::QrFlashEngine;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level)),
        )
        .init();

    let engine = QrFlashEngine::new(&config);
    tracing::info!(
        window_secs = config.slot.visibility_window.as_secs(),
        strategy = config.artifact.strategy.as_str(),
        "🚀 qrflash starting"
    );

    let subscriber = Subscriber::from_config(&config.broker);
    let slots = engine.slots.clone();
    tokio::spawn(async move {
        // Readers keep being served after the feed stops; live codes still expire on time.
        if let Err(e) = subscriber.run(slots).await {
            tracing::error!("Subscriber stopped: {}", e);
        }
    });

    start_http_server(engine, &config.server.addr(), shutdown_signal()).await?;
    tracing::info!("qrflash stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
