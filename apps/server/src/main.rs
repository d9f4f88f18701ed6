use std::sync::Arc;

use tokio::sync::watch;

use fintrack_goal_server::{
    api::app_router, build_state, config::Config, consumer::run_consumer, init_tracing,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    init_tracing(config.log_format);
    let state = build_state(&config).await?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let consumer = tokio::spawn(run_consumer(
        Arc::new(state.consumer_deps(&config)),
        shutdown_rx,
    ));

    let router = app_router(state, &config);
    tracing::info!("Listening on {}", config.listen_addr);
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {}", e);
                std::future::pending::<()>().await;
            }
            tracing::info!("Shutdown requested");
            let _ = shutdown_tx.send(true);
        })
        .await?;

    consumer.await?;
    Ok(())
}
