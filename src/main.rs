use anyhow::Context;
use dotenv::dotenv;
use tracing::info;

use clinic_scheduler::{
    app::create_router,
    app_state::AppState,
    config,
    scheduling::clock::format_clock,
    telemetry::{init_telemetry, TelemetryConfig},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let telemetry = init_telemetry(Some(TelemetryConfig::default()))
        .await
        .context("Failed to initialize telemetry")?;

    let env = config::init().context("Failed to load configuration")?.clone();
    let addr = env.server_addr();
    let app_name = env.app.name.clone();
    info!(
        open = %format_clock(env.schedule.open),
        close = %format_clock(env.schedule.close),
        slot_minutes = env.schedule.slot_minutes,
        "Clinic day configured"
    );

    let state = AppState::from_config(env)
        .await
        .context("Failed to build application state")?;
    let app = create_router(state);

    info!("{} Listening on {}", app_name, addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Failed to serve application")?;

    telemetry.shutdown().await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to listen for shutdown signal");
    }
    info!("Shutdown signal received");
}
