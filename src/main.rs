use anyhow::Context;
use std::sync::Arc;
use tracing::info;

use blog_client_context::{
    shared::global,
    system::{logging, versioning::ApiVersion},
    AppConfig, LifecycleEvent, ProcessState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = AppConfig::load().context("Failed to load configuration")?;
    logging::init_tracing(&config.log);
    info!("=== BLOG CLIENT ===");
    info!("🌍 Environment: {}", config.environment);
    info!("📊 Log Level: {}", config.log.level);

    // Without its facilities the app cannot run; any failure exits non-zero
    let state = ProcessState::initialize(config)
        .await
        .context("Process bootstrap failed")?;
    global::install(Arc::clone(&state))?;

    state.handle_lifecycle(LifecycleEvent::Foregrounded).await?;

    info!("🏷️  Version: {}", state.version_name());
    info!("🧭 User agent: {}", state.user_agent());
    for version in ApiVersion::ALL {
        info!(
            "🔌 REST {}: {}",
            version,
            state.rest_client_for(version).endpoint_url()
        );
    }
    let locales = state.message_loader().get_available_locales().await?;
    info!("🗣️  Locales available: {}", locales.len());
    let context = state.localized_context();
    info!("💬 {}", context.text("app.ready"));

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;

    global::process().on_background();
    info!("👋 Shutting down");

    Ok(())
}
