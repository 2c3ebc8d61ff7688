use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use nudgeboard::api;
use nudgeboard::auth::AuthService;
use nudgeboard::config::{AuthMode, Config};
use nudgeboard::dataset::{DataService, LogReporter};
use nudgeboard::pipeline::FilterEngine;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Load configuration
    let config = Config::from_env()?;
    info!("Loaded configuration");

    // Initialize dataset loading
    let source = config.data.build_source()?;
    info!("Loading datasets from {}", source.describe());
    let data = Arc::new(DataService::new(
        source,
        config.data.paths(),
        Arc::new(LogReporter),
    ));

    let snapshot = data.load().await;
    if !snapshot.failures.is_empty() {
        warn!(
            "Started with {} dataset failure(s); affected views will be empty",
            snapshot.failures.len()
        );
    }

    let refresh_task = config.data.refresh_interval_secs.map(|secs| {
        info!("🔄 Reloading datasets every {}s", secs);
        data.spawn_refresh(Duration::from_secs(secs))
    });

    let engine = FilterEngine::new(config.data.open_end);
    info!("📅 Open-ended date ranges use policy '{}'", engine.open_end());

    // Initialize auth service
    let auth_config = config.auth.clone();
    let auth_service = Arc::new(AuthService::new(auth_config.clone()).await?);

    match auth_config.mode {
        AuthMode::None => {
            info!("🔓 Authentication is disabled - all API requests are allowed");
        }
        AuthMode::Oauth => {
            if let Some(oauth) = auth_config.oauth.as_ref() {
                info!(
                    "🔐 OAuth authentication enabled (issuer: {}, audience: {})",
                    oauth.issuer_url, oauth.audience
                );
            } else {
                info!("🔐 OAuth authentication enabled");
            }
            match auth_config.allowed_email_domain.as_deref() {
                Some(domain) => info!("   - Sign-in restricted to @{}", domain),
                None => warn!("   - No ALLOWED_EMAIL_DOMAIN set; any valid token is accepted"),
            }
        }
    }

    // Log frontend configuration
    if let Some(ref static_dir) = config.frontend.static_dir {
        info!("🎨 Serving frontend from directory: {}", static_dir);
    } else {
        info!("🎨 Serving embedded frontend");
    }

    let router = api::create_api_router(
        Arc::clone(&data),
        engine,
        auth_service,
        config.frontend.clone(),
    );

    let addr = format!("{}:{}", config.api_server.host, config.api_server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("🚀 Dashboard server listening on http://{}", addr);
    info!("   - API endpoints available at http://{}/api/...", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    data.shutdown();
    if let Some(task) = refresh_task {
        let _ = task.await;
    }
    info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
