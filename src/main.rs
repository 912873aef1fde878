use anyhow::Context;

use enrollment_assist::cli;
use enrollment_assist::config::ServerConfig;
use enrollment_assist::enrollment::InitOptions;
use enrollment_assist::routes::enrollment_routes;
use enrollment_assist::session::{self, SessionRegistry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = ServerConfig::from_env()?;
    let addr = config.listen_addr();

    eprintln!("Enrollment Assist v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Sessions API: http://{}/api/enrollment/sessions", addr);
    eprintln!("   Funds API: http://{}/api/enrollment/funds", addr);
    eprintln!(
        "   Idle sessions expire after {} min",
        config.session_idle_timeout.as_secs() / 60
    );

    // ── Sessions ────────────────────────────────────────────────────────
    let registry = SessionRegistry::new();
    let _expiry_handle = session::spawn_expiry_task(
        registry.clone(),
        config.session_idle_timeout,
        config.sweep_interval,
    );

    // ── HTTP server ─────────────────────────────────────────────────────
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    let app = enrollment_routes(registry);
    tokio::spawn(async move {
        tracing::info!(addr = %addr, "Enrollment server started");
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!("Enrollment server stopped: {}", e);
        }
    });

    if config.cli_enabled {
        eprintln!("   Type a message and press Enter. /quit to exit.\n");
        cli::run_repl(InitOptions::default()).await?;
    } else {
        tokio::signal::ctrl_c().await?;
        tracing::info!("Shutting down");
    }

    Ok(())
}
