use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::info;

use leaveline_notify::{
    native, DeliveryRouter, HostedApiChannel, MessagingSession, NativeChannel, NotifyChannel,
    RecordingChannel, UnpairedSession,
};

mod app;
mod http;
mod ws;

#[derive(Parser, Debug)]
#[command(name = "leaveline-gateway", about = "Leave management gateway")]
struct Args {
    /// Path to leaveline.toml (default: ~/.leaveline/leaveline.toml).
    #[arg(long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "leaveline_gateway=info,leaveline_notify=info,tower_http=debug".into()),
        )
        .init();

    let args = Args::parse();
    let config = leaveline_core::config::LeavelineConfig::load(args.config.as_deref())
        .unwrap_or_else(|e| {
            tracing::warn!("Config load failed ({}), using defaults", e);
            leaveline_core::config::LeavelineConfig::default()
        });

    let db_path = &config.database.path;
    ensure_parent_dir(db_path);
    info!(path = %db_path, "opening SQLite database");

    let db = rusqlite::Connection::open(db_path)?;
    db.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    leaveline_store::db::init_db(&db)?;
    info!("database migrations complete");

    let store = leaveline_store::LeaveStore::new(db);

    // Notification channels in priority order. The native session is a
    // placeholder until a real client integration is wired in; the
    // recording sink guarantees no message is ever dropped.
    let session: Arc<dyn MessagingSession> = Arc::new(UnpairedSession);
    let hosted = Arc::new(HostedApiChannel::new(config.notify.hosted.clone()));
    let recording = Arc::new(RecordingChannel::new());

    let channels: Vec<Arc<dyn NotifyChannel>> = vec![
        Arc::new(NativeChannel::new(Arc::clone(&session))),
        Arc::clone(&hosted) as Arc<dyn NotifyChannel>,
        Arc::clone(&recording) as Arc<dyn NotifyChannel>,
    ];
    let notifier = DeliveryRouter::new(channels)
        .with_send_timeout(Some(Duration::from_millis(config.notify.send_timeout_ms)));

    // Startup lifecycle: hosted credentials are validated exactly once;
    // the native session is supervised at a fixed interval.
    tokio::spawn({
        let hosted = Arc::clone(&hosted);
        async move { hosted.validate_credentials().await }
    });
    tokio::spawn(native::supervise(
        session,
        Duration::from_secs(config.notify.session_retry_secs),
    ));

    let bind = format!("{}:{}", config.gateway.bind, config.gateway.port);
    let state = Arc::new(app::AppState::new(config, store, notifier, recording));
    let router = app::build_router(state);

    info!(addr = %bind, "leaveline gateway listening");
    let listener = tokio::net::TcpListener::bind(&bind).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutdown signal received");
}

fn ensure_parent_dir(path: &str) {
    if let Some(parent) = std::path::Path::new(path).parent() {
        let _ = std::fs::create_dir_all(parent);
    }
}
