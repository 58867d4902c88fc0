//! Bazaar Worker - Background maintenance loops.
//!
//! Runs four independent loops against the API database:
//!
//! | Loop | Period | Work |
//! |---|---|---|
//! | email | 10 s | heartbeat |
//! | notification | 15 s | purge expired and revoked refresh tokens |
//! | inventory | 30 s | report products at or below `LOW_STOCK_THRESHOLD` |
//! | order | 5 s | report the pending order backlog |
//!
//! Ctrl-C or SIGTERM flips a watch channel; every loop finishes its current
//! pass and exits.

#![cfg_attr(not(test), forbid(unsafe_code))]

mod config;
mod jobs;

use config::WorkerConfig;
use sentry::integrations::tracing as sentry_tracing;
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &WorkerConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            sample_rate: config.sentry_sample_rate,
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    let config = WorkerConfig::from_env().expect("Failed to load configuration");

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "bazaar_worker=info,bazaar_api=info".into());

    let json_layer = config
        .is_production
        .then(|| tracing_subscriber::fmt::layer().json().flatten_event(true));
    let text_layer = (!config.is_production).then(tracing_subscriber::fmt::layer);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let pool = bazaar_api::db::create_pool(&config.database_url)
        .await
        .expect("Failed to create database pool");
    tracing::info!("Database pool created");

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let threshold = config.low_stock_threshold;

    let mut workers = tokio::task::JoinSet::new();

    workers.spawn(jobs::run_every(
        "email",
        jobs::EMAIL_PERIOD,
        shutdown_rx.clone(),
        || async { jobs::email_heartbeat() },
    ));

    let notification_pool = pool.clone();
    workers.spawn(jobs::run_every(
        "notification",
        jobs::NOTIFICATION_PERIOD,
        shutdown_rx.clone(),
        move || {
            let pool = notification_pool.clone();
            async move { jobs::purge_refresh_tokens(&pool).await }
        },
    ));

    let inventory_pool = pool.clone();
    workers.spawn(jobs::run_every(
        "inventory",
        jobs::INVENTORY_PERIOD,
        shutdown_rx.clone(),
        move || {
            let pool = inventory_pool.clone();
            async move { jobs::scan_low_stock(&pool, threshold).await }
        },
    ));

    let order_pool = pool.clone();
    workers.spawn(jobs::run_every(
        "order",
        jobs::ORDER_PERIOD,
        shutdown_rx,
        move || {
            let pool = order_pool.clone();
            async move { jobs::count_pending_orders(&pool).await }
        },
    ));

    tracing::info!(low_stock_threshold = threshold, "Background workers started");

    shutdown_signal().await;
    let _ = shutdown_tx.send(true);

    while let Some(result) = workers.join_next().await {
        if let Err(e) = result {
            tracing::error!(error = %e, "Worker task failed");
        }
    }

    pool.close().await;
    tracing::info!("Workers stopped");
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, stopping workers");
}
