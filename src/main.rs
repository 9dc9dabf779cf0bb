//! Files Manager server
//!
//! Main entry point that wires all crates together and starts the HTTP API,
//! the background worker, or both.

use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing_subscriber::{EnvFilter, fmt};

use fileman_core::config::AppConfig;
use fileman_core::error::AppError;
use fileman_core::traits::storage::StorageProvider;
use fileman_core::types::url::mask_password;
use fileman_database::Store;
use fileman_mail::{MailSender, SmtpMailer};
use fileman_queue::QueueManager;
use fileman_storage::{LocalStorageProvider, ThumbnailGenerator};
use fileman_worker::WorkerRunner;

#[derive(Debug, Parser)]
#[command(name = "files-manager", version, about = "Files Manager API and worker")]
struct Cli {
    /// Directory holding default.toml and the environment overlays
    #[arg(long, global = true, env = "FILEMAN_CONFIG_DIR", default_value = "config")]
    config_dir: String,

    /// Environment overlay to load (<config_dir>/<env>.toml)
    #[arg(long, global = true, env = "FILEMAN_ENV", default_value = "development")]
    env: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP API (and the worker when `worker.enabled`)
    Serve,
    /// Run only the background worker
    Worker,
    /// Print job counters for every queue
    QueueStats,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match AppConfig::load(&cli.config_dir, &cli.env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    let result = match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::Worker => worker(config).await,
        Command::QueueStats => queue_stats(config).await,
    };

    if let Err(e) = result {
        tracing::error!("Fatal error: {}", e);
        std::process::exit(1);
    }
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Connect the store and both queues.
async fn connect_backends(config: &AppConfig) -> Result<(Arc<dyn Store>, QueueManager), AppError> {
    tracing::info!(
        "Connecting to store (provider: {})...",
        config.database.provider
    );
    let store = fileman_database::connect_store(&config.database).await?;
    tracing::info!("Store connected");

    tracing::info!(
        "Connecting to job queues (provider: {}, url: {})...",
        config.queue.provider,
        mask_password(&config.queue.redis.url)
    );
    let queues = QueueManager::new(&config.queue, config.worker.max_attempts).await?;
    tracing::info!("Job queues ready");

    Ok((store, queues))
}

/// Build the worker with its storage and mail dependencies.
async fn build_worker(
    config: &AppConfig,
    store: Arc<dyn Store>,
    queues: &QueueManager,
) -> Result<WorkerRunner, AppError> {
    let provider = LocalStorageProvider::new(&config.storage.root).await?;
    if !provider.health_check().await? {
        return Err(AppError::storage(format!(
            "Storage root '{}' is not usable",
            config.storage.root
        )));
    }
    tracing::info!(
        provider = provider.provider_type(),
        root = %config.storage.root,
        "Storage provider initialized"
    );
    let generator = ThumbnailGenerator::new(Arc::new(provider));

    let mailer = SmtpMailer::new(&config.mail)?;
    if !mailer.is_enabled() {
        tracing::warn!("No SMTP host configured, welcome emails will only be logged");
    }
    let mailer: Arc<dyn MailSender> = Arc::new(mailer);

    Ok(WorkerRunner::with_default_handlers(
        queues,
        store,
        generator,
        config.storage.thumbnail_sizes.clone(),
        mailer,
        &config.worker,
    ))
}

/// Spawn the worker on its own task.
fn spawn_worker(runner: WorkerRunner, cancel: watch::Receiver<bool>) -> JoinHandle<()> {
    tokio::spawn(async move {
        runner.run(cancel).await;
    })
}

/// Wait for the worker to drain, bounded by the configured grace period.
async fn join_worker(handle: JoinHandle<()>, grace_seconds: u64) {
    tracing::info!("Waiting for in-flight jobs to complete...");
    match tokio::time::timeout(Duration::from_secs(grace_seconds), handle).await {
        Ok(Ok(())) => tracing::info!("Worker stopped"),
        Ok(Err(e)) => tracing::error!("Worker task failed: {}", e),
        Err(_) => tracing::warn!(
            grace_seconds,
            "Worker did not stop within the grace period"
        ),
    }
}

/// HTTP API, plus the in-process worker when enabled.
async fn serve(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting Files Manager v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Store + queues ───────────────────────────────────
    let (store, queues) = connect_backends(&config).await?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // ── Step 2: Background worker ────────────────────────────────
    let worker_handle = if config.worker.enabled {
        tracing::info!("Starting background worker...");
        let runner = build_worker(&config, Arc::clone(&store), &queues).await?;
        let handle = spawn_worker(runner, shutdown_rx.clone());
        tracing::info!("Background worker started");
        Some(handle)
    } else {
        tracing::info!("Background worker disabled");
        None
    };

    // ── Step 3: HTTP server ──────────────────────────────────────
    let grace = config.worker.shutdown_grace_seconds;
    let state = fileman_api::AppState::new(Arc::new(config), store, queues);

    fileman_api::app::serve(state, async move {
        shutdown_signal().await;
        tracing::info!("Shutdown signal received, starting graceful shutdown...");
        let _ = shutdown_tx.send(true);
    })
    .await?;

    // ── Step 4: Drain background tasks ───────────────────────────
    if let Some(handle) = worker_handle {
        join_worker(handle, grace).await;
    }

    tracing::info!("Files Manager shut down gracefully");
    Ok(())
}

/// Worker only.
async fn worker(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting Files Manager worker v{}", env!("CARGO_PKG_VERSION"));

    let (store, queues) = connect_backends(&config).await?;
    let runner = build_worker(&config, store, &queues).await?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let handle = spawn_worker(runner, shutdown_rx);

    shutdown_signal().await;
    tracing::info!("Shutdown signal received, stopping worker...");
    let _ = shutdown_tx.send(true);

    join_worker(handle, config.worker.shutdown_grace_seconds).await;
    Ok(())
}

/// Print counters for both queues.
async fn queue_stats(config: AppConfig) -> Result<(), AppError> {
    let queues = QueueManager::new(&config.queue, config.worker.max_attempts).await?;

    println!(
        "{:<24} {:>8} {:>8} {:>10} {:>8}",
        "QUEUE", "WAITING", "ACTIVE", "COMPLETED", "FAILED"
    );
    for queue in queues.all() {
        let stats = queue.stats().await?;
        println!(
            "{:<24} {:>8} {:>8} {:>10} {:>8}",
            queue.name(),
            stats.waiting,
            stats.active,
            stats.completed,
            stats.failed
        );
    }
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
