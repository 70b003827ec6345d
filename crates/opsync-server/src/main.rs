//! opsync Server

use std::convert::Infallible;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{ArgAction, Parser};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use opsync_openproject::{OpenProjectClient, OpenProjectConfig};
use opsync_server::config::DEFAULT_SYNC_INTERVAL_MINUTES;
use opsync_server::http;
use opsync_server::notify::{TelegramConfig, TelegramSink};
use opsync_server::{
    AppState, Config, InMemoryTaskStore, MessageNotifier, NotifierConfig, SqliteTaskStore,
    SyncOrchestrator, SyncScheduler, TaskStore,
};

/// opsync reconciliation server.
#[derive(Parser, Debug)]
#[command(
    name = "opsync-server",
    about = "Mirror OpenProject work packages into a local task store"
)]
struct Args {
    /// HTTP bind host
    #[arg(long, env = "OPSYNC_HOST", default_value = "0.0.0.0")]
    host: String,

    /// HTTP bind port
    #[arg(long, env = "PORT", default_value_t = 3000)]
    port: u16,

    /// SQLite database file (tasks are kept in memory when unset)
    #[arg(long, env = "OPSYNC_DATABASE")]
    database: Option<PathBuf>,

    /// Minutes between periodic syncs (0 means the default)
    #[arg(
        long,
        env = "SYNC_INTERVAL_MINUTES",
        default_value_t = DEFAULT_SYNC_INTERVAL_MINUTES,
        allow_negative_numbers = true
    )]
    sync_interval_minutes: i64,

    /// OpenProject instance URL
    #[arg(
        long,
        env = "OP_BASE_URL",
        default_value = "https://your-openproject-instance.com"
    )]
    op_base_url: String,

    /// OpenProject API key
    #[arg(long, env = "OP_API_KEY", hide_env_values = true)]
    op_api_key: Option<String>,

    /// Page size of the work package listing
    #[arg(long, env = "OP_SYNC_LIMIT", default_value_t = 100)]
    op_sync_limit: u32,

    /// Comma-separated project name patterns (empty syncs all projects)
    #[arg(long, env = "OP_SYNC_PROJECTS", default_value = "")]
    op_sync_projects: String,

    /// Telegram bot token
    #[arg(long, env = "TELEGRAM_BOT_TOKEN", hide_env_values = true)]
    telegram_bot_token: Option<String>,

    /// Telegram chat id
    #[arg(long, env = "TELEGRAM_CHAT_ID")]
    telegram_chat_id: Option<String>,

    /// Announce tasks seen for the first time
    #[arg(
        long,
        env = "NOTIFY_NEW_TASKS",
        default_value_t = true,
        action = ArgAction::Set,
        value_parser = parse_enabled
    )]
    notify_new_tasks: bool,

    /// Announce status, assignee, responsible and priority changes
    #[arg(
        long,
        env = "NOTIFY_TASK_CHANGES",
        default_value_t = true,
        action = ArgAction::Set,
        value_parser = parse_enabled
    )]
    notify_task_changes: bool,

    /// Timeout for outbound HTTP requests, in seconds
    #[arg(long, env = "OPSYNC_REQUEST_TIMEOUT_SECS", default_value_t = 30)]
    request_timeout_secs: u64,
}

impl Args {
    fn into_config(self) -> Config {
        let mut openproject = OpenProjectConfig::new(self.op_base_url)
            .with_sync_limit(self.op_sync_limit)
            .with_projects(OpenProjectConfig::parse_projects(&self.op_sync_projects));
        if let Some(key) = self.op_api_key.filter(|k| !k.is_empty()) {
            openproject = openproject.with_api_key(key);
        }

        Config {
            host: self.host,
            port: self.port,
            database: self.database,
            sync_interval: Config::sync_interval_from_minutes(self.sync_interval_minutes),
            openproject,
            telegram: TelegramConfig {
                bot_token: self.telegram_bot_token,
                chat_id: self.telegram_chat_id,
                ..Default::default()
            },
            notifier: NotifierConfig {
                notify_new_tasks: self.notify_new_tasks,
                notify_task_changes: self.notify_task_changes,
            },
        }
        .with_request_timeout(Duration::from_secs(self.request_timeout_secs))
    }
}

/// Notification flags stay on unless set to exactly `false`.
fn parse_enabled(value: &str) -> Result<bool, Infallible> {
    Ok(value != "false")
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("opsync=info".parse()?))
        .with_target(true)
        .init();

    let config = args.into_config();
    let addr = config.bind_addr()?;

    // Local store
    let store: Arc<dyn TaskStore> = match &config.database {
        Some(path) => Arc::new(SqliteTaskStore::open(path.clone()).await?),
        None => {
            warn!("No database configured - tasks are kept in memory only");
            Arc::new(InMemoryTaskStore::new())
        }
    };

    // Upstream
    if config.openproject.api_key.is_none() {
        warn!("OpenProject API key not configured - sync passes will fail");
    }
    let client = Arc::new(OpenProjectClient::new(config.openproject.clone())?);
    let sync_config = client.sync_configuration();

    // Notifications
    if !config.telegram.is_configured() {
        warn!("Telegram not configured - notifications will not be delivered");
    }
    let sink = Arc::new(TelegramSink::new(config.telegram.clone())?);
    let notifier = Arc::new(MessageNotifier::new(sink, config.notifier));

    let orchestrator = Arc::new(SyncOrchestrator::new(client, store.clone(), notifier));
    let persistent = store.is_persistent();
    let state = AppState::new(orchestrator.clone(), store, sync_config);

    // Periodic sync
    let shutdown = CancellationToken::new();
    let scheduler = tokio::spawn(
        SyncScheduler::new(orchestrator, config.sync_interval).run(shutdown.clone()),
    );

    // HTTP server
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %addr, persistent, "opsync server listening");

    let result = axum::serve(listener, http::create_router(state))
        .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
        .await;

    shutdown.cancel();
    if let Err(e) = scheduler.await {
        error!(error = %e, "Scheduler task failed");
    }

    result?;
    info!("opsync server stopped");
    Ok(())
}

/// Resolve on Ctrl-C or SIGTERM, then cancel background work.
async fn shutdown_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    info!("Shutting down");
    shutdown.cancel();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_into_config() {
        let args = Args::try_parse_from([
            "opsync-server",
            "--port",
            "8080",
            "--sync-interval-minutes",
            "0",
            "--op-base-url",
            "https://op.example.com",
            "--op-sync-projects",
            "Apollo, Gemini",
            "--notify-new-tasks",
            "false",
            "--notify-task-changes",
            "yes",
            "--request-timeout-secs",
            "5",
        ])
        .unwrap();

        let config = args.into_config();
        assert_eq!(config.port, 8080);
        assert_eq!(config.sync_interval, Duration::from_secs(30 * 60));
        assert_eq!(config.openproject.api_base_url(), "https://op.example.com/api/v3");
        assert_eq!(config.openproject.sync_projects, vec!["Apollo", "Gemini"]);
        assert!(!config.notifier.notify_new_tasks);
        assert!(config.notifier.notify_task_changes);
        assert_eq!(config.telegram.request_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_notify_flags_disable_only_on_false() {
        for (value, expected) in [
            ("false", false),
            ("False", true),
            ("0", true),
            ("maybe", true),
            ("true", true),
        ] {
            let args = Args::try_parse_from([
                "opsync-server",
                "--notify-new-tasks",
                value,
                "--notify-task-changes",
                value,
            ])
            .unwrap();
            assert_eq!(args.notify_new_tasks, expected, "value {value:?}");
            assert_eq!(args.notify_task_changes, expected, "value {value:?}");
        }
    }
}
