//! Best-effort task notifications.
//!
//! The [`Notifier`] formats reconciliation events into chat messages and hands
//! them to a [`MessageSink`]. Delivery failures are reported to the caller,
//! which logs them and moves on.

mod telegram;

pub use telegram::{TelegramConfig, TelegramSink};

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use opsync_core::CanonicalTask;

/// Maximum title length shown in a message before truncation.
const MAX_TITLE_CHARS: usize = 50;

/// Notification errors.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification transport not configured")]
    NotConfigured,

    #[error("notification request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("notification rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// What happened to a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// The message was accepted by the transport.
    Sent,
    /// Nothing was sent (event type switched off, or nothing to report).
    Disabled,
}

/// Transport for pre-formatted messages.
#[async_trait]
pub trait MessageSink: Send + Sync {
    async fn send(&self, text: &str) -> Result<(), NotifyError>;
}

/// Reconciliation event notifications.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Announce a task seen for the first time.
    async fn notify_new(&self, task: &CanonicalTask) -> Result<Delivery, NotifyError>;

    /// Announce tracked-field changes on a known task.
    async fn notify_changed(
        &self,
        task: &CanonicalTask,
        changes: &[String],
    ) -> Result<Delivery, NotifyError>;
}

/// Which event types produce messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotifierConfig {
    pub notify_new_tasks: bool,
    pub notify_task_changes: bool,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            notify_new_tasks: true,
            notify_task_changes: true,
        }
    }
}

/// [`Notifier`] that renders fixed Markdown templates into a sink.
pub struct MessageNotifier {
    sink: Arc<dyn MessageSink>,
    config: NotifierConfig,
}

impl MessageNotifier {
    pub fn new(sink: Arc<dyn MessageSink>, config: NotifierConfig) -> Self {
        Self { sink, config }
    }
}

#[async_trait]
impl Notifier for MessageNotifier {
    async fn notify_new(&self, task: &CanonicalTask) -> Result<Delivery, NotifyError> {
        if !self.config.notify_new_tasks {
            return Ok(Delivery::Disabled);
        }
        self.sink.send(&format_new_task(task)).await?;
        Ok(Delivery::Sent)
    }

    async fn notify_changed(
        &self,
        task: &CanonicalTask,
        changes: &[String],
    ) -> Result<Delivery, NotifyError> {
        if !self.config.notify_task_changes || changes.is_empty() {
            return Ok(Delivery::Disabled);
        }
        self.sink.send(&format_task_changed(task, changes)).await?;
        Ok(Delivery::Sent)
    }
}

fn or_default<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.is_empty() {
        fallback
    } else {
        value
    }
}

/// Title as shown in messages.
pub fn display_title(title: &str) -> String {
    if title.is_empty() {
        return "Unknown Task".to_string();
    }
    if title.chars().count() > MAX_TITLE_CHARS {
        let head: String = title.chars().take(MAX_TITLE_CHARS).collect();
        format!("{head}...")
    } else {
        title.to_string()
    }
}

/// Render the "new task" message.
pub fn format_new_task(task: &CanonicalTask) -> String {
    format!(
        "✅ *New Task Added*\n\n*{}*\n\nStatus: {}\nAssignee: {}\n\n_ID: {}_",
        display_title(&task.title),
        or_default(&task.status, "N/A"),
        or_default(&task.assignee, "Unassigned"),
        task.external_id,
    )
}

/// Render the "task changed" message.
pub fn format_task_changed(task: &CanonicalTask, changes: &[String]) -> String {
    let lines: Vec<String> = changes.iter().map(|c| format!("• {c}")).collect();
    format!(
        "📝 *Task Updated*\n\n*{}*\n\n{}\n\n_ID: {}_",
        display_title(&task.title),
        lines.join("\n"),
        task.external_id,
    )
}
