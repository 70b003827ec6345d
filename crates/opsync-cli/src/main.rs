//! opsync CLI - Command line interface for the opsync server.

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use opsync_cli::{HttpClient, TaskQuery};
use opsync_core::{RunStatus, StoredTask, SyncResult};

/// opsync CLI - sync server management tool
#[derive(Parser)]
#[command(name = "opsync")]
#[command(about = "CLI for the opsync server", long_about = None)]
struct Cli {
    /// Server base URL
    #[arg(short, long, env = "OPSYNC_SERVER", default_value = "http://localhost:3000")]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a sync pass now
    Sync,

    /// Show the last sync run status
    Status,

    /// Show the upstream sync scope
    Config,

    /// List stored tasks
    #[command(name = "list-tasks")]
    ListTasks {
        /// Only tasks with this status
        #[arg(long)]
        status: Option<String>,

        /// Only tasks with this assignee
        #[arg(long)]
        assignee: Option<String>,

        /// Only tasks in this project
        #[arg(long)]
        project_id: Option<String>,

        /// Maximum number of tasks
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Show a task by local id
    #[command(name = "get-task")]
    GetTask {
        /// Local task ID
        id: i64,
    },

    /// Show a task by upstream id
    #[command(name = "get-external")]
    GetExternal {
        /// Upstream work package ID
        external_id: String,
    },

    /// Check server health
    Health,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let client = HttpClient::new(&cli.server);

    match cli.command {
        Commands::Sync => {
            let result = client.trigger_sync().await?;
            print_sync_result(&result);
        }
        Commands::Status => {
            let status = client.sync_status().await?;
            print_status(&status);
        }
        Commands::Config => {
            let config = client.sync_config().await?;
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        Commands::ListTasks {
            status,
            assignee,
            project_id,
            limit,
        } => {
            let query = TaskQuery {
                status,
                assignee,
                project_id,
                limit,
            };
            let tasks = client.list_tasks(&query).await?;
            print_task_table(&tasks);
        }
        Commands::GetTask { id } => {
            let task = client.get_task(id).await?;
            print_task(&task);
        }
        Commands::GetExternal { external_id } => {
            let task = client.get_task_by_external_id(&external_id).await?;
            print_task(&task);
        }
        Commands::Health => {
            if client.health().await? {
                println!("Server at {} is healthy", cli.server);
            } else {
                println!("Server at {} is unhealthy", cli.server);
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

fn print_sync_result(result: &SyncResult) {
    println!("Sync completed:");
    println!("  Created:       {}", result.created);
    println!("  Updated:       {}", result.updated);
    println!("  Notifications: {}", result.notifications);
    println!("  Errors:        {}", result.errors.len());
    for error in &result.errors {
        println!("    {}: {}", error.external_id, error.error);
    }
}

fn print_status(status: &RunStatus) {
    let last_run = status
        .last_run
        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "-".to_string());

    println!("Last run:    {}", last_run);
    println!("Last status: {}", status.last_status.as_str());
    println!("Running:     {}", status.is_running);
    if let Some(error) = &status.last_error {
        println!("Last error:  {}", error);
    }
}

fn print_task_table(tasks: &[StoredTask]) {
    println!("Tasks ({}):", tasks.len());
    println!(
        "{:<6}  {:<10}  {:<14}  {:<16}  {}",
        "ID", "EXTERNAL", "STATUS", "ASSIGNEE", "TITLE"
    );
    println!("{}", "-".repeat(90));

    for stored in tasks {
        let task = &stored.task;
        println!(
            "{:<6}  {:<10}  {:<14}  {:<16}  {}",
            stored.id,
            task.external_id,
            truncate(&task.status, 14),
            truncate(&task.assignee, 16),
            truncate(&task.title, 40)
        );
    }
}

fn print_task(stored: &StoredTask) {
    let task = &stored.task;
    println!("ID:          {}", stored.id);
    println!("External ID: {}", task.external_id);
    println!("Title:       {}", task.title);
    println!(
        "Project:     {} ({})",
        task.project,
        task.project_id.as_deref().unwrap_or("-")
    );
    println!("Status:      {}", task.status);
    println!("Assignee:    {}", task.assignee);
    println!(
        "Responsible: {}",
        task.responsible.as_deref().unwrap_or("-")
    );
    println!("Priority:    {}", task.priority);
    if let Some(hours) = task.estimated_hours {
        println!("Estimated:   {hours}h");
    }
    if let Some(hours) = task.spent_hours {
        println!("Spent:       {hours}h");
    }
    if let Some(links) = &task.related_to {
        println!("Related:");
        for link in links {
            println!("  {} #{} {}", link.link_type, link.id, link.title);
        }
    }
    if let Some(updated) = &task.op_updated_at {
        println!("Updated:     {updated}");
    }
    println!("Synced:      {}", stored.updated_at.format("%Y-%m-%d %H:%M:%S UTC"));
    if !task.description.is_empty() {
        println!();
        println!("{}", task.description);
    }
}

fn truncate(value: &str, max: usize) -> String {
    if value.chars().count() <= max {
        value.to_string()
    } else {
        let head: String = value.chars().take(max.saturating_sub(3)).collect();
        format!("{head}...")
    }
}
