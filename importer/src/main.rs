use std::path::PathBuf;

use clap::Parser;
use importer::{import_file, TaskClient, DEFAULT_API_URL};

#[derive(Debug, Parser)]
#[command(name = "tasks-import", about = "Import tasks from a CSV file into the task API")]
struct Args {
    /// CSV file with a `title,description` header row.
    #[arg(default_value = "tasks.csv")]
    csv_path: PathBuf,

    /// Base URL of the running task API.
    #[arg(long, env = "API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "importer=info,tasks_import=info".into()),
        )
        .init();

    let args = Args::parse();
    let client = TaskClient::new(&args.api_url);

    let summary = import_file(&args.csv_path, &client).await?;
    tracing::info!(
        imported = summary.imported,
        skipped = summary.skipped,
        failed = summary.failed,
        "import finished"
    );
    Ok(())
}
