//! One-shot CSV importer for the task API.
//!
//! The first CSV record is a header and is skipped. Every following record
//! supplies `title` and `description` in its first two columns. Records with
//! an empty title or description are skipped, the rest are posted one at a
//! time. A failed post is logged and the import moves on to the next row.

use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord};
use reqwest::StatusCode;
use shared::{CreateTaskRequest, ErrorBody, Task};
use thiserror::Error;

pub const DEFAULT_API_URL: &str = "http://localhost:3333";

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("failed to open CSV file {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API responded with {status}: {message}")]
    Rejected { status: StatusCode, message: String },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub imported: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Thin client for `POST /tasks`.
#[derive(Debug, Clone)]
pub struct TaskClient {
    http: reqwest::Client,
    tasks_url: String,
}

impl TaskClient {
    pub fn new(api_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            tasks_url: format!("{}/tasks", api_url.trim_end_matches('/')),
        }
    }

    pub async fn create_task(&self, payload: &CreateTaskRequest) -> Result<Task, ImportError> {
        let response = self.http.post(&self.tasks_url).json(payload).send().await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ErrorBody>()
                .await
                .map(|body| body.message)
                .unwrap_or_default();
            return Err(ImportError::Rejected { status, message });
        }

        Ok(response.json::<Task>().await?)
    }
}

/// Title and description of a data row, or `None` if either is empty.
pub fn parse_row(record: &StringRecord) -> Option<CreateTaskRequest> {
    let title = record.get(0).filter(|value| !value.is_empty())?;
    let description = record.get(1).filter(|value| !value.is_empty())?;
    Some(CreateTaskRequest::new(title, description))
}

pub async fn import_file(path: &Path, client: &TaskClient) -> Result<ImportSummary, ImportError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .map_err(|source| ImportError::Open {
            path: path.to_path_buf(),
            source,
        })?;

    let mut summary = ImportSummary::default();
    for record in reader.records() {
        let record = match record {
            Ok(record) => record,
            Err(error) => {
                tracing::warn!(%error, "skipping unreadable CSV record");
                summary.skipped += 1;
                continue;
            }
        };

        let Some(payload) = parse_row(&record) else {
            summary.skipped += 1;
            continue;
        };
        let title = payload.title.as_deref().unwrap_or_default();

        match client.create_task(&payload).await {
            Ok(task) => {
                tracing::info!(title, task_id = %task.id, "task imported");
                summary.imported += 1;
            }
            Err(error) => {
                tracing::error!(title, %error, "failed to send task");
                summary.failed += 1;
            }
        }
    }

    Ok(summary)
}
