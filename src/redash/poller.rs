/// Job completion polling
///
/// When Redash queues a query instead of answering from cache, the caller
/// gets a job handle back. `JobPoller` re-reads that job at a fixed interval
/// until it reaches a terminal state or the attempt budget runs out.

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::PollConfig;
use crate::redash::{Job, JobStatus, QueryResult, RedashError};

/// Source of fresh job snapshots
///
/// Implemented by `RedashClient`; tests plug in scripted backends.
#[async_trait]
pub trait JobFetcher: Send + Sync {
    /// Fetch the current state of a job by identity
    async fn fetch_job(&self, job_id: &str) -> Result<Job, RedashError>;

    /// Fetch a stored query result, used when a finished job only carries its id
    async fn fetch_query_result(&self, query_result_id: i64) -> Result<QueryResult, RedashError>;
}

/// Fixed-interval, bounded-attempt job poller
#[derive(Debug, Clone, Copy)]
pub struct JobPoller {
    config: PollConfig,
}

impl JobPoller {
    pub fn new(config: PollConfig) -> Self {
        Self { config }
    }

    /// Wait for a job to finish and return its result payload
    ///
    /// Every attempt sleeps for the configured interval and then fetches a
    /// new snapshot. `Pending` and `Started` keep polling; `Succeeded`,
    /// `Failed` and `Cancelled` end the loop. Running out of attempts is a
    /// `RedashError::Timeout`.
    pub async fn wait<F>(&self, fetcher: &F, job_id: &str) -> Result<Value, RedashError>
    where
        F: JobFetcher + ?Sized,
    {
        info!(job_id, max_attempts = self.config.max_attempts, "Waiting for Redash job");

        for attempt in 1..=self.config.max_attempts {
            tokio::time::sleep(self.config.interval).await;

            let job = fetcher.fetch_job(job_id).await?;
            debug!(job_id, attempt, status = ?job.status, "Polled job status");

            match job.status {
                JobStatus::Pending | JobStatus::Started => continue,
                JobStatus::Succeeded => return Self::finished(fetcher, job).await,
                JobStatus::Failed => {
                    let message = job
                        .error
                        .filter(|e| !e.trim().is_empty())
                        .unwrap_or_else(|| "unknown error".to_string());
                    warn!(job_id, attempt, error = %message, "Redash job failed");
                    return Err(RedashError::JobFailed(message));
                }
                JobStatus::Cancelled => {
                    warn!(job_id, attempt, "Redash job was cancelled");
                    return Err(RedashError::JobCancelled);
                }
            }
        }

        warn!(job_id, attempts = self.config.max_attempts, "Redash job timed out");
        Err(RedashError::Timeout {
            job_id: job_id.to_string(),
            attempts: self.config.max_attempts,
            waited: self.config.budget(),
        })
    }

    async fn finished<F>(fetcher: &F, job: Job) -> Result<Value, RedashError>
    where
        F: JobFetcher + ?Sized,
    {
        if let Some(result) = job.query_result {
            return Ok(result.data);
        }

        match job.query_result_id {
            Some(id) => Ok(fetcher.fetch_query_result(id).await?.data),
            None => Err(RedashError::MissingResult),
        }
    }
}
