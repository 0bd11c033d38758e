/// Redash backend access
///
/// This module talks to the Redash HTTP API: it runs saved and ad-hoc
/// queries, follows asynchronous jobs until they finish, and fetches
/// query, dashboard and alert metadata.

pub mod client;
pub mod poller;
pub mod types;

// Re-export the main backend types
pub use client::RedashClient;
pub use poller::{JobFetcher, JobPoller};
pub use types::*;

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while talking to Redash
#[derive(Error, Debug)]
pub enum RedashError {
    #[error("failed to execute request: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {body}")]
    Api { status: u16, body: String },

    #[error("failed to decode response: {0}")]
    Decode(String),

    #[error("unexpected response format: no query_result or job found")]
    UnexpectedResponse,

    #[error("query failed: {0}")]
    JobFailed(String),

    #[error("query cancelled")]
    JobCancelled,

    #[error("query succeeded but no result data")]
    MissingResult,

    #[error("query timeout: job {job_id} did not complete after {attempts} polls ({waited:?})")]
    Timeout {
        job_id: String,
        attempts: u32,
        waited: Duration,
    },

    #[error("invalid client configuration: {0}")]
    Config(String),
}
