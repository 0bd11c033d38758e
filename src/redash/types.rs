/// Redash API data types
///
/// Only the fields needed to tell a finished execution from a pending one
/// are typed strictly. Metadata records keep the fields worth showing to a
/// client and ignore the rest.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Immediate answer to a query execution request
///
/// Redash answers with `{"query_result": {...}}` when the result is cached
/// and with `{"job": {...}}` when the query was queued.
#[derive(Debug, Deserialize)]
pub struct QueryExecuteResponse {
    #[serde(default)]
    pub job: Option<Job>,
    #[serde(default)]
    pub query_result: Option<QueryResult>,
}

/// What the executor should do next with an execution response
#[derive(Debug)]
pub enum Execution {
    /// Result already materialized, no polling needed
    Cached(QueryResult),
    /// Result pending, poll this job
    Queued(Job),
}

impl QueryExecuteResponse {
    /// Classify the response; `None` means neither shape was present
    pub fn into_execution(self) -> Option<Execution> {
        match (self.query_result, self.job) {
            (Some(result), _) => Some(Execution::Cached(result)),
            (None, Some(job)) => Some(Execution::Queued(job)),
            (None, None) => None,
        }
    }
}

/// A materialized query result
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QueryResult {
    #[serde(default)]
    pub id: i64,
    /// Opaque result payload, passed through untouched
    #[serde(default)]
    pub data: Value,
}

/// Wrapper returned by `GET /api/query_results/{id}`
#[derive(Debug, Deserialize)]
pub struct QueryResultEnvelope {
    pub query_result: QueryResult,
}

/// Lifecycle state of a backend job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum JobStatus {
    Pending,
    Started,
    Succeeded,
    Failed,
    Cancelled,
}

impl TryFrom<u8> for JobStatus {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(JobStatus::Pending),
            2 => Ok(JobStatus::Started),
            3 => Ok(JobStatus::Succeeded),
            4 => Ok(JobStatus::Failed),
            5 => Ok(JobStatus::Cancelled),
            other => Err(format!("unknown job status {}", other)),
        }
    }
}

impl From<JobStatus> for u8 {
    fn from(status: JobStatus) -> Self {
        match status {
            JobStatus::Pending => 1,
            JobStatus::Started => 2,
            JobStatus::Succeeded => 3,
            JobStatus::Failed => 4,
            JobStatus::Cancelled => 5,
        }
    }
}

/// Snapshot of a backend job
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Job {
    pub id: String,
    pub status: JobStatus,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_result: Option<QueryResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_result_id: Option<i64>,
}

/// `GET /api/jobs/{id}` answers either `{"job": {...}}` or the bare job
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum JobEnvelope {
    Wrapped { job: Job },
    Bare(Job),
}

impl JobEnvelope {
    pub fn into_job(self) -> Job {
        match self {
            JobEnvelope::Wrapped { job } => job,
            JobEnvelope::Bare(job) => job,
        }
    }
}

/// Display shape of a query result: columns plus untouched rows
#[derive(Debug, Deserialize, Serialize)]
pub struct QueryResultData {
    #[serde(default)]
    pub columns: Vec<Column>,
    #[serde(default)]
    pub rows: Value,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Column {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub friendly_name: String,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub column_type: Option<String>,
}

/// Read an explicit `null` as the type's default value
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Saved query metadata
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Query {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub data_source_id: Option<i64>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Dashboard metadata with the queries behind its widgets
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Dashboard {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub widgets: Vec<Widget>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Widget {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visualization: Option<Visualization>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Visualization {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "type")]
    pub visualization_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<WidgetQuery>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WidgetQuery {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub data_source_id: Option<i64>,
}

/// Alert metadata
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Alert {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<Query>,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub options: Map<String, Value>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}
