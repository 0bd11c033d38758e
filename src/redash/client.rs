/// HTTP client for the Redash API
///
/// Every call carries the `Authorization: Key <api_key>` header and is
/// bounded by the configured request timeout. Failed calls are never
/// retried; only job status polling repeats requests.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{header, Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use tracing::{debug, info};

use crate::config::RedashConfig;
use crate::redash::{
    Alert, Dashboard, Execution, Job, JobEnvelope, JobFetcher, JobPoller, Query,
    QueryExecuteResponse, QueryResult, QueryResultEnvelope, RedashError,
};

/// Authenticated Redash API client
#[derive(Debug, Clone)]
pub struct RedashClient {
    http: Client,
    config: Arc<RedashConfig>,
    poller: JobPoller,
}

impl RedashClient {
    /// Build a client from validated configuration
    pub fn new(config: Arc<RedashConfig>) -> Result<Self, RedashError> {
        let mut auth = header::HeaderValue::from_str(&format!("Key {}", config.api_key))
            .map_err(|_| RedashError::Config("API key contains invalid characters".to_string()))?;
        auth.set_sensitive(true);

        let mut headers = header::HeaderMap::new();
        headers.insert(header::AUTHORIZATION, auth);

        let mut builder = Client::builder()
            .timeout(config.request_timeout)
            .default_headers(headers);

        if config.no_proxy {
            builder = builder.no_proxy();
        }

        let http = builder.build()?;
        let poller = JobPoller::new(config.poll);

        Ok(Self {
            http,
            config,
            poller,
        })
    }

    pub fn config(&self) -> &RedashConfig {
        &self.config
    }

    /// Execute a saved query, waiting for its job if the result isn't cached
    pub async fn execute_query(
        &self,
        query_id: i64,
        parameters: &Map<String, Value>,
    ) -> Result<Value, RedashError> {
        let url = self.config.endpoint(&format!("/api/queries/{}/results", query_id));
        info!(query_id, parameters = parameters.len(), "Executing saved query");

        let request = self.http.post(&url);
        let request = if parameters.is_empty() {
            request.header(header::CONTENT_TYPE, "application/json")
        } else {
            request.json(&json!({ "parameters": parameters }))
        };

        let response = self.send(request).await?;
        self.resolve_execution(response).await
    }

    /// Execute ad-hoc SQL against a data source
    pub async fn execute_adhoc_query(
        &self,
        query: &str,
        data_source_id: i64,
    ) -> Result<Value, RedashError> {
        let url = self.config.endpoint("/api/query_results");
        info!(data_source_id, "Executing ad-hoc query");

        let body = json!({
            "query": query,
            "data_source_id": data_source_id,
        });

        let response = self.send(self.http.post(&url).json(&body)).await?;
        self.resolve_execution(response).await
    }

    /// Wait for a queued job and return its result payload
    pub async fn wait_for_job(&self, job_id: &str) -> Result<Value, RedashError> {
        self.poller.wait(self, job_id).await
    }

    pub async fn get_query(&self, query_id: i64) -> Result<Query, RedashError> {
        self.get_json(&format!("/api/queries/{}", query_id)).await
    }

    pub async fn get_dashboard(&self, dashboard_id: i64) -> Result<Dashboard, RedashError> {
        self.get_json(&format!("/api/dashboards/{}", dashboard_id)).await
    }

    pub async fn get_alert(&self, alert_id: i64) -> Result<Alert, RedashError> {
        self.get_json(&format!("/api/alerts/{}", alert_id)).await
    }

    /// Turn an execution response into a payload: cached results return
    /// directly, queued jobs go through the poller
    async fn resolve_execution(&self, response: Response) -> Result<Value, RedashError> {
        let response: QueryExecuteResponse = Self::decode(response).await?;

        match response.into_execution() {
            Some(Execution::Cached(result)) => {
                debug!(query_result_id = result.id, "Query result served from cache");
                Ok(result.data)
            }
            Some(Execution::Queued(job)) => {
                debug!(job_id = %job.id, "Query queued as job");
                self.wait_for_job(&job.id).await
            }
            None => Err(RedashError::UnexpectedResponse),
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, RedashError> {
        let url = self.config.endpoint(path);
        let response = self.send(self.http.get(&url)).await?;
        Self::decode(response).await
    }

    /// Send a request, turning any non-2xx status into `RedashError::Api`
    async fn send(&self, request: RequestBuilder) -> Result<Response, RedashError> {
        let response = request.send().await?;
        let status = response.status();
        debug!(url = %response.url().path(), status = status.as_u16(), "Redash response");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RedashError::Api {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response)
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, RedashError> {
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| RedashError::Decode(e.to_string()))
    }
}

#[async_trait]
impl JobFetcher for RedashClient {
    async fn fetch_job(&self, job_id: &str) -> Result<Job, RedashError> {
        let envelope: JobEnvelope = self.get_json(&format!("/api/jobs/{}", job_id)).await?;
        Ok(envelope.into_job())
    }

    async fn fetch_query_result(&self, query_result_id: i64) -> Result<QueryResult, RedashError> {
        let envelope: QueryResultEnvelope = self
            .get_json(&format!("/api/query_results/{}", query_result_id))
            .await?;
        Ok(envelope.query_result)
    }
}
