/// Query execution tools
///
/// This module implements the execute_query and execute_adhoc_query MCP
/// tools and the formatting of their results.

use serde::Deserialize;
use serde_json::Value;

use crate::redash::{QueryResultData, RedashClient};
use crate::tools::args::{lenient_object, required_id, required_str, Arguments};
use crate::tools::ToolError;

/// Run a saved query; `parameters` is optional and ignored if not an object
pub async fn execute_query(client: &RedashClient, args: &Arguments) -> Result<String, ToolError> {
    let query_id = required_id(args, "query_id")?;
    let parameters = lenient_object(args, "parameters");

    let data = client
        .execute_query(query_id, &parameters)
        .await
        .map_err(ToolError::backend("execute query"))?;

    format_query_result(&data)
}

/// Run ad-hoc SQL against a data source
pub async fn execute_adhoc_query(
    client: &RedashClient,
    args: &Arguments,
) -> Result<String, ToolError> {
    let query = required_str(args, "query")?;
    let data_source_id = required_id(args, "data_source_id")?;

    let data = client
        .execute_adhoc_query(query, data_source_id)
        .await
        .map_err(ToolError::backend("execute query"))?;

    format_query_result(&data)
}

/// Re-shape a result payload as `{columns, rows}` and pretty-print it
pub fn format_query_result(data: &Value) -> Result<String, ToolError> {
    let shaped = QueryResultData::deserialize(data).map_err(ToolError::Format)?;
    serde_json::to_string_pretty(&shaped).map_err(ToolError::Format)
}
