/// Metadata lookup tools
///
/// get_query, get_dashboard and get_alert return the backend record as
/// pretty-printed JSON.

use serde::Serialize;

use crate::redash::RedashClient;
use crate::tools::args::{required_id, Arguments};
use crate::tools::ToolError;

pub async fn get_query(client: &RedashClient, args: &Arguments) -> Result<String, ToolError> {
    let query_id = required_id(args, "query_id")?;
    let query = client
        .get_query(query_id)
        .await
        .map_err(ToolError::backend("get query"))?;
    pretty(&query)
}

pub async fn get_dashboard(client: &RedashClient, args: &Arguments) -> Result<String, ToolError> {
    let dashboard_id = required_id(args, "dashboard_id")?;
    let dashboard = client
        .get_dashboard(dashboard_id)
        .await
        .map_err(ToolError::backend("get dashboard"))?;
    pretty(&dashboard)
}

pub async fn get_alert(client: &RedashClient, args: &Arguments) -> Result<String, ToolError> {
    let alert_id = required_id(args, "alert_id")?;
    let alert = client
        .get_alert(alert_id)
        .await
        .map_err(ToolError::backend("get alert"))?;
    pretty(&alert)
}

fn pretty<T: Serialize>(record: &T) -> Result<String, ToolError> {
    serde_json::to_string_pretty(record).map_err(ToolError::Format)
}
