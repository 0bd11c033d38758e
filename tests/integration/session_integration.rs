/// End-to-end sessions: framed JSON-RPC in, framed JSON-RPC out
use redash_mcp::*;
use serde_json::{json, Value};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[cfg(test)]
mod session_integration_tests {
    use super::*;

    fn server_for(backend: &MockServer) -> McpServer<RedashTools> {
        let config = RedashConfig::new(backend.uri(), "test-key").with_poll(PollConfig {
            interval: Duration::from_millis(10),
            max_attempts: 5,
        });
        RedashMcpServer::new(config)
            .expect("Failed to create server")
            .into_mcp_server()
    }

    /// Feed the given lines through a session and return every response line
    async fn run_session(server: &mut McpServer<RedashTools>, lines: &[Value]) -> Vec<Value> {
        let input = lines
            .iter()
            .map(|line| line.to_string() + "\n")
            .collect::<String>();
        let mut output = Vec::new();

        server
            .serve(input.as_bytes(), &mut output)
            .await
            .expect("Session failed");

        String::from_utf8(output)
            .expect("Output is not UTF-8")
            .lines()
            .map(|line| serde_json::from_str(line).expect("Response is not JSON"))
            .collect()
    }

    fn tool_call(id: u64, name: &str, arguments: Value) -> Value {
        json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": "tools/call",
            "params": {"name": name, "arguments": arguments}
        })
    }

    #[tokio::test]
    async fn test_cached_adhoc_query_exact_response() {
        let backend = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/query_results"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "query_result": {"id": 7, "data": {"columns": [], "rows": []}}
            })))
            .mount(&backend)
            .await;

        let mut server = server_for(&backend);
        let input = "{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"tools/call\",\"params\":{\"name\":\"execute_adhoc_query\",\"arguments\":{\"query\":\"select 1\",\"data_source_id\":3}}}\n";
        let mut output = Vec::new();

        server.serve(input.as_bytes(), &mut output).await.unwrap();

        assert_eq!(
            String::from_utf8(output).unwrap(),
            "{\"jsonrpc\":\"2.0\",\"id\":1,\"result\":{\"content\":[{\"type\":\"text\",\"text\":\"{\\n  \\\"columns\\\": [],\\n  \\\"rows\\\": []\\n}\"}],\"isError\":false}}\n"
        );
    }

    #[tokio::test]
    async fn test_full_session_with_job_polling() {
        let backend = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/queries/12/results"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"job": {"id": "j-12", "status": 1}})),
            )
            .mount(&backend)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/jobs/j-12"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"job": {"id": "j-12", "status": 1}})),
            )
            .up_to_n_times(2)
            .expect(2)
            .mount(&backend)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/jobs/j-12"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"job": {
                "id": "j-12",
                "status": 3,
                "query_result": {"id": 1, "data": {
                    "columns": [{"name": "total", "friendly_name": "total", "type": "integer"}],
                    "rows": [{"total": 42}]
                }}
            }})))
            .expect(1)
            .mount(&backend)
            .await;

        let mut server = server_for(&backend);
        let responses = run_session(
            &mut server,
            &[
                json!({"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {
                    "protocolVersion": "2024-11-05",
                    "capabilities": {},
                    "clientInfo": {"name": "integration", "version": "1.0"}
                }}),
                json!({"jsonrpc": "2.0", "method": "notifications/initialized"}),
                json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list"}),
                tool_call(3, "execute_query", json!({"query_id": 12})),
                json!({"jsonrpc": "2.0", "id": "last", "method": "ping"}),
            ],
        )
        .await;

        assert_eq!(responses.len(), 4);
        assert_eq!(server.session(), SessionState::Initialized);

        let ids: Vec<&Value> = responses.iter().map(|r| &r["id"]).collect();
        assert_eq!(ids, vec![&json!(1), &json!(2), &json!(3), &json!("last")]);

        assert_eq!(responses[0]["result"]["serverInfo"]["name"], "redash-mcp-server");
        assert_eq!(responses[1]["result"]["tools"].as_array().unwrap().len(), 5);

        let call = &responses[2]["result"];
        assert_eq!(call["isError"], false);
        let text: Value = serde_json::from_str(call["content"][0]["text"].as_str().unwrap()).unwrap();
        assert_eq!(text["rows"], json!([{"total": 42}]));

        assert_eq!(responses[3]["result"], json!({}));
    }

    #[tokio::test]
    async fn test_malformed_line_does_not_end_session() {
        let backend = MockServer::start().await;
        let mut server = server_for(&backend);

        let input = "not json\n\n{\"jsonrpc\":\"2.0\",\"id\":2,\"method\":\"ping\"}\n";
        let mut output = Vec::new();
        server.serve(input.as_bytes(), &mut output).await.unwrap();

        let responses: Vec<Value> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();

        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0]["id"], Value::Null);
        assert_eq!(responses[0]["error"]["code"], -32700);
        assert_eq!(responses[1]["id"], 2);
        assert_eq!(responses[1]["result"], json!({}));
    }

    #[tokio::test]
    async fn test_backend_failure_and_format_failure_are_distinct() {
        let backend = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/queries/1/results"))
            .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
            .mount(&backend)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/queries/2/results"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "query_result": {"id": 2, "data": [1, 2, 3]}
            })))
            .mount(&backend)
            .await;

        let mut server = server_for(&backend);
        let responses = run_session(
            &mut server,
            &[
                tool_call(1, "execute_query", json!({"query_id": 1})),
                tool_call(2, "execute_query", json!({"query_id": 2})),
            ],
        )
        .await;

        let backend_text = responses[0]["result"]["content"][0]["text"].as_str().unwrap();
        assert_eq!(responses[0]["result"]["isError"], true);
        assert_eq!(
            backend_text,
            "Error: Failed to execute query: API error (status 500): internal error"
        );

        let format_text = responses[1]["result"]["content"][0]["text"].as_str().unwrap();
        assert_eq!(responses[1]["result"]["isError"], true);
        assert!(format_text.starts_with("Error: Failed to format result:"));
    }

    #[tokio::test]
    async fn test_failed_job_is_a_tool_error() {
        let backend = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/query_results"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"job": {"id": "bad", "status": 1}})),
            )
            .mount(&backend)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/jobs/bad"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"job": {
                "id": "bad", "status": 4, "error": "syntax error at or near \"selec\""
            }})))
            .mount(&backend)
            .await;

        let mut server = server_for(&backend);
        let responses = run_session(
            &mut server,
            &[tool_call(1, "execute_adhoc_query", json!({"query": "selec 1", "data_source_id": 1}))],
        )
        .await;

        let result = &responses[0]["result"];
        assert!(responses[0].get("error").is_none());
        assert_eq!(result["isError"], true);
        assert_eq!(
            result["content"][0]["text"],
            "Error: Failed to execute query: query failed: syntax error at or near \"selec\""
        );
    }

    #[tokio::test]
    async fn test_argument_errors_never_reach_backend() {
        let backend = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&backend)
            .await;

        let mut server = server_for(&backend);
        let responses = run_session(
            &mut server,
            &[
                tool_call(1, "execute_query", json!({"query_id": "12"})),
                tool_call(2, "unknown_tool", json!({})),
            ],
        )
        .await;

        assert_eq!(responses[0]["result"]["isError"], true);
        assert_eq!(
            responses[0]["result"]["content"][0]["text"],
            "Error: query_id must be a number, got a string"
        );
        assert_eq!(responses[1]["result"]["isError"], true);
        assert!(responses[1]["result"]["content"][0]["text"]
            .as_str()
            .unwrap()
            .contains("unknown_tool"));
    }

    #[tokio::test]
    async fn test_get_alert_tool() {
        let backend = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/alerts/8"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 8,
                "name": "Orders dropped",
                "state": "triggered",
                "options": {"column": "count", "op": "<", "value": 10},
                "query": {"id": 3, "name": "Orders", "query": "select count(*) from orders"}
            })))
            .mount(&backend)
            .await;

        let mut server = server_for(&backend);
        let responses = run_session(&mut server, &[tool_call(1, "get_alert", json!({"alert_id": 8}))]).await;

        let result = &responses[0]["result"];
        assert_eq!(result["isError"], false);
        let alert: Value = serde_json::from_str(result["content"][0]["text"].as_str().unwrap()).unwrap();
        assert_eq!(alert["state"], "triggered");
        assert_eq!(alert["query"]["name"], "Orders");
    }
}
