/// Basic unit tests to verify the public library surface
use redash_mcp::tools::{format_query_result, tool_definitions};
use redash_mcp::*;
use serde_json::json;
use std::time::Duration;

#[cfg(test)]
mod basic_unit_tests {
    use super::*;

    #[test]
    fn test_server_creation() {
        let config = RedashConfig::new("http://localhost:5000", "test-key");
        let server = RedashMcpServer::new(config);
        assert!(server.is_ok());
    }

    #[test]
    fn test_server_rejects_missing_api_key() {
        let config = RedashConfig::new("http://localhost:5000", "");
        let err = RedashMcpServer::new(config).err().expect("Expected a config error");
        assert!(matches!(err, ServerError::Config(ConfigError::MissingApiKey)));
    }

    #[test]
    fn test_server_rejects_bad_url() {
        let config = RedashConfig::new("redash.internal", "test-key");
        let err = RedashMcpServer::new(config).err().expect("Expected a config error");
        assert!(err.to_string().contains("redash.internal"));
    }

    #[test]
    fn test_server_keeps_config() {
        let config = RedashConfig::new("https://redash.example.com/", "test-key")
            .with_no_proxy(true)
            .with_request_timeout(Duration::from_secs(5))
            .with_poll(PollConfig {
                interval: Duration::from_millis(250),
                max_attempts: 8,
            });

        let server = RedashMcpServer::new(config).expect("Failed to create server");
        let config = server.tools().client().config();

        assert_eq!(config.base_url, "https://redash.example.com");
        assert!(config.no_proxy);
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.poll.budget(), Duration::from_secs(2));
    }

    #[test]
    fn test_tool_definitions_have_object_schemas() {
        for definition in tool_definitions() {
            assert_eq!(definition.input_schema["type"], "object", "{}", definition.name);
            assert!(!definition.description.is_empty());
        }
    }

    #[test]
    fn test_format_query_result() {
        let text = format_query_result(&json!({
            "columns": [{"name": "id", "friendly_name": "ID", "type": "integer"}],
            "rows": [{"id": 1}, {"id": 2}]
        }))
        .expect("Failed to format");

        assert!(text.contains("\n  \"columns\": ["));
        assert!(text.contains("\"friendly_name\": \"ID\""));
    }

    #[test]
    fn test_new_server_is_uninitialized() {
        let config = RedashConfig::new("http://localhost:5000", "test-key");
        let server = RedashMcpServer::new(config)
            .expect("Failed to create server")
            .into_mcp_server();
        assert_eq!(server.session(), SessionState::Uninitialized);
    }
}
