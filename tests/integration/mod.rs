/// Integration tests: full MCP sessions against a mock Redash backend
mod session_integration;
