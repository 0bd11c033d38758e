/// Main entry point for the Redash MCP server
///
/// This file sets up logging, parses command line arguments, and starts the MCP server.
/// The server listens for JSON-RPC requests over stdin/stdout following the MCP protocol.

use clap::Parser;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

use redash_mcp::{PollConfig, RedashConfig, RedashMcpServer};

/// Command line arguments for the Redash MCP server
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Base URL of the Redash instance
    #[arg(long, env = "REDASH_URL")]
    url: String,

    /// Redash API key
    #[arg(long, env = "REDASH_API_KEY", hide_env_values = true)]
    api_key: String,

    /// Do not use any HTTP proxy for Redash requests
    #[arg(long, env = "REDASH_NO_PROXY")]
    no_proxy: bool,

    /// Timeout for each Redash HTTP request, in seconds
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,

    /// Delay between job status polls, in milliseconds
    #[arg(long, default_value_t = 1000)]
    poll_interval_ms: u64,

    /// Number of job status polls before a query times out
    #[arg(long, default_value_t = 30)]
    max_poll_attempts: u32,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Enable verbose output (implies debug)
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Set up logging based on command line flags
    let log_level = if args.verbose {
        "debug"
    } else if args.debug {
        "info"
    } else {
        "warn"
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("redash_mcp={}", log_level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr) // stdout carries the protocol
        .init();

    info!("Starting Redash MCP server");

    let config = RedashConfig::new(args.url, args.api_key)
        .with_no_proxy(args.no_proxy)
        .with_request_timeout(Duration::from_secs(args.timeout_secs))
        .with_poll(PollConfig {
            interval: Duration::from_millis(args.poll_interval_ms),
            max_attempts: args.max_poll_attempts,
        });

    info!("Connecting to Redash at: {}", config.base_url);

    let server = RedashMcpServer::new(config)?;
    server.run().await?;

    info!("Redash MCP server shutdown complete");
    Ok(())
}
