//! `klaud-api-mcp`: MCP server (stdio) for the Klaud API.

mod cli;
mod logging;
mod server;

use anyhow::Context as _;
use clap::Parser as _;
use klaud_api_tools::Dispatcher;
use rmcp::ServiceExt as _;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();
    logging::init(&cli.log_level, cli.log_format)?;

    let config = cli.client_config();
    info!(
        base_url = %config.base_url,
        api_key = config.credentials.api_key.is_some(),
        store_token = config.credentials.store_token.is_some(),
        agent_token = config.credentials.agent_token.is_some(),
        "configuration loaded"
    );

    let dispatcher = Dispatcher::new(config).context("invalid upstream configuration")?;
    let tool_count = dispatcher.list_tools().len();

    let service = server::KlaudServer::new(dispatcher)
        .serve(rmcp::transport::stdio())
        .await
        .context("failed to start MCP stdio transport")?;
    info!(tools = tool_count, "klaud-api-mcp serving on stdio");

    let reason = service.waiting().await.context("MCP service task failed")?;
    info!(?reason, "klaud-api-mcp stopped");
    Ok(())
}
