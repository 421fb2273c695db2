//! MCP surface over the dispatcher.
//!
//! A thin wrapper: every tool call is forwarded to [`Dispatcher::call_tool`], which always
//! yields a result (success or `isError`), so tool failures never become JSON-RPC errors.

use klaud_api_tools::Dispatcher;
use rmcp::model::{
    CallToolRequestParams, CallToolResult, Implementation, JsonObject, ListToolsResult,
    PaginatedRequestParams, ProtocolVersion, ServerCapabilities, ServerInfo,
};
use rmcp::service::RequestContext;
use rmcp::{ErrorData as McpError, RoleServer, ServerHandler};
use serde_json::Value;
use std::future::Future;

#[derive(Clone)]
pub struct KlaudServer {
    dispatcher: Dispatcher,
}

impl KlaudServer {
    #[must_use]
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self { dispatcher }
    }

    pub async fn handle_call(&self, name: &str, arguments: Option<JsonObject>) -> CallToolResult {
        let arguments = arguments.map_or(Value::Null, Value::Object);
        self.dispatcher.call_tool(name, &arguments).await
    }
}

impl ServerHandler for KlaudServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            protocol_version: ProtocolVersion::LATEST,
            server_info: Implementation {
                name: "klaud-api".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                title: Some("Klaud API".to_string()),
                ..Default::default()
            },
            instructions: Some(
                "Tools forward to the Klaud API. Content tools (search_*, crypto_prices, \
                 github_trending, extract_url) need no token. Store tools take the token \
                 returned by kv_create_store; messaging, registry and task tools take the \
                 token returned by agent_register. Pass it as `token` or configure it in \
                 the server environment."
                    .to_string(),
            ),
        }
    }

    fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<ListToolsResult, McpError>> + Send + '_ {
        std::future::ready(Ok(ListToolsResult {
            tools: self.dispatcher.list_tools(),
            ..Default::default()
        }))
    }

    fn call_tool(
        &self,
        request: CallToolRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<CallToolResult, McpError>> + Send + '_ {
        async move { Ok(self.handle_call(&request.name, request.arguments).await) }
    }
}
