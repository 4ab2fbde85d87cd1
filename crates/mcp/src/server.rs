//! MCP protocol surface: tool listing and dispatch over stdio.

use std::sync::Arc;
use std::time::Instant;

use rmcp::{
    handler::server::ServerHandler,
    model::{
        CallToolRequestParam, CallToolResult, Content, ErrorCode, Implementation, JsonObject,
        ListToolsResult, PaginatedRequestParam, ProtocolVersion, ServerCapabilities, ServerInfo,
        Tool,
    },
    service::{RequestContext, RoleServer},
    ErrorData as McpError, ServiceExt,
};
use serde_json::Value;
use tiendanube_client::StoreApi;
use tracing::info;
use uuid::Uuid;

use crate::error::ToolError;
use crate::registry::{RegistryError, ToolRegistry};

pub const SERVER_NAME: &str = "tiendanube-mcp-server";

const INSTRUCTIONS: &str = "Tienda Nube (Nuvemshop) store management. \
    Call tiendanube_authenticate first unless the server was started with store credentials. \
    Tools cover products and variants, orders, customers, categories, coupons, webhooks, scripts, \
    carts and checkouts, fulfillment, transactions, metafields, custom fields and business rules. \
    Failed calls return {success: false, error, type}.";

/// MCP server backed by one Tienda Nube store connection.
#[derive(Clone)]
pub struct TiendanubeMcpServer {
    registry: Arc<ToolRegistry>,
    api: Arc<dyn StoreApi>,
}

impl TiendanubeMcpServer {
    /// Server exposing every built-in tool.
    pub fn new(api: Arc<dyn StoreApi>) -> Result<Self, RegistryError> {
        Ok(Self::with_registry(ToolRegistry::builtin()?, api))
    }

    pub fn with_registry(registry: ToolRegistry, api: Arc<dyn StoreApi>) -> Self {
        Self { registry: Arc::new(registry), api }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn tools(&self) -> Vec<Tool> {
        self.registry.tools()
    }

    /// Runs one tool call. Tool failures come back as an error result carrying
    /// the envelope; only an unknown name is a protocol error.
    pub async fn call(
        &self,
        name: &str,
        arguments: Option<JsonObject>,
    ) -> Result<CallToolResult, McpError> {
        let correlation_id = Uuid::new_v4();
        let started = Instant::now();
        info!(event_name = "tool.call.started", tool = name, %correlation_id, "tool call started");

        let args = Value::Object(arguments.unwrap_or_default());
        let reply = match self.registry.dispatch(name, args, self.api.as_ref()).await {
            Ok(reply) => reply,
            Err(ToolError::UnknownTool(_)) => {
                info!(event_name = "tool.call.unknown", tool = name, %correlation_id, "unknown tool");
                return Err(McpError::new(
                    ErrorCode::METHOD_NOT_FOUND,
                    format!("Unknown tool: {name}"),
                    None,
                ));
            }
            Err(error) => return Err(McpError::internal_error(error.to_string(), None)),
        };

        info!(
            event_name = "tool.call.completed",
            tool = name,
            %correlation_id,
            is_error = reply.is_error,
            duration_ms = started.elapsed().as_millis() as u64,
            "tool call completed"
        );

        let text = serde_json::to_string_pretty(&reply.payload)
            .unwrap_or_else(|_| reply.payload.to_string());
        let content = vec![Content::text(text)];
        Ok(if reply.is_error {
            CallToolResult::error(content)
        } else {
            CallToolResult::success(content)
        })
    }

    /// Serves MCP over stdin/stdout until the peer disconnects or Ctrl-C.
    pub async fn run_stdio(self) -> anyhow::Result<()> {
        use tokio::io::{stdin, stdout};

        info!(event_name = "system.mcp.transport", transport = "stdio", tools = self.registry.len(), "serving MCP");

        let service = self.serve((stdin(), stdout())).await?;
        let cancel = service.cancellation_token();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        });

        let reason = service.waiting().await?;
        info!(event_name = "system.mcp.stopped", reason = ?reason, "MCP server stopped");
        Ok(())
    }
}

impl ServerHandler for TiendanubeMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: SERVER_NAME.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                ..Default::default()
            },
            instructions: Some(INSTRUCTIONS.to_string()),
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        Ok(ListToolsResult::with_all_items(self.tools()))
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        self.call(&request.name, request.arguments).await
    }
}
