//! MCP JSON-RPC protocol bridge.
//!
//! Adapts the `search` and `fetch` tools to an MCP Streamable HTTP endpoint
//! that Claude, Cursor, and other MCP clients connect to using the standard
//! JSON-RPC protocol.
//!
//! Error mapping for `tools/call`:
//! * unknown tool → JSON-RPC `METHOD_NOT_FOUND`
//! * arguments that don't decode → JSON-RPC `INVALID_PARAMS`
//! * execution errors (e.g. example not found) → a successful response
//!   carrying an error result
//! * result serialization failure → JSON-RPC `INTERNAL_ERROR`

use std::borrow::Cow;
use std::sync::Arc;

use rmcp::model::*;
use rmcp::{ErrorData as McpError, ServerHandler};

use crate::config::Config;
use crate::tools::{self, ToolCall, ToolError, ToolKind};

/// Bridges the tool set to the MCP JSON-RPC protocol.
///
/// Each MCP session receives a clone of this struct; the config is
/// behind `Arc`, so sessions share it without copying.
#[derive(Clone)]
pub struct McpBridge {
    config: Arc<Config>,
}

impl McpBridge {
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }

    /// Convert a tool kind into an rmcp `Tool` descriptor.
    fn to_mcp_tool(kind: ToolKind) -> Tool {
        let input_schema: Arc<serde_json::Map<String, serde_json::Value>> =
            match kind.parameters_schema() {
                serde_json::Value::Object(map) => Arc::new(map),
                _ => Arc::new(serde_json::Map::new()),
            };

        Tool {
            name: Cow::Borrowed(kind.name()),
            title: None,
            description: Some(Cow::Borrowed(kind.description())),
            input_schema,
            output_schema: None,
            annotations: Some(ToolAnnotations::new().read_only(true)),
            execution: None,
            icons: None,
            meta: None,
        }
    }
}

impl ServerHandler for McpBridge {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "csla-mcp".to_string(),
                title: Some("CSLA .NET Examples".to_string()),
                version: env!("CARGO_PKG_VERSION").to_string(),
                description: None,
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "CSLA .NET code examples and guides. Use the search tool with keywords \
                 to find relevant example files, then fetch to read a file's full content."
                    .to_string(),
            ),
        }
    }

    fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: rmcp::service::RequestContext<rmcp::RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListToolsResult, McpError>> + Send + '_ {
        let tools: Vec<Tool> = ToolKind::ALL.into_iter().map(Self::to_mcp_tool).collect();
        std::future::ready(Ok(ListToolsResult::with_all_items(tools)))
    }

    fn get_tool(&self, name: &str) -> Option<Tool> {
        ToolKind::from_name(name).map(Self::to_mcp_tool)
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        _context: rmcp::service::RequestContext<rmcp::RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        self.dispatch(&request.name, request.arguments).await
    }
}

impl McpBridge {
    /// Decode and run one `tools/call`, mapping failures to MCP errors.
    pub async fn dispatch(
        &self,
        name: &str,
        arguments: Option<JsonObject>,
    ) -> Result<CallToolResult, McpError> {
        let arguments = serde_json::Value::Object(arguments.unwrap_or_default());

        let call = ToolCall::decode(name, arguments).map_err(|e| match e {
            ToolError::UnknownTool(_) => {
                McpError::new(ErrorCode::METHOD_NOT_FOUND, e.to_string(), None)
            }
            _ => McpError::new(ErrorCode::INVALID_PARAMS, e.to_string(), None),
        })?;

        match tools::execute(call, self.config.clone()).await {
            Ok(output) => {
                let text = output
                    .into_text()
                    .map_err(|e| McpError::new(ErrorCode::INTERNAL_ERROR, e.to_string(), None))?;
                Ok(CallToolResult::success(vec![Content::text(text)]))
            }
            Err(e) => Ok(CallToolResult::error(vec![Content::text(e.to_string())])),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_info() {
        let bridge = McpBridge::new(Arc::new(Config::default()));
        let info = bridge.get_info();
        assert_eq!(info.server_info.name, "csla-mcp");
        assert!(info.capabilities.tools.is_some());
        assert!(info.capabilities.prompts.is_none());
    }

    #[test]
    fn test_get_tool_descriptors() {
        let bridge = McpBridge::new(Arc::new(Config::default()));

        let search = bridge.get_tool("search").unwrap();
        assert_eq!(search.name, "search");
        assert_eq!(search.input_schema["required"][0], "message");

        let fetch = bridge.get_tool("fetch").unwrap();
        assert_eq!(fetch.input_schema["properties"]["fileName"]["type"], "string");

        assert!(bridge.get_tool("sources").is_none());
    }

    fn bridge_with_examples() -> (tempfile::TempDir, McpBridge) {
        let tmp = tempfile::TempDir::new().unwrap();
        std::fs::write(tmp.path().join("a.cs"), "public class Customer { }").unwrap();
        std::fs::write(tmp.path().join("b.md"), "# Customer Validation Rules").unwrap();
        let config = Config::default().with_corpus_root(Some(tmp.path().to_path_buf()));
        (tmp, McpBridge::new(Arc::new(config)))
    }

    fn args(value: serde_json::Value) -> Option<JsonObject> {
        match value {
            serde_json::Value::Object(map) => Some(map),
            _ => None,
        }
    }

    fn text_of(result: &CallToolResult) -> &str {
        &result.content[0].as_text().unwrap().text
    }

    #[tokio::test]
    async fn test_dispatch_search_returns_pretty_json() {
        let (_tmp, bridge) = bridge_with_examples();
        let result = bridge
            .dispatch("search", args(serde_json::json!({ "message": "customer validation" })))
            .await
            .unwrap();
        assert_ne!(result.is_error, Some(true));

        let text = text_of(&result);
        assert!(text.contains('\n'));
        let parsed: serde_json::Value = serde_json::from_str(text).unwrap();
        assert_eq!(parsed[0]["FileName"], "b.md");
        assert_eq!(parsed[0]["Score"], 2);
        assert_eq!(parsed[1]["FileName"], "a.cs");
    }

    #[tokio::test]
    async fn test_dispatch_fetch_returns_content() {
        let (_tmp, bridge) = bridge_with_examples();
        let result = bridge
            .dispatch("fetch", args(serde_json::json!({ "fileName": "a.cs" })))
            .await
            .unwrap();
        assert_ne!(result.is_error, Some(true));
        assert_eq!(text_of(&result), "public class Customer { }");
    }

    #[tokio::test]
    async fn test_dispatch_unknown_tool_is_method_not_found() {
        let (_tmp, bridge) = bridge_with_examples();
        let err = bridge.dispatch("sources", None).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::METHOD_NOT_FOUND);
    }

    #[tokio::test]
    async fn test_dispatch_bad_arguments_are_invalid_params() {
        let (_tmp, bridge) = bridge_with_examples();
        let err = bridge.dispatch("fetch", None).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::INVALID_PARAMS);

        let err = bridge
            .dispatch("search", args(serde_json::json!({ "message": 7 })))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::INVALID_PARAMS);
    }

    #[tokio::test]
    async fn test_dispatch_missing_example_is_error_result() {
        let (_tmp, bridge) = bridge_with_examples();
        let result = bridge
            .dispatch("fetch", args(serde_json::json!({ "fileName": "Missing.cs" })))
            .await
            .unwrap();
        assert_eq!(result.is_error, Some(true));
        assert_eq!(text_of(&result), "example not found: Missing.cs");
    }
}
