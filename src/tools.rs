//! Tool definitions and typed dispatch.
//!
//! The server exposes two tools, `search` and `fetch`. An incoming call
//! (tool name + JSON arguments) is decoded once into a [`ToolCall`], whose
//! variants carry strongly typed argument structs. Everything downstream
//! matches on the enum instead of poking at loose JSON.
//!
//! ```rust
//! use csla_mcp::tools::{ToolCall, ToolKind};
//!
//! let call = ToolCall::decode("fetch", serde_json::json!({ "fileName": "Customer.cs" })).unwrap();
//! assert_eq!(call.kind(), ToolKind::Fetch);
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

use crate::config::{Config, CorpusConfig};
use crate::error::CorpusError;
use crate::fetch::fetch_example;
use crate::models::SearchResult;
use crate::search::search_examples;

/// Arguments of the `search` tool.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SearchArgs {
    /// Free-text query. Empty or short-word-only queries yield no results.
    pub message: String,
}

/// Arguments of the `fetch` tool.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchArgs {
    pub file_name: String,
}

/// A decoded tool invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolCall {
    Search(SearchArgs),
    Fetch(FetchArgs),
}

/// The set of tools this server offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    Search,
    Fetch,
}

/// Tool descriptor returned by `GET /tools/list`.
#[derive(Debug, Clone, Serialize)]
pub struct ToolInfo {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("no tool registered with name: {0}")]
    UnknownTool(String),

    #[error("invalid arguments for {tool}: {source}")]
    InvalidArguments {
        tool: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Corpus(#[from] CorpusError),

    #[error("tool execution failed: {0}")]
    Internal(String),
}

/// Result of a tool call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolOutput {
    Results(Vec<SearchResult>),
    Content(String),
}

impl ToolKind {
    pub const ALL: [ToolKind; 2] = [ToolKind::Search, ToolKind::Fetch];

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "search" => Some(Self::Search),
            "fetch" => Some(Self::Fetch),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Search => "search",
            Self::Fetch => "fetch",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Search => {
                "Search CSLA .NET code examples and guides by keyword. Returns files \
                 ranked by how often the query words occur in them."
            }
            Self::Fetch => "Fetch the full content of a CSLA .NET example file by name",
        }
    }

    /// JSON Schema for the tool's arguments.
    pub fn parameters_schema(self) -> Value {
        match self {
            Self::Search => serde_json::json!({
                "type": "object",
                "properties": {
                    "message": {
                        "type": "string",
                        "description": "Keywords or a question; words of 3 characters or fewer are ignored"
                    }
                },
                "required": ["message"]
            }),
            Self::Fetch => serde_json::json!({
                "type": "object",
                "properties": {
                    "fileName": {
                        "type": "string",
                        "description": "File name as returned by search, relative to the examples root"
                    }
                },
                "required": ["fileName"]
            }),
        }
    }

    pub fn info(self) -> ToolInfo {
        ToolInfo {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }
}

impl ToolCall {
    /// Decode a call from its tool name and JSON arguments.
    ///
    /// `null` arguments are treated as an empty object.
    pub fn decode(name: &str, arguments: Value) -> Result<Self, ToolError> {
        let kind =
            ToolKind::from_name(name).ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;

        let arguments = match arguments {
            Value::Null => Value::Object(serde_json::Map::new()),
            other => other,
        };
        let invalid = |source| ToolError::InvalidArguments {
            tool: kind.name(),
            source,
        };

        match kind {
            ToolKind::Search => serde_json::from_value(arguments)
                .map(ToolCall::Search)
                .map_err(invalid),
            ToolKind::Fetch => serde_json::from_value(arguments)
                .map(ToolCall::Fetch)
                .map_err(invalid),
        }
    }

    pub fn kind(&self) -> ToolKind {
        match self {
            Self::Search(_) => ToolKind::Search,
            Self::Fetch(_) => ToolKind::Fetch,
        }
    }

    /// Run the call synchronously against the corpus.
    pub fn run(self, corpus: &CorpusConfig) -> Result<ToolOutput, ToolError> {
        match self {
            Self::Search(args) => Ok(ToolOutput::Results(search_examples(
                corpus,
                &args.message,
            )?)),
            Self::Fetch(args) => Ok(ToolOutput::Content(fetch_example(
                corpus,
                &args.file_name,
            )?)),
        }
    }
}

impl ToolOutput {
    /// JSON value used in the HTTP API's `{ "result": ... }` envelope.
    pub fn to_json(&self) -> Result<Value, ToolError> {
        match self {
            Self::Results(results) => serde_json::to_value(results).map_err(serialize_failed),
            Self::Content(content) => Ok(Value::String(content.clone())),
        }
    }

    /// Text used in MCP tool results: pretty JSON for search, raw file text for fetch.
    pub fn into_text(self) -> Result<String, ToolError> {
        match self {
            Self::Results(results) => {
                serde_json::to_string_pretty(&results).map_err(serialize_failed)
            }
            Self::Content(content) => Ok(content),
        }
    }
}

fn serialize_failed(e: serde_json::Error) -> ToolError {
    ToolError::Internal(format!("failed to serialize results: {}", e))
}

/// Execute a call on the blocking pool. Shared by the HTTP API and the MCP bridge.
pub async fn execute(call: ToolCall, config: Arc<Config>) -> Result<ToolOutput, ToolError> {
    let tool = call.kind().name();
    tracing::debug!(tool, "executing tool");

    let output = tokio::task::spawn_blocking(move || call.run(&config.corpus))
        .await
        .map_err(|e| ToolError::Internal(e.to_string()))?;

    if let Err(ref e) = output {
        tracing::debug!(tool, error = %e, "tool call failed");
    }
    output
}
