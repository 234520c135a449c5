//! # csla-mcp
//!
//! An MCP server that hosts a library of CSLA .NET code examples (`.cs`)
//! and markdown guides (`.md`), and lets AI tools search and read them.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//! │  Examples    │──▶│ Search/Fetch │──▶│  HTTP + MCP  │
//! │  directory   │   │   (tools)    │   │   (axum)     │
//! └──────┬───────┘   └──────────────┘   └──────────────┘
//!        │
//!        ▼
//! ┌──────────────┐   ┌──────────────┐
//! │  embed job   │──▶│ embeddings   │
//! │ (Azure API)  │   │   .json      │
//! └──────────────┘   └──────────────┘
//! ```
//!
//! There is no index: every search rescans the examples directory, which
//! is fine for the tens to hundreds of files it holds.
//!
//! ## Quick Start
//!
//! ```bash
//! csla-mcp --examples-path ./csla-examples search "business rules"
//! csla-mcp --examples-path ./csla-examples fetch Customer.cs
//! csla-mcp serve                     # MCP endpoint at http://127.0.0.1:8080/mcp
//! csla-mcp embed --output embeddings.json
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing and validation |
//! | [`error`] | Corpus error taxonomy |
//! | [`models`] | `Document`, `SearchResult`, `WordMatch`, `EmbeddingRecord` |
//! | [`corpus`] | Recursive example enumeration and reading |
//! | [`search`] | Keyword tokenization, scoring, and ranking |
//! | [`fetch`] | Example retrieval by file name |
//! | [`tools`] | Typed tool dispatch shared by HTTP and MCP |
//! | [`mcp`] | MCP JSON-RPC bridge |
//! | [`server`] | HTTP server (Axum) with CORS |
//! | [`embedding`] | Embedding API client with retry |
//! | [`embed_cmd`] | Embeddings batch job |

pub mod config;
pub mod corpus;
pub mod embed_cmd;
pub mod embedding;
pub mod error;
pub mod fetch;
pub mod mcp;
pub mod models;
pub mod search;
pub mod server;
pub mod tools;

pub use error::CorpusError;
pub use models::{Document, EmbeddingRecord, SearchResult, WordMatch};
pub use tools::{ToolCall, ToolKind, ToolOutput};
