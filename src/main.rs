//! # csla-mcp CLI
//!
//! ## Usage
//!
//! ```bash
//! csla-mcp [--config ./config/csla-mcp.toml] [--examples-path DIR] <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `csla-mcp serve` | Start the HTTP + MCP server |
//! | `csla-mcp search "<query>"` | Rank examples by keyword matches |
//! | `csla-mcp fetch <file>` | Print one example |
//! | `csla-mcp embed --output <file>` | Generate embeddings for all examples |
//!
//! Diagnostics go to stderr through `tracing` (filter with `RUST_LOG`);
//! command output goes to stdout.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use csla_mcp::{config, embed_cmd, fetch, search, server};

/// csla-mcp: search and serve CSLA .NET code examples over MCP.
#[derive(Parser)]
#[command(
    name = "csla-mcp",
    about = "Search and serve CSLA .NET code examples and guides over MCP",
    version
)]
struct Cli {
    /// Path to configuration file (TOML). Defaults apply if it does not exist.
    #[arg(long, global = true, default_value = "./config/csla-mcp.toml")]
    config: PathBuf,

    /// Examples directory; overrides `[corpus].root` from the config file.
    #[arg(long, global = true)]
    examples_path: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server.
    ///
    /// Serves the MCP Streamable HTTP endpoint at `/mcp` plus a plain JSON
    /// API (`/tools/list`, `/tools/{name}`, `/health`).
    Serve,

    /// Search examples by keyword.
    Search {
        /// Free-text query. Words of 3 characters or fewer are ignored.
        query: String,

        /// Print the results as JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Print an example file by name (relative to the examples directory).
    Fetch {
        name: String,
    },

    /// Generate embeddings for every example via the embedding API.
    ///
    /// Reads AZURE_OPENAI_ENDPOINT, AZURE_OPENAI_API_KEY, and optionally
    /// AZURE_OPENAI_EMBEDDING_MODEL / AZURE_OPENAI_API_VERSION.
    Embed {
        /// Output JSON file.
        #[arg(long, default_value = "embeddings.json")]
        output: PathBuf,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let cfg = config::load_config(&cli.config)?.with_corpus_root(cli.examples_path);

    match cli.command {
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
        Commands::Search { query, json } => {
            search::run_search(&cfg, &query, json)?;
        }
        Commands::Fetch { name } => {
            fetch::run_fetch(&cfg, &name)?;
        }
        Commands::Embed { output } => {
            if let Err(e) = embed_cmd::run_embed(&cfg, &output).await {
                eprintln!("Error: {}", e);
                std::process::exit(e.exit_code());
            }
        }
    }

    Ok(())
}
