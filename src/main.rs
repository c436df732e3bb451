//! # Docdex CLI (`docdex`)
//!
//! The `docdex` binary drives the indexing pipeline and serves the tool API.
//!
//! ## Usage
//!
//! ```bash
//! docdex --config ./config/docdex.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `docdex init` | Create the SQLite database and run schema migrations |
//! | `docdex index` | Scan the blob store and reconcile the document index |
//! | `docdex search "<keywords>"` | Federated search (content API + index) |
//! | `docdex get <key>` | Retrieve a full document by key |
//! | `docdex status` | Show source configuration and health |
//! | `docdex serve mcp` | Start the HTTP + MCP server |

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use docdex::{config, federated, index, migrate, server, status};

/// Docdex CLI — document indexing and federated retrieval for AI tools.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/docdex.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "docdex",
    about = "Docdex — document indexing and federated retrieval for AI tools",
    version,
    long_about = "Docdex scans Markdown documents from a blob store (filesystem or S3-compatible), \
    reconciles their metadata into a SQLite index, and exposes federated keyword search across the \
    index and a remote content API via a CLI and an MCP-compatible HTTP server."
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/docdex.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite database file and the index table. Idempotent —
    /// running it multiple times is safe.
    Init,

    /// Scan the blob store and reconcile the document index.
    ///
    /// Lists Markdown documents under the configured prefix, parses their
    /// metadata, and upserts one index record per filename stem. Documents
    /// that fail to process are reported without aborting the run.
    Index {
        /// Maximum number of documents to process.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Search the content API and the document index by keyword.
    Search {
        /// Search keywords.
        keywords: String,

        /// Which sources to consult: `all`, `content`, or `index`.
        #[arg(long, default_value = "all")]
        scope: String,

        /// Per-source result cap (1-10).
        #[arg(long)]
        max_results: Option<i64>,
    },

    /// Retrieve a document by its key (filename stem).
    ///
    /// Prints the index record's metadata and the raw Markdown body fetched
    /// back out of the blob store.
    Get {
        /// Document key.
        key: String,
    },

    /// Show source configuration and health.
    Status,

    /// Start the HTTP + MCP server.
    ///
    /// Exposes the tool registry via a JSON API and an MCP Streamable HTTP
    /// endpoint for integration with Cursor, Claude, and other AI tools.
    Serve {
        #[command(subcommand)]
        service: ServeService,
    },
}

/// Server subcommands.
#[derive(Subcommand)]
enum ServeService {
    /// Start the MCP tool server.
    ///
    /// Binds to the address configured in `[server].bind`.
    Mcp,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Index { limit } => {
            index::run_index(&cfg, limit).await?;
        }
        Commands::Search {
            keywords,
            scope,
            max_results,
        } => {
            let scope = scope.parse()?;
            federated::run_search(&cfg, &keywords, scope, max_results).await?;
        }
        Commands::Get { key } => {
            federated::run_get(&cfg, &key).await?;
        }
        Commands::Status => {
            status::run_status(&cfg).await?;
        }
        Commands::Serve { service } => match service {
            ServeService::Mcp => {
                server::run_server(&cfg).await?;
            }
        },
    }

    Ok(())
}
