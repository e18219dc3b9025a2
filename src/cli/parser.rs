//! Command-line argument parsing.
//!
//! Defines the CLI structure using clap derive macros.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::genie::GenieConfig;
use crate::search::catalog::DEFAULT_RESULTS;

/// monitor-assist: query tools for monitoring-system agents.
///
/// Ask Databricks Genie analytics questions and search channel
/// documentation (descriptions, lineage, coordinates, O&M manuals).
#[derive(Parser, Debug)]
#[command(name = "monitor-assist")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the channel vector index.
    ///
    /// Defaults to `channel_summary_vectordb/vectors.db` in the current directory.
    #[arg(long, env = "VECTOR_DB_PATH", global = true)]
    pub db_path: Option<PathBuf>,

    /// Enable debug logging on stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Genie connection settings.
    #[command(flatten)]
    pub genie: GenieArgs,

    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Databricks Genie connection flags.
#[derive(Args, Debug, Clone, Default)]
pub struct GenieArgs {
    /// Databricks workspace URL.
    #[arg(long = "databricks-host", env = "DATABRICKS_HOST", global = true)]
    pub host: Option<String>,

    /// Databricks personal access token.
    #[arg(long, env = "DATABRICKS_TOKEN", hide_env_values = true, global = true)]
    pub token: Option<String>,

    /// Genie space to converse with.
    #[arg(long, env = "GENIE_SPACE_ID", global = true)]
    pub space_id: Option<String>,
}

impl GenieArgs {
    /// Resolves flags, then environment, then defaults.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::ConfigError`] if no token is available or a
    /// value is invalid.
    pub fn to_config(&self) -> Result<GenieConfig, crate::error::ConfigError> {
        let mut builder = GenieConfig::builder();
        if let Some(host) = &self.host {
            builder = builder.host(host.as_str());
        }
        if let Some(token) = &self.token {
            builder = builder.token(token.as_str());
        }
        if let Some(space_id) = &self.space_id {
            builder = builder.space_id(space_id.as_str());
        }
        builder.from_env().build()
    }
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Ask Databricks Genie a natural-language question.
    ///
    /// Starts a conversation, polls until the answer is ready (about two
    /// minutes at most) and prints the query result or text answer.
    #[command(after_help = r#"Examples:
  monitor-assist ask "Average wind speed on Atlantis yesterday?"
  DATABRICKS_TOKEN=dapi... monitor-assist ask "How many channels per platform?"
"#)]
    Ask {
        /// The question.
        question: String,
    },

    /// Search channel descriptions.
    #[command(after_help = r#"Examples:
  monitor-assist descriptions "roll rate"
  monitor-assist descriptions "wind speed" -p Atlantis -n 10
  monitor-assist descriptions "position" -p CONS -d GPS
"#)]
    Descriptions {
        /// Search query.
        query: String,

        /// Platform name or alias filter.
        #[arg(short, long)]
        platform: Option<String>,

        /// Device filter.
        #[arg(short, long)]
        device: Option<String>,

        /// Max results.
        #[arg(short = 'n', long, default_value_t = DEFAULT_RESULTS)]
        limit: usize,
    },

    /// Search channel dependencies.
    Dependencies {
        /// Search query.
        query: String,

        /// Platform name or alias filter.
        #[arg(short, long)]
        platform: Option<String>,

        /// Max results.
        #[arg(short = 'n', long, default_value_t = DEFAULT_RESULTS)]
        limit: usize,
    },

    /// Search coordinate systems.
    Coordinates {
        /// Search query.
        query: String,

        /// Platform name or alias filter.
        #[arg(short, long)]
        platform: Option<String>,

        /// Max results.
        #[arg(short = 'n', long, default_value_t = DEFAULT_RESULTS)]
        limit: usize,
    },

    /// Search O&M manuals.
    Oandm {
        /// Search query.
        query: String,

        /// Platform name filter.
        #[arg(short, long)]
        platform: Option<String>,

        /// Max results.
        #[arg(short = 'n', long, default_value_t = DEFAULT_RESULTS)]
        limit: usize,
    },

    /// Get channel lineage.
    #[command(after_help = r#"Examples:
  monitor-assist lineage WSPD_TRUE -p Atlantis
"#)]
    Lineage {
        /// Channel name.
        channel: String,

        /// Platform name or alias.
        #[arg(short, long)]
        platform: String,
    },

    /// List available platforms.
    Platforms,

    /// Start MCP (Model Context Protocol) server.
    #[cfg(feature = "mcp")]
    #[command(subcommand)]
    Mcp(McpCommands),
}

/// MCP server subcommands.
#[cfg(feature = "mcp")]
#[derive(Subcommand, Debug)]
pub enum McpCommands {
    /// Start MCP server with stdio transport.
    ///
    /// Reads JSON-RPC messages from stdin, writes responses to stdout.
    #[command(after_help = r#"Examples:
  monitor-assist mcp stdio
  DATABRICKS_TOKEN=dapi... monitor-assist mcp stdio   # Also exposes ask_genie
"#)]
    Stdio,

    /// Start MCP server with streamable HTTP transport at `/mcp`.
    #[command(after_help = r#"Examples:
  monitor-assist mcp http                            # Listen on 127.0.0.1:3000
  monitor-assist mcp http --host 0.0.0.0 --port 8080
"#)]
    Http {
        /// Host to bind to.
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to.
        #[arg(long, default_value = "3000")]
        port: u16,
    },
}

impl Cli {
    /// Returns the index path, using the default if not specified.
    #[must_use]
    pub fn get_db_path(&self) -> PathBuf {
        self.db_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(crate::search::DEFAULT_DB_PATH))
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap_or_else(|e| panic!("parse failed: {e}"))
    }

    #[test]
    fn test_cli_parse() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_default_db_path() {
        let cli = Cli {
            db_path: None,
            verbose: false,
            genie: GenieArgs::default(),
            command: Commands::Platforms,
        };
        assert_eq!(
            cli.get_db_path(),
            PathBuf::from("channel_summary_vectordb/vectors.db")
        );
    }

    #[test]
    fn test_descriptions_flags() {
        let cli = parse(&[
            "monitor-assist",
            "--db-path",
            "/tmp/x.db",
            "descriptions",
            "roll rate",
            "-p",
            "CONS",
            "-d",
            "6DOF",
            "-n",
            "3",
        ]);
        assert_eq!(cli.get_db_path(), PathBuf::from("/tmp/x.db"));
        match cli.command {
            Commands::Descriptions {
                query,
                platform,
                device,
                limit,
            } => {
                assert_eq!(query, "roll rate");
                assert_eq!(platform.as_deref(), Some("CONS"));
                assert_eq!(device.as_deref(), Some("6DOF"));
                assert_eq!(limit, 3);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_search_limit_defaults_to_five() {
        let cli = parse(&["monitor-assist", "oandm", "calibration"]);
        assert!(matches!(cli.command, Commands::Oandm { limit: 5, .. }));
    }

    #[test]
    fn test_lineage_requires_platform() {
        assert!(Cli::try_parse_from(["monitor-assist", "lineage", "WSPD"]).is_err());
        let cli = parse(&["monitor-assist", "lineage", "WSPD", "--platform", "Atlantis"]);
        assert!(matches!(cli.command, Commands::Lineage { .. }));
    }

    #[test]
    fn test_genie_flags_are_global() {
        let cli = parse(&[
            "monitor-assist",
            "ask",
            "hello",
            "--token",
            "dapi-x",
            "--databricks-host",
            "https://example.cloud.databricks.com",
            "--space-id",
            "s1",
        ]);
        let config = cli
            .genie
            .to_config()
            .unwrap_or_else(|e| panic!("config: {e}"));
        assert_eq!(config.token, "dapi-x");
        assert_eq!(config.host, "https://example.cloud.databricks.com");
        assert_eq!(config.space_id, "s1");
    }

    #[cfg(feature = "mcp")]
    #[test]
    fn test_mcp_http_defaults() {
        let cli = parse(&["monitor-assist", "mcp", "http"]);
        match cli.command {
            Commands::Mcp(McpCommands::Http { host, port }) => {
                assert_eq!(host, "127.0.0.1");
                assert_eq!(port, 3000);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
