//! CLI command implementations.
//!
//! Contains the business logic for each CLI command.

#[cfg(feature = "mcp")]
use crate::cli::parser::McpCommands;
use crate::cli::parser::{Cli, Commands};
use crate::error::{CommandError, Result};
use crate::genie::GenieClient;
use crate::search::{ChannelSearch, default_embedder};

/// Executes the CLI command.
///
/// # Arguments
///
/// * `cli` - Parsed CLI arguments.
///
/// # Returns
///
/// Result with output string on success.
///
/// # Errors
///
/// Returns an error if the command fails to execute.
pub fn execute(cli: &Cli) -> Result<String> {
    match &cli.command {
        Commands::Ask { question } => {
            let client = genie_client(cli)?;
            cmd_ask(&client, question)
        }
        Commands::Descriptions {
            query,
            platform,
            device,
            limit,
        } => Ok(channel_search(cli)?.search_descriptions(
            query,
            platform.as_deref(),
            device.as_deref(),
            *limit,
        )?),
        Commands::Dependencies {
            query,
            platform,
            limit,
        } => Ok(channel_search(cli)?.search_dependencies(query, platform.as_deref(), *limit)?),
        Commands::Coordinates {
            query,
            platform,
            limit,
        } => Ok(channel_search(cli)?.search_coordinates(query, platform.as_deref(), *limit)?),
        Commands::Oandm {
            query,
            platform,
            limit,
        } => Ok(channel_search(cli)?.search_oandm(query, platform.as_deref(), *limit)?),
        Commands::Lineage { channel, platform } => {
            Ok(channel_search(cli)?.channel_lineage(channel, platform)?)
        }
        Commands::Platforms => Ok(ChannelSearch::platforms_in(&cli.get_db_path())?),
        #[cfg(feature = "mcp")]
        Commands::Mcp(cmd) => cmd_mcp(cmd, cli),
    }
}

fn genie_client(cli: &Cli) -> Result<GenieClient> {
    let config = cli.genie.to_config()?;
    Ok(GenieClient::from_config(&config)?)
}

fn channel_search(cli: &Cli) -> Result<ChannelSearch> {
    let embedder = default_embedder()?;
    Ok(ChannelSearch::new(cli.get_db_path(), embedder))
}

fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new().map_err(|e| {
        CommandError::ExecutionFailed(format!("Failed to create async runtime: {e}")).into()
    })
}

/// Asks Genie a question, blocking until the answer is ready.
fn cmd_ask(client: &GenieClient, question: &str) -> Result<String> {
    let rt = runtime()?;
    Ok(rt.block_on(client.ask(question))?)
}

#[cfg(feature = "mcp")]
fn cmd_mcp(cmd: &McpCommands, cli: &Cli) -> Result<String> {
    use crate::error::{ConfigError, Error};
    use crate::mcp::{MonitorMcpServer, serve_http, serve_stdio};
    use tracing::warn;

    let search = channel_search(cli).map_err(|e| {
        CommandError::ExecutionFailed(format!("Failed to create MCP server: {e}"))
    })?;
    let genie = match genie_client(cli) {
        Ok(client) => Some(client),
        Err(Error::Config(ConfigError::MissingCredential)) => {
            warn!("DATABRICKS_TOKEN not set; ask_genie is disabled");
            None
        }
        Err(e) => {
            return Err(CommandError::ExecutionFailed(format!(
                "Failed to create MCP server: {e}"
            ))
            .into());
        }
    };
    let server = MonitorMcpServer::new(search, genie);

    let rt = runtime()?;
    rt.block_on(async {
        match cmd {
            McpCommands::Stdio => serve_stdio(server).await,
            McpCommands::Http { host, port } => serve_http(server, host, *port).await,
        }
    })
    .map_err(|e| CommandError::ExecutionFailed(format!("MCP server error: {e}")))?;

    Ok(String::new())
}
