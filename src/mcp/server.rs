//! MCP server implementation for monitor-assist.
//!
//! Exposes the Genie client and the channel search tools as MCP tools.
//! Search calls are blocking (`SQLite` scan plus model inference) and run on
//! `spawn_blocking`; Genie conversations are async and awaited directly.

use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo,
};
use rmcp::{ErrorData as McpError, ServerHandler, tool, tool_handler, tool_router};

use crate::error::{GenieError, SearchError};
use crate::genie::GenieClient;
use crate::search::ChannelSearch;

use super::params::{
    AskParams, DescriptionSearchParams, LineageParams, PlatformSearchParams, limit_or_default,
};

const INSTRUCTIONS: &str = "Monitoring-system assistant tools.\n\
    - `ask_genie`: ask a natural-language analytics question over the monitoring \
      data warehouse (only listed when a Databricks credential is configured). \
      Failed or timed-out queries come back as text describing what happened.\n\
    - `search_descriptions`, `search_dependencies`, `search_coordinates`, \
      `search_oandm`: semantic search over channel documentation, optionally \
      filtered by platform.\n\
    - `get_channel_lineage`: upstream inputs and downstream outputs of one channel.\n\
    - `list_platforms`: platforms present in the index.";

fn genie_error(e: GenieError) -> McpError {
    match e {
        GenieError::EmptyQuestion => McpError::invalid_params(e.to_string(), None),
        GenieError::Remote(_) => McpError::internal_error(format!("Genie request failed: {e}"), None),
    }
}

fn search_error(e: SearchError) -> McpError {
    McpError::internal_error(format!("Search failed: {e}"), None)
}

/// Monitor-assist MCP server.
#[derive(Clone)]
pub struct MonitorMcpServer {
    tool_router: ToolRouter<Self>,
    search: ChannelSearch,
    genie: Option<GenieClient>,
}

impl MonitorMcpServer {
    /// Creates a server.
    ///
    /// `ask_genie` is only registered when `genie` is present, so clients
    /// without a credential never see a tool that cannot work.
    #[must_use]
    pub fn new(search: ChannelSearch, genie: Option<GenieClient>) -> Self {
        let tool_router = if genie.is_some() {
            Self::search_router() + Self::genie_router()
        } else {
            Self::search_router()
        };
        Self {
            tool_router,
            search,
            genie,
        }
    }

    async fn run_search<F>(&self, op: F) -> Result<CallToolResult, McpError>
    where
        F: FnOnce(&ChannelSearch) -> Result<String, SearchError> + Send + 'static,
    {
        let search = self.search.clone();
        let text = tokio::task::spawn_blocking(move || op(&search))
            .await
            .map_err(|e| McpError::internal_error(format!("Task join error: {e}"), None))?
            .map_err(search_error)?;
        Ok(CallToolResult::success(vec![Content::text(text)]))
    }
}

#[tool_router(router = genie_router)]
impl MonitorMcpServer {
    /// Ask Genie a question and wait for the answer.
    #[tool(
        name = "ask_genie",
        description = "Ask Databricks Genie a natural-language question about monitoring data. Starts a conversation, waits up to about two minutes for the query to finish, and returns the tabular result or text answer. A failed or timed-out query is reported in the returned text."
    )]
    async fn ask_genie(
        &self,
        Parameters(params): Parameters<AskParams>,
    ) -> Result<CallToolResult, McpError> {
        let genie = self.genie.as_ref().ok_or_else(|| {
            McpError::internal_error("Genie is not configured: set DATABRICKS_TOKEN", None)
        })?;
        let answer = genie.ask(&params.question).await.map_err(genie_error)?;
        Ok(CallToolResult::success(vec![Content::text(answer)]))
    }
}

#[tool_router(router = search_router)]
impl MonitorMcpServer {
    /// Semantic search over channel descriptions.
    #[tool(
        name = "search_descriptions",
        description = "Search channel descriptions by semantic similarity. Optional platform (name or alias) and device filters. Returns platform, system, device, channel name, units and description for each match."
    )]
    async fn search_descriptions(
        &self,
        Parameters(params): Parameters<DescriptionSearchParams>,
    ) -> Result<CallToolResult, McpError> {
        self.run_search(move |s| {
            s.search_descriptions(
                &params.query,
                params.platform.as_deref(),
                params.device.as_deref(),
                limit_or_default(params.limit),
            )
        })
        .await
    }

    /// Semantic search over channel dependencies.
    #[tool(
        name = "search_dependencies",
        description = "Search channel dependencies and lineage. Returns matching channels marked DERIVED or RAW with their upstream inputs and downstream outputs."
    )]
    async fn search_dependencies(
        &self,
        Parameters(params): Parameters<PlatformSearchParams>,
    ) -> Result<CallToolResult, McpError> {
        self.run_search(move |s| {
            s.search_dependencies(
                &params.query,
                params.platform.as_deref(),
                limit_or_default(params.limit),
            )
        })
        .await
    }

    /// Semantic search over sensor coordinates.
    #[tool(
        name = "search_coordinates",
        description = "Search platform and sensor coordinate systems. Returns sensor location, axis orientation (+X, +Y, +Z), platform heading and latitude/longitude."
    )]
    async fn search_coordinates(
        &self,
        Parameters(params): Parameters<PlatformSearchParams>,
    ) -> Result<CallToolResult, McpError> {
        self.run_search(move |s| {
            s.search_coordinates(
                &params.query,
                params.platform.as_deref(),
                limit_or_default(params.limit),
            )
        })
        .await
    }

    /// Semantic search over O&M manual excerpts.
    #[tool(
        name = "search_oandm",
        description = "Search Operations & Maintenance manual content. Returns excerpts with source document and chunk position. The platform filter matches the full platform name."
    )]
    async fn search_oandm(
        &self,
        Parameters(params): Parameters<PlatformSearchParams>,
    ) -> Result<CallToolResult, McpError> {
        self.run_search(move |s| {
            s.search_oandm(
                &params.query,
                params.platform.as_deref(),
                limit_or_default(params.limit),
            )
        })
        .await
    }

    /// Full lineage of one channel.
    #[tool(
        name = "get_channel_lineage",
        description = "Get the upstream inputs and downstream outputs of a specific channel on a platform, with its system, device, units and whether it is derived or measured."
    )]
    async fn get_channel_lineage(
        &self,
        Parameters(params): Parameters<LineageParams>,
    ) -> Result<CallToolResult, McpError> {
        if params.channel_name.trim().is_empty() {
            return Err(McpError::invalid_params("channel_name must not be empty", None));
        }
        self.run_search(move |s| s.channel_lineage(&params.channel_name, &params.platform))
            .await
    }

    /// Platform inventory.
    #[tool(
        name = "list_platforms",
        description = "List all platforms in the index and which tables (desc, depe, coor, oand) hold data for each."
    )]
    async fn list_platforms(&self) -> Result<CallToolResult, McpError> {
        self.run_search(ChannelSearch::list_platforms).await
    }
}

#[tool_handler]
impl ServerHandler for MonitorMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "monitor-assist".to_string(),
                title: Some("Monitoring System Assistant".to_string()),
                version: env!("CARGO_PKG_VERSION").to_string(),
                icons: None,
                website_url: None,
            },
            instructions: Some(INSTRUCTIONS.to_string()),
        }
    }
}
