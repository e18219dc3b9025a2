//! MCP tool parameter types.
//!
//! Defines the input schemas for MCP tools using `schemars` for automatic
//! JSON Schema generation required by the MCP protocol.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::search::catalog::DEFAULT_RESULTS;

/// Parameters for the `ask_genie` tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AskParams {
    /// Natural-language question about monitoring data, e.g.
    /// "What was the average wind speed on Atlantis last week?".
    pub question: String,
}

/// Parameters for `search_descriptions`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DescriptionSearchParams {
    /// Natural-language search query (e.g. "roll rate", "wind speed").
    pub query: String,

    /// Platform name or alias filter (e.g. "Constitution", "Atlantis").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,

    /// Device filter (e.g. "6DOF", "GPS").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,

    /// Maximum results to return (default 5).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

/// Parameters for `search_dependencies`, `search_coordinates` and
/// `search_oandm`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PlatformSearchParams {
    /// Natural-language search query.
    pub query: String,

    /// Platform filter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,

    /// Maximum results to return (default 5).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

/// Parameters for `get_channel_lineage`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct LineageParams {
    /// Name of the channel to look up.
    pub channel_name: String,

    /// Platform name or alias (required for specificity).
    pub platform: String,
}

/// Applies the default result count.
pub(crate) fn limit_or_default(limit: Option<usize>) -> usize {
    limit.filter(|&n| n > 0).unwrap_or(DEFAULT_RESULTS)
}
