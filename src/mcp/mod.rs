//! MCP (Model Context Protocol) server for monitor-assist.
//!
//! Exposes the Genie conversation client and the channel search tools to
//! agents over stdio or streamable HTTP.
//!
//! # Feature Gate
//!
//! This module requires the `mcp` feature flag (enabled by default).
//!
//! # Architecture
//!
//! ```text
//! MCP Client (agent)
//!   ├─ ask_genie(question)
//!   │    ↓ GenieClient: launch → poll → extract
//!   │    answer text
//!   └─ search_* / get_channel_lineage / list_platforms
//!        ↓ spawn_blocking
//!        ChannelSearch: embed → vector scan → format
//!        result text
//! ```

pub mod params;
pub mod server;
pub mod transport;

pub use server::MonitorMcpServer;
pub use transport::{router, serve_http, serve_stdio};
