//! # monitor-assist
//!
//! Query tools for agents working on a marine monitoring system.
//!
//! - [`genie`] asks Databricks Genie a natural-language question and waits
//!   for the answer (launch, bounded polling, result extraction).
//! - [`search`] runs semantic search over channel descriptions, dependencies,
//!   coordinate systems and O&M manuals.
//! - [`mcp`] exposes both as MCP tools over stdio or streamable HTTP.
//!
//! ## Example
//!
//! ```no_run
//! use monitor_assist::genie::{GenieClient, GenieConfig};
//!
//! # async fn run() -> monitor_assist::Result<()> {
//! let config = GenieConfig::from_env()?;
//! let client = GenieClient::from_config(&config)?;
//! let answer = client.ask("Which platforms reported wind speed today?").await?;
//! # let _ = answer;
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod error;
pub mod genie;
#[cfg(feature = "mcp")]
pub mod mcp;
pub mod search;

pub use error::{Error, Result};
pub use genie::{GenieClient, GenieConfig, PollOutcome, PollPolicy};
pub use search::{ChannelSearch, Embedder, HashEmbedder};
