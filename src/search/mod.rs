//! Semantic search over the monitoring-system channel catalog.
//!
//! [`store`] is the vector index (`open_table` / `search` / `filter` /
//! `limit` / `to_list`), [`embedding`] turns query text into vectors, and
//! [`catalog`] exposes the agent-facing tools that render hits as text.

pub mod catalog;
pub mod embedding;
pub mod filter;
pub mod format;
pub mod store;

pub use catalog::ChannelSearch;
pub use embedding::{Embedder, HashEmbedder, default_embedder};
#[cfg(feature = "fastembed-embeddings")]
pub use embedding::FastEmbedder;
pub use filter::Predicate;
pub use store::{DEFAULT_DB_PATH, Hit, Record, Table, VectorDb};
