//! Error types for monitor-assist.
//!
//! Each layer owns a `thiserror` enum; [`Error`] unifies them for the CLI and
//! the MCP server. Remote jobs that report `FAILED` or run out of poll budget
//! are *not* errors: they are returned as descriptive answers.

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Genie conversation failure.
    #[error(transparent)]
    Genie(#[from] GenieError),

    /// Vector search failure.
    #[error(transparent)]
    Search(#[from] SearchError),

    /// Configuration failure.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// CLI or process bootstrap failure.
    #[error(transparent)]
    Command(#[from] CommandError),
}

/// Transport-level failure talking to the Genie service.
///
/// Raised for launch, status polls, and query-result fetches alike. Never
/// retried and never converted into a soft answer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteRequestError {
    /// The request could not be sent or the response could not be read.
    #[error("request to {endpoint} failed: {message}")]
    Connection {
        /// Endpoint path that was being called.
        endpoint: String,
        /// Underlying transport error.
        message: String,
    },

    /// The service answered with a non-success HTTP status.
    #[error("{endpoint} returned HTTP {status}: {body}")]
    Status {
        /// Endpoint path that was being called.
        endpoint: String,
        /// HTTP status code.
        status: u16,
        /// Response body, kept for diagnostics.
        body: String,
    },

    /// The response body was not the expected JSON shape.
    #[error("malformed response from {endpoint}: {message}")]
    Decode {
        /// Endpoint path that was being called.
        endpoint: String,
        /// Parser error.
        message: String,
    },
}

/// Errors from a Genie conversation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenieError {
    /// The question was empty or whitespace.
    #[error("question must not be empty")]
    EmptyQuestion,

    /// A remote request failed.
    #[error(transparent)]
    Remote(#[from] RemoteRequestError),
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// No bearer credential was supplied.
    #[error("missing Genie credential: set DATABRICKS_TOKEN or pass --token")]
    MissingCredential,

    /// A setting had an unusable value.
    #[error("invalid {name} value: {value}")]
    InvalidValue {
        /// Setting name.
        name: &'static str,
        /// Offending value.
        value: String,
    },
}

/// Errors from the vector index and embedding model.
#[derive(Debug, Error)]
pub enum SearchError {
    /// The index file could not be opened.
    #[error("failed to open vector index at {path}: {message}")]
    Open {
        /// Index path.
        path: String,
        /// Underlying error.
        message: String,
    },

    /// No rows exist for the requested table.
    #[error("table not found: {name}")]
    TableNotFound {
        /// Table name.
        name: String,
    },

    /// A SQL statement failed.
    #[error("index query failed: {0}")]
    Sql(#[from] rusqlite::Error),

    /// A stored row could not be decoded.
    #[error("corrupt record {id} in table {table}: {message}")]
    CorruptRecord {
        /// Table name.
        table: String,
        /// Row id.
        id: i64,
        /// What was wrong with it.
        message: String,
    },

    /// Query vector and stored vector have different lengths.
    #[error("vector dimension mismatch: query has {expected}, record {id} has {actual}")]
    DimensionMismatch {
        /// Query dimension.
        expected: usize,
        /// Stored dimension.
        actual: usize,
        /// Row id.
        id: i64,
    },

    /// The embedding model failed.
    #[error("embedding failed: {message}")]
    Embedding {
        /// Model error.
        message: String,
    },
}

/// CLI and bootstrap errors.
#[derive(Debug, Error)]
pub enum CommandError {
    /// A command could not complete.
    #[error("{0}")]
    ExecutionFailed(String),
}
