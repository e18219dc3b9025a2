//! Wire types for the Genie conversation API.
//!
//! Remote payloads are decoded once, here, into types with explicit optional
//! fields. Partial metadata is normal: a missing status means "not terminal",
//! missing or `null` attachments mean none, and an absent error detail falls
//! back to a placeholder at render time. A field of the wrong JSON type reads
//! as absent, so one odd attachment never fails the whole message.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of `POST /start-conversation`.
#[derive(Debug, Clone, Serialize)]
pub struct StartConversationRequest<'a> {
    /// The natural-language question.
    pub content: &'a str,
}

/// Identifiers returned by a successful launch.
///
/// Both are opaque and reused verbatim for every later request of the same
/// invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationHandle {
    /// Remote conversation id.
    pub conversation_id: String,
    /// Id of the message carrying the question.
    pub message_id: String,
}

/// Remote message status as seen by the client.
///
/// Only `COMPLETED` and `FAILED` are terminal; every other token (including
/// ones this client has never heard of) means the job is still running.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum MessageStatus {
    /// Job finished with content.
    Completed,
    /// Job failed remotely.
    Failed,
    /// Any non-terminal token, kept for logging.
    Pending(String),
    /// Status field absent.
    #[default]
    Unknown,
}

impl MessageStatus {
    /// Parses a remote status token.
    #[must_use]
    pub fn parse(token: &str) -> Self {
        match token {
            "COMPLETED" => Self::Completed,
            "FAILED" => Self::Failed,
            other => Self::Pending(other.to_string()),
        }
    }

    /// Returns `true` for `COMPLETED` and `FAILED`.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Status token for logs.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
            Self::Pending(token) => token,
            Self::Unknown => "<missing>",
        }
    }
}

/// One typed piece of message content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attachment {
    /// Plain text answer.
    Text {
        /// Text content, if the service sent any.
        content: Option<String>,
    },
    /// Reference to a tabular result that must be fetched separately.
    QueryResult {
        /// Remote query id, if present.
        query_id: Option<String>,
    },
    /// Attachment type this client does not render.
    Other {
        /// Raw `type` value.
        kind: Option<String>,
    },
}

/// A message as returned by the status endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(from = "RawMessage")]
pub struct GenieMessage {
    /// Lifecycle status.
    pub status: MessageStatus,
    /// Attachments in service order.
    pub attachments: Vec<Attachment>,
    /// Remote error detail, if the service supplied one.
    pub error: Option<String>,
}

#[derive(Deserialize)]
struct RawMessage {
    #[serde(default)]
    status: Option<Value>,
    #[serde(default)]
    attachments: Option<Value>,
    #[serde(default)]
    error: Option<Value>,
}

/// String at `path` inside `value`; any other shape reads as absent.
fn str_at(value: &Value, path: &[&str]) -> Option<String> {
    path.iter()
        .try_fold(value, |v, key| v.get(key))
        .and_then(Value::as_str)
        .map(str::to_string)
}

impl From<&Value> for Attachment {
    fn from(raw: &Value) -> Self {
        let kind = str_at(raw, &["type"]);
        match kind.as_deref() {
            Some("TEXT") => Self::Text {
                content: str_at(raw, &["text", "content"]),
            },
            Some("QUERY_RESULT") => Self::QueryResult {
                query_id: match raw.get("query").and_then(|q| q.get("query_id")) {
                    Some(Value::String(id)) if !id.is_empty() => Some(id.clone()),
                    Some(Value::Number(id)) => Some(id.to_string()),
                    _ => None,
                },
            },
            _ => Self::Other { kind },
        }
    }
}

impl From<RawMessage> for GenieMessage {
    fn from(raw: RawMessage) -> Self {
        let status = match raw.status {
            Some(Value::String(token)) => MessageStatus::parse(&token),
            _ => MessageStatus::Unknown,
        };
        let attachments = match raw.attachments {
            Some(Value::Array(items)) => items.iter().map(Attachment::from).collect(),
            _ => Vec::new(),
        };
        Self {
            status,
            attachments,
            error: raw.error.and_then(error_detail),
        }
    }
}

/// Flattens the remote `error` field to text.
///
/// The service sends either a bare string or an object with a `message`
/// (sometimes `error`) member; anything else is kept as compact JSON.
fn error_detail(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s),
        Value::Object(map) => {
            for key in ["message", "error"] {
                if let Some(Value::String(s)) = map.get(key)
                    && !s.is_empty()
                {
                    return Some(s.clone());
                }
            }
            Some(Value::Object(map).to_string())
        }
        other => Some(other.to_string()),
    }
}

/// Final result of one conversation, owned by the calling invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// Resolved answer text.
    Answer(String),
    /// Remote job failed; carries the detail if any.
    Failure(Option<String>),
    /// Attempt budget exhausted while still pending.
    Timeout {
        /// Nominal budget, `attempts × interval`.
        budget: std::time::Duration,
    },
}

/// Placeholder for a failure without detail.
pub const UNKNOWN_ERROR: &str = "Unknown error";

impl PollOutcome {
    /// Renders the outcome as the text handed back to the agent.
    #[must_use]
    pub fn into_text(self) -> String {
        match self {
            Self::Answer(text) => text,
            Self::Failure(detail) => {
                format!("Query failed: {}", detail.as_deref().unwrap_or(UNKNOWN_ERROR))
            }
            Self::Timeout { budget } => {
                format!("Query timed out after {} seconds", budget.as_secs())
            }
        }
    }
}
