//! Resolves a terminal poll state to the final answer.

use tracing::debug;

use super::model::{Attachment, ConversationHandle, GenieMessage, PollOutcome};
use super::poller::PollState;
use super::transport::GenieTransport;
use crate::error::RemoteRequestError;

/// Placeholder for a `TEXT` attachment without content.
pub const NO_RESPONSE_CONTENT: &str = "No response content";

/// Sentinel for a completed message with nothing to render.
pub const NO_RESULTS: &str = "Query completed but no results returned";

/// What a completed message should be rendered from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection<'a> {
    /// Fetch and pass through the tabular result of this query.
    Query(&'a str),
    /// Return this text.
    Text(&'a str),
    /// Nothing usable was attached.
    Empty,
}

/// Picks the attachment to render.
///
/// The first `QUERY_RESULT` carrying a query id wins over any `TEXT`,
/// wherever it appears in the list; otherwise the first `TEXT` is used.
#[must_use]
pub fn select_attachment(attachments: &[Attachment]) -> Selection<'_> {
    let query = attachments.iter().find_map(|a| match a {
        Attachment::QueryResult {
            query_id: Some(id),
        } => Some(id.as_str()),
        _ => None,
    });
    if let Some(id) = query {
        return Selection::Query(id);
    }

    attachments
        .iter()
        .find_map(|a| match a {
            Attachment::Text { content } => {
                Some(Selection::Text(content.as_deref().unwrap_or(NO_RESPONSE_CONTENT)))
            }
            _ => None,
        })
        .unwrap_or(Selection::Empty)
}

/// Resolves a completed message, issuing the secondary fetch when needed.
///
/// # Errors
///
/// Returns [`RemoteRequestError`] if the query-result fetch fails.
pub async fn extract(
    transport: &dyn GenieTransport,
    handle: &ConversationHandle,
    message: &GenieMessage,
) -> Result<String, RemoteRequestError> {
    match select_attachment(&message.attachments) {
        Selection::Query(query_id) => {
            debug!(query_id, "fetching genie query result");
            transport.get_query_result(handle, query_id).await
        }
        Selection::Text(text) => Ok(text.to_string()),
        Selection::Empty => Ok(NO_RESULTS.to_string()),
    }
}

/// Maps a terminal poll state to the outcome handed to the caller.
///
/// `FAILED` and timeout become outcomes, not errors. An `Awaiting` state is
/// treated as a timeout since the poller only returns it when the budget is
/// spent.
///
/// # Errors
///
/// Returns [`RemoteRequestError`] if the query-result fetch fails.
pub async fn resolve(
    transport: &dyn GenieTransport,
    handle: &ConversationHandle,
    state: PollState,
    budget: std::time::Duration,
) -> Result<PollOutcome, RemoteRequestError> {
    match state {
        PollState::Completed(message) => extract(transport, handle, &message)
            .await
            .map(PollOutcome::Answer),
        PollState::Failed(detail) => Ok(PollOutcome::Failure(detail)),
        PollState::TimedOut | PollState::Awaiting { .. } => Ok(PollOutcome::Timeout { budget }),
    }
}
