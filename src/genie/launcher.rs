//! Opens a Genie conversation.

use tracing::info;

use super::model::ConversationHandle;
use super::transport::GenieTransport;
use crate::error::GenieError;

/// Submits `question` and returns the new conversation's identifiers.
///
/// The launch is not idempotent (a retry could open a duplicate
/// conversation), so any transport failure is returned as-is.
///
/// # Errors
///
/// Returns [`GenieError::EmptyQuestion`] without issuing a request when the
/// question is blank, or [`GenieError::Remote`] when the request fails.
pub async fn launch(
    transport: &dyn GenieTransport,
    question: &str,
) -> Result<ConversationHandle, GenieError> {
    if question.trim().is_empty() {
        return Err(GenieError::EmptyQuestion);
    }

    let handle = transport.start_conversation(question).await?;
    info!(
        conversation_id = handle.conversation_id,
        message_id = handle.message_id,
        "started genie conversation"
    );
    Ok(handle)
}
