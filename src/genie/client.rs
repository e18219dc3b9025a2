//! The single question-in, answer-out entry point.

use std::sync::Arc;

use tracing::info;

use super::clock::{Sleeper, TokioSleeper};
use super::config::{GenieConfig, PollPolicy};
use super::extractor;
use super::launcher;
use super::model::PollOutcome;
use super::poller::Poller;
use super::transport::{GenieTransport, HttpTransport};
use crate::error::GenieError;

/// Runs one conversation per call: launch, poll, extract.
///
/// Cloning shares the transport (and so the HTTP connection pool); calls
/// never share conversation state, so concurrent `ask`s are independent.
#[derive(Clone)]
pub struct GenieClient {
    transport: Arc<dyn GenieTransport>,
    sleeper: Arc<dyn Sleeper>,
    policy: PollPolicy,
}

impl std::fmt::Debug for GenieClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenieClient")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl GenieClient {
    /// Creates a client from explicit parts.
    #[must_use]
    pub fn new(
        transport: Arc<dyn GenieTransport>,
        sleeper: Arc<dyn Sleeper>,
        policy: PollPolicy,
    ) -> Self {
        Self {
            transport,
            sleeper,
            policy,
        }
    }

    /// Creates an HTTP-backed client sleeping on the tokio timer.
    ///
    /// # Errors
    ///
    /// Returns [`GenieError::Remote`] if the HTTP client cannot be built.
    pub fn from_config(config: &GenieConfig) -> Result<Self, GenieError> {
        let transport = HttpTransport::new(config)?;
        Ok(Self::new(
            Arc::new(transport),
            Arc::new(TokioSleeper),
            config.poll,
        ))
    }

    /// Asks `question` and returns the structured outcome.
    ///
    /// # Errors
    ///
    /// Returns [`GenieError::EmptyQuestion`] for a blank question, or
    /// [`GenieError::Remote`] for any transport failure during launch, polling
    /// or the query-result fetch.
    pub async fn converse(&self, question: &str) -> Result<PollOutcome, GenieError> {
        let transport = self.transport.as_ref();
        let handle = launcher::launch(transport, question).await?;

        let state = Poller::new(transport, self.sleeper.as_ref(), self.policy)
            .run(&handle)
            .await?;

        let outcome =
            extractor::resolve(transport, &handle, state, self.policy.budget()).await?;
        info!(
            conversation_id = handle.conversation_id,
            outcome = outcome_kind(&outcome),
            "genie conversation finished"
        );
        Ok(outcome)
    }

    /// Asks `question` and returns the answer text.
    ///
    /// Remote job failures and timeouts come back as descriptive text.
    ///
    /// # Errors
    ///
    /// Same as [`GenieClient::converse`].
    pub async fn ask(&self, question: &str) -> Result<String, GenieError> {
        self.converse(question).await.map(PollOutcome::into_text)
    }
}

const fn outcome_kind(outcome: &PollOutcome) -> &'static str {
    match outcome {
        PollOutcome::Answer(_) => "answer",
        PollOutcome::Failure(_) => "failure",
        PollOutcome::Timeout { .. } => "timeout",
    }
}
