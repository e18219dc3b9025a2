//! Completion poller.
//!
//! Drives a launched message to a terminal state with a fixed attempt budget
//! and a fixed wait between attempts:
//!
//! ```text
//! AWAITING ──COMPLETED──▶ COMPLETED
//!    │ ╰────FAILED─────▶ FAILED
//!    │ other status (attempts < max): stay AWAITING, wait, poll again
//!    ╰─attempts == max─▶ TIMED_OUT
//! ```
//!
//! Terminal states are absorbing: once one is reached no further request is
//! made. A transport failure on any poll aborts the session immediately.

use tracing::{debug, info, warn};

use super::clock::Sleeper;
use super::config::PollPolicy;
use super::model::{ConversationHandle, GenieMessage, MessageStatus};
use super::transport::GenieTransport;
use crate::error::RemoteRequestError;

/// Poll session state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollState {
    /// Still waiting; `attempts` status fetches done so far.
    Awaiting {
        /// Number of fetches already performed.
        attempts: u32,
    },
    /// Message completed; carries the payload for extraction.
    Completed(GenieMessage),
    /// Message failed; carries the remote detail if any.
    Failed(Option<String>),
    /// Budget exhausted while still awaiting.
    TimedOut,
}

impl PollState {
    /// Initial state of every session.
    #[must_use]
    pub const fn initial() -> Self {
        Self::Awaiting { attempts: 0 }
    }

    /// Returns `true` for `Completed`, `Failed`, and `TimedOut`.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, Self::Awaiting { .. })
    }

    /// Applies one observed message.
    ///
    /// Terminal states ignore further observations.
    #[must_use]
    pub fn observe(self, message: GenieMessage) -> Self {
        let Self::Awaiting { attempts } = self else {
            return self;
        };
        match message.status {
            MessageStatus::Completed => Self::Completed(message),
            MessageStatus::Failed => Self::Failed(message.error),
            MessageStatus::Pending(_) | MessageStatus::Unknown => Self::Awaiting {
                attempts: attempts.saturating_add(1),
            },
        }
    }

    /// Converts an exhausted `Awaiting` state into `TimedOut`.
    #[must_use]
    pub fn enforce_budget(self, policy: &PollPolicy) -> Self {
        match self {
            Self::Awaiting { attempts } if attempts >= policy.max_attempts => Self::TimedOut,
            other => other,
        }
    }
}

/// Bounded fixed-interval status poller.
pub struct Poller<'a> {
    transport: &'a dyn GenieTransport,
    sleeper: &'a dyn Sleeper,
    policy: PollPolicy,
}

impl<'a> Poller<'a> {
    /// Creates a poller.
    #[must_use]
    pub const fn new(
        transport: &'a dyn GenieTransport,
        sleeper: &'a dyn Sleeper,
        policy: PollPolicy,
    ) -> Self {
        Self {
            transport,
            sleeper,
            policy,
        }
    }

    /// Polls `handle` until a terminal state.
    ///
    /// Performs at most `policy.max_attempts` fetches and waits
    /// `policy.interval` between consecutive fetches (never before the first
    /// or after the last).
    ///
    /// # Errors
    ///
    /// Returns the first [`RemoteRequestError`] raised by a status fetch.
    pub async fn run(&self, handle: &ConversationHandle) -> Result<PollState, RemoteRequestError> {
        let mut state = PollState::initial();

        loop {
            state = state.enforce_budget(&self.policy);
            let PollState::Awaiting { attempts } = state else {
                break;
            };

            if attempts > 0 {
                self.sleeper.sleep(self.policy.interval).await;
            }

            let message = self.transport.get_message(handle).await?;
            debug!(
                attempt = attempts + 1,
                status = message.status.as_str(),
                "polled genie message"
            );
            state = state.observe(message);
        }

        match &state {
            PollState::Completed(message) => info!(
                conversation_id = handle.conversation_id,
                attachments = message.attachments.len(),
                "genie message completed"
            ),
            PollState::Failed(detail) => warn!(
                conversation_id = handle.conversation_id,
                detail = detail.as_deref().unwrap_or_default(),
                "genie message failed"
            ),
            PollState::TimedOut => warn!(
                conversation_id = handle.conversation_id,
                attempts = self.policy.max_attempts,
                "genie message still pending after poll budget"
            ),
            PollState::Awaiting { .. } => {}
        }

        Ok(state)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::time::Duration;

    use proptest::prelude::*;

    use super::*;
    use crate::genie::testing::{
        RecordingSleeper, ScriptedTransport, handle, message, remote_error, text,
    };

    fn policy() -> PollPolicy {
        PollPolicy::default()
    }

    async fn run(transport: &ScriptedTransport, sleeper: &RecordingSleeper) -> PollState {
        Poller::new(transport, sleeper, policy())
            .run(&handle())
            .await
            .unwrap_or_else(|e| panic!("poll failed: {e}"))
    }

    #[test]
    fn test_observe_transitions() {
        let s = PollState::initial().observe(message("PENDING", Vec::new()));
        assert_eq!(s, PollState::Awaiting { attempts: 1 });

        let done = s.clone().observe(message("COMPLETED", vec![text("42")]));
        assert!(matches!(done, PollState::Completed(_)));

        let mut failed_msg = message("FAILED", Vec::new());
        failed_msg.error = Some("boom".to_string());
        assert_eq!(
            s.observe(failed_msg),
            PollState::Failed(Some("boom".to_string()))
        );
    }

    #[test]
    fn test_terminal_states_absorb_observations() {
        let failed = PollState::Failed(None);
        assert_eq!(
            failed.clone().observe(message("COMPLETED", Vec::new())),
            failed
        );
        assert_eq!(
            PollState::TimedOut.observe(message("IN_PROGRESS", Vec::new())),
            PollState::TimedOut
        );
    }

    #[test]
    fn test_enforce_budget() {
        let p = PollPolicy::new(3, Duration::from_secs(1));
        assert_eq!(
            PollState::Awaiting { attempts: 2 }.enforce_budget(&p),
            PollState::Awaiting { attempts: 2 }
        );
        assert_eq!(
            PollState::Awaiting { attempts: 3 }.enforce_budget(&p),
            PollState::TimedOut
        );
        assert_eq!(PollState::Failed(None).enforce_budget(&p), PollState::Failed(None));
    }

    #[test]
    fn test_enforce_budget_keeps_completed_payload() {
        let p = PollPolicy::new(1, Duration::from_secs(1));
        let done = PollState::Completed(message("COMPLETED", vec![text("42")]));
        assert_eq!(done.clone().enforce_budget(&p), done);
    }

    #[tokio::test]
    async fn test_completes_after_pending_statuses() {
        let transport = ScriptedTransport::new(vec![
            message("PENDING", Vec::new()),
            message("IN_PROGRESS", Vec::new()),
            message("COMPLETED", vec![text("42")]),
        ]);
        let sleeper = RecordingSleeper::default();

        let state = run(&transport, &sleeper).await;

        assert!(matches!(state, PollState::Completed(_)));
        assert_eq!(transport.poll_count(), 3);
        assert_eq!(sleeper.count(), 2);
        assert_eq!(sleeper.total(), Duration::from_secs(4));
    }

    #[tokio::test]
    async fn test_completed_on_first_poll_never_sleeps() {
        let transport = ScriptedTransport::new(vec![message("COMPLETED", Vec::new())]);
        let sleeper = RecordingSleeper::default();

        run(&transport, &sleeper).await;

        assert_eq!(transport.poll_count(), 1);
        assert_eq!(sleeper.count(), 0);
    }

    #[tokio::test]
    async fn test_failed_carries_detail() {
        let mut failed = message("FAILED", Vec::new());
        failed.error = Some("division by zero".to_string());
        let transport = ScriptedTransport::new(vec![message("PENDING", Vec::new()), failed]);
        let sleeper = RecordingSleeper::default();

        let state = run(&transport, &sleeper).await;

        assert_eq!(state, PollState::Failed(Some("division by zero".to_string())));
        assert_eq!(transport.poll_count(), 2);
    }

    #[tokio::test]
    async fn test_times_out_after_exactly_sixty_polls() {
        let transport = ScriptedTransport::pending_forever();
        let sleeper = RecordingSleeper::default();

        let state = run(&transport, &sleeper).await;

        assert_eq!(state, PollState::TimedOut);
        assert_eq!(transport.poll_count(), 60);
        assert_eq!(sleeper.count(), 59);
    }

    #[tokio::test]
    async fn test_missing_status_is_not_terminal() {
        let transport = ScriptedTransport::new(vec![
            crate::genie::model::GenieMessage::default(),
            message("COMPLETED", Vec::new()),
        ]);
        let sleeper = RecordingSleeper::default();

        let state = run(&transport, &sleeper).await;

        assert!(matches!(state, PollState::Completed(_)));
        assert_eq!(transport.poll_count(), 2);
    }

    #[tokio::test]
    async fn test_transport_error_fails_fast() {
        let transport = ScriptedTransport::with_results(vec![
            Ok(message("PENDING", Vec::new())),
            Err(remote_error("/conversations/conv-1/messages/msg-1")),
            Ok(message("COMPLETED", Vec::new())),
        ]);
        let sleeper = RecordingSleeper::default();

        let result = Poller::new(&transport, &sleeper, policy()).run(&handle()).await;

        assert!(matches!(
            result,
            Err(RemoteRequestError::Status { status: 500, .. })
        ));
        assert_eq!(transport.poll_count(), 2);
    }

    #[tokio::test]
    async fn test_every_poll_uses_the_same_handle() {
        let transport = ScriptedTransport::pending_forever();
        let sleeper = RecordingSleeper::default();

        run(&transport, &sleeper).await;

        let seen = transport
            .seen_handles
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default();
        assert_eq!(seen.len(), 60);
        assert!(seen.iter().all(|h| *h == handle()));
    }

    fn block_on<F: std::future::Future>(future: F) -> F::Output {
        tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap_or_else(|e| panic!("runtime: {e}"))
            .block_on(future)
    }

    proptest! {
        #[test]
        fn prop_fetch_count_never_exceeds_budget(
            max_attempts in 1u32..80,
            pending in 0usize..100,
        ) {
            let mut script: Vec<_> = (0..pending).map(|_| message("RUNNING", Vec::new())).collect();
            script.push(message("COMPLETED", Vec::new()));
            let transport = ScriptedTransport::new(script);
            let sleeper = RecordingSleeper::default();
            let policy = PollPolicy::new(max_attempts, Duration::from_secs(2));

            let state = block_on(Poller::new(&transport, &sleeper, policy).run(&handle()))
                .unwrap_or_else(|e| panic!("poll failed: {e}"));

            let polls = transport.poll_count();
            prop_assert!(polls <= max_attempts as usize);
            prop_assert_eq!(sleeper.count(), polls - 1);
            if pending < max_attempts as usize {
                prop_assert!(matches!(state, PollState::Completed(_)));
                prop_assert_eq!(polls, pending + 1);
            } else {
                prop_assert_eq!(state, PollState::TimedOut);
                prop_assert_eq!(polls, max_attempts as usize);
            }
        }
    }
}
