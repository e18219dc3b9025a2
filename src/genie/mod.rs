//! Genie conversation client.
//!
//! One call to [`GenieClient::ask`] runs a strictly sequential pipeline:
//!
//! 1. [`launcher`] opens a conversation with the question.
//! 2. [`poller`] fetches the message status at a fixed interval until it is
//!    terminal or the attempt budget is spent.
//! 3. [`extractor`] turns the terminal state into answer text, fetching a
//!    tabular query result when one is attached.
//!
//! Transport faults are errors; a remote `FAILED` job and a timeout are
//! ordinary answers.

pub mod client;
pub mod clock;
pub mod config;
pub mod extractor;
pub mod launcher;
pub mod model;
pub mod poller;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use client::GenieClient;
pub use clock::{Sleeper, TokioSleeper};
pub use config::{GenieConfig, GenieConfigBuilder, PollPolicy};
pub use model::{Attachment, ConversationHandle, GenieMessage, MessageStatus, PollOutcome};
pub use poller::{PollState, Poller};
pub use transport::{GenieTransport, HttpTransport};
