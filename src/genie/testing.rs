//! Scripted transport and recording sleeper shared by the genie unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use super::clock::Sleeper;
use super::model::{Attachment, ConversationHandle, GenieMessage, MessageStatus};
use super::transport::GenieTransport;
use crate::error::RemoteRequestError;

/// Transport that replays a fixed list of status responses.
///
/// Once the script is exhausted, the last response is repeated.
pub struct ScriptedTransport {
    launch: Result<ConversationHandle, RemoteRequestError>,
    script: Mutex<VecDeque<Result<GenieMessage, RemoteRequestError>>>,
    last: Mutex<Option<Result<GenieMessage, RemoteRequestError>>>,
    query_results: HashMap<String, Result<String, RemoteRequestError>>,
    pub launches: AtomicUsize,
    pub polls: AtomicUsize,
    pub fetches: Mutex<Vec<String>>,
    pub seen_handles: Mutex<Vec<ConversationHandle>>,
}

pub fn handle() -> ConversationHandle {
    ConversationHandle {
        conversation_id: "conv-1".to_string(),
        message_id: "msg-1".to_string(),
    }
}

pub fn message(status: &str, attachments: Vec<Attachment>) -> GenieMessage {
    GenieMessage {
        status: MessageStatus::parse(status),
        attachments,
        error: None,
    }
}

pub fn text(content: &str) -> Attachment {
    Attachment::Text {
        content: Some(content.to_string()),
    }
}

pub fn query(id: &str) -> Attachment {
    Attachment::QueryResult {
        query_id: Some(id.to_string()),
    }
}

pub fn remote_error(endpoint: &str) -> RemoteRequestError {
    RemoteRequestError::Status {
        endpoint: endpoint.to_string(),
        status: 500,
        body: "internal".to_string(),
    }
}

impl ScriptedTransport {
    pub fn new(script: Vec<GenieMessage>) -> Self {
        Self::with_results(script.into_iter().map(Ok).collect())
    }

    pub fn with_results(script: Vec<Result<GenieMessage, RemoteRequestError>>) -> Self {
        Self {
            launch: Ok(handle()),
            script: Mutex::new(script.into()),
            last: Mutex::new(None),
            query_results: HashMap::new(),
            launches: AtomicUsize::new(0),
            polls: AtomicUsize::new(0),
            fetches: Mutex::new(Vec::new()),
            seen_handles: Mutex::new(Vec::new()),
        }
    }

    pub fn pending_forever() -> Self {
        Self::new(vec![message("IN_PROGRESS", Vec::new())])
    }

    #[must_use]
    pub fn failing_launch(mut self, err: RemoteRequestError) -> Self {
        self.launch = Err(err);
        self
    }

    #[must_use]
    pub fn with_query_result(
        mut self,
        query_id: &str,
        result: Result<String, RemoteRequestError>,
    ) -> Self {
        self.query_results.insert(query_id.to_string(), result);
        self
    }

    pub fn poll_count(&self) -> usize {
        self.polls.load(Ordering::SeqCst)
    }

    pub fn fetched(&self) -> Vec<String> {
        self.fetches
            .lock()
            .map(|f| f.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl GenieTransport for ScriptedTransport {
    async fn start_conversation(
        &self,
        _question: &str,
    ) -> Result<ConversationHandle, RemoteRequestError> {
        self.launches.fetch_add(1, Ordering::SeqCst);
        self.launch.clone()
    }

    async fn get_message(
        &self,
        handle: &ConversationHandle,
    ) -> Result<GenieMessage, RemoteRequestError> {
        self.polls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut seen) = self.seen_handles.lock() {
            seen.push(handle.clone());
        }
        let next = self.script.lock().ok().and_then(|mut s| s.pop_front());
        let mut last = self
            .last
            .lock()
            .map_err(|_| remote_error("poisoned"))?;
        match next {
            Some(response) => {
                *last = Some(response.clone());
                response
            }
            None => last
                .clone()
                .unwrap_or_else(|| Ok(message("IN_PROGRESS", Vec::new()))),
        }
    }

    async fn get_query_result(
        &self,
        _handle: &ConversationHandle,
        query_id: &str,
    ) -> Result<String, RemoteRequestError> {
        if let Ok(mut fetches) = self.fetches.lock() {
            fetches.push(query_id.to_string());
        }
        self.query_results
            .get(query_id)
            .cloned()
            .unwrap_or_else(|| Err(remote_error("query-result")))
    }
}

/// Sleeper that returns immediately and records every requested wait.
#[derive(Default)]
pub struct RecordingSleeper {
    pub waits: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn count(&self) -> usize {
        self.waits.lock().map(|w| w.len()).unwrap_or_default()
    }

    pub fn total(&self) -> Duration {
        self.waits
            .lock()
            .map(|w| w.iter().sum())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        if let Ok(mut waits) = self.waits.lock() {
            waits.push(duration);
        }
    }
}
