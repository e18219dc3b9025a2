//! Transport seam for the Genie API.
//!
//! [`GenieTransport`] is the only thing the launcher, poller, and extractor
//! talk to, so tests can script the remote side. [`HttpTransport`] is the
//! production implementation over a pooled `reqwest` client.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::config::GenieConfig;
use super::model::{ConversationHandle, GenieMessage, StartConversationRequest};
use crate::error::RemoteRequestError;

/// Remote operations used by one conversation.
#[async_trait]
pub trait GenieTransport: Send + Sync {
    /// Opens a conversation with `question` and returns its identifiers.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteRequestError`] on any transport failure.
    async fn start_conversation(
        &self,
        question: &str,
    ) -> Result<ConversationHandle, RemoteRequestError>;

    /// Fetches the current state of the conversation's message.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteRequestError`] on any transport failure.
    async fn get_message(
        &self,
        handle: &ConversationHandle,
    ) -> Result<GenieMessage, RemoteRequestError>;

    /// Fetches the raw tabular result of `query_id`.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteRequestError`] on any transport failure.
    async fn get_query_result(
        &self,
        handle: &ConversationHandle,
        query_id: &str,
    ) -> Result<String, RemoteRequestError>;
}

/// HTTP transport backed by `reqwest`.
///
/// Cloning is cheap and shares the connection pool; a connection is only held
/// for the duration of one request, never across a poll interval.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    host: Url,
    space_id: String,
    token: String,
}

impl HttpTransport {
    /// Builds a transport from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteRequestError::Connection`] if the host is not a valid
    /// base URL or the HTTP client cannot be constructed.
    pub fn new(config: &GenieConfig) -> Result<Self, RemoteRequestError> {
        let connection_error = |message: String| RemoteRequestError::Connection {
            endpoint: config.space_url(),
            message,
        };

        let host = Url::parse(&config.host).map_err(|e| connection_error(e.to_string()))?;
        if host.cannot_be_a_base() {
            return Err(connection_error("host cannot be a base URL".to_string()));
        }

        let client = Client::builder()
            .timeout(config.request_timeout)
            .user_agent(concat!("monitor-assist/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| connection_error(e.to_string()))?;

        Ok(Self {
            client,
            host,
            space_id: config.space_id.clone(),
            token: config.token.clone(),
        })
    }

    /// Space-relative path, used to label requests in logs and errors.
    fn endpoint(segments: &[&str]) -> String {
        segments.iter().fold(String::new(), |mut path, segment| {
            path.push('/');
            path.push_str(segment);
            path
        })
    }

    /// Absolute URL of a space-relative path; each segment is percent-encoded.
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.host.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty()
                .extend(["api", "2.0", "genie", "spaces", self.space_id.as_str()])
                .extend(segments);
        }
        url
    }

    fn message_segments(handle: &ConversationHandle) -> [&str; 4] {
        [
            "conversations",
            handle.conversation_id.as_str(),
            "messages",
            handle.message_id.as_str(),
        ]
    }

    /// Sends a request and returns the body of a success response.
    async fn send(&self, endpoint: &str, request: RequestBuilder) -> Result<String, RemoteRequestError> {
        let response = request
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| RemoteRequestError::Connection {
                endpoint: endpoint.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| RemoteRequestError::Connection {
                endpoint: endpoint.to_string(),
                message: e.to_string(),
            })?;

        debug!(endpoint, status = status.as_u16(), bytes = body.len(), "genie response");

        if !status.is_success() {
            return Err(RemoteRequestError::Status {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        Ok(body)
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        request: RequestBuilder,
    ) -> Result<T, RemoteRequestError> {
        let body = self.send(endpoint, request).await?;
        serde_json::from_str(&body).map_err(|e| RemoteRequestError::Decode {
            endpoint: endpoint.to_string(),
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl GenieTransport for HttpTransport {
    async fn start_conversation(
        &self,
        question: &str,
    ) -> Result<ConversationHandle, RemoteRequestError> {
        let segments = ["start-conversation"];
        let request = self
            .client
            .post(self.url(&segments))
            .json(&StartConversationRequest { content: question });
        self.send_json(&Self::endpoint(&segments), request).await
    }

    async fn get_message(
        &self,
        handle: &ConversationHandle,
    ) -> Result<GenieMessage, RemoteRequestError> {
        let segments = Self::message_segments(handle);
        let request = self.client.get(self.url(&segments));
        self.send_json(&Self::endpoint(&segments), request).await
    }

    async fn get_query_result(
        &self,
        handle: &ConversationHandle,
        query_id: &str,
    ) -> Result<String, RemoteRequestError> {
        let [a, b, c, d] = Self::message_segments(handle);
        let segments = [a, b, c, d, "query-result", query_id];
        let request = self.client.get(self.url(&segments));
        self.send(&Self::endpoint(&segments), request).await
    }
}
