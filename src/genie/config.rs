//! Genie client configuration with builder pattern and environment variable support.
//!
//! Configuration is resolved in order: explicit values → environment variables → defaults.

use std::time::Duration;

use crate::error::ConfigError;

/// Default Databricks workspace URL.
pub const DEFAULT_HOST: &str = "https://bmt-deep-ci-2.cloud.databricks.com";
/// Default Genie space.
pub const DEFAULT_SPACE_ID: &str = "01f0db00369b103d909729dd2bbfb6b6";
/// Default number of status polls before giving up.
pub const DEFAULT_POLL_ATTEMPTS: u32 = 60;
/// Default wait between status polls in seconds.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 2;
/// Default per-request HTTP timeout in seconds.
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

/// Bounded fixed-interval polling budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Maximum number of status fetches.
    pub max_attempts: u32,
    /// Wait between consecutive fetches.
    pub interval: Duration,
}

impl PollPolicy {
    /// Creates a policy.
    #[must_use]
    pub const fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts,
            interval,
        }
    }

    /// Total time budget, `max_attempts × interval`.
    #[must_use]
    pub fn budget(&self) -> Duration {
        self.interval.saturating_mul(self.max_attempts)
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::new(
            DEFAULT_POLL_ATTEMPTS,
            Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
        )
    }
}

/// Configuration for the Genie client.
#[derive(Clone)]
pub struct GenieConfig {
    /// Workspace base URL, without trailing slash.
    pub host: String,
    /// Bearer token.
    pub token: String,
    /// Genie space holding the conversations.
    pub space_id: String,
    /// Status polling budget.
    pub poll: PollPolicy,
    /// Per-request HTTP timeout.
    pub request_timeout: Duration,
}

impl std::fmt::Debug for GenieConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenieConfig")
            .field("host", &self.host)
            .field("token", &"<redacted>")
            .field("space_id", &self.space_id)
            .field("poll", &self.poll)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl GenieConfig {
    /// Creates a new builder for `GenieConfig`.
    #[must_use]
    pub fn builder() -> GenieConfigBuilder {
        GenieConfigBuilder::default()
    }

    /// Creates configuration from environment variables with defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingCredential`] if no token is found.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::builder().from_env().build()
    }

    /// Root URL of the configured Genie space.
    #[must_use]
    pub fn space_url(&self) -> String {
        format!("{}/api/2.0/genie/spaces/{}", self.host, self.space_id)
    }
}

/// Builder for [`GenieConfig`].
#[derive(Debug, Clone, Default)]
pub struct GenieConfigBuilder {
    host: Option<String>,
    token: Option<String>,
    space_id: Option<String>,
    poll_attempts: Option<u32>,
    poll_interval: Option<Duration>,
    request_timeout: Option<Duration>,
    /// First environment value that failed to parse.
    invalid: Option<(&'static str, String)>,
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

impl GenieConfigBuilder {
    /// Populates unset fields from environment variables.
    #[must_use]
    pub fn from_env(self) -> Self {
        self.from_lookup(|name| std::env::var(name).ok())
    }

    /// Populates unset fields from `lookup`, keyed by environment variable name.
    ///
    /// A numeric variable that does not parse is reported by [`build`](Self::build).
    #[must_use]
    pub fn from_lookup(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |name: &str| lookup(name).and_then(non_empty);

        if self.host.is_none() {
            self.host = var("DATABRICKS_HOST");
        }
        if self.token.is_none() {
            self.token = var("DATABRICKS_TOKEN");
        }
        if self.space_id.is_none() {
            self.space_id = var("GENIE_SPACE_ID");
        }
        if self.poll_attempts.is_none() {
            self.poll_attempts = self.parsed("GENIE_POLL_ATTEMPTS", var("GENIE_POLL_ATTEMPTS"));
        }
        if self.poll_interval.is_none() {
            self.poll_interval = self
                .parsed("GENIE_POLL_INTERVAL_SECS", var("GENIE_POLL_INTERVAL_SECS"))
                .map(Duration::from_secs);
        }
        if self.request_timeout.is_none() {
            self.request_timeout = self
                .parsed("GENIE_REQUEST_TIMEOUT_SECS", var("GENIE_REQUEST_TIMEOUT_SECS"))
                .map(Duration::from_secs);
        }
        self
    }

    /// Parses a numeric variable; the first failure is kept for `build`.
    fn parsed<T: std::str::FromStr>(
        &mut self,
        name: &'static str,
        raw: Option<String>,
    ) -> Option<T> {
        let raw = raw?;
        match raw.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                if self.invalid.is_none() {
                    self.invalid = Some((name, raw));
                }
                None
            }
        }
    }

    /// Sets the workspace URL.
    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = non_empty(host.into());
        self
    }

    /// Sets the bearer token.
    #[must_use]
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = non_empty(token.into());
        self
    }

    /// Sets the Genie space id.
    #[must_use]
    pub fn space_id(mut self, space_id: impl Into<String>) -> Self {
        self.space_id = non_empty(space_id.into());
        self
    }

    /// Sets the maximum number of status polls.
    #[must_use]
    pub const fn poll_attempts(mut self, n: u32) -> Self {
        self.poll_attempts = Some(n);
        self
    }

    /// Sets the wait between status polls.
    #[must_use]
    pub const fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = Some(interval);
        self
    }

    /// Sets the per-request HTTP timeout.
    #[must_use]
    pub const fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Builds the [`GenieConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingCredential`] if no token was set, or
    /// [`ConfigError::InvalidValue`] for an unparseable numeric variable, a
    /// zero poll budget, or a host that is not an http(s) URL.
    pub fn build(self) -> Result<GenieConfig, ConfigError> {
        if let Some((name, value)) = self.invalid {
            return Err(ConfigError::InvalidValue { name, value });
        }

        let token = self.token.ok_or(ConfigError::MissingCredential)?;

        let host = self
            .host
            .unwrap_or_else(|| DEFAULT_HOST.to_string())
            .trim_end_matches('/')
            .to_string();
        if !(host.starts_with("https://") || host.starts_with("http://")) {
            return Err(ConfigError::InvalidValue {
                name: "DATABRICKS_HOST",
                value: host,
            });
        }

        let poll_attempts = self.poll_attempts.unwrap_or(DEFAULT_POLL_ATTEMPTS);
        if poll_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                name: "GENIE_POLL_ATTEMPTS",
                value: poll_attempts.to_string(),
            });
        }

        Ok(GenieConfig {
            host,
            token,
            space_id: self
                .space_id
                .unwrap_or_else(|| DEFAULT_SPACE_ID.to_string()),
            poll: PollPolicy::new(
                poll_attempts,
                self.poll_interval
                    .unwrap_or(Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS)),
            ),
            request_timeout: self
                .request_timeout
                .unwrap_or(Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS)),
        })
    }
}
