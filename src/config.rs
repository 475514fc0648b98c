use crate::client::PollOptions;
use std::env;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://openapi.liblibai.cloud";
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct LiblibConfig {
    pub base_url: Option<String>,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    pub poll_interval: Option<Duration>,
    pub poll_max_attempts: Option<u32>,
    pub poll_max_wait: Option<Duration>,
    pub request_timeout: Option<Duration>,
}

impl Default for LiblibConfig {
    fn default() -> Self {
        LiblibConfig {
            base_url: None,
            access_key: None,
            secret_key: None,
            poll_interval: None,
            poll_max_attempts: None,
            poll_max_wait: None,
            request_timeout: None,
        }
    }
}

impl LiblibConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads `LIBLIB_*` variables. Values that fail to parse are ignored.
    pub fn from_env() -> Self {
        let base_url = env::var("LIBLIB_BASE_URL").ok().filter(|s| !s.is_empty());
        let access_key = env::var("LIBLIB_ACCESS_KEY").ok().filter(|s| !s.is_empty());
        let secret_key = env::var("LIBLIB_SECRET_KEY").ok().filter(|s| !s.is_empty());
        let poll_interval = env_secs("LIBLIB_POLL_INTERVAL_SECS");
        let poll_max_attempts = env::var("LIBLIB_POLL_MAX_ATTEMPTS")
            .ok()
            .and_then(|s| s.parse().ok());
        let poll_max_wait = env_secs("LIBLIB_POLL_MAX_WAIT_SECS");
        let request_timeout = env_secs("LIBLIB_REQUEST_TIMEOUT_SECS");

        LiblibConfig {
            base_url,
            access_key,
            secret_key,
            poll_interval,
            poll_max_attempts,
            poll_max_wait,
            request_timeout,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_credentials(
        mut self,
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Self {
        self.access_key = Some(access_key.into());
        self.secret_key = Some(secret_key.into());
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = Some(interval);
        self
    }

    pub fn with_poll_limits(mut self, max_attempts: Option<u32>, max_wait: Option<Duration>) -> Self {
        self.poll_max_attempts = max_attempts;
        self.poll_max_wait = max_wait;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/')
    }

    pub fn poll_options(&self) -> PollOptions {
        PollOptions {
            interval: self.poll_interval.unwrap_or(DEFAULT_POLL_INTERVAL),
            max_attempts: self.poll_max_attempts,
            max_wait: self.poll_max_wait,
        }
    }
}

fn env_secs(key: &str) -> Option<Duration> {
    env::var(key)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LiblibConfig::new();
        assert_eq!(config.base_url(), DEFAULT_BASE_URL);

        let poll = config.poll_options();
        assert_eq!(poll.interval, Duration::from_secs(5));
        assert!(poll.max_attempts.is_none());
        assert!(poll.max_wait.is_none());
    }

    #[test]
    fn test_builders() {
        let config = LiblibConfig::new()
            .with_base_url("http://localhost:9000/")
            .with_credentials("key", "secret")
            .with_poll_interval(Duration::from_millis(10))
            .with_poll_limits(Some(3), Some(Duration::from_secs(60)));

        assert_eq!(config.base_url(), "http://localhost:9000");
        assert_eq!(config.access_key.as_deref(), Some("key"));
        assert_eq!(config.secret_key.as_deref(), Some("secret"));

        let poll = config.poll_options();
        assert_eq!(poll.interval, Duration::from_millis(10));
        assert_eq!(poll.max_attempts, Some(3));
        assert_eq!(poll.max_wait, Some(Duration::from_secs(60)));
    }
}
