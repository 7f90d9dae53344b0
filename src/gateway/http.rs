use reqwest::Client;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::policies::ExponentialBackoff;
use reqwest_retry::{RetryTransientMiddleware, RetryableStrategy, default_on_request_failure};
use std::time::Duration;

use super::error::GatewayError;

#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub timeout: Duration,
    pub keep_alive: Duration,
    pub pool_idle_timeout: Duration,
    /// Transport-level retries for connection failures. HTTP status codes
    /// are never retried here; that is `with_retry`'s job.
    pub max_retries: u32,
    pub retry_min_delay: Duration,
    pub retry_max_delay: Duration,
    pub user_agent: Option<String>,
    /// Skip TLS certificate validation. Off unless explicitly requested.
    pub accept_invalid_certs: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            keep_alive: Duration::from_secs(60),
            pool_idle_timeout: Duration::from_secs(90),
            max_retries: 5,
            retry_min_delay: Duration::from_millis(500),
            retry_max_delay: Duration::from_secs(8),
            user_agent: Some(format!("kbchat-backend/{}", env!("CARGO_PKG_VERSION"))),
            accept_invalid_certs: false,
        }
    }
}

impl HttpConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub const fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    #[must_use]
    pub const fn without_retries(mut self) -> Self {
        self.max_retries = 0;
        self
    }

    #[must_use]
    pub const fn accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }
}

/// Retries only requests that never produced a response (connect, reset,
/// timeout). Any HTTP response, including 429 and 5xx, is handed back as-is.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConnectionFailuresOnly;

impl RetryableStrategy for ConnectionFailuresOnly {
    fn handle(
        &self,
        res: &Result<reqwest::Response, reqwest_middleware::Error>,
    ) -> Option<reqwest_retry::Retryable> {
        match res {
            Ok(_) => None,
            Err(error) => default_on_request_failure(error),
        }
    }
}

#[derive(Clone)]
pub struct HttpClient {
    inner: ClientWithMiddleware,
    config: HttpConfig,
}

impl HttpClient {
    pub fn with_config(config: HttpConfig) -> Result<Self, GatewayError> {
        let mut builder = Client::builder()
            .timeout(config.timeout)
            .tcp_keepalive(config.keep_alive)
            .pool_idle_timeout(config.pool_idle_timeout);

        if let Some(ref ua) = config.user_agent {
            builder = builder.user_agent(ua);
        }

        if config.accept_invalid_certs {
            tracing::warn!(
                "TLS certificate validation is DISABLED for upstream requests (ACCEPT_INVALID_CERTS)"
            );
            builder = builder.danger_accept_invalid_certs(true);
        }

        let client = builder.build().map_err(|e| {
            GatewayError::Configuration(format!("Failed to build HTTP client: {e}"))
        })?;

        let mut client_builder = ClientBuilder::new(client);
        if config.max_retries > 0 {
            let retry_policy = ExponentialBackoff::builder()
                .retry_bounds(config.retry_min_delay, config.retry_max_delay)
                .build_with_max_retries(config.max_retries);
            client_builder = client_builder.with(
                RetryTransientMiddleware::new_with_policy_and_strategy(
                    retry_policy,
                    ConnectionFailuresOnly,
                ),
            );
        }

        Ok(Self {
            inner: client_builder.build(),
            config,
        })
    }

    #[must_use]
    pub const fn inner(&self) -> &ClientWithMiddleware {
        &self.inner
    }

    #[must_use]
    pub const fn config(&self) -> &HttpConfig {
        &self.config
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
