//! Network collaborator: retry schedule, error classification, and the
//! reqwest-backed implementation.
//!
//! Every network-origin failure is classified exactly once, here, into
//! recoverable (timeouts, connection failures, 5xx) and unrecoverable
//! (everything else). The state machine drives retries by re-entering the
//! same state with an incremented [`Retry`]; the implementation sleeps the
//! schedule's delay before issuing the attempt.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;

/// Retries allowed after the initial attempt. An attempt presented with a
/// higher count fails immediately.
pub const MAX_RETRY_COUNT: u32 = 9;

/// Retry counter carried by network-calling states.
///
/// The schedule is deterministic: attempt `n` waits exactly `2^(n-1)`
/// seconds before the underlying call, so `count = 3` waits 4 s and
/// `count = 9` waits 256 s. `count = 0` is the initial attempt and does
/// not wait.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Retry {
    pub count: u32,
}

impl Retry {
    #[must_use]
    pub fn delay(self) -> Duration {
        if self.count == 0 {
            Duration::ZERO
        } else {
            Duration::from_secs(1u64 << (self.count - 1).min(62))
        }
    }

    /// The counter for the next attempt. The cap is enforced where the
    /// call is made, so exhaustion surfaces as a network error rather
    /// than a state-machine special case.
    #[must_use]
    pub fn next(self) -> Self {
        Self {
            count: self.count + 1,
        }
    }

    #[must_use]
    pub fn exhausted(self) -> bool {
        self.count > MAX_RETRY_COUNT
    }
}

#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("server error {status} from {url}")]
    ServerError { status: u16, url: String },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("redirect from {url} carried no Location header")]
    MissingLocation { url: String },

    #[error("malformed response body from {url}")]
    MalformedBody { url: String },

    #[error("retry budget exhausted after {attempts} attempts")]
    RetriesExhausted { attempts: u32 },

    #[error("failed to build HTTP client: {0}")]
    Client(reqwest::Error),
}

impl NetworkError {
    /// Whether re-entering the calling state with an incremented retry
    /// counter makes sense.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            NetworkError::Timeout | NetworkError::Connect(_) | NetworkError::ServerError { .. }
        )
    }

    /// Whether the failure reads as "no connection" to the user, as
    /// opposed to a broken or hostile response.
    #[must_use]
    pub fn is_connectivity(&self) -> bool {
        matches!(
            self,
            NetworkError::Timeout
                | NetworkError::Connect(_)
                | NetworkError::RetriesExhausted { .. }
        )
    }
}

/// The HTTP surface the conversion state machine needs.
///
/// Implementations must support concurrent independent requests; each
/// conversion issues at most one call at a time.
pub trait NetworkAccess: Send + Sync {
    /// HEAD the URL without following redirects and return the
    /// `Location` header. Allow-listed statuses: 3xx.
    fn head_location(
        &self,
        url: &str,
        retry: Retry,
    ) -> impl Future<Output = Result<String, NetworkError>> + Send;

    /// GET the URL following redirects and return the effective URL.
    /// Allow-listed statuses: 2xx.
    fn get_effective_url(
        &self,
        url: &str,
        retry: Retry,
    ) -> impl Future<Output = Result<String, NetworkError>> + Send;

    /// GET the URL following redirects and return the body text.
    /// Allow-listed statuses: 2xx.
    fn get_body(
        &self,
        url: &str,
        retry: Retry,
    ) -> impl Future<Output = Result<String, NetworkError>> + Send;
}

impl<T: NetworkAccess> NetworkAccess for std::sync::Arc<T> {
    fn head_location(
        &self,
        url: &str,
        retry: Retry,
    ) -> impl Future<Output = Result<String, NetworkError>> + Send {
        self.as_ref().head_location(url, retry)
    }

    fn get_effective_url(
        &self,
        url: &str,
        retry: Retry,
    ) -> impl Future<Output = Result<String, NetworkError>> + Send {
        self.as_ref().get_effective_url(url, retry)
    }

    fn get_body(
        &self,
        url: &str,
        retry: Retry,
    ) -> impl Future<Output = Result<String, NetworkError>> + Send {
        self.as_ref().get_body(url, retry)
    }
}

/// Production implementation on two `reqwest` clients: one with redirects
/// disabled (unshortening via `Location`) and one following them.
pub struct ReqwestNetwork {
    direct: reqwest::Client,
    following: reqwest::Client,
}

impl ReqwestNetwork {
    /// # Errors
    ///
    /// Returns [`NetworkError::Client`] if the underlying clients cannot
    /// be constructed (e.g. invalid TLS config).
    pub fn new(
        timeout_secs: u64,
        connect_timeout_secs: u64,
        user_agent: &str,
    ) -> Result<Self, NetworkError> {
        let base = || {
            reqwest::Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .connect_timeout(Duration::from_secs(connect_timeout_secs))
                .user_agent(user_agent)
        };
        let direct = base()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(NetworkError::Client)?;
        let following = base().build().map_err(NetworkError::Client)?;
        Ok(Self { direct, following })
    }

    /// Applies the retry schedule: reject exhausted counters without
    /// waiting, otherwise sleep the deterministic delay.
    async fn wait_for_attempt(retry: Retry) -> Result<(), NetworkError> {
        if retry.exhausted() {
            return Err(NetworkError::RetriesExhausted {
                attempts: retry.count,
            });
        }
        let delay = retry.delay();
        if !delay.is_zero() {
            tracing::warn!(
                attempt = retry.count,
                delay_secs = delay.as_secs(),
                "retrying after backoff"
            );
            tokio::time::sleep(delay).await;
        }
        Ok(())
    }
}

fn classify(err: &reqwest::Error) -> NetworkError {
    if err.is_timeout() {
        NetworkError::Timeout
    } else if err.is_connect() || err.is_request() {
        NetworkError::Connect(err.to_string())
    } else {
        NetworkError::MalformedBody {
            url: err.url().map(ToString::to_string).unwrap_or_default(),
        }
    }
}

fn classify_status(status: reqwest::StatusCode, url: &str) -> NetworkError {
    if status.is_server_error() {
        NetworkError::ServerError {
            status: status.as_u16(),
            url: url.to_owned(),
        }
    } else {
        NetworkError::UnexpectedStatus {
            status: status.as_u16(),
            url: url.to_owned(),
        }
    }
}

impl NetworkAccess for ReqwestNetwork {
    async fn head_location(&self, url: &str, retry: Retry) -> Result<String, NetworkError> {
        Self::wait_for_attempt(retry).await?;
        let response = self
            .direct
            .head(url)
            .send()
            .await
            .map_err(|e| classify(&e))?;
        let status = response.status();
        if !status.is_redirection() {
            return Err(classify_status(status, url));
        }
        response
            .headers()
            .get(reqwest::header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned)
            .ok_or_else(|| NetworkError::MissingLocation {
                url: url.to_owned(),
            })
    }

    async fn get_effective_url(&self, url: &str, retry: Retry) -> Result<String, NetworkError> {
        Self::wait_for_attempt(retry).await?;
        let response = self
            .following
            .get(url)
            .send()
            .await
            .map_err(|e| classify(&e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(classify_status(status, url));
        }
        Ok(response.url().to_string())
    }

    async fn get_body(&self, url: &str, retry: Retry) -> Result<String, NetworkError> {
        Self::wait_for_attempt(retry).await?;
        let response = self
            .following
            .get(url)
            .send()
            .await
            .map_err(|e| classify(&e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(classify_status(status, url));
        }
        response.text().await.map_err(|_| NetworkError::MalformedBody {
            url: url.to_owned(),
        })
    }
}
