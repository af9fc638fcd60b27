//! Health prober - performs a single check for one monitor
//!
//! ## Check rules
//!
//! - **HTTP / HTTPS**: GET the connection URL and compare the stringified
//!   status code with the monitor's expected response
//! - **TCP / UDP**: placeholder, always UP (no socket is opened)
//! - **Anything else**: same HTTP-style check as a fallback
//!
//! Every failure (timeout, DNS, refused connection, bad URL) is folded into a
//! DOWN verdict. The prober never returns an error; the reason for a DOWN is
//! carried as a [`ProbeFailure`] next to the verdict.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, instrument, trace};

use crate::model::{Monitor, ServiceType, Status};

/// Upper bound for a single HTTP check
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Why a probe produced a DOWN verdict
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeFailure {
    /// No response within the probe timeout
    Timeout,

    /// DNS failure or connection refused
    Connect(String),

    /// The connection string is not a usable URL
    InvalidUrl(String),

    /// Any other transport or protocol error
    Request(String),

    /// A response arrived but its status code did not match
    UnexpectedStatus { expected: String, actual: u16 },

    /// The prober itself panicked
    Panicked(String),
}

impl ProbeFailure {
    /// Whether the probe errored, as opposed to getting the wrong answer
    pub fn is_error(&self) -> bool {
        !matches!(self, ProbeFailure::UnexpectedStatus { .. })
    }
}

impl fmt::Display for ProbeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeFailure::Timeout => write!(f, "request timed out"),
            ProbeFailure::Connect(msg) => write!(f, "connection failed: {}", msg),
            ProbeFailure::InvalidUrl(msg) => write!(f, "invalid url: {}", msg),
            ProbeFailure::Request(msg) => write!(f, "request failed: {}", msg),
            ProbeFailure::UnexpectedStatus { expected, actual } => {
                write!(f, "expected status {}, got {}", expected, actual)
            }
            ProbeFailure::Panicked(msg) => write!(f, "prober panicked: {}", msg),
        }
    }
}

impl From<reqwest::Error> for ProbeFailure {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProbeFailure::Timeout
        } else if err.is_builder() {
            ProbeFailure::InvalidUrl(err.to_string())
        } else if err.is_connect() {
            ProbeFailure::Connect(err.to_string())
        } else {
            ProbeFailure::Request(err.to_string())
        }
    }
}

/// Verdict of a single probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOutcome {
    pub status: Status,

    /// Status code of the response, when one was received
    pub http_status_code: Option<u16>,

    /// Reason for a DOWN verdict
    pub failure: Option<ProbeFailure>,
}

impl ProbeOutcome {
    pub fn up(http_status_code: Option<u16>) -> Self {
        Self {
            status: Status::Up,
            http_status_code,
            failure: None,
        }
    }

    pub fn down(failure: ProbeFailure) -> Self {
        let http_status_code = match &failure {
            ProbeFailure::UnexpectedStatus { actual, .. } => Some(*actual),
            _ => None,
        };

        Self {
            status: Status::Down,
            http_status_code,
            failure: Some(failure),
        }
    }
}

/// Something that can check a monitor
///
/// Implementations must always produce a verdict. The scheduler still guards
/// against panics, but errors have to be folded into `ProbeOutcome::down`.
#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, monitor: &Monitor) -> ProbeOutcome;
}

/// Production prober backed by a shared HTTP client
#[derive(Debug, Clone)]
pub struct HttpProber {
    /// HTTP client (reused across requests)
    client: reqwest::Client,
}

impl HttpProber {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    /// GET the connection and compare the status code with the expected response
    async fn check_http(&self, monitor: &Monitor) -> ProbeOutcome {
        trace!("checking {} at {}", monitor.alert_name, monitor.connection);

        let response = match self.client.get(&monitor.connection).send().await {
            Ok(response) => response,
            Err(e) => return ProbeOutcome::down(ProbeFailure::from(e)),
        };

        let status_code = response.status().as_u16();
        evaluate_status(status_code, &monitor.response)
    }
}

#[async_trait]
impl Prober for HttpProber {
    #[instrument(skip_all, fields(monitor = %monitor.alert_name, service_type = %monitor.service_type))]
    async fn probe(&self, monitor: &Monitor) -> ProbeOutcome {
        let outcome = match monitor.service_type {
            ServiceType::Http | ServiceType::Https => self.check_http(monitor).await,
            // TODO: replace with a real connect (and optional read) probe
            ServiceType::Tcp | ServiceType::Udp => ProbeOutcome::up(None),
            ServiceType::Custom => self.check_http(monitor).await,
        };

        debug!("probe finished with {}", outcome.status);
        outcome
    }
}

/// UP iff the stringified status code equals the expected response exactly
fn evaluate_status(status_code: u16, expected: &str) -> ProbeOutcome {
    if status_code.to_string() == expected {
        ProbeOutcome::up(Some(status_code))
    } else {
        ProbeOutcome::down(ProbeFailure::UnexpectedStatus {
            expected: expected.to_string(),
            actual: status_code,
        })
    }
}
