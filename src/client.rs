// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Tasks Collector service client.
//!
//! All traffic goes through the [`Transport`] trait, so the rest of the crate
//! never touches an HTTP library directly. [`HttpTransport`] is the real
//! implementation, using a blocking client with HTTP Basic Auth.
//!
//! # Failure Classes
//!
//! Transport failures are split in two, because they are handled differently
//! by callers:
//!
//! - [`TransportError::Connect`]: no connection to the service was made,
//!   e.g., name lookup failed, the connection was refused, or connecting
//!   timed out. Submissions that fail this way are queued for later delivery.
//! - [`TransportError::Request`]: anything that went wrong after a connection
//!   was made, including a response that took too long. The service may
//!   already hold the submission, so these are reported, never queued.
//!
//! Writes carry no overall time limit. Only best-effort reads are bounded,
//! by the timeout passed to [`Transport::get`].
//!
//! A response with a non-2xx status is __not__ a transport failure. It comes
//! back as an [`ApiResponse`] like any other.

use crate::digest::{DailyEvents, Habit, ObservationSummary, Page, Plan, QuickNote};

use chrono::NaiveDate;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{ser::PrettyFormatter, Value as Json};
use std::{
    error::Error as StdError,
    fmt::{Debug, Formatter, Result as FmtResult},
    time::Duration,
};
use tracing::{debug, instrument};

/// Time limit for reads that must not hold up an interactive edit.
pub const BEST_EFFORT_TIMEOUT: Duration = Duration::from_secs(3);

/// HTTP Basic Auth credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub user: String,
    pub password: String,
}

impl Credentials {
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            password: password.into(),
        }
    }
}

impl Debug for Credentials {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Status and raw body of a service response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Status is in the 2xx range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body parsed as JSON.
    ///
    /// # Errors
    ///
    /// - Return [`serde_json::Error`] if body is not valid JSON.
    pub fn json(&self) -> Result<Json, serde_json::Error> {
        serde_json::from_str(&self.body)
    }

    /// Human readable form of response for error reports.
    ///
    /// JSON bodies are pretty printed with four space indentation and sorted
    /// keys. Anything else is shown as `HTTP <status>` followed by the raw
    /// body.
    pub fn describe(&self) -> String {
        match self.json() {
            Ok(json) => pretty_json(&json).unwrap_or_else(|_| self.describe_raw()),
            Err(_) => self.describe_raw(),
        }
    }

    fn describe_raw(&self) -> String {
        format!("HTTP {}\n{}", self.status, self.body)
    }
}

fn pretty_json(json: &Json) -> Result<String, serde_json::Error> {
    // INVARIANT: serde_json maps are ordered by key unless "preserve_order" is on.
    let mut buffer = Vec::new();
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut buffer, PrettyFormatter::with_indent(b"    "));
    json.serialize(&mut serializer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

/// Raw request seam.
pub trait Transport {
    /// Send GET request, optionally bounded by `timeout`.
    ///
    /// # Errors
    ///
    /// - Return [`TransportError`] if no response was received.
    fn get(&self, url: &str, timeout: Option<Duration>) -> Result<ApiResponse, TransportError>;

    /// Send POST request with JSON body.
    ///
    /// # Errors
    ///
    /// - Return [`TransportError`] if no response was received.
    fn post_json(&self, url: &str, body: &Json) -> Result<ApiResponse, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn get(&self, url: &str, timeout: Option<Duration>) -> Result<ApiResponse, TransportError> {
        (**self).get(url, timeout)
    }

    fn post_json(&self, url: &str, body: &Json) -> Result<ApiResponse, TransportError> {
        (**self).post_json(url, body)
    }
}

/// Blocking HTTP transport with Basic Auth.
#[derive(Debug)]
pub struct HttpTransport {
    client: reqwest::blocking::Client,
    credentials: Credentials,
}

impl HttpTransport {
    /// Construct new transport.
    ///
    /// # Errors
    ///
    /// - Return [`TransportError::Request`] if HTTP client cannot be built,
    ///   e.g., TLS backend failed to initialize.
    pub fn new(credentials: Credentials) -> Result<Self, TransportError> {
        // INVARIANT: Blocking client defaults to a 30 second total timeout, drop it.
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .timeout(None::<Duration>)
            .build()
            .map_err(|err| classify("<client>", err))?;

        Ok(Self {
            client,
            credentials,
        })
    }

    fn send(
        &self,
        url: &str,
        request: reqwest::blocking::RequestBuilder,
    ) -> Result<ApiResponse, TransportError> {
        let response = request
            .basic_auth(&self.credentials.user, Some(&self.credentials.password))
            .send()
            .map_err(|err| classify(url, err))?;
        let status = response.status().as_u16();
        let body = response.text().map_err(|err| classify(url, err))?;
        debug!("{url} answered with HTTP {status}");

        Ok(ApiResponse { status, body })
    }
}

impl Transport for HttpTransport {
    #[instrument(skip(self), level = "debug")]
    fn get(&self, url: &str, timeout: Option<Duration>) -> Result<ApiResponse, TransportError> {
        let mut request = self.client.get(url);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }
        self.send(url, request)
    }

    #[instrument(skip(self, body), level = "debug")]
    fn post_json(&self, url: &str, body: &Json) -> Result<ApiResponse, TransportError> {
        self.send(url, self.client.post(url).json(body))
    }
}

fn classify(url: &str, error: reqwest::Error) -> TransportError {
    if error.is_connect() {
        TransportError::Connect {
            url: url.to_string(),
            source: Box::new(error),
        }
    } else {
        TransportError::Request {
            url: url.to_string(),
            source: Box::new(error),
        }
    }
}

/// Typed access to service endpoints.
#[derive(Debug)]
pub struct Api<T> {
    base_url: String,
    transport: T,
}

impl<T: Transport> Api<T> {
    /// Construct new API handle.
    ///
    /// Trailing slashes on `base_url` are dropped, endpoints are joined as
    /// `{base_url}/{path}`.
    pub fn new(base_url: impl Into<String>, transport: T) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            transport,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Absolute URL of endpoint path.
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// POST JSON body to endpoint path.
    ///
    /// # Errors
    ///
    /// - Return [`TransportError`] if no response was received.
    pub fn post(&self, path: &str, body: &Json) -> Result<ApiResponse, TransportError> {
        self.transport.post_json(&self.url(path), body)
    }

    /// GET endpoint path and decode a successful JSON body.
    ///
    /// # Errors
    ///
    /// - Return [`ClientError::Transport`] if no response was received.
    /// - Return [`ClientError::Rejected`] if status is not 2xx.
    /// - Return [`ClientError::Decode`] if body does not have expected shape.
    pub fn fetch<D: DeserializeOwned>(&self, path: &str, timeout: Option<Duration>) -> Result<D> {
        let url = self.url(path);
        let response = self.transport.get(&url, timeout)?;
        if !response.is_success() {
            return Err(ClientError::Rejected(response));
        }

        serde_json::from_str(&response.body).map_err(|err| ClientError::Decode { source: err, url })
    }

    /// Quick notes to show while journaling.
    ///
    /// Bounded by [`BEST_EFFORT_TIMEOUT`]. Any failure yields no notes.
    pub fn quick_notes(&self) -> Vec<QuickNote> {
        match self.fetch::<Page<QuickNote>>("quick-notes/", Some(BEST_EFFORT_TIMEOUT)) {
            Ok(page) => page.results,
            Err(err) => {
                debug!("skipping quick notes: {err}");
                Vec::new()
            }
        }
    }

    /// Plan for `today`, if one was made.
    ///
    /// Bounded by [`BEST_EFFORT_TIMEOUT`]. Any failure yields no plan.
    pub fn plan_for(&self, today: NaiveDate) -> Option<Plan> {
        let path = format!("plans/?pub_date={}", today.format("%Y-%m-%d"));
        match self.fetch::<Page<Plan>>(&path, Some(BEST_EFFORT_TIMEOUT)) {
            Ok(page) => page.results.into_iter().next(),
            Err(err) => {
                debug!("skipping plan: {err}");
                None
            }
        }
    }

    /// Most recent observations.
    ///
    /// # Errors
    ///
    /// - Return [`ClientError`] if listing could not be fetched.
    pub fn observations(&self, count: usize) -> Result<Vec<ObservationSummary>> {
        let page: Page<ObservationSummary> =
            self.fetch(&format!("observation-api/?page_size={count}"), None)?;
        Ok(page.results)
    }

    /// Every tracked habit.
    ///
    /// # Errors
    ///
    /// - Return [`ClientError`] if listing could not be fetched.
    pub fn habits(&self) -> Result<Vec<Habit>> {
        let page: Page<Habit> = self.fetch("habit-api/", None)?;
        Ok(page.results)
    }

    /// Events, plan, and reflection of one day on `thread`.
    ///
    /// # Errors
    ///
    /// - Return [`ClientError`] if the day could not be fetched.
    pub fn daily_events(&self, day: NaiveDate, thread: &str) -> Result<DailyEvents> {
        let path = format!("api/events/daily/?date={}&thread={thread}", day.format("%Y-%m-%d"));
        self.fetch(&path, None)
    }

    /// Append task to board thread.
    ///
    /// # Errors
    ///
    /// - Return [`TransportError`] if no response was received.
    pub fn append_to_board(&self, thread: &str, text: &str) -> Result<ApiResponse, TransportError> {
        let body = serde_json::json!({
            "thread-name": thread,
            "text": text,
        });
        self.post("boards/append/", &body)
    }
}

/// Transport error types.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Service could not be reached.
    #[error("failed to connect to {url}")]
    Connect {
        url: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    /// Request failed after reaching the service.
    #[error("request to {url} failed")]
    Request {
        url: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
}

impl TransportError {
    /// Failure belongs to the class that gets queued.
    pub fn is_connect(&self) -> bool {
        matches!(self, Self::Connect { .. })
    }
}

/// Client error types.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Service answered with non-2xx status.
    #[error("service rejected request with HTTP {}", .0.status)]
    Rejected(ApiResponse),

    /// Response body did not have expected shape.
    #[error("unexpected response from {url}")]
    Decode {
        #[source]
        source: serde_json::Error,
        url: String,
    },
}

/// Friendly result alias :3
type Result<T, E = ClientError> = std::result::Result<T, E>;
