//! Correlation id shared by a request's log lines, error envelopes, and the
//! `trace-id` response header.
//!
//! The id lives in tokio task-local storage, so it is only visible inside
//! [`TraceId::scope`]. Work moved onto another task must be wrapped again.

use std::fmt;
use std::future::Future;
use std::str::FromStr;

use tokio::task_local;
use uuid::Uuid;

/// Header that carries the id in both directions.
pub const TRACE_ID_HEADER: &str = "trace-id";

task_local! {
    static CURRENT: TraceId;
}

/// UUID identifying one request.
///
/// ```
/// use portal::domain::TraceId;
///
/// let upstream = "6f1c1c9e-3a0e-4c65-9d4f-0f3f5f8f1a2b";
/// assert_eq!(TraceId::adopt_or_generate(Some(upstream)).to_string(), upstream);
/// assert_ne!(TraceId::adopt_or_generate(Some("junk")).to_string(), "junk");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceId(Uuid);

impl TraceId {
    /// A fresh random id.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Keep a well-formed id supplied by an upstream proxy, else mint one.
    #[must_use]
    pub fn adopt_or_generate(upstream: Option<&str>) -> Self {
        upstream
            .and_then(|raw| raw.trim().parse().ok())
            .unwrap_or_else(Self::generate)
    }

    /// The id of the request being handled, if any.
    #[must_use]
    pub fn current() -> Option<Self> {
        CURRENT.try_with(|id| *id).ok()
    }

    /// Run `fut` with `trace_id` as the current id.
    pub async fn scope<Fut: Future>(trace_id: Self, fut: Fut) -> Fut::Output {
        CURRENT.scope(trace_id, fut).await
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0.hyphenated(), f)
    }
}

impl FromStr for TraceId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}
