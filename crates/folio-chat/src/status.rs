//! Lifecycle of the assistant reply currently being requested.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where the session is in the request/stream cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamStatus {
    /// Nothing in flight.
    #[default]
    Idle,
    /// Request sent, no stream event received yet.
    Submitted,
    /// Events are arriving.
    Streaming,
    /// The last exchange failed or was aborted.
    Error,
}

impl StreamStatus {
    /// A reply is in progress; new submissions are refused.
    pub fn is_busy(self) -> bool {
        matches!(self, StreamStatus::Submitted | StreamStatus::Streaming)
    }

    /// Whether moving from `self` to `next` is a legal step.
    ///
    /// `Error` is not a dead end: a new submission leaves it through
    /// `Submitted`, so input is never locked.
    pub fn can_transition_to(self, next: StreamStatus) -> bool {
        use StreamStatus::*;
        matches!(
            (self, next),
            (Idle, Submitted)
                | (Error, Submitted)
                | (Submitted, Streaming)
                | (Submitted, Idle)
                | (Submitted, Error)
                | (Streaming, Idle)
                | (Streaming, Error)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StreamStatus::Idle => "idle",
            StreamStatus::Submitted => "submitted",
            StreamStatus::Streaming => "streaming",
            StreamStatus::Error => "error",
        }
    }
}

impl fmt::Display for StreamStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
