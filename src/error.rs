//! Error types for the simulation API.
//!
//! "No event" is never an error: collision and stop queries return `Option`.
//! These variants cover misuse of the public API and runaway timelines.

use thiserror::Error;

use crate::{BodyId, Timestamp};

/// Errors that can occur while building or advancing a simulation.
#[derive(Debug, Error)]
pub enum SimError {
    /// Timestamp is not strictly after the timeline origin.
    #[error("timestamp {timestamp} is not after the timeline origin {origin}")]
    BeforeOrigin {
        /// The offending timestamp.
        timestamp: Timestamp,
        /// Time of the initial snapshot.
        origin: Timestamp,
    },

    /// Timestamp is NaN or infinite.
    #[error("timestamp is not finite: {0}")]
    NonFiniteTime(f64),

    /// No body with this id exists in the timeline.
    #[error("unknown body id: {0}")]
    UnknownBody(BodyId),

    /// A single advance materialized more transitions than allowed.
    #[error("transition limit of {limit} reached before time {target}")]
    TransitionLimit {
        /// Configured limit.
        limit: usize,
        /// Time the advance was aiming for.
        target: Timestamp,
    },

    /// The next transition does not move the timeline forward in `f64`.
    #[error("timeline stalled at {at}: transition after {after} does not advance time")]
    StalledTimeline {
        /// Time of the latest snapshot.
        at: Timestamp,
        /// Duration of the pending transition.
        after: f64,
    },

    /// Body parameters are out of range.
    #[error("invalid body {id}: {reason}")]
    InvalidBody {
        /// Body id.
        id: BodyId,
        /// What is wrong with it.
        reason: String,
    },

    /// Configuration could not be parsed or is out of range.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl SimError {
    /// Creates an invalid body error.
    #[must_use]
    pub fn invalid_body(id: BodyId, reason: impl Into<String>) -> Self {
        Self::InvalidBody {
            id,
            reason: reason.into(),
        }
    }

    /// Creates a configuration error.
    #[must_use]
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config(reason.into())
    }
}

impl From<serde_json::Error> for SimError {
    fn from(err: serde_json::Error) -> Self {
        Self::Config(err.to_string())
    }
}

/// Result type for simulation operations.
pub type Result<T> = std::result::Result<T, SimError>;

/// Rejects NaN and infinite timestamps.
pub(crate) fn ensure_finite(timestamp: Timestamp) -> Result<Timestamp> {
    if timestamp.is_finite() {
        Ok(timestamp)
    } else {
        Err(SimError::NonFiniteTime(timestamp))
    }
}
