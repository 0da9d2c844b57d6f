//! Error taxonomy for session lifecycle and track registration.
//!
//! Recording operations are deliberately absent here: a
//! [`Recorder`](crate::Recorder) call never surfaces an error to the
//! instrumented code. Disabled categories, unbalanced span ends, buffer
//! overflow and post-stop calls are counted in
//! [`RecordingStats`](crate::RecordingStats) and reported through internal
//! logging instead.

use std::sync::PoisonError;
use thiserror::Error;

use crate::track::TrackKind;

/// Errors returned by [`Session`](crate::Session) lifecycle methods.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum SessionError {
    /// `start` was called on a session that is already running.
    #[error("session is already running")]
    AlreadyRunning,

    /// `start` was called on a session that has already been stopped.
    /// The lifecycle is one-way; a stopped session cannot be restarted.
    #[error("session has already been stopped")]
    AlreadyStopped,

    /// The operation requires a running session.
    #[error("session is not running")]
    NotRunning,

    /// Internal failures not covered by the variants above.
    #[error("{0}")]
    Internal(String),
}

impl<T> From<PoisonError<T>> for SessionError {
    fn from(err: PoisonError<T>) -> Self {
        SessionError::Internal(err.to_string())
    }
}

/// Errors returned by
/// [`TrackRegistry::register_track`](crate::TrackRegistry::register_track).
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum TrackError {
    /// A track of the same kind and name is already registered.
    #[error("a {kind:?} track named {name:?} is already registered")]
    Duplicate {
        /// Kind of the conflicting track.
        kind: TrackKind,
        /// Display name of the conflicting track.
        name: String,
    },
}
