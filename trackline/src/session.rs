//! Session lifecycle, configuration and snapshot export.

use std::collections::HashMap;
use std::env;
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::buffer::EventBuffer;
use crate::category::{Category, CategorySet};
use crate::common::StringValue;
use crate::error::SessionError;
use crate::event::Event;
use crate::recorder::Recorder;
use crate::track::{TrackId, TrackRegistry};
use crate::{tl_debug, tl_info, tl_warn};

/// Environment variable overriding the default buffer capacity, in events.
pub const TRACKLINE_BUFFER_CAPACITY: &str = "TRACKLINE_BUFFER_CAPACITY";
/// Default buffer capacity in events.
const DEFAULT_BUFFER_CAPACITY: usize = 2048;

const STATE_CONFIGURED: u8 = 0;
const STATE_RUNNING: u8 = 1;
const STATE_STOPPED: u8 = 2;

/// Where a session is in its one-way lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    /// Built but not yet started; recording calls are rejected.
    Configured,
    /// Recording calls are accepted.
    Running,
    /// Stopped for good; recording calls are rejected, the buffered
    /// events remain exportable.
    Stopped,
}

#[derive(Debug, Default)]
pub(crate) struct StatCounters {
    pub(crate) disabled_hits: AtomicUsize,
    pub(crate) unbalanced_ends: AtomicUsize,
    pub(crate) rejected_not_running: AtomicUsize,
}

/// Counters describing what a session declined to record.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RecordingStats {
    /// Events dropped because the buffer was full.
    pub dropped_events: usize,
    /// Recording calls filtered because their category was disabled.
    pub disabled_hits: usize,
    /// `end_span` calls that found no open span on their track.
    pub unbalanced_ends: usize,
    /// Recording calls rejected before start or after stop.
    pub rejected_not_running: usize,
}

#[derive(Debug)]
pub(crate) struct SessionInner {
    pub(crate) buffer: EventBuffer,
    pub(crate) categories: CategorySet,
    pub(crate) tracks: TrackRegistry,
    pub(crate) open_spans: Mutex<HashMap<TrackId, Vec<StringValue>>>,
    pub(crate) stats: StatCounters,
    state: AtomicU8,
}

impl SessionInner {
    #[inline]
    pub(crate) fn is_running(&self) -> bool {
        self.state.load(Ordering::Acquire) == STATE_RUNNING
    }
}

impl Drop for SessionInner {
    fn drop(&mut self) {
        if self.state.load(Ordering::Relaxed) == STATE_RUNNING {
            tl_debug!(
                name: "Session.DroppedWhileRunning",
                recorded = self.buffer.len(),
                dropped = self.buffer.dropped()
            );
        }
    }
}

/// The active recording context.
///
/// A session owns the event buffer, the enabled-category set and the
/// track registry, and walks a one-way lifecycle:
/// `configured -> running -> stopped`, no re-entry. Cloning a `Session`
/// creates a new reference to the same context, not a new context.
///
/// Lifecycle misuse (`start` twice, `stop` before `start`) is the only
/// error surfaced to the controlling caller; everything that can go wrong
/// on the recording path is absorbed and counted instead, see
/// [`RecordingStats`].
#[derive(Clone, Debug)]
pub struct Session {
    inner: Arc<SessionInner>,
}

impl Session {
    /// Create a new [`SessionBuilder`].
    pub fn builder() -> SessionBuilder {
        SessionBuilder::default()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        match self.inner.state.load(Ordering::Acquire) {
            STATE_CONFIGURED => SessionState::Configured,
            STATE_RUNNING => SessionState::Running,
            _ => SessionState::Stopped,
        }
    }

    /// Transition from `configured` to `running`.
    ///
    /// Recorder calls are accepted from this point on.
    pub fn start(&self) -> Result<(), SessionError> {
        match self.inner.state.compare_exchange(
            STATE_CONFIGURED,
            STATE_RUNNING,
            Ordering::AcqRel,
            Ordering::Acquire,
        ) {
            Ok(_) => {
                tl_debug!(
                    name: "Session.Started",
                    capacity = self.inner.buffer.capacity(),
                    enabled_categories = self.inner.categories.len()
                );
                Ok(())
            }
            Err(STATE_RUNNING) => Err(SessionError::AlreadyRunning),
            Err(_) => Err(SessionError::AlreadyStopped),
        }
    }

    /// A recording handle sharing this session's state.
    pub fn recorder(&self) -> Recorder {
        Recorder {
            inner: Arc::clone(&self.inner),
        }
    }

    /// The track registry owned by this session.
    pub fn registry(&self) -> &TrackRegistry {
        &self.inner.tracks
    }

    /// Barrier making every recorded event visible to export.
    ///
    /// Appends commit atomically under the buffer lock, so any event whose
    /// recording call returned before `flush` was invoked is visible to a
    /// subsequent [`export_snapshot`](Session::export_snapshot). Flush
    /// also reports accumulated drop counts; it may be called any number
    /// of times while running and never blocks on producers.
    pub fn flush(&self) -> Result<(), SessionError> {
        if !self.inner.is_running() {
            return Err(SessionError::NotRunning);
        }
        let dropped = self.inner.buffer.dropped();
        if dropped > 0 {
            tl_warn!(name: "Session.Flush.Dropped", dropped = dropped);
        }
        Ok(())
    }

    /// Transition from `running` to `stopped`, one-way.
    ///
    /// Recorder calls racing with `stop` either commit their event or are
    /// rejected whole; no event is ever partially written. After `stop`
    /// the buffer content is frozen and remains exportable.
    pub fn stop(&self) -> Result<(), SessionError> {
        match self.inner.state.compare_exchange(
            STATE_RUNNING,
            STATE_STOPPED,
            Ordering::AcqRel,
            Ordering::Acquire,
        ) {
            Ok(_) => {
                tl_info!(
                    name: "Session.Stopped",
                    recorded = self.inner.buffer.len(),
                    dropped = self.inner.buffer.dropped(),
                    unbalanced_ends = self.inner.stats.unbalanced_ends.load(Ordering::Relaxed)
                );
                Ok(())
            }
            Err(_) => Err(SessionError::NotRunning),
        }
    }

    /// Ordered copy of the buffered events.
    ///
    /// Events are ordered by timestamp, ties broken by commit order, which
    /// preserves per-thread program order. The copy never changes after it
    /// is returned; calling this twice without intervening writes returns
    /// equal sequences. While running it is a partial view.
    pub fn export_snapshot(&self) -> Result<Vec<Event>, SessionError> {
        self.inner.buffer.snapshot()
    }

    /// Counters describing what this session declined to record.
    pub fn stats(&self) -> RecordingStats {
        RecordingStats {
            dropped_events: self.inner.buffer.dropped(),
            disabled_hits: self.inner.stats.disabled_hits.load(Ordering::Relaxed),
            unbalanced_ends: self.inner.stats.unbalanced_ends.load(Ordering::Relaxed),
            rejected_not_running: self
                .inner
                .stats
                .rejected_not_running
                .load(Ordering::Relaxed),
        }
    }
}

/// Configures and builds a [`Session`].
///
/// The built session starts in the `configured` state; call
/// [`Session::start`] to begin accepting recorder calls.
#[derive(Debug, Default)]
pub struct SessionBuilder {
    capacity: Option<usize>,
    categories: &'static [Category],
    enabled: Vec<&'static str>,
    disabled: Vec<&'static str>,
}

impl SessionBuilder {
    /// Buffer capacity in events.
    ///
    /// Defaults to the `TRACKLINE_BUFFER_CAPACITY` environment variable
    /// when set and parseable, else 2048.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = Some(capacity);
        self
    }

    /// The category declarations this session records from.
    ///
    /// Categories tagged `debug` or `verbose` are disabled unless
    /// explicitly enabled with [`with_enabled`](SessionBuilder::with_enabled).
    pub fn with_categories(mut self, categories: &'static [Category]) -> Self {
        self.categories = categories;
        self
    }

    /// Enable a declared category regardless of its tags.
    pub fn with_enabled(mut self, category: &'static str) -> Self {
        self.enabled.push(category);
        self
    }

    /// Disable a declared category regardless of its tags.
    pub fn with_disabled(mut self, category: &'static str) -> Self {
        self.disabled.push(category);
        self
    }

    /// Build a session in the `configured` state.
    pub fn build(self) -> Session {
        let capacity = self.capacity.unwrap_or_else(capacity_from_env);
        let categories =
            CategorySet::from_declarations(self.categories, &self.enabled, &self.disabled);
        Session {
            inner: Arc::new(SessionInner {
                buffer: EventBuffer::with_capacity(capacity),
                categories,
                tracks: TrackRegistry::new(),
                open_spans: Mutex::new(HashMap::new()),
                stats: StatCounters::default(),
                state: AtomicU8::new(STATE_CONFIGURED),
            }),
        }
    }
}

fn capacity_from_env() -> usize {
    env::var(TRACKLINE_BUFFER_CAPACITY)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(DEFAULT_BUFFER_CAPACITY)
}
