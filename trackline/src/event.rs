//! The immutable event record.

use crate::common::{KeyValue, StringValue};
use crate::track::TrackId;

/// What an [`Event`] records.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum EventKind {
    /// Opens a span on a track.
    SpanBegin,
    /// Closes the most recently opened span on the same track.
    SpanEnd,
    /// A point-in-time occurrence with no duration.
    Instant,
    /// A timestamped scalar sample.
    CounterSample,
}

/// One recorded occurrence on a track.
///
/// Events are created by the [`Recorder`](crate::Recorder) and immutable
/// once committed to the buffer. The commit sequence number is assigned
/// under the buffer lock, so for events with equal timestamps it reflects
/// commit order.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Event {
    /// The track this event belongs to.
    pub track: TrackId,
    /// The category it was recorded under.
    pub category: StringValue,
    /// Event name. Span-end events carry the name of the begin they close.
    pub name: StringValue,
    /// What this event records.
    pub kind: EventKind,
    /// Monotonic timestamp in nanoseconds, see [`crate::time::now_ns`].
    pub timestamp_ns: u64,
    /// Commit sequence number, assigned by the buffer.
    pub seq: u64,
    /// Ordered key/value annotations.
    pub annotations: Vec<KeyValue>,
    /// The sampled value; present only for [`EventKind::CounterSample`].
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub counter_value: Option<i64>,
}
