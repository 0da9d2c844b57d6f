//! Bounded, thread-safe, append-only event storage.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::error::SessionError;
use crate::event::Event;
use crate::tl_warn;

#[derive(Debug, Default)]
struct BufferInner {
    events: Vec<Event>,
    next_seq: u64,
}

/// Bounded in-memory store of recorded events.
///
/// `append` never blocks: when the buffer is full the incoming event is
/// dropped and counted instead, and committed events are never evicted.
/// Producers on the instrumented path must never stall, so overflow is
/// absorbed here rather than surfaced to them.
#[derive(Debug)]
pub struct EventBuffer {
    capacity: usize,
    inner: Mutex<BufferInner>,
    dropped: AtomicUsize,
}

impl EventBuffer {
    /// Create a buffer holding at most `capacity` events.
    pub fn with_capacity(capacity: usize) -> Self {
        EventBuffer {
            capacity,
            inner: Mutex::new(BufferInner::default()),
            dropped: AtomicUsize::new(0),
        }
    }

    /// Append an event, assigning its commit sequence number.
    ///
    /// Returns `false` and increments the dropped-event count when the
    /// buffer is full. The first drop emits a warning; later drops are
    /// only counted, and the total is reported at flush and stop.
    pub fn append(&self, mut event: Event) -> bool {
        let Ok(mut inner) = self.inner.lock() else {
            self.note_drop();
            return false;
        };
        if inner.events.len() >= self.capacity {
            drop(inner);
            self.note_drop();
            return false;
        }
        event.seq = inner.next_seq;
        inner.next_seq += 1;
        inner.events.push(event);
        true
    }

    fn note_drop(&self) {
        if self.dropped.fetch_add(1, Ordering::Relaxed) == 0 {
            tl_warn!(
                name: "EventBuffer.DroppingStarted",
                capacity = self.capacity,
                message = "event buffer is full; newest events are dropped until the session stops"
            );
        }
    }

    /// Copy of the current contents, ordered by timestamp with commit
    /// order as tie-break.
    ///
    /// The copy is taken under a brief critical section; later appends do
    /// not affect a snapshot already returned.
    pub fn snapshot(&self) -> Result<Vec<Event>, SessionError> {
        let mut events = self.inner.lock().map(|inner| inner.events.clone())?;
        events.sort_by_key(|event| (event.timestamp_ns, event.seq));
        Ok(events)
    }

    /// Number of committed events.
    pub fn len(&self) -> usize {
        self.inner.lock().map(|inner| inner.events.len()).unwrap_or(0)
    }

    /// True when nothing has been committed.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of events dropped because the buffer was full.
    pub fn dropped(&self) -> usize {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Configured capacity in events.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::StringValue;
    use crate::event::EventKind;
    use crate::track::TrackId;

    fn instant(name: &'static str, timestamp_ns: u64) -> Event {
        Event {
            track: test_track(),
            category: StringValue::Static("test"),
            name: StringValue::Static(name),
            kind: EventKind::Instant,
            timestamp_ns,
            seq: 0,
            annotations: Vec::new(),
            counter_value: None,
        }
    }

    fn test_track() -> TrackId {
        crate::TrackRegistry::new().current_process_track()
    }

    #[test]
    fn append_reports_overflow_without_evicting() {
        let buffer = EventBuffer::with_capacity(2);
        assert!(buffer.append(instant("a", 1)));
        assert!(buffer.append(instant("b", 2)));
        assert!(!buffer.append(instant("c", 3)));
        assert!(!buffer.append(instant("d", 4)));

        assert_eq!(buffer.len(), 2);
        assert_eq!(buffer.dropped(), 2);
        let names: Vec<_> = buffer
            .snapshot()
            .unwrap()
            .into_iter()
            .map(|event| event.name)
            .collect();
        assert_eq!(names, vec!["a".into(), "b".into()]);
    }

    #[test]
    fn snapshot_orders_by_timestamp_then_commit_order() {
        let buffer = EventBuffer::with_capacity(8);
        buffer.append(instant("late", 30));
        buffer.append(instant("early", 10));
        buffer.append(instant("tie-first", 20));
        buffer.append(instant("tie-second", 20));

        let names: Vec<_> = buffer
            .snapshot()
            .unwrap()
            .into_iter()
            .map(|event| event.name)
            .collect();
        assert_eq!(
            names,
            vec![
                "early".into(),
                "tie-first".into(),
                "tie-second".into(),
                "late".into()
            ]
        );
    }

    #[test]
    fn snapshot_is_a_copy_not_a_live_view() {
        let buffer = EventBuffer::with_capacity(8);
        buffer.append(instant("a", 1));
        let before = buffer.snapshot().unwrap();
        buffer.append(instant("b", 2));
        assert_eq!(before.len(), 1);
        assert_eq!(buffer.snapshot().unwrap().len(), 2);
    }

    #[test]
    fn sequence_numbers_follow_commit_order() {
        let buffer = EventBuffer::with_capacity(4);
        for i in 0..4 {
            buffer.append(instant("e", i));
        }
        let seqs: Vec<_> = buffer
            .snapshot()
            .unwrap()
            .into_iter()
            .map(|event| event.seq)
            .collect();
        assert_eq!(seqs, vec![0, 1, 2, 3]);
    }
}
