//! The span, instant and counter recording API.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use crate::common::{KeyValue, StringValue};
use crate::event::{Event, EventKind};
use crate::session::SessionInner;
use crate::time;
use crate::track::TrackId;
use crate::{tl_debug, tl_warn};

/// Category under which the core records its own diagnostic events.
pub(crate) const DIAGNOSTIC_CATEGORY: &str = "trackline";

/// Handle for recording events into a running session.
///
/// Cloning is cheap; clones share the session state. Recording operations
/// never return errors, never block on a full buffer and never panic:
/// misuse is counted in [`RecordingStats`](crate::RecordingStats) and
/// reported through internal logging, so instrumentation cannot alter the
/// control flow of the code it observes.
///
/// Disabled categories cost one set-membership check and one relaxed
/// counter increment per call, with no allocation or formatting.
#[derive(Clone, Debug)]
pub struct Recorder {
    pub(crate) inner: Arc<SessionInner>,
}

impl Recorder {
    /// True when `category` is recorded by this session.
    pub fn is_enabled(&self, category: &str) -> bool {
        self.inner.categories.is_enabled(category)
    }

    /// The track bound to the calling thread, created lazily.
    pub fn current_thread_track(&self) -> TrackId {
        self.inner.tracks.current_thread_track()
    }

    /// The whole-process track, created at first use.
    pub fn current_process_track(&self) -> TrackId {
        self.inner.tracks.current_process_track()
    }

    /// Cheap admission check shared by every recording operation. The
    /// not-running and disabled paths must stay allocation-free.
    #[inline]
    fn admit(&self, category: &str) -> bool {
        if !self.inner.is_running() {
            if self.inner.stats.rejected_not_running.fetch_add(1, Ordering::Relaxed) == 0 {
                tl_warn!(
                    name: "Recorder.RejectedNotRunning",
                    message = "recording call outside a running session; further rejections are counted silently"
                );
            }
            return false;
        }
        if !self.inner.categories.is_enabled(category) {
            self.inner.stats.disabled_hits.fetch_add(1, Ordering::Relaxed);
            return false;
        }
        true
    }

    fn commit(&self, event: Event) {
        self.inner.buffer.append(event);
    }

    /// Open a span on `track`.
    ///
    /// Unscoped begin/end pairs are for spans that do not align with a
    /// lexical scope; prefer [`scoped_span`](Recorder::scoped_span), which
    /// guarantees balance on every exit path.
    pub fn begin_span(
        &self,
        category: &'static str,
        name: impl Into<StringValue>,
        track: TrackId,
        annotations: Vec<KeyValue>,
    ) {
        if !self.admit(category) {
            return;
        }
        let timestamp_ns = time::now_ns();
        let name = name.into();
        if let Ok(mut open) = self.inner.open_spans.lock() {
            open.entry(track).or_default().push(name.clone());
        }
        self.commit(Event {
            track,
            category: StringValue::Static(category),
            name,
            kind: EventKind::SpanBegin,
            timestamp_ns,
            seq: 0,
            annotations,
            counter_value: None,
        });
    }

    /// Close the most recently opened span on `track`.
    ///
    /// Begin and end must name the same track. An end with no open span
    /// on its track records one diagnostic instant event and recording
    /// continues; the span-end is not guessed onto another track.
    pub fn end_span(&self, category: &'static str, track: TrackId) {
        if !self.admit(category) {
            return;
        }
        let timestamp_ns = time::now_ns();
        let name = self
            .inner
            .open_spans
            .lock()
            .ok()
            .and_then(|mut open| open.get_mut(&track).and_then(Vec::pop));

        match name {
            Some(name) => self.commit(Event {
                track,
                category: StringValue::Static(category),
                name,
                kind: EventKind::SpanEnd,
                timestamp_ns,
                seq: 0,
                annotations: Vec::new(),
                counter_value: None,
            }),
            None => {
                self.inner.stats.unbalanced_ends.fetch_add(1, Ordering::Relaxed);
                tl_debug!(
                    name: "Recorder.UnbalancedSpanEnd",
                    category = category,
                    track = track.as_u64()
                );
                self.commit(Event {
                    track,
                    category: StringValue::Static(DIAGNOSTIC_CATEGORY),
                    name: StringValue::Static("unbalanced_span_end"),
                    kind: EventKind::Instant,
                    timestamp_ns,
                    seq: 0,
                    annotations: vec![KeyValue::new("category", category)],
                    counter_value: None,
                });
            }
        }
    }

    /// Open a span that closes itself when the returned handle is
    /// released, on normal or unwinding exit from the enclosing scope.
    ///
    /// This is the preferred form; it guarantees begin/end balance
    /// regardless of early returns or failure paths in the caller.
    #[must_use = "the span ends when the handle is dropped"]
    pub fn scoped_span(
        &self,
        category: &'static str,
        name: impl Into<StringValue>,
        track: TrackId,
        annotations: Vec<KeyValue>,
    ) -> ScopedSpan {
        self.begin_span(category, name, track, annotations);
        ScopedSpan {
            recorder: self.clone(),
            category,
            track,
            ended: false,
        }
    }

    /// Record a timestamped scalar sample. Counters need no balancing.
    pub fn record_counter(
        &self,
        category: &'static str,
        name: impl Into<StringValue>,
        track: TrackId,
        value: i64,
    ) {
        if !self.admit(category) {
            return;
        }
        self.commit(Event {
            track,
            category: StringValue::Static(category),
            name: name.into(),
            kind: EventKind::CounterSample,
            timestamp_ns: time::now_ns(),
            seq: 0,
            annotations: Vec::new(),
            counter_value: Some(value),
        });
    }

    /// Record a point-in-time event with no duration.
    pub fn instant(
        &self,
        category: &'static str,
        name: impl Into<StringValue>,
        track: TrackId,
        annotations: Vec<KeyValue>,
    ) {
        if !self.admit(category) {
            return;
        }
        self.commit(Event {
            track,
            category: StringValue::Static(category),
            name: name.into(),
            kind: EventKind::Instant,
            timestamp_ns: time::now_ns(),
            seq: 0,
            annotations,
            counter_value: None,
        });
    }
}

/// Guard that ends its span exactly once.
///
/// The span ends either on an explicit [`end`](ScopedSpan::end) or when
/// the guard drops, whichever comes first.
#[derive(Debug)]
pub struct ScopedSpan {
    recorder: Recorder,
    category: &'static str,
    track: TrackId,
    ended: bool,
}

impl ScopedSpan {
    /// End the span now instead of at scope exit.
    pub fn end(mut self) {
        self.end_inner();
    }

    fn end_inner(&mut self) {
        if !self.ended {
            self.ended = true;
            self.recorder.end_span(self.category, self.track);
        }
    }
}

impl Drop for ScopedSpan {
    fn drop(&mut self) {
        self.end_inner();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Category, EventKind, Session};

    static CATEGORIES: &[Category] = &[
        Category::new("rendering", "Events from the graphics subsystem"),
        Category::with_tags("gpu.debug", "debug gpu events", &["debug"]),
    ];

    fn running_session() -> Session {
        let session = Session::builder()
            .with_capacity(64)
            .with_categories(CATEGORIES)
            .build();
        session.start().unwrap();
        session
    }

    #[test]
    fn nested_spans_export_in_program_order() {
        let session = running_session();
        let recorder = session.recorder();
        let track = recorder.current_thread_track();

        recorder.begin_span("rendering", "A", track, Vec::new());
        recorder.begin_span("rendering", "B", track, Vec::new());
        recorder.end_span("rendering", track);
        recorder.end_span("rendering", track);
        session.stop().unwrap();

        let events = session.export_snapshot().unwrap();
        let names: Vec<_> = events.iter().map(|e| e.name.as_str()).collect();
        let kinds: Vec<_> = events.iter().map(|e| e.kind).collect();
        assert_eq!(names, vec!["A", "B", "B", "A"]);
        assert_eq!(
            kinds,
            vec![
                EventKind::SpanBegin,
                EventKind::SpanBegin,
                EventKind::SpanEnd,
                EventKind::SpanEnd
            ]
        );
    }

    #[test]
    fn nesting_depth_never_goes_negative() {
        let session = running_session();
        let recorder = session.recorder();
        let track = recorder.current_thread_track();

        recorder.begin_span("rendering", "A", track, Vec::new());
        recorder.end_span("rendering", track);
        recorder.begin_span("rendering", "B", track, Vec::new());
        recorder.end_span("rendering", track);
        session.stop().unwrap();

        let mut depth = 0i64;
        for event in session.export_snapshot().unwrap() {
            match event.kind {
                EventKind::SpanBegin => depth += 1,
                EventKind::SpanEnd => depth -= 1,
                _ => {}
            }
            assert!(depth >= 0);
        }
        assert_eq!(depth, 0);
    }

    #[test]
    fn unbalanced_end_records_one_diagnostic() {
        let session = running_session();
        let recorder = session.recorder();
        let track = recorder.current_thread_track();

        recorder.end_span("rendering", track);

        let events = session.export_snapshot().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, EventKind::Instant);
        assert_eq!(events[0].name.as_str(), "unbalanced_span_end");
        assert_eq!(events[0].category.as_str(), DIAGNOSTIC_CATEGORY);
        assert_eq!(session.stats().unbalanced_ends, 1);
    }

    #[test]
    fn cross_track_end_is_unbalanced() {
        let session = running_session();
        let recorder = session.recorder();
        let here = recorder.current_thread_track();
        let elsewhere = session
            .registry()
            .register_track(crate::TrackKind::Custom, "requests", None)
            .unwrap();

        recorder.begin_span("rendering", "HandleRequest", here, Vec::new());
        recorder.end_span("rendering", elsewhere);

        assert_eq!(session.stats().unbalanced_ends, 1);
        // The span on the original track is still open and can be closed.
        recorder.end_span("rendering", here);
        assert_eq!(session.stats().unbalanced_ends, 1);
    }

    #[test]
    fn disabled_category_appends_nothing() {
        let session = running_session();
        let recorder = session.recorder();
        let track = recorder.current_thread_track();

        for _ in 0..100 {
            recorder.begin_span("gpu.debug", "Invisible", track, Vec::new());
            recorder.end_span("gpu.debug", track);
            recorder.record_counter("gpu.debug", "Samples", track, 1);
        }

        assert!(session.export_snapshot().unwrap().is_empty());
        assert_eq!(session.stats().disabled_hits, 300);
    }

    #[test]
    fn scoped_span_ends_on_drop() {
        let session = running_session();
        let recorder = session.recorder();
        let track = recorder.current_thread_track();

        {
            let _span = recorder.scoped_span("rendering", "Scoped", track, Vec::new());
        }

        let events = session.export_snapshot().unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].kind, EventKind::SpanBegin);
        assert_eq!(events[1].kind, EventKind::SpanEnd);
        assert_eq!(events[1].name.as_str(), "Scoped");
    }

    #[test]
    fn scoped_span_explicit_end_does_not_double_close() {
        let session = running_session();
        let recorder = session.recorder();
        let track = recorder.current_thread_track();

        let span = recorder.scoped_span("rendering", "Once", track, Vec::new());
        span.end();

        let events = session.export_snapshot().unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(session.stats().unbalanced_ends, 0);
    }

    #[test]
    fn scoped_span_ends_on_unwind() {
        let session = running_session();
        let recorder = session.recorder();
        let track = recorder.current_thread_track();

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _span = recorder.scoped_span("rendering", "Panicky", track, Vec::new());
            panic!("simulated failure");
        }));
        assert!(result.is_err());

        let events = session.export_snapshot().unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].kind, EventKind::SpanEnd);
    }

    #[test]
    fn counter_sample_round_trip() {
        let session = running_session();
        let recorder = session.recorder();
        let track = recorder.current_thread_track();

        recorder.record_counter("rendering", "Framerate", track, 120);
        session.stop().unwrap();

        let events = session.export_snapshot().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, EventKind::CounterSample);
        assert_eq!(events[0].name.as_str(), "Framerate");
        assert_eq!(events[0].counter_value, Some(120));
    }

    #[test]
    fn dynamic_and_static_names_unify() {
        let session = running_session();
        let recorder = session.recorder();
        let track = recorder.current_thread_track();

        let dynamic = String::from("PictureLayer::Update");
        recorder.instant("rendering", dynamic, track, Vec::new());
        recorder.instant("rendering", "PictureLayer::Update", track, Vec::new());

        let events = session.export_snapshot().unwrap();
        assert_eq!(events[0].name, events[1].name);
    }

    #[test]
    fn annotations_preserve_order() {
        let session = running_session();
        let recorder = session.recorder();
        let track = recorder.current_thread_track();

        recorder.begin_span(
            "rendering",
            "DrawWeapons",
            track,
            vec![
                crate::KeyValue::new("WeaponNum", 3),
                crate::KeyValue::new("PlayerNum", 1),
            ],
        );

        let events = session.export_snapshot().unwrap();
        let keys: Vec<_> = events[0]
            .annotations
            .iter()
            .map(|kv| kv.key.as_str())
            .collect();
        assert_eq!(keys, vec!["WeaponNum", "PlayerNum"]);
    }
}
