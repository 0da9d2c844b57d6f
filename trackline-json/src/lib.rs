//! JSON lines serialization for trackline snapshots.
//!
//! The trackline core exposes [`Session::export_snapshot`] and leaves
//! serialization to a collaborator; this crate is that collaborator for a
//! plain-text format. A [`JsonSnapshotWriter`] writes one JSON object per
//! line to any [`std::io::Write`]: first a preamble record per registered
//! track, then one record per event in export order. The output is a
//! direct serialization of the snapshot, not a stable interchange format.
//!
//! ```
//! use trackline::{Category, Session};
//! use trackline_json::JsonSnapshotWriter;
//!
//! static CATEGORIES: &[Category] = &[
//!     Category::new("rendering", "Events from the graphics subsystem"),
//! ];
//!
//! let session = Session::builder().with_categories(CATEGORIES).build();
//! session.start().unwrap();
//! let recorder = session.recorder();
//! let track = recorder.current_thread_track();
//! recorder.record_counter("rendering", "Framerate", track, 120);
//! session.stop().unwrap();
//!
//! let mut out = Vec::new();
//! let mut writer = JsonSnapshotWriter::new(&mut out);
//! writer
//!     .write_snapshot(
//!         &session.registry().tracks(),
//!         &session.export_snapshot().unwrap(),
//!     )
//!     .unwrap();
//! let text = String::from_utf8(out).unwrap();
//! assert_eq!(text.lines().count(), 3);
//! ```
//!
//! [`Session::export_snapshot`]: trackline::Session::export_snapshot
#![warn(
    future_incompatible,
    missing_debug_implementations,
    missing_docs,
    nonstandard_style,
    rust_2018_idioms,
    unreachable_pub,
    unused
)]

use std::io::{self, Write};

use serde::Serialize;
use trackline::{Event, Track};

/// One output line: a track preamble record or an event record.
#[derive(Serialize)]
#[serde(rename_all = "snake_case")]
enum Line<'a> {
    Track(&'a Track),
    Event(&'a Event),
}

/// Writes an exported snapshot as newline-delimited JSON.
#[derive(Debug)]
pub struct JsonSnapshotWriter<W: Write> {
    writer: W,
}

impl<W: Write> JsonSnapshotWriter<W> {
    /// Create a writer emitting to `writer`.
    pub fn new(writer: W) -> Self {
        JsonSnapshotWriter { writer }
    }

    /// Write the track preamble followed by every event, one JSON object
    /// per line, in the order given.
    pub fn write_snapshot(&mut self, tracks: &[Track], events: &[Event]) -> io::Result<()> {
        for track in tracks {
            self.write_line(&Line::Track(track))?;
        }
        for event in events {
            self.write_line(&Line::Event(event))?;
        }
        self.writer.flush()
    }

    fn write_line(&mut self, line: &Line<'_>) -> io::Result<()> {
        serde_json::to_writer(&mut self.writer, line)?;
        self.writer.write_all(b"\n")
    }

    /// Consume the writer and return the underlying sink.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trackline::{Category, Session};

    static CATEGORIES: &[Category] = &[
        Category::new("rendering", "Events from the graphics subsystem"),
        Category::new("network", "Network upload and download statistics"),
    ];

    fn lines(bytes: &[u8]) -> Vec<serde_json::Value> {
        std::str::from_utf8(bytes)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn snapshot_round_trips_through_json_lines() {
        let session = Session::builder()
            .with_capacity(64)
            .with_categories(CATEGORIES)
            .build();
        session.start().unwrap();
        let recorder = session.recorder();
        let track = recorder.current_thread_track();

        recorder.begin_span("rendering", "DrawGame", track, Vec::new());
        recorder.record_counter("rendering", "Framerate", track, 120);
        recorder.end_span("rendering", track);
        session.stop().unwrap();

        let tracks = session.registry().tracks();
        let events = session.export_snapshot().unwrap();

        let mut out = Vec::new();
        JsonSnapshotWriter::new(&mut out)
            .write_snapshot(&tracks, &events)
            .unwrap();

        let lines = lines(&out);
        // Process track, thread track, then three events.
        assert_eq!(lines.len(), 5);
        assert!(lines[0].get("track").is_some());
        assert!(lines[1].get("track").is_some());

        let counter = lines
            .iter()
            .filter_map(|line| line.get("event"))
            .find(|event| event["kind"] == "counter_sample")
            .unwrap();
        assert_eq!(counter["name"], "Framerate");
        assert_eq!(counter["counter_value"], 120);
    }

    #[test]
    fn track_records_carry_identity_and_parentage() {
        let session = Session::builder().with_categories(CATEGORIES).build();
        session.start().unwrap();
        let recorder = session.recorder();
        let thread_track = recorder.current_thread_track();
        let process_track = recorder.current_process_track();
        session.stop().unwrap();

        let mut out = Vec::new();
        JsonSnapshotWriter::new(&mut out)
            .write_snapshot(&session.registry().tracks(), &[])
            .unwrap();

        let lines = lines(&out);
        let tracks: Vec<_> = lines
            .iter()
            .filter_map(|line| line.get("track"))
            .collect();
        assert_eq!(tracks.len(), 2);

        let process = tracks
            .iter()
            .find(|track| track["kind"] == "process")
            .unwrap();
        assert_eq!(process["id"], process_track.as_u64());

        let thread = tracks
            .iter()
            .find(|track| track["kind"] == "thread")
            .unwrap();
        assert_eq!(thread["id"], thread_track.as_u64());
        assert_eq!(thread["parent"], process_track.as_u64());
    }

    #[test]
    fn empty_snapshot_writes_nothing() {
        let mut out = Vec::new();
        JsonSnapshotWriter::new(&mut out)
            .write_snapshot(&[], &[])
            .unwrap();
        assert!(out.is_empty());
    }
}
