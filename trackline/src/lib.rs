//! # Trackline
//!
//! A minimal in-process tracing core. Instrumented code records spans,
//! instant events and counter samples onto named tracks from any thread;
//! a [`Session`] buffers the events in a bounded in-memory store and
//! exports an ordered snapshot on demand.
//!
//! The main structs are:
//!
//! * [`Session`], which owns the recording configuration, the event
//!   buffer and the track registry, and walks the one-way
//!   `configured -> running -> stopped` lifecycle.
//! * [`Recorder`], the cheap cloneable handle instrumented code uses to
//!   record. Recording is always best-effort: a recorder call never
//!   returns an error, never blocks on a full buffer and never panics, so
//!   instrumentation cannot alter the control flow of the code it
//!   observes.
//! * [`TrackRegistry`], which maps process, thread and custom timelines
//!   to stable numeric ids.
//!
//! ```
//! use trackline::{Category, Session};
//!
//! static CATEGORIES: &[Category] = &[
//!     Category::new("rendering", "Events from the graphics subsystem"),
//! ];
//!
//! let session = Session::builder()
//!     .with_capacity(1024)
//!     .with_categories(CATEGORIES)
//!     .build();
//! session.start().unwrap();
//!
//! let recorder = session.recorder();
//! let track = recorder.current_thread_track();
//! {
//!     let _span = recorder.scoped_span("rendering", "DrawFrame", track, Vec::new());
//!     recorder.record_counter("rendering", "Framerate", track, 120);
//! }
//!
//! session.stop().unwrap();
//! let events = session.export_snapshot().unwrap();
//! assert_eq!(events.len(), 3);
//! ```
#![warn(
    future_incompatible,
    missing_debug_implementations,
    missing_docs,
    nonstandard_style,
    rust_2018_idioms,
    unreachable_pub,
    unused
)]
#![cfg_attr(docsrs, feature(doc_cfg), deny(rustdoc::broken_intra_doc_links))]

mod buffer;
mod category;
mod common;
mod error;
mod event;
mod internal_logging;
mod recorder;
mod session;
pub mod time;
mod track;

pub use buffer::EventBuffer;
pub use category::{Category, CategorySet};
pub use common::{Key, KeyValue, StringValue, Value};
pub use error::{SessionError, TrackError};
pub use event::{Event, EventKind};
pub use recorder::{Recorder, ScopedSpan};
pub use session::{
    RecordingStats, Session, SessionBuilder, SessionState, TRACKLINE_BUFFER_CAPACITY,
};
pub use track::{Track, TrackId, TrackKind, TrackRegistry};

#[cfg(feature = "internal-logs")]
#[doc(hidden)]
pub mod _private {
    pub use tracing::{debug, error, info, warn};
}
