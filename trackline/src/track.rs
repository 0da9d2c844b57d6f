//! Track identities and the registry that owns them.
//!
//! A track is a logical timeline onto which events are placed: one for the
//! process, one per recording thread, and any number of custom timelines
//! (a request queue, a GPU, an IO lane). Tracks are registered once,
//! immutable afterwards, and referenced from events by id.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::thread::{self, ThreadId};

use crate::common::StringValue;
use crate::error::TrackError;

/// Identifies a [`Track`] within one registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TrackId(u64);

impl TrackId {
    /// Raw numeric value, stable for the lifetime of the registry.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

/// The kind of timeline a track represents.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum TrackKind {
    /// The whole-process timeline; one per registry.
    Process,
    /// A per-thread timeline; one per recording thread.
    Thread,
    /// A caller-defined timeline.
    Custom,
}

/// Immutable metadata for one registered track.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Track {
    id: TrackId,
    kind: TrackKind,
    name: StringValue,
    parent: Option<TrackId>,
}

impl Track {
    /// The track id events reference.
    pub fn id(&self) -> TrackId {
        self.id
    }

    /// The kind of timeline.
    pub fn kind(&self) -> TrackKind {
        self.kind
    }

    /// Display name.
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Parent track, if any. Thread and custom tracks parent to the
    /// process track by default.
    pub fn parent(&self) -> Option<TrackId> {
        self.parent
    }
}

#[derive(Debug, Default)]
struct RegistryInner {
    tracks: HashMap<TrackId, Track>,
    by_thread: HashMap<ThreadId, TrackId>,
    process: Option<TrackId>,
}

/// Registry of track identities for one session.
///
/// All mutation happens under one internal mutex held for short, bounded
/// sections; no caller-visible lock is exposed.
#[derive(Debug, Default)]
pub struct TrackRegistry {
    next_id: AtomicU64,
    inner: Mutex<RegistryInner>,
}

impl TrackRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        TrackRegistry::default()
    }

    fn allocate_id(&self) -> TrackId {
        TrackId(self.next_id.fetch_add(1, Ordering::Relaxed) + 1)
    }

    /// Register a custom track.
    ///
    /// Tracks registered through this method must be unique per kind and
    /// name; a second registration returns [`TrackError::Duplicate`].
    /// Tracks with no explicit parent are parented to the process track.
    pub fn register_track(
        &self,
        kind: TrackKind,
        name: impl Into<StringValue>,
        parent: Option<TrackId>,
    ) -> Result<TrackId, TrackError> {
        let name = name.into();
        let parent = match parent {
            Some(parent) => Some(parent),
            None if kind != TrackKind::Process => Some(self.current_process_track()),
            None => None,
        };

        let mut inner = self.inner.lock().expect("track registry lock poisoned");
        if inner
            .tracks
            .values()
            .any(|track| track.kind == kind && track.name == name)
        {
            return Err(TrackError::Duplicate {
                kind,
                name: name.as_str().to_owned(),
            });
        }

        let id = self.allocate_id();
        inner.tracks.insert(
            id,
            Track {
                id,
                kind,
                name,
                parent,
            },
        );
        Ok(id)
    }

    /// The track bound to the calling thread, created lazily on first use.
    ///
    /// One thread track exists per thread, keyed by the OS thread
    /// identity and named after the thread when it has a name.
    pub fn current_thread_track(&self) -> TrackId {
        let current = thread::current();
        if let Some(id) = self
            .inner
            .lock()
            .expect("track registry lock poisoned")
            .by_thread
            .get(&current.id())
        {
            return *id;
        }

        // Resolve the parent outside the lock; current_process_track
        // takes the same mutex.
        let parent = self.current_process_track();
        let name = match current.name() {
            Some(name) => StringValue::from(name.to_owned()),
            None => StringValue::from(format!("{:?}", current.id())),
        };

        let mut inner = self.inner.lock().expect("track registry lock poisoned");
        if let Some(id) = inner.by_thread.get(&current.id()) {
            return *id;
        }
        let id = self.allocate_id();
        inner.tracks.insert(
            id,
            Track {
                id,
                kind: TrackKind::Thread,
                name,
                parent: Some(parent),
            },
        );
        inner.by_thread.insert(current.id(), id);
        id
    }

    /// The whole-process track, created at first use.
    pub fn current_process_track(&self) -> TrackId {
        {
            let inner = self.inner.lock().expect("track registry lock poisoned");
            if let Some(id) = inner.process {
                return id;
            }
        }

        let name = process_name();
        let mut inner = self.inner.lock().expect("track registry lock poisoned");
        if let Some(id) = inner.process {
            return id;
        }
        let id = self.allocate_id();
        inner.tracks.insert(
            id,
            Track {
                id,
                kind: TrackKind::Process,
                name: StringValue::from(name),
                parent: None,
            },
        );
        inner.process = Some(id);
        id
    }

    /// Metadata for a registered track.
    pub fn track(&self, id: TrackId) -> Option<Track> {
        self.inner
            .lock()
            .expect("track registry lock poisoned")
            .tracks
            .get(&id)
            .cloned()
    }

    /// Snapshot of every registered track, ordered by id.
    pub fn tracks(&self) -> Vec<Track> {
        let mut tracks: Vec<Track> = self
            .inner
            .lock()
            .expect("track registry lock poisoned")
            .tracks
            .values()
            .cloned()
            .collect();
        tracks.sort_by_key(Track::id);
        tracks
    }
}

fn process_name() -> String {
    std::env::current_exe()
        .ok()
        .and_then(|path| path.file_stem().map(|stem| stem.to_string_lossy().into_owned()))
        .unwrap_or_else(|| String::from("process"))
}
