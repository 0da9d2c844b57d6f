//! End-to-end demo: categories, nested spans across threads, a counter
//! sample, and a JSON trace file.
//!
//! Run with `cargo run --example track_events`; the captured trace lands
//! in `trackline-demo.json`, one JSON object per line.

use std::error::Error;
use std::fs::File;
use std::io::BufWriter;
use std::thread;
use std::time::Duration;

use rand::Rng;
use trackline::{Category, KeyValue, Recorder, Session, TrackKind};
use trackline_json::JsonSnapshotWriter;

static CATEGORIES: &[Category] = &[
    Category::new("category", "Events from the category subsystem"),
    Category::new("rendering", "Events from the graphics subsystem"),
    Category::new("network", "Network upload and download statistics"),
    Category::with_tags("PictureLayer::Update", "PictureLayer::Update events", &["debug"]),
    Category::with_tags("nodejs.something", "nodejs.something events", &["debug"]),
    Category::with_tags("gpu.debug", "debug gpu events", &["debug"]),
    Category::with_tags("audio.latency", "Detailed audio latency metrics", &["verbose"]),
];

fn draw_weapons(recorder: &Recorder, player_number: i64, weapon_num: i64) {
    let _span = recorder.scoped_span(
        "rendering",
        "DrawWeapons",
        recorder.current_thread_track(),
        vec![
            KeyValue::new("WeaponNum", weapon_num),
            KeyValue::new("PlayerNum", player_number),
        ],
    );
    thread::sleep(Duration::from_millis(20));
}

fn draw_player(recorder: &Recorder, player_number: i64, weapon_num: i64) {
    let _span = recorder.scoped_span(
        "rendering",
        "DrawPlayer",
        recorder.current_thread_track(),
        vec![KeyValue::new("player_number", player_number)],
    );
    // Sleep to simulate a long computation.
    thread::sleep(Duration::from_millis(50));
    draw_weapons(recorder, player_number, weapon_num);
}

fn draw_game(recorder: &Recorder) {
    // An unscoped span, which begins and ends at specific points instead
    // of at the end of the current block scope.
    let track = recorder.current_thread_track();
    recorder.begin_span("rendering", "DrawGame", track, Vec::new());
    draw_player(recorder, 1, 3);
    draw_player(recorder, 2, 4);
    recorder.end_span("rendering", track);

    // Record the rendering framerate as a counter sample.
    recorder.record_counter("rendering", "Framerate", track, 120);
}

fn main() -> Result<(), Box<dyn Error>> {
    let session = Session::builder()
        .with_capacity(4096)
        .with_categories(CATEGORIES)
        .build();
    session.start()?;
    let recorder = session.recorder();

    // Open a request span when the request comes in; a worker thread
    // closes it on the same track once the response is produced.
    let request_id: u64 = rand::rng().random_range(1..=6);
    let request_track = session
        .registry()
        .register_track(TrackKind::Custom, "requests", None)?;
    recorder.begin_span(
        "category",
        "HandleRequest",
        request_track,
        vec![KeyValue::new("request_id", request_id as i64)],
    );
    let worker = thread::Builder::new().name("request-worker".into()).spawn({
        let recorder = recorder.clone();
        move || {
            // ... produce response ...
            thread::sleep(Duration::from_millis(request_id.min(20) * 10));
            recorder.end_span("category", request_track);
        }
    })?;

    // A dynamically built event name; ownership ends at the record call.
    let dynamic_name = String::from("PictureLayer::Update");
    recorder.instant(
        "rendering",
        dynamic_name,
        recorder.current_thread_track(),
        Vec::new(),
    );

    // Disabled by default via its "debug" tag; this records nothing.
    recorder.instant(
        "gpu.debug",
        "InvisibleUnlessEnabled",
        recorder.current_thread_track(),
        Vec::new(),
    );

    recorder.instant(
        "network",
        "MyEvent",
        recorder.current_thread_track(),
        vec![KeyValue::new("parameter", 42)],
    );

    // Simulate some work that emits trace events.
    draw_game(&recorder);

    worker.join().expect("request worker panicked");

    session.flush()?;
    session.stop()?;

    let events = session.export_snapshot()?;
    let tracks = session.registry().tracks();

    let file = BufWriter::new(File::create("trackline-demo.json")?);
    let mut writer = JsonSnapshotWriter::new(file);
    writer.write_snapshot(&tracks, &events)?;

    println!(
        "wrote {} events on {} tracks to trackline-demo.json",
        events.len(),
        tracks.len()
    );
    Ok(())
}
