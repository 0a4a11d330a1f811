// buildtail - tests/e2e_watch.rs
//
// End-to-end tests for the watch pipeline.
//
// These tests exercise the real filesystem and real background threads —
// no mocks, no stubs. This covers the full path from bytes appended to a
// log file on disk, through tailing and classification, to the ordered
// event stream and the accumulated log a consumer observes.
//
// Timing: poll intervals are short (20 ms) and every receive uses a
// generous timeout, so the tests are fast when healthy and fail loudly
// instead of hanging when broken.

use buildtail::app::watcher::{WatchConfig, WatchManager};
use buildtail::core::model::{Category, ClassifiedLine, WatchEvent};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Receiver;
use std::time::Duration;
use tempfile::TempDir;

// =============================================================================
// Helpers
// =============================================================================

const RECV_TIMEOUT: Duration = Duration::from_secs(5);

fn fast_config(path: PathBuf) -> WatchConfig {
    let mut config = WatchConfig::new(path);
    config.poll_interval = Duration::from_millis(20);
    config.stop_grace = Duration::from_millis(100);
    config
}

fn append(path: &Path, text: &str) {
    let mut f = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .unwrap();
    f.write_all(text.as_bytes()).unwrap();
    f.flush().unwrap();
}

/// Receive classified lines until `count` have arrived, skipping lifecycle
/// events. Panics on timeout or on a tail error.
fn recv_lines(rx: &Receiver<WatchEvent>, count: usize) -> Vec<ClassifiedLine> {
    let mut lines = Vec::new();
    while lines.len() < count {
        match rx.recv_timeout(RECV_TIMEOUT).expect("expected event") {
            WatchEvent::Line(line) => lines.push(line),
            WatchEvent::Started => {}
            WatchEvent::TailError { message, .. } => panic!("tail error: {message}"),
            WatchEvent::Stopped => panic!("stopped after {} of {count} lines", lines.len()),
        }
    }
    lines
}

/// Drain every remaining event after a stop, returning the lines that were
/// still queued and asserting the stream is terminated by `Stopped`.
fn drain_after_stop(rx: &Receiver<WatchEvent>) -> Vec<ClassifiedLine> {
    let mut lines = Vec::new();
    loop {
        match rx.recv_timeout(RECV_TIMEOUT).expect("expected event") {
            WatchEvent::Line(line) => lines.push(line),
            WatchEvent::Started => {}
            WatchEvent::TailError { message, .. } => panic!("tail error: {message}"),
            WatchEvent::Stopped => return lines,
        }
    }
}

// =============================================================================
// Watch session E2E
// =============================================================================

/// A file created only after the watch has started is picked up, and the
/// full session reconstructs every retained line in order.
#[test]
fn e2e_watch_file_created_after_start() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("late.log");

    let mut manager = WatchManager::start(fast_config(path.clone())).unwrap();
    let rx = manager.event_rx.take().unwrap();

    // Give the loop a few empty polls against the missing file first.
    std::thread::sleep(Duration::from_millis(100));
    append(&path, "DisplayProgressbar: Compiling Scripts\nBuild error CS1002: ; expected\n");

    let lines = recv_lines(&rx, 2);
    assert_eq!(lines[0].category, Category::Section);
    assert_eq!(lines[0].payload.as_deref(), Some("Compiling Scripts"));
    assert_eq!(lines[1].category, Category::Error);

    manager.stop();
    drain_after_stop(&rx);
    assert_eq!(
        manager.full_log(),
        "DisplayProgressbar: Compiling Scripts\nBuild error CS1002: ; expected\n"
    );
}

/// Appends spread over many polls arrive complete, unduplicated, and in
/// original order; excluded noise never surfaces.
#[test]
fn e2e_watch_incremental_appends_with_noise() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("build.log");

    let mut manager = WatchManager::start(fast_config(path.clone())).unwrap();
    let rx = manager.event_rx.take().unwrap();

    append(&path, "step one\n");
    let first = recv_lines(&rx, 1);
    assert_eq!(first[0].raw_text, "step one");

    // Noise between real lines: tab continuation, asset replacement,
    // refresh chatter. None of it may surface.
    append(
        &path,
        "\tstack detail\n*** A.meta replaces B.meta at path Assets/X\nRefresh: trashing asset 99\nstep two\n",
    );
    let second = recv_lines(&rx, 1);
    assert_eq!(second[0].raw_text, "step two");

    append(&path, "shader warning Y\n##utp:{\"type\":\"TestFinished\"}\n");
    let third = recv_lines(&rx, 2);
    assert_eq!(third[0].category, Category::Warning);
    assert_eq!(third[1].category, Category::Success);

    manager.stop();
    drain_after_stop(&rx);

    // Accumulated log = retained lines only, newline-terminated, in order.
    assert_eq!(
        manager.full_log(),
        "step one\nstep two\nshader warning Y\n##utp:{\"type\":\"TestFinished\"}\n"
    );
}

/// A line written in two pieces across polls is classified once, whole.
#[test]
fn e2e_watch_partial_write_is_reassembled() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("build.log");

    let mut manager = WatchManager::start(fast_config(path.clone())).unwrap();
    let rx = manager.event_rx.take().unwrap();

    append(&path, "DisplayProgressbar: Bak");
    // Let at least one poll consume the fragment before completing it.
    std::thread::sleep(Duration::from_millis(100));
    append(&path, "ing Lightmaps\n");

    let lines = recv_lines(&rx, 1);
    assert_eq!(lines[0].category, Category::Section);
    assert_eq!(lines[0].payload.as_deref(), Some("Baking Lightmaps"));

    manager.stop();
    drain_after_stop(&rx);
}

/// A write landing just before stop() is captured by the grace-period
/// polls, and a trailing unterminated line is flushed exactly once.
#[test]
fn e2e_watch_stop_grace_captures_trailing_output() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("build.log");

    let mut manager = WatchManager::start(fast_config(path.clone())).unwrap();
    let rx = manager.event_rx.take().unwrap();

    append(&path, "last full line\nno trailing newline");
    manager.stop();

    let queued = drain_after_stop(&rx);
    let texts: Vec<&str> = queued.iter().map(|l| l.raw_text.as_str()).collect();
    assert_eq!(texts, vec!["last full line", "no trailing newline"]);
    assert_eq!(manager.full_log(), "last full line\nno trailing newline\n");
}

/// Custom success sentinel and extra exclusion patterns configured at
/// startup take effect end to end.
#[test]
fn e2e_watch_custom_sentinel_and_exclusions() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("build.log");

    let mut config = fast_config(path.clone());
    config.success_sentinel = "ALL GREEN".to_string();
    config.extra_exclude_patterns = vec![r"^MyGame\.Build\..*".to_string()];

    let mut manager = WatchManager::start(config).unwrap();
    let rx = manager.event_rx.take().unwrap();

    append(
        &path,
        "MyGame.Build.Steps: copying bundles\nPackaging done, ALL GREEN here\n",
    );

    let lines = recv_lines(&rx, 1);
    assert_eq!(lines[0].category, Category::Success);
    assert_eq!(lines[0].raw_text, "Packaging done, ALL GREEN here");

    manager.stop();
    drain_after_stop(&rx);
    assert_eq!(manager.full_log(), "Packaging done, ALL GREEN here\n");
}

/// The accumulated log is queryable mid-session and frozen after stop.
#[test]
fn e2e_watch_full_log_mid_session_then_frozen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("build.log");

    let mut manager = WatchManager::start(fast_config(path.clone())).unwrap();
    let rx = manager.event_rx.take().unwrap();

    append(&path, "alpha\n");
    recv_lines(&rx, 1);
    assert_eq!(manager.full_log(), "alpha\n");

    append(&path, "beta\n");
    recv_lines(&rx, 1);
    assert_eq!(manager.full_log(), "alpha\nbeta\n");

    manager.stop();
    drain_after_stop(&rx);

    let frozen = manager.full_log();
    // Nothing further is polled after stop; the log stays as it was.
    append(&path, "written after stop\n");
    std::thread::sleep(Duration::from_millis(100));
    assert_eq!(manager.full_log(), frozen);
}
