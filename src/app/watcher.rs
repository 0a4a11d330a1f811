// buildtail - app/watcher.rs
//
// Watch session lifecycle: a background thread polls the Tailer, runs new
// text through the LineClassifier, and forwards classified lines to the
// consumer over an mpsc channel, in original order.
//
// Architecture:
//   - `WatchManager` lives on the caller's thread; `run_watch_loop` runs on
//     a dedicated background thread polling on a fixed interval.
//   - An `Arc<AtomicBool>` stop flag is observed only at loop-iteration
//     boundaries; it is set once and never cleared.
//   - `stop()` sleeps the configured grace period FIRST, so the producer's
//     final buffered writes land on disk and at least one more normal poll
//     cycle captures them, then sets the flag and joins the thread.
//   - The accumulated log (every retained line, newline-terminated) is
//     shared behind a mutex so `full_log()` is safe to call at any time;
//     it is frozen once the loop stops.

use crate::app::tail::Tailer;
use crate::core::classify::{ExclusionRules, LineClassifier};
use crate::core::model::WatchEvent;
use crate::util::constants::{
    DEFAULT_POLL_INTERVAL_MS, DEFAULT_STOP_GRACE_MS, DEFAULT_SUCCESS_SENTINEL,
    STOP_CHECK_INTERVAL_MS,
};
use crate::util::error::Result;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

// =============================================================================
// Configuration
// =============================================================================

/// Settings for one watch session.
#[derive(Debug, Clone)]
pub struct WatchConfig {
    /// Path of the log file to tail. Need not exist yet.
    pub log_path: PathBuf,

    /// Sleep between poll cycles.
    pub poll_interval: Duration,

    /// Delay between a stop request and loop termination, so trailing
    /// producer writes are still captured.
    pub stop_grace: Duration,

    /// Success sentinel substring (see `LineClassifier`).
    pub success_sentinel: String,

    /// Deployment-specific exclusion regexes, appended to the built-in
    /// noise rules.
    pub extra_exclude_patterns: Vec<String>,
}

impl WatchConfig {
    /// Defaults for every knob except the watched path.
    pub fn new(log_path: impl Into<PathBuf>) -> Self {
        Self {
            log_path: log_path.into(),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            stop_grace: Duration::from_millis(DEFAULT_STOP_GRACE_MS),
            success_sentinel: DEFAULT_SUCCESS_SENTINEL.to_string(),
            extra_exclude_patterns: Vec::new(),
        }
    }
}

// =============================================================================
// WatchManager
// =============================================================================

/// Manages a watch session on a background thread.
///
/// Exposes start/stop/full_log to the owning caller; classified lines are
/// consumed from `event_rx`.
pub struct WatchManager {
    /// Channel receiver for the consumer to read watch events from.
    pub event_rx: Option<mpsc::Receiver<WatchEvent>>,

    stop_flag: Option<Arc<AtomicBool>>,
    handle: Option<JoinHandle<()>>,
    full_log: Arc<Mutex<String>>,
    stop_grace: Duration,
}

impl WatchManager {
    /// Compile the exclusion rules and spawn the watch thread.
    ///
    /// Fails fast (before any polling) if a configured exclusion pattern
    /// does not compile.
    pub fn start(config: WatchConfig) -> Result<Self> {
        let rules = ExclusionRules::with_extra_patterns(&config.extra_exclude_patterns)?;
        let classifier = LineClassifier::new(rules, config.success_sentinel);
        let tailer = Tailer::new(config.log_path);

        let (tx, rx) = mpsc::channel();
        let stop_flag = Arc::new(AtomicBool::new(false));
        let full_log = Arc::new(Mutex::new(String::new()));

        let thread_stop = Arc::clone(&stop_flag);
        let thread_log = Arc::clone(&full_log);
        let poll_interval = config.poll_interval;

        tracing::info!(
            file = %tailer.path().display(),
            poll_ms = poll_interval.as_millis() as u64,
            "Watch started"
        );

        let handle = std::thread::spawn(move || {
            run_watch_loop(tailer, classifier, tx, thread_stop, thread_log, poll_interval);
        });

        Ok(Self {
            event_rx: Some(rx),
            stop_flag: Some(stop_flag),
            handle: Some(handle),
            full_log,
            stop_grace: config.stop_grace,
        })
    }

    /// Stop the watch: wait out the grace period, set the stop flag, and
    /// join the background thread.
    ///
    /// Blocking; when it returns, the accumulated log is frozen. Events
    /// already queued on `event_rx` (including the final `Stopped`) remain
    /// readable. Idempotent.
    pub fn stop(&mut self) {
        if let Some(flag) = self.stop_flag.take() {
            // Let the producer flush its last lines; the loop keeps polling
            // normally during this window.
            std::thread::sleep(self.stop_grace);
            flag.store(true, Ordering::SeqCst);
        }
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::error!("Watch thread panicked");
            }
        }
    }

    /// Returns `true` while the background thread is running.
    pub fn is_active(&self) -> bool {
        self.handle.is_some()
    }

    /// The accumulated log: every retained line seen so far, each
    /// newline-terminated, in original order. Safe to call at any time.
    pub fn full_log(&self) -> String {
        match self.full_log.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl Drop for WatchManager {
    fn drop(&mut self) {
        // A dropped manager must not leave the thread polling forever.
        // No grace period here; callers wanting the drain use stop().
        if let Some(flag) = self.stop_flag.take() {
            flag.store(true, Ordering::SeqCst);
        }
    }
}

// =============================================================================
// Background watch loop
// =============================================================================

/// Poll -> classify -> forward, until the stop flag is observed.
///
/// One final poll cycle runs after the flag is set (the stop check sits
/// between processing and the sleep), then the classifier's pending partial
/// line is flushed and `Stopped` is sent.
fn run_watch_loop(
    mut tailer: Tailer,
    mut classifier: LineClassifier,
    tx: mpsc::Sender<WatchEvent>,
    stop: Arc<AtomicBool>,
    full_log: Arc<Mutex<String>>,
    poll_interval: Duration,
) {
    macro_rules! send {
        ($msg:expr) => {
            if tx.send($msg).is_err() {
                // Consumer hung up; exit silently.
                return;
            }
        };
    }

    send!(WatchEvent::Started);

    // Sub-divide each poll interval into stop-check slices.
    let interval_ms = (poll_interval.as_millis() as u64).max(1);
    let slice_ms = interval_ms.min(STOP_CHECK_INTERVAL_MS);
    let slices = (interval_ms / slice_ms).max(1);

    loop {
        match tailer.poll() {
            Ok(Some(chunk)) => {
                for line in classifier.classify_chunk(&chunk) {
                    append_line(&full_log, &line.raw_text);
                    send!(WatchEvent::Line(line));
                }
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(
                    file = %tailer.path().display(),
                    error = %e,
                    "Poll failed; retrying on next interval"
                );
                send!(WatchEvent::TailError {
                    path: tailer.path().to_path_buf(),
                    message: e.to_string(),
                });
            }
        }

        if stop.load(Ordering::SeqCst) {
            break;
        }

        // Interruptible sleep. A stop observed mid-sleep exits the sleep
        // early; the next iteration then runs the final capture poll and
        // breaks above.
        for _ in 0..slices {
            std::thread::sleep(Duration::from_millis(slice_ms));
            if stop.load(Ordering::SeqCst) {
                break;
            }
        }
    }

    // The producer may never terminate its last line.
    if let Some(line) = classifier.finish() {
        append_line(&full_log, &line.raw_text);
        send!(WatchEvent::Line(line));
    }

    tracing::info!(file = %tailer.path().display(), "Watch stopped");
    send!(WatchEvent::Stopped);
}

fn append_line(full_log: &Mutex<String>, raw_text: &str) {
    let mut guard = match full_log.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    guard.push_str(raw_text);
    guard.push('\n');
}

// =============================================================================
// Unit tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::Category;
    use std::io::Write;
    use std::time::Duration;
    use tempfile::TempDir;

    /// Generous per-event receive timeout; tests fail loudly rather than
    /// hanging if an expected event never arrives.
    const RECV_TIMEOUT: Duration = Duration::from_secs(5);

    fn fast_config(path: std::path::PathBuf) -> WatchConfig {
        let mut config = WatchConfig::new(path);
        config.poll_interval = Duration::from_millis(20);
        config.stop_grace = Duration::from_millis(80);
        config
    }

    fn append(path: &std::path::Path, text: &str) {
        let mut f = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .unwrap();
        f.write_all(text.as_bytes()).unwrap();
        f.flush().unwrap();
    }

    #[test]
    fn test_start_stop_without_file_emits_started_then_stopped() {
        let dir = TempDir::new().unwrap();
        let mut manager = WatchManager::start(fast_config(dir.path().join("never.log"))).unwrap();
        let rx = manager.event_rx.take().unwrap();

        assert!(matches!(
            rx.recv_timeout(RECV_TIMEOUT).unwrap(),
            WatchEvent::Started
        ));

        manager.stop();
        assert!(!manager.is_active());

        // Every remaining event must be the terminal Stopped (no lines, no
        // errors, from a file that never existed).
        let mut saw_stopped = false;
        while let Ok(event) = rx.try_recv() {
            match event {
                WatchEvent::Stopped => saw_stopped = true,
                other => panic!("unexpected event: {other:?}"),
            }
        }
        assert!(saw_stopped);
        assert!(manager.full_log().is_empty());
    }

    #[test]
    fn test_lines_are_forwarded_in_order_and_accumulated() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("build.log");
        let mut manager = WatchManager::start(fast_config(path.clone())).unwrap();
        let rx = manager.event_rx.take().unwrap();

        append(&path, "first\nDisplayProgressbar: Linking\nlast\n");

        let mut lines = Vec::new();
        while lines.len() < 3 {
            match rx.recv_timeout(RECV_TIMEOUT).unwrap() {
                WatchEvent::Line(line) => lines.push(line),
                WatchEvent::Started => {}
                other => panic!("unexpected event: {other:?}"),
            }
        }

        assert_eq!(lines[0].raw_text, "first");
        assert_eq!(lines[1].category, Category::Section);
        assert_eq!(lines[2].raw_text, "last");

        manager.stop();
        assert_eq!(
            manager.full_log(),
            "first\nDisplayProgressbar: Linking\nlast\n"
        );
    }

    #[test]
    fn test_stop_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let mut manager = WatchManager::start(fast_config(dir.path().join("x.log"))).unwrap();
        manager.stop();
        manager.stop();
        assert!(!manager.is_active());
    }

    #[test]
    fn test_invalid_extra_pattern_fails_start() {
        let dir = TempDir::new().unwrap();
        let mut config = fast_config(dir.path().join("x.log"));
        config.extra_exclude_patterns = vec!["[broken".to_string()];
        assert!(WatchManager::start(config).is_err());
    }
}
