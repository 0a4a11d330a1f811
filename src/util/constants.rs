// buildtail - util/constants.rs
//
// Single source of truth for all named constants, limits, and defaults.

// =============================================================================
// Application metadata
// =============================================================================

/// Application display name.
pub const APP_NAME: &str = "buildtail";

/// Application identifier used for config directories.
pub const APP_ID: &str = "buildtail";

/// Current application version.
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

// =============================================================================
// Watch loop timing
// =============================================================================

/// How often the watch loop polls the log file for new content (ms).
/// The watched producer is a slow, long-running build process, so coarse
/// polling is sufficient; no filesystem notification is used.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1_000;

/// Minimum user-configurable poll interval (ms).
pub const MIN_POLL_INTERVAL_MS: u64 = 10;

/// Maximum user-configurable poll interval (ms).
pub const MAX_POLL_INTERVAL_MS: u64 = 10_000; // 10 s

/// How often the stop flag is checked within each poll sleep interval (ms).
/// The background thread wakes every this many ms to check for a stop request.
pub const STOP_CHECK_INTERVAL_MS: u64 = 100;

/// Grace period observed by `WatchManager::stop` before the stop flag is set.
/// Gives the producer time to flush its final writes; at least one more
/// normal poll cycle runs during this window.
pub const DEFAULT_STOP_GRACE_MS: u64 = 1_500;

/// Maximum user-configurable stop grace period (ms).
pub const MAX_STOP_GRACE_MS: u64 = 30_000; // 30 s

// =============================================================================
// Classification markers
// =============================================================================

/// Prefix that marks a progress-section line in the watched log.
/// Text after the marker becomes the section name.
pub const PROGRESS_MARKER: &str = "DisplayProgressbar: ";

/// Test-runner protocol marker; lines carrying it are reported as Success.
pub const TEST_PROTOCOL_MARKER: &str = "##utp:";

/// Default success sentinel. The real sentinel is build-pipeline specific
/// and is normally supplied via config or `--success-string`.
pub const DEFAULT_SUCCESS_SENTINEL: &str = "Build succeeded";

/// Built-in exclusion patterns, evaluated in order against each raw line.
/// Matching lines are noise and are dropped before classification:
/// tab-indented continuation detail, asset-replacement chatter, and
/// asset-refresh chatter.
pub const BUILTIN_EXCLUDE_PATTERNS: &[&str] = &[
    r"^\t+.*",
    r"^\*\*\* .* replaces .* at path .*",
    r"^Refresh: trashing asset .*",
];

/// Maximum length of a user-supplied exclusion regex, to prevent ReDoS.
pub const MAX_EXCLUDE_PATTERN_LENGTH: usize = 4_096;

// =============================================================================
// Classifier buffers
// =============================================================================

/// Maximum accumulated size of the partial (in-progress) line buffer.
///
/// Guards against unbounded growth when the watched file produces no
/// newlines — binary content or a runaway single line. When exceeded, the
/// fragment is discarded and a warning is logged.
pub const MAX_PARTIAL_LINE_BYTES: usize = 1_024 * 1_024; // 1 MiB

// =============================================================================
// Logging
// =============================================================================

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

// =============================================================================
// Configuration
// =============================================================================

/// Configuration file name.
pub const CONFIG_FILE_NAME: &str = "config.toml";
