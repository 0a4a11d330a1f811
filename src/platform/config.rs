// buildtail - platform/config.rs
//
// Platform config-directory resolution and config.toml loading with
// startup validation.
//
// Uses the `directories` crate for XDG (Linux), AppData (Windows),
// Library (macOS) compliance.

use crate::ui::console::ColorChoice;
use crate::util::constants;
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

/// Resolved platform paths for buildtail configuration.
#[derive(Debug, Clone)]
pub struct PlatformPaths {
    /// Configuration directory (e.g. ~/.config/buildtail/ or %APPDATA%\buildtail\)
    pub config_dir: PathBuf,
}

impl PlatformPaths {
    /// Resolve platform-appropriate paths.
    ///
    /// Falls back to the current directory if platform dirs cannot be
    /// determined.
    pub fn resolve() -> Self {
        if let Some(proj_dirs) = ProjectDirs::from("", "", constants::APP_ID) {
            let config_dir = proj_dirs.config_dir().to_path_buf();
            tracing::debug!(config = %config_dir.display(), "Platform paths resolved");
            Self { config_dir }
        } else {
            tracing::warn!("Could not determine platform directories, using current directory");
            Self {
                config_dir: PathBuf::from("."),
            }
        }
    }
}

// =============================================================================
// config.toml loading and validation
// =============================================================================

/// Raw deserialisable shape of config.toml.
///
/// Unknown keys are silently ignored for forward compatibility: a newer
/// config file can be used with an older binary without crashing.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct RawConfig {
    /// `[watch]` section.
    pub watch: WatchSection,
    /// `[classify]` section.
    pub classify: ClassifySection,
    /// `[output]` section.
    pub output: OutputSection,
    /// `[logging]` section.
    pub logging: LoggingSection,
}

/// `[watch]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct WatchSection {
    /// Poll interval in milliseconds.
    pub poll_interval_ms: Option<u64>,
    /// Stop grace period in milliseconds.
    pub stop_grace_ms: Option<u64>,
}

/// `[classify]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct ClassifySection {
    /// Success sentinel substring.
    pub success_sentinel: Option<String>,
    /// Additional exclusion regexes appended to the built-in noise rules
    /// (e.g. an internal build-pipeline namespace like "^MyGame\\.Build\\.").
    pub exclude_patterns: Option<Vec<String>>,
}

/// `[output]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct OutputSection {
    /// Colour mode: "auto", "always", or "never".
    pub color: Option<String>,
}

/// `[logging]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub level: Option<String>,
}

/// Validated application configuration derived from `config.toml`.
///
/// All values are validated against named constants at load time; invalid
/// values produce actionable warnings and fall back to defaults.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Poll interval in milliseconds.
    pub poll_interval_ms: u64,
    /// Stop grace period in milliseconds.
    pub stop_grace_ms: u64,
    /// Success sentinel substring.
    pub success_sentinel: String,
    /// Additional exclusion regexes (validated for compilability at watch
    /// start, not here).
    pub exclude_patterns: Vec<String>,
    /// Colour mode.
    pub color: ColorChoice,
    /// Logging level string (for init before tracing is available).
    pub log_level: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: constants::DEFAULT_POLL_INTERVAL_MS,
            stop_grace_ms: constants::DEFAULT_STOP_GRACE_MS,
            success_sentinel: constants::DEFAULT_SUCCESS_SENTINEL.to_string(),
            exclude_patterns: Vec::new(),
            color: ColorChoice::Auto,
            log_level: None,
        }
    }
}

/// Load and validate `config.toml` from the given config directory.
///
/// Returns `AppConfig` with validated values and a list of non-fatal
/// warnings. If the file does not exist, returns defaults with no warnings
/// (first run). If the file is unparseable, returns defaults with an error
/// warning; the application still starts but the user is informed.
pub fn load_config(config_dir: &Path) -> (AppConfig, Vec<String>) {
    let config_path = config_dir.join(constants::CONFIG_FILE_NAME);

    let mut warnings: Vec<String> = Vec::new();

    if !config_path.exists() {
        tracing::debug!(path = %config_path.display(), "No config.toml found; using defaults");
        return (AppConfig::default(), warnings);
    }

    let content = match std::fs::read_to_string(&config_path) {
        Ok(c) => c,
        Err(e) => {
            let msg = format!(
                "Could not read config file '{}': {e}. Using defaults.",
                config_path.display()
            );
            tracing::warn!("{}", msg);
            warnings.push(msg);
            return (AppConfig::default(), warnings);
        }
    };

    let raw: RawConfig = match toml::from_str(&content) {
        Ok(r) => r,
        Err(e) => {
            let msg = format!(
                "Failed to parse config file '{}': {e}. Using defaults.",
                config_path.display()
            );
            tracing::warn!("{}", msg);
            warnings.push(msg);
            return (AppConfig::default(), warnings);
        }
    };

    tracing::info!(path = %config_path.display(), "Loaded config.toml");

    let (config, mut validation_warnings) = validate(raw);
    warnings.append(&mut validation_warnings);

    if !warnings.is_empty() {
        tracing::warn!(count = warnings.len(), "Config validation produced warnings");
    }

    (config, warnings)
}

/// Validate each raw field against named constants, accumulating all
/// warnings rather than stopping at the first.
fn validate(raw: RawConfig) -> (AppConfig, Vec<String>) {
    let mut config = AppConfig::default();
    let mut warnings = Vec::new();

    // -- Watch: poll_interval_ms --
    if let Some(interval) = raw.watch.poll_interval_ms {
        if (constants::MIN_POLL_INTERVAL_MS..=constants::MAX_POLL_INTERVAL_MS).contains(&interval) {
            config.poll_interval_ms = interval;
        } else {
            warnings.push(format!(
                "[watch] poll_interval_ms = {interval} is out of range ({}-{}). Using default ({}).",
                constants::MIN_POLL_INTERVAL_MS,
                constants::MAX_POLL_INTERVAL_MS,
                constants::DEFAULT_POLL_INTERVAL_MS,
            ));
        }
    }

    // -- Watch: stop_grace_ms --
    if let Some(grace) = raw.watch.stop_grace_ms {
        if grace <= constants::MAX_STOP_GRACE_MS {
            config.stop_grace_ms = grace;
        } else {
            warnings.push(format!(
                "[watch] stop_grace_ms = {grace} is out of range (0-{}). Using default ({}).",
                constants::MAX_STOP_GRACE_MS,
                constants::DEFAULT_STOP_GRACE_MS,
            ));
        }
    }

    // -- Classify: success_sentinel --
    if let Some(sentinel) = raw.classify.success_sentinel {
        // An empty sentinel disables the check; accepted as-is.
        config.success_sentinel = sentinel;
    }

    // -- Classify: exclude_patterns --
    if let Some(patterns) = raw.classify.exclude_patterns {
        config.exclude_patterns = patterns;
    }

    // -- Output: color --
    if let Some(ref color) = raw.output.color {
        match color.to_lowercase().as_str() {
            "auto" => config.color = ColorChoice::Auto,
            "always" => config.color = ColorChoice::Always,
            "never" => config.color = ColorChoice::Never,
            other => {
                warnings.push(format!(
                    "[output] color = \"{other}\" is not recognised. \
                     Expected \"auto\", \"always\", or \"never\". Using default (auto).",
                ));
            }
        }
    }

    // -- Logging: level --
    if let Some(ref level) = raw.logging.level {
        let valid = ["error", "warn", "info", "debug", "trace"];
        if valid.contains(&level.to_lowercase().as_str()) {
            config.log_level = Some(level.clone());
        } else {
            warnings.push(format!(
                "[logging] level = \"{level}\" is not recognised. \
                 Valid values: error, warn, info, debug, trace. Using default (info).",
            ));
        }
    }

    (config, warnings)
}

// =============================================================================
// Unit tests
// =============================================================================
