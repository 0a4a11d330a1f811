// buildtail - util/error.rs
//
// Typed error hierarchy with context-preserving error chains.
// No string-based error propagation; all errors keep the causal chain
// for diagnostic logging.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Top-level error type for all buildtail operations.
/// Errors are categorised by the subsystem that produced them.
#[derive(Debug)]
pub enum BuildTailError {
    /// Tailing the watched file failed.
    Tail(TailError),

    /// An exclusion pattern could not be compiled.
    Pattern(PatternError),
}

impl fmt::Display for BuildTailError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tail(e) => write!(f, "Tail error: {e}"),
            Self::Pattern(e) => write!(f, "Pattern error: {e}"),
        }
    }
}

impl std::error::Error for BuildTailError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Tail(e) => Some(e),
            Self::Pattern(e) => Some(e),
        }
    }
}

// ---------------------------------------------------------------------------
// Tail errors
// ---------------------------------------------------------------------------

/// Errors raised while polling the watched log file.
///
/// "File does not exist" is NOT an error: the producer may simply not have
/// started writing yet, so the Tailer reports it as an empty poll instead.
#[derive(Debug)]
pub enum TailError {
    /// An I/O operation on the watched file failed for a reason other than
    /// the file being absent (permissions, disk failure, ...).
    Io {
        path: PathBuf,
        operation: &'static str,
        source: io::Error,
    },
}

impl fmt::Display for TailError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io {
                path,
                operation,
                source,
            } => write!(
                f,
                "I/O error during {operation} on '{}': {source}",
                path.display()
            ),
        }
    }
}

impl std::error::Error for TailError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
        }
    }
}

impl From<TailError> for BuildTailError {
    fn from(e: TailError) -> Self {
        Self::Tail(e)
    }
}

// ---------------------------------------------------------------------------
// Pattern errors
// ---------------------------------------------------------------------------

/// Errors raised while building the exclusion rule set at startup.
#[derive(Debug)]
pub enum PatternError {
    /// A user-supplied regex is invalid.
    InvalidRegex {
        pattern: String,
        source: regex::Error,
    },

    /// A user-supplied regex exceeds the maximum allowed length.
    PatternTooLong {
        pattern: String,
        length: usize,
        max_length: usize,
    },
}

impl fmt::Display for PatternError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidRegex { pattern, source } => {
                write!(f, "Invalid exclusion regex '{pattern}': {source}")
            }
            Self::PatternTooLong {
                pattern,
                length,
                max_length,
            } => write!(
                f,
                "Exclusion regex '{pattern}' is {length} chars, exceeds maximum of {max_length}"
            ),
        }
    }
}

impl std::error::Error for PatternError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidRegex { source, .. } => Some(source),
            Self::PatternTooLong { .. } => None,
        }
    }
}

impl From<PatternError> for BuildTailError {
    fn from(e: PatternError) -> Self {
        Self::Pattern(e)
    }
}

/// Convenience type alias for buildtail results.
pub type Result<T> = std::result::Result<T, BuildTailError>;
