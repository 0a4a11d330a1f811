// buildtail - core/model.rs
//
// Core data model types. Pure data definitions with no I/O, no rendering,
// no platform dependencies (core depends on std only).
//
// These types are the shared vocabulary across all layers.

use std::path::PathBuf;

// =============================================================================
// Category
// =============================================================================

/// Output category assigned to a retained log line.
///
/// Categories drive how the renderer annotates and colours the line.
/// The classifier assigns exactly one category per line; anything that
/// matches no rule falls through to `Plain`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// Start of a logical build phase, rendered as a highlighted header.
    Section,
    /// The configured success sentinel or a test-protocol report line.
    Success,
    Error,
    Warning,
    Info,
    Debug,
    /// No annotation; forwarded verbatim.
    Plain,
}

impl Category {
    /// Human-readable label for display and diagnostics.
    pub fn label(&self) -> &'static str {
        match self {
            Category::Section => "Section",
            Category::Success => "Success",
            Category::Error => "Error",
            Category::Warning => "Warning",
            Category::Info => "Info",
            Category::Debug => "Debug",
            Category::Plain => "Plain",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// =============================================================================
// Classified line
// =============================================================================

/// A single retained log line together with its classification.
///
/// Produced one per non-excluded input line, in original order.
/// Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedLine {
    /// The raw line text, without its terminating newline.
    pub raw_text: String,

    /// Assigned output category.
    pub category: Category,

    /// Category-specific annotation: the section name for `Section` lines,
    /// `None` for everything else.
    pub payload: Option<String>,
}

impl ClassifiedLine {
    /// Construct a line with no payload.
    pub fn new(raw_text: impl Into<String>, category: Category) -> Self {
        Self {
            raw_text: raw_text.into(),
            category,
            payload: None,
        }
    }

    /// Construct a `Section` line carrying its section name.
    pub fn section(raw_text: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            raw_text: raw_text.into(),
            category: Category::Section,
            payload: Some(name.into()),
        }
    }
}

// =============================================================================
// Watch events (worker thread -> consumer)
// =============================================================================

/// Messages sent from the background watch thread to the consumer.
///
/// Delivery is FIFO over an mpsc channel, so the consumer observes lines
/// in exactly the order they appeared in the watched file.
#[derive(Debug, Clone)]
pub enum WatchEvent {
    /// The watch loop has started polling.
    Started,

    /// A retained line was read and classified.
    Line(ClassifiedLine),

    /// A poll failed with a non-recoverable-looking I/O error.
    /// The loop keeps polling; the next interval is the retry.
    TailError { path: PathBuf, message: String },

    /// The watch loop has terminated. No further events follow.
    Stopped,
}
