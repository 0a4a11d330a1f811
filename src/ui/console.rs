// buildtail - ui/console.rs
//
// Console rendering of classified lines: one annotated stdout line per
// retained log line, coloured by category via ANSI escapes.
//
// Colour emission is capability-checked (the console crate detects whether
// stdout is a colour-capable terminal) and can be forced on or off, e.g.
// CI log viewers want `always` because their collector is not a tty but
// their web UI understands the escapes.

use crate::core::model::{Category, ClassifiedLine};
use console::style;

/// When to emit ANSI colour codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ColorChoice {
    /// Detect whether stdout is a colour-capable terminal.
    #[default]
    Auto,
    Always,
    Never,
}

impl ColorChoice {
    /// Apply this choice process-wide.
    pub fn apply(self) {
        match self {
            ColorChoice::Auto => {} // console crate's tty detection stands
            ColorChoice::Always => console::set_colors_enabled(true),
            ColorChoice::Never => console::set_colors_enabled(false),
        }
    }
}

/// Renders classified lines to stdout.
///
/// Diagnostics (tracing) go to stderr, so stdout carries nothing but the
/// annotated log stream.
#[derive(Debug, Default)]
pub struct ConsoleRenderer;

impl ConsoleRenderer {
    pub fn new() -> Self {
        Self
    }

    /// Write one annotated line for `line`.
    pub fn render(&self, line: &ClassifiedLine) {
        match line.category {
            Category::Section => {
                // Blank separator so section headers stand off from the
                // preceding block.
                println!();
                let name = line.payload.as_deref().unwrap_or(&line.raw_text);
                println!("{}", style(format!("##[section]{name}")).blue());
            }
            Category::Success => println!("{}", style(&line.raw_text).green()),
            Category::Error => {
                println!("{}", style(error_annotation(&line.raw_text)).red());
            }
            Category::Warning => println!("{}", style(&line.raw_text).yellow()),
            Category::Info => println!("{}", style(&line.raw_text).blue()),
            Category::Debug => println!("{}", style(&line.raw_text).dim()),
            Category::Plain => println!("{}", line.raw_text),
        }
    }
}

/// Prefix an error line with `##[error]` unless the producer already
/// annotated it.
fn error_annotation(raw: &str) -> String {
    if raw.contains("##[error]") {
        raw.to_string()
    } else {
        format!("##[error]{raw}")
    }
}

// =============================================================================
// Unit tests
// =============================================================================
