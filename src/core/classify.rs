// buildtail - core/classify.rs
//
// Line classification engine: splits newly tailed text into logical lines,
// drops noise lines matching the exclusion rule set, and assigns each
// retained line an output category.
//
// The classifier is stateful: bytes after the final newline of a chunk are
// an in-progress line written by the producer mid-poll. They are carried
// forward and prepended to the next chunk, so a line split across two polls
// is classified exactly once, whole. `finish()` flushes a trailing
// unterminated line when the watch stops.

use crate::core::model::{Category, ClassifiedLine};
use crate::util::constants::{
    BUILTIN_EXCLUDE_PATTERNS, MAX_EXCLUDE_PATTERN_LENGTH, MAX_PARTIAL_LINE_BYTES, PROGRESS_MARKER,
    TEST_PROTOCOL_MARKER,
};
use crate::util::error::PatternError;
use regex::Regex;

// =============================================================================
// Exclusion rules
// =============================================================================

/// Compiled exclusion rule set, built once at startup and immutable after.
///
/// A line matching ANY rule is dropped entirely: not classified, not
/// forwarded, not accumulated. The built-in rules cover universal build-log
/// noise; deployment-specific patterns (e.g. an internal build-pipeline
/// namespace) are appended via `extra` at construction time.
#[derive(Debug)]
pub struct ExclusionRules {
    patterns: Vec<Regex>,
}

impl ExclusionRules {
    /// Compile the built-in rules plus `extra` user-supplied patterns,
    /// preserving order (built-ins first, extras in given order).
    pub fn with_extra_patterns(extra: &[String]) -> Result<Self, PatternError> {
        let mut patterns = Vec::with_capacity(BUILTIN_EXCLUDE_PATTERNS.len() + extra.len());

        for pattern in BUILTIN_EXCLUDE_PATTERNS {
            patterns.push(compile_pattern(pattern)?);
        }
        for pattern in extra {
            if pattern.len() > MAX_EXCLUDE_PATTERN_LENGTH {
                return Err(PatternError::PatternTooLong {
                    pattern: pattern.clone(),
                    length: pattern.len(),
                    max_length: MAX_EXCLUDE_PATTERN_LENGTH,
                });
            }
            patterns.push(compile_pattern(pattern)?);
        }

        Ok(Self { patterns })
    }

    /// The built-in rule set only.
    pub fn builtin() -> Result<Self, PatternError> {
        Self::with_extra_patterns(&[])
    }

    /// Returns true if `line` matches any exclusion rule.
    pub fn is_excluded(&self, line: &str) -> bool {
        self.patterns.iter().any(|p| p.is_match(line))
    }
}

fn compile_pattern(pattern: &str) -> Result<Regex, PatternError> {
    Regex::new(pattern).map_err(|e| PatternError::InvalidRegex {
        pattern: pattern.to_string(),
        source: e,
    })
}

// =============================================================================
// Line classifier
// =============================================================================

/// Stateful classifier for incrementally tailed text.
///
/// Owned and driven by a single watch loop; holds the partial-line carry
/// buffer between polls.
#[derive(Debug)]
pub struct LineClassifier {
    rules: ExclusionRules,

    /// Sentinel substring marking a successful build. Checked before the
    /// error/warning rules so a success line mentioning "error " is still
    /// reported green. Empty disables the sentinel check.
    success_sentinel: String,

    /// Bytes from previous chunks that followed the final newline: an
    /// in-progress line, prepended to the next chunk before splitting.
    partial: String,
}

impl LineClassifier {
    pub fn new(rules: ExclusionRules, success_sentinel: impl Into<String>) -> Self {
        Self {
            rules,
            success_sentinel: success_sentinel.into(),
            partial: String::new(),
        }
    }

    /// Classify the complete lines in `chunk`, carrying any trailing
    /// unterminated fragment forward to the next call.
    ///
    /// Returns retained lines in original order. Empty lines and lines
    /// matching an exclusion rule produce no output.
    pub fn classify_chunk(&mut self, chunk: &str) -> Vec<ClassifiedLine> {
        self.partial.push_str(chunk);

        let complete = match self.partial.rfind('\n') {
            Some(nl_pos) => {
                let rest = self.partial.split_off(nl_pos + 1);
                std::mem::replace(&mut self.partial, rest)
            }
            None => {
                self.enforce_partial_cap();
                return Vec::new();
            }
        };
        self.enforce_partial_cap();

        let mut out = Vec::new();
        for raw in complete.split('\n') {
            let line = raw.strip_suffix('\r').unwrap_or(raw);
            if line.is_empty() || self.rules.is_excluded(line) {
                continue;
            }
            out.push(self.classify_line(line));
        }
        out
    }

    /// Flush the pending partial line, if any.
    ///
    /// Called once when the watch stops, so a final line the producer never
    /// terminated is still classified and forwarded.
    pub fn finish(&mut self) -> Option<ClassifiedLine> {
        let pending = std::mem::take(&mut self.partial);
        let line = pending.strip_suffix('\r').unwrap_or(&pending);
        if line.is_empty() || self.rules.is_excluded(line) {
            return None;
        }
        Some(self.classify_line(line))
    }

    /// Assign a category to a single complete, non-excluded line.
    ///
    /// First matching rule wins; the order is load-bearing (a success
    /// sentinel line may well contain "error ", and warning markers must be
    /// checked before the bare `##[error]` passthrough).
    pub fn classify_line(&self, line: &str) -> ClassifiedLine {
        if let Some(name) = line.strip_prefix(PROGRESS_MARKER) {
            return ClassifiedLine::section(line, name);
        }

        if (!self.success_sentinel.is_empty() && line.contains(&self.success_sentinel))
            || line.contains(TEST_PROTOCOL_MARKER)
        {
            return ClassifiedLine::new(line, Category::Success);
        }

        let category = if line.contains("error ") || line.contains("Error ") {
            Category::Error
        } else if line.contains("##[info]") || line.contains("##[section]") {
            Category::Info
        } else if line.contains("##[warning]") || line.contains("warning ") || line.contains("Warning ")
        {
            Category::Warning
        } else if line.contains("##[error]") {
            // Lines that already carry the ##[error] annotation but no bare
            // "error " substring land here; the renderer must not re-prefix.
            Category::Error
        } else if line.contains("##[debug]") {
            Category::Debug
        } else {
            Category::Plain
        };

        ClassifiedLine::new(line, category)
    }

    /// Discard the carry buffer if it has grown past the safety cap.
    /// Only reachable when the watched file stops producing newlines
    /// (binary junk or a runaway single line).
    fn enforce_partial_cap(&mut self) {
        if self.partial.len() > MAX_PARTIAL_LINE_BYTES {
            tracing::warn!(
                bytes = self.partial.len(),
                cap = MAX_PARTIAL_LINE_BYTES,
                "Partial-line buffer exceeded cap; discarding fragment"
            );
            self.partial.clear();
        }
    }
}

// =============================================================================
// Unit tests
// =============================================================================
