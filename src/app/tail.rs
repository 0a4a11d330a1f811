// buildtail - app/tail.rs
//
// Incremental file tailing: a read cursor (byte offset) into a single
// growing log file.
//
// Encoding: new bytes are decoded as lossy UTF-8. The watched producer
// writes plain text; any stray invalid sequence becomes U+FFFD rather than
// failing the poll.

use crate::util::error::TailError;
use std::fs::File;
use std::io::{ErrorKind, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

/// Tails one growing file. Owns the read cursor exclusively; a single
/// instance per watched file, driven by a single thread.
#[derive(Debug)]
pub struct Tailer {
    path: PathBuf,

    /// Byte position of the last byte consumed from the file.
    /// Advances by exactly the number of bytes read on each poll; never
    /// decreases except for the documented truncation reset.
    offset: u64,
}

impl Tailer {
    /// Create a tailer for `path`, starting at the beginning of the file.
    ///
    /// The file does not need to exist yet; polls before it appears return
    /// empty.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            offset: 0,
        }
    }

    /// Path of the watched file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current cursor position in bytes.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Read all text appended since the last poll.
    ///
    /// Returns `Ok(None)` when the file does not exist yet or has not
    /// grown. A second poll with no intervening growth always returns
    /// `Ok(None)`. Errors other than "file does not exist" are returned as
    /// typed I/O failures, never swallowed.
    pub fn poll(&mut self) -> Result<Option<String>, TailError> {
        let current_size = match std::fs::metadata(&self.path) {
            Ok(m) => m.len(),
            // Not yet created by the producer: a normal, recoverable state.
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(TailError::Io {
                    path: self.path.clone(),
                    operation: "stat",
                    source: e,
                })
            }
        };

        // Shrunk below the cursor: truncated or rotated. Conservative
        // recovery: re-read from the start. Rotated-away content is not
        // recovered.
        if current_size < self.offset {
            tracing::warn!(
                file = %self.path.display(),
                old_offset = self.offset,
                new_size = current_size,
                "Watched file shrank; resetting cursor to 0"
            );
            self.offset = 0;
        }

        if current_size == self.offset {
            return Ok(None);
        }

        let text = self.read_from_offset()?;
        if text.is_empty() {
            return Ok(None);
        }
        Ok(Some(text))
    }

    /// Open, seek to the cursor, read to end-of-stream, advance the cursor.
    ///
    /// The file is opened read-only with the platform's default sharing, so
    /// a concurrent writer appending to the same file is tolerated.
    fn read_from_offset(&mut self) -> Result<String, TailError> {
        let io_err = |operation: &'static str, source: std::io::Error| TailError::Io {
            path: self.path.clone(),
            operation,
            source,
        };

        let mut file = File::open(&self.path).map_err(|e| io_err("open", e))?;
        file.seek(SeekFrom::Start(self.offset))
            .map_err(|e| io_err("seek", e))?;

        let mut buf = Vec::new();
        file.read_to_end(&mut buf).map_err(|e| io_err("read", e))?;

        // Advance by the bytes actually consumed, not the stat size: the
        // writer may have appended again between the stat and the read.
        self.offset += buf.len() as u64;

        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

// =============================================================================
// Unit tests
// =============================================================================
