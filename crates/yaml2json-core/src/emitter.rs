//! Line emitter: one encoded document per line.

use std::io::Write;

use crate::error::Result;

const LF: &[u8] = b"\n";

/// Writes encoded lines to a sink, each followed by a single `\n`.
///
/// The emitter adds no buffering of its own and never closes the sink; use
/// [`into_inner`](Self::into_inner) to get the sink back.
pub struct LineEmitter<W: Write> {
    sink: W,
    lines: usize,
}

impl<W: Write> LineEmitter<W> {
    pub fn new(sink: W) -> Self {
        Self { sink, lines: 0 }
    }

    /// Write `line` and a trailing line feed.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ConvertError::Io`] if the sink rejects the write.
    pub fn emit(&mut self, line: &str) -> Result<()> {
        self.sink.write_all(line.as_bytes())?;
        self.sink.write_all(LF)?;
        self.lines += 1;
        Ok(())
    }

    /// Flush the underlying sink.
    pub fn flush(&mut self) -> Result<()> {
        self.sink.flush()?;
        Ok(())
    }

    /// Number of lines written so far.
    pub fn lines(&self) -> usize {
        self.lines
    }

    pub fn into_inner(self) -> W {
        self.sink
    }
}
