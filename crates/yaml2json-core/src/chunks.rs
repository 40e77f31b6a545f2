//! Splits a YAML byte stream into per-document chunks as the bytes arrive.
//!
//! serde_yaml reads its whole input before yielding the first document, so
//! the decoder never hands it the full stream. Instead the stream is cut on
//! document markers (`---` and `...` at column 0, followed by whitespace or
//! end of line) and each chunk is parsed on its own. A marker at column 0
//! always ends the current document in YAML, even inside block or quoted
//! scalars, so the cut never lands inside a node.
//!
//! A chunk is released as soon as the marker that closes it (or the end of
//! the stream) has been read, which keeps piped input flowing one document
//! at a time.

use std::io::{self, BufRead};

/// One document's worth of input.
#[derive(Debug)]
pub(crate) struct Chunk {
    pub(crate) text: Vec<u8>,
    /// Lines of the stream that precede `text`.
    pub(crate) line_offset: usize,
}

pub(crate) struct Chunks<'de> {
    reader: Box<dyn BufRead + 'de>,
    /// A document-start line read while closing the previous chunk.
    carried: Option<Vec<u8>>,
    lines_read: usize,
    done: bool,
}

impl<'de> Chunks<'de> {
    pub(crate) fn new(reader: Box<dyn BufRead + 'de>) -> Self {
        Self {
            reader,
            carried: None,
            lines_read: 0,
            done: false,
        }
    }

    /// Read up to the end of the next document.
    ///
    /// Returns `Ok(None)` once the stream holds nothing but blank lines,
    /// comments and directives.
    pub(crate) fn next_chunk(&mut self) -> io::Result<Option<Chunk>> {
        let mut text = Vec::new();
        let mut has_content = false;
        let mut line_offset = self.lines_read;

        if let Some(line) = self.carried.take() {
            line_offset -= 1;
            has_content = true;
            text.extend_from_slice(&line);
        }

        while !self.done {
            let mut line = Vec::new();
            if self.reader.read_until(b'\n', &mut line)? == 0 {
                self.done = true;
                break;
            }
            self.lines_read += 1;

            if is_marker(&line, b"---") {
                if has_content {
                    self.carried = Some(line);
                    return Ok(Some(Chunk { text, line_offset }));
                }
                has_content = true;
                text.extend_from_slice(&line);
                continue;
            }

            let document_end = is_marker(&line, b"...");
            has_content |= !document_end && is_content(&line);
            text.extend_from_slice(&line);
            if document_end && has_content {
                return Ok(Some(Chunk { text, line_offset }));
            }
        }

        Ok(has_content.then_some(Chunk { text, line_offset }))
    }
}

fn is_marker(line: &[u8], marker: &[u8]) -> bool {
    line.starts_with(marker)
        && matches!(
            line.get(marker.len()).copied(),
            None | Some(b' ' | b'\t' | b'\r' | b'\n')
        )
}

/// Anything but blank lines, comments and directives.
fn is_content(line: &[u8]) -> bool {
    if line.first() == Some(&b'%') {
        return false;
    }
    match line.iter().copied().find(|b| !b.is_ascii_whitespace()) {
        None | Some(b'#') => false,
        Some(_) => true,
    }
}
