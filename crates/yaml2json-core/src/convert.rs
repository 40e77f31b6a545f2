//! Conversion orchestrator: sources in, JSON lines out.
//!
//! Sources are processed strictly in order. For each source the stream is
//! opened, every document is decoded, encoded and emitted before the next one
//! is decoded, and the stream is released before the next source is opened.
//! The first error of any kind stops the run. Lines already written stay in
//! the sink; nothing is retracted.

use std::fmt;
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::decoder::{Decoded, DocumentDecoder};
use crate::emitter::LineEmitter;
use crate::encoder::encode;
use crate::error::{ConvertError, Result};

/// Command-line spelling of the standard-input source.
pub const STDIN_ARG: &str = "-";

const STDIN_ONLY: &[Source] = &[Source::Stdin];

/// One input byte stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Stdin,
    File(PathBuf),
}

impl Source {
    /// Interpret a command-line argument: `-` is stdin, anything else a path.
    pub fn from_arg(arg: impl Into<PathBuf>) -> Self {
        let path = arg.into();
        if path.as_os_str() == STDIN_ARG {
            Source::Stdin
        } else {
            Source::File(path)
        }
    }

    /// Name used for this source in diagnostics.
    pub fn name(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Stdin => f.write_str("<stdin>"),
            Source::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Run configuration, built once by the caller and passed to [`Converter`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Options {
    /// Sources in processing order. Empty means standard input.
    pub sources: Vec<Source>,
}

impl Options {
    pub fn new(sources: Vec<Source>) -> Self {
        Self { sources }
    }

    /// Build options from command-line file arguments.
    pub fn from_args<I, P>(args: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self::new(args.into_iter().map(Source::from_arg).collect())
    }

    /// The sources a run will actually read.
    pub fn effective_sources(&self) -> &[Source] {
        if self.sources.is_empty() {
            STDIN_ONLY
        } else {
            &self.sources
        }
    }
}

/// Counts for a completed run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub sources: usize,
    pub documents: usize,
}

/// Drives Decoder → Encoder → Emitter over every configured source.
pub struct Converter<'a> {
    options: &'a Options,
}

impl<'a> Converter<'a> {
    pub fn new(options: &'a Options) -> Self {
        Self { options }
    }

    /// Convert every source into `sink`, reading `stdin` for [`Source::Stdin`].
    ///
    /// The sink is flushed before returning, on success and on failure.
    ///
    /// # Errors
    ///
    /// Returns the first failure: [`ConvertError::Source`] when a source
    /// cannot be opened, [`ConvertError::Decode`] or [`ConvertError::Encode`]
    /// for a bad document, [`ConvertError::Io`] when the sink fails.
    pub fn run<R: Read, W: Write>(&self, mut stdin: R, sink: W) -> Result<Summary> {
        let mut emitter = LineEmitter::new(sink);
        let outcome = self.convert_sources(&mut stdin, &mut emitter);
        let flushed = emitter.flush();
        let summary = outcome?;
        flushed?;
        debug!(
            sources = summary.sources,
            documents = summary.documents,
            "conversion finished"
        );
        Ok(summary)
    }

    fn convert_sources<R: Read, W: Write>(
        &self,
        stdin: &mut R,
        emitter: &mut LineEmitter<W>,
    ) -> Result<Summary> {
        let mut summary = Summary::default();
        for source in self.options.effective_sources() {
            let reader = open_source(source, stdin)?;
            debug!(%source, "opened source");
            let decoder = DocumentDecoder::from_reader(reader, source.name());
            let documents = drain(decoder, emitter)?;
            debug!(%source, documents, "source exhausted");
            summary.sources += 1;
            summary.documents += documents;
        }
        Ok(summary)
    }
}

/// Convert an in-memory YAML stream into JSON lines.
///
/// ```
/// let out = yaml2json_core::convert_str("foo: FOO\n---\nbar: BAR\n").unwrap();
/// assert_eq!(out, "{\"foo\":\"FOO\"}\n{\"bar\":\"BAR\"}\n");
/// ```
pub fn convert_str(yaml: &str) -> Result<String> {
    let mut emitter = LineEmitter::new(Vec::new());
    drain(DocumentDecoder::from_str(yaml), &mut emitter)?;
    Ok(String::from_utf8_lossy(&emitter.into_inner()).into_owned())
}

/// Emit every document of one stream, returning how many were written.
fn drain<W: Write>(
    mut decoder: DocumentDecoder<'_>,
    emitter: &mut LineEmitter<W>,
) -> Result<usize> {
    loop {
        match decoder.next_document()? {
            Decoded::Document(value) => {
                let line = encode(&value).map_err(|source| ConvertError::Encode {
                    source_name: decoder.source_name().to_owned(),
                    source,
                })?;
                emitter.emit(&line)?;
            }
            Decoded::EndOfStream => return Ok(decoder.decoded()),
        }
    }
}

fn open_source<'r, R: Read>(source: &Source, stdin: &'r mut R) -> Result<Box<dyn Read + 'r>> {
    match source {
        Source::Stdin => Ok(Box::new(stdin)),
        Source::File(path) => Ok(Box::new(open_file(path)?)),
    }
}

fn open_file(path: &Path) -> Result<File> {
    let source_error = |source: io::Error| ConvertError::Source {
        path: path.to_path_buf(),
        source,
    };
    let file = File::open(path).map_err(source_error)?;
    if file.metadata().map_err(source_error)?.is_dir() {
        return Err(source_error(io::Error::from(io::ErrorKind::IsADirectory)));
    }
    Ok(file)
}
