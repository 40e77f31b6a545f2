//! # yaml2json-core
//!
//! Converts streams of YAML documents into line-delimited JSON: every YAML
//! document becomes exactly one compact JSON value followed by `\n`, in
//! document order, source after source.
//!
//! ## Quick start
//!
//! ```rust
//! use yaml2json_core::{Converter, Options};
//!
//! let options = Options::default(); // no files: read standard input
//! let stdin = "foo: FOO\n---\nbar: BAR\n".as_bytes();
//! let mut out = Vec::new();
//!
//! let summary = Converter::new(&options).run(stdin, &mut out).unwrap();
//! assert_eq!(summary.documents, 2);
//! assert_eq!(out, b"{\"foo\":\"FOO\"}\n{\"bar\":\"BAR\"}\n");
//! ```
//!
//! Conversion is fail-fast: the first source, decode or encode error ends the
//! run, and lines already written to the sink are left in place.
//!
//! ## Modules
//!
//! - [`value`] — `Value` tree shared by decoding and encoding
//! - [`decoder`] — YAML stream → one `Value` per document
//! - [`encoder`] — `Value` → compact JSON text
//! - [`emitter`] — JSON text → sink, one line per document
//! - [`convert`] — source iteration and the fail-fast run loop
//! - [`error`] — `ConvertError` and the `Result` alias

mod chunks;
pub mod convert;
pub mod decoder;
pub mod emitter;
pub mod encoder;
pub mod error;
pub mod value;

pub use convert::{convert_str, Converter, Options, Source, Summary, STDIN_ARG};
pub use decoder::{Decoded, DocumentDecoder};
pub use emitter::LineEmitter;
pub use encoder::{encode, encode_to_writer};
pub use error::{ConvertError, Result};
pub use value::{Mapping, Number, Value};
