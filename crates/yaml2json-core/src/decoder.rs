//! YAML document decoder: pulls one [`Value`] at a time out of a YAML stream.
//!
//! The stream is read one document at a time, cut on `---`/`...` marker
//! lines, and each document is parsed by `serde_yaml` straight into the
//! crate's own [`Value`] tree:
//!
//! - Merge keys (`<<: *base`) are spliced in where the `<<` entry stands.
//!   Keys written explicitly in the mapping win over merged ones.
//! - Tags (`!custom x`) are dropped; only the tagged value is kept.
//! - Integers wider than 64 bits become floats.
//! - Non-string scalar keys are rendered as text (`1` → `"1"`, `true` →
//!   `"true"`, `~` → `"null"`). Sequence and mapping keys have no JSON form
//!   and fail the document.
//!
//! # Example
//! ```
//! use yaml2json_core::{Decoded, DocumentDecoder, Value};
//!
//! let mut decoder = DocumentDecoder::from_str("a: 1\n---\nb: 2\n");
//! assert!(matches!(decoder.next_document().unwrap(), Decoded::Document(Value::Mapping(_))));
//! assert!(matches!(decoder.next_document().unwrap(), Decoded::Document(Value::Mapping(_))));
//! assert!(matches!(decoder.next_document().unwrap(), Decoded::EndOfStream));
//! ```

use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::io::{self, BufReader, Read};
use std::mem::{self, Discriminant};

use serde::de::{
    self, Deserialize, Deserializer, EnumAccess, MapAccess, SeqAccess, VariantAccess, Visitor,
};
use tracing::trace;

use crate::chunks::{Chunk, Chunks};
use crate::error::{ConvertError, Result};
use crate::value::{Mapping, Number, Value};

/// Source name used for in-memory input.
pub const INLINE_SOURCE: &str = "<input>";

const MERGE_KEY: &str = "<<";

/// Outcome of one successful decode attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    /// The next document in the stream.
    Document(Value),
    /// No documents remain. Not an error: empty streams end here immediately.
    EndOfStream,
}

/// Lazily decodes the documents of a single YAML stream, in order.
///
/// Input is consumed only as far as the end of the document being returned,
/// so a document is available as soon as its closing `---`/`...` line (or
/// the end of the stream) has arrived.
///
/// Once the stream is exhausted or a document fails to decode, every later
/// call to [`next_document`](Self::next_document) reports
/// [`Decoded::EndOfStream`]. A decoder cannot be rewound.
pub struct DocumentDecoder<'de> {
    chunks: Chunks<'de>,
    pending: VecDeque<Result<Value>>,
    source_name: String,
    decoded: usize,
    finished: bool,
}

impl<'de> DocumentDecoder<'de> {
    /// Decode documents from a byte stream. `source_name` appears in errors.
    pub fn from_reader<R>(reader: R, source_name: impl Into<String>) -> Self
    where
        R: Read + 'de,
    {
        Self::new(Box::new(BufReader::new(reader)), source_name)
    }

    /// Decode documents from an in-memory string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(yaml: &'de str) -> Self {
        Self::new(Box::new(yaml.as_bytes()), INLINE_SOURCE)
    }

    fn new(reader: Box<dyn io::BufRead + 'de>, source_name: impl Into<String>) -> Self {
        Self {
            chunks: Chunks::new(reader),
            pending: VecDeque::new(),
            source_name: source_name.into(),
            decoded: 0,
            finished: false,
        }
    }

    /// Name of the stream being decoded, as used in error messages.
    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    /// Number of documents successfully decoded so far.
    pub fn decoded(&self) -> usize {
        self.decoded
    }

    /// Decode the next document of the stream.
    ///
    /// # Errors
    ///
    /// Returns [`ConvertError::Decode`] when the document is malformed YAML,
    /// holds a mapping key that cannot become a JSON object key, or the
    /// stream cannot be read.
    pub fn next_document(&mut self) -> Result<Decoded> {
        while !self.finished {
            match self.pending.pop_front() {
                Some(Ok(value)) => {
                    self.decoded += 1;
                    trace!(
                        source = %self.source_name,
                        index = self.decoded,
                        "decoded YAML document"
                    );
                    return Ok(Decoded::Document(value));
                }
                Some(Err(err)) => {
                    self.finished = true;
                    return Err(err);
                }
                None => self.fill()?,
            }
        }
        Ok(Decoded::EndOfStream)
    }

    /// Read and parse the next chunk into `pending`.
    fn fill(&mut self) -> Result<()> {
        match self.chunks.next_chunk() {
            Ok(Some(chunk)) => {
                self.decode_chunk(&chunk);
                Ok(())
            }
            Ok(None) => {
                self.finished = true;
                Ok(())
            }
            Err(err) => {
                self.finished = true;
                Err(ConvertError::Decode {
                    source_name: self.source_name.clone(),
                    line: None,
                    message: format!("failed to read input: {err}"),
                })
            }
        }
    }

    /// A chunk normally holds one document. Parsing stops at the first
    /// failure, which is queued behind the documents before it.
    fn decode_chunk(&mut self, chunk: &Chunk) {
        for document in serde_yaml::Deserializer::from_slice(&chunk.text) {
            match Node::deserialize(document) {
                Ok(Node::Value(value)) => self.pending.push_back(Ok(value)),
                Ok(Node::Void) => {}
                Err(err) => {
                    let err = self.yaml_error(&err, chunk.line_offset);
                    self.pending.push_back(Err(err));
                    return;
                }
            }
        }
    }

    fn yaml_error(&self, err: &serde_yaml::Error, line_offset: usize) -> ConvertError {
        ConvertError::Decode {
            source_name: self.source_name.clone(),
            line: err.location().map(|location| location.line() + line_offset),
            message: shift_lines(&err.to_string(), line_offset),
        }
    }
}

impl Iterator for DocumentDecoder<'_> {
    type Item = Result<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_document() {
            Ok(Decoded::Document(value)) => Some(Ok(value)),
            Ok(Decoded::EndOfStream) => None,
            Err(err) => Some(Err(err)),
        }
    }
}

/// Rewrite the `line N column M` positions in a serde_yaml message, which
/// count from the start of the chunk, to count from the start of the stream.
fn shift_lines(message: &str, offset: usize) -> String {
    const LINE: &str = "line ";

    if offset == 0 {
        return message.to_owned();
    }
    let mut out = String::with_capacity(message.len());
    let mut rest = message;
    while let Some(at) = rest.find(LINE) {
        let (head, tail) = rest.split_at(at + LINE.len());
        out.push_str(head);
        let digits = tail.bytes().take_while(u8::is_ascii_digit).count();
        rest = match tail[..digits].parse::<usize>() {
            Ok(line) if tail[digits..].starts_with(" column") => {
                out.push_str(&(line + offset).to_string());
                &tail[digits..]
            }
            _ => tail,
        };
    }
    out.push_str(rest);
    out
}

/// One YAML node as handed out by serde_yaml.
///
/// A chunk without any document still yields one placeholder document that
/// deserializes through `visit_none`; an explicit empty document (`---`) or a
/// `null` scalar goes through `visit_unit` instead. Below the top level the
/// placeholder cannot occur and reads as null.
enum Node {
    Void,
    Value(Value),
}

impl Node {
    fn into_value(self) -> Value {
        match self {
            Node::Void => Value::Null,
            Node::Value(value) => value,
        }
    }
}

impl<'de> Deserialize<'de> for Node {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(NodeVisitor)
    }
}

/// Mapping entries in document order, before merges are resolved.
enum Entry {
    Explicit(String, Value),
    Merge(Vec<Mapping>),
}

struct NodeVisitor;

impl<'de> Visitor<'de> for NodeVisitor {
    type Value = Node;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("any YAML value")
    }

    fn visit_none<E>(self) -> std::result::Result<Node, E> {
        Ok(Node::Void)
    }

    fn visit_unit<E>(self) -> std::result::Result<Node, E> {
        Ok(Node::Value(Value::Null))
    }

    fn visit_bool<E>(self, b: bool) -> std::result::Result<Node, E> {
        Ok(Node::Value(Value::Bool(b)))
    }

    fn visit_i64<E>(self, i: i64) -> std::result::Result<Node, E> {
        Ok(Node::Value(Value::Number(Number::from(i))))
    }

    fn visit_u64<E>(self, u: u64) -> std::result::Result<Node, E> {
        Ok(Node::Value(Value::Number(Number::from(u))))
    }

    fn visit_i128<E>(self, i: i128) -> std::result::Result<Node, E> {
        Ok(Node::Value(Value::Number(Number::from(i))))
    }

    fn visit_u128<E>(self, u: u128) -> std::result::Result<Node, E> {
        Ok(Node::Value(Value::Number(Number::from(u))))
    }

    fn visit_f64<E>(self, f: f64) -> std::result::Result<Node, E> {
        Ok(Node::Value(Value::Number(Number::Float(f))))
    }

    fn visit_str<E>(self, s: &str) -> std::result::Result<Node, E> {
        Ok(Node::Value(Value::String(s.to_owned())))
    }

    fn visit_string<E>(self, s: String) -> std::result::Result<Node, E> {
        Ok(Node::Value(Value::String(s)))
    }

    fn visit_seq<A>(self, mut seq: A) -> std::result::Result<Node, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element::<Node>()? {
            items.push(item.into_value());
        }
        Ok(Node::Value(Value::Sequence(items)))
    }

    fn visit_map<A>(self, mut map: A) -> std::result::Result<Node, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
        // Duplicates are judged on the key as written, so `1` and `'1'` are
        // distinct keys that later collide as text.
        let mut seen: HashSet<(Discriminant<Value>, String)> = HashSet::new();
        let mut explicit: HashSet<String> = HashSet::new();

        while let Some(key) = map.next_key::<Node>()? {
            let key = key.into_value();
            let kind = mem::discriminant(&key);
            let is_merge = key.as_str() == Some(MERGE_KEY);
            let name = key_text(key).map_err(de::Error::custom)?;
            if !seen.insert((kind, name.clone())) {
                return Err(de::Error::custom(format!(
                    "duplicate entry with key \"{name}\""
                )));
            }

            let value = map.next_value::<Node>()?.into_value();
            if is_merge {
                entries.push(Entry::Merge(merge_sources(value).map_err(de::Error::custom)?));
            } else {
                explicit.insert(name.clone());
                entries.push(Entry::Explicit(name, value));
            }
        }

        Ok(Node::Value(Value::Mapping(build_mapping(entries, &explicit))))
    }

    fn visit_enum<A>(self, data: A) -> std::result::Result<Node, A::Error>
    where
        A: EnumAccess<'de>,
    {
        // Tagged node: the tag is the variant name.
        let (_tag, contents) = data.variant::<String>()?;
        contents.newtype_variant::<Node>()
    }
}

/// Lay out the entries in document order. Merged keys land at the `<<`
/// position unless the mapping names them itself; among merged mappings the
/// first one to provide a key wins.
fn build_mapping(entries: Vec<Entry>, explicit: &HashSet<String>) -> Mapping {
    let mut mapping = Mapping::with_capacity(entries.len());
    for entry in entries {
        match entry {
            Entry::Explicit(key, value) => {
                mapping.insert(key, value);
            }
            Entry::Merge(sources) => {
                for (key, value) in sources.into_iter().flatten() {
                    if !explicit.contains(&key) && !mapping.contains_key(&key) {
                        mapping.insert(key, value);
                    }
                }
            }
        }
    }
    mapping
}

/// The value of a `<<` entry: one mapping or a sequence of mappings.
fn merge_sources(value: Value) -> std::result::Result<Vec<Mapping>, String> {
    const EXPECTED: &str = "expected a mapping or list of mappings for merging";

    match value {
        Value::Mapping(mapping) => Ok(vec![mapping]),
        Value::Sequence(items) => items
            .into_iter()
            .map(|item| match item {
                Value::Mapping(mapping) => Ok(mapping),
                _ => Err(EXPECTED.to_owned()),
            })
            .collect(),
        _ => Err(EXPECTED.to_owned()),
    }
}

/// Render a mapping key as a JSON object key.
fn key_text(key: Value) -> std::result::Result<String, String> {
    match key {
        Value::String(s) => Ok(s),
        Value::Null => Ok("null".to_owned()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Sequence(_) => Err(unsupported_key("sequence")),
        Value::Mapping(_) => Err(unsupported_key("mapping")),
    }
}

fn unsupported_key(kind: &str) -> String {
    format!("unsupported mapping key: a {kind} cannot be a JSON object key")
}
