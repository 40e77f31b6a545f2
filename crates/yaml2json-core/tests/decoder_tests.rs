/// Decoder contract tests: one `Value` per YAML document, in stream order,
/// with end-of-stream reported as a value rather than an error.
use std::cell::Cell;
use std::collections::VecDeque;
use std::io::{self, Read};
use std::rc::Rc;

use yaml2json_core::{ConvertError, Decoded, DocumentDecoder, Number, Value};

/// Helper: decode every document of `yaml`, panicking on the first error.
fn decode_all(yaml: &str) -> Vec<Value> {
    DocumentDecoder::from_str(yaml)
        .collect::<Result<Vec<_>, _>>()
        .expect("stream should decode")
}

/// Helper: decode a single-document stream.
fn decode_one(yaml: &str) -> Value {
    let mut docs = decode_all(yaml);
    assert_eq!(docs.len(), 1, "expected exactly one document in {yaml:?}");
    docs.remove(0)
}

/// Helper: decode `yaml` until it fails, returning the error.
fn decode_err(yaml: &str) -> ConvertError {
    DocumentDecoder::from_str(yaml)
        .find_map(Result::err)
        .expect("stream should fail to decode")
}

// ============================================================================
// Stream boundaries
// ============================================================================

#[test]
fn empty_stream_has_no_documents() {
    let mut decoder = DocumentDecoder::from_str("");
    assert_eq!(decoder.next_document().unwrap(), Decoded::EndOfStream);
    assert_eq!(decoder.decoded(), 0);
}

#[test]
fn comment_only_stream_has_no_documents() {
    assert!(decode_all("# nothing here\n\n   \n# still nothing\n").is_empty());
}

#[test]
fn whitespace_only_stream_has_no_documents() {
    assert!(decode_all("\n\n  \n").is_empty());
}

#[test]
fn single_document_without_separator() {
    let value = decode_one("foo: FOO\n");
    assert_eq!(value.as_mapping().unwrap().get("foo"), Some(&Value::from("FOO")));
}

#[test]
fn separated_documents_in_order() {
    let docs = decode_all("foo: FOO\n---\nbar: BAR\n---\nbaz: BAZ\n");
    let keys: Vec<&str> = docs
        .iter()
        .map(|doc| doc.as_mapping().unwrap().keys().next().unwrap())
        .collect();
    assert_eq!(keys, vec!["foo", "bar", "baz"]);
}

#[test]
fn leading_separator_does_not_add_a_document() {
    assert_eq!(decode_all("---\na: 1\n").len(), 1);
}

#[test]
fn explicit_empty_document_is_null() {
    let docs = decode_all("a: 1\n---\n---\nb: 2\n");
    assert_eq!(docs.len(), 3);
    assert!(docs[1].is_null());
}

#[test]
fn end_of_stream_is_sticky() {
    let mut decoder = DocumentDecoder::from_str("1\n");
    assert!(matches!(decoder.next_document().unwrap(), Decoded::Document(_)));
    assert_eq!(decoder.next_document().unwrap(), Decoded::EndOfStream);
    assert_eq!(decoder.next_document().unwrap(), Decoded::EndOfStream);
}

#[test]
fn reader_input_matches_str_input() {
    let yaml = "a: [1, 2]\n---\nb: x\n";
    let from_reader: Vec<Value> = DocumentDecoder::from_reader(yaml.as_bytes(), "mem")
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(from_reader, decode_all(yaml));
}

/// Reader that hands out one scripted piece per `read` call and counts calls.
struct Trickle {
    pieces: VecDeque<&'static [u8]>,
    reads: Rc<Cell<usize>>,
}

impl Read for Trickle {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reads.set(self.reads.get() + 1);
        match self.pieces.pop_front() {
            Some(piece) => {
                buf[..piece.len()].copy_from_slice(piece);
                Ok(piece.len())
            }
            None => Ok(0),
        }
    }
}

#[test]
fn document_is_returned_before_the_rest_of_the_stream_arrives() {
    let reads = Rc::new(Cell::new(0));
    let reader = Trickle {
        pieces: VecDeque::from([&b"a: 1\n---\n"[..], &b"b: 2\n"[..]]),
        reads: Rc::clone(&reads),
    };
    let mut decoder = DocumentDecoder::from_reader(reader, "pipe");

    assert!(matches!(decoder.next_document().unwrap(), Decoded::Document(_)));
    assert_eq!(reads.get(), 1);

    assert!(matches!(decoder.next_document().unwrap(), Decoded::Document(_)));
    assert_eq!(decoder.next_document().unwrap(), Decoded::EndOfStream);
    assert_eq!(decoder.decoded(), 2);
}

#[test]
fn document_end_marker_separates_documents() {
    let docs = decode_all("a: 1\n...\n---\nb: 2\n...\n");
    assert_eq!(docs.len(), 2);
}

#[test]
fn directives_belong_to_the_next_document() {
    let docs = decode_all("a: 1\n...\n%YAML 1.2\n---\nb: 2\n");
    assert_eq!(docs.len(), 2);
}

// ============================================================================
// Scalars
// ============================================================================

#[test]
fn null_forms() {
    assert!(decode_one("null").is_null());
    assert!(decode_one("~").is_null());
}

#[test]
fn booleans() {
    assert_eq!(decode_one("true"), Value::Bool(true));
    assert_eq!(decode_one("false"), Value::Bool(false));
}

#[test]
fn integers_stay_integers() {
    assert_eq!(decode_one("42"), Value::Number(Number::Int(42)));
    assert_eq!(decode_one("-7"), Value::Number(Number::Int(-7)));
    assert_eq!(decode_one("0x1F"), Value::Number(Number::Int(31)));
}

#[test]
fn integers_above_i64_are_unsigned() {
    assert_eq!(
        decode_one("18446744073709551615"),
        Value::Number(Number::UInt(u64::MAX))
    );
}

#[test]
fn integers_beyond_64_bits_become_floats() {
    let big = Value::Number(Number::Float(99999999999999999999u128 as f64));
    assert_eq!(decode_one("99999999999999999999"), big);

    let value = decode_one("x: 99999999999999999999\ny: [-99999999999999999999]\n");
    let map = value.as_mapping().unwrap();
    assert_eq!(map.get("x"), Some(&big));
    assert_eq!(
        map.get("y"),
        Some(&Value::Sequence(vec![Value::Number(Number::Float(
            -99999999999999999999i128 as f64
        ))]))
    );
}

#[test]
fn floats_stay_floats() {
    assert_eq!(decode_one("3.5"), Value::Number(Number::Float(3.5)));
    assert_eq!(decode_one("1.0"), Value::Number(Number::Float(1.0)));
}

#[test]
fn special_floats_decode() {
    match decode_one(".inf") {
        Value::Number(Number::Float(f)) => assert!(f.is_infinite() && f > 0.0),
        other => panic!("expected +inf, got {other:?}"),
    }
    match decode_one(".nan") {
        Value::Number(Number::Float(f)) => assert!(f.is_nan()),
        other => panic!("expected NaN, got {other:?}"),
    }
}

#[test]
fn quoted_scalars_are_strings() {
    assert_eq!(decode_one("'42'"), Value::from("42"));
    assert_eq!(decode_one("\"true\""), Value::from("true"));
}

#[test]
fn block_scalar_keeps_newlines() {
    let value = decode_one("text: |\n  line1\n  line2\n");
    assert_eq!(
        value.as_mapping().unwrap().get("text"),
        Some(&Value::from("line1\nline2\n"))
    );
}

// ============================================================================
// Collections
// ============================================================================

#[test]
fn mapping_keeps_document_order() {
    let value = decode_one("zeta: 1\nalpha: 2\nmid: 3\n");
    let keys: Vec<&str> = value.as_mapping().unwrap().keys().collect();
    assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
}

#[test]
fn nested_sequences_and_mappings() {
    let value = decode_one("items:\n  - name: a\n    tags: [x, y]\n  - name: b\n");
    let items = value.as_mapping().unwrap().get("items").unwrap();
    let items = items.as_sequence().unwrap();
    assert_eq!(items.len(), 2);
    let first = items[0].as_mapping().unwrap();
    assert_eq!(first.get("name"), Some(&Value::from("a")));
    assert_eq!(
        first.get("tags"),
        Some(&Value::Sequence(vec![Value::from("x"), Value::from("y")]))
    );
}

#[test]
fn aliases_expand_to_copies() {
    let value = decode_one("base: &b [1, 2]\ncopy: *b\n");
    let map = value.as_mapping().unwrap();
    assert_eq!(map.get("base"), map.get("copy"));
}

#[test]
fn merge_keys_are_applied() {
    let value = decode_one("base: &b {x: 1}\nderived:\n  <<: *b\n  y: 2\n");
    let derived = value.as_mapping().unwrap().get("derived").unwrap();
    let derived = derived.as_mapping().unwrap();
    assert_eq!(derived.get("x"), Some(&Value::Number(Number::Int(1))));
    assert_eq!(derived.get("y"), Some(&Value::Number(Number::Int(2))));
    assert!(derived.get("<<").is_none());
}

#[test]
fn merged_keys_take_the_merge_position() {
    let value = decode_one("<<: {a: 1}\nb: 2\n");
    let keys: Vec<&str> = value.as_mapping().unwrap().keys().collect();
    assert_eq!(keys, vec!["a", "b"]);
}

#[test]
fn explicit_keys_win_over_merged_ones() {
    let value = decode_one("base: &b {x: 1, y: 1}\nderived:\n  y: 2\n  <<: *b\n  z: 3\n");
    let derived = value.as_mapping().unwrap().get("derived").unwrap();
    let derived = derived.as_mapping().unwrap();
    assert_eq!(derived.keys().collect::<Vec<_>>(), vec!["y", "x", "z"]);
    assert_eq!(derived.get("y"), Some(&Value::Number(Number::Int(2))));
}

#[test]
fn first_merged_mapping_wins() {
    let value = decode_one("<<: [{a: 1}, {a: 2, b: 2}]\nc: 3\n");
    let map = value.as_mapping().unwrap();
    assert_eq!(map.keys().collect::<Vec<_>>(), vec!["a", "b", "c"]);
    assert_eq!(map.get("a"), Some(&Value::Number(Number::Int(1))));
}

#[test]
fn merge_of_a_scalar_is_rejected() {
    let err = decode_err("<<: 1\na: 2\n");
    assert!(err.to_string().contains("merging"), "{err}");
}

#[test]
fn large_mapping_keeps_every_key_in_order() {
    let yaml: String = (0..20_000).map(|i| format!("k{i}: {i}\n")).collect();
    let value = decode_one(&yaml);
    let map = value.as_mapping().unwrap();
    assert_eq!(map.len(), 20_000);
    assert_eq!(map.keys().next(), Some("k0"));
    assert_eq!(map.keys().last(), Some("k19999"));
    assert_eq!(map.get("k12345"), Some(&Value::Number(Number::Int(12345))));
}

#[test]
fn custom_tags_are_dropped() {
    assert_eq!(decode_one("!shout hello"), Value::from("hello"));
    let value = decode_one("point: !xy [1, 2]\n");
    assert_eq!(
        value.as_mapping().unwrap().get("point"),
        Some(&Value::Sequence(vec![
            Value::Number(Number::Int(1)),
            Value::Number(Number::Int(2)),
        ]))
    );
}

#[test]
fn scalar_keys_are_stringified() {
    let value = decode_one("1: one\ntrue: yes\n~: nothing\n");
    let keys: Vec<&str> = value.as_mapping().unwrap().keys().collect();
    assert_eq!(keys, vec!["1", "true", "null"]);
}

#[test]
fn colliding_keys_last_write_wins() {
    let value = decode_one("1: first\n'1': second\n");
    let map = value.as_mapping().unwrap();
    assert_eq!(map.len(), 1);
    assert_eq!(map.get("1"), Some(&Value::from("second")));
}

// ============================================================================
// Failures
// ============================================================================

#[test]
fn unterminated_quote_reports_line() {
    let err = decode_err("foo: \"bar\n");
    match &err {
        ConvertError::Decode {
            source_name,
            line,
            message,
        } => {
            assert_eq!(source_name, "<input>");
            assert_eq!(*line, Some(2));
            assert!(message.contains("line"), "message: {message}");
        }
        other => panic!("expected decode error, got {other:?}"),
    }
}

#[test]
fn error_in_later_document_keeps_earlier_ones() {
    let mut decoder = DocumentDecoder::from_str("a: 1\n---\nb: \"oops\n");
    assert!(matches!(decoder.next_document().unwrap(), Decoded::Document(_)));
    match decoder.next_document().unwrap_err() {
        ConvertError::Decode { line, message, .. } => {
            // Counted from the start of the stream, not the document.
            assert_eq!(line, Some(4));
            assert!(message.contains("line 4"), "message: {message}");
        }
        other => panic!("expected decode error, got {other:?}"),
    }
    assert_eq!(decoder.decoded(), 1);
    // The decoder does not resume after a failure.
    assert_eq!(decoder.next_document().unwrap(), Decoded::EndOfStream);
}

#[test]
fn sequence_key_is_rejected_with_its_line() {
    let err = decode_err("? [1, 2]\n: value\n");
    assert_eq!(err.line(), Some(1));
    assert!(err.to_string().contains("unsupported mapping key"));
}

#[test]
fn nested_mapping_key_reports_the_mapping_line() {
    let err = decode_err("outer:\n  ? {a: 1}\n  : value\n");
    assert_eq!(err.line(), Some(2));
    assert!(err.to_string().contains("a mapping cannot be a JSON object key"));
}

#[test]
fn duplicate_keys_are_rejected() {
    let err = decode_err("a:\n  x: 1\n  x: 2\n");
    assert!(err.to_string().contains("duplicate entry with key \"x\""), "{err}");
    assert!(err.line().is_some());
}

#[test]
fn source_name_appears_in_errors() {
    let err = DocumentDecoder::from_reader("[1, 2".as_bytes(), "data/broken.yaml")
        .find_map(Result::err)
        .unwrap();
    assert!(err.to_string().starts_with("data/broken.yaml: YAML decoding error:"));
}
