mod common;

use common::{Event, Recorder, Tolerant};
use jsonflume::{ErrorKind, FailFast, ParserOptions, Reader, SliceProducer};
use rstest::rstest;

fn read(input: &str) -> Recorder {
    let mut recorder = Recorder::default();
    let mut reader = Reader::new(SliceProducer::new(input.as_bytes()), ParserOptions::default());
    reader.read(&mut recorder, &mut FailFast).unwrap();
    recorder
}

fn read_err(input: &str) -> (Recorder, jsonflume::ParseError) {
    let mut recorder = Recorder::default();
    let mut reader = Reader::new(SliceProducer::new(input.as_bytes()), ParserOptions::default());
    let err = reader.read(&mut recorder, &mut FailFast).unwrap_err();
    (recorder, err)
}

#[test]
fn array_of_integers() {
    assert_eq!(
        read("[1, 2, 3]").events,
        [
            Event::BeginDocument,
            Event::BeginArray(3),
            Event::Unsigned(1),
            Event::Unsigned(2),
            Event::Unsigned(3),
            Event::EndArray,
            Event::EndDocument,
        ]
    );
}

#[test]
fn object_with_boolean_and_null() {
    assert_eq!(
        read(r#"{"a": true, "b": null}"#).events,
        [
            Event::BeginDocument,
            Event::BeginObject(0),
            Event::Key("a".into()),
            Event::Bool(true),
            Event::Key("b".into()),
            Event::Null,
            Event::EndObject,
            Event::EndDocument,
        ]
    );
}

#[test]
fn signed_exponent_literal() {
    assert_eq!(
        read("[-0.5e+2]").events,
        [
            Event::BeginDocument,
            Event::BeginArray(1),
            Event::Float(-50.0),
            Event::EndArray,
            Event::EndDocument,
        ]
    );
}

#[test]
fn comments_between_tokens() {
    assert_eq!(
        read("/* c */ [1 /* x */ , 2]").events,
        [
            Event::BeginDocument,
            Event::BeginArray(2),
            Event::Unsigned(1),
            Event::Unsigned(2),
            Event::EndArray,
            Event::EndDocument,
        ]
    );
}

#[test]
fn emoji_surrogate_pair() {
    assert_eq!(
        read(r#"["\uD83D\uDE00"]"#).events,
        [
            Event::BeginDocument,
            Event::BeginArray(1),
            Event::Str("\u{1f600}".into()),
            Event::EndArray,
            Event::EndDocument,
        ]
    );
}

#[test]
fn truncated_array_reports_eof_after_trailing_value() {
    let (recorder, err) = read_err("[1, 2");
    assert_eq!(err.kind, ErrorKind::UnexpectedEof);
    assert_eq!(
        recorder.shape(),
        [
            Event::BeginDocument,
            Event::BeginArray(0),
            Event::Unsigned(1),
            Event::Unsigned(2),
            Event::EndDocument,
        ]
    );
}

#[test]
fn begin_and_end_events_balance() {
    let recorder = read(r#"{"a": [{"b": []}, [[]]], "c": {}}"#);
    let mut open = 0i64;
    for event in &recorder.events {
        match event {
            Event::BeginObject(_) | Event::BeginArray(_) => open += 1,
            Event::EndObject | Event::EndArray => open -= 1,
            _ => {}
        }
        assert!(open >= 0);
    }
    assert_eq!(open, 0);
}

#[test]
fn object_events_alternate_key_value() {
    let recorder = read(r#"{"a": 1, "b": "x", "c": false}"#);
    let inner = &recorder.events[2..recorder.events.len() - 2];
    for pair in inner.chunks(2) {
        assert!(matches!(pair[0], Event::Key(_)));
        assert!(!matches!(pair[1], Event::Key(_)));
    }
}

#[rstest]
#[case("[\n1]", 2)]
#[case("[\r1]", 2)]
#[case("[\r\n1]", 2)]
#[case("[\n\n1]", 3)]
#[case("[\r\r1]", 3)]
#[case("[\r\n\r\n1]", 3)]
fn line_breaks_count_once(#[case] input: &str, #[case] expected_line: u64) {
    let recorder = read(input);
    // position captured at the integer event
    let idx = recorder
        .events
        .iter()
        .position(|e| matches!(e, Event::Unsigned(1)))
        .unwrap();
    assert_eq!(recorder.positions[idx].0, expected_line);
}

#[test]
fn hints_for_fully_buffered_containers_are_exact() {
    let recorder = read(r#"[[1, 2], ["a"], [], [true, null, 3]]"#);
    let hints: Vec<usize> = recorder
        .events
        .iter()
        .filter_map(|e| match e {
            Event::BeginArray(h) => Some(*h),
            _ => None,
        })
        .collect();
    assert_eq!(hints, [4, 2, 1, 0, 3]);
}

#[test]
fn strings_with_every_escape() {
    let recorder = read(r#"["\"\\\/\b\f\n\r\t"]"#);
    assert_eq!(
        recorder.events[2],
        Event::Str("\"\\/\u{8}\u{c}\n\r\t".into())
    );
}

#[test]
fn clef_surrogate_pair_encodes_u1d11e() {
    let recorder = read(r#"["\uD834\uDD1E"]"#);
    assert_eq!(recorder.events[2], Event::Str("\u{1d11e}".into()));
}

#[test]
fn raw_newline_in_string_is_rejected() {
    let (_, err) = read_err("[\"a\nb\"]");
    assert_eq!(err.kind, ErrorKind::ExpectedValue);
}

#[test]
fn unsigned_boundary_then_float() {
    assert_eq!(
        read("[18446744073709551615]").events[2],
        Event::Unsigned(u64::MAX)
    );
    assert!(matches!(
        read("[184467440737095516150]").events[2],
        Event::Float(_)
    ));
}

#[test]
fn signed_boundary() {
    assert_eq!(
        read("[-9223372036854775808]").events[2],
        Event::Signed(i64::MIN)
    );
}

#[test]
fn parsing_twice_produces_identical_streams_and_positions() {
    let doc = r#"{"k": [1, -2, 3.5, "s", {"n": null}], "done": true}"#;
    let first = read(doc);
    let second = read(doc);
    assert_eq!(first.events, second.events);
    assert_eq!(first.positions, second.positions);
}

#[test]
fn tolerant_handler_collects_reports_and_recovers() {
    let mut recorder = Recorder::default();
    let mut handler = Tolerant::default();
    let mut reader = Reader::new(
        SliceProducer::new(b"[1, @ 2]"),
        ParserOptions::default(),
    );
    reader.read(&mut recorder, &mut handler).unwrap();
    assert_eq!(handler.reported, [ErrorKind::ExpectedValue]);
    assert_eq!(
        recorder.shape(),
        [
            Event::BeginDocument,
            Event::BeginArray(0),
            Event::Unsigned(1),
            Event::Unsigned(2),
            Event::EndArray,
            Event::EndDocument,
        ]
    );
}

#[test]
fn structural_errors_override_tolerant_handlers() {
    let mut recorder = Recorder::default();
    let mut handler = Tolerant::default();
    let mut reader = Reader::new(SliceProducer::new(b"[[1]"), ParserOptions::default());
    let err = reader.read(&mut recorder, &mut handler).unwrap_err();
    assert_eq!(err.kind, ErrorKind::UnexpectedEof);
    assert_eq!(handler.reported, [ErrorKind::UnexpectedEof]);
    assert_eq!(recorder.events.last(), Some(&Event::EndDocument));
}

#[test]
fn depth_cap_reports_depth_limit_exceeded() {
    let mut recorder = Recorder::default();
    let mut handler = Tolerant::default();
    let options = ParserOptions {
        max_depth: Some(4),
        ..Default::default()
    };
    let mut reader = Reader::new(SliceProducer::new(b"[[[[[0]]]]]"), options);
    let err = reader.read(&mut recorder, &mut handler).unwrap_err();
    assert_eq!(err.kind, ErrorKind::DepthLimitExceeded);
    assert_eq!(handler.reported, [ErrorKind::DepthLimitExceeded]);
}

#[test]
fn json_roundtrip_preserves_event_stream() {
    // write events back out as JSON, reparse, compare streams
    struct JsonOut {
        text: String,
        needs_comma: bool,
    }
    impl JsonOut {
        fn sep(&mut self) {
            if self.needs_comma {
                self.text.push(',');
            }
            self.needs_comma = true;
        }
    }
    impl jsonflume::EventSink for JsonOut {
        fn begin_object(&mut self, _: usize, _: &jsonflume::Context) -> jsonflume::Flow {
            self.sep();
            self.text.push('{');
            self.needs_comma = false;
            jsonflume::Flow::Continue
        }
        fn end_object(&mut self, _: &jsonflume::Context) -> jsonflume::Flow {
            self.text.push('}');
            self.needs_comma = true;
            jsonflume::Flow::Continue
        }
        fn begin_array(&mut self, _: usize, _: &jsonflume::Context) -> jsonflume::Flow {
            self.sep();
            self.text.push('[');
            self.needs_comma = false;
            jsonflume::Flow::Continue
        }
        fn end_array(&mut self, _: &jsonflume::Context) -> jsonflume::Flow {
            self.text.push(']');
            self.needs_comma = true;
            jsonflume::Flow::Continue
        }
        fn key(&mut self, name: &str, _: &jsonflume::Context) -> jsonflume::Flow {
            self.sep();
            self.text.push('"');
            self.text.push_str(name);
            self.text.push_str("\":");
            self.needs_comma = false;
            jsonflume::Flow::Continue
        }
        fn string(&mut self, value: &str, _: &jsonflume::Context) -> jsonflume::Flow {
            self.sep();
            self.text.push('"');
            self.text.push_str(value);
            self.text.push('"');
            jsonflume::Flow::Continue
        }
        fn unsigned_integer(&mut self, value: u64, _: &jsonflume::Context) -> jsonflume::Flow {
            self.sep();
            self.text.push_str(&value.to_string());
            jsonflume::Flow::Continue
        }
        fn signed_integer(&mut self, value: i64, _: &jsonflume::Context) -> jsonflume::Flow {
            self.sep();
            self.text.push_str(&value.to_string());
            jsonflume::Flow::Continue
        }
        fn floating(&mut self, value: f64, _: &jsonflume::Context) -> jsonflume::Flow {
            self.sep();
            self.text.push_str(ryu::Buffer::new().format(value));
            jsonflume::Flow::Continue
        }
        fn boolean(&mut self, value: bool, _: &jsonflume::Context) -> jsonflume::Flow {
            self.sep();
            self.text.push_str(if value { "true" } else { "false" });
            jsonflume::Flow::Continue
        }
        fn null(&mut self, _: &jsonflume::Context) -> jsonflume::Flow {
            self.sep();
            self.text.push_str("null");
            jsonflume::Flow::Continue
        }
    }

    let doc = r#"{"a": [1, -2, 3.5], "b": {"c": true, "d": null}, "e": "text"}"#;
    let mut out = JsonOut {
        text: String::new(),
        needs_comma: false,
    };
    let mut reader = Reader::new(SliceProducer::new(doc.as_bytes()), ParserOptions::default());
    reader.read(&mut out, &mut FailFast).unwrap();

    let original = read(doc);
    let reparsed = read(&out.text);
    assert_eq!(original.shape(), reparsed.shape());
}
