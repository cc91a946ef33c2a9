#![allow(dead_code)]

use jsonflume::{Context, ErrorHandler, ErrorKind, EventSink, Flow};

/// Everything the parser can tell a sink, in owned form for comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    BeginDocument,
    EndDocument,
    BeginObject(usize),
    EndObject,
    BeginArray(usize),
    EndArray,
    Key(String),
    Str(String),
    Unsigned(u64),
    Signed(i64),
    Float(f64),
    Bool(bool),
    Null,
}

/// Collects the full event stream, optionally with source positions.
#[derive(Debug, Default)]
pub struct Recorder {
    pub events: Vec<Event>,
    pub positions: Vec<(u64, u64)>,
}

impl Recorder {
    fn note(&mut self, event: Event, ctx: &Context) -> Flow {
        self.events.push(event);
        self.positions.push((ctx.line, ctx.column));
        Flow::Continue
    }

    /// The stream with capacity hints blanked, for comparisons that must
    /// ignore how much of the input was buffered.
    pub fn shape(&self) -> Vec<Event> {
        self.events
            .iter()
            .map(|e| match e {
                Event::BeginArray(_) => Event::BeginArray(0),
                Event::BeginObject(_) => Event::BeginObject(0),
                other => other.clone(),
            })
            .collect()
    }
}

impl EventSink for Recorder {
    fn begin_document(&mut self, ctx: &Context) {
        self.note(Event::BeginDocument, ctx);
    }
    fn end_document(&mut self, ctx: &Context) {
        self.note(Event::EndDocument, ctx);
    }
    fn begin_object(&mut self, hint: usize, ctx: &Context) -> Flow {
        self.note(Event::BeginObject(hint), ctx)
    }
    fn end_object(&mut self, ctx: &Context) -> Flow {
        self.note(Event::EndObject, ctx)
    }
    fn begin_array(&mut self, hint: usize, ctx: &Context) -> Flow {
        self.note(Event::BeginArray(hint), ctx)
    }
    fn end_array(&mut self, ctx: &Context) -> Flow {
        self.note(Event::EndArray, ctx)
    }
    fn key(&mut self, name: &str, ctx: &Context) -> Flow {
        self.note(Event::Key(name.to_owned()), ctx)
    }
    fn string(&mut self, value: &str, ctx: &Context) -> Flow {
        self.note(Event::Str(value.to_owned()), ctx)
    }
    fn unsigned_integer(&mut self, value: u64, ctx: &Context) -> Flow {
        self.note(Event::Unsigned(value), ctx)
    }
    fn signed_integer(&mut self, value: i64, ctx: &Context) -> Flow {
        self.note(Event::Signed(value), ctx)
    }
    fn floating(&mut self, value: f64, ctx: &Context) -> Flow {
        self.note(Event::Float(value), ctx)
    }
    fn boolean(&mut self, value: bool, ctx: &Context) -> Flow {
        self.note(Event::Bool(value), ctx)
    }
    fn null(&mut self, ctx: &Context) -> Flow {
        self.note(Event::Null, ctx)
    }
}

/// Records every reported condition and keeps parsing.
#[derive(Debug, Default)]
pub struct Tolerant {
    pub reported: Vec<ErrorKind>,
}

impl ErrorHandler for Tolerant {
    fn handle(&mut self, kind: ErrorKind, _: &Context) -> Flow {
        self.reported.push(kind);
        Flow::Continue
    }
}
