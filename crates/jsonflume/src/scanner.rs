//! The primary state machine.
//!
//! [`Parser`] consumes one code unit per step and pushes events into the
//! caller's [`EventSink`]. It holds the mode stack, the pending-string and
//! number scratch buffers, the surrogate accumulators, and the line/column
//! counters; input arrives as arbitrarily fragmented byte buffers and every
//! piece of scanner state survives a buffer boundary.
//!
//! Opening an array triggers a bounded lookahead over the remainder of the
//! current buffer that counts the array's direct children without emitting
//! events, publishing the result as the capacity hint on the new stack
//! entry.

use alloc::borrow::Cow;
use alloc::string::String;
use alloc::vec::Vec;

use crate::chars;
use crate::error::{ErrorHandler, ErrorKind, ParseError};
use crate::event::{Context, EventSink, Flow};
use crate::modes::{Mode, ModeStack};
use crate::numbers::{Number, NumberScratch};
use crate::options::ParserOptions;

/// Positions in the state machine. Distinct from the mode stack: a phase
/// names where the scanner is inside the current token, the stack records
/// what containers are open around it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    // structural
    Start,
    Ok,
    Object,
    Key,
    Colon,
    Value,
    Array,
    // string
    Str,
    Escape,
    U1,
    U2,
    U3,
    U4,
    SurrogatePair,
    U5,
    U6,
    U7,
    U8,
    U9,
    // number
    Minus,
    Zero,
    Integer,
    Fraction,
    Exp1,
    Exp2,
    Exp3,
    // keyword
    T,
    Tr,
    Tru,
    F,
    Fa,
    Fal,
    Fals,
    N,
    Nu,
    Nul,
    // comment
    Slash,
    SlashSlash,
    SlashStar,
    SlashStarStar,
    // terminal
    Done,
}

/// Outcome of pushing a buffer (or end-of-input) through the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// The buffer was consumed and the document is still open.
    More,
    /// The outermost container closed; trailing input is not consumed.
    Done,
    /// A sink answered [`Flow::Abort`].
    Aborted,
}

/// Why the transition loop stopped early.
enum Halt {
    /// A sink cancelled the parse.
    Aborted,
    /// The error handler gave up, or the condition was structural.
    Fatal(ParseError),
}

type Step = Result<(), Halt>;

/// The push parser.
///
/// Feed input with [`advance`](Parser::advance) as it arrives, then call
/// [`finish`](Parser::finish) once the producer is exhausted. The driver in
/// [`crate::Reader`] does exactly that; `Parser` is public for callers that
/// bring their own buffering.
#[derive(Debug)]
pub struct Parser {
    phase: Phase,
    saved_phase: Phase,
    stack: ModeStack,
    number: NumberScratch,
    text: Vec<u8>,
    lead: u32,
    trail: u32,
    line: u64,
    column: u64,
    prev_unit: u8,
    last_unit: u8,
    eof: bool,
}

impl Parser {
    #[must_use]
    pub fn new(options: &ParserOptions) -> Self {
        Self {
            phase: Phase::Start,
            saved_phase: Phase::Start,
            stack: ModeStack::new(options.max_depth),
            number: NumberScratch::default(),
            text: Vec::new(),
            lead: 0,
            trail: 0,
            line: 1,
            column: 0,
            prev_unit: 0,
            last_unit: 0,
            eof: false,
        }
    }

    /// Returns the scanner to its pre-document state, keeping allocations.
    pub fn reset(&mut self) {
        self.phase = Phase::Start;
        self.saved_phase = Phase::Start;
        self.stack.clear();
        self.number.clear();
        self.text.clear();
        self.lead = 0;
        self.trail = 0;
        self.line = 1;
        self.column = 0;
        self.prev_unit = 0;
        self.last_unit = 0;
        self.eof = false;
    }

    /// Whether the outermost container has closed.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.phase == Phase::Done
    }

    /// The current diagnostics snapshot.
    #[must_use]
    pub fn context(&self) -> Context {
        Context {
            line: self.line,
            column: self.column,
            eof: self.eof,
            last_unit: self.last_unit,
            capacity_hint: self.stack.top_hint(),
        }
    }

    /// Pushes one input buffer through the machine.
    ///
    /// Consumes every unit of `buf` unless the document completes or the
    /// parse stops first; scanner state carries over so the next buffer may
    /// split tokens at any byte.
    ///
    /// # Errors
    ///
    /// Returns the reported condition when the error handler answers
    /// [`Flow::Abort`] or the condition is structural.
    pub fn advance<S: EventSink, H: ErrorHandler>(
        &mut self,
        buf: &[u8],
        sink: &mut S,
        errors: &mut H,
    ) -> Result<Status, ParseError> {
        let outcome = self.run(buf, sink, errors);
        self.conclude(outcome)
    }

    /// Tells the machine the producer is exhausted.
    ///
    /// A numeric literal that is complete at end of input is terminated and
    /// delivered here. Afterwards the machine must be done; anything else
    /// is an `unexpected_eof`.
    ///
    /// # Errors
    ///
    /// As for [`advance`](Parser::advance); `unexpected_eof` is structural
    /// and always fails.
    pub fn finish<S: EventSink, H: ErrorHandler>(
        &mut self,
        sink: &mut S,
        errors: &mut H,
    ) -> Result<Status, ParseError> {
        self.eof = true;
        let outcome = self.finish_inner(sink, errors);
        self.conclude(outcome)
    }

    fn conclude(&self, outcome: Step) -> Result<Status, ParseError> {
        match outcome {
            Ok(()) => Ok(if self.phase == Phase::Done {
                Status::Done
            } else {
                Status::More
            }),
            Err(Halt::Aborted) => Ok(Status::Aborted),
            Err(Halt::Fatal(err)) => Err(err),
        }
    }

    fn finish_inner<S: EventSink, H: ErrorHandler>(
        &mut self,
        sink: &mut S,
        errors: &mut H,
    ) -> Step {
        match self.phase {
            Phase::Zero | Phase::Integer => self.end_integer(sink, errors)?,
            Phase::Fraction | Phase::Exp3 => self.end_decimal(sink, errors)?,
            _ => {}
        }
        if self.phase != Phase::Done {
            self.fault(ErrorKind::UnexpectedEof, errors)?;
        }
        Ok(())
    }

    fn run<S: EventSink, H: ErrorHandler>(
        &mut self,
        buf: &[u8],
        sink: &mut S,
        errors: &mut H,
    ) -> Step {
        let mut i = 0;
        while i < buf.len() && self.phase != Phase::Done {
            let unit = buf[i];
            i += 1;
            self.advance_position(unit);
            self.last_unit = unit;
            let step = self.step(unit, &buf[i..], sink, errors);
            self.prev_unit = unit;
            step?;
        }
        Ok(())
    }

    /// CR alone breaks a line; LF breaks one unless it completes a CRLF.
    /// The column advances for every unit, newlines included.
    fn advance_position(&mut self, unit: u8) {
        match unit {
            b'\r' => {
                self.line += 1;
                self.column = 0;
            }
            b'\n' => {
                if self.prev_unit != b'\r' {
                    self.line += 1;
                }
                self.column = 0;
            }
            _ => {}
        }
        self.column += 1;
    }

    #[allow(clippy::too_many_lines)]
    fn step<S: EventSink, H: ErrorHandler>(
        &mut self,
        unit: u8,
        rest: &[u8],
        sink: &mut S,
        errors: &mut H,
    ) -> Step {
        if chars::is_bare_control(unit) {
            return self.fault(ErrorKind::IllegalControlCharacter, errors);
        }

        match self.phase {
            Phase::Start => match unit {
                u if chars::is_whitespace(u) => Ok(()),
                b'{' => self.begin_object(sink, errors),
                b'[' => self.begin_array(rest, sink, errors),
                b'/' => {
                    self.enter_comment();
                    Ok(())
                }
                b'}' => self.fault(ErrorKind::UnexpectedEndOfObject, errors),
                b']' => self.fault(ErrorKind::UnexpectedEndOfArray, errors),
                _ => self.fault(ErrorKind::ExpectedContainer, errors),
            },

            Phase::Ok => match unit {
                u if chars::is_whitespace(u) => Ok(()),
                b'}' => self.close_object(Mode::ExpectValue, sink, errors),
                b']' => self.close_array(sink, errors),
                b',' => self.separator(errors),
                b'/' => {
                    self.enter_comment();
                    Ok(())
                }
                _ => self.fault(ErrorKind::InvalidNumber, errors),
            },

            Phase::Object => match unit {
                u if chars::is_whitespace(u) => Ok(()),
                b'}' => self.close_object(Mode::ExpectKey, sink, errors),
                b'"' => {
                    self.enter_string();
                    Ok(())
                }
                b'/' => {
                    self.enter_comment();
                    Ok(())
                }
                _ => self.fault(ErrorKind::ExpectedName, errors),
            },

            Phase::Key => match unit {
                u if chars::is_whitespace(u) => Ok(()),
                b'"' => {
                    self.enter_string();
                    Ok(())
                }
                b'/' => {
                    self.enter_comment();
                    Ok(())
                }
                _ => self.fault(ErrorKind::ExpectedName, errors),
            },

            Phase::Colon => match unit {
                u if chars::is_whitespace(u) => Ok(()),
                b':' => {
                    if !self.stack.flip(Mode::ExpectKey, Mode::ExpectValue) {
                        return self.fault(ErrorKind::ExpectedContainer, errors);
                    }
                    self.phase = Phase::Value;
                    Ok(())
                }
                b'/' => {
                    self.enter_comment();
                    Ok(())
                }
                _ => self.fault(ErrorKind::ExpectedNameSeparator, errors),
            },

            Phase::Value => match unit {
                u if chars::is_whitespace(u) => Ok(()),
                b'{' => self.begin_object(sink, errors),
                b'[' => self.begin_array(rest, sink, errors),
                b'"' => {
                    self.enter_string();
                    Ok(())
                }
                b'/' => {
                    self.enter_comment();
                    Ok(())
                }
                _ => self.start_scalar(unit, errors),
            },

            Phase::Array => match unit {
                u if chars::is_whitespace(u) => Ok(()),
                b'{' => self.begin_object(sink, errors),
                b'[' => self.begin_array(rest, sink, errors),
                b']' => self.close_array(sink, errors),
                b'"' => {
                    self.enter_string();
                    Ok(())
                }
                b'/' => {
                    self.enter_comment();
                    Ok(())
                }
                b'}' => self.fault(ErrorKind::UnexpectedEndOfObject, errors),
                b',' => self.fault(ErrorKind::UnexpectedValueSeparator, errors),
                _ => self.start_scalar(unit, errors),
            },

            // ------------------------------ strings ------------------------------
            Phase::Str => match unit {
                b'\n' | b'\r' | b'\t' => self.fault(ErrorKind::ExpectedValue, errors),
                b'\\' => {
                    self.phase = Phase::Escape;
                    Ok(())
                }
                b'"' => self.end_string(sink, errors),
                _ => {
                    self.text.push(unit);
                    Ok(())
                }
            },

            Phase::Escape => match chars::single_escape(unit) {
                Some(decoded) => {
                    self.text.push(decoded);
                    self.phase = Phase::Str;
                    Ok(())
                }
                None if unit == b'u' => {
                    self.lead = 0;
                    self.phase = Phase::U1;
                    Ok(())
                }
                None => self.fault(ErrorKind::IllegalEscapedCharacter, errors),
            },

            Phase::U1 | Phase::U2 | Phase::U3 => {
                let next = match self.phase {
                    Phase::U1 => Phase::U2,
                    Phase::U2 => Phase::U3,
                    _ => Phase::U4,
                };
                self.append_lead(unit, next, errors)
            }
            Phase::U4 => match chars::hex_value(unit) {
                None => self.fault(ErrorKind::InvalidHexEscapeSequence, errors),
                Some(v) => {
                    self.lead = self.lead * 16 + v;
                    if chars::is_lead_surrogate(self.lead) {
                        self.phase = Phase::SurrogatePair;
                        Ok(())
                    } else if chars::is_trail_surrogate(self.lead) {
                        // a lone low surrogate is not a scalar
                        self.phase = Phase::Str;
                        self.fault(ErrorKind::InvalidHexEscapeSequence, errors)
                    } else {
                        chars::push_scalar(&mut self.text, self.lead);
                        self.phase = Phase::Str;
                        Ok(())
                    }
                }
            },

            Phase::SurrogatePair => match unit {
                b'\\' => {
                    self.trail = 0;
                    self.phase = Phase::U5;
                    Ok(())
                }
                _ => self.fault(ErrorKind::InvalidHexEscapeSequence, errors),
            },
            Phase::U5 => match unit {
                b'u' => {
                    self.phase = Phase::U6;
                    Ok(())
                }
                _ => self.fault(ErrorKind::InvalidHexEscapeSequence, errors),
            },
            Phase::U6 | Phase::U7 | Phase::U8 => {
                let next = match self.phase {
                    Phase::U6 => Phase::U7,
                    Phase::U7 => Phase::U8,
                    _ => Phase::U9,
                };
                self.append_trail(unit, next, errors)
            }
            Phase::U9 => match chars::hex_value(unit) {
                None => self.fault(ErrorKind::InvalidHexEscapeSequence, errors),
                Some(v) => {
                    self.trail = self.trail * 16 + v;
                    self.phase = Phase::Str;
                    if chars::is_trail_surrogate(self.trail) {
                        chars::push_scalar(
                            &mut self.text,
                            chars::combine_surrogates(self.lead, self.trail),
                        );
                        Ok(())
                    } else {
                        self.fault(ErrorKind::InvalidHexEscapeSequence, errors)
                    }
                }
            },

            // ------------------------------ numbers ------------------------------
            Phase::Minus => match unit {
                b'0' => {
                    self.number.push(unit);
                    self.phase = Phase::Zero;
                    Ok(())
                }
                b'1'..=b'9' => {
                    self.number.push(unit);
                    self.phase = Phase::Integer;
                    Ok(())
                }
                _ => self.fault(ErrorKind::ExpectedValue, errors),
            },

            Phase::Zero => match unit {
                u if chars::is_whitespace(u) => self.end_integer(sink, errors),
                b'}' => {
                    self.end_integer(sink, errors)?;
                    self.close_object(Mode::ExpectValue, sink, errors)
                }
                b']' => {
                    self.end_integer(sink, errors)?;
                    self.close_array(sink, errors)
                }
                b',' => {
                    self.end_integer(sink, errors)?;
                    self.separator(errors)
                }
                b'.' => {
                    self.number.push(unit);
                    self.phase = Phase::Fraction;
                    Ok(())
                }
                b'e' | b'E' => {
                    self.number.push(unit);
                    self.phase = Phase::Exp1;
                    Ok(())
                }
                _ => self.fault(ErrorKind::ExpectedValue, errors),
            },

            Phase::Integer => match unit {
                u if chars::is_whitespace(u) => self.end_integer(sink, errors),
                b'}' => {
                    self.end_integer(sink, errors)?;
                    self.close_object(Mode::ExpectValue, sink, errors)
                }
                b']' => {
                    self.end_integer(sink, errors)?;
                    self.close_array(sink, errors)
                }
                b',' => {
                    self.end_integer(sink, errors)?;
                    self.separator(errors)
                }
                b'0'..=b'9' => {
                    self.number.push(unit);
                    Ok(())
                }
                b'.' => {
                    self.number.push(unit);
                    self.phase = Phase::Fraction;
                    Ok(())
                }
                b'e' | b'E' => {
                    self.number.push(unit);
                    self.phase = Phase::Exp1;
                    Ok(())
                }
                _ => self.fault(ErrorKind::ExpectedValue, errors),
            },

            Phase::Fraction => match unit {
                u if chars::is_whitespace(u) => self.end_decimal(sink, errors),
                b'}' => {
                    self.end_decimal(sink, errors)?;
                    self.close_object(Mode::ExpectValue, sink, errors)
                }
                b']' => {
                    self.end_decimal(sink, errors)?;
                    self.close_array(sink, errors)
                }
                b',' => {
                    self.end_decimal(sink, errors)?;
                    self.separator(errors)
                }
                b'0'..=b'9' => {
                    self.number.push(unit);
                    Ok(())
                }
                b'e' | b'E' => {
                    self.number.push(unit);
                    self.phase = Phase::Exp1;
                    Ok(())
                }
                _ => self.fault(ErrorKind::ExpectedValue, errors),
            },

            Phase::Exp1 => match unit {
                b'+' => {
                    self.phase = Phase::Exp2;
                    Ok(())
                }
                b'-' => {
                    self.number.push(unit);
                    self.phase = Phase::Exp2;
                    Ok(())
                }
                b'0'..=b'9' => {
                    self.number.push(unit);
                    self.phase = Phase::Exp3;
                    Ok(())
                }
                _ => self.fault(ErrorKind::ExpectedValue, errors),
            },

            Phase::Exp2 => match unit {
                b'0'..=b'9' => {
                    self.number.push(unit);
                    self.phase = Phase::Exp3;
                    Ok(())
                }
                _ => self.fault(ErrorKind::ExpectedValue, errors),
            },

            Phase::Exp3 => match unit {
                u if chars::is_whitespace(u) => self.end_decimal(sink, errors),
                b'}' => {
                    self.end_decimal(sink, errors)?;
                    self.close_object(Mode::ExpectValue, sink, errors)
                }
                b']' => {
                    self.end_decimal(sink, errors)?;
                    self.close_array(sink, errors)
                }
                b',' => {
                    self.end_decimal(sink, errors)?;
                    self.separator(errors)
                }
                b'0'..=b'9' => {
                    self.number.push(unit);
                    Ok(())
                }
                _ => self.fault(ErrorKind::ExpectedValue, errors),
            },

            // ------------------------------ keywords ------------------------------
            Phase::T => self.keyword_step(unit, b'r', Phase::Tr, errors),
            Phase::Tr => self.keyword_step(unit, b'u', Phase::Tru, errors),
            Phase::Tru => match unit {
                b'e' => {
                    self.phase = Phase::Ok;
                    self.emit(sink.boolean(true, &self.context()))
                }
                _ => self.fault(ErrorKind::ExpectedValue, errors),
            },
            Phase::F => self.keyword_step(unit, b'a', Phase::Fa, errors),
            Phase::Fa => self.keyword_step(unit, b'l', Phase::Fal, errors),
            Phase::Fal => self.keyword_step(unit, b's', Phase::Fals, errors),
            Phase::Fals => match unit {
                b'e' => {
                    self.phase = Phase::Ok;
                    self.emit(sink.boolean(false, &self.context()))
                }
                _ => self.fault(ErrorKind::ExpectedValue, errors),
            },
            Phase::N => self.keyword_step(unit, b'u', Phase::Nu, errors),
            Phase::Nu => self.keyword_step(unit, b'l', Phase::Nul, errors),
            Phase::Nul => match unit {
                b'l' => {
                    self.phase = Phase::Ok;
                    self.emit(sink.null(&self.context()))
                }
                _ => self.fault(ErrorKind::ExpectedValue, errors),
            },

            // ------------------------------ comments ------------------------------
            Phase::Slash => match unit {
                b'*' => {
                    self.phase = Phase::SlashStar;
                    Ok(())
                }
                b'/' => {
                    self.phase = Phase::SlashSlash;
                    Ok(())
                }
                _ => self.fault(ErrorKind::ExpectedContainer, errors),
            },
            Phase::SlashSlash => {
                if matches!(unit, b'\n' | b'\r') {
                    self.phase = self.saved_phase;
                }
                Ok(())
            }
            Phase::SlashStar => {
                if unit == b'*' {
                    self.phase = Phase::SlashStarStar;
                }
                Ok(())
            }
            Phase::SlashStarStar => {
                self.phase = if unit == b'/' {
                    self.saved_phase
                } else {
                    Phase::SlashStar
                };
                Ok(())
            }

            Phase::Done => Ok(()),
        }
    }

    // ------------------------------------------------------------------
    // transitions shared between phases
    // ------------------------------------------------------------------

    fn enter_comment(&mut self) {
        self.saved_phase = self.phase;
        self.phase = Phase::Slash;
    }

    fn enter_string(&mut self) {
        self.text.clear();
        self.phase = Phase::Str;
    }

    /// First unit of a number or keyword in a value position.
    fn start_scalar<H: ErrorHandler>(&mut self, unit: u8, errors: &mut H) -> Step {
        match unit {
            b'-' => {
                self.number.set_negative();
                self.phase = Phase::Minus;
            }
            b'0' => {
                self.number.push(unit);
                self.phase = Phase::Zero;
            }
            b'1'..=b'9' => {
                self.number.push(unit);
                self.phase = Phase::Integer;
            }
            b't' => self.phase = Phase::T,
            b'f' => self.phase = Phase::F,
            b'n' => self.phase = Phase::N,
            _ => return self.fault(ErrorKind::ExpectedValue, errors),
        }
        Ok(())
    }

    fn keyword_step<H: ErrorHandler>(
        &mut self,
        unit: u8,
        expected: u8,
        next: Phase,
        errors: &mut H,
    ) -> Step {
        if unit == expected {
            self.phase = next;
            Ok(())
        } else {
            self.fault(ErrorKind::ExpectedValue, errors)
        }
    }

    fn begin_object<S: EventSink, H: ErrorHandler>(
        &mut self,
        sink: &mut S,
        errors: &mut H,
    ) -> Step {
        if !self.stack.push(Mode::ExpectKey) {
            return self.fault(ErrorKind::DepthLimitExceeded, errors);
        }
        self.phase = Phase::Object;
        let hint = self.stack.top_hint();
        self.emit(sink.begin_object(hint, &self.context()))
    }

    fn begin_array<S: EventSink, H: ErrorHandler>(
        &mut self,
        rest: &[u8],
        sink: &mut S,
        errors: &mut H,
    ) -> Step {
        if !self.stack.push(Mode::Array) {
            return self.fault(ErrorKind::DepthLimitExceeded, errors);
        }
        self.phase = Phase::Array;
        let hint = self.estimate_capacity(rest);
        self.stack.set_top_hint(hint);
        self.emit(sink.begin_array(hint, &self.context()))
    }

    fn close_object<S: EventSink, H: ErrorHandler>(
        &mut self,
        expected: Mode,
        sink: &mut S,
        errors: &mut H,
    ) -> Step {
        if !self.stack.pop(expected) {
            return self.fault(ErrorKind::ExpectedContainer, errors);
        }
        self.phase = if self.stack.is_empty() {
            Phase::Done
        } else {
            Phase::Ok
        };
        self.emit(sink.end_object(&self.context()))
    }

    fn close_array<S: EventSink, H: ErrorHandler>(
        &mut self,
        sink: &mut S,
        errors: &mut H,
    ) -> Step {
        if !self.stack.pop(Mode::Array) {
            return self.fault(ErrorKind::ExpectedContainer, errors);
        }
        self.phase = if self.stack.is_empty() {
            Phase::Done
        } else {
            Phase::Ok
        };
        self.emit(sink.end_array(&self.context()))
    }

    /// `,` between members or elements.
    fn separator<H: ErrorHandler>(&mut self, errors: &mut H) -> Step {
        match self.stack.top_mode() {
            Some(Mode::ExpectValue) => {
                self.stack.flip(Mode::ExpectValue, Mode::ExpectKey);
                self.phase = Phase::Key;
                Ok(())
            }
            Some(Mode::Array) => {
                self.phase = Phase::Value;
                Ok(())
            }
            _ => self.fault(ErrorKind::ExpectedContainer, errors),
        }
    }

    /// Closing quote: the scratch becomes a key or a string value depending
    /// on what the innermost container expects.
    fn end_string<S: EventSink, H: ErrorHandler>(
        &mut self,
        sink: &mut S,
        errors: &mut H,
    ) -> Step {
        let flow = match self.stack.top_mode() {
            Some(Mode::ExpectKey) => {
                self.phase = Phase::Colon;
                let ctx = self.context();
                let name = decode_scratch(&self.text);
                sink.key(&name, &ctx)
            }
            Some(Mode::Array | Mode::ExpectValue) => {
                self.phase = Phase::Ok;
                let ctx = self.context();
                let value = decode_scratch(&self.text);
                sink.string(&value, &ctx)
            }
            _ => {
                return self.fault(ErrorKind::ExpectedContainer, errors);
            }
        };
        self.text.clear();
        self.emit(flow)
    }

    fn append_lead<H: ErrorHandler>(&mut self, unit: u8, next: Phase, errors: &mut H) -> Step {
        match chars::hex_value(unit) {
            Some(v) => {
                self.lead = self.lead * 16 + v;
                self.phase = next;
                Ok(())
            }
            None => self.fault(ErrorKind::InvalidHexEscapeSequence, errors),
        }
    }

    fn append_trail<H: ErrorHandler>(&mut self, unit: u8, next: Phase, errors: &mut H) -> Step {
        match chars::hex_value(unit) {
            Some(v) => {
                self.trail = self.trail * 16 + v;
                self.phase = next;
                Ok(())
            }
            None => self.fault(ErrorKind::InvalidHexEscapeSequence, errors),
        }
    }

    fn end_integer<S: EventSink, H: ErrorHandler>(
        &mut self,
        sink: &mut S,
        errors: &mut H,
    ) -> Step {
        self.phase = Phase::Ok;
        match self.number.finish_integer() {
            Ok(n) => self.emit_number(n, sink),
            Err(()) => {
                self.fault(ErrorKind::InvalidNumber, errors)?;
                self.emit(sink.null(&self.context()))
            }
        }
    }

    fn end_decimal<S: EventSink, H: ErrorHandler>(
        &mut self,
        sink: &mut S,
        errors: &mut H,
    ) -> Step {
        self.phase = Phase::Ok;
        match self.number.finish_decimal() {
            Ok(n) => self.emit_number(n, sink),
            Err(()) => {
                self.fault(ErrorKind::InvalidNumber, errors)?;
                self.emit(sink.null(&self.context()))
            }
        }
    }

    fn emit_number<S: EventSink>(&mut self, number: Number, sink: &mut S) -> Step {
        let ctx = self.context();
        let flow = match number {
            Number::Unsigned(v) => sink.unsigned_integer(v, &ctx),
            Number::Signed(v) => sink.signed_integer(v, &ctx),
            Number::Float(v) => sink.floating(v, &ctx),
        };
        self.emit(flow)
    }

    fn emit(&self, flow: Flow) -> Step {
        match flow {
            Flow::Continue => Ok(()),
            Flow::Abort => Err(Halt::Aborted),
        }
    }

    /// Reports a condition to the handler. Recoverable conditions resume
    /// with the next unit when the handler answers `Continue`; structural
    /// ones fail regardless.
    fn fault<H: ErrorHandler>(&mut self, kind: ErrorKind, errors: &mut H) -> Step {
        let decision = errors.handle(kind, &self.context());
        if kind.is_fatal() || decision == Flow::Abort {
            Err(Halt::Fatal(ParseError {
                kind,
                line: self.line,
                column: self.column,
            }))
        } else {
            Ok(())
        }
    }

    // ------------------------------------------------------------------
    // lookahead
    // ------------------------------------------------------------------

    /// Counts the direct children of the array that just opened, scanning
    /// only the bytes still buffered.
    ///
    /// The walk drives the same transition table with a local phase and
    /// suppresses events, scratch writes, and diagnostics; the mode stack
    /// is borrowed for nesting bookkeeping and restored before returning.
    /// The count stops at the matching `]`, at the end of the buffer, or at
    /// the first structural error, so it can only undershoot.
    #[allow(clippy::too_many_lines)]
    fn estimate_capacity(&mut self, rest: &[u8]) -> usize {
        use Phase::{
            Array, Colon, Escape, Exp1, Exp2, Exp3, F, Fa, Fal, Fals, Fraction, Integer, Key,
            Minus, N, Nu, Nul, Object, Ok, Slash, SlashSlash, SlashStar, SlashStarStar, Str, T,
            Tr, Tru, Value, Zero, U1, U2, U3, U4,
        };

        let start_depth = self.stack.depth();
        let start_mode = self.stack.top_mode();
        let mut phase = self.phase;
        let mut saved = self.saved_phase;
        let mut count = 0usize;
        let mut done = false;

        for &unit in rest {
            if done {
                break;
            }
            match phase {
                Array | Value => match unit {
                    u if chars::is_whitespace(u) => {}
                    b'{' => {
                        if self.stack.push(Mode::ExpectKey) {
                            phase = Object;
                        } else {
                            done = true;
                        }
                    }
                    b'[' => {
                        if self.stack.push(Mode::Array) {
                            phase = Array;
                        } else {
                            done = true;
                        }
                    }
                    b']' if phase == Array => {
                        if self.stack.depth() == start_depth || !self.stack.pop(Mode::Array) {
                            done = true;
                        } else {
                            phase = Ok;
                            if self.stack.depth() == start_depth {
                                count += 1;
                            }
                        }
                    }
                    b'"' => phase = Str,
                    b'/' => {
                        saved = phase;
                        phase = Slash;
                    }
                    b'-' => phase = Minus,
                    b'0' => phase = Zero,
                    b'1'..=b'9' => phase = Integer,
                    b't' => phase = T,
                    b'f' => phase = F,
                    b'n' => phase = N,
                    _ => done = true,
                },

                Ok => match unit {
                    u if chars::is_whitespace(u) => {}
                    b'}' => {
                        if self.stack.depth() == start_depth
                            || !self.stack.pop(Mode::ExpectValue)
                        {
                            done = true;
                        } else {
                            phase = Ok;
                            if self.stack.depth() == start_depth {
                                count += 1;
                            }
                        }
                    }
                    b']' => {
                        if self.stack.depth() == start_depth || !self.stack.pop(Mode::Array) {
                            done = true;
                        } else {
                            phase = Ok;
                            if self.stack.depth() == start_depth {
                                count += 1;
                            }
                        }
                    }
                    b',' => match self.stack.top_mode() {
                        Some(Mode::ExpectValue) => {
                            self.stack.flip(Mode::ExpectValue, Mode::ExpectKey);
                            phase = Key;
                        }
                        Some(Mode::Array) => phase = Value,
                        _ => done = true,
                    },
                    b'/' => {
                        saved = phase;
                        phase = Slash;
                    }
                    _ => done = true,
                },

                Object => match unit {
                    u if chars::is_whitespace(u) => {}
                    b'}' => {
                        if self.stack.depth() == start_depth || !self.stack.pop(Mode::ExpectKey)
                        {
                            done = true;
                        } else {
                            phase = Ok;
                            if self.stack.depth() == start_depth {
                                count += 1;
                            }
                        }
                    }
                    b'"' => phase = Str,
                    b'/' => {
                        saved = phase;
                        phase = Slash;
                    }
                    _ => done = true,
                },

                Key => match unit {
                    u if chars::is_whitespace(u) => {}
                    b'"' => phase = Str,
                    b'/' => {
                        saved = phase;
                        phase = Slash;
                    }
                    _ => done = true,
                },

                Colon => match unit {
                    u if chars::is_whitespace(u) => {}
                    b':' => {
                        if self.stack.flip(Mode::ExpectKey, Mode::ExpectValue) {
                            phase = Value;
                        } else {
                            done = true;
                        }
                    }
                    b'/' => {
                        saved = phase;
                        phase = Slash;
                    }
                    _ => done = true,
                },

                Str => match unit {
                    b'\n' | b'\r' | b'\t' => done = true,
                    b'\\' => phase = Escape,
                    b'"' => match self.stack.top_mode() {
                        Some(Mode::ExpectKey) => phase = Colon,
                        Some(Mode::Array | Mode::ExpectValue) => {
                            if self.stack.depth() == start_depth {
                                count += 1;
                            }
                            phase = Ok;
                        }
                        _ => done = true,
                    },
                    _ => {}
                },

                Escape => match unit {
                    b'"' | b'\\' | b'/' | b'b' | b'f' | b'n' | b'r' | b't' => phase = Str,
                    b'u' => phase = U1,
                    _ => done = true,
                },
                U1 => phase = U2,
                U2 => phase = U3,
                U3 => phase = U4,
                U4 => phase = Str,

                Minus => match unit {
                    b'0' => phase = Zero,
                    b'1'..=b'9' => phase = Integer,
                    _ => done = true,
                },

                Zero | Integer | Fraction | Exp3 => match unit {
                    u if chars::is_whitespace(u) => {
                        if self.stack.depth() == start_depth {
                            count += 1;
                        }
                        phase = Ok;
                    }
                    b',' => {
                        if self.stack.depth() == start_depth {
                            count += 1;
                        }
                        match self.stack.top_mode() {
                            Some(Mode::ExpectValue) => {
                                self.stack.flip(Mode::ExpectValue, Mode::ExpectKey);
                                phase = Key;
                            }
                            Some(Mode::Array) => phase = Value,
                            _ => done = true,
                        }
                    }
                    b'}' => {
                        if self.stack.depth() == start_depth {
                            // the pending literal is a direct child; the
                            // bracket would close the scanned container
                            count += 1;
                            done = true;
                        } else if self.stack.pop(Mode::ExpectValue) {
                            phase = Ok;
                            if self.stack.depth() == start_depth {
                                count += 1;
                            }
                        } else {
                            done = true;
                        }
                    }
                    b']' => {
                        if self.stack.depth() == start_depth {
                            count += 1;
                            done = true;
                        } else if self.stack.pop(Mode::Array) {
                            phase = Ok;
                            if self.stack.depth() == start_depth {
                                count += 1;
                            }
                        } else {
                            done = true;
                        }
                    }
                    b'0'..=b'9' => {}
                    b'.' if matches!(phase, Zero | Integer) => phase = Fraction,
                    b'e' | b'E' if matches!(phase, Zero | Integer | Fraction) => phase = Exp1,
                    _ => done = true,
                },

                Exp1 => match unit {
                    b'+' | b'-' => phase = Exp2,
                    b'0'..=b'9' => phase = Exp3,
                    _ => done = true,
                },
                Exp2 => match unit {
                    b'0'..=b'9' => phase = Exp3,
                    _ => done = true,
                },

                T => match unit {
                    b'r' => phase = Tr,
                    _ => done = true,
                },
                Tr => match unit {
                    b'u' => phase = Tru,
                    _ => done = true,
                },
                Tru => match unit {
                    b'e' => {
                        if self.stack.depth() == start_depth {
                            count += 1;
                        }
                        phase = Ok;
                    }
                    _ => done = true,
                },
                F => match unit {
                    b'a' => phase = Fa,
                    _ => done = true,
                },
                Fa => match unit {
                    b'l' => phase = Fal,
                    _ => done = true,
                },
                Fal => match unit {
                    b's' => phase = Fals,
                    _ => done = true,
                },
                Fals => match unit {
                    b'e' => {
                        if self.stack.depth() == start_depth {
                            count += 1;
                        }
                        phase = Ok;
                    }
                    _ => done = true,
                },
                N => match unit {
                    b'u' => phase = Nu,
                    _ => done = true,
                },
                Nu => match unit {
                    b'l' => phase = Nul,
                    _ => done = true,
                },
                Nul => match unit {
                    b'l' => {
                        if self.stack.depth() == start_depth {
                            count += 1;
                        }
                        phase = Ok;
                    }
                    _ => done = true,
                },

                Slash => match unit {
                    b'*' => phase = SlashStar,
                    b'/' => phase = SlashSlash,
                    _ => done = true,
                },
                SlashSlash => {
                    if matches!(unit, b'\n' | b'\r') {
                        phase = saved;
                    }
                }
                SlashStar => {
                    if unit == b'*' {
                        phase = SlashStarStar;
                    }
                }
                SlashStarStar => {
                    phase = if unit == b'/' { saved } else { SlashStar };
                }

                _ => done = true,
            }
        }

        self.stack.truncate(start_depth);
        if let Some(mode) = start_mode {
            self.stack.restore_top_mode(mode);
        }
        count
    }
}

/// Pending-string bytes as text. Escape decoding always appends valid
/// UTF-8, so this borrows unless the raw input itself was not UTF-8.
fn decode_scratch(scratch: &[u8]) -> Cow<'_, str> {
    String::from_utf8_lossy(scratch)
}
