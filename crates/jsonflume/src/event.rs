//! The event vocabulary delivered to sinks, and the diagnostics context
//! that travels with every call.

/// Answer returned by sinks and error handlers: keep going or stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Abort,
}

/// Read-only diagnostics snapshot passed to every sink and error-handler
/// call.
///
/// `line` is 1-based and `column` 0-based at the start of input; the
/// column advances for every consumed unit, and CR, LF, and CRLF each
/// count as one logical line break. The struct is `Copy` and built on the
/// caller's stack, so observing it never allocates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Context {
    /// Current line, starting at 1.
    pub line: u64,
    /// Current column; 0 before the first unit of a line is consumed.
    pub column: u64,
    /// Whether the producer has signalled end of input.
    pub eof: bool,
    /// The last code unit consumed.
    pub last_unit: u8,
    /// Lookahead count for the innermost open container; zero when nothing
    /// is open or the lookahead never ran. Advisory only.
    pub capacity_hint: usize,
}

/// Receiver for the parser's event stream.
///
/// Events arrive in strict document order on the caller's thread. String
/// and key payloads borrow the parser's scratch and are only valid for the
/// duration of the call. Every value-bearing method may answer
/// [`Flow::Abort`] to cancel the parse; the driver then delivers
/// `end_document` and returns without visiting the sink again.
///
/// All methods default to no-ops answering [`Flow::Continue`], so a sink
/// only implements what it cares about.
#[allow(unused_variables)]
pub trait EventSink {
    /// The document is about to be scanned.
    fn begin_document(&mut self, ctx: &Context) {}

    /// The document finished — normally, by cancellation, or after a fatal
    /// error. Always the last call a sink receives.
    fn end_document(&mut self, ctx: &Context) {}

    /// An object opened. Objects receive no lookahead, so `hint` is zero.
    fn begin_object(&mut self, hint: usize, ctx: &Context) -> Flow {
        Flow::Continue
    }

    fn end_object(&mut self, ctx: &Context) -> Flow {
        Flow::Continue
    }

    /// An array opened; `hint` is the lookahead's count of direct children
    /// visible in the current buffer. Never an over-estimate, often an
    /// under-estimate, safe to use for preallocation only.
    fn begin_array(&mut self, hint: usize, ctx: &Context) -> Flow {
        Flow::Continue
    }

    fn end_array(&mut self, ctx: &Context) -> Flow {
        Flow::Continue
    }

    /// An object member key, escapes already decoded.
    fn key(&mut self, name: &str, ctx: &Context) -> Flow {
        Flow::Continue
    }

    /// A string value, escapes already decoded.
    fn string(&mut self, value: &str, ctx: &Context) -> Flow {
        Flow::Continue
    }

    /// A non-negative integer that fits `u64`.
    fn unsigned_integer(&mut self, value: u64, ctx: &Context) -> Flow {
        Flow::Continue
    }

    /// A negative integer that fits `i64`.
    fn signed_integer(&mut self, value: i64, ctx: &Context) -> Flow {
        Flow::Continue
    }

    /// A number with a fraction or exponent, or an integer too wide for 64
    /// bits.
    fn floating(&mut self, value: f64, ctx: &Context) -> Flow {
        Flow::Continue
    }

    fn boolean(&mut self, value: bool, ctx: &Context) -> Flow {
        Flow::Continue
    }

    fn null(&mut self, ctx: &Context) -> Flow {
        Flow::Continue
    }
}
