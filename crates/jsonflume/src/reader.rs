//! The driver loop: pulls chunks from a producer and pushes them through
//! the state machine.

use alloc::vec;
use alloc::vec::Vec;

use crate::error::{ErrorHandler, ParseError};
use crate::event::EventSink;
use crate::options::ParserOptions;
use crate::scanner::{Parser, Status};

/// Result of one producer read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fill {
    /// Units written to the front of the buffer.
    pub len: usize,
    /// Whether the producer is exhausted. A zero-length fill without `eof`
    /// is permitted but wasteful; the driver just asks again.
    pub eof: bool,
}

/// Source of input chunks for a [`Reader`].
pub trait Producer {
    fn read(&mut self, buf: &mut [u8]) -> Fill;
}

/// Serves a borrowed byte slice one buffer at a time.
#[derive(Debug)]
pub struct SliceProducer<'a> {
    rest: &'a [u8],
}

impl<'a> SliceProducer<'a> {
    #[must_use]
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { rest: bytes }
    }
}

impl Producer for SliceProducer<'_> {
    fn read(&mut self, buf: &mut [u8]) -> Fill {
        let n = self.rest.len().min(buf.len());
        buf[..n].copy_from_slice(&self.rest[..n]);
        self.rest = &self.rest[n..];
        Fill {
            len: n,
            eof: self.rest.is_empty(),
        }
    }
}

/// Adapts any [`std::io::Read`] into a [`Producer`].
///
/// Read errors are reported as end of input; the machine then surfaces
/// them as `unexpected_eof` through the error handler.
#[cfg(feature = "std")]
#[derive(Debug)]
pub struct IoProducer<R> {
    inner: R,
}

#[cfg(feature = "std")]
impl<R: std::io::Read> IoProducer<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

#[cfg(feature = "std")]
impl<R: std::io::Read> Producer for IoProducer<R> {
    fn read(&mut self, buf: &mut [u8]) -> Fill {
        match self.inner.read(buf) {
            Ok(0) | Err(_) => Fill { len: 0, eof: true },
            Ok(n) => Fill { len: n, eof: false },
        }
    }
}

/// Drives a [`Parser`] over a [`Producer`]'s output.
///
/// One call to [`read`](Reader::read) parses one document: the sink sees
/// `begin_document`, the event stream, and `end_document` — the last on
/// every exit path, including cancellation and fatal errors.
#[derive(Debug)]
pub struct Reader<P> {
    producer: P,
    parser: Parser,
    buffer: Vec<u8>,
}

impl<P: Producer> Reader<P> {
    #[must_use]
    pub fn new(producer: P, options: ParserOptions) -> Self {
        Self {
            producer,
            parser: Parser::new(&options),
            buffer: vec![0; options.buffer_capacity.max(1)],
        }
    }

    /// Parses one document from the producer.
    ///
    /// The scanner resets on entry, so a reader may be reused for another
    /// document by swapping the producer state it wraps.
    ///
    /// # Errors
    ///
    /// The first condition the error handler refused to recover from, or a
    /// structural condition. `end_document` has already been delivered
    /// when this returns.
    pub fn read<S: EventSink, H: ErrorHandler>(
        &mut self,
        sink: &mut S,
        errors: &mut H,
    ) -> Result<(), ParseError> {
        self.parser.reset();
        sink.begin_document(&self.parser.context());
        let outcome = self.drive(sink, errors);
        sink.end_document(&self.parser.context());
        outcome
    }

    fn drive<S: EventSink, H: ErrorHandler>(
        &mut self,
        sink: &mut S,
        errors: &mut H,
    ) -> Result<(), ParseError> {
        loop {
            let fill = self.producer.read(&mut self.buffer);
            if fill.len > 0 {
                let chunk = &self.buffer[..fill.len];
                match self.parser.advance(chunk, sink, errors)? {
                    Status::More => {}
                    Status::Done | Status::Aborted => return Ok(()),
                }
            }
            if fill.eof {
                break;
            }
        }
        self.parser.finish(sink, errors).map(|_| ())
    }

    /// The wrapped producer, for reuse after a document completes.
    pub fn into_inner(self) -> P {
        self.producer
    }
}
