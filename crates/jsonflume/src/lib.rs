//! A push-style streaming parser for JSON with embedded comments, plus a
//! CSV emitter fed by the same event stream.
//!
//! The parser is a byte-driven state machine: it consumes arbitrarily
//! fragmented input buffers, delivers structural and scalar events to a
//! caller-supplied [`EventSink`], and tracks line/column diagnostics the
//! whole way. A bounded lookahead estimates array cardinality so consumers
//! can preallocate.
//!
//! # Examples
//!
//! ```rust
//! use jsonflume::{FailFast, ParserOptions, Reader, SliceProducer};
//!
//! struct Count(usize);
//!
//! impl jsonflume::EventSink for Count {
//!     fn unsigned_integer(&mut self, _: u64, _: &jsonflume::Context) -> jsonflume::Flow {
//!         self.0 += 1;
//!         jsonflume::Flow::Continue
//!     }
//! }
//!
//! let mut sink = Count(0);
//! let mut reader = Reader::new(SliceProducer::new(b"[1, 2, 3]"), ParserOptions::default());
//! reader.read(&mut sink, &mut FailFast).unwrap();
//! assert_eq!(sink.0, 3);
//! ```

#![no_std]
extern crate alloc;

#[cfg(any(test, feature = "std"))]
extern crate std;

mod chars;
mod csv;
mod error;
mod event;
mod modes;
mod numbers;
mod options;
mod reader;
mod scanner;

pub use csv::{CsvEmitter, CsvOptions, QuoteStyle};
pub use error::{ErrorHandler, ErrorKind, FailFast, ParseError};
pub use event::{Context, EventSink, Flow};
pub use options::ParserOptions;
pub use reader::{Fill, Producer, Reader, SliceProducer};
#[cfg(feature = "std")]
pub use reader::IoProducer;
pub use scanner::{Parser, Status};
