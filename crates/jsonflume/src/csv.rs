//! Tabular output from the event stream.
//!
//! [`CsvEmitter`] is an [`EventSink`] that renders an array of records —
//! objects or arrays, two levels of nesting — as delimited text. Object
//! records are matched against a header established by the first record
//! (or preconfigured), with empty cells for missing fields; anything
//! nested deeper than a record is ignored.

use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt::{self, Write};

use crate::event::{Context, EventSink, Flow};

/// When fields get wrapped in the quote character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum QuoteStyle {
    /// Quote every field.
    All,
    /// Quote everything that is not a number.
    NonNumeric,
    /// Quote only fields containing the field delimiter or the quote
    /// character.
    #[default]
    Minimal,
    /// Never quote; fields are written raw.
    None,
}

/// Output configuration for [`CsvEmitter`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CsvOptions {
    /// Separator between fields. Default `,`.
    pub field_delimiter: char,
    /// Separator between records. Default `\n`.
    pub line_delimiter: String,
    /// Default `"`.
    pub quote_char: char,
    /// Written before an embedded quote character. Default `"`, giving
    /// RFC 4180 doubling.
    pub quote_escape_char: char,
    pub quote_style: QuoteStyle,
    /// Fixes the header up front. When empty, the first record drives it.
    pub column_names: Vec<String>,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            field_delimiter: ',',
            line_delimiter: "\n".into(),
            quote_char: '"',
            quote_escape_char: '"',
            quote_style: QuoteStyle::Minimal,
            column_names: Vec::new(),
        }
    }
}

/// One rendered field, kept until its record completes so object records
/// can be reordered against the header.
#[derive(Debug)]
struct Cell {
    text: String,
    numeric: bool,
}

/// Event sink producing delimited text on a [`core::fmt::Write`] target.
///
/// Rows are written as records complete; the header row (when there is
/// one) is written just before the first record's row. A write failure
/// makes the sink answer [`Flow::Abort`] and is surfaced by
/// [`finish`](CsvEmitter::finish).
#[derive(Debug)]
pub struct CsvEmitter<W> {
    out: W,
    options: CsvOptions,
    depth: usize,
    root_is_array: bool,
    record_open: bool,
    record_is_object: bool,
    current_key: Option<String>,
    named: Vec<(String, Cell)>,
    plain: Vec<Cell>,
    columns: Vec<String>,
    records_written: usize,
    write_error: Option<fmt::Error>,
}

impl<W: Write> CsvEmitter<W> {
    pub fn new(out: W, options: CsvOptions) -> Self {
        Self {
            out,
            options,
            depth: 0,
            root_is_array: false,
            record_open: false,
            record_is_object: false,
            current_key: None,
            named: Vec::new(),
            plain: Vec::new(),
            columns: Vec::new(),
            records_written: 0,
            write_error: None,
        }
    }

    /// Returns the writer, or the first write failure the sink swallowed.
    ///
    /// # Errors
    ///
    /// The stored `fmt::Error` when any row failed to write.
    pub fn finish(self) -> Result<W, fmt::Error> {
        match self.write_error {
            None => Ok(self.out),
            Some(err) => Err(err),
        }
    }

    fn flow(&self) -> Flow {
        if self.write_error.is_some() {
            Flow::Abort
        } else {
            Flow::Continue
        }
    }

    fn put(&mut self, text: &str) {
        if self.write_error.is_none() {
            if let Err(err) = self.out.write_str(text) {
                self.write_error = Some(err);
            }
        }
    }

    fn put_char(&mut self, ch: char) {
        if self.write_error.is_none() {
            if let Err(err) = self.out.write_char(ch) {
                self.write_error = Some(err);
            }
        }
    }

    fn needs_quote(&self, text: &str, numeric: bool) -> bool {
        match self.options.quote_style {
            QuoteStyle::All => true,
            QuoteStyle::NonNumeric => !numeric,
            QuoteStyle::Minimal => {
                text.contains(self.options.field_delimiter) || text.contains(self.options.quote_char)
            }
            QuoteStyle::None => false,
        }
    }

    fn write_cell(&mut self, text: &str, numeric: bool) {
        if !self.needs_quote(text, numeric) {
            self.put(text);
            return;
        }
        self.put_char(self.options.quote_char);
        let quote = self.options.quote_char;
        let escape = self.options.quote_escape_char;
        for ch in text.chars() {
            if ch == quote {
                self.put_char(escape);
            }
            self.put_char(ch);
        }
        self.put_char(self.options.quote_char);
    }

    /// Do events land directly inside the current record?
    fn inside_record(&self) -> bool {
        self.record_open && self.root_is_array && self.depth == 2
    }

    fn open_record(&mut self, is_object: bool) {
        self.record_open = true;
        self.record_is_object = is_object;
        self.current_key = None;
        self.named.clear();
        self.plain.clear();
    }

    fn accept(&mut self, cell: Cell) {
        if self.record_is_object {
            let name = self.current_key.take().unwrap_or_default();
            self.named.push((name, cell));
        } else {
            self.plain.push(cell);
        }
    }

    fn close_record(&mut self) {
        self.record_open = false;
        if self.records_written == 0 {
            if self.columns.is_empty() && self.record_is_object {
                self.columns = self.named.iter().map(|(name, _)| name.clone()).collect();
            }
            if !self.columns.is_empty() {
                self.write_header();
            }
        }
        self.write_row();
        self.records_written += 1;
    }

    fn write_header(&mut self) {
        let columns = core::mem::take(&mut self.columns);
        for (i, name) in columns.iter().enumerate() {
            if i > 0 {
                self.put_char(self.options.field_delimiter);
            }
            self.write_cell(name, false);
        }
        self.columns = columns;
        let line = self.options.line_delimiter.clone();
        self.put(&line);
    }

    fn write_row(&mut self) {
        if self.record_is_object {
            let columns = core::mem::take(&mut self.columns);
            let named = core::mem::take(&mut self.named);
            for (i, column) in columns.iter().enumerate() {
                if i > 0 {
                    self.put_char(self.options.field_delimiter);
                }
                if let Some((_, cell)) = named.iter().find(|(name, _)| name == column) {
                    self.write_cell(&cell.text, cell.numeric);
                }
            }
            self.columns = columns;
            self.named = named;
        } else {
            let plain = core::mem::take(&mut self.plain);
            for (i, cell) in plain.iter().enumerate() {
                if i > 0 {
                    self.put_char(self.options.field_delimiter);
                }
                self.write_cell(&cell.text, cell.numeric);
            }
            self.plain = plain;
        }
        let line = self.options.line_delimiter.clone();
        self.put(&line);
    }
}

impl<W: Write> EventSink for CsvEmitter<W> {
    fn begin_document(&mut self, _: &Context) {
        self.depth = 0;
        self.root_is_array = false;
        self.record_open = false;
        self.current_key = None;
        self.named.clear();
        self.plain.clear();
        self.columns = self.options.column_names.clone();
        self.records_written = 0;
    }

    fn begin_array(&mut self, _hint: usize, _: &Context) -> Flow {
        if self.depth == 0 {
            self.root_is_array = true;
        }
        self.depth += 1;
        if self.root_is_array && self.depth == 2 {
            self.open_record(false);
        } else if self.depth == 3 && self.record_open {
            // a nested container consumes the pending member key
            self.current_key = None;
        }
        self.flow()
    }

    fn end_array(&mut self, _: &Context) -> Flow {
        if self.inside_record() && !self.record_is_object {
            self.close_record();
        }
        self.depth = self.depth.saturating_sub(1);
        self.flow()
    }

    fn begin_object(&mut self, _hint: usize, _: &Context) -> Flow {
        self.depth += 1;
        if self.root_is_array && self.depth == 2 {
            self.open_record(true);
        } else if self.depth == 3 && self.record_open {
            self.current_key = None;
        }
        self.flow()
    }

    fn end_object(&mut self, _: &Context) -> Flow {
        if self.inside_record() && self.record_is_object {
            self.close_record();
        }
        self.depth = self.depth.saturating_sub(1);
        self.flow()
    }

    fn key(&mut self, name: &str, _: &Context) -> Flow {
        if self.inside_record() {
            self.current_key = Some(name.to_string());
        }
        self.flow()
    }

    fn string(&mut self, value: &str, _: &Context) -> Flow {
        if self.inside_record() {
            self.accept(Cell {
                text: value.to_string(),
                numeric: false,
            });
        }
        self.flow()
    }

    fn unsigned_integer(&mut self, value: u64, _: &Context) -> Flow {
        if self.inside_record() {
            self.accept(Cell {
                text: itoa::Buffer::new().format(value).to_string(),
                numeric: true,
            });
        }
        self.flow()
    }

    fn signed_integer(&mut self, value: i64, _: &Context) -> Flow {
        if self.inside_record() {
            self.accept(Cell {
                text: itoa::Buffer::new().format(value).to_string(),
                numeric: true,
            });
        }
        self.flow()
    }

    fn floating(&mut self, value: f64, _: &Context) -> Flow {
        if self.inside_record() {
            self.accept(Cell {
                text: ryu::Buffer::new().format(value).to_string(),
                numeric: true,
            });
        }
        self.flow()
    }

    fn boolean(&mut self, value: bool, _: &Context) -> Flow {
        if self.inside_record() {
            self.accept(Cell {
                text: if value { "true" } else { "false" }.to_string(),
                numeric: false,
            });
        }
        self.flow()
    }

    fn null(&mut self, _: &Context) -> Flow {
        if self.inside_record() {
            self.accept(Cell {
                text: "null".to_string(),
                numeric: false,
            });
        }
        self.flow()
    }
}
