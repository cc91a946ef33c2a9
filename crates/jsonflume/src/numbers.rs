//! Accumulation and narrowing of numeric literals.
//!
//! Digits (and `.`, `e`, exponent sign) collect in a small text scratch;
//! the leading minus is carried out-of-band as a flag. On termination the
//! literal converts to the narrowest event that can hold it: `u64` for
//! non-negative integers, `i64` for negative ones, `f64` for everything
//! with a fraction or exponent and for integers that overflow.

use alloc::string::String;

/// A finished numeric literal, already narrowed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Number {
    Unsigned(u64),
    Signed(i64),
    Float(f64),
}

#[derive(Debug, Default)]
pub(crate) struct NumberScratch {
    text: String,
    negative: bool,
}

impl NumberScratch {
    pub fn clear(&mut self) {
        self.text.clear();
        self.negative = false;
    }

    pub fn set_negative(&mut self) {
        self.negative = true;
    }

    pub fn is_negative(&self) -> bool {
        self.negative
    }

    pub fn push(&mut self, unit: u8) {
        self.text.push(unit as char);
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Converts a literal that contained only integer digits.
    ///
    /// Overflowing `u64`/`i64` falls back to binary64. `Err` means the
    /// scratch held nothing parseable, which the scanner reports as an
    /// invalid number.
    pub fn finish_integer(&mut self) -> Result<Number, ()> {
        let result = if self.negative {
            match parse_negative(self.text.as_bytes()) {
                Some(n) => Ok(Number::Signed(n)),
                None => self.text.parse::<f64>().map(|d| Number::Float(-d)).map_err(drop),
            }
        } else {
            match parse_unsigned(self.text.as_bytes()) {
                Some(n) => Ok(Number::Unsigned(n)),
                None => self.text.parse::<f64>().map(Number::Float).map_err(drop),
            }
        };
        self.clear();
        result
    }

    /// Converts a literal that contained a fraction or exponent.
    pub fn finish_decimal(&mut self) -> Result<Number, ()> {
        let result = match self.text.parse::<f64>() {
            Ok(d) if self.negative => Ok(Number::Float(-d)),
            Ok(d) => Ok(Number::Float(d)),
            Err(_) => Err(()),
        };
        self.clear();
        result
    }
}

/// Decimal accumulation with explicit overflow checks.
fn parse_unsigned(digits: &[u8]) -> Option<u64> {
    if digits.is_empty() {
        return None;
    }
    let mut n: u64 = 0;
    for &d in digits {
        n = n.checked_mul(10)?.checked_add(u64::from(d - b'0'))?;
    }
    Some(n)
}

/// Builds the value negatively from the start so `i64::MIN` parses.
fn parse_negative(digits: &[u8]) -> Option<i64> {
    if digits.is_empty() {
        return None;
    }
    let mut n: i64 = 0;
    for &d in digits {
        n = n.checked_mul(10)?.checked_sub(i64::from(d - b'0'))?;
    }
    Some(n)
}
