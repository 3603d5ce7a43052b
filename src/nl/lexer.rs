//! Position-tracked tokenizer for NL input.
//!
//! The header of an NL file is always text. The body is text for `g` files
//! and fixed-width binary for `b` files, in either the reader's own byte
//! order or the opposite one. [`TokenReader`] hides that difference from the
//! segment parser.

use std::marker::PhantomData;

use byteorder::{ByteOrder, NativeEndian};

use crate::error::NlError;
use crate::error::Result;

/// Byte order opposite to the host's, used for byte-swapped binary bodies.
#[cfg(target_endian = "little")]
pub type SwappedEndian = byteorder::BigEndian;

/// Byte order opposite to the host's, used for byte-swapped binary bodies.
#[cfg(target_endian = "big")]
pub type SwappedEndian = byteorder::LittleEndian;

/// A 1-based position in the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    /// Line number (1-indexed). In binary bodies, the record number.
    pub line: usize,
    /// Column number (1-indexed). In binary bodies, the byte within the record.
    pub column: usize,
}

/// Walks a byte sequence and keeps track of line and column.
#[derive(Debug, Clone, Copy)]
pub struct Cursor<'a> {
    input: &'a [u8],
    source_name: &'a str,
    pos: usize,
    line: usize,
    line_start: usize,
}

impl<'a> Cursor<'a> {
    /// Create a cursor at the start of `input`.
    pub fn new(input: &'a [u8], source_name: &'a str) -> Self {
        Self {
            input,
            source_name,
            pos: 0,
            line: 1,
            line_start: 0,
        }
    }

    pub fn source_name(&self) -> &'a str {
        self.source_name
    }

    pub fn position(&self) -> Position {
        Position {
            line: self.line,
            column: self.pos - self.line_start + 1,
        }
    }

    pub fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    pub fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    /// Consume one byte, starting a new line after `\n`.
    pub fn advance(&mut self) -> Option<u8> {
        let byte = self.peek()?;
        self.pos += 1;
        if byte == b'\n' {
            self.line += 1;
            self.line_start = self.pos;
        }
        Some(byte)
    }

    /// Consume `len` raw bytes without line bookkeeping.
    pub fn take(&mut self, len: usize) -> Option<&'a [u8]> {
        let end = self.pos.checked_add(len)?;
        let bytes = self.input.get(self.pos..end)?;
        self.pos = end;
        Some(bytes)
    }

    /// Start a new record: the next byte is reported at column 1 of the
    /// following line, unless nothing was consumed on the current one.
    pub fn begin_record(&mut self) {
        if self.pos != self.line_start {
            self.line += 1;
            self.line_start = self.pos;
        }
    }

    pub fn syntax_error(&self, at: Position, message: impl Into<String>) -> NlError {
        NlError::syntax(self.source_name, at.line, at.column, message)
    }

    pub fn semantic_error(&self, at: Position, message: impl Into<String>) -> NlError {
        NlError::semantic(self.source_name, at.line, at.column, message)
    }
}

/// Primitive tokens of an NL body, independent of its encoding.
pub trait TokenReader {
    fn cursor(&self) -> &Cursor<'_>;

    /// Prepare for the tag of a new segment.
    fn begin_segment(&mut self);

    /// Position of the next token, skipping any separator in front of it.
    fn token_position(&mut self) -> Position;

    /// Read a single tag byte, or `None` at end of input.
    fn read_char(&mut self) -> Option<u8>;

    fn read_nonnegative_integer(&mut self) -> Result<i32>;

    fn read_integer(&mut self) -> Result<i32>;

    fn read_real(&mut self) -> Result<f64>;

    /// Payload of an `s` literal.
    fn read_short(&mut self) -> Result<i32>;

    /// Payload of an `l` literal.
    fn read_long(&mut self) -> Result<i32>;

    /// Name of a function or suffix.
    fn read_name(&mut self) -> Result<String>;

    /// Payload of an `h` string literal.
    fn read_string(&mut self) -> Result<String>;

    /// Discard the remainder of the current text line.
    fn skip_to_next_line(&mut self);

    fn position(&self) -> Position {
        self.cursor().position()
    }

    fn syntax_error(&self, at: Position, message: impl Into<String>) -> NlError {
        self.cursor().syntax_error(at, message)
    }

    fn semantic_error(&self, at: Position, message: impl Into<String>) -> NlError {
        self.cursor().semantic_error(at, message)
    }
}

/// Reader for the text encoding (the header and `g` bodies).
#[derive(Debug, Clone)]
pub struct TextReader<'a> {
    cursor: Cursor<'a>,
}

impl<'a> TextReader<'a> {
    pub fn new(input: &'a [u8], source_name: &'a str) -> Self {
        Self {
            cursor: Cursor::new(input, source_name),
        }
    }

    pub fn from_cursor(cursor: Cursor<'a>) -> Self {
        Self { cursor }
    }

    pub fn into_cursor(self) -> Cursor<'a> {
        self.cursor
    }

    pub fn skip_space(&mut self) {
        while matches!(self.cursor.peek(), Some(b' ' | b'\t')) {
            self.cursor.advance();
        }
    }

    /// Read an unsigned digit sequence, or `None` if there is no digit here.
    fn read_digits(&mut self, start: Position) -> Result<Option<i32>> {
        let mut value: Option<i32> = None;
        while let Some(byte @ b'0'..=b'9') = self.cursor.peek() {
            let digit = i32::from(byte - b'0');
            value = Some(
                value
                    .unwrap_or(0)
                    .checked_mul(10)
                    .and_then(|v| v.checked_add(digit))
                    .ok_or_else(|| self.cursor.syntax_error(start, "number is too big"))?,
            );
            self.cursor.advance();
        }
        Ok(value)
    }

    /// Read a nonnegative integer if one starts here.
    pub fn read_optional_nonnegative_integer(&mut self) -> Result<Option<i32>> {
        self.skip_space();
        let start = self.cursor.position();
        self.read_digits(start)
    }

    /// Read a signed integer if one starts here; nothing is consumed otherwise.
    pub fn read_optional_integer(&mut self) -> Result<Option<i32>> {
        self.skip_space();
        let saved = self.cursor;
        match self.read_signed()? {
            Some(value) => Ok(Some(value)),
            None => {
                self.cursor = saved;
                Ok(None)
            }
        }
    }

    /// Read a real number if one starts here; nothing is consumed otherwise.
    pub fn read_optional_real(&mut self) -> Option<f64> {
        self.skip_space();
        let saved = self.cursor;
        let value = self.scan_real();
        if value.is_none() {
            self.cursor = saved;
        }
        value
    }

    fn read_signed(&mut self) -> Result<Option<i32>> {
        let start = self.cursor.position();
        let negative = match self.cursor.peek() {
            Some(b'-') => {
                self.cursor.advance();
                true
            }
            Some(b'+') => {
                self.cursor.advance();
                false
            }
            _ => false,
        };
        let value = self.read_digits(start)?;
        Ok(value.map(|v| if negative { -v } else { v }))
    }

    fn skip_digits(&mut self) -> bool {
        let mut any = false;
        while matches!(self.cursor.peek(), Some(b'0'..=b'9')) {
            self.cursor.advance();
            any = true;
        }
        any
    }

    /// Scan `[+-](digits[.digits]|.digits)[(e|E)[+-]digits]` or `[+-]Infinity`.
    fn scan_real(&mut self) -> Option<f64> {
        let begin = self.cursor;
        if matches!(self.cursor.peek(), Some(b'-' | b'+')) {
            self.cursor.advance();
        }
        if self.cursor.peek() == Some(b'I') {
            let word = self.cursor.take(b"Infinity".len())?;
            if word != b"Infinity" {
                return None;
            }
        } else {
            let mut has_digits = self.skip_digits();
            if self.cursor.peek() == Some(b'.') {
                self.cursor.advance();
                has_digits |= self.skip_digits();
            }
            if !has_digits {
                return None;
            }
            if matches!(self.cursor.peek(), Some(b'e' | b'E')) {
                let mantissa_end = self.cursor;
                self.cursor.advance();
                if matches!(self.cursor.peek(), Some(b'-' | b'+')) {
                    self.cursor.advance();
                }
                if !self.skip_digits() {
                    self.cursor = mantissa_end;
                }
            }
        }
        let text = std::str::from_utf8(&begin.input[begin.pos..self.cursor.pos]).ok()?;
        match text {
            "Infinity" | "+Infinity" => Some(f64::INFINITY),
            "-Infinity" => Some(f64::NEG_INFINITY),
            _ => text.parse().ok(),
        }
    }
}

impl TokenReader for TextReader<'_> {
    fn cursor(&self) -> &Cursor<'_> {
        &self.cursor
    }

    // Blank lines between segments carry nothing.
    fn begin_segment(&mut self) {
        while matches!(self.cursor.peek(), Some(b' ' | b'\t' | b'\r' | b'\n')) {
            self.cursor.advance();
        }
    }

    fn token_position(&mut self) -> Position {
        self.skip_space();
        self.cursor.position()
    }

    fn read_char(&mut self) -> Option<u8> {
        self.cursor.advance()
    }

    fn read_nonnegative_integer(&mut self) -> Result<i32> {
        let start = self.token_position();
        self.read_digits(start)?
            .ok_or_else(|| self.cursor.syntax_error(start, "expected nonnegative integer"))
    }

    fn read_integer(&mut self) -> Result<i32> {
        let start = self.token_position();
        self.read_signed()?
            .ok_or_else(|| self.cursor.syntax_error(start, "expected integer"))
    }

    fn read_real(&mut self) -> Result<f64> {
        let start = self.token_position();
        self.scan_real()
            .ok_or_else(|| self.cursor.syntax_error(start, "expected double"))
    }

    // Only the leading integer part is read; the rest of the line is skipped
    // by the caller.
    fn read_short(&mut self) -> Result<i32> {
        self.read_integer()
    }

    fn read_long(&mut self) -> Result<i32> {
        self.read_integer()
    }

    fn read_name(&mut self) -> Result<String> {
        let start = self.token_position();
        let mut name = Vec::new();
        while let Some(byte) = self.cursor.peek() {
            if byte.is_ascii_whitespace() {
                break;
            }
            name.push(byte);
            self.cursor.advance();
        }
        if name.is_empty() {
            return Err(self.cursor.syntax_error(start, "expected name"));
        }
        Ok(String::from_utf8_lossy(&name).into_owned())
    }

    fn read_string(&mut self) -> Result<String> {
        let len = self.read_nonnegative_integer()?;
        let colon = self.cursor.position();
        if self.cursor.advance() != Some(b':') {
            return Err(self.cursor.syntax_error(colon, "expected ':'"));
        }
        let mut bytes = Vec::new();
        for _ in 0..len {
            let at = self.cursor.position();
            let byte = self
                .cursor
                .advance()
                .ok_or_else(|| self.cursor.syntax_error(at, "unexpected end of input"))?;
            bytes.push(byte);
        }
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    fn skip_to_next_line(&mut self) {
        while let Some(byte) = self.cursor.advance() {
            if byte == b'\n' {
                break;
            }
        }
    }
}

/// Reader for fixed-width binary bodies in byte order `B`.
#[derive(Debug, Clone)]
pub struct BinaryReader<'a, B> {
    cursor: Cursor<'a>,
    order: PhantomData<B>,
}

/// Binary body written on a host with the reader's byte order.
pub type NativeBinaryReader<'a> = BinaryReader<'a, NativeEndian>;

/// Binary body written on a host with the opposite byte order.
pub type SwappedBinaryReader<'a> = BinaryReader<'a, SwappedEndian>;

impl<'a, B: ByteOrder> BinaryReader<'a, B> {
    /// Continue reading after the text header.
    pub fn from_cursor(cursor: Cursor<'a>) -> Self {
        Self {
            cursor,
            order: PhantomData,
        }
    }

    fn read_bytes(&mut self, len: usize, message: &str) -> Result<&'a [u8]> {
        let start = self.cursor.position();
        self.cursor
            .take(len)
            .ok_or_else(|| self.cursor.syntax_error(start, message))
    }
}

impl<B: ByteOrder> TokenReader for BinaryReader<'_, B> {
    fn cursor(&self) -> &Cursor<'_> {
        &self.cursor
    }

    fn begin_segment(&mut self) {
        self.cursor.begin_record();
    }

    fn token_position(&mut self) -> Position {
        self.cursor.position()
    }

    fn read_char(&mut self) -> Option<u8> {
        self.cursor.take(1).map(|bytes| bytes[0])
    }

    fn read_nonnegative_integer(&mut self) -> Result<i32> {
        let start = self.cursor.position();
        let value = B::read_i32(self.read_bytes(4, "expected nonnegative integer")?);
        if value < 0 {
            return Err(self.cursor.syntax_error(start, "expected nonnegative integer"));
        }
        Ok(value)
    }

    fn read_integer(&mut self) -> Result<i32> {
        Ok(B::read_i32(self.read_bytes(4, "expected integer")?))
    }

    fn read_real(&mut self) -> Result<f64> {
        Ok(B::read_f64(self.read_bytes(8, "expected double")?))
    }

    fn read_short(&mut self) -> Result<i32> {
        Ok(i32::from(B::read_i16(self.read_bytes(2, "expected integer")?)))
    }

    fn read_long(&mut self) -> Result<i32> {
        self.read_integer()
    }

    fn read_name(&mut self) -> Result<String> {
        self.read_string()
    }

    fn read_string(&mut self) -> Result<String> {
        let len = self.read_nonnegative_integer()?;
        let bytes = self.read_bytes(len as usize, "unexpected end of input")?;
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }

    fn skip_to_next_line(&mut self) {}
}
