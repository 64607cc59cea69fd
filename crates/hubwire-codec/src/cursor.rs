use rmp::decode::{self, NumValueReadError, ValueReadError};
use rmp::Marker;

use crate::error::{DecodeError, Result};
use crate::marker::header_width;

/// Deepest container nesting [`Cursor::skip_value`] will walk.
pub const MAX_SKIP_DEPTH: usize = 64;

/// Forward-only reader over one received frame.
///
/// Primitives are parsed by `rmp` against the unread tail. A failed read
/// leaves the position untouched, so the cursor never ends up in the middle
/// of a primitive.
#[derive(Debug, Clone, Copy)]
pub struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    /// Create a cursor positioned at the start of `buf`.
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Offset of the next unread byte.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Number of unread bytes.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// True when every byte has been consumed.
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// The unread tail of the buffer.
    pub fn rest(&self) -> &'a [u8] {
        &self.buf[self.pos..]
    }

    /// Capacity to reserve for `count` declared elements.
    ///
    /// Every element takes at least one byte, so a count larger than the
    /// remaining input can never be satisfied and must not drive allocation.
    pub fn capacity_hint(&self, count: usize) -> usize {
        count.min(self.remaining())
    }

    /// Read an array header and return the declared element count.
    pub fn read_array_header(&mut self) -> Result<usize> {
        self.decode("array", |rd| decode::read_array_len(rd))
            .map(len_from_u32)
    }

    /// Read a map header and return the declared entry count.
    pub fn read_map_header(&mut self) -> Result<usize> {
        self.decode("map", |rd| decode::read_map_len(rd))
            .map(len_from_u32)
    }

    /// Read a UTF-8 string, borrowed from the buffer.
    pub fn read_str(&mut self) -> Result<&'a str> {
        self.transact(|c| {
            let len = c.decode("str", |rd| decode::read_str_len(rd))?;
            let bytes = c.take(len_from_u32(len))?;
            std::str::from_utf8(bytes).map_err(|err| DecodeError::InvalidUtf8 {
                valid_up_to: err.valid_up_to(),
            })
        })
    }

    /// Read a UTF-8 string into an owned `String`.
    pub fn read_string(&mut self) -> Result<String> {
        self.read_str().map(str::to_owned)
    }

    /// Read a binary blob, borrowed from the buffer.
    pub fn read_bytes(&mut self) -> Result<&'a [u8]> {
        self.transact(|c| {
            let len = c.decode("bin", |rd| decode::read_bin_len(rd))?;
            c.take(len_from_u32(len))
        })
    }

    /// Read any integer encoding whose value fits in an `i32`.
    pub fn read_i32(&mut self) -> Result<i32> {
        self.decode_int("i32", |rd| decode::read_int(rd))
    }

    /// Read any integer encoding whose value fits in a `u8`.
    pub fn read_u8(&mut self) -> Result<u8> {
        self.decode_int("u8", |rd| decode::read_int(rd))
    }

    /// Skip one complete value of any type, including nested containers.
    pub fn skip_value(&mut self) -> Result<()> {
        self.transact(|c| c.skip_nested(0))
    }

    /// Run `read` against a scratch copy and commit its position only on success.
    fn transact<T>(&mut self, read: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let mut scratch = *self;
        let value = read(&mut scratch)?;
        self.pos = scratch.pos;
        Ok(value)
    }

    /// Run one `rmp` read against the unread tail.
    fn decode<T>(
        &mut self,
        expected: &'static str,
        read: impl FnOnce(&mut &'a [u8]) -> std::result::Result<T, ValueReadError>,
    ) -> Result<T> {
        let mut rd = self.rest();
        match read(&mut rd) {
            Ok(value) => {
                self.advance_to(rd);
                Ok(value)
            }
            Err(ValueReadError::TypeMismatch(marker)) => Err(malformed(expected, marker)),
            Err(_) => Err(self.truncated()),
        }
    }

    fn decode_int<T>(
        &mut self,
        target: &'static str,
        read: impl FnOnce(&mut &'a [u8]) -> std::result::Result<T, NumValueReadError>,
    ) -> Result<T> {
        let mut rd = self.rest();
        match read(&mut rd) {
            Ok(value) => {
                self.advance_to(rd);
                Ok(value)
            }
            Err(NumValueReadError::OutOfRange) => Err(DecodeError::IntegerOutOfRange {
                value: self.peek_wide_int(),
                target,
            }),
            Err(NumValueReadError::TypeMismatch(marker)) => Err(malformed("int", marker)),
            Err(_) => Err(self.truncated()),
        }
    }

    // Only called after `rmp` has parsed an integer here, so one of the two
    // widest reads succeeds.
    fn peek_wide_int(&self) -> i128 {
        let mut rd = self.rest();
        if let Ok(value) = decode::read_int::<i64, _>(&mut rd) {
            return i128::from(value);
        }
        let mut rd = self.rest();
        decode::read_int::<u64, _>(&mut rd).map_or(0, i128::from)
    }

    fn advance_to(&mut self, rest: &[u8]) {
        self.pos = self.buf.len() - rest.len();
    }

    /// Truncation of the primitive starting at the current position.
    fn truncated(&self) -> DecodeError {
        let needed = self
            .rest()
            .first()
            .map_or(1, |&tag| 1 + header_width(Marker::from_u8(tag)));
        DecodeError::TruncatedBuffer {
            needed,
            remaining: self.remaining(),
        }
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        let remaining = self.remaining();
        if len > remaining {
            return Err(DecodeError::TruncatedBuffer {
                needed: len,
                remaining,
            });
        }
        let bytes = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    fn skip_items(&mut self, count: usize, depth: usize) -> Result<()> {
        for _ in 0..count {
            self.skip_nested(depth + 1)?;
        }
        Ok(())
    }

    fn skip_nested(&mut self, depth: usize) -> Result<()> {
        if depth >= MAX_SKIP_DEPTH {
            return Err(DecodeError::NestingTooDeep {
                max: MAX_SKIP_DEPTH,
            });
        }

        let Some(&tag) = self.rest().first() else {
            return Err(self.truncated());
        };
        match Marker::from_u8(tag) {
            Marker::FixArray(_) | Marker::Array16 | Marker::Array32 => {
                let count = self.read_array_header()?;
                self.skip_items(count, depth)
            }
            Marker::FixMap(_) | Marker::Map16 | Marker::Map32 => {
                let count = self.read_map_header()?;
                self.skip_items(count.saturating_mul(2), depth)
            }
            Marker::FixStr(_) | Marker::Str8 | Marker::Str16 | Marker::Str32 => {
                let len = self.decode("str", |rd| decode::read_str_len(rd))?;
                self.take(len_from_u32(len)).map(drop)
            }
            Marker::Bin8 | Marker::Bin16 | Marker::Bin32 => self.read_bytes().map(drop),
            Marker::FixExt1
            | Marker::FixExt2
            | Marker::FixExt4
            | Marker::FixExt8
            | Marker::FixExt16
            | Marker::Ext8
            | Marker::Ext16
            | Marker::Ext32 => {
                let meta = self.decode("ext", |rd| decode::read_ext_meta(rd))?;
                self.take(len_from_u32(meta.size)).map(drop)
            }
            Marker::Reserved => Err(malformed("value", Marker::Reserved)),
            // nil, bool, int and float carry a fixed-size body
            scalar => self.take(1 + header_width(scalar)).map(drop),
        }
    }
}

fn malformed(expected: &'static str, found: Marker) -> DecodeError {
    DecodeError::MalformedTag {
        expected,
        found: found.to_u8(),
    }
}

// A length that does not fit usize can never be satisfied by the buffer.
fn len_from_u32(len: u32) -> usize {
    usize::try_from(len).unwrap_or(usize::MAX)
}
