use bytes::buf::Writer;
use bytes::{BufMut, BytesMut};
use rmp::encode::{self, ValueWriteError};

use crate::error::EncodeError;

/// Appends MessagePack primitives to a growable buffer.
///
/// Headers, integers and strings always take their smallest encoding.
#[derive(Debug, Default)]
pub struct MessageWriter {
    buf: BytesMut,
}

impl MessageWriter {
    /// Create a writer with an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_buffer(buf: BytesMut) -> Self {
        Self { buf }
    }

    pub(crate) fn into_buffer(self) -> BytesMut {
        self.buf
    }

    /// Write an array header for `len` elements.
    pub fn write_array_header(&mut self, len: usize) -> Result<(), EncodeError> {
        let len = header_u32(len)?;
        self.encode(|wr| encode::write_array_len(wr, len))
    }

    /// Write a map header for `len` entries.
    pub fn write_map_header(&mut self, len: usize) -> Result<(), EncodeError> {
        let len = header_u32(len)?;
        self.encode(|wr| encode::write_map_len(wr, len))
    }

    /// Write a UTF-8 string.
    pub fn write_str(&mut self, value: &str) -> Result<(), EncodeError> {
        header_u32(value.len())?;
        self.encode(|wr| encode::write_str(wr, value))
    }

    /// Write a binary blob.
    pub fn write_bytes(&mut self, value: &[u8]) -> Result<(), EncodeError> {
        header_u32(value.len())?;
        self.encode(|wr| encode::write_bin(wr, value))
    }

    /// Write a signed 32-bit integer.
    pub fn write_i32(&mut self, value: i32) -> Result<(), EncodeError> {
        self.encode(|wr| encode::write_sint(wr, i64::from(value)))
    }

    /// Write an unsigned byte.
    pub fn write_u8(&mut self, value: u8) -> Result<(), EncodeError> {
        self.encode(|wr| encode::write_uint(wr, u64::from(value)))
    }

    /// Append already-encoded MessagePack bytes verbatim.
    pub fn write_raw(&mut self, encoded: &[u8]) {
        self.buf.put_slice(encoded);
    }

    /// Number of bytes written so far.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// True if nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// The bytes written so far.
    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    /// Copy the written bytes into a caller-owned vector.
    pub fn to_vec(&self) -> Vec<u8> {
        self.buf.to_vec()
    }

    // Writing into a `BytesMut` grows the buffer and cannot fail short.
    fn encode<T>(
        &mut self,
        write: impl FnOnce(&mut Writer<&mut BytesMut>) -> Result<T, ValueWriteError>,
    ) -> Result<(), EncodeError> {
        let mut out = (&mut self.buf).writer();
        write(&mut out)?;
        Ok(())
    }
}

// rmp takes u32 lengths; reject anything wider instead of truncating it.
fn header_u32(len: usize) -> Result<u32, EncodeError> {
    u32::try_from(len).map_err(|_| EncodeError::TooLarge { len })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::Cursor;

    #[test]
    fn small_array_header_is_one_byte() {
        let mut writer = MessageWriter::new();
        writer.write_array_header(5).unwrap();
        assert_eq!(writer.as_slice(), &[0x95]);
    }

    #[test]
    fn wide_headers_switch_at_sixteen() {
        let mut writer = MessageWriter::new();
        writer.write_array_header(16).unwrap();
        writer.write_map_header(70_000).unwrap();
        assert_eq!(
            writer.as_slice(),
            &[0xdc, 0x00, 0x10, 0xdf, 0x00, 0x01, 0x11, 0x70]
        );
    }

    #[test]
    fn integers_use_minimal_encoding() {
        let cases: &[(i32, &[u8])] = &[
            (0, &[0x00]),
            (127, &[0x7f]),
            (-1, &[0xff]),
            (-32, &[0xe0]),
            (-33, &[0xd0, 0xdf]),
            (128, &[0xcc, 0x80]),
            (300, &[0xcd, 0x01, 0x2c]),
            (-200, &[0xd1, 0xff, 0x38]),
            (70_000, &[0xce, 0x00, 0x01, 0x11, 0x70]),
            (i32::MIN, &[0xd2, 0x80, 0x00, 0x00, 0x00]),
        ];
        for (value, expected) in cases {
            let mut writer = MessageWriter::new();
            writer.write_i32(*value).unwrap();
            assert_eq!(writer.as_slice(), *expected, "value {value}");
            assert_eq!(Cursor::new(writer.as_slice()).read_i32().unwrap(), *value);
        }
    }

    #[test]
    fn u8_above_fixint_uses_uint8_tag() {
        let mut writer = MessageWriter::new();
        writer.write_u8(1).unwrap();
        writer.write_u8(200).unwrap();
        assert_eq!(writer.as_slice(), &[0x01, 0xcc, 0xc8]);
    }

    #[test]
    fn strings_pick_width_by_length() {
        let mut writer = MessageWriter::new();
        writer.write_str("abc").unwrap();
        assert_eq!(writer.as_slice(), &[0xa3, b'a', b'b', b'c']);

        let long = "x".repeat(40);
        let mut writer = MessageWriter::new();
        writer.write_str(&long).unwrap();
        assert_eq!(&writer.as_slice()[..2], &[0xd9, 40]);

        let longer = "y".repeat(300);
        let mut writer = MessageWriter::new();
        writer.write_str(&longer).unwrap();
        assert_eq!(&writer.as_slice()[..3], &[0xda, 0x01, 0x2c]);
        assert_eq!(writer.len(), 303);
    }

    #[test]
    fn bytes_always_use_bin_family() {
        let mut writer = MessageWriter::new();
        writer.write_bytes(&[]).unwrap();
        writer.write_bytes(&[0x7b, 0x7d]).unwrap();
        assert_eq!(writer.as_slice(), &[0xc4, 0x00, 0xc4, 0x02, 0x7b, 0x7d]);
    }

    #[test]
    fn raw_bytes_are_appended_verbatim() {
        let mut writer = MessageWriter::new();
        assert!(writer.is_empty());
        writer.write_raw(&[0x91, 0x01]);
        assert_eq!(writer.to_vec(), vec![0x91, 0x01]);
    }
}
