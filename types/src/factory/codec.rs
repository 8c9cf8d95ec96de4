use bytes::{Buf, BufMut};
use commonware_codec::{Error, ReadExt, ReadRangeExt, Write};

use super::MAX_TABLE_LENGTH;

/// Write a string as length-prefixed UTF-8 bytes.
pub fn write_string(s: &str, writer: &mut impl BufMut) {
    let bytes = s.as_bytes();
    (bytes.len() as u32).write(writer);
    writer.put_slice(bytes);
}

/// Read a length-prefixed UTF-8 string of at most `max_len` bytes.
pub fn read_string(reader: &mut impl Buf, max_len: usize) -> Result<String, Error> {
    let len = u32::read(reader)? as usize;
    if len > max_len {
        return Err(Error::Invalid("String", "too long"));
    }
    if reader.remaining() < len {
        return Err(Error::EndOfBuffer);
    }
    let mut bytes = vec![0u8; len];
    reader.copy_to_slice(&mut bytes);
    String::from_utf8(bytes).map_err(|_| Error::Invalid("String", "invalid UTF-8"))
}

pub fn string_encode_size(s: &str) -> usize {
    4 + s.len()
}

/// Read a fixed-point table bounded by [MAX_TABLE_LENGTH].
pub fn read_table(reader: &mut impl Buf) -> Result<Vec<u128>, Error> {
    Vec::<u128>::read_range(reader, 0..=MAX_TABLE_LENGTH)
}

/// Read a per-slot `u32` table bounded by [MAX_TABLE_LENGTH].
pub fn read_slots(reader: &mut impl Buf) -> Result<Vec<u32>, Error> {
    Vec::<u32>::read_range(reader, 0..=MAX_TABLE_LENGTH)
}
