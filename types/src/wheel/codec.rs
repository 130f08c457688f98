use bytes::{Buf, BufMut};
use commonware_codec::{Error, FixedSize, ReadExt, Write};

/// Write `s` as a `u32` length followed by its UTF-8 bytes.
pub fn write_string(s: &str, writer: &mut impl BufMut) {
    (s.len() as u32).write(writer);
    writer.put_slice(s.as_bytes());
}

/// Read a string written by [write_string], refusing anything longer than `max_len` bytes.
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
    u32::SIZE + s.len()
}
