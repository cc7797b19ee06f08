//! Byte cursors over outbound and inbound 3270 data streams

use super::buffer::{addressing, Address};
use super::codes::LT;
use crate::error::{ProtocolError, ProtocolResult};

/// Cursor over an outbound (host to terminal) byte stream
///
/// The plain accessors return `None` at the end of the stream; the
/// `must_*` accessors treat a short stream as corruption.
#[derive(Debug, Clone)]
pub struct OutboundReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> OutboundReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn has_next(&self) -> bool {
        self.pos < self.data.len()
    }

    pub fn peek(&self) -> Option<u8> {
        self.data.get(self.pos).copied()
    }

    pub fn next(&mut self) -> Option<u8> {
        let byte = self.peek()?;
        self.pos += 1;
        Some(byte)
    }

    /// Big-endian u16
    pub fn next_u16(&mut self) -> Option<u16> {
        let slice = self.next_slice(2)?;
        Some(u16::from_be_bytes([slice[0], slice[1]]))
    }

    pub fn next_slice(&mut self, count: usize) -> Option<&'a [u8]> {
        if self.remaining() < count {
            return None;
        }
        let slice = &self.data[self.pos..self.pos + count];
        self.pos += count;
        Some(slice)
    }

    /// Everything not yet consumed
    pub fn rest(&mut self) -> &'a [u8] {
        let slice = &self.data[self.pos..];
        self.pos = self.data.len();
        slice
    }

    pub fn skip(&mut self, count: usize) {
        self.pos = (self.pos + count).min(self.data.len());
    }

    fn corrupted(&self, needed: usize) -> ProtocolError {
        ProtocolError::StreamCorrupted {
            offset: self.pos,
            needed,
            available: self.remaining(),
        }
    }

    pub fn must_peek(&self) -> ProtocolResult<u8> {
        self.peek().ok_or_else(|| self.corrupted(1))
    }

    pub fn must_next(&mut self) -> ProtocolResult<u8> {
        self.next().ok_or_else(|| self.corrupted(1))
    }

    pub fn must_next_u16(&mut self) -> ProtocolResult<u16> {
        match self.next_u16() {
            Some(value) => Ok(value),
            None => Err(self.corrupted(2)),
        }
    }

    pub fn must_next_slice(&mut self, count: usize) -> ProtocolResult<&'a [u8]> {
        match self.next_slice(count) {
            Some(slice) => Ok(slice),
            None => Err(self.corrupted(count)),
        }
    }

    /// Two-byte buffer address in 12-bit or 14-bit form
    pub fn must_next_address(&mut self) -> ProtocolResult<Address> {
        let bytes = self.must_next_slice(2)?;
        Ok(addressing::decode(bytes[0], bytes[1]))
    }
}

/// Builder for an inbound (terminal to host) frame
#[derive(Debug, Clone, Default)]
pub struct InboundWriter {
    bytes: Vec<u8>,
}

impl InboundWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&mut self, byte: u8) -> &mut Self {
        self.bytes.push(byte);
        self
    }

    pub fn put_u16(&mut self, value: u16) -> &mut Self {
        self.bytes.extend_from_slice(&value.to_be_bytes());
        self
    }

    pub fn put_slice(&mut self, bytes: &[u8]) -> &mut Self {
        self.bytes.extend_from_slice(bytes);
        self
    }

    /// Buffer address encoded for a buffer of `buffer_len` cells
    pub fn put_address(&mut self, addr: Address, buffer_len: usize) -> &mut Self {
        self.put_slice(&addressing::encode(addr, buffer_len))
    }

    /// Append the frame terminator
    pub fn terminate(&mut self) -> &mut Self {
        self.put_slice(&LT)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Structured field carried by WSF
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuredField {
    pub id: u8,
    pub info: Vec<u8>,
}

impl StructuredField {
    /// Parse every structured field left in the stream
    ///
    /// Each field is `u16 length | id | info`; the length counts itself and
    /// the id. A length of zero means the field runs to the end of the stream.
    pub fn parse_all(reader: &mut OutboundReader<'_>) -> ProtocolResult<Vec<StructuredField>> {
        let mut fields = Vec::new();
        while reader.has_next() {
            let offset = reader.position();
            let length = reader.must_next_u16()?;
            let id = reader.must_next()?;
            let info = match length {
                0 => reader.rest(),
                1 | 2 => return Err(ProtocolError::InvalidStructuredFieldLength { offset, length }),
                n => reader.must_next_slice(n as usize - 3)?,
            };
            fields.push(StructuredField { id, info: info.to_vec() });
        }
        Ok(fields)
    }

    /// Encode with a self-inclusive length prefix
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = InboundWriter::new();
        out.put_u16((self.info.len() + 3) as u16).put(self.id).put_slice(&self.info);
        out.into_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reader_basic_access() {
        let data = [0x01, 0x02, 0x03, 0x04, 0x05];
        let mut reader = OutboundReader::new(&data);
        assert_eq!(reader.peek(), Some(0x01));
        assert_eq!(reader.next(), Some(0x01));
        assert_eq!(reader.next_u16(), Some(0x0203));
        assert_eq!(reader.next_slice(3), None);
        assert_eq!(reader.rest(), &[0x04, 0x05]);
        assert!(!reader.has_next());
        assert_eq!(reader.next(), None);
    }

    #[test]
    fn test_must_variants_report_offset() {
        let data = [0x11, 0xC1];
        let mut reader = OutboundReader::new(&data);
        reader.must_next().unwrap();
        let err = reader.must_next_address().unwrap_err();
        assert_eq!(err, ProtocolError::StreamCorrupted { offset: 1, needed: 2, available: 1 });
    }

    #[test]
    fn test_reader_address() {
        let data = [0xC1, 0xE4];
        let mut reader = OutboundReader::new(&data);
        assert_eq!(reader.must_next_address().unwrap(), 100);
    }

    #[test]
    fn test_writer_frame() {
        let mut writer = InboundWriter::new();
        writer.put(0x7D).put_address(100, 1920).put_u16(0x0102).terminate();
        assert_eq!(writer.into_bytes(), vec![0x7D, 0xC1, 0xE4, 0x01, 0x02, 0xFF, 0xEF]);
    }

    #[test]
    fn test_parse_structured_fields() {
        let data = [0x00, 0x05, 0x01, 0xFF, 0x02, 0x00, 0x04, 0x09, 0x00];
        let mut reader = OutboundReader::new(&data);
        let fields = StructuredField::parse_all(&mut reader).unwrap();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0], StructuredField { id: 0x01, info: vec![0xFF, 0x02] });
        assert_eq!(fields[1], StructuredField { id: 0x09, info: vec![0x00] });
    }

    #[test]
    fn test_zero_length_runs_to_end() {
        let data = [0x00, 0x00, 0x01, 0xFF, 0x03, 0x80];
        let mut reader = OutboundReader::new(&data);
        let fields = StructuredField::parse_all(&mut reader).unwrap();
        assert_eq!(fields, vec![StructuredField { id: 0x01, info: vec![0xFF, 0x03, 0x80] }]);
    }

    #[test]
    fn test_truncated_structured_field() {
        let data = [0x00, 0x08, 0x01, 0xFF];
        let mut reader = OutboundReader::new(&data);
        assert!(matches!(
            StructuredField::parse_all(&mut reader),
            Err(ProtocolError::StreamCorrupted { .. })
        ));

        let data = [0x00, 0x02, 0x01];
        let mut reader = OutboundReader::new(&data);
        assert!(matches!(
            StructuredField::parse_all(&mut reader),
            Err(ProtocolError::InvalidStructuredFieldLength { length: 2, .. })
        ));
    }

    #[test]
    fn test_structured_field_to_bytes() {
        let sf = StructuredField { id: 0x81, info: vec![0x88, 0x00, 0x01, 0x02] };
        assert_eq!(sf.to_bytes(), vec![0x00, 0x07, 0x81, 0x88, 0x00, 0x01, 0x02]);
    }
}
