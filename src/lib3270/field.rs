//! Field partition of the 3270 buffer
//!
//! Fields are a derived view: each one runs from a field-start cell up to
//! the next field-start cell, wrapping around the end of the buffer. They
//! are rebuilt from the buffer after every outbound write.

use log::trace;

use super::attributes::Attributes;
use super::buffer::{addressing, Address, Buffer, Cell};
use super::codes::*;

/// One field: a start address and the number of cells it spans,
/// the field-start cell included
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub start: Address,
    pub len: usize,
}

impl Field {
    /// Every address in the field, starting with the field-start cell
    pub fn addresses(&self, buffer_len: usize) -> impl Iterator<Item = Address> {
        let start = self.start;
        (0..self.len).map(move |k| (start + k) % buffer_len)
    }

    /// Data cell addresses, excluding the field-start cell
    pub fn data_addresses(&self, buffer_len: usize) -> impl Iterator<Item = Address> {
        self.addresses(buffer_len).skip(1)
    }

    /// First data cell, wrapped
    pub fn home(&self, buffer_len: usize) -> Address {
        (self.start + 1) % buffer_len
    }

    /// Last cell of the field
    pub fn last(&self, buffer_len: usize) -> Address {
        (self.start + self.len - 1) % buffer_len
    }

    pub fn data_len(&self) -> usize {
        self.len - 1
    }

    /// Whether `addr` lies inside this field
    pub fn contains(&self, addr: Address, buffer_len: usize) -> bool {
        let offset = (addr + buffer_len - self.start) % buffer_len;
        offset < self.len
    }

    /// Attributes held by the field-start cell
    pub fn attrs<'a>(&self, buffer: &'a Buffer) -> &'a Attributes {
        &buffer.cells()[self.start].attrs
    }
}

/// The ordered set of fields derived from a buffer
#[derive(Debug, Clone, Default)]
pub struct Fields {
    fields: Vec<Field>,
}

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Partition the buffer into fields and stamp every cell with its owner
    ///
    /// Data cells take the attributes of their field unless they carry a
    /// character attribute written for that same field.
    pub fn build(buffer: &mut Buffer) -> Self {
        let len = buffer.len();
        let starts: Vec<Address> = buffer
            .cells()
            .iter()
            .enumerate()
            .filter(|(_, cell)| cell.is_field_start())
            .map(|(addr, _)| addr)
            .collect();

        let mut fields = Vec::with_capacity(starts.len());
        let cells = buffer.cells_mut();
        for (ix, &start) in starts.iter().enumerate() {
            let next = starts[(ix + 1) % starts.len()];
            let span = if next > start { next - start } else { next + len - start };

            cells[start].field_addr = Some(start);
            let mut field_attrs = cells[start].attrs;
            field_attrs.char_attr = false;
            field_attrs.default = false;

            for k in 1..span {
                let cell = &mut cells[(start + k) % len];
                let keep = !cell.attrs.default && cell.attrs.char_attr && cell.field_addr == Some(start);
                if !keep {
                    cell.attrs = field_attrs;
                }
                cell.field_addr = Some(start);
            }
            fields.push(Field { start, len: span });
        }

        trace!("built {} field(s) over {} cells", fields.len(), len);
        Self { fields }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Field> {
        self.fields.iter()
    }

    pub fn clear(&mut self) {
        self.fields.clear();
    }

    /// Field whose start cell is at `start`
    pub fn find(&self, start: Address) -> Option<&Field> {
        self.fields
            .binary_search_by_key(&start, |field| field.start)
            .ok()
            .map(|ix| &self.fields[ix])
    }

    /// Field owning the cell at `addr`
    pub fn containing(&self, buffer: &Buffer, addr: Address) -> Option<&Field> {
        let owner = buffer.peek(addr).ok()?.field_addr?;
        self.find(owner)
    }

    /// First field that is unprotected and has at least one data cell
    pub fn first_unprotected(&self, buffer: &Buffer) -> Option<&Field> {
        self.fields
            .iter()
            .find(|field| !field.attrs(buffer).protected && field.data_len() > 0)
    }

    /// Clear MDT and data of every unprotected field
    ///
    /// Returns the start of the first unprotected field, if any.
    pub fn erase_all_unprotected(&self, buffer: &mut Buffer) -> Option<Address> {
        let len = buffer.len();
        let mut first = None;
        let cells = buffer.cells_mut();
        for field in &self.fields {
            if cells[field.start].attrs.protected {
                continue;
            }
            cells[field.start].attrs.modified = false;
            let mut attrs = cells[field.start].attrs;
            attrs.char_attr = false;
            attrs.default = false;
            for addr in field.data_addresses(len) {
                cells[addr] = Cell::data(0x00, attrs, Some(field.start));
            }
            first.get_or_insert(field.start);
        }
        first
    }

    /// Serialize the whole buffer, from address 0, in the given reply mode
    ///
    /// Field starts become SF (Field mode) or SFE (extended modes). In
    /// Character mode, SA orders precede any character whose attributes
    /// differ from those already in effect.
    pub fn read_buffer(&self, buffer: &Buffer, mode: ReplyMode) -> Vec<u8> {
        let cells = buffer.cells();
        let owner_attrs = |cell: &Cell| -> Attributes {
            cell.field_addr
                .and_then(|addr| cells.get(addr))
                .map(|owner| owner.attrs)
                .unwrap_or(cell.attrs)
        };

        let mut out = Vec::with_capacity(cells.len() * 2);
        let mut current = cells.first().map(owner_attrs).unwrap_or_default();
        for cell in cells {
            if cell.is_field_start() {
                match mode {
                    ReplyMode::Field => {
                        out.push(ORDER_SF);
                        out.push(cell.attrs.to_basic_byte());
                    }
                    ReplyMode::ExtendedField | ReplyMode::Character => {
                        let pairs = cell.attrs.to_extended_bytes();
                        out.push(ORDER_SFE);
                        out.push((pairs.len() / 2) as u8);
                        out.extend_from_slice(&pairs);
                    }
                }
                current = cell.attrs;
                continue;
            }

            if mode == ReplyMode::Character {
                let effective = if cell.attrs.char_attr { cell.attrs } else { owner_attrs(cell) };
                for (typecode, value) in effective.delta_pairs(&current) {
                    out.extend_from_slice(&[ORDER_SA, typecode, value]);
                }
                current = effective;
            }
            out.push(cell.char);
        }
        out
    }

    /// SBA plus non-null data for every field with MDT set
    pub fn read_modified(&self, buffer: &Buffer) -> Vec<u8> {
        let len = buffer.len();
        let cells = buffer.cells();
        let mut out = Vec::new();
        for field in self.fields.iter().filter(|field| field.attrs(buffer).modified) {
            out.push(ORDER_SBA);
            out.extend_from_slice(&addressing::encode(field.home(len), len));
            out.extend(
                field
                    .data_addresses(len)
                    .map(|addr| cells[addr].char)
                    .filter(|&ch| ch != 0x00),
            );
        }
        out
    }
}

impl<'a> IntoIterator for &'a Fields {
    type Item = &'a Field;
    type IntoIter = std::slice::Iter<'a, Field>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lib3270::attributes::DEFAULT_ATTRS;

    fn put_field(buffer: &mut Buffer, addr: Address, basic: u8) {
        buffer.replace(addr, Cell::field_start(Attributes::from_basic(basic), addr)).unwrap();
    }

    fn put_text(buffer: &mut Buffer, addr: Address, text: &[u8]) {
        for (k, &ch) in text.iter().enumerate() {
            buffer.replace(addr + k, Cell::data(ch, DEFAULT_ATTRS, None)).unwrap();
        }
    }

    #[test]
    fn test_build_empty_partition() {
        let mut buffer = Buffer::new(2, 10).unwrap();
        let fields = Fields::build(&mut buffer);
        assert!(fields.is_empty());
        assert!(fields.read_modified(&buffer).is_empty());
    }

    #[test]
    fn test_build_wraps_last_field() {
        let mut buffer = Buffer::new(2, 10).unwrap();
        put_field(&mut buffer, 5, ATTR_PROTECTED);
        put_field(&mut buffer, 15, 0x00);
        let fields = Fields::build(&mut buffer);

        assert_eq!(fields.len(), 2);
        assert_eq!(fields.find(5), Some(&Field { start: 5, len: 10 }));
        assert_eq!(fields.find(15), Some(&Field { start: 15, len: 10 }));
        assert_eq!(buffer.peek(2).unwrap().field_addr, Some(15));
        assert!(!buffer.peek(2).unwrap().attrs.protected);
        assert!(buffer.peek(9).unwrap().attrs.protected);
        assert_eq!(fields.iter().map(|f| f.len).sum::<usize>(), buffer.len());
    }

    #[test]
    fn test_single_field_covers_buffer() {
        let mut buffer = Buffer::new(1, 8).unwrap();
        put_field(&mut buffer, 3, 0x00);
        let fields = Fields::build(&mut buffer);
        let field = fields.find(3).unwrap();
        assert_eq!(field.len, 8);
        assert!(field.contains(2, 8));
        assert_eq!(field.last(8), 2);
    }

    #[test]
    fn test_build_keeps_character_attributes_of_same_field() {
        let mut buffer = Buffer::new(1, 10).unwrap();
        put_field(&mut buffer, 0, 0x00);
        let field_attrs = Attributes::from_basic(0x00);
        let char_attrs = field_attrs.apply_delta(&[XA_COLOR, COLOR_YELLOW]);
        buffer.replace(1, Cell::data(0xC1, char_attrs, Some(0))).unwrap();
        buffer.replace(2, Cell::data(0xC2, char_attrs, Some(7))).unwrap();

        Fields::build(&mut buffer);
        assert_eq!(buffer.peek(1).unwrap().attrs.color, COLOR_YELLOW);
        assert_eq!(buffer.peek(2).unwrap().attrs.color, COLOR_GREEN);
    }

    #[test]
    fn test_erase_all_unprotected() {
        let mut buffer = Buffer::new(1, 20).unwrap();
        put_field(&mut buffer, 0, ATTR_PROTECTED);
        put_text(&mut buffer, 1, b"\xD3\xC1\xC2");
        put_field(&mut buffer, 4, ATTR_MDT);
        put_text(&mut buffer, 5, b"\xC1\xC2\xC3");
        put_field(&mut buffer, 10, ATTR_MDT);
        put_text(&mut buffer, 11, b"\xF1");
        let fields = Fields::build(&mut buffer);

        assert_eq!(fields.erase_all_unprotected(&mut buffer), Some(4));
        assert!(!buffer.peek(4).unwrap().attrs.modified);
        assert!(!buffer.peek(10).unwrap().attrs.modified);
        assert!((5..10).all(|addr| buffer.peek(addr).unwrap().char == 0x00));
        assert_eq!(buffer.peek(11).unwrap().char, 0x00);
        assert_eq!(buffer.peek(1).unwrap().char, 0xD3);
    }

    #[test]
    fn test_erase_all_unprotected_none() {
        let mut buffer = Buffer::new(1, 10).unwrap();
        put_field(&mut buffer, 0, ATTR_PROTECTED);
        let fields = Fields::build(&mut buffer);
        assert_eq!(fields.erase_all_unprotected(&mut buffer), None);
    }

    #[test]
    fn test_read_modified_suppresses_nulls() {
        let mut buffer = Buffer::new(1, 20).unwrap();
        put_field(&mut buffer, 0, ATTR_PROTECTED);
        put_field(&mut buffer, 5, ATTR_MDT);
        put_text(&mut buffer, 6, b"\xC1\x00\xC2");
        put_field(&mut buffer, 12, 0x00);
        put_text(&mut buffer, 13, b"\xC3");
        let fields = Fields::build(&mut buffer);

        assert_eq!(fields.read_modified(&buffer), vec![ORDER_SBA, 0x40, 0xC6, 0xC1, 0xC2]);
    }

    #[test]
    fn test_read_buffer_field_mode() {
        let mut buffer = Buffer::new(1, 6).unwrap();
        put_field(&mut buffer, 0, ATTR_PROTECTED);
        put_text(&mut buffer, 1, b"\xC1\xC2");
        put_field(&mut buffer, 3, 0x00);
        let fields = Fields::build(&mut buffer);

        assert_eq!(
            fields.read_buffer(&buffer, ReplyMode::Field),
            vec![ORDER_SF, 0x20, 0xC1, 0xC2, ORDER_SF, 0x00, 0x00, 0x00]
        );
    }

    #[test]
    fn test_read_buffer_extended_mode() {
        let mut buffer = Buffer::new(1, 3).unwrap();
        put_field(&mut buffer, 0, ATTR_PROTECTED);
        put_text(&mut buffer, 1, b"\xC1\xC2");
        let fields = Fields::build(&mut buffer);

        let stream = fields.read_buffer(&buffer, ReplyMode::ExtendedField);
        assert_eq!(&stream[..2], &[ORDER_SFE, 5]);
        assert_eq!(&stream[2..4], &[XA_BASIC, 0x20]);
        assert_eq!(&stream[12..], &[0xC1, 0xC2]);
    }

    #[test]
    fn test_read_buffer_character_mode_emits_sa() {
        let mut buffer = Buffer::new(1, 4).unwrap();
        put_field(&mut buffer, 0, 0x00);
        let field_attrs = Attributes::from_basic(0x00);
        buffer.replace(1, Cell::data(0xC1, field_attrs.apply_delta(&[XA_COLOR, COLOR_RED]), Some(0))).unwrap();
        put_text(&mut buffer, 2, b"\xC2\xC3");
        let fields = Fields::build(&mut buffer);

        let stream = fields.read_buffer(&buffer, ReplyMode::Character);
        assert_eq!(
            &stream[12..],
            &[ORDER_SA, XA_COLOR, COLOR_RED, 0xC1, ORDER_SA, XA_COLOR, COLOR_GREEN, 0xC2, 0xC3]
        );
    }
}
