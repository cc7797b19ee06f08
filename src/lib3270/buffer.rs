//! TN3270 Buffer Management
//!
//! The buffer is a fixed-size circular array of cells with a current buffer
//! address and the reply mode negotiated with the host.

use serde::{Deserialize, Serialize};

use super::attributes::{Attributes, DEFAULT_ATTRS};
use super::codes::{ReplyMode, FIELD_START};
use crate::error::{BufferError, BufferResult};

/// Index of a buffer cell, always in `[0, rows * cols)`
pub type Address = usize;

/// Standard 3270 screen sizes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScreenSize {
    /// Model 2: 24 rows x 80 columns
    Model2,
    /// Model 3: 32 rows x 80 columns
    Model3,
    /// Model 4: 43 rows x 80 columns
    Model4,
    /// Model 5: 27 rows x 132 columns
    Model5,
}

impl ScreenSize {
    pub fn rows(&self) -> usize {
        match self {
            Self::Model2 => 24,
            Self::Model3 => 32,
            Self::Model4 => 43,
            Self::Model5 => 27,
        }
    }

    pub fn cols(&self) -> usize {
        match self {
            Self::Model5 => 132,
            _ => 80,
        }
    }

    /// Model number as used in terminal type names (`IBM-3278-2`)
    pub fn model_number(&self) -> u8 {
        match self {
            Self::Model2 => 2,
            Self::Model3 => 3,
            Self::Model4 => 4,
            Self::Model5 => 5,
        }
    }

    pub fn from_model_number(model: u8) -> Option<Self> {
        match model {
            2 => Some(Self::Model2),
            3 => Some(Self::Model3),
            4 => Some(Self::Model4),
            5 => Some(Self::Model5),
            _ => None,
        }
    }
}

/// One buffer position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Cell {
    /// Raw EBCDIC code, or the field-start sentinel
    pub char: u8,
    pub attrs: Attributes,
    /// Address of the owning field-start cell
    pub field_addr: Option<Address>,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            char: 0x00,
            attrs: DEFAULT_ATTRS,
            field_addr: None,
        }
    }
}

impl Cell {
    /// Ordinary data cell
    pub fn data(char: u8, attrs: Attributes, field_addr: Option<Address>) -> Self {
        Self { char, attrs, field_addr }
    }

    /// Field-start cell at `addr`, owning itself
    pub fn field_start(attrs: Attributes, addr: Address) -> Self {
        Self {
            char: FIELD_START,
            attrs,
            field_addr: Some(addr),
        }
    }

    pub fn is_field_start(&self) -> bool {
        self.char == FIELD_START
    }
}

/// The 3270 character buffer
#[derive(Debug, Clone)]
pub struct Buffer {
    cells: Vec<Cell>,
    addr: Address,
    mode: ReplyMode,
    rows: usize,
    cols: usize,
}

impl Buffer {
    /// Blank buffer of `rows` x `cols` cells, at most 16384 in all
    pub fn new(rows: usize, cols: usize) -> BufferResult<Self> {
        let len = addressing::cell_count(rows, cols).ok_or(BufferError::InvalidSize { rows, cols })?;
        Ok(Self::blank(rows, cols, len))
    }

    pub fn with_size(size: ScreenSize) -> Self {
        Self::blank(size.rows(), size.cols(), size.rows() * size.cols())
    }

    fn blank(rows: usize, cols: usize, len: usize) -> Self {
        Self {
            cells: vec![Cell::default(); len],
            addr: 0,
            mode: ReplyMode::Field,
            rows,
            cols,
        }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub(crate) fn cells_mut(&mut self) -> &mut [Cell] {
        &mut self.cells
    }

    /// Return every cell to its default state, the address to 0 and the mode to Field
    pub fn reset(&mut self) {
        self.cells.fill(Cell::default());
        self.addr = 0;
        self.mode = ReplyMode::Field;
    }

    pub fn mode(&self) -> ReplyMode {
        self.mode
    }

    /// Raise the reply mode; lower modes are ignored
    pub fn set_mode(&mut self, mode: ReplyMode) {
        if mode > self.mode {
            self.mode = mode;
        }
    }

    /// Current buffer address
    pub fn addr(&self) -> Address {
        self.addr
    }

    fn check(&self, addr: Address) -> BufferResult<()> {
        if addr < self.cells.len() {
            Ok(())
        } else {
            Err(BufferError::OutOfRange { addr, len: self.cells.len() })
        }
    }

    pub fn peek(&self, addr: Address) -> BufferResult<&Cell> {
        self.check(addr)?;
        Ok(&self.cells[addr])
    }

    pub fn peek_mut(&mut self, addr: Address) -> BufferResult<&mut Cell> {
        self.check(addr)?;
        Ok(&mut self.cells[addr])
    }

    pub fn replace(&mut self, addr: Address, cell: Cell) -> BufferResult<()> {
        self.check(addr)?;
        self.cells[addr] = cell;
        Ok(())
    }

    pub fn seek(&mut self, addr: Address) -> BufferResult<()> {
        self.check(addr)?;
        self.addr = addr;
        Ok(())
    }

    /// Reduce any address modulo the buffer length
    pub fn wrap(&self, addr: Address) -> Address {
        addr % self.cells.len().max(1)
    }

    /// `addr + delta`, wrapped in either direction
    pub fn offset(&self, addr: Address, delta: isize) -> Address {
        let len = self.cells.len().max(1) as isize;
        (addr as isize + delta).rem_euclid(len) as Address
    }

    /// Cell at the current address
    pub fn get(&self) -> &Cell {
        &self.cells[self.addr]
    }

    /// Advance the address and return the cell there
    pub fn get_next(&mut self) -> (&Cell, Address) {
        self.addr = self.offset(self.addr, 1);
        (&self.cells[self.addr], self.addr)
    }

    /// Step the address back and return the cell there
    pub fn get_prev(&mut self) -> (&Cell, Address) {
        self.addr = self.offset(self.addr, -1);
        (&self.cells[self.addr], self.addr)
    }

    /// Overwrite the cell at the current address
    pub fn set(&mut self, cell: Cell) -> Address {
        self.cells[self.addr] = cell;
        self.addr
    }

    /// Overwrite the current cell, then advance; returns the address written
    pub fn set_and_advance(&mut self, cell: Cell) -> Address {
        let written = self.set(cell);
        self.addr = self.offset(self.addr, 1);
        written
    }

    /// Step back, then overwrite the cell there
    pub fn set_prev_and_seek(&mut self, cell: Cell) -> Address {
        self.addr = self.offset(self.addr, -1);
        self.set(cell)
    }

    /// Clear the MDT of every field-start cell
    pub fn reset_mdt(&mut self) {
        for cell in self.cells.iter_mut().filter(|cell| cell.is_field_start()) {
            cell.attrs.modified = false;
        }
    }

    /// Convert a buffer address to (row, col)
    pub fn address_to_coords(&self, addr: Address) -> (usize, usize) {
        (addr / self.cols, addr % self.cols)
    }

    pub fn coords_to_address(&self, row: usize, col: usize) -> Address {
        self.wrap(row * self.cols + col)
    }
}

/// 3270 buffer address encoding
pub mod addressing {
    use super::Address;

    /// Graphic codes for each 6-bit value in 12-bit addressing
    const CODES: [u8; 64] = [
        0x40, 0xC1, 0xC2, 0xC3, 0xC4, 0xC5, 0xC6, 0xC7, 0xC8, 0xC9, 0x4A, 0x4B, 0x4C, 0x4D, 0x4E, 0x4F,
        0x50, 0xD1, 0xD2, 0xD3, 0xD4, 0xD5, 0xD6, 0xD7, 0xD8, 0xD9, 0x5A, 0x5B, 0x5C, 0x5D, 0x5E, 0x5F,
        0x60, 0x61, 0xE2, 0xE3, 0xE4, 0xE5, 0xE6, 0xE7, 0xE8, 0xE9, 0x6A, 0x6B, 0x6C, 0x6D, 0x6E, 0x6F,
        0xF0, 0xF1, 0xF2, 0xF3, 0xF4, 0xF5, 0xF6, 0xF7, 0xF8, 0xF9, 0x7A, 0x7B, 0x7C, 0x7D, 0x7E, 0x7F,
    ];

    /// Largest buffer addressable with 12-bit coded addresses
    pub const MAX_12BIT: usize = 4096;

    /// Largest buffer addressable with 14-bit binary addresses
    pub const MAX_14BIT: usize = 16384;

    /// Cell count of a `rows` x `cols` buffer, if it is non-empty and addressable
    pub fn cell_count(rows: usize, cols: usize) -> Option<usize> {
        rows.checked_mul(cols).filter(|&len| len > 0 && len <= MAX_14BIT)
    }

    /// Decode either a 12-bit coded or a 14-bit binary address
    ///
    /// The two high-order bits of the first byte are `00` only for 14-bit
    /// binary addresses.
    pub fn decode(byte1: u8, byte2: u8) -> Address {
        if byte1 & 0xC0 == 0 {
            decode_14bit(byte1, byte2)
        } else {
            (((byte1 & 0x3F) as Address) << 6) | (byte2 & 0x3F) as Address
        }
    }

    pub fn decode_14bit(byte1: u8, byte2: u8) -> Address {
        (((byte1 & 0x3F) as Address) << 8) | byte2 as Address
    }

    pub fn encode_12bit(addr: Address) -> [u8; 2] {
        [CODES[(addr >> 6) & 0x3F], CODES[addr & 0x3F]]
    }

    pub fn encode_14bit(addr: Address) -> [u8; 2] {
        [((addr >> 8) & 0x3F) as u8, (addr & 0xFF) as u8]
    }

    /// Encode with the addressing mode a buffer of `buffer_len` cells requires
    pub fn encode(addr: Address, buffer_len: usize) -> [u8; 2] {
        if buffer_len <= MAX_12BIT {
            encode_12bit(addr)
        } else {
            encode_14bit(addr)
        }
    }
}
