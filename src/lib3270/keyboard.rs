//! Field-aware keyboard editing
//!
//! Translates key events into cursor movement and buffer edits. Rejected
//! input raises the status alarm and leaves the buffer untouched; it is
//! never an error.

use serde::{Deserialize, Serialize};

use super::buffer::{Address, Buffer};
use super::codes::AidKey;
use super::field::{Field, Fields};
use super::status::Status;
use crate::protocol_common::ebcdic::{CharsetCodec, EBCDIC_SPACE};

/// Characters accepted by a numeric field
const NUMERIC_CHARS: &str = "-0123456789.";

/// Key event as delivered by a presentation layer
///
/// `code` names the physical key (`ArrowUp`, `Tab`), `key` the produced
/// value (`a`, `Enter`, `F3`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyEvent {
    pub code: String,
    pub key: String,
    pub alt: bool,
    pub ctrl: bool,
    pub shift: bool,
}

impl KeyEvent {
    pub fn new(code: &str, key: &str) -> Self {
        Self {
            code: code.to_string(),
            key: key.to_string(),
            ..Self::default()
        }
    }

    /// Named key whose code and key agree (`Tab`, `Enter`, `F1`)
    pub fn named(name: &str) -> Self {
        Self::new(name, name)
    }

    /// Printable character
    pub fn char(ch: char) -> Self {
        Self::new("", &ch.to_string())
    }

    pub fn with_shift(mut self) -> Self {
        self.shift = true;
        self
    }

    pub fn with_alt(mut self) -> Self {
        self.alt = true;
        self
    }

    pub fn with_ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    /// AID this key transmits, if any
    pub fn aid(&self) -> Option<AidKey> {
        let key = self.key.to_ascii_uppercase();
        match key.as_str() {
            "ENTER" => return Some(AidKey::Enter),
            "ESCAPE" => return Some(AidKey::Clear),
            _ => {}
        }
        let number: u8 = key.strip_prefix('F')?.parse().ok()?;
        match (self.alt, self.ctrl, self.shift) {
            (false, false, false) if (1..=24).contains(&number) => Some(AidKey::PF(number)),
            (false, false, true) if (1..=12).contains(&number) => Some(AidKey::PF(number + 12)),
            (true, false, false) if (1..=3).contains(&number) => Some(AidKey::PA(number)),
            _ => None,
        }
    }

    fn printable(&self) -> Option<char> {
        let mut chars = self.key.chars();
        match (chars.next(), chars.next()) {
            (Some(ch), None) => Some(ch),
            _ => None,
        }
    }
}

/// Result of one keystroke
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyOutcome {
    /// AID to transmit; the buffer has not been touched
    pub aid: Option<AidKey>,
    /// Addresses to redraw
    pub deltas: Vec<Address>,
}

pub struct KeyboardEditor<'a> {
    buffer: &'a mut Buffer,
    fields: &'a Fields,
    status: &'a mut Status,
    codec: &'a dyn CharsetCodec,
}

impl<'a> KeyboardEditor<'a> {
    pub fn new(
        buffer: &'a mut Buffer,
        fields: &'a Fields,
        status: &'a mut Status,
        codec: &'a dyn CharsetCodec,
    ) -> Self {
        Self { buffer, fields, status, codec }
    }

    pub fn keystroke(&mut self, event: &KeyEvent) -> KeyOutcome {
        self.status.alarm = false;
        let mut outcome = KeyOutcome::default();
        if let Some(aid) = event.aid() {
            outcome.aid = Some(aid);
            return outcome;
        }

        let cursor = self.buffer.wrap(self.status.cursor_at);
        let len = self.buffer.len();
        let cols = self.buffer.cols();
        let target = match event.code.as_str() {
            "ArrowDown" if cursor + cols >= len => Some(cursor % cols),
            "ArrowDown" => Some(cursor + cols),
            "ArrowUp" if cursor < cols => Some(cursor % cols + len - cols),
            "ArrowUp" => Some(cursor - cols),
            "ArrowLeft" => Some(self.buffer.offset(cursor, -1)),
            "ArrowRight" => Some(self.buffer.offset(cursor, 1)),
            "Backspace" => self.backspace(cursor),
            "Delete" => self.delete(cursor, &mut outcome.deltas),
            "End" => self.end(cursor),
            "Home" => self.home(),
            "Insert" => {
                self.status.insert = !self.status.insert;
                Some(cursor)
            }
            "Tab" => self.tab(if event.shift { -1 } else { 1 }, cursor),
            _ => match event.printable() {
                Some(ch) => self.key_in(ch, cursor, &mut outcome.deltas),
                None => Some(cursor),
            },
        };

        let cursor_to = target.unwrap_or_else(|| {
            self.status.alarm = true;
            cursor
        });
        if cursor_to != cursor {
            outcome.deltas.push(cursor);
            outcome.deltas.push(cursor_to);
            self.status.cursor_at = cursor_to;
            self.status.probe(self.buffer);
        }
        outcome
    }

    fn backspace(&mut self, cursor: Address) -> Option<Address> {
        let prev = self.buffer.offset(cursor, -1);
        let cell = *self.buffer.peek(prev).ok()?;
        if cell.is_field_start() || cell.attrs.protected {
            return None;
        }
        self.set_mdt(cell.field_addr?);
        self.put_char(prev, EBCDIC_SPACE);
        Some(prev)
    }

    /// Shift the rest of the field left over the cursor cell
    fn delete(&mut self, cursor: Address, deltas: &mut Vec<Address>) -> Option<Address> {
        let field = self.editable_field(cursor, 2)?;
        let len = self.buffer.len();
        let from = self.position_in(&field, cursor);
        for k in from..field.len - 1 {
            let next = self.char_at((field.start + k + 1) % len);
            self.put_char((field.start + k) % len, next);
        }
        self.put_char(field.last(len), 0x00);
        self.set_mdt(field.start);
        deltas.extend((from..field.len).map(|k| (field.start + k) % len));
        Some(cursor)
    }

    /// Just past the last non-blank character of the field
    fn end(&self, cursor: Address) -> Option<Address> {
        let field = self.editable_field(cursor, 1)?;
        let len = self.buffer.len();
        let last_used = (0..field.len)
            .rev()
            .find(|&k| self.char_at((field.start + k) % len) > EBCDIC_SPACE);
        match last_used {
            Some(k) => Some((field.start + (k + 1).min(field.len - 1)) % len),
            None => Some(cursor),
        }
    }

    fn home(&self) -> Option<Address> {
        let field = self.fields.first_unprotected(self.buffer)?;
        Some(field.home(self.buffer.len()))
    }

    /// Scan for the next unprotected field's first data cell, wrapping back to
    /// the start if need be
    fn tab(&self, dir: isize, cursor: Address) -> Option<Address> {
        (1..=self.buffer.len() as isize)
            .map(|k| self.buffer.offset(cursor, dir * k))
            .find(|&addr| self.is_unprotected_home(addr))
    }

    fn key_in(&mut self, ch: char, cursor: Address, deltas: &mut Vec<Address>) -> Option<Address> {
        let cell = *self.buffer.peek(cursor).ok()?;
        if cell.is_field_start() || cell.attrs.protected {
            return None;
        }
        if cell.attrs.numeric && !NUMERIC_CHARS.contains(ch) {
            return None;
        }
        let owner = cell.field_addr?;
        let byte = self.codec.encode(ch)?;
        if self.status.insert {
            return self.insert_char(byte, cursor, owner, deltas);
        }

        self.set_mdt(owner);
        self.put_char(cursor, byte);
        let next = self.buffer.offset(cursor, 1);
        let next_cell = *self.buffer.peek(next).ok()?;
        if next_cell.is_field_start() {
            deltas.push(cursor);
            return if next_cell.attrs.autoskip {
                self.tab(1, cursor)
            } else {
                Some(cursor)
            };
        }
        Some(next)
    }

    fn insert_char(
        &mut self,
        byte: u8,
        cursor: Address,
        owner: Address,
        deltas: &mut Vec<Address>,
    ) -> Option<Address> {
        let field = *self.fields.find(owner)?;
        let len = self.buffer.len();
        if self.char_at(field.last(len)) > EBCDIC_SPACE {
            return None;
        }
        let from = self.position_in(&field, cursor);
        for k in (from + 1..field.len).rev() {
            let prev = self.char_at((field.start + k - 1) % len);
            self.put_char((field.start + k) % len, prev);
        }
        self.put_char(cursor, byte);
        self.set_mdt(owner);
        deltas.extend((from..field.len).map(|k| (field.start + k) % len));
        Some(self.buffer.offset(cursor, 1))
    }

    /// Unprotected field holding `cursor` on a data cell, at least `min_len` cells long
    fn editable_field(&self, cursor: Address, min_len: usize) -> Option<Field> {
        let cell = self.buffer.peek(cursor).ok()?;
        if cell.is_field_start() {
            return None;
        }
        let field = *self.fields.containing(self.buffer, cursor)?;
        if field.len <= min_len || field.attrs(self.buffer).protected {
            return None;
        }
        Some(field)
    }

    fn is_unprotected_home(&self, addr: Address) -> bool {
        let cells = self.buffer.cells();
        let prev = &cells[self.buffer.offset(addr, -1)];
        !cells[addr].is_field_start() && prev.is_field_start() && !prev.attrs.protected
    }

    fn position_in(&self, field: &Field, addr: Address) -> usize {
        let len = self.buffer.len();
        (addr + len - field.start) % len
    }

    fn char_at(&self, addr: Address) -> u8 {
        self.buffer.cells()[addr].char
    }

    fn put_char(&mut self, addr: Address, byte: u8) {
        if let Ok(cell) = self.buffer.peek_mut(addr) {
            cell.char = byte;
        }
    }

    fn set_mdt(&mut self, field_start: Address) {
        if let Ok(cell) = self.buffer.peek_mut(field_start) {
            cell.attrs.modified = true;
        }
    }
}
