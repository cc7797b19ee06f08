//! Operator information area state
//!
//! A snapshot handed to presentation layers after every outbound frame,
//! keystroke and focus change.

use serde::Serialize;

use super::buffer::{Address, Buffer};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Status {
    /// Transient: cleared at the start of every frame and keystroke
    pub alarm: bool,
    pub cursor_at: Address,
    pub error: bool,
    pub insert: bool,
    pub locked: bool,
    pub message: String,
    /// Cursor cell belongs to a numeric field
    pub numeric: bool,
    /// Cursor cell is protected or is a field start
    pub protected: bool,
    /// An inbound frame has been sent and no reply has arrived yet
    pub waiting: bool,
}

impl Status {
    /// Refresh `numeric` and `protected` from the cell under the cursor
    pub fn probe(&mut self, buffer: &Buffer) {
        if let Ok(cell) = buffer.peek(self.cursor_at) {
            self.numeric = cell.attrs.numeric;
            self.protected = cell.attrs.protected || cell.is_field_start();
        }
    }

    /// State after sending an inbound frame
    pub fn lock(&mut self) {
        self.locked = true;
        self.waiting = true;
    }

    pub fn unlock(&mut self) {
        self.locked = false;
        self.waiting = false;
    }

    pub fn focus(&mut self, focussed: bool) {
        self.error = !focussed;
        self.locked = !focussed;
        self.message = if focussed { String::new() } else { "LOCK".to_string() };
    }
}
