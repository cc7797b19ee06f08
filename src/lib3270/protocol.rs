//! 3270 outbound data stream interpreter
//!
//! Decodes one host frame (command, optional WCC, orders and data) and
//! applies it to a [`Buffer`]. The interpreter holds no state between
//! frames; everything the caller must act on is reported in an [`Outcome`].

use log::{debug, trace, warn};

use super::attributes::{Attributes, DEFAULT_ATTRS};
use super::buffer::{Address, Buffer, Cell};
use super::codes::*;
use super::field::Fields;
use super::query::SUPPORTED_QCODES;
use super::stream::{OutboundReader, StructuredField};
use crate::error::{ProtocolError, TN3270Result};

/// Inbound reply the host asked for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyRequest {
    ReadBuffer,
    ReadModified,
    ReadModifiedAll,
    Query,
    /// Query List with the requested query codes, in request order
    QueryList(Vec<u8>),
}

/// What one outbound frame did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outcome {
    pub command: Option<CommandCode>,
    /// The buffer was fully reset (EW, EWA, or SF at address 0)
    pub erased: bool,
    pub render: bool,
    pub replies: Vec<ReplyRequest>,
    /// New cursor address from IC or EAU
    pub cursor_at: Option<Address>,
    pub wcc: Option<Wcc>,
}

/// Interpret one outbound frame against `buffer`
///
/// The frame must not carry its LT terminator. Writes start at the current
/// buffer address.
pub fn process_outbound(data: &[u8], buffer: &mut Buffer) -> TN3270Result<Outcome> {
    DataStreamParser::new(data, buffer).parse()
}

struct DataStreamParser<'a> {
    reader: OutboundReader<'a>,
    buffer: &'a mut Buffer,
    outcome: Outcome,
    field_addr: Option<Address>,
    field_attrs: Attributes,
    /// SA attributes in effect until the next SF, SFE or SBA
    char_attrs: Option<Attributes>,
}

impl<'a> DataStreamParser<'a> {
    fn new(data: &'a [u8], buffer: &'a mut Buffer) -> Self {
        Self {
            reader: OutboundReader::new(data),
            buffer,
            outcome: Outcome::default(),
            field_addr: None,
            field_attrs: DEFAULT_ATTRS,
            char_attrs: None,
        }
    }

    fn parse(mut self) -> TN3270Result<Outcome> {
        let Some(byte) = self.reader.next() else {
            return Ok(self.outcome);
        };
        match CommandCode::from_u8(byte) {
            Some(command) => {
                debug!("{:?} command, {} byte(s) follow", command, self.reader.remaining());
                self.outcome.command = Some(command);
                self.process_command(command)?;
            }
            None => warn!("unknown command 0x{:02X}, frame ignored", byte),
        }
        Ok(self.outcome)
    }

    fn process_command(&mut self, command: CommandCode) -> TN3270Result<()> {
        match command {
            CommandCode::Write => self.process_write(false),
            CommandCode::EraseWrite | CommandCode::EraseWriteAlternate => self.process_write(true),
            CommandCode::EraseAllUnprotected => {
                self.process_erase_all_unprotected();
                Ok(())
            }
            CommandCode::ReadBuffer => {
                self.outcome.replies.push(ReplyRequest::ReadBuffer);
                Ok(())
            }
            CommandCode::ReadModified => {
                self.outcome.replies.push(ReplyRequest::ReadModified);
                Ok(())
            }
            CommandCode::ReadModifiedAll => {
                self.outcome.replies.push(ReplyRequest::ReadModifiedAll);
                Ok(())
            }
            CommandCode::WriteStructuredField => self.process_write_structured_field(),
        }
    }

    fn process_write(&mut self, erase: bool) -> TN3270Result<()> {
        let Some(byte) = self.reader.next() else {
            debug!("write without WCC ignored");
            return Ok(());
        };
        let wcc = Wcc::from_u8(byte);
        if erase {
            self.reset();
        }
        if wcc.reset {
            debug!("WCC reset");
        }
        if wcc.reset_mdt {
            self.buffer.reset_mdt();
        }
        self.outcome.wcc = Some(wcc);

        self.load_field_context(self.buffer.addr());
        self.process_orders()?;
        self.outcome.render = true;
        Ok(())
    }

    fn process_erase_all_unprotected(&mut self) {
        let fields = Fields::build(self.buffer);
        if let Some(start) = fields.erase_all_unprotected(self.buffer) {
            self.outcome.cursor_at = Some(self.buffer.wrap(start + 1));
        }
        self.outcome.render = true;
    }

    fn process_write_structured_field(&mut self) -> TN3270Result<()> {
        for sfld in StructuredField::parse_all(&mut self.reader)? {
            debug!("structured field 0x{:02X}, {} byte(s)", sfld.id, sfld.info.len());
            match sfld.id {
                SF_READ_PARTITION => self.process_read_partition(&sfld.info),
                SF_SET_REPLY_MODE => self.process_set_reply_mode(&sfld.info),
                other => debug!("structured field 0x{:02X} ignored", other),
            }
        }
        Ok(())
    }

    fn process_read_partition(&mut self, info: &[u8]) {
        let (Some(&pid), Some(&operation)) = (info.first(), info.get(1)) else {
            warn!("read partition too short ({} byte(s)), ignored", info.len());
            return;
        };
        if pid != PID_QUERY {
            debug!("read partition for partition 0x{:02X} ignored", pid);
            return;
        }
        let request = match operation {
            RP_QUERY => ReplyRequest::Query,
            RP_QUERY_LIST => {
                let request_type = info.get(2).copied().unwrap_or(0);
                if request_type & QL_ALL != 0 {
                    ReplyRequest::QueryList(SUPPORTED_QCODES[1..].to_vec())
                } else {
                    ReplyRequest::QueryList(info.get(3..).unwrap_or(&[]).to_vec())
                }
            }
            RP_READ_BUFFER => ReplyRequest::ReadBuffer,
            RP_READ_MODIFIED => ReplyRequest::ReadModified,
            RP_READ_MODIFIED_ALL => ReplyRequest::ReadModifiedAll,
            other => {
                debug!("read partition operation 0x{:02X} ignored", other);
                return;
            }
        };
        self.outcome.replies.push(request);
    }

    fn process_set_reply_mode(&mut self, info: &[u8]) {
        match info.get(1).and_then(|&mode| ReplyMode::from_u8(mode)) {
            Some(mode) => {
                debug!("reply mode {:?}", mode);
                self.buffer.set_mode(mode);
            }
            None => debug!("set reply mode {:02X?} ignored", info),
        }
    }

    fn process_orders(&mut self) -> TN3270Result<()> {
        while let Some(byte) = self.reader.next() {
            match OrderCode::from_u8(byte) {
                Some(order) => {
                    trace!("{} at {}", order.mnemonic(), self.buffer.addr());
                    self.process_order(order)?;
                }
                None => {
                    let attrs = self.current_attrs();
                    self.write_char(byte, attrs);
                }
            }
        }
        Ok(())
    }

    fn process_order(&mut self, order: OrderCode) -> TN3270Result<()> {
        match order {
            OrderCode::StartField => {
                let byte = self.reader.must_next()?;
                self.start_field(Attributes::from_basic(byte), ReplyMode::Field);
            }
            OrderCode::StartFieldExtended => {
                let count = self.reader.must_next()? as usize;
                let pairs = self.reader.must_next_slice(count * 2)?;
                self.start_field(Attributes::from_extended(pairs), ReplyMode::ExtendedField);
            }
            OrderCode::SetBufferAddress => {
                let addr = self.reader.must_next_address()?;
                self.buffer.seek(addr)?;
                self.load_field_context(addr);
            }
            OrderCode::SetAttribute => {
                let pair = self.reader.must_next_slice(2)?;
                self.buffer.set_mode(ReplyMode::Character);
                self.char_attrs = Some(self.current_attrs().apply_delta(pair));
            }
            OrderCode::ModifyField => {
                let count = self.reader.must_next()? as usize;
                let pairs = self.reader.must_next_slice(count * 2)?;
                self.process_modify_field(pairs)?;
            }
            OrderCode::InsertCursor => {
                self.outcome.cursor_at = Some(self.buffer.addr());
            }
            OrderCode::ProgramTab => {
                return Err(ProtocolError::Unsupported {
                    order: order.to_u8(),
                    mnemonic: order.mnemonic(),
                }
                .into());
            }
            OrderCode::RepeatToAddress => self.process_repeat_to_address()?,
            OrderCode::EraseUnprotectedToAddress => self.process_erase_unprotected_to_address()?,
            OrderCode::GraphicEscape => {
                let byte = self.reader.must_next()?;
                let attrs = self.current_attrs().apply_delta(&[XA_CHARSET, LCID_APL]);
                self.write_char(byte, attrs);
            }
        }
        Ok(())
    }

    fn start_field(&mut self, attrs: Attributes, mode: ReplyMode) {
        if self.buffer.addr() == 0 {
            self.reset();
        }
        self.buffer.set_mode(mode);
        let addr = self.buffer.addr();
        self.buffer.set_and_advance(Cell::field_start(attrs, addr));
        self.field_addr = Some(addr);
        self.field_attrs = data_attrs(attrs);
        self.char_attrs = None;
    }

    fn process_modify_field(&mut self, pairs: &[u8]) -> TN3270Result<()> {
        let addr = self.buffer.addr();
        let cell = self.buffer.peek_mut(addr)?;
        let field_start = cell.is_field_start();
        cell.attrs = cell.attrs.apply_delta(pairs);
        if field_start {
            cell.attrs.char_attr = false;
        }
        self.buffer.get_next();
        Ok(())
    }

    fn process_repeat_to_address(&mut self) -> TN3270Result<()> {
        let stop = self.reader.must_next_address()?;
        self.buffer.peek(stop)?;
        let mut byte = self.reader.must_next()?;
        let mut attrs = self.current_attrs();
        if byte == ORDER_GE {
            byte = self.reader.must_next()?;
            attrs = attrs.apply_delta(&[XA_CHARSET, LCID_APL]);
        }

        let cell = Cell::data(byte, attrs, self.field_addr);
        for _ in 0..self.span(self.buffer.addr(), stop) {
            self.buffer.set_and_advance(cell);
        }
        Ok(())
    }

    fn process_erase_unprotected_to_address(&mut self) -> TN3270Result<()> {
        let stop = self.reader.must_next_address()?;
        self.buffer.peek(stop)?;

        let start = self.buffer.addr();
        let mut owner = self.owning_field_start(start);
        for k in 0..self.span(start, stop) {
            let addr = self.buffer.wrap(start + k);
            let cell = *self.buffer.peek(addr)?;
            if cell.is_field_start() {
                owner = Some(addr);
                continue;
            }
            let owner_attrs = match owner {
                Some(field_start) => Some(self.buffer.peek(field_start)?.attrs),
                None => None,
            };
            let protected = owner_attrs.map_or(cell.attrs.protected, |attrs| attrs.protected);
            if !protected {
                let attrs = owner_attrs.map_or(cell.attrs, data_attrs);
                self.buffer.replace(addr, Cell::data(0x00, attrs, owner))?;
            }
        }
        self.buffer.seek(stop)?;
        Ok(())
    }

    fn write_char(&mut self, byte: u8, attrs: Attributes) {
        self.buffer.set_and_advance(Cell::data(byte, attrs, self.field_addr));
    }

    fn current_attrs(&self) -> Attributes {
        self.char_attrs.unwrap_or(self.field_attrs)
    }

    fn reset(&mut self) {
        self.buffer.reset();
        self.outcome.erased = true;
        self.outcome.cursor_at = None;
        self.field_addr = None;
        self.field_attrs = DEFAULT_ATTRS;
        self.char_attrs = None;
    }

    /// Adopt the field that owns `addr`; any SA in effect ends
    fn load_field_context(&mut self, addr: Address) {
        self.field_addr = self.owning_field_start(addr);
        self.field_attrs = match self.field_addr {
            Some(start) => data_attrs(self.buffer.cells()[start].attrs),
            None => DEFAULT_ATTRS,
        };
        self.char_attrs = None;
    }

    /// Nearest field-start cell at or before `addr`, wrapping
    fn owning_field_start(&self, addr: Address) -> Option<Address> {
        (0..self.buffer.len())
            .map(|k| self.buffer.offset(addr, -(k as isize)))
            .find(|&a| self.buffer.cells()[a].is_field_start())
    }

    /// Cells from `start` up to `stop` exclusive; the whole buffer when they are equal
    fn span(&self, start: Address, stop: Address) -> usize {
        let len = self.buffer.len();
        if start == stop {
            len
        } else {
            (stop + len - start) % len
        }
    }
}

/// Field attributes as carried by the field's data cells
fn data_attrs(mut attrs: Attributes) -> Attributes {
    attrs.char_attr = false;
    attrs.default = false;
    attrs
}
