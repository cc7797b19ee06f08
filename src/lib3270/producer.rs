//! Inbound data stream producer
//!
//! Serializes buffer and field state into the frames a terminal sends to
//! the host. Every frame ends with LT.

use log::debug;

use super::buffer::{Address, Buffer};
use super::codes::*;
use super::field::Fields;
use super::protocol::ReplyRequest;
use super::query::{query_reply, SUPPORTED_QCODES};
use super::stream::InboundWriter;
use crate::config::TerminalConfig;

pub struct Producer<'a> {
    buffer: &'a Buffer,
    fields: &'a Fields,
    config: &'a TerminalConfig,
}

impl<'a> Producer<'a> {
    pub fn new(buffer: &'a Buffer, fields: &'a Fields, config: &'a TerminalConfig) -> Self {
        Self { buffer, fields, config }
    }

    /// Short read: the AID alone
    pub fn attention(&self, aid: AidKey) -> Vec<u8> {
        let mut out = InboundWriter::new();
        out.put(aid.to_u8()).terminate();
        out.into_bytes()
    }

    /// AID, cursor address and the whole buffer in the current reply mode
    pub fn read_buffer(&self, aid: AidKey, cursor_at: Address) -> Vec<u8> {
        let mut out = InboundWriter::new();
        out.put(aid.to_u8())
            .put_address(cursor_at, self.buffer.len())
            .put_slice(&self.fields.read_buffer(self.buffer, self.buffer.mode()))
            .terminate();
        out.into_bytes()
    }

    /// AID, cursor address and every modified field; `None` for short-read AIDs
    pub fn read_modified(&self, aid: AidKey, cursor_at: Address) -> Option<Vec<u8>> {
        if aid.is_short_read() {
            return None;
        }
        let mut out = InboundWriter::new();
        out.put(aid.to_u8())
            .put_address(cursor_at, self.buffer.len())
            .put_slice(&self.fields.read_modified(self.buffer))
            .terminate();
        Some(out.into_bytes())
    }

    /// Every supported Query Reply, Summary first
    pub fn query(&self) -> Vec<u8> {
        self.query_list(&SUPPORTED_QCODES)
    }

    /// The requested Query Replies in request order; unsupported codes are skipped
    pub fn query_list(&self, qcodes: &[u8]) -> Vec<u8> {
        let mut out = InboundWriter::new();
        out.put(AID_STRUCTURED_FIELD);
        for &qcode in qcodes {
            match query_reply(qcode, self.config) {
                Some(reply) => {
                    out.put_slice(&reply);
                }
                None => debug!("query code 0x{:02X} not supported", qcode),
            }
        }
        out.terminate();
        out.into_bytes()
    }

    /// Frame answering a host read request
    pub fn reply(&self, request: &ReplyRequest, cursor_at: Address) -> Vec<u8> {
        match request {
            ReplyRequest::ReadBuffer => self.read_buffer(AidKey::NoAid, cursor_at),
            ReplyRequest::ReadModified | ReplyRequest::ReadModifiedAll => {
                // NoAid is never a short read
                self.read_modified(AidKey::NoAid, cursor_at).unwrap_or_default()
            }
            ReplyRequest::Query => self.query(),
            ReplyRequest::QueryList(qcodes) => self.query_list(qcodes),
        }
    }
}
