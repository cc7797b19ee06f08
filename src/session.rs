//! Terminal session
//!
//! A `Session` owns one terminal's buffer, fields and status, and wires the
//! outbound interpreter, the keyboard editor and the inbound producer
//! together. Sessions share nothing; each can be driven from its own task.

use std::fmt;

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use uuid::Uuid;

use crate::config::{TerminalConfig, KEY_CODEPAGE};
use crate::error::{ConfigError, SessionError, TN3270Error, TN3270Result};
use crate::lib3270::buffer::{Address, Buffer};
use crate::lib3270::codes::{AidKey, LT};
use crate::lib3270::field::Fields;
use crate::lib3270::keyboard::{KeyEvent, KeyboardEditor};
use crate::lib3270::producer::Producer;
use crate::lib3270::protocol::{process_outbound, Outcome};
use crate::lib3270::status::Status;
use crate::protocol_common::ebcdic::{codec_for, CharsetCodec};

/// Receives session notifications; every method defaults to a no-op
pub trait TerminalObserver: Send {
    /// An inbound frame is ready for the host
    fn on_inbound(&self, _frame: &[u8]) {}
    /// The whole screen must be redrawn
    fn on_render(&self) {}
    /// Only these addresses changed
    fn on_render_deltas(&self, _deltas: &[Address]) {}
    fn on_status(&self, _status: &Status) {}
    /// The session hit a fatal error and is closed
    fn on_panic(&self, _reason: &str) {}
}

pub struct Session {
    id: Uuid,
    created_at: DateTime<Utc>,
    config: TerminalConfig,
    buffer: Buffer,
    fields: Fields,
    status: Status,
    codec: Box<dyn CharsetCodec>,
    observers: Vec<Box<dyn TerminalObserver>>,
    closed: bool,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("created_at", &self.created_at)
            .field("config", &self.config)
            .field("status", &self.status)
            .field("codec", &self.codec.name())
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

impl Session {
    pub fn new(config: TerminalConfig) -> TN3270Result<Self> {
        config.validate()?;
        let codec = codec_for(&config.codepage).ok_or_else(|| ConfigError::InvalidParameter {
            parameter: KEY_CODEPAGE.to_string(),
            value: config.codepage.clone(),
            reason: "unknown code page".to_string(),
        })?;

        let buffer = Buffer::new(config.rows, config.cols)?;

        let session = Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            buffer,
            fields: Fields::new(),
            status: Status::default(),
            codec,
            observers: Vec::new(),
            closed: false,
            config,
        };
        info!(
            "session {} created: {}x{} {}",
            session.id,
            session.config.rows,
            session.config.cols,
            session.codec.name()
        );
        Ok(session)
    }

    pub fn add_observer(&mut self, observer: Box<dyn TerminalObserver>) {
        self.observers.push(observer);
    }

    /// Apply outbound data and return the inbound replies it asked for
    ///
    /// `data` may carry several records separated by LT; they are applied
    /// in order and empty records are skipped. A fatal error closes the
    /// session and drops the replies of earlier records in the same call.
    pub fn outbound(&mut self, data: &[u8]) -> TN3270Result<Vec<Vec<u8>>> {
        self.ensure_open()?;
        let mut records = split_records(data);
        if records.is_empty() {
            records.push(&[]);
        }

        let mut frames = Vec::new();
        for record in records {
            frames.extend(self.outbound_record(record)?);
        }
        Ok(frames)
    }

    fn outbound_record(&mut self, data: &[u8]) -> TN3270Result<Vec<Vec<u8>>> {
        self.status.alarm = false;
        self.status.unlock();
        let outcome = match self.interpret(data) {
            Ok(outcome) => outcome,
            Err(err) => return Err(self.fail(err)),
        };

        if outcome.erased {
            self.status = Status::default();
        }
        if let Some(wcc) = outcome.wcc {
            self.status.alarm |= wcc.alarm;
            self.status.locked = !wcc.unlock;
        }
        if let Some(addr) = outcome.cursor_at {
            self.status.cursor_at = addr;
        }
        self.fields = Fields::build(&mut self.buffer);
        self.status.probe(&self.buffer);
        debug!(
            "session {}: {:?} built {} field(s), cursor at {}",
            self.id,
            outcome.command,
            self.fields.len(),
            self.status.cursor_at
        );

        let producer = Producer::new(&self.buffer, &self.fields, &self.config);
        let frames: Vec<Vec<u8>> = outcome
            .replies
            .iter()
            .map(|request| producer.reply(request, self.status.cursor_at))
            .collect();
        if !frames.is_empty() {
            self.status.lock();
        }

        for frame in &frames {
            self.notify(|observer| observer.on_inbound(frame));
        }
        if outcome.render {
            self.notify(|observer| observer.on_render());
        }
        self.notify_status();
        Ok(frames)
    }

    /// Apply one key event and return the inbound frame it produced, if any
    pub fn keystroke(&mut self, event: &KeyEvent) -> TN3270Result<Vec<Vec<u8>>> {
        self.ensure_open()?;
        let outcome = KeyboardEditor::new(
            &mut self.buffer,
            &self.fields,
            &mut self.status,
            self.codec.as_ref(),
        )
        .keystroke(event);

        let mut frames = Vec::new();
        if let Some(aid) = outcome.aid {
            let cleared = aid == AidKey::Clear;
            if cleared {
                self.buffer.reset();
                self.fields.clear();
                self.status = Status::default();
            }
            let producer = Producer::new(&self.buffer, &self.fields, &self.config);
            let frame = producer
                .read_modified(aid, self.status.cursor_at)
                .unwrap_or_else(|| producer.attention(aid));
            debug!("session {}: {:?} sends {} byte(s)", self.id, aid, frame.len());
            self.status.lock();
            self.notify(|observer| observer.on_inbound(&frame));
            if cleared {
                self.notify(|observer| observer.on_render());
            }
            frames.push(frame);
        }

        if !outcome.deltas.is_empty() {
            self.notify(|observer| observer.on_render_deltas(&outcome.deltas));
        }
        self.notify_status();
        Ok(frames)
    }

    pub fn focus(&mut self, focussed: bool) {
        self.status.focus(focussed);
        self.notify_status();
    }

    /// Screen contents, one line per row
    ///
    /// Field starts and nulls show as spaces, as does every hidden cell.
    pub fn screen_text(&self) -> String {
        self.buffer
            .cells()
            .chunks(self.buffer.cols())
            .map(|row| {
                row.iter()
                    .map(|cell| {
                        if cell.is_field_start() || cell.char == 0x00 || cell.attrs.hidden {
                            ' '
                        } else {
                            self.codec.decode(cell.attrs.lcid, cell.char)
                        }
                    })
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn config(&self) -> &TerminalConfig {
        &self.config
    }

    pub fn buffer(&self) -> &Buffer {
        &self.buffer
    }

    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Close the session; later calls fail with `SessionError::Closed`
    pub fn close(&mut self) {
        if !self.closed {
            info!("session {} closed", self.id);
            self.closed = true;
        }
    }

    fn interpret(&mut self, data: &[u8]) -> TN3270Result<Outcome> {
        self.buffer.seek(self.status.cursor_at)?;
        process_outbound(data, &mut self.buffer)
    }

    fn ensure_open(&self) -> TN3270Result<()> {
        if self.closed {
            return Err(SessionError::Closed { id: self.id.to_string() }.into());
        }
        Ok(())
    }

    fn fail(&mut self, err: TN3270Error) -> TN3270Error {
        if err.is_fatal() {
            warn!("session {} failed: {}", self.id, err);
            let reason = err.to_string();
            self.notify(|observer| observer.on_panic(&reason));
            self.close();
        }
        err
    }

    fn notify_status(&self) {
        let status = &self.status;
        self.notify(|observer| observer.on_status(status));
    }

    fn notify(&self, f: impl Fn(&dyn TerminalObserver)) {
        for observer in &self.observers {
            f(observer.as_ref());
        }
    }
}

/// Non-empty LT-delimited records of `data`
fn split_records(mut data: &[u8]) -> Vec<&[u8]> {
    let mut records = Vec::new();
    while let Some(ix) = data.windows(LT.len()).position(|window| window == LT) {
        records.push(&data[..ix]);
        data = &data[ix + LT.len()..];
    }
    records.push(data);
    records.retain(|record| !record.is_empty());
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProtocolError;
    use crate::lib3270::codes::*;
    use std::sync::{Arc, Mutex};

    #[derive(Default, Clone)]
    struct Recorder {
        events: Arc<Mutex<Vec<String>>>,
    }

    impl Recorder {
        fn events(&self) -> Vec<String> {
            self.events.lock().unwrap().clone()
        }
    }

    impl TerminalObserver for Recorder {
        fn on_inbound(&self, frame: &[u8]) {
            self.events.lock().unwrap().push(format!("inbound {}", frame.len()));
        }
        fn on_render(&self) {
            self.events.lock().unwrap().push("render".to_string());
        }
        fn on_render_deltas(&self, deltas: &[Address]) {
            self.events.lock().unwrap().push(format!("deltas {:?}", deltas));
        }
        fn on_panic(&self, reason: &str) {
            self.events.lock().unwrap().push(format!("panic {}", reason));
        }
    }

    fn small_session() -> Session {
        let config = TerminalConfig { rows: 2, cols: 10, ..TerminalConfig::default() };
        Session::new(config).unwrap()
    }

    /// EW, unlock, protected "ID" label, unprotected field at 4, IC
    fn login_frame() -> Vec<u8> {
        let mut frame = vec![CMD_EW, WCC_RESTORE];
        frame.extend_from_slice(&[ORDER_SF, 0x60, 0xC9, 0xC4]);
        frame.extend_from_slice(&[ORDER_SBA, 0x40, 0x44, ORDER_SF, 0x40, ORDER_IC]);
        frame.extend_from_slice(&[ORDER_SBA, 0x40, 0x4A, ORDER_SF, 0x60]);
        frame.extend_from_slice(&LT);
        frame
    }

    #[test]
    fn test_outbound_builds_fields_and_status() {
        let mut session = small_session();
        let replies = session.outbound(&login_frame()).unwrap();
        assert!(replies.is_empty());
        assert_eq!(session.fields().len(), 3);
        assert_eq!(session.status().cursor_at, 5);
        assert!(!session.status().locked);
        assert_eq!(session.screen_text().lines().next().unwrap(), " ID       ");
    }

    #[test]
    fn test_outbound_applies_every_record() {
        let mut session = small_session();
        let mut data = login_frame();
        data.extend_from_slice(&LT);
        data.extend_from_slice(&[CMD_RB]);
        data.extend_from_slice(&LT);

        let replies = session.outbound(&data).unwrap();
        assert_eq!(session.fields().len(), 3);
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0][0], AID_NO_AID);
        // AID, cursor, 20 cells, one attribute byte per field, LT
        assert_eq!(replies[0].len(), 1 + 2 + 20 + 3 + 2);
    }

    #[test]
    fn test_split_records() {
        let data = [CMD_W, 0x00, 0xFF, 0xEF, 0xFF, 0xEF, CMD_RB];
        assert_eq!(split_records(&data), vec![&[CMD_W, 0x00][..], &[CMD_RB][..]]);
        assert!(split_records(&LT).is_empty());
        assert_eq!(split_records(&[0xFF, 0xC1]), vec![&[0xFF, 0xC1][..]]);
    }

    #[test]
    fn test_read_buffer_reply() {
        let mut session = small_session();
        session.outbound(&login_frame()).unwrap();
        let replies = session.outbound(&[CMD_RB]).unwrap();
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0][0], AID_NO_AID);
        assert!(replies[0].ends_with(&LT));
        assert!(session.status().waiting);
    }

    #[test]
    fn test_enter_sends_modified_fields() {
        let mut session = small_session();
        let recorder = Recorder::default();
        session.add_observer(Box::new(recorder.clone()));
        session.outbound(&login_frame()).unwrap();

        session.keystroke(&KeyEvent::char('A')).unwrap();
        let frames = session.keystroke(&KeyEvent::named("Enter")).unwrap();
        assert_eq!(frames, vec![vec![AID_ENTER, 0x40, 0xC6, ORDER_SBA, 0x40, 0xC5, 0xC1, 0xFF, 0xEF]]);
        assert!(session.status().locked && session.status().waiting);
        assert!(recorder.events().contains(&"deltas [5, 6]".to_string()));
        assert!(recorder.events().contains(&"inbound 9".to_string()));
    }

    #[test]
    fn test_clear_resets_screen() {
        let mut session = small_session();
        session.outbound(&login_frame()).unwrap();
        let frames = session.keystroke(&KeyEvent::named("Escape")).unwrap();
        assert_eq!(frames, vec![vec![AID_CLEAR, 0xFF, 0xEF]]);
        assert!(session.fields().is_empty());
        assert_eq!(session.status().cursor_at, 0);
        assert!(session.buffer().cells().iter().all(|cell| cell.char == 0x00));
    }

    #[test]
    fn test_fatal_error_closes_session() {
        let mut session = small_session();
        let recorder = Recorder::default();
        session.add_observer(Box::new(recorder.clone()));

        let err = session.outbound(&[CMD_W, 0x00, ORDER_PT]).unwrap_err();
        assert!(matches!(err, TN3270Error::Protocol(ProtocolError::Unsupported { .. })));
        assert!(session.is_closed());
        assert!(recorder.events()[0].starts_with("panic "));

        let err = session.outbound(&[CMD_W, 0x00]).unwrap_err();
        assert!(matches!(err, TN3270Error::Session(SessionError::Closed { .. })));
    }

    #[test]
    fn test_hidden_fields_are_blank() {
        let mut session = small_session();
        // SF hidden, "PW"
        session.outbound(&[CMD_EW, 0x00, ORDER_SF, 0x4C, 0xD7, 0xE6]).unwrap();
        assert_eq!(session.screen_text(), " ".repeat(10) + "\n" + &" ".repeat(10));
    }

    #[test]
    fn test_unknown_codepage() {
        let config = TerminalConfig { codepage: "cp999".to_string(), ..TerminalConfig::default() };
        let err = Session::new(config).unwrap_err();
        assert!(matches!(err, TN3270Error::Config(ConfigError::InvalidParameter { .. })));
    }

    #[test]
    fn test_focus_updates_status() {
        let mut session = small_session();
        session.focus(false);
        assert_eq!(session.status().message, "LOCK");
        session.focus(true);
        assert!(!session.status().locked);
    }
}
