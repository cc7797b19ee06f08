//! Query Reply structured fields
//!
//! Each reply describes one device capability in answer to a Read Partition
//! Query or Query List. Layouts follow GA23-0059, chapter 6.

use super::codes::*;
use super::stream::StructuredField;
use crate::config::TerminalConfig;
use crate::protocol_common::ebcdic::ascii_to_ebcdic;

/// Name reported in the RPQ Names reply
pub const RPQ_NAME: &str = "TN3270R";

/// Every supported reply, in the order `Query` emits them
pub const SUPPORTED_QCODES: [u8; 12] = [
    QR_SUMMARY,
    QR_USABLE_AREA,
    QR_ALPHANUMERIC_PARTITIONS,
    QR_CHARACTER_SETS,
    QR_COLOR_SUPPORT,
    QR_HIGHLIGHTING,
    QR_REPLY_MODES,
    QR_FIELD_VALIDATION,
    QR_FIELD_OUTLINING,
    QR_DDM,
    QR_RPQ_NAMES,
    QR_IMPLICIT_PARTITION,
];

/// Framed reply for one query code, or `None` if the code is not supported
pub fn query_reply(qcode: u8, config: &TerminalConfig) -> Option<Vec<u8>> {
    let body = match qcode {
        QR_SUMMARY => SUPPORTED_QCODES.to_vec(),
        QR_USABLE_AREA => usable_area(config),
        QR_ALPHANUMERIC_PARTITIONS => alphanumeric_partitions(config),
        QR_CHARACTER_SETS => character_sets(config),
        QR_COLOR_SUPPORT => color_support(config.monochrome),
        QR_HIGHLIGHTING => highlighting(),
        QR_REPLY_MODES => vec![
            ReplyMode::Field.to_u8(),
            ReplyMode::ExtendedField.to_u8(),
            ReplyMode::Character.to_u8(),
        ],
        // mandatory fill, mandatory entry, trigger
        QR_FIELD_VALIDATION => vec![0b0000_0111],
        QR_FIELD_OUTLINING => vec![0x00, 0x80, 0x00, 0x00, 0x00, 0x00],
        QR_DDM => ddm(),
        QR_RPQ_NAMES => rpq_names(),
        QR_IMPLICIT_PARTITION => implicit_partition(config),
        _ => return None,
    };

    let mut info = Vec::with_capacity(body.len() + 1);
    info.push(qcode);
    info.extend_from_slice(&body);
    Some(StructuredField { id: SF_QUERY_REPLY, info }.to_bytes())
}

fn dimension(value: usize) -> [u8; 2] {
    (value as u16).to_be_bytes()
}

fn usable_area(config: &TerminalConfig) -> Vec<u8> {
    let mut body = vec![0b0000_0001, 0b0000_0000];
    body.extend_from_slice(&dimension(config.cols));
    body.extend_from_slice(&dimension(config.rows));
    // units: millimetres
    body.push(0x01);
    body.extend_from_slice(&[0x00; 4]);
    body.extend_from_slice(&[0x00; 4]);
    body.push(config.cell_width);
    body.push(config.cell_height);
    body.extend_from_slice(&dimension(config.rows * config.cols));
    body
}

fn alphanumeric_partitions(config: &TerminalConfig) -> Vec<u8> {
    let mut body = vec![0x00];
    body.extend_from_slice(&dimension(config.rows * config.cols));
    body.push(0x00);
    body
}

fn character_sets(config: &TerminalConfig) -> Vec<u8> {
    let mut body = vec![0b1000_0010, 0b0000_0000, config.cell_width, config.cell_height];
    body.extend_from_slice(&[0x00; 4]);
    // descriptor length, then the base set and the GE alternate set
    body.push(0x03);
    body.extend_from_slice(&[0x00, 0b0001_0000, 0x00]);
    body.extend_from_slice(&[0x01, 0b0000_0000, LCID_APL]);
    body
}

fn color_support(monochrome: bool) -> Vec<u8> {
    let mut pairs = vec![COLOR_DEFAULT, COLOR_GREEN];
    for color in 0xF1..=0xFEu8 {
        pairs.push(color);
        pairs.push(if monochrome { 0x00 } else { color });
    }
    let mut body = vec![0x00, (pairs.len() / 2) as u8];
    body.extend_from_slice(&pairs);
    body
}

fn highlighting() -> Vec<u8> {
    let pairs = [
        (HIGHLIGHT_DEFAULT, HIGHLIGHT_NONE),
        (HIGHLIGHT_BLINK, HIGHLIGHT_BLINK),
        (HIGHLIGHT_REVERSE, HIGHLIGHT_REVERSE),
        (HIGHLIGHT_UNDERSCORE, HIGHLIGHT_UNDERSCORE),
        (HIGHLIGHT_INTENSIFY, HIGHLIGHT_INTENSIFY),
    ];
    let mut body = vec![pairs.len() as u8];
    for (value, action) in pairs {
        body.push(value);
        body.push(action);
    }
    body
}

fn ddm() -> Vec<u8> {
    let mut body = vec![0x00, 0x00];
    body.extend_from_slice(&16384u16.to_be_bytes());
    body.extend_from_slice(&16384u16.to_be_bytes());
    body.push(0x01);
    body.push(0x01);
    body
}

fn rpq_names() -> Vec<u8> {
    let mut body = vec![0x00; 8];
    body.push((RPQ_NAME.len() + 1) as u8);
    body.extend(RPQ_NAME.chars().map(ascii_to_ebcdic));
    body
}

fn implicit_partition(config: &TerminalConfig) -> Vec<u8> {
    let mut body = vec![0x00, 0x00, 0x0B, 0x01, 0x00];
    body.extend_from_slice(&dimension(config.cols));
    body.extend_from_slice(&dimension(config.rows));
    body.extend_from_slice(&dimension(config.cols));
    body.extend_from_slice(&dimension(config.rows));
    body
}
