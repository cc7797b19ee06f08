//! Property tests for field partitioning, read-buffer round trips,
//! repeat-to-address and tabbing

use std::collections::BTreeSet;

use proptest::prelude::*;
use tn3270r::lib3270::*;
use tn3270r::protocol_common::Cp037Codec;

const ROWS: usize = 4;
const COLS: usize = 20;
const LEN: usize = ROWS * COLS;

fn buffer_with_fields(starts: &BTreeSet<usize>, protected: &[bool]) -> Buffer {
    let mut buffer = Buffer::new(ROWS, COLS).unwrap();
    for (ix, &start) in starts.iter().enumerate() {
        let basic = if protected[ix % protected.len()] { ATTR_PROTECTED } else { 0x00 };
        buffer.replace(start, Cell::field_start(Attributes::from_basic(basic), start)).unwrap();
    }
    buffer
}

fn arb_starts() -> impl Strategy<Value = BTreeSet<usize>> {
    prop::collection::btree_set(0..LEN, 1..12)
}

/// One piece of a generated Write data stream
#[derive(Debug, Clone)]
enum WriteOrder {
    Address(usize),
    Field(u8),
    /// BASIC first, then optional highlighting and color
    ExtendedField(u8, Option<u8>, Option<u8>),
    CharAttr(u8, u8),
    Text(Vec<u8>),
}

fn arb_basic() -> impl Strategy<Value = u8> {
    (any::<bool>(), any::<bool>(), 0u8..4, any::<bool>()).prop_map(|(protected, numeric, display, mdt)| {
        let mut byte = display << 2;
        if protected {
            byte |= ATTR_PROTECTED;
        }
        if numeric {
            byte |= ATTR_NUMERIC;
        }
        if mdt {
            byte |= ATTR_MDT;
        }
        byte
    })
}

fn arb_write_order() -> impl Strategy<Value = WriteOrder> {
    let highlights = vec![
        HIGHLIGHT_NONE,
        HIGHLIGHT_BLINK,
        HIGHLIGHT_REVERSE,
        HIGHLIGHT_UNDERSCORE,
        HIGHLIGHT_INTENSIFY,
    ];
    prop_oneof![
        (0..LEN).prop_map(WriteOrder::Address),
        arb_basic().prop_map(WriteOrder::Field),
        (
            arb_basic(),
            prop::option::of(prop::sample::select(highlights)),
            prop::option::of(COLOR_BLUE..=COLOR_WHITE),
        )
            .prop_map(|(basic, highlight, color)| WriteOrder::ExtendedField(basic, highlight, color)),
        (prop::sample::select(vec![XA_HIGHLIGHTING, XA_COLOR]), 0xF0u8..=0xF7)
            .prop_map(|(typecode, value)| WriteOrder::CharAttr(typecode, value)),
        prop::collection::vec(0x40u8..=0xFE, 1..12).prop_map(WriteOrder::Text),
    ]
}

fn erase_write(orders: &[WriteOrder]) -> Vec<u8> {
    let mut frame = vec![CMD_EW, 0x00];
    for order in orders {
        match order {
            WriteOrder::Address(addr) => {
                frame.push(ORDER_SBA);
                frame.extend_from_slice(&addressing::encode(*addr, LEN));
            }
            WriteOrder::Field(basic) => frame.extend_from_slice(&[ORDER_SF, *basic]),
            WriteOrder::ExtendedField(basic, highlight, color) => {
                let mut pairs = vec![XA_BASIC, *basic];
                if let Some(highlight) = highlight {
                    pairs.extend_from_slice(&[XA_HIGHLIGHTING, *highlight]);
                }
                if let Some(color) = color {
                    pairs.extend_from_slice(&[XA_COLOR, *color]);
                }
                frame.push(ORDER_SFE);
                frame.push((pairs.len() / 2) as u8);
                frame.extend_from_slice(&pairs);
            }
            WriteOrder::CharAttr(typecode, value) => frame.extend_from_slice(&[ORDER_SA, *typecode, *value]),
            WriteOrder::Text(text) => frame.extend_from_slice(text),
        }
    }
    frame
}

proptest! {
    /// Fields cover the buffer exactly once and every cell belongs to the
    /// nearest field start at or before it
    #[test]
    fn test_fields_partition_buffer(starts in arb_starts(), protected in prop::collection::vec(any::<bool>(), 1..4)) {
        let mut buffer = buffer_with_fields(&starts, &protected);
        let fields = Fields::build(&mut buffer);

        prop_assert_eq!(fields.len(), starts.len());
        prop_assert_eq!(fields.iter().map(|field| field.len).sum::<usize>(), LEN);

        for addr in 0..LEN {
            let owner = starts
                .range(..=addr)
                .next_back()
                .or_else(|| starts.iter().next_back())
                .copied();
            prop_assert_eq!(buffer.peek(addr).unwrap().field_addr, owner);
        }
    }

    /// A Read Buffer body written back with EW rebuilds the same fields,
    /// characters and field attributes
    #[test]
    fn test_read_buffer_round_trip(orders in prop::collection::vec(arb_write_order(), 0..24), extended in any::<bool>()) {
        let mode = if extended { ReplyMode::ExtendedField } else { ReplyMode::Field };
        let mut original = Buffer::new(ROWS, COLS).unwrap();
        process_outbound(&erase_write(&orders), &mut original).unwrap();
        let fields = Fields::build(&mut original);
        let body = fields.read_buffer(&original, mode);

        let mut frame = vec![CMD_EW, 0x00];
        frame.extend_from_slice(&body);
        let mut copy = Buffer::new(ROWS, COLS).unwrap();
        process_outbound(&frame, &mut copy).unwrap();
        let copied = Fields::build(&mut copy);

        prop_assert_eq!(copied.iter().collect::<Vec<_>>(), fields.iter().collect::<Vec<_>>());
        for (addr, (cell, copied_cell)) in original.cells().iter().zip(copy.cells()).enumerate() {
            prop_assert_eq!(cell.char, copied_cell.char, "char at {}", addr);
            prop_assert_eq!(cell.field_addr, copied_cell.field_addr, "owner at {}", addr);
        }
        prop_assert_eq!(copied.read_buffer(&copy, mode), body);
    }

    /// RA with the stop address equal to the current address fills everything
    #[test]
    fn test_repeat_to_address_fills_buffer(start in 0..LEN, ch in 0x41u8..0xFE) {
        let mut buffer = Buffer::new(ROWS, COLS).unwrap();
        let mut frame = vec![CMD_W, 0x00, ORDER_SBA];
        frame.extend_from_slice(&addressing::encode(start, LEN));
        frame.push(ORDER_RA);
        frame.extend_from_slice(&addressing::encode(start, LEN));
        frame.push(ch);
        process_outbound(&frame, &mut buffer).unwrap();

        prop_assert!(buffer.cells().iter().all(|cell| cell.char == ch));
        prop_assert_eq!(buffer.addr(), start);
    }

    /// Forward tab visits every unprotected field's first data cell once per cycle
    #[test]
    fn test_tab_visits_every_input_field(starts in arb_starts(), protected in prop::collection::vec(any::<bool>(), 1..4), from in 0..LEN) {
        let mut buffer = buffer_with_fields(&starts, &protected);
        let fields = Fields::build(&mut buffer);
        let homes: BTreeSet<usize> = fields
            .iter()
            .filter(|field| !field.attrs(&buffer).protected && field.data_len() > 0)
            .map(|field| field.home(LEN))
            .collect();

        let mut status = Status { cursor_at: from, ..Status::default() };
        let mut visited = Vec::new();
        for _ in 0..homes.len().max(1) {
            KeyboardEditor::new(&mut buffer, &fields, &mut status, &Cp037Codec)
                .keystroke(&KeyEvent::named("Tab"));
            if status.alarm {
                break;
            }
            visited.push(status.cursor_at);
        }

        if homes.is_empty() {
            prop_assert!(visited.is_empty());
        } else {
            let seen: BTreeSet<usize> = visited.iter().copied().collect();
            prop_assert_eq!(visited.len(), homes.len());
            prop_assert_eq!(seen, homes);
        }
    }

    /// Buffer addresses survive encoding in both addressing modes
    #[test]
    fn test_address_encoding(addr in 0..addressing::MAX_14BIT) {
        let [b1, b2] = addressing::encode_14bit(addr);
        prop_assert_eq!(addressing::decode(b1, b2), addr);
        if addr < addressing::MAX_12BIT {
            let [b1, b2] = addressing::encode_12bit(addr);
            prop_assert_eq!(addressing::decode(b1, b2), addr);
        }
    }
}
