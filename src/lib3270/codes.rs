/// 3270 Data Stream Constants
///
/// Command codes, orders, WCC bits, AIDs, attribute type codes and
/// structured field identifiers used on the 3270 wire.
///
/// # References
/// - IBM 3270 Data Stream Programmer's Reference (GA23-0059)
/// - RFC 2355: TN3270 Enhancements

/// 3270 Command Codes, SNA encoding
pub const CMD_W: u8 = 0xF1;               // Write
pub const CMD_EW: u8 = 0xF5;              // Erase/Write
pub const CMD_EWA: u8 = 0x7E;             // Erase/Write Alternate
pub const CMD_EAU: u8 = 0x6F;             // Erase All Unprotected
pub const CMD_WSF: u8 = 0xF3;             // Write Structured Field
pub const CMD_RB: u8 = 0xF2;              // Read Buffer
pub const CMD_RM: u8 = 0xF6;              // Read Modified
pub const CMD_RMA: u8 = 0x6E;             // Read Modified All

/// 3270 Command Codes, local (CCW) encoding
pub const CMD_LOCAL_W: u8 = 0x01;
pub const CMD_LOCAL_EW: u8 = 0x05;
pub const CMD_LOCAL_EWA: u8 = 0x0D;
pub const CMD_LOCAL_EAU: u8 = 0x0F;
pub const CMD_LOCAL_WSF: u8 = 0x11;
pub const CMD_LOCAL_RB: u8 = 0x02;
pub const CMD_LOCAL_RM: u8 = 0x06;
pub const CMD_LOCAL_RMA: u8 = 0x0E;

/// 3270 Order Codes
pub const ORDER_PT: u8 = 0x05;    // Program Tab
pub const ORDER_GE: u8 = 0x08;    // Graphic Escape
pub const ORDER_SBA: u8 = 0x11;   // Set Buffer Address
pub const ORDER_EUA: u8 = 0x12;   // Erase Unprotected to Address
pub const ORDER_IC: u8 = 0x13;    // Insert Cursor
pub const ORDER_SF: u8 = 0x1D;    // Start Field
pub const ORDER_SA: u8 = 0x28;    // Set Attribute
pub const ORDER_SFE: u8 = 0x29;   // Start Field Extended
pub const ORDER_MF: u8 = 0x2C;    // Modify Field
pub const ORDER_RA: u8 = 0x3C;    // Repeat to Address

/// Character stored in a field-start cell
pub const FIELD_START: u8 = ORDER_SF;

/// Write Control Character (WCC) Bits
pub const WCC_RESET: u8 = 0x40;
pub const WCC_ALARM: u8 = 0x04;
pub const WCC_RESTORE: u8 = 0x02;         // Unlock keyboard
pub const WCC_RESET_MDT: u8 = 0x01;

/// Inbound frame terminator (IAC EOR)
pub const LT: [u8; 2] = [0xFF, 0xEF];

/// AID (Attention Identifier) values
pub const AID_NO_AID: u8 = 0x60;
pub const AID_STRUCTURED_FIELD: u8 = 0x88;
pub const AID_CLEAR: u8 = 0x6D;
pub const AID_ENTER: u8 = 0x7D;
pub const AID_PA1: u8 = 0x6C;
pub const AID_PA2: u8 = 0x6E;
pub const AID_PA3: u8 = 0x6B;

/// PF1 through PF24, indexed by key number minus one
pub const AID_PF: [u8; 24] = [
    0xF1, 0xF2, 0xF3, 0xF4, 0xF5, 0xF6, 0xF7, 0xF8, 0xF9, 0x7A, 0x7B, 0x7C,
    0xC1, 0xC2, 0xC3, 0xC4, 0xC5, 0xC6, 0xC7, 0xC8, 0xC9, 0x4A, 0x4B, 0x4C,
];

/// Field Attribute Byte Bits
pub const ATTR_PROTECTED: u8 = 0x20;      // Bit 5: Protected field
pub const ATTR_NUMERIC: u8 = 0x10;        // Bit 4: Numeric field
pub const ATTR_INTENSIFIED: u8 = 0x08;    // Bit 3: Intensified display
pub const ATTR_HIDDEN: u8 = 0x0C;         // Bits 2-3: Non-display
pub const ATTR_MDT: u8 = 0x01;            // Bit 0: Modified Data Tag

/// Extended Attribute Type Codes
pub const XA_BASIC: u8 = 0xC0;            // 3270 field attribute
pub const XA_HIGHLIGHTING: u8 = 0x41;
pub const XA_COLOR: u8 = 0x42;            // Foreground color
pub const XA_CHARSET: u8 = 0x43;
pub const XA_OUTLINING: u8 = 0xC2;

/// Color Attribute Values
pub const COLOR_DEFAULT: u8 = 0x00;
pub const COLOR_BLUE: u8 = 0xF1;
pub const COLOR_RED: u8 = 0xF2;
pub const COLOR_PINK: u8 = 0xF3;
pub const COLOR_GREEN: u8 = 0xF4;
pub const COLOR_TURQUOISE: u8 = 0xF5;
pub const COLOR_YELLOW: u8 = 0xF6;
pub const COLOR_WHITE: u8 = 0xF7;         // Foreground default

/// Highlighting Attribute Values
pub const HIGHLIGHT_DEFAULT: u8 = 0x00;
pub const HIGHLIGHT_NONE: u8 = 0xF0;
pub const HIGHLIGHT_BLINK: u8 = 0xF1;
pub const HIGHLIGHT_REVERSE: u8 = 0xF2;
pub const HIGHLIGHT_UNDERSCORE: u8 = 0xF4;
pub const HIGHLIGHT_INTENSIFY: u8 = 0xF8;

/// Field Outlining Bits
pub const OUTLINE_BOTTOM: u8 = 0x01;
pub const OUTLINE_RIGHT: u8 = 0x02;
pub const OUTLINE_TOP: u8 = 0x04;
pub const OUTLINE_LEFT: u8 = 0x08;

/// Alternate character set selected by Graphic Escape
pub const LCID_APL: u8 = 0xF1;

/// Structured Field IDs
pub const SF_READ_PARTITION: u8 = 0x01;
pub const SF_SET_REPLY_MODE: u8 = 0x09;
pub const SF_QUERY_REPLY: u8 = 0x81;

/// Read Partition operation types
pub const RP_QUERY: u8 = 0x02;
pub const RP_QUERY_LIST: u8 = 0x03;
pub const RP_READ_BUFFER: u8 = 0xF2;
pub const RP_READ_MODIFIED: u8 = 0xF6;
pub const RP_READ_MODIFIED_ALL: u8 = 0x6E;

/// Query List request type flag meaning "all"
pub const QL_ALL: u8 = 0x80;

/// Partition id addressed by Read Partition Query
pub const PID_QUERY: u8 = 0xFF;

/// Query Reply codes
pub const QR_SUMMARY: u8 = 0x80;
pub const QR_USABLE_AREA: u8 = 0x81;
pub const QR_ALPHANUMERIC_PARTITIONS: u8 = 0x84;
pub const QR_CHARACTER_SETS: u8 = 0x85;
pub const QR_COLOR_SUPPORT: u8 = 0x86;
pub const QR_HIGHLIGHTING: u8 = 0x87;
pub const QR_REPLY_MODES: u8 = 0x88;
pub const QR_FIELD_VALIDATION: u8 = 0x8A;
pub const QR_FIELD_OUTLINING: u8 = 0x8C;
pub const QR_DDM: u8 = 0x95;
pub const QR_RPQ_NAMES: u8 = 0xA1;
pub const QR_IMPLICIT_PARTITION: u8 = 0xA6;

/// Enum representation of 3270 command codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandCode {
    Write,
    EraseWrite,
    EraseWriteAlternate,
    EraseAllUnprotected,
    WriteStructuredField,
    ReadBuffer,
    ReadModified,
    ReadModifiedAll,
}

impl CommandCode {
    /// Decode a command byte in either the SNA or the local encoding
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            CMD_W | CMD_LOCAL_W => Some(Self::Write),
            CMD_EW | CMD_LOCAL_EW => Some(Self::EraseWrite),
            CMD_EWA | CMD_LOCAL_EWA => Some(Self::EraseWriteAlternate),
            CMD_EAU | CMD_LOCAL_EAU => Some(Self::EraseAllUnprotected),
            CMD_WSF | CMD_LOCAL_WSF => Some(Self::WriteStructuredField),
            CMD_RB | CMD_LOCAL_RB => Some(Self::ReadBuffer),
            CMD_RM | CMD_LOCAL_RM => Some(Self::ReadModified),
            CMD_RMA | CMD_LOCAL_RMA => Some(Self::ReadModifiedAll),
            _ => None,
        }
    }

    /// SNA encoding of the command
    pub fn to_u8(self) -> u8 {
        match self {
            Self::Write => CMD_W,
            Self::EraseWrite => CMD_EW,
            Self::EraseWriteAlternate => CMD_EWA,
            Self::EraseAllUnprotected => CMD_EAU,
            Self::WriteStructuredField => CMD_WSF,
            Self::ReadBuffer => CMD_RB,
            Self::ReadModified => CMD_RM,
            Self::ReadModifiedAll => CMD_RMA,
        }
    }
}

/// Enum representation of 3270 order codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderCode {
    StartField = ORDER_SF as isize,
    StartFieldExtended = ORDER_SFE as isize,
    SetBufferAddress = ORDER_SBA as isize,
    SetAttribute = ORDER_SA as isize,
    ModifyField = ORDER_MF as isize,
    InsertCursor = ORDER_IC as isize,
    ProgramTab = ORDER_PT as isize,
    RepeatToAddress = ORDER_RA as isize,
    EraseUnprotectedToAddress = ORDER_EUA as isize,
    GraphicEscape = ORDER_GE as isize,
}

impl OrderCode {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            ORDER_SF => Some(Self::StartField),
            ORDER_SFE => Some(Self::StartFieldExtended),
            ORDER_SBA => Some(Self::SetBufferAddress),
            ORDER_SA => Some(Self::SetAttribute),
            ORDER_MF => Some(Self::ModifyField),
            ORDER_IC => Some(Self::InsertCursor),
            ORDER_PT => Some(Self::ProgramTab),
            ORDER_RA => Some(Self::RepeatToAddress),
            ORDER_EUA => Some(Self::EraseUnprotectedToAddress),
            ORDER_GE => Some(Self::GraphicEscape),
            _ => None,
        }
    }

    pub fn to_u8(self) -> u8 {
        self as u8
    }

    /// Mnemonic used in diagnostics
    pub fn mnemonic(self) -> &'static str {
        match self {
            Self::StartField => "SF",
            Self::StartFieldExtended => "SFE",
            Self::SetBufferAddress => "SBA",
            Self::SetAttribute => "SA",
            Self::ModifyField => "MF",
            Self::InsertCursor => "IC",
            Self::ProgramTab => "PT",
            Self::RepeatToAddress => "RA",
            Self::EraseUnprotectedToAddress => "EUA",
            Self::GraphicEscape => "GE",
        }
    }
}

/// Attention identifier sent at the head of every inbound frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AidKey {
    NoAid,
    StructuredField,
    Enter,
    Clear,
    PA(u8),
    PF(u8),
}

impl AidKey {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            AID_NO_AID => Some(Self::NoAid),
            AID_STRUCTURED_FIELD => Some(Self::StructuredField),
            AID_ENTER => Some(Self::Enter),
            AID_CLEAR => Some(Self::Clear),
            AID_PA1 => Some(Self::PA(1)),
            AID_PA2 => Some(Self::PA(2)),
            AID_PA3 => Some(Self::PA(3)),
            _ => AID_PF
                .iter()
                .position(|&b| b == value)
                .map(|ix| Self::PF(ix as u8 + 1)),
        }
    }

    /// Wire value. Out-of-range PA/PF numbers map to `AID_NO_AID`.
    pub fn to_u8(self) -> u8 {
        match self {
            Self::NoAid => AID_NO_AID,
            Self::StructuredField => AID_STRUCTURED_FIELD,
            Self::Enter => AID_ENTER,
            Self::Clear => AID_CLEAR,
            Self::PA(1) => AID_PA1,
            Self::PA(2) => AID_PA2,
            Self::PA(3) => AID_PA3,
            Self::PA(_) => AID_NO_AID,
            Self::PF(n @ 1..=24) => AID_PF[n as usize - 1],
            Self::PF(_) => AID_NO_AID,
        }
    }

    /// Short-read AIDs carry no cursor address or field data
    pub fn is_short_read(self) -> bool {
        matches!(self, Self::Clear | Self::PA(_))
    }
}

/// Granularity at which Read Buffer reports attributes
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum ReplyMode {
    #[default]
    Field = 0x00,
    ExtendedField = 0x01,
    Character = 0x02,
}

impl ReplyMode {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x00 => Some(Self::Field),
            0x01 => Some(Self::ExtendedField),
            0x02 => Some(Self::Character),
            _ => None,
        }
    }

    pub fn to_u8(self) -> u8 {
        self as u8
    }
}

/// Decoded Write Control Character
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Wcc {
    pub alarm: bool,
    pub reset: bool,
    pub reset_mdt: bool,
    pub unlock: bool,
}

impl Wcc {
    pub fn from_u8(value: u8) -> Self {
        Self {
            alarm: value & WCC_ALARM != 0,
            reset: value & WCC_RESET != 0,
            reset_mdt: value & WCC_RESET_MDT != 0,
            unlock: value & WCC_RESTORE != 0,
        }
    }

    pub fn to_u8(self) -> u8 {
        let mut value = 0;
        if self.alarm {
            value |= WCC_ALARM;
        }
        if self.reset {
            value |= WCC_RESET;
        }
        if self.reset_mdt {
            value |= WCC_RESET_MDT;
        }
        if self.unlock {
            value |= WCC_RESTORE;
        }
        value
    }
}
