//! Field and character attributes
//!
//! A single [`Attributes`] value describes both the legacy one-byte field
//! attribute (SF) and the extended attribute pairs carried by SFE, SA and MF.
//! Every buffer cell owns one, so there is never a cell without attributes.

use std::fmt;

use serde::Serialize;

use super::codes::*;

/// Decoded attribute set for a field or a single character
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Attributes {
    pub autoskip: bool,
    pub blink: bool,
    pub color: u8,
    pub hidden: bool,
    /// Intensified display (basic attribute) or INTENSIFY highlighting
    pub highlight: bool,
    pub lcid: u8,
    pub modified: bool,
    pub numeric: bool,
    pub outline: u8,
    pub protected: bool,
    pub reverse: bool,
    pub underscore: bool,
    /// Produced by a character-level override (SA or MF)
    pub char_attr: bool,
    /// Initial cell state that the owning field may override
    pub default: bool,
}

/// Attributes of a cell that has never been written
pub const DEFAULT_ATTRS: Attributes = Attributes {
    autoskip: true,
    blink: false,
    color: COLOR_DEFAULT,
    hidden: false,
    highlight: false,
    lcid: 0,
    modified: false,
    numeric: true,
    outline: 0,
    protected: true,
    reverse: false,
    underscore: false,
    char_attr: false,
    default: true,
};

impl Attributes {
    /// Decode a basic field attribute byte (SF order)
    pub fn from_basic(byte: u8) -> Self {
        let mut attrs = Self::default();
        attrs.apply_basic(byte);
        attrs
    }

    /// Decode `(typecode, value)` pairs (SFE order). A trailing odd byte is ignored.
    pub fn from_extended(bytes: &[u8]) -> Self {
        let mut attrs = Self::default();
        attrs.apply_pairs(bytes);
        attrs
    }

    /// Copy of `self` with the pairs applied on top, marked as a character attribute
    pub fn apply_delta(&self, bytes: &[u8]) -> Self {
        let mut attrs = *self;
        attrs.apply_pairs(bytes);
        attrs.char_attr = true;
        attrs
    }

    /// Facets of `self` that differ from `other`; equal facets are zeroed
    pub fn diff(&self, other: &Attributes) -> Self {
        fn pick<T: PartialEq + Default + Copy>(a: T, b: T) -> T {
            if a != b { a } else { T::default() }
        }
        Self {
            autoskip: pick(self.autoskip, other.autoskip),
            blink: pick(self.blink, other.blink),
            color: pick(self.color, other.color),
            hidden: pick(self.hidden, other.hidden),
            highlight: pick(self.highlight, other.highlight),
            lcid: pick(self.lcid, other.lcid),
            modified: pick(self.modified, other.modified),
            numeric: pick(self.numeric, other.numeric),
            outline: pick(self.outline, other.outline),
            protected: pick(self.protected, other.protected),
            reverse: pick(self.reverse, other.reverse),
            underscore: pick(self.underscore, other.underscore),
            char_attr: false,
            default: false,
        }
    }

    /// Encode as a basic field attribute byte
    pub fn to_basic_byte(&self) -> u8 {
        let mut byte = 0;
        if self.hidden {
            byte |= ATTR_HIDDEN;
        }
        if self.highlight {
            byte |= ATTR_INTENSIFIED;
        }
        if self.modified {
            byte |= ATTR_MDT;
        }
        if self.numeric {
            byte |= ATTR_NUMERIC;
        }
        if self.protected {
            byte |= ATTR_PROTECTED;
        }
        byte
    }

    /// Encode as extended pairs: BASIC, HIGHLIGHT, COLOR, CHARSET, OUTLINE, always in that order
    pub fn to_extended_bytes(&self) -> Vec<u8> {
        vec![
            XA_BASIC,
            self.to_basic_byte(),
            XA_HIGHLIGHTING,
            self.highlight_byte(),
            XA_COLOR,
            self.color,
            XA_CHARSET,
            self.lcid,
            XA_OUTLINING,
            self.outline,
        ]
    }

    /// Highlighting value, with blink taking precedence over reverse, underscore and intensify
    pub fn highlight_byte(&self) -> u8 {
        if self.blink {
            HIGHLIGHT_BLINK
        } else if self.reverse {
            HIGHLIGHT_REVERSE
        } else if self.underscore {
            HIGHLIGHT_UNDERSCORE
        } else if self.highlight {
            HIGHLIGHT_INTENSIFY
        } else {
            HIGHLIGHT_NONE
        }
    }

    /// SA pairs that turn `base` into `self`, one per differing character facet
    pub fn delta_pairs(&self, base: &Attributes) -> Vec<(u8, u8)> {
        let mut pairs = Vec::new();
        if self.highlight_byte() != base.highlight_byte() {
            pairs.push((XA_HIGHLIGHTING, self.highlight_byte()));
        }
        if self.color != base.color {
            pairs.push((XA_COLOR, self.color));
        }
        if self.lcid != base.lcid {
            pairs.push((XA_CHARSET, self.lcid));
        }
        if self.outline != base.outline {
            pairs.push((XA_OUTLINING, self.outline));
        }
        pairs
    }

    fn apply_basic(&mut self, byte: u8) {
        let display = byte & ATTR_HIDDEN;
        self.hidden = display == ATTR_HIDDEN;
        self.highlight = display == ATTR_INTENSIFIED;
        self.modified = byte & ATTR_MDT != 0;
        self.numeric = byte & ATTR_NUMERIC != 0;
        self.protected = byte & ATTR_PROTECTED != 0;
        self.autoskip = self.protected && self.numeric;
        let bright = self.highlight || self.hidden;
        self.color = match (self.protected, bright) {
            (false, true) => COLOR_RED,
            (false, false) => COLOR_GREEN,
            (true, true) => COLOR_WHITE,
            (true, false) => COLOR_BLUE,
        };
    }

    fn apply_pairs(&mut self, bytes: &[u8]) {
        for pair in bytes.chunks_exact(2) {
            let (typecode, value) = (pair[0], pair[1]);
            match typecode {
                XA_BASIC => self.apply_basic(value),
                XA_HIGHLIGHTING => {
                    self.blink = value == HIGHLIGHT_BLINK;
                    self.reverse = value == HIGHLIGHT_REVERSE;
                    self.underscore = value == HIGHLIGHT_UNDERSCORE;
                    self.highlight = value == HIGHLIGHT_INTENSIFY;
                }
                XA_COLOR => self.color = value,
                XA_CHARSET => self.lcid = value,
                XA_OUTLINING => self.outline = value,
                _ => {}
            }
        }
    }
}

/// Display name of a color code
pub fn color_name(color: u8) -> &'static str {
    match color {
        0xF0 => "BLACK",
        COLOR_BLUE => "BLUE",
        COLOR_RED => "RED",
        COLOR_PINK => "PINK",
        COLOR_GREEN => "GREEN",
        COLOR_TURQUOISE => "TURQUOISE",
        COLOR_YELLOW => "YELLOW",
        COLOR_WHITE => "WHITE",
        0xF8 => "BLACK",
        0xF9 => "DEEPBLUE",
        0xFA => "ORANGE",
        0xFB => "PURPLE",
        0xFC => "PALEGREEN",
        0xFD => "PALETURQUOISE",
        0xFE => "GREY",
        0xFF => "WHITE",
        _ => "DEFAULT",
    }
}

impl fmt::Display for Attributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<String> = Vec::new();
        if self.autoskip {
            parts.push("SKIP".into());
        }
        if self.blink {
            parts.push("BLINK".into());
        }
        if self.color != COLOR_DEFAULT {
            parts.push(color_name(self.color).into());
        }
        if self.hidden {
            parts.push("HIDDEN".into());
        }
        if self.highlight {
            parts.push("HILITE".into());
        }
        if self.modified {
            parts.push("MDT".into());
        }
        if self.numeric {
            parts.push("NUM".into());
        }
        if self.protected {
            parts.push("PROT".into());
        }
        if self.reverse {
            parts.push("REV".into());
        }
        if self.underscore {
            parts.push("USCORE".into());
        }
        if self.outline != 0 {
            let mut sides = String::new();
            for (bit, side) in [(OUTLINE_BOTTOM, 'B'), (OUTLINE_RIGHT, 'R'), (OUTLINE_TOP, 'T'), (OUTLINE_LEFT, 'L')] {
                if self.outline & bit != 0 {
                    sides.push(side);
                }
            }
            parts.push(sides);
        }
        if self.lcid != 0 {
            parts.push(format!("{:02x}", self.lcid));
        }
        write!(f, "{}", parts.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_basic_protected_intensified() {
        let attrs = Attributes::from_basic(ATTR_PROTECTED | ATTR_INTENSIFIED | ATTR_MDT);
        assert!(attrs.protected);
        assert!(attrs.highlight);
        assert!(!attrs.hidden);
        assert!(attrs.modified);
        assert!(!attrs.autoskip);
        assert_eq!(attrs.color, COLOR_WHITE);
    }

    #[test]
    fn test_from_basic_default_colors() {
        assert_eq!(Attributes::from_basic(0x00).color, COLOR_GREEN);
        assert_eq!(Attributes::from_basic(ATTR_HIDDEN).color, COLOR_RED);
        assert_eq!(Attributes::from_basic(ATTR_PROTECTED).color, COLOR_BLUE);
        assert_eq!(Attributes::from_basic(ATTR_PROTECTED | ATTR_HIDDEN).color, COLOR_WHITE);
    }

    #[test]
    fn test_autoskip_derivation() {
        let attrs = Attributes::from_basic(ATTR_PROTECTED | ATTR_NUMERIC);
        assert!(attrs.autoskip);
        assert!(!Attributes::from_basic(ATTR_NUMERIC).autoskip);
    }

    #[test]
    fn test_from_extended_ignores_unknown_typecodes() {
        let attrs = Attributes::from_extended(&[
            XA_BASIC, ATTR_PROTECTED,
            0x45, 0xF3,
            XA_HIGHLIGHTING, HIGHLIGHT_REVERSE,
            XA_COLOR, COLOR_PINK,
        ]);
        assert!(attrs.protected);
        assert!(attrs.reverse);
        assert_eq!(attrs.color, COLOR_PINK);
    }

    #[test]
    fn test_highlight_values_are_exclusive() {
        let attrs = Attributes::from_extended(&[XA_HIGHLIGHTING, HIGHLIGHT_BLINK])
            .apply_delta(&[XA_HIGHLIGHTING, HIGHLIGHT_UNDERSCORE]);
        assert!(!attrs.blink);
        assert!(attrs.underscore);
        assert!(attrs.char_attr);
    }

    #[test]
    fn test_apply_delta_keeps_base() {
        let base = Attributes::from_basic(ATTR_PROTECTED);
        let modified = base.apply_delta(&[XA_COLOR, COLOR_YELLOW]);
        assert!(modified.protected);
        assert_eq!(modified.color, COLOR_YELLOW);
        assert!(modified.char_attr);
        assert!(!base.char_attr);
    }

    #[test]
    fn test_extended_bytes_fixed_order() {
        let attrs = Attributes::from_extended(&[
            XA_BASIC, 0b0010_0000,
            XA_HIGHLIGHTING, HIGHLIGHT_BLINK,
            XA_COLOR, COLOR_RED,
            XA_CHARSET, LCID_APL,
            XA_OUTLINING, OUTLINE_TOP | OUTLINE_LEFT,
        ]);
        assert_eq!(
            attrs.to_extended_bytes(),
            vec![XA_BASIC, 0b0010_0000, XA_HIGHLIGHTING, HIGHLIGHT_BLINK, XA_COLOR, COLOR_RED,
                 XA_CHARSET, LCID_APL, XA_OUTLINING, OUTLINE_TOP | OUTLINE_LEFT]
        );
    }

    #[test]
    fn test_basic_byte_inverse() {
        for byte in [0x00, 0x01, 0x08, 0x0C, 0x10, 0x20, 0x30, 0x2D, 0x3C] {
            assert_eq!(Attributes::from_basic(byte).to_basic_byte(), byte, "byte {byte:02x}");
        }
    }

    #[test]
    fn test_diff() {
        let a = Attributes { autoskip: true, blink: true, color: 0xF4, ..Default::default() };
        let b = Attributes { autoskip: true, color: 0xF7, hidden: true, highlight: true, ..Default::default() };
        let expected = Attributes { blink: true, color: 0xF4, ..Default::default() };
        assert_eq!(a.diff(&b), expected);
    }

    #[test]
    fn test_delta_pairs_only_changed_facets() {
        let field = Attributes::from_basic(0x00);
        let cell = field.apply_delta(&[XA_COLOR, COLOR_YELLOW]);
        assert_eq!(cell.delta_pairs(&field), vec![(XA_COLOR, COLOR_YELLOW)]);
        assert!(field.delta_pairs(&field).is_empty());
    }

    #[test]
    fn test_display() {
        let attrs = Attributes {
            autoskip: true,
            blink: true,
            color: 0xF4,
            numeric: true,
            protected: true,
            outline: 0b0000_1111,
            lcid: 0xF1,
            ..Default::default()
        };
        assert_eq!(attrs.to_string(), "SKIP BLINK GREEN NUM PROT BRTL f1");
    }
}
