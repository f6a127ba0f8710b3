//! Segment encoding tables
//!
//! A segment byte is one digit's lit-segment bitmask: bits 0-6 are
//! segments A-G, bit 7 is the decimal point. These tables and the lookup
//! functions are pure data transforms with no protocol state.

/// Segment A (top)
pub const SEG_A: u8 = 0b0000_0001;
/// Segment B (top right)
pub const SEG_B: u8 = 0b0000_0010;
/// Segment C (bottom right)
pub const SEG_C: u8 = 0b0000_0100;
/// Segment D (bottom)
pub const SEG_D: u8 = 0b0000_1000;
/// Segment E (bottom left)
pub const SEG_E: u8 = 0b0001_0000;
/// Segment F (top left)
pub const SEG_F: u8 = 0b0010_0000;
/// Segment G (middle)
pub const SEG_G: u8 = 0b0100_0000;
/// Decimal point
pub const SEG_DP: u8 = 0b1000_0000;

/// A lone middle segment, used as the minus sign
pub const MINUS_SEGMENTS: u8 = SEG_G;

/// Hex-capable digit font, indexed by value 0-15
const DIGIT_TO_SEGMENT: [u8; 16] = [
    // XGFEDCBA
    0b0011_1111, // 0
    0b0000_0110, // 1
    0b0101_1011, // 2
    0b0100_1111, // 3
    0b0110_0110, // 4
    0b0110_1101, // 5
    0b0111_1101, // 6
    0b0000_0111, // 7
    0b0111_1111, // 8
    0b0110_1111, // 9
    0b0111_0111, // A
    0b0111_1100, // b
    0b0011_1001, // C
    0b0101_1110, // d
    0b0111_1001, // E
    0b0111_0001, // F
];

/// Letter font, indexed by letter A-Z
///
/// Several letters have no faithful 7-segment shape; the usual
/// lowercase-style approximations are used (n, r, t and friends).
const LETTER_TO_SEGMENT: [u8; 26] = [
    // XGFEDCBA
    0b0111_0111, // A
    0b0111_1100, // b
    0b0011_1001, // C
    0b0101_1110, // d
    0b0111_1001, // E
    0b0111_0001, // F
    0b0011_1101, // G
    0b0111_0110, // H
    0b0011_0000, // I
    0b0001_1110, // J
    0b0111_0101, // K
    0b0011_1000, // L
    0b0001_0101, // M
    0b0101_0100, // n
    0b0011_1111, // O
    0b0111_0011, // P
    0b0110_0111, // q
    0b0101_0000, // r
    0b0110_1101, // S
    0b0111_1000, // t
    0b0011_1110, // U
    0b0001_1100, // v
    0b0010_1010, // W
    0b0111_0110, // X
    0b0110_1110, // y
    0b0101_1011, // Z
];

/// Encode a single digit value (0-15) to its segment pattern
///
/// Values 10-15 map to the hex letters A-F. Only the low nibble of the
/// input is used.
pub fn encode_digit(digit: u8) -> u8 {
    DIGIT_TO_SEGMENT[(digit & 0x0F) as usize]
}

/// Encode a character to its segment pattern
///
/// Letters are case-insensitive. Space and any unrecognized character
/// render blank (all segments off) rather than failing.
pub fn char_to_segment(c: char) -> u8 {
    match c {
        '0'..='9' => DIGIT_TO_SEGMENT[(c as u8 - b'0') as usize],
        'A'..='Z' => LETTER_TO_SEGMENT[(c as u8 - b'A') as usize],
        'a'..='z' => LETTER_TO_SEGMENT[(c as u8 - b'a') as usize],
        '-' => MINUS_SEGMENTS,
        _ => 0,
    }
}
