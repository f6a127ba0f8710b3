//! Number, text and label formatting
//!
//! Stateless transforms from values to 4-byte segment frames, layered on
//! top of [`Tm1637::set_segments`]. The numeric formatter reproduces the
//! classic TM1637 library semantics: right-to-left base division,
//! leading-zero suppression, the minus sign substituted into the first
//! zero-suppressed position, and an MSB-first decimal-point mask.

use tm1637_nb_hal::{Monotonic, OpenDrainPin};

use crate::protocol::{Tm1637, DIGITS};
use crate::segments::{char_to_segment, encode_digit, MINUS_SEGMENTS, SEG_DP};

/// Build a digit frame from a magnitude in the given base
///
/// `length` is clamped to 1-4; positions left of the most significant
/// digit stay blank unless `leading_zero` is set. When the whole value is
/// zero and leading zeros are off, a single zero digit is placed in the
/// last position and the dot mask is not applied (historical library
/// behavior, kept for wire-level compatibility).
fn format_base(
    base: u32,
    negative: bool,
    mut num: u32,
    dots: u8,
    leading_zero: bool,
    length: u8,
) -> [u8; DIGITS] {
    let length = length.clamp(1, DIGITS as u8) as usize;
    let mut digits = [0u8; DIGITS];
    let mut negative = negative;

    if num == 0 && !leading_zero {
        digits[length - 1] = encode_digit(0);
    } else {
        for i in (0..length).rev() {
            let digit = (num % base) as u8;

            if digit == 0 && num == 0 && !leading_zero {
                // Leading zero is blank
                digits[i] = 0;
            } else {
                digits[i] = encode_digit(digit);
            }

            // The first zero-suppressed position takes the minus sign
            if digit == 0 && num == 0 && negative {
                digits[i] = MINUS_SEGMENTS;
                negative = false;
            }

            num /= base;
        }

        if dots != 0 {
            apply_dots(dots, &mut digits);
        }
    }

    digits
}

/// OR decimal-point bits into the frame, most significant dot first
fn apply_dots(mut dots: u8, digits: &mut [u8; DIGITS]) {
    for d in digits.iter_mut() {
        *d |= dots & 0x80;
        dots <<= 1;
    }
}

impl<CLK, DIO, T> Tm1637<CLK, DIO, T>
where
    CLK: OpenDrainPin,
    DIO: OpenDrainPin,
    T: Monotonic,
{
    /// Display a decimal number
    ///
    /// `length` digits (1-4) are written starting at `pos`. Leading
    /// zeros are blanked unless `leading_zero` is set; a negative value
    /// gets a minus sign in the first zero-suppressed position.
    pub fn show_number_decimal(&mut self, num: i32, leading_zero: bool, length: u8, pos: u8) {
        self.show_number_decimal_with_dots(num, 0, leading_zero, length, pos);
    }

    /// Display a decimal number with a decimal-point mask
    ///
    /// `dots` selects decimal points MSB-first: 0b1000_0000 lights the
    /// dot of the leftmost displayed digit.
    pub fn show_number_decimal_with_dots(
        &mut self,
        num: i32,
        dots: u8,
        leading_zero: bool,
        length: u8,
        pos: u8,
    ) {
        let digits = format_base(10, num < 0, num.unsigned_abs(), dots, leading_zero, length);
        let length = length.clamp(1, DIGITS as u8) as usize;
        self.set_segments(&digits[..length], pos);
    }

    /// Display a hexadecimal number with a decimal-point mask
    pub fn show_number_hex_with_dots(
        &mut self,
        num: u16,
        dots: u8,
        leading_zero: bool,
        length: u8,
        pos: u8,
    ) {
        let digits = format_base(16, false, u32::from(num), dots, leading_zero, length);
        let length = length.clamp(1, DIGITS as u8) as usize;
        self.set_segments(&digits[..length], pos);
    }

    /// Display text starting at `pos`
    ///
    /// Up to `4 - pos` characters are rendered via
    /// [`char_to_segment`](crate::segments::char_to_segment); excess
    /// characters are silently truncated and untouched positions stay
    /// blank. The full 4-digit frame is transmitted.
    pub fn display_text(&mut self, text: &str, pos: u8) {
        let mut digits = [0u8; DIGITS];
        let start = (pos as usize).min(DIGITS);
        for (slot, c) in digits[start..].iter_mut().zip(text.chars()) {
            *slot = char_to_segment(c);
        }
        self.set_segments(&digits, 0);
    }

    /// Display a one-character label followed by a compact number
    ///
    /// The three remaining digits render `value` in one of three fixed
    /// tiers:
    ///
    /// - below 1000 (all negatives included): plain, blank-padded,
    ///   minus sign substituted for small negative values;
    /// - 1000 to 9999: one significant digit with its decimal point,
    ///   the next digit, and a literal 'K' (1024 -> "1.0K");
    /// - 10000 and up: the value truncated to hundreds as three digits
    ///   with the dot after the second (12345 -> "12.3").
    pub fn display_label_and_number(&mut self, label: char, value: i32) {
        let mut digits = [0u8; DIGITS];
        digits[0] = char_to_segment(label);

        if value < 1000 {
            let tail = format_base(10, value < 0, value.unsigned_abs(), 0, false, 3);
            digits[1..].copy_from_slice(&tail[..3]);
        } else if value < 10_000 {
            digits[1] = encode_digit((value / 1000) as u8) | SEG_DP;
            digits[2] = encode_digit(((value / 100) % 10) as u8);
            digits[3] = char_to_segment('K');
        } else {
            let t = value / 100;
            digits[1] = encode_digit(((t / 100) % 10) as u8);
            digits[2] = encode_digit(((t / 10) % 10) as u8) | SEG_DP;
            digits[3] = encode_digit((t % 10) as u8);
        }

        self.set_segments(&digits, 0);
    }
}
