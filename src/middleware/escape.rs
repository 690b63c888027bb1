//! Escaping for the double-quoted fields of an access-log line.
//!
//! Input is raw bytes because header values may carry anything the client
//! sent. Output is always valid UTF-8 and never contains an unescaped `"`,
//! `\` or control character, so a line can be split on its quotes.

use unicode_general_category::{GeneralCategory, get_general_category};

const LOWER_HEX: &[u8; 16] = b"0123456789abcdef";

/// Appends `s` to `out`, escaped for use inside a quoted log field.
///
/// Printable characters pass through. `"` and `\` get a backslash, the
/// usual C control characters use their mnemonic (`\n`, `\t`, ...), other
/// characters below U+0020 become `\xHH`, and every other non-printable
/// character becomes `\uHHHH` or `\UHHHHHHHH`. A byte that does not start a
/// valid UTF-8 sequence is written as `\xHH` and scanning resumes at the
/// next byte.
pub(crate) fn append_quoted(out: &mut String, s: &[u8]) {
    for chunk in s.utf8_chunks() {
        for c in chunk.valid().chars() {
            append_char(out, c);
        }
        for &byte in chunk.invalid() {
            append_hex_byte(out, byte);
        }
    }
}

fn append_char(out: &mut String, c: char) {
    match c {
        '"' | '\\' => {
            out.push('\\');
            out.push(c);
        }
        c if is_printable(c) => out.push(c),
        '\x07' => out.push_str("\\a"),
        '\x08' => out.push_str("\\b"),
        '\x0c' => out.push_str("\\f"),
        '\n' => out.push_str("\\n"),
        '\r' => out.push_str("\\r"),
        '\t' => out.push_str("\\t"),
        '\x0b' => out.push_str("\\v"),
        c if c < ' ' => append_hex_byte(out, c as u8),
        c if (c as u32) < 0x1_0000 => {
            out.push_str("\\u");
            append_hex_digits(out, c as u32, 4);
        }
        c => {
            out.push_str("\\U");
            append_hex_digits(out, c as u32, 8);
        }
    }
}

/// Letters, marks, numbers, punctuation, symbols and the ASCII space.
fn is_printable(c: char) -> bool {
    if c.is_ascii() {
        return matches!(c, ' '..='~');
    }
    use GeneralCategory::*;
    matches!(
        get_general_category(c),
        UppercaseLetter
            | LowercaseLetter
            | TitlecaseLetter
            | ModifierLetter
            | OtherLetter
            | NonspacingMark
            | SpacingMark
            | EnclosingMark
            | DecimalNumber
            | LetterNumber
            | OtherNumber
            | ConnectorPunctuation
            | DashPunctuation
            | OpenPunctuation
            | ClosePunctuation
            | InitialPunctuation
            | FinalPunctuation
            | OtherPunctuation
            | MathSymbol
            | CurrencySymbol
            | ModifierSymbol
            | OtherSymbol
    )
}

fn append_hex_byte(out: &mut String, byte: u8) {
    out.push_str("\\x");
    append_hex_digits(out, u32::from(byte), 2);
}

fn append_hex_digits(out: &mut String, value: u32, digits: u32) {
    for i in (0..digits).rev() {
        let nibble = (value >> (i * 4)) & 0xf;
        out.push(char::from(LOWER_HEX[nibble as usize]));
    }
}
