//! Terminal text sanitization for fault diagnostics.
//!
//! Fault messages, identifiers, and traces come from whatever failed, so they
//! are untrusted. Before any of it reaches the terminal, escape sequences and
//! control characters are removed so a fault cannot rewrite the screen, set
//! the clipboard (OSC 52), or plant hyperlinks (OSC 8).

use std::borrow::Cow;
use std::iter::Peekable;

const ESC: char = '\x1b';
const BEL: char = '\x07';
const C1_CSI: char = '\u{009b}';

/// Strip escape sequences and control characters from `input`.
///
/// Newlines and tabs survive; carriage returns are dropped because they would
/// let a message overwrite its own line. Clean input is returned borrowed.
///
/// ```
/// use bulwark_types::sanitize_terminal_text;
///
/// assert_eq!(sanitize_terminal_text("db timeout"), "db timeout");
/// assert_eq!(sanitize_terminal_text("db\x1b[2J timeout"), "db timeout");
/// ```
#[must_use]
pub fn sanitize_terminal_text(input: &str) -> Cow<'_, str> {
    if !input.chars().any(is_unsafe) {
        return Cow::Borrowed(input);
    }

    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            ESC => skip_escape(&mut chars),
            C1_CSI => skip_csi(&mut chars),
            c if is_unsafe(c) => {}
            c => out.push(c),
        }
    }
    Cow::Owned(out)
}

fn is_unsafe(c: char) -> bool {
    match c {
        '\n' | '\t' => false,
        '\x7f' => true,
        c => c <= '\x1f' || ('\u{0080}'..='\u{009f}').contains(&c),
    }
}

fn skip_escape<I: Iterator<Item = char>>(chars: &mut Peekable<I>) {
    match chars.peek() {
        Some('[') => {
            chars.next();
            skip_csi(chars);
        }
        Some(']' | 'P' | '^' | '_') => {
            chars.next();
            skip_string(chars);
        }
        Some('(' | ')' | '*' | '+' | '#' | ' ') => {
            chars.next();
            chars.next();
        }
        Some('7' | '8' | 'c' | 'D' | 'E' | 'H' | 'M' | 'N' | 'O' | 'Z' | '=' | '>' | '<') => {
            chars.next();
        }
        _ => {}
    }
}

/// CSI: parameter/intermediate bytes up to a final byte in `@`..=`~`.
fn skip_csi<I: Iterator<Item = char>>(chars: &mut Peekable<I>) {
    while let Some(&c) = chars.peek() {
        if ('\x40'..='\x7e').contains(&c) {
            chars.next();
            return;
        }
        if !('\x20'..='\x3f').contains(&c) {
            return;
        }
        chars.next();
    }
}

/// OSC/DCS/PM/APC payload, terminated by BEL or ST (`ESC \`).
fn skip_string<I: Iterator<Item = char>>(chars: &mut Peekable<I>) {
    while let Some(c) = chars.next() {
        if c == BEL {
            return;
        }
        if c == ESC && chars.peek() == Some(&'\\') {
            chars.next();
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_text_is_borrowed() {
        let input = "Error: db timeout\n\tat query()";
        assert!(matches!(sanitize_terminal_text(input), Cow::Borrowed(_)));
    }

    #[test]
    fn strips_csi_sequences() {
        assert_eq!(sanitize_terminal_text("\x1b[31mred\x1b[0m"), "red");
        assert_eq!(sanitize_terminal_text("a\x1b[10;20Hb"), "ab");
        assert_eq!(sanitize_terminal_text("a\u{009b}31mb"), "ab");
    }

    #[test]
    fn strips_osc_clipboard_and_hyperlinks() {
        assert_eq!(sanitize_terminal_text("x\x1b]52;c;SGVsbG8=\x07y"), "xy");
        assert_eq!(
            sanitize_terminal_text("\x1b]8;;http://evil.test\x1b\\click\x1b]8;;\x1b\\"),
            "click"
        );
    }

    #[test]
    fn strips_controls_and_carriage_returns() {
        assert_eq!(sanitize_terminal_text("a\x00b\rc\x7fd\u{0085}e"), "abcde");
    }

    #[test]
    fn incomplete_sequences_are_dropped() {
        assert_eq!(sanitize_terminal_text("tail\x1b"), "tail");
        assert_eq!(sanitize_terminal_text("tail\x1b[31"), "tail");
        assert_eq!(sanitize_terminal_text("tail\x1b]0;title"), "tail");
    }
}
