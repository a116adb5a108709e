//! LDIF rendering helpers

use std::borrow::Cow;

use base64::{engine::general_purpose::STANDARD, Engine as _};

/// Wrap column commonly used for LDIF output
pub const DEFAULT_WRAP_COLUMN: usize = 76;

/// Returns true if the value cannot be written verbatim after `name: ` and must be base64 encoded:
/// it is empty, starts with a space, colon or less-than sign, ends with a space
/// or contains anything but printable ASCII.
pub fn needs_base64(value: &[u8]) -> bool {
    match value {
        [] => true,
        [b' ' | b':' | b'<', ..] | [.., b' '] => true,
        _ => value.iter().any(|b| !(0x20..0x7f).contains(b)),
    }
}

/// Append one `name: value` or `name:: base64` line group, folded at `wrap_column`.
///
/// The first line holds `wrap_column` columns counting the `name:` prefix, continuation lines
/// start with a space and hold `wrap_column - 1` characters. A zero column disables folding.
pub(crate) fn write_line(buffer: &mut String, name: &str, value: &[u8], wrap_column: usize) {
    let (separator, text) = if needs_base64(value) {
        ("::", Cow::Owned(STANDARD.encode(value)))
    } else {
        // printable ASCII only at this point
        (":", String::from_utf8_lossy(value))
    };

    buffer.push_str(name);
    buffer.push_str(separator);
    buffer.push(' ');

    let first = wrap_column.saturating_sub(name.len() + separator.len());
    if first == 0 || text.len() <= first {
        buffer.push_str(&text);
        buffer.push('\n');
        return;
    }

    let (head, mut rest) = text.split_at(first);
    buffer.push_str(head);
    buffer.push('\n');

    let width = wrap_column - 1;
    while !rest.is_empty() {
        let (chunk, tail) = rest.split_at(width.min(rest.len()));
        buffer.push(' ');
        buffer.push_str(chunk);
        buffer.push('\n');
        rest = tail;
    }
}
