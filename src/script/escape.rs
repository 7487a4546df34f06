//! Escaping of string payloads for double-quoted AppleScript literals.

use std::borrow::Cow;

/// Characters that need rewriting inside a double-quoted literal.
const SPECIAL: [char; 4] = ['\\', '"', '\n', '\r'];

/// Escapes `s` so it can sit between the quotes of an AppleScript string
/// literal without terminating it.
///
/// Replacements are applied in a fixed order: backslash first, then double
/// quote, newline and carriage return. Backslash must come first or the
/// backslashes introduced by the later steps would be doubled.
///
/// Strings without any special character are returned borrowed.
#[must_use]
pub fn escape(s: &str) -> Cow<'_, str> {
    if !s.contains(&SPECIAL[..]) {
        return Cow::Borrowed(s);
    }

    Cow::Owned(
        s.replace('\\', "\\\\")
            .replace('"', "\\\"")
            .replace('\n', "\\n")
            .replace('\r', "\\r"),
    )
}

/// Escapes `s` and wraps it in double quotes.
#[must_use]
pub fn quote(s: &str) -> String {
    format!("\"{}\"", escape(s))
}
