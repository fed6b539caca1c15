//! Input utilities for the message composer
//!
//! Keeps typed and pasted text from corrupting the single-line input
//! field before it reaches the channel.

/// Sanitize text headed for the input line
///
/// Tabs become four spaces, line breaks collapse to a single space, and
/// other control characters are dropped.
pub fn sanitize_text_input(text: &str) -> String {
    let mut sanitized = String::with_capacity(text.len());

    for c in text.chars() {
        match c {
            '\t' => sanitized.push_str("    "),
            '\r' | '\n' => sanitized.push(' '),
            _ if !c.is_control() => sanitized.push(c),
            _ => {}
        }
    }

    sanitized
}
