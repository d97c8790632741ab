//! Telegram MarkdownV2 escaping.
//!
//! Every character in [`RESERVED`] must be preceded by a backslash anywhere
//! it appears as literal text, otherwise the Bot API rejects the whole
//! caption with "can't parse entities".

/// Characters with special meaning in MarkdownV2.
pub const RESERVED: &[char] = &[
    '\\', '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!',
];

/// Escape free text for interpolation into a MarkdownV2 caption.
///
/// Surrounding whitespace is trimmed so it cannot end up between a
/// formatting marker and its content.
pub fn escape(text: &str) -> String {
    let text = text.trim();
    let mut out = String::with_capacity(text.len() + text.len() / 4);
    for ch in text.chars() {
        if RESERVED.contains(&ch) {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// Escape a URL for use inside the `(...)` part of an inline link.
///
/// Inside link targets only `)` and `\` are significant.
pub fn escape_link_target(url: &str) -> String {
    let mut out = String::with_capacity(url.len());
    for ch in url.trim().chars() {
        if ch == ')' || ch == '\\' {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// Remove escaping backslashes, keeping the escaped characters.
///
/// Used to turn a rejected MarkdownV2 caption into a plain-text one.
pub fn strip_escapes(caption: &str) -> String {
    let mut out = String::with_capacity(caption.len());
    let mut chars = caption.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '\\'
            && let Some(&next) = chars.peek()
            && RESERVED.contains(&next)
        {
            out.push(next);
            chars.next();
            continue;
        }
        out.push(ch);
    }
    out
}
