use std::borrow::Cow;

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const ELLIPSIS: char = '…';

/// Terminal columns occupied by `s` (CJK and emoji count as two).
pub fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

/// Shorten `s` to at most `max_width` columns, ending in `…` when cut.
///
/// Returns the input unchanged (borrowed) when it already fits.
///
/// ```
/// use bloom::util::truncate_to_width;
///
/// assert_eq!(truncate_to_width("Phalaenopsis", 20), "Phalaenopsis");
/// assert_eq!(truncate_to_width("Phalaenopsis", 6), "Phala…");
/// assert_eq!(truncate_to_width("Rose", 0), "");
/// ```
pub fn truncate_to_width(s: &str, max_width: usize) -> Cow<'_, str> {
    if display_width(s) <= max_width {
        return Cow::Borrowed(s);
    }
    if max_width == 0 {
        return Cow::Borrowed("");
    }

    // One column is reserved for the ellipsis
    let budget = max_width - 1;
    let mut used = 0;
    let mut out = String::with_capacity(s.len().min(max_width * 4));
    for c in s.chars() {
        let w = UnicodeWidthChar::width(c).unwrap_or(0);
        if used + w > budget {
            break;
        }
        used += w;
        out.push(c);
    }
    out.push(ELLIPSIS);
    Cow::Owned(out)
}

/// Truncate or right-pad `s` so it occupies exactly `width` columns.
///
/// A double-width character that would straddle the edge is replaced by
/// padding, so the result is never wider than `width`.
pub fn fit_to_width(s: &str, width: usize) -> String {
    let truncated = truncate_to_width(s, width);
    let used = display_width(&truncated);
    let mut out = truncated.into_owned();
    out.extend(std::iter::repeat(' ').take(width.saturating_sub(used)));
    out
}

/// Remove terminal control characters and ANSI escape sequences.
///
/// Catalog text comes from a remote API and is printed straight to the
/// terminal, so CSI (`ESC [ … final`) and OSC (`ESC ] … BEL|ESC \`)
/// sequences are dropped whole, along with other C0 controls and DEL.
/// Tab and newline survive.
pub fn strip_control_chars(s: &str) -> Cow<'_, str> {
    let is_unsafe = |c: char| c == '\x7f' || (c.is_ascii_control() && c != '\t' && c != '\n');
    if !s.chars().any(is_unsafe) {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\x1b' => match chars.peek() {
                Some('[') => {
                    chars.next();
                    // Parameters run until a final byte in 0x40..=0x7E
                    for p in chars.by_ref() {
                        if ('\x40'..='\x7e').contains(&p) {
                            break;
                        }
                    }
                }
                Some(']') => {
                    chars.next();
                    while let Some(p) = chars.next() {
                        if p == '\x07' {
                            break;
                        }
                        if p == '\x1b' && chars.peek() == Some(&'\\') {
                            chars.next();
                            break;
                        }
                    }
                }
                _ => {}
            },
            c if is_unsafe(c) => {}
            c => out.push(c),
        }
    }
    Cow::Owned(out)
}

/// [`strip_control_chars`] for text that must stay on one line: tabs and
/// newlines (and runs of them) become a single space.
///
/// ```
/// use bloom::util::single_line;
///
/// assert_eq!(single_line("Rose\n\tRed"), "Rose Red");
/// ```
pub fn single_line(s: &str) -> Cow<'_, str> {
    let stripped = strip_control_chars(s);
    if !stripped.contains(['\n', '\t']) {
        return stripped;
    }

    let mut out = String::with_capacity(stripped.len());
    let mut in_break = false;
    for c in stripped.chars() {
        if c == '\n' || c == '\t' {
            if !in_break {
                out.push(' ');
            }
            in_break = true;
        } else {
            out.push(c);
            in_break = false;
        }
    }
    Cow::Owned(out)
}
