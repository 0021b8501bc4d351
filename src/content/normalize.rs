//! Unicode and whitespace normalization with word-boundary truncation.

use unicode_normalization::UnicodeNormalization;

/// Normalized text and whether the length cap cut anything off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalized {
    pub text: String,
    pub truncated: bool,
}

/// Collapse every whitespace run (including NBSP) to one space and trim.
#[must_use]
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// NFC-normalize, collapse whitespace and cap at `max_len` characters.
///
/// The cut lands on the last space within `max_len / 10` characters of the
/// limit; with no space in that margin the text is hard-truncated. The result
/// never exceeds `max_len` characters.
#[must_use]
pub fn normalize(text: &str, max_len: usize) -> Normalized {
    let composed: String = text.nfc().collect();
    let collapsed = collapse_whitespace(&composed);
    truncate_at_boundary(collapsed, max_len)
}

fn truncate_at_boundary(text: String, max_len: usize) -> Normalized {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= max_len {
        return Normalized {
            text,
            truncated: false,
        };
    }

    let margin = (max_len / 10).max(1);
    let floor = max_len.saturating_sub(margin);

    // chars[max_len] exists because chars.len() > max_len
    let boundary = (floor..=max_len).rev().find(|&i| chars[i] == ' ');

    let cut: String = match boundary {
        Some(i) => chars[..i].iter().collect::<String>().trim_end().to_string(),
        None => chars[..max_len].iter().collect(),
    };

    Normalized {
        text: cut,
        truncated: true,
    }
}
