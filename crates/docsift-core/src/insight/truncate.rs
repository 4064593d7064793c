//! Token-budget truncation.

/// Rough characters-per-token ratio used for every budget.
pub const CHARS_PER_TOKEN: usize = 4;

/// Cut `text` to at most `max_tokens * 4` bytes.
///
/// When the cut leaves a `.` past 80% of the budget, the result ends at the
/// last such period. Otherwise it is a hard cut, moved back to the nearest
/// char boundary.
pub fn truncate_text(text: &str, max_tokens: usize) -> &str {
    let max_chars = max_tokens.saturating_mul(CHARS_PER_TOKEN);
    if text.len() <= max_chars {
        return text;
    }

    let mut end = max_chars;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    let truncated = &text[..end];

    match truncated.rfind('.') {
        Some(pos) if pos * 5 > max_chars * 4 => &truncated[..=pos],
        _ => truncated,
    }
}
