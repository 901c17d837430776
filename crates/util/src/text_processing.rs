//! Helpers for fitting arbitrary text into single log lines.

/// Collapse whitespace runs and cut `text` to at most `limit` bytes (on a char
/// boundary), appending `...` when something was dropped. Empty input becomes
/// `<empty>`.
pub fn log_preview(text: &str, limit: usize) -> String {
    if text.trim().is_empty() {
        return "<empty>".to_string();
    }

    let mut preview = String::new();
    for ch in text.chars() {
        if preview.len() + ch.len_utf8() > limit {
            preview.push_str("...");
            break;
        }
        if ch.is_whitespace() {
            if !preview.ends_with(' ') {
                preview.push(' ');
            }
        } else {
            preview.push(ch);
        }
    }

    preview.trim().to_string()
}

/// Character count, used when logging payload sizes without their content.
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_is_marked() {
        assert_eq!(log_preview("  \n ", 10), "<empty>");
    }

    #[test]
    fn whitespace_runs_collapse_to_single_spaces() {
        assert_eq!(log_preview("a\n\nb\tc", 50), "a b c");
        assert_eq!(log_preview("a   b \r\n  c\u{3000}d", 50), "a b c d");
    }

    #[test]
    fn long_text_is_truncated_on_char_boundary() {
        let preview = log_preview("对比结果对比结果", 7);
        assert_eq!(preview, "对比...");
    }

    #[test]
    fn counts_chars_not_bytes() {
        assert_eq!(char_len("对比"), 2);
    }
}
