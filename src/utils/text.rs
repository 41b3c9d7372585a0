//! Text helpers that never split a UTF-8 code point.

/// Keep at most `max_bytes` bytes of `text`, backing off to a char boundary.
pub fn truncate_bytes(text: &str, max_bytes: usize) -> &str {
    if text.len() <= max_bytes {
        return text;
    }
    let mut end = max_bytes;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

/// Keep at most `max_chars` characters of `text`.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Number of non-whitespace characters, used to compare extraction quality.
pub fn non_whitespace_chars(text: &str) -> usize {
    text.chars().filter(|c| !c.is_whitespace()).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_bytes_backs_off_to_boundary() {
        // 'é' is two bytes
        assert_eq!(truncate_bytes("aé", 2), "a");
        assert_eq!(truncate_bytes("aé", 3), "aé");
        assert_eq!(truncate_bytes("abc", 10), "abc");
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("日本語テキスト", 3), "日本語");
        assert_eq!(truncate_chars("short", 10), "short");
        assert_eq!(truncate_chars("", 3), "");
    }

    #[test]
    fn test_non_whitespace_chars() {
        assert_eq!(non_whitespace_chars(" a b\n\tc "), 3);
        assert_eq!(non_whitespace_chars("   \n"), 0);
    }
}
