//! Multi-byte aware string helpers
//!
//! Lengths and offsets here count Unicode scalar values, not bytes, so an
//! identity like `"日本"` has length 2 rather than 6.

/// Number of characters in `s`
#[must_use]
pub fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Character index of the first occurrence of `needle` in `haystack`
#[must_use]
pub fn char_position(haystack: &str, needle: &str) -> Option<usize> {
    let byte_idx = haystack.find(needle)?;
    Some(haystack[..byte_idx].chars().count())
}

/// Substring of at most `length` characters starting at character `start`
///
/// Out-of-range requests are clamped and yield an empty string rather than
/// panicking on a char boundary.
#[must_use]
pub fn char_substring(s: &str, start: usize, length: usize) -> &str {
    let mut indices = s.char_indices().map(|(i, _)| i).chain(std::iter::once(s.len()));

    let Some(begin) = indices.nth(start) else {
        return "";
    };
    if length == 0 {
        return "";
    }
    let end = indices.nth(length - 1).unwrap_or(s.len());
    &s[begin..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_char_len_counts_characters() {
        assert_eq!(char_len(""), 0);
        assert_eq!(char_len("app"), 3);
        assert_eq!(char_len("日本"), 2);
        assert_eq!(char_len("é"), 1);
    }

    #[test]
    fn test_char_position() {
        assert_eq!(char_position("日本語-dsn", "-dsn"), Some(3));
        assert_eq!(char_position("abc", "c"), Some(2));
        assert_eq!(char_position("abc", "z"), None);
    }

    #[test]
    fn test_char_substring() {
        assert_eq!(char_substring("日本語テキスト", 2, 3), "語テキ");
        assert_eq!(char_substring("hello", 1, 10), "ello");
        assert_eq!(char_substring("hello", 5, 2), "");
        assert_eq!(char_substring("hello", 9, 2), "");
        assert_eq!(char_substring("hello", 0, 0), "");
    }
}
