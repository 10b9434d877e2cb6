use std::borrow::Cow;

/// Removes ASCII control characters (C0 controls and DEL) from a string.
///
/// Feed titles come out of attacker-controlled HTML and are echoed back in
/// API responses; embedded escape sequences or raw control bytes must not
/// survive into them. Whitespace controls (`\t`, `\n`, `\r`) are replaced
/// with a single space so words don't fuse together.
///
/// Returns `Cow::Borrowed` when nothing needed stripping.
pub fn strip_control_chars(s: &str) -> Cow<'_, str> {
    if !s.chars().any(|c| c.is_ascii_control()) {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\t' | '\n' | '\r' => out.push(' '),
            c if c.is_ascii_control() => {}
            c => out.push(c),
        }
    }
    Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_text_returns_borrowed() {
        let input = "My Blog Feed";
        let result = strip_control_chars(input);
        assert!(matches!(result, Cow::Borrowed(_)));
        assert_eq!(result, input);
    }

    #[test]
    fn test_escape_sequences_stripped() {
        let result = strip_control_chars("Evil\x1b[31m Feed");
        assert!(!result.contains('\x1b'));
        assert_eq!(result, "Evil[31m Feed");
    }

    #[test]
    fn test_whitespace_controls_become_spaces() {
        assert_eq!(strip_control_chars("line\nbreak\ttab"), "line break tab");
    }

    #[test]
    fn test_del_and_bell_stripped() {
        assert_eq!(strip_control_chars("a\x7fb\x07c"), "abc");
    }

    #[test]
    fn test_unicode_preserved() {
        let input = "日本語のフィード";
        assert_eq!(strip_control_chars(input), input);
    }
}
