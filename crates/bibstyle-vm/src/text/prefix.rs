/*
 * prefix.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! `text.length$` and `text.prefix$`.
//!
//! Both count *text characters*: braces are not counted and a whole
//! special character group counts as one.

use super::{BraceDepth, Transformed};

/// Index just past the special character group whose backslash is at `i`.
fn skip_special_group(chars: &[char], mut i: usize, depth: &mut usize) -> usize {
    while i < chars.len() && *depth > 0 {
        match chars[i] {
            '}' => *depth -= 1,
            '{' => *depth += 1,
            _ => {}
        }
        i += 1;
    }
    i
}

/// Number of text characters in `text`.
pub fn text_length(text: &str) -> usize {
    let chars: Vec<char> = text.chars().collect();
    let mut count = 0;
    let mut depth = 0usize;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        i += 1;
        match c {
            '{' => {
                depth += 1;
                if depth == 1 && chars.get(i) == Some(&'\\') {
                    i = skip_special_group(&chars, i, &mut depth);
                    count += 1;
                }
            }
            '}' => depth = depth.saturating_sub(1),
            _ => count += 1,
        }
    }
    count
}

/// The leading part of `text` holding at most `count` text characters.
///
/// Groups left open by the cut are closed again.
pub fn text_prefix(text: &str, count: i32) -> Transformed<String> {
    let chars: Vec<char> = text.chars().collect();
    let mut braces = BraceDepth::default();
    let mut remaining = count;
    let mut i = 0;

    while i < chars.len() && remaining > 0 {
        let c = chars[i];
        i += 1;
        match c {
            '{' => {
                braces.open();
                if braces.depth == 1 && chars.get(i) == Some(&'\\') {
                    i = skip_special_group(&chars, i, &mut braces.depth);
                    remaining -= 1;
                }
            }
            '}' => braces.close(text),
            _ => remaining -= 1,
        }
    }

    let mut prefix: String = chars[..i].iter().collect();
    prefix.extend(std::iter::repeat_n('}', braces.depth));
    Transformed::new(prefix, braces.into_warnings())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_length() {
        assert_eq!(text_length("hello world"), 11);
        assert_eq!(text_length("Hello {W}orld"), 11);
        assert_eq!(text_length(""), 0);
        assert_eq!(text_length("{A}{D}/{Cycle}"), 8);
        assert_eq!(text_length("{\\This is one character}"), 1);
        assert_eq!(text_length("{\\This {is} {one} {c{h}}aracter as well}"), 1);
        assert_eq!(text_length("{\\And this too"), 1);
        assert_eq!(text_length("These are {\\11}"), 11);
        assert_eq!(text_length("{\\'e}legant"), 7);
    }

    #[test]
    fn test_text_prefix() {
        assert_eq!(text_prefix("hello world", 5).value, "hello");
        assert_eq!(text_prefix("{ab}cd", 1).value, "{a}");
        assert_eq!(text_prefix("{\\oe}uvre", 2).value, "{\\oe}u");
        assert_eq!(text_prefix("abc", 10).value, "abc");
    }

    #[test]
    fn test_text_prefix_non_positive_is_empty() {
        assert_eq!(text_prefix("abc", 0).value, "");
        assert_eq!(text_prefix("abc", -4).value, "");
    }

    #[test]
    fn test_text_prefix_warns_on_unmatched_close() {
        let result = text_prefix("a}bc", 2);
        assert_eq!(result.value, "a}b");
        assert_eq!(result.warnings.len(), 1);
    }
}
