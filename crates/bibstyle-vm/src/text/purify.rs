/*
 * purify.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! `purify$`: strip a string down to letters, digits and spaces.

use super::{BraceDepth, Transformed, is_special_char};

/// Remove non-alphanumeric characters.
///
/// Whitespace, `-` and `~` each become a single space. Inside a special
/// character group the control sequence survives only when it names a
/// foreign letter (`{\oe}` gives `oe`, `{\'e}` gives `e`).
pub fn purify(text: &str) -> Transformed<String> {
    let chars: Vec<char> = text.chars().collect();
    let n = chars.len();
    let mut out = String::with_capacity(text.len());
    let mut braces = BraceDepth::default();
    let mut i = 0;

    while i < n {
        let c = chars[i];
        i += 1;
        match c {
            c if c.is_whitespace() || c == '-' || c == '~' => out.push(' '),
            c if c.is_alphanumeric() => out.push(c),
            '{' => {
                braces.open();
                if braces.depth == 1 && chars.get(i) == Some(&'\\') {
                    i = purify_special_char(&chars, i, &mut braces, &mut out);
                }
            }
            '}' => braces.close(text),
            _ => {}
        }
    }

    Transformed::new(out, braces.finish(text))
}

/// Scan a special character group starting at its first backslash.
fn purify_special_char(
    chars: &[char],
    mut i: usize,
    braces: &mut BraceDepth,
    out: &mut String,
) -> usize {
    while i < chars.len() && braces.depth > 0 {
        let c = chars[i];
        i += 1;
        match c {
            '\\' => {
                let start = i;
                while i < chars.len() && chars[i].is_ascii_alphabetic() {
                    i += 1;
                }
                let control_sequence: String = chars[start..i].iter().collect();
                if is_special_char(&control_sequence) {
                    out.push_str(&control_sequence);
                }
            }
            '{' => braces.open(),
            '}' => braces.depth -= 1,
            c if c.is_alphanumeric() => out.push(c),
            _ => {}
        }
    }
    i
}
