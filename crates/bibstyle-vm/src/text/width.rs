/*
 * width.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! `width$`: typeset width of a string in the cmr10 font.
//!
//! Widths are in 1/1000 em. Braces always measure zero.

use super::{BraceDepth, Transformed};

/// Width of a single character; characters outside the table measure 0.
pub fn char_width(c: char) -> i32 {
    match c {
        ' ' | '!' | '\'' | ',' | '.' | ':' | ';' | '<' | '[' | ']' | '_' | '`' => 278,
        '"' | '$' | '*' | '/' | '0'..='9' | '\\' | '^' | '{' | '}' | '~' => 500,
        '#' | '%' => 833,
        '&' | '+' | '=' | '@' => 778,
        '(' | ')' => 389,
        '-' => 333,
        '>' | '?' => 472,
        '|' => 1000,

        'A' | 'H' | 'N' | 'U' | 'V' | 'X' | 'Y' => 750,
        'B' => 708,
        'C' | 'T' => 722,
        'D' => 764,
        'E' | 'P' => 681,
        'F' => 653,
        'G' => 785,
        'I' => 361,
        'J' => 514,
        'K' | 'O' | 'Q' => 778,
        'L' => 625,
        'M' => 917,
        'R' => 736,
        'S' => 556,
        'W' => 1028,
        'Z' => 611,

        'a' | 'g' | 'o' => 500,
        'b' | 'd' | 'h' | 'n' | 'p' | 'u' => 556,
        'c' | 'e' | 'z' => 444,
        'f' | 'j' => 306,
        'i' | 'l' => 278,
        'k' | 'q' | 'v' | 'x' | 'y' => 528,
        'm' => 833,
        'r' => 392,
        's' => 394,
        't' => 389,
        'w' => 722,

        _ => 0,
    }
}

/// Width of a recognized special character control sequence.
fn special_char_width(control_sequence: &str) -> Option<i32> {
    let width = match control_sequence {
        "ss" => 500,
        "ae" => 722,
        "oe" => 778,
        "AE" => 903,
        "OE" => 1014,
        "aa" => char_width('a'),
        "AA" => char_width('A'),
        "i" | "j" | "o" | "O" | "l" | "L" => {
            control_sequence.chars().next().map_or(0, char_width)
        }
        _ => return None,
    };
    Some(width)
}

/// Total width of `text`.
pub fn width(text: &str) -> Transformed<i32> {
    let chars: Vec<char> = text.chars().collect();
    let n = chars.len();
    let mut total = 0;
    let mut braces = BraceDepth::default();
    let mut i = 0;

    while i < n {
        let c = chars[i];
        i += 1;
        match c {
            '{' => {
                braces.open();
                if braces.depth == 1 && chars.get(i) == Some(&'\\') {
                    let (group_width, next) = special_group_width(&chars, i, &mut braces);
                    total += group_width;
                    i = next;
                }
            }
            '}' => braces.close(text),
            c => total += char_width(c),
        }
    }

    Transformed::new(total, braces.finish(text))
}

fn special_group_width(chars: &[char], mut i: usize, braces: &mut BraceDepth) -> (i32, usize) {
    let n = chars.len();
    let mut total = 0;
    while i < n && braces.depth > 0 {
        let c = chars[i];
        i += 1;
        match c {
            '\\' => {
                let start = i;
                while i < n && chars[i].is_ascii_alphabetic() {
                    i += 1;
                }
                if i == start {
                    // control symbol such as \' measures nothing
                    if i < n && chars[i] != '{' && chars[i] != '}' {
                        i += 1;
                    }
                    continue;
                }
                let control_sequence: String = chars[start..i].iter().collect();
                total += special_char_width(&control_sequence).unwrap_or(0);
                while i < n && chars[i].is_whitespace() {
                    i += 1;
                }
            }
            '{' => braces.open(),
            '}' => braces.depth -= 1,
            c => total += char_width(c),
        }
    }
    (total, i)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn w(text: &str) -> i32 {
        width(text).value
    }

    #[test]
    fn test_plain_text() {
        assert_eq!(w(""), 0);
        assert_eq!(w("0I~ "), 1639);
        assert_eq!(w("Hi Hi "), 2612);
    }

    #[test]
    fn test_braces_measure_nothing() {
        assert_eq!(w("{Hi}"), w("Hi"));
        assert_eq!(w("{{A}}"), 750);
    }

    #[test]
    fn test_special_chars() {
        assert_eq!(w("{\\oe}"), 778);
        assert_eq!(w("Hi {\\oe   }Hi "), 3390);
        assert_eq!(w("{\\'e}"), 444);
        assert_eq!(w("{\\'{E}}douard Masterly"), 7861);
        assert_eq!(w("{\\OE}"), 1014);
        assert_eq!(w("{\\AA}"), 750);
        assert_eq!(w("{\\i}"), 278);
        assert_eq!(w("{\\em x}"), 528);
    }

    #[test]
    fn test_unlisted_chars_are_zero() {
        assert_eq!(char_width('é'), 0);
        assert_eq!(char_width('\n'), 0);
        assert_eq!(char_width('W'), 1028);
    }

    #[test]
    fn test_unbalanced_warns() {
        let result = width("A}");
        assert_eq!(result.value, 750);
        assert_eq!(result.warnings.len(), 1);
    }
}
