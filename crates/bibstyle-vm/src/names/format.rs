/*
 * format.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! The BibTeX name format language used by `format.name$`.
//!
//! A format such as `"{vv~}{ll}{, jj}{, f.}"` is made of top-level text,
//! copied as is, and brace groups. Each group names one part of the person
//! with a letter (`f`, `v`, `l`, `j`): a doubled letter prints full tokens,
//! a single one abbreviates them. A group whose part is empty prints
//! nothing at all, including its surrounding text.

use super::{NamePart, NameToken, Person, count_names, parse_name_list};
use crate::text::text_length;

/// Name handling used by `num.names$` and `format.name$`.
///
/// The engine only talks to names through this trait, so a host can
/// substitute its own name parser.
pub trait NameFormatter {
    /// Number of persons in a name list.
    fn num_names(&self, names: &str) -> usize;

    /// Format the person at 1-based `index`; `None` when there is no such person.
    fn format_name(&self, names: &str, index: usize, format: &str) -> Option<String>;
}

/// The standard BibTeX name rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct BibtexNameFormatter;

impl NameFormatter for BibtexNameFormatter {
    fn num_names(&self, names: &str) -> usize {
        count_names(names)
    }

    fn format_name(&self, names: &str, index: usize, format: &str) -> Option<String> {
        let persons = parse_name_list(names);
        let person = persons.get(index.checked_sub(1)?)?;
        Some(format_name(person, format))
    }
}

/// Minimum text length of a group's tokens before a trailing `~` turns
/// into a space, and before the first inter-token separator stops being a tie.
const LONG_ENOUGH: usize = 3;

/// Format `person` according to a name format string.
pub fn format_name(person: &Person, format: &str) -> String {
    let chars: Vec<char> = format.chars().collect();
    let mut out = String::new();
    let mut i = 0;

    while i < chars.len() {
        if chars[i] == '{' {
            let (inner, end) = group_inner(&chars, i);
            match FormatGroup::parse(inner) {
                Some(group) => out.push_str(&group.render(person)),
                None => out.extend(&chars[i..end]),
            }
            i = end;
        } else {
            out.push(chars[i]);
            i += 1;
        }
    }
    out
}

/// Index just past the group that opens at `start` (or the end of input).
fn group_end(chars: &[char], start: usize) -> usize {
    let mut depth = 0usize;
    for (offset, c) in chars[start..].iter().enumerate() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return start + offset + 1;
                }
            }
            _ => {}
        }
    }
    chars.len()
}

/// The contents of the group opening at `start`, without its braces, and
/// the index just past it. An unclosed group runs to the end of input.
fn group_inner(chars: &[char], start: usize) -> (&[char], usize) {
    let end = group_end(chars, start);
    let closed = end > start + 1 && chars[end - 1] == '}' && depth_at(&chars[start..end]) == 0;
    let inner_end = if closed { end - 1 } else { end };
    (&chars[start + 1..inner_end], end)
}

/// Brace depth after scanning `chars`.
fn depth_at(chars: &[char]) -> usize {
    chars.iter().fold(0usize, |depth, c| match c {
        '{' => depth + 1,
        '}' => depth.saturating_sub(1),
        _ => depth,
    })
}

/// One `{pre letters{sep} post}` group of a format string.
#[derive(Debug)]
struct FormatGroup {
    pre: String,
    part: NamePart,
    full: bool,
    separator: Option<String>,
    post: String,
}

impl FormatGroup {
    /// `None` when the group contains no part letter.
    fn parse(inner: &[char]) -> Option<Self> {
        let mut pre = String::new();
        let mut i = 0;
        while i < inner.len() && !inner[i].is_ascii_alphabetic() {
            if inner[i] == '{' {
                let end = group_end(inner, i);
                pre.extend(&inner[i..end]);
                i = end;
            } else {
                pre.push(inner[i]);
                i += 1;
            }
        }

        let letter = *inner.get(i)?;
        let part = NamePart::from_letter(letter.to_ascii_lowercase())?;
        i += 1;
        let full = inner.get(i) == Some(&letter);
        if full {
            i += 1;
        }

        let separator = if inner.get(i) == Some(&'{') {
            let (separator, end) = group_inner(inner, i);
            i = end;
            Some(separator.iter().collect())
        } else {
            None
        };

        Some(FormatGroup {
            pre,
            part,
            full,
            separator,
            post: inner[i..].iter().collect(),
        })
    }

    fn render(&self, person: &Person) -> String {
        let tokens = person.part(self.part);
        if tokens.is_empty() {
            return String::new();
        }

        let mut body = String::new();
        let last = tokens.len() - 1;
        for (index, token) in tokens.iter().enumerate() {
            if self.full {
                body.push_str(&token.text);
            } else {
                body.push_str(abbreviate(&token.text));
            }
            if index == last {
                break;
            }
            match &self.separator {
                Some(separator) => body.push_str(separator),
                None => {
                    if !self.full {
                        body.push('.');
                    }
                    body.push(default_separator(token, index + 1 == last, &body));
                }
            }
        }

        body.push_str(&self.post);
        resolve_trailing_tie(&mut body);

        let mut out = self.pre.clone();
        out.push_str(&body);
        out
    }
}

/// The separator written between two tokens when the format gives none.
fn default_separator(token: &NameToken, before_final: bool, written: &str) -> char {
    if token.separator == '-' || token.separator == '~' {
        token.separator
    } else if before_final || text_length(written) < LONG_ENOUGH {
        '~'
    } else {
        ' '
    }
}

/// A single trailing `~` is a discretionary tie; `~~` forces one tie.
fn resolve_trailing_tie(body: &mut String) {
    if !body.ends_with('~') {
        return;
    }
    body.pop();
    if body.ends_with('~') {
        return;
    }
    if text_length(body) < LONG_ENOUGH {
        body.push('~');
    } else {
        body.push(' ');
    }
}

/// The first letter of a token, or its whole leading brace group.
fn abbreviate(token: &str) -> &str {
    let mut depth = 0usize;
    for (offset, c) in token.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return &token[..offset + 1];
                }
            }
            c if depth == 0 && c.is_alphabetic() => return &token[..offset + c.len_utf8()],
            _ => {}
        }
    }
    token
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn format(name: &str, spec: &str) -> String {
        format_name(&Person::parse(name), spec)
    }

    #[test]
    fn test_full_format() {
        assert_eq!(
            format(
                "Charles Louis Xavier Joseph de la Vall{\\'e}e Poussin",
                "{vv~}{ll}{, jj}{, f}?"
            ),
            "de~la Vall{\\'e}e~Poussin, C.~L. X.~J?"
        );
    }

    #[test]
    fn test_plain_style_formats() {
        assert_eq!(format("Knuth, Donald E.", "{ff~}{vv~}{ll}{, jj}"), "Donald~E. Knuth");
        assert_eq!(format("Knuth, Donald E.", "{f.~}{vv~}{ll}{, jj}"), "D.~E. Knuth");
        assert_eq!(format("Ford, Jr., Henry", "{vv~}{ll}{, jj}{, f.}"), "Ford, Jr., H.");
        assert_eq!(format("Ludwig van Beethoven", "{vv~}{ll}"), "van Beethoven");
    }

    #[test]
    fn test_empty_parts_drop_their_text() {
        assert_eq!(format("Lamport", "{ff~}{ll}{, jj}"), "Lamport");
    }

    #[test]
    fn test_explicit_separator_and_hyphen() {
        assert_eq!(format("Jean-Paul Sartre", "{f.}"), "J.-P.");
        assert_eq!(format("Jean-Paul Sartre", "{f{}}"), "JP");
        assert_eq!(format("A B C Doe", "{f{/}}"), "A/B/C");
    }

    #[test]
    fn test_unclosed_groups_keep_their_last_character() {
        assert_eq!(format("Doe", "{ll"), "Doe");
        assert_eq!(format("Jean-Paul Sartre", "{f{/"), "J/P");
        assert_eq!(format("A B C Doe", "{f{/}"), "A/B/C");
    }

    #[test]
    fn test_abbreviate_brace_group() {
        assert_eq!(abbreviate("{\\'E}mile"), "{\\'E}");
        assert_eq!(abbreviate("{Ch}arles"), "{Ch}");
        assert_eq!(abbreviate("Donald"), "D");
    }

    #[test]
    fn test_formatter_indexes_from_one() {
        let formatter = BibtexNameFormatter;
        let names = "Knuth, Donald and Leslie Lamport";
        assert_eq!(formatter.num_names(names), 2);
        assert_eq!(
            formatter.format_name(names, 2, "{ll}").as_deref(),
            Some("Lamport")
        );
        assert_eq!(formatter.format_name(names, 0, "{ll}"), None);
        assert_eq!(formatter.format_name(names, 3, "{ll}"), None);
    }
}
