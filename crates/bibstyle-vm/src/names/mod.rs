/*
 * mod.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! BibTeX name lists.
//!
//! A name list is a string such as `"Knuth, Donald E. and Leslie Lamport"`.
//! This module splits it into persons and each person into the four name
//! parts (First, von, Last, Jr) that the name format language refers to.

pub mod format;

pub use format::{BibtexNameFormatter, NameFormatter, format_name};

/// One whitespace, `-` or `~` separated word of a name part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameToken {
    pub text: String,
    /// The separator that followed this token in the source name.
    /// `' '` for whitespace, otherwise `-` or `~`.
    pub separator: char,
}

/// A single person from a name list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Person {
    pub first: Vec<NameToken>,
    pub von: Vec<NameToken>,
    pub last: Vec<NameToken>,
    pub jr: Vec<NameToken>,
}

/// The name parts addressed by format letters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamePart {
    First,
    Von,
    Last,
    Jr,
}

impl NamePart {
    pub fn from_letter(letter: char) -> Option<Self> {
        match letter {
            'f' => Some(NamePart::First),
            'v' => Some(NamePart::Von),
            'l' => Some(NamePart::Last),
            'j' => Some(NamePart::Jr),
            _ => None,
        }
    }
}

impl Person {
    pub fn part(&self, part: NamePart) -> &[NameToken] {
        match part {
            NamePart::First => &self.first,
            NamePart::Von => &self.von,
            NamePart::Last => &self.last,
            NamePart::Jr => &self.jr,
        }
    }

    /// Parse a single name in any of the three BibTeX forms:
    /// `First von Last`, `von Last, First` and `von Last, Jr, First`.
    pub fn parse(name: &str) -> Person {
        let parts: Vec<Vec<NameToken>> = split_commas(name)
            .iter()
            .map(|part| tokenize(part))
            .collect();

        match parts.as_slice() {
            [] => Person::default(),
            [tokens] => Self::from_first_von_last(tokens),
            [head, first] => {
                let (von, last) = split_von_last(head);
                Person {
                    first: first.clone(),
                    von,
                    last,
                    jr: Vec::new(),
                }
            }
            [head, jr, first, ..] => {
                let (von, last) = split_von_last(head);
                Person {
                    first: first.clone(),
                    von,
                    last,
                    jr: jr.clone(),
                }
            }
        }
    }

    fn from_first_von_last(tokens: &[NameToken]) -> Person {
        let Some(final_index) = tokens.len().checked_sub(1) else {
            return Person::default();
        };
        let von_start = tokens[..final_index].iter().position(is_von_token);
        match von_start {
            Some(start) => {
                let von_end = tokens[..final_index]
                    .iter()
                    .rposition(is_von_token)
                    .map_or(start + 1, |end| end + 1);
                Person {
                    first: tokens[..start].to_vec(),
                    von: tokens[start..von_end].to_vec(),
                    last: tokens[von_end..].to_vec(),
                    jr: Vec::new(),
                }
            }
            None => Person {
                first: tokens[..final_index].to_vec(),
                von: Vec::new(),
                last: tokens[final_index..].to_vec(),
                jr: Vec::new(),
            },
        }
    }
}

/// Split `von Last` tokens: von runs up to the last lower-case token that
/// is not the final token.
fn split_von_last(tokens: &[NameToken]) -> (Vec<NameToken>, Vec<NameToken>) {
    let Some(final_index) = tokens.len().checked_sub(1) else {
        return (Vec::new(), Vec::new());
    };
    let von_end = tokens[..final_index]
        .iter()
        .rposition(is_von_token)
        .map_or(0, |end| end + 1);
    (tokens[..von_end].to_vec(), tokens[von_end..].to_vec())
}

/// Split a name list at every standalone `and` outside braces.
pub fn parse_name_list(names: &str) -> Vec<Person> {
    split_names(names)
        .into_iter()
        .map(Person::parse)
        .collect()
}

/// Number of persons in a name list.
pub fn count_names(names: &str) -> usize {
    split_names(names).len()
}

fn split_names(names: &str) -> Vec<&str> {
    let chars: Vec<(usize, char)> = names.char_indices().collect();
    let mut segments = Vec::new();
    let mut depth = 0usize;
    let mut segment_start = 0;
    let mut i = 0;

    while i < chars.len() {
        let (offset, c) = chars[i];
        match c {
            '{' => depth += 1,
            '}' => depth = depth.saturating_sub(1),
            c if depth == 0 && c.is_whitespace() && is_and_at(&chars, i + 1) => {
                segments.push(&names[segment_start..offset]);
                // skip "and" and the whitespace after it
                let (next_offset, _) = chars[i + 4];
                segment_start = next_offset;
                i += 4;
                continue;
            }
            _ => {}
        }
        i += 1;
    }
    segments.push(&names[segment_start..]);

    segments
        .into_iter()
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .collect()
}

fn is_and_at(chars: &[(usize, char)], i: usize) -> bool {
    let word: String = chars.iter().skip(i).take(3).map(|(_, c)| *c).collect();
    word.eq_ignore_ascii_case("and") && chars.get(i + 3).is_some_and(|(_, c)| c.is_whitespace())
}

fn split_commas(name: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    for c in name.chars() {
        match c {
            '{' => depth += 1,
            '}' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(std::mem::take(&mut current));
                continue;
            }
            _ => {}
        }
        current.push(c);
    }
    parts.push(current);
    parts.into_iter().map(|part| part.trim().to_string()).collect()
}

fn tokenize(part: &str) -> Vec<NameToken> {
    let mut tokens: Vec<NameToken> = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;

    for c in part.chars() {
        let is_separator = depth == 0 && (c.is_whitespace() || c == '-' || c == '~');
        if is_separator {
            let separator = if c.is_whitespace() { ' ' } else { c };
            if current.is_empty() {
                // a run of separators; `-` and `~` win over whitespace
                if let Some(previous) = tokens.last_mut() {
                    if previous.separator == ' ' {
                        previous.separator = separator;
                    }
                }
            } else {
                tokens.push(NameToken {
                    text: std::mem::take(&mut current),
                    separator,
                });
            }
            continue;
        }
        match c {
            '{' => depth += 1,
            '}' => depth = depth.saturating_sub(1),
            _ => {}
        }
        current.push(c);
    }
    if !current.is_empty() {
        tokens.push(NameToken {
            text: current,
            separator: ' ',
        });
    }
    tokens
}

/// A token belongs to the von part when its first letter is lower-case.
///
/// Plain brace groups are skipped. For a special character the control
/// sequence decides (`{\oe}` is lower, `{\OE}` upper), falling back to the
/// first letter after it (`{\'e}` is lower).
fn is_von_token(token: &NameToken) -> bool {
    let chars: Vec<char> = token.text.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c == '{' {
            if chars.get(i + 1) == Some(&'\\') {
                return special_char_is_lower(&chars[i + 2..]);
            }
            i = skip_group(&chars, i);
            continue;
        }
        if c.is_alphabetic() {
            return c.is_lowercase();
        }
        i += 1;
    }
    false
}

fn special_char_is_lower(rest: &[char]) -> bool {
    let control_sequence: String = rest.iter().take_while(|c| c.is_ascii_alphabetic()).collect();
    if crate::text::is_special_char(&control_sequence) {
        return control_sequence.chars().all(char::is_lowercase);
    }
    rest.iter()
        .skip(control_sequence.chars().count())
        .find(|c| c.is_alphabetic())
        .is_some_and(|c| c.is_lowercase())
}

/// Index just past the brace group opening at `start`.
fn skip_group(chars: &[char], start: usize) -> usize {
    let mut depth = 0usize;
    let mut i = start;
    while i < chars.len() {
        match chars[i] {
            '{' => depth += 1,
            '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return i + 1;
                }
            }
            _ => {}
        }
        i += 1;
    }
    i
}
