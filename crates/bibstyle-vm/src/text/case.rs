/*
 * case.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! `change.case$`: case conversion that respects braces and special characters.
//!
//! Only letters at brace depth zero change case. Plain brace groups such as
//! `{NASA}` pass through untouched. Inside a special character (`{\oe}`,
//! `{\'E}`) the letters after the control sequence follow the requested case.
//! A control sequence naming a foreign letter (`\oe`, `\AA`, `\ss`) is
//! converted through the special character table; any other keeps its
//! spelling, so `{\TeX}` survives lower-casing.

use super::{BraceDepth, Transformed, is_special_char};

/// The three legacy case formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseFormat {
    /// `t`: lower-case everything except the first character and the first
    /// character after a colon followed by whitespace.
    TitleLower,
    /// `l`
    AllLower,
    /// `u`
    AllUpper,
}

impl CaseFormat {
    /// Map a format specification character (case-insensitive).
    pub fn from_spec(spec: char) -> Option<Self> {
        match spec.to_ascii_lowercase() {
            't' => Some(CaseFormat::TitleLower),
            'l' => Some(CaseFormat::AllLower),
            'u' => Some(CaseFormat::AllUpper),
            _ => None,
        }
    }

    fn convert(self, c: char, out: &mut String) {
        match self {
            CaseFormat::TitleLower | CaseFormat::AllLower => out.extend(c.to_lowercase()),
            CaseFormat::AllUpper => out.extend(c.to_uppercase()),
        }
    }
}

/// Change the case of `text` according to `format`.
pub fn change_case(text: &str, format: CaseFormat) -> Transformed<String> {
    let changer = CaseChanger {
        format,
        chars: text.chars().collect(),
        out: String::with_capacity(text.len()),
        braces: BraceDepth::default(),
        prev_colon: false,
    };
    changer.run(text)
}

struct CaseChanger {
    format: CaseFormat,
    chars: Vec<char>,
    out: String,
    braces: BraceDepth,
    prev_colon: bool,
}

impl CaseChanger {
    fn run(mut self, text: &str) -> Transformed<String> {
        let n = self.chars.len();
        let mut i = 0;
        while i < n {
            let c = self.chars[i];
            if c == '{' {
                self.braces.open();
                if self.braces.depth != 1 || i + 4 > n || self.chars[i + 1] != '\\' {
                    self.prev_colon = false;
                    self.out.push(c);
                    i += 1;
                    continue;
                }
                if self.format == CaseFormat::TitleLower && self.keeps_case_at(i) {
                    // The whole special character is copied unchanged below
                    // because it sits at depth one.
                    self.out.push(c);
                    self.prev_colon = false;
                    i += 1;
                    continue;
                }
                i = self.convert_special_char(i);
                self.prev_colon = false;
                continue;
            }
            if c == '}' {
                self.out.push(c);
                self.braces.close(text);
                self.prev_colon = false;
                i += 1;
                continue;
            }
            if self.braces.depth == 0 {
                self.convert_top_level(i);
            } else {
                self.out.push(c);
            }
            i += 1;
        }
        let warnings = self.braces.finish(text);
        Transformed::new(self.out, warnings)
    }

    /// Title case keeps the first character, and the first one after `:` + whitespace.
    fn keeps_case_at(&self, i: usize) -> bool {
        i == 0 || (self.prev_colon && self.chars[i - 1].is_whitespace())
    }

    fn convert_top_level(&mut self, i: usize) {
        let c = self.chars[i];
        match self.format {
            CaseFormat::TitleLower => {
                if self.keeps_case_at(i) {
                    self.out.push(c);
                } else {
                    self.format.convert(c, &mut self.out);
                }
                if c == ':' {
                    self.prev_colon = true;
                } else if !c.is_whitespace() {
                    self.prev_colon = false;
                }
            }
            CaseFormat::AllLower | CaseFormat::AllUpper => self.format.convert(c, &mut self.out),
        }
    }

    /// Convert a special character starting at the `{` at `start`.
    ///
    /// Returns the index just past the group.
    fn convert_special_char(&mut self, start: usize) -> usize {
        let n = self.chars.len();
        let mut i = start;
        self.out.push(self.chars[i]);
        i += 1;
        while i < n && self.braces.depth > 0 {
            // the backslash
            self.out.push(self.chars[i]);
            i += 1;
            let name_end = (i..n)
                .find(|&j| !self.chars[j].is_ascii_alphabetic())
                .unwrap_or(n);
            let name: String = self.chars[i..name_end].iter().collect();
            if is_special_char(&name) {
                i = self.convert_accented(i, &name);
            } else {
                // other control sequences keep their spelling
                self.out.push_str(&name);
                i = name_end;
            }
            while i < n && self.braces.depth > 0 && self.chars[i] != '\\' {
                let c = self.chars[i];
                if c == '}' {
                    self.braces.depth -= 1;
                } else if c == '{' {
                    self.braces.open();
                }
                self.format.convert(c, &mut self.out);
                i += 1;
            }
        }
        i
    }

    fn convert_accented(&mut self, start: usize, name: &str) -> usize {
        let mut pos = start + name.len();
        match self.format {
            CaseFormat::TitleLower | CaseFormat::AllLower => {
                if matches!(name, "L" | "O" | "OE" | "AE" | "AA") {
                    self.out.push_str(&name.to_lowercase());
                } else {
                    self.out.push_str(name);
                }
            }
            CaseFormat::AllUpper => {
                if matches!(name, "l" | "o" | "oe" | "ae" | "aa") {
                    self.out.push_str(&name.to_uppercase());
                } else if matches!(name, "i" | "j" | "ss") {
                    // \i, \j and \ss have no upper-case control sequence
                    self.out.pop();
                    self.out.push_str(&name.to_uppercase());
                    while pos < self.chars.len() && self.chars[pos].is_whitespace() {
                        pos += 1;
                    }
                } else {
                    self.out.push_str(name);
                }
            }
        }
        pos
    }
}
