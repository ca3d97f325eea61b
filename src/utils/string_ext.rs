//! StringExt - Helper testuali senza stato
//!
//! Extension methods on `str`. Lengths and positions are counted in chars,
//! never in bytes, so multi-byte text is never split inside a character.

use sha2::{Digest, Sha256};
use std::fmt::Write;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StringError {
    #[error("missing required argument `{0}`")]
    MissingArgument(&'static str),

    #[error("length {requested} is out of range for a string of {available} characters")]
    OutOfRange { requested: usize, available: usize },

    #[error("'{value}' is not a valid {type_name}")]
    UnknownVariant {
        value: String,
        type_name: &'static str,
    },
}

/// Enumerations with a canonical string form, parseable through
/// [`StringExt::parse_enum`]
pub trait EnumStr: Sized + Copy + 'static {
    /// Name used in error messages
    const TYPE_NAME: &'static str;

    const VARIANTS: &'static [Self];

    fn as_str(&self) -> &'static str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEnding {
    Lf,
    CrLf,
    Cr,
}

impl LineEnding {
    pub fn as_str(self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::CrLf => "\r\n",
            LineEnding::Cr => "\r",
        }
    }
}

pub trait StringExt {
    /// Prepends `prefix` unless the string already starts with it
    fn ensure_prefix(&self, prefix: &str) -> String;

    /// Appends `suffix` unless the string already ends with it
    fn ensure_suffix(&self, suffix: &str) -> String;

    /// First `len` chars; fails when the string is shorter
    fn left(&self, len: usize) -> Result<&str, StringError>;

    /// Last `len` chars; fails when the string is shorter
    fn right(&self, len: usize) -> Result<&str, StringError>;

    /// Converts CRLF and lone CR to LF
    fn normalize_line_endings(&self) -> String;

    fn to_line_ending(&self, ending: LineEnding) -> String;

    /// `"user full name"` -> `"userFullName"`
    fn to_camel_case(&self) -> String;

    /// `"user full name"` -> `"UserFullName"`
    fn to_pascal_case(&self) -> String;

    /// Lowercases the text and capitalises the first letter of each sentence
    fn to_sentence_case(&self) -> String;

    fn parse_enum<T: EnumStr>(&self, ignore_case: bool) -> Result<T, StringError>;

    /// SHA-256 digest as 64 lowercase hex chars
    fn hash_digest(&self) -> String;

    /// At most `max` chars
    fn truncate_to(&self, max: usize) -> &str;

    /// At most `max` chars, `postfix` included, when truncation happens
    fn truncate_with_postfix(&self, max: usize, postfix: &str) -> String;

    /// Splits on `delimiter`, trims every part and drops the empty ones
    fn split_trim(&self, delimiter: char) -> Vec<&str>;

    /// Compares two comma separated lists.
    ///
    /// When either side holds more than one value the comparison is a
    /// case-insensitive "any value in common"; otherwise the two single
    /// values must be exactly equal.
    fn compare_any(&self, target: &str) -> Result<bool, StringError>;
}

impl StringExt for str {
    fn ensure_prefix(&self, prefix: &str) -> String {
        if self.starts_with(prefix) {
            self.to_string()
        } else {
            format!("{prefix}{self}")
        }
    }

    fn ensure_suffix(&self, suffix: &str) -> String {
        if self.ends_with(suffix) {
            self.to_string()
        } else {
            format!("{self}{suffix}")
        }
    }

    fn left(&self, len: usize) -> Result<&str, StringError> {
        let available = self.chars().count();
        if len > available {
            return Err(StringError::OutOfRange { requested: len, available });
        }
        Ok(&self[..byte_offset(self, len)])
    }

    fn right(&self, len: usize) -> Result<&str, StringError> {
        let available = self.chars().count();
        if len > available {
            return Err(StringError::OutOfRange { requested: len, available });
        }
        Ok(&self[byte_offset(self, available - len)..])
    }

    fn normalize_line_endings(&self) -> String {
        self.replace("\r\n", "\n").replace('\r', "\n")
    }

    fn to_line_ending(&self, ending: LineEnding) -> String {
        let normalized = self.normalize_line_endings();
        match ending {
            LineEnding::Lf => normalized,
            other => normalized.replace('\n', other.as_str()),
        }
    }

    fn to_camel_case(&self) -> String {
        let mut out = String::with_capacity(self.len());
        for (i, word) in split_words(self).iter().enumerate() {
            if i == 0 {
                out.push_str(&word.to_lowercase());
            } else {
                out.push_str(&capitalize(word));
            }
        }
        out
    }

    fn to_pascal_case(&self) -> String {
        split_words(self).iter().map(|w| capitalize(w)).collect()
    }

    fn to_sentence_case(&self) -> String {
        let mut out = String::with_capacity(self.len());
        let mut start_of_sentence = true;
        for c in self.chars() {
            if c.is_alphabetic() {
                if start_of_sentence {
                    out.extend(c.to_uppercase());
                    start_of_sentence = false;
                } else {
                    out.extend(c.to_lowercase());
                }
            } else {
                if matches!(c, '.' | '!' | '?') {
                    start_of_sentence = true;
                } else if c.is_numeric() {
                    start_of_sentence = false;
                }
                out.push(c);
            }
        }
        out
    }

    fn parse_enum<T: EnumStr>(&self, ignore_case: bool) -> Result<T, StringError> {
        let value = self.trim();
        T::VARIANTS
            .iter()
            .copied()
            .find(|variant| {
                let name = variant.as_str();
                if ignore_case {
                    name.to_lowercase() == value.to_lowercase()
                } else {
                    name == value
                }
            })
            .ok_or_else(|| StringError::UnknownVariant {
                value: value.to_string(),
                type_name: T::TYPE_NAME,
            })
    }

    fn hash_digest(&self) -> String {
        let digest = Sha256::digest(self.as_bytes());
        let mut out = String::with_capacity(64);
        for byte in digest {
            // writing into a String cannot fail
            let _ = write!(out, "{byte:02x}");
        }
        out
    }

    fn truncate_to(&self, max: usize) -> &str {
        &self[..byte_offset(self, max)]
    }

    fn truncate_with_postfix(&self, max: usize, postfix: &str) -> String {
        if self.chars().count() <= max {
            return self.to_string();
        }
        let postfix_len = postfix.chars().count();
        if max <= postfix_len {
            return postfix.truncate_to(max).to_string();
        }
        format!("{}{}", self.truncate_to(max - postfix_len), postfix)
    }

    fn split_trim(&self, delimiter: char) -> Vec<&str> {
        self.split(delimiter)
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect()
    }

    fn compare_any(&self, target: &str) -> Result<bool, StringError> {
        let sources = self.split_trim(',');
        if sources.is_empty() {
            return Err(StringError::MissingArgument("source"));
        }
        let targets = target.split_trim(',');
        if targets.is_empty() {
            return Err(StringError::MissingArgument("target"));
        }

        if let ([source], [target]) = (sources.as_slice(), targets.as_slice()) {
            return Ok(source == target);
        }
        let sources: Vec<String> = sources.iter().map(|s| s.to_lowercase()).collect();
        Ok(targets
            .iter()
            .any(|t| sources.contains(&t.to_lowercase())))
    }
}

/// Trims every part and joins the non-empty ones with `delimiter`
pub fn join_trimmed<I, S>(parts: I, delimiter: &str) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let parts: Vec<String> = parts
        .into_iter()
        .map(|p| p.as_ref().trim().to_string())
        .filter(|p| !p.is_empty())
        .collect();
    parts.join(delimiter)
}

/// Byte index of the `chars`-th char, clamped to the end of the string
fn byte_offset(s: &str, chars: usize) -> usize {
    s.char_indices().nth(chars).map_or(s.len(), |(i, _)| i)
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.as_str().to_lowercase().chars()).collect(),
        None => String::new(),
    }
}

/// Splits an identifier or phrase into words: on non-alphanumeric chars, on
/// lower-to-upper transitions and at the end of an uppercase run
/// (`"HTTPServer"` -> `["HTTP", "Server"]`)
fn split_words(s: &str) -> Vec<String> {
    let chars: Vec<char> = s.chars().collect();
    let mut words = Vec::new();
    let mut current = String::new();

    for (i, &c) in chars.iter().enumerate() {
        if !c.is_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }
        if c.is_uppercase() && !current.is_empty() {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if prev.is_lowercase() || prev.is_numeric() || (prev.is_uppercase() && next_is_lower) {
                words.push(std::mem::take(&mut current));
            }
        }
        current.push(c);
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}
