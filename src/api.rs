//! Public surface: parse options, the host-engine traits, and the value
//! types exchanged across them.

use crate::transpile;

/// Options controlling pattern transpilation.
///
/// `unicode` is a tri-state hint: `None` follows the input's element type
/// (text patterns default to Unicode width, byte patterns to byte width),
/// while `Some` forces the mode. Forcing Unicode width on a byte pattern is
/// a type error.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct ParseOptions {
    /// Verbose mode: unescaped whitespace is insignificant to the host and
    /// `#` starts a comment running to end of line.
    pub verbose: bool,
    /// Text-mode hint. `Some(true)` forces the full multilingual range,
    /// `Some(false)` forces ASCII-only classes.
    pub unicode: Option<bool>,
}

impl ParseOptions {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Build options from a flag-letter string, using the same letters the
/// inline `(?flags)` syntax accepts: `x` verbose, `u` Unicode, `a` ASCII.
/// Unknown letters are ignored; use the inline syntax for strictness.
impl From<&str> for ParseOptions {
    fn from(flags: &str) -> Self {
        let mut opts = ParseOptions::default();
        for c in flags.chars() {
            match c {
                'x' => opts.verbose = true,
                'u' => opts.unicode = Some(true),
                'a' => opts.unicode = Some(false),
                _ => {}
            }
        }
        opts
    }
}

/// A compiled host pattern, as seen from this crate. The host engine owns
/// compilation and matching; template compilation only needs the group
/// topology and a stable identity to bind against.
pub trait PatternHandle {
    /// Number of capturing groups, excluding the implicit group 0.
    fn group_count(&self) -> usize;

    /// Resolve a group name to its index, if the pattern declares it.
    fn group_index(&self, name: &str) -> Option<usize>;

    /// A stable fingerprint identifying this compiled pattern. Templates
    /// record it at compile time and refuse to expand against a match
    /// carrying a different one.
    fn fingerprint(&self) -> u64;

    /// Whether the pattern matches byte strings rather than text.
    fn is_bytes(&self) -> bool;
}

/// A single captured group's text, borrowed from the match subject.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Capture<'a> {
    Text(&'a str),
    Bytes(&'a [u8]),
}

/// A match result, as seen from this crate: just enough to fetch group
/// contents and check which pattern produced it.
pub trait MatchGroups {
    /// The captured text of group `index`, or `None` if the group did not
    /// participate in the match. Group 0 is the whole match; `None` there
    /// means there is no match to expand against.
    fn group(&self, index: usize) -> Option<Capture<'_>>;

    /// Whether the match subject is a byte string.
    fn is_bytes(&self) -> bool;

    /// Fingerprint of the pattern that produced this match.
    fn pattern_fingerprint(&self) -> u64;
}

/// A replacement template source.
#[derive(Debug, Copy, Clone)]
pub enum Template<'a> {
    Text(&'a str),
    Bytes(&'a [u8]),
}

impl<'a> Template<'a> {
    pub fn is_bytes(&self) -> bool {
        matches!(self, Template::Bytes(_))
    }
}

/// An expanded replacement, with the element type of the match subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendered {
    Text(String),
    Bytes(Vec<u8>),
}

impl Rendered {
    /// The text form, if this is a text rendering.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Rendered::Text(s) => Some(s),
            Rendered::Bytes(_) => None,
        }
    }

    /// The byte form, if this is a bytes rendering.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Rendered::Bytes(b) => Some(b),
            Rendered::Text(_) => None,
        }
    }
}

/// Escape a string so the host engine treats every character literally.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        transpile::push_escaped_literal(&mut out, c);
    }
    out
}

/// Escape a byte string so the host engine treats every byte literally.
pub fn escape_bytes(text: &[u8]) -> Vec<u8> {
    let mut out = String::with_capacity(text.len());
    for &b in text {
        transpile::push_escaped_literal(&mut out, b as char);
    }
    // One byte per scanner unit; String::into_bytes would UTF-8-widen the
    // high half.
    out.chars().map(|c| c as u8).collect()
}
