use crate::error::{error, Error, ErrorKind};

/// A rewindable scanner over a decoded pattern or template.
///
/// Byte patterns are decoded one byte per char (values 0..=0xFF) before
/// scanning, so positions are always in scanner units regardless of the
/// input's element type.
#[derive(Debug, Clone)]
pub(crate) struct Cursor<'a> {
    chars: &'a [char],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub(crate) fn new(chars: &'a [char]) -> Self {
        Cursor { chars, pos: 0 }
    }

    /// \return the current position, in scanner units.
    pub(crate) fn pos(&self) -> usize {
        self.pos
    }

    /// \return the next character, advancing the position.
    pub(crate) fn next(&mut self) -> Option<char> {
        let c = self.chars.get(self.pos).copied();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    /// Peek at the next character without advancing.
    pub(crate) fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    /// Peek `n` characters past the next one.
    pub(crate) fn peek_at(&self, n: usize) -> Option<char> {
        self.chars.get(self.pos + n).copied()
    }

    /// If our contents begin with the char c, consume it and return true.
    pub(crate) fn try_consume(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// If our contents begin with the string s, consume it and return true.
    pub(crate) fn try_consume_str(&mut self, s: &str) -> bool {
        let mut lookahead = 0;
        for c in s.chars() {
            if self.peek_at(lookahead) != Some(c) {
                return false;
            }
            lookahead += 1;
        }
        self.pos += lookahead;
        true
    }

    /// Step back by `n` units. Never moves before the start of input.
    pub(crate) fn rewind(&mut self, n: usize) {
        debug_assert!(n <= self.pos, "rewind past start of input");
        self.pos = self.pos.saturating_sub(n);
    }

    /// \return the next character, or a syntax error mentioning `what`.
    pub(crate) fn need(&mut self, what: &str) -> Result<char, Error> {
        let pos = self.pos;
        match self.next() {
            Some(c) => Ok(c),
            None => error(ErrorKind::Syntax, format!("incomplete {}", what), Some(pos)),
        }
    }
}
