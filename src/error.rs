use std::fmt;

/// Classifies an [`Error`]. Every kind is fatal to the call that produced it;
/// no partial output is ever returned alongside an error.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed escape, unterminated group/class/brace, bad flag letter,
    /// invalid format spec, or mixed auto/manual field numbering.
    Syntax,
    /// Unknown property name or value, out-of-range escape value, bad numeric
    /// base in a format index, or a group reference the pattern cannot satisfy.
    Value,
    /// Element-type mismatch: a text template against a bytes pattern, a bytes
    /// match against a text template, and so on.
    Type,
    /// A `ReplaceTemplate` was expanded against a match from a different
    /// pattern than the one it was compiled for.
    Binding,
    /// The bounded global-flag retry protocol detected a second required
    /// restart for the same flag: the pattern toggles a global mode twice in
    /// conflicting ways.
    FlagLoop,
    /// Expansion was attempted against an empty or absent match result.
    NoMatch,
}

impl ErrorKind {
    fn label(self) -> &'static str {
        match self {
            ErrorKind::Syntax => "syntax error",
            ErrorKind::Value => "value error",
            ErrorKind::Type => "type error",
            ErrorKind::Binding => "binding error",
            ErrorKind::FlagLoop => "flag loop error",
            ErrorKind::NoMatch => "no match",
        }
    }
}

/// Represents an error encountered while transpiling a pattern, compiling a
/// replacement template, or expanding one.
/// The text contains a human-readable error message.
#[derive(Debug, Clone)]
pub struct Error {
    pub kind: ErrorKind,
    pub text: String,
    /// Offset into the source pattern or template, in scanner units
    /// (characters for text input, bytes for byte input), where feasible.
    pub pos: Option<usize>,
}

impl Error {
    pub(crate) fn new<S: ToString>(kind: ErrorKind, text: S, pos: Option<usize>) -> Self {
        Error {
            kind,
            text: text.to_string(),
            pos,
        }
    }

    /// Attach a position if the error does not already carry one.
    pub(crate) fn at(mut self, pos: usize) -> Self {
        if self.pos.is_none() {
            self.pos = Some(pos);
        }
        self
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.pos {
            Some(pos) => write!(f, "{} at {}: {}", self.kind.label(), pos, self.text),
            None => write!(f, "{}: {}", self.kind.label(), self.text),
        }
    }
}

impl std::error::Error for Error {}

/// Shorthand used by the scanners, in the spirit of a bare `Err(...)`.
pub(crate) fn error<S: ToString, T>(kind: ErrorKind, text: S, pos: Option<usize>) -> Result<T, Error> {
    Err(Error::new(kind, text, pos))
}
