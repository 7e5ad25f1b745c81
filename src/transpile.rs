//! Transpiler from extended pattern syntax to host pattern syntax.
//!
//! This is a single left-to-right pass with one-unit lookahead and rewind.
//! There is no syntax tree: every extended construct maps to a local,
//! context-free expansion, so the scanner writes host syntax straight into an
//! output buffer while tracking a small amount of state (quoting, verbose
//! comments, open groups, character classes). Constructs the host already
//! understands pass through byte for byte.

use crate::api::ParseOptions;
use crate::codepointset::CodePointSet;
use crate::cursor::Cursor;
use crate::error::{error, Error, ErrorKind};
use crate::unicode::{self, Mode};

/// Transpile a text pattern into host-native syntax.
pub fn transpile(pattern: &str, opts: ParseOptions) -> Result<String, Error> {
    let chars: Vec<char> = pattern.chars().collect();
    run(&chars, opts.verbose, opts.unicode.unwrap_or(true), false)
}

/// Transpile a byte pattern into host-native syntax. The pattern is scanned
/// one byte per unit; wide Unicode constructs degrade to match-nothing
/// classes.
pub fn transpile_bytes(pattern: &[u8], opts: ParseOptions) -> Result<Vec<u8>, Error> {
    if opts.unicode == Some(true) {
        return error(
            ErrorKind::Type,
            "cannot use Unicode mode with a bytes pattern",
            None,
        );
    }
    let chars: Vec<char> = pattern.iter().map(|&b| b as char).collect();
    let out = run(&chars, opts.verbose, false, true)?;
    Ok(out
        .chars()
        .map(|c| {
            debug_assert!((c as u32) <= 0xFF, "byte-mode output stayed single-byte");
            c as u8
        })
        .collect())
}

/// A global flag whose effect is not confined to the group it is written in.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum GlobalFlag {
    TextMode,
    Verbose,
}

impl GlobalFlag {
    fn name(self) -> &'static str {
        match self {
            GlobalFlag::TextMode => "text mode",
            GlobalFlag::Verbose => "verbose",
        }
    }
}

/// Which global flags have already triggered a restart. Each may trigger at
/// most one.
#[derive(Debug, Default, Copy, Clone)]
struct FlagSwaps {
    text_mode: bool,
    verbose: bool,
}

impl FlagSwaps {
    fn swapped(&mut self, flag: GlobalFlag) -> &mut bool {
        match flag {
            GlobalFlag::TextMode => &mut self.text_mode,
            GlobalFlag::Verbose => &mut self.verbose,
        }
    }
}

/// The bounded retry loop. An unscoped change to a global flag discards the
/// partial output and restarts the scan from position 0 with the new value
/// pre-applied; a second change to the same flag is a structurally
/// contradictory pattern and fails.
fn run(chars: &[char], verbose: bool, text_mode: bool, byte_mode: bool) -> Result<String, Error> {
    let mut swaps = FlagSwaps::default();
    let mut verbose = verbose;
    let mut text_mode = text_mode;
    loop {
        let mut scanner = Transpiler::new(chars, verbose, text_mode, byte_mode);
        scanner.scan()?;
        match scanner.restart {
            None => return Ok(scanner.out),
            Some((flag, value, pos)) => {
                let seen = swaps.swapped(flag);
                if *seen {
                    return error(
                        ErrorKind::FlagLoop,
                        format!("global {} flag toggled twice", flag.name()),
                        Some(pos),
                    );
                }
                *seen = true;
                match flag {
                    GlobalFlag::TextMode => text_mode = value,
                    GlobalFlag::Verbose => verbose = value,
                }
            }
        }
    }
}

/// State saved when a scoped-flag group opens, restored at its `)`.
type SavedFlags = Option<(bool, bool)>;

struct Transpiler<'a> {
    cursor: Cursor<'a>,
    out: String,
    verbose: bool,
    text_mode: bool,
    byte_mode: bool,
    /// One entry per open group; `Some` entries carry flags to restore.
    group_stack: Vec<SavedFlags>,
    /// Pending unscoped global flag change: (flag, new value, position).
    restart: Option<(GlobalFlag, bool, usize)>,
}

impl<'a> Transpiler<'a> {
    fn new(chars: &'a [char], verbose: bool, text_mode: bool, byte_mode: bool) -> Self {
        Transpiler {
            cursor: Cursor::new(chars),
            out: String::new(),
            verbose,
            text_mode,
            byte_mode,
            group_stack: Vec::new(),
            restart: None,
        }
    }

    fn mode(&self) -> Mode {
        Mode::select(self.byte_mode, self.text_mode)
    }

    fn scan(&mut self) -> Result<(), Error> {
        while let Some(c) = self.cursor.next() {
            match c {
                '\\' => self.scan_escape()?,
                '[' => self.scan_class()?,
                '(' => self.scan_group()?,
                ')' => {
                    let pos = self.cursor.pos() - 1;
                    match self.group_stack.pop() {
                        None => {
                            return error(ErrorKind::Syntax, "unbalanced parenthesis", Some(pos))
                        }
                        Some(Some((verbose, text_mode))) => {
                            self.verbose = verbose;
                            self.text_mode = text_mode;
                        }
                        Some(None) => {}
                    }
                    self.out.push(')');
                }
                '#' if self.verbose => self.scan_comment(),
                _ => self.out.push(c),
            }
            if self.restart.is_some() {
                return Ok(());
            }
        }
        if !self.group_stack.is_empty() {
            return error(ErrorKind::Syntax, "unbalanced parenthesis", None);
        }
        Ok(())
    }

    /// `\Q...\E` quoting: every character in between becomes an engine-escaped
    /// literal. An unterminated `\Q` escapes through end of input, and a
    /// nested `\Q` is itself escaped rather than nesting.
    fn scan_quote(&mut self) {
        while let Some(c) = self.cursor.next() {
            if c == '\\' && self.cursor.try_consume('E') {
                return;
            }
            push_escaped_literal(&mut self.out, c);
        }
    }

    /// A verbose-mode comment runs from `#` to end of line. The host strips
    /// it again when it compiles the verbose pattern, so the text passes
    /// through; but case/quote tokens inside it are re-escaped so that no
    /// later scan of the output can mistake them for live escapes.
    fn scan_comment(&mut self) {
        self.out.push('#');
        while let Some(c) = self.cursor.next() {
            if c == '\\' {
                if let Some(t) = self.cursor.peek() {
                    if matches!(t, 'Q' | 'E' | 'l' | 'L' | 'c' | 'C') {
                        self.cursor.next();
                        self.out.push_str("\\\\");
                        self.out.push(t);
                        continue;
                    }
                }
            }
            self.out.push(c);
            if c == '\n' {
                return;
            }
        }
    }

    /// Emit a resolved set as a standalone class.
    fn emit_set_class(&mut self, set: &CodePointSet) {
        if set.is_empty() {
            self.out.push_str(&unicode::impossible_class(self.mode()));
        } else {
            self.out.push('[');
            self.out.push_str(&unicode::format_class_body(set));
            self.out.push(']');
        }
    }

    fn case_class(&self, letter: char) -> Result<CodePointSet, Error> {
        let value = match letter {
            'l' => "lower",
            'L' => "^lower",
            'c' => "upper",
            'C' => "^upper",
            _ => unreachable!("not a case-class escape"),
        };
        unicode::resolve(None, value, self.mode())
    }

    /// An escape outside a character class.
    fn scan_escape(&mut self) -> Result<(), Error> {
        let pos = self.cursor.pos() - 1;
        let c = self.cursor.need("escape")?;
        match c {
            'Q' => self.scan_quote(),
            // A stray \E without an open quote is dropped.
            'E' => {}
            'l' | 'L' | 'c' | 'C' => {
                let set = self.case_class(c).map_err(|e| e.at(pos))?;
                self.emit_set_class(&set);
            }
            'p' | 'P' => {
                self.scan_property(c == 'P', false)?;
            }
            'N' if self.cursor.peek() == Some('{') => {
                self.scan_named_codepoint(false)?;
            }
            'R' => {
                let set = unicode::line_break_set(self.mode());
                self.out.push_str("(?:\\r\\n|[");
                self.out.push_str(&unicode::format_class_body(&set));
                self.out.push_str("])");
            }
            'h' | 'H' => {
                let value = if c == 'h' { "blank" } else { "^blank" };
                let set = unicode::resolve(None, value, self.mode()).map_err(|e| e.at(pos))?;
                self.emit_set_class(&set);
            }
            'X' => self.emit_grapheme_cluster(),
            // Anything else is the host's business; pass it through
            // unchanged. This includes \\, \d, \x41, back-references, and
            // "no such escape" sequences.
            _ => {
                self.out.push('\\');
                self.out.push(c);
            }
        }
        Ok(())
    }

    /// `\X`: a non-mark character followed by every mark that follows it.
    fn emit_grapheme_cluster(&mut self) {
        let marks = unicode::mark_set(self.mode());
        if marks.is_empty() {
            // No combining marks in range: any single unit is a cluster.
            self.out.push_str("(?:");
            let everything = CodePointSet::new().inverted_within(self.mode().limit());
            self.emit_set_class(&everything);
            self.out.push(')');
            return;
        }
        let body = unicode::format_class_body(&marks);
        self.out.push_str("(?:[^");
        self.out.push_str(&body);
        self.out.push_str("][");
        self.out.push_str(&body);
        self.out.push_str("]*(?![");
        self.out.push_str(&body);
        self.out.push_str("]))");
    }

    /// `\p{...}` / `\P{...}`, inside or outside a class. Inside a class the
    /// expansion is spliced as a bare range body; the return value reports
    /// whether a following `-` must be forced literal.
    fn scan_property(&mut self, negated_escape: bool, in_class: bool) -> Result<bool, Error> {
        let pos = self.cursor.pos() - 2;
        if !self.cursor.try_consume('{') {
            // Bare \p is not a property escape; leave it for the host.
            self.out.push('\\');
            self.out.push(if negated_escape { 'P' } else { 'p' });
            return Ok(false);
        }
        let mut content = String::new();
        loop {
            match self.cursor.next() {
                None => return error(ErrorKind::Syntax, "unterminated property escape", Some(pos)),
                Some('}') => break,
                Some(c) => content.push(c),
            }
        }
        let mut negated = negated_escape;
        let mut body = content.as_str();
        if let Some(rest) = body.strip_prefix('^') {
            negated = !negated;
            body = rest;
        }
        let (category, value) = match body.find([':', '=']) {
            Some(idx) => (Some(&body[..idx]), &body[idx + 1..]),
            None => (None, body),
        };
        let value = if negated {
            format!("^{}", value)
        } else {
            value.to_string()
        };
        let set = unicode::resolve(category, &value, self.mode()).map_err(|e| e.at(pos))?;
        if in_class {
            // An empty expansion contributes nothing; either way the guard
            // keeps a following '-' from forming an accidental range.
            self.out.push_str(&unicode::format_class_body(&set));
            Ok(true)
        } else {
            self.emit_set_class(&set);
            Ok(false)
        }
    }

    /// `\N{NAME}`: a named code point, rendered as an octal escape in the
    /// single-byte range and as a direct literal above it. In byte mode a
    /// wide code point cannot match at all.
    fn scan_named_codepoint(&mut self, in_class: bool) -> Result<bool, Error> {
        let pos = self.cursor.pos() - 2;
        self.cursor.try_consume('{');
        let mut name = String::new();
        loop {
            match self.cursor.next() {
                None => {
                    return error(ErrorKind::Syntax, "unterminated character name", Some(pos))
                }
                Some('}') => break,
                Some(c) => name.push(c),
            }
        }
        let Some(ch) = unicode::codepoint_by_name(&name) else {
            return error(
                ErrorKind::Value,
                format!("undefined character name '{}'", name),
                Some(pos),
            );
        };
        let cp = ch as u32;
        if cp <= 0xFF {
            self.out.push_str(&format!("\\{:03o}", cp));
            Ok(in_class)
        } else if self.byte_mode {
            if in_class {
                // Impossible inside a byte class: contribute nothing.
                Ok(true)
            } else {
                self.out.push_str(&unicode::impossible_class(self.mode()));
                Ok(false)
            }
        } else {
            self.out.push(ch);
            Ok(in_class)
        }
    }

    /// A character class. Verbose mode is inert in here; `]` as the first
    /// member is a literal; a `-` directly after a property or named-codepoint
    /// expansion is forced literal so it cannot form a range.
    fn scan_class(&mut self) -> Result<(), Error> {
        let bracket_pos = self.cursor.pos() - 1;
        self.out.push('[');
        if self.cursor.try_consume('^') {
            self.out.push('^');
        }
        let mut first = true;
        let mut dash_guard = false;
        loop {
            let Some(c) = self.cursor.next() else {
                return error(
                    ErrorKind::Syntax,
                    "unterminated character class",
                    Some(bracket_pos),
                );
            };
            let mut guard_next = false;
            match c {
                ']' if !first => {
                    self.out.push(']');
                    return Ok(());
                }
                '[' if self.cursor.peek() == Some(':') => {
                    guard_next = self.scan_posix_class(self.cursor.pos() - 1)?;
                }
                '-' if dash_guard || self.peeking_at_splice() => self.out.push_str("\\-"),
                '\\' => guard_next = self.scan_class_escape()?,
                _ => self.out.push(c),
            }
            first = false;
            dash_guard = guard_next;
        }
    }

    /// \return whether the class scan is looking at a construct that splices
    /// a range body, so that a `-` in front of it cannot open a range.
    fn peeking_at_splice(&self) -> bool {
        match self.cursor.peek() {
            Some('[') => self.cursor.peek_at(1) == Some(':'),
            Some('\\') => match self.cursor.peek_at(1) {
                // Bare \p and \N without a brace stay the host's business.
                Some('p' | 'P' | 'N') => self.cursor.peek_at(2) == Some('{'),
                Some('l' | 'L' | 'c' | 'C' | 'h' | 'H') => true,
                _ => false,
            },
            _ => false,
        }
    }

    /// `[:name:]` / `[:^name:]` inside a class. If the `:]` terminator never
    /// arrives this was an ordinary literal `[` after all.
    fn scan_posix_class(&mut self, bracket_pos: usize) -> Result<bool, Error> {
        self.cursor.try_consume(':');
        let mut name = String::new();
        if self.cursor.try_consume('^') {
            name.push('^');
        }
        while let Some(c) = self.cursor.peek() {
            if c.is_ascii_alphanumeric() || matches!(c, ' ' | '-' | '_') {
                name.push(c);
                self.cursor.next();
            } else {
                break;
            }
        }
        if !self.cursor.try_consume_str(":]") {
            self.cursor.rewind(self.cursor.pos() - bracket_pos - 1);
            self.out.push('[');
            return Ok(false);
        }
        if name.is_empty() || name == "^" {
            return error(ErrorKind::Syntax, "empty POSIX class", Some(bracket_pos));
        }
        let set = unicode::resolve(None, &name, self.mode()).map_err(|e| e.at(bracket_pos))?;
        self.out.push_str(&unicode::format_class_body(&set));
        Ok(true)
    }

    /// An escape inside a character class. Returns the dash-guard flag.
    fn scan_class_escape(&mut self) -> Result<bool, Error> {
        let pos = self.cursor.pos() - 1;
        let c = self.cursor.need("escape")?;
        match c {
            'Q' => {
                self.scan_quote();
                Ok(false)
            }
            'E' => Ok(false),
            'l' | 'L' | 'c' | 'C' => {
                let set = self.case_class(c).map_err(|e| e.at(pos))?;
                self.out.push_str(&unicode::format_class_body(&set));
                Ok(true)
            }
            'p' | 'P' => self.scan_property(c == 'P', true),
            'N' if self.cursor.peek() == Some('{') => self.scan_named_codepoint(true),
            'R' => error(
                ErrorKind::Syntax,
                "\\R is not allowed in a character class",
                Some(pos),
            ),
            'X' => error(
                ErrorKind::Syntax,
                "\\X is not allowed in a character class",
                Some(pos),
            ),
            'h' | 'H' => {
                let value = if c == 'h' { "blank" } else { "^blank" };
                let set = unicode::resolve(None, value, self.mode()).map_err(|e| e.at(pos))?;
                self.out.push_str(&unicode::format_class_body(&set));
                Ok(true)
            }
            _ => {
                self.out.push('\\');
                self.out.push(c);
                Ok(false)
            }
        }
    }

    /// A `(` was consumed: dispatch on the group prefix. Bodies are not
    /// parsed recursively; only the stack entry matters.
    fn scan_group(&mut self) -> Result<(), Error> {
        let pos = self.cursor.pos() - 1;
        if !self.cursor.try_consume('?') {
            self.out.push('(');
            self.group_stack.push(None);
            return Ok(());
        }
        match self.cursor.peek() {
            Some('#') => self.scan_comment_group(pos),
            Some('=') | Some('!') => {
                let c = self.cursor.next().unwrap();
                self.out.push_str("(?");
                self.out.push(c);
                self.group_stack.push(None);
                Ok(())
            }
            Some(':') => {
                self.cursor.next();
                self.out.push_str("(?:");
                self.group_stack.push(None);
                Ok(())
            }
            Some('<') => {
                self.cursor.next();
                self.out.push_str("(?<");
                if let Some(c @ ('=' | '!')) = self.cursor.peek() {
                    self.cursor.next();
                    self.out.push(c);
                }
                self.group_stack.push(None);
                Ok(())
            }
            Some('P') => {
                self.cursor.next();
                let c = self.cursor.need("group")?;
                if c != '<' && c != '=' {
                    return error(ErrorKind::Syntax, "invalid group modifier", Some(pos));
                }
                self.out.push_str("(?P");
                self.out.push(c);
                self.group_stack.push(None);
                Ok(())
            }
            Some(c) if c == '-' || "aiLmsux".contains(c) => self.scan_flag_group(pos),
            _ => error(ErrorKind::Syntax, "invalid group modifier", Some(pos)),
        }
    }

    /// `(?#...)` passes through verbatim without interpretation.
    fn scan_comment_group(&mut self, pos: usize) -> Result<(), Error> {
        self.out.push_str("(?");
        loop {
            match self.cursor.next() {
                None => return error(ErrorKind::Syntax, "unterminated comment group", Some(pos)),
                Some(')') => {
                    self.out.push(')');
                    return Ok(());
                }
                Some(c) => self.out.push(c),
            }
        }
    }

    /// `(?flags)` and `(?flags:...)`. Scoped flags apply until the group
    /// closes; unscoped changes to global flags request a restart.
    fn scan_flag_group(&mut self, pos: usize) -> Result<(), Error> {
        let mut on = String::new();
        let mut off = String::new();
        let mut seen_dash = false;
        loop {
            let c = self.cursor.need("group")?;
            match c {
                'a' | 'i' | 'L' | 'm' | 's' | 'u' | 'x' if !seen_dash => on.push(c),
                // Only scope-revertable letters may be turned off.
                'i' | 'm' | 's' | 'x' if seen_dash => off.push(c),
                '-' if !seen_dash => seen_dash = true,
                ':' => return self.apply_scoped_flags(&on, &off, pos),
                ')' => {
                    if seen_dash {
                        return error(
                            ErrorKind::Syntax,
                            "inline flags cannot be turned off globally",
                            Some(pos),
                        );
                    }
                    return self.apply_global_flags(&on, pos);
                }
                _ => return error(ErrorKind::Syntax, format!("bad flag '{}'", c), Some(pos)),
            }
        }
    }

    fn check_flag_letters(&self, on: &str, pos: usize) -> Result<(), Error> {
        if on.contains('a') && on.contains('u') {
            return error(ErrorKind::Syntax, "incompatible flags 'a' and 'u'", Some(pos));
        }
        if on.contains('u') && self.byte_mode {
            return error(
                ErrorKind::Value,
                "cannot use Unicode flag with a bytes pattern",
                Some(pos),
            );
        }
        Ok(())
    }

    fn apply_scoped_flags(&mut self, on: &str, off: &str, pos: usize) -> Result<(), Error> {
        if on.is_empty() && off.is_empty() {
            return error(ErrorKind::Syntax, "missing flag letters", Some(pos));
        }
        self.check_flag_letters(on, pos)?;
        self.group_stack
            .push(Some((self.verbose, self.text_mode)));
        for c in on.chars() {
            match c {
                'x' => self.verbose = true,
                'u' => self.text_mode = true,
                'a' => self.text_mode = false,
                _ => {} // host-owned flags pass through
            }
        }
        if off.contains('x') {
            self.verbose = false;
        }
        self.out.push_str("(?");
        self.out.push_str(on);
        if !off.is_empty() {
            self.out.push('-');
            self.out.push_str(off);
        }
        self.out.push(':');
        Ok(())
    }

    fn apply_global_flags(&mut self, on: &str, pos: usize) -> Result<(), Error> {
        if on.is_empty() {
            return error(ErrorKind::Syntax, "missing flag letters", Some(pos));
        }
        self.check_flag_letters(on, pos)?;
        for c in on.chars() {
            let change = match c {
                'x' if !self.verbose => Some((GlobalFlag::Verbose, true)),
                'u' if !self.text_mode && !self.byte_mode => Some((GlobalFlag::TextMode, true)),
                'a' if self.text_mode => Some((GlobalFlag::TextMode, false)),
                _ => None,
            };
            if let Some((flag, value)) = change {
                self.restart = Some((flag, value, pos));
                return Ok(());
            }
        }
        self.out.push_str("(?");
        self.out.push_str(on);
        self.out.push(')');
        Ok(())
    }
}

/// Append an engine-escaped literal: every ASCII character that is not
/// alphanumeric or `_` gets a backslash, everything else passes through.
pub(crate) fn push_escaped_literal(out: &mut String, c: char) {
    if c.is_ascii() && !c.is_ascii_alphanumeric() && c != '_' {
        out.push('\\');
    }
    out.push(c);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(pattern: &str) -> String {
        transpile(pattern, ParseOptions::default()).unwrap()
    }

    #[test]
    fn host_syntax_passes_through() {
        for pattern in [
            r"abc",
            r"a+b*c??",
            r"(\d{4})-(\d{2})",
            r"(?:x|y)(?<year>\d+)\k<year>",
            r"[a-z&&b]",
            r"(?=x)(?!y)(?<=z)(?<!w)",
            r"\w\d\s\b\1\x41A",
            r"[^\]x-]",
        ] {
            assert_eq!(t(pattern), pattern, "not idempotent: {}", pattern);
        }
    }

    #[test]
    fn escape_depth_parity() {
        // \Q active, \\Q literal, \\\Q active again, \\\\Q literal.
        assert_eq!(t(r"\Qa\E"), "a");
        assert_eq!(t(r"\\Qa"), r"\\Qa");
        assert_eq!(t(r"\\\Q+\E"), r"\\\+");
        assert_eq!(t(r"\\\\Q+"), r"\\\\Q+");
    }

    #[test]
    fn quoting_escapes_metacharacters() {
        assert_eq!(t(r"\Qa.b\E"), r"a\.b");
        // Unterminated quote runs to end of input.
        assert_eq!(t(r"x\Q(a"), r"x\(a");
        // A nested \Q is escaped, not a nesting level.
        assert_eq!(t(r"\Q\Qa\E"), r"\\Qa");
    }

    #[test]
    fn stray_quote_end_is_dropped() {
        assert_eq!(t(r"a\Eb"), "ab");
    }

    #[test]
    fn unbalanced_groups_are_errors() {
        assert_eq!(
            transpile("(a", ParseOptions::default()).unwrap_err().kind,
            ErrorKind::Syntax
        );
        assert_eq!(
            transpile("a)", ParseOptions::default()).unwrap_err().kind,
            ErrorKind::Syntax
        );
    }

    #[test]
    fn scoped_flags_revert() {
        // Scoped verbose: a \Q inside a comment is re-escaped; once the
        // group closes, \Q is live quoting again.
        let out = t("(?x:#\\Q\n)#\\Q.");
        assert_eq!(out, "(?x:#\\\\Q\n)#\\.");
    }

    #[test]
    fn bytes_pattern_rejects_unicode_hint() {
        let opts = ParseOptions {
            unicode: Some(true),
            ..Default::default()
        };
        assert_eq!(
            transpile_bytes(b"abc", opts).unwrap_err().kind,
            ErrorKind::Type
        );
    }
}
