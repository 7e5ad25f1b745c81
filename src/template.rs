//! Replacement-template compiler.
//!
//! A template is scanned once, left to right, into alternating literal runs
//! and group slots. Group references are resolved against the bound pattern
//! at compile time, so a bad index or name fails here rather than on first
//! expansion. The compiled form is immutable and hashable so callers can
//! cache it keyed by (pattern, template) and share it across threads.

use crate::api::{PatternHandle, Template};
use crate::cursor::Cursor;
use crate::error::{error, Error, ErrorKind};
use crate::unicode;

/// A case-folding direction.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Case {
    Upper,
    Lower,
}

impl Case {
    /// Fold one scanner unit into `out`. Byte-mode folding is ASCII-only so
    /// latin-1 units never widen.
    pub(crate) fn push_folded(self, out: &mut String, c: char, byte_mode: bool) {
        if byte_mode {
            out.push(match self {
                Case::Upper => c.to_ascii_uppercase(),
                Case::Lower => c.to_ascii_lowercase(),
            });
        } else {
            match self {
                Case::Upper => out.extend(c.to_uppercase()),
                Case::Lower => out.extend(c.to_lowercase()),
            }
        }
    }
}

/// A group reference as written in the template, kept for diagnostics
/// alongside the resolved host index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GroupRef {
    Index(usize),
    Name(String),
}

impl std::fmt::Display for GroupRef {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            GroupRef::Index(n) => write!(f, "{}", n),
            GroupRef::Name(s) => f.write_str(s),
        }
    }
}

/// A key in a format-mode `[...]` index access.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndexKey {
    /// Numeric index; negatives count from the end. Written in decimal or
    /// with a `0x`/`0o`/`0b` base prefix.
    Num(i64),
    Str(String),
}

/// A format-mode `!conv` conversion.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Conversion {
    /// `!s`: the captured text itself.
    Str,
    /// `!r`: quoted repr form.
    Repr,
    /// `!a`: repr form with non-ASCII escaped.
    Ascii,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Align {
    Left,
    Right,
    Center,
}

/// A format-mode `:spec` of the shape `[[fill]align][width]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldSpec {
    pub fill: Option<char>,
    pub align: Option<Align>,
    pub width: usize,
}

/// One operation of a format-mode capture chain, applied in source order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FormatOp {
    Attr(String),
    Index(IndexKey),
    Convert(Conversion),
    Spec(FieldSpec),
}

/// One group reference in a compiled template.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupSlot {
    /// The reference as written, for diagnostics.
    pub group: GroupRef,
    /// The resolved index on the bound pattern.
    pub host_index: usize,
    /// Case span open at the point of reference, applied to the whole value.
    pub span_case: Option<Case>,
    /// Pending single-shot case, applied to the value's first unit.
    pub single_case: Option<Case>,
    /// Format-mode capture chain; empty in plain mode.
    pub ops: Vec<FormatOp>,
}

/// An immutable compiled replacement template, bound to one host pattern by
/// fingerprint. Slot `i` is preceded by `literals[i]` and the final literal
/// run is `literals[slots.len()]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReplaceTemplate {
    pub(crate) fingerprint: u64,
    pub(crate) byte_mode: bool,
    pub(crate) format_mode: bool,
    pub(crate) literals: Vec<Option<String>>,
    pub(crate) slots: Vec<GroupSlot>,
}

impl ReplaceTemplate {
    /// Fingerprint of the pattern this template was compiled against.
    pub fn fingerprint(&self) -> u64 {
        self.fingerprint
    }

    /// Whether this template produces byte output.
    pub fn is_bytes(&self) -> bool {
        self.byte_mode
    }
}

/// Compile a replacement template against a compiled host pattern.
///
/// `format_mode` selects the `{field}` dialect over plain `\N`/`\g<>`
/// back-references; backslash escapes and case markers work in both. The
/// template's element type must match the pattern's.
pub fn compile_template(
    pattern: &dyn PatternHandle,
    template: Template<'_>,
    format_mode: bool,
) -> Result<ReplaceTemplate, Error> {
    if template.is_bytes() != pattern.is_bytes() {
        return error(
            ErrorKind::Type,
            if pattern.is_bytes() {
                "expected a bytes template against a bytes pattern"
            } else {
                "expected a text template against a text pattern"
            },
            None,
        );
    }
    let chars: Vec<char> = match template {
        Template::Text(s) => s.chars().collect(),
        Template::Bytes(b) => b.iter().map(|&b| b as char).collect(),
    };
    let mut compiler = TemplateCompiler {
        cursor: Cursor::new(&chars),
        pattern,
        byte_mode: template.is_bytes(),
        format_mode,
        literal: String::new(),
        literals: Vec::new(),
        slots: Vec::new(),
        case_stack: Vec::new(),
        single_case: None,
        numbering: None,
        next_auto: 0,
    };
    compiler.scan()?;
    Ok(ReplaceTemplate {
        fingerprint: pattern.fingerprint(),
        byte_mode: template.is_bytes(),
        format_mode,
        literals: compiler.literals,
        slots: compiler.slots,
    })
}

/// Whether `{}` auto-numbering or explicit `{N}` fields appeared first.
/// The two must not mix within one template.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Numbering {
    Auto,
    Manual,
}

struct TemplateCompiler<'a> {
    cursor: Cursor<'a>,
    pattern: &'a dyn PatternHandle,
    byte_mode: bool,
    format_mode: bool,
    /// Literal run being accumulated since the last group slot.
    literal: String,
    literals: Vec<Option<String>>,
    slots: Vec<GroupSlot>,
    /// Open `\L`/`\C` spans; the most recently opened wins.
    case_stack: Vec<Case>,
    /// Pending single-shot `\l`/`\c`; a later one replaces it.
    single_case: Option<Case>,
    numbering: Option<Numbering>,
    next_auto: usize,
}

impl<'a> TemplateCompiler<'a> {
    fn scan(&mut self) -> Result<(), Error> {
        while let Some(c) = self.cursor.next() {
            match c {
                '\\' => self.scan_escape()?,
                '{' if self.format_mode => {
                    if self.cursor.try_consume('{') {
                        self.push_literal('{');
                    } else {
                        self.scan_field()?;
                    }
                }
                '}' if self.format_mode => {
                    if self.cursor.try_consume('}') {
                        self.push_literal('}');
                    } else {
                        return error(
                            ErrorKind::Syntax,
                            "single '}' in format template",
                            Some(self.cursor.pos() - 1),
                        );
                    }
                }
                c => self.push_literal(c),
            }
        }
        let literal = std::mem::take(&mut self.literal);
        self.literals
            .push(if literal.is_empty() { None } else { Some(literal) });
        debug_assert!(self.literals.len() == self.slots.len() + 1);
        Ok(())
    }

    /// Append one unit to the current literal run, applying pending case
    /// state. Resolved escapes also come through here, so they are folded
    /// at compile time.
    fn push_literal(&mut self, c: char) {
        if let Some(case) = self.single_case.take() {
            case.push_folded(&mut self.literal, c, self.byte_mode);
        } else if let Some(&case) = self.case_stack.last() {
            case.push_folded(&mut self.literal, c, self.byte_mode);
        } else {
            self.literal.push(c);
        }
    }

    /// Close the current literal run and open a group slot for `group`,
    /// capturing the pending case state.
    fn push_slot(&mut self, group: GroupRef, ops: Vec<FormatOp>, pos: usize) -> Result<(), Error> {
        let host_index = self.resolve_group(&group, pos)?;
        let literal = std::mem::take(&mut self.literal);
        self.literals
            .push(if literal.is_empty() { None } else { Some(literal) });
        self.slots.push(GroupSlot {
            group,
            host_index,
            span_case: self.case_stack.last().copied(),
            single_case: self.single_case.take(),
            ops,
        });
        Ok(())
    }

    fn resolve_group(&self, group: &GroupRef, pos: usize) -> Result<usize, Error> {
        match group {
            GroupRef::Index(n) => {
                if *n <= self.pattern.group_count() {
                    Ok(*n)
                } else {
                    error(
                        ErrorKind::Value,
                        format!("invalid group reference {}", n),
                        Some(pos),
                    )
                }
            }
            GroupRef::Name(name) => match self.pattern.group_index(name) {
                Some(index) => Ok(index),
                None => error(
                    ErrorKind::Value,
                    format!("unknown group name '{}'", name),
                    Some(pos),
                ),
            },
        }
    }

    fn scan_escape(&mut self) -> Result<(), Error> {
        let pos = self.cursor.pos() - 1;
        let c = self.cursor.need("escape")?;
        match c {
            'l' => self.single_case = Some(Case::Lower),
            'c' => self.single_case = Some(Case::Upper),
            'L' => self.case_stack.push(Case::Lower),
            'C' => self.case_stack.push(Case::Upper),
            // Closes the innermost span; stray \E is dropped.
            'E' => {
                self.case_stack.pop();
            }
            '0'..='9' => {
                self.cursor.rewind(1);
                self.scan_digit_escape(pos)?;
            }
            'g' => {
                let group = self.scan_angle_group()?;
                self.push_slot(group, Vec::new(), pos)?;
            }
            'x' => {
                let value = self.scan_hex_digits(2, pos)?;
                self.push_literal(value as u8 as char);
            }
            'u' => {
                let value = self.scan_wide_escape(4, pos)?;
                self.push_literal(value);
            }
            'U' => {
                let value = self.scan_wide_escape(8, pos)?;
                self.push_literal(value);
            }
            'N' => {
                let c = self.scan_named_codepoint(pos)?;
                self.push_literal(c);
            }
            'n' => self.push_literal('\n'),
            'r' => self.push_literal('\r'),
            't' => self.push_literal('\t'),
            'f' => self.push_literal('\u{000C}'),
            'v' => self.push_literal('\u{000B}'),
            'a' => self.push_literal('\u{0007}'),
            'b' => self.push_literal('\u{0008}'),
            '\\' => self.push_literal('\\'),
            // No such escape: a literal backslash followed by the char,
            // untouched by case folding.
            c => {
                self.literal.push('\\');
                self.literal.push(c);
            }
        }
        Ok(())
    }

    /// `\0`-led octal, three-digit octal, or a 1–2 digit group reference.
    fn scan_digit_escape(&mut self, pos: usize) -> Result<(), Error> {
        let mut digits = String::new();
        while digits.len() < 3 {
            match self.cursor.peek() {
                Some(d @ '0'..='9') => {
                    digits.push(d);
                    self.cursor.next();
                }
                _ => break,
            }
        }
        let is_octal = |s: &str| s.bytes().all(|b| (b'0'..=b'7').contains(&b));
        if digits.starts_with('0') {
            // \0 with up to two more octal digits.
            let mut len = 1;
            while len < digits.len() && is_octal(&digits[..len + 1]) {
                len += 1;
            }
            self.cursor.rewind(digits.len() - len);
            let value = u32::from_str_radix(&digits[..len], 8).map_err(|_| {
                Error::new(ErrorKind::Value, "bad octal escape", Some(pos))
            })?;
            self.push_literal(value as u8 as char);
        } else if digits.len() == 3 && is_octal(&digits) {
            let value = u32::from_str_radix(&digits, 8).map_err(|_| {
                Error::new(ErrorKind::Value, "bad octal escape", Some(pos))
            })?;
            if value > 0o377 {
                return error(
                    ErrorKind::Value,
                    format!("octal escape value \\{} outside of range 0-0o377", digits),
                    Some(pos),
                );
            }
            self.push_literal(value as u8 as char);
        } else {
            // A 1–2 digit back-reference; a third digit is literal text.
            if digits.len() == 3 {
                self.cursor.rewind(1);
                digits.truncate(2);
            }
            let n: usize = digits.parse().map_err(|_| {
                Error::new(ErrorKind::Syntax, "bad group reference", Some(pos))
            })?;
            self.push_slot(GroupRef::Index(n), Vec::new(), pos)?;
        }
        Ok(())
    }

    /// `\g<name>` or `\g<N>`.
    fn scan_angle_group(&mut self) -> Result<GroupRef, Error> {
        let pos = self.cursor.pos();
        if !self.cursor.try_consume('<') {
            return error(ErrorKind::Syntax, "missing < after \\g", Some(pos));
        }
        let mut name = String::new();
        loop {
            match self.cursor.next() {
                Some('>') => break,
                Some(c) => name.push(c),
                None => {
                    return error(ErrorKind::Syntax, "unterminated group name", Some(pos));
                }
            }
        }
        if name.is_empty() {
            return error(ErrorKind::Syntax, "empty group reference", Some(pos));
        }
        if name.bytes().all(|b| b.is_ascii_digit()) {
            let n: usize = name.parse().map_err(|_| {
                Error::new(ErrorKind::Value, "group number too large", Some(pos))
            })?;
            Ok(GroupRef::Index(n))
        } else {
            Ok(GroupRef::Name(name))
        }
    }

    fn scan_hex_digits(&mut self, count: usize, pos: usize) -> Result<u32, Error> {
        let mut value: u32 = 0;
        for _ in 0..count {
            let c = self.cursor.need("hexadecimal escape")?;
            let digit = c.to_digit(16).ok_or_else(|| {
                Error::new(
                    ErrorKind::Syntax,
                    format!("bad character in hexadecimal escape: '{}'", c),
                    Some(pos),
                )
            })?;
            value = value * 16 + digit;
        }
        Ok(value)
    }

    /// `\uHHHH` / `\UHHHHHHHH`; not meaningful for byte output.
    fn scan_wide_escape(&mut self, count: usize, pos: usize) -> Result<char, Error> {
        if self.byte_mode {
            return error(
                ErrorKind::Value,
                "Unicode escape in a bytes template",
                Some(pos),
            );
        }
        let value = self.scan_hex_digits(count, pos)?;
        char::from_u32(value).ok_or_else(|| {
            Error::new(
                ErrorKind::Value,
                format!("invalid code point {:#x}", value),
                Some(pos),
            )
        })
    }

    /// `\N{NAME}`, resolved at compile time.
    fn scan_named_codepoint(&mut self, pos: usize) -> Result<char, Error> {
        if self.byte_mode {
            return error(
                ErrorKind::Value,
                "named code point in a bytes template",
                Some(pos),
            );
        }
        if !self.cursor.try_consume('{') {
            return error(ErrorKind::Syntax, "missing { after \\N", Some(pos));
        }
        let mut name = String::new();
        loop {
            match self.cursor.next() {
                Some('}') => break,
                Some(c) => name.push(c),
                None => {
                    return error(ErrorKind::Syntax, "unterminated code point name", Some(pos));
                }
            }
        }
        unicode::codepoint_by_name(&name).ok_or_else(|| {
            Error::new(
                ErrorKind::Value,
                format!("unknown code point name '{}'", name),
                Some(pos),
            )
        })
    }

    /// A format-mode `{field[index].attr!conv:spec}` reference; the leading
    /// `{` is already consumed.
    fn scan_field(&mut self) -> Result<(), Error> {
        let pos = self.cursor.pos() - 1;
        let mut name = String::new();
        while let Some(c) = self.cursor.peek() {
            if matches!(c, '[' | '.' | '!' | ':' | '}') {
                break;
            }
            name.push(c);
            self.cursor.next();
        }
        let group = if name.is_empty() {
            self.set_numbering(Numbering::Auto, pos)?;
            let n = self.next_auto;
            self.next_auto += 1;
            GroupRef::Index(n)
        } else if name.bytes().all(|b| b.is_ascii_digit()) {
            self.set_numbering(Numbering::Manual, pos)?;
            GroupRef::Index(name.parse().map_err(|_| {
                Error::new(ErrorKind::Value, "group number too large", Some(pos))
            })?)
        } else {
            GroupRef::Name(name)
        };

        let mut ops = Vec::new();
        loop {
            match self.cursor.need("replacement field")? {
                '}' => break,
                '[' => ops.push(FormatOp::Index(self.scan_index_key(pos)?)),
                '.' => {
                    let mut attr = String::new();
                    while let Some(c) = self.cursor.peek() {
                        if matches!(c, '[' | '.' | '!' | ':' | '}') {
                            break;
                        }
                        attr.push(c);
                        self.cursor.next();
                    }
                    if attr.is_empty() {
                        return error(ErrorKind::Syntax, "empty attribute name", Some(pos));
                    }
                    ops.push(FormatOp::Attr(attr));
                }
                '!' => {
                    let conv = match self.cursor.need("conversion")? {
                        's' => Conversion::Str,
                        'r' => Conversion::Repr,
                        'a' => Conversion::Ascii,
                        c => {
                            return error(
                                ErrorKind::Value,
                                format!("unknown conversion '{}'", c),
                                Some(pos),
                            );
                        }
                    };
                    ops.push(FormatOp::Convert(conv));
                    // Only a spec or the closing brace may follow.
                    match self.cursor.need("replacement field")? {
                        '}' => break,
                        ':' => {
                            ops.push(FormatOp::Spec(self.scan_spec(pos)?));
                            if !self.cursor.try_consume('}') {
                                return error(
                                    ErrorKind::Syntax,
                                    "unterminated replacement field",
                                    Some(pos),
                                );
                            }
                            break;
                        }
                        _ => {
                            return error(
                                ErrorKind::Syntax,
                                "expected ':' or '}' after conversion",
                                Some(pos),
                            );
                        }
                    }
                }
                ':' => {
                    ops.push(FormatOp::Spec(self.scan_spec(pos)?));
                    if !self.cursor.try_consume('}') {
                        return error(
                            ErrorKind::Syntax,
                            "unterminated replacement field",
                            Some(pos),
                        );
                    }
                    break;
                }
                c => {
                    return error(
                        ErrorKind::Syntax,
                        format!("unexpected '{}' in replacement field", c),
                        Some(pos),
                    );
                }
            }
        }
        self.push_slot(group, ops, pos)
    }

    fn set_numbering(&mut self, style: Numbering, pos: usize) -> Result<(), Error> {
        match self.numbering {
            None => {
                self.numbering = Some(style);
                Ok(())
            }
            Some(seen) if seen == style => Ok(()),
            Some(Numbering::Auto) => error(
                ErrorKind::Syntax,
                "cannot switch from automatic field numbering to manual",
                Some(pos),
            ),
            Some(Numbering::Manual) => error(
                ErrorKind::Syntax,
                "cannot switch from manual field numbering to automatic",
                Some(pos),
            ),
        }
    }

    /// The contents of a `[...]` index access: a possibly negative integer
    /// in decimal or with a `0x`/`0o`/`0b` prefix, or a string key.
    fn scan_index_key(&mut self, pos: usize) -> Result<IndexKey, Error> {
        let mut key = String::new();
        loop {
            match self.cursor.next() {
                Some(']') => break,
                Some(c) => key.push(c),
                None => {
                    return error(ErrorKind::Syntax, "unterminated index", Some(pos));
                }
            }
        }
        let digits = key.strip_prefix('-').unwrap_or(&key);
        let parsed = if let Some(hex) = digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
            i64::from_str_radix(hex, 16).ok()
        } else if let Some(oct) = digits.strip_prefix("0o").or_else(|| digits.strip_prefix("0O")) {
            i64::from_str_radix(oct, 8).ok()
        } else if let Some(bin) = digits.strip_prefix("0b").or_else(|| digits.strip_prefix("0B")) {
            i64::from_str_radix(bin, 2).ok()
        } else if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
            digits.parse().ok()
        } else if digits.len() > 1 && digits.starts_with('0') {
            // A base prefix was intended but malformed.
            return error(
                ErrorKind::Value,
                format!("bad numeric base in index '{}'", key),
                Some(pos),
            );
        } else {
            None
        };
        match parsed {
            Some(n) => Ok(IndexKey::Num(if key.starts_with('-') { -n } else { n })),
            None if key.starts_with('-') => error(
                ErrorKind::Value,
                format!("bad numeric index '{}'", key),
                Some(pos),
            ),
            None => Ok(IndexKey::Str(key)),
        }
    }

    /// A `:spec` of the shape `[[fill]align][width]`.
    fn scan_spec(&mut self, pos: usize) -> Result<FieldSpec, Error> {
        let mut spec = FieldSpec {
            fill: None,
            align: None,
            width: 0,
        };
        let align_of = |c: char| match c {
            '<' => Some(Align::Left),
            '>' => Some(Align::Right),
            '^' => Some(Align::Center),
            _ => None,
        };
        // A fill char is only a fill if an alignment follows it.
        if let (Some(fill), Some(second)) = (self.cursor.peek(), self.cursor.peek_at(1)) {
            if align_of(second).is_some() && fill != '}' {
                spec.fill = Some(fill);
                spec.align = align_of(second);
                self.cursor.next();
                self.cursor.next();
            }
        }
        if spec.align.is_none() {
            if let Some(align) = self.cursor.peek().and_then(align_of) {
                spec.align = Some(align);
                self.cursor.next();
            }
        }
        let mut width = String::new();
        while let Some(d @ '0'..='9') = self.cursor.peek() {
            width.push(d);
            self.cursor.next();
        }
        if !width.is_empty() {
            spec.width = width.parse().map_err(|_| {
                Error::new(ErrorKind::Value, "field width too large", Some(pos))
            })?;
        }
        if self.cursor.peek() != Some('}') {
            let c = self.cursor.peek().unwrap_or(' ');
            return error(
                ErrorKind::Syntax,
                format!("invalid format spec character '{}'", c),
                Some(pos),
            );
        }
        Ok(spec)
    }
}
