//! Expansion of a compiled template against a match result.
//!
//! This is the hot path of substitution: one pass over the template's slots,
//! no allocation beyond the output buffer except where a format chain
//! rewrites a captured value. All scanning work already happened at compile
//! time.

use crate::api::{Capture, MatchGroups, Rendered};
use crate::error::{error, Error, ErrorKind};
use crate::template::{
    Align, Case, Conversion, FieldSpec, FormatOp, GroupSlot, IndexKey, ReplaceTemplate,
};

impl ReplaceTemplate {
    /// Expand against a match from the pattern this template was compiled
    /// for. Fails if the match comes from a different pattern, has the wrong
    /// element type, or is absent.
    pub fn expand(&self, groups: &dyn MatchGroups) -> Result<Rendered, Error> {
        if groups.pattern_fingerprint() != self.fingerprint {
            return error(
                ErrorKind::Binding,
                "template was compiled for a different pattern",
                None,
            );
        }
        if groups.is_bytes() != self.byte_mode {
            return error(
                ErrorKind::Type,
                if self.byte_mode {
                    "bytes template expanded against a text match"
                } else {
                    "text template expanded against a bytes match"
                },
                None,
            );
        }
        if groups.group(0).is_none() {
            return error(ErrorKind::NoMatch, "expand against an absent match", None);
        }

        let mut out = String::new();
        for (i, slot) in self.slots.iter().enumerate() {
            if let Some(lit) = &self.literals[i] {
                out.push_str(lit);
            }
            let value = self.expand_slot(slot, groups)?;
            out.push_str(&value);
        }
        if let Some(lit) = &self.literals[self.slots.len()] {
            out.push_str(lit);
        }

        Ok(if self.byte_mode {
            Rendered::Bytes(out.chars().map(|c| c as u8).collect())
        } else {
            Rendered::Text(out)
        })
    }

    fn expand_slot(&self, slot: &GroupSlot, groups: &dyn MatchGroups) -> Result<String, Error> {
        // An unmatched optional group contributes an empty value.
        let mut value = match groups.group(slot.host_index) {
            Some(Capture::Text(s)) => s.to_string(),
            Some(Capture::Bytes(b)) => b.iter().map(|&b| b as char).collect(),
            None => String::new(),
        };
        for op in &slot.ops {
            value = self.apply_op(op, value, slot)?;
        }
        if let Some(case) = slot.span_case {
            value = fold_all(&value, case, self.byte_mode);
        }
        if let Some(case) = slot.single_case {
            value = fold_first(&value, case, self.byte_mode);
        }
        Ok(value)
    }

    fn apply_op(&self, op: &FormatOp, value: String, slot: &GroupSlot) -> Result<String, Error> {
        match op {
            // Captures are plain text; there is nothing to dereference.
            FormatOp::Attr(name) => error(
                ErrorKind::Value,
                format!("captured group {} has no attribute '{}'", slot.group, name),
                None,
            ),
            FormatOp::Index(IndexKey::Str(key)) => error(
                ErrorKind::Value,
                format!("capture indices must be integers, not '{}'", key),
                None,
            ),
            FormatOp::Index(IndexKey::Num(n)) => {
                let len = value.chars().count() as i64;
                let index = if *n < 0 { n + len } else { *n };
                match usize::try_from(index).ok().and_then(|i| value.chars().nth(i)) {
                    Some(c) => Ok(c.to_string()),
                    None => error(
                        ErrorKind::Value,
                        format!("index {} out of range for group {}", n, slot.group),
                        None,
                    ),
                }
            }
            FormatOp::Convert(conv) => Ok(convert(&value, *conv, self.byte_mode)),
            FormatOp::Spec(spec) => Ok(pad(&value, spec)),
        }
    }
}

fn fold_all(value: &str, case: Case, byte_mode: bool) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        case.push_folded(&mut out, c, byte_mode);
    }
    out
}

/// Fold only the first unit, leaving the rest untouched.
fn fold_first(value: &str, case: Case, byte_mode: bool) -> String {
    let mut chars = value.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => {
            let mut out = String::with_capacity(value.len());
            case.push_folded(&mut out, first, byte_mode);
            out.push_str(chars.as_str());
            out
        }
    }
}

/// Apply a `!conv` conversion. `!s` is the identity; `!r` and `!a` produce a
/// quoted source-form of the value, byte values with a `b` prefix.
fn convert(value: &str, conv: Conversion, byte_mode: bool) -> String {
    if conv == Conversion::Str {
        return value.to_string();
    }
    let ascii_only = conv == Conversion::Ascii;
    let mut out = String::with_capacity(value.len() + 2);
    if byte_mode {
        out.push('b');
    }
    out.push('\'');
    for c in value.chars() {
        match c {
            '\'' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 || c as u32 == 0x7F => {
                out.push_str(&format!("\\x{:02x}", c as u32));
            }
            c if byte_mode && c as u32 > 0x7F => {
                out.push_str(&format!("\\x{:02x}", c as u32));
            }
            c if ascii_only && !c.is_ascii() => {
                if (c as u32) <= 0xFF {
                    out.push_str(&format!("\\x{:02x}", c as u32));
                } else if (c as u32) <= 0xFFFF {
                    out.push_str(&format!("\\u{:04x}", c as u32));
                } else {
                    out.push_str(&format!("\\U{:08x}", c as u32));
                }
            }
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}

/// Apply a `:spec`: pad to the requested width. Strings align left unless
/// the spec says otherwise.
fn pad(value: &str, spec: &FieldSpec) -> String {
    let len = value.chars().count();
    if len >= spec.width {
        return value.to_string();
    }
    let fill = spec.fill.unwrap_or(' ');
    let missing = spec.width - len;
    let (left, right) = match spec.align.unwrap_or(Align::Left) {
        Align::Left => (0, missing),
        Align::Right => (missing, 0),
        Align::Center => (missing / 2, missing - missing / 2),
    };
    let mut out = String::with_capacity(value.len() + missing);
    out.extend(std::iter::repeat(fill).take(left));
    out.push_str(value);
    out.extend(std::iter::repeat(fill).take(right));
    out
}
