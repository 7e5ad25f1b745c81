use crate::codepointset::Interval;

// Fixed classes backing the \R and \h shorthands.

/// Construct an interval from an inclusive range of char.
const fn r(first: char, last: char) -> Interval {
    Interval {
        first: first as u32,
        last: last as u32,
    }
}

/// Construct an interval from a single char.
const fn r1(c: char) -> Interval {
    Interval {
        first: c as u32,
        last: c as u32,
    }
}

// Note all of these are sorted.

/// Code points matched by the single-character arm of `\R`, after the
/// two-character CRLF alternative: LF, VT, FF, CR, NEL, LS, PS.
pub(crate) const LINE_BREAK: [Interval; 3] = [
    r('\u{000A}', '\u{000D}'),
    r1('\u{0085}'),
    r('\u{2028}', '\u{2029}'),
];

/// Horizontal blanks: TAB plus the Space_Separator (`Zs`) category.
pub(crate) const BLANK: [Interval; 8] = [
    r1('\u{0009}'),
    r1('\u{0020}'),
    r1('\u{00A0}'),
    r1('\u{1680}'),
    r('\u{2000}', '\u{200A}'),
    r1('\u{202F}'),
    r1('\u{205F}'),
    r1('\u{3000}'),
];
