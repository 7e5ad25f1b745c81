use crate::charclasses;
use crate::codepointset::{CodePoint, CodePointSet, Interval, CODE_POINT_MAX};
use crate::error::{error, Error, ErrorKind};
use icu_properties::{maps, sets, GeneralCategoryGroup, Script};
use std::collections::HashMap;
use std::fmt::Write;
use std::sync::OnceLock;

/// Which range of code points a resolution may cover.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum Mode {
    /// Full multilingual range.
    Unicode,
    /// Text pattern with ASCII-only matching requested.
    Ascii,
    /// Byte pattern: every 8-bit value is a character.
    Byte,
}

impl Mode {
    pub(crate) fn limit(self) -> CodePoint {
        match self {
            Mode::Unicode => CODE_POINT_MAX,
            Mode::Ascii => 0x7F,
            Mode::Byte => 0xFF,
        }
    }

    pub(crate) fn select(byte_mode: bool, text_mode: bool) -> Mode {
        if byte_mode {
            Mode::Byte
        } else if text_mode {
            Mode::Unicode
        } else {
            Mode::Ascii
        }
    }
}

/// Normalize a property or value name: lower-case, separators stripped.
fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, ' ' | '-' | '_'))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Resolve a property category/value to the set of code points it covers,
/// clamped to `mode` and negated if `value` carries a leading `^`.
///
/// The underlying data is the icu compiled property data: a static, read-only
/// artifact generated offline from the Unicode Character Database.
pub(crate) fn resolve(
    category: Option<&str>,
    value: &str,
    mode: Mode,
) -> Result<CodePointSet, Error> {
    let (negated, value) = match value.strip_prefix('^') {
        Some(rest) => (true, rest),
        None => (false, value),
    };
    let mut set = lookup(category, value)?;
    set.clamp(mode.limit());
    if negated {
        set = set.inverted_within(mode.limit());
    }
    Ok(set)
}

fn lookup(category: Option<&str>, value: &str) -> Result<CodePointSet, Error> {
    match category {
        None => posix_class(&normalize(value))
            .or_else(|| binary_property(&normalize(value)))
            .or_else(|| general_category_set(value))
            .or_else(|| script_set(value))
            .ok_or_else(|| unknown_value(value)),
        Some(cat) => match normalize(cat).as_str() {
            "gc" | "generalcategory" | "category" => {
                general_category_set(value).ok_or_else(|| unknown_value(value))
            }
            "sc" | "script" | "scx" | "scriptextensions" => {
                script_set(value).ok_or_else(|| unknown_value(value))
            }
            _ => error(
                ErrorKind::Value,
                format!("unknown property category '{}'", cat),
                None,
            ),
        },
    }
}

fn unknown_value(value: &str) -> Error {
    Error::new(
        ErrorKind::Value,
        format!("unknown property value '{}'", value),
        None,
    )
}

/// Collect a set from a borrowed icu code point set.
fn from_icu_set(data: sets::CodePointSetDataBorrowed<'_>) -> CodePointSet {
    let mut set = CodePointSet::new();
    for range in data.iter_ranges() {
        set.add(Interval::new(*range.start(), *range.end()));
    }
    set
}

/// Collect the set of code points whose general category is in `group`.
fn from_category_group(group: GeneralCategoryGroup) -> CodePointSet {
    let mut set = CodePointSet::new();
    for range in maps::general_category().iter_ranges() {
        if group.contains(range.value) {
            set.add(Interval::new(*range.range.start(), *range.range.end()));
        }
    }
    set
}

fn from_intervals(ivs: &[Interval]) -> CodePointSet {
    let mut set = CodePointSet::new();
    for iv in ivs {
        set.add(*iv);
    }
    set
}

/// General category values and groups, via loose (UAX44-LM3) name matching:
/// `Lu`, `Uppercase_Letter`, `L`, `Letter`, `Cased_Letter`, ...
fn general_category_set(value: &str) -> Option<CodePointSet> {
    let group = GeneralCategoryGroup::name_to_enum_mapper().get_loose(value)?;
    Some(from_category_group(group))
}

/// Script values via loose name matching: `Greek`, `grek`, ...
fn script_set(value: &str) -> Option<CodePointSet> {
    let script = Script::name_to_enum_mapper().get_loose(value)?;
    let data = maps::script().get_set_for_value(script);
    Some(from_icu_set(data.as_borrowed()))
}

/// Binary properties by normalized short or long alias.
fn binary_property(name: &str) -> Option<CodePointSet> {
    let set = match name {
        "alpha" | "alphabetic" => from_icu_set(sets::alphabetic()),
        "lower" | "lowercase" => from_icu_set(sets::lowercase()),
        "upper" | "uppercase" => from_icu_set(sets::uppercase()),
        "space" | "whitespace" => from_icu_set(sets::white_space()),
        "cased" => from_icu_set(sets::cased()),
        "ci" | "caseignorable" => from_icu_set(sets::case_ignorable()),
        "dash" => from_icu_set(sets::dash()),
        "dia" | "diacritic" => from_icu_set(sets::diacritic()),
        "ext" | "extender" => from_icu_set(sets::extender()),
        "hex" | "hexdigit" => from_icu_set(sets::hex_digit()),
        "ahex" | "asciihexdigit" => from_icu_set(sets::ascii_hex_digit()),
        "idc" | "idcontinue" => from_icu_set(sets::id_continue()),
        "ids" | "idstart" => from_icu_set(sets::id_start()),
        "xidc" | "xidcontinue" => from_icu_set(sets::xid_continue()),
        "xids" | "xidstart" => from_icu_set(sets::xid_start()),
        "grbase" | "graphemebase" => from_icu_set(sets::grapheme_base()),
        "grext" | "graphemeextend" => from_icu_set(sets::grapheme_extend()),
        "joinc" | "joincontrol" => from_icu_set(sets::join_control()),
        "math" => from_icu_set(sets::math()),
        "nchar" | "noncharactercodepoint" => from_icu_set(sets::noncharacter_code_point()),
        "patsyn" | "patternsyntax" => from_icu_set(sets::pattern_syntax()),
        "patws" | "patternwhitespace" => from_icu_set(sets::pattern_white_space()),
        "qmark" | "quotationmark" => from_icu_set(sets::quotation_mark()),
        "sd" | "softdotted" => from_icu_set(sets::soft_dotted()),
        "sterm" | "sentenceterminal" => from_icu_set(sets::sentence_terminal()),
        "term" | "terminalpunctuation" => from_icu_set(sets::terminal_punctuation()),
        "ideo" | "ideographic" => from_icu_set(sets::ideographic()),
        "ascii" => from_intervals(&[Interval::new(0, 0x7F)]),
        "any" => from_intervals(&[Interval::new(0, CODE_POINT_MAX)]),
        "assigned" => from_category_group(GeneralCategoryGroup::Unassigned)
            .inverted_within(CODE_POINT_MAX),
        _ => return None,
    };
    Some(set)
}

/// The POSIX class tables. Built once on first use, read-only thereafter.
fn posix_tables() -> &'static HashMap<&'static str, CodePointSet> {
    static TABLES: OnceLock<HashMap<&'static str, CodePointSet>> = OnceLock::new();
    TABLES.get_or_init(|| {
        let alpha = from_icu_set(sets::alphabetic());
        let digit = from_category_group(GeneralCategoryGroup::DecimalNumber);
        let space = from_icu_set(sets::white_space());
        let cntrl = from_category_group(GeneralCategoryGroup::Control);
        let blank = from_intervals(&charclasses::BLANK);

        let mut alnum = alpha.clone();
        alnum.add_set(&digit);

        // TR18 word characters: alphabetic, marks, digits, connector
        // punctuation, and join controls.
        let mut word = alnum.clone();
        word.add_set(&from_category_group(GeneralCategoryGroup::Mark));
        word.add_set(&from_category_group(GeneralCategoryGroup::ConnectorPunctuation));
        word.add_set(&from_icu_set(sets::join_control()));

        // graph: assigned, not whitespace, not control, not surrogate.
        let mut ungraph = space.clone();
        ungraph.add_set(&cntrl);
        ungraph.add_set(&from_category_group(GeneralCategoryGroup::Unassigned));
        ungraph.add_set(&from_category_group(GeneralCategoryGroup::Surrogate));
        let graph = ungraph.inverted_within(CODE_POINT_MAX);

        let mut print = graph.clone();
        print.add_set(&blank);

        let mut tables = HashMap::new();
        tables.insert("alnum", alnum);
        tables.insert("alpha", alpha);
        tables.insert("ascii", from_intervals(&[Interval::new(0, 0x7F)]));
        tables.insert("blank", blank);
        tables.insert("cntrl", cntrl);
        tables.insert("digit", digit);
        tables.insert("graph", graph);
        tables.insert("lower", from_icu_set(sets::lowercase()));
        tables.insert("print", print);
        tables.insert(
            "punct",
            from_category_group(GeneralCategoryGroup::Punctuation),
        );
        tables.insert("space", space);
        tables.insert("upper", from_icu_set(sets::uppercase()));
        tables.insert("word", word);
        tables.insert("xdigit", from_icu_set(sets::hex_digit()));
        tables
    })
}

fn posix_class(name: &str) -> Option<CodePointSet> {
    posix_tables().get(name).cloned()
}

/// The combining-mark set used by the `\X` grapheme expansion.
pub(crate) fn mark_set(mode: Mode) -> CodePointSet {
    let mut set = from_category_group(GeneralCategoryGroup::Mark);
    set.clamp(mode.limit());
    set
}

/// The single-character line break set used by `\R`.
pub(crate) fn line_break_set(mode: Mode) -> CodePointSet {
    let mut set = from_intervals(&charclasses::LINE_BREAK);
    set.clamp(mode.limit());
    set
}

/// Resolve `\N{NAME}` to a code point via the Unicode name database.
pub(crate) fn codepoint_by_name(name: &str) -> Option<char> {
    unicode_names2::character(&name.to_uppercase())
}

/// Append a single code point to a class body, escaped for the host.
fn push_class_cp(out: &mut String, cp: CodePoint) {
    match char::from_u32(cp) {
        Some(c) if c.is_ascii_alphanumeric() || c == '_' => out.push(c),
        _ if cp <= 0xFF => write!(out, "\\x{:02x}", cp).unwrap(),
        _ if cp <= 0xFFFF => write!(out, "\\u{:04x}", cp).unwrap(),
        _ => write!(out, "\\U{:08x}", cp).unwrap(),
    }
}

/// Render a set as a host character-class body: a string of ranges suitable
/// for splicing between `[` and `]`.
pub(crate) fn format_class_body(set: &CodePointSet) -> String {
    let mut out = String::new();
    for iv in set.intervals() {
        push_class_cp(&mut out, iv.first);
        if iv.last > iv.first {
            if iv.last > iv.first + 1 {
                out.push('-');
            }
            push_class_cp(&mut out, iv.last);
        }
    }
    out
}

/// The class body matching nothing at all under `mode`, usable outside a
/// character class. Negating an impossible property yields its complement.
pub(crate) fn impossible_class(mode: Mode) -> String {
    format!("[^{}]", format_class_body(&full_set(mode)))
}

fn full_set(mode: Mode) -> CodePointSet {
    from_intervals(&[Interval::new(0, mode.limit())])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negation_is_complement() {
        for mode in [Mode::Unicode, Mode::Ascii, Mode::Byte] {
            let lu = resolve(None, "Lu", mode).unwrap();
            let not_lu = resolve(None, "^Lu", mode).unwrap();
            assert_eq!(not_lu, lu.inverted_within(mode.limit()));
            // Double negation round-trips.
            assert_eq!(not_lu.inverted_within(mode.limit()), lu);
        }
    }

    #[test]
    fn aliases_resolve_identically() {
        let pairs = [
            (None, "Lu", "Uppercase_Letter"),
            (None, "alpha", "Alphabetic"),
            (None, "L", "Letter"),
            (Some("gc"), "Nd", "Decimal_Number"),
            (Some("sc"), "Greek", "grek"),
            (Some("script"), "Latin", "latn"),
        ];
        for (cat, short, long) in pairs {
            for mode in [Mode::Unicode, Mode::Byte] {
                assert_eq!(
                    resolve(cat, short, mode).unwrap(),
                    resolve(cat, long, mode).unwrap(),
                    "alias mismatch for {}/{}",
                    short,
                    long
                );
            }
        }
    }

    #[test]
    fn name_normalization() {
        let a = resolve(Some("General Category"), "Uppercase Letter", Mode::Unicode).unwrap();
        let b = resolve(Some("general_category"), "uppercase-letter", Mode::Unicode).unwrap();
        let c = resolve(Some("gc"), "LU", Mode::Unicode).unwrap();
        assert_eq!(a, b);
        assert_eq!(b, c);
    }

    #[test]
    fn posix_classes_exist_and_make_sense() {
        let lower = resolve(None, "lower", Mode::Unicode).unwrap();
        assert!(lower.contains('a' as u32));
        assert!(lower.contains('\u{00DF}' as u32)); // sharp s
        assert!(!lower.contains('A' as u32));

        let graph = resolve(None, "graph", Mode::Unicode).unwrap();
        assert!(graph.contains('!' as u32));
        assert!(!graph.contains(' ' as u32));
        assert!(!graph.contains(0x07)); // BEL is control
        assert!(!graph.contains(0xD800)); // surrogate

        let blank = resolve(None, "blank", Mode::Unicode).unwrap();
        assert!(blank.contains(0x09));
        assert!(blank.contains(0x3000));
        assert!(!blank.contains(0x0A));
    }

    #[test]
    fn byte_mode_clamps() {
        let lu = resolve(None, "Lu", Mode::Byte).unwrap();
        assert!(lu.contains('A' as u32));
        assert!(lu.contains(0xC0)); // A-grave
        assert!(lu.intervals().iter().all(|iv| iv.last <= 0xFF));

        // Greek letters are out of reach of a byte pattern.
        let greek = resolve(Some("sc"), "Greek", Mode::Byte).unwrap();
        assert!(greek.is_empty());

        let lu_ascii = resolve(None, "Lu", Mode::Ascii).unwrap();
        assert_eq!(lu_ascii.intervals(), &[Interval::new(0x41, 0x5A)]);
    }

    #[test]
    fn unknown_names_are_value_errors() {
        let err = resolve(None, "Bogus_Property", Mode::Unicode).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Value);
        let err = resolve(Some("blk"), "Greek", Mode::Unicode).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Value);
    }

    #[test]
    fn named_codepoints() {
        assert_eq!(codepoint_by_name("LATIN SMALL LETTER A"), Some('a'));
        assert_eq!(codepoint_by_name("latin small letter a"), Some('a'));
        assert_eq!(codepoint_by_name("NO SUCH CHARACTER NAME"), None);
    }

    #[test]
    fn class_body_formatting() {
        let mut set = CodePointSet::new();
        set.add_one('a' as u32);
        set.add(Interval::new('0' as u32, '9' as u32));
        set.add_one(0x2028);
        set.add(Interval::new(0x1F600, 0x1F64F));
        assert_eq!(
            format_class_body(&set),
            "0-9a\\u2028\\U0001f600-\\U0001f64f"
        );

        let mut punct = CodePointSet::new();
        punct.add_one(']' as u32);
        punct.add_one('-' as u32);
        // Non-alphanumeric ASCII is hex-escaped, so `]` and `-` are inert.
        assert_eq!(format_class_body(&punct), "\\x2d\\x5d");
    }

    #[test]
    fn impossible_class_bodies() {
        assert_eq!(impossible_class(Mode::Byte), "[^\\x00-\\xff]");
        assert_eq!(impossible_class(Mode::Unicode), "[^\\x00-\\U0010ffff]");
    }
}
