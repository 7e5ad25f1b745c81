use regraft::{transpile, transpile_bytes, ErrorKind, ParseOptions};

fn t(pattern: &str) -> String {
    transpile(pattern, ParseOptions::default()).unwrap()
}

fn t_ascii(pattern: &str) -> String {
    let opts = ParseOptions {
        unicode: Some(false),
        ..Default::default()
    };
    transpile(pattern, opts).unwrap()
}

fn tb(pattern: &[u8]) -> Vec<u8> {
    transpile_bytes(pattern, ParseOptions::default()).unwrap()
}

fn fails(pattern: &str) -> ErrorKind {
    transpile(pattern, ParseOptions::default()).unwrap_err().kind
}

#[test]
fn host_patterns_are_untouched() {
    for pattern in [
        r"^(\d{4})-(\d{2})-(\d{2})$",
        r"(?:ab|cd)+?",
        r"(?P<tag></?\w+>)(?P=tag)",
        r"[a-f0-9]{32}",
        r"x(?#remember why)y",
        r"(?i)case",
        r"(?i-x:a)",
        "a|b|c",
    ] {
        assert_eq!(t(pattern), pattern, "not idempotent: {}", pattern);
    }
}

#[test]
fn quoting_scenario() {
    assert_eq!(
        t(r"Testing \Q(\s+[quote]*\s+)?\E!"),
        r"Testing \(\\s\+\[quote\]\*\\s\+\)\?!"
    );
}

#[test]
fn case_classes_in_ascii_mode() {
    assert_eq!(t_ascii(r"\l"), "[a-z]");
    assert_eq!(t_ascii(r"\c"), "[A-Z]");
    assert_eq!(t_ascii(r"\L"), r"[\x00-\x60\x7b-\x7f]");
}

#[test]
fn case_classes_in_unicode_mode() {
    let lower = t(r"\l");
    assert!(lower.starts_with('[') && lower.ends_with(']'));
    assert!(lower.contains("a-z"), "missing ASCII letters: {}", lower);
    // The negated form is a computed complement, starting at NUL.
    assert!(t(r"\L").starts_with(r"[\x00"));
}

#[test]
fn posix_class_equals_property_escape() {
    assert_eq!(t("[[:graph:]]"), t(r"[\p{graph}]"));
    assert_eq!(t("[[:digit:]]"), t(r"[\p{digit}]"));
    assert_eq!(t("[[:^digit:]]"), t(r"[\P{digit}]"));
}

#[test]
fn property_aliases_and_categories() {
    assert_eq!(t(r"\p{Lu}"), t(r"\p{Uppercase_Letter}"));
    assert_eq!(t(r"\p{Lu}"), t(r"\p{gc=Lu}"));
    assert_eq!(t(r"\p{Lu}"), t(r"\p{gc:Lu}"));
    assert_eq!(t(r"\p{greek}"), t(r"\p{script=Greek}"));
    assert_eq!(t(r"\P{Lu}"), t(r"\p{^Lu}"));
    // Double negation cancels.
    assert_eq!(t(r"\P{^Lu}"), t(r"\p{Lu}"));
}

#[test]
fn bare_p_is_left_for_the_host() {
    assert_eq!(t(r"\pL"), r"\pL");
}

#[test]
fn named_codepoints() {
    // Single-byte code points render as octal.
    assert_eq!(t(r"\N{LATIN SMALL LETTER A}"), r"\141");
    // Wide ones render as a literal character.
    assert_eq!(t(r"\N{BULLET}"), "\u{2022}");
    // Inside a class, a following '-' cannot form a range.
    assert_eq!(t(r"[\N{LATIN SMALL LETTER A}-b]"), r"[\141\-b]");
}

#[test]
fn line_break_shorthand() {
    assert_eq!(t(r"\R"), r"(?:\r\n|[\x0a-\x0d\x85\u2028-\u2029])");
    assert_eq!(tb(br"\R"), b"(?:\\r\\n|[\\x0a-\\x0d\\x85])".to_vec());
    assert_eq!(fails(r"[\R]"), ErrorKind::Syntax);
}

#[test]
fn blank_shorthand() {
    assert_eq!(
        t(r"\h"),
        r"[\x09\x20\xa0\u1680\u2000-\u200a\u202f\u205f\u3000]"
    );
    assert_eq!(t_ascii(r"\h"), r"[\x09\x20]");
    // TAB plus Zs only: the zero-width no-break space is Cf, not blank.
    assert!(!t(r"\h").contains("feff"));
    assert!(!t("[[:blank:]]").contains("feff"));
}

#[test]
fn grapheme_cluster_shorthand() {
    let x = t(r"\X");
    assert!(x.starts_with("(?:[^"), "unexpected expansion: {}", x);
    assert!(x.ends_with("]))"), "unexpected expansion: {}", x);
    // No combining marks fit in a byte: any single unit is a cluster.
    assert_eq!(tb(br"\X"), b"(?:[\\x00-\\xff])".to_vec());
    assert_eq!(fails(r"[\X]"), ErrorKind::Syntax);
}

#[test]
fn byte_mode_clamps_and_degrades() {
    // Latin-1 uppercase survives the clamp.
    assert_eq!(tb(br"\p{Lu}"), b"[A-Z\\xc0-\\xd6\\xd8-\\xde]".to_vec());
    // A property entirely out of reach matches nothing.
    assert_eq!(tb(br"\p{Greek}"), b"[^\\x00-\\xff]".to_vec());
    // Raw high bytes pass through untouched.
    assert_eq!(tb(b"a\xffb+"), b"a\xffb+".to_vec());
}

#[test]
fn class_bookkeeping() {
    // Leading ] is a literal member.
    assert_eq!(t("[]a]"), "[]a]");
    assert_eq!(t("[^]a]"), "[^]a]");
    // Dash guard after a spliced class body.
    assert_eq!(t("[[:alpha:]-z]"), format!("[{}\\-z]", {
        let body = t("[[:alpha:]]");
        body[1..body.len() - 1].to_string()
    }));
    // A bracket that never closes its :] is an ordinary literal.
    assert_eq!(t("[[:foo bar]"), "[[:foo bar]");
}

#[test]
fn dash_before_spliced_class_is_literal() {
    // A '-' cannot open a range whose endpoint is a spliced expansion.
    let lu = t(r"[\p{Lu}]");
    let body = &lu[1..lu.len() - 1];
    assert_eq!(t(r"[a-\p{Lu}]"), format!(r"[a\-{}]", body));
    assert_eq!(t(r"[a-\N{LATIN SMALL LETTER A}]"), r"[a\-\141]");
    assert_eq!(t(r"[a-[:digit:]]"), t(r"[a-\p{digit}]"));
    // Ordinary ranges and literal trailing dashes are untouched.
    assert_eq!(t("[a-z]"), "[a-z]");
    assert_eq!(t(r"[a-\d]"), r"[a-\d]");
}

#[test]
fn global_flag_restart() {
    // The (?a) is discovered mid-pattern, the parse restarts in ASCII mode,
    // and the case class comes out narrow.
    assert_eq!(t(r"(?a)\l+"), "(?a)[a-z]+");
    assert_eq!(t(r"\l(?a)"), "[a-z](?a)");
    // Verbose discovered inline: the comment survives re-scanning.
    assert_eq!(t("(?x)a#note\nb"), "(?x)a#note\nb");
}

#[test]
fn global_flag_oscillation_is_a_flag_loop() {
    assert_eq!(fails("(?a)(?u)x"), ErrorKind::FlagLoop);
    let opts = ParseOptions {
        unicode: Some(false),
        ..Default::default()
    };
    assert_eq!(
        transpile("(?u)(?a)x", opts).unwrap_err().kind,
        ErrorKind::FlagLoop
    );
}

#[test]
fn scoped_flags_do_not_restart() {
    // Scoped ASCII mode narrows only its group.
    let out = t(r"(?a:\l)\l");
    assert!(out.starts_with("(?a:[a-z])["), "got: {}", out);
    assert!(out.len() > "(?a:[a-z])[a-z]".len());
}

#[test]
fn flag_errors() {
    assert_eq!(fails("(?q)x"), ErrorKind::Syntax);
    assert_eq!(fails("(?au)x"), ErrorKind::Syntax);
    assert_eq!(fails("(?-x)a"), ErrorKind::Syntax);
    assert_eq!(fails("(?)"), ErrorKind::Syntax);
    let err = transpile_bytes(br"(?u:x)", ParseOptions::default()).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Value);
}

#[test]
fn verbose_comments_reescape_tokens() {
    let opts = ParseOptions {
        verbose: true,
        ..Default::default()
    };
    let out = transpile("a#see \\Q and \\c\nb", opts).unwrap();
    assert_eq!(out, "a#see \\\\Q and \\\\c\nb");
    // Inside a class, verbose is inert and '#' is a literal.
    let out = transpile("[#]", opts).unwrap();
    assert_eq!(out, "[#]");
}

#[test]
fn unterminated_constructs() {
    for pattern in [r"\p{Lu", "[abc", r"\N{BULLET", "(?#never closed", "(a", r"x\"] {
        assert_eq!(fails(pattern), ErrorKind::Syntax, "pattern: {}", pattern);
    }
}

#[test]
fn unknown_properties_are_value_errors() {
    assert_eq!(fails(r"\p{Bogus}"), ErrorKind::Value);
    assert_eq!(fails(r"\p{blk=Greek}"), ErrorKind::Value);
    assert_eq!(fails("[[:nosuch:]]"), ErrorKind::Value);
    assert_eq!(fails(r"\N{NOT A REAL NAME}"), ErrorKind::Value);
}

#[test]
fn errors_carry_positions() {
    let err = transpile(r"ab\p{Bogus}", ParseOptions::default()).unwrap_err();
    assert_eq!(err.pos, Some(2));
    assert!(err.to_string().starts_with("value error at 2:"));
}
