#![allow(dead_code)]

use regraft::{Capture, MatchGroups, PatternHandle};

/// A stand-in host pattern: a group count, an optional name table, and a
/// fingerprint. Group 1 is the first explicit group; group 0 is implicit.
pub struct FakePattern {
    pub groups: usize,
    pub names: Vec<(String, usize)>,
    pub fingerprint: u64,
    pub bytes: bool,
}

impl FakePattern {
    pub fn with_groups(groups: usize) -> FakePattern {
        FakePattern {
            groups,
            names: Vec::new(),
            fingerprint: 42,
            bytes: false,
        }
    }

    pub fn named(mut self, name: &str, index: usize) -> FakePattern {
        self.names.push((name.to_string(), index));
        self
    }

    pub fn bytes(mut self) -> FakePattern {
        self.bytes = true;
        self
    }
}

impl PatternHandle for FakePattern {
    fn group_count(&self) -> usize {
        self.groups
    }

    fn group_index(&self, name: &str) -> Option<usize> {
        self.names
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, index)| *index)
    }

    fn fingerprint(&self) -> u64 {
        self.fingerprint
    }

    fn is_bytes(&self) -> bool {
        self.bytes
    }
}

/// A stand-in host match: group 0 first, then the capture groups in order.
/// `None` entries model groups that did not participate in the match.
pub struct FakeMatch {
    pub groups: Vec<Option<String>>,
    pub fingerprint: u64,
    pub bytes: bool,
}

impl FakeMatch {
    /// A text match with the given group contents, group 0 included.
    pub fn of(groups: &[&str]) -> FakeMatch {
        FakeMatch {
            groups: groups.iter().map(|s| Some(s.to_string())).collect(),
            fingerprint: 42,
            bytes: false,
        }
    }

    pub fn absent() -> FakeMatch {
        FakeMatch {
            groups: vec![None],
            fingerprint: 42,
            bytes: false,
        }
    }
}

impl MatchGroups for FakeMatch {
    fn group(&self, index: usize) -> Option<Capture<'_>> {
        let text = self.groups.get(index)?.as_deref()?;
        Some(if self.bytes {
            Capture::Bytes(text.as_bytes())
        } else {
            Capture::Text(text)
        })
    }

    fn is_bytes(&self) -> bool {
        self.bytes
    }

    fn pattern_fingerprint(&self) -> u64 {
        self.fingerprint
    }
}

/// Expand `template` (plain dialect) against groups, panicking on error.
pub fn expand_plain(pattern: &FakePattern, template: &str, groups: &[&str]) -> String {
    expand_dialect(pattern, template, groups, false)
}

/// Expand `template` (format dialect) against groups, panicking on error.
pub fn expand_format(pattern: &FakePattern, template: &str, groups: &[&str]) -> String {
    expand_dialect(pattern, template, groups, true)
}

fn expand_dialect(
    pattern: &FakePattern,
    template: &str,
    groups: &[&str],
    format_mode: bool,
) -> String {
    let compiled =
        regraft::compile_template(pattern, regraft::Template::Text(template), format_mode)
            .expect("template should compile");
    match compiled.expand(&FakeMatch::of(groups)) {
        Ok(regraft::Rendered::Text(s)) => s,
        other => panic!("expected text rendering, got {:?}", other),
    }
}
