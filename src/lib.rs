/*!

# regraft - extended regex escape syntax grafted onto a host engine

This crate rewrites patterns written in an extended regular-expression syntax
into syntax a host regex engine already understands, and compiles extended
replacement templates into reusable descriptors that expand host match
results. It never matches anything itself: the host engine keeps full
ownership of compilation and execution, and regraft stays a purely textual
layer in front of it.

# Example: transpiling a pattern

```rust
use regraft::{transpile, ParseOptions};
let pattern = transpile(r"Testing \Q(\s+[quote]*\s+)?\E!", ParseOptions::default()).unwrap();
assert_eq!(pattern, r"Testing \(\\s\+\[quote\]\*\\s\+\)\?!");
```

The output contains no extended constructs and can be handed straight to the
host compiler. A pattern that is already pure host syntax comes back
unchanged.

# Example: replacement templates

The host engine is reached through two small traits: [`PatternHandle`] for a
compiled pattern and [`MatchGroups`] for a match result. A compiled
[`ReplaceTemplate`] is immutable and hashable, so it can be cached and shared
across threads.

```rust
use regraft::{compile_template, Capture, MatchGroups, PatternHandle, Rendered, Template};

# struct Pat;
# impl PatternHandle for Pat {
#     fn group_count(&self) -> usize { 1 }
#     fn group_index(&self, name: &str) -> Option<usize> { (name == "word").then_some(1) }
#     fn fingerprint(&self) -> u64 { 1 }
#     fn is_bytes(&self) -> bool { false }
# }
# struct Found;
# impl MatchGroups for Found {
#     fn group(&self, index: usize) -> Option<Capture<'_>> {
#         [Some("say cheese"), Some("cheese")][index].map(Capture::Text)
#     }
#     fn is_bytes(&self) -> bool { false }
#     fn pattern_fingerprint(&self) -> u64 { 1 }
# }
// `Pat` is a host pattern with one group named "word"; `Found` is a host
// match of it with group 1 = "cheese".
let template = compile_template(&Pat, Template::Text(r"\c\g<word>!"), false)?;
assert_eq!(template.expand(&Found)?, Rendered::Text("Cheese!".to_string()));
# Ok::<(), regraft::Error>(())
```

# Supported syntax

In search patterns: `\Q...\E` quoting, case classes `\l \L \c \C`, Unicode
properties `\p{...}`/`\P{...}` with optional `category:`/`category=`
prefixes, POSIX classes `[:name:]`, named code points `\N{NAME}`, the
line-break and blank shorthands `\R \h \H`, grapheme clusters `\X`, inline
and scoped flag groups with `x` (verbose), `u` (Unicode), and `a` (ASCII),
and `(?#...)` comment groups. Everything else passes through untouched.

In replacement templates: back-references `\1`..`\99` and `\g<name>`, case
markers `\l \c` (next unit) and `\L \C ... \E` (span), resolved escapes
(octal, `\xHH`, `\uHHHH`, `\UHHHHHHHH`, `\N{NAME}`, C-style), and an
optional format mode with `{field[index]!conv:spec}` references.

# Byte patterns

`transpile_bytes` and `Template::Bytes` work on byte strings: classes are
clamped to the single-byte range, case folding is ASCII-only, and wide
Unicode constructs degrade to match-nothing classes.

*/

#![warn(clippy::all)]

pub use crate::api::{
    escape, escape_bytes, Capture, MatchGroups, ParseOptions, PatternHandle, Rendered, Template,
};
pub use crate::error::{Error, ErrorKind};
pub use crate::template::{compile_template, ReplaceTemplate};
pub use crate::transpile::{transpile, transpile_bytes};

mod api;
mod charclasses;
mod codepointset;
mod cursor;
mod error;
mod expand;
mod template;
mod transpile;
mod unicode;
