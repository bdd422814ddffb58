//! Rewrites module specifiers in `import ... from` and `require(...)` calls. Sources are
//! never parsed: each supported syntax shape and quote style has its own pattern, and
//! the quote used at a call site is kept as is.

use std::collections::BTreeSet;

use regex::{Captures, Regex};

use crate::paths;

struct ImportPattern {
    regex: Regex,
}

impl ImportPattern {
    fn new(pattern: &str) -> Self {
        Self {
            regex: Regex::new(pattern).expect("import pattern is not a valid regex"),
        }
    }
}

lazy_static::lazy_static! {
    static ref IMPORT_PATTERNS: Vec<ImportPattern> = vec![
        // import { a } from 'specifier'; export * from 'specifier';
        ImportPattern::new(r#"(?P<prefix>\bfrom\s*')(?P<specifier>[^'\n]*)(?P<suffix>')"#),
        // import { a } from "specifier"; export * from "specifier";
        ImportPattern::new(r#"(?P<prefix>\bfrom\s*")(?P<specifier>[^"\n]*)(?P<suffix>")"#),
        // require('specifier')
        ImportPattern::new(r#"(?P<prefix>\brequire\s*\(\s*')(?P<specifier>[^'\n]*)(?P<suffix>'\s*\))"#),
        // require("specifier")
        ImportPattern::new(r#"(?P<prefix>\brequire\s*\(\s*")(?P<specifier>[^"\n]*)(?P<suffix>"\s*\))"#),
    ];
}

/// Replaces one module specifier with another.
///
/// A bare `old` matches a specifier that equals it or ends with `/old`, and only that
/// trailing part is replaced: `support` to `support/e2e` turns `../support` into
/// `../support/e2e` but leaves `../support-utils` and `../mysupport` alone.
/// A relative `old` (`./x`, `../x`) only matches the exact specifier.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RewriteRule {
    pub old: String,
    pub new: String,
}

impl RewriteRule {
    pub fn new(old: impl Into<String>, new: impl Into<String>) -> Self {
        Self {
            old: old.into(),
            new: new.into(),
        }
    }

    pub fn apply(&self, specifier: &str) -> Option<String> {
        if self.old.is_empty() {
            return None;
        }

        // When the replacement would itself match, an already rewritten specifier is left alone.
        if ends_with_segment(&self.new, &self.old) && ends_with_segment(specifier, &self.new) {
            return None;
        }

        if specifier == self.old {
            return Some(self.new.clone());
        }

        if paths::is_relative_specifier(&self.old) {
            return None;
        }

        specifier
            .strip_suffix(self.old.as_str())
            .filter(|prefix| prefix.ends_with('/'))
            .map(|prefix| format!("{prefix}{}", self.new))
    }
}

fn ends_with_segment(specifier: &str, suffix: &str) -> bool {
    specifier == suffix
        || specifier
            .strip_suffix(suffix)
            .map_or(false, |prefix| prefix.ends_with('/'))
}

/// Applies every rule in a single pass over the text; the first rule matching a specifier
/// wins. Returns the new text and how many specifiers were replaced.
pub fn rewrite_all(text: &str, rules: &[RewriteRule]) -> (String, usize) {
    let mut text = text.to_owned();
    let mut replacements = 0;

    if rules.is_empty() {
        return (text, replacements);
    }

    for pattern in IMPORT_PATTERNS.iter() {
        text = pattern
            .regex
            .replace_all(&text, |captures: &Captures| {
                match rules
                    .iter()
                    .find_map(|rule| rule.apply(&captures["specifier"]))
                {
                    Some(specifier) => {
                        replacements += 1;
                        format!("{}{specifier}{}", &captures["prefix"], &captures["suffix"])
                    }

                    None => captures[0].to_owned(),
                }
            })
            .into_owned();
    }

    (text, replacements)
}

pub fn rewrite(text: &str, old_specifier: &str, new_specifier: &str) -> String {
    rewrite_all(text, &[RewriteRule::new(old_specifier, new_specifier)]).0
}

/// Every distinct specifier imported or required by the text, sorted.
pub fn specifiers(text: &str) -> BTreeSet<String> {
    let mut specifiers = BTreeSet::new();

    for pattern in IMPORT_PATTERNS.iter() {
        for captures in pattern.regex.captures_iter(text) {
            specifiers.insert(captures["specifier"].to_owned());
        }
    }

    specifiers
}
